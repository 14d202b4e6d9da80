//! Messaging-platform wire formats.
//!
//! The skill server POSTs a request payload and expects a `simpleText` envelope back.
//! Both shapes are fixed by the platform.

mod kakao;

pub use kakao::{SkillRequest, SkillResponse};
