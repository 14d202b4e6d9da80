//! Gateway: HTTP server for the skill webhook.
//!
//! `POST /chatbuddy` (alias `/webhook`) answers every request with a simpleText envelope and
//! status 200; `GET /healthz` and `GET /` are probes that never touch the LLM.

mod server;

pub use server::{build_responder, router, run_gateway, GatewayState};
