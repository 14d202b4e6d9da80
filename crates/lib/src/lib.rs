//! Chatbuddy core library: skill webhook gateway, danger-keyword filter, LLM client,
//! and reply shaping, used by the `chatbuddy` CLI.

pub mod agent;
pub mod channels;
pub mod config;
pub mod gateway;
pub mod init;
pub mod llm;
pub mod reply;
pub mod safety;
