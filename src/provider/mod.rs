pub mod claude;
pub mod constants;

pub use claude::{ClaudeDirectConfig, ClaudeDirectProvider};
