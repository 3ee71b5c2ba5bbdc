//! # claude-direct
//!
//! Client for the claude.ai chat endpoints, authenticated with a browser
//! session key instead of an API key.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use claude_direct::{ClaudeDirectProvider, GenerationOptions};
//! use futures::StreamExt;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let provider = ClaudeDirectProvider::from_env()?;
//!
//!     let options = GenerationOptions::new()
//!         .system_prompt("You are a helpful AI assistant.")
//!         .max_tokens(500);
//!     let text = provider
//!         .generate("Explain quantum computing in simple terms", &options)
//!         .await?;
//!     println!("{text}");
//!
//!     let mut fragments = provider
//!         .stream_generate("Write a short poem about technology", &options)
//!         .await?;
//!     while let Some(fragment) = fragments.next().await {
//!         print!("{}", fragment?);
//!     }
//!     Ok(())
//! }
//! ```

pub mod core;
pub mod provider;

pub use crate::core::{
    ChatRole, ClientError, FragmentStream, GenerationOptions, HttpClientConfig,
    MalformedStreamEvent, Message, TransportError, parse_event_line,
};
pub use provider::claude::extract_text;
pub use provider::{ClaudeDirectConfig, ClaudeDirectProvider};
