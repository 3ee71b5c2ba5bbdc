pub mod error;
pub mod http;
pub mod sse;
pub mod types;

pub use error::{ClientError, MalformedStreamEvent, TransportError};
pub use http::{HttpClient, HttpClientConfig};
pub use sse::{FragmentStream, parse_event_line};
pub use types::{ChatRequest, ChatRole, GenerationOptions, Message};
