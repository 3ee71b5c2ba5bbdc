use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Message {
    pub role: ChatRole,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }
}

/// Per-call generation parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationOptions {
    /// Sent as a leading system message when present and non-empty.
    pub system_prompt: Option<String>,

    /// Sampling temperature.
    pub temperature: f32,

    /// Maximum number of tokens to generate.
    pub max_tokens: u32,

    /// If the model generates any of these sequences, it will stop generating further text.
    pub stop_sequences: Option<Vec<String>>,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            system_prompt: None,
            temperature: 0.7,
            max_tokens: 1024,
            stop_sequences: None,
        }
    }
}

impl GenerationOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn stop_sequences(mut self, stop_sequences: Vec<String>) -> Self {
        self.stop_sequences = Some(stop_sequences);
        self
    }

    pub fn add_stop_sequence(mut self, stop_sequence: impl Into<String>) -> Self {
        let sequences = self.stop_sequences.get_or_insert_with(Vec::new);
        sequences.push(stop_sequence.into());
        self
    }

    /// Conversation for a single call: optional system message, then the prompt.
    pub fn conversation(&self, prompt: &str) -> Vec<Message> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = self.system_prompt.as_deref().filter(|s| !s.is_empty()) {
            messages.push(Message::system(system));
        }
        messages.push(Message::user(prompt));
        messages
    }
}

/// Body posted to both chat endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub conversation_uuid: String,
    pub messages: Vec<Message>,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_sequences: Option<Vec<String>>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub stream: bool,
}

impl ChatRequest {
    /// Builds a request with a fresh random conversation id.
    pub fn new(model: &str, prompt: &str, options: &GenerationOptions, stream: bool) -> Self {
        Self {
            conversation_uuid: uuid::Uuid::new_v4().to_string(),
            messages: options.conversation(prompt),
            model: model.to_string(),
            temperature: options.temperature,
            max_tokens: options.max_tokens,
            stop_sequences: options
                .stop_sequences
                .clone()
                .filter(|sequences| !sequences.is_empty()),
            stream,
        }
    }
}
