pub mod claude {
    pub const DEFAULT_MODEL: &str = "claude-3-opus-20240229";
    pub const API_BASE: &str = "https://claude.ai";
    pub const CHAT_ENDPOINT: &str = "/api/chat";
    pub const CHAT_STREAM_ENDPOINT: &str = "/api/chat_stream";
    pub const SESSION_COOKIE: &str = "sessionKey";
    pub const SESSION_KEY_ENV_VAR: &str = "CLAUDE_SESSION_KEY";
}
