pub mod chat;
pub mod gemini;
pub mod sessions;

pub use chat::ChatService;
pub use gemini::{GeminiClient, ModelCache};
pub use sessions::SessionStore;
