pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use models::*;
pub use router::ai_chat_routes;
pub use services::{ChatService, GeminiClient, ModelCache, SessionStore};
