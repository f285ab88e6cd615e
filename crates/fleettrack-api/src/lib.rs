// API client for the hosted text-generation provider
pub mod gemini;

pub use gemini::{GeminiClient, GeminiError, GenerateContentResponse, DEFAULT_MODEL};
