pub mod ollama;
pub mod provider;
pub mod types;


pub use ollama::{OllamaConfig, OllamaProvider};
pub use provider::LlmProvider;
pub use types::{GenerateOptions, GenerateRequest};
