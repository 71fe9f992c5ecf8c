pub mod chat_client;
pub mod config;
pub mod error;
pub mod event_bus;
pub mod store;
pub mod textgen;
pub mod types;

pub use chat_client::ChatCompletionsGenerator;
pub use config::AppConfig;
pub use error::{EngineError, EngineResult};
pub use event_bus::{DomainEvent, EventSink};
pub use store::{DocumentStore, MemoryStore};
pub use textgen::{Decoded, GenerationOptions, Placeholder, TextGenerator};
