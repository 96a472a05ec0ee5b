//! Listening-profile analysis server library
//!
//! This library exposes the internal modules for testing and potential reuse.

pub mod analysis;
pub mod auth;
pub mod collector;
pub mod config;
pub mod enrichment;
pub mod llm;
pub mod metrics;
pub mod recovery;
pub mod server;
pub mod spotify;

// Re-export commonly used types for convenience
pub use analysis::{AnalysisError, AnalysisResult, Analyzer, ListeningProfile};
pub use llm::{LlmProvider, OpenAIProvider};
pub use server::{make_app, run_server, RequestsLoggingLevel, ServerConfig};
pub use spotify::{MusicPlatform, SpotifyClient};
