mod access_token;
pub mod config;
mod http_layers;
pub mod server;
pub mod state;

pub use access_token::{BearerToken, OptionalBearerToken};
pub use config::ServerConfig;
pub use http_layers::*;
pub use server::{make_app, run_server};
