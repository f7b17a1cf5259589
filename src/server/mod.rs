pub mod config;
mod http_layers;
pub mod metrics;
mod recommendations;
pub mod server;
pub(crate) mod session;
pub mod state;

pub use config::ServerConfig;
pub use http_layers::*;
pub use server::{make_app, run_server};
