//! Orchboard daemon runtime: change watcher + update broadcaster + HTTP/WebSocket server.

pub mod broadcast;
pub mod config;
mod error;
pub mod http;
pub mod protocol;
mod runtime;
pub mod watcher;

pub use broadcast::{Broadcaster, UpdateEvent, UPDATE_EVENT};
pub use config::ServerConfig;
pub use error::DaemonError;
pub use protocol::ClaimResponse;
pub use runtime::{run, start_blocking};
pub use watcher::{ChangeWatcher, FileStamp};
