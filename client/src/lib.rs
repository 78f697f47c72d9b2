//! Task board client
//!
//! Keeps a local mirror of the server's task collection in step with the
//! REST API. Writes are confirmed: the mirror changes only after the server
//! has answered.

pub mod api;
pub mod config;
pub mod error;
pub mod sync;

pub use api::{HttpTaskApi, TaskApi};
pub use config::ClientConfig;
pub use error::{ClientError, Result};
pub use sync::{SyncState, TaskSync};
