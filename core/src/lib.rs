//! Core library for the task board
//!
//! This crate contains the logic shared by the server and the client:
//! - Task model and input validation
//! - Query planning for the task list endpoint
//! - The task repository contract and an in-memory store
//! - The derived view (filter, sort, stats) shown on the board

pub mod error;
pub mod task;
pub mod view;

pub use error::Error;
pub type Result<T> = std::result::Result<T, Error>;
