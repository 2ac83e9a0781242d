//! Listening socket, transport setup and worker pool.

pub mod listener;
pub mod pool;
pub mod tls;

pub use listener::{Server, Transport};
pub use pool::WorkerPool;
