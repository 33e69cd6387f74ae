//! Workers and per-job dispatch

mod executor;
mod http;
mod pool;

pub use executor::{Dispatcher, Executor};
pub use http::{HttpDispatcher, build_client, build_request};
pub use pool::WorkerPool;
