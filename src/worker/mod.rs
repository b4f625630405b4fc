//! Background execution for captures and retention sweeps.

mod pool;

pub use pool::{WorkerPool, WorkerStats};
