//! In-memory caches for ad-serving lookup data
//!
//! Each data kind owns one double-buffered cache: request handling reads from
//! a published snapshot while the refresh pipeline builds the next dataset in
//! a staging buffer, then publishes it with a single atomic swap. There is no
//! disk persistence; caches are rebuilt from the provider on process start.

mod double_buffer;

pub use double_buffer::{DoubleBufferedCache, Snapshot};
