//! Bridge Services
//!
//! This module contains the service seam between the decode engine and the
//! native store:
//!
//! - `WriteService` - decode-then-write orchestration over a `RecordWriter`
//! - `RecordWriter` - the store's write surface (external collaborator)
//! - `InMemoryWriter` - writer double for tests and store-less tooling
//!
//! Services coordinate between the pure decode engine and the store's I/O
//! surface; everything above this seam stays synchronous and pure.

pub mod error;
pub mod write_service;

pub use error::WriteError;
pub use write_service::{InMemoryWriter, RecordWriter, WriteReport, WriteService};
