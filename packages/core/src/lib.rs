//! HealthBridge Core Decoding Engine
//!
//! This crate is the native core of a health-data plugin: it turns generic,
//! wire-transmitted record envelopes into strongly-typed native records
//! ready for persistence, with partial-failure semantics for batches and
//! nested writes.
//!
//! # Architecture
//!
//! - **Closed tagged unions**: every record kind and typed payload is an
//!   enum variant; adding a kind is a compile-checked match addition
//! - **Per-item isolation**: a failure in one batch item never aborts its
//!   siblings, and a failed nested sub-record never aborts its parent
//!   session
//! - **Read-only tables**: the type registry and category tables are built
//!   once per process and shared by reference; decoding mutates nothing
//! - **Index-path failures**: every failure is addressable back to its
//!   original submission position, including inside nested lists
//!
//! # Modules
//!
//! - [`models`] - wire envelope and native record data structures
//! - [`registry`] - type resolution with platform and feature gating
//! - [`units`] - unit conversion into canonical quantities
//! - [`categories`] - category label translation with unknown fallback
//! - [`decode`] - the per-kind decoders and batch entrypoint
//! - [`services`] - decode-then-write orchestration over the store's writer

pub mod categories;
pub mod decode;
pub mod models;
pub mod registry;
pub mod services;
pub mod units;

// Re-export commonly used types
pub use decode::{decode_batch, decode_batch_parallel, decode_record, BatchDecodeResult};
pub use models::{NativeRecord, RecordEnvelope, RecordKind};
pub use registry::{PlatformContext, TypeRegistry};
