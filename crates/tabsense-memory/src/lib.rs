//! # tabsense-memory
//!
//! Memory-first artifact storage for the tabsense pipeline.
//!
//! This crate provides:
//! - `MemoryStore`: versioned, write-once records for schemas, analyses,
//!   insights, and cached query answers, with optional JSON persistence
//! - `ComputeCache`: content-addressed cache enforcing at-most-one
//!   computation per fingerprint under concurrency
//!
//! Consumers must check memory before recomputation. The store never
//! performs analysis or reasoning; it only saves and retrieves.

pub mod cache;
pub mod store;

pub use cache::ComputeCache;
pub use store::MemoryStore;
