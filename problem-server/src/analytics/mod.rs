//! In-memory analytics aggregation.
//!
//! The repository's bulk fetch hands each endpoint the same filtered record
//! set; the functions in [`engine`] turn it into the individual chart and
//! KPI shapes.
//!
//! # Module structure
//!
//! - [`bucketing`] — day/week/month bucket keys
//! - [`engine`] — the aggregate computations
//! - [`types`] — result shapes

pub mod bucketing;
pub mod engine;
pub mod types;

pub use bucketing::Granularity;
