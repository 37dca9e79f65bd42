//! API routing module
//!
//! # Structure
//!
//! - [`health`] - health check
//! - [`problems`] - problem listing, lookup and mutations
//! - [`analytics`] - aggregate views over the filtered problem set

pub mod params;

pub mod analytics;
pub mod health;
pub mod problems;
