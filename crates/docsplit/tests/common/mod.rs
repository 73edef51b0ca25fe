//! Shared test utilities for docsplit integration tests.
//!
//! This module provides:
//! - `TestHarness` for isolated runs with a temp storage root and an in-memory database
//! - Builders for configurations, synthetic PDFs and scripted page collaborators

pub mod builders;
pub mod harness;

pub use builders::*;
pub use harness::TestHarness;
