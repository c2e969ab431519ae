//! # Dispatch Testing Utils
//!
//! Shared testing utilities for the volunteer dispatch system.
//!
//! - **Mock Repositories**: In-memory implementations of the repository
//!   traits, honoring the same transition and write-once contracts as the
//!   SQLite implementations
//! - **Oracle Doubles**: Deterministic ranking oracle stand-ins
//! - **Test Data Builders**: Utilities for creating test entities
//!
//! Add this crate as a dev-dependency and pull the mocks into your tests:
//!
//! ```toml
//! [dev-dependencies]
//! dispatch-testing-utils = { path = "../testing-utils" }
//! ```

pub mod builders;
pub mod mocks;
pub mod oracle;

pub use builders::*;
pub use mocks::*;
pub use oracle::*;
