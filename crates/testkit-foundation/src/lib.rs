//! Foundation Layer - error types and the locator record format
//!
//! This crate provides the building blocks shared by the TestKit crates:
//! - `TestKitError` and `TestKitResult`
//! - the properties text dialect used by the locator file
//! - `LocatorRecord`, the hand-off between fixture staging and the test run

pub mod error;
pub mod locator;
pub mod properties;

// Re-export commonly used types for convenience
pub use error::*;
pub use locator::{LocatorRecord, LOCATOR_FILE_NAME};
