//! # sweep-core - Core Domain Types
//!
//! Foundation crate for storage-sweep. Provides error handling, logging setup,
//! and the emulator version types shared by every other crate.
//!
//! This crate has **zero internal dependencies** -- it only depends on external
//! crates (thiserror, tracing, url).
//!
//! ## Public API
//!
//! ### Error Handling (`error`)
//! - [`Error`] - Custom error enum with `fatal` vs `recoverable` classification
//! - [`Result`] - Type alias for `std::result::Result<T, Error>`
//! - [`ResultExt`] - Extension trait for adding error context
//!
//! ### Versions (`version`)
//! - [`VersionTriple`] - `(major, minor, build)` read from executable metadata
//! - [`MinimumVersion`] - Compatibility lower bound
//! - [`MINIMUM_EMULATOR_VERSION`] - The release this tool requires
//!
//! ## Prelude
//!
//! Import commonly used types with:
//! ```rust
//! use sweep_core::prelude::*;
//! ```

pub mod error;
pub mod logging;
pub mod prelude;
pub mod version;

// Re-export commonly used types at crate root for convenience
pub use error::{Error, Result, ResultExt};
pub use version::{MinimumVersion, VersionTriple, MINIMUM_EMULATOR_VERSION};
