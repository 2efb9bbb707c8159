//! # ttlkv Core
//!
//! Shared building blocks for the ttlkv workspace:
//!
//! - **Errors**: one error type for every fallible operation
//! - **Constants**: defaults for the engine and the HTTP adapter
//! - **Duration**: parsing of the duration strings carried by store requests
//!
//! ## Example
//!
//! ```rust
//! use std::time::Duration;
//! use ttlkv_core::parse_duration;
//!
//! assert_eq!(parse_duration("1m30s").unwrap(), Duration::from_secs(90));
//! assert!(parse_duration("-5s").is_err());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, clippy::all)]

pub mod constants;
pub mod duration;
pub mod error;

pub use constants::*;
pub use duration::parse_duration;
pub use error::{Result, TtlkvError};
