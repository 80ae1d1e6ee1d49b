//! Core library for calicoconv
//!
//! This crate implements the **Functional Core** of the calicoconv application,
//! following the Functional Core - Imperative Shell architectural pattern.
//!
//! # Architecture Overview
//!
//! The calicoconv project uses a two-crate architecture to enforce separation of concerns:
//!
//! - **`calicoconv_core`** (this crate): Pure v1 to v3 conversion with zero I/O
//! - **`calicoconv`**: File loading, printing and orchestration (the Imperative Shell)
//!
//! ## Functional Core Principles
//!
//! All functions in this crate adhere to these principles:
//!
//! - **Pure functions**: Same input always produces the same output
//! - **No side effects**: No I/O, no logging, no process exit
//! - **Fail fast**: The first error of a batch is returned, with no partial output
//!
//! # Module Organization
//!
//! - [`api`]: The v1 input resources and v3 output resources
//! - [`backend`]: The key/value storage form a v1 resource passes through
//! - [`convert`]: Kind dispatch, the [`convert::Converter`] trait and one converter per kind
//! - [`printer`]: The output contract implemented by the shell
//! - [`error`]: Error types of the pipeline
//!
//! # Example Usage
//!
//! ```rust
//! use calicoconv_core::api::v1::V1Resource;
//! use calicoconv_core::convert_all;
//!
//! let profile = V1Resource::from_value(serde_json::json!({
//!     "apiVersion": "v1",
//!     "kind": "profile",
//!     "metadata": {"name": "web"},
//!     "spec": {"ingress": [{"action": "allow"}]}
//! }))
//! .unwrap();
//!
//! let converted = convert_all(&[profile]).unwrap();
//! assert_eq!(converted.len(), 1);
//! assert_eq!(converted[0].kind(), "Profile");
//! ```

pub mod api;
pub mod backend;
pub mod convert;
pub mod error;
pub mod printer;

pub use convert::{
    convert_all, convert_and_print, convert_resource, dispatch, Converter, ResourceKind,
};
pub use error::{ConversionError, DecodeError, Error};
pub use printer::{Printer, PrinterError};
