//! # terminology-types
//!
//! Data model shared by the terminology import pipeline.
//!
//! This crate provides the in-memory representation of pending changes to a
//! terminology concept ([`CodeUpdate`]), the durable record held by the remote
//! code store ([`StoredCode`]) and the state of a running import job
//! ([`Process`]).
//!
//! ## Features
//!
//! - `serde` (default): Enables serialization/deserialization support via serde.
//!   The importer needs it to talk JSON to the code store.
//!
//! ## Usage
//!
//! ```rust
//! use terminology_types::{CodeKey, CodeUpdate, CodeUpdateMap, well_known};
//!
//! let mut codes = CodeUpdateMap::new();
//! let update = CodeUpdate::versioned("73211009", well_known::INTERNATIONAL_REGION, "20210131", false);
//! codes.insert(CodeKey::new("73211009"), update);
//!
//! assert!(codes.contains_key(&CodeKey::new("73211009")));
//! ```

#![warn(missing_docs)]

mod code_update;
mod process;
mod stored_code;
pub mod well_known;

pub use code_update::{CodeKey, CodeUpdate, CodeUpdateMap};
pub use process::{Process, ProcessStatus};
pub use stored_code::{StoredCode, WrittenCode};
