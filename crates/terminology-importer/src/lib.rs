//! # terminology-importer
//!
//! Reconciles SNOMED CT and LOINC releases against a remote versioned code
//! store.
//!
//! Jobs are submitted to an [`Importer`], queued on a single-worker
//! [`TaskScheduler`] and tracked as [`Process`](terminology_types::Process)
//! records in an expiring [`ProcessRegistry`]. Each job acquires its release
//! from a [`ReleaseSource`], parses it with the `terminology-loader` parsers
//! and hands the resulting code updates to a [`BatchUploader`], which merges
//! them chunk by chunk into the [`CodeStore`].
//!
//! A thin gRPC host, [`ImporterServer`], exposes submission, status and
//! cancellation.
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use terminology_importer::{ImportKind, ImportRequest, Importer, ImporterConfig, InMemoryCodeStore};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let importer = Importer::new(ImporterConfig::from_env());
//! let id = importer.submit(ImportRequest {
//!     kind: ImportKind::Loinc,
//!     store: Arc::new(InMemoryCodeStore::new()),
//!     chunk_size: None,
//! })?;
//!
//! println!("{:?}", importer.status(&id));
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

#[allow(missing_docs)]
pub mod proto {
    //! Generated protobuf types.
    tonic::include_proto!("importer");
}

pub mod config;
pub mod context;
pub mod error;
pub mod importer;
pub mod reconcile;
pub mod registry;
pub mod scheduler;
pub mod server;
pub mod source;
pub mod store;
pub mod tasks;

pub use config::ImporterConfig;
pub use context::JobContext;
pub use error::{ImportError, ImportResult, StoreError, StoreResult};
pub use importer::{ImportKind, ImportRequest, Importer};
pub use reconcile::{make_code_from_update, select_existing, BatchUploader, UploadSummary};
pub use registry::ProcessRegistry;
pub use scheduler::TaskScheduler;
pub use server::ImporterServer;
pub use source::{LocalReleaseSource, ReleaseSource, SnomedEdition};
pub use store::{fetch_range, CodeStore, HttpCodeStore, InMemoryCodeStore, RangeQuery};
pub use tasks::{ImportTask, LoincImportTask, SnomedImportTask, TaskResources};
