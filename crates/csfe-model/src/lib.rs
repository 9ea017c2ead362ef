//! csfe domain model
//!
//! Typed values shared by every csfe crate.
//!
//! # Core Concepts
//!
//! - [`FacetResolution`] / [`FieldResolution`]: how a binary field exposes its
//!   content type and display name
//! - [`AdapterFlavor`]: synchronous or asynchronous transport adapter
//! - [`Action`]: one resolver decision, consumed once by the executor
//! - [`HistoryStore`]: persisted `class -> field -> record` tree
//! - [`naming`]: names of generated members
//!
//! # Example
//!
//! ```rust,ignore
//! use csfe_model::{FacetResolution, FieldResolution, HistoryStore};
//!
//! let mut history = HistoryStore::open("csfe.yaml")?;
//! let resolution = FieldResolution::new(
//!     FacetResolution::Fixed("application/pdf".into()),
//!     FacetResolution::Unhandled,
//! );
//! history.insert("Document", "file", &resolution);
//! history.save()?;
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod action;
mod adapter;
mod history;
mod resolution;

pub mod naming;

pub use action::{Action, ActionKind};
pub use adapter::{AdapterFlavor, ParseFlavorError};
pub use history::{
    ClassHistory, FieldRecord, HistoryError, HistoryStore, HistoryTree, RecordState,
};
pub use resolution::{Facet, FacetResolution, FieldResolution, ResolutionKind};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
