//! csfe member editors
//!
//! Structural edits of a class's [`MemberList`](csfe_source::MemberList)
//! driven by field resolutions.
//!
//! # Core Concepts
//!
//! - [`FacetEditor`]: literal or accessor pair for one facet, with the
//!   transition matrix in [`FacetEditor::change`]
//! - [`AdapterEditor`]: download/upload accessor pair of one adapter flavor
//! - [`FieldEditor`]: every generated member of one field
//! - [`PurgePolicy`]: which members go away when they become unhandled
//!
//! Every editor exposes `build`, `change` and `purge`. All three locate
//! members by name and are idempotent.
//!
//! # Example
//!
//! ```rust,ignore
//! use csfe_editor::{FieldEditor, PurgePolicy};
//! use csfe_model::AdapterFlavor;
//!
//! let editor = FieldEditor::new("file", &resolution, PurgePolicy::default(), AdapterFlavor::Synchronous);
//! editor.build(&mut members)?;
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod adapter;
mod error;
mod facet;
mod field;
mod layout;

pub mod template;

pub use adapter::AdapterEditor;
pub use error::EditError;
pub use facet::FacetEditor;
pub use field::{FieldEditor, PurgePolicy};
pub use layout::Rank;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
