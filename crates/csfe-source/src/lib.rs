//! csfe source layer
//!
//! The boundary between Python files and the structured member lists the
//! editors work on.
//!
//! # Core Operations
//!
//! - **Ingress**: parse a module with tree-sitter into [`ParsedClass`]es
//! - **Edit**: mutate a [`MemberList`] through stable [`MemberId`]s
//! - **Egress**: print a body and splice it back with [`SourceFile::replace_class`]
//!
//! ```text
//! File → SourceFile → parse → MemberList → (editors) → render → SourceFile → File
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod columns;
pub mod error;
pub mod expr;
pub mod list;
pub mod member;
pub mod parse;
pub mod render;
pub mod unit;

pub use columns::{binary_fields, string_columns, Column, ColumnKind};
pub use error::SourceError;
pub use expr::{Expr, Statement};
pub use list::{MemberId, MemberList, OrderKey};
pub use member::{Accessor, AccessorRole, Attribute, Member, Param, Slot};
pub use parse::{parse_classes, ParsedClass};
pub use render::{render_body, render_indented};
pub use unit::SourceFile;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
