//! csfe reconciliation engine
//!
//! Detects drift between the binary fields declared on model classes and the
//! recorded resolution history, asks the questions needed to settle it, and
//! applies the resulting actions to source and history.
//!
//! # Core Concepts
//!
//! - [`Resolver`]: question protocol producing one [`Action`](csfe_model::Action)
//! - [`Executor`]: applies an action as one unit of work
//! - [`Session`]: per-class resolve/execute loop
//! - [`Runner`]: every module under a root, one shared history
//! - [`Settings`]: adapter flavor and purge chain from the environment
//! - [`Prompt`]: answer channel, console or scripted
//!
//! # Example
//!
//! ```rust,ignore
//! use csfe_core::{ConsolePrompt, Runner, Settings};
//!
//! let settings = Settings::from_env()?;
//! let report = Runner::new(settings, ".").run(&mut ConsolePrompt::stdio())?;
//! println!("{report}");
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod discovery;
pub mod error;
pub mod executor;
pub mod prompt;
pub mod resolver;
pub mod runner;
pub mod session;
pub mod settings;

pub use discovery::{find_history, history_path, python_files};
pub use error::{ClassError, ExecuteError, ResolveError, RunError, SettingsError};
pub use executor::{Executor, Outcome};
pub use prompt::{ConsolePrompt, Prompt, ScriptedPrompt};
pub use resolver::Resolver;
pub use runner::{scan, ClassFailure, FileReport, RunReport, Runner, ScanEntry};
pub use session::{ClassReport, Session};
pub use settings::Settings;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
