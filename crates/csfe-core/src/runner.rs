//! Whole-tree runs
//!
//! A [`Runner`] walks every Python module under a root and reconciles each
//! top-level class in file order, sharing one history store. A failing class
//! stops its file unless the failure was a persistence warning; other files
//! continue. Running out of answers stops the run.

use std::fmt::{self, Display, Formatter};
use std::path::{Path, PathBuf};

use csfe_model::HistoryStore;
use csfe_source::{binary_fields, string_columns, SourceFile};
use serde::Serialize;

use crate::discovery::{history_path, python_files};
use crate::error::RunError;
use crate::prompt::Prompt;
use crate::session::{ClassReport, Session};
use crate::settings::Settings;

/// Class that could not be reconciled
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassFailure {
    /// Class name
    pub class: String,
    /// Rendered error chain
    pub error: String,
}

/// Outcome for one module
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FileReport {
    /// Module path
    pub path: PathBuf,
    /// Reconciled classes, in declaration order
    pub classes: Vec<ClassReport>,
    /// Classes that stopped with an error
    pub failures: Vec<ClassFailure>,
    /// Module could not be read or parsed
    pub error: Option<String>,
    /// Run stopped while in this module
    pub interrupted: bool,
}

impl FileReport {
    fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            ..Self::default()
        }
    }

    /// Whether any part of the module failed
    #[inline]
    #[must_use]
    pub fn failed(&self) -> bool {
        self.error.is_some() || !self.failures.is_empty()
    }
}

/// Outcome of a whole run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
    /// History file used
    pub history: PathBuf,
    /// Visited modules, in walk order
    pub files: Vec<FileReport>,
}

impl RunReport {
    /// Number of failed modules and classes
    #[must_use]
    pub fn failures(&self) -> usize {
        self.files
            .iter()
            .map(|file| file.failures.len() + usize::from(file.error.is_some()))
            .sum()
    }

    /// Number of executed actions
    #[must_use]
    pub fn actions(&self) -> usize {
        self.files
            .iter()
            .flat_map(|file| &file.classes)
            .map(|class| class.actions.len())
            .sum()
    }

    /// Whether the run stopped early
    #[must_use]
    pub fn interrupted(&self) -> bool {
        self.files.iter().any(|file| file.interrupted)
    }

    /// Whether every module and class went through
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failures() == 0 && !self.interrupted()
    }
}

impl Display for RunReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for file in &self.files {
            writeln!(f, "{}", file.path.display())?;
            if let Some(error) = &file.error {
                writeln!(f, "  FAILED: {error}")?;
            }
            for class in &file.classes {
                if class.skipped {
                    continue;
                }
                let actions: Vec<String> = class.actions.iter().map(ToString::to_string).collect();
                write!(f, "  {}: {}", class.class, actions.join(", "))?;
                if class.source_changed {
                    write!(f, " (source changed)")?;
                }
                writeln!(f)?;
            }
            for failure in &file.failures {
                writeln!(f, "  {}: FAILED: {}", failure.class, failure.error)?;
            }
        }
        write!(
            f,
            "{} action(s), {} failure(s), history {}",
            self.actions(),
            self.failures(),
            self.history.display()
        )?;
        if self.interrupted() {
            write!(f, ", interrupted")?;
        }
        Ok(())
    }
}

/// Columns of one discovered class
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanEntry {
    /// Module path
    pub path: PathBuf,
    /// Class name
    pub class: String,
    /// Binary columns
    pub binary: Vec<String>,
    /// String columns
    pub strings: Vec<String>,
}

/// Reconciles every module under a root
#[derive(Debug, Clone)]
pub struct Runner {
    settings: Settings,
    root: PathBuf,
    history_path: PathBuf,
}

impl Runner {
    /// Create runner; the history location follows the settings chain
    #[must_use]
    pub fn new(settings: Settings, root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let history_path = history_path(None, &settings, &root);
        Self {
            settings,
            root,
            history_path,
        }
    }

    /// With explicit history location
    #[inline]
    #[must_use]
    pub fn with_history_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.history_path = path.into();
        self
    }

    /// History location in use
    #[inline]
    #[must_use]
    pub fn history_path(&self) -> &Path {
        &self.history_path
    }

    /// Reconcile every module
    ///
    /// # Errors
    ///
    /// Returns an error when the history cannot be loaded or the tree cannot
    /// be walked. Per-file and per-class failures are reported instead.
    pub fn run(&self, prompt: &mut dyn Prompt) -> Result<RunReport, RunError> {
        let mut history = HistoryStore::open(&self.history_path)?;
        let files = python_files(&self.root)?;
        tracing::info!(
            root = %self.root.display(),
            files = files.len(),
            history = %self.history_path.display(),
            "starting run"
        );

        let mut report = RunReport {
            history: self.history_path.clone(),
            files: Vec::with_capacity(files.len()),
        };
        for path in files {
            let file = self.reconcile_file(&path, &mut history, prompt);
            let stop = file.interrupted;
            report.files.push(file);
            if stop {
                tracing::error!("no more answers, stopping run");
                break;
            }
        }
        Ok(report)
    }

    fn reconcile_file(
        &self,
        path: &Path,
        history: &mut HistoryStore,
        prompt: &mut dyn Prompt,
    ) -> FileReport {
        let mut report = FileReport::new(path);
        let loaded = SourceFile::load(path).and_then(|file| {
            let classes = file.classes()?;
            Ok((file, classes))
        });
        let (mut file, classes) = match loaded {
            Ok(loaded) => loaded,
            Err(err) => {
                tracing::error!(path = %path.display(), error = %err, "cannot load module");
                report.error = Some(err.to_string());
                return report;
            }
        };

        let mut session = Session::new(&self.settings, prompt, history);
        for parsed in classes {
            match session.reconcile(&mut file, &parsed.name) {
                Ok(class) => report.classes.push(class),
                Err(err) => {
                    tracing::error!(
                        path = %path.display(),
                        class = %parsed.name,
                        error = %err,
                        "class failed"
                    );
                    report.failures.push(ClassFailure {
                        class: parsed.name.clone(),
                        error: err.to_string(),
                    });
                    if err.is_fatal_for_run() {
                        report.interrupted = true;
                        break;
                    }
                    if err.is_fatal_for_file() {
                        break;
                    }
                }
            }
        }
        report
    }
}

/// List every top-level class under `root` with its binary and string columns
///
/// Modules that do not parse are skipped with a warning.
///
/// # Errors
///
/// Returns [`RunError::Walk`] when the tree cannot be walked.
pub fn scan(root: &Path) -> Result<Vec<ScanEntry>, RunError> {
    let mut entries = Vec::new();
    for path in python_files(root)? {
        let classes = match SourceFile::load(&path).and_then(|file| file.classes()) {
            Ok(classes) => classes,
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "skipping module");
                continue;
            }
        };
        for parsed in classes {
            entries.push(ScanEntry {
                path: path.clone(),
                binary: binary_fields(&parsed.members),
                strings: string_columns(&parsed.members),
                class: parsed.name,
            });
        }
    }
    Ok(entries)
}
