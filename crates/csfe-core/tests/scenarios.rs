//! End-to-end reconciliation scenarios on a scratch project

use std::fs;

use csfe_core::{ExecuteError, Executor, Runner, ScriptedPrompt, Settings};
use csfe_model::{Action, ActionKind, FacetResolution, FieldResolution, HistoryStore, RecordState};
use csfe_source::SourceFile;
use csfe_test_utils::{fixed_content_type, Workspace, DOCUMENT_MODEL};
use pretty_assertions::assert_eq;

fn run(ws: &Workspace, answers: &[&str]) -> csfe_core::RunReport {
    let mut prompt = ScriptedPrompt::from_lines(answers.iter().copied());
    let report = Runner::new(Settings::default(), ws.root())
        .run(&mut prompt)
        .unwrap();
    assert_eq!(prompt.remaining(), 0, "unused answers");
    report
}

fn recorded(ws: &Workspace, class: &str, field: &str) -> Option<RecordState> {
    HistoryStore::open(ws.history_path())
        .unwrap()
        .decode_class(class)
        .unwrap()
        .shift_remove(field)
}

#[test]
fn new_field_with_default_static_content_type() {
    let ws = Workspace::with_document_model();
    let report = run(&ws, &["n", "n", "static", "", "unhandled"]);

    assert!(report.is_success());
    assert_eq!(
        report.files[0].classes[0].actions,
        [ActionKind::NewKey, ActionKind::ApplyHistory]
    );
    assert_eq!(
        recorded(&ws, "Document", "file"),
        Some(RecordState::Resolved(fixed_content_type(
            "application/octet-stream"
        )))
    );
    let source = ws.read("models.py");
    assert!(source.contains("    file_content_type: ClassVar[str] = 'application/octet-stream'\n"));
    assert!(source.contains("    def file_sync_file(self) -> flask.Response:\n"));
    assert!(!source.contains("file_display_name"));
}

#[test]
fn new_field_with_created_content_type_column() {
    let ws = Workspace::with_document_model();
    run(&ws, &["n", "n", "dynamic", "n", "", "unhandled"]);

    assert_eq!(
        recorded(&ws, "Document", "file"),
        Some(RecordState::Resolved(FieldResolution::new(
            FacetResolution::Reference("file_content_type_col".into()),
            FacetResolution::Unhandled,
        )))
    );
    let source = ws.read("models.py");
    assert!(source.contains(
        "    file_content_type_col: Mapped[str | None] = mapped_column(String, nullable=True)\n"
    ));
    assert!(source.contains("        return self.file_content_type_col\n"));
    assert!(source.contains("        self.file_content_type = content_type\n"));
}

#[test]
fn rename_of_fully_unhandled_field() {
    let ws = Workspace::with_document_model();
    ws.write("csfe.yaml", "Document:\n  old_key:\n    fully_unhandled: true\n");
    let report = run(&ws, &["y", "1", "n", "static", "", "static", ""]);

    assert_eq!(
        report.files[0].classes[0].actions,
        [ActionKind::Rename, ActionKind::ApplyHistory]
    );
    let history = HistoryStore::open(ws.history_path()).unwrap();
    assert_eq!(history.fields("Document"), ["file"]);
    assert_eq!(
        recorded(&ws, "Document", "file"),
        Some(RecordState::Resolved(FieldResolution::new(
            FacetResolution::Fixed("application/octet-stream".into()),
            FacetResolution::Fixed("binary.file".into()),
        )))
    );
    let source = ws.read("models.py");
    assert!(source.contains("    file_display_name: ClassVar[str] = 'binary.file'\n"));
}

#[test]
fn clean_removal_of_fully_unhandled_field() {
    let ws = Workspace::new();
    let model = "class Archive(Base):\n    __tablename__ = 'archives'\n\n    id: Mapped[int] = mapped_column(primary_key=True)\n";
    ws.write("models.py", model);
    ws.write("csfe.yaml", "Archive:\n  old_key:\n    fully_unhandled: true\n");

    let report = run(&ws, &["clean"]);
    assert_eq!(
        report.files[0].classes[0].actions,
        [ActionKind::RemoveClean, ActionKind::ApplyHistory]
    );
    assert!(!report.files[0].classes[0].source_changed);
    assert_eq!(ws.read("models.py"), model);
    assert!(HistoryStore::open(ws.history_path())
        .unwrap()
        .class("Archive")
        .is_none());
}

#[test]
fn readded_field_is_regenerated_once_per_run() {
    let ws = Workspace::with_document_model();
    ws.write(
        "csfe.yaml",
        "Document:\n  file:\n    fully_unhandled: true\n  old:\n    content_type_fixed: text/plain\n    display_name_unhandled: true\n",
    );

    let report = run(&ws, &["re_add"]);
    assert_eq!(
        report.files[0].classes[0].actions,
        [ActionKind::ReAdd, ActionKind::ApplyHistory]
    );
    assert!(report.files[0].classes[0].source_changed);
    let source = ws.read("models.py");
    assert!(source.contains("    old_content_type: ClassVar[str] = 'text/plain'\n"));
    assert!(source.contains("    def old_sync_file(self) -> flask.Response:\n"));
    assert!(recorded(&ws, "Document", "old").is_some());

    let report = run(&ws, &["as_is"]);
    assert_eq!(
        report.files[0].classes[0].actions,
        [ActionKind::RemoveAsIs, ActionKind::ApplyHistory]
    );
    assert_eq!(ws.read("models.py"), source);
    assert!(recorded(&ws, "Document", "old").is_none());
}

#[test]
fn second_run_asks_nothing_and_changes_nothing() {
    let ws = Workspace::with_document_model();
    run(&ws, &["n", "n", "dynamic", "y", "1", "static", "report.pdf"]);
    let first = ws.read("models.py");
    let history = ws.read("csfe.yaml");

    let report = run(&ws, &[]);
    assert_eq!(report.files[0].classes[0].actions, [ActionKind::ApplyHistory]);
    assert_eq!(ws.read("models.py"), first);
    assert_eq!(ws.read("csfe.yaml"), history);
}

#[test]
fn syntax_error_fails_only_its_module() {
    let ws = Workspace::with_document_model();
    ws.write("broken.py", "class Broken(:\n    pass\n");
    let mut prompt = ScriptedPrompt::from_lines(["n", "y"]);
    let report = Runner::new(Settings::default(), ws.root())
        .run(&mut prompt)
        .unwrap();

    assert_eq!(report.failures(), 1);
    assert!(!report.is_success());
    assert!(report.files[0].error.is_some());
    assert_eq!(report.files[1].classes[0].actions.len(), 2);
}

#[test]
fn running_out_of_answers_interrupts() {
    let ws = Workspace::with_document_model();
    ws.write("more.py", DOCUMENT_MODEL);
    let mut prompt = ScriptedPrompt::from_lines(["n"]);
    let report = Runner::new(Settings::default(), ws.root())
        .run(&mut prompt)
        .unwrap();

    assert!(report.interrupted());
    assert_eq!(report.files.len(), 1);
    assert_eq!(ws.read("models.py"), DOCUMENT_MODEL);
}

#[test]
fn failed_source_write_leaves_history_untouched() {
    let ws = Workspace::with_document_model();
    let settings = Settings::default();
    let mut file = SourceFile::load(ws.path("models.py")).unwrap();
    let mut history = HistoryStore::open(ws.history_path()).unwrap();

    fs::remove_file(ws.path("models.py")).unwrap();
    fs::create_dir(ws.path("models.py")).unwrap();

    let action = Action::NewKey {
        name: "file".into(),
        resolution: fixed_content_type("image/png"),
    };
    let err = Executor::new(&settings)
        .execute(&mut file, "Document", &action, &mut history)
        .unwrap_err();
    assert!(matches!(err, ExecuteError::SourceWrite(_)));
    assert_eq!(file.text(), DOCUMENT_MODEL);
    assert!(history.tree().is_empty());
    assert_eq!(ws.read("csfe.yaml"), "");
}

#[test]
fn failed_history_write_keeps_store_unchanged() {
    let ws = Workspace::with_document_model();
    let settings = Settings::default();
    let mut file = SourceFile::load(ws.path("models.py")).unwrap();
    let mut history = HistoryStore::open(ws.history_path()).unwrap();

    fs::remove_file(ws.history_path()).unwrap();
    fs::create_dir(ws.history_path()).unwrap();

    let action = Action::NewKey {
        name: "file".into(),
        resolution: fixed_content_type("image/png"),
    };
    let err = Executor::new(&settings)
        .execute(&mut file, "Document", &action, &mut history)
        .unwrap_err();
    assert!(err.is_persistence());
    assert!(history.tree().is_empty());
}
