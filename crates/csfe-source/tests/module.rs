//! Whole-module parsing and splicing

use csfe_source::{binary_fields, parse_classes, string_columns, Attribute, Expr, SourceFile};
use pretty_assertions::assert_eq;

const MODULE: &str = "\
\"\"\"Billing models.\"\"\"
from dataclasses import dataclass

from sqlalchemy import Column, LargeBinary, String, Text
from sqlalchemy.orm import Mapped, mapped_column


@dataclass
class Invoice(Base):
    \"\"\"An issued invoice.\"\"\"

    __tablename__ = 'invoices'

    id: Mapped[int] = mapped_column(primary_key=True)
    number: Mapped[str] = mapped_column(String(32))
    # rendered document
    pdf = Column(LargeBinary)
    pdf_name = Column(Text, nullable=True)

    def total(self) -> int:
        return 0


def factory():
    class Local(Base):
        blob: Mapped[bytes] = mapped_column(LargeBinary)

    return Local


class Attachment(Base):
    data: Mapped[bytes | None] = mapped_column(LargeBinary, nullable=True)
";

#[test]
fn only_top_level_classes_are_lifted() {
    let names: Vec<String> = parse_classes(MODULE, "billing.py")
        .unwrap()
        .into_iter()
        .map(|class| class.name)
        .collect();
    assert_eq!(names, ["Invoice", "Attachment"]);
}

#[test]
fn columns_are_classified() {
    let file = SourceFile::from_text(MODULE);
    let invoice = file.members("Invoice").unwrap();
    assert_eq!(binary_fields(&invoice), ["pdf"]);
    assert_eq!(string_columns(&invoice), ["number", "pdf_name"]);

    let attachment = file.members("Attachment").unwrap();
    assert_eq!(binary_fields(&attachment), ["data"]);
    assert!(string_columns(&attachment).is_empty());
}

#[test]
fn unchanged_classes_keep_the_module_verbatim() {
    let mut file = SourceFile::from_text(MODULE);
    for class in ["Invoice", "Attachment"] {
        let members = file.members(class).unwrap();
        assert!(!file.replace_class(class, &members).unwrap());
    }
    assert_eq!(file.text(), MODULE);
}

#[test]
fn appended_member_lands_in_its_class_only() {
    let mut file = SourceFile::from_text(MODULE);
    let mut members = file.members("Attachment").unwrap();
    members.push(
        Attribute::new("data_content_type")
            .with_annotation("ClassVar[str]")
            .with_value(Expr::string("application/pdf"))
            .into(),
    );
    assert!(file.replace_class("Attachment", &members).unwrap());

    let expected = format!(
        "{MODULE}    data_content_type: ClassVar[str] = 'application/pdf'\n"
    );
    assert_eq!(file.text(), expected);
    assert_eq!(
        file.members("Invoice").unwrap(),
        SourceFile::from_text(MODULE).members("Invoice").unwrap()
    );
}

#[test]
fn syntax_error_is_reported_with_origin() {
    let err = parse_classes("class Broken(:\n    pass\n", "broken.py").unwrap_err();
    assert!(err.to_string().contains("broken.py"));
}
