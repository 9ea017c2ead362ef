//! Generated member shapes
//!
//! Every member the editors emit is built here, so a member parsed back from
//! a previous run compares equal to a freshly generated one.

use csfe_model::{naming, AdapterFlavor, Facet, FieldResolution};
use csfe_source::{Accessor, Attribute, Expr, Member, Param, Statement};

const FACET_TYPE: &str = "str | None";

/// `name: ClassVar[str] = '<value>'`
#[must_use]
pub fn facet_literal(name: &str, value: &str) -> Member {
    Attribute::new(name)
        .with_annotation("ClassVar[str]")
        .with_value(Expr::string(value))
        .into()
}

/// `@property` returning `self.<column>`
#[must_use]
pub fn facet_getter(name: &str, column: &str) -> Member {
    Accessor::getter(name, FACET_TYPE, vec![Statement::Return(Expr::self_attr(column))]).into()
}

/// Setter assigning into `self.<column>`
#[must_use]
pub fn facet_setter(name: &str, column: &str) -> Member {
    Accessor::setter(
        name,
        Param::typed("value", FACET_TYPE),
        vec![Statement::assign(Expr::self_attr(column), Expr::name("value"))],
    )
    .into()
}

/// Nullable string column materialised for a facet reference
#[must_use]
pub fn reference_column(name: &str) -> Member {
    Attribute::new(name)
        .with_annotation("Mapped[str | None]")
        .with_value(Expr::name("mapped_column").call(
            vec![Expr::name("String")],
            vec![("nullable", Expr::Raw("True".to_string()))],
        ))
        .into()
}

fn facet_source(field: &str, resolution: &FieldResolution, facet: Facet) -> Expr {
    if resolution.facet(facet).is_handled() {
        Expr::self_attr(naming::facet_member(field, facet))
    } else {
        Expr::NoneLit
    }
}

fn local(name: &str) -> Expr {
    Expr::name(name)
}

/// Download accessor of a transport adapter
#[must_use]
pub fn adapter_getter(field: &str, resolution: &FieldResolution, flavor: AdapterFlavor) -> Member {
    let name = naming::adapter_member(field, flavor);
    let mut body = vec![
        Statement::assign(local("data"), Expr::self_attr(field)),
        Statement::assign(
            local("content_type"),
            facet_source(field, resolution, Facet::ContentType),
        ),
        Statement::assign(
            local("display_name"),
            facet_source(field, resolution, Facet::DisplayName),
        ),
    ];
    let (returns, response) = match flavor {
        AdapterFlavor::Synchronous => (
            "flask.Response",
            Expr::path("flask.send_file").call(
                vec![Expr::path("io.BytesIO").call(vec![local("data")], vec![])],
                vec![
                    ("mimetype", local("content_type")),
                    ("download_name", local("display_name")),
                ],
            ),
        ),
        AdapterFlavor::Asynchronous => (
            "starlette.responses.Response",
            Expr::path("starlette.responses.Response").call(
                vec![local("data")],
                vec![
                    ("media_type", local("content_type")),
                    (
                        "headers",
                        Expr::Raw(
                            "{'Content-Disposition': f'attachment; filename=\"{display_name}\"'} if display_name else None"
                                .to_string(),
                        ),
                    ),
                ],
            ),
        ),
    };
    body.push(Statement::Return(response));
    Accessor::getter(name, returns, body)
        .asynchronous(flavor.is_async())
        .into()
}

/// Upload accessor of a transport adapter
///
/// Facet assignments are emitted only for dynamic facets; a static or
/// unhandled facet has nothing to store.
#[must_use]
pub fn adapter_setter(field: &str, resolution: &FieldResolution, flavor: AdapterFlavor) -> Member {
    let name = naming::adapter_member(field, flavor);
    let upload = || local("upload");
    let (upload_type, content_type_attr, read) = match flavor {
        AdapterFlavor::Synchronous => (
            "werkzeug.datastructures.FileStorage",
            "mimetype",
            upload().dot("read").call(vec![], vec![]),
        ),
        AdapterFlavor::Asynchronous => (
            "starlette.datastructures.UploadFile",
            "content_type",
            upload().dot("read").call(vec![], vec![]).awaited(),
        ),
    };

    let mut body = vec![
        Statement::assign(local("content_type"), upload().dot(content_type_attr)),
        Statement::assign(local("display_name"), upload().dot("filename")),
        Statement::assign(local("data"), read),
        Statement::assign(Expr::self_attr(field), local("data")),
    ];
    for (facet, value) in [
        (Facet::ContentType, "content_type"),
        (Facet::DisplayName, "display_name"),
    ] {
        if resolution.reference(facet).is_some() {
            body.push(Statement::assign(
                Expr::self_attr(naming::facet_member(field, facet)),
                local(value),
            ));
        }
    }
    Accessor::setter(name, Param::typed("upload", upload_type), body)
        .asynchronous(flavor.is_async())
        .into()
}
