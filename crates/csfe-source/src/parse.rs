//! Python ingress
//!
//! Parses a module with tree-sitter and lifts each top-level class body into
//! a [`MemberList`]. Only the body's byte range is tracked; everything around
//! it is left to the caller to preserve.

use std::ops::Range;

use tree_sitter::{Node, Parser, Tree};

use crate::error::SourceError;
use crate::expr::{Expr, Statement};
use crate::list::MemberList;
use crate::member::{Accessor, AccessorRole, Attribute, Member, Param};

/// Class declaration lifted from a module
#[derive(Debug, Clone)]
pub struct ParsedClass {
    /// Class name
    pub name: String,
    /// Body members
    pub members: MemberList,
    pub(crate) region: Range<usize>,
    pub(crate) inline: bool,
}

fn node_text<'a>(node: Node<'_>, src: &'a [u8]) -> &'a str {
    node.utf8_text(src).unwrap_or("")
}

fn field_text<'a>(node: Node<'_>, field: &str, src: &'a [u8]) -> Option<&'a str> {
    node.child_by_field_name(field).map(|n| node_text(n, src))
}

fn first_named(node: Node<'_>) -> Option<Node<'_>> {
    let mut cursor = node.walk();
    let first = node.named_children(&mut cursor).next();
    first
}

fn first_error(node: Node<'_>) -> Option<Node<'_>> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    let mut cursor = node.walk();
    let children: Vec<_> = node.children(&mut cursor).collect();
    children.into_iter().find_map(first_error)
}

/// Parse a module, rejecting sources with syntax errors
pub(crate) fn parse_tree(source: &str, origin: &str) -> Result<Tree, SourceError> {
    let language: tree_sitter::Language = tree_sitter_python::LANGUAGE.into();
    let mut parser = Parser::new();
    parser
        .set_language(&language)
        .map_err(|e| SourceError::ParserInit(e.to_string()))?;

    let tree = parser
        .parse(source, None)
        .ok_or_else(|| SourceError::ParseFailed(origin.to_string()))?;

    let root = tree.root_node();
    if root.has_error() {
        let (line, column) = first_error(root).map_or((1, 1), |node| {
            let position = node.start_position();
            (position.row + 1, position.column + 1)
        });
        return Err(SourceError::Syntax {
            origin: origin.to_string(),
            line,
            column,
        });
    }
    Ok(tree)
}

/// Parse every top-level class of a module
///
/// # Errors
///
/// Returns [`SourceError::Syntax`] when the module does not parse cleanly.
pub fn parse_classes(source: &str, origin: &str) -> Result<Vec<ParsedClass>, SourceError> {
    let tree = parse_tree(source, origin)?;
    let root = tree.root_node();

    let mut classes = Vec::new();
    let mut cursor = root.walk();
    for node in root.named_children(&mut cursor) {
        let class = match node.kind() {
            "class_definition" => Some(node),
            "decorated_definition" => node
                .child_by_field_name("definition")
                .filter(|def| def.kind() == "class_definition"),
            _ => None,
        };
        if let Some(class) = class {
            if let Some(parsed) = lift_class(class, source) {
                tracing::trace!(class = %parsed.name, members = parsed.members.len(), "parsed class");
                classes.push(parsed);
            }
        }
    }
    Ok(classes)
}

fn line_start(source: &str, offset: usize) -> usize {
    source[..offset].rfind('\n').map_or(0, |i| i + 1)
}

fn leading_whitespace(line: &str) -> &str {
    let trimmed = line.trim_start_matches([' ', '\t']);
    &line[..line.len() - trimmed.len()]
}

fn lift_class(class: Node<'_>, source: &str) -> Option<ParsedClass> {
    let src = source.as_bytes();
    let name = field_text(class, "name", src)?.to_string();
    let body = class.child_by_field_name("body")?;

    let inline = body.start_position().row == class.start_position().row;
    let mut start = body.start_byte();
    let indent = if inline {
        let class_line = &source[line_start(source, class.start_byte())..];
        format!("{}    ", leading_whitespace(class_line))
    } else {
        source[line_start(source, start)..start].to_string()
    };
    if inline {
        while start > 0 && matches!(src[start - 1], b' ' | b'\t') {
            start -= 1;
        }
    }
    let mut end = body.end_byte();
    while end > start && src[end - 1].is_ascii_whitespace() {
        end -= 1;
    }

    let mut members = MemberList::with_indent(indent);
    let mut prev_end = start;
    let mut cursor = body.walk();
    for child in body.named_children(&mut cursor) {
        let gap = source.get(prev_end..child.start_byte()).unwrap_or("").to_string();
        let verbatim = node_text(child, src).to_string();
        members.push_parsed(lift_member(child, src), verbatim, gap);
        prev_end = child.end_byte();
    }

    Some(ParsedClass {
        name,
        members,
        region: start..end,
        inline,
    })
}

fn lift_member(node: Node<'_>, src: &[u8]) -> Member {
    let lifted = match node.kind() {
        "expression_statement" => lift_attribute(node, src).map(Member::Attribute),
        "decorated_definition" => lift_accessor(node, src).map(Member::Accessor),
        _ => None,
    };
    lifted.unwrap_or_else(|| Member::Opaque(node_text(node, src).to_string()))
}

fn lift_attribute(stmt: Node<'_>, src: &[u8]) -> Option<Attribute> {
    let mut cursor = stmt.walk();
    let children: Vec<_> = stmt.named_children(&mut cursor).collect();
    let [assignment] = children.as_slice() else {
        return None;
    };
    if assignment.kind() != "assignment" {
        return None;
    }
    let left = assignment.child_by_field_name("left")?;
    if left.kind() != "identifier" {
        return None;
    }
    let value = match assignment.child_by_field_name("right") {
        Some(right) if matches!(right.kind(), "assignment" | "augmented_assignment") => return None,
        Some(right) => Some(lift_expr(right, src)),
        None => None,
    };
    Some(Attribute {
        name: node_text(left, src).to_string(),
        annotation: field_text(*assignment, "type", src).map(str::to_string),
        value,
    })
}

fn lift_accessor(decorated: Node<'_>, src: &[u8]) -> Option<Accessor> {
    let function = decorated.child_by_field_name("definition")?;
    if function.kind() != "function_definition" {
        return None;
    }
    let name = field_text(function, "name", src)?.to_string();

    let mut cursor = decorated.walk();
    let decorators: Vec<_> = decorated
        .named_children(&mut cursor)
        .filter(|n| n.kind() == "decorator")
        .collect();
    let [decorator] = decorators.as_slice() else {
        return None;
    };
    let target = first_named(*decorator)?;
    let role = match target.kind() {
        "identifier" if node_text(target, src) == "property" => AccessorRole::Getter,
        "attribute"
            if field_text(target, "object", src) == Some(name.as_str())
                && field_text(target, "attribute", src) == Some("setter") =>
        {
            AccessorRole::Setter
        }
        _ => return None,
    };

    let mut cursor = function.walk();
    let is_async = function.children(&mut cursor).any(|n| n.kind() == "async");

    let parameters = function.child_by_field_name("parameters")?;
    let mut params = Vec::new();
    let mut cursor = parameters.walk();
    for param in parameters.named_children(&mut cursor) {
        match param.kind() {
            "identifier" => params.push(Param::plain(node_text(param, src))),
            "typed_parameter" => {
                let ident = first_named(param).filter(|n| n.kind() == "identifier")?;
                params.push(Param {
                    name: node_text(ident, src).to_string(),
                    annotation: field_text(param, "type", src).map(str::to_string),
                });
            }
            _ => return None,
        }
    }

    let block = function.child_by_field_name("body")?;
    let mut cursor = block.walk();
    let body = block
        .named_children(&mut cursor)
        .map(|stmt| lift_statement(stmt, src))
        .collect();

    Some(Accessor {
        role,
        name,
        is_async,
        params,
        returns: field_text(function, "return_type", src).map(str::to_string),
        body,
    })
}

fn lift_statement(stmt: Node<'_>, src: &[u8]) -> Statement {
    let raw = || Statement::Raw(node_text(stmt, src).to_string());
    match stmt.kind() {
        "return_statement" => match first_named(stmt) {
            Some(value) => Statement::Return(lift_expr(value, src)),
            None => raw(),
        },
        "expression_statement" => {
            let Some(assignment) = first_named(stmt).filter(|n| n.kind() == "assignment") else {
                return raw();
            };
            if assignment.child_by_field_name("type").is_some() {
                return raw();
            }
            match (
                assignment.child_by_field_name("left"),
                assignment.child_by_field_name("right"),
            ) {
                (Some(left), Some(right)) if right.kind() != "assignment" => Statement::Assign {
                    target: lift_expr(left, src),
                    value: lift_expr(right, src),
                },
                _ => raw(),
            }
        }
        _ => raw(),
    }
}

fn plain_string(text: &str) -> Option<String> {
    let quote = text.chars().next().filter(|c| *c == '\'' || *c == '"')?;
    if text.len() < 2 || !text.ends_with(quote) || text.starts_with(&quote.to_string().repeat(3)) {
        return None;
    }
    let inner = &text[1..text.len() - 1];
    if inner.contains(['\\', quote, '\n']) {
        return None;
    }
    Some(inner.to_string())
}

fn lift_expr(node: Node<'_>, src: &[u8]) -> Expr {
    let text = node_text(node, src);
    let raw = || Expr::Raw(text.to_string());
    match node.kind() {
        "identifier" => Expr::Name(text.to_string()),
        "none" => Expr::NoneLit,
        "string" => plain_string(text).map_or_else(raw, Expr::Str),
        "attribute" => {
            let (Some(object), Some(attr)) = (
                node.child_by_field_name("object"),
                field_text(node, "attribute", src),
            ) else {
                return raw();
            };
            if object.kind() == "identifier" && node_text(object, src) == "self" {
                Expr::SelfAttr(attr.to_string())
            } else {
                Expr::Attr {
                    base: Box::new(lift_expr(object, src)),
                    attr: attr.to_string(),
                }
            }
        }
        "await" => first_named(node).map_or_else(raw, |inner| Expr::Await(Box::new(lift_expr(inner, src)))),
        "call" => {
            let (Some(func), Some(arguments)) = (
                node.child_by_field_name("function"),
                node.child_by_field_name("arguments"),
            ) else {
                return raw();
            };
            if arguments.kind() != "argument_list" {
                return raw();
            }
            let mut args = Vec::new();
            let mut kwargs = Vec::new();
            let mut cursor = arguments.walk();
            for arg in arguments.named_children(&mut cursor) {
                match arg.kind() {
                    "keyword_argument" => {
                        let (Some(name), Some(value)) = (
                            field_text(arg, "name", src),
                            arg.child_by_field_name("value"),
                        ) else {
                            return raw();
                        };
                        kwargs.push((name.to_string(), lift_expr(value, src)));
                    }
                    "comment" | "list_splat" | "dictionary_splat" | "parenthesized_expression" => {
                        return raw();
                    }
                    _ => args.push(lift_expr(arg, src)),
                }
            }
            Expr::Call {
                func: Box::new(lift_expr(func, src)),
                args,
                kwargs,
            }
        }
        _ => raw(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::member::Slot;

    const MODEL: &str = "\
class Document(Base):
    __tablename__ = 'documents'

    id: Mapped[int] = mapped_column(primary_key=True)
    file: Mapped[bytes] = mapped_column(LargeBinary)
    file_content_type: ClassVar[str] = 'application/pdf'

    @property
    def file_display_name(self) -> str | None:
        return self.name_col

    @file_display_name.setter
    def file_display_name(self, value: str | None) -> None:
        self.name_col = value

    def describe(self):
        return self.id
";

    #[test]
    fn lifts_members() {
        let classes = parse_classes(MODEL, "model.py").unwrap();
        assert_eq!(classes.len(), 1);
        let class = &classes[0];
        assert_eq!(class.name, "Document");
        assert_eq!(class.members.indent(), "    ");
        assert_eq!(class.members.len(), 7);

        let file = class.members.attribute("file").unwrap();
        let attr = class.members.get(file).unwrap().as_attribute().unwrap();
        assert_eq!(attr.annotation.as_deref(), Some("Mapped[bytes]"));
        assert_eq!(attr.value.as_ref().and_then(Expr::callee), Some("mapped_column"));

        let literal = class.members.attribute("file_content_type").unwrap();
        assert_eq!(
            class.members.get(literal).unwrap().as_attribute().unwrap().value,
            Some(Expr::Str("application/pdf".into()))
        );

        let setter = class.members.find(Slot::Setter, "file_display_name").unwrap();
        let setter = class.members.get(setter).unwrap().as_accessor().unwrap();
        assert_eq!(setter.params[1].annotation.as_deref(), Some("str | None"));
        assert_eq!(
            setter.body,
            vec![Statement::assign(Expr::self_attr("name_col"), Expr::name("value"))]
        );

        let opaque = class.members.iter().filter(|(_, m)| m.name().is_none()).count();
        assert_eq!(opaque, 1);
    }

    #[test]
    fn async_accessor_detected() {
        let source = "class A:\n    @property\n    async def f(self) -> bytes:\n        return await self.g()\n";
        let classes = parse_classes(source, "a.py").unwrap();
        let getter = classes[0].members.getter("f").unwrap();
        let acc = classes[0].members.get(getter).unwrap().as_accessor().unwrap();
        assert!(acc.is_async);
        assert_eq!(
            acc.body,
            vec![Statement::Return(Expr::self_attr("g").call(vec![], vec![]).awaited())]
        );
    }

    #[test]
    fn foreign_decorators_stay_opaque() {
        let source = "class A:\n    @cached_property\n    def f(self):\n        return 1\n";
        let classes = parse_classes(source, "a.py").unwrap();
        assert!(classes[0].members.getter("f").is_none());
    }

    #[test]
    fn syntax_error_reported() {
        let err = parse_classes("class A(:\n    x = 1\n", "bad.py").unwrap_err();
        assert!(matches!(err, SourceError::Syntax { .. }));
    }

    #[test]
    fn escaped_strings_stay_raw() {
        assert_eq!(plain_string("'a.bin'"), Some("a.bin".into()));
        assert_eq!(plain_string(r"'it\'s'"), None);
        assert_eq!(plain_string("f'x'"), None);
        assert_eq!(plain_string("'''doc'''"), None);
    }
}
