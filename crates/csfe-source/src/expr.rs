//! Expressions and statements of generated accessor bodies
//!
//! Only the shapes the editors emit are modelled; anything else is carried as
//! [`Expr::Raw`] / [`Statement::Raw`] and printed back unchanged.

use std::fmt::{self, Display, Formatter};

/// Python expression
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Expr {
    /// Bare identifier
    Name(String),
    /// `self.<attr>`
    SelfAttr(String),
    /// `<base>.<attr>`
    Attr { base: Box<Expr>, attr: String },
    /// Plain single-line string literal, unescaped content
    Str(String),
    /// `None`
    NoneLit,
    /// Call with positional and keyword arguments
    Call {
        func: Box<Expr>,
        args: Vec<Expr>,
        kwargs: Vec<(String, Expr)>,
    },
    /// `await <expr>`
    Await(Box<Expr>),
    /// Anything else, verbatim
    Raw(String),
}

impl Expr {
    /// Identifier
    #[inline]
    #[must_use]
    pub fn name(name: impl Into<String>) -> Self {
        Self::Name(name.into())
    }

    /// `self.<attr>`
    #[inline]
    #[must_use]
    pub fn self_attr(attr: impl Into<String>) -> Self {
        Self::SelfAttr(attr.into())
    }

    /// String literal
    #[inline]
    #[must_use]
    pub fn string(value: impl Into<String>) -> Self {
        Self::Str(value.into())
    }

    /// Dotted path such as `flask.send_file`
    #[must_use]
    pub fn path(dotted: &str) -> Self {
        let mut parts = dotted.split('.');
        let head = Self::Name(parts.next().unwrap_or_default().to_string());
        parts.fold(head, |base, attr| Self::Attr {
            base: Box::new(base),
            attr: attr.to_string(),
        })
    }

    /// Attribute access on this expression
    #[inline]
    #[must_use]
    pub fn dot(self, attr: impl Into<String>) -> Self {
        Self::Attr {
            base: Box::new(self),
            attr: attr.into(),
        }
    }

    /// Call this expression
    #[must_use]
    pub fn call(self, args: Vec<Expr>, kwargs: Vec<(&str, Expr)>) -> Self {
        Self::Call {
            func: Box::new(self),
            args,
            kwargs: kwargs
                .into_iter()
                .map(|(name, value)| (name.to_string(), value))
                .collect(),
        }
    }

    /// `await self`
    #[inline]
    #[must_use]
    pub fn awaited(self) -> Self {
        Self::Await(Box::new(self))
    }

    /// Name of the callee when this is a call to a plain or dotted name
    #[must_use]
    pub fn callee(&self) -> Option<&str> {
        match self {
            Self::Call { func, .. } => match func.as_ref() {
                Self::Name(name) | Self::Attr { attr: name, .. } => Some(name),
                _ => None,
            },
            _ => None,
        }
    }

    /// Rewrite every `self.<old>` into `self.<new>`; returns the number rewritten
    pub fn rename_self_attr(&mut self, old: &str, new: &str) -> usize {
        match self {
            Self::SelfAttr(attr) if attr == old => {
                *attr = new.to_string();
                1
            }
            Self::Attr { base, .. } | Self::Await(base) => base.rename_self_attr(old, new),
            Self::Call { func, args, kwargs } => {
                func.rename_self_attr(old, new)
                    + args
                        .iter_mut()
                        .map(|arg| arg.rename_self_attr(old, new))
                        .sum::<usize>()
                    + kwargs
                        .iter_mut()
                        .map(|(_, value)| value.rename_self_attr(old, new))
                        .sum::<usize>()
            }
            _ => 0,
        }
    }

    /// Whether `self.<attr>` occurs anywhere in this expression
    #[must_use]
    pub fn mentions_self_attr(&self, name: &str) -> bool {
        match self {
            Self::SelfAttr(attr) => attr == name,
            Self::Attr { base, .. } | Self::Await(base) => base.mentions_self_attr(name),
            Self::Call { func, args, kwargs } => {
                func.mentions_self_attr(name)
                    || args.iter().any(|arg| arg.mentions_self_attr(name))
                    || kwargs.iter().any(|(_, value)| value.mentions_self_attr(name))
            }
            _ => false,
        }
    }
}

fn write_quoted(f: &mut Formatter<'_>, value: &str) -> fmt::Result {
    f.write_str("'")?;
    for c in value.chars() {
        match c {
            '\\' => f.write_str("\\\\")?,
            '\'' => f.write_str("\\'")?,
            '\n' => f.write_str("\\n")?,
            c => write!(f, "{c}")?,
        }
    }
    f.write_str("'")
}

impl Display for Expr {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name(name) | Self::Raw(name) => f.write_str(name),
            Self::SelfAttr(attr) => write!(f, "self.{attr}"),
            Self::Attr { base, attr } => write!(f, "{base}.{attr}"),
            Self::Str(value) => write_quoted(f, value),
            Self::NoneLit => f.write_str("None"),
            Self::Call { func, args, kwargs } => {
                write!(f, "{func}(")?;
                let mut first = true;
                for arg in args {
                    if !first {
                        f.write_str(", ")?;
                    }
                    first = false;
                    write!(f, "{arg}")?;
                }
                for (name, value) in kwargs {
                    if !first {
                        f.write_str(", ")?;
                    }
                    first = false;
                    write!(f, "{name}={value}")?;
                }
                f.write_str(")")
            }
            Self::Await(inner) => write!(f, "await {inner}"),
        }
    }
}

/// Statement inside an accessor body
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Statement {
    /// `<target> = <value>`
    Assign { target: Expr, value: Expr },
    /// `return <expr>`
    Return(Expr),
    /// Verbatim statement
    Raw(String),
}

impl Statement {
    /// Assignment
    #[inline]
    #[must_use]
    pub fn assign(target: Expr, value: Expr) -> Self {
        Self::Assign { target, value }
    }

    /// Target of an assignment
    #[inline]
    #[must_use]
    pub fn target(&self) -> Option<&Expr> {
        match self {
            Self::Assign { target, .. } => Some(target),
            _ => None,
        }
    }

    /// Rewrite every `self.<old>` into `self.<new>`
    pub fn rename_self_attr(&mut self, old: &str, new: &str) -> usize {
        match self {
            Self::Assign { target, value } => {
                target.rename_self_attr(old, new) + value.rename_self_attr(old, new)
            }
            Self::Return(value) => value.rename_self_attr(old, new),
            Self::Raw(_) => 0,
        }
    }
}

impl Display for Statement {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Assign { target, value } => write!(f, "{target} = {value}"),
            Self::Return(value) => write!(f, "return {value}"),
            Self::Raw(text) => f.write_str(text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dotted_call_prints() {
        let call = Expr::path("flask.send_file").call(
            vec![Expr::path("io.BytesIO").call(vec![Expr::name("data")], vec![])],
            vec![("mimetype", Expr::name("content_type"))],
        );
        assert_eq!(
            call.to_string(),
            "flask.send_file(io.BytesIO(data), mimetype=content_type)"
        );
        assert_eq!(call.callee(), Some("send_file"));
    }

    #[test]
    fn string_escaping() {
        assert_eq!(Expr::string("it's").to_string(), r"'it\'s'");
        assert_eq!(Expr::string("a\\b").to_string(), r"'a\\b'");
    }

    #[test]
    fn rename_reaches_nested_calls() {
        let mut stmt = Statement::Return(
            Expr::path("f").call(vec![Expr::self_attr("old")], vec![("k", Expr::self_attr("old"))]),
        );
        assert_eq!(stmt.rename_self_attr("old", "new"), 2);
        assert_eq!(stmt.to_string(), "return f(self.new, k=self.new)");
    }

    #[test]
    fn await_prints() {
        let expr = Expr::name("upload").dot("read").call(vec![], vec![]).awaited();
        assert_eq!(expr.to_string(), "await upload.read()");
    }
}
