//! Python egress
//!
//! Prints a [`MemberList`] as a class body. Untouched members are emitted
//! from their original text together with the whitespace that preceded them;
//! new or mutated members are rendered from structure.

use crate::list::MemberList;
use crate::member::Member;

fn wants_blank(prev: &Member, next: &Member) -> bool {
    prev.is_accessor() || next.is_accessor()
}

/// Print a class body, starting at the body's first column
///
/// The first line carries no indentation, continuation lines are indented
/// with the list's indent. An empty body prints as `pass`.
#[must_use]
pub fn render_body(list: &MemberList) -> String {
    let indent = list.indent();
    let mut out = String::new();
    let mut prev: Option<&Member> = None;

    for entry in list.entries() {
        if let Some(prev) = prev {
            let blank = wants_blank(prev, &entry.member);
            let kept = entry.gap.as_deref().filter(|gap| {
                if entry.verbatim.is_some() {
                    return !gap.is_empty();
                }
                let newlines = gap.matches('\n').count();
                newlines > 1 || (newlines == 1 && !blank)
            });
            match kept {
                Some(gap) => out.push_str(gap),
                None => {
                    out.push('\n');
                    if blank {
                        out.push('\n');
                    }
                    out.push_str(indent);
                }
            }
        }
        match &entry.verbatim {
            Some(text) => out.push_str(text),
            None => out.push_str(&entry.member.render(indent)),
        }
        prev = Some(&entry.member);
    }

    if out.is_empty() {
        out.push_str("pass");
    }
    out
}

/// Print a class body as indented lines, one member after another
#[must_use]
pub fn render_indented(list: &MemberList) -> String {
    format!("{}{}\n", list.indent(), render_body(list))
}
