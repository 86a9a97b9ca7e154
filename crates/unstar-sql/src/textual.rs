//! Line-based `SELECT *` expansion
//!
//! Only lines of the shape `<indent>select * <rest>` are rewritten; the star
//! becomes the union of the scope columns, one per line. Everything else
//! (comments, template tags, `DISTINCT`, qualified stars, multi-line select
//! lists) passes through untouched, so the original formatting survives.

use regex::Regex;
use std::sync::LazyLock;
use unstar_core::ColumnScope;

use crate::expander::Expansion;
use crate::layout::quoted_len;

static SELECT_STAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^([ \t]*)(select)[ \t]+\*(?:[ \t]+(.*))?$").unwrap());

const COLUMN_INDENT: &str = "    ";

pub(crate) fn expand_lines(sql: &str, scope: &ColumnScope) -> Expansion {
    let columns = scope.union();
    let mut out = String::with_capacity(sql.len());
    let mut expanded = 0;
    let mut in_block_comment = false;

    for line in sql.split_inclusive('\n') {
        let (content, eol) = split_terminator(line);

        let was_in_comment = in_block_comment;
        in_block_comment = block_comment_open_after(content, in_block_comment);

        if was_in_comment || columns.is_empty() {
            out.push_str(line);
            continue;
        }

        let Some(caps) = SELECT_STAR_RE.captures(content) else {
            out.push_str(line);
            continue;
        };

        let rest = caps.get(3).map_or("", |m| m.as_str().trim_start());
        if rest.starts_with(',') {
            out.push_str(line);
            continue;
        }

        let indent = &caps[1];
        let newline = if eol.is_empty() { "\n" } else { eol };

        out.push_str(indent);
        out.push_str(&caps[2]);
        for (i, column) in columns.iter().enumerate() {
            out.push_str(newline);
            out.push_str(indent);
            out.push_str(COLUMN_INDENT);
            out.push_str(column);
            if i + 1 < columns.len() {
                out.push(',');
            }
        }
        if !rest.is_empty() {
            out.push_str(newline);
            out.push_str(indent);
            out.push_str(rest);
        }
        out.push_str(eol);

        expanded += 1;
    }

    if expanded == 0 {
        return Expansion {
            sql: sql.to_string(),
            expanded: 0,
            unexpanded: 0,
        };
    }

    tracing::debug!(expanded, "expanded select-star lines");

    Expansion {
        sql: out,
        expanded,
        unexpanded: 0,
    }
}

fn split_terminator(line: &str) -> (&str, &str) {
    if let Some(content) = line.strip_suffix("\r\n") {
        (content, "\r\n")
    } else if let Some(content) = line.strip_suffix('\n') {
        (content, "\n")
    } else {
        (line, "")
    }
}

/// Whether a `/* */` comment is still open at the end of `line`
///
/// Quoted strings and identifiers are skipped, so `'/*%'` opens nothing.
fn block_comment_open_after(line: &str, mut open: bool) -> bool {
    let mut rest = line;

    loop {
        if open {
            match rest.find("*/") {
                Some(pos) => {
                    rest = &rest[pos + 2..];
                    open = false;
                }
                None => return true,
            }
            continue;
        }

        let Some(pos) = rest.find(['/', '-', '\'', '"', '`']) else {
            return false;
        };
        let tail = &rest[pos..];

        if tail.starts_with("/*") {
            rest = &tail[2..];
            open = true;
        } else if tail.starts_with("--") {
            return false;
        } else if tail.starts_with(['\'', '"', '`']) {
            rest = &tail[quoted_len(tail)..];
        } else {
            rest = &tail[1..];
        }
    }
}
