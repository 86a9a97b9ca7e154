//! Source layout of a model file
//!
//! A model file is split into three spans:
//!
//! - `prefix`: whitespace, comments and template blocks before the statement
//!   (e.g. a `{{ config(...) }}` header or a license comment)
//! - `body`: the SQL statement(s) themselves
//! - `suffix`: trailing semicolons, whitespace, comments and `{% ... %}` blocks
//!
//! Only the body is ever handed to the SQL parser; prefix and suffix are
//! reattached byte-for-byte. Inside the body, `{{ ... }}` expressions are
//! masked with placeholder identifiers so the parser sees plain SQL.

use std::ops::Range;

const PLACEHOLDER_PREFIX: &str = "__unstar_tpl_";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SegmentKind {
    Whitespace,
    Comment,
    /// `{{ ... }}`
    TemplateExpr,
    /// `{% ... %}` or `{# ... #}`
    TemplateBlock,
    Semicolon,
    Code,
}

#[derive(Debug, Clone)]
struct Segment {
    kind: SegmentKind,
    range: Range<usize>,
}

/// Prefix / body / suffix split of a SQL source text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLayout<'a> {
    pub prefix: &'a str,
    pub body: &'a str,
    pub suffix: &'a str,
    has_template_blocks: bool,
    template_exprs: Vec<Range<usize>>,
}

impl<'a> SourceLayout<'a> {
    /// Split `sql`; returns `None` when there is no SQL code at all
    pub fn split(sql: &'a str) -> Option<Self> {
        let segments = scan(sql);

        let first = segments.iter().position(|s| s.kind == SegmentKind::Code)?;
        let last = segments
            .iter()
            .rposition(|s| matches!(s.kind, SegmentKind::Code | SegmentKind::TemplateExpr))?;

        let start = segments[first].range.start;
        let end = segments[last].range.end;
        let body_segments = &segments[first..=last];

        let has_template_blocks = body_segments
            .iter()
            .any(|s| s.kind == SegmentKind::TemplateBlock);

        let template_exprs = body_segments
            .iter()
            .filter(|s| s.kind == SegmentKind::TemplateExpr)
            .map(|s| s.range.start - start..s.range.end - start)
            .collect();

        Some(Self {
            prefix: &sql[..start],
            body: &sql[start..end],
            suffix: &sql[end..],
            has_template_blocks,
            template_exprs,
        })
    }

    /// Whether the body contains `{% ... %}` or `{# ... #}` blocks
    pub fn has_template_blocks(&self) -> bool {
        self.has_template_blocks
    }

    /// Mask `{{ ... }}` expressions of the body with placeholder identifiers
    ///
    /// Returns `None` if the body already contains text that looks like a
    /// placeholder, since unmasking would then be ambiguous.
    pub fn mask_body(&self) -> Option<TemplateMask> {
        if self.body.contains(PLACEHOLDER_PREFIX) {
            return None;
        }

        let mut masked = String::with_capacity(self.body.len());
        let mut originals = Vec::with_capacity(self.template_exprs.len());
        let mut preceding = Vec::with_capacity(self.template_exprs.len());
        let mut cursor = 0;

        for (i, range) in self.template_exprs.iter().enumerate() {
            masked.push_str(&self.body[cursor..range.start]);
            preceding.push(preceding_token(&masked).to_ascii_lowercase());
            masked.push_str(&placeholder(i));
            originals.push(self.body[range.clone()].to_string());
            cursor = range.end;
        }
        masked.push_str(&self.body[cursor..]);

        Some(TemplateMask {
            masked,
            originals,
            preceding,
        })
    }

    /// Reassemble prefix, a new body and suffix
    pub fn with_body(&self, body: &str) -> String {
        let mut out = String::with_capacity(self.prefix.len() + body.len() + self.suffix.len());
        out.push_str(self.prefix);
        out.push_str(body);
        out.push_str(self.suffix);
        out
    }
}

/// A statement body with its template expressions replaced by placeholders
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateMask {
    /// Body text the SQL parser can read
    pub masked: String,
    originals: Vec<String>,

    /// Lowercased token right before each placeholder in `masked`
    preceding: Vec<String>,
}

impl TemplateMask {
    /// Put the original template text back in place of every placeholder
    ///
    /// Returns `None` unless each placeholder occurs exactly once in `sql`
    /// and is still preceded by the same token. A placeholder the parser
    /// read as an alias comes back as `AS __unstar_tpl_N__`, which would
    /// turn `from t {{ macro() }}` into `FROM t AS {{ macro() }}`.
    pub fn unmask(&self, sql: &str) -> Option<String> {
        for (i, expected) in self.preceding.iter().enumerate() {
            let token = placeholder(i);
            let mut hits = sql.match_indices(&token);
            let (pos, _) = hits.next()?;
            if hits.next().is_some() || !preceding_token(&sql[..pos]).eq_ignore_ascii_case(expected) {
                return None;
            }
        }

        let mut out = sql.to_string();
        for (i, original) in self.originals.iter().enumerate() {
            out = out.replacen(&placeholder(i), original, 1);
        }
        Some(out)
    }
}

fn placeholder(index: usize) -> String {
    format!("{PLACEHOLDER_PREFIX}{index}__")
}

/// Last word (or punctuation character) of `text`, ignoring trailing whitespace
fn preceding_token(text: &str) -> &str {
    let trimmed = text.trim_end();
    let is_word = |c: char| c.is_alphanumeric() || c == '_';

    match trimmed.chars().next_back() {
        Some(c) if is_word(c) => {
            let start = trimmed
                .rfind(|c: char| !is_word(c))
                .map(|idx| idx + trimmed[idx..].chars().next().map_or(1, char::len_utf8))
                .unwrap_or(0);
            &trimmed[start..]
        }
        Some(c) => &trimmed[trimmed.len() - c.len_utf8()..],
        None => "",
    }
}

/// Split `sql` into lexical segments
///
/// Linear in the input length: every branch consumes at least one byte.
fn scan(sql: &str) -> Vec<Segment> {
    let bytes = sql.as_bytes();
    let mut segments: Vec<Segment> = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let start = i;
        let rest = &sql[i..];

        let kind = if bytes[i].is_ascii_whitespace() {
            i += rest
                .find(|c: char| !c.is_ascii_whitespace())
                .unwrap_or(rest.len());
            SegmentKind::Whitespace
        } else if rest.starts_with("--") {
            i += rest.find('\n').unwrap_or(rest.len());
            SegmentKind::Comment
        } else if rest.starts_with("/*") {
            i += find_after(rest, 2, "*/");
            SegmentKind::Comment
        } else if rest.starts_with("{{") {
            i += find_after(rest, 2, "}}");
            SegmentKind::TemplateExpr
        } else if rest.starts_with("{%") {
            i += find_after(rest, 2, "%}");
            SegmentKind::TemplateBlock
        } else if rest.starts_with("{#") {
            i += find_after(rest, 2, "#}");
            SegmentKind::TemplateBlock
        } else if bytes[i] == b';' {
            i += 1;
            SegmentKind::Semicolon
        } else if matches!(bytes[i], b'\'' | b'"' | b'`') {
            i += quoted_len(rest);
            SegmentKind::Code
        } else {
            // Run of ordinary code up to the next byte that may open another segment
            let len = rest
                .char_indices()
                .skip(1)
                .find(|&(_, c)| {
                    c.is_ascii_whitespace() || matches!(c, '-' | '/' | '{' | ';' | '\'' | '"' | '`')
                })
                .map(|(idx, _)| idx)
                .unwrap_or(rest.len());
            i += len;
            SegmentKind::Code
        };

        match segments.last_mut() {
            Some(prev) if prev.kind == kind && kind == SegmentKind::Code => prev.range.end = i,
            _ => segments.push(Segment { kind, range: start..i }),
        }
    }

    segments
}

/// Length up to and including `close`, searching from `skip`; the whole rest if unterminated
fn find_after(rest: &str, skip: usize, close: &str) -> usize {
    rest[skip..]
        .find(close)
        .map(|pos| skip + pos + close.len())
        .unwrap_or(rest.len())
}

/// Length of a quoted string or identifier, honouring doubled quotes
pub(crate) fn quoted_len(rest: &str) -> usize {
    let bytes = rest.as_bytes();
    let quote = bytes[0];
    let mut i = 1;

    while i < bytes.len() {
        if bytes[i] == quote {
            if bytes.get(i + 1) == Some(&quote) {
                i += 2;
                continue;
            }
            return i + 1;
        }
        i += 1;
    }

    bytes.len()
}
