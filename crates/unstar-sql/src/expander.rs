//! `SELECT *` expansion
//!
//! Replaces star projections with explicit column lists taken from a
//! [`ColumnScope`]. Expansion never fails: SQL that cannot be handled is
//! returned unchanged, byte for byte.
//!
//! Two strategies are available and never mixed within one call:
//!
//! - [`ExpansionStrategy::Structural`] parses the statement body and rewrites
//!   every `SELECT` (CTEs, subqueries and set operations included). `*`
//!   expands to the union of all scope columns and `t.*` to the columns of
//!   qualifier `t`. The body is re-serialized, so its internal formatting and
//!   comments are normalized; leading/trailing comments and template blocks
//!   are kept as-is.
//! - [`ExpansionStrategy::Textual`] rewrites lines of the form `select * ...`
//!   in place (see [`crate::textual`]).

use sqlparser::ast::{
    Expr, Ident, ObjectName, Query, SelectItem, SetExpr, VisitMut, VisitorMut,
    WildcardAdditionalOptions,
};
use std::collections::BTreeSet;
use std::ops::ControlFlow;
use unstar_core::{ColumnScope, DialectConfig, ExpansionStrategy};

use crate::layout::SourceLayout;
use crate::parser::SqlParser;
use crate::textual;

/// Outcome of expanding one SQL text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expansion {
    /// Rewritten SQL, or the input itself when nothing was expanded
    pub sql: String,

    /// Number of star items replaced by columns
    pub expanded: usize,

    /// Number of star items left literal (no columns known, or modifiers present)
    pub unexpanded: usize,
}

impl Expansion {
    fn unchanged(sql: &str) -> Self {
        Self {
            sql: sql.to_string(),
            expanded: 0,
            unexpanded: 0,
        }
    }

    pub fn is_changed(&self) -> bool {
        self.expanded > 0
    }
}

/// Star expander with a fixed strategy and dialect
pub struct StarExpander {
    strategy: ExpansionStrategy,
    parser: SqlParser,
}

impl StarExpander {
    pub fn new(strategy: ExpansionStrategy, dialect: DialectConfig) -> Self {
        Self {
            strategy,
            parser: SqlParser::from_dialect(dialect),
        }
    }

    /// Expand star projections in `sql` using `scope`
    ///
    /// Returns `sql` unchanged when no star could be expanded.
    pub fn expand(&self, sql: &str, scope: &ColumnScope) -> String {
        self.expand_with_stats(sql, scope).sql
    }

    /// Like [`StarExpander::expand`], also reporting how many stars were touched
    pub fn expand_with_stats(&self, sql: &str, scope: &ColumnScope) -> Expansion {
        if scope.is_empty() {
            return Expansion::unchanged(sql);
        }

        match self.strategy {
            ExpansionStrategy::Structural => self.expand_structural(sql, scope),
            ExpansionStrategy::Textual => textual::expand_lines(sql, scope),
        }
    }

    fn expand_structural(&self, sql: &str, scope: &ColumnScope) -> Expansion {
        let Some(layout) = SourceLayout::split(sql) else {
            return Expansion::unchanged(sql);
        };

        if layout.has_template_blocks() {
            tracing::debug!("template blocks inside the statement; leaving SQL unchanged");
            return Expansion::unchanged(sql);
        }

        let Some(mask) = layout.mask_body() else {
            return Expansion::unchanged(sql);
        };

        let mut statements = match self.parser.parse(&mask.masked) {
            Ok(statements) => statements,
            Err(e) => {
                tracing::debug!(error = %e, "unparsable SQL; leaving unchanged");
                return Expansion::unchanged(sql);
            }
        };

        let mut rewriter = StarRewriter::new(scope, self.parser.identifier_quote());
        let _ = statements.visit(&mut rewriter);

        if rewriter.expanded == 0 {
            return Expansion {
                unexpanded: rewriter.unexpanded,
                ..Expansion::unchanged(sql)
            };
        }

        let rendered = statements
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(";\n");

        let Some(body) = mask.unmask(&rendered) else {
            tracing::debug!("template expressions moved during re-serialization; leaving unchanged");
            return Expansion::unchanged(sql);
        };

        Expansion {
            sql: layout.with_body(&body),
            expanded: rewriter.expanded,
            unexpanded: rewriter.unexpanded,
        }
    }
}

impl Default for StarExpander {
    fn default() -> Self {
        Self::new(ExpansionStrategy::default(), DialectConfig::default())
    }
}

/// Expand with the default (structural, ANSI) expander
pub fn expand_select_stars(sql: &str, scope: &ColumnScope) -> String {
    StarExpander::default().expand(sql, scope)
}

/// Rewrites star items in every query it visits
struct StarRewriter<'a> {
    scope: &'a ColumnScope,
    union: BTreeSet<&'a str>,
    quote: char,
    expanded: usize,
    unexpanded: usize,
}

impl<'a> StarRewriter<'a> {
    fn new(scope: &'a ColumnScope, quote: char) -> Self {
        Self {
            scope,
            union: scope.union(),
            quote,
            expanded: 0,
            unexpanded: 0,
        }
    }

    fn rewrite_set_expr(&mut self, body: &mut SetExpr) {
        match body {
            SetExpr::Select(select) => {
                let projection = std::mem::take(&mut select.projection);
                select.projection = self.rewrite_projection(projection);
            }
            SetExpr::SetOperation { left, right, .. } => {
                self.rewrite_set_expr(left);
                self.rewrite_set_expr(right);
            }
            // Nested queries are visited on their own
            _ => {}
        }
    }

    fn rewrite_projection(&mut self, projection: Vec<SelectItem>) -> Vec<SelectItem> {
        let mut out = Vec::with_capacity(projection.len());

        for item in projection {
            let replacement = match &item {
                SelectItem::Wildcard(options) if is_plain(options) => self.expand_wildcard(),
                SelectItem::QualifiedWildcard(name, options) if is_plain(options) => {
                    self.expand_qualified(name)
                }
                // EXCLUDE / REPLACE / ... change what the star means
                SelectItem::Wildcard(_) | SelectItem::QualifiedWildcard(..) => {
                    self.unexpanded += 1;
                    None
                }
                _ => None,
            };

            match replacement {
                Some(columns) => out.extend(columns),
                None => out.push(item),
            }
        }

        out
    }

    fn expand_wildcard(&mut self) -> Option<Vec<SelectItem>> {
        if self.union.is_empty() {
            self.unexpanded += 1;
            return None;
        }

        self.expanded += 1;
        Some(
            self.union
                .iter()
                .map(|column| SelectItem::UnnamedExpr(column_expr(&[], column, self.quote)))
                .collect(),
        )
    }

    fn expand_qualified(&mut self, name: &ObjectName) -> Option<Vec<SelectItem>> {
        let scope = self.scope;
        let columns = qualifier_keys(name)
            .iter()
            .find_map(|key| scope.get(key).filter(|cols| !cols.is_empty()));

        let Some(columns) = columns else {
            self.unexpanded += 1;
            return None;
        };

        self.expanded += 1;
        Some(
            columns
                .iter()
                .map(|column| SelectItem::UnnamedExpr(column_expr(&name.0, column, self.quote)))
                .collect(),
        )
    }
}

impl VisitorMut for StarRewriter<'_> {
    type Break = ();

    fn pre_visit_query(&mut self, query: &mut Query) -> ControlFlow<Self::Break> {
        self.rewrite_set_expr(&mut query.body);
        ControlFlow::Continue(())
    }
}

/// A star without EXCLUDE / EXCEPT / REPLACE / RENAME / ILIKE modifiers
fn is_plain(options: &WildcardAdditionalOptions) -> bool {
    options.opt_ilike.is_none()
        && options.opt_exclude.is_none()
        && options.opt_except.is_none()
        && options.opt_replace.is_none()
        && options.opt_rename.is_none()
}

/// Scope keys tried for a qualified star: the full dotted name, then its last part
fn qualifier_keys(name: &ObjectName) -> Vec<String> {
    let full = name
        .0
        .iter()
        .map(|ident| ident.value.as_str())
        .collect::<Vec<_>>()
        .join(".");

    let mut keys = vec![full];
    if name.0.len() > 1 {
        if let Some(last) = name.0.last() {
            keys.push(last.value.clone());
        }
    }
    keys
}

/// Column reference, qualified by `qualifier` when it is non-empty
///
/// Dotted scope entries (`t1.a`) become compound identifiers.
fn column_expr(qualifier: &[Ident], column: &str, quote: char) -> Expr {
    let parts: Vec<&str> = if column.split('.').any(str::is_empty) {
        vec![column]
    } else {
        column.split('.').collect()
    };

    let mut idents = qualifier.to_vec();
    idents.extend(parts.into_iter().map(|part| column_ident(part, quote)));

    if idents.len() == 1 {
        Expr::Identifier(idents.remove(0))
    } else {
        Expr::CompoundIdentifier(idents)
    }
}

fn column_ident(name: &str, quote: char) -> Ident {
    let mut chars = name.chars();
    let plain = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');

    if plain {
        Ident::new(name)
    } else {
        Ident::with_quote(quote, name)
    }
}
