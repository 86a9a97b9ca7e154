//! Column references of downstream queries

use sqlparser::ast::{visit_expressions, Expr};
use std::collections::BTreeSet;
use std::ops::ControlFlow;
use unstar_core::{ColumnScope, UNQUALIFIED};

use crate::parser::SqlParser;

/// Column names referenced anywhere in `sql`
///
/// Qualified references contribute their last part (`o.amount` gives
/// `amount`). SQL that does not parse contributes nothing.
pub fn collect_columns(parser: &SqlParser, sql: &str) -> BTreeSet<String> {
    let statements = match parser.parse(sql) {
        Ok(statements) => statements,
        Err(e) => {
            tracing::debug!(error = %e, "skipping unparsable downstream SQL");
            return BTreeSet::new();
        }
    };

    let mut columns = BTreeSet::new();
    let _ = visit_expressions(&statements, |expr| {
        match expr {
            Expr::Identifier(ident) => {
                columns.insert(ident.value.clone());
            }
            Expr::CompoundIdentifier(idents) => {
                if let Some(last) = idents.last() {
                    columns.insert(last.value.clone());
                }
            }
            _ => {}
        }
        ControlFlow::<()>::Continue(())
    });

    columns
}

/// Unqualified scope holding every column the given SQL texts reference
///
/// No attempt is made to attribute a column to a particular source table.
/// Returns an empty scope when nothing was found.
pub fn infer_downstream_columns<S: AsRef<str>>(parser: &SqlParser, sql_texts: &[S]) -> ColumnScope {
    let union: BTreeSet<String> = sql_texts
        .iter()
        .flat_map(|sql| collect_columns(parser, sql.as_ref()))
        .collect();

    if union.is_empty() {
        return ColumnScope::new();
    }

    let mut scope = ColumnScope::new();
    scope.extend(UNQUALIFIED, union);
    scope
}
