//! SQL parsing and `SELECT *` expansion
//!
//! This crate handles:
//! - Parsing SQL using datafusion-sqlparser-rs
//! - Separating leading/trailing comments and template blocks from the statement body
//! - Expanding star projections into explicit column lists (structural or textual)
//! - Collecting the columns a downstream query references

pub mod parser;
pub mod layout;
pub mod expander;
pub mod textual;
pub mod columns;

pub use parser::{SqlParser, ParseError};
pub use layout::{SourceLayout, TemplateMask};
pub use expander::{StarExpander, Expansion, expand_select_stars};
pub use columns::{collect_columns, infer_downstream_columns};
