//! SQL parsing using datafusion-sqlparser-rs

use sqlparser::ast::Statement;
use sqlparser::dialect::{Dialect, GenericDialect, BigQueryDialect, PostgreSqlDialect, SnowflakeDialect};
use sqlparser::parser::{Parser, ParserError};
use unstar_core::DialectConfig;

/// SQL parser with configurable dialect
pub struct SqlParser {
    dialect: Box<dyn Dialect>,
    config: DialectConfig,
}

impl SqlParser {
    /// Create a new SQL parser with the default (generic) dialect
    pub fn new() -> Self {
        Self::from_dialect(DialectConfig::Ansi)
    }

    /// Create a parser from a dialect config
    pub fn from_dialect(config: DialectConfig) -> Self {
        let dialect: Box<dyn Dialect> = match config {
            DialectConfig::BigQuery => Box::new(BigQueryDialect {}),
            DialectConfig::Snowflake => Box::new(SnowflakeDialect {}),
            DialectConfig::Postgres => Box::new(PostgreSqlDialect {}),
            DialectConfig::Ansi => Box::new(GenericDialect {}),
        };

        Self { dialect, config }
    }

    /// Quote character for identifiers that need quoting in this dialect
    pub fn identifier_quote(&self) -> char {
        match self.config {
            DialectConfig::BigQuery => '`',
            _ => '"',
        }
    }

    /// Parse SQL string into statements
    pub fn parse(&self, sql: &str) -> Result<Vec<Statement>, ParseError> {
        let statements = Parser::parse_sql(&*self.dialect, sql)?;
        if statements.is_empty() {
            return Err(ParseError::Empty);
        }
        Ok(statements)
    }
}

impl Default for SqlParser {
    fn default() -> Self {
        Self::new()
    }
}

/// SQL parsing error
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("SQL parse error: {0}")]
    Syntax(#[from] ParserError),

    #[error("no SQL statement found")]
    Empty,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_simple_select() {
        let parser = SqlParser::new();
        let statements = parser.parse("SELECT id, name FROM users WHERE active = true").unwrap();

        assert_eq!(statements.len(), 1);
        assert!(matches!(statements[0], Statement::Query(_)));
    }

    #[test]
    fn parse_invalid_sql() {
        let parser = SqlParser::new();
        assert!(matches!(parser.parse("INVALID SQL"), Err(ParseError::Syntax(_))));
    }

    #[test]
    fn parse_empty_input() {
        let parser = SqlParser::new();
        assert!(matches!(parser.parse("  "), Err(ParseError::Empty)));
    }

    #[test]
    fn different_dialects() {
        let sql = "SELECT id FROM users";

        for dialect in [
            DialectConfig::Ansi,
            DialectConfig::BigQuery,
            DialectConfig::Postgres,
            DialectConfig::Snowflake,
        ] {
            let parser = SqlParser::from_dialect(dialect);
            assert!(parser.parse(sql).is_ok(), "{dialect:?} should parse simple SQL");
        }
    }

    #[test]
    fn identifier_quotes() {
        assert_eq!(SqlParser::from_dialect(DialectConfig::BigQuery).identifier_quote(), '`');
        assert_eq!(SqlParser::new().identifier_quote(), '"');
    }
}
