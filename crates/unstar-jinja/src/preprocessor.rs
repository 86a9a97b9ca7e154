//! Jinja template preprocessing
//!
//! Converts dbt SQL models with Jinja templates to plain SQL.

use minijinja::{Environment, Error as JinjaError};
use crate::context::DbtContext;

/// Error during Jinja preprocessing
#[derive(Debug, thiserror::Error)]
pub enum PreprocessError {
    #[error("Jinja render error: {message}")]
    RenderError {
        message: String,
        line: Option<usize>,
    },
}

impl From<JinjaError> for PreprocessError {
    fn from(error: JinjaError) -> Self {
        Self::RenderError {
            message: error.to_string(),
            line: error.line(),
        }
    }
}

/// Jinja template preprocessor for dbt SQL
pub struct JinjaPreprocessor {
    env: Environment<'static>,
    context: DbtContext,
}

impl JinjaPreprocessor {
    /// Create a new preprocessor with the given dbt context
    pub fn new(context: DbtContext) -> Self {
        let mut env = Environment::new();

        // Register dbt functions
        env.add_function("ref", crate::functions::ref_function);
        env.add_function("source", crate::functions::source_function);
        env.add_function("var", crate::functions::var_function);
        env.add_function("config", crate::functions::config_function);
        env.add_function("is_incremental", crate::functions::is_incremental_function);

        Self { env, context }
    }

    /// Create a preprocessor with default context
    pub fn with_defaults() -> Self {
        Self::new(DbtContext::default())
    }

    /// Check if SQL contains Jinja templates
    pub fn has_jinja(sql: &str) -> bool {
        sql.contains("{{") || sql.contains("{%") || sql.contains("{#")
    }

    /// Render SQL with Jinja templates; SQL without templates is returned as-is
    pub fn preprocess(&self, sql: &str) -> Result<String, PreprocessError> {
        if !Self::has_jinja(sql) {
            return Ok(sql.to_string());
        }

        let rendered = self.env.render_str(sql, self.context.to_minijinja_value())?;
        Ok(rendered)
    }

    /// Render if possible, falling back to the original text
    pub fn preprocess_or_original(&self, sql: &str) -> String {
        match self.preprocess(sql) {
            Ok(rendered) => rendered,
            Err(e) => {
                tracing::debug!(error = %e, "template rendering failed; using raw SQL");
                sql.to_string()
            }
        }
    }
}

impl Default for JinjaPreprocessor {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_has_jinja() {
        assert!(JinjaPreprocessor::has_jinja("select * from {{ ref('table') }}"));
        assert!(JinjaPreprocessor::has_jinja("{% set var = 'value' %}"));
        assert!(JinjaPreprocessor::has_jinja("{# comment #}"));
        assert!(!JinjaPreprocessor::has_jinja("select * from orders"));
    }

    #[test]
    fn test_no_jinja_passthrough() {
        let preprocessor = JinjaPreprocessor::with_defaults();
        let sql = "select * from orders";
        assert_eq!(preprocessor.preprocess(sql).unwrap(), sql);
    }

    #[test]
    fn test_ref_and_source() {
        let preprocessor = JinjaPreprocessor::with_defaults();
        let sql = "select a from {{ ref('my_table') }} join {{ source('raw', 'events') }} using (id)";

        assert_eq!(
            preprocessor.preprocess(sql).unwrap(),
            "select a from my_table join raw.events using (id)"
        );
    }

    #[test]
    fn test_config_and_incremental_blocks() {
        let preprocessor = JinjaPreprocessor::with_defaults();
        let sql = "{{ config(materialized='incremental') }}select id from t{% if is_incremental() %} where id > 0{% endif %}";

        assert_eq!(preprocessor.preprocess(sql).unwrap(), "select id from t");
    }

    #[test]
    fn test_var_from_context_and_default() {
        let mut context = DbtContext::default();
        context.add_var("min_id", serde_json::json!(10));
        let preprocessor = JinjaPreprocessor::new(context);

        let rendered = preprocessor
            .preprocess("select id from t where id > {{ var('min_id') }} and x = '{{ var('other', 'd') }}'")
            .unwrap();
        assert_eq!(rendered, "select id from t where id > 10 and x = 'd'");
    }

    #[test]
    fn test_undefined_var_falls_back_to_original() {
        let preprocessor = JinjaPreprocessor::with_defaults();
        let sql = "select id from t where id > {{ var('missing') }}";

        assert!(preprocessor.preprocess(sql).is_err());
        assert_eq!(preprocessor.preprocess_or_original(sql), sql);
    }

    #[test]
    fn test_jinja_comment_removal() {
        let preprocessor = JinjaPreprocessor::with_defaults();
        let sql = "{#- This is a comment -#}\nselect * from orders";
        assert_eq!(preprocessor.preprocess(sql).unwrap().trim(), "select * from orders");
    }
}
