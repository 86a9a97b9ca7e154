//! dbt Jinja functions
//!
//! Stand-ins for dbt's ref(), source(), var(), config() and is_incremental().
//! They only need to produce SQL a parser accepts, not the exact relation
//! names dbt would generate.

use minijinja::{Error, ErrorKind, State, Value};

/// ref() function - references another dbt model
///
/// Usage in Jinja: {{ ref('model_name') }} or {{ ref('package', 'model_name') }}
/// Returns: model_name
pub fn ref_function(model_or_package: Value, model_name: Option<Value>) -> Result<Value, Error> {
    let model = model_name.unwrap_or(model_or_package);

    let model_str = model.as_str().ok_or_else(|| {
        Error::new(ErrorKind::InvalidOperation, "ref() model name must be a string")
    })?;

    Ok(Value::from(model_str))
}

/// source() function - references a source table
///
/// Usage in Jinja: {{ source('source_name', 'table_name') }}
/// Returns: source_name.table_name
pub fn source_function(source_name: Value, table_name: Value) -> Result<Value, Error> {
    let source_str = source_name.as_str().ok_or_else(|| {
        Error::new(ErrorKind::InvalidOperation, "source() source name must be a string")
    })?;

    let table_str = table_name.as_str().ok_or_else(|| {
        Error::new(ErrorKind::InvalidOperation, "source() table name must be a string")
    })?;

    Ok(Value::from(format!("{}.{}", source_str, table_str)))
}

/// var() function - reads a project variable from the `vars` context entry
///
/// Usage in Jinja: {{ var('variable_name') }} or {{ var('variable_name', 'default') }}
pub fn var_function(state: &State, var_name: &str, default: Option<Value>) -> Result<Value, Error> {
    let from_context = state
        .lookup("vars")
        .and_then(|vars| vars.get_attr(var_name).ok())
        .filter(|value| !value.is_undefined());

    from_context.or(default).ok_or_else(|| {
        Error::new(
            ErrorKind::UndefinedError,
            format!("Variable '{}' is not defined", var_name),
        )
    })
}

/// config() function - model configuration is metadata, renders to nothing
pub fn config_function(_kwargs: minijinja::value::Kwargs) -> Result<Value, Error> {
    Ok(Value::from(""))
}

/// is_incremental() - always false, so templates render their full-refresh branch
pub fn is_incremental_function() -> bool {
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ref_single_arg() {
        let result = ref_function(Value::from("my_table"), None).unwrap();
        assert_eq!(result.as_str().unwrap(), "my_table");
    }

    #[test]
    fn test_ref_two_args() {
        let result = ref_function(Value::from("my_package"), Some(Value::from("my_table"))).unwrap();
        assert_eq!(result.as_str().unwrap(), "my_table");
    }

    #[test]
    fn test_ref_rejects_non_string() {
        assert!(ref_function(Value::from(3), None).is_err());
    }

    #[test]
    fn test_source() {
        let result = source_function(Value::from("raw"), Value::from("customers")).unwrap();
        assert_eq!(result.as_str().unwrap(), "raw.customers");
    }

    // var() and config() need a render state; they are exercised through
    // the preprocessor tests.
}
