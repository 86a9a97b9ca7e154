//! Adapter registry

use std::collections::BTreeMap;

use crate::adapter::{AdapterError, ProjectAdapter};
use crate::dbt_adapter::DbtAdapter;
use crate::sql_adapter::SqlAdapter;

/// Adapters available to a run, keyed by name
///
/// Built explicitly by the caller and handed to whoever needs an adapter.
#[derive(Default)]
pub struct AdapterRegistry {
    adapters: BTreeMap<&'static str, Box<dyn ProjectAdapter>>,
}

impl AdapterRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in `dbt` and `sql` adapters
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(DbtAdapter::new());
        registry.register(SqlAdapter::new());
        registry
    }

    /// Add an adapter, replacing any adapter registered under the same name
    pub fn register(&mut self, adapter: impl ProjectAdapter + 'static) -> &mut Self {
        self.adapters.insert(adapter.name(), Box::new(adapter));
        self
    }

    pub fn get(&self, name: &str) -> Result<&dyn ProjectAdapter, AdapterError> {
        self.adapters
            .get(name)
            .map(|adapter| &**adapter)
            .ok_or_else(|| AdapterError::UnknownAdapter {
                name: name.to_string(),
                available: self.names().join(", "),
            })
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<&'static str> {
        self.adapters.keys().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_registered() {
        let registry = AdapterRegistry::with_defaults();
        assert_eq!(registry.names(), vec!["dbt", "sql"]);
        assert_eq!(registry.get("dbt").unwrap().name(), "dbt");
        assert_eq!(registry.get("sql").unwrap().name(), "sql");
    }

    #[test]
    fn unknown_adapter_lists_available() {
        let registry = AdapterRegistry::with_defaults();
        let err = registry.get("looker").err().unwrap();
        assert_eq!(err.to_string(), "Unknown adapter 'looker'. Available: dbt, sql");
    }

    #[test]
    fn empty_registry() {
        let registry = AdapterRegistry::new();
        assert!(registry.names().is_empty());
        assert!(registry.get("dbt").is_err());
    }
}
