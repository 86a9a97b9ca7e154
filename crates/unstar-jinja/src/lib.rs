//! Jinja template rendering for dbt SQL models
//!
//! Downstream models are analyzed for the columns they read. When only the
//! templated source of a model is available, it is rendered here with stub
//! dbt functions (ref, source, var, config, is_incremental) so that a plain
//! SQL parser can read it.

pub mod preprocessor;
pub mod context;
pub mod functions;

pub use preprocessor::{JinjaPreprocessor, PreprocessError};
pub use context::{DbtContext, TargetContext};
pub use functions::{ref_function, source_function, var_function, config_function, is_incremental_function};
