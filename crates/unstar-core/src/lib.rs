//! unstar core
//!
//! Domain types shared by every unstar crate: column scopes, model targets,
//! configuration and diagnostics.

pub mod scope;
pub mod target;
pub mod config;
pub mod diagnostic;

pub use scope::{ColumnScope, UNQUALIFIED};
pub use target::ModelTarget;
pub use config::{Config, ConfigError, DialectConfig, ExpansionStrategy};
pub use diagnostic::{Diagnostic, DiagnosticCode, Location};
