pub mod loader;
pub mod schema;

pub use loader::{load_from_path, load_from_paths, load_from_str, ConfigError, RuleSource};
pub use schema::{
    Pattern, ReplaceConfig, Settings, ValidationError, ValidationIssue, DEFAULT_HIGHLIGHT_COLOR,
    DEFAULT_MAX_SWEEPS,
};
