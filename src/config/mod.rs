pub mod loader;
pub mod schema;

pub use loader::{load_from_path, load_from_str, resolve, ConfigError, URL_ENV_VAR};
pub use schema::{
    ReviewConfig, ReviewSettings, ServiceConfig, ValidationError, ValidationIssue,
    DEFAULT_PRIMARY_CONTEXT, DEFAULT_SERVICE_URL,
};
