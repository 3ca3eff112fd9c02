mod loader;
mod types;

pub use loader::{ENV_FILE_VAR, config_from_lookup, load_config};
pub use types::*;
