//! Configuration for the parser, the history compressor and the Yandex summarizer
//!
//! Loaded from YAML; every section falls back to defaults so an empty file (or no file
//! at all) gives a working configuration apart from Yandex credentials, which resolve
//! from the environment when they are actually needed.

pub mod types;
pub mod loader;

pub use types::*;
pub use loader::*;


use crate::errors::ChatCoreError;
use std::path::Path;

/// Load a configuration from a YAML file
pub async fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig, ChatCoreError> {
    ConfigLoader::from_file(path).await
}
