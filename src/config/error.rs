use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("required settings file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("failed to load settings file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse settings file '{path}' at line {line}: {message}")]
    ParseError {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("The base directory of the module '{module}' does not exist: {}", path.display())]
    ModuleBaseDirNotFound { module: String, path: PathBuf },

    #[error("The properties file of the module '{module}' does not exist: {}", path.display())]
    ModuleFileNotFound { module: String, path: PathBuf },

    #[error("no base directory set for the modules declared under '{0}'")]
    MissingBaseDir(String),

    #[error("error when resolving base directory of module '{module}': {source}")]
    BaseDirIdentity {
        module: String,
        source: std::io::Error,
    },

    #[error("cyclic module reference: module '{module}' loads {} again", path.display())]
    CyclicModule { module: String, path: PathBuf },

    #[error("module '{module}' exceeds the maximum module depth of {max_depth}")]
    ModuleDepthExceeded { module: String, max_depth: usize },

    #[error("cannot determine the working directory: {0}")]
    WorkingDir(#[source] std::io::Error),

    #[error("invalid JSON in environment variable {var}: {source}")]
    InvalidJsonParams {
        var: String,
        source: serde_json::Error,
    },

    #[error("found a loop resolving placeholders, for variable: {0}")]
    CircularReference(String),
}
