//! Configuration resolution: settings files, module discovery and source precedence.

mod bag;
mod builder;
mod env;
mod error;
mod file;
pub mod keys;
mod modules;
mod parse;
mod paths;
mod resolve;
mod source;

pub use bag::{parse_list, PropertyBag};
pub use builder::{Conf, ConfBuilder};
pub use env::environment_properties;
pub use error::ConfigError;
pub use file::{load, load_optional};
pub use modules::{ModuleTreeBuilder, DEFAULT_MAX_MODULE_DEPTH};
pub use paths::{normalize, resolve_absolute, root_base_dir};
pub use resolve::resolve_placeholders;
pub use source::{merge, merge_layers, ConfigSource, Layer};
