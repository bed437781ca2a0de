pub mod config;

pub use config::{Conf, ConfBuilder, ConfigError, PropertyBag};
