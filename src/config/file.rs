//! File-based property source.

use std::path::Path;

use tracing::{debug, trace};

use super::parse::parse_properties;
use super::{ConfigError, PropertyBag};

/// Loads a settings file that must exist.
///
/// Every value is trimmed of surrounding whitespace after parsing.
pub fn load(path: &Path) -> Result<PropertyBag, ConfigError> {
    load_settings_file(path, true)?.ok_or_else(|| ConfigError::FileNotFound(path.to_path_buf()))
}

/// Loads a settings file if it exists as a regular file.
///
/// Returns `Ok(None)` if nothing is found at `path`.
pub fn load_optional(path: &Path) -> Result<Option<PropertyBag>, ConfigError> {
    load_settings_file(path, false)
}

fn load_settings_file(path: &Path, required: bool) -> Result<Option<PropertyBag>, ConfigError> {
    if !path.is_file() {
        if required {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }
        trace!("No settings file at {}", path.display());
        return Ok(None);
    }

    let bytes = std::fs::read(path).map_err(|e| ConfigError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;
    let contents = String::from_utf8(bytes).map_err(|e| ConfigError::ReadError {
        path: path.to_path_buf(),
        source: std::io::Error::new(std::io::ErrorKind::InvalidData, e),
    })?;

    let pairs = parse_properties(&contents).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        line: e.line,
        message: e.message,
    })?;

    let bag: PropertyBag = pairs
        .into_iter()
        .map(|(key, value)| (key, value.trim().to_string()))
        .collect();
    debug!("Loaded {} properties from {}", bag.len(), path.display());
    Ok(Some(bag))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    #[test]
    fn test_load_trims_values() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "sonar.projectKey =   my-project   ").unwrap();
        writeln!(file, "sonar.sources=\tsrc\t").unwrap();

        let bag = load(file.path()).unwrap();
        assert_eq!(bag.get("sonar.projectKey"), Some("my-project"));
        assert_eq!(bag.get("sonar.sources"), Some("src"));
    }

    #[test]
    fn test_load_required_missing() {
        let result = load(Path::new("/nonexistent/path/sonar-project.properties"));
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_load_directory_is_not_a_file() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(load(dir.path()), Err(ConfigError::FileNotFound(_))));
        assert!(load_optional(dir.path()).unwrap().is_none());
    }

    #[test]
    fn test_load_optional_missing() {
        let result = load_optional(Path::new("/nonexistent/path/sonar-project.properties"));
        assert!(result.unwrap().is_none());
    }

    #[test]
    fn test_load_malformed_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "a=1").unwrap();
        writeln!(file, "b=\\uZZZZ").unwrap();

        match load(file.path()) {
            Err(ConfigError::ParseError { line, .. }) => assert_eq!(line, 2),
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_load_invalid_utf8() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"a=\xff\xfe\n").unwrap();

        assert!(matches!(load(file.path()), Err(ConfigError::ReadError { .. })));
    }
}
