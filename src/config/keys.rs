//! Control keys recognized while resolving the configuration.

pub const SCANNER_HOME: &str = "scanner.home";
pub const SCANNER_SETTINGS: &str = "scanner.settings";
pub const PROJECT_HOME: &str = "project.home";
pub const PROJECT_SETTINGS: &str = "project.settings";
pub const MODULES: &str = "sonar.modules";
pub const PROJECT_BASEDIR: &str = "sonar.projectBaseDir";
pub const PROJECT_CONFIG_FILE: &str = "sonar.projectConfigFile";
pub const BOOTSTRAP_START_TIME: &str = "sonar.scanner.bootstrapStartTime";

/// File name looked up in the root project and every module base directory.
pub const PROJECT_SETTINGS_FILENAME: &str = "sonar-project.properties";

/// Location of the global settings file, relative to the scanner home.
pub const SCANNER_SETTINGS_PATH: &str = "conf/sonar-scanner.properties";
