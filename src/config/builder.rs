use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::env::environment_properties;
use super::file;
use super::keys::{
    BOOTSTRAP_START_TIME, PROJECT_BASEDIR, PROJECT_HOME, PROJECT_SETTINGS,
    PROJECT_SETTINGS_FILENAME, SCANNER_HOME, SCANNER_SETTINGS, SCANNER_SETTINGS_PATH,
};
use super::modules::{ModuleTreeBuilder, DEFAULT_MAX_MODULE_DEPTH};
use super::paths::{normalize, resolve_absolute, root_base_dir};
use super::resolve::resolve_placeholders;
use super::source::{merge, merge_layers, ConfigSource, Layer};
use super::{ConfigError, PropertyBag};

/// Builder for the scanner configuration.
///
/// Properties are gathered from several sources and merged with a fixed
/// precedence, lowest first:
///
/// 1. the global settings file (`<scanner.home>/conf/sonar-scanner.properties`,
///    or the file named by `scanner.settings`)
/// 2. the project settings file (`sonar-project.properties` in the project base
///    directory, or the file named by `project.settings`), together with the
///    settings of every module it declares
/// 3. system properties
/// 4. properties derived from the environment
/// 5. command-line properties
///
/// ## Placeholders
///
/// Values can reference other properties with `${some.key}` and environment
/// variables with `${env.NAME}`; see [`resolve_placeholders`].
///
/// ## Example
///
/// ```no_run
/// use scanner_conf::Conf;
///
/// let conf = Conf::builder()
///     .with_process_environment()
///     .with_cli_properties([("sonar.projectKey", "my-project")])
///     .build()?;
///
/// let props = conf.properties()?;
/// println!("base dir: {:?}", props.get("sonar.projectBaseDir"));
/// # Ok::<(), scanner_conf::ConfigError>(())
/// ```
#[derive(Debug, Default)]
#[must_use = "builders do nothing until .build() is called"]
pub struct ConfBuilder {
    cli: PropertyBag,
    system: PropertyBag,
    env: HashMap<String, String>,
    env_properties: Option<PropertyBag>,
    working_dir: Option<PathBuf>,
    max_module_depth: Option<usize>,
}

impl ConfBuilder {
    /// Sets the properties given on the command line (highest precedence).
    pub fn with_cli_properties<I, K, V>(mut self, props: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.cli.extend(props);
        self
    }

    /// Sets process-level system properties.
    pub fn with_system_properties<I, K, V>(mut self, props: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.system.extend(props);
        self
    }

    /// Sets the environment variables visible to the configuration.
    ///
    /// They are used both to derive environment properties and to expand
    /// `${env.NAME}` placeholders.
    pub fn with_environment<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.env.extend(vars.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Uses the environment of the current process.
    pub fn with_process_environment(self) -> Self {
        self.with_environment(std::env::vars())
    }

    /// Replaces the properties that would otherwise be derived from the
    /// environment variables.
    pub fn with_environment_properties<I, K, V>(mut self, props: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.env_properties = Some(props.into_iter().collect());
        self
    }

    /// Sets the directory relative paths are resolved against when no
    /// `project.home` is given. Defaults to the current directory; a relative
    /// directory is taken relative to the current directory.
    pub fn with_working_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.working_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Sets how deeply modules may be nested.
    pub fn with_max_module_depth(mut self, depth: usize) -> Self {
        self.max_module_depth = Some(depth);
        self
    }

    /// Captures the bootstrap start time and finalizes the inputs.
    pub fn build(self) -> Result<Conf, ConfigError> {
        let working_dir = match self.working_dir {
            Some(dir) if dir.is_absolute() => normalize(&dir),
            Some(dir) => {
                normalize(&std::env::current_dir().map_err(ConfigError::WorkingDir)?.join(dir))
            }
            None => std::env::current_dir().map_err(ConfigError::WorkingDir)?,
        };
        let env_properties = match self.env_properties {
            Some(props) => props,
            None => environment_properties(&self.env)?,
        };

        Ok(Conf {
            cli: self.cli,
            system: self.system,
            env: self.env,
            env_properties,
            working_dir,
            max_module_depth: self.max_module_depth.unwrap_or(DEFAULT_MAX_MODULE_DEPTH),
            start_time_ms: chrono::Utc::now().timestamp_millis(),
        })
    }
}

/// Resolved inputs of the scanner configuration.
#[derive(Debug, Clone)]
pub struct Conf {
    cli: PropertyBag,
    system: PropertyBag,
    env: HashMap<String, String>,
    env_properties: PropertyBag,
    working_dir: PathBuf,
    max_module_depth: usize,
    start_time_ms: i64,
}

impl Conf {
    /// Creates a new configuration builder.
    pub fn builder() -> ConfBuilder {
        ConfBuilder::default()
    }

    /// Epoch milliseconds captured when this configuration was built.
    pub fn start_time_ms(&self) -> i64 {
        self.start_time_ms
    }

    /// Absolute directory relative paths are resolved against when no
    /// `project.home` is set.
    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    /// Loads, merges and resolves all sources into one flat property bag.
    ///
    /// `sonar.projectBaseDir` is always present and absolute in the result,
    /// `project.home` is removed, and `sonar.scanner.bootstrapStartTime` holds
    /// [`start_time_ms`](Self::start_time_ms).
    pub fn properties(&self) -> Result<PropertyBag, ConfigError> {
        let known = self.known_properties();

        let layers = [
            Layer::new(ConfigSource::GlobalFile, self.load_global_properties(&known)?),
            Layer::new(ConfigSource::ProjectFile, self.load_project_properties(&known)?),
            Layer::new(ConfigSource::SystemProperties, self.system.clone()),
            Layer::new(ConfigSource::Environment, self.env_properties.clone()),
            Layer::new(ConfigSource::CommandLine, self.cli.clone()),
        ];
        for layer in &layers {
            debug!("{} properties from {}", layer.properties.len(), layer.source);
        }

        let merged = merge_layers(&layers);
        let mut result = resolve_placeholders(&merged, &self.env)?;

        let base_dir = root_base_dir(&result, &self.working_dir);
        result.insert(PROJECT_BASEDIR, base_dir.to_string_lossy());
        result.remove(PROJECT_HOME);
        result.insert(BOOTSTRAP_START_TIME, self.start_time_ms.to_string());
        Ok(result)
    }

    /// Properties known before any settings file is read.
    fn known_properties(&self) -> PropertyBag {
        merge([&self.system, &self.env_properties, &self.cli])
    }

    fn load_global_properties(&self, known: &PropertyBag) -> Result<PropertyBag, ConfigError> {
        let default_file = known
            .get_non_empty(SCANNER_HOME)
            .map(|home| Path::new(home).join(SCANNER_SETTINGS_PATH));
        let settings_file = self.locate_settings_file(known, SCANNER_SETTINGS, default_file);

        if let Some(path) = settings_file {
            if let Some(props) = file::load_optional(&path)? {
                info!("Scanner configuration file: {}", path.display());
                return Ok(props);
            }
        }
        info!("Scanner configuration file: NONE");
        Ok(PropertyBag::new())
    }

    fn load_project_properties(&self, known: &PropertyBag) -> Result<PropertyBag, ConfigError> {
        let default_file = root_base_dir(known, &self.working_dir).join(PROJECT_SETTINGS_FILENAME);
        let settings_file = self.locate_settings_file(known, PROJECT_SETTINGS, Some(default_file));

        let mut root_props = PropertyBag::new();
        let mut modules = ModuleTreeBuilder::new().with_max_depth(self.max_module_depth);
        match settings_file {
            Some(path) if path.is_file() => {
                info!("Project root configuration file: {}", path.display());
                root_props = file::load(&path)?;
                modules = modules.with_root_file(&path);
            }
            _ => info!("Project root configuration file: NONE"),
        }

        // Module properties declared in the root file are overridden by the
        // modules' own settings files.
        let mut project_props = root_props.clone();

        root_props.merge_from(known);
        let base_dir = root_base_dir(&root_props, &self.working_dir);
        root_props.insert(PROJECT_BASEDIR, base_dir.to_string_lossy());

        modules.expand(&root_props, &mut project_props, "")?;
        Ok(project_props)
    }

    /// The file named by `key` if set, else `default`, made absolute.
    fn locate_settings_file(
        &self,
        props: &PropertyBag,
        key: &str,
        default: Option<PathBuf>,
    ) -> Option<PathBuf> {
        let path = props.get_non_empty(key).map(PathBuf::from).or(default)?;
        Some(resolve_absolute(&path.to_string_lossy(), &self.working_dir))
    }
}
