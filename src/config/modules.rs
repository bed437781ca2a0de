//! Recursive discovery of module settings.
//!
//! A project lists its modules in `sonar.modules`. Each module gets a base
//! directory and optionally its own settings file, may list modules of its
//! own, and ends up flattened into the project properties under a
//! `<parent-prefix><module>.` key prefix.
//!
//! The base directory of a module is found by the first matching rule:
//!
//! 1. `<module>.sonar.projectBaseDir` is set: resolved against the parent
//!    base directory. If that is a different directory than the parent's,
//!    a `sonar-project.properties` found there is merged in.
//! 2. `<module>.sonar.projectConfigFile` is set: that file is loaded (it must
//!    exist) and the base directory is the one it declares, or else the
//!    directory containing it.
//! 3. Otherwise the base directory is `<parent base dir>/<module>`, and a
//!    `sonar-project.properties` found there is merged in.

use std::path::{Path, PathBuf};

use tracing::debug;

use super::file;
use super::keys::{MODULES, PROJECT_BASEDIR, PROJECT_CONFIG_FILE, PROJECT_SETTINGS_FILENAME};
use super::paths::{is_same_dir, resolve_absolute};
use super::source::ConfigSource;
use super::{ConfigError, PropertyBag};

/// Nesting limit for module trees when none is configured.
pub const DEFAULT_MAX_MODULE_DEPTH: usize = 64;

/// Expands the module declarations of a property bag into flattened, prefixed keys.
#[derive(Debug, Clone)]
pub struct ModuleTreeBuilder {
    max_depth: usize,
    root_files: Vec<PathBuf>,
}

impl Default for ModuleTreeBuilder {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_MODULE_DEPTH,
            root_files: Vec::new(),
        }
    }
}

impl ModuleTreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets how many levels of nested modules are accepted before failing.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Registers a settings file already loaded above the first module level,
    /// so that a module loading it again is reported as a cycle.
    pub fn with_root_file(mut self, path: &Path) -> Self {
        match std::fs::canonicalize(path) {
            Ok(canonical) => self.root_files.push(canonical),
            Err(e) => debug!(
                "Cannot canonicalize {}, not tracked for module cycles: {}",
                path.display(),
                e
            ),
        }
        self
    }

    /// Resolves every module declared in `parent` and writes their properties
    /// into `output`, each key prefixed with `prefix` and the module path.
    ///
    /// `parent` must carry an absolute `sonar.projectBaseDir` if it declares
    /// any module. Fails on the first module that cannot be resolved; `output`
    /// is then left partially filled and should be discarded.
    pub fn expand(
        &self,
        parent: &PropertyBag,
        output: &mut PropertyBag,
        prefix: &str,
    ) -> Result<(), ConfigError> {
        let mut chain = self.root_files.clone();
        self.expand_level(parent, output, prefix, &mut chain, 0)
    }

    fn expand_level(
        &self,
        parent: &PropertyBag,
        output: &mut PropertyBag,
        prefix: &str,
        chain: &mut Vec<PathBuf>,
        depth: usize,
    ) -> Result<(), ConfigError> {
        let modules = parent.list(MODULES);
        if modules.is_empty() {
            return Ok(());
        }

        let parent_base_dir = parent
            .get(PROJECT_BASEDIR)
            .map(PathBuf::from)
            .ok_or_else(|| ConfigError::MissingBaseDir(prefix.to_string()))?;

        for module in &modules {
            if depth >= self.max_depth {
                return Err(ConfigError::ModuleDepthExceeded {
                    module: format!("{prefix}{module}"),
                    max_depth: self.max_depth,
                });
            }

            let mut module_props = parent.with_prefix_stripped(&format!("{module}."));
            let loaded = load_module_config(&parent_base_dir, &mut module_props, module, chain)?;

            let module_prefix = format!("{prefix}{module}.");
            if let Some(path) = &loaded {
                chain.push(path.clone());
            }
            let result =
                self.expand_level(&module_props, output, &module_prefix, chain, depth + 1);
            if loaded.is_some() {
                chain.pop();
            }
            result?;

            for (key, value) in module_props.iter() {
                output.insert(format!("{module_prefix}{key}"), value);
            }
        }

        Ok(())
    }
}

/// Resolves the base directory of `module` and merges its settings file into
/// `props`. Returns the canonical path of the settings file that was loaded.
fn load_module_config(
    parent_base_dir: &Path,
    props: &mut PropertyBag,
    module: &str,
    chain: &[PathBuf],
) -> Result<Option<PathBuf>, ConfigError> {
    if let Some(raw) = props.get(PROJECT_BASEDIR).map(str::to_string) {
        let base_dir = resolve_absolute(&raw, parent_base_dir);
        set_module_base_dir(&base_dir, props, module)?;
        let same = is_same_dir(parent_base_dir, &base_dir).map_err(|e| {
            ConfigError::BaseDirIdentity {
                module: module.to_string(),
                source: e,
            }
        })?;
        if same {
            debug!("Module '{}' shares the base directory of its parent", module);
            return Ok(None);
        }
        try_load_settings_file(&base_dir, props, module, chain)
    } else if props.contains_key(PROJECT_CONFIG_FILE) {
        let loaded = load_module_file(parent_base_dir, props, module, chain)?;
        props.remove(PROJECT_CONFIG_FILE);
        Ok(Some(loaded))
    } else {
        let base_dir = resolve_absolute(module, parent_base_dir);
        set_module_base_dir(&base_dir, props, module)?;
        try_load_settings_file(&base_dir, props, module, chain)
    }
}

fn set_module_base_dir(
    base_dir: &Path,
    props: &mut PropertyBag,
    module: &str,
) -> Result<(), ConfigError> {
    if !base_dir.is_dir() {
        return Err(ConfigError::ModuleBaseDirNotFound {
            module: module.to_string(),
            path: base_dir.to_path_buf(),
        });
    }
    debug!("Module '{}' base directory: {}", module, base_dir.display());
    props.insert(PROJECT_BASEDIR, base_dir.to_string_lossy());
    Ok(())
}

fn try_load_settings_file(
    base_dir: &Path,
    props: &mut PropertyBag,
    module: &str,
    chain: &[PathBuf],
) -> Result<Option<PathBuf>, ConfigError> {
    let settings_file = base_dir.join(PROJECT_SETTINGS_FILENAME);
    let Some(loaded) = file::load_optional(&settings_file)? else {
        return Ok(None);
    };
    debug!(
        "Merging {} for module '{}': {}",
        ConfigSource::ModuleFile,
        module,
        settings_file.display()
    );
    props.merge_from(&loaded);
    let canonical = check_not_reentered(&settings_file, props, module, chain)?;

    if let Some(raw) = props.get(PROJECT_BASEDIR).map(str::to_string) {
        let overridden = resolve_absolute(&raw, base_dir);
        set_module_base_dir(&overridden, props, module)?;
    }
    Ok(Some(canonical))
}

fn load_module_file(
    parent_base_dir: &Path,
    props: &mut PropertyBag,
    module: &str,
    chain: &[PathBuf],
) -> Result<PathBuf, ConfigError> {
    let raw = props.get(PROJECT_CONFIG_FILE).unwrap_or_default().to_string();
    let settings_file = resolve_absolute(&raw, parent_base_dir);
    if !settings_file.is_file() {
        return Err(ConfigError::ModuleFileNotFound {
            module: module.to_string(),
            path: settings_file,
        });
    }
    debug!(
        "Merging {} for module '{}': {}",
        ConfigSource::ModuleFile,
        module,
        settings_file.display()
    );
    props.merge_from(&file::load(&settings_file)?);
    let canonical = check_not_reentered(&settings_file, props, module, chain)?;

    let file_dir = settings_file.parent().unwrap_or(parent_base_dir);
    let base_dir = match props.get(PROJECT_BASEDIR) {
        Some(declared) => resolve_absolute(declared, file_dir),
        None => file_dir.to_path_buf(),
    };
    set_module_base_dir(&base_dir, props, module)?;
    Ok(canonical)
}

/// Fails if `settings_file` was loaded by an ancestor module and `props`, the
/// module properties after merging it, would expand modules again.
///
/// Reloading an ancestor's file is fine when it declares no modules: the
/// expansion stops there.
fn check_not_reentered(
    settings_file: &Path,
    props: &PropertyBag,
    module: &str,
    chain: &[PathBuf],
) -> Result<PathBuf, ConfigError> {
    let canonical =
        std::fs::canonicalize(settings_file).map_err(|e| ConfigError::ReadError {
            path: settings_file.to_path_buf(),
            source: e,
        })?;
    if chain.contains(&canonical) && !props.list(MODULES).is_empty() {
        return Err(ConfigError::CyclicModule {
            module: module.to_string(),
            path: settings_file.to_path_buf(),
        });
    }
    Ok(canonical)
}
