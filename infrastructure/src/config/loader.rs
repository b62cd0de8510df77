//! Configuration file loader with multi-source merging

use super::file_config::FileConfig;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use std::path::{Path, PathBuf};

/// Project-level config file names, checked in order
const PROJECT_FILES: [&str; 2] = ["tribunal.toml", ".tribunal.toml"];

/// Prefix for environment overrides, e.g. `TRIBUNAL_COUNCIL__STRATEGY=parallel`
const ENV_PREFIX: &str = "TRIBUNAL_";

/// Configuration loader that handles file discovery and merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from all sources with proper priority
    ///
    /// Priority (highest to lowest):
    /// 1. `TRIBUNAL_*` environment variables (`__` separates sections)
    /// 2. Explicit config path (if provided)
    /// 3. Project root: `./tribunal.toml` or `./.tribunal.toml`
    /// 4. Global: `$XDG_CONFIG_HOME/tribunal/config.toml`
    /// 5. Default values
    pub fn load(config_path: Option<&Path>) -> Result<FileConfig, Box<figment::Error>> {
        let files: Vec<PathBuf> = Self::global_config_path()
            .into_iter()
            .chain(Self::project_config_path())
            .filter(|path| path.exists())
            .chain(config_path.map(Path::to_path_buf))
            .collect();

        Self::figment(&files)
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .map_err(Box::new)
    }

    /// Load only default configuration (for --no-config)
    pub fn load_defaults() -> FileConfig {
        FileConfig::default()
    }

    /// Defaults merged with `files`, later files winning
    fn figment(files: &[PathBuf]) -> Figment {
        files.iter().fold(
            Figment::new().merge(Serialized::defaults(FileConfig::default())),
            |figment, path| figment.merge(Toml::file(path)),
        )
    }

    /// Get the global config file path
    ///
    /// Returns XDG_CONFIG_HOME/tribunal/config.toml if set,
    /// otherwise the platform config directory.
    pub fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("tribunal").join("config.toml"))
    }

    /// Get the project-level config file path (if it exists)
    pub fn project_config_path() -> Option<PathBuf> {
        PROJECT_FILES
            .iter()
            .map(PathBuf::from)
            .find(|path| path.exists())
    }

    /// Print the config file locations being used (for debugging)
    pub fn print_config_sources(config_path: Option<&Path>) {
        println!("Configuration sources (in priority order):");
        println!("  [     ] Env:     {}*", ENV_PREFIX);

        if let Some(path) = config_path {
            let found = if path.exists() { "FOUND" } else { "MISSING" };
            println!("  [{:<5}] Explicit: {}", found, path.display());
        }

        if let Some(path) = Self::project_config_path() {
            println!("  [FOUND] Project: {}", path.display());
        } else {
            println!("  [     ] Project: ./tribunal.toml or ./.tribunal.toml");
        }

        if let Some(path) = Self::global_config_path() {
            if path.exists() {
                println!("  [FOUND] Global:  {}", path.display());
            } else {
                println!("  [     ] Global:  {}", path.display());
            }
        }

        println!("  [     ] Default: built-in defaults");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProviderKind;
    use tribunal_application::ExecutionStrategy;

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_load_defaults() {
        let config = ConfigLoader::load_defaults();
        assert_eq!(config.council.personas.len(), 3);
        assert!(config.judge.synthesis);
    }

    #[test]
    fn test_global_config_path_returns_some() {
        let path = ConfigLoader::global_config_path().unwrap();
        assert!(path.to_string_lossy().contains("tribunal"));
    }

    #[test]
    fn test_later_files_override_earlier_ones() {
        let dir = tempfile::tempdir().unwrap();
        let global = write(
            dir.path(),
            "global.toml",
            "[council]\nstrategy = \"parallel\"\ntimeout_seconds = 10\n\n[provider]\nkind = \"mock\"\n",
        );
        let explicit = write(dir.path(), "explicit.toml", "[council]\ntimeout_seconds = 45\n");

        let config: FileConfig = ConfigLoader::figment(&[global, explicit]).extract().unwrap();
        // Merged: strategy and kind from the first file, timeout from the second
        assert_eq!(config.council.strategy, ExecutionStrategy::Parallel);
        assert_eq!(config.council.timeout_seconds, 45);
        assert_eq!(config.provider.kind, ProviderKind::Mock);
        // Untouched sections keep their defaults
        assert_eq!(config.council.personas.len(), 3);
        assert!(config.output.color);
    }

    #[test]
    fn test_explicit_personas_replace_default_council() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            dir.path(),
            "council.toml",
            "[[council.personas]]\nid = \"solo\"\ntitle = \"the only member\"\n",
        );
        let config: FileConfig = ConfigLoader::figment(&[path]).extract().unwrap();
        assert_eq!(config.council.personas.len(), 1);
        assert_eq!(config.council.personas[0].id, "solo");
    }

    #[test]
    fn test_invalid_value_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "bad.toml", "[council]\nfailure_policy = \"sloppy\"\n");
        let result: Result<FileConfig, _> = ConfigLoader::figment(&[path]).extract();
        assert!(result.is_err());
    }
}
