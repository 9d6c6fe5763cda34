use serde::Deserialize;
use std::{
    env, fs,
    path::{Path, PathBuf},
};
use thiserror::Error;

const CONFIG_FILE_NAME: &str = "fitch.toml";

/// Search for fitch.toml starting from the current directory and moving up
/// the directory tree.
pub fn find_config_file() -> Result<PathBuf, ConfigError> {
    let current_dir =
        env::current_dir().map_err(|e| ConfigError::IoError(PathBuf::from("."), e))?;

    let start_dir = current_dir
        .canonicalize()
        .map_err(|e| ConfigError::IoError(current_dir.to_path_buf(), e))?;

    find_config_file_from(&start_dir)
}

fn find_config_file_from(start_dir: &Path) -> Result<PathBuf, ConfigError> {
    let mut current = start_dir;

    loop {
        let candidate = current.join(CONFIG_FILE_NAME);
        if candidate.exists() {
            return Ok(candidate);
        }

        current = match current.parent() {
            Some(parent) => parent,
            None => return Err(ConfigError::NotFound),
        };
    }
}

#[derive(Debug, Clone, Default)]
pub struct FitchConfig {
    project_dir: PathBuf,
    default_ruleset: Option<String>,
    rulesets: Vec<PathBuf>,
    italic: bool,
}

impl FitchConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let config_file = FitchConfigFile::from_file(path)?;
        let project_dir = path
            .parent()
            .ok_or_else(|| ConfigError::InvalidPath(path.to_path_buf()))?
            .to_path_buf();

        Ok(Self {
            rulesets: config_file
                .rulesets
                .iter()
                .map(|p| project_dir.join(p))
                .collect(),
            project_dir,
            default_ruleset: config_file.default_ruleset,
            italic: config_file.output.and_then(|o| o.italic).unwrap_or(true),
        })
    }

    /// The configuration next to the proofs, or the defaults when there is
    /// none.
    pub fn discover() -> Result<Self, ConfigError> {
        match find_config_file() {
            Ok(path) => Self::from_file(&path),
            Err(ConfigError::NotFound) => Ok(Self {
                italic: true,
                ..Self::default()
            }),
            Err(e) => Err(e),
        }
    }

    pub fn project_dir(&self) -> &Path {
        &self.project_dir
    }

    pub fn default_ruleset(&self) -> Option<&str> {
        self.default_ruleset.as_deref()
    }

    /// Extra ruleset files, resolved against the config file's directory.
    pub fn rulesets(&self) -> &[PathBuf] {
        &self.rulesets
    }

    /// Whether formulas in diagnostics are set in italics.
    pub fn italic(&self) -> bool {
        self.italic
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FitchConfigFile {
    default_ruleset: Option<String>,
    #[serde(default)]
    rulesets: Vec<PathBuf>,
    output: Option<OutputConfig>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct OutputConfig {
    italic: Option<bool>,
}

impl FitchConfigFile {
    /// Parse a fitch.toml config file from the given path
    fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents =
            fs::read_to_string(path).map_err(|e| ConfigError::IoError(path.to_path_buf(), e))?;

        toml::from_str(&contents).map_err(|e| ConfigError::ParseError(path.to_path_buf(), e))
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no fitch.toml found")]
    NotFound,
    #[error("failed to read {0:?}: {1}")]
    IoError(PathBuf, std::io::Error),
    #[error("failed to parse {0:?}: {1}")]
    ParseError(PathBuf, toml::de::Error),
    #[error("{0:?} is not a config file path")]
    InvalidPath(PathBuf),
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = env::temp_dir().join(format!("fitch-config-{name}-{}", std::process::id()));
        fs::create_dir_all(dir.join("nested/deeper")).unwrap();
        dir
    }

    #[test]
    fn config_is_found_in_a_parent_directory() {
        let dir = scratch_dir("walk");
        fs::write(dir.join(CONFIG_FILE_NAME), "").unwrap();
        let found = find_config_file_from(&dir.join("nested/deeper")).unwrap();
        assert_eq!(found, dir.join(CONFIG_FILE_NAME));
        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn reads_settings_relative_to_the_file() {
        let dir = scratch_dir("read");
        let path = dir.join(CONFIG_FILE_NAME);
        fs::write(
            &path,
            indoc! {r#"
                default_ruleset = "NDQ"
                rulesets = ["rules/course.toml"]

                [output]
                italic = false
            "#},
        )
        .unwrap();

        let config = FitchConfig::from_file(&path).unwrap();
        assert_eq!(config.default_ruleset(), Some("NDQ"));
        assert_eq!(config.rulesets(), &[dir.join("rules/course.toml")]);
        assert!(!config.italic());
        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn unknown_keys_are_parse_errors() {
        let dir = scratch_dir("bad");
        let path = dir.join(CONFIG_FILE_NAME);
        fs::write(&path, "colour = \"red\"\n").unwrap();
        assert!(matches!(
            FitchConfig::from_file(&path),
            Err(ConfigError::ParseError(..))
        ));
        fs::remove_dir_all(dir).unwrap();
    }
}
