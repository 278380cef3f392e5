//! Command handlers -- one module per subcommand

pub mod clean;
pub mod config;
pub mod report;
pub mod runs;

use std::fmt;
use std::path::{Path, PathBuf};

use orquestra_core::config::OrquestraConfig;
use orquestra_core::error::OrquestraError;

/// Configuration file picked up when `--config` is not given.
pub const DEFAULT_CONFIG_PATH: &str = "orquestra.toml";

/// Where the effective configuration comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// A TOML file, plus environment overrides.
    File(PathBuf),
    /// Built-in defaults plus environment overrides.
    Defaults,
}

impl ConfigSource {
    /// An explicit path always wins; otherwise `orquestra.toml` in the
    /// working directory is used when present.
    pub fn locate(explicit: Option<&Path>) -> Self {
        match explicit {
            Some(path) => Self::File(path.to_path_buf()),
            None => {
                let default = Path::new(DEFAULT_CONFIG_PATH);
                if default.is_file() {
                    Self::File(default.to_path_buf())
                } else {
                    Self::Defaults
                }
            }
        }
    }

    pub async fn load(&self) -> Result<OrquestraConfig, OrquestraError> {
        match self {
            Self::File(path) => OrquestraConfig::load(path).await,
            Self::Defaults => OrquestraConfig::from_env(),
        }
    }
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Defaults => f.write_str("defaults + environment"),
        }
    }
}
