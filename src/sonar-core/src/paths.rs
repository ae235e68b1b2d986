use crate::{APP_AUTHOR, APP_NAME, APP_QUALIFIER};
use directories::ProjectDirs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Platform directories used by Sonar. There is no persisted state beyond
/// the config file and logs.
#[derive(Debug, Clone)]
pub struct AppDirs {
    config_dir: PathBuf,
    log_dir: PathBuf,
}

impl AppDirs {
    pub fn discover() -> Result<Self, DirsError> {
        let dirs = ProjectDirs::from(APP_QUALIFIER, APP_AUTHOR, APP_NAME)
            .ok_or(DirsError::MissingProjectDirs)?;
        Ok(Self {
            config_dir: dirs.config_dir().to_path_buf(),
            log_dir: dirs.data_dir().join("logs"),
        })
    }

    /// Rooted at an explicit directory.
    pub fn from_root(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            log_dir: root.join("logs"),
            config_dir: root,
        }
    }

    pub fn ensure_exists(&self) -> Result<(), DirsError> {
        for dir in [&self.config_dir, &self.log_dir] {
            std::fs::create_dir_all(dir).map_err(|source| DirsError::CreateDirectory {
                path: dir.clone(),
                source,
            })?;
        }
        Ok(())
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }
}

#[derive(Debug, Error)]
pub enum DirsError {
    #[error("unable to determine project directories for Sonar")]
    MissingProjectDirs,
    #[error("failed to create directory {path}: {source}")]
    CreateDirectory {
        path: PathBuf,
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rooted_dirs_are_created() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let dirs = AppDirs::from_root(tmp.path().join("sonar"));
        dirs.ensure_exists().expect("create dirs");
        assert!(dirs.config_dir().is_dir());
        assert!(dirs.log_dir().ends_with("logs"));
        assert!(dirs.log_dir().is_dir());
    }
}
