use crate::result::Result;
use crate::utils;
use std::path::{Path, PathBuf};

/// Context passed throughout the application containing global configuration
#[derive(Clone, Debug)]
pub struct Context {
    /// Enable verbose output (print each ignored file and flush)
    pub verbose: bool,

    /// Path to Shovel.toml, when one was found
    pub config_path: Option<PathBuf>,

    /// Directory relative config paths are resolved against
    pub base_dir: PathBuf,
}

impl Context {
    pub fn new(config_path: Option<PathBuf>, verbose: bool) -> Result<Self> {
        let base_dir = match config_path.as_deref().and_then(Path::parent) {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => utils::current_dir()?,
        };

        Ok(Self {
            verbose,
            config_path,
            base_dir,
        })
    }

    /// Resolve a config-relative path
    pub fn resolve(&self, path: &str) -> PathBuf {
        utils::normalize(&self.base_dir.join(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_dir_follows_config() {
        let ctx = Context::new(Some(PathBuf::from("/srv/app/Shovel.toml")), false).unwrap();
        assert_eq!(ctx.base_dir, PathBuf::from("/srv/app"));
        assert_eq!(ctx.resolve("../builds"), PathBuf::from("/srv/builds"));
        assert_eq!(ctx.resolve("/abs/out"), PathBuf::from("/abs/out"));
    }
}
