use crate::error::Error;
use crate::result::Result;
use std::fs;
use std::path::{Component, Path, PathBuf};

pub const CONFIG_FILE: &str = "Shovel.toml";

/// Find Shovel.toml in the current directory or at the specified path.
///
/// An explicit path must exist; without one the lookup is optional.
pub fn find_config(path: Option<&Path>) -> Result<Option<PathBuf>> {
    match path {
        Some(path) => {
            let config_path = if path.is_dir() {
                path.join(CONFIG_FILE)
            } else {
                path.to_path_buf()
            };
            if !config_path.is_file() {
                return Err(Error::ConfigNotFound(config_path.display().to_string()));
            }
            Ok(Some(config_path))
        }
        None => {
            let config_path = current_dir()?.join(CONFIG_FILE);
            Ok(config_path.is_file().then_some(config_path))
        }
    }
}

/// Ensure a directory exists, creating it if necessary
pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path).map_err(|e| Error::io_at(e, path))?;
    }
    Ok(())
}

pub fn current_dir() -> Result<PathBuf> {
    Ok(std::env::current_dir()?)
}

/// Join `dir` (or the working directory) with `name` and normalize the result
pub fn resolve_in(dir: Option<&Path>, name: &str) -> Result<PathBuf> {
    let base = match dir {
        Some(dir) if dir.is_absolute() => dir.to_path_buf(),
        Some(dir) => current_dir()?.join(dir),
        None => current_dir()?,
    };
    Ok(normalize(&base.join(name)))
}

/// Lexically resolve `.` and `..` without touching the filesystem
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(component),
            },
            other => out.push(other),
        }
    }
    out
}

/// Archive entry name for `path` relative to `base`, always `/`-separated.
///
/// `None` when `path` is not below `base`. Names that are not valid UTF-8 are
/// an error rather than being rewritten.
pub fn entry_name(base: &Path, path: &Path) -> Result<Option<String>> {
    let Ok(relative) = path.strip_prefix(base) else {
        return Ok(None);
    };
    let parts = relative
        .components()
        .map(|c| c.as_os_str().to_str())
        .collect::<Option<Vec<_>>>()
        .ok_or_else(|| Error::InvalidEntryName(path.display().to_string()))?;
    Ok((!parts.is_empty()).then(|| parts.join("/")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        assert_eq!(
            normalize(Path::new("/srv/app/./builds/../releases/source.zip")),
            PathBuf::from("/srv/app/releases/source.zip")
        );
        assert_eq!(normalize(Path::new("/srv/..")), PathBuf::from("/"));
        assert_eq!(normalize(Path::new("../a/./b")), PathBuf::from("../a/b"));
        assert_eq!(normalize(Path::new("../../a")), PathBuf::from("../../a"));
        assert_eq!(normalize(Path::new("/../a")), PathBuf::from("/a"));
    }

    #[test]
    fn test_resolve_in_absolute() {
        let path = resolve_in(Some(Path::new("/srv/app/../builds")), "source.zip").unwrap();
        assert_eq!(path, PathBuf::from("/srv/builds/source.zip"));
    }

    #[test]
    fn test_entry_name() {
        let base = Path::new("/src/project");
        assert_eq!(
            entry_name(base, Path::new("/src/project/a/b/c.txt")).unwrap().as_deref(),
            Some("a/b/c.txt")
        );
        assert_eq!(entry_name(base, Path::new("/src/project")).unwrap(), None);
        assert_eq!(entry_name(base, Path::new("/elsewhere/c.txt")).unwrap(), None);
    }

    #[cfg(unix)]
    #[test]
    fn test_entry_name_rejects_non_utf8() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let base = Path::new("/src/project");
        let path = base.join(OsStr::from_bytes(b"dir/f\xff.txt"));
        let err = entry_name(base, &path).unwrap_err();
        assert!(matches!(err, Error::InvalidEntryName(_)));
    }

    #[test]
    fn test_find_config_explicit_missing() {
        let dir = tempfile::tempdir().unwrap();
        let err = find_config(Some(&dir.path().join("nope.toml"))).unwrap_err();
        assert!(matches!(err, Error::ConfigNotFound(_)));
    }

    #[test]
    fn test_find_config_in_directory() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(CONFIG_FILE), "").unwrap();
        let found = find_config(Some(dir.path())).unwrap();
        assert_eq!(found, Some(dir.path().join(CONFIG_FILE)));
    }

    #[test]
    fn test_ensure_dir_nested() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a/b/c");
        ensure_dir(&nested).unwrap();
        assert!(nested.is_dir());
        ensure_dir(&nested).unwrap();
    }
}
