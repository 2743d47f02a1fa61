use crate::platform::Platform;
use crate::result::Result;
use regex::Regex;
use std::path::Path;

/// Decides whether a resolved file path is left out of the archive
pub trait Ignore {
    fn is_ignored(&self, path: &Path) -> bool;
}

impl<F> Ignore for F
where
    F: Fn(&Path) -> bool,
{
    fn is_ignored(&self, path: &Path) -> bool {
        self(path)
    }
}

/// Keeps every file
#[derive(Debug, Clone, Copy, Default)]
pub struct NoIgnore;

impl Ignore for NoIgnore {
    fn is_ignored(&self, _path: &Path) -> bool {
        false
    }
}

/// Skips files whose full path matches a regular expression
#[derive(Debug, Clone)]
pub struct RegexIgnore {
    regex: Regex,
}

impl RegexIgnore {
    /// Compile `pattern`; an invalid expression is reported as `Error::InvalidPattern`
    pub fn new(pattern: &str) -> Result<Self> {
        Ok(Self {
            regex: Regex::new(pattern)?,
        })
    }

    /// Skips `node_modules` anywhere in the path and `resources/assets`
    pub fn default_pattern() -> Self {
        Self::new(&default_pattern_for(Platform::current()))
            .expect("default ignore pattern is valid")
    }
}

impl Ignore for RegexIgnore {
    fn is_ignored(&self, path: &Path) -> bool {
        self.regex.is_match(&path.to_string_lossy())
    }
}

pub fn default_pattern_for(platform: Platform) -> String {
    let sep = regex::escape(&platform.separator().to_string());
    format!(r"(?i)^(.*node_modules|.*resources{sep}assets)(.*)$")
}
