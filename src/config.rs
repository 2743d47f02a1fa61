use crate::archiver::DEFAULT_FLUSH_EVERY;
use crate::context::Context;
use crate::filter::{Ignore, NoIgnore, RegexIgnore};
use crate::result::Result;
use crate::tpl::Tpl;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Raw contents of Shovel.toml
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ShovelToml {
    #[serde(default)]
    pub source: Option<String>,

    #[serde(default)]
    pub output_folder: Option<String>,

    #[serde(default)]
    pub deploy_folder: Option<String>,

    #[serde(default)]
    pub ignore: Option<IgnoreSetting>,

    #[serde(default)]
    pub flush_every: Option<usize>,
}

/// `ignore = "<regex>"`, or `ignore = false` to keep everything
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(untagged)]
pub enum IgnoreSetting {
    Enabled(bool),
    Pattern(String),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum IgnoreRule {
    #[default]
    Default,
    Pattern(String),
    Disabled,
}

impl IgnoreRule {
    /// Compile the rule; a bad pattern fails here, before anything is written
    pub fn build(&self) -> Result<Box<dyn Ignore>> {
        Ok(match self {
            IgnoreRule::Default => Box::new(RegexIgnore::default_pattern()),
            IgnoreRule::Pattern(pattern) => Box::new(RegexIgnore::new(pattern)?),
            IgnoreRule::Disabled => Box::new(NoIgnore),
        })
    }
}

impl From<IgnoreSetting> for IgnoreRule {
    fn from(setting: IgnoreSetting) -> Self {
        match setting {
            IgnoreSetting::Enabled(true) => IgnoreRule::Default,
            IgnoreSetting::Enabled(false) => IgnoreRule::Disabled,
            IgnoreSetting::Pattern(pattern) => IgnoreRule::Pattern(pattern),
        }
    }
}

/// Parsed and resolved configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub source: Option<PathBuf>,
    pub output_folder: Option<PathBuf>,
    pub deploy_folder: Option<PathBuf>,
    pub ignore: IgnoreRule,
    pub flush_every: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source: None,
            output_folder: None,
            deploy_folder: None,
            ignore: IgnoreRule::Default,
            flush_every: DEFAULT_FLUSH_EVERY,
        }
    }
}

impl Config {
    /// Load Shovel.toml if the context found one, otherwise use defaults
    pub fn load(ctx: &Context, tpl: &Tpl) -> Result<Self> {
        match &ctx.config_path {
            Some(path) => {
                let content = fs::read_to_string(path)?;
                Self::parse(ctx, tpl, &content)
            }
            None => Ok(Self::default()),
        }
    }

    pub fn parse(ctx: &Context, tpl: &Tpl, content: &str) -> Result<Self> {
        let raw: ShovelToml = toml::from_str(content)?;
        let path = |value: Option<String>| value.map(|v| ctx.resolve(&tpl.parse(&v)));

        Ok(Config {
            source: path(raw.source),
            output_folder: path(raw.output_folder),
            deploy_folder: path(raw.deploy_folder),
            ignore: raw.ignore.map(IgnoreRule::from).unwrap_or_default(),
            flush_every: raw.flush_every.unwrap_or(DEFAULT_FLUSH_EVERY),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::naming::Timestamp;

    fn ctx() -> Context {
        Context::new(Some(PathBuf::from("/srv/app/Shovel.toml")), false).unwrap()
    }

    fn tpl() -> Tpl {
        Tpl::for_timestamp(Timestamp::from_unix(1518044860).unwrap())
    }

    #[test]
    fn test_full_config() {
        let config = Config::parse(
            &ctx(),
            &tpl(),
            r#"
                source = "web"
                output-folder = "../builds"
                deploy-folder = "/var/www/$TIMESTAMP"
                ignore = "(?i)vendor"
                flush-every = 100
            "#,
        )
        .unwrap();

        assert_eq!(config.source, Some(PathBuf::from("/srv/app/web")));
        assert_eq!(config.output_folder, Some(PathBuf::from("/srv/builds")));
        assert_eq!(
            config.deploy_folder,
            Some(PathBuf::from("/var/www/2018.02.07.230740"))
        );
        assert_eq!(config.ignore, IgnoreRule::Pattern("(?i)vendor".into()));
        assert_eq!(config.flush_every, 100);
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::parse(&ctx(), &tpl(), "").unwrap();
        assert_eq!(config.source, None);
        assert_eq!(config.ignore, IgnoreRule::Default);
        assert_eq!(config.flush_every, DEFAULT_FLUSH_EVERY);
    }

    #[test]
    fn test_ignore_false_disables() {
        let config = Config::parse(&ctx(), &tpl(), "ignore = false").unwrap();
        assert_eq!(config.ignore, IgnoreRule::Disabled);
        let config = Config::parse(&ctx(), &tpl(), "ignore = true").unwrap();
        assert_eq!(config.ignore, IgnoreRule::Default);
    }

    #[test]
    fn test_unknown_key_rejected() {
        let err = Config::parse(&ctx(), &tpl(), "compression = 9").unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn test_bad_pattern_fails_on_build() {
        let rule = IgnoreRule::Pattern("[unterminated".into());
        assert!(matches!(rule.build(), Err(Error::InvalidPattern(_))));
        assert!(IgnoreRule::Disabled.build().is_ok());
    }
}
