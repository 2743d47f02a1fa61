use crate::naming::{self, Timestamp};
use crate::platform::Platform;
use std::collections::HashMap;

/// Template processor for resolving $VARIABLE references in config values
pub struct Tpl {
    variables: HashMap<String, String>,
}

impl Tpl {
    pub fn new() -> Self {
        Self {
            variables: HashMap::new(),
        }
    }

    /// Variables available to Shovel.toml: `$PLATFORM`, `$TIMESTAMP`, `$ARCHIVE`, `$DEPLOY`
    pub fn for_timestamp(timestamp: Timestamp) -> Self {
        let mut tpl = Self::new();
        tpl.register("PLATFORM", Platform::current().as_str());
        tpl.register("TIMESTAMP", timestamp.formatted());
        tpl.register("ARCHIVE", naming::archive_name(timestamp));
        tpl.register("DEPLOY", naming::deploy_name(timestamp));
        tpl
    }

    /// Register a variable with its value
    pub fn register<K: Into<String>, V: Into<String>>(&mut self, key: K, value: V) {
        self.variables.insert(key.into(), value.into());
    }

    /// Resolve every `$NAME` whose name is registered; unknown names are kept verbatim
    pub fn parse(&self, input: &str) -> String {
        let mut result = String::with_capacity(input.len());
        let mut rest = input;

        while let Some(pos) = rest.find('$') {
            result.push_str(&rest[..pos]);
            let after = &rest[pos + 1..];
            let len = after
                .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
                .unwrap_or(after.len());
            let name = &after[..len];

            match self.variables.get(name) {
                Some(value) => result.push_str(value),
                None => {
                    result.push('$');
                    result.push_str(name);
                }
            }
            rest = &after[len..];
        }

        result.push_str(rest);
        result
    }
}

impl Default for Tpl {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_parsing() {
        let ts = Timestamp::from_unix(1518044860).unwrap();
        let tpl = Tpl::for_timestamp(ts);

        assert_eq!(tpl.parse("builds/$TIMESTAMP"), "builds/2018.02.07.230740");
        assert_eq!(tpl.parse("/srv/$DEPLOY/current"), "/srv/deploy_2018.02.07.230740/current");
        assert_eq!(tpl.parse("out/$ARCHIVE"), "out/source_2018.02.07.230740.zip");
    }

    #[test]
    fn test_multiple_occurrences() {
        let mut tpl = Tpl::new();
        tpl.register("NAME", "test");

        let result = tpl.parse("$NAME-$NAME");
        assert_eq!(result, "test-test");
    }

    #[test]
    fn test_longest_name_wins() {
        let mut tpl = Tpl::new();
        tpl.register("DEPLOY", "short");
        tpl.register("DEPLOY_DIR", "long");

        assert_eq!(tpl.parse("$DEPLOY_DIR/$DEPLOY"), "long/short");
    }

    #[test]
    fn test_unknown_and_bare_dollar_kept() {
        let tpl = Tpl::new();
        assert_eq!(tpl.parse("$HOME/a$"), "$HOME/a$");
        assert_eq!(tpl.parse("cost: $5"), "cost: $5");
    }
}
