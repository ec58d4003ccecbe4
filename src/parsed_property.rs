use std::{fmt::Display, ops::Deref, path::PathBuf};

/// A provider setting that remembers where its value came from
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum ParsedProperty<T> {
    /// Value from a command line flag (parsed_value, flag_name)
    Cli(T, String),
    /// Value from an environment variable (parsed_value, variable_name)
    Env(T, String),
    /// Value from the configuration file (parsed_value, file_path, toml_key)
    File(T, PathBuf, String),
    /// Built-in default when no other source provided one
    Default(T),
}

impl<T> ParsedProperty<T> {
    /// Get the parsed value
    pub fn value(&self) -> &T {
        match self {
            ParsedProperty::Cli(value, _)
            | ParsedProperty::Env(value, _)
            | ParsedProperty::File(value, _, _)
            | ParsedProperty::Default(value) => value,
        }
    }

    /// Consume the property, returning its value
    pub fn into_value(self) -> T {
        match self {
            ParsedProperty::Cli(value, _)
            | ParsedProperty::Env(value, _)
            | ParsedProperty::File(value, _, _)
            | ParsedProperty::Default(value) => value,
        }
    }

    /// Get the source name as a string
    pub fn source_name(&self) -> &'static str {
        match self {
            ParsedProperty::Cli(_, _) => "cli",
            ParsedProperty::Env(_, _) => "env",
            ParsedProperty::File(_, _, _) => "file",
            ParsedProperty::Default(_) => "default",
        }
    }

    /// Human-readable origin, e.g. `env AZDO_ORG_SERVICE_URL`
    pub fn origin(&self) -> String {
        match self {
            ParsedProperty::Cli(_, flag) => format!("cli --{flag}"),
            ParsedProperty::Env(_, var) => format!("env {var}"),
            ParsedProperty::File(_, path, key) => format!("file {} ({key})", path.display()),
            ParsedProperty::Default(_) => "default".to_string(),
        }
    }

    /// Transform the value, keeping the source
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ParsedProperty<U> {
        match self {
            ParsedProperty::Cli(value, flag) => ParsedProperty::Cli(f(value), flag),
            ParsedProperty::Env(value, var) => ParsedProperty::Env(f(value), var),
            ParsedProperty::File(value, path, key) => ParsedProperty::File(f(value), path, key),
            ParsedProperty::Default(value) => ParsedProperty::Default(f(value)),
        }
    }
}

impl<T> Deref for ParsedProperty<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        self.value()
    }
}

impl<T: Display> Display for ParsedProperty<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.value().fmt(f)
    }
}

impl<T: AsRef<str>> AsRef<str> for ParsedProperty<T> {
    fn as_ref(&self) -> &str {
        self.value().as_ref()
    }
}

impl<T> From<T> for ParsedProperty<T> {
    fn from(value: T) -> Self {
        ParsedProperty::Default(value)
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    const URL: &str = "https://dev.azure.com/test-org";

    /// # ParsedProperty Value Access
    ///
    /// Tests accessing the parsed value from every source variant.
    ///
    /// ## Test Scenario
    /// - Creates ParsedProperty instances from each source
    /// - Reads the value through value(), Deref and into_value()
    ///
    /// ## Expected Outcome
    /// - All accessors return the same parsed value
    #[test]
    fn test_parsed_property_value_access() {
        let props = [
            ParsedProperty::Cli(URL.to_string(), "org-service-url".to_string()),
            ParsedProperty::Env(URL.to_string(), "AZDO_ORG_SERVICE_URL".to_string()),
            ParsedProperty::File(
                URL.to_string(),
                PathBuf::from("config.toml"),
                "org_service_url".to_string(),
            ),
            ParsedProperty::Default(URL.to_string()),
        ];

        for prop in props {
            assert_eq!(prop.value(), URL);
            assert_eq!(&*prop, URL);
            assert_eq!(prop.len(), URL.len());
            assert_eq!(prop.into_value(), URL);
        }
    }

    /// # ParsedProperty Origin Reporting
    ///
    /// Tests source names and origin descriptions.
    ///
    /// ## Test Scenario
    /// - Describes a property from each source
    ///
    /// ## Expected Outcome
    /// - Names and origins identify flag, variable and file key
    #[test]
    fn test_parsed_property_origin() {
        let cli = ParsedProperty::Cli(1, "org-service-url".to_string());
        let env = ParsedProperty::Env(1, "AZDO_ORG_SERVICE_URL".to_string());
        let file = ParsedProperty::File(
            1,
            PathBuf::from("/cfg/config.toml"),
            "org_service_url".to_string(),
        );
        let default = ParsedProperty::Default(1);

        assert_eq!(cli.source_name(), "cli");
        assert_eq!(env.source_name(), "env");
        assert_eq!(file.source_name(), "file");
        assert_eq!(default.source_name(), "default");

        assert_eq!(cli.origin(), "cli --org-service-url");
        assert_eq!(env.origin(), "env AZDO_ORG_SERVICE_URL");
        assert_eq!(file.origin(), "file /cfg/config.toml (org_service_url)");
        assert_eq!(default.origin(), "default");
    }

    /// # ParsedProperty Mapping
    ///
    /// Tests transforming a value while keeping its source.
    ///
    /// ## Test Scenario
    /// - Maps an env-sourced string to its length
    ///
    /// ## Expected Outcome
    /// - The result is still env-sourced with the same variable name
    #[test]
    fn test_parsed_property_map() {
        let prop = ParsedProperty::Env("abc".to_string(), "AZDO_PERSONAL_ACCESS_TOKEN".to_string());
        let mapped = prop.map(|s| s.len());
        assert_eq!(
            mapped,
            ParsedProperty::Env(3, "AZDO_PERSONAL_ACCESS_TOKEN".to_string())
        );
        assert_eq!(ParsedProperty::from(5), ParsedProperty::Default(5));
    }
}
