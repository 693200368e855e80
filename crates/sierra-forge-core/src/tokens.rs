//! The closed vocabulary of application-identity tokens.
//!
//! Templates reference tokens as `${NAME}`, where `NAME` is written in
//! SCREAMING_SNAKE_CASE. The vocabulary is fixed per release; a template that
//! names anything outside it fails to render.

use std::collections::BTreeMap;
use std::fmt;

use crate::metadata::ApplicationMetadata;

/// One substitutable identity token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Token {
    /// The application name, e.g. `Sandbox`.
    ApplicationName,
    /// The human-readable version, e.g. `1.0.0`.
    ApplicationVersionName,
    /// Integer Android version code derived from the version name.
    ApplicationVersionCode,
    /// Fully-qualified package, e.g. `com.sierra.Sandbox`.
    ApplicationPackage,
}

impl Token {
    pub const ALL: [Token; 4] = [
        Token::ApplicationName,
        Token::ApplicationVersionName,
        Token::ApplicationVersionCode,
        Token::ApplicationPackage,
    ];

    /// Identifier written between the delimiters.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ApplicationName => "APPLICATION_NAME",
            Self::ApplicationVersionName => "APPLICATION_VERSION_NAME",
            Self::ApplicationVersionCode => "APPLICATION_VERSION_CODE",
            Self::ApplicationPackage => "APPLICATION_PACKAGE",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == name)
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::ApplicationName => "application name, shared-library name and class prefix",
            Self::ApplicationVersionName => "user-visible version string",
            Self::ApplicationVersionCode => "major * 10000 + minor * 100 + patch",
            Self::ApplicationPackage => "package namespace and application id",
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${{{}}}", self.as_str())
    }
}

/// Resolved token values for one generation run.
///
/// Keys are always drawn from [`Token`], so there is no way to smuggle an
/// arbitrary variable into a template. Iteration order is the vocabulary order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenMapping {
    values: BTreeMap<Token, String>,
}

impl TokenMapping {
    /// Mapping with every token of the vocabulary bound to the metadata's values.
    pub fn from_metadata(metadata: &ApplicationMetadata) -> Self {
        let values = Token::ALL
            .into_iter()
            .map(|token| {
                let value = match token {
                    Token::ApplicationName => metadata.name().to_string(),
                    Token::ApplicationVersionName => metadata.version_name().to_string(),
                    Token::ApplicationVersionCode => metadata.version_code().to_string(),
                    Token::ApplicationPackage => metadata.package().to_string(),
                };
                (token, value)
            })
            .collect();
        Self { values }
    }

    /// Mapping with only the given bindings; the rest of the vocabulary stays unmapped.
    pub fn with_values(values: impl IntoIterator<Item = (Token, String)>) -> Self {
        Self {
            values: values.into_iter().collect(),
        }
    }

    /// Look up a token by its identifier. Unknown identifiers and unmapped
    /// tokens both return `None`.
    pub fn lookup(&self, name: &str) -> Option<&str> {
        Token::from_name(name)
            .and_then(|token| self.values.get(&token))
            .map(String::as_str)
    }

    pub fn get(&self, token: Token) -> Option<&str> {
        self.values.get(&token).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Token, &str)> {
        self.values.iter().map(|(t, v)| (*t, v.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vocabulary_roundtrip_names() {
        for token in Token::ALL {
            assert_eq!(Token::from_name(token.as_str()), Some(token));
        }
        assert!(Token::from_name("UNKNOWN_TOKEN").is_none());
        assert!(Token::from_name("application_name").is_none());
    }

    #[test]
    fn test_display_uses_delimiters() {
        assert_eq!(Token::ApplicationName.to_string(), "${APPLICATION_NAME}");
    }

    #[test]
    fn test_mapping_from_metadata() {
        let meta = ApplicationMetadata::new("Sandbox", "1.2.3").unwrap();
        let tokens = TokenMapping::from_metadata(&meta);
        assert_eq!(tokens.lookup("APPLICATION_NAME"), Some("Sandbox"));
        assert_eq!(tokens.lookup("APPLICATION_VERSION_NAME"), Some("1.2.3"));
        assert_eq!(tokens.lookup("APPLICATION_VERSION_CODE"), Some("10203"));
        assert_eq!(tokens.lookup("APPLICATION_PACKAGE"), Some("com.sierra.Sandbox"));
        assert_eq!(tokens.iter().count(), Token::ALL.len());
    }

    #[test]
    fn test_partial_mapping_leaves_rest_unmapped() {
        let tokens = TokenMapping::with_values([(Token::ApplicationName, "Game".to_string())]);
        assert_eq!(tokens.get(Token::ApplicationName), Some("Game"));
        assert!(tokens.lookup("APPLICATION_VERSION_NAME").is_none());
    }
}
