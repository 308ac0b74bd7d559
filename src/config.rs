//! Harvest run configuration.

use crate::harvest::exclusion::ExclusionFilter;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const DEFAULT_PATTERN: &str = ".+";
pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const DEFAULT_API_URL: &str = "https://api.github.com";
pub const TOKEN_ENV_VAR: &str = "GITHUB_TOKEN";

const SCHEME: &str = "github";

/// Which account to harvest and how.
///
/// Defaults give the sequential baseline: one repository and one tag at a
/// time, every repository name matched, the built-in exclusion list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarvestConfig {
    /// User or organization whose repositories are listed
    pub account: String,

    /// Regular expression matched against bare repository names
    pub pattern: String,

    /// API token; falls back to `GITHUB_TOKEN`, then to anonymous access
    pub token: Option<String>,

    /// Repositories requested per listing page
    pub page_size: u32,

    /// Repositories harvested at once
    pub concurrency: usize,

    /// Tags processed at once within a repository
    pub tag_concurrency: usize,

    /// Base URL of the repository API
    pub api_url: String,

    pub exclusions: ExclusionFilter,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            account: String::new(),
            pattern: DEFAULT_PATTERN.to_string(),
            token: None,
            page_size: DEFAULT_PAGE_SIZE,
            concurrency: 1,
            tag_concurrency: 1,
            api_url: DEFAULT_API_URL.to_string(),
            exclusions: ExclusionFilter::default(),
        }
    }
}

impl HarvestConfig {
    pub fn new(account: impl Into<String>) -> Self {
        Self {
            account: account.into(),
            ..Self::default()
        }
    }

    /// An empty pattern means "everything".
    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        let pattern = pattern.into();
        self.pattern = if pattern.is_empty() {
            DEFAULT_PATTERN.to_string()
        } else {
            pattern
        };
        self
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn with_tag_concurrency(mut self, tag_concurrency: usize) -> Self {
        self.tag_concurrency = tag_concurrency;
        self
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    pub fn with_exclusions(mut self, exclusions: ExclusionFilter) -> Self {
        self.exclusions = exclusions;
        self
    }

    /// Pattern actually compiled; deserialized configs may carry `""`.
    pub fn effective_pattern(&self) -> &str {
        if self.pattern.is_empty() {
            DEFAULT_PATTERN
        } else {
            &self.pattern
        }
    }

    /// Explicit token, else `GITHUB_TOKEN`, else none.
    pub fn resolve_token(&self) -> Option<String> {
        select_token(self.token.as_deref(), std::env::var(TOKEN_ENV_VAR).ok())
    }

    /// Human-readable identity of this harvester, `github://<account>/<pattern>`.
    pub fn descriptor(&self) -> String {
        format!("{}://{}/{}", SCHEME, self.account, self.effective_pattern())
    }
}

impl fmt::Display for HarvestConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.descriptor())
    }
}

fn select_token(explicit: Option<&str>, from_env: Option<String>) -> Option<String> {
    match explicit {
        Some(token) if !token.is_empty() => Some(token.to_string()),
        _ => from_env.filter(|t| !t.is_empty()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_sequential_and_match_everything() {
        let config = HarvestConfig::new("acme");
        assert_eq!(config.pattern, ".+");
        assert_eq!(config.page_size, 10);
        assert_eq!(config.concurrency, 1);
        assert_eq!(config.tag_concurrency, 1);
        assert!(!config.exclusions.is_empty());
    }

    #[test]
    fn test_descriptor() {
        let config = HarvestConfig::new("modelica-3rdparty").with_pattern("^Foo");
        assert_eq!(config.descriptor(), "github://modelica-3rdparty/^Foo");
        assert_eq!(
            HarvestConfig::new("acme").with_pattern("").to_string(),
            "github://acme/.+"
        );
    }

    #[test]
    fn test_explicit_token_wins_over_environment() {
        assert_eq!(
            select_token(Some("abc"), Some("env".to_string())).as_deref(),
            Some("abc")
        );
        assert_eq!(
            select_token(None, Some("env".to_string())).as_deref(),
            Some("env")
        );
        assert_eq!(
            select_token(Some(""), Some("env".to_string())).as_deref(),
            Some("env")
        );
        assert_eq!(select_token(None, Some(String::new())), None);
        assert_eq!(select_token(None, None), None);
    }

    #[test]
    fn test_deserializes_with_defaults() {
        let json = r#"{"account":"acme","pattern":"","exclusions":[]}"#;
        let config: HarvestConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.account, "acme");
        assert_eq!(config.effective_pattern(), ".+");
        assert_eq!(config.page_size, 10);
        assert_eq!(config.api_url, "https://api.github.com");
        assert!(config.exclusions.is_empty());
    }
}
