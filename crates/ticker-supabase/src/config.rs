//! Connection settings for a Supabase project.

use reqwest::Url;
use std::fmt;
use ticker_core::{Result, TickerCacheError};

/// Environment variable holding the project URL.
pub const URL_ENV: &str = "SUPABASE_URL";

/// Environment variable holding the anon (read-only) key.
pub const KEY_ENV: &str = "SUPABASE_ANON_KEY";

/// Schema the indicator table lives in.
pub const DEFAULT_SCHEMA: &str = "investing_one";

/// Name of the indicator table.
pub const DEFAULT_TABLE: &str = "daily_indicators";

/// Endpoint, credential and table location, validated at construction.
#[derive(Clone)]
pub struct SupabaseConfig {
    url: Url,
    key: String,
    schema: String,
    table: String,
}

impl fmt::Debug for SupabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SupabaseConfig")
            .field("url", &self.url.as_str())
            .field("key", &"[REDACTED]")
            .field("schema", &self.schema)
            .field("table", &self.table)
            .finish()
    }
}

impl SupabaseConfig {
    /// Create a config for the default schema and table.
    ///
    /// Fails with [`TickerCacheError::NotConfigured`] if either value is
    /// empty or the URL is not an absolute `http`/`https` URL.
    pub fn new(url: &str, key: impl Into<String>) -> Result<Self> {
        let url = url.trim();
        if url.is_empty() {
            return Err(TickerCacheError::NotConfigured(format!(
                "Supabase URL is empty. Set {URL_ENV}."
            )));
        }

        let key = key.into().trim().to_string();
        if key.is_empty() {
            return Err(TickerCacheError::NotConfigured(format!(
                "Supabase key is empty. Set {KEY_ENV}."
            )));
        }

        let url = Url::parse(url).map_err(|e| {
            TickerCacheError::NotConfigured(format!("Invalid Supabase URL {url:?}: {e}"))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(TickerCacheError::NotConfigured(format!(
                "Supabase URL must use http or https, got {}",
                url.scheme()
            )));
        }

        Ok(Self {
            url,
            key,
            schema: DEFAULT_SCHEMA.to_string(),
            table: DEFAULT_TABLE.to_string(),
        })
    }

    /// Read the config from `SUPABASE_URL` and `SUPABASE_ANON_KEY`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read the config through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let url = lookup(URL_ENV).ok_or_else(|| {
            TickerCacheError::NotConfigured(format!("{URL_ENV} is not set"))
        })?;
        let key = lookup(KEY_ENV).ok_or_else(|| {
            TickerCacheError::NotConfigured(format!("{KEY_ENV} is not set"))
        })?;
        Self::new(&url, key)
    }

    /// Use a different schema.
    #[must_use]
    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = schema.into();
        self
    }

    /// Use a different table.
    #[must_use]
    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    /// Project URL.
    #[must_use]
    pub const fn url(&self) -> &Url {
        &self.url
    }

    /// Access key.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Schema name.
    #[must_use]
    pub fn schema(&self) -> &str {
        &self.schema
    }

    /// Table name.
    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    /// REST endpoint for the table: `{url}/rest/v1/{table}`.
    pub fn table_endpoint(&self) -> Result<Url> {
        let mut endpoint = self.url.clone();
        endpoint
            .path_segments_mut()
            .map_err(|()| {
                TickerCacheError::NotConfigured(format!(
                    "Supabase URL cannot be a base: {}",
                    self.url
                ))
            })?
            .pop_if_empty()
            .extend(["rest", "v1", self.table.as_str()]);
        endpoint.set_query(None);
        Ok(endpoint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_from_lookup() {
        let config = SupabaseConfig::from_lookup(lookup(&[
            (URL_ENV, "https://test.supabase.co"),
            (KEY_ENV, "test-key"),
        ]))
        .unwrap();

        assert_eq!(config.url().as_str(), "https://test.supabase.co/");
        assert_eq!(config.key(), "test-key");
        assert_eq!(config.schema(), DEFAULT_SCHEMA);
        assert_eq!(config.table(), DEFAULT_TABLE);
    }

    #[test]
    fn test_missing_values() {
        let err = SupabaseConfig::from_lookup(lookup(&[(KEY_ENV, "k")])).unwrap_err();
        assert!(matches!(err, TickerCacheError::NotConfigured(ref m) if m.contains(URL_ENV)));

        let err =
            SupabaseConfig::from_lookup(lookup(&[(URL_ENV, "https://x.supabase.co")])).unwrap_err();
        assert!(matches!(err, TickerCacheError::NotConfigured(ref m) if m.contains(KEY_ENV)));

        let err = SupabaseConfig::new("https://x.supabase.co", "   ").unwrap_err();
        assert!(err.is_configuration());

        let err = SupabaseConfig::new("", "key").unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_malformed_url() {
        assert!(SupabaseConfig::new("not a url", "key").unwrap_err().is_configuration());
        assert!(SupabaseConfig::new("ftp://x.supabase.co", "key").unwrap_err().is_configuration());
    }

    #[test]
    fn test_table_endpoint() {
        let config = SupabaseConfig::new("https://test.supabase.co", "key").unwrap();
        assert_eq!(
            config.table_endpoint().unwrap().as_str(),
            "https://test.supabase.co/rest/v1/daily_indicators"
        );

        let config = SupabaseConfig::new("http://localhost:54321/", "key")
            .unwrap()
            .with_table("indicators_staging");
        assert_eq!(
            config.table_endpoint().unwrap().as_str(),
            "http://localhost:54321/rest/v1/indicators_staging"
        );
    }

    #[test]
    fn test_debug_redacts_key() {
        let config = SupabaseConfig::new("https://test.supabase.co", "secret_key_12345").unwrap();
        let debug_str = format!("{config:?}");
        assert!(!debug_str.contains("secret_key_12345"));
        assert!(debug_str.contains("[REDACTED]"));
    }
}
