use chrono::Duration;
use figment::providers::{Env, Format, Yaml};
use figment::Figment;
use getset::Getters;
use listings_client::ListingsConfig;
use request_cache::CacheConfig;
use serde::Deserialize;
use serde_inline_default::serde_inline_default;
use std::path::Path;

pub const ENV_PREFIX: &str = "LOCKSMITH_";

#[serde_inline_default]
#[derive(Debug, Clone, Deserialize, Getters)]
#[getset(get = "pub")]
pub struct Config {
    #[serde_inline_default("https://project.supabase.co/functions/v1/make-server-a7e285ba".to_string())]
    api_base: String,
    #[serde(default)]
    anon_key: String,
    #[serde(default)]
    cache: CacheSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    pub enabled: bool,
    pub first_page_ttl_secs: i64,
    pub page_ttl_secs: i64,
    pub detail_ttl_secs: i64,
    pub max_entries: Option<usize>,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            first_page_ttl_secs: 60,
            page_ttl_secs: 30,
            detail_ttl_secs: 60,
            max_entries: None,
        }
    }
}

impl CacheSettings {
    pub fn cache_config(&self) -> CacheConfig {
        CacheConfig {
            max_entries: self.max_entries,
            enabled: self.enabled,
            ..CacheConfig::default()
        }
    }

    pub fn listings_config(&self) -> Result<ListingsConfig, figment::Error> {
        Ok(ListingsConfig {
            first_page_ttl: ttl("first_page_ttl_secs", self.first_page_ttl_secs)?,
            page_ttl: ttl("page_ttl_secs", self.page_ttl_secs)?,
            detail_ttl: ttl("detail_ttl_secs", self.detail_ttl_secs)?,
        })
    }
}

fn ttl(name: &str, secs: i64) -> Result<Duration, figment::Error> {
    Duration::try_seconds(secs)
        .ok_or_else(|| figment::Error::from(format!("cache.{} is out of range: {}", name, secs)))
}

impl Config {
    /// Read `path` (missing file is fine) overlaid with `LOCKSMITH_*`
    /// variables, e.g. `LOCKSMITH_CACHE__PAGE_TTL_SECS=10`
    pub fn load(path: impl AsRef<Path>) -> Result<Self, figment::Error> {
        Figment::new()
            .merge(Yaml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempdir::TempDir;

    #[test]
    fn test_load_yaml() {
        let dir = TempDir::new("config").unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(
            &path,
            "api_base: http://localhost:54321/functions/v1/server\nanon_key: test-key\ncache:\n  page_ttl_secs: 10\n  max_entries: 500\n",
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.api_base(), "http://localhost:54321/functions/v1/server");
        assert_eq!(config.anon_key(), "test-key");
        assert_eq!(config.cache().page_ttl_secs, 10);
        assert_eq!(config.cache().first_page_ttl_secs, 60);
        assert_eq!(config.cache().cache_config().max_entries, Some(500));
        assert_eq!(config.cache().listings_config().unwrap().page_ttl, Duration::seconds(10));
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = TempDir::new("config").unwrap();
        let config = Config::load(dir.path().join("absent.yaml")).unwrap();

        assert!(config.api_base().ends_with("/make-server-a7e285ba"));
        assert!(config.cache().enabled);
        assert_eq!(config.cache().listings_config().unwrap().detail_ttl, Duration::seconds(60));
    }

    #[test]
    fn test_out_of_range_ttl_is_a_config_error() {
        let dir = TempDir::new("config").unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "cache:\n  detail_ttl_secs: 9223372036854775807\n").unwrap();

        let config = Config::load(&path).unwrap();
        let err = config.cache().listings_config().unwrap_err();
        assert!(err.to_string().contains("cache.detail_ttl_secs is out of range"));
    }
}
