use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

use crate::catalog;
use crate::domain::{ApiKey, DEFAULT_FILE_PREFIX, ImageType, Query};
use crate::error::HarvestError;
use crate::pipeline::Pacing;
use crate::pixabay::{DEFAULT_API_BASE_URL, PER_PAGE_CAP, SearchFilters};

pub const DEFAULT_CONFIG_FILE: &str = "dish-harvester.json";
pub const API_KEY_ENV: &str = "PIXABAY_API_KEY";

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub output_dir: Option<String>,
    #[serde(default)]
    pub per_query_limit: Option<usize>,
    #[serde(default)]
    pub file_prefix: Option<String>,
    #[serde(default)]
    pub image_type: Option<ImageType>,
    #[serde(default)]
    pub lang: Option<String>,
    #[serde(default)]
    pub safe_search: Option<bool>,
    #[serde(default)]
    pub item_delay_ms: Option<u64>,
    #[serde(default)]
    pub query_delay_ms: Option<u64>,
    #[serde(default)]
    pub api_base_url: Option<String>,
    #[serde(default)]
    pub user_agent: Option<String>,
    #[serde(default)]
    pub queries: Option<Vec<String>>,
    #[serde(default)]
    pub folder_mapping: Option<BTreeMap<String, String>>,
    #[serde(default)]
    pub relabel_dir: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub api_key: Option<String>,
    pub output_dir: Utf8PathBuf,
    pub per_query_limit: usize,
    pub file_prefix: String,
    pub filters: SearchFilters,
    pub pacing: Pacing,
    pub api_base_url: String,
    pub user_agent: Option<String>,
    pub queries: Vec<Query>,
    pub folder_mapping: BTreeMap<String, String>,
    pub relabel_dir: Utf8PathBuf,
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// An explicit `path` must exist; the default file is optional.
    pub fn resolve(path: Option<&str>) -> Result<ResolvedConfig, HarvestError> {
        let config_path = match path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(DEFAULT_CONFIG_FILE),
        };

        if !config_path.exists() {
            if path.is_some() {
                return Err(HarvestError::MissingConfig(config_path));
            }
            return Self::resolve_config(Config::default());
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|_| HarvestError::ConfigRead(config_path.clone()))?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|err| HarvestError::ConfigParse(err.to_string()))?;
        tracing::debug!("loaded config from {}", config_path.display());

        Self::resolve_config(config)
    }

    pub fn resolve_config(config: Config) -> Result<ResolvedConfig, HarvestError> {
        let per_query_limit = config
            .per_query_limit
            .unwrap_or(catalog::DEFAULT_PER_QUERY_LIMIT);
        validate_limit(per_query_limit)?;

        let file_prefix = config
            .file_prefix
            .unwrap_or_else(|| DEFAULT_FILE_PREFIX.to_string());
        validate_prefix(&file_prefix)?;

        let lang = config.lang.unwrap_or_else(|| "en".to_string());
        if lang.trim().is_empty() {
            return Err(HarvestError::InvalidConfig(
                "lang must not be empty".to_string(),
            ));
        }

        let queries = match config.queries {
            Some(values) => values
                .iter()
                .map(|value| value.parse())
                .collect::<Result<Vec<Query>, HarvestError>>()?,
            None => catalog::default_queries(),
        };

        let output_dir = Utf8PathBuf::from(
            config
                .output_dir
                .unwrap_or_else(|| catalog::DEFAULT_OUTPUT_DIR.to_string()),
        );
        let relabel_dir = config
            .relabel_dir
            .map(Utf8PathBuf::from)
            .unwrap_or_else(|| output_dir.clone());

        Ok(ResolvedConfig {
            api_key: config.api_key,
            output_dir,
            per_query_limit,
            file_prefix,
            filters: SearchFilters {
                image_type: config.image_type.unwrap_or(ImageType::Photo),
                lang: lang.trim().to_string(),
                safe_search: config.safe_search.unwrap_or(true),
            },
            pacing: Pacing {
                item_delay: config
                    .item_delay_ms
                    .map(Duration::from_millis)
                    .unwrap_or(Pacing::default().item_delay),
                query_delay: config
                    .query_delay_ms
                    .map(Duration::from_millis)
                    .unwrap_or(Pacing::default().query_delay),
            },
            api_base_url: config
                .api_base_url
                .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string()),
            user_agent: config.user_agent,
            queries,
            folder_mapping: config
                .folder_mapping
                .unwrap_or_else(catalog::default_folder_mapping),
            relabel_dir,
        })
    }
}

impl ResolvedConfig {
    /// Flag value first, then the config file, then [`API_KEY_ENV`].
    pub fn api_key(&self, flag: Option<&str>) -> Result<ApiKey, HarvestError> {
        resolve_api_key(
            flag,
            self.api_key.as_deref(),
            std::env::var(API_KEY_ENV).ok().as_deref(),
        )
    }
}

pub fn resolve_api_key(
    flag: Option<&str>,
    config: Option<&str>,
    env: Option<&str>,
) -> Result<ApiKey, HarvestError> {
    flag.or(config)
        .or(env)
        .ok_or(HarvestError::MissingApiKey)?
        .parse()
}

pub fn validate_limit(limit: usize) -> Result<(), HarvestError> {
    if limit == 0 {
        return Err(HarvestError::InvalidConfig(
            "per_query_limit must be at least 1".to_string(),
        ));
    }
    if limit > PER_PAGE_CAP {
        tracing::warn!(
            "per_query_limit {limit} exceeds the single-page cap of {PER_PAGE_CAP}; \
             at most {PER_PAGE_CAP} images per query will be fetched"
        );
    }
    Ok(())
}

pub fn validate_prefix(prefix: &str) -> Result<(), HarvestError> {
    if prefix.is_empty() || prefix.contains(|ch| ch == '/' || ch == '\\') {
        return Err(HarvestError::InvalidConfig(format!(
            "file_prefix must be a non-empty file name fragment: {prefix:?}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_catalog_defaults() {
        let resolved = ConfigLoader::resolve_config(Config::default()).unwrap();
        assert_eq!(resolved.per_query_limit, 7);
        assert_eq!(resolved.file_prefix, "pixabay");
        assert_eq!(resolved.queries.len(), catalog::DEFAULT_QUERIES.len());
        assert_eq!(resolved.output_dir, resolved.relabel_dir);
        assert_eq!(resolved.filters.image_type, ImageType::Photo);
        assert!(resolved.filters.safe_search);
    }
}
