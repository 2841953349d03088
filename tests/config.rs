use std::collections::BTreeMap;
use std::time::Duration;

use assert_matches::assert_matches;

use dish_harvester::config::{Config, ConfigLoader, resolve_api_key};
use dish_harvester::domain::{ImageType, PLACEHOLDER_API_KEY};
use dish_harvester::error::HarvestError;

#[test]
fn config_overrides_defaults() {
    let config: Config = serde_json::from_str(
        r#"{
            "output_dir": "images",
            "per_query_limit": 3,
            "image_type": "illustration",
            "safe_search": false,
            "item_delay_ms": 0,
            "queries": ["Bánh Xèo"],
            "folder_mapping": {"banh_xeo": "Bánh Xèo"}
        }"#,
    )
    .unwrap();

    let resolved = ConfigLoader::resolve_config(config).unwrap();
    assert_eq!(resolved.output_dir.as_str(), "images");
    assert_eq!(resolved.relabel_dir.as_str(), "images");
    assert_eq!(resolved.per_query_limit, 3);
    assert_eq!(resolved.filters.image_type, ImageType::Illustration);
    assert!(!resolved.filters.safe_search);
    assert_eq!(resolved.pacing.item_delay, Duration::ZERO);
    assert_eq!(resolved.pacing.query_delay, Duration::from_secs(1));
    assert_eq!(resolved.queries.len(), 1);
    assert_eq!(
        resolved.folder_mapping,
        BTreeMap::from([("banh_xeo".to_string(), "Bánh Xèo".to_string())])
    );
}

#[test]
fn zero_limit_is_invalid() {
    let config = Config {
        per_query_limit: Some(0),
        ..Config::default()
    };
    let err = ConfigLoader::resolve_config(config).unwrap_err();
    assert_matches!(err, HarvestError::InvalidConfig(_));
}

#[test]
fn prefix_with_separator_is_invalid() {
    let config = Config {
        file_prefix: Some("a/b".to_string()),
        ..Config::default()
    };
    let err = ConfigLoader::resolve_config(config).unwrap_err();
    assert_matches!(err, HarvestError::InvalidConfig(_));
}

#[test]
fn explicit_missing_config_is_an_error() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("nope.json");
    let err = ConfigLoader::resolve(path.to_str()).unwrap_err();
    assert_matches!(err, HarvestError::MissingConfig(_));
}

#[test]
fn malformed_config_is_a_parse_error() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("dish-harvester.json");
    std::fs::write(&path, b"{ not json").unwrap();
    let err = ConfigLoader::resolve(path.to_str()).unwrap_err();
    assert_matches!(err, HarvestError::ConfigParse(_));
}

#[test]
fn api_key_precedence() {
    let key = resolve_api_key(Some("flag"), Some("config"), Some("env")).unwrap();
    assert_eq!(key.expose(), "flag");
    let key = resolve_api_key(None, Some("config"), Some("env")).unwrap();
    assert_eq!(key.expose(), "config");
    let key = resolve_api_key(None, None, Some("env")).unwrap();
    assert_eq!(key.expose(), "env");
}

#[test]
fn api_key_precondition() {
    assert_matches!(
        resolve_api_key(None, None, None).unwrap_err(),
        HarvestError::MissingApiKey
    );
    assert_matches!(
        resolve_api_key(None, Some(PLACEHOLDER_API_KEY), None).unwrap_err(),
        HarvestError::PlaceholderApiKey(_)
    );
    assert_matches!(
        resolve_api_key(Some(""), None, Some("env")).unwrap_err(),
        HarvestError::MissingApiKey
    );
}
