use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::HarvestError;

pub const SLUG_MAX_CHARS: usize = 50;
pub const PLACEHOLDER_API_KEY: &str = "YOUR_PIXABAY_API_KEY";
pub const DEFAULT_FILE_PREFIX: &str = "pixabay";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Query(String);

impl Query {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Directory name for this query, `position` being its 0-based index in the run.
    pub fn slug(&self, position: usize) -> Slug {
        Slug::from_query(&self.0, position)
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Query {
    type Err = HarvestError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(HarvestError::InvalidConfig(
                "search query must not be blank".to_string(),
            ));
        }
        Ok(Self(trimmed.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Slug(String);

impl Slug {
    /// Keeps alphanumerics, spaces, `_` and `-`, joins whitespace runs with `_`,
    /// lowercases and truncates to [`SLUG_MAX_CHARS`]. Falls back to `dish_<position>`
    /// when nothing survives.
    pub fn from_query(query: &str, position: usize) -> Self {
        let kept = query
            .chars()
            .filter(|ch| ch.is_alphanumeric() || matches!(ch, ' ' | '_' | '-'))
            .collect::<String>();
        let joined = kept.split_whitespace().collect::<Vec<_>>().join("_");
        let slug = joined
            .to_lowercase()
            .chars()
            .take(SLUG_MAX_CHARS)
            .collect::<String>();
        if slug.is_empty() {
            return Self(format!("dish_{position}"));
        }
        Self(slug)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Slug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

impl FromStr for ApiKey {
    type Err = HarvestError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(HarvestError::MissingApiKey);
        }
        if trimmed == PLACEHOLDER_API_KEY {
            return Err(HarvestError::PlaceholderApiKey(trimmed.to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ImageType {
    All,
    Photo,
    Illustration,
    Vector,
}

impl fmt::Display for ImageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageType::All => write!(f, "all"),
            ImageType::Photo => write!(f, "photo"),
            ImageType::Illustration => write!(f, "illustration"),
            ImageType::Vector => write!(f, "vector"),
        }
    }
}

/// Item identifier as it appears in a file name. Numbers and strings are both
/// accepted; characters outside `[A-Za-z0-9._-]` are dropped.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct HitId(String);

impl HitId {
    pub fn from_raw(raw: &str) -> Option<Self> {
        let kept = raw
            .trim()
            .chars()
            .filter(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '.' | '_' | '-'))
            .collect::<String>();
        if kept.is_empty() {
            return None;
        }
        Some(Self(kept))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<u64> for HitId {
    fn from(value: u64) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for HitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One search result as returned in the `hits` array.
///
/// Fields of an unexpected JSON type deserialize as absent, so a malformed hit
/// only affects itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    #[serde(default, deserialize_with = "lenient_id")]
    pub id: Option<HitId>,
    #[serde(default, rename = "largeImageURL", deserialize_with = "lenient_url")]
    pub large_image_url: Option<String>,
    #[serde(default, rename = "webformatURL", deserialize_with = "lenient_url")]
    pub webformat_url: Option<String>,
    #[serde(default, rename = "previewURL", deserialize_with = "lenient_url")]
    pub preview_url: Option<String>,
}

fn lenient_id<'de, D>(deserializer: D) -> Result<Option<HitId>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(number) => HitId::from_raw(&number.to_string()),
        Value::String(text) => HitId::from_raw(&text),
        _ => None,
    })
}

fn lenient_url<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(url) => Some(url),
        _ => None,
    })
}

/// Deserializes the `hits` array element by element. An entry that is not an
/// object becomes an empty hit, which is later skipped for lacking a URL.
pub fn lenient_hits<'de, D>(deserializer: D) -> Result<Vec<SearchHit>, D::Error>
where
    D: Deserializer<'de>,
{
    let values = match Value::deserialize(deserializer)? {
        Value::Array(values) => values,
        _ => return Ok(Vec::new()),
    };
    Ok(values
        .into_iter()
        .map(|value| serde_json::from_value(value).unwrap_or_default())
        .collect())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageVariant {
    Large,
    Web,
    Preview,
}

impl ImageVariant {
    pub const FALLBACK_ORDER: [ImageVariant; 3] =
        [ImageVariant::Large, ImageVariant::Web, ImageVariant::Preview];

    pub fn url_of(self, hit: &SearchHit) -> Option<&str> {
        let url = match self {
            ImageVariant::Large => hit.large_image_url.as_deref(),
            ImageVariant::Web => hit.webformat_url.as_deref(),
            ImageVariant::Preview => hit.preview_url.as_deref(),
        };
        url.map(str::trim).filter(|value| !value.is_empty())
    }

    /// First variant in [`Self::FALLBACK_ORDER`] that carries a usable URL.
    pub fn select(hit: &SearchHit) -> Option<(Self, &str)> {
        Self::FALLBACK_ORDER
            .iter()
            .find_map(|variant| variant.url_of(hit).map(|url| (*variant, url)))
    }
}

impl fmt::Display for ImageVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageVariant::Large => write!(f, "large"),
            ImageVariant::Web => write!(f, "web"),
            ImageVariant::Preview => write!(f, "preview"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageExtension {
    Jpg,
    Png,
    Webp,
}

/// Substrings looked for in a `Content-Type` header, first match wins.
pub const CONTENT_TYPE_RULES: &[(&str, ImageExtension)] = &[
    ("jpeg", ImageExtension::Jpg),
    ("png", ImageExtension::Png),
    ("webp", ImageExtension::Webp),
];

/// Suffixes looked for at the end of the URL path, first match wins.
pub const URL_SUFFIX_RULES: &[(&str, ImageExtension)] = &[
    (".png", ImageExtension::Png),
    (".jpg", ImageExtension::Jpg),
    (".jpeg", ImageExtension::Jpg),
    (".webp", ImageExtension::Webp),
];

impl ImageExtension {
    pub fn as_str(self) -> &'static str {
        match self {
            ImageExtension::Jpg => "jpg",
            ImageExtension::Png => "png",
            ImageExtension::Webp => "webp",
        }
    }

    pub fn from_content_type(content_type: &str) -> Option<Self> {
        let lower = content_type.to_ascii_lowercase();
        CONTENT_TYPE_RULES
            .iter()
            .find(|(needle, _)| lower.contains(needle))
            .map(|(_, ext)| *ext)
    }

    pub fn from_url(url: &str) -> Option<Self> {
        let path = match reqwest::Url::parse(url) {
            Ok(parsed) => parsed.path().to_ascii_lowercase(),
            Err(_) => url
                .split(|ch| ch == '?' || ch == '#')
                .next()
                .unwrap_or(url)
                .to_ascii_lowercase(),
        };
        URL_SUFFIX_RULES
            .iter()
            .find(|(suffix, _)| path.ends_with(suffix))
            .map(|(_, ext)| *ext)
    }

    /// Content type first, then the URL path, then `.jpg`.
    pub fn resolve(content_type: Option<&str>, url: &str) -> Self {
        content_type
            .and_then(Self::from_content_type)
            .or_else(|| Self::from_url(url))
            .unwrap_or(ImageExtension::Jpg)
    }
}

impl fmt::Display for ImageExtension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemId {
    Api(HitId),
    /// 1-based position in the response, used when the payload carries no id.
    Position(usize),
}

impl ItemId {
    pub fn for_hit(hit: &SearchHit, position: usize) -> Self {
        match &hit.id {
            Some(id) => ItemId::Api(id.clone()),
            None => ItemId::Position(position + 1),
        }
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemId::Api(id) => write!(f, "{id}"),
            ItemId::Position(position) => write!(f, "{position}"),
        }
    }
}

pub fn image_file_name(
    prefix: &str,
    item: ItemId,
    sequence: usize,
    extension: ImageExtension,
) -> String {
    format!("{prefix}_{item}_{sequence:02}.{extension}")
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn slug_strips_punctuation_and_joins_words() {
        let slug = Slug::from_query("Bird's Nest Soup with Crabmeat", 3);
        assert_eq!(slug.as_str(), "birds_nest_soup_with_crabmeat");
    }

    #[test]
    fn slug_keeps_hyphens() {
        let slug = Slug::from_query("Stir-fried Glass Noodles", 0);
        assert_eq!(slug.as_str(), "stir-fried_glass_noodles");
    }

    #[test]
    fn slug_falls_back_to_position() {
        assert_eq!(Slug::from_query("!!! ???", 4).as_str(), "dish_4");
    }

    #[test]
    fn api_key_rejects_placeholder() {
        let err = PLACEHOLDER_API_KEY.parse::<ApiKey>().unwrap_err();
        assert_matches!(err, HarvestError::PlaceholderApiKey(_));
        let err = "   ".parse::<ApiKey>().unwrap_err();
        assert_matches!(err, HarvestError::MissingApiKey);
    }

    #[test]
    fn api_key_debug_is_redacted() {
        let key: ApiKey = "12345-abcdef".parse().unwrap();
        assert_eq!(format!("{key:?}"), "ApiKey(***)");
        assert_eq!(key.expose(), "12345-abcdef");
    }

    #[test]
    fn variant_prefers_large() {
        let hit = SearchHit {
            id: Some(HitId::from(1)),
            large_image_url: Some("https://cdn/large.jpg".to_string()),
            webformat_url: Some("https://cdn/web.jpg".to_string()),
            preview_url: Some("https://cdn/preview.jpg".to_string()),
        };
        assert_eq!(
            ImageVariant::select(&hit),
            Some((ImageVariant::Large, "https://cdn/large.jpg"))
        );
    }

    #[test]
    fn extension_defaults_to_jpg() {
        assert_eq!(
            ImageExtension::resolve(Some("application/octet-stream"), "https://cdn/blob"),
            ImageExtension::Jpg
        );
    }

    #[test]
    fn hit_id_accepts_strings_and_numbers() {
        let hit: SearchHit = serde_json::from_str(
            r#"{"id": "abc/12", "largeImageURL": 5, "previewURL": "https://cdn/p.jpg"}"#,
        )
        .unwrap();
        assert_eq!(hit.id, HitId::from_raw("abc12"));
        assert_eq!(hit.large_image_url, None);
        assert_eq!(hit.preview_url.as_deref(), Some("https://cdn/p.jpg"));

        let hit: SearchHit = serde_json::from_str(r#"{"id": -7}"#).unwrap();
        assert_eq!(hit.id.as_ref().map(HitId::as_str), Some("-7"));

        let hit: SearchHit = serde_json::from_str(r#"{"id": {"nested": true}}"#).unwrap();
        assert_eq!(hit.id, None);
    }

    #[test]
    fn file_name_pads_sequence() {
        let item = ItemId::Api(HitId::from(42));
        let name = image_file_name("pixabay", item, 7, ImageExtension::Png);
        assert_eq!(name, "pixabay_42_07.png");
    }
}
