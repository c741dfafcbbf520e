//! Media records produced by the query engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Maximum cast entries kept per item.
pub const MAX_CAST: usize = 5;

/// Closed set of media types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MediaType {
    Book,
    Movie,
    TvSeries,
    Comic,
    ShortDrama,
    Music,
    #[default]
    Other,
}

impl MediaType {
    pub const ALL: [MediaType; 7] = [
        MediaType::Book,
        MediaType::Movie,
        MediaType::TvSeries,
        MediaType::Comic,
        MediaType::ShortDrama,
        MediaType::Music,
        MediaType::Other,
    ];

    /// Display label, also used on the wire
    pub fn label(&self) -> &'static str {
        match self {
            MediaType::Book => "Book",
            MediaType::Movie => "Movie",
            MediaType::TvSeries => "TV Series",
            MediaType::Comic => "Comic",
            MediaType::ShortDrama => "Short Drama",
            MediaType::Music => "Music",
            MediaType::Other => "Other",
        }
    }

    /// Lenient parse: case, spacing and a few common synonyms are ignored.
    pub fn parse(label: &str) -> Option<Self> {
        let normalized: String = label
            .chars()
            .filter(|c| c.is_alphanumeric())
            .flat_map(char::to_lowercase)
            .collect();
        match normalized.as_str() {
            "book" | "books" | "novel" => Some(MediaType::Book),
            "movie" | "movies" | "film" => Some(MediaType::Movie),
            "tvseries" | "tv" | "series" | "tvshow" => Some(MediaType::TvSeries),
            "comic" | "comics" | "manga" => Some(MediaType::Comic),
            "shortdrama" => Some(MediaType::ShortDrama),
            "music" | "album" => Some(MediaType::Music),
            "other" => Some(MediaType::Other),
            _ => None,
        }
    }
}

impl From<String> for MediaType {
    fn from(value: String) -> Self {
        MediaType::parse(&value).unwrap_or(MediaType::Other)
    }
}

impl From<MediaType> for String {
    fn from(value: MediaType) -> Self {
        value.label().to_string()
    }
}

impl std::fmt::Display for MediaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Where an item sits in the user's catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CollectionStatus {
    #[default]
    ToWatch,
    Watched,
}

impl From<String> for CollectionStatus {
    fn from(value: String) -> Self {
        if value.trim().eq_ignore_ascii_case("watched") {
            CollectionStatus::Watched
        } else {
            CollectionStatus::ToWatch
        }
    }
}

impl From<CollectionStatus> for String {
    fn from(value: CollectionStatus) -> Self {
        match value {
            CollectionStatus::ToWatch => "To Watch".to_string(),
            CollectionStatus::Watched => "Watched".to_string(),
        }
    }
}

/// A record as the model wrote it, before ids and posters are attached.
///
/// Every field is optional and loosely typed: numbers where strings are expected,
/// comma-separated cast lists and `null`s are all accepted.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MediaDraft {
    #[serde(deserialize_with = "lenient_string")]
    pub title: String,

    #[serde(deserialize_with = "lenient_string")]
    pub director_or_author: String,

    #[serde(deserialize_with = "lenient_list")]
    pub cast: Vec<String>,

    #[serde(deserialize_with = "lenient_string")]
    pub description: String,

    #[serde(deserialize_with = "lenient_string")]
    pub release_date: String,

    #[serde(rename = "type", deserialize_with = "lenient_media_type")]
    pub media_type: MediaType,

    #[serde(deserialize_with = "lenient_bool")]
    pub is_ongoing: bool,

    #[serde(deserialize_with = "lenient_string")]
    pub latest_update_info: String,

    #[serde(deserialize_with = "lenient_string")]
    pub rating: String,
}

impl MediaDraft {
    /// Decode an extracted record. Records without a title are rejected.
    ///
    /// Fallback keys (`author`, `year`, ...) fill a canonical field only when the
    /// canonical key is missing or blank.
    pub fn from_record(record: Value) -> Option<Self> {
        match serde_json::from_value::<MediaDraft>(with_fallback_keys(record)) {
            Ok(draft) if !draft.title.trim().is_empty() => Some(draft),
            Ok(_) => {
                tracing::debug!("dropping record without a title");
                None
            }
            Err(e) => {
                tracing::debug!(error = %e, "dropping malformed record");
                None
            }
        }
    }

    /// Four-digit year from the release date, if present.
    pub fn year(&self) -> Option<&str> {
        release_year(&self.release_date)
    }
}

/// A finalized, catalog-ready item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaItem {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub director_or_author: String,
    #[serde(default)]
    pub cast: Vec<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub release_date: String,
    #[serde(rename = "type", default)]
    pub media_type: MediaType,
    #[serde(default)]
    pub is_ongoing: bool,
    #[serde(default)]
    pub latest_update_info: String,
    #[serde(default)]
    pub rating: String,
    #[serde(default)]
    pub poster_url: String,
    #[serde(default)]
    pub user_rating: u8,
    #[serde(default)]
    pub status: CollectionStatus,
    #[serde(default = "Utc::now")]
    pub added_at: DateTime<Utc>,
}

impl MediaItem {
    /// Attach a fresh id, the resolved poster and default collection metadata.
    pub fn from_draft(draft: MediaDraft, poster_url: String) -> Self {
        let mut cast = draft.cast;
        cast.truncate(MAX_CAST);
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            title: draft.title.trim().to_string(),
            director_or_author: draft.director_or_author,
            cast,
            description: draft.description,
            release_date: draft.release_date,
            media_type: draft.media_type,
            is_ongoing: draft.is_ongoing,
            latest_update_info: draft.latest_update_info,
            rating: draft.rating,
            poster_url,
            user_rating: 0,
            status: CollectionStatus::ToWatch,
            added_at: Utc::now(),
        }
    }

    pub fn year(&self) -> Option<&str> {
        release_year(&self.release_date)
    }
}

/// Latest-release information for a catalog item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateInfo {
    pub id: String,
    pub latest_update_info: String,
    pub is_ongoing: bool,
}

/// One entry of a model's update report, keyed by title.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateDraft {
    #[serde(deserialize_with = "lenient_string")]
    pub title: String,

    #[serde(deserialize_with = "lenient_string")]
    pub latest_update_info: String,

    #[serde(deserialize_with = "lenient_bool")]
    pub is_ongoing: bool,
}

impl UpdateDraft {
    pub fn from_record(record: Value) -> Option<Self> {
        serde_json::from_value::<UpdateDraft>(record)
            .ok()
            .filter(|draft| !draft.title.trim().is_empty())
    }
}

/// Canonical draft keys and the alternate names models use for them, in preference order.
const FALLBACK_KEYS: &[(&str, &[&str])] = &[
    ("directorOrAuthor", &["director", "author", "creator"]),
    ("releaseDate", &["year", "date"]),
    ("type", &["mediaType"]),
];

fn with_fallback_keys(record: Value) -> Value {
    let Value::Object(mut map) = record else {
        return record;
    };
    for (canonical, fallbacks) in FALLBACK_KEYS {
        if map.get(*canonical).is_some_and(|v| !is_blank(v)) {
            continue;
        }
        let fallback = fallbacks
            .iter()
            .find_map(|key| map.get(*key).filter(|v| !is_blank(v)).cloned());
        if let Some(value) = fallback {
            map.insert(canonical.to_string(), value);
        }
    }
    Value::Object(map)
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

/// Leading year of "2024-05-01", "2024", "1999-2003" and the like.
pub fn release_year(date: &str) -> Option<&str> {
    let year = date.trim().split(['-', '/', ' ']).next()?.trim();
    (year.len() == 4 && year.chars().all(|c| c.is_ascii_digit())).then_some(year)
}

fn value_to_string(value: Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s,
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(value_to_string(Value::deserialize(deserializer)?))
}

fn lenient_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let list = match Value::deserialize(deserializer)? {
        Value::Array(items) => items.into_iter().map(value_to_string).collect(),
        Value::String(s) => s.split([',', '、', ';']).map(str::to_string).collect(),
        _ => Vec::new(),
    };
    Ok(list
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect())
}

fn lenient_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Bool(b) => b,
        Value::String(s) => matches!(s.trim().to_ascii_lowercase().as_str(), "true" | "yes" | "1"),
        Value::Number(n) => n.as_i64().is_some_and(|n| n != 0),
        _ => false,
    })
}

fn lenient_media_type<'de, D>(deserializer: D) -> Result<MediaType, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => MediaType::from(s),
        _ => MediaType::Other,
    })
}
