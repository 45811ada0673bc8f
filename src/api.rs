use once_cell::sync::Lazy;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

use crate::cache::{load_cache, load_stale_cache, playlist_cache_key, save_local_playlist};
use crate::models::{CatalogEntry, Category, PlaylistData, ServerProfile, Tab};

pub const CACHE_TTL_PLAYLIST_SECS: u64 = 3 * 60 * 60; // 3h

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected payload: {0}")]
    Payload(String),
}

pub static HTTP: Lazy<reqwest::Client> = Lazy::new(|| {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .build()
        .unwrap_or_default()
});

fn base_url(addr: &str) -> String {
    // Strip trailing / and optional /player_api.php to get the service root
    let mut a = addr.trim().trim_end_matches('/').to_string();
    if a.ends_with("/player_api.php") {
        a.truncate(a.len() - "/player_api.php".len());
        a = a.trim_end_matches('/').to_string();
    }
    if !a.starts_with("http://") && !a.starts_with("https://") {
        format!("http://{}", a)
    } else {
        a
    }
}

fn player_api_url(profile: &ServerProfile, action: &str) -> String {
    format!(
        "{}/player_api.php?username={}&password={}&action={}",
        base_url(&profile.address),
        urlencoding::encode(&profile.username),
        urlencoding::encode(&profile.password),
        action
    )
}

fn read_string_or_number(v: &Value) -> Option<String> {
    v.as_str()
        .map(|s| s.to_string())
        .or_else(|| v.as_i64().map(|n| n.to_string()))
}

fn read_f32(v: &Value) -> Option<f32> {
    v.as_f64()
        .map(|x| x as f32)
        .or_else(|| v.as_str().and_then(|s| s.trim().parse::<f32>().ok()))
}

pub fn parse_categories(json: &Value) -> Vec<Category> {
    let mut out = Vec::new();
    if let Some(arr) = json.as_array() {
        for v in arr {
            let id = v
                .get("category_id")
                .or_else(|| v.get("id"))
                .and_then(read_string_or_number)
                .unwrap_or_default();
            let name = v
                .get("category_name")
                .or_else(|| v.get("name"))
                .and_then(|x| x.as_str())
                .unwrap_or_default()
                .to_string();
            if !id.is_empty() || !name.is_empty() {
                out.push(Category { id, name });
            }
        }
    }
    out
}

pub fn parse_entries(json: &Value) -> Vec<CatalogEntry> {
    let mut out = Vec::new();
    if let Some(arr) = json.as_array() {
        for v in arr {
            let id = v
                .get("stream_id")
                .or_else(|| v.get("series_id"))
                .or_else(|| v.get("id"))
                .and_then(read_string_or_number)
                .unwrap_or_default();
            let name = v
                .get("name")
                .and_then(|x| x.as_str())
                .unwrap_or_default()
                .to_string();
            if id.is_empty() && name.is_empty() {
                continue;
            }
            let mut entry = CatalogEntry { id, name, ..Default::default() };
            if let Some(cid) = v.get("category_id").and_then(read_string_or_number) {
                entry.category_id = cid;
            }
            if let Some(ext) = v.get("container_extension").and_then(|x| x.as_str()) {
                entry.container_extension = ext.to_string();
            }
            if let Some(cover) = v
                .get("stream_icon")
                .or_else(|| v.get("cover"))
                .and_then(|x| x.as_str())
            {
                if !cover.is_empty() {
                    entry.cover = Some(cover.to_string());
                }
            }
            if let Some(added) = v.get("added").and_then(read_string_or_number) {
                entry.added = Some(added);
            }
            // Ratings: "rating_5based" (number or string) or "rating", normalized to 0..5
            let r5 = v.get("rating_5based").and_then(read_f32);
            let r10 = v.get("rating").and_then(read_f32);
            entry.rating_5based = r5.or_else(|| r10.map(|x| if x > 5.0 { x / 2.0 } else { x }));
            if let Some(plot) = v.get("plot").and_then(|x| x.as_str()) {
                entry.plot = plot.to_string();
            }
            if let Some(year) = v
                .get("year")
                .or_else(|| v.get("releaseDate"))
                .or_else(|| v.get("release_date"))
                .and_then(|x| x.as_str())
            {
                entry.year = Some(year.to_string());
            }
            out.push(entry);
        }
    }
    out
}

async fn fetch_json(url: &str) -> Result<Value, ApiError> {
    let res = HTTP.get(url).send().await?;
    Ok(res.json::<Value>().await?)
}

/// Fetch one tab's streams and categories and persist the combined snapshot.
/// A fresh on-disk copy short-circuits the network; a network failure falls
/// back to whatever stale copy exists.
pub async fn fetch_playlist(profile: &ServerProfile, tab: Tab) -> Result<PlaylistData, ApiError> {
    let key = playlist_cache_key(&profile.name, tab);
    if let Some(cached) = load_cache::<PlaylistData>(&key, CACHE_TTL_PLAYLIST_SECS) {
        return Ok(cached);
    }
    let (streams_action, categories_action) = match tab {
        Tab::Movies => ("get_vod_streams", "get_vod_categories"),
        Tab::Series => ("get_series", "get_series_categories"),
    };
    let net = async {
        let streams = fetch_json(&player_api_url(profile, streams_action)).await?;
        let categories = fetch_json(&player_api_url(profile, categories_action)).await?;
        if !streams.is_array() || !categories.is_array() {
            return Err(ApiError::Payload(format!(
                "{} response is not an array",
                streams_action
            )));
        }
        Ok(PlaylistData {
            playlist: parse_entries(&streams),
            categories: parse_categories(&categories),
        })
    }
    .await;
    match net {
        Ok(data) => {
            save_local_playlist(&profile.name, tab, &data);
            Ok(data)
        }
        Err(e) => {
            if let Some(stale) = load_stale_cache::<PlaylistData>(&key) {
                Ok(stale)
            } else {
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn base_url_normalizes() {
        assert_eq!(base_url("host:8080"), "http://host:8080");
        assert_eq!(base_url("http://host/player_api.php"), "http://host");
        assert_eq!(base_url("https://host/ "), "https://host");
    }

    #[test]
    fn player_api_url_encodes_credentials() {
        let profile = ServerProfile {
            name: "p".into(),
            address: "http://host".into(),
            username: "a b".into(),
            password: "p&w".into(),
        };
        let url = player_api_url(&profile, "get_vod_streams");
        assert_eq!(
            url,
            "http://host/player_api.php?username=a%20b&password=p%26w&action=get_vod_streams"
        );
    }

    #[test]
    fn parse_entries_handles_xtream_shapes() {
        let payload = json!([
            {
                "stream_id": 42,
                "name": "Alpha",
                "category_id": "7",
                "container_extension": "mkv",
                "stream_icon": "http://img/alpha.jpg",
                "added": "1700000000",
                "rating": "8.4",
                "plot": "A film."
            },
            {
                "series_id": "9",
                "name": "Beta",
                "category_id": 3,
                "cover": "http://img/beta.jpg",
                "rating_5based": 4.5,
                "releaseDate": "2020-01-01"
            },
            { "irrelevant": true }
        ]);
        let entries = parse_entries(&payload);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].id, "42");
        assert_eq!(entries[0].category_id, "7");
        assert_eq!(entries[0].cover.as_deref(), Some("http://img/alpha.jpg"));
        // "rating": 8.4 on a 10 scale normalizes to 4.2
        assert!((entries[0].rating_5based.unwrap() - 4.2).abs() < 0.01);
        assert_eq!(entries[1].id, "9");
        assert_eq!(entries[1].category_id, "3");
        assert_eq!(entries[1].rating_5based, Some(4.5));
        assert_eq!(entries[1].year.as_deref(), Some("2020-01-01"));
    }

    #[test]
    fn parse_categories_accepts_alternate_keys() {
        let payload = json!([
            { "category_id": "1", "category_name": "Action" },
            { "id": 2, "name": "Drama" }
        ]);
        let cats = parse_categories(&payload);
        assert_eq!(cats.len(), 2);
        assert_eq!(cats[0].id, "1");
        assert_eq!(cats[0].name, "Action");
        assert_eq!(cats[1].id, "2");
        assert_eq!(cats[1].name, "Drama");
    }

    #[test]
    fn parse_entries_rejects_non_array() {
        assert!(parse_entries(&json!({"user_info": {}})).is_empty());
    }
}
