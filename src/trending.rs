use serde_json::Value;

use crate::api::{ApiError, HTTP};
use crate::logger::log_line;
use crate::models::TrendingEntry;

const TRENDING_URL: &str = "https://api.themoviedb.org/3/trending/all/week";

pub fn parse_trending(json: &Value) -> Vec<TrendingEntry> {
    let mut out = Vec::new();
    if let Some(results) = json.get("results").and_then(|r| r.as_array()) {
        for v in results {
            let media_type = v
                .get("media_type")
                .and_then(|x| x.as_str())
                .unwrap_or_default()
                .to_string();
            // people also show up in the "all" feed
            if media_type != "movie" && media_type != "tv" {
                continue;
            }
            let title = v
                .get("title")
                .or_else(|| v.get("name"))
                .and_then(|x| x.as_str())
                .unwrap_or_default()
                .to_string();
            if title.is_empty() {
                continue;
            }
            out.push(TrendingEntry {
                id: v.get("id").and_then(|x| x.as_i64()).unwrap_or_default(),
                title,
                media_type,
                release_date: v
                    .get("release_date")
                    .or_else(|| v.get("first_air_date"))
                    .and_then(|x| x.as_str())
                    .map(|s| s.to_string()),
                overview: v
                    .get("overview")
                    .and_then(|x| x.as_str())
                    .unwrap_or_default()
                    .to_string(),
                backdrop_path: v
                    .get("backdrop_path")
                    .and_then(|x| x.as_str())
                    .map(|s| s.to_string()),
                vote_average: v.get("vote_average").and_then(|x| x.as_f64()).map(|x| x as f32),
            });
        }
    }
    out
}

pub async fn fetch_trending(api_key: &str) -> Result<Vec<TrendingEntry>, ApiError> {
    let url = format!("{}?api_key={}", TRENDING_URL, urlencoding::encode(api_key));
    let res = HTTP.get(&url).send().await?;
    let json = res.json::<Value>().await?;
    if json.get("results").map(|r| r.is_array()) != Some(true) {
        return Err(ApiError::Payload("trending response has no results".into()));
    }
    Ok(parse_trending(&json))
}

/// The home view never surfaces a trending failure; it just goes without.
pub async fn fetch_trending_safe(api_key: &str) -> Vec<TrendingEntry> {
    if api_key.trim().is_empty() {
        return Vec::new();
    }
    match fetch_trending(api_key).await {
        Ok(entries) => entries,
        Err(e) => {
            log_line(&format!("trending fetch failed: {}", e));
            Vec::new()
        }
    }
}

pub fn detail_url(entry: &TrendingEntry) -> String {
    format!("https://www.themoviedb.org/{}/{}", entry.media_type, entry.id)
}

pub fn open_details(entry: &TrendingEntry) {
    let url = detail_url(entry);
    if let Err(e) = webbrowser::open(&url) {
        log_line(&format!("failed to open {}: {}", url, e));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_picks_title_or_name_and_skips_people() {
        let payload = json!({
            "results": [
                { "id": 1, "media_type": "movie", "title": "Film", "release_date": "2024-02-01", "vote_average": 7.5 },
                { "id": 2, "media_type": "tv", "name": "Show", "first_air_date": "2023-05-05" },
                { "id": 3, "media_type": "person", "name": "Someone Famous" }
            ]
        });
        let entries = parse_trending(&payload);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].title, "Film");
        assert_eq!(entries[0].release_date.as_deref(), Some("2024-02-01"));
        assert_eq!(entries[1].title, "Show");
        assert_eq!(entries[1].release_date.as_deref(), Some("2023-05-05"));
    }

    #[test]
    fn parse_tolerates_missing_results() {
        assert!(parse_trending(&json!({})).is_empty());
        assert!(parse_trending(&json!({"results": "nope"})).is_empty());
    }

    #[test]
    fn detail_url_routes_by_media_type() {
        let movie = TrendingEntry {
            id: 99,
            title: "X".into(),
            media_type: "movie".into(),
            ..Default::default()
        };
        assert_eq!(detail_url(&movie), "https://www.themoviedb.org/movie/99");
        let tv = TrendingEntry { media_type: "tv".into(), id: 7, ..movie };
        assert_eq!(detail_url(&tv), "https://www.themoviedb.org/tv/7");
    }
}
