use serde::{de::DeserializeOwned, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use directories::ProjectDirs;

use crate::models::{PlaylistData, Tab};

pub fn cache_dir() -> PathBuf {
    let dir = ProjectDirs::from("", "", "rustream")
        .map(|d| d.cache_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from(".cache"));
    let _ = fs::create_dir_all(&dir);
    dir
}

pub fn cache_path(key: &str) -> PathBuf {
    cache_dir().join(format!("{}.json", key))
}

pub fn cover_cache_dir() -> PathBuf {
    let mut d = cache_dir();
    d.push("covers");
    let _ = fs::create_dir_all(&d);
    d
}

pub fn cover_cache_path(url: &str) -> PathBuf {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};
    let mut hasher = DefaultHasher::new();
    url.hash(&mut hasher);
    let hash = hasher.finish();
    let ext = if url.ends_with(".png") { "png" } else { "jpg" };
    cover_cache_dir().join(format!("{:x}.{}", hash, ext))
}

pub fn file_age_secs(path: &Path) -> Option<u64> {
    let meta = fs::metadata(path).ok()?;
    let modified = meta.modified().ok()?;
    SystemTime::now().duration_since(modified).ok().map(|d| d.as_secs())
}

fn load_json<T: DeserializeOwned>(path: &Path) -> Option<T> {
    let s = fs::read_to_string(path).ok()?;
    serde_json::from_str::<T>(&s).ok()
}

fn save_json<T: Serialize>(path: &Path, data: &T) {
    if let Ok(s) = serde_json::to_string(data) {
        let _ = fs::write(path, s);
    }
}

pub fn load_cache<T: DeserializeOwned>(key: &str, max_age_secs: u64) -> Option<T> {
    let path = cache_path(key);
    match file_age_secs(&path) {
        Some(age) if age <= max_age_secs => load_json(&path),
        _ => None,
    }
}

/// Ignore the TTL; used as a fallback when the network is down.
pub fn load_stale_cache<T: DeserializeOwned>(key: &str) -> Option<T> {
    load_json(&cache_path(key))
}

pub fn save_cache<T: Serialize>(key: &str, data: &T) {
    save_json(&cache_path(key), data);
}

fn playlist_key(profile_name: &str, tab: Tab) -> String {
    let safe: String = profile_name
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect();
    format!("playlist_{}_{}", safe, tab.as_str())
}

/// The persisted `{playlist, categories}` snapshot for a profile's tab.
pub fn load_local_playlist(profile_name: &str, tab: Tab) -> Option<PlaylistData> {
    load_stale_cache(&playlist_key(profile_name, tab))
}

pub fn save_local_playlist(profile_name: &str, tab: Tab, data: &PlaylistData) {
    save_cache(&playlist_key(profile_name, tab), data);
}

pub fn playlist_cache_key(profile_name: &str, tab: Tab) -> String {
    playlist_key(profile_name, tab)
}
