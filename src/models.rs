use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Tab {
    #[default]
    Movies,
    Series,
}

impl Tab {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tab::Movies => "vod",
            Tab::Series => "series",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Tab::Movies => "Movies",
            Tab::Series => "Series",
        }
    }

    pub const ALL: [Tab; 2] = [Tab::Movies, Tab::Series];
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerProfile {
    pub name: String,
    pub address: String,
    pub username: String,
    pub password: String,
}

#[derive(Default, Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server_profiles: Vec<ServerProfile>,
    #[serde(default)]
    pub active_profile_index: usize,
    #[serde(default)]
    pub player_command: String,
    #[serde(default)]
    pub tmdb_api_key: String,
    #[serde(default)]
    pub theme: String, // "dark" | "light"
    #[serde(default)]
    pub font_scale: f32,
}

impl Config {
    pub fn active_profile(&self) -> ServerProfile {
        self.server_profiles
            .get(self.active_profile_index)
            .cloned()
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub category_id: String,
    #[serde(default)]
    pub container_extension: String,
    #[serde(default)]
    pub cover: Option<String>,
    #[serde(default)]
    pub added: Option<String>,
    #[serde(default)]
    pub rating_5based: Option<f32>,
    #[serde(default)]
    pub plot: String,
    #[serde(default)]
    pub year: Option<String>,
}

/// One tab's worth of catalog data, persisted wholesale as `{playlist, categories}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlaylistData {
    #[serde(default)]
    pub playlist: Vec<CatalogEntry>,
    #[serde(default)]
    pub categories: Vec<Category>,
}

/// Per-profile bookkeeping for a single catalog entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserEntry {
    pub id: String,
    #[serde(default)]
    pub favorite: bool,
    #[serde(default)]
    pub current_secs: u64,
    #[serde(default)]
    pub duration_secs: u64,
    #[serde(default)]
    pub watching: bool,
    #[serde(default)]
    pub updated_at: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrendingEntry {
    pub id: i64,
    pub title: String,
    pub media_type: String, // "movie" or "tv"
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub overview: String,
    #[serde(default)]
    pub backdrop_path: Option<String>,
    #[serde(default)]
    pub vote_average: Option<f32>,
}
