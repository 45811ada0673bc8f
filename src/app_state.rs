use std::collections::HashMap;
use std::sync::mpsc::{channel, Receiver, Sender};

use crate::dashboard::CatalogRef;
use crate::images::ImageManager;
use crate::models::{Config, PlaylistData, Tab, TrendingEntry, UserEntry};

/// Results reported back from background tasks, drained once per frame.
#[derive(Debug, Clone)]
pub enum Msg {
    PlaylistLoaded {
        tab: Tab,
        result: Result<PlaylistData, String>,
    },
    TrendingLoaded(Vec<TrendingEntry>),
    CoverLoaded { url: String, bytes: Vec<u8> },
    CoverFailed { url: String },
    LoadingError(String),
}

/// Central application state manager
pub struct AppState {
    pub config: Config,

    // Catalog store: one snapshot per tab, replaced wholesale. The
    // generation bumps on every replacement so downstream consumers can
    // tell snapshots apart without comparing contents.
    playlists: HashMap<Tab, PlaylistData>,
    generations: HashMap<Tab, u64>,

    pub user_data: Vec<UserEntry>,
    pub trending: Vec<TrendingEntry>,

    pub loading: HashMap<Tab, bool>,
    pub error_message: Option<String>,

    pub images: ImageManager,

    message_tx: Sender<Msg>,
    message_rx: Receiver<Msg>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let (tx, rx) = channel();
        let mut playlists = HashMap::new();
        let mut generations = HashMap::new();
        for tab in Tab::ALL {
            playlists.insert(tab, PlaylistData::default());
            generations.insert(tab, 0);
        }
        Self {
            config,
            playlists,
            generations,
            user_data: Vec::new(),
            trending: Vec::new(),
            loading: HashMap::new(),
            error_message: None,
            images: ImageManager::default(),
            message_tx: tx,
            message_rx: rx,
        }
    }

    /// Sender handed to background tasks to report back.
    pub fn sender(&self) -> Sender<Msg> {
        self.message_tx.clone()
    }

    /// Drain everything background tasks produced since the last frame.
    pub fn process_messages(&mut self) -> Vec<Msg> {
        let mut messages = Vec::new();
        while let Ok(msg) = self.message_rx.try_recv() {
            messages.push(msg);
        }
        messages
    }

    pub fn catalog(&self, tab: Tab) -> CatalogRef<'_> {
        static EMPTY: &[crate::models::CatalogEntry] = &[];
        match self.playlists.get(&tab) {
            Some(data) => CatalogRef::new(
                &data.playlist,
                self.generations.get(&tab).copied().unwrap_or(0),
            ),
            None => CatalogRef::new(EMPTY, 0),
        }
    }

    pub fn categories(&self, tab: Tab) -> &[crate::models::Category] {
        self.playlists
            .get(&tab)
            .map(|d| d.categories.as_slice())
            .unwrap_or(&[])
    }

    pub fn replace_playlist(&mut self, tab: Tab, data: PlaylistData) {
        self.playlists.insert(tab, data);
        *self.generations.entry(tab).or_insert(0) += 1;
    }

    pub fn generation(&self, tab: Tab) -> u64 {
        self.generations.get(&tab).copied().unwrap_or(0)
    }

    pub fn set_loading(&mut self, tab: Tab, loading: bool) {
        self.loading.insert(tab, loading);
    }

    pub fn is_loading(&self, tab: Tab) -> bool {
        self.loading.get(&tab).copied().unwrap_or(false)
    }

    pub fn any_loading(&self) -> bool {
        self.loading.values().any(|&l| l)
    }

    pub fn set_error(&mut self, message: String) {
        self.error_message = Some(message);
    }

    pub fn clear_error(&mut self) {
        self.error_message = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CatalogEntry;

    #[test]
    fn replace_playlist_bumps_generation() {
        let mut state = AppState::new(Config::default());
        assert_eq!(state.generation(Tab::Movies), 0);
        state.replace_playlist(
            Tab::Movies,
            PlaylistData {
                playlist: vec![CatalogEntry { id: "1".into(), ..Default::default() }],
                categories: Vec::new(),
            },
        );
        assert_eq!(state.generation(Tab::Movies), 1);
        assert_eq!(state.catalog(Tab::Movies).entries.len(), 1);
        // the other tab is untouched
        assert_eq!(state.generation(Tab::Series), 0);
    }

    #[test]
    fn messages_round_trip_through_channel() {
        let mut state = AppState::new(Config::default());
        let tx = state.sender();
        tx.send(Msg::LoadingError("boom".into())).unwrap();
        let msgs = state.process_messages();
        assert_eq!(msgs.len(), 1);
        assert!(matches!(&msgs[0], Msg::LoadingError(e) if e == "boom"));
        assert!(state.process_messages().is_empty());
    }

    #[test]
    fn loading_flags_per_tab() {
        let mut state = AppState::new(Config::default());
        state.set_loading(Tab::Series, true);
        assert!(state.is_loading(Tab::Series));
        assert!(!state.is_loading(Tab::Movies));
        assert!(state.any_loading());
    }
}
