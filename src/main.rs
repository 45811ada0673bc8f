use eframe::egui::{self, Color32, RichText};
use egui_extras::TableBuilder;

use std::time::{Duration, Instant};

mod api;
mod app_state;
mod cache;
mod config;
mod dashboard;
mod helpers;
mod images;
mod logger;
mod models;
mod player;
mod search;
mod storage;
mod trending;

use app_state::{AppState, Msg};
use cache::load_local_playlist;
use config::{read_config, save_config};
use dashboard::{BrowseEvent, Dashboard, ALL_CATEGORIES, ITEM_WIDTH};
use helpers::{format_duration, watch_fraction};
use logger::{log_error, log_line};
use models::{CatalogEntry, Config, Tab, UserEntry};
use player::{build_entry_url, start_player, PlayerHandle};
use storage::{
    is_favorite, keep_watching, load_user_data, now_secs, save_user_data, toggle_favorite,
    upsert_watch_state,
};

const COVER_SIZE: egui::Vec2 = egui::Vec2::new(138.0, 88.0);
const TRENDING_ROWS: usize = 8;

#[tokio::main]
async fn main() -> Result<(), eframe::Error> {
    log_line("starting rustream");
    let config = match read_config() {
        Ok(cfg) => cfg,
        Err(e) => {
            log_error("failed to read config", &e);
            Config::default()
        }
    };
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_maximized(true),
        ..Default::default()
    };
    eframe::run_native(
        "Rustream",
        options,
        Box::new(|cc| {
            apply_theme(&cc.egui_ctx, &config);
            Box::new(RustreamApp::new(config))
        }),
    )
}

fn apply_theme(ctx: &egui::Context, config: &Config) {
    if config.theme == "light" {
        ctx.set_visuals(egui::Visuals::light());
    } else {
        ctx.set_visuals(egui::Visuals::dark());
    }
    if config.font_scale > 0.5 {
        ctx.set_pixels_per_point(config.font_scale);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum View {
    Splash,
    Home,
    Browse,
}

struct RustreamApp {
    state: AppState,
    dash: Dashboard,
    view: View,
    splash_pending: usize,
    last_width: f32,
    player: Option<PlayerHandle>,
    last_player_poll: Instant,
    show_settings: bool,
    settings_draft: Option<Config>,
}

impl RustreamApp {
    fn new(config: Config) -> Self {
        let profile = config.active_profile();
        let mut app = Self {
            state: AppState::new(config),
            dash: Dashboard::new(),
            view: View::Splash,
            splash_pending: 0,
            last_width: 0.0,
            player: None,
            last_player_poll: Instant::now(),
            show_settings: false,
            settings_draft: None,
        };
        app.state.user_data = load_user_data(&profile.name);

        if profile.address.trim().is_empty() {
            // Nothing configured yet; open settings over whatever is on disk.
            app.load_local_snapshots();
            app.view = View::Home;
            app.show_settings = true;
            return app;
        }
        for tab in Tab::ALL {
            app.spawn_playlist_refresh(tab);
            app.splash_pending += 1;
        }
        app.spawn_trending_refresh();
        app
    }

    fn load_local_snapshots(&mut self) {
        let profile = self.state.config.active_profile();
        for tab in Tab::ALL {
            if let Some(data) = load_local_playlist(&profile.name, tab) {
                self.state.replace_playlist(tab, data);
            }
        }
        let cat = self.state.catalog(self.dash.state.tab);
        self.dash.apply(cat, BrowseEvent::CatalogReplaced);
    }

    fn spawn_playlist_refresh(&mut self, tab: Tab) {
        let profile = self.state.config.active_profile();
        if profile.address.trim().is_empty() {
            return;
        }
        self.state.set_loading(tab, true);
        let tx = self.state.sender();
        tokio::spawn(async move {
            let result = api::fetch_playlist(&profile, tab)
                .await
                .map_err(|e| e.to_string());
            let _ = tx.send(Msg::PlaylistLoaded { tab, result });
        });
    }

    fn spawn_trending_refresh(&mut self) {
        let api_key = self.state.config.tmdb_api_key.clone();
        if api_key.trim().is_empty() {
            return;
        }
        let tx = self.state.sender();
        tokio::spawn(async move {
            let entries = trending::fetch_trending_safe(&api_key).await;
            let _ = tx.send(Msg::TrendingLoaded(entries));
        });
    }

    fn switch_profile(&mut self, index: usize) {
        self.state.config.active_profile_index = index;
        if let Err(e) = save_config(&self.state.config) {
            log_error("failed to save config", &e);
        }
        let profile = self.state.config.active_profile();
        log_line(&format!("switched to profile '{}'", profile.name));
        self.state.user_data = load_user_data(&profile.name);
        self.state.trending.clear();
        self.state.images.clear();
        self.load_local_snapshots();
        for tab in Tab::ALL {
            self.spawn_playlist_refresh(tab);
        }
        self.spawn_trending_refresh();
    }

    fn handle_message(&mut self, ctx: &egui::Context, msg: Msg) {
        match msg {
            Msg::PlaylistLoaded { tab, result } => {
                self.state.set_loading(tab, false);
                if self.view == View::Splash {
                    self.splash_pending = self.splash_pending.saturating_sub(1);
                    if self.splash_pending == 0 {
                        self.view = View::Home;
                    }
                }
                match result {
                    Ok(data) => {
                        log_line(&format!(
                            "{} playlist loaded: {} entries, {} categories",
                            tab.as_str(),
                            data.playlist.len(),
                            data.categories.len()
                        ));
                        self.state.replace_playlist(tab, data);
                        if tab == self.dash.state.tab {
                            let cat = self.state.catalog(tab);
                            self.dash.apply(cat, BrowseEvent::CatalogReplaced);
                        }
                    }
                    Err(e) => {
                        self.state.set_error(format!(
                            "Failed to load {} playlist: {}",
                            tab.as_str(),
                            e
                        ));
                    }
                }
            }
            Msg::TrendingLoaded(entries) => {
                self.state.trending = entries;
            }
            Msg::CoverLoaded { url, bytes } => {
                self.state.images.insert_bytes(ctx, &url, &bytes);
            }
            Msg::CoverFailed { url } => {
                self.state.images.mark_failed(&url);
            }
            Msg::LoadingError(e) => {
                self.state.set_error(e);
            }
        }
    }

    fn poll_player(&mut self, now: Instant) {
        let mut finished: Option<(String, u64)> = None;
        if let Some(handle) = self.player.as_mut() {
            if now.duration_since(self.last_player_poll) >= Duration::from_secs(1) {
                self.last_player_poll = now;
                let status = handle.poll();
                if !status.running {
                    finished = Some((handle.entry_id().to_string(), status.elapsed_secs));
                }
            }
        }
        if let Some((id, elapsed_secs)) = finished {
            self.player = None;
            upsert_watch_state(&mut self.state.user_data, &id, elapsed_secs, 0, now_secs());
            let profile = self.state.config.active_profile();
            save_user_data(&profile.name, &self.state.user_data);
        }
    }

    fn play_entry(&mut self, entry: &CatalogEntry) {
        let profile = self.state.config.active_profile();
        let url = build_entry_url(&profile, entry, self.dash.state.tab);
        match start_player(&self.state.config, &url, &entry.id) {
            Ok(handle) => {
                self.player = Some(handle);
                self.last_player_poll = Instant::now();
                upsert_watch_state(&mut self.state.user_data, &entry.id, 1, 0, now_secs());
                save_user_data(&profile.name, &self.state.user_data);
            }
            Err(e) => {
                self.state.set_error(format!("Failed to start player: {}", e));
            }
        }
    }

    fn toggle_entry_favorite(&mut self, id: &str) {
        toggle_favorite(&mut self.state.user_data, id, now_secs());
        let profile = self.state.config.active_profile();
        save_user_data(&profile.name, &self.state.user_data);
    }

    fn find_entry(&self, id: &str) -> Option<(Tab, CatalogEntry)> {
        for tab in Tab::ALL {
            if let Some(entry) = self
                .state
                .catalog(tab)
                .entries
                .iter()
                .find(|e| e.id == id)
            {
                return Some((tab, entry.clone()));
            }
        }
        None
    }

    fn render_menu_bar(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.heading("Rustream");
            ui.separator();
            if ui
                .selectable_label(self.view == View::Home, "Home")
                .clicked()
            {
                self.view = View::Home;
            }
            if ui
                .selectable_label(self.view == View::Browse, "Browse")
                .clicked()
            {
                self.view = View::Browse;
            }
            ui.separator();

            let profiles: Vec<String> = self
                .state
                .config
                .server_profiles
                .iter()
                .map(|p| p.name.clone())
                .collect();
            let mut selected = self.state.config.active_profile_index;
            egui::ComboBox::from_id_source("profile_selector")
                .selected_text(
                    profiles
                        .get(selected)
                        .cloned()
                        .unwrap_or_else(|| "Profile".to_string()),
                )
                .show_ui(ui, |ui| {
                    for (i, name) in profiles.iter().enumerate() {
                        ui.selectable_value(&mut selected, i, name);
                    }
                });
            if selected != self.state.config.active_profile_index {
                self.switch_profile(selected);
            }

            if ui.button("⚙ Settings").clicked() {
                self.settings_draft = Some(self.state.config.clone());
                self.show_settings = true;
            }

            if self.state.any_loading() {
                ui.spinner();
            }
            if self.player.is_some() {
                ui.colored_label(Color32::from_rgb(230, 150, 60), "▶ playing");
            }

            if let Some(err) = self.state.error_message.clone() {
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.small_button("✕").clicked() {
                        self.state.clear_error();
                    }
                    ui.colored_label(Color32::LIGHT_RED, err);
                });
            }
        });
    }

    fn render_splash(&mut self, ui: &mut egui::Ui) {
        ui.vertical_centered(|ui| {
            ui.add_space(ui.available_height() * 0.4);
            ui.label(RichText::new("Loading...").size(18.0));
            let total = Tab::ALL.len() as f32;
            let progress = (total - self.splash_pending as f32) / total;
            ui.add(egui::ProgressBar::new(progress).desired_width(280.0));
            ui.spinner();
        });
    }

    fn render_home(&mut self, ui: &mut egui::Ui) {
        ui.add_space(8.0);
        ui.heading("Keep watching");
        let rail = keep_watching(&self.state.user_data);
        if rail.is_empty() {
            ui.label("Nothing in progress.");
        } else {
            self.render_watching_table(ui, &rail);
        }

        ui.add_space(16.0);
        ui.heading("Trending this week");
        if self.state.trending.is_empty() {
            if self.state.config.tmdb_api_key.trim().is_empty() {
                ui.label("Add a TMDB API key in settings to see trending titles.");
            } else {
                ui.label("No trending data.");
            }
        } else {
            let rows: Vec<models::TrendingEntry> = self
                .state
                .trending
                .iter()
                .take(TRENDING_ROWS)
                .cloned()
                .collect();
            for entry in &rows {
                ui.horizontal(|ui| {
                    let kind = if entry.media_type == "movie" { "Movie" } else { "Series" };
                    let year = entry
                        .release_date
                        .as_deref()
                        .and_then(|d| d.get(..4))
                        .unwrap_or("");
                    ui.label(RichText::new(&entry.title).strong());
                    ui.label(format!("{} {}", kind, year));
                    if let Some(rating) = entry.vote_average {
                        ui.weak(format!("{:.1}/10", rating));
                    }
                    if ui.small_button("Details").clicked() {
                        trending::open_details(entry);
                    }
                });
            }
        }
    }

    fn render_watching_table(&mut self, ui: &mut egui::Ui, rail: &[UserEntry]) {
        let mut resume: Option<String> = None;
        TableBuilder::new(ui)
            .striped(true)
            .column(egui_extras::Column::initial(400.0).at_least(240.0))
            .column(egui_extras::Column::initial(160.0))
            .column(egui_extras::Column::initial(120.0))
            .column(egui_extras::Column::remainder())
            .header(20.0, |mut header| {
                header.col(|ui| {
                    ui.strong("Name");
                });
                header.col(|ui| {
                    ui.strong("Progress");
                });
                header.col(|ui| {
                    ui.strong("Watched");
                });
                header.col(|_ui| {});
            })
            .body(|mut body| {
                for user_entry in rail {
                    let found = self.find_entry(&user_entry.id);
                    body.row(24.0, |mut row| {
                        row.col(|ui| {
                            let name = found
                                .as_ref()
                                .map(|(_, e)| e.name.clone())
                                .unwrap_or_else(|| format!("#{}", user_entry.id));
                            ui.label(name);
                        });
                        row.col(|ui| {
                            let fraction = watch_fraction(
                                user_entry.current_secs,
                                user_entry.duration_secs,
                            );
                            if user_entry.duration_secs > 0 {
                                ui.add(egui::ProgressBar::new(fraction).desired_width(140.0));
                            } else {
                                ui.weak("—");
                            }
                        });
                        row.col(|ui| {
                            ui.label(format_duration(user_entry.current_secs));
                        });
                        row.col(|ui| {
                            if found.is_some() && ui.small_button("▶ Resume").clicked() {
                                resume = Some(user_entry.id.clone());
                            }
                        });
                    });
                }
            });
        if let Some(id) = resume {
            if let Some((tab, entry)) = self.find_entry(&id) {
                let cat = self.state.catalog(tab);
                self.dash.apply(cat, BrowseEvent::TabSwitched(tab));
                self.play_entry(&entry);
            }
        }
    }

    fn render_browse(&mut self, ui: &mut egui::Ui) {
        let mut events: Vec<BrowseEvent> = Vec::new();

        // Viewport tracking: the paginator is sized from the available width.
        let width = ui.available_width();
        if (width - self.last_width).abs() > 1.0 {
            self.last_width = width;
            events.push(BrowseEvent::ViewportResized(width));
        }

        ui.add_space(4.0);
        ui.horizontal(|ui| {
            for tab in Tab::ALL {
                if ui
                    .selectable_label(self.dash.state.tab == tab, tab.label())
                    .clicked()
                    && self.dash.state.tab != tab
                {
                    events.push(BrowseEvent::TabSwitched(tab));
                }
            }
            ui.separator();

            let categories: Vec<(String, String)> = self
                .state
                .categories(self.dash.state.tab)
                .iter()
                .map(|c| (c.id.clone(), c.name.clone()))
                .collect();
            let selected_name = if self.dash.state.category == ALL_CATEGORIES {
                "All".to_string()
            } else {
                categories
                    .iter()
                    .find(|(id, _)| *id == self.dash.state.category)
                    .map(|(_, name)| name.clone())
                    .unwrap_or_else(|| "All".to_string())
            };
            egui::ComboBox::from_id_source("category_selector")
                .selected_text(selected_name)
                .show_ui(ui, |ui| {
                    if ui
                        .selectable_label(self.dash.state.category == ALL_CATEGORIES, "All")
                        .clicked()
                    {
                        events.push(BrowseEvent::CategoryChanged(ALL_CATEGORIES.to_string()));
                    }
                    for (id, name) in &categories {
                        if ui
                            .selectable_label(self.dash.state.category == *id, name)
                            .clicked()
                        {
                            events.push(BrowseEvent::CategoryChanged(id.clone()));
                        }
                    }
                });

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                let mut text = self.dash.state.search_input.clone();
                if !text.is_empty() && ui.small_button("✕").clicked() {
                    self.dash.edit_search(String::new(), Instant::now());
                }
                let response = ui.add(
                    egui::TextEdit::singleline(&mut text)
                        .hint_text("search")
                        .desired_width(180.0),
                );
                if response.changed() {
                    self.dash.edit_search(text, Instant::now());
                }
            });
        });
        ui.add_space(6.0);

        for event in events.drain(..) {
            // a tab switch recomputes against the target tab's catalog
            let tab = match &event {
                BrowseEvent::TabSwitched(tab) => *tab,
                _ => self.dash.state.tab,
            };
            let cat = self.state.catalog(tab);
            self.dash.apply(cat, event);
        }

        let catalog = self.state.catalog(self.dash.state.tab);
        let visible: Vec<CatalogEntry> = self
            .dash
            .view()
            .items
            .iter()
            .filter_map(|&i| catalog.entries.get(i).cloned())
            .collect();

        if visible.is_empty() {
            if self.dash.no_results() {
                ui.label("No results found");
            } else if self.state.is_loading(self.dash.state.tab) {
                ui.spinner();
            } else if catalog.entries.is_empty() {
                ui.label("Playlist is empty. Check the server profile in settings.");
            }
            return;
        }

        self.render_entry_grid(ui, &visible);
        self.render_pagination(ui);
    }

    fn render_entry_grid(&mut self, ui: &mut egui::Ui, visible: &[CatalogEntry]) {
        let columns = ((ui.available_width() / ITEM_WIDTH).floor() as usize).max(1);
        let tx = self.state.sender();
        egui::ScrollArea::vertical()
            .auto_shrink([false, true])
            .show(ui, |ui| {
                for chunk in visible.chunks(columns) {
                    ui.horizontal_top(|ui| {
                        for entry in chunk {
                            self.render_entry_card(ui, entry, &tx);
                        }
                    });
                }
            });
    }

    fn render_entry_card(
        &mut self,
        ui: &mut egui::Ui,
        entry: &CatalogEntry,
        tx: &std::sync::mpsc::Sender<Msg>,
    ) {
        ui.allocate_ui(egui::vec2(ITEM_WIDTH - 8.0, COVER_SIZE.y + 56.0), |ui| {
            ui.vertical(|ui| {
                if let Some(cover) = entry.cover.clone() {
                    self.state.images.request(&cover, tx.clone());
                    if let Some(tex) = self.state.images.texture(&cover) {
                        ui.add(egui::Image::new(tex).fit_to_exact_size(COVER_SIZE));
                    } else {
                        let (rect, _) =
                            ui.allocate_exact_size(COVER_SIZE, egui::Sense::hover());
                        ui.painter().rect_filled(rect, 4.0, Color32::from_gray(40));
                    }
                } else {
                    let (rect, _) = ui.allocate_exact_size(COVER_SIZE, egui::Sense::hover());
                    ui.painter().rect_filled(rect, 4.0, Color32::from_gray(40));
                }
                let mut name = entry.name.clone();
                if name.chars().count() > 18 {
                    name = name.chars().take(17).collect::<String>() + "…";
                }
                let mut hover = entry.name.clone();
                if let Some(date) = entry.added.as_deref().and_then(helpers::format_added) {
                    hover.push_str(&format!("\nadded {}", date));
                }
                ui.label(name).on_hover_text(hover);
                ui.horizontal(|ui| {
                    if ui.small_button("▶").clicked() {
                        self.play_entry(entry);
                    }
                    let fav = is_favorite(&self.state.user_data, &entry.id);
                    let star = if fav { "★" } else { "☆" };
                    if ui.small_button(star).clicked() {
                        self.toggle_entry_favorite(&entry.id);
                    }
                    if let Some(rating) = entry.rating_5based {
                        ui.weak(format!("{:.1}", rating));
                    }
                });
            });
        });
    }

    fn render_pagination(&mut self, ui: &mut egui::Ui) {
        let view = self.dash.view().clone();
        if view.pages <= 1 {
            return;
        }
        let mut goto: Option<usize> = None;
        ui.add_space(6.0);
        ui.horizontal(|ui| {
            if view.page > 1 && ui.small_button("◀").clicked() {
                goto = Some(view.page - 1);
            }
            if view.page > 2 {
                if ui.small_button("1").clicked() {
                    goto = Some(1);
                }
                if view.page > 3 {
                    ui.weak("…");
                }
            }
            let from = view.page.saturating_sub(1).max(1);
            let to = (view.page + 1).min(view.pages);
            for p in from..=to {
                if ui
                    .selectable_label(p == view.page, p.to_string())
                    .clicked()
                    && p != view.page
                {
                    goto = Some(p);
                }
            }
            if view.page + 1 < view.pages {
                if view.page + 2 < view.pages {
                    ui.weak("…");
                }
                if ui.small_button(view.pages.to_string()).clicked() {
                    goto = Some(view.pages);
                }
            }
            if view.has_more && ui.small_button("▶").clicked() {
                goto = Some(view.page + 1);
            }
        });
        if let Some(page) = goto {
            let cat = self.state.catalog(self.dash.state.tab);
            self.dash.apply(cat, BrowseEvent::PageChanged(page));
        }
    }

    fn render_settings(&mut self, ctx: &egui::Context) {
        let mut draft = match self.settings_draft.take() {
            Some(d) => d,
            None => self.state.config.clone(),
        };
        let mut open = true;
        let mut saved = false;
        egui::Window::new("⚙ Settings")
            .open(&mut open)
            .collapsible(false)
            .show(ctx, |ui| {
                let index = draft.active_profile_index.min(
                    draft.server_profiles.len().saturating_sub(1),
                );
                draft.active_profile_index = index;
                if let Some(profile) = draft.server_profiles.get_mut(index) {
                    ui.heading("Server profile");
                    egui::Grid::new("profile_grid").num_columns(2).show(ui, |ui| {
                        ui.label("Name");
                        ui.text_edit_singleline(&mut profile.name);
                        ui.end_row();
                        ui.label("Address");
                        ui.text_edit_singleline(&mut profile.address);
                        ui.end_row();
                        ui.label("Username");
                        ui.text_edit_singleline(&mut profile.username);
                        ui.end_row();
                        ui.label("Password");
                        ui.add(egui::TextEdit::singleline(&mut profile.password).password(true));
                        ui.end_row();
                    });
                }
                if ui.small_button("+ Add profile").clicked() {
                    draft.server_profiles.push(models::ServerProfile {
                        name: format!("Profile {}", draft.server_profiles.len() + 1),
                        ..Default::default()
                    });
                    draft.active_profile_index = draft.server_profiles.len() - 1;
                }

                ui.separator();
                egui::Grid::new("settings_grid").num_columns(2).show(ui, |ui| {
                    ui.label("Player command");
                    ui.text_edit_singleline(&mut draft.player_command);
                    ui.end_row();
                    ui.label("TMDB API key");
                    ui.text_edit_singleline(&mut draft.tmdb_api_key);
                    ui.end_row();
                    ui.label("Theme");
                    egui::ComboBox::from_id_source("theme_selector")
                        .selected_text(if draft.theme == "light" { "Light" } else { "Dark" })
                        .show_ui(ui, |ui| {
                            ui.selectable_value(&mut draft.theme, "dark".to_string(), "Dark");
                            ui.selectable_value(&mut draft.theme, "light".to_string(), "Light");
                        });
                    ui.end_row();
                });

                ui.separator();
                ui.horizontal(|ui| {
                    if ui.button("💾 Save").clicked() {
                        saved = true;
                    }
                    if ui.button("Cancel").clicked() {
                        self.show_settings = false;
                    }
                });
            });

        if saved {
            if let Err(e) = save_config(&draft) {
                log_error("failed to save config", &e);
                self.state.set_error(format!("Failed to save config: {}", e));
            }
            self.state.config = draft;
            apply_theme(ctx, &self.state.config);
            self.show_settings = false;
            self.settings_draft = None;
            self.state.user_data =
                load_user_data(&self.state.config.active_profile().name);
            for tab in Tab::ALL {
                self.spawn_playlist_refresh(tab);
            }
            self.spawn_trending_refresh();
        } else if !open || !self.show_settings {
            self.show_settings = false;
            self.settings_draft = None;
        } else {
            self.settings_draft = Some(draft);
        }
    }
}

impl eframe::App for RustreamApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let now = Instant::now();

        for msg in self.state.process_messages() {
            self.handle_message(ctx, msg);
        }

        let cat = self.state.catalog(self.dash.state.tab);
        self.dash.tick(cat, now);

        self.poll_player(now);

        if self.view != View::Splash {
            egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
                self.render_menu_bar(ui);
            });
        }
        egui::CentralPanel::default().show(ctx, |ui| match self.view {
            View::Splash => self.render_splash(ui),
            View::Home => self.render_home(ui),
            View::Browse => self.render_browse(ui),
        });

        if self.show_settings {
            self.render_settings(ctx);
        }

        if self.dash.search_pending() {
            ctx.request_repaint_after(Duration::from_millis(50));
        } else if self.player.is_some() || self.state.any_loading() {
            ctx.request_repaint_after(Duration::from_millis(250));
        }
    }
}
