use std::collections::{HashMap, HashSet};
use std::sync::mpsc::Sender;

use eframe::egui;

use crate::api::HTTP;
use crate::app_state::Msg;
use crate::cache::cover_cache_path;
use crate::logger::log_line;

/// Cover art loader: background fetch, disk cache by URL hash, one texture
/// upload per URL. Failed URLs are remembered so the grid does not refetch
/// them every frame.
#[derive(Default)]
pub struct ImageManager {
    textures: HashMap<String, egui::TextureHandle>,
    pending: HashSet<String>,
    failed: HashSet<String>,
}

impl ImageManager {
    pub fn texture(&self, url: &str) -> Option<&egui::TextureHandle> {
        self.textures.get(url)
    }

    /// Kick off a fetch for a cover unless it is already loaded, in flight,
    /// or known bad. The disk cache is served through the same message path
    /// as the network so decoding stays on the UI thread.
    pub fn request(&mut self, url: &str, tx: Sender<Msg>) {
        if url.is_empty()
            || self.textures.contains_key(url)
            || self.pending.contains(url)
            || self.failed.contains(url)
        {
            return;
        }
        self.pending.insert(url.to_string());

        let path = cover_cache_path(url);
        if let Ok(bytes) = std::fs::read(&path) {
            let _ = tx.send(Msg::CoverLoaded { url: url.to_string(), bytes });
            return;
        }

        let url_owned = url.to_string();
        tokio::spawn(async move {
            let fetched = async {
                let res = HTTP.get(&url_owned).send().await?;
                res.bytes().await
            }
            .await;
            match fetched {
                Ok(bytes) => {
                    let _ = std::fs::write(cover_cache_path(&url_owned), &bytes);
                    let _ = tx.send(Msg::CoverLoaded {
                        url: url_owned,
                        bytes: bytes.to_vec(),
                    });
                }
                Err(e) => {
                    log_line(&format!("cover fetch failed for {}: {}", url_owned, e));
                    let _ = tx.send(Msg::CoverFailed { url: url_owned });
                }
            }
        });
    }

    pub fn insert_bytes(&mut self, ctx: &egui::Context, url: &str, bytes: &[u8]) {
        self.pending.remove(url);
        match image::load_from_memory(bytes) {
            Ok(img) => {
                let rgba = img.to_rgba8();
                let size = [rgba.width() as usize, rgba.height() as usize];
                let color = egui::ColorImage::from_rgba_unmultiplied(
                    size,
                    rgba.as_flat_samples().as_slice(),
                );
                let handle = ctx.load_texture(url, color, egui::TextureOptions::LINEAR);
                self.textures.insert(url.to_string(), handle);
            }
            Err(e) => {
                log_line(&format!("cover decode failed for {}: {}", url, e));
                self.failed.insert(url.to_string());
            }
        }
    }

    pub fn mark_failed(&mut self, url: &str) {
        self.pending.remove(url);
        self.failed.insert(url.to_string());
    }

    pub fn clear(&mut self) {
        self.textures.clear();
        self.pending.clear();
        self.failed.clear();
    }
}
