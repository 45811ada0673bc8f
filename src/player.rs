use std::io;
use std::process::{Child, Command};
use std::time::Instant;

use crate::logger::{log_command, log_error, log_line};
use crate::models::{CatalogEntry, Config, ServerProfile, Tab};

fn base_url(addr: &str) -> String {
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

pub fn build_vod_stream_url(profile: &ServerProfile, stream_id: &str, ext: &str) -> String {
    let ext = ext.trim_start_matches('.');
    format!(
        "{}/movie/{}/{}/{}.{}",
        base_url(&profile.address),
        profile.username,
        profile.password,
        stream_id,
        ext
    )
}

pub fn build_series_stream_url(profile: &ServerProfile, episode_id: &str, ext: &str) -> String {
    let ext = ext.trim_start_matches('.');
    format!(
        "{}/series/{}/{}/{}.{}",
        base_url(&profile.address),
        profile.username,
        profile.password,
        episode_id,
        ext
    )
}

pub fn build_entry_url(profile: &ServerProfile, entry: &CatalogEntry, tab: Tab) -> String {
    let ext = if entry.container_extension.is_empty() {
        "mp4"
    } else {
        entry.container_extension.as_str()
    };
    match tab {
        Tab::Movies => build_vod_stream_url(profile, &entry.id, ext),
        Tab::Series => build_series_stream_url(profile, &entry.id, ext),
    }
}

const DEFAULT_PLAYER_COMMAND: &str =
    "vlc --fullscreen --no-video-title-show --network-caching=2000 {URL}";

/// Split the configured command line and substitute the URL placeholder,
/// appending the URL when no placeholder is present.
fn build_command(command: &str, stream_url: &str) -> Option<(String, Vec<String>)> {
    let mut parts: Vec<String> = command.split_whitespace().map(|s| s.to_string()).collect();
    let mut replaced = false;
    for p in &mut parts {
        if p == "URL" || p == "{URL}" || p == "{url}" {
            *p = stream_url.to_string();
            replaced = true;
        }
    }
    if !replaced {
        parts.push(stream_url.to_string());
    }
    if parts.is_empty() {
        return None;
    }
    let program = parts.remove(0);
    Some((program, parts))
}

/// A spawned external player session, polled once a second by the UI.
pub struct PlayerHandle {
    child: Child,
    started: Instant,
    entry_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerStatus {
    pub running: bool,
    pub elapsed_secs: u64,
}

impl PlayerHandle {
    pub fn entry_id(&self) -> &str {
        &self.entry_id
    }

    /// Non-blocking check of the child process. Elapsed time keeps counting
    /// while the player runs and freezes at exit.
    pub fn poll(&mut self) -> PlayerStatus {
        let elapsed_secs = self.started.elapsed().as_secs();
        match self.child.try_wait() {
            Ok(Some(status)) => {
                log_line(&format!(
                    "Player exited with {} after {}s",
                    status, elapsed_secs
                ));
                PlayerStatus { running: false, elapsed_secs }
            }
            Ok(None) => PlayerStatus { running: true, elapsed_secs },
            Err(e) => {
                log_error("Failed to poll player process", &e);
                PlayerStatus { running: false, elapsed_secs }
            }
        }
    }
}

pub fn start_player(cfg: &Config, stream_url: &str, entry_id: &str) -> io::Result<PlayerHandle> {
    let cmd = if cfg.player_command.trim().is_empty() {
        DEFAULT_PLAYER_COMMAND
    } else {
        &cfg.player_command
    };
    let (program, args) = build_command(cmd, stream_url)
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "empty player command"))?;

    log_command(&program, &args);
    match Command::new(&program).args(&args).spawn() {
        Ok(child) => {
            log_line(&format!("Spawned player pid={} program={}", child.id(), program));
            Ok(PlayerHandle {
                child,
                started: Instant::now(),
                entry_id: entry_id.to_string(),
            })
        }
        Err(e) => {
            log_error("Failed to spawn player", &e);
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> ServerProfile {
        ServerProfile {
            name: "main".into(),
            address: "host:8080".into(),
            username: "user".into(),
            password: "pass".into(),
        }
    }

    #[test]
    fn vod_url_shape() {
        assert_eq!(
            build_vod_stream_url(&profile(), "42", ".mkv"),
            "http://host:8080/movie/user/pass/42.mkv"
        );
    }

    #[test]
    fn series_url_shape() {
        assert_eq!(
            build_series_stream_url(&profile(), "7", "mp4"),
            "http://host:8080/series/user/pass/7.mp4"
        );
    }

    #[test]
    fn entry_url_defaults_extension() {
        let entry = CatalogEntry { id: "5".into(), name: "X".into(), ..Default::default() };
        assert_eq!(
            build_entry_url(&profile(), &entry, Tab::Movies),
            "http://host:8080/movie/user/pass/5.mp4"
        );
    }

    #[test]
    fn command_substitutes_placeholder() {
        let (program, args) = build_command("vlc --fullscreen {URL}", "http://s/1.m3u8").unwrap();
        assert_eq!(program, "vlc");
        assert_eq!(args, vec!["--fullscreen", "http://s/1.m3u8"]);
    }

    #[test]
    fn command_appends_url_without_placeholder() {
        let (program, args) = build_command("mpv --no-border", "http://s/1.m3u8").unwrap();
        assert_eq!(program, "mpv");
        assert_eq!(args, vec!["--no-border", "http://s/1.m3u8"]);
    }

    #[test]
    fn whitespace_command_degenerates_to_url() {
        let (program, args) = build_command("   ", "http://s/1.m3u8").unwrap();
        assert_eq!(program, "http://s/1.m3u8");
        assert!(args.is_empty());
    }
}
