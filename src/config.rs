use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use directories::ProjectDirs;

use crate::models::{Config, ServerProfile};

fn config_file_path() -> PathBuf {
    let dir = ProjectDirs::from("", "", "rustream")
        .map(|d| d.config_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."));
    dir.join("rustream_config.txt")
}

/// Parse the key=value config format. Unknown keys are ignored so older
/// builds can open newer config files.
pub fn parse_config(content: &str) -> Config {
    let mut cfg = Config::default();
    cfg.font_scale = 1.0;
    for line in content.lines() {
        if let Some((k, v)) = line.split_once('=') {
            match k.trim() {
                "player_command" => cfg.player_command = v.trim().to_string(),
                "tmdb_api_key" => cfg.tmdb_api_key = v.trim().to_string(),
                "theme" => cfg.theme = v.trim().to_string(),
                "font_scale" => cfg.font_scale = v.trim().parse::<f32>().unwrap_or(1.0),
                "active_profile_index" => {
                    cfg.active_profile_index = v.trim().parse::<usize>().unwrap_or(0)
                }
                "server_profile" => {
                    // Format: name|address|username|password
                    let parts: Vec<&str> = v.split('|').collect();
                    if parts.len() == 4 {
                        cfg.server_profiles.push(ServerProfile {
                            name: parts[0].to_string(),
                            address: parts[1].to_string(),
                            username: parts[2].to_string(),
                            password: parts[3].to_string(),
                        });
                    }
                }
                _ => {}
            }
        }
    }

    if cfg.server_profiles.is_empty() {
        cfg.server_profiles.push(ServerProfile {
            name: "Default".to_string(),
            ..Default::default()
        });
    }
    if cfg.active_profile_index >= cfg.server_profiles.len() {
        cfg.active_profile_index = 0;
    }
    cfg
}

pub fn render_config(cfg: &Config) -> String {
    let mut out = String::new();
    for profile in &cfg.server_profiles {
        out.push_str(&format!(
            "server_profile={}|{}|{}|{}\n",
            profile.name, profile.address, profile.username, profile.password
        ));
    }
    out.push_str(&format!(
        "active_profile_index={}\n",
        cfg.active_profile_index
    ));
    if !cfg.player_command.is_empty() {
        out.push_str(&format!("player_command={}\n", cfg.player_command));
    }
    if !cfg.tmdb_api_key.is_empty() {
        out.push_str(&format!("tmdb_api_key={}\n", cfg.tmdb_api_key));
    }
    if !cfg.theme.is_empty() {
        out.push_str(&format!("theme={}\n", cfg.theme));
    }
    if cfg.font_scale != 0.0 {
        out.push_str(&format!("font_scale={:.2}\n", cfg.font_scale));
    }
    out
}

pub fn read_config() -> Result<Config, io::Error> {
    // Fall back to a file next to the binary for portable setups
    let primary = config_file_path();
    let content = match fs::read_to_string(&primary) {
        Ok(s) => s,
        Err(_e) => fs::read_to_string("rustream_config.txt").unwrap_or_default(),
    };
    Ok(parse_config(&content))
}

pub fn save_config(cfg: &Config) -> Result<(), io::Error> {
    let path = config_file_path();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut f = fs::File::create(path)?;
    f.write_all(render_config(cfg).as_bytes())?;
    Ok(())
}
