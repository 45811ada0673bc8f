use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::logger::data_dir;
use crate::models::UserEntry;

fn user_data_file(profile_name: &str) -> PathBuf {
    let dir = data_dir().join("userdata");
    let _ = fs::create_dir_all(&dir);
    let safe: String = profile_name
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect();
    dir.join(format!("{}.json", safe))
}

pub fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

pub fn load_user_data(profile_name: &str) -> Vec<UserEntry> {
    let p = user_data_file(profile_name);
    fs::read_to_string(&p)
        .ok()
        .and_then(|s| serde_json::from_str::<Vec<UserEntry>>(&s).ok())
        .unwrap_or_default()
}

pub fn save_user_data(profile_name: &str, entries: &[UserEntry]) {
    let p = user_data_file(profile_name);
    let _ = fs::write(
        p,
        serde_json::to_string_pretty(entries).unwrap_or_else(|_| "[]".into()),
    );
}

/// Flip an entry's favorite flag, creating the record on first use.
/// Returns the new favorite state.
pub fn toggle_favorite(entries: &mut Vec<UserEntry>, id: &str, now: u64) -> bool {
    if let Some(entry) = entries.iter_mut().find(|e| e.id == id) {
        entry.favorite = !entry.favorite;
        entry.updated_at = now;
        entry.favorite
    } else {
        entries.push(UserEntry {
            id: id.to_string(),
            favorite: true,
            updated_at: now,
            ..Default::default()
        });
        true
    }
}

pub fn is_favorite(entries: &[UserEntry], id: &str) -> bool {
    entries.iter().any(|e| e.id == id && e.favorite)
}

/// Record a playback position. An entry within the final minute of its
/// duration is considered finished and leaves the keep-watching rail.
pub fn upsert_watch_state(
    entries: &mut Vec<UserEntry>,
    id: &str,
    current_secs: u64,
    duration_secs: u64,
    now: u64,
) {
    let finished = duration_secs > 0 && current_secs + 60 >= duration_secs;
    if let Some(entry) = entries.iter_mut().find(|e| e.id == id) {
        entry.current_secs = current_secs;
        entry.duration_secs = duration_secs;
        entry.watching = !finished && current_secs > 0;
        entry.updated_at = now;
    } else {
        entries.push(UserEntry {
            id: id.to_string(),
            current_secs,
            duration_secs,
            watching: !finished && current_secs > 0,
            updated_at: now,
            ..Default::default()
        });
    }
}

/// Entries still mid-watch, most recently touched first.
pub fn keep_watching(entries: &[UserEntry]) -> Vec<UserEntry> {
    let mut out: Vec<UserEntry> = entries.iter().filter(|e| e.watching).cloned().collect();
    out.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggle_creates_then_flips() {
        let mut entries = Vec::new();
        assert!(toggle_favorite(&mut entries, "42", 10));
        assert!(is_favorite(&entries, "42"));
        assert!(!toggle_favorite(&mut entries, "42", 11));
        assert!(!is_favorite(&entries, "42"));
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn watch_state_upsert_and_finish() {
        let mut entries = Vec::new();
        upsert_watch_state(&mut entries, "7", 300, 5400, 100);
        assert!(entries[0].watching);
        assert_eq!(entries[0].current_secs, 300);

        // within the last minute counts as finished
        upsert_watch_state(&mut entries, "7", 5380, 5400, 200);
        assert!(!entries[0].watching);
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn keep_watching_sorts_by_recency() {
        let mut entries = Vec::new();
        upsert_watch_state(&mut entries, "a", 10, 1000, 100);
        upsert_watch_state(&mut entries, "b", 10, 1000, 300);
        upsert_watch_state(&mut entries, "c", 10, 1000, 200);
        let rail = keep_watching(&entries);
        let ids: Vec<&str> = rail.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c", "a"]);
    }

    #[test]
    fn zero_position_is_not_watching() {
        let mut entries = Vec::new();
        upsert_watch_state(&mut entries, "x", 0, 1000, 100);
        assert!(!entries[0].watching);
        assert!(keep_watching(&entries).is_empty());
    }

    #[test]
    fn favorite_survives_watch_updates() {
        let mut entries = Vec::new();
        toggle_favorite(&mut entries, "9", 10);
        upsert_watch_state(&mut entries, "9", 120, 3600, 20);
        assert!(is_favorite(&entries, "9"));
        assert!(entries[0].watching);
    }
}
