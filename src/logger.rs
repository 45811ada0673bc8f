use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

use directories::ProjectDirs;

pub fn data_dir() -> PathBuf {
    ProjectDirs::from("", "", "rustream")
        .map(|d| d.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

pub fn log_path() -> PathBuf {
    let dir = data_dir();
    let _ = fs::create_dir_all(&dir);
    dir.join("rustream.log")
}

fn timestamp() -> String {
    chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

pub fn log_line(line: &str) {
    let path = log_path();
    if let Ok(mut f) = OpenOptions::new().create(true).append(true).open(path) {
        let _ = writeln!(f, "[{}] {}", timestamp(), line);
    }
}

pub fn log_error(prefix: &str, e: &dyn std::error::Error) {
    log_line(&format!("ERROR: {}: {}", prefix, e));
}

pub fn log_command(program: &str, args: &[String]) {
    let joined = args.join(" ");
    log_line(&format!("RUN: {} {}", program, joined));
}
