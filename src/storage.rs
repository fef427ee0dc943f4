//! Local file layout for downloaded announcements

use chrono::NaiveDateTime;
use std::path::{Path, PathBuf};

/// Characters that are not allowed in file names on common platforms
const FORBIDDEN_CHARS: &[char] = &['\\', '/', '*', '?', ':', '"', '<', '>', '|'];

/// Remove characters that cannot appear in a file name
pub fn clean_filename(title: &str) -> String {
    title.chars().filter(|c| !FORBIDDEN_CHARS.contains(c)).collect()
}

/// Destination of an announcement's PDF inside `target_dir`
pub fn announcement_path(target_dir: &Path, title: &str) -> PathBuf {
    let mut name = clean_filename(title);
    if name.trim().is_empty() {
        name = "untitled".to_string();
    }
    target_dir.join(format!("{}.pdf", name))
}

/// `<security code>_<YYYYmmdd_HHMMSS>`
pub fn default_folder_name(security_code: &str, now: NaiveDateTime) -> String {
    format!("{}_{}", security_code, now.format("%Y%m%d_%H%M%S"))
}

/// Output directory for a run: `download_root/<output>` when a folder name is
/// given, otherwise a timestamped folder named after the security code.
pub fn resolve_target_dir(
    download_root: &Path,
    output: Option<&str>,
    security_code: &str,
    now: NaiveDateTime,
) -> PathBuf {
    match output {
        Some(folder) if !folder.trim().is_empty() => download_root.join(folder),
        _ => download_root.join(default_folder_name(security_code, now)),
    }
}

/// Absolute form of `path` for display, falling back to the path as given
pub fn display_path(path: &Path) -> String {
    if path.is_absolute() {
        return path.display().to_string();
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(path))
        .unwrap_or_else(|_| path.to_path_buf())
        .display()
        .to_string()
}
