use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::models::DrawRecord;

/// Environment variable overriding the archive location.
pub const ARCHIVE_ENV: &str = "CASH5_ARCHIVE";

/// `$HOME/.config/cash5/draws.json`
pub fn default_archive_path() -> Result<PathBuf> {
    let home = std::env::var_os("HOME").context("HOME is not set")?;
    let mut path = PathBuf::from(home);
    path.push(".config");
    path.push("cash5");
    path.push("draws.json");
    Ok(path)
}

/// Resolves the archive location: explicit path, then `CASH5_ARCHIVE`, then the default.
pub fn archive_path(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }
    match std::env::var_os(ARCHIVE_ENV) {
        Some(p) if !p.is_empty() => Ok(PathBuf::from(p)),
        _ => default_archive_path(),
    }
}

/// Loads the archive, deduplicated and sorted by draw time.
///
/// A missing file is an empty archive. Any other read or parse failure is an error.
pub fn load_archive(path: &Path) -> Result<Vec<DrawRecord>> {
    let json = match std::fs::read_to_string(path) {
        Ok(json) => json,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e).with_context(|| format!("Cannot read archive {:?}", path)),
    };
    if json.trim().is_empty() {
        return Ok(Vec::new());
    }
    let draws: Vec<DrawRecord> = serde_json::from_str(&json)
        .with_context(|| format!("Cannot parse archive {:?}", path))?;
    let loaded = draws.len();
    let draws = merge_draws(&[], &draws);
    if draws.len() < loaded {
        log::debug!("Dropped {} duplicate records while loading", loaded - draws.len());
    }
    Ok(draws)
}

/// Merges `incoming` into `existing` by id.
///
/// On conflict the incoming copy wins; later entries within `incoming` win
/// over earlier ones. The result is sorted ascending by draw time, ties broken by id.
pub fn merge_draws(existing: &[DrawRecord], incoming: &[DrawRecord]) -> Vec<DrawRecord> {
    let mut by_id: HashMap<&str, &DrawRecord> =
        HashMap::with_capacity(existing.len() + incoming.len());
    for draw in existing.iter().chain(incoming) {
        by_id.insert(draw.id.as_str(), draw);
    }
    let mut merged: Vec<DrawRecord> = by_id.into_values().cloned().collect();
    sort_by_time(&mut merged);
    merged
}

pub fn sort_by_time(draws: &mut [DrawRecord]) {
    draws.sort_by(|a, b| a.draw_time.cmp(&b.draw_time).then_with(|| a.id.cmp(&b.id)));
}

/// Writes the whole archive through a temporary sibling file and a rename,
/// so a crash mid-write leaves the previous archive intact.
pub fn persist_archive(path: &Path, draws: &[DrawRecord]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Cannot create directory {:?}", parent))?;
        }
    }
    let mut json = serde_json::to_string_pretty(draws).context("Cannot serialize archive")?;
    json.push('\n');

    let tmp_path = path.with_extension("json.tmp");
    std::fs::write(&tmp_path, json)
        .with_context(|| format!("Cannot write {:?}", tmp_path))?;
    std::fs::rename(&tmp_path, path)
        .with_context(|| format!("Cannot replace archive {:?}", path))?;
    log::debug!("Persisted {} draws to {:?}", draws.len(), path);
    Ok(())
}

pub fn oldest_draw(draws: &[DrawRecord]) -> Option<&DrawRecord> {
    draws.iter().min_by_key(|d| d.draw_time)
}

pub fn newest_draw(draws: &[DrawRecord]) -> Option<&DrawRecord> {
    draws.iter().max_by_key(|d| d.draw_time)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::make_test_draw;

    #[test]
    fn test_load_missing_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let draws = load_archive(&dir.path().join("absent.json")).unwrap();
        assert!(draws.is_empty());
    }

    #[test]
    fn test_load_corrupt_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("draws.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(load_archive(&path).is_err());
    }

    #[test]
    fn test_merge_incoming_wins() {
        let first = vec![make_test_draw("A", 1_000, [1, 2, 3, 4, 5])];
        let second = vec![make_test_draw("A", 2_000, [6, 7, 8, 9, 10])];
        let merged = merge_draws(&first, &second);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].draw_time, 2_000);
        assert_eq!(merged[0].combo().unwrap().numbers(), &[6, 7, 8, 9, 10]);
    }

    #[test]
    fn test_merge_sorted_by_time() {
        let existing = vec![
            make_test_draw("C", 3_000, [1, 2, 3, 4, 5]),
            make_test_draw("A", 1_000, [1, 2, 3, 4, 6]),
        ];
        let incoming = vec![make_test_draw("B", 2_000, [1, 2, 3, 4, 7])];
        let merged = merge_draws(&existing, &incoming);
        let ids: Vec<&str> = merged.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_merge_idempotent() {
        let x = vec![
            make_test_draw("A", 1_000, [1, 2, 3, 4, 5]),
            make_test_draw("B", 2_000, [1, 2, 3, 4, 6]),
        ];
        let y = vec![
            make_test_draw("B", 2_500, [9, 10, 11, 12, 13]),
            make_test_draw("C", 3_000, [1, 2, 3, 4, 7]),
        ];
        let once = merge_draws(&x, &y);
        let twice = merge_draws(&once, &y);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_persist_then_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("draws.json");
        let draws = vec![
            make_test_draw("B", 2_000, [10, 20, 30, 40, 45]),
            make_test_draw("A", 1_000, [1, 2, 3, 4, 5]),
        ];
        persist_archive(&path, &draws).unwrap();
        assert!(!path.with_extension("json.tmp").exists());

        let loaded = load_archive(&path).unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0], draws[1]);
        assert_eq!(loaded[1], draws[0]);
    }

    #[test]
    fn test_persist_uses_two_space_indent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("draws.json");
        persist_archive(&path, &[make_test_draw("A", 1_000, [1, 2, 3, 4, 5])]).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("[\n  {\n    \"gameName\""));
    }

    #[test]
    fn test_persist_replaces_previous() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("draws.json");
        persist_archive(&path, &[make_test_draw("A", 1_000, [1, 2, 3, 4, 5])]).unwrap();
        persist_archive(&path, &[]).unwrap();
        assert!(load_archive(&path).unwrap().is_empty());
    }

    #[test]
    fn test_load_dedups_legacy_duplicates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("draws.json");
        let legacy = vec![
            make_test_draw("A", 1_000, [1, 2, 3, 4, 5]),
            make_test_draw("A", 1_000, [1, 2, 3, 4, 6]),
        ];
        std::fs::write(&path, serde_json::to_string(&legacy).unwrap()).unwrap();
        let loaded = load_archive(&path).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].combo().unwrap().numbers(), &[1, 2, 3, 4, 6]);
    }

    #[test]
    fn test_oldest_and_newest() {
        let draws = vec![
            make_test_draw("B", 2_000, [1, 2, 3, 4, 5]),
            make_test_draw("A", 1_000, [1, 2, 3, 4, 5]),
        ];
        assert_eq!(oldest_draw(&draws).unwrap().id, "A");
        assert_eq!(newest_draw(&draws).unwrap().id, "B");
        assert!(newest_draw(&[]).is_none());
    }
}
