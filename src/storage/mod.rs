use std::fs;
use std::fs::OpenOptions;
use std::io::Write as _;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use thiserror::Error;
use time::OffsetDateTime;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("invalid filename: {0}")]
    InvalidFilename(String),
    #[error("note '{0}' not found")]
    NotFound(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, StorageError>;

/// Metadata snapshot of one note file, taken at listing time. Becomes stale
/// the moment the underlying file changes; callers re-list before redisplay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteRecord {
    pub name: String,
    pub modified_at: OffsetDateTime,
    pub size_bytes: u64,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, Default,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "lowercase")]
pub enum SortMode {
    #[default]
    Name,
    Date,
    Size,
}

impl SortMode {
    pub fn next(self) -> Self {
        match self {
            SortMode::Name => SortMode::Date,
            SortMode::Date => SortMode::Size,
            SortMode::Size => SortMode::Name,
        }
    }
}

/// Sorts in place: name ascending, date newest-first, size largest-first.
/// Ties fall back to the name so every mode yields a total order.
pub fn sort_records(records: &mut [NoteRecord], mode: SortMode) {
    match mode {
        SortMode::Name => records.sort_by(|a, b| a.name.cmp(&b.name)),
        SortMode::Date => records.sort_by(|a, b| {
            b.modified_at
                .cmp(&a.modified_at)
                .then_with(|| a.name.cmp(&b.name))
        }),
        SortMode::Size => records.sort_by(|a, b| {
            b.size_bytes
                .cmp(&a.size_bytes)
                .then_with(|| a.name.cmp(&b.name))
        }),
    }
}

/// Rejects empty names, path separators, `..` sequences, and leading dots.
pub fn validate_filename(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(StorageError::InvalidFilename(
            "filename cannot be empty".into(),
        ));
    }
    if name.contains('/') || name.contains('\\') {
        return Err(StorageError::InvalidFilename(
            "filename cannot contain path separators (/ or \\)".into(),
        ));
    }
    if name.contains("..") {
        return Err(StorageError::InvalidFilename(
            "filename cannot contain '..'".into(),
        ));
    }
    if name.starts_with('.') {
        return Err(StorageError::InvalidFilename(
            "filename cannot start with '.' (hidden files not allowed)".into(),
        ));
    }
    Ok(())
}

/// Attempts to repair a rejected filename. Returns `None` when nothing
/// sensible remains; a returned suggestion always passes `validate_filename`.
pub fn suggest_filename(name: &str) -> Option<String> {
    // Strip traversal segments before touching separators so "../x" becomes
    // "x" rather than "-x".
    let mut fixed = name.to_string();
    for segment in ["../", "..\\"] {
        while fixed.contains(segment) {
            fixed = fixed.replace(segment, "");
        }
    }
    while fixed.contains("..") {
        fixed = fixed.replace("..", "");
    }
    fixed = fixed.replace(['/', '\\'], "-");
    let fixed = fixed.trim_start_matches('.').to_string();

    if fixed == name || validate_filename(&fixed).is_err() {
        return None;
    }
    Some(fixed)
}

/// Handle to the notes directory. Every operation re-validates the filename
/// before touching the filesystem, so no partial write can land under an
/// invalid name.
#[derive(Debug, Clone)]
pub struct NotesDir {
    root: PathBuf,
}

impl NotesDir {
    /// Opens the notes directory, creating it when missing.
    pub fn open(root: PathBuf) -> Result<Self> {
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn note_path(&self, name: &str) -> Result<PathBuf> {
        validate_filename(name)?;
        Ok(self.root.join(name))
    }

    pub fn exists(&self, name: &str) -> Result<bool> {
        Ok(self.note_path(name)?.exists())
    }

    /// Lists every regular file in the directory; subdirectories are skipped.
    pub fn list_entries(&self) -> Result<Vec<NoteRecord>> {
        let mut records = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            let metadata = entry.metadata()?;
            if !metadata.is_file() {
                continue;
            }
            let name = match entry.file_name().into_string() {
                Ok(name) => name,
                Err(raw) => {
                    tracing::warn!(?raw, "skipping note with non-UTF-8 name");
                    continue;
                }
            };
            let modified_at = metadata
                .modified()
                .map(OffsetDateTime::from)
                .unwrap_or(OffsetDateTime::UNIX_EPOCH);
            records.push(NoteRecord {
                name,
                modified_at,
                size_bytes: metadata.len(),
            });
        }
        Ok(records)
    }

    pub fn read_note(&self, name: &str) -> Result<String> {
        let path = self.note_path(name)?;
        fs::read_to_string(&path).map_err(|err| map_not_found(err, name))
    }

    pub fn write_note(&self, name: &str, content: &str) -> Result<()> {
        let path = self.note_path(name)?;
        fs::write(&path, content)?;
        Ok(())
    }

    /// Appends to a note, creating it when missing. A separating newline is
    /// inserted only when the existing file is non-empty and does not already
    /// end with one; a freshly created file receives exactly `content`.
    pub fn append_note(&self, name: &str, content: &str) -> Result<()> {
        let path = self.note_path(name)?;
        let needs_newline = match fs::read(&path) {
            Ok(existing) => !existing.is_empty() && existing.last() != Some(&b'\n'),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => false,
            Err(err) => return Err(err.into()),
        };
        let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
        if needs_newline {
            file.write_all(b"\n")?;
        }
        file.write_all(content.as_bytes())?;
        Ok(())
    }

    pub fn delete_note(&self, name: &str) -> Result<()> {
        let path = self.note_path(name)?;
        fs::remove_file(&path).map_err(|err| map_not_found(err, name))
    }

    pub fn rename_note(&self, old_name: &str, new_name: &str) -> Result<()> {
        let old_path = self.note_path(old_name)?;
        let new_path = self.note_path(new_name)?;
        fs::rename(&old_path, &new_path).map_err(|err| map_not_found(err, old_name))
    }
}

fn map_not_found(err: std::io::Error, name: &str) -> StorageError {
    if err.kind() == std::io::ErrorKind::NotFound {
        StorageError::NotFound(name.to_string())
    } else {
        StorageError::Io(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use tempfile::TempDir;

    fn open_dir(temp: &TempDir) -> NotesDir {
        NotesDir::open(temp.path().join("notes")).expect("open notes dir")
    }

    #[test]
    fn validate_rejects_unsafe_names() {
        assert_matches!(validate_filename(""), Err(StorageError::InvalidFilename(_)));
        assert_matches!(
            validate_filename("a/b"),
            Err(StorageError::InvalidFilename(_))
        );
        assert_matches!(
            validate_filename("a\\b"),
            Err(StorageError::InvalidFilename(_))
        );
        assert_matches!(
            validate_filename("a..b"),
            Err(StorageError::InvalidFilename(_))
        );
        assert_matches!(
            validate_filename(".hidden"),
            Err(StorageError::InvalidFilename(_))
        );
        assert!(validate_filename("notes.txt").is_ok());
        assert!(validate_filename("meeting-2024.md").is_ok());
    }

    #[test]
    fn suggestion_strips_traversal_segment() {
        assert_eq!(suggest_filename("../evil").as_deref(), Some("evil"));
    }

    #[test]
    fn suggestion_is_always_valid_or_absent() {
        let rejected = [
            "", "/", "\\", "..", "../", "..\\", "...", "....", ".", ".a", "..a", "a/b", "a\\b",
            "a..b", "../../x", ".../y", "./",
        ];
        for name in rejected {
            if let Some(fixed) = suggest_filename(name) {
                assert!(
                    validate_filename(&fixed).is_ok(),
                    "suggestion {fixed:?} for {name:?} must pass validation"
                );
            }
        }
    }

    #[test]
    fn suggestion_absent_for_already_valid_names() {
        assert_eq!(suggest_filename("notes.txt"), None);
    }

    #[test]
    fn sort_scenario_orders_by_each_mode() {
        let older = OffsetDateTime::UNIX_EPOCH;
        let newer = older + time::Duration::hours(1);
        let mut records = vec![
            NoteRecord {
                name: "a.txt".into(),
                modified_at: older,
                size_bytes: 100,
            },
            NoteRecord {
                name: "b.txt".into(),
                modified_at: newer,
                size_bytes: 50,
            },
        ];

        sort_records(&mut records, SortMode::Name);
        assert_eq!(records[0].name, "a.txt");

        sort_records(&mut records, SortMode::Date);
        assert_eq!(records[0].name, "b.txt");

        sort_records(&mut records, SortMode::Size);
        assert_eq!(records[0].name, "a.txt");
    }

    #[test]
    fn sorting_sorted_input_is_stable() {
        let base = OffsetDateTime::UNIX_EPOCH;
        let mut records: Vec<NoteRecord> = (0..5)
            .map(|i| NoteRecord {
                name: format!("note-{i}.txt"),
                modified_at: base + time::Duration::minutes(i),
                size_bytes: 10 * i as u64,
            })
            .collect();
        for mode in [SortMode::Name, SortMode::Date, SortMode::Size] {
            sort_records(&mut records, mode);
            let once = records.clone();
            sort_records(&mut records, mode);
            assert_eq!(records, once);
        }
    }

    #[test]
    fn sort_mode_cycles_back_after_three_steps() {
        let mode = SortMode::Name;
        assert_eq!(mode.next(), SortMode::Date);
        assert_eq!(mode.next().next(), SortMode::Size);
        assert_eq!(mode.next().next().next(), SortMode::Name);
    }

    #[test]
    fn list_skips_subdirectories() -> Result<()> {
        let temp = TempDir::new().expect("temp dir");
        let dir = open_dir(&temp);
        dir.write_note("kept.txt", "hello")?;
        fs::create_dir(dir.root().join("subdir")).expect("mkdir");

        let records = dir.list_entries()?;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "kept.txt");
        assert_eq!(records[0].size_bytes, 5);
        Ok(())
    }

    #[test]
    fn append_inserts_separator_only_when_needed() -> Result<()> {
        let temp = TempDir::new().expect("temp dir");
        let dir = open_dir(&temp);

        dir.append_note("fresh.txt", "first")?;
        assert_eq!(dir.read_note("fresh.txt")?, "first");

        dir.append_note("fresh.txt", "second")?;
        assert_eq!(dir.read_note("fresh.txt")?, "first\nsecond");

        dir.write_note("ends.txt", "line\n")?;
        dir.append_note("ends.txt", "more")?;
        assert_eq!(dir.read_note("ends.txt")?, "line\nmore");
        Ok(())
    }

    #[test]
    fn delete_missing_note_reports_not_found() {
        let temp = TempDir::new().expect("temp dir");
        let dir = open_dir(&temp);
        assert_matches!(dir.delete_note("ghost.txt"), Err(StorageError::NotFound(_)));
    }

    #[test]
    fn rename_moves_the_underlying_file() -> Result<()> {
        let temp = TempDir::new().expect("temp dir");
        let dir = open_dir(&temp);
        dir.write_note("old.txt", "body")?;
        dir.rename_note("old.txt", "new.txt")?;
        assert!(!dir.exists("old.txt")?);
        assert_eq!(dir.read_note("new.txt")?, "body");
        Ok(())
    }

    #[test]
    fn operations_reject_invalid_names_before_touching_disk() {
        let temp = TempDir::new().expect("temp dir");
        let dir = open_dir(&temp);
        assert_matches!(
            dir.write_note("../escape", "x"),
            Err(StorageError::InvalidFilename(_))
        );
        assert!(!temp.path().join("escape").exists());
    }
}
