use crate::storage::{NoteRecord, NotesDir, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchLocation {
    Filename,
    Content,
    Both,
}

impl MatchLocation {
    pub fn describe(self) -> &'static str {
        match self {
            MatchLocation::Filename => "filename",
            MatchLocation::Content => "content",
            MatchLocation::Both => "filename, content",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchMatch {
    pub record: NoteRecord,
    pub location: MatchLocation,
}

/// Case-insensitive substring search over note names and bodies. Notes whose
/// content cannot be read (deleted mid-scan, not UTF-8) are matched on the
/// name alone.
pub fn search_notes(dir: &NotesDir, keyword: &str) -> Result<Vec<SearchMatch>> {
    let needle = keyword.to_lowercase();
    let mut records = dir.list_entries()?;
    records.sort_by(|a, b| a.name.cmp(&b.name));

    let mut matches = Vec::new();
    for record in records {
        let in_name = record.name.to_lowercase().contains(&needle);
        let in_content = match dir.read_note(&record.name) {
            Ok(content) => content.to_lowercase().contains(&needle),
            Err(err) => {
                tracing::warn!(name = %record.name, %err, "skipping unreadable note body");
                false
            }
        };
        let location = match (in_name, in_content) {
            (true, true) => MatchLocation::Both,
            (true, false) => MatchLocation::Filename,
            (false, true) => MatchLocation::Content,
            (false, false) => continue,
        };
        matches.push(SearchMatch { record, location });
    }
    Ok(matches)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn seeded_dir(temp: &TempDir) -> NotesDir {
        let dir = NotesDir::open(temp.path().join("notes")).expect("open notes dir");
        dir.write_note("groceries.txt", "milk and Bread").expect("write");
        dir.write_note("bread-recipe.txt", "flour, water, salt").expect("write");
        dir.write_note("journal.txt", "quiet day").expect("write");
        dir
    }

    #[test]
    fn search_is_case_insensitive_over_names_and_bodies() {
        let temp = TempDir::new().expect("temp dir");
        let dir = seeded_dir(&temp);

        let matches = search_notes(&dir, "BREAD").expect("search");
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].record.name, "bread-recipe.txt");
        assert_eq!(matches[0].location, MatchLocation::Filename);
        assert_eq!(matches[1].record.name, "groceries.txt");
        assert_eq!(matches[1].location, MatchLocation::Content);
    }

    #[test]
    fn search_reports_both_locations() {
        let temp = TempDir::new().expect("temp dir");
        let dir = seeded_dir(&temp);
        dir.write_note("salt.txt", "sea salt").expect("write");

        let matches = search_notes(&dir, "salt").expect("search");
        let salt = matches
            .iter()
            .find(|m| m.record.name == "salt.txt")
            .expect("salt.txt matched");
        assert_eq!(salt.location, MatchLocation::Both);
    }

    #[test]
    fn search_without_hits_is_empty() {
        let temp = TempDir::new().expect("temp dir");
        let dir = seeded_dir(&temp);
        assert!(search_notes(&dir, "nonexistent").expect("search").is_empty());
    }
}
