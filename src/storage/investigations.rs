//! Investigation storage: suppressed radiator entries.
//!
//! Investigations are appended to `investigations`, one `group project id`
//! line each. Nothing is ever removed. A missing file is a valid empty set.

use std::{fs, io};

// Traits must be in scope for `.lines()` on `BufReader` and `.write_all()` on `File`.
use io::{BufRead, Write};

use tracing::{info, warn};

use crate::model::{Investigation, InvestigationSet};

use super::{Result, Storage};

impl Storage {
    /// Records an investigation.
    ///
    /// Recording the same one twice is harmless.
    pub fn record_investigation(&self, investigation: &Investigation) -> Result<()> {
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.investigations_path())?;
        // One write per line so concurrent appends don't interleave.
        file.write_all(format!("{investigation}\n").as_bytes())?;
        info!(%investigation, "recorded investigation");
        Ok(())
    }

    /// Loads all investigations.
    ///
    /// Lines that don't parse are skipped with a warning.
    pub fn load_investigations(&self) -> Result<InvestigationSet> {
        let file = match fs::File::open(self.investigations_path()) {
            Ok(f) => f,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(InvestigationSet::default()),
            Err(e) => return Err(e.into()),
        };
        let reader = io::BufReader::new(file);
        let mut investigations = InvestigationSet::default();
        for (number, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match line.parse::<Investigation>() {
                Ok(i) => investigations.insert(i),
                Err(e) => warn!(line = number + 1, error = %e, "skipping investigation"),
            }
        }
        Ok(investigations)
    }

    /// The raw investigation lines, in the order they were recorded.
    pub fn investigation_lines(&self) -> Result<Vec<String>> {
        match fs::read_to_string(self.investigations_path()) {
            Ok(contents) => Ok(contents
                .lines()
                .filter(|l| !l.trim().is_empty())
                .map(String::from)
                .collect()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use tempfile::TempDir;

    use crate::model::ProjectKey;

    fn test_storage() -> (TempDir, Storage) {
        let dir = TempDir::new().unwrap();
        let storage = Storage::new(dir.path().join("data")).unwrap();
        (dir, storage)
    }

    #[test]
    fn missing_file_is_empty() {
        let (_dir, storage) = test_storage();
        assert!(storage.load_investigations().unwrap().is_empty());
        assert!(storage.investigation_lines().unwrap().is_empty());
    }

    #[test]
    fn record_and_load() {
        let (_dir, storage) = test_storage();
        storage
            .record_investigation(&Investigation::new("g", "p", 42).unwrap())
            .unwrap();
        storage
            .record_investigation(&Investigation::new("g", "q", 7).unwrap())
            .unwrap();

        let set = storage.load_investigations().unwrap();
        assert_eq!(set.len(), 2);
        assert!(set.is_suppressed(&ProjectKey::from_path("g/p"), 42));
        assert!(set.is_suppressed(&ProjectKey::from_path("g/q"), 7));
    }

    #[test]
    fn file_is_one_line_per_record() {
        let (_dir, storage) = test_storage();
        storage
            .record_investigation(&Investigation::new("g", "p", 42).unwrap())
            .unwrap();

        let contents = fs::read_to_string(storage.investigations_path()).unwrap();
        assert_eq!(contents, "g p 42\n");
    }

    #[test]
    fn duplicates_are_harmless() {
        let (_dir, storage) = test_storage();
        let inv = Investigation::new("g", "p", 42).unwrap();
        storage.record_investigation(&inv).unwrap();
        storage.record_investigation(&inv).unwrap();

        assert_eq!(storage.load_investigations().unwrap().len(), 1);
        assert_eq!(storage.investigation_lines().unwrap().len(), 2);
    }

    #[test]
    fn malformed_lines_are_skipped() {
        let (_dir, storage) = test_storage();
        fs::write(
            storage.investigations_path(),
            "g p 42\ngarbage\n\ng q not-a-number\ng r 9\n",
        )
        .unwrap();

        let set = storage.load_investigations().unwrap();
        assert_eq!(set.len(), 2);
        assert!(set.is_suppressed(&ProjectKey::from_path("g/r"), 9));
    }
}
