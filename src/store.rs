// 🗄️ Record Store - flat CSV file keyed by identifier
//
// No header row, positional columns, CRLF line endings.
// Every mutation other than append reads the whole file and rewrites it.
// There is no locking and no temp-file swap: one caller at a time.

use crate::record::{Record, Schema};
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to access record file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed record file {}: {source}", .path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// A row written under a different schema (or hand-edited)
    #[error("row at line {line} of {} has {found} columns, expected {expected}", .path.display())]
    ColumnCount {
        path: PathBuf,
        line: u64,
        found: usize,
        expected: usize,
    },
}

// ============================================================================
// STORE CONTENTS
// ============================================================================

/// Result of reading the whole file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreContents {
    /// The file does not exist yet ("no records yet")
    Missing,
    /// The file exists but holds no rows ("empty store")
    Empty,
    /// At least one row, in file order
    Rows(Vec<Record>),
}

impl StoreContents {
    pub fn records(&self) -> &[Record] {
        match self {
            StoreContents::Rows(rows) => rows,
            StoreContents::Missing | StoreContents::Empty => &[],
        }
    }

    pub fn into_records(self) -> Vec<Record> {
        match self {
            StoreContents::Rows(rows) => rows,
            StoreContents::Missing | StoreContents::Empty => Vec::new(),
        }
    }

    /// True for both `Missing` and `Empty`
    pub fn is_vacant(&self) -> bool {
        !matches!(self, StoreContents::Rows(_))
    }
}

// ============================================================================
// RECORD STORE
// ============================================================================

#[derive(Debug, Clone)]
pub struct RecordStore {
    path: PathBuf,
    schema: Schema,
}

impl RecordStore {
    pub fn new(path: impl Into<PathBuf>, schema: Schema) -> Self {
        RecordStore {
            path: path.into(),
            schema,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn schema(&self) -> Schema {
        self.schema
    }

    fn io_error(&self, source: io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }

    fn csv_error(&self, source: csv::Error) -> StoreError {
        StoreError::Csv {
            path: self.path.clone(),
            source,
        }
    }

    fn writer<W: Write>(&self, inner: W) -> csv::Writer<W> {
        csv::WriterBuilder::new()
            .has_headers(false)
            .terminator(csv::Terminator::CRLF)
            .from_writer(inner)
    }

    /// Read every row of the file.
    pub fn load(&self) -> Result<StoreContents, StoreError> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "record file missing");
                return Ok(StoreContents::Missing);
            }
            Err(e) => return Err(self.io_error(e)),
        };

        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(file);

        let expected = self.schema.column_count();
        let mut records = Vec::new();

        for result in rdr.records() {
            let row = result.map_err(|e| self.csv_error(e))?;
            let record = Record::from_row(row.iter(), self.schema).ok_or_else(|| {
                StoreError::ColumnCount {
                    path: self.path.clone(),
                    line: row.position().map(|p| p.line()).unwrap_or(0),
                    found: row.len(),
                    expected,
                }
            })?;
            records.push(record);
        }

        debug!(path = %self.path.display(), rows = records.len(), "record file scanned");

        if records.is_empty() {
            Ok(StoreContents::Empty)
        } else {
            Ok(StoreContents::Rows(records))
        }
    }

    /// All records in insertion order; empty when the file is missing or empty.
    pub fn list(&self) -> Result<Vec<Record>, StoreError> {
        Ok(self.load()?.into_records())
    }

    pub fn count(&self) -> Result<usize, StoreError> {
        Ok(self.load()?.records().len())
    }

    /// Add one row at the end of the file, creating it if needed.
    /// Duplicate identifiers are not checked.
    pub fn append(&self, record: &Record) -> Result<(), StoreError> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| self.io_error(e))?;

        let mut wtr = self.writer(file);
        wtr.write_record(record.to_row(self.schema))
            .map_err(|e| self.csv_error(e))?;
        wtr.flush().map_err(|e| self.io_error(e))?;

        info!(identifier = %record.identifier, "record appended");
        Ok(())
    }

    /// First row whose identifier equals `identifier` (string comparison).
    pub fn find_by_identifier(&self, identifier: &str) -> Result<Option<Record>, StoreError> {
        Ok(self
            .load()?
            .into_records()
            .into_iter()
            .find(|r| r.identifier == identifier))
    }

    /// Substitute `replacement` for every row matching `identifier` and
    /// rewrite the file. Returns whether any row matched.
    pub fn replace_by_identifier(
        &self,
        identifier: &str,
        replacement: &Record,
    ) -> Result<bool, StoreError> {
        let contents = self.load()?;
        if contents == StoreContents::Missing {
            return Ok(false);
        }

        let mut matched = 0usize;
        let rows: Vec<Record> = contents
            .into_records()
            .into_iter()
            .map(|row| {
                if row.identifier == identifier {
                    matched += 1;
                    replacement.clone()
                } else {
                    row
                }
            })
            .collect();

        self.rewrite(&rows)?;

        info!(identifier, matched, "record file rewritten after replace");
        Ok(matched > 0)
    }

    /// Drop every row matching `identifier` and rewrite the file with the
    /// survivors. Returns whether at least one row was removed.
    pub fn delete_by_identifier(&self, identifier: &str) -> Result<bool, StoreError> {
        let contents = self.load()?;
        if contents == StoreContents::Missing {
            return Ok(false);
        }

        let rows = contents.into_records();
        let original = rows.len();
        let survivors: Vec<Record> = rows
            .into_iter()
            .filter(|r| r.identifier != identifier)
            .collect();

        self.rewrite(&survivors)?;

        let removed = original - survivors.len();
        info!(identifier, removed, "record file rewritten after delete");
        Ok(survivors.len() < original)
    }

    fn rewrite(&self, records: &[Record]) -> Result<(), StoreError> {
        let file = File::create(&self.path).map_err(|e| self.io_error(e))?;
        let mut wtr = self.writer(file);
        for record in records {
            wtr.write_record(record.to_row(self.schema))
                .map_err(|e| self.csv_error(e))?;
        }
        wtr.flush().map_err(|e| self.io_error(e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Address;
    use std::fs;
    use tempfile::TempDir;

    fn create_test_record(name: &str, identifier: &str) -> Record {
        Record {
            full_name: name.to_string(),
            identifier: identifier.to_string(),
            email: "aluno@instituto.edu.br".to_string(),
            birth_date: None,
            postal_code: "01001000".to_string(),
            address: Address::new("São Paulo", "Praça da Sé", "Sé"),
            number: "100".to_string(),
            complement: String::new(),
        }
    }

    fn temp_store(schema: Schema) -> (TempDir, RecordStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = RecordStore::new(dir.path().join("cadastros.csv"), schema);
        (dir, store)
    }

    #[test]
    fn test_missing_and_empty_are_distinct() {
        let (_dir, store) = temp_store(Schema::Basic);
        assert_eq!(store.load().unwrap(), StoreContents::Missing);

        fs::write(store.path(), "").unwrap();
        assert_eq!(store.load().unwrap(), StoreContents::Empty);

        assert!(store.list().unwrap().is_empty());
        assert_eq!(store.find_by_identifier("12345678901").unwrap(), None);
    }

    #[test]
    fn test_append_then_find_round_trip() {
        let (_dir, store) = temp_store(Schema::Basic);
        let record = create_test_record("Ana Silva", "12345678901");

        store.append(&record).unwrap();

        assert_eq!(
            store.find_by_identifier("12345678901").unwrap(),
            Some(record)
        );
    }

    #[test]
    fn test_round_trip_with_birth_date_schema() {
        let (_dir, store) = temp_store(Schema::WithBirthDate);
        let mut record = create_test_record("Ana Silva", "12345678901");
        record.birth_date = Some("15/05/1990".to_string());

        store.append(&record).unwrap();

        let raw = fs::read_to_string(store.path()).unwrap();
        assert!(raw.starts_with("Ana Silva,12345678901,aluno@instituto.edu.br,15/05/1990,01001000"));
        assert_eq!(store.find_by_identifier("12345678901").unwrap(), Some(record));
    }

    #[test]
    fn test_file_layout_has_no_header_and_crlf() {
        let (_dir, store) = temp_store(Schema::Basic);
        store.append(&create_test_record("Ana Silva", "12345678901")).unwrap();

        let raw = fs::read_to_string(store.path()).unwrap();
        assert_eq!(
            raw,
            "Ana Silva,12345678901,aluno@instituto.edu.br,01001000,São Paulo,Praça da Sé,Sé,100,\r\n"
        );
    }

    #[test]
    fn test_fields_with_delimiters_survive() {
        let (_dir, store) = temp_store(Schema::Basic);
        let mut record = create_test_record("Ana Silva", "12345678901");
        record.complement = "bloco \"B\", apto 12".to_string();

        store.append(&record).unwrap();

        assert_eq!(store.find_by_identifier("12345678901").unwrap(), Some(record));
    }

    #[test]
    fn test_identifier_compared_as_string() {
        let (_dir, store) = temp_store(Schema::Basic);
        store.append(&create_test_record("Ana Silva", "01234567890")).unwrap();

        assert!(store.find_by_identifier("1234567890").unwrap().is_none());
        assert!(store.find_by_identifier("01234567890").unwrap().is_some());
    }

    #[test]
    fn test_append_allows_duplicate_identifiers() {
        let (_dir, store) = temp_store(Schema::Basic);
        store.append(&create_test_record("Ana Silva", "12345678901")).unwrap();
        store.append(&create_test_record("Ana Souza", "12345678901")).unwrap();

        assert_eq!(store.count().unwrap(), 2);
        let found = store.find_by_identifier("12345678901").unwrap().unwrap();
        assert_eq!(found.full_name, "Ana Silva");
    }

    #[test]
    fn test_replace_touches_only_matching_row() {
        let (_dir, store) = temp_store(Schema::Basic);
        store.append(&create_test_record("Ana Silva", "11111111111")).unwrap();
        store.append(&create_test_record("Bruno Lima", "22222222222")).unwrap();
        store.append(&create_test_record("Carla Dias", "33333333333")).unwrap();

        let before: Vec<String> = fs::read_to_string(store.path())
            .unwrap()
            .split("\r\n")
            .map(str::to_string)
            .collect();

        let mut updated = create_test_record("Bruno Lima", "22222222222");
        updated.email = "bruno@novo.com".to_string();
        assert!(store.replace_by_identifier("22222222222", &updated).unwrap());

        let after: Vec<String> = fs::read_to_string(store.path())
            .unwrap()
            .split("\r\n")
            .map(str::to_string)
            .collect();

        assert_eq!(before.len(), after.len());
        assert_eq!(before[0], after[0]);
        assert_ne!(before[1], after[1]);
        assert_eq!(before[2], after[2]);

        let rows = store.list().unwrap();
        assert_eq!(rows[1], updated);
    }

    #[test]
    fn test_replace_substitutes_every_duplicate() {
        let (_dir, store) = temp_store(Schema::Basic);
        store.append(&create_test_record("Ana Silva", "12345678901")).unwrap();
        store.append(&create_test_record("Ana Souza", "12345678901")).unwrap();

        let replacement = create_test_record("Ana Costa", "12345678901");
        assert!(store.replace_by_identifier("12345678901", &replacement).unwrap());

        let rows = store.list().unwrap();
        assert!(rows.iter().all(|r| r.full_name == "Ana Costa"));
    }

    #[test]
    fn test_replace_without_match() {
        let (_dir, store) = temp_store(Schema::Basic);
        let record = create_test_record("Ana Silva", "12345678901");

        assert!(!store.replace_by_identifier("12345678901", &record).unwrap());
        assert!(!store.path().exists());

        store.append(&record).unwrap();
        assert!(!store.replace_by_identifier("99999999999", &record).unwrap());
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn test_delete_then_delete_again() {
        let (_dir, store) = temp_store(Schema::Basic);
        store.append(&create_test_record("Ana Silva", "11111111111")).unwrap();
        store.append(&create_test_record("Bruno Lima", "22222222222")).unwrap();

        assert!(store.delete_by_identifier("11111111111").unwrap());
        assert_eq!(store.count().unwrap(), 1);

        assert!(!store.delete_by_identifier("11111111111").unwrap());
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn test_delete_last_row_leaves_empty_store() {
        let (_dir, store) = temp_store(Schema::Basic);
        store.append(&create_test_record("Ana Silva", "11111111111")).unwrap();

        assert!(store.delete_by_identifier("11111111111").unwrap());
        assert_eq!(store.load().unwrap(), StoreContents::Empty);
    }

    #[test]
    fn test_delete_on_missing_store() {
        let (_dir, store) = temp_store(Schema::Basic);

        assert!(!store.delete_by_identifier("11111111111").unwrap());
        assert!(!store.path().exists());
    }

    #[test]
    fn test_schema_mismatch_is_reported() {
        let (_dir, basic) = temp_store(Schema::Basic);
        basic.append(&create_test_record("Ana Silva", "11111111111")).unwrap();

        let dated = RecordStore::new(basic.path(), Schema::WithBirthDate);
        match dated.load() {
            Err(StoreError::ColumnCount { line, found, expected, .. }) => {
                assert_eq!(line, 1);
                assert_eq!(found, 9);
                assert_eq!(expected, 10);
            }
            other => panic!("expected column count error, got {:?}", other),
        }
    }
}
