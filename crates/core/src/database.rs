//! Read-only key/value tables loaded lazily from JSON documents.
//!
//! A table file looks like `{"values": [{"key": ..., "info": ...}, ...]}`.
//! The file is read and parsed on the first query only; the outcome, success
//! or failure, is kept for the lifetime of the table.

use std::{
    borrow::Borrow,
    collections::{hash_map::Entry, HashMap},
    fmt::Debug,
    fs,
    hash::Hash,
    path::PathBuf,
};

use once_cell::sync::OnceCell;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error, trace, warn};

use crate::document::FromDocument;

/// Field holding the array of records.
pub const VALUES_FIELD: &str = "values";
/// Field holding the key of a record.
pub const KEY_FIELD: &str = "key";
/// Field holding the value of a record.
pub const INFO_FIELD: &str = "info";

/// Reasons a table could not be loaded.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DatabaseError {
    /// The backing file could not be opened or read.
    #[error("failed to read database \"{name}\": {reason}")]
    Read {
        /// Table name.
        name: String,
        /// Underlying failure.
        reason: String,
    },
    /// The backing file is not valid JSON.
    #[error("failed to parse database \"{name}\": {reason}")]
    Parse {
        /// Table name.
        name: String,
        /// Underlying failure.
        reason: String,
    },
    /// The top level `values` field is absent.
    #[error("database \"{name}\" has no \"values\" field")]
    ValuesMissing {
        /// Table name.
        name: String,
    },
    /// The top level `values` field is not an array.
    #[error("database \"{name}\" has a \"values\" field that is not an array")]
    ValuesNotArray {
        /// Table name.
        name: String,
    },
}

/// Provider of the raw bytes behind a [`Table`].
pub trait TableSource: Send + Sync {
    /// Name used in logs and errors.
    fn name(&self) -> &str;

    /// Read the whole document.
    fn read(&self) -> Result<String, DatabaseError>;
}

/// Document compiled into the executable.
#[derive(Debug, Clone)]
pub struct Embedded {
    name: &'static str,
    contents: &'static str,
}

impl Embedded {
    /// Wrap a document obtained with `include_str!`.
    pub const fn new(name: &'static str, contents: &'static str) -> Self {
        Self { name, contents }
    }
}

impl TableSource for Embedded {
    fn name(&self) -> &str {
        self.name
    }

    fn read(&self) -> Result<String, DatabaseError> {
        Ok(self.contents.to_string())
    }
}

/// Document stored on the filesystem.
#[derive(Debug, Clone)]
pub struct External {
    name: String,
    path: PathBuf,
}

impl External {
    /// Read the table from `path` on first use.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            name: path.display().to_string(),
            path,
        }
    }
}

impl TableSource for External {
    fn name(&self) -> &str {
        &self.name
    }

    fn read(&self) -> Result<String, DatabaseError> {
        fs::read_to_string(&self.path).map_err(|err| DatabaseError::Read {
            name: self.name.clone(),
            reason: err.to_string(),
        })
    }
}

type Records<K, V> = HashMap<K, V>;

/// Lazily loaded association between unique keys and values.
pub struct Table<K, V> {
    source: Box<dyn TableSource>,
    records: OnceCell<Result<Records<K, V>, DatabaseError>>,
}

impl<K, V> Table<K, V>
where
    K: FromDocument + Eq + Hash + Debug,
    V: FromDocument + Clone + Debug,
{
    /// Build a table; nothing is read until the first query.
    pub fn new(source: impl TableSource + 'static) -> Self {
        Self {
            source: Box::new(source),
            records: OnceCell::new(),
        }
    }

    /// Name of the backing document.
    pub fn name(&self) -> &str {
        self.source.name()
    }

    /// Whether a load attempt already happened, regardless of its outcome.
    pub fn is_loaded(&self) -> bool {
        self.records.get().is_some()
    }

    /// Look up `key`.
    ///
    /// `Ok(None)` is a successful lookup without a match, `Err` means the
    /// table itself is unusable.
    pub fn find<Q>(&self, key: &Q) -> Result<Option<V>, DatabaseError>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + Debug + ?Sized,
    {
        let query_log = format!(r#"Query operation on database "{}"."#, self.name());
        match self.records() {
            Ok(records) => {
                let found = records.get(key).cloned();
                match &found {
                    Some(value) => trace!(r#"{query_log} Key {key:?} has a match: {value:?}"#),
                    None => trace!(r#"{query_log} Key {key:?} has no match"#),
                }
                Ok(found)
            }
            Err(err) => {
                warn!("{query_log} Database is unusable: {err}");
                Err(err.clone())
            }
        }
    }

    /// Number of records in the table.
    pub fn entries(&self) -> Result<usize, DatabaseError> {
        self.records().as_ref().map(HashMap::len).map_err(Clone::clone)
    }

    fn records(&self) -> &Result<Records<K, V>, DatabaseError> {
        self.records.get_or_init(|| self.load())
    }

    fn load(&self) -> Result<Records<K, V>, DatabaseError> {
        let load_log = format!(r#"Load operation on database "{}"."#, self.name());
        let result = self.source.read().and_then(|raw| self.parse(&raw, &load_log));
        if let Err(err) = &result {
            error!("{load_log} Failed: {err}");
        }
        result
    }

    fn parse(&self, raw: &str, load_log: &str) -> Result<Records<K, V>, DatabaseError> {
        let name = self.name().to_string();
        let document: Value = serde_json::from_str(raw).map_err(|err| DatabaseError::Parse {
            name: name.clone(),
            reason: err.to_string(),
        })?;

        let values = document
            .get(VALUES_FIELD)
            .ok_or_else(|| DatabaseError::ValuesMissing { name: name.clone() })?
            .as_array()
            .ok_or(DatabaseError::ValuesNotArray { name })?;

        let mut records = Records::with_capacity(values.len());
        for entry in values {
            let (key, value) = match parse_record::<K, V>(entry) {
                Ok(record) => record,
                Err(reason) => {
                    warn!(
                        r#"{load_log} Entry "{entry}" could not be parsed, will not be added: {reason}"#
                    );
                    continue;
                }
            };

            match records.entry(key) {
                Entry::Occupied(existing) => warn!(
                    "{load_log} Double insertion for key {:?}, already available with value {:?}",
                    existing.key(),
                    existing.get()
                ),
                Entry::Vacant(slot) => {
                    trace!("{load_log} Value with key {:?} added: {value:?}", slot.key());
                    slot.insert(value);
                }
            }
        }

        debug!("{load_log} Successfully parsed {} records", records.len());
        Ok(records)
    }
}

fn parse_record<K: FromDocument, V: FromDocument>(entry: &Value) -> Result<(K, V), String> {
    let key = entry
        .get(KEY_FIELD)
        .ok_or_else(|| format!("missing \"{KEY_FIELD}\" field"))?;
    let value = entry
        .get(INFO_FIELD)
        .ok_or_else(|| format!("missing \"{INFO_FIELD}\" field"))?;

    let key = K::from_document(key).map_err(|err| err.to_string())?;
    let value = V::from_document(value).map_err(|err| err.to_string())?;
    Ok((key, value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    use crate::document::DocumentError;

    #[derive(Debug, Clone, PartialEq)]
    struct Title(String);

    impl FromDocument for Title {
        fn from_document(document: &Value) -> Result<Self, DocumentError> {
            document
                .get("title")
                .and_then(Value::as_str)
                .map(|title| Title(title.to_string()))
                .ok_or(DocumentError::MissingField("title"))
        }
    }

    struct Counting {
        contents: Result<&'static str, ()>,
        reads: Arc<AtomicUsize>,
    }

    impl TableSource for Counting {
        fn name(&self) -> &str {
            "counting"
        }

        fn read(&self) -> Result<String, DatabaseError> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            self.contents
                .map(str::to_string)
                .map_err(|_| DatabaseError::Read {
                    name: "counting".to_string(),
                    reason: "unavailable".to_string(),
                })
        }
    }

    fn counting(contents: Result<&'static str, ()>) -> (Table<String, Title>, Arc<AtomicUsize>) {
        let reads = Arc::new(AtomicUsize::new(0));
        let table = Table::new(Counting {
            contents,
            reads: Arc::clone(&reads),
        });
        (table, reads)
    }

    #[test]
    fn loads_lazily_and_only_once() {
        let (table, reads) = counting(Ok(
            r#"{"values": [{"key": "sf2", "info": {"title": "Street Fighter II"}}]}"#,
        ));
        assert!(!table.is_loaded());
        assert_eq!(reads.load(Ordering::SeqCst), 0);

        assert_eq!(
            table.find("sf2").unwrap(),
            Some(Title("Street Fighter II".to_string()))
        );
        assert_eq!(table.find("mslug").unwrap(), None);
        assert_eq!(table.entries().unwrap(), 1);
        assert_eq!(reads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn load_failure_is_permanent() {
        let (table, reads) = counting(Err(()));
        assert!(matches!(table.find("sf2"), Err(DatabaseError::Read { .. })));
        assert!(matches!(table.find("sf2"), Err(DatabaseError::Read { .. })));
        assert!(table.is_loaded());
        assert_eq!(reads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn rejects_malformed_documents() {
        let (table, _) = counting(Ok("not json"));
        assert!(matches!(table.entries(), Err(DatabaseError::Parse { .. })));

        let (table, _) = counting(Ok(r#"{"roms": []}"#));
        assert!(matches!(
            table.entries(),
            Err(DatabaseError::ValuesMissing { .. })
        ));

        let (table, _) = counting(Ok(r#"{"values": {"key": "sf2"}}"#));
        assert!(matches!(
            table.entries(),
            Err(DatabaseError::ValuesNotArray { .. })
        ));
    }

    #[test]
    fn skips_malformed_entries_and_keeps_first_duplicate() {
        let (table, _) = counting(Ok(r#"{"values": [
                {"info": {"title": "No key"}},
                {"key": "nofield"},
                {"key": 12, "info": {"title": "Numeric key"}},
                {"key": "notitle", "info": {"year": "1990"}},
                {"key": "sf2", "info": {"title": "Street Fighter II"}},
                {"key": "sf2", "info": {"title": "Duplicate"}},
                {"key": "mslug", "info": {"title": "Metal Slug"}}
            ]}"#));

        assert_eq!(table.entries().unwrap(), 2);
        assert_eq!(
            table.find("sf2").unwrap(),
            Some(Title("Street Fighter II".to_string()))
        );
        assert_eq!(
            table.find("mslug").unwrap(),
            Some(Title("Metal Slug".to_string()))
        );
        assert_eq!(table.find("notitle").unwrap(), None);
    }

    #[test]
    fn external_tables_report_missing_files() {
        let table: Table<String, Title> = Table::new(External::new("/nonexistent/enea/db.json"));
        assert!(matches!(table.find("sf2"), Err(DatabaseError::Read { .. })));
    }
}
