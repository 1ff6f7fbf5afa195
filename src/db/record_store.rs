use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::ser::{Formatter, PrettyFormatter, Serializer};
use tracing::{debug, warn};

use crate::db::models::{AdvertChanges, JobAdvertRecord};

/// Store-level errors
#[derive(Debug)]
pub enum StoreError {
    /// A record with this URL already exists
    DuplicateKey(String),

    /// No record with this URL
    NotFound(String),

    /// The backing file could not be written
    Write { path: PathBuf, source: io::Error },

    /// The mapping could not be encoded as JSON
    Serialize(serde_json::Error),

    /// An unloadable backing file could not be moved aside
    Preserve { path: PathBuf, source: io::Error },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::DuplicateKey(url) => write!(f, "Job advert already exists: {}", url),
            StoreError::NotFound(url) => write!(f, "Job advert not found: {}", url),
            StoreError::Write { path, source } => {
                write!(f, "Failed to write {}: {}", path.display(), source)
            }
            StoreError::Serialize(e) => write!(f, "Failed to encode job adverts: {}", e),
            StoreError::Preserve { path, source } => {
                write!(f, "Failed to keep a copy of the unreadable file as {}: {}", path.display(), source)
            }
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::Write { source, .. } | StoreError::Preserve { source, .. } => Some(source),
            StoreError::Serialize(e) => Some(e),
            _ => None,
        }
    }
}

/// In-memory mirror of the JSON backing file.
///
/// Keys are kept in a `BTreeMap` so every save writes the URLs in sorted
/// order. Every successful mutation rewrites the whole file.
#[derive(Debug)]
pub struct RecordStore {
    path: PathBuf,
    records: BTreeMap<String, JobAdvertRecord>,
    /// The file on disk could not be loaded and has not been moved aside yet
    damaged: bool,
}

impl RecordStore {
    /// Open the store backed by `path`, loading whatever it currently holds
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let (records, damaged) = Self::read(&path);
        debug!("Opened store {} with {} job adverts", path.display(), records.len());
        Self {
            path,
            records,
            damaged,
        }
    }

    /// Read the backing file.
    ///
    /// A missing, unreadable or malformed file yields an empty mapping. The
    /// last two cases are logged as warnings.
    pub fn load(path: &Path) -> BTreeMap<String, JobAdvertRecord> {
        Self::read(path).0
    }

    /// Records plus whether an existing file had to be ignored
    fn read(path: &Path) -> (BTreeMap<String, JobAdvertRecord>, bool) {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("No backing file at {}, starting empty", path.display());
                return (BTreeMap::new(), false);
            }
            Err(e) => {
                warn!("Cannot read {}, starting empty: {}", path.display(), e);
                return (BTreeMap::new(), path.is_file());
            }
        };

        match serde_json::from_str::<BTreeMap<String, JobAdvertRecord>>(&content) {
            Ok(mut records) => {
                for (url, record) in records.iter_mut() {
                    record.url = url.clone();
                }
                (records, false)
            }
            Err(e) => {
                warn!("Malformed backing file {}, starting empty: {}", path.display(), e);
                (BTreeMap::new(), true)
            }
        }
    }

    /// Serialize the full mapping and overwrite the backing file.
    ///
    /// A file that could not be loaded is first renamed to
    /// `<file>.corrupt` (or `<file>.corrupt.N` if taken) so its content
    /// survives the overwrite.
    pub fn save(&mut self) -> Result<(), StoreError> {
        let encoded = encode(&self.records)?;

        if self.damaged {
            self.preserve_damaged_file()?;
        }

        fs::write(&self.path, encoded).map_err(|source| StoreError::Write {
            path: self.path.clone(),
            source,
        })?;

        debug!("Saved {} job adverts to {}", self.records.len(), self.path.display());
        Ok(())
    }

    fn preserve_damaged_file(&mut self) -> Result<(), StoreError> {
        let target = corrupt_copy_path(&self.path);

        fs::rename(&self.path, &target).map_err(|source| StoreError::Preserve {
            path: target.clone(),
            source,
        })?;

        warn!(
            "Moved unreadable backing file {} to {}",
            self.path.display(),
            target.display()
        );
        self.damaged = false;
        Ok(())
    }

    /// Add a new record and persist the store
    pub fn insert(&mut self, record: JobAdvertRecord) -> Result<&JobAdvertRecord, StoreError> {
        if self.records.contains_key(&record.url) {
            return Err(StoreError::DuplicateKey(record.url));
        }

        debug!("Inserting job advert: url={}, category={}", record.url, record.category);

        let url = record.url.clone();
        self.records.insert(url.clone(), record);

        if let Err(e) = self.save() {
            self.records.remove(&url);
            return Err(e);
        }

        Ok(&self.records[&url])
    }

    /// Merge `changes` into the record at `url` and persist the store.
    /// The record keeps its URL and date.
    pub fn update(&mut self, url: &str, changes: AdvertChanges) -> Result<&JobAdvertRecord, StoreError> {
        let record = self
            .records
            .get_mut(url)
            .ok_or_else(|| StoreError::NotFound(url.to_string()))?;

        debug!("Updating job advert: url={}", url);

        let previous = record.clone();
        changes.apply_to(record);

        if let Err(e) = self.save() {
            self.records.insert(url.to_string(), previous);
            return Err(e);
        }

        Ok(&self.records[url])
    }

    pub fn get(&self, url: &str) -> Option<&JobAdvertRecord> {
        self.records.get(url)
    }

    pub fn contains(&self, url: &str) -> bool {
        self.records.contains_key(url)
    }

    /// Records in URL order
    pub fn records(&self) -> impl Iterator<Item = &JobAdvertRecord> {
        self.records.values()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// First free `<file>.corrupt`, `<file>.corrupt.1`, ... next to `path`
fn corrupt_copy_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".corrupt");
    let base = PathBuf::from(name);

    let mut candidate = base.clone();
    let mut n = 1;
    while candidate.exists() {
        let mut name = base.as_os_str().to_owned();
        name.push(format!(".{}", n));
        candidate = PathBuf::from(name);
        n += 1;
    }
    candidate
}

/// Pretty printing that escapes every character outside printable ASCII
/// as `\uXXXX`, the way `json.dump(..., indent=4)` writes it.
struct AsciiPrettyFormatter<'a> {
    inner: PrettyFormatter<'a>,
}

impl<'a> AsciiPrettyFormatter<'a> {
    fn new() -> Self {
        Self {
            inner: PrettyFormatter::with_indent(b"    "),
        }
    }
}

impl Formatter for AsciiPrettyFormatter<'_> {
    fn begin_array<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.inner.begin_array(writer)
    }

    fn end_array<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.inner.end_array(writer)
    }

    fn begin_array_value<W: ?Sized + io::Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        self.inner.begin_array_value(writer, first)
    }

    fn end_array_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.inner.end_array_value(writer)
    }

    fn begin_object<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.inner.begin_object(writer)
    }

    fn end_object<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.inner.end_object(writer)
    }

    fn begin_object_key<W: ?Sized + io::Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        self.inner.begin_object_key(writer, first)
    }

    fn begin_object_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.inner.begin_object_value(writer)
    }

    fn end_object_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.inner.end_object_value(writer)
    }

    fn write_string_fragment<W: ?Sized + io::Write>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()> {
        let mut start = 0;
        for (index, ch) in fragment.char_indices() {
            if (' '..='~').contains(&ch) {
                continue;
            }
            writer.write_all(&fragment.as_bytes()[start..index])?;
            let mut units = [0u16; 2];
            for unit in ch.encode_utf16(&mut units) {
                write!(writer, "\\u{:04x}", unit)?;
            }
            start = index + ch.len_utf8();
        }
        writer.write_all(&fragment.as_bytes()[start..])
    }
}

/// Four-space indented, ASCII-only JSON, no trailing newline
fn encode(records: &BTreeMap<String, JobAdvertRecord>) -> Result<Vec<u8>, StoreError> {
    let mut buffer = Vec::new();
    let mut serializer = Serializer::with_formatter(&mut buffer, AsciiPrettyFormatter::new());
    records.serialize(&mut serializer).map_err(StoreError::Serialize)?;
    Ok(buffer)
}
