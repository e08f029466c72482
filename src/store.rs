// src/store.rs
//! Record persistence.
//!
//! Records are keyed by (name, restaurant, meal period, section) and upserted.
//! An item with a known id replaces its older row for the same restaurant even
//! when the section or meal period changed, matching how items are deduplicated
//! during a run, so an upgrade doesn't leave the old row behind. File stores load what is already on disk, keep everything
//! in memory and rewrite the whole file on `flush` (temp file + rename).

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::csv;
use crate::data::{NutrientRecord, RecordKey};
use crate::error::StoreError;

pub trait RecordStore {
    fn upsert(&mut self, record: NutrientRecord) -> Result<(), StoreError>;
    fn flush(&mut self) -> Result<(), StoreError> { Ok(()) }
    fn records(&self) -> Vec<&NutrientRecord>;
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    rows: BTreeMap<RecordKey, NutrientRecord>,
}

impl MemoryStore {
    pub fn new() -> Self { Self::default() }
    pub fn len(&self) -> usize { self.rows.len() }
    pub fn is_empty(&self) -> bool { self.rows.is_empty() }
    pub fn get(&self, key: &RecordKey) -> Option<&NutrientRecord> { self.rows.get(key) }

    fn insert(&mut self, record: NutrientRecord) {
        if let Some(id) = record.item_id {
            self.rows.retain(|_, r| !(r.item_id == Some(id) && r.restaurant == record.restaurant));
        }
        self.rows.insert(record.key(), record);
    }
}

impl RecordStore for MemoryStore {
    fn upsert(&mut self, record: NutrientRecord) -> Result<(), StoreError> {
        self.insert(record);
        Ok(())
    }

    fn records(&self) -> Vec<&NutrientRecord> { self.rows.values().collect() }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StoreFormat { Csv, Json }

impl StoreFormat {
    /// By extension; anything that isn't `.json` is CSV.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => StoreFormat::Json,
            _ => StoreFormat::Csv,
        }
    }

    pub fn ext(self) -> &'static str {
        match self { StoreFormat::Csv => "csv", StoreFormat::Json => "json" }
    }
}

#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    format: StoreFormat,
    mem: MemoryStore,
}

impl FileStore {
    /// Open (or prepare to create) the store at `path`, loading existing rows.
    pub fn open(path: impl Into<PathBuf>, format: StoreFormat) -> Result<Self, StoreError> {
        let path = path.into();
        let mut mem = MemoryStore::new();
        if path.is_file() {
            let text = fs::read_to_string(&path)?;
            let existing = match format {
                StoreFormat::Csv => csv::parse_records(&text)?,
                StoreFormat::Json if text.trim().is_empty() => Vec::new(),
                StoreFormat::Json => serde_json::from_str::<Vec<NutrientRecord>>(&text)?,
            };
            logd!("loaded {} records from {}", existing.len(), path.display());
            for rec in existing { mem.insert(rec); }
        }
        Ok(Self { path, format, mem })
    }

    pub fn path(&self) -> &Path { &self.path }
    pub fn len(&self) -> usize { self.mem.len() }
    pub fn is_empty(&self) -> bool { self.mem.is_empty() }
}

impl RecordStore for FileStore {
    fn upsert(&mut self, record: NutrientRecord) -> Result<(), StoreError> {
        self.mem.upsert(record)
    }

    fn flush(&mut self) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let records = self.mem.records();
        let mut buf: Vec<u8> = Vec::new();
        match self.format {
            StoreFormat::Csv => csv::write_records(&mut buf, &records)?,
            StoreFormat::Json => {
                serde_json::to_writer_pretty(&mut buf, &records)?;
                buf.push(b'\n');
            }
        }

        let tmp = self.path.with_extension(join!(self.format.ext(), ".tmp"));
        let mut f = fs::File::create(&tmp)?;
        f.write_all(&buf)?;
        f.sync_all()?;
        drop(f);
        fs::rename(&tmp, &self.path)?;
        logf!("wrote {} records to {}", records.len(), self.path.display());
        Ok(())
    }

    fn records(&self) -> Vec<&NutrientRecord> { self.mem.records() }
}

/// Per-restaurant (items, items with calories > 0).
pub fn store_stats(store: &dyn RecordStore) -> BTreeMap<String, (usize, usize)> {
    let mut out: BTreeMap<String, (usize, usize)> = BTreeMap::new();
    for rec in store.records() {
        let e = out.entry(rec.restaurant.clone()).or_default();
        e.0 += 1;
        e.1 += usize::from(rec.has_nutrition());
    }
    out
}
