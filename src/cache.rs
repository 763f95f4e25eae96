//! Normalized tables memoized by the content of the file they came from.

use crate::error::Result;
use crate::loader::{load_from_reader, LoadReport};
use crate::types::ContractTable;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct CachedTable {
    pub table: Arc<ContractTable>,
    pub report: LoadReport,
    /// BLAKE3 of the file bytes.
    pub fingerprint: String,
}

/// Reloading an unchanged file returns the already-normalized table.
///
/// Entries can be dropped at any time; the next load simply rebuilds them.
#[derive(Debug, Default)]
pub struct TableCache {
    entries: HashMap<String, CachedTable>,
}

impl TableCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn load_path(&mut self, path: &Path) -> Result<CachedTable> {
        let bytes = std::fs::read(path)?;
        self.load_bytes(&bytes)
    }

    pub fn load_bytes(&mut self, bytes: &[u8]) -> Result<CachedTable> {
        let fingerprint = blake3::hash(bytes).to_hex().to_string();
        if let Some(hit) = self.entries.get(&fingerprint) {
            log::debug!("reusing normalized table {}", &fingerprint[..12]);
            return Ok(hit.clone());
        }
        let (table, report) = load_from_reader(bytes)?;
        let entry = CachedTable {
            table: Arc::new(table),
            report,
            fingerprint: fingerprint.clone(),
        };
        self.entries.insert(fingerprint, entry.clone());
        Ok(entry)
    }

    pub fn evict(&mut self, fingerprint: &str) -> bool {
        self.entries.remove(fingerprint).is_some()
    }
}
