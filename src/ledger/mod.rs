pub mod csv_file;

pub use csv_file::CsvLedger;

use std::collections::HashSet;

use anyhow::Result;
use crate::models::LedgerRecord;

/// Trait for append-only finding storage
pub trait Ledger: Send + Sync {
    /// Identifiers of every stored record, creating the store if absent
    fn load_known_ids(&self) -> Result<HashSet<String>>;

    /// Append records after all existing rows
    fn append(&self, records: &[LedgerRecord]) -> Result<()>;

    /// All stored records in insertion order
    fn records(&self) -> Result<Vec<LedgerRecord>>;
}
