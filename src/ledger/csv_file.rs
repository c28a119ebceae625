use std::collections::HashSet;
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, info};

use super::Ledger;
use crate::models::LedgerRecord;

/// Header row written when the ledger file is created
pub const HEADER: [&str; 6] = ["ID", "Drug Name", "Sponsor", "Type", "Date Found", "Source URL"];

/// CSV file ledger. The first column is the dedup key.
pub struct CsvLedger {
    path: PathBuf,
}

impl CsvLedger {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create the file with its header row if it is missing or empty
    fn ensure_initialized(&self) -> Result<()> {
        let is_empty = match fs::metadata(&self.path) {
            Ok(meta) => meta.len() == 0,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => true,
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("Failed to inspect ledger: {}", self.path.display())
                })
            }
        };

        if !is_empty {
            return Ok(());
        }

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create ledger directory: {}", parent.display())
            })?;
        }

        let file = File::create(&self.path)
            .with_context(|| format!("Failed to create ledger: {}", self.path.display()))?;
        let mut writer = csv::Writer::from_writer(file);
        writer.write_record(HEADER)?;
        writer.flush()?;

        info!(path = %self.path.display(), "Initialized CSV ledger");

        Ok(())
    }

    fn reader(&self) -> Result<csv::Reader<File>> {
        let file = File::open(&self.path)
            .with_context(|| format!("Failed to read ledger: {}", self.path.display()))?;
        Ok(csv::ReaderBuilder::new().flexible(true).from_reader(file))
    }
}

/// True for an empty file or one whose last byte is a newline
fn ends_with_newline(file: &mut File) -> Result<bool> {
    if file.metadata()?.len() == 0 {
        return Ok(true);
    }

    let mut last = [0u8; 1];
    file.seek(SeekFrom::End(-1))?;
    file.read_exact(&mut last)?;
    Ok(last[0] == b'\n')
}

impl Ledger for CsvLedger {
    fn load_known_ids(&self) -> Result<HashSet<String>> {
        self.ensure_initialized()?;

        let mut ids = HashSet::new();
        for row in self.reader()?.records() {
            let row = row
                .with_context(|| format!("Failed to parse ledger: {}", self.path.display()))?;
            if let Some(id) = row.get(0).filter(|id| !id.is_empty()) {
                ids.insert(id.to_string());
            }
        }

        debug!(count = ids.len(), "Loaded known identifiers");

        Ok(ids)
    }

    fn append(&self, records: &[LedgerRecord]) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }

        self.ensure_initialized()?;

        let mut file = OpenOptions::new()
            .read(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("Failed to open ledger for append: {}", self.path.display()))?;

        // New rows must start on their own line
        if !ends_with_newline(&mut file)? {
            file.write_all(b"\n")
                .with_context(|| format!("Failed to write ledger: {}", self.path.display()))?;
        }

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        for record in records {
            writer
                .serialize(record)
                .with_context(|| format!("Failed to write ledger row for {}", record.id))?;
        }
        writer
            .flush()
            .with_context(|| format!("Failed to flush ledger: {}", self.path.display()))?;

        info!(count = records.len(), path = %self.path.display(), "Appended ledger records");

        Ok(())
    }

    fn records(&self) -> Result<Vec<LedgerRecord>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        self.reader()?
            .deserialize()
            .collect::<std::result::Result<Vec<LedgerRecord>, _>>()
            .with_context(|| format!("Failed to parse ledger: {}", self.path.display()))
    }
}
