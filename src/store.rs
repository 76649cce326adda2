use std::collections::HashSet;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Filename of the processed-issue record inside the work directory
pub const PROCESSED_ISSUES_FILE: &str = ".processed_issues.json";

/// File-backed set of issue numbers that have already been handled, so a
/// polling caller can skip them across restarts.
pub struct ProcessedStore {
    path: PathBuf,
    processed: HashSet<u64>,
}

impl ProcessedStore {
    /// Load the store from a work directory; a missing file starts empty.
    pub fn load<P: AsRef<Path>>(work_dir: P) -> Result<Self> {
        let path = work_dir.as_ref().join(PROCESSED_ISSUES_FILE);

        let processed = if path.exists() {
            let file = File::open(&path)
                .context(format!("Failed to open processed issues file: {:?}", path))?;
            let reader = BufReader::new(file);
            serde_json::from_reader(reader).context("Failed to parse processed issues file")?
        } else {
            HashSet::new()
        };

        Ok(Self { path, processed })
    }

    pub fn contains(&self, issue_number: u64) -> bool {
        self.processed.contains(&issue_number)
    }

    /// Record an issue as processed and persist the set.
    pub fn mark(&mut self, issue_number: u64) -> Result<()> {
        self.processed.insert(issue_number);
        self.save()
    }

    pub fn save(&self) -> Result<()> {
        let file = File::create(&self.path)
            .context(format!("Failed to write processed issues file: {:?}", self.path))?;
        let writer = BufWriter::new(file);
        let mut numbers: Vec<u64> = self.processed.iter().copied().collect();
        numbers.sort_unstable();
        serde_json::to_writer(writer, &numbers).context("Failed to serialize processed issues")?;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.processed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processed.is_empty()
    }
}
