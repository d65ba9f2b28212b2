//! Streams documents into memory-bounded sorted run files.

use crate::error::IndexError;
use crate::normalize::Normalizer;
use crate::skiplist::SkipList;
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Fixed per-entry overhead used by the memory estimator: enough to dwarf the
/// actual `BTreeMap` node cost so the estimate over-counts rather than under.
const TERM_OVERHEAD_BYTES: usize = 48;
const ID_BYTES: usize = 8;

/// Monotone approximation of the bytes a (term, new-id) insertion adds to the
/// partial index. Exactness isn't required, only that it forces a flush before
/// the process actually runs out of memory.
fn estimate_insertion_bytes(term: &str, is_new_term: bool) -> usize {
    let mut bytes = ID_BYTES;
    if is_new_term {
        bytes += term.len() + TERM_OVERHEAD_BYTES;
    }
    bytes
}

pub struct IndexBuilder<'n> {
    normalizer: &'n dyn Normalizer,
    memory_budget: usize,
    runs_dir: PathBuf,
    partial: BTreeMap<String, Vec<u64>>,
    estimated_bytes: usize,
    next_run_index: usize,
}

impl<'n> IndexBuilder<'n> {
    pub fn new(normalizer: &'n dyn Normalizer, memory_budget: usize, runs_dir: PathBuf) -> Self {
        IndexBuilder {
            normalizer,
            memory_budget,
            runs_dir,
            partial: BTreeMap::new(),
            estimated_bytes: 0,
            next_run_index: 0,
        }
    }

    /// Reads every file in `doc_dir`, treating the file name as the document id,
    /// and returns the number of run files written under `runs_dir`.
    pub fn build(&mut self, doc_dir: &Path) -> Result<usize, IndexError> {
        if self.runs_dir.exists() {
            fs::remove_dir_all(&self.runs_dir)?;
        }
        fs::create_dir_all(&self.runs_dir)?;

        let mut doc_ids = Vec::new();
        for entry in fs::read_dir(doc_dir)
            .map_err(|_| IndexError::MissingInput(doc_dir.display().to_string()))?
        {
            let entry = entry?;
            if let Some(name) = entry.file_name().to_str() {
                if let Ok(id) = name.parse::<u64>() {
                    doc_ids.push((id, entry.path()));
                }
            }
        }
        doc_ids.sort_by_key(|(id, _)| *id);

        for (doc_id, path) in doc_ids {
            let text = fs::read_to_string(&path)?;
            for term in self.normalizer.normalize(&text) {
                self.insert_posting(&term, doc_id)?;
            }
        }
        if !self.partial.is_empty() {
            self.flush()?;
        }
        Ok(self.next_run_index)
    }

    fn insert_posting(&mut self, term: &str, doc_id: u64) -> Result<(), IndexError> {
        let is_new_term = !self.partial.contains_key(term);
        let ids = self.partial.entry(term.to_string()).or_default();
        if ids.last() != Some(&doc_id) {
            ids.push(doc_id);
            self.estimated_bytes += estimate_insertion_bytes(term, is_new_term);
        }
        if self.estimated_bytes > self.memory_budget {
            // Flushing here mirrors the reference behavior of checking after
            // every insertion rather than batching the check.
            self.flush()?;
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<(), IndexError> {
        if self.partial.is_empty() {
            return Ok(());
        }
        let run_path = self.runs_dir.join(self.next_run_index.to_string());
        let mut file = fs::File::create(&run_path)?;
        for (term, ids) in &self.partial {
            let list = SkipList::from_ids(ids);
            writeln!(file, "{term} {}", list.serialize())?;
        }
        self.partial.clear();
        self.estimated_bytes = 0;
        self.next_run_index += 1;
        Ok(())
    }
}
