//! Dictionary (term -> document frequency + postings offset) and the random
//! access postings store built on top of it.

use crate::error::IndexError;
use crate::skiplist::SkipList;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom, Write};
use std::path::Path;

/// Document frequency and byte offset of a term's postings line.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TermEntry {
    pub df: u64,
    pub offset: u64,
}

/// Persisted term -> entry mapping, plus the universe of every document id in
/// the corpus. The universe travels inside the same artifact because the
/// indexer CLI exposes no separate flag for it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DictionaryFile {
    pub terms: BTreeMap<String, TermEntry>,
    pub universe: Vec<u64>,
}

impl DictionaryFile {
    pub fn new() -> Self {
        DictionaryFile {
            terms: BTreeMap::new(),
            universe: Vec::new(),
        }
    }

    pub fn load(path: &Path) -> Result<Self, IndexError> {
        let mut file = File::open(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                IndexError::MissingInput(path.display().to_string())
            } else {
                IndexError::Io(e)
            }
        })?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;
        serde_json::from_str(&contents)
            .map_err(|e| IndexError::CorruptDictionary(e.to_string()))
    }

    pub fn save(&self, path: &Path) -> Result<(), IndexError> {
        let mut file = File::create(path)?;
        let contents =
            serde_json::to_string(self).map_err(|e| IndexError::CorruptDictionary(e.to_string()))?;
        file.write_all(contents.as_bytes())?;
        Ok(())
    }

    /// Document frequency of `term`, or 0 if the term was never indexed.
    pub fn df(&self, term: &str) -> u64 {
        self.terms.get(term).map_or(0, |e| e.df)
    }

    pub fn universe_len(&self) -> usize {
        self.universe.len()
    }

    pub fn universe_list(&self) -> SkipList {
        SkipList::from_ids(&self.universe)
    }
}

impl Default for DictionaryFile {
    fn default() -> Self {
        Self::new()
    }
}

/// Seek-and-read-line access to the postings file, mirroring a single long
/// lived file handle kept open across many lookups.
pub struct PostingsStore {
    reader: BufReader<File>,
}

impl PostingsStore {
    pub fn open(path: &Path) -> Result<Self, IndexError> {
        let file = File::open(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                IndexError::MissingInput(path.display().to_string())
            } else {
                IndexError::Io(e)
            }
        })?;
        Ok(PostingsStore {
            reader: BufReader::new(file),
        })
    }

    /// Reads the postings line starting at `offset`. Never fails on malformed
    /// content from this layer alone; a bad token surfaces as a skip list parse
    /// error only if the bytes there aren't valid postings.
    pub fn read_at(&mut self, offset: u64) -> Result<SkipList, IndexError> {
        self.reader.seek(SeekFrom::Start(offset))?;
        let mut line = String::new();
        self.reader.read_line(&mut line)?;
        SkipList::from_string(&line)
    }
}

/// Combines the dictionary and postings store into the single entry point the
/// query evaluator uses: term lookups that never fail on a missing term.
pub struct Dictionary {
    file: DictionaryFile,
    postings: PostingsStore,
}

impl Dictionary {
    pub fn open(dict_path: &Path, postings_path: &Path) -> Result<Self, IndexError> {
        Ok(Dictionary {
            file: DictionaryFile::load(dict_path)?,
            postings: PostingsStore::open(postings_path)?,
        })
    }

    pub fn df(&self, term: &str) -> u64 {
        self.file.df(term)
    }

    pub fn universe_len(&self) -> usize {
        self.file.universe_len()
    }

    pub fn universe_list(&self) -> SkipList {
        self.file.universe_list()
    }

    /// Empty postings for an unknown term; never an error.
    pub fn get_postings(&mut self, term: &str) -> Result<SkipList, IndexError> {
        match self.file.terms.get(term) {
            Some(entry) => self.postings.read_at(entry.offset),
            None => Ok(SkipList::new()),
        }
    }
}
