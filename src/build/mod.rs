//! Indexing pipeline: documents -> run files -> merged file -> dictionary + postings.

mod index_builder;
mod run_merger;

use crate::dictionary::{DictionaryFile, TermEntry};
use crate::error::IndexError;
use crate::normalize::Normalizer;
use index_builder::IndexBuilder;
use std::collections::BTreeSet;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, Seek, Write};
use std::path::{Path, PathBuf};

const DEFAULT_MEMORY_BUDGET: usize = 500_000;
const DEFAULT_FAN_IN: usize = 3;
const DEFAULT_WORK_DIR: &str = "temp";

pub struct BuildOptions {
    pub memory_budget: usize,
    pub fan_in: usize,
    pub work_dir: PathBuf,
}

impl Default for BuildOptions {
    fn default() -> Self {
        BuildOptions {
            memory_budget: DEFAULT_MEMORY_BUDGET,
            fan_in: DEFAULT_FAN_IN,
            work_dir: PathBuf::from(DEFAULT_WORK_DIR),
        }
    }
}

/// Builds the dictionary and postings files for `doc_dir` under `options`.
/// Removes `options.work_dir` before a new run starts (clearing any
/// leftovers from a prior aborted run) and again after a successful run.
pub fn run_build(
    doc_dir: &Path,
    dict_out: &Path,
    postings_out: &Path,
    normalizer: &dyn Normalizer,
    options: &BuildOptions,
) -> Result<(), IndexError> {
    eprintln!("indexing {}...", doc_dir.display());

    let work_dir = &options.work_dir;
    if work_dir.exists() {
        fs::remove_dir_all(work_dir)?;
    }
    let runs_dir = work_dir.join("runs");

    let mut builder = IndexBuilder::new(normalizer, options.memory_budget, runs_dir.clone());
    let run_count = builder.build(doc_dir)?;
    eprintln!("{run_count} run file(s) created, merging (fan-in {})", options.fan_in);

    let merged_path = run_merger::merge_runs(&runs_dir, options.fan_in, options.memory_budget)?;

    eprintln!("building dictionary...");
    build_dictionary_and_postings(&merged_path, dict_out, postings_out)?;

    if work_dir.exists() {
        fs::remove_dir_all(work_dir)?;
    }
    eprintln!(
        "dictionary and postings file created at {} and {}. Indexing complete!",
        dict_out.display(),
        postings_out.display()
    );
    Ok(())
}

/// Reads the merged run file line by line, writing the postings-only form to
/// `postings_out` and recording each term's document frequency and the byte
/// offset of its own line's first byte, captured just before that line is
/// written so a later `seek(offset); read_line()` returns exactly this term's
/// postings.
fn build_dictionary_and_postings(
    merged_path: &Path,
    dict_out: &Path,
    postings_out: &Path,
) -> Result<(), IndexError> {
    let mut dict = DictionaryFile::new();
    let mut universe: BTreeSet<u64> = BTreeSet::new();

    let reader = BufReader::new(File::open(merged_path)?);
    let mut postings_file = File::create(postings_out)?;

    for line in reader.lines() {
        let line = line?;
        let (term, doc_ids) = line.split_once(' ').ok_or_else(|| {
            IndexError::CorruptDictionary(format!("malformed merged line: {line}"))
        })?;

        for token in doc_ids.split_whitespace() {
            let id_part = token.split('^').next().unwrap_or(token);
            let id = id_part
                .parse::<u64>()
                .map_err(|_| IndexError::CorruptDictionary(format!("bad id token: {token}")))?;
            universe.insert(id);
        }

        let df = doc_ids.split_whitespace().count() as u64;
        let offset = postings_file.stream_position()?;
        writeln!(postings_file, "{doc_ids}")?;
        dict.terms
            .insert(term.to_string(), TermEntry { df, offset });
    }

    dict.universe = universe.into_iter().collect();
    dict.save(dict_out)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dictionary::Dictionary;
    use crate::normalize::SimpleNormalizer;
    use tempfile::tempdir;

    #[test]
    fn end_to_end_two_docs_three_terms() {
        let doc_dir = tempdir().unwrap();
        fs::write(doc_dir.path().join("1"), "cat dog").unwrap();
        fs::write(doc_dir.path().join("2"), "dog fish").unwrap();

        let out_dir = tempdir().unwrap();
        let dict_path = out_dir.path().join("dict.json");
        let postings_path = out_dir.path().join("postings.txt");

        let normalizer = SimpleNormalizer;
        let work_dir = tempdir().unwrap();
        run_build(
            doc_dir.path(),
            &dict_path,
            &postings_path,
            &normalizer,
            &BuildOptions {
                work_dir: work_dir.path().join("temp"),
                ..BuildOptions::default()
            },
        )
        .unwrap();

        let mut dictionary = Dictionary::open(&dict_path, &postings_path).unwrap();
        assert_eq!(dictionary.df("cat"), 1);
        assert_eq!(dictionary.df("dog"), 2);
        assert_eq!(dictionary.df("fish"), 1);
        assert_eq!(dictionary.get_postings("dog").unwrap().get_value_string(), "1 2");
        assert_eq!(dictionary.universe_len(), 2);
    }

    #[test]
    fn dictionary_offset_invariant_holds_for_every_term() {
        let doc_dir = tempdir().unwrap();
        fs::write(doc_dir.path().join("1"), "alpha beta gamma").unwrap();
        fs::write(doc_dir.path().join("2"), "beta delta").unwrap();
        fs::write(doc_dir.path().join("3"), "gamma delta epsilon").unwrap();

        let out_dir = tempdir().unwrap();
        let dict_path = out_dir.path().join("dict.json");
        let postings_path = out_dir.path().join("postings.txt");
        let normalizer = SimpleNormalizer;
        let work_dir = tempdir().unwrap();
        run_build(
            doc_dir.path(),
            &dict_path,
            &postings_path,
            &normalizer,
            &BuildOptions {
                work_dir: work_dir.path().join("temp"),
                ..BuildOptions::default()
            },
        )
        .unwrap();

        let loaded = DictionaryFile::load(&dict_path).unwrap();
        for (term, entry) in &loaded.terms {
            let mut dictionary = Dictionary::open(&dict_path, &postings_path).unwrap();
            let postings = dictionary.get_postings(term).unwrap();
            assert_eq!(postings.len() as u64, entry.df);
        }
    }
}
