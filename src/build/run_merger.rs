//! k-way leveled merge of sorted run files into one globally sorted file.

use crate::error::IndexError;
use crate::skiplist::SkipList;
use std::collections::VecDeque;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Lazily refills from its run file whenever its queue of raw lines runs dry.
struct InputBuffer {
    reader: BufReader<File>,
    budget: usize,
    lines: VecDeque<String>,
    eof: bool,
}

impl InputBuffer {
    fn open(path: &Path, budget: usize) -> Result<Self, IndexError> {
        let mut buf = InputBuffer {
            reader: BufReader::new(File::open(path)?),
            budget,
            lines: VecDeque::new(),
            eof: false,
        };
        buf.fill()?;
        Ok(buf)
    }

    fn fill(&mut self) -> Result<(), IndexError> {
        let mut bytes: usize = self.lines.iter().map(String::len).sum();
        while bytes < self.budget {
            let mut line = String::new();
            let n = self.reader.read_line(&mut line)?;
            if n == 0 {
                self.eof = true;
                break;
            }
            bytes += line.len();
            self.lines.push_back(line);
        }
        Ok(())
    }

    fn peek_term(&mut self) -> Result<Option<String>, IndexError> {
        if self.lines.is_empty() && !self.eof {
            self.fill()?;
        }
        Ok(self
            .lines
            .front()
            .and_then(|line| line.split(' ').next())
            .map(str::to_string))
    }

    fn pop_posting(&mut self) -> Result<Option<(String, SkipList)>, IndexError> {
        if self.lines.is_empty() {
            self.fill()?;
            if self.lines.is_empty() {
                return Ok(None);
            }
        }
        let line = self.lines.pop_front().unwrap();
        let trimmed = line.trim_end_matches('\n');
        let (term, postings) = trimmed.split_once(' ').ok_or_else(|| {
            IndexError::CorruptDictionary(format!("malformed run line: {trimmed}"))
        })?;
        Ok(Some((term.to_string(), SkipList::from_string(postings)?)))
    }

    fn is_exhausted(&mut self) -> Result<bool, IndexError> {
        if self.lines.is_empty() && !self.eof {
            self.fill()?;
        }
        Ok(self.lines.is_empty() && self.eof)
    }
}

/// Coalesces equal-term pairs as they arrive (the merge loop guarantees
/// non-decreasing term order) and flushes to disk once its byte estimate
/// crosses the budget.
struct OutputBuffer<'w> {
    writer: &'w mut dyn Write,
    budget: usize,
    pairs: Vec<(String, SkipList)>,
    bytes: usize,
}

impl<'w> OutputBuffer<'w> {
    fn new(writer: &'w mut dyn Write, budget: usize) -> Self {
        OutputBuffer {
            writer,
            budget,
            pairs: Vec::new(),
            bytes: 0,
        }
    }

    fn insert(&mut self, pair: (String, SkipList)) -> Result<(), IndexError> {
        let added_bytes = pair.0.len() + pair.1.serialize().len();
        if let Some(last) = self.pairs.last_mut() {
            if last.0 == pair.0 {
                last.1 = last.1.merge(&pair.1);
                self.bytes += ID_BYTES_APPROX;
                if self.bytes >= self.budget {
                    self.flush()?;
                }
                return Ok(());
            }
        }
        self.pairs.push(pair);
        self.bytes += added_bytes;
        if self.bytes >= self.budget {
            self.flush()?;
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<(), IndexError> {
        for (term, list) in self.pairs.drain(..) {
            writeln!(self.writer, "{term} {}", list.serialize())?;
        }
        self.bytes = 0;
        Ok(())
    }
}

const ID_BYTES_APPROX: usize = 8;

fn list_numeric_files(dir: &Path) -> Result<Vec<PathBuf>, IndexError> {
    let mut files: Vec<(u64, PathBuf)> = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if let Some(name) = entry.file_name().to_str() {
            if let Ok(index) = name.parse::<u64>() {
                files.push((index, entry.path()));
            }
        }
    }
    files.sort_by_key(|(index, _)| *index);
    Ok(files.into_iter().map(|(_, path)| path).collect())
}

fn merge_chunk(files: &[PathBuf], output_path: &Path, budget: usize) -> Result<(), IndexError> {
    let mut inputs = files
        .iter()
        .map(|f| InputBuffer::open(f, budget))
        .collect::<Result<Vec<_>, _>>()?;

    let mut out_file = BufWriter::new(File::create(output_path)?);
    {
        let mut output = OutputBuffer::new(&mut out_file, budget);
        loop {
            let mut min_idx: Option<usize> = None;
            let mut min_term: Option<String> = None;
            for (i, input) in inputs.iter_mut().enumerate() {
                if input.is_exhausted()? {
                    continue;
                }
                if let Some(term) = input.peek_term()? {
                    let is_smaller = match &min_term {
                        None => true,
                        Some(current) => term < *current,
                    };
                    if is_smaller {
                        min_term = Some(term);
                        min_idx = Some(i);
                    }
                }
            }
            match min_idx {
                None => break,
                Some(i) => {
                    if let Some(pair) = inputs[i].pop_posting()? {
                        output.insert(pair)?;
                    }
                }
            }
        }
        output.flush()?;
    }
    out_file.flush()?;
    Ok(())
}

/// Repeatedly merges `fan_in` files at a time, promoting each pass's output
/// directory to be the next pass's input, until a single file remains.
/// Returns the path to that final file.
pub fn merge_runs(initial_dir: &Path, fan_in: usize, budget: usize) -> Result<PathBuf, IndexError> {
    let mut current_dir = initial_dir.to_path_buf();
    let mut pass = 0usize;

    loop {
        let files = list_numeric_files(&current_dir)?;
        if files.len() <= 1 {
            return files
                .into_iter()
                .next()
                .ok_or_else(|| IndexError::MissingInput("no run files produced".to_string()));
        }

        pass += 1;
        let next_dir = initial_dir
            .parent()
            .unwrap_or(initial_dir)
            .join(format!("merge-pass-{pass}"));
        fs::create_dir_all(&next_dir)?;

        let mut next_index = 0usize;
        for chunk in files.chunks(fan_in) {
            let out_path = next_dir.join(next_index.to_string());
            merge_chunk(chunk, &out_path, budget)?;
            next_index += 1;
        }
        current_dir = next_dir;
    }
}
