//! Boolean full-text retrieval core: skip-list postings, external merge-sort
//! indexing, and a document-frequency-optimized boolean query engine.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐     ┌───────────────────┐     ┌──────────────┐
//! │ normalize.rs │────▶│     build/         │────▶│ dictionary.rs│
//! │ (Normalizer) │     │ (IndexBuilder,     │     │ (Dictionary, │
//! │              │     │  run_merger)       │     │  PostingsStore)
//! └──────────────┘     └───────────────────┘     └──────┬───────┘
//!                                                        │
//!                       ┌───────────────────┐            │
//!                       │      query/        │◀──────────┘
//!                       │ (compiler,         │
//!                       │  evaluator)         │
//!                       └───────────────────┘
//! ```
//!
//! Indexing streams documents through [`build::IndexBuilder`] into
//! memory-bounded sorted run files, merges them with a leveled k-way
//! [`build::run_merger`] pass, and emits a [`dictionary::DictionaryFile`]
//! (term -> document frequency, postings offset) alongside a flat postings
//! file. Querying parses a boolean expression in [`query`], rewrites it by
//! ascending document frequency so cheap intersections run first, lowers it
//! to postfix, and evaluates it as a stack machine over [`skiplist::SkipList`].
//!
//! # Usage
//!
//! ```ignore
//! use skipdex::build::{run_build, BuildOptions};
//! use skipdex::dictionary::Dictionary;
//! use skipdex::normalize::SimpleNormalizer;
//! use skipdex::query::resolve_query;
//! use std::path::Path;
//!
//! run_build(
//!     Path::new("docs"),
//!     Path::new("dict.json"),
//!     Path::new("postings.txt"),
//!     &SimpleNormalizer,
//!     &BuildOptions::default(),
//! )?;
//!
//! let mut dictionary = Dictionary::open(Path::new("dict.json"), Path::new("postings.txt"))?;
//! let result = resolve_query("cat AND NOT dog", &mut dictionary, &SimpleNormalizer)?;
//! # Ok::<(), skipdex::error::IndexError>(())
//! ```

pub mod build;
pub mod dictionary;
pub mod error;
pub mod normalize;
pub mod query;
pub mod skiplist;

pub use dictionary::Dictionary;
pub use error::IndexError;
pub use query::resolve_query;
pub use skiplist::SkipList;
