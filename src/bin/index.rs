//! Index builder CLI: reads a directory of documents and writes a
//! dictionary + postings file pair.
//!
//! ```bash
//! index --input ./docs --dict ./dict.json --postings ./postings.txt
//! ```

use clap::Parser;
use skipdex::build::{run_build, BuildOptions};
use skipdex::normalize::SimpleNormalizer;
use std::path::PathBuf;
use std::process;

#[derive(Parser)]
#[command(name = "index", about = "Build a boolean retrieval index from a document directory", version)]
struct Args {
    /// Directory containing one file per document, named by its numeric document id.
    #[arg(short, long)]
    input: PathBuf,

    /// Output path for the dictionary file (JSON).
    #[arg(short, long)]
    dict: PathBuf,

    /// Output path for the postings file.
    #[arg(short, long)]
    postings: PathBuf,

    /// Approximate in-memory bytes the builder accumulates before flushing a run.
    #[arg(long, default_value_t = 500_000)]
    memory_budget: usize,

    /// Number of run files merged together per pass.
    #[arg(long, default_value_t = 3)]
    fan_in: usize,

    /// Working directory for intermediate run files. Removed before the
    /// build starts and after it finishes successfully.
    #[arg(long, default_value = "temp")]
    work_dir: PathBuf,
}

fn main() {
    let args = Args::parse();
    let options = BuildOptions {
        memory_budget: args.memory_budget,
        fan_in: args.fan_in,
        work_dir: args.work_dir,
    };

    if let Err(e) = run_build(&args.input, &args.dict, &args.postings, &SimpleNormalizer, &options) {
        eprintln!("index: {e}");
        process::exit(1);
    }
}
