//! Query runner CLI: evaluates one boolean query per line against a built
//! index and writes one result line per query, in order.
//!
//! ```bash
//! search --dict ./dict.json --postings ./postings.txt --queries ./queries.txt --output ./results.txt
//! ```

use clap::Parser;
use skipdex::dictionary::Dictionary;
use skipdex::normalize::SimpleNormalizer;
use skipdex::query::resolve_query;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::process;

#[derive(Parser)]
#[command(name = "search", about = "Evaluate boolean queries against a built index", version)]
struct Args {
    /// Path to the dictionary file produced by `index`.
    #[arg(short, long)]
    dict: PathBuf,

    /// Path to the postings file produced by `index`.
    #[arg(short, long)]
    postings: PathBuf,

    /// Path to a file with one query per line.
    #[arg(short, long)]
    queries: PathBuf,

    /// Path to write one result line per query, in input order.
    #[arg(short, long)]
    output: PathBuf,
}

fn main() {
    let args = Args::parse();

    let mut dictionary = match Dictionary::open(&args.dict, &args.postings) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("search: {e}");
            process::exit(1);
        }
    };

    let queries = match fs::read_to_string(&args.queries) {
        Ok(contents) => contents,
        Err(e) => {
            eprintln!("search: failed to read queries file: {e}");
            process::exit(1);
        }
    };

    let output_file = match File::create(&args.output) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("search: failed to open output file: {e}");
            process::exit(1);
        }
    };
    let mut writer = BufWriter::new(output_file);
    let normalizer = SimpleNormalizer;

    for line in queries.lines() {
        let result = match resolve_query(line, &mut dictionary, &normalizer) {
            Ok(value) => value,
            Err(e) => {
                eprintln!("search: {e}");
                process::exit(1);
            }
        };
        if let Err(e) = writeln!(writer, "{result}") {
            eprintln!("search: failed to write result: {e}");
            process::exit(1);
        }
    }
}
