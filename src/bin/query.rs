//! Interactive nearest-word/nearest-document lookup over a trained model.

use std::collections::HashMap;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::error;

use word2vec::doc_vector::{compose, similarity};
use word2vec::model_store::load_word_model;
use word2vec::settings::DEFAULT_WORD_DELIMITERS;

#[derive(Parser)]
#[command(name = "w2v-query", about = "Interactively query nearest words/documents in a word-vector model")]
struct Args {
    /// Path to a saved word-vector model.
    model_file: PathBuf,

    /// Number of nearest entries to print.
    #[arg(short = 'n', long = "amount", default_value_t = 10)]
    amount: usize,
}

fn nearest_words(model: &HashMap<String, Vec<f32>>, vector: &[f32], amount: usize) -> Vec<(String, f32)> {
    let mut scored: Vec<(String, f32)> = model
        .iter()
        .map(|(w, v)| (w.clone(), similarity(vector, v)))
        .filter(|(_, s)| *s <= 0.9999)
        .collect();
    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    scored.truncate(amount);
    scored
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    let (model, dim) = match load_word_model(&args.model_file) {
        Ok(m) => m,
        Err(e) => {
            error!("failed to load model: {e}");
            return ExitCode::from(1);
        }
    };

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    println!("loaded {} words, vector size {dim}. type a word or short phrase, EXIT to quit.", model.len());

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(_) => break,
        };
        let query = line.trim();
        if query.eq_ignore_ascii_case("EXIT") {
            break;
        }
        if query.is_empty() {
            continue;
        }

        let vector = match compose(query, &model, dim, DEFAULT_WORD_DELIMITERS) {
            Ok(v) => v,
            Err(e) => {
                println!("{e}");
                continue;
            }
        };

        for (word, score) in nearest_words(&model, &vector, args.amount) {
            println!("{word:>20}  {score:.4}");
        }
        let _ = stdout.flush();
    }

    ExitCode::SUCCESS
}
