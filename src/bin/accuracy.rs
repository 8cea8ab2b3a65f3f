//! Analogy-style accuracy evaluation: given "a b c d", checks whether
//! `vector(b) - vector(a) + vector(c)` resolves to `d`.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::error;

use word2vec::doc_vector::similarity;
use word2vec::model_store::load_word_model;

#[derive(Parser)]
#[command(name = "w2v-accuracy", about = "Evaluate analogy accuracy of a word-vector model")]
struct Args {
    /// Path to a saved word-vector model.
    model_file: PathBuf,

    /// Path to a questions file: one "a b c d" analogy per line.
    questions_file: PathBuf,
}

fn nearest_excluding(model: &HashMap<String, Vec<f32>>, vector: &[f32], exclude: &[&str]) -> Option<String> {
    model
        .iter()
        .filter(|(w, _)| !exclude.contains(&w.as_str()))
        .map(|(w, v)| (w.clone(), similarity(vector, v)))
        .filter(|(_, s)| *s <= 0.9999)
        .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(w, _)| w)
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

    let questions = match fs::read_to_string(&args.questions_file) {
        Ok(s) => s,
        Err(e) => {
            error!("failed to read questions file: {e}");
            return ExitCode::from(1);
        }
    };

    let mut hits = 0usize;
    let mut total = 0usize;

    for line in questions.lines() {
        let words: Vec<&str> = line.split_whitespace().collect();
        if words.len() != 4 {
            continue;
        }
        let (a, b, c, d) = (words[0], words[1], words[2], words[3]);
        let (va, vb, vc) = match (model.get(a), model.get(b), model.get(c)) {
            (Some(va), Some(vb), Some(vc)) => (va, vb, vc),
            _ => continue,
        };

        let mut target = vec![0f32; dim as usize];
        for i in 0..dim as usize {
            target[i] = vb[i] - va[i] + vc[i];
        }

        total += 1;
        match nearest_excluding(&model, &target, &[a, b, c]) {
            Some(guess) if guess == d => {
                hits += 1;
                println!("OK    {a} {b} {c} {d}");
            }
            Some(guess) => println!("MISS  {a} {b} {c} {d} -> {guess}"),
            None => println!("MISS  {a} {b} {c} {d} -> <none>"),
        }
    }

    if total == 0 {
        println!("no answerable questions found");
    } else {
        println!("accuracy: {:.2}% ({hits}/{total})", hits as f32 / total as f32 * 100.0);
    }

    ExitCode::SUCCESS
}
