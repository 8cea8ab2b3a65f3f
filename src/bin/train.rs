//! Trains a word-vector model from a text corpus.

use std::collections::HashMap;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use log::error;

use word2vec::mmap::ReadMap;
use word2vec::settings::{TrainSettings, DEFAULT_END_OF_SENTENCE, DEFAULT_WORD_DELIMITERS};
use word2vec::trainer::TrainerShared;
use word2vec::vocab::Vocabulary;

#[derive(Parser)]
#[command(name = "w2v-train", about = "Train a word2vec-style word-vector model")]
struct Args {
    /// Training corpus file.
    #[arg(short = 'f', long = "train-file")]
    train_file: PathBuf,

    /// Output word-vector model file.
    #[arg(short = 'o', long = "model-file")]
    model_file: PathBuf,

    /// Optional stop-words file.
    #[arg(short = 'x', long = "stop-words-file")]
    stop_words_file: Option<PathBuf>,

    /// Word vector dimensionality.
    #[arg(short = 's', long = "size", default_value_t = 100)]
    size: u16,

    /// Max skip distance between words.
    #[arg(short = 'w', long = "window", default_value_t = 5)]
    window: u8,

    /// Sub-sampling threshold for frequent words.
    #[arg(short = 'l', long = "sample", default_value_t = 1e-3)]
    sample: f32,

    /// Use hierarchical softmax.
    #[arg(short = 'h', long = "with-hs", default_value_t = false)]
    with_hs: bool,

    /// Number of negative samples (0 disables negative sampling).
    #[arg(short = 'n', long = "negative", default_value_t = 5)]
    negative: u8,

    /// Number of training threads.
    #[arg(short = 't', long = "threads", default_value_t = 12)]
    threads: u8,

    /// Number of passes over the corpus.
    #[arg(short = 'i', long = "iter", default_value_t = 5)]
    iterations: u8,

    /// Minimum word frequency to keep.
    #[arg(short = 'm', long = "min-word-freq", default_value_t = 5)]
    min_word_freq: u64,

    /// Starting learning rate.
    #[arg(short = 'a', long = "alpha", default_value_t = 0.05)]
    alpha: f32,

    /// Use Skip-Gram instead of CBOW.
    #[arg(short = 'g', long = "with-skip-gram", default_value_t = false)]
    with_skip_gram: bool,

    /// Word delimiter characters.
    #[arg(short = 'd', long = "word-delimiters", default_value_t = DEFAULT_WORD_DELIMITERS.to_string())]
    word_delimiters: String,

    /// End-of-sentence characters (must be a subset of word delimiters).
    #[arg(short = 'e', long = "end-of-sentence", default_value_t = DEFAULT_END_OF_SENTENCE.to_string())]
    end_of_sentence: String,

    /// Show a progress bar.
    #[arg(short = 'v', long = "verbose", default_value_t = false)]
    verbose: bool,
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    let settings = TrainSettings {
        min_word_freq: args.min_word_freq,
        vector_size: args.size,
        window: args.window,
        sample_threshold: args.sample,
        use_hierarchical_softmax: args.with_hs,
        negative_samples: args.negative,
        threads: args.threads,
        iterations: args.iterations,
        initial_alpha: args.alpha,
        use_skip_gram: args.with_skip_gram,
        word_delimiters: args.word_delimiters,
        end_of_sentence_chars: args.end_of_sentence,
        ..TrainSettings::default()
    };

    let corpus = match ReadMap::open(&args.train_file) {
        Ok(m) => m,
        Err(e) => {
            error!("failed to open training file: {e}");
            return ExitCode::from(1);
        }
    };
    let stop_words = match args.stop_words_file.as_ref().map(ReadMap::open).transpose() {
        Ok(m) => m,
        Err(e) => {
            error!("failed to open stop-words file: {e}");
            return ExitCode::from(1);
        }
    };

    let bar = if args.verbose {
        let bar = ProgressBar::new(100);
        bar.set_style(
            ProgressStyle::with_template("{msg} [{bar:40}] {percent}%")
                .unwrap()
                .progress_chars("=> "),
        );
        Some(bar)
    } else {
        None
    };

    let vocab_progress: Option<Box<dyn Fn(f32) + Sync>> = bar.clone().map(|b| {
        let cb: Box<dyn Fn(f32) + Sync> = Box::new(move |pct: f32| b.set_position(pct as u64));
        cb
    });
    let vocabulary = Vocabulary::build(
        corpus.data(),
        stop_words.as_ref().map(ReadMap::data),
        &settings.word_delimiters,
        &settings.end_of_sentence_chars,
        settings.min_word_freq,
        vocab_progress.as_deref(),
        None,
    );

    if let Some(b) = &bar {
        b.set_message("training");
        b.set_position(0);
    }

    let train_bar = bar.clone();
    let progress_cb: Option<Box<dyn Fn(f32, f32) + Sync>> = train_bar.map(|b| {
        let cb: Box<dyn Fn(f32, f32) + Sync> = Box::new(move |_alpha: f32, pct: f32| b.set_position(pct as u64));
        cb
    });

    let shared = match TrainerShared::new(settings, vocabulary, corpus.data(), progress_cb) {
        Ok(s) => s,
        Err(e) => {
            error!("failed to initialize trainer: {e}");
            return ExitCode::from(2);
        }
    };
    shared.run();
    let vector_size = shared.vector_size();
    let vectors: HashMap<String, Vec<f32>> = shared.into_vectors();

    if let Some(b) = &bar {
        b.finish_with_message("done");
    }

    if let Err(e) = word2vec::model_store::save_word_model(&args.model_file, &vectors, vector_size) {
        error!("failed to save model: {e}");
        return ExitCode::from(3);
    }

    ExitCode::SUCCESS
}
