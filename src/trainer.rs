//! The multithreaded SGD trainer: CBOW/Skip-Gram crossed with Hierarchical
//! Softmax/Negative Sampling, mutating a single shared embedding matrix with
//! no per-update synchronization (Hogwild).
//!
//! Concurrent writes to `SharedMatrix` are intentionally racy. Convergence of
//! this scheme is an empirical property of sparse per-sample updates, not a
//! correctness property enforced by the type system; do not add locking here.

use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::down_sample::DownSampler;
use crate::error::Result;
use crate::huffman::HuffmanTree;
use crate::neg_sample::NegSampleDist;
use crate::settings::TrainSettings;
use crate::sigmoid::SigmoidTable;
use crate::vocab::{Vocabulary, WordEntry};
use crate::word_reader::WordReader;

const MAX_SENTENCE_LENGTH: usize = 1024;

/// A flat `rows x row_len` matrix of `f32`, shared across worker threads via
/// raw pointer aliasing instead of a lock. Reads and writes from different
/// threads to overlapping rows are not synchronized with each other.
struct SharedMatrix {
    data: UnsafeCell<Box<[f32]>>,
    row_len: usize,
}

unsafe impl Sync for SharedMatrix {}

impl SharedMatrix {
    fn zeros(rows: usize, row_len: usize) -> Self {
        SharedMatrix {
            data: UnsafeCell::new(vec![0f32; rows * row_len].into_boxed_slice()),
            row_len,
        }
    }

    fn uniform(rows: usize, row_len: usize, low: f32, high: f32, rng: &mut impl Rng) -> Self {
        let data: Vec<f32> = (0..rows * row_len).map(|_| rng.gen_range(low..high)).collect();
        SharedMatrix {
            data: UnsafeCell::new(data.into_boxed_slice()),
            row_len,
        }
    }

    /// Read-only view of a row. Racy with concurrent writers; values may be torn.
    fn row(&self, index: usize) -> &[f32] {
        unsafe {
            let base = (*self.data.get()).as_ptr().add(index * self.row_len);
            std::slice::from_raw_parts(base, self.row_len)
        }
    }

    /// Mutable view of a row with no cross-thread synchronization.
    #[allow(clippy::mut_from_ref)]
    fn row_mut(&self, index: usize) -> &mut [f32] {
        unsafe {
            let base = (*self.data.get()).as_mut_ptr().add(index * self.row_len);
            std::slice::from_raw_parts_mut(base, self.row_len)
        }
    }

    fn into_inner(self) -> Box<[f32]> {
        self.data.into_inner()
    }
}

/// All state shared by every worker thread: settings, vocabulary, the
/// Huffman tree and/or negative-sampling distribution, the sigmoid table, the
/// embedding matrices, and the training-progress counters.
pub struct TrainerShared<'a> {
    settings: TrainSettings,
    vocabulary: Vocabulary,
    corpus: &'a [u8],
    huffman: Option<HuffmanTree>,
    neg_sample: Option<NegSampleDist>,
    sigmoid: SigmoidTable,
    input_layer: SharedMatrix,
    output_layer: SharedMatrix,
    processed_words: AtomicU64,
    alpha_bits: AtomicU32,
    progress_callback: Option<Box<dyn Fn(f32, f32) + Sync + 'a>>,
}

impl<'a> TrainerShared<'a> {
    pub fn new(
        settings: TrainSettings,
        vocabulary: Vocabulary,
        corpus: &'a [u8],
        progress_callback: Option<Box<dyn Fn(f32, f32) + Sync + 'a>>,
    ) -> Result<Self> {
        let huffman = if settings.use_hierarchical_softmax {
            Some(HuffmanTree::build(vocabulary.frequencies()))
        } else {
            None
        };
        let neg_sample = if settings.negative_samples > 0 {
            Some(NegSampleDist::build(vocabulary.frequencies())?)
        } else {
            None
        };

        let vector_size = settings.vector_size as usize;
        let vocab_size = vocabulary.size();
        let sigmoid = SigmoidTable::build(settings.sigmoid_table_size, settings.sigmoid_domain);

        let mut init_rng = StdRng::seed_from_u64(0x5EED_1234);
        let input_layer = SharedMatrix::uniform(vocab_size, vector_size, -0.005, 0.005, &mut init_rng);
        let output_layer = SharedMatrix::zeros(vocab_size, vector_size);

        Ok(TrainerShared {
            settings,
            vocabulary,
            corpus,
            huffman,
            neg_sample,
            sigmoid,
            input_layer,
            output_layer,
            processed_words: AtomicU64::new(0),
            alpha_bits: AtomicU32::new(0.0f32.to_bits()),
            progress_callback,
        })
    }

    fn alpha(&self) -> f32 {
        f32::from_bits(self.alpha_bits.load(Ordering::Relaxed))
    }

    fn set_alpha(&self, value: f32) {
        self.alpha_bits.store(value.to_bits(), Ordering::Relaxed);
    }

    /// Spawns `settings.threads` workers over disjoint byte ranges of the
    /// corpus, runs all training epochs, and joins.
    pub fn run(&self) {
        self.set_alpha(self.settings.initial_alpha);
        let threads = self.settings.threads.max(1);
        info!("starting training with {threads} threads");
        std::thread::scope(|scope| {
            for id in 0..threads {
                scope.spawn(move || self.run_worker(id));
            }
        });
        info!("training complete");
    }

    /// Copies every vocabulary word's row out of the (now-finished) input
    /// layer. The output layer is discarded.
    pub fn into_vectors(self) -> std::collections::HashMap<String, Vec<f32>> {
        let vector_size = self.settings.vector_size as usize;
        let words = self.vocabulary.words().to_vec();
        let data = self.input_layer.into_inner();
        let mut map = std::collections::HashMap::with_capacity(words.len());
        for (index, word) in words.into_iter().enumerate() {
            let start = index * vector_size;
            map.insert(word, data[start..start + vector_size].to_vec());
        }
        map
    }

    pub fn vector_size(&self) -> u16 {
        self.settings.vector_size
    }

    fn run_worker(&self, id: u8) {
        let threads = self.settings.threads as u64;
        let size = self.corpus.len() as u64;
        let shift = (size / threads).max(1);
        let start = (shift * id as u64).min(size.saturating_sub(1));
        let stop = if id as u64 + 1 == threads {
            size.saturating_sub(1)
        } else {
            (shift * (id as u64 + 1)).min(size.saturating_sub(1))
        };

        let mut rng = StdRng::seed_from_u64(0xC0FFEE_0000 ^ id as u64);
        let down_sampler = DownSampler::new(self.settings.sample_threshold, self.vocabulary.train_words());
        let mut reader = WordReader::with_defaults(
            self.corpus,
            &self.settings.word_delimiters,
            &self.settings.end_of_sentence_chars,
            start as usize,
            stop as usize,
        );

        let vector_size = self.settings.vector_size as usize;
        let mut hidden = vec![0f32; vector_size];
        let mut error = vec![0f32; vector_size];
        let mut sentence: Vec<WordEntry> = Vec::with_capacity(MAX_SENTENCE_LENGTH);

        let words_per_alpha_update =
            (self.settings.iterations as u64 * self.vocabulary.train_words() / 10_000).max(1);
        let mut local_processed: u64 = 0;

        for _epoch in 0..self.settings.iterations {
            reader.reset();
            sentence.clear();
            while let Some(word) = reader.next_word() {
                if word.is_empty() {
                    if !sentence.is_empty() {
                        self.train_sentence(&sentence, &mut hidden, &mut error, &mut rng);
                        sentence.clear();
                    }
                    continue;
                }
                let entry = match self.vocabulary.lookup(&word) {
                    Some(e) => e,
                    None => continue,
                };
                local_processed += 1;
                if local_processed >= words_per_alpha_update {
                    self.update_progress(local_processed);
                    local_processed = 0;
                }
                if down_sampler.should_skip(entry.frequency, &mut rng) {
                    continue;
                }
                sentence.push(entry);
                if sentence.len() >= MAX_SENTENCE_LENGTH {
                    self.train_sentence(&sentence, &mut hidden, &mut error, &mut rng);
                    sentence.clear();
                }
            }
            if !sentence.is_empty() {
                self.train_sentence(&sentence, &mut hidden, &mut error, &mut rng);
                sentence.clear();
            }
        }
        if local_processed > 0 {
            self.update_progress(local_processed);
        }
        debug!("worker {id} finished byte range [{start}, {stop}]");
    }

    fn update_progress(&self, delta: u64) {
        let total = self.processed_words.fetch_add(delta, Ordering::Relaxed) + delta;
        let target = self.settings.iterations as u64 * self.vocabulary.train_words();
        let ratio = total as f32 / (target as f32 + 1.0);
        let new_alpha = (self.settings.initial_alpha * (1.0 - ratio)).max(self.settings.initial_alpha * 0.0001);
        self.set_alpha(new_alpha);
        if let Some(cb) = &self.progress_callback {
            cb(new_alpha, ratio * 100.0);
        }
    }

    fn train_sentence(&self, sentence: &[WordEntry], hidden: &mut [f32], error: &mut [f32], rng: &mut StdRng) {
        if self.settings.use_skip_gram {
            self.skip_gram(sentence, error, rng);
        } else {
            self.cbow(sentence, hidden, error, rng);
        }
    }

    fn context_positions(&self, sentence_len: usize, i: usize, rng: &mut StdRng) -> Vec<usize> {
        let window = self.settings.window as usize;
        let b = rng.gen_range(0..window.max(1));
        let mut positions = Vec::with_capacity(2 * window);
        for j in b..(2 * window + 1 - b) {
            if j == window {
                continue;
            }
            let pos = i as isize - window as isize + j as isize;
            if pos >= 0 && (pos as usize) < sentence_len {
                positions.push(pos as usize);
            }
        }
        positions
    }

    fn cbow(&self, sentence: &[WordEntry], hidden: &mut [f32], error: &mut [f32], rng: &mut StdRng) {
        for i in 0..sentence.len() {
            let context = self.context_positions(sentence.len(), i, rng);
            if context.is_empty() {
                continue;
            }
            hidden.fill(0.0);
            error.fill(0.0);
            for &pos in &context {
                let row = self.input_layer.row(sentence[pos].index);
                for (h, v) in hidden.iter_mut().zip(row) {
                    *h += v;
                }
            }
            let inv = 1.0 / context.len() as f32;
            for h in hidden.iter_mut() {
                *h *= inv;
            }

            let target = sentence[i].index;
            if self.settings.use_hierarchical_softmax {
                self.hierarchical_softmax(target, hidden, error);
            } else if self.settings.negative_samples > 0 {
                self.negative_sampling(target, hidden, error, rng);
            }

            for &pos in &context {
                let row = self.input_layer.row_mut(sentence[pos].index);
                for (r, e) in row.iter_mut().zip(error.iter()) {
                    *r += e;
                }
            }
        }
    }

    fn skip_gram(&self, sentence: &[WordEntry], error: &mut [f32], rng: &mut StdRng) {
        for i in 0..sentence.len() {
            let context = self.context_positions(sentence.len(), i, rng);
            let target = sentence[i].index;
            for &pos in &context {
                let ctx_index = sentence[pos].index;
                error.fill(0.0);
                // `hidden` aliases the row we update below; read it in full
                // before any write lands so the computed gradient reflects
                // its pre-update value.
                let hidden: Vec<f32> = self.input_layer.row(ctx_index).to_vec();

                if self.settings.use_hierarchical_softmax {
                    self.hierarchical_softmax(target, &hidden, error);
                } else if self.settings.negative_samples > 0 {
                    self.negative_sampling(target, &hidden, error, rng);
                }

                let row = self.input_layer.row_mut(ctx_index);
                for (r, e) in row.iter_mut().zip(error.iter()) {
                    *r += e;
                }
            }
        }
    }

    fn hierarchical_softmax(&self, target: usize, hidden: &[f32], error: &mut [f32]) {
        let huffman = self.huffman.as_ref().expect("hierarchical softmax requires a Huffman tree");
        let data = match huffman.huffman_data(target) {
            Some(d) => d,
            None => return,
        };
        let alpha = self.alpha();
        let domain = self.sigmoid.domain();

        for d in 0..data.code.len() {
            let node = data.points[d];
            let out_row = self.output_layer.row(node);
            let f: f32 = hidden.iter().zip(out_row).map(|(h, o)| h * o).sum();
            if f < -domain || f > domain {
                continue;
            }
            let sigmoid = self.sigmoid.lookup(f);
            let bit = if data.code[d] { 1.0 } else { 0.0 };
            let gradient = (1.0 - bit - sigmoid) * alpha;

            let out_row = self.output_layer.row_mut(node);
            for j in 0..hidden.len() {
                error[j] += gradient * out_row[j];
                out_row[j] += gradient * hidden[j];
            }
        }
    }

    fn negative_sampling(&self, target: usize, hidden: &[f32], error: &mut [f32], rng: &mut StdRng) {
        let neg_sample = self.neg_sample.as_ref().expect("negative sampling requires a distribution");
        let alpha = self.alpha();
        let domain = self.sigmoid.domain();

        for k in 0..=self.settings.negative_samples {
            let (word_index, label) = if k == 0 {
                (target, 1.0f32)
            } else {
                let candidate = neg_sample.sample(rng);
                if candidate == target {
                    continue;
                }
                (candidate, 0.0f32)
            };

            let out_row = self.output_layer.row(word_index);
            let f: f32 = hidden.iter().zip(out_row).map(|(h, o)| h * o).sum();
            let sigmoid = if f < -domain {
                0.0
            } else if f > domain {
                1.0
            } else {
                self.sigmoid.lookup(f)
            };
            let gradient = (label - sigmoid) * alpha;

            let out_row = self.output_layer.row_mut(word_index);
            for j in 0..hidden.len() {
                error[j] += gradient * out_row[j];
                out_row[j] += gradient * hidden[j];
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(window: u8, skip_gram: bool, hs: bool, negative: u8) -> TrainSettings {
        TrainSettings {
            min_word_freq: 1,
            vector_size: 8,
            window,
            threads: 1,
            iterations: 3,
            use_skip_gram: skip_gram,
            use_hierarchical_softmax: hs,
            negative_samples: negative,
            ..TrainSettings::default()
        }
    }

    #[test]
    fn cbow_ns_trains_finite_vectors_and_separates_words() {
        let corpus = b"a b a b a b a b\n";
        let s = settings(1, false, false, 2);
        let vocab = Vocabulary::build(corpus, None, &s.word_delimiters, &s.end_of_sentence_chars, s.min_word_freq, None, None);
        assert_eq!(vocab.size(), 3);
        let shared = TrainerShared::new(s, vocab, corpus, None).unwrap();
        shared.run();
        let vectors = shared.into_vectors();
        for v in vectors.values() {
            for x in v {
                assert!(x.is_finite());
            }
        }
    }

    #[test]
    fn skip_gram_hs_runs_without_negative_sampling() {
        let corpus = b"x y z x y z x y z\n";
        let s = settings(2, true, true, 0);
        let vocab = Vocabulary::build(corpus, None, &s.word_delimiters, &s.end_of_sentence_chars, s.min_word_freq, None, None);
        let shared = TrainerShared::new(s, vocab, corpus, None).unwrap();
        shared.run();
        let vectors = shared.into_vectors();
        assert!(!vectors.is_empty());
    }

    #[test]
    fn no_algorithm_selected_trains_as_a_no_op() {
        let corpus = b"a b a b a b a b\n";
        let s = settings(1, false, false, 0);
        let vocab = Vocabulary::build(corpus, None, &s.word_delimiters, &s.end_of_sentence_chars, s.min_word_freq, None, None);
        let vector_size = s.vector_size as usize;
        let indices: Vec<(String, usize)> = vocab.words().iter().map(|w| (w.clone(), vocab.lookup(w).unwrap().index)).collect();

        let shared = TrainerShared::new(s, vocab, corpus, None).unwrap();
        assert!(shared.huffman.is_none());
        assert!(shared.neg_sample.is_none());

        let mut init_rng = StdRng::seed_from_u64(0x5EED_1234);
        let expected_init = SharedMatrix::uniform(indices.len(), vector_size, -0.005, 0.005, &mut init_rng).into_inner();

        shared.run();
        let vectors = shared.into_vectors();

        for (word, index) in &indices {
            let start = index * vector_size;
            assert_eq!(&vectors[word], &expected_init[start..start + vector_size]);
        }
    }
}
