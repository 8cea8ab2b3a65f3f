//! Training parameters. Defaults mirror the long-standing reference implementation
//! this trainer's algorithms are modeled on.

/// Delimiter set used to split raw corpus bytes into words.
pub const DEFAULT_WORD_DELIMITERS: &str = " \n,.-!?:;/\"#$%&'()*+<=>@[]\\^_`{|}~\t\x0b\x0c\r";
/// Subset of `DEFAULT_WORD_DELIMITERS` that additionally marks a sentence boundary.
pub const DEFAULT_END_OF_SENTENCE: &str = ".\n?!";

#[derive(Debug, Clone)]
pub struct TrainSettings {
    /// Discard words seen fewer than this many times.
    pub min_word_freq: u64,
    /// Size of a trained word vector.
    pub vector_size: u16,
    /// Max skip distance between the target word and a context word.
    pub window: u8,
    /// Number of entries in the precomputed sigmoid lookup table.
    pub sigmoid_table_size: u32,
    /// The table covers `[-sigmoid_domain, +sigmoid_domain]`.
    pub sigmoid_domain: f32,
    /// Sub-sampling threshold for frequent words; 0 disables sub-sampling.
    pub sample_threshold: f32,
    /// Use hierarchical softmax instead of (or in addition to) negative sampling.
    pub use_hierarchical_softmax: bool,
    /// Number of negative samples per positive example; 0 disables negative sampling.
    pub negative_samples: u8,
    /// Number of worker threads.
    pub threads: u8,
    /// Number of passes over the corpus.
    pub iterations: u8,
    /// Starting learning rate.
    pub initial_alpha: f32,
    /// Use Skip-Gram instead of CBOW.
    pub use_skip_gram: bool,
    pub word_delimiters: String,
    pub end_of_sentence_chars: String,
}

impl Default for TrainSettings {
    fn default() -> Self {
        TrainSettings {
            min_word_freq: 5,
            vector_size: 100,
            window: 5,
            sigmoid_table_size: 1000,
            sigmoid_domain: 6.0,
            sample_threshold: 1e-3,
            use_hierarchical_softmax: false,
            negative_samples: 5,
            threads: 12,
            iterations: 5,
            initial_alpha: 0.05,
            use_skip_gram: false,
            word_delimiters: DEFAULT_WORD_DELIMITERS.to_string(),
            end_of_sentence_chars: DEFAULT_END_OF_SENTENCE.to_string(),
        }
    }
}
