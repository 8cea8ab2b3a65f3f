//! Word-by-word tokenizer over a borrowed byte span.
//!
//! Mirrors the classic mapped-file word reader: delimiters collapse, a sentence
//! boundary emits exactly one empty-word marker per run, and words longer than
//! `max_word_len` are silently truncated.

const DEFAULT_MAX_WORD_LEN: usize = 100;

pub struct WordReader<'a> {
    data: &'a [u8],
    word_delimiters: &'a str,
    end_of_sentence_chars: &'a str,
    max_word_len: usize,
    offset: usize,
    start_from: usize,
    stop_at: usize,
    prev_eos: bool,
}

impl<'a> WordReader<'a> {
    /// Builds a reader over `data[offset..=stop_at]`. `stop_at == 0` means "to the end".
    ///
    /// Panics if `offset` or `stop_at` are out of bounds, matching the reference
    /// constructor's `std::range_error`.
    pub fn new(
        data: &'a [u8],
        word_delimiters: &'a str,
        end_of_sentence_chars: &'a str,
        offset: usize,
        stop_at: usize,
        max_word_len: usize,
    ) -> Self {
        let stop_at = if stop_at == 0 {
            data.len().saturating_sub(1)
        } else {
            stop_at
        };
        assert!(stop_at < data.len(), "WordReader: bounds are out of the data size");
        assert!(offset <= stop_at, "WordReader: offset is out of the bounds");
        WordReader {
            data,
            word_delimiters,
            end_of_sentence_chars,
            max_word_len,
            offset,
            start_from: offset,
            stop_at,
            prev_eos: false,
        }
    }

    /// Convenience constructor using the default max word length (100).
    pub fn with_defaults(
        data: &'a [u8],
        word_delimiters: &'a str,
        end_of_sentence_chars: &'a str,
        offset: usize,
        stop_at: usize,
    ) -> Self {
        Self::new(
            data,
            word_delimiters,
            end_of_sentence_chars,
            offset,
            stop_at,
            DEFAULT_MAX_WORD_LEN,
        )
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn reset(&mut self) {
        self.offset = self.start_from;
        self.prev_eos = false;
    }

    /// Returns the next word, or `None` at end of the requested range.
    /// An empty string signals a sentence boundary.
    pub fn next_word(&mut self) -> Option<String> {
        let mut word = Vec::with_capacity(self.max_word_len.min(32));

        while self.offset <= self.stop_at {
            let ch = self.data[self.offset] as char;
            self.offset += 1;

            if self.word_delimiters.contains(ch) {
                if self.end_of_sentence_chars.contains(ch) {
                    if !word.is_empty() {
                        self.offset -= 1;
                        self.prev_eos = false;
                        break;
                    } else if !self.prev_eos {
                        self.prev_eos = true;
                        return Some(String::new());
                    } else {
                        continue;
                    }
                }
                if !word.is_empty() {
                    self.prev_eos = false;
                    break;
                } else {
                    continue;
                }
            }

            if word.len() < self.max_word_len {
                word.push(ch as u8);
            }
        }

        if !word.is_empty() {
            return Some(String::from_utf8_lossy(&word).into_owned());
        }

        None
    }
}

impl<'a> Iterator for WordReader<'a> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        self.next_word()
    }
}
