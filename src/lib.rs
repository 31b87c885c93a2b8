//! # ctc-decoders
//!
//! Prefix beam search over the output of a CTC acoustic model.
//!
//! ## Overview
//!
//! The input is a time-indexed matrix of per-symbol probabilities; the output
//! is the top-K most likely transcriptions, optionally re-ranked by an
//! external language-model scorer (shallow fusion) and constrained by a
//! lexicon automaton. Hypothesis prefixes live in a shared trie that carries
//! the blank/non-blank dynamic-programming state per prefix and is compacted
//! to the beam width at every frame boundary.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use ctc_decoders::{decode, DecoderOptions};
//!
//! let vocab: Vec<String> = ["a", "b", " "].map(String::from).to_vec();
//! let results = decode(&probs, &vocab, &DecoderOptions::default(), None)?;
//! println!("{}", results[0].text);
//! ```
//!
//! ## Features
//!
//! - `parallel` (default): batch decoding across a rayon worker pool
//! - `tracing`: emit tracing spans/events from the decode entry points

#![warn(missing_docs)]
#![deny(clippy::unwrap_used)]

pub mod decoder;
pub mod error;
pub mod lexicon;
pub mod math;
pub mod scorer;
pub mod text;
pub mod trace;
pub mod trie;

pub use decoder::{decode, decode_batch, StreamingDecoder, WordBoundary};
pub use error::{DecoderError, DecoderResult};
pub use lexicon::{Lexicon, LexiconMatcher};
pub use scorer::Scorer;
pub use trie::{NodeId, PathTrie, ROOT_SYMBOL};

/// Reserved unknown/padding token, elided from rendered transcripts.
pub const UNKNOWN_TOKEN: &str = "<unk>";

/// Marker carried by word-initial tokens in sentencepiece-style vocabularies.
pub const WORD_START_MARKER: &str = "\u{2581}";

/// Prefix marking sub-word continuation tokens in the lexicon alphabet.
pub const SUBWORD_PREFIX: &str = "##";

/// Options controlling beam width and per-frame symbol pruning.
#[derive(Debug, Clone, PartialEq)]
pub struct DecoderOptions {
    /// Number of prefixes retained across each frame boundary.
    pub beam_size: usize,
    /// Cumulative-probability cap for per-frame symbol pruning, in `(0, 1]`.
    pub cutoff_prob: f32,
    /// Hard cap on the number of symbols expanded per frame.
    pub cutoff_top_n: usize,
}

impl Default for DecoderOptions {
    fn default() -> Self {
        Self {
            beam_size: 32,
            cutoff_prob: 1.0,
            cutoff_top_n: 40,
        }
    }
}

impl DecoderOptions {
    /// Create options with the given beam width and default pruning.
    #[must_use]
    pub const fn new(beam_size: usize) -> Self {
        Self {
            beam_size,
            cutoff_prob: 1.0,
            cutoff_top_n: 40,
        }
    }

    /// Set the cumulative-probability pruning cap.
    #[must_use]
    pub const fn with_cutoff_prob(mut self, cutoff_prob: f32) -> Self {
        self.cutoff_prob = cutoff_prob;
        self
    }

    /// Set the hard cap on symbols expanded per frame.
    #[must_use]
    pub const fn with_cutoff_top_n(mut self, cutoff_top_n: usize) -> Self {
        self.cutoff_top_n = cutoff_top_n;
        self
    }

    /// Check that every field is in range.
    ///
    /// # Errors
    /// Returns [`DecoderError::InvalidParameter`] for a zero beam width, a
    /// pruning cap outside `(0, 1]`, or a zero symbol cap.
    pub fn validate(&self) -> DecoderResult<()> {
        if self.beam_size == 0 {
            return Err(DecoderError::InvalidParameter(
                "beam_size must be positive".into(),
            ));
        }
        if !(self.cutoff_prob > 0.0 && self.cutoff_prob <= 1.0) {
            return Err(DecoderError::InvalidParameter(format!(
                "cutoff_prob must be in (0, 1], got {}",
                self.cutoff_prob
            )));
        }
        if self.cutoff_top_n == 0 {
            return Err(DecoderError::InvalidParameter(
                "cutoff_top_n must be positive".into(),
            ));
        }
        Ok(())
    }
}

/// One decoded transcription candidate.
#[derive(Debug, Clone, PartialEq)]
pub struct Hypothesis {
    /// Fused log-probability used for ranking.
    pub score: f32,
    /// Score with the language-model and word-insertion contributions
    /// removed; equals `score` when no scorer took part. Reported as a
    /// confidence, never used as a sort key.
    pub approx_ctc: f32,
    /// Rendered transcript.
    pub text: String,
}

/// A rendered word with the frame offsets bounding it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordTimestamp {
    /// The word text.
    pub word: String,
    /// Frame index at which the word starts.
    pub start: u32,
    /// Frame index at which the word ends.
    pub end: u32,
}
