//! Chunked decoding with per-word time offsets.
//!
//! The streaming decoder keeps its trie alive between `decode` calls, so
//! successive probability chunks continue the same beam. Frame offsets are
//! tracked per session and survive a reset on request, which lets a caller
//! stitch word timestamps across voice-activity segments.
//!
//! # Example
//!
//! ```rust,ignore
//! use ctc_decoders::{DecoderOptions, StreamingDecoder};
//!
//! let mut decoder = StreamingDecoder::new(vocab, DecoderOptions::new(16), None)?;
//! for chunk in chunks {
//!     let partial = decoder.decode(&chunk)?;
//!     println!("partial: {}", partial[0].text);
//! }
//! let words = decoder.word_timestamps();
//! decoder.reset(true, true);
//! ```

use std::sync::Arc;

use super::search::{attach_lexicon, beam_results, search_step};
use super::WordBoundary;
use crate::error::{DecoderError, DecoderResult};
use crate::scorer::Scorer;
use crate::trie::{NodeId, PathTrie};
use crate::{DecoderOptions, Hypothesis, WordTimestamp};

/// Stateful decoder for successive probability chunks of one audio stream.
///
/// Frames are `vocab.len()` wide with the blank as the last vocabulary
/// entry. The space id, when a literal `" "` entry exists, drives the
/// word-boundary rule for flat vocabularies.
pub struct StreamingDecoder {
    vocab: Vec<String>,
    opts: DecoderOptions,
    scorer: Option<Arc<dyn Scorer>>,
    boundary: WordBoundary,
    blank_id: usize,
    trie: PathTrie,
    prefixes: Vec<NodeId>,
    /// Frames carried over from sessions closed with `reset(true, ..)`.
    prev_time_offset: u32,
    /// Frames decoded so far in the current session.
    time_offset: u32,
    words: Vec<WordTimestamp>,
    prev_words: Vec<WordTimestamp>,
}

impl StreamingDecoder {
    /// Create a decoder over `vocab` whose last entry is the blank symbol.
    ///
    /// # Errors
    /// Returns [`DecoderError::InvalidParameter`] for out-of-range options or
    /// an empty vocabulary.
    pub fn new(
        vocab: Vec<String>,
        opts: DecoderOptions,
        scorer: Option<Arc<dyn Scorer>>,
    ) -> DecoderResult<Self> {
        opts.validate()?;
        if vocab.is_empty() {
            return Err(DecoderError::InvalidParameter("vocabulary is empty".into()));
        }
        let boundary = WordBoundary::from_vocab(&vocab);
        let blank_id = vocab.len() - 1;
        let mut decoder = Self {
            vocab,
            opts,
            scorer,
            boundary,
            blank_id,
            trie: PathTrie::new(),
            prefixes: Vec::new(),
            prev_time_offset: 0,
            time_offset: 0,
            words: Vec::new(),
            prev_words: Vec::new(),
        };
        decoder.rebuild_trie();
        Ok(decoder)
    }

    /// Override the inferred word-boundary convention.
    #[must_use]
    pub fn with_boundary(mut self, boundary: WordBoundary) -> Self {
        self.boundary = boundary;
        self
    }

    /// The word-boundary convention in effect.
    #[must_use]
    pub const fn boundary(&self) -> WordBoundary {
        self.boundary
    }

    /// Index of the blank symbol (the last vocabulary entry).
    #[must_use]
    pub const fn blank_id(&self) -> usize {
        self.blank_id
    }

    /// Decode one chunk of probability frames, continuing the current beam.
    ///
    /// Returns up to `beam_size` hypotheses for everything decoded in the
    /// session so far, best first.
    ///
    /// # Errors
    /// Returns [`DecoderError::Shape`] for a frame whose width is not the
    /// vocabulary size, before any frame of the chunk is consumed.
    pub fn decode(&mut self, probs: &[Vec<f32>]) -> DecoderResult<Vec<Hypothesis>> {
        let width = self.vocab.len();
        for (t, frame) in probs.iter().enumerate() {
            if frame.len() != width {
                return Err(DecoderError::Shape(format!(
                    "frame {t} has width {}, expected {width}",
                    frame.len()
                )));
            }
        }
        crate::trace_event!(
            "streaming chunk of {} frames at offset {}",
            probs.len(),
            self.prev_time_offset + self.time_offset
        );

        for (t, frame) in probs.iter().enumerate() {
            let offset = self.prev_time_offset + self.time_offset + t as u32;
            search_step(
                &mut self.trie,
                &mut self.prefixes,
                frame,
                &self.vocab,
                self.blank_id,
                self.boundary,
                &self.opts,
                self.scorer.as_deref(),
                true,
                Some(offset),
            );
        }
        self.time_offset += probs.len() as u32;

        let Self {
            trie,
            prefixes,
            vocab,
            opts,
            boundary,
            ..
        } = &mut *self;
        let m = prefixes.len().min(opts.beam_size);
        prefixes[..m].sort_unstable_by(|&a, &b| trie.prefix_order(a, b));
        let (hypotheses, words) =
            beam_results(trie, prefixes, vocab, *boundary, opts.beam_size, true);
        self.words = words;
        Ok(hypotheses)
    }

    /// Discard the beam and start a new session.
    ///
    /// With `keep_offset`, the frames decoded so far stay on the session
    /// clock, so offsets recorded after the reset continue where the previous
    /// session stopped; otherwise the clock returns to zero. With
    /// `keep_words`, the previous session's word list is kept and later
    /// `word_timestamps` calls prepend it; otherwise the carried list is
    /// cleared too.
    pub fn reset(&mut self, keep_offset: bool, keep_words: bool) {
        self.rebuild_trie();
        if keep_offset {
            self.prev_time_offset += self.time_offset;
        } else {
            self.prev_time_offset = 0;
        }
        self.time_offset = 0;
        if keep_words {
            let mut words = std::mem::take(&mut self.words);
            self.prev_words.append(&mut words);
        } else {
            self.prev_words.clear();
            self.words.clear();
        }
    }

    /// Word timestamps of the best hypothesis, carried words first.
    #[must_use]
    pub fn word_timestamps(&self) -> Vec<WordTimestamp> {
        self.prev_words
            .iter()
            .chain(self.words.iter())
            .cloned()
            .collect()
    }

    fn rebuild_trie(&mut self) {
        let mut trie = PathTrie::new();
        attach_lexicon(&mut trie, self.scorer.as_deref());
        self.prefixes = vec![trie.root()];
        self.trie = trie;
    }
}
