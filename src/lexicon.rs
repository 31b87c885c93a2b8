//! Lexicon automaton restricting beam expansion to in-vocabulary words.
//!
//! The lexicon is a finite-state acceptor over token labels. Input label 0 is
//! reserved for epsilon, so vocabulary symbol `s` travels as label `s + 1`.
//! The automaton itself is immutable once decoding starts and shared across
//! decoders behind an [`Arc`]; [`LexiconMatcher`] is the positional cursor a
//! single decoder drives while prefixes grow, and carries mutable state, so
//! every decoder gets its own.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use rustfst::fst_impls::VectorFst;
use rustfst::prelude::*;
use rustfst::semirings::{Semiring, TropicalWeight};

use crate::error::{DecoderError, DecoderResult};
use crate::{SUBWORD_PREFIX, UNKNOWN_TOKEN, WORD_START_MARKER};

/// Acceptor over `symbol_index + 1` input labels.
#[derive(Clone)]
pub struct Lexicon {
    fst: Arc<VectorFst<TropicalWeight>>,
}

impl Lexicon {
    /// Create an empty lexicon.
    #[must_use]
    pub fn new() -> Self {
        Self {
            fst: Arc::new(VectorFst::new()),
        }
    }

    /// Number of states in the automaton.
    #[must_use]
    pub fn num_states(&self) -> usize {
        self.fst.num_states()
    }

    /// True when no word has been added yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fst.num_states() == 0
    }

    /// Start state, present once any word has been added.
    #[must_use]
    pub fn start(&self) -> Option<StateId> {
        self.fst.start()
    }

    /// Add one word, spelled as `symbol_index + 1` labels.
    ///
    /// Spellings share prefixes with previously added words, keeping the
    /// automaton deterministic. An empty spelling is ignored.
    ///
    /// # Errors
    /// Returns [`DecoderError::Lexicon`] if the underlying automaton rejects
    /// a state or arc operation.
    pub fn add_word(&mut self, labels: &[Label]) -> DecoderResult<()> {
        if labels.is_empty() {
            return Ok(());
        }
        let fst = Arc::make_mut(&mut self.fst);
        if fst.num_states() == 0 {
            let start = fst.add_state();
            fst.set_start(start).map_err(fst_err)?;
        }
        let mut src = match fst.start() {
            Some(s) => s,
            None => return Err(DecoderError::Lexicon("automaton has no start state".into())),
        };
        for &label in labels {
            let existing = fst
                .get_trs(src)
                .map_err(fst_err)?
                .trs()
                .iter()
                .find(|tr| tr.ilabel == label)
                .map(|tr| tr.nextstate);
            src = match existing {
                Some(next) => next,
                None => {
                    let dst = fst.add_state();
                    fst.add_tr(src, Tr::new(label, label, TropicalWeight::one(), dst))
                        .map_err(fst_err)?;
                    dst
                }
            };
        }
        fst.set_final(src, TropicalWeight::one()).map_err(fst_err)?;
        Ok(())
    }

    /// Map a tokenized word through `token_map` and add its spelling.
    ///
    /// The reserved unknown token passes through unchanged; a token carrying
    /// the word-start marker has the marker stripped; any other token gains
    /// the `##` continuation prefix. Returns `false`, leaving the automaton
    /// unmodified, when any mapped token is missing from `token_map`.
    ///
    /// # Errors
    /// Returns [`DecoderError::Lexicon`] if adding the spelling fails.
    pub fn add_tokenized_word(
        &mut self,
        tokens: &[String],
        token_map: &HashMap<String, Label>,
    ) -> DecoderResult<bool> {
        let mut labels = Vec::with_capacity(tokens.len());
        for token in tokens {
            let key = if token == UNKNOWN_TOKEN {
                token.clone()
            } else if let Some(rest) = token.strip_prefix(WORD_START_MARKER) {
                rest.to_string()
            } else {
                format!("{SUBWORD_PREFIX}{token}")
            };
            match token_map.get(&key) {
                Some(&label) => labels.push(label),
                None => return Ok(false),
            }
        }
        self.add_word(&labels)?;
        Ok(true)
    }

    pub(crate) fn shared_fst(&self) -> Arc<VectorFst<TropicalWeight>> {
        Arc::clone(&self.fst)
    }
}

impl Default for Lexicon {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Lexicon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lexicon")
            .field("num_states", &self.num_states())
            .finish()
    }
}

/// Positional cursor over a [`Lexicon`].
///
/// Mirrors the sorted-matcher `SetState`/`Find` contract: position on a
/// state, then ask whether an arc with a given input label leaves it. Labels
/// are matched by scanning the state's arc list, so arc order is irrelevant.
#[derive(Clone)]
pub struct LexiconMatcher {
    fst: Arc<VectorFst<TropicalWeight>>,
    state: Option<StateId>,
}

impl LexiconMatcher {
    /// Create a cursor over `lexicon`, positioned at its start state.
    #[must_use]
    pub fn new(lexicon: &Lexicon) -> Self {
        Self {
            state: lexicon.start(),
            fst: lexicon.shared_fst(),
        }
    }

    /// Start state of the underlying automaton.
    #[must_use]
    pub fn start(&self) -> Option<StateId> {
        self.fst.start()
    }

    /// Position the cursor on `state`.
    pub fn set_state(&mut self, state: StateId) {
        self.state = Some(state);
    }

    /// Look for an arc labelled `label` out of the current state.
    ///
    /// Returns the arc's next state on a match, `None` on a miss or when the
    /// cursor has nowhere to stand.
    #[must_use]
    pub fn find(&self, label: Label) -> Option<StateId> {
        let state = self.state?;
        let trs = self.fst.get_trs(state).ok()?;
        trs.trs()
            .iter()
            .find(|tr| tr.ilabel == label)
            .map(|tr| tr.nextstate)
    }
}

impl fmt::Debug for LexiconMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LexiconMatcher")
            .field("state", &self.state)
            .finish()
    }
}

fn fst_err(e: impl fmt::Display) -> DecoderError {
    DecoderError::Lexicon(e.to_string())
}
