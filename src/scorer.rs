//! External language-model scorer contract.
//!
//! The decoder never owns a language model; it drives one through this trait.
//! A character-based scorer is consulted after every extension, a word-based
//! scorer once per completed word. Scorers are read-only during decoding and
//! shared across concurrent utterances, hence the `Send + Sync` bound.

use crate::lexicon::Lexicon;
use crate::trie::{NodeId, PathTrie};

/// External scorer fused into the beam search.
///
/// Shallow fusion adds `alpha * log P_lm + beta` to an extension's
/// log-probability, where `beta` is a flat word-insertion bonus.
pub trait Scorer: Send + Sync {
    /// Language-model weight applied to every conditional log-probability.
    fn alpha(&self) -> f32;

    /// Word-insertion bonus added alongside each scored extension.
    fn beta(&self) -> f32;

    /// True when the model scores every symbol rather than whole words.
    fn is_character_based(&self) -> bool;

    /// Lexicon constraining expansion to in-vocabulary prefixes, if any.
    ///
    /// Consulted only for word-based scorers; the decoder shares the
    /// automaton and builds a task-local matcher per utterance.
    fn dictionary(&self) -> Option<&Lexicon> {
        None
    }

    /// Build the scoring context for the prefix ending at `node`.
    fn make_ngram(&self, trie: &PathTrie, node: NodeId) -> Vec<String>;

    /// Conditional log-probability of the last entry of `ngram` given the
    /// preceding ones.
    fn get_log_cond_prob(&self, ngram: &[String]) -> f32;

    /// Joint log-probability of a full word sequence. Used to report the
    /// approximate CTC score of a finished hypothesis.
    fn get_sent_log_prob(&self, words: &[String]) -> f32;

    /// Split raw symbol indices into the scorer's word strings.
    fn split_labels(&self, labels: &[i32]) -> Vec<String>;
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// Configurable scorer stub for decoder tests.
    pub(crate) struct StubScorer {
        pub alpha: f32,
        pub beta: f32,
        pub character_based: bool,
        pub lexicon: Option<Lexicon>,
        /// Optional (symbol-string, log-prob) pair penalizing one context.
        pub penalty: Option<(String, f32)>,
    }

    impl StubScorer {
        pub(crate) fn word_based() -> Self {
            Self {
                alpha: 0.0,
                beta: 0.0,
                character_based: false,
                lexicon: None,
                penalty: None,
            }
        }

        pub(crate) fn with_lexicon(lexicon: Lexicon) -> Self {
            Self {
                lexicon: Some(lexicon),
                ..Self::word_based()
            }
        }
    }

    impl Scorer for StubScorer {
        fn alpha(&self) -> f32 {
            self.alpha
        }

        fn beta(&self) -> f32 {
            self.beta
        }

        fn is_character_based(&self) -> bool {
            self.character_based
        }

        fn dictionary(&self) -> Option<&Lexicon> {
            self.lexicon.as_ref()
        }

        fn make_ngram(&self, trie: &PathTrie, node: NodeId) -> Vec<String> {
            trie.path(node).iter().map(ToString::to_string).collect()
        }

        fn get_log_cond_prob(&self, ngram: &[String]) -> f32 {
            match (&self.penalty, ngram.last()) {
                (Some((symbol, log_prob)), Some(last)) if symbol == last => *log_prob,
                _ => 0.0,
            }
        }

        fn get_sent_log_prob(&self, _words: &[String]) -> f32 {
            0.0
        }

        fn split_labels(&self, labels: &[i32]) -> Vec<String> {
            labels.iter().map(ToString::to_string).collect()
        }
    }
}
