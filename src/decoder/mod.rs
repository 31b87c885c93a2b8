//! CTC prefix beam search.
//!
//! # Modules
//!
//! - [`batch`] - utterance-level parallel driver
//! - [`offline`] - whole-utterance decoding
//! - [`search`] - the per-frame expansion step shared by both decoders
//! - [`streaming`] - chunked decoding with word timestamps
//!
//! # Word boundaries
//!
//! Two vocabulary conventions coexist. Sub-word vocabularies mark
//! continuation tokens with a leading `#`, so any token without the marker
//! begins a new word. Flat vocabularies spell words symbol by symbol and
//! separate them with a literal space symbol. [`WordBoundary`] captures the
//! convention; both decoders infer it from the vocabulary and use it for
//! language-model scoring points, lexicon restarts, rendering, and word
//! timestamps.

mod batch;
mod offline;
mod search;
mod streaming;

pub use batch::decode_batch;
pub use offline::decode;
pub use streaming::StreamingDecoder;

use crate::trie::{NodeId, PathTrie, ROOT_SYMBOL};
use crate::{WordTimestamp, UNKNOWN_TOKEN};

/// Which vocabulary convention separates words.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WordBoundary {
    /// Sub-word vocabularies: a token without a leading `#` begins a word.
    SubwordMarker,
    /// Flat vocabularies: the space symbol, when present, separates words.
    Space(Option<i32>),
}

impl WordBoundary {
    /// Infer the convention from the vocabulary itself.
    #[must_use]
    pub fn from_vocab(vocab: &[String]) -> Self {
        if vocab.iter().any(|t| t.starts_with('#')) {
            Self::SubwordMarker
        } else {
            Self::Space(vocab.iter().position(|t| t == " ").map(|i| i as i32))
        }
    }

    /// True when emitting symbol `c` completes the word under construction.
    pub(crate) fn word_end(self, c: usize, vocab: &[String]) -> bool {
        match self {
            Self::SubwordMarker => c < vocab.len() && !vocab[c].starts_with('#'),
            Self::Space(space) => space == Some(c as i32),
        }
    }

    /// True when `symbol` itself marks the end of the preceding word.
    fn marks_end(self, symbol: i32, vocab: &[String]) -> bool {
        match self {
            Self::SubwordMarker => vocab[symbol as usize] == UNKNOWN_TOKEN,
            Self::Space(space) => space == Some(symbol),
        }
    }

    /// True when `symbol` begins a new word given its predecessor.
    fn starts_word(self, symbol: i32, parent: i32, vocab: &[String]) -> bool {
        if parent == ROOT_SYMBOL {
            return true;
        }
        match self {
            Self::SubwordMarker => {
                let token = &vocab[symbol as usize];
                !token.starts_with('#') && token != UNKNOWN_TOKEN
            }
            Self::Space(space) => space == Some(parent),
        }
    }
}

/// Walk from `node` to the root, collecting the symbol path in prefix order
/// and, when asked, the frame offsets bounding each rendered word.
///
/// An offset is pushed for each word-end role a node plays (final token,
/// boundary-marker token, or token followed by a word start) and each
/// word-start role, so the reversed list pairs up as
/// `[start, end, start, end, ..]` per word.
pub(crate) fn path_with_offsets(
    trie: &PathTrie,
    node: NodeId,
    boundary: WordBoundary,
    vocab: &[String],
    want_offsets: bool,
) -> (Vec<i32>, Vec<u32>) {
    let mut symbols = Vec::new();
    let mut offsets = Vec::new();
    let mut prev_started = false;
    let mut cur = Some(node);
    while let Some(id) = cur {
        let symbol = trie.symbol(id);
        if symbol == ROOT_SYMBOL {
            break;
        }
        symbols.push(symbol);
        if want_offsets {
            let parent = trie.parent(id).map_or(ROOT_SYMBOL, |p| trie.symbol(p));
            let starts = boundary.starts_word(symbol, parent, vocab);
            let ends = offsets.is_empty() || prev_started || boundary.marks_end(symbol, vocab);
            if ends {
                offsets.push(trie.offset(id));
            }
            if starts {
                offsets.push(trie.offset(id));
            }
            prev_started = starts;
        }
        cur = trie.parent(id);
    }
    symbols.reverse();
    offsets.reverse();
    (symbols, offsets)
}

/// Render a symbol path as a word list. Empty slots mark positions where a
/// boundary produced no text; the timestamp pairing drops them.
pub(crate) fn render_words(
    symbols: &[i32],
    vocab: &[String],
    boundary: WordBoundary,
) -> Vec<String> {
    match boundary {
        WordBoundary::SubwordMarker => {
            let mut words: Vec<String> = Vec::new();
            for &s in symbols {
                let token = &vocab[s as usize];
                if token == UNKNOWN_TOKEN {
                    words.push(String::new());
                } else if token.starts_with('#') {
                    let rest = token.trim_start_matches('#');
                    match words.last_mut() {
                        Some(last) => last.push_str(rest),
                        None => words.push(rest.to_string()),
                    }
                } else {
                    words.push(token.clone());
                }
            }
            words
        }
        WordBoundary::Space(space) => {
            let mut words = vec![String::new()];
            for &s in symbols {
                if space == Some(s) {
                    words.push(String::new());
                } else {
                    let token = &vocab[s as usize];
                    if token != UNKNOWN_TOKEN {
                        if let Some(last) = words.last_mut() {
                            last.push_str(token);
                        }
                    }
                }
            }
            words
        }
    }
}

/// Join non-empty words with single spaces.
pub(crate) fn render_text(words: &[String]) -> String {
    words
        .iter()
        .filter(|w| !w.is_empty())
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Pair each non-empty word with its `(start, end)` offsets.
pub(crate) fn pair_word_timestamps(words: &[String], offsets: &[u32]) -> Vec<WordTimestamp> {
    let mut out = Vec::new();
    for (i, word) in words.iter().filter(|w| !w.is_empty()).enumerate() {
        let start = offsets.get(2 * i).copied().unwrap_or(0);
        let end = offsets.get(2 * i + 1).copied().unwrap_or(start);
        out.push(WordTimestamp {
            word: word.clone(),
            start,
            end,
        });
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vocab(tokens: &[&str]) -> Vec<String> {
        tokens.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_from_vocab_detects_subword() {
        let v = vocab(&["hel", "#lo", "ne", "#twork", " "]);
        assert_eq!(WordBoundary::from_vocab(&v), WordBoundary::SubwordMarker);
    }

    #[test]
    fn test_from_vocab_detects_space() {
        let v = vocab(&["a", "b", " "]);
        assert_eq!(WordBoundary::from_vocab(&v), WordBoundary::Space(Some(2)));
        let v = vocab(&["a", "b"]);
        assert_eq!(WordBoundary::from_vocab(&v), WordBoundary::Space(None));
    }

    #[test]
    fn test_word_end_subword() {
        let v = vocab(&["hel", "#lo", " "]);
        let boundary = WordBoundary::from_vocab(&v);
        assert!(boundary.word_end(0, &v));
        assert!(!boundary.word_end(1, &v));
        // out-of-vocabulary index (the appended blank) never ends a word
        assert!(!boundary.word_end(3, &v));
    }

    #[test]
    fn test_word_end_space() {
        let v = vocab(&["a", "b", " "]);
        let boundary = WordBoundary::from_vocab(&v);
        assert!(!boundary.word_end(0, &v));
        assert!(boundary.word_end(2, &v));
    }

    #[test]
    fn test_render_subword_joins_continuations() {
        let v = vocab(&["hel", "#lo", "ne", "#twork", " "]);
        let words = render_words(&[0, 1, 2, 3], &v, WordBoundary::SubwordMarker);
        assert_eq!(render_text(&words), "hello network");
    }

    #[test]
    fn test_render_subword_elides_unknown() {
        let v = vocab(&["hel", "#lo", UNKNOWN_TOKEN, "ne"]);
        let words = render_words(&[0, 1, 2, 3], &v, WordBoundary::SubwordMarker);
        assert_eq!(render_text(&words), "hello ne");
    }

    #[test]
    fn test_render_space_concatenates() {
        let v = vocab(&["a", "b", " "]);
        let boundary = WordBoundary::Space(Some(2));
        let words = render_words(&[0, 0, 2, 1], &v, boundary);
        assert_eq!(render_text(&words), "aa b");
        let words = render_words(&[0, 1], &v, boundary);
        assert_eq!(render_text(&words), "ab");
    }

    #[test]
    fn test_render_space_elides_unknown() {
        let v = vocab(&["a", UNKNOWN_TOKEN, " "]);
        let words = render_words(&[0, 1, 0], &v, WordBoundary::Space(Some(2)));
        assert_eq!(render_text(&words), "aa");
    }

    #[test]
    fn test_pair_word_timestamps_guards_short_lists() {
        let words = vec!["hello".to_string(), "net".to_string()];
        let paired = pair_word_timestamps(&words, &[0, 1, 2]);
        assert_eq!(paired.len(), 2);
        assert_eq!(paired[0].start, 0);
        assert_eq!(paired[0].end, 1);
        assert_eq!(paired[1].start, 2);
        assert_eq!(paired[1].end, 2);
    }
}
