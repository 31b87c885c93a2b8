//! Whole-utterance decoding.

use super::search::{attach_lexicon, beam_results, search_step};
use super::WordBoundary;
use crate::error::{DecoderError, DecoderResult};
use crate::scorer::Scorer;
use crate::trie::{PathTrie, ROOT_SYMBOL};
use crate::{DecoderOptions, Hypothesis};

/// Decode one utterance and return up to `beam_size` hypotheses, best first.
///
/// Each frame must be `vocab.len() + 1` wide, with the blank symbol appended
/// at index `vocab.len()`. With a word-based scorer attached, its lexicon
/// constrains expansion, the trailing word of every surviving prefix is
/// rescored after the last frame, and each hypothesis carries an approximate
/// CTC score with the language-model and insertion-bonus mass removed.
///
/// # Errors
/// Returns [`DecoderError::InvalidParameter`] for out-of-range options or an
/// empty vocabulary, and [`DecoderError::Shape`] for a frame of the wrong
/// width. Both are detected before any expansion begins.
pub fn decode(
    probs: &[Vec<f32>],
    vocab: &[String],
    opts: &DecoderOptions,
    scorer: Option<&dyn Scorer>,
) -> DecoderResult<Vec<Hypothesis>> {
    opts.validate()?;
    if vocab.is_empty() {
        return Err(DecoderError::InvalidParameter("vocabulary is empty".into()));
    }
    let width = vocab.len() + 1;
    for (t, frame) in probs.iter().enumerate() {
        if frame.len() != width {
            return Err(DecoderError::Shape(format!(
                "frame {t} has width {}, expected {width}",
                frame.len()
            )));
        }
    }
    crate::trace_event!(
        "decoding {} frames, beam {}, scorer {}",
        probs.len(),
        opts.beam_size,
        scorer.is_some()
    );

    let blank_id = vocab.len();
    let boundary = WordBoundary::from_vocab(vocab);
    let mut trie = PathTrie::new();
    attach_lexicon(&mut trie, scorer);
    let mut prefixes = vec![trie.root()];

    for frame in probs {
        search_step(
            &mut trie,
            &mut prefixes,
            frame,
            vocab,
            blank_id,
            boundary,
            opts,
            scorer,
            false,
            None,
        );
    }

    // score the trailing word of each prefix that did not end on a boundary
    if let Some(s) = scorer {
        if !s.is_character_based() {
            let m = prefixes.len().min(opts.beam_size);
            for &id in &prefixes[..m] {
                if trie.symbol(id) != ROOT_SYMBOL {
                    let ngram = s.make_ngram(&trie, id);
                    let bump = s.get_log_cond_prob(&ngram) * s.alpha() + s.beta();
                    trie.node_mut(id).score += bump;
                }
            }
        }
    }

    let m = prefixes.len().min(opts.beam_size);
    prefixes[..m].sort_unstable_by(|&a, &b| trie.prefix_order(a, b));

    let (mut results, _) = beam_results(&trie, &prefixes, vocab, boundary, opts.beam_size, false);

    // approximate CTC score: strip the fused language-model mass back out
    if let Some(s) = scorer {
        for (hyp, &id) in results.iter_mut().zip(prefixes.iter()) {
            let path = trie.path(id);
            let words = s.split_labels(&path);
            hyp.approx_ctc =
                hyp.score - path.len() as f32 * s.beta() - s.get_sent_log_prob(&words) * s.alpha();
        }
    }

    Ok(results)
}
