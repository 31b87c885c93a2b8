//! The per-frame expansion and pruning step shared by the offline and
//! streaming decoders.
//!
//! Each frame runs the CTC prefix recurrence over the surviving
//! `(prefix, symbol)` pairs, applies shallow fusion at word boundaries when a
//! scorer is present, rolls the accumulators, and compacts the trie back to
//! the beam width. Prefix updates for frame `t` are fully committed before
//! frame `t + 1` begins.

use super::{
    pair_word_timestamps, path_with_offsets, render_text, render_words, WordBoundary,
};
use crate::math::{log_sum_exp, pruned_log_probs};
use crate::scorer::Scorer;
use crate::trie::{NodeId, PathTrie, ROOT_SYMBOL};
use crate::{DecoderOptions, Hypothesis, WordTimestamp};

/// Attach the scorer's lexicon to a fresh trie. Character-based scorers do
/// not constrain expansion.
pub(crate) fn attach_lexicon(trie: &mut PathTrie, scorer: Option<&dyn Scorer>) {
    if let Some(s) = scorer {
        if !s.is_character_based() {
            if let Some(lexicon) = s.dictionary() {
                trie.set_dictionary(lexicon);
            }
        }
    }
}

/// Advance the beam by one probability frame.
///
/// `score_empty_prefix` lets the streaming decoder apply fusion even at the
/// root; the offline decoder skips the empty prefix. `frame_offset`, when
/// present, stamps newly allocated nodes with their emission frame.
#[allow(clippy::too_many_arguments)]
pub(crate) fn search_step(
    trie: &mut PathTrie,
    prefixes: &mut Vec<NodeId>,
    frame: &[f32],
    vocab: &[String],
    blank_id: usize,
    boundary: WordBoundary,
    opts: &DecoderOptions,
    scorer: Option<&dyn Scorer>,
    score_empty_prefix: bool,
    frame_offset: Option<u32>,
) {
    debug_assert!(!prefixes.is_empty());
    let beam = opts.beam_size;

    let mut min_cutoff = f32::NEG_INFINITY;
    let mut full_beam = false;
    if let Some(s) = scorer {
        let m = prefixes.len().min(beam);
        prefixes[..m].sort_unstable_by(|&a, &b| trie.prefix_order(a, b));
        min_cutoff = trie.score(prefixes[m - 1]) + frame[blank_id].ln() - s.beta().max(0.0);
        full_beam = m == beam;
    }

    let log_prob_idx = pruned_log_probs(frame, opts.cutoff_prob, opts.cutoff_top_n);
    for &(c, log_prob_c) in &log_prob_idx {
        let symbol = c as i32;
        let word_end = boundary.word_end(c, vocab);

        for i in 0..prefixes.len().min(beam) {
            let id = prefixes[i];
            // prefixes are score-ordered here, so everything after is worse
            if full_beam && log_prob_c + trie.score(id) < min_cutoff {
                break;
            }

            // blank keeps the prefix as it is
            if c == blank_id {
                let mass = log_prob_c + trie.score(id);
                let node = trie.node_mut(id);
                node.log_prob_b_cur = log_sum_exp(node.log_prob_b_cur, mass);
                continue;
            }

            // a repeated symbol collapses onto the prefix itself
            let prefix_symbol = trie.symbol(id);
            if symbol == prefix_symbol {
                let mass = log_prob_c + trie.node(id).log_prob_nb_prev;
                let node = trie.node_mut(id);
                node.log_prob_nb_cur = log_sum_exp(node.log_prob_nb_cur, mass);
            }

            // extend, unless the lexicon rejects the symbol
            let Some(new_id) = trie.get_path_trie(id, symbol, word_end) else {
                continue;
            };
            if let Some(offset) = frame_offset {
                trie.mark_emitted(new_id, offset);
            }

            let (b_prev, prefix_score) = {
                let node = trie.node(id);
                (node.log_prob_b_prev, node.score)
            };
            let mut log_p = f32::NEG_INFINITY;
            if symbol == prefix_symbol && b_prev > f32::NEG_INFINITY {
                // only a blank separates the repeats
                log_p = log_prob_c + b_prev;
            } else if symbol != prefix_symbol {
                log_p = log_prob_c + prefix_score;
            }

            if let Some(s) = scorer {
                if (score_empty_prefix || prefix_symbol != ROOT_SYMBOL)
                    && (word_end || s.is_character_based())
                {
                    // continuations score against the parent so a word-based
                    // lookup happens once per complete word
                    let target = if s.is_character_based() { new_id } else { id };
                    let ngram = s.make_ngram(trie, target);
                    log_p += s.get_log_cond_prob(&ngram) * s.alpha() + s.beta();
                }
            }

            let node = trie.node_mut(new_id);
            node.log_prob_nb_cur = log_sum_exp(node.log_prob_nb_cur, log_p);
        }
    }

    // commit the frame: roll current into previous, then keep the top beam
    prefixes.clear();
    trie.iterate_to_vec(prefixes);
    if prefixes.len() > beam {
        prefixes.select_nth_unstable_by(beam, |&a, &b| trie.prefix_order(a, b));
        for i in beam..prefixes.len() {
            trie.remove(prefixes[i]);
        }
        prefixes.truncate(beam);
    }
}

/// Render the top prefixes into hypotheses, computing word timestamps for
/// the best one when asked.
pub(crate) fn beam_results(
    trie: &PathTrie,
    prefixes: &[NodeId],
    vocab: &[String],
    boundary: WordBoundary,
    beam_size: usize,
    want_timestamps: bool,
) -> (Vec<Hypothesis>, Vec<WordTimestamp>) {
    let mut hypotheses = Vec::new();
    let mut timestamps = Vec::new();
    for (i, &id) in prefixes.iter().take(beam_size).enumerate() {
        let with_offsets = want_timestamps && i == 0;
        let (symbols, offsets) = path_with_offsets(trie, id, boundary, vocab, with_offsets);
        let words = render_words(&symbols, vocab, boundary);
        if with_offsets {
            timestamps = pair_word_timestamps(&words, &offsets);
        }
        let score = trie.score(id);
        hypotheses.push(Hypothesis {
            score,
            approx_ctc: score,
            text: render_text(&words),
        });
    }
    (hypotheses, timestamps)
}
