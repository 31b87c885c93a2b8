//! Batched decoding across a worker pool.
//!
//! Utterances are independent, so parallelism is utterance-level only: each
//! task owns its trie and beam state and reads the shared vocabulary,
//! options and scorer. Results come back in submission order, and a failure
//! in one utterance surfaces in its own slot while the others complete.

use super::offline::decode;
use crate::error::{DecoderError, DecoderResult};
use crate::scorer::Scorer;
use crate::{DecoderOptions, Hypothesis};

/// Decode a batch of independent utterances on `num_workers` threads.
///
/// # Errors
/// Returns [`DecoderError::InvalidParameter`] when `num_workers` is zero and
/// [`DecoderError::ThreadPool`] when the pool cannot be built. Per-utterance
/// failures are reported in the corresponding result slot.
#[cfg(feature = "parallel")]
pub fn decode_batch(
    probs_split: &[Vec<Vec<f32>>],
    vocab: &[String],
    opts: &DecoderOptions,
    num_workers: usize,
    scorer: Option<&dyn Scorer>,
) -> DecoderResult<Vec<DecoderResult<Vec<Hypothesis>>>> {
    use rayon::prelude::*;

    validate_workers(num_workers)?;
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(num_workers)
        .build()
        .map_err(|e| DecoderError::ThreadPool(e.to_string()))?;
    crate::trace_event!(
        "decoding batch of {} utterances on {num_workers} workers",
        probs_split.len()
    );
    Ok(pool.install(|| {
        probs_split
            .par_iter()
            .map(|probs| decode(probs, vocab, opts, scorer))
            .collect()
    }))
}

/// Sequential fallback used when the `parallel` feature is disabled.
///
/// # Errors
/// Returns [`DecoderError::InvalidParameter`] when `num_workers` is zero.
/// Per-utterance failures are reported in the corresponding result slot.
#[cfg(not(feature = "parallel"))]
pub fn decode_batch(
    probs_split: &[Vec<Vec<f32>>],
    vocab: &[String],
    opts: &DecoderOptions,
    num_workers: usize,
    scorer: Option<&dyn Scorer>,
) -> DecoderResult<Vec<DecoderResult<Vec<Hypothesis>>>> {
    validate_workers(num_workers)?;
    Ok(probs_split
        .iter()
        .map(|probs| decode(probs, vocab, opts, scorer))
        .collect())
}

fn validate_workers(num_workers: usize) -> DecoderResult<()> {
    if num_workers == 0 {
        return Err(DecoderError::InvalidParameter(
            "num_workers must be positive".into(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vocab(tokens: &[&str]) -> Vec<String> {
        tokens.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_rejects_zero_workers() {
        let result = decode_batch(&[], &vocab(&["a"]), &DecoderOptions::default(), 0, None);
        assert!(matches!(result, Err(DecoderError::InvalidParameter(_))));
    }

    #[test]
    fn test_empty_batch() {
        let results = decode_batch(&[], &vocab(&["a"]), &DecoderOptions::default(), 2, None)
            .expect("batch should succeed");
        assert!(results.is_empty());
    }

    #[test]
    fn test_results_in_submission_order() {
        let v = vocab(&["a", "b", " "]);
        let batch = vec![
            vec![vec![0.9, 0.05, 0.0, 0.05]],
            vec![vec![0.05, 0.9, 0.0, 0.05]],
            vec![vec![0.05, 0.0, 0.0, 0.95]],
        ];
        let results = decode_batch(&batch, &v, &DecoderOptions::new(4), 2, None)
            .expect("batch should succeed");

        assert_eq!(results.len(), 3);
        let texts: Vec<String> = results
            .iter()
            .map(|r| r.as_ref().expect("utterance decodes")[0].text.clone())
            .collect();
        assert_eq!(texts, vec!["a", "b", ""]);
    }

    #[test]
    fn test_per_utterance_failure_is_isolated() {
        let v = vocab(&["a", "b", " "]);
        let batch = vec![
            vec![vec![0.9, 0.05, 0.0, 0.05]],
            vec![vec![0.5, 0.5]], // wrong width
        ];
        let results = decode_batch(&batch, &v, &DecoderOptions::new(4), 2, None)
            .expect("batch should succeed");

        assert!(results[0].is_ok());
        assert!(matches!(results[1], Err(DecoderError::Shape(_))));
    }

    #[test]
    fn test_single_worker_matches_parallel() {
        let v = vocab(&["a", "b", " "]);
        let batch = vec![
            vec![vec![0.6, 0.2, 0.1, 0.1], vec![0.1, 0.7, 0.1, 0.1]],
            vec![vec![0.3, 0.3, 0.3, 0.1]],
        ];
        let serial = decode_batch(&batch, &v, &DecoderOptions::new(4), 1, None)
            .expect("batch should succeed");
        let parallel = decode_batch(&batch, &v, &DecoderOptions::new(4), 3, None)
            .expect("batch should succeed");

        for (a, b) in serial.iter().zip(parallel.iter()) {
            let (a, b) = (a.as_ref().expect("ok"), b.as_ref().expect("ok"));
            assert_eq!(a, b);
        }
    }
}
