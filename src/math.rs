//! Log-space numeric kernels.
//!
//! CTC decoding accumulates probability mass in log space. Negative infinity
//! stands for "no mass" and is a legitimate value: it must survive every
//! combination, and adding any finite value to it leaves it unchanged.

use std::cmp::Ordering;

/// Floor added to probabilities before taking the log, so a zero probability
/// maps to a large negative number instead of negative infinity.
pub const PROB_FLOOR: f32 = f32::MIN_POSITIVE;

/// Stable `log(exp(a) + exp(b))`.
///
/// If either operand is negative infinity the other is returned unchanged.
#[must_use]
pub fn log_sum_exp(a: f32, b: f32) -> f32 {
    if a == f32::NEG_INFINITY {
        return b;
    }
    if b == f32::NEG_INFINITY {
        return a;
    }
    let (hi, lo) = if a > b { (a, b) } else { (b, a) };
    hi + (lo - hi).exp().ln_1p()
}

/// Prune a probability frame to the symbols worth expanding.
///
/// Symbols are sorted by descending probability and the shortest prefix is
/// kept whose cumulative probability reaches `cutoff_prob` or whose length
/// reaches `cutoff_top_n`, whichever comes first. Surviving probabilities are
/// converted to `log(p + PROB_FLOOR)`. The input is not mutated; when neither
/// cap can bite, the original index order is preserved and no sort happens.
#[must_use]
pub fn pruned_log_probs(frame: &[f32], cutoff_prob: f32, cutoff_top_n: usize) -> Vec<(usize, f32)> {
    let mut prob_idx: Vec<(usize, f32)> = frame.iter().copied().enumerate().collect();
    if cutoff_prob < 1.0 || cutoff_top_n < prob_idx.len() {
        prob_idx.sort_unstable_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
        let mut cum_prob = 0.0f32;
        let mut cutoff_len = 0usize;
        for &(_, p) in &prob_idx {
            cum_prob += p;
            cutoff_len += 1;
            if cum_prob >= cutoff_prob || cutoff_len >= cutoff_top_n {
                break;
            }
        }
        prob_idx.truncate(cutoff_len);
    }
    prob_idx
        .into_iter()
        .map(|(i, p)| (i, (p + PROB_FLOOR).ln()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // log_sum_exp
    // =========================================================================

    #[test]
    fn test_log_sum_exp_basic() {
        let got = log_sum_exp(0.5f32.ln(), 0.25f32.ln());
        assert!((got - 0.75f32.ln()).abs() < 1e-6);
    }

    #[test]
    fn test_log_sum_exp_neg_infinity_identity() {
        assert_eq!(log_sum_exp(f32::NEG_INFINITY, -1.5), -1.5);
        assert_eq!(log_sum_exp(-1.5, f32::NEG_INFINITY), -1.5);
        assert_eq!(
            log_sum_exp(f32::NEG_INFINITY, f32::NEG_INFINITY),
            f32::NEG_INFINITY
        );
    }

    #[test]
    fn test_log_sum_exp_large_magnitudes() {
        // naive exp would overflow/underflow here
        let got = log_sum_exp(-1000.0, -1000.0);
        assert!((got - (-1000.0 + 2.0f32.ln())).abs() < 1e-4);
    }

    #[test]
    fn test_log_sum_exp_commutative() {
        let a = -0.3;
        let b = -4.2;
        assert!((log_sum_exp(a, b) - log_sum_exp(b, a)).abs() < 1e-7);
    }

    // =========================================================================
    // pruned_log_probs
    // =========================================================================

    #[test]
    fn test_pruned_keeps_order_without_pruning() {
        let frame = vec![0.1, 0.7, 0.2];
        let pruned = pruned_log_probs(&frame, 1.0, 40);
        let indices: Vec<usize> = pruned.iter().map(|&(i, _)| i).collect();
        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[test]
    fn test_pruned_cumulative_cutoff() {
        let frame = vec![0.5, 0.3, 0.15, 0.05];
        // 0.5 + 0.3 >= 0.8, so only two survive
        let pruned = pruned_log_probs(&frame, 0.8, 40);
        let indices: Vec<usize> = pruned.iter().map(|&(i, _)| i).collect();
        assert_eq!(indices, vec![0, 1]);
    }

    #[test]
    fn test_pruned_top_n_cap() {
        let frame = vec![0.1, 0.4, 0.3, 0.2];
        let pruned = pruned_log_probs(&frame, 1.0, 2);
        let indices: Vec<usize> = pruned.iter().map(|&(i, _)| i).collect();
        assert_eq!(indices, vec![1, 2]);
    }

    #[test]
    fn test_pruned_zero_prob_stays_finite() {
        let frame = vec![0.0, 1.0];
        let pruned = pruned_log_probs(&frame, 1.0, 40);
        assert!(pruned[0].1.is_finite());
        assert!(pruned[0].1 < -80.0);
        assert!((pruned[1].1 - 0.0).abs() < 1e-6);
    }

    #[test]
    fn test_pruned_does_not_mutate_input() {
        let frame = vec![0.2, 0.8];
        let copy = frame.clone();
        let _ = pruned_log_probs(&frame, 0.5, 1);
        assert_eq!(frame, copy);
    }

    // =========================================================================
    // Property tests
    // =========================================================================

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(100))]

            #[test]
            fn log_sum_exp_at_least_max(a in -200.0f32..0.0, b in -200.0f32..0.0) {
                let got = log_sum_exp(a, b);
                prop_assert!(got >= a.max(b) - 1e-5);
                prop_assert!(got <= a.max(b) + 2.0f32.ln() + 1e-5);
            }

            #[test]
            fn log_sum_exp_matches_f64(a in -40.0f32..0.0, b in -40.0f32..0.0) {
                let got = log_sum_exp(a, b);
                let naive = ((f64::from(a)).exp() + (f64::from(b)).exp()).ln();
                prop_assert!((f64::from(got) - naive).abs() < 1e-4);
            }

            #[test]
            fn pruned_len_respects_top_n(
                frame in proptest::collection::vec(0.0f32..1.0, 1..32),
                top_n in 1usize..8,
            ) {
                let pruned = pruned_log_probs(&frame, 0.999, top_n);
                prop_assert!(pruned.len() <= top_n.max(1).min(frame.len()));
                prop_assert!(!pruned.is_empty());
            }
        }
    }
}
