//! Adaptive cutoff: instead of a fixed top-K, keep the candidates that sit
//! above the largest drop in z-score among the best-scoring window.

/// Number of top candidates the drop-off is searched in.
pub const DEFAULT_WINDOW_SIZE: usize = 20;

/// A windowed candidate with its raw score and standardized score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankedCandidate {
    /// Index into the corpus.
    pub index: usize,
    pub score: f32,
    pub z_score: f64,
}

/// Outcome of one thresholding pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    /// Candidates strictly before the largest drop, best first.
    pub retained: Vec<RankedCandidate>,
    /// Size of the largest adjacent z-score drop, `0.0` when there was none.
    pub gap: f64,
}

impl Selection {
    pub fn is_empty(&self) -> bool {
        self.retained.is_empty()
    }
}

/// Indices of the `window` highest scores, best first. Equal scores keep
/// corpus order.
pub fn top_window(scores: &[f32], window: usize) -> Vec<usize> {
    let by_rank = |a: &usize, b: &usize| scores[*b].total_cmp(&scores[*a]).then(a.cmp(b));

    let mut indices: Vec<usize> = (0..scores.len()).collect();
    if window == 0 {
        return Vec::new();
    }
    if window < indices.len() {
        indices.select_nth_unstable_by(window - 1, by_rank);
        indices.truncate(window);
    }
    indices.sort_by(by_rank);
    indices
}

/// Standardize `values` against their own sample mean and Bessel-corrected
/// standard deviation. With no spread (or fewer than two values) every
/// z-score is `0.0`.
pub fn z_scores(values: &[f64]) -> Vec<f64> {
    let n = values.len();
    // Rounding in the mean must not turn identical values into tiny non-zero z.
    if n < 2 || values.iter().all(|v| *v == values[0]) {
        return vec![0.0; n];
    }
    let mean = values.iter().sum::<f64>() / n as f64;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
    let stddev = variance.sqrt();
    if stddev == 0.0 || !stddev.is_finite() {
        return vec![0.0; n];
    }
    values.iter().map(|v| (v - mean) / stddev).collect()
}

/// Keep the candidates above the largest z-score drop in the top `window_size`.
///
/// When no adjacent drop is positive (all window scores equal, or a window of
/// at most one entry) the retained set is empty.
pub fn select(scores: &[f32], window_size: usize) -> Selection {
    let window = top_window(scores, window_size);
    let window_scores: Vec<f64> = window.iter().map(|&i| f64::from(scores[i])).collect();
    let z = z_scores(&window_scores);

    let mut ranked: Vec<RankedCandidate> = window
        .iter()
        .zip(z)
        .map(|(&index, z_score)| RankedCandidate {
            index,
            score: scores[index],
            z_score,
        })
        .collect();
    // Stable, so equal z-scores keep window order.
    ranked.sort_by(|a, b| b.z_score.total_cmp(&a.z_score));

    let mut max_gap = 0.0;
    let mut cutoff = 0;
    for i in 1..ranked.len() {
        let gap = ranked[i - 1].z_score - ranked[i].z_score;
        if gap > max_gap {
            max_gap = gap;
            cutoff = i;
        }
    }

    ranked.truncate(cutoff);
    Selection {
        retained: ranked,
        gap: max_gap,
    }
}

#[cfg(test)]
mod tests {
    use {super::*, rstest::rstest};

    #[test]
    fn keeps_candidates_before_the_largest_drop() {
        let scores = [0.95, 0.90, 0.40, 0.38, 0.10];
        let selection = select(&scores, DEFAULT_WINDOW_SIZE);
        let kept: Vec<usize> = selection.retained.iter().map(|c| c.index).collect();
        assert_eq!(kept, vec![0, 1]);
        // 0.50 raw drop over a sample stddev of ~0.3662.
        assert!((selection.gap - 1.3655).abs() < 1e-3, "gap {}", selection.gap);
    }

    #[test]
    fn order_of_input_does_not_matter() {
        let scores = [0.10, 0.40, 0.95, 0.38, 0.90];
        let selection = select(&scores, DEFAULT_WINDOW_SIZE);
        let kept: Vec<usize> = selection.retained.iter().map(|c| c.index).collect();
        assert_eq!(kept, vec![2, 4]);
    }

    #[test]
    fn equal_scores_yield_zero_z_and_nothing_retained() {
        let scores = [0.5_f32; 8];
        let window = top_window(&scores, DEFAULT_WINDOW_SIZE);
        let values: Vec<f64> = window.iter().map(|&i| f64::from(scores[i])).collect();
        assert!(z_scores(&values).iter().all(|z| *z == 0.0));

        let selection = select(&scores, DEFAULT_WINDOW_SIZE);
        assert!(selection.is_empty());
        assert_eq!(selection.gap, 0.0);
    }

    #[rstest]
    #[case(&[], 20)]
    #[case(&[0.7], 20)]
    #[case(&[0.9, 0.1, 0.3], 1)]
    #[case(&[0.9, 0.1, 0.3], 0)]
    fn tiny_windows_retain_nothing(#[case] scores: &[f32], #[case] window: usize) {
        let selection = select(scores, window);
        assert!(selection.is_empty());
        assert_eq!(selection.gap, 0.0);
    }

    #[test]
    fn window_limits_the_candidates_considered() {
        // Outside the window of 3, the 0.0 tail would otherwise dominate the drop.
        let scores = [0.9, 0.8, 0.2, 0.0, 0.0, 0.0];
        let selection = select(&scores, 3);
        let kept: Vec<usize> = selection.retained.iter().map(|c| c.index).collect();
        assert_eq!(kept, vec![0, 1]);
    }

    #[test]
    fn ties_are_broken_by_corpus_index() {
        let scores = [0.3, 0.9, 0.9, 0.1, 0.9];
        assert_eq!(top_window(&scores, 4), vec![1, 2, 4, 0]);
        assert_eq!(top_window(&scores, 2), vec![1, 2]);
    }

    #[test]
    fn window_larger_than_corpus_uses_everything() {
        let scores = [0.2, 0.6, 0.4];
        assert_eq!(top_window(&scores, 20), vec![1, 2, 0]);
    }

    #[test]
    fn z_scores_use_sample_deviation() {
        let z = z_scores(&[1.0, 2.0, 3.0]);
        // mean 2, sample stddev 1
        assert_eq!(z, vec![-1.0, 0.0, 1.0]);
    }

    #[test]
    fn retained_candidates_carry_scores_and_z() {
        let scores = [0.95, 0.90, 0.40, 0.38, 0.10];
        let selection = select(&scores, DEFAULT_WINDOW_SIZE);
        let first = selection.retained[0];
        assert_eq!(first.score, 0.95);
        assert!(first.z_score > selection.retained[1].z_score);
    }
}
