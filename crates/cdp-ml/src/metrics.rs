//! Classification metrics (weighted averaging over class support).

use std::collections::BTreeMap;

pub fn accuracy(truth: &[i32], predicted: &[i32]) -> f64 {
    if truth.is_empty() {
        return 0.0;
    }
    let correct = truth
        .iter()
        .zip(predicted)
        .filter(|(a, b)| a == b)
        .count();
    correct as f64 / truth.len() as f64
}

pub fn precision_weighted(truth: &[i32], predicted: &[i32]) -> f64 {
    weighted_by_support(truth, |class| {
        let predicted_positive = predicted.iter().filter(|p| **p == class).count();
        if predicted_positive == 0 {
            return 0.0;
        }
        true_positives(truth, predicted, class) as f64 / predicted_positive as f64
    })
}

pub fn recall_weighted(truth: &[i32], predicted: &[i32]) -> f64 {
    weighted_by_support(truth, |class| {
        let actual_positive = truth.iter().filter(|t| **t == class).count();
        if actual_positive == 0 {
            return 0.0;
        }
        true_positives(truth, predicted, class) as f64 / actual_positive as f64
    })
}

pub fn f1_weighted(truth: &[i32], predicted: &[i32]) -> f64 {
    weighted_by_support(truth, |class| {
        let predicted_positive = predicted.iter().filter(|p| **p == class).count();
        let actual_positive = truth.iter().filter(|t| **t == class).count();
        let tp = true_positives(truth, predicted, class) as f64;
        if predicted_positive == 0 || actual_positive == 0 {
            return 0.0;
        }
        let precision = tp / predicted_positive as f64;
        let recall = tp / actual_positive as f64;
        if precision + recall == 0.0 {
            0.0
        } else {
            2.0 * precision * recall / (precision + recall)
        }
    })
}

fn true_positives(truth: &[i32], predicted: &[i32], class: i32) -> usize {
    truth
        .iter()
        .zip(predicted)
        .filter(|(t, p)| **t == class && **p == class)
        .count()
}

/// Average a per-class metric weighted by class support in `truth`.
fn weighted_by_support(truth: &[i32], metric: impl Fn(i32) -> f64) -> f64 {
    if truth.is_empty() {
        return 0.0;
    }
    let mut support: BTreeMap<i32, usize> = BTreeMap::new();
    for value in truth {
        *support.entry(*value).or_default() += 1;
    }
    support
        .iter()
        .map(|(class, count)| metric(*class) * *count as f64)
        .sum::<f64>()
        / truth.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn perfect_predictions_score_one() {
        let y = vec![0, 1, 1, 0, 1];
        assert_eq!(accuracy(&y, &y), 1.0);
        assert_eq!(precision_weighted(&y, &y), 1.0);
        assert_eq!(recall_weighted(&y, &y), 1.0);
        assert_eq!(f1_weighted(&y, &y), 1.0);
    }

    #[test]
    fn accuracy_counts_matches() {
        let truth = vec![0, 1, 1, 0];
        let predicted = vec![0, 1, 0, 0];
        assert_eq!(accuracy(&truth, &predicted), 0.75);
    }

    #[test]
    fn weighted_metrics_match_hand_computation() {
        // truth:     1 1 0 0
        // predicted: 1 0 0 0
        let truth = vec![1, 1, 0, 0];
        let predicted = vec![1, 0, 0, 0];

        // class 1: precision 1/1, recall 1/2, f1 2/3; support 2
        // class 0: precision 2/3, recall 2/2, f1 4/5; support 2
        let precision = precision_weighted(&truth, &predicted);
        let recall = recall_weighted(&truth, &predicted);
        let f1 = f1_weighted(&truth, &predicted);

        assert!((precision - (1.0 + 2.0 / 3.0) / 2.0).abs() < 1e-12);
        assert!((recall - 0.75).abs() < 1e-12);
        assert!((f1 - (2.0 / 3.0 + 0.8) / 2.0).abs() < 1e-12);
    }

    #[test]
    fn empty_input_scores_zero() {
        assert_eq!(accuracy(&[], &[]), 0.0);
        assert_eq!(f1_weighted(&[], &[]), 0.0);
    }
}
