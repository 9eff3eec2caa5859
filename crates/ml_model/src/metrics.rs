//! Classification metrics for the evaluation step.

/// Accuracy plus support-weighted precision, recall and F1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassificationScores {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
}

/// Computes accuracy and support-weighted precision/recall/F1.
///
/// Per-class ratios with an empty denominator count as zero. All four
/// scores lie in [0, 1].
///
/// # Panics
///
/// Panics if `truth` and `predicted` differ in length.
#[must_use]
pub fn classification_scores(
    truth: &[usize],
    predicted: &[usize],
    class_count: usize,
) -> ClassificationScores {
    assert_eq!(
        truth.len(),
        predicted.len(),
        "truth and predictions must align"
    );

    let total = truth.len();
    if total == 0 {
        return ClassificationScores {
            accuracy: 0.0,
            precision: 0.0,
            recall: 0.0,
            f1_score: 0.0,
        };
    }

    let mut true_positives = vec![0usize; class_count];
    let mut false_positives = vec![0usize; class_count];
    let mut false_negatives = vec![0usize; class_count];
    let mut correct = 0usize;

    for (&actual, &guess) in truth.iter().zip(predicted) {
        if actual == guess {
            correct += 1;
            true_positives[actual] += 1;
        } else {
            false_positives[guess] += 1;
            false_negatives[actual] += 1;
        }
    }

    let mut precision = 0.0;
    let mut recall = 0.0;
    let mut f1_score = 0.0;

    for class in 0..class_count {
        let support = true_positives[class] + false_negatives[class];
        if support == 0 {
            continue;
        }
        let weight = support as f64 / total as f64;

        let class_precision = ratio(
            true_positives[class],
            true_positives[class] + false_positives[class],
        );
        let class_recall = ratio(true_positives[class], support);
        let class_f1 = if class_precision + class_recall > 0.0 {
            2.0 * class_precision * class_recall / (class_precision + class_recall)
        } else {
            0.0
        };

        precision += weight * class_precision;
        recall += weight * class_recall;
        f1_score += weight * class_f1;
    }

    ClassificationScores {
        accuracy: correct as f64 / total as f64,
        precision,
        recall,
        f1_score,
    }
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn test_perfect_predictions() {
        let truth = vec![0, 1, 2, 0, 1, 2];
        let scores = classification_scores(&truth, &truth, 3);

        assert_close(scores.accuracy, 1.0);
        assert_close(scores.precision, 1.0);
        assert_close(scores.recall, 1.0);
        assert_close(scores.f1_score, 1.0);
    }

    #[test]
    fn test_known_confusion() {
        // Class 0: one hit, one predicted as 1. Class 1: both hit, one
        // stray prediction. Class 2: one hit, one predicted as 0.
        let truth = vec![0, 0, 1, 1, 2, 2];
        let predicted = vec![0, 1, 1, 1, 2, 0];
        let scores = classification_scores(&truth, &predicted, 3);

        assert_close(scores.accuracy, 4.0 / 6.0);
        // precision: (0.5 + 2/3 + 1.0) / 3 weighted equally
        assert_close(scores.precision, (0.5 + 2.0 / 3.0 + 1.0) / 3.0);
        // recall: (0.5 + 1.0 + 0.5) / 3
        assert_close(scores.recall, 2.0 / 3.0);
        // f1: (0.5 + 0.8 + 2/3) / 3
        assert_close(scores.f1_score, (0.5 + 0.8 + 2.0 / 3.0) / 3.0);
    }

    #[test]
    fn test_scores_in_unit_interval() {
        let truth = vec![0, 1, 2, 2, 1, 0, 0, 2];
        let predicted = vec![1, 1, 2, 0, 0, 0, 2, 2];
        let scores = classification_scores(&truth, &predicted, 3);

        for value in [
            scores.accuracy,
            scores.precision,
            scores.recall,
            scores.f1_score,
        ] {
            assert!((0.0..=1.0).contains(&value), "{value} out of range");
        }
    }

    #[test]
    fn test_empty_inputs() {
        let scores = classification_scores(&[], &[], 3);
        assert_close(scores.accuracy, 0.0);
    }

    #[test]
    fn test_absent_class_has_no_weight() {
        // Class 2 never appears in the truth; scores come from 0 and 1 only
        let truth = vec![0, 0, 1, 1];
        let predicted = vec![0, 0, 1, 1];
        let scores = classification_scores(&truth, &predicted, 3);

        assert_close(scores.precision, 1.0);
        assert_close(scores.recall, 1.0);
    }
}
