//! Holdout evaluation: accuracy and per-class precision/recall/F1.

use std::fmt;

use serde::Serialize;

use super::labels::LabelOrdering;

/// Scores for one class.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassMetrics {
    pub label: String,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

/// Averaged precision/recall/F1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AveragedMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

/// Evaluation report over a labeled holdout.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationReport {
    pub accuracy: f64,
    pub classes: Vec<ClassMetrics>,
    pub macro_avg: AveragedMetrics,
    pub weighted_avg: AveragedMetrics,
    pub support: usize,
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

impl ClassificationReport {
    /// Compare predicted against true class indices.
    ///
    /// Precision, recall or F1 with a zero denominator count as 0.
    pub fn evaluate(y_true: &[usize], y_pred: &[usize], labels: &LabelOrdering) -> Self {
        let n_classes = labels.len();
        let mut true_pos = vec![0usize; n_classes];
        let mut predicted = vec![0usize; n_classes];
        let mut actual = vec![0usize; n_classes];

        for (&t, &p) in y_true.iter().zip(y_pred) {
            if t < n_classes {
                actual[t] += 1;
            }
            if p < n_classes {
                predicted[p] += 1;
            }
            if t == p && t < n_classes {
                true_pos[t] += 1;
            }
        }

        let classes: Vec<ClassMetrics> = labels
            .as_slice()
            .iter()
            .enumerate()
            .map(|(k, label)| {
                let precision = ratio(true_pos[k], predicted[k]);
                let recall = ratio(true_pos[k], actual[k]);
                let f1 = if precision + recall > 0.0 {
                    2.0 * precision * recall / (precision + recall)
                } else {
                    0.0
                };
                ClassMetrics {
                    label: label.clone(),
                    precision,
                    recall,
                    f1,
                    support: actual[k],
                }
            })
            .collect();

        let support = y_true.len().min(y_pred.len());
        let correct: usize = true_pos.iter().sum();

        // Classes absent from both truth and predictions do not count toward the macro mean.
        let present: Vec<f64> = (0..n_classes)
            .map(|k| if actual[k] > 0 || predicted[k] > 0 { 1.0 } else { 0.0 })
            .collect();
        let supports: Vec<f64> = actual.iter().map(|&n| n as f64).collect();
        let macro_avg = average(&classes, &present);
        let weighted_avg = average(&classes, &supports);

        Self {
            accuracy: ratio(correct, support),
            classes,
            macro_avg,
            weighted_avg,
            support,
        }
    }
}

fn average(classes: &[ClassMetrics], weights: &[f64]) -> AveragedMetrics {
    let total: f64 = weights.iter().sum();
    if total == 0.0 {
        return AveragedMetrics {
            precision: 0.0,
            recall: 0.0,
            f1: 0.0,
        };
    }
    let mean = |field: fn(&ClassMetrics) -> f64| {
        classes
            .iter()
            .zip(weights)
            .map(|(c, w)| w * field(c))
            .sum::<f64>()
            / total
    };
    AveragedMetrics {
        precision: mean(|c| c.precision),
        recall: mean(|c| c.recall),
        f1: mean(|c| c.f1),
    }
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .classes
            .iter()
            .map(|c| c.label.len())
            .chain(std::iter::once("weighted avg".len()))
            .max()
            .unwrap_or(12);

        writeln!(
            f,
            "{:>width$} {:>9} {:>9} {:>9} {:>9}",
            "", "precision", "recall", "f1-score", "support"
        )?;
        writeln!(f)?;
        for c in &self.classes {
            writeln!(
                f,
                "{:>width$} {:>9.2} {:>9.2} {:>9.2} {:>9}",
                c.label, c.precision, c.recall, c.f1, c.support
            )?;
        }
        writeln!(f)?;
        writeln!(
            f,
            "{:>width$} {:>9} {:>9} {:>9.2} {:>9}",
            "accuracy", "", "", self.accuracy, self.support
        )?;
        for (name, avg) in [("macro avg", self.macro_avg), ("weighted avg", self.weighted_avg)] {
            writeln!(
                f,
                "{:>width$} {:>9.2} {:>9.2} {:>9.2} {:>9}",
                name, avg.precision, avg.recall, avg.f1, self.support
            )?;
        }
        Ok(())
    }
}
