//! Training run: normalize, split, fit vectorizer and SVM, evaluate holdout.

use tracing::info;

use super::labels::LabelOrdering;
use super::metrics::ClassificationReport;
use super::split::train_test_split;
use super::svm::SvmParams;
use super::vectorizer::TfidfVectorizer;
use crate::artifact::ArtifactBundle;
use crate::error::{FolioError, ModelError, Result};
use crate::models::config::TrainingConfig;
use crate::models::record::Dataset;
use crate::text::normalize;

/// Result of a training run.
#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    pub bundle: ArtifactBundle,
    /// Holdout evaluation; diagnostic only, not persisted.
    pub report: ClassificationReport,
    pub train_rows: usize,
    pub test_rows: usize,
}

/// Trains an artifact bundle from a dataset.
#[derive(Debug, Clone, Default)]
pub struct Trainer {
    config: TrainingConfig,
}

impl Trainer {
    pub fn new(config: TrainingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// Run the full training pipeline.
    ///
    /// Fails before fitting anything when the dataset is empty or has fewer
    /// than two labels.
    pub fn train(&self, dataset: &Dataset) -> Result<TrainingOutcome> {
        if dataset.is_empty() {
            return Err(FolioError::EmptyCorpus(
                "dataset has no rows with text and label".to_string(),
            ));
        }

        let labels = LabelOrdering::from_labels(dataset.examples().iter().map(|e| &e.label));
        if labels.len() < 2 {
            return Err(ModelError::InsufficientClasses(labels.len()).into());
        }

        let texts: Vec<String> = dataset.examples().iter().map(|e| normalize(&e.text)).collect();
        let y = labels.encode(
            &dataset
                .examples()
                .iter()
                .map(|e| e.label.as_str())
                .collect::<Vec<_>>(),
        )?;

        let split = train_test_split(texts.len(), self.config.test_size, self.config.seed)?;
        let train_texts: Vec<&str> = split.train.iter().map(|&i| texts[i].as_str()).collect();
        let test_texts: Vec<&str> = split.test.iter().map(|&i| texts[i].as_str()).collect();
        let y_train: Vec<usize> = split.train.iter().map(|&i| y[i]).collect();
        let y_test: Vec<usize> = split.test.iter().map(|&i| y[i]).collect();

        info!(
            "Training on {} rows, holding out {} rows, {} labels",
            train_texts.len(),
            test_texts.len(),
            labels.len()
        );

        let (vectorizer, x_train) = TfidfVectorizer::new().fit_transform(&train_texts)?;
        let x_test = vectorizer.transform_all(&test_texts);

        let params = SvmParams {
            c: self.config.c,
            epochs: self.config.epochs,
            seed: self.config.seed,
        };
        let classifier = params.fit(&x_train, &y_train, labels.len(), vectorizer.n_features())?;

        let y_pred: Vec<usize> = x_test.iter().map(|x| classifier.predict(x)).collect();
        let report = ClassificationReport::evaluate(&y_test, &y_pred, &labels);
        info!("Holdout accuracy: {:.4}", report.accuracy);

        let bundle = ArtifactBundle::new(classifier, vectorizer, labels)?;

        Ok(TrainingOutcome {
            bundle,
            report,
            train_rows: split.train.len(),
            test_rows: split.test.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::record::{ExtractionMethod, PageRecord};

    fn dataset(rows: &[(&str, &str)]) -> Dataset {
        let records = rows.iter().enumerate().map(|(i, (text, label))| PageRecord {
            document_name: format!("doc{}.pdf", i),
            page_index: 1,
            text: text.to_string(),
            extraction_method: ExtractionMethod::Direct,
            label: Some(label.to_string()),
        });
        Dataset::from_records(records).0
    }

    #[test]
    fn test_empty_dataset_aborts() {
        let result = Trainer::default().train(&Dataset::default());
        assert!(matches!(result, Err(FolioError::EmptyCorpus(_))));
    }

    #[test]
    fn test_single_label_aborts() {
        let data = dataset(&[("alpha", "A"), ("alpha again", "A"), ("more alpha", "A")]);
        let result = Trainer::default().train(&data);
        assert!(matches!(
            result,
            Err(FolioError::Model(ModelError::InsufficientClasses(1)))
        ));
    }

    #[test]
    fn test_stopword_only_corpus_has_no_vocabulary() {
        let data = dataset(&[("the and of", "A"), ("is it", "B"), ("a an", "A"), ("was were", "B")]);
        let result = Trainer::default().train(&data);
        assert!(matches!(
            result,
            Err(FolioError::Model(ModelError::EmptyVocabulary))
        ));
    }

    #[test]
    fn test_split_sizes_reported() {
        let mut rows = Vec::new();
        for _ in 0..5 {
            rows.push(("interest rates bonds", "finance"));
            rows.push(("compiler lifetimes borrow", "systems"));
        }
        let outcome = Trainer::default().train(&dataset(&rows)).unwrap();

        assert_eq!(outcome.train_rows, 8);
        assert_eq!(outcome.test_rows, 2);
        assert_eq!(outcome.report.support, 2);
        assert_eq!(outcome.bundle.labels().as_slice(), &["finance", "systems"]);
    }

    fn alpha_beta() -> Dataset {
        let mut rows = Vec::new();
        for i in 0..10 {
            rows.push((format!("alpha alpha report {}", ["north", "south"][i % 2]), "A"));
            rows.push((format!("beta beta summary {}", ["east", "west"][i % 2]), "B"));
        }
        let records = rows.into_iter().enumerate().map(|(i, (text, label))| PageRecord {
            document_name: format!("{}.pdf", label),
            page_index: i as u32 + 1,
            text,
            extraction_method: ExtractionMethod::Direct,
            label: Some(label.to_string()),
        });
        Dataset::from_records(records).0
    }

    #[test]
    fn test_separable_topics_classify_on_holdout() {
        let outcome = Trainer::default().train(&alpha_beta()).unwrap();

        assert_eq!(outcome.test_rows, 4);
        assert_eq!(outcome.report.accuracy, 1.0);
        assert_eq!(outcome.bundle.predict("alpha").label, "A");
        assert_eq!(outcome.bundle.predict("Beta, beta!").label, "B");
    }

    #[test]
    fn test_inference_features_match_training_features() {
        let data = alpha_beta();
        let outcome = Trainer::default().train(&data).unwrap();
        let bundle = &outcome.bundle;

        let split = train_test_split(data.len(), 0.2, 42).unwrap();
        let train_texts: Vec<String> = split
            .train
            .iter()
            .map(|&i| normalize(&data.examples()[i].text))
            .collect();
        let (_, x_train) = TfidfVectorizer::new().fit_transform(&train_texts).unwrap();

        for (&row, expected) in split.train.iter().zip(&x_train) {
            assert_eq!(&bundle.features(&data.examples()[row].text), expected);
        }
    }

    #[test]
    fn test_same_seed_same_model() {
        let data = alpha_beta();
        let a = Trainer::default().train(&data).unwrap();
        let b = Trainer::default().train(&data).unwrap();

        assert_eq!(a.bundle.classifier(), b.bundle.classifier());
        assert_eq!(a.bundle.vectorizer(), b.bundle.vectorizer());
        assert_ne!(a.bundle.run_id(), b.bundle.run_id());
    }
}
