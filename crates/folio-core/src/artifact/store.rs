//! On-disk persistence of artifact bundles.
//!
//! A bundle is a directory of four JSON files. Every sub-artifact carries the
//! run id of the manifest. Saving writes a complete staging directory beside
//! the target and swaps it in with renames, so the target never holds files
//! from two different runs. Only an empty directory or a previous bundle is
//! ever replaced.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::bundle::{ArtifactBundle, Manifest, FORMAT_VERSION};
use crate::error::{ArtifactError, FolioError, ModelError, Result};
use crate::learn::labels::LabelOrdering;
use crate::learn::svm::LinearSvm;
use crate::learn::vectorizer::{FittedVectorizer, Vocabulary};
use crate::text::NormalizerSpec;

pub const MANIFEST_FILE: &str = "manifest.json";
pub const CLASSIFIER_FILE: &str = "classifier.json";
pub const VECTORIZER_FILE: &str = "vectorizer.json";
pub const LABELS_FILE: &str = "labels.json";

const BUNDLE_FILES: [&str; 4] = [MANIFEST_FILE, CLASSIFIER_FILE, VECTORIZER_FILE, LABELS_FILE];

#[derive(Serialize)]
struct StampedRef<'a, T> {
    run_id: &'a str,
    artifact: &'a T,
}

#[derive(Deserialize)]
struct Stamped<T> {
    run_id: String,
    artifact: T,
}

/// Saves and loads the bundle kept in one directory.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Whether a bundle manifest is present.
    pub fn exists(&self) -> bool {
        self.dir.join(MANIFEST_FILE).is_file()
    }

    /// Persist all sub-artifacts of `bundle`, replacing any previous bundle.
    ///
    /// Fails with [`ArtifactError::ForeignContent`] when the target directory
    /// holds anything besides bundle files.
    pub fn save(&self, bundle: &ArtifactBundle) -> Result<()> {
        self.check_replaceable()?;

        let parent = match self.dir.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&parent)?;

        let staging = tempfile::Builder::new()
            .prefix(".folio-staging-")
            .tempdir_in(&parent)?;
        let run_id = bundle.run_id();

        write_stamped(&staging.path().join(CLASSIFIER_FILE), run_id, bundle.classifier())?;
        write_stamped(
            &staging.path().join(VECTORIZER_FILE),
            run_id,
            bundle.vectorizer().vocabulary(),
        )?;
        write_stamped(&staging.path().join(LABELS_FILE), run_id, bundle.labels())?;
        // The manifest goes last: a staging dir without one is never loadable.
        write_json(&staging.path().join(MANIFEST_FILE), bundle.manifest())?;

        self.commit(staging.path(), run_id)?;
        info!("Saved artifact bundle {} to {}", run_id, self.dir.display());
        Ok(())
    }

    fn check_replaceable(&self) -> Result<()> {
        if !self.dir.exists() {
            return Ok(());
        }
        let foreign = |entry: String| -> FolioError {
            ArtifactError::ForeignContent {
                dir: self.dir.display().to_string(),
                entry,
            }
            .into()
        };
        if !self.dir.is_dir() {
            return Err(foreign("a non-directory path".to_string()));
        }

        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if !entry.file_type()?.is_file() || !BUNDLE_FILES.contains(&name.as_str()) {
                return Err(foreign(name));
            }
        }
        Ok(())
    }

    fn commit(&self, staging: &Path, run_id: &str) -> Result<()> {
        if !self.dir.exists() {
            fs::rename(staging, &self.dir)?;
            return Ok(());
        }

        let name = self
            .dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "artifacts".to_string());
        let backup = self
            .dir
            .with_file_name(format!(".{}.replaced-{}", name, run_id));

        fs::rename(&self.dir, &backup)?;
        if let Err(e) = fs::rename(staging, &self.dir) {
            warn!("Failed to install new bundle, restoring previous one: {}", e);
            fs::rename(&backup, &self.dir)?;
            return Err(e.into());
        }
        if let Err(e) = fs::remove_dir_all(&backup) {
            warn!("Could not remove replaced bundle {}: {}", backup.display(), e);
        }
        debug!("Replaced previous bundle in {}", self.dir.display());
        Ok(())
    }

    /// Load and cross-check the bundle.
    ///
    /// Fails with [`ArtifactError::CorruptArtifact`] when any file is missing,
    /// unreadable or from another run, [`ArtifactError::NormalizerMismatch`]
    /// when the bundle was trained with a different normalizer and
    /// [`ArtifactError::LabelOrderingMismatch`] when labels and classes disagree.
    pub fn load(&self) -> Result<ArtifactBundle> {
        let manifest: Manifest = read_json(&self.dir.join(MANIFEST_FILE))?;

        if manifest.format_version != FORMAT_VERSION {
            return Err(corrupt(format!(
                "unsupported bundle format version {} (expected {})",
                manifest.format_version, FORMAT_VERSION
            )));
        }

        let current = NormalizerSpec::current();
        if manifest.normalizer != current {
            return Err(ArtifactError::NormalizerMismatch {
                expected: current.to_string(),
                found: manifest.normalizer.to_string(),
            }
            .into());
        }

        let classifier: LinearSvm = read_stamped(&self.dir.join(CLASSIFIER_FILE), &manifest)?;
        let vocabulary: Vocabulary = read_stamped(&self.dir.join(VECTORIZER_FILE), &manifest)?;
        let labels: LabelOrdering = read_stamped(&self.dir.join(LABELS_FILE), &manifest)?;

        classifier
            .validate()
            .map_err(|e| corrupt(format!("{}: {}", CLASSIFIER_FILE, e)))?;
        labels
            .validate()
            .map_err(|e| corrupt(format!("{}: {}", LABELS_FILE, e)))?;
        let vectorizer = match FittedVectorizer::new(vocabulary) {
            Err(ModelError::UnfittedVectorizer) => return Err(ModelError::UnfittedVectorizer.into()),
            other => other.map_err(|e| corrupt(format!("{}: {}", VECTORIZER_FILE, e)))?,
        };

        let bundle = ArtifactBundle::from_parts(manifest, classifier, vectorizer, labels)?;
        info!(
            "Loaded artifact bundle {} ({} labels, {} features)",
            bundle.run_id(),
            bundle.labels().len(),
            bundle.vectorizer().n_features()
        );
        Ok(bundle)
    }
}

fn corrupt(message: String) -> FolioError {
    ArtifactError::CorruptArtifact(message).into()
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, value)?;
    writer.flush()?;
    writer
        .into_inner()
        .map_err(|e| FolioError::Io(e.into_error()))?
        .sync_all()?;
    Ok(())
}

fn write_stamped<T: Serialize>(path: &Path, run_id: &str, artifact: &T) -> Result<()> {
    write_json(path, &StampedRef { run_id, artifact })
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let name = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
    let file = File::open(path).map_err(|e| corrupt(format!("missing {}: {}", name, e)))?;
    serde_json::from_reader(BufReader::new(file))
        .map_err(|e| corrupt(format!("cannot parse {}: {}", name, e)))
}

fn read_stamped<T: DeserializeOwned>(path: &Path, manifest: &Manifest) -> Result<T> {
    let stamped: Stamped<T> = read_json(path)?;
    if stamped.run_id != manifest.run_id {
        return Err(corrupt(format!(
            "{} belongs to run {} but manifest is run {}",
            path.display(),
            stamped.run_id,
            manifest.run_id
        )));
    }
    Ok(stamped.artifact)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::learn::svm::SvmParams;
    use crate::learn::vectorizer::TfidfVectorizer;
    use pretty_assertions::assert_eq;

    fn bundle(texts: &[&str], labels: &[&str]) -> ArtifactBundle {
        let (vectorizer, x) = TfidfVectorizer::new().fit_transform(texts).unwrap();
        let ordering = LabelOrdering::from_labels(labels.iter().copied());
        let y = ordering.encode(labels).unwrap();
        let classifier = SvmParams::default()
            .fit(&x, &y, ordering.len(), vectorizer.n_features())
            .unwrap();
        ArtifactBundle::new(classifier, vectorizer, ordering).unwrap()
    }

    fn sample_bundle() -> ArtifactBundle {
        bundle(
            &["ledger audit taxes", "kernel scheduler threads", "contract clause court"],
            &["finance", "systems", "legal"],
        )
    }

    fn rewrite_json(path: &Path, edit: impl FnOnce(&mut serde_json::Value)) {
        let mut value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
        edit(&mut value);
        fs::write(path, serde_json::to_string(&value).unwrap()).unwrap();
    }

    #[test]
    fn test_save_load_roundtrip() {
        let root = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(root.path().join("model"));
        let original = sample_bundle();

        store.save(&original).unwrap();
        let loaded = store.load().unwrap();

        assert_eq!(loaded, original);
        assert_eq!(loaded.predict("court clause").label, "legal");
    }

    #[test]
    fn test_save_replaces_previous_bundle_without_leftovers() {
        let root = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(root.path().join("model"));

        store.save(&sample_bundle()).unwrap();
        let second = bundle(&["alpha", "beta"], &["a", "b"]);
        store.save(&second).unwrap();

        assert_eq!(store.load().unwrap().run_id(), second.run_id());
        let entries: Vec<_> = fs::read_dir(root.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec![std::ffi::OsString::from("model")]);
    }

    #[test]
    fn test_missing_sub_artifact_is_corrupt() {
        let root = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(root.path().join("model"));
        store.save(&sample_bundle()).unwrap();

        fs::remove_file(store.dir().join(LABELS_FILE)).unwrap();

        assert!(matches!(
            store.load(),
            Err(FolioError::Artifact(ArtifactError::CorruptArtifact(_)))
        ));
    }

    #[test]
    fn test_missing_bundle_is_corrupt() {
        let store = ArtifactStore::new("/nonexistent/folio/model");
        assert!(!store.exists());
        assert!(matches!(
            store.load(),
            Err(FolioError::Artifact(ArtifactError::CorruptArtifact(_)))
        ));
    }

    #[test]
    fn test_mixed_runs_are_rejected() {
        let root = tempfile::tempdir().unwrap();
        let first = ArtifactStore::new(root.path().join("first"));
        let second = ArtifactStore::new(root.path().join("second"));
        first.save(&sample_bundle()).unwrap();
        second.save(&sample_bundle()).unwrap();

        fs::copy(
            second.dir().join(CLASSIFIER_FILE),
            first.dir().join(CLASSIFIER_FILE),
        )
        .unwrap();

        assert!(matches!(
            first.load(),
            Err(FolioError::Artifact(ArtifactError::CorruptArtifact(_)))
        ));
    }

    #[test]
    fn test_label_cardinality_mismatch_detected_at_load() {
        let root = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(root.path().join("model"));
        store.save(&sample_bundle()).unwrap();

        rewrite_json(&store.dir().join(LABELS_FILE), |value| {
            value["artifact"]["labels"] = serde_json::json!(["finance", "legal"]);
        });

        assert!(matches!(
            store.load(),
            Err(FolioError::Artifact(ArtifactError::LabelOrderingMismatch {
                labels: 2,
                classes: 3
            }))
        ));
    }

    #[test]
    fn test_normalizer_mismatch_detected_at_load() {
        let root = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(root.path().join("model"));
        store.save(&sample_bundle()).unwrap();

        rewrite_json(&store.dir().join(MANIFEST_FILE), |value| {
            value["normalizer"]["stopwords"] = serde_json::json!("spacy-german");
        });

        assert!(matches!(
            store.load(),
            Err(FolioError::Artifact(ArtifactError::NormalizerMismatch { .. }))
        ));
    }

    #[test]
    fn test_empty_vocabulary_is_unfitted() {
        let root = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(root.path().join("model"));
        store.save(&sample_bundle()).unwrap();

        rewrite_json(&store.dir().join(VECTORIZER_FILE), |value| {
            value["artifact"]["terms"] = serde_json::json!({});
        });

        assert!(matches!(
            store.load(),
            Err(FolioError::Model(ModelError::UnfittedVectorizer))
        ));
    }

    #[test]
    fn test_garbage_classifier_is_corrupt() {
        let root = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(root.path().join("model"));
        store.save(&sample_bundle()).unwrap();

        fs::write(store.dir().join(CLASSIFIER_FILE), b"{not json").unwrap();

        assert!(matches!(
            store.load(),
            Err(FolioError::Artifact(ArtifactError::CorruptArtifact(_)))
        ));
    }

    #[test]
    fn test_broken_vocabulary_is_corrupt() {
        let root = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(root.path().join("model"));
        store.save(&sample_bundle()).unwrap();

        rewrite_json(&store.dir().join(VECTORIZER_FILE), |value| {
            for weight in value["artifact"]["terms"].as_object_mut().unwrap().values_mut() {
                weight["index"] = serde_json::json!(0);
            }
        });

        assert!(matches!(
            store.load(),
            Err(FolioError::Artifact(ArtifactError::CorruptArtifact(_)))
        ));
    }

    #[test]
    fn test_save_refuses_directory_with_other_files() {
        let root = tempfile::tempdir().unwrap();
        let work = root.path().join("project");
        fs::create_dir(&work).unwrap();
        fs::write(work.join("notes.txt"), b"keep me").unwrap();

        let result = ArtifactStore::new(&work).save(&sample_bundle());

        assert!(matches!(
            result,
            Err(FolioError::Artifact(ArtifactError::ForeignContent { .. }))
        ));
        assert_eq!(fs::read(work.join("notes.txt")).unwrap(), b"keep me");
        assert!(!work.join(MANIFEST_FILE).exists());
        let entries: Vec<_> = fs::read_dir(root.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec![std::ffi::OsString::from("project")]);
    }

    #[test]
    fn test_save_refuses_bundle_with_extra_subdirectory() {
        let root = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(root.path().join("model"));
        store.save(&sample_bundle()).unwrap();
        fs::create_dir(store.dir().join("plots")).unwrap();

        assert!(store.save(&sample_bundle()).is_err());
        assert!(store.dir().join("plots").is_dir());
        assert!(store.load().is_ok());
    }

    #[test]
    fn test_save_into_empty_existing_directory() {
        let root = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(root.path().join("model"));
        fs::create_dir(store.dir()).unwrap();

        store.save(&sample_bundle()).unwrap();
        assert!(store.load().is_ok());
    }
}
