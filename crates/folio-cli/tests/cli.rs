use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;

fn folio(config_home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("folio").unwrap();
    cmd.env("XDG_CONFIG_HOME", config_home);
    cmd
}

fn write_dataset(path: &Path) {
    let mut csv = String::from("file_name,page_number,text,ocr_used,label\n");
    for i in 1..=10 {
        csv.push_str(&format!("a.pdf,{},alpha alpha report north,false,A\n", i));
        csv.push_str(&format!("b.pdf,{},beta beta summary east,true,B\n", i));
    }
    csv.push_str("c.pdf,1,,true,A\n");
    fs::write(path, csv).unwrap();
}

#[test]
fn test_help_lists_subcommands() {
    let home = tempfile::tempdir().unwrap();
    folio(home.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("extract"))
        .stdout(predicate::str::contains("train"))
        .stdout(predicate::str::contains("classify"));
}

#[test]
fn test_config_show_defaults() {
    let home = tempfile::tempdir().unwrap();
    folio(home.path())
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"test_size\": 0.2"));
}

#[test]
fn test_config_init_then_get() {
    let home = tempfile::tempdir().unwrap();
    let path = home.path().join("folio.json");
    let path_arg = path.to_str().unwrap();

    folio(home.path())
        .args(["--config", path_arg, "config", "init"])
        .assert()
        .success();
    assert!(path.exists());

    folio(home.path())
        .args(["--config", path_arg, "config", "set", "training.seed", "7"])
        .assert()
        .success();
    folio(home.path())
        .args(["--config", path_arg, "config", "get", "training.seed"])
        .assert()
        .success()
        .stdout(predicate::str::contains("7"));
}

#[test]
fn test_extract_rejects_empty_corpus() {
    let home = tempfile::tempdir().unwrap();
    let corpus = tempfile::tempdir().unwrap();
    fs::create_dir(corpus.path().join("finance")).unwrap();

    folio(home.path())
        .arg("extract")
        .arg(corpus.path())
        .arg("--text-only")
        .assert()
        .failure()
        .stderr(predicate::str::contains("No documents found"));
}

#[test]
fn test_classify_without_bundle_fails() {
    let home = tempfile::tempdir().unwrap();
    let work = tempfile::tempdir().unwrap();
    let pdf = work.path().join("doc.pdf");
    fs::write(&pdf, b"%PDF-1.4").unwrap();

    folio(home.path())
        .arg("classify")
        .arg(&pdf)
        .arg("--artifacts")
        .arg(work.path().join("missing"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load bundle"));
}

#[test]
fn test_train_from_dataset_writes_bundle() {
    let home = tempfile::tempdir().unwrap();
    let work = tempfile::tempdir().unwrap();
    let dataset = work.path().join("dataset.csv");
    let artifacts = work.path().join("artifacts");
    write_dataset(&dataset);

    folio(home.path())
        .arg("train")
        .arg("--dataset")
        .arg(&dataset)
        .arg("--artifacts")
        .arg(&artifacts)
        .assert()
        .success()
        .stdout(predicate::str::contains("Accuracy: 1.0000"));

    for file in ["manifest.json", "classifier.json", "vectorizer.json", "labels.json"] {
        assert!(artifacts.join(file).is_file(), "missing {}", file);
    }
}

#[test]
fn test_train_single_label_fails() {
    let home = tempfile::tempdir().unwrap();
    let work = tempfile::tempdir().unwrap();
    let dataset = work.path().join("dataset.csv");
    fs::write(
        &dataset,
        "file_name,page_number,text,ocr_used,label\na.pdf,1,alpha,false,A\na.pdf,2,alpha again,false,A\n",
    )
    .unwrap();

    folio(home.path())
        .arg("train")
        .arg("--dataset")
        .arg(&dataset)
        .arg("--artifacts")
        .arg(work.path().join("artifacts"))
        .assert()
        .failure();
    assert!(!work.path().join("artifacts").exists());
}
