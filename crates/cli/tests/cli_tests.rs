//! CLI integration tests using assert_cmd.
//!
//! Every test runs against a fresh SQLite file in a temp directory and the
//! shipped `config/` directory.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::path::{Path, PathBuf};

#[allow(deprecated)]
fn civic(db: &Path) -> Command {
    let mut cmd = Command::cargo_bin("civic").unwrap();
    let config_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../config");
    cmd.env("RUST_LOG", "warn")
        .arg("--db")
        .arg(db)
        .arg("--config-dir")
        .arg(config_dir);
    cmd
}

fn stdout_json(cmd: &mut Command) -> Value {
    let output = cmd.assert().success().get_output().stdout.clone();
    serde_json::from_slice(&output).unwrap()
}

fn submit(db: &Path, title: &str, description: &str, lat: &str) -> Value {
    stdout_json(civic(db).args([
        "idea",
        "submit",
        "--title",
        title,
        "--description",
        description,
        "--lat",
        lat,
        "--lon",
        "86.6621",
    ]))
}

#[test]
fn help_shows_all_subcommands() {
    let dir = tempfile::tempdir().unwrap();
    civic(&dir.path().join("civic.db"))
        .arg("--help")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("idea")
                .and(predicate::str::contains("score"))
                .and(predicate::str::contains("rank"))
                .and(predicate::str::contains("analytics"))
                .and(predicate::str::contains("notify")),
        );
}

#[test]
fn submit_categorizes_scores_and_stores() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("civic.db");

    let submitted = submit(
        &db,
        "New football pitch",
        "Our yard needs a football pitch and a small gym near the school",
        "53.9872",
    );
    assert_eq!(submitted["categorization"]["main_category"], "sport");
    assert_eq!(submitted["idea"]["category"], "sport");
    let score = submitted["result"]["final_score"].as_f64().unwrap();
    assert!((0.0..=1.0).contains(&score));
    assert_eq!(submitted["idea"]["importance_score"].as_f64(), Some(score));
    assert_eq!(submitted["idea"]["priority"], submitted["result"]["priority"]);

    let id = submitted["idea"]["id"].as_str().unwrap();
    let shown = stdout_json(civic(&db).args(["idea", "show", id]));
    assert_eq!(shown["idea"]["importance_score"].as_f64(), Some(score));
}

#[test]
fn rank_orders_submitted_ideas() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("civic.db");
    submit(&db, "Football pitch", "A football pitch for the yard", "53.9872");
    submit(&db, "Football goals", "New goals for the football pitch", "53.9874");
    submit(&db, "Mural", "Paint a mural on the school wall", "53.9900");

    let ranked = stdout_json(civic(&db).args(["rank", "--limit", "5"]));
    assert_eq!(ranked["total"], 3);
    let top = ranked["top"].as_array().unwrap();
    assert_eq!(top.len(), 3);
    assert_eq!(top[0]["rank"], 1);
    let scores: Vec<f64> = top
        .iter()
        .map(|entry| entry["result"]["final_score"].as_f64().unwrap())
        .collect();
    assert!(scores.windows(2).all(|pair| pair[0] >= pair[1]));
    for tier in ["critical", "high", "medium", "low"] {
        assert!(ranked["by_priority"][tier].is_array(), "missing tier {tier}");
    }
}

#[test]
fn rank_rejects_out_of_range_limit() {
    let dir = tempfile::tempdir().unwrap();
    civic(&dir.path().join("civic.db"))
        .args(["rank", "--limit", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--limit"));
}
