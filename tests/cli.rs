//! Integration tests for the `jptools` command line.
use assert_cmd::Command;
use predicates::prelude::*;
use std::{fs, path::PathBuf};
use tempfile::TempDir;

fn data(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/data")
        .join(name)
}

fn jptools() -> Command {
    Command::cargo_bin("jptools").unwrap()
}

#[test]
fn test_show_settings_file() {
    jptools()
        .args(["bsub", "-e"])
        .assert()
        .success()
        .stdout(predicate::str::contains("<Settings>"))
        .stdout(predicate::str::contains("<ShellscriptCmd>"));
}

#[test]
fn test_bsub_help_lists_placeholders() {
    jptools()
        .args(["bsub", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("%%SHELLSCRIPT"));
}

#[test]
fn test_wrong_number_of_arguments() {
    jptools()
        .args(["bsub", "settings.xml", "batchfile"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("<BATCH_ID>"));
}

#[test]
fn test_missing_subcommand() {
    jptools().assert().code(2);
}

#[test]
fn test_bsub_no_execution() {
    let dir = TempDir::new().unwrap();
    jptools()
        .current_dir(dir.path())
        .arg("bsub")
        .arg("-n")
        .arg(data("settings.xml"))
        .arg(data("batchfile"))
        .arg("RUN7")
        .assert()
        .success()
        .stdout(predicate::str::contains("Generated but did not submit"))
        .stdout(predicate::str::contains(
            "...done. Processed 5 jobs for 3 nodes.",
        ));

    let scripts = dir.path().join("home/scripts");
    let first = fs::read_to_string(scripts.join("batchfile.RUN7.0.sh")).unwrap();
    assert!(first.starts_with("#!/bin/bash\n"));
    assert!(first.contains("(run -o BBB.RUN7.out AAA) &\n"));
    assert!(first.contains("(run -o bbb.RUN7.out aaa) &\n"));
    let last = fs::read_to_string(scripts.join("batchfile.RUN7.2.sh")).unwrap();
    assert!(last.contains("(run -o HHH.RUN7.out GGG) &\n"));
    assert!(!scripts.join("batchfile.RUN7.3.sh").exists());
    // Nothing but the shell-script directory is created without execution.
    assert!(!dir.path().join("home/results").exists());
}

#[test]
fn test_bsub_no_execution_prints_precommand() {
    let dir = TempDir::new().unwrap();
    let settings = dir.path().join("pre.xml");
    fs::write(
        &settings,
        "<Settings><HomeDir>home</HomeDir>\
         <PreCmd>touch %%HOMEDIR/pre-ran.%%BATCHID</PreCmd>\
         <Cmd>run %%0</Cmd>\
         <ShellscriptOutDir>%%HOMEDIR/scripts</ShellscriptOutDir>\
         <ShellscriptCmd>submit %%SHELLSCRIPT</ShellscriptCmd></Settings>",
    )
    .unwrap();
    jptools()
        .current_dir(dir.path())
        .arg("bsub")
        .arg("-n")
        .arg(&settings)
        .arg(data("batchfile"))
        .arg("RUN8")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Precommand (not executed): touch home/pre-ran.RUN8\n",
        ));
    assert!(!dir.path().join("home/pre-ran.RUN8").exists());
}

#[test]
fn test_bsub_validation_error() {
    let dir = TempDir::new().unwrap();
    let settings = dir.path().join("set.xml");
    fs::write(
        &settings,
        "<Settings><ShellscriptOutDir>s</ShellscriptOutDir>\
         <ShellscriptCmd>true</ShellscriptCmd></Settings>",
    )
    .unwrap();
    jptools()
        .current_dir(dir.path())
        .arg("bsub")
        .arg(&settings)
        .arg(data("batchfile"))
        .arg("X")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Error: missing batch command"));
    assert!(!dir.path().join("s").exists());
}

#[test]
fn test_deps_report() {
    jptools()
        .arg("deps")
        .arg(data("pom.xml"))
        .assert()
        .success()
        .stdout(predicate::str::starts_with(
            "Group ID\tArtifact ID\tVersion\tType\tClassifier\tScope\n",
        ))
        .stdout(predicate::str::contains("junit\tjunit\t4.13.2\t\t\ttest\n"))
        .stdout(predicate::str::contains("org.biojava\tbiojava-phylo\t\t\t\t\n"));
}

#[test]
fn test_quantiles() {
    jptools()
        .args(["quantiles", "-q", "0.5,1"])
        .arg(data("sorted.txt"))
        .assert()
        .success()
        .stdout("0.5\t2.5\n1\t5.0\n");
}

#[test]
fn test_quantiles_bad_fraction() {
    jptools()
        .args(["quantiles", "-q", "2"])
        .arg(data("sorted.txt"))
        .assert()
        .code(2)
        .stderr(predicate::str::contains("not a fraction"));
}
