//! Command-line smoke tests

mod common;

use assert_cmd::Command;
use predicates::prelude::*;
use rr_archetype::parsing::archetype_file::ArchetypeFile;
use rr_archetype::catalog::discovery::ARCHETYPE_DIR_ENV;
use rr_archetype::Archetype;

fn rr_archetype() -> Command {
    let mut cmd = Command::cargo_bin("rr-archetype").unwrap();
    cmd.env_remove(ARCHETYPE_DIR_ENV);
    cmd
}

fn fixture_galaxy() -> Archetype {
    Archetype::from_file(common::galaxy_file()).unwrap()
}

#[test]
fn test_catalog_list_packaged() {
    rr_archetype()
        .args(["catalog", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("GALAXY"))
        .stdout(predicate::str::contains("STAR"));
}

#[test]
fn test_catalog_list_from_env() {
    let dir = common::archetype_dir();
    let output = rr_archetype()
        .env(ARCHETYPE_DIR_ENV, dir.path())
        .args(["catalog", "list", "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let classes = json.as_array().unwrap();
    assert_eq!(classes.len(), 2);
    assert_eq!(classes[0]["class"], "GALAXY");
    assert_eq!(classes[0]["narch"], 3);
    assert_eq!(classes[0]["version"], "fixture-1");
}

#[test]
fn test_explicit_dir_beats_env() {
    let dir = common::archetype_dir();
    let other = tempfile::TempDir::new().unwrap();
    let mut qso = common::star_file();
    qso.rrtype = "QSO".to_string();
    common::write_archetype(other.path(), "rrarchetype-qso.json", &qso);

    rr_archetype()
        .env(ARCHETYPE_DIR_ENV, dir.path())
        .args(["catalog", "list", "--format", "tsv", "--dir"])
        .arg(other.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("QSO"))
        .stdout(predicate::str::contains("GALAXY").not());
}

#[test]
fn test_catalog_show() {
    let dir = common::archetype_dir();
    rr_archetype()
        .args(["catalog", "show", "GALAXY", "--format", "tsv", "--dir"])
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("0\tELG_0\tGALAXY:::ELG_0"))
        .stdout(predicate::str::contains("2\tLRG_2\tGALAXY:::LRG_2"));
}

#[test]
fn test_missing_directory_fails() {
    let dir = tempfile::TempDir::new().unwrap();
    rr_archetype()
        .args(["catalog", "list", "--dir"])
        .arg(dir.path().join("missing"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn test_duplicate_class_fails() {
    let dir = common::archetype_dir();
    common::write_archetype(dir.path(), "rrarchetype-galaxy2.json", &common::galaxy_file());
    rr_archetype()
        .args(["catalog", "list", "--dir"])
        .arg(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("GALAXY"));
}

#[test]
fn test_fit_json() {
    let dir = common::archetype_dir();
    let spectra = common::observe(&fixture_galaxy(), 1, 0.3, 2.0, 0.5);
    let spectra_path = common::write_spectra(dir.path(), &spectra);

    let output = rr_archetype()
        .arg("fit")
        .arg(&spectra_path)
        .args(["--class", "GALAXY", "--z", "0.3", "--nleg", "2", "--format", "json", "--dir"])
        .arg(dir.path())
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["best"]["full_type"], "GALAXY:::ELG_1");
    assert_eq!(json["best"]["index"], 1);
    assert_eq!(json["best"]["coeff"].as_array().unwrap().len(), 3);
    assert_eq!(json["best"]["scan_chi2"].as_array().unwrap().len(), 3);
}

#[test]
fn test_fit_sequential_text() {
    let dir = common::archetype_dir();
    let spectra = common::observe(&fixture_galaxy(), 2, 0.1, 1.0, 0.0);
    let spectra_path = common::write_spectra(dir.path(), &spectra);

    rr_archetype()
        .arg("fit")
        .arg(&spectra_path)
        .args(["--class", "GALAXY", "--z", "0.1", "--sequential", "--dir"])
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("GALAXY:::LRG_2"));
}

#[test]
fn test_fit_unknown_class() {
    let dir = common::archetype_dir();
    let spectra = common::observe(&fixture_galaxy(), 0, 0.1, 1.0, 0.0);
    let spectra_path = common::write_spectra(dir.path(), &spectra);

    rr_archetype()
        .arg("fit")
        .arg(&spectra_path)
        .args(["--class", "QSO", "--z", "0.1", "--dir"])
        .arg(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("No archetypes for class 'QSO'"))
        .stderr(predicate::str::contains("GALAXY, STAR"));
}

#[test]
fn test_fit_invalid_redshift() {
    let dir = common::archetype_dir();
    let spectra = common::observe(&fixture_galaxy(), 0, 0.1, 1.0, 0.0);
    let spectra_path = common::write_spectra(dir.path(), &spectra);

    rr_archetype()
        .arg("fit")
        .arg(&spectra_path)
        .args(["--class", "GALAXY", "--z", "-1.5", "--dir"])
        .arg(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid redshift"));
}

#[test]
fn test_model_tsv() {
    let dir = common::archetype_dir();
    let spectra = common::observe(&fixture_galaxy(), 0, 0.2, 1.0, 0.0);
    let spectra_path = common::write_spectra(dir.path(), &spectra);

    let output = rr_archetype()
        .arg("model")
        .arg(&spectra_path)
        .args([
            "--class", "GALAXY", "--z", "0.2", "--subtype", "ELG_0", "--coeff", "1.0,0.5,-0.1",
            "--format", "tsv", "--dir",
        ])
        .arg(dir.path())
        .output()
        .unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    let lines: Vec<_> = stdout.lines().collect();
    assert_eq!(lines[0], "camera\twave\tmodel");
    assert_eq!(lines.len(), spectra.len() + 1);
}

#[test]
fn test_model_coefficient_mismatch() {
    let dir = common::archetype_dir();
    let spectra = common::observe(&fixture_galaxy(), 0, 0.2, 1.0, 0.0);
    let spectra_path = common::write_spectra(dir.path(), &spectra);

    rr_archetype()
        .arg("model")
        .arg(&spectra_path)
        .args([
            "--class", "GALAXY", "--z", "0.2", "--subtype", "ELG_0", "--coeff", "1.0,0.5",
            "--nleg", "3", "--dir",
        ])
        .arg(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Expected 4 coefficients, got 2"));
}

#[test]
fn test_model_unknown_subtype() {
    let dir = common::archetype_dir();
    let spectra = common::observe(&fixture_galaxy(), 0, 0.2, 1.0, 0.0);
    let spectra_path = common::write_spectra(dir.path(), &spectra);

    rr_archetype()
        .arg("model")
        .arg(&spectra_path)
        .args(["--class", "GALAXY", "--z", "0.2", "--subtype", "ELG", "--coeff", "1.0", "--dir"])
        .arg(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("No archetype with subtype 'ELG'"));
}

#[test]
fn test_file_name_is_not_a_class() {
    // Classes come from RRTYPE, not from the file name
    let dir = tempfile::TempDir::new().unwrap();
    let file: ArchetypeFile = common::star_file();
    common::write_archetype(dir.path(), "rrarchetype-galaxy.json", &file);

    rr_archetype()
        .args(["catalog", "show", "STAR", "--dir"])
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("STAR:::K_1"));
}
