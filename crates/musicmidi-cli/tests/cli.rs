//! End-to-end tests for the musicmidi binary

use assert_cmd::Command;
use midly::Smf;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const SONG: &str = "\
Title: Little Tune
Key: G
Tempo: 100
Measure 1 1.0 G4 mf quarter
Measure 1 2.0 B4 mf quarter
| D5h G4h |
";

/// A command isolated from the user's config and environment
fn musicmidi(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("musicmidi").unwrap();
    cmd.current_dir(home.path())
        .env("HOME", home.path())
        .env_remove("XDG_CONFIG_HOME")
        .env_remove("RUST_LOG")
        .env_remove("MUSICMIDI_STYLE")
        .env_remove("MUSICMIDI_GENRE")
        .env_remove("MUSICMIDI_HARMONY_WINDOW")
        .env_remove("MUSICMIDI_OUTPUT_DIR")
        .env_remove("MUSICMIDI_LOG_LEVEL");
    cmd
}

fn write_song(dir: &Path, name: &str, text: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    fs::write(&path, text).unwrap();
    path
}

#[test]
fn convert_writes_versioned_midi() {
    let home = TempDir::new().unwrap();
    let input = write_song(home.path(), "tune.txt", SONG);

    musicmidi(&home)
        .arg("convert")
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("little_tune_g_v1.mid"));

    musicmidi(&home)
        .arg("convert")
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("little_tune_g_v2.mid"));

    let bytes = fs::read(home.path().join("little_tune_g_v1.mid")).unwrap();
    let smf = Smf::parse(&bytes).unwrap();
    // melody plus basic bass
    assert_eq!(smf.tracks.len(), 3);
    assert_eq!(
        bytes,
        fs::read(home.path().join("little_tune_g_v2.mid")).unwrap()
    );
}

#[test]
fn convert_explicit_output_is_not_overwritten() {
    let home = TempDir::new().unwrap();
    let input = write_song(home.path(), "tune.txt", SONG);
    let output = home.path().join("out.mid");
    fs::write(&output, b"keep me").unwrap();

    musicmidi(&home)
        .args(["convert", "--style", "none", "-o"])
        .arg(&output)
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("out_v2.mid"));

    assert_eq!(fs::read(&output).unwrap(), b"keep me");
    let bytes = fs::read(home.path().join("out_v2.mid")).unwrap();
    let smf = Smf::parse(&bytes).unwrap();
    assert_eq!(smf.tracks.len(), 1);
}

#[test]
fn parse_errors_report_line_numbers() {
    let home = TempDir::new().unwrap();
    let input = write_song(
        home.path(),
        "bad.txt",
        "Title: Bad\nMeasure 1 1.0 C4 mf quarter\nMeasure 1001 1.0 C4 mf quarter\nMeasure 1 2.0 C4 loud quarter\n",
    );

    musicmidi(&home)
        .arg("convert")
        .arg(&input)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("line 3: RangeError"))
        .stderr(predicate::str::contains("line 4: ReferenceError"))
        .stderr(predicate::str::contains("2 parse error(s)"));

    assert!(!home.path().join("bad_v1.mid").exists());
}

#[test]
fn timing_error_names_measure_and_beat() {
    let home = TempDir::new().unwrap();
    let input = write_song(home.path(), "late.txt", "Measure 1 6.0 C5 p quarter\n");

    musicmidi(&home)
        .arg("convert")
        .arg(&input)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("TimingError"))
        .stderr(predicate::str::contains("measure 1"))
        .stderr(predicate::str::contains("beat 6"));
}

#[test]
fn genre_style_without_genre_is_usage_error() {
    let home = TempDir::new().unwrap();
    let input = write_song(home.path(), "tune.txt", SONG);

    musicmidi(&home)
        .args(["convert", "--style", "genre"])
        .arg(&input)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("needs a genre"));

    musicmidi(&home)
        .args(["convert", "--style", "genre", "--genre", "rock"])
        .arg(&input)
        .assert()
        .success();
}

#[test]
fn unknown_style_is_usage_error() {
    let home = TempDir::new().unwrap();
    let input = write_song(home.path(), "tune.txt", SONG);

    musicmidi(&home)
        .args(["convert", "--style", "polka"])
        .arg(&input)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("unknown style 'polka'"));
}

#[test]
fn inspect_prints_json() {
    let home = TempDir::new().unwrap();
    let input = write_song(home.path(), "tune.txt", SONG);

    musicmidi(&home)
        .args(["inspect", "--style", "waltz"])
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"title\": \"Little Tune\""))
        .stdout(predicate::str::contains("\"style\": \"waltz\""))
        .stdout(predicate::str::contains("\"accompaniment\""));
}

#[test]
fn config_file_sets_output_dir_and_style() {
    let home = TempDir::new().unwrap();
    let input = write_song(home.path(), "tune.txt", SONG);
    let config = home.path().join("custom.toml");
    fs::write(
        &config,
        "[convert]\nstyle = \"none\"\n\n[output]\ndir = \"midi\"\nversioned = false\n",
    )
    .unwrap();

    musicmidi(&home)
        .arg("--config")
        .arg(&config)
        .arg("convert")
        .arg(&input)
        .assert()
        .success();

    let bytes = fs::read(home.path().join("midi").join("little_tune_g.mid")).unwrap();
    assert_eq!(Smf::parse(&bytes).unwrap().tracks.len(), 1);

    musicmidi(&home)
        .arg("--config")
        .arg(&config)
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("style = \"none\""))
        .stdout(predicate::str::contains("versioned = false"))
        .stdout(predicate::str::contains("custom.toml"));
}

#[test]
fn missing_config_file_fails() {
    let home = TempDir::new().unwrap();

    musicmidi(&home)
        .args(["--config", "nope.toml", "config"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("nope.toml"));
}

#[test]
fn batch_converts_directory_and_reports_failures() {
    let home = TempDir::new().unwrap();
    let songs = home.path().join("songs");
    fs::create_dir(&songs).unwrap();
    write_song(&songs, "a.txt", SONG);
    write_song(&songs, "b.txt", &SONG.replace("Little Tune", "Second Tune"));
    write_song(&songs, "c.txt", "Measure 0 1.0 C4 mf quarter\n");
    let out = home.path().join("out");

    musicmidi(&home)
        .args(["batch", "--jobs", "2", "--output-dir"])
        .arg(&out)
        .arg(&songs)
        .assert()
        .code(1)
        .stdout(predicate::str::contains("2 converted, 1 failed, 0 skipped"))
        .stderr(predicate::str::contains("c.txt"));

    assert!(out.join("little_tune_g_v1.mid").exists());
    assert!(out.join("second_tune_g_v1.mid").exists());
}

#[test]
fn batch_all_good_succeeds() {
    let home = TempDir::new().unwrap();
    let songs = home.path().join("songs");
    fs::create_dir(&songs).unwrap();
    write_song(&songs, "a.txt", SONG);

    musicmidi(&home)
        .arg("batch")
        .arg(&songs)
        .assert()
        .success()
        .stdout(predicate::str::contains("1 converted, 0 failed, 0 skipped"));
}
