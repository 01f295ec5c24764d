//! Batch conversion of a directory of songs.
//!
//! Each song runs on the blocking pool, at most `jobs` at a time. Ctrl-C
//! stops new songs from starting; songs already running finish.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use musicmidi::ConvertOptions;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::commands::{convert_file, Target};

/// What happened to one song
#[derive(Debug)]
pub enum Outcome {
    Written(PathBuf),
    Failed(anyhow::Error),
    /// Not started because the batch was cancelled
    Skipped,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub written: usize,
    pub failed: usize,
    pub skipped: usize,
}

/// Song files (`*.txt`) directly inside `dir`, sorted by name
pub fn song_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let entries =
        std::fs::read_dir(dir).with_context(|| format!("Failed to read directory {}", dir.display()))?;
    for entry in entries {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|e| e == "txt") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Convert every song in `inputs`, returning per-file outcomes in input order
pub async fn run(
    inputs: Vec<PathBuf>,
    output_dir: PathBuf,
    options: ConvertOptions,
    versioned: bool,
    jobs: usize,
    cancel: CancellationToken,
) -> Vec<(PathBuf, Outcome)> {
    let semaphore = Arc::new(Semaphore::new(jobs.max(1)));
    let options = Arc::new(options);
    let target = Target::Dir(output_dir);

    let mut handles = Vec::with_capacity(inputs.len());
    for input in inputs {
        let semaphore = Arc::clone(&semaphore);
        let options = Arc::clone(&options);
        let target = target.clone();
        let cancel = cancel.clone();

        let handle = tokio::spawn({
            let input = input.clone();
            async move {
                let permit = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return Outcome::Skipped,
                    permit = semaphore.acquire_owned() => match permit {
                        Ok(permit) => permit,
                        Err(_) => return Outcome::Skipped,
                    },
                };
                if cancel.is_cancelled() {
                    return Outcome::Skipped;
                }

                debug!(input = %input.display(), "starting song");
                let result = tokio::task::spawn_blocking(move || {
                    let _permit = permit;
                    convert_file(&input, &target, &options, versioned)
                })
                .await
                .context("Conversion task panicked");

                match result {
                    Ok(Ok(path)) => Outcome::Written(path),
                    Ok(Err(err)) | Err(err) => Outcome::Failed(err),
                }
            }
        });
        handles.push((input, handle));
    }

    let mut outcomes = Vec::with_capacity(handles.len());
    for (input, handle) in handles {
        let outcome = match handle.await {
            Ok(outcome) => outcome,
            Err(err) => Outcome::Failed(anyhow::Error::new(err).context("Batch task failed")),
        };
        outcomes.push((input, outcome));
    }
    outcomes
}

/// Print outcomes and count them
pub fn report(outcomes: &[(PathBuf, Outcome)]) -> Summary {
    let mut summary = Summary::default();
    for (input, outcome) in outcomes {
        match outcome {
            Outcome::Written(path) => {
                summary.written += 1;
                println!("{} -> {}", input.display(), path.display());
            }
            Outcome::Failed(err) => {
                summary.failed += 1;
                eprintln!("Error: {:#}", err);
            }
            Outcome::Skipped => {
                summary.skipped += 1;
                warn!(input = %input.display(), "skipped after cancellation");
            }
        }
    }
    info!(
        written = summary.written,
        failed = summary.failed,
        skipped = summary.skipped,
        "batch finished"
    );
    summary
}

/// `musicmidi batch`
pub async fn batch(
    dir: &Path,
    output_dir: PathBuf,
    options: ConvertOptions,
    versioned: bool,
    jobs: usize,
) -> Result<Summary> {
    let inputs = song_files(dir)?;
    if inputs.is_empty() {
        bail!("No .txt songs found in {}", dir.display());
    }

    let cancel = CancellationToken::new();
    let watcher = tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Received SIGINT, finishing running songs...");
                cancel.cancel();
            }
        }
    });

    let outcomes = run(inputs, output_dir, options, versioned, jobs, cancel).await;
    watcher.abort();

    Ok(report(&outcomes))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SONG: &str = "Title: Tiny\nMeasure 1 1.0 C4 mf quarter\n";

    fn write_songs(dir: &Path) {
        std::fs::write(dir.join("a.txt"), SONG).unwrap();
        std::fs::write(dir.join("b.txt"), "Measure 1001 1.0 C4 mf quarter\n").unwrap();
        std::fs::write(dir.join("c.txt"), SONG.replace("Tiny", "Other")).unwrap();
        std::fs::write(dir.join("notes.md"), "not a song").unwrap();
    }

    #[test]
    fn test_song_files_sorted_txt_only() {
        let dir = tempfile::tempdir().unwrap();
        write_songs(dir.path());
        let names: Vec<String> = song_files(dir.path())
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.txt", "b.txt", "c.txt"]);
    }

    #[tokio::test]
    async fn test_one_failure_does_not_stop_siblings() {
        let dir = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        write_songs(dir.path());

        let inputs = song_files(dir.path()).unwrap();
        let outcomes = run(
            inputs,
            out.path().to_path_buf(),
            ConvertOptions::default(),
            true,
            2,
            CancellationToken::new(),
        )
        .await;

        let summary = report(&outcomes);
        assert_eq!(
            summary,
            Summary {
                written: 2,
                failed: 1,
                skipped: 0
            }
        );
        assert!(out.path().join("tiny_v1.mid").exists());
        assert!(out.path().join("other_v1.mid").exists());
    }

    #[tokio::test]
    async fn test_cancelled_batch_skips_everything() {
        let dir = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        write_songs(dir.path());

        let cancel = CancellationToken::new();
        cancel.cancel();
        let outcomes = run(
            song_files(dir.path()).unwrap(),
            out.path().to_path_buf(),
            ConvertOptions::default(),
            true,
            1,
            cancel,
        )
        .await;

        assert!(outcomes.iter().all(|(_, o)| matches!(o, Outcome::Skipped)));
    }
}
