//! Output file naming.
//!
//! Generated names are `<title>_<key>_v<N>.mid`. Files are opened with
//! `create_new`, so a name taken by a concurrent writer moves on to the next
//! version instead of overwriting it.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use musicmidi::Key;
use tracing::warn;

/// Lowercase ASCII letters and digits, other runs collapsed to `_`
pub fn slug(text: &str) -> String {
    let mut out = String::new();
    for c in text.replace('#', " sharp ").chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
        } else if !out.is_empty() && !out.ends_with('_') {
            out.push('_');
        }
    }
    out.trim_end_matches('_').to_string()
}

/// `<title>` or `<title>_<key>`; `fallback` stands in for an empty title.
pub fn base_name(title: &str, key: Option<Key>, fallback: &str) -> String {
    let mut name = slug(title);
    if name.is_empty() {
        name = slug(fallback);
    }
    if name.is_empty() {
        name = "untitled".to_string();
    }
    if let Some(key) = key {
        let key = slug(&key.to_string());
        if !key.is_empty() {
            name.push('_');
            name.push_str(&key);
        }
    }
    name
}

/// Version number of `file_name` if it is `<base>_v<N>.mid`
fn version_of(file_name: &str, base: &str) -> Option<u32> {
    file_name
        .strip_prefix(base)?
        .strip_prefix("_v")?
        .strip_suffix(".mid")?
        .parse()
        .ok()
}

/// One more than the highest existing version of `base` in `dir`
pub fn next_version(dir: &Path, base: &str) -> io::Result<u32> {
    let mut highest = 0;
    match fs::read_dir(dir) {
        Ok(entries) => {
            for entry in entries {
                let entry = entry?;
                if let Some(version) = entry.file_name().to_str().and_then(|n| version_of(n, base)) {
                    highest = highest.max(version);
                }
            }
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(e),
    }
    Ok(highest + 1)
}

/// Write `bytes` to `path` only if it does not exist yet.
/// Returns false when the path was taken.
fn create_new(path: &Path, bytes: &[u8]) -> io::Result<bool> {
    create_new_with(path, |file| file.write_all(bytes))
}

/// A file whose write fails is removed again.
fn create_new_with(path: &Path, write: impl FnOnce(&mut File) -> io::Result<()>) -> io::Result<bool> {
    let mut file = match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => return Ok(false),
        Err(e) => return Err(e),
    };
    if let Err(e) = write(&mut file) {
        drop(file);
        if let Err(cleanup) = fs::remove_file(path) {
            warn!(path = %path.display(), error = %cleanup, "failed to remove partial file");
        }
        return Err(e);
    }
    Ok(true)
}

/// Write `<base>_v<N>.mid` into `dir` with the next free version.
pub fn write_versioned(dir: &Path, base: &str, bytes: &[u8]) -> io::Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let mut version = next_version(dir, base)?;
    loop {
        let path = dir.join(format!("{base}_v{version}.mid"));
        if create_new(&path, bytes)? {
            return Ok(path);
        }
        version += 1;
    }
}

/// Write `<base>.mid` into `dir`, replacing any existing file.
pub fn write_plain(dir: &Path, base: &str, bytes: &[u8]) -> io::Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(format!("{base}.mid"));
    fs::write(&path, bytes)?;
    Ok(path)
}

/// Write to an explicit path. When `versioned` and the path exists, the
/// first free `<stem>_v2`, `<stem>_v3`... next to it is used instead.
pub fn write_explicit(path: &Path, bytes: &[u8], versioned: bool) -> io::Result<PathBuf> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    if !versioned {
        fs::write(path, bytes)?;
        return Ok(path.to_path_buf());
    }
    if create_new(path, bytes)? {
        return Ok(path.to_path_buf());
    }

    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let extension = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    let mut version = 2;
    loop {
        let candidate = path.with_file_name(format!("{stem}_v{version}{extension}"));
        if create_new(&candidate, bytes)? {
            return Ok(candidate);
        }
        version += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use musicmidi::{Mode, NoteName};

    #[test]
    fn test_slug() {
        assert_eq!(slug("Ode to Joy!"), "ode_to_joy");
        assert_eq!(slug("  --Blues  for   Ticks-- "), "blues_for_ticks");
        assert_eq!(slug("F#m"), "f_sharp_m");
        assert_eq!(slug("???"), "");
    }

    #[test]
    fn test_base_name() {
        let key = Key {
            root: NoteName::A,
            accidental: None,
            mode: Mode::Minor,
        };
        assert_eq!(base_name("Call and Response", Some(key), "x"), "call_and_response_am");
        assert_eq!(base_name("", None, "my-song"), "my_song");
        assert_eq!(base_name("", None, ""), "untitled");
    }

    #[test]
    fn test_versions_increase() {
        let dir = tempfile::tempdir().unwrap();
        let first = write_versioned(dir.path(), "song", b"one").unwrap();
        let second = write_versioned(dir.path(), "song", b"two").unwrap();
        assert_eq!(first.file_name().unwrap(), "song_v1.mid");
        assert_eq!(second.file_name().unwrap(), "song_v2.mid");
        assert_eq!(fs::read(&first).unwrap(), b"one");
    }

    #[test]
    fn test_next_version_skips_gaps_and_other_names() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["song_v1.mid", "song_v7.mid", "song_c_v9.mid", "song_vx.mid"] {
            fs::write(dir.path().join(name), b"").unwrap();
        }
        assert_eq!(next_version(dir.path(), "song").unwrap(), 8);
        assert_eq!(next_version(&dir.path().join("missing"), "song").unwrap(), 1);
    }

    #[test]
    fn test_explicit_path_never_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.mid");
        assert_eq!(write_explicit(&path, b"a", true).unwrap(), path);
        let second = write_explicit(&path, b"b", true).unwrap();
        assert_eq!(second, dir.path().join("out_v2.mid"));
        let third = write_explicit(&path, b"c", true).unwrap();
        assert_eq!(third, dir.path().join("out_v3.mid"));
        assert_eq!(fs::read(&path).unwrap(), b"a");
    }

    #[test]
    fn test_failed_write_leaves_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("song_v1.mid");
        let err = create_new_with(&path, |file| {
            file.write_all(b"MThd")?;
            Err(io::Error::new(io::ErrorKind::WriteZero, "disk full"))
        })
        .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::WriteZero);
        assert!(!path.exists());
        assert_eq!(next_version(dir.path(), "song").unwrap(), 1);
    }

    #[test]
    fn test_unversioned_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.mid");
        write_explicit(&path, b"a", false).unwrap();
        write_explicit(&path, b"b", false).unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"b");

        let plain = write_plain(dir.path(), "song", b"c").unwrap();
        assert_eq!(plain.file_name().unwrap(), "song.mid");
    }
}
