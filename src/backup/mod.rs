//! ## Durable cab log
//!
//! Cab calls are the only orders a node keeps across a restart. They live in a small text
//! file, one decimal floor per line:
//!
//! ```text
//! 0
//! 3
//! ```
//!
//! The file mirrors an in-memory set and is rewritten wholesale on every change, via a
//! temporary file and a rename so a crash mid-write leaves either the old or the new set.
//! Hall calls are never written here; after a crash they come back through the network or a
//! fresh button press.

use std::collections::BTreeSet;
use std::ffi::OsString;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::elevio::Floor;
use crate::print;

/// The persisted set of floors with outstanding cab calls
#[derive(Debug)]
pub struct CabLog {
    path: PathBuf,
    floors: BTreeSet<Floor>,
}

impl CabLog {
    /// Opens the log at `path`, creating an empty one if it does not exist.
    ///
    /// Lines that are not a floor below `num_floors` are skipped with a warning.
    pub fn open(path: impl AsRef<Path>, num_floors: u8) -> anyhow::Result<CabLog> {
        let path = path.as_ref().to_path_buf();
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                fs::write(&path, "")
                    .with_context(|| format!("Could not create cab log {}", path.display()))?;
                print::info(format!("Created empty cab log {}", path.display()));
                String::new()
            }
            Err(e) => {
                return Err(e).with_context(|| format!("Could not read cab log {}", path.display()))
            }
        };

        let mut floors = BTreeSet::new();
        for (n, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match line.parse::<Floor>() {
                Ok(floor) if floor < num_floors => {
                    floors.insert(floor);
                }
                _ => print::warn(format!(
                    "Skipping line {} of {}: {:?} is not a floor",
                    n + 1,
                    path.display(),
                    line
                )),
            }
        }

        Ok(CabLog { path, floors })
    }

    /// Floors with an outstanding cab call, lowest first
    pub fn floors(&self) -> impl Iterator<Item = Floor> + '_ {
        self.floors.iter().copied()
    }

    /// Adds `floor`. Adding a floor already in the log changes nothing, the file included.
    pub fn add(&mut self, floor: Floor) {
        if self.floors.insert(floor) {
            self.persist_or_log();
        }
    }

    /// Removes `floor` if present
    pub fn remove(&mut self, floor: Floor) {
        if self.floors.remove(&floor) {
            self.persist_or_log();
        }
    }

    /// The in-memory set stays authoritative when the disk refuses a write.
    fn persist_or_log(&self) {
        if let Err(e) = self.persist() {
            print::err(format!("Cab log not saved: {:#}", e));
        }
    }

    fn persist(&self) -> anyhow::Result<()> {
        let mut tmp: OsString = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        let mut file = fs::File::create(&tmp)
            .with_context(|| format!("Could not create {}", tmp.display()))?;
        for floor in &self.floors {
            writeln!(file, "{}", floor)?;
        }
        file.sync_all()?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("Could not replace {}", self.path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn on_disk(path: &Path) -> String {
        fs::read_to_string(path).unwrap()
    }

    #[test]
    fn missing_file_is_created_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cab.log");

        let log = CabLog::open(&path, 4).unwrap();
        assert_eq!(log.floors().count(), 0);
        assert!(path.exists());
        assert_eq!(on_disk(&path), "");
    }

    #[test]
    fn adding_twice_writes_one_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cab.log");
        let mut log = CabLog::open(&path, 4).unwrap();

        log.add(2);
        log.add(2);
        log.add(0);
        assert_eq!(on_disk(&path), "0\n2\n");

        log.remove(2);
        log.remove(3);
        assert_eq!(on_disk(&path), "0\n");
    }

    #[test]
    fn floors_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cab.log");
        {
            let mut log = CabLog::open(&path, 4).unwrap();
            log.add(3);
            log.add(1);
        }
        let log = CabLog::open(&path, 4).unwrap();
        assert_eq!(log.floors().collect::<Vec<_>>(), vec![1, 3]);
    }

    #[test]
    fn garbage_lines_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cab.log");
        fs::write(&path, "1\nfloor two\n\n7\n 2 \n").unwrap();

        let log = CabLog::open(&path, 4).unwrap();
        assert_eq!(log.floors().collect::<Vec<_>>(), vec![1, 2]);
    }
}
