//! Versioned binary snapshots of belief states.
//!
//! A trained community posterior is stored with [`Checkpointable`] and later
//! reloaded as the prior for a new set of residents. Every snapshot carries a
//! version header; files written by an incompatible version are rejected.

use std::fmt;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use bincode::Options;
use serde::{Deserialize, Serialize};

use crate::model::{Gamma, Gaussian, Marginals};

const MARGINALS_CHECKPOINT_VERSION: u32 = 1;

#[derive(Debug)]
pub enum CheckpointError {
    /// Underlying I/O failure while reading or writing checkpoint files.
    Io(std::io::Error),
    /// Serialization or deserialization error from the binary codec.
    Serialization(bincode::Error),
    /// The file was well formed but written by another schema version.
    VersionMismatch { expected: u32, found: u32 },
    /// The decoded payload violates the type's invariants.
    InvalidFormat(String),
}

impl fmt::Display for CheckpointError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckpointError::Io(err) => write!(f, "I/O error while accessing checkpoint: {err}"),
            CheckpointError::Serialization(err) => {
                write!(f, "Failed to (de)serialize checkpoint payload: {err}")
            }
            CheckpointError::VersionMismatch { expected, found } => write!(
                f,
                "Checkpoint version mismatch: expected {expected}, found {found}",
            ),
            CheckpointError::InvalidFormat(msg) => {
                write!(f, "Checkpoint file has invalid structure: {msg}")
            }
        }
    }
}

impl std::error::Error for CheckpointError {}

impl From<std::io::Error> for CheckpointError {
    fn from(err: std::io::Error) -> Self {
        CheckpointError::Io(err)
    }
}

impl From<bincode::Error> for CheckpointError {
    fn from(err: bincode::Error) -> Self {
        CheckpointError::Serialization(err)
    }
}

fn codec() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .allow_trailing_bytes()
        .with_little_endian()
}

/// Types that can be written to and restored from a snapshot file.
pub trait Checkpointable: Sized {
    fn save_checkpoint<P: AsRef<Path>>(&self, path: P) -> Result<(), CheckpointError>;

    fn load_checkpoint<P: AsRef<Path>>(path: P) -> Result<Self, CheckpointError>;

    /// Write `snapshot` with the shared codec, creating the parent directory.
    fn write_snapshot<P, T>(snapshot: &T, path: P) -> Result<(), CheckpointError>
    where
        P: AsRef<Path>,
        T: Serialize,
    {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        codec().serialize_into(&mut writer, snapshot)?;
        writer.flush()?;
        Ok(())
    }

    fn read_snapshot<P, T>(path: P) -> Result<T, CheckpointError>
    where
        P: AsRef<Path>,
        T: serde::de::DeserializeOwned,
    {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);
        Ok(codec().deserialize_from(&mut reader)?)
    }
}

#[derive(Serialize, Deserialize)]
struct MarginalsCheckpoint {
    version: u32,
    weight_means: Vec<Gaussian>,
    weight_precisions: Vec<Gamma>,
    weights: Option<Vec<Vec<Gaussian>>>,
}

impl Checkpointable for Marginals {
    fn save_checkpoint<P: AsRef<Path>>(&self, path: P) -> Result<(), CheckpointError> {
        let snapshot = MarginalsCheckpoint {
            version: MARGINALS_CHECKPOINT_VERSION,
            weight_means: self.weight_means.clone(),
            weight_precisions: self.weight_precisions.clone(),
            weights: self.weights.clone(),
        };
        Self::write_snapshot(&snapshot, path)
    }

    fn load_checkpoint<P: AsRef<Path>>(path: P) -> Result<Self, CheckpointError> {
        let snapshot: MarginalsCheckpoint = Self::read_snapshot(path)?;
        if snapshot.version != MARGINALS_CHECKPOINT_VERSION {
            return Err(CheckpointError::VersionMismatch {
                expected: MARGINALS_CHECKPOINT_VERSION,
                found: snapshot.version,
            });
        }

        let marginals = Marginals {
            weight_means: snapshot.weight_means,
            weight_precisions: snapshot.weight_precisions,
            weights: snapshot.weights,
        };
        marginals
            .validate()
            .map_err(|err| CheckpointError::InvalidFormat(err.to_string()))?;
        Ok(marginals)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn marginals_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("community.bin");

        let mut marginals = Marginals::isotropic(3, Gaussian::new(0.5, 2.0), Gamma::new(2.0, 3.0));
        marginals.weights = Some(vec![vec![Gaussian::new(1.0, 0.25); 3]; 2]);
        marginals.save_checkpoint(&path).unwrap();

        let restored = Marginals::load_checkpoint(&path).unwrap();
        assert_eq!(restored, marginals);
    }

    #[test]
    fn rejects_other_version() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("old.bin");
        let snapshot = MarginalsCheckpoint {
            version: MARGINALS_CHECKPOINT_VERSION + 1,
            weight_means: vec![Gaussian::standard()],
            weight_precisions: vec![Gamma::default()],
            weights: None,
        };
        Marginals::write_snapshot(&snapshot, &path).unwrap();

        match Marginals::load_checkpoint(&path) {
            Err(CheckpointError::VersionMismatch { expected, found }) => {
                assert_eq!(expected, MARGINALS_CHECKPOINT_VERSION);
                assert_eq!(found, MARGINALS_CHECKPOINT_VERSION + 1);
            }
            other => panic!("unexpected result: {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn rejects_mismatched_lengths() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.bin");
        let snapshot = MarginalsCheckpoint {
            version: MARGINALS_CHECKPOINT_VERSION,
            weight_means: vec![Gaussian::standard(); 2],
            weight_precisions: vec![Gamma::default()],
            weights: None,
        };
        Marginals::write_snapshot(&snapshot, &path).unwrap();
        assert!(matches!(
            Marginals::load_checkpoint(&path),
            Err(CheckpointError::InvalidFormat(_))
        ));
    }
}
