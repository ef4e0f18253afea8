//! Random record files for exercising the sorter.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::file::FileResult;
use crate::record::{RECORDS_PER_BLOCK, Record};

/// Keys " A" through " Z" when the file is viewed as text
const ASCII_KEY_BASE: i16 = 8257;
const ASCII_KEY_RANGE: i16 = 26;
/// Two spaces
const ASCII_VALUE: i16 = 8224;

/// Upper bound (exclusive) of binary keys and values; lower bound is 1
const BINARY_MAX: i16 = 30000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    /// Keys and values uniform in `[1, 30000)`
    Binary,
    /// Keys are letters, values are blanks: readable in a text editor
    Ascii,
}

/// Writes files of whole blocks of random records
pub struct FileGenerator {
    path: PathBuf,
    blocks: usize,
    rng: StdRng,
}

impl FileGenerator {
    pub fn new<P: AsRef<Path>>(path: P, blocks: usize) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            blocks,
            rng: StdRng::from_entropy(),
        }
    }

    /// Make generation deterministic
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Create (or truncate) the file and fill it
    pub fn generate(&mut self, kind: FileKind) -> FileResult<()> {
        let mut writer = BufWriter::new(File::create(&self.path)?);

        for _ in 0..self.blocks * RECORDS_PER_BLOCK {
            let record = match kind {
                FileKind::Binary => Record::new(
                    self.rng.gen_range(1..BINARY_MAX),
                    self.rng.gen_range(1..BINARY_MAX),
                ),
                FileKind::Ascii => Record::new(
                    ASCII_KEY_BASE + self.rng.gen_range(0..ASCII_KEY_RANGE),
                    ASCII_VALUE,
                ),
            };
            writer.write_all(&record.encode())?;
        }

        writer.flush()?;
        log::info!(
            "generated {} blocks of {:?} records in {}",
            self.blocks,
            kind,
            self.path.display()
        );
        Ok(())
    }
}
