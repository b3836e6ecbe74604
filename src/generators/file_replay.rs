//! Dice replayed from a byte sequence.
//!
//! Only the ASCII digits `1` to `6` are significant; every other byte is skipped.
//! Reaching the end rewinds to the start. A sequence with no significant byte at all
//! is reported as exhausted after one full pass.

use std::fmt;
use std::fs::File;
use std::io::{BufReader, Cursor, ErrorKind, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use crate::diagnostics::SeedReport;
use crate::generator::{DiceGenerator, RawRoll};
use crate::seed::Seed;
use crate::{DiceError, Variant};

/// Where the dice come from.
enum Backing {
    File {
        path: PathBuf,
        reader: Option<BufReader<File>>,
    },
    Memory {
        label: String,
        cursor: Cursor<Vec<u8>>,
    },
}

impl Backing {
    fn name(&self) -> String {
        match self {
            Self::File { path, .. } => path.display().to_string(),
            Self::Memory { label, .. } => label.clone(),
        }
    }
}

/// Dice read from a file or an in-memory sequence.
#[derive(Default)]
pub struct FileReplayGenerator {
    backing: Option<Backing>,
    /// Byte offset of the next read.
    position: u64,
}

fn open_at(path: &Path, position: u64) -> Result<BufReader<File>, DiceError> {
    let file = File::open(path).map_err(|err| DiceError::Io {
        context: format!("cannot open dice file {}: {}", path.display(), err),
    })?;
    let mut reader = BufReader::new(file);
    if position > 0 {
        reader
            .seek(SeekFrom::Start(position))
            .map_err(|err| DiceError::Io {
                context: format!("cannot position dice file {}: {}", path.display(), err),
            })?;
    }
    Ok(reader)
}

/// Reads up to and including the next significant byte, rewinding at the end.
fn read_die<R: Read + Seek + ?Sized>(
    reader: &mut R,
    position: &mut u64,
    name: &str,
) -> Result<u32, DiceError> {
    let mut rewound = false;
    let mut byte = [0u8; 1];
    loop {
        match reader.read(&mut byte) {
            Ok(0) => {
                if rewound {
                    return Err(DiceError::SourceExhausted {
                        source_name: name.to_owned(),
                        reason: "no dice (digits 1 to 6) in the whole sequence".to_owned(),
                    });
                }
                tracing::info!(source = name, "rewinding dice file");
                reader
                    .seek(SeekFrom::Start(0))
                    .map_err(|err| DiceError::Io {
                        context: format!("cannot rewind dice file {}: {}", name, err),
                    })?;
                *position = 0;
                rewound = true;
            }
            Ok(_) => {
                *position += 1;
                if (b'1'..=b'6').contains(&byte[0]) {
                    return Ok(u32::from(byte[0] - b'0'));
                }
            }
            Err(err) if err.kind() == ErrorKind::Interrupted => {}
            Err(err) => {
                return Err(DiceError::SourceExhausted {
                    source_name: name.to_owned(),
                    reason: err.to_string(),
                })
            }
        }
    }
}

impl FileReplayGenerator {
    /// Opens `path` and replays it from the start.
    ///
    /// # Errors
    /// [`DiceError::Io`] if the file cannot be opened.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, DiceError> {
        let path = path.as_ref().to_path_buf();
        let reader = open_at(&path, 0)?;
        tracing::debug!(path = %path.display(), "dice file opened");
        Ok(Self {
            backing: Some(Backing::File {
                path,
                reader: Some(reader),
            }),
            position: 0,
        })
    }

    /// Replays an in-memory sequence; `label` names it in reports.
    #[must_use]
    pub fn from_bytes(bytes: impl Into<Vec<u8>>, label: impl Into<String>) -> Self {
        Self {
            backing: Some(Backing::Memory {
                label: label.into(),
                cursor: Cursor::new(bytes.into()),
            }),
            position: 0,
        }
    }

    /// Whether a file handle or in-memory sequence is held right now.
    #[must_use]
    pub fn is_open(&self) -> bool {
        match &self.backing {
            Some(Backing::File { reader, .. }) => reader.is_some(),
            Some(Backing::Memory { .. }) => true,
            None => false,
        }
    }

    /// The file path or label being replayed.
    #[must_use]
    pub fn source_name(&self) -> Option<String> {
        self.backing.as_ref().map(Backing::name)
    }

    /// Offset of the next byte to be read.
    #[must_use]
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Next die, or `Ok(None)` when no source was ever given.
    ///
    /// A closed file is re-opened at the offset where it was closed.
    fn next_die(&mut self) -> Result<Option<u32>, DiceError> {
        let Some(backing) = self.backing.as_mut() else {
            return Ok(None);
        };
        let name = backing.name();
        let die = match backing {
            Backing::File { path, reader } => {
                if reader.is_none() {
                    tracing::debug!(
                        path = %path.display(),
                        position = self.position,
                        "reopening dice file"
                    );
                    *reader = Some(open_at(path, self.position)?);
                }
                let Some(reader) = reader.as_mut() else {
                    return Ok(None);
                };
                read_die(reader, &mut self.position, &name)?
            }
            Backing::Memory { cursor, .. } => read_die(cursor, &mut self.position, &name)?,
        };
        Ok(Some(die))
    }
}

impl fmt::Debug for FileReplayGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileReplayGenerator")
            .field("source", &self.source_name())
            .field("open", &self.is_open())
            .field("position", &self.position)
            .finish()
    }
}

impl DiceGenerator for FileReplayGenerator {
    fn variant(&self) -> Variant {
        Variant::FileReplay
    }

    fn install_seed(&mut self, _seed: &Seed) -> Result<(), DiceError> {
        Ok(())
    }

    fn roll(&mut self) -> Result<RawRoll, DiceError> {
        let (Some(first), Some(second)) = (self.next_die()?, self.next_die()?) else {
            tracing::warn!("no dice file is open");
            return Ok(RawRoll::failed(2));
        };
        Ok(RawRoll::new([first, second], 2))
    }

    fn seed_report(&self) -> SeedReport {
        match &self.backing {
            Some(Backing::File { path, .. }) => SeedReport::File(path.clone()),
            Some(Backing::Memory { label, .. }) => SeedReport::File(PathBuf::from(label)),
            None => SeedReport::NotApplicable,
        }
    }

    fn close(&mut self) {
        if let Some(Backing::File { path, reader }) = &mut self.backing {
            if reader.take().is_some() {
                tracing::debug!(path = %path.display(), "dice file closed");
            }
        }
    }

    fn duplicate(&self) -> Result<Box<dyn DiceGenerator>, DiceError> {
        let backing = match &self.backing {
            Some(Backing::File { path, reader }) => Some(Backing::File {
                path: path.clone(),
                reader: match reader {
                    Some(_) => Some(open_at(path, self.position)?),
                    None => None,
                },
            }),
            Some(Backing::Memory { label, cursor }) => Some(Backing::Memory {
                label: label.clone(),
                cursor: cursor.clone(),
            }),
            None => None,
        };
        Ok(Box::new(Self {
            backing,
            position: self.position,
        }))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn dice(generator: &mut FileReplayGenerator, pairs: usize) -> Vec<u32> {
        (0..pairs)
            .flat_map(|_| generator.roll().unwrap().dice)
            .collect()
    }

    #[test]
    fn test_skips_and_rewinds() {
        let mut generator = FileReplayGenerator::from_bytes(*b"3x9a5\n2", "inline");
        assert_eq!(dice(&mut generator, 3), vec![3, 5, 2, 3, 5, 2]);
    }

    #[test]
    fn test_rewind_mid_roll() {
        let mut generator = FileReplayGenerator::from_bytes(*b"123", "inline");
        assert_eq!(dice(&mut generator, 2), vec![1, 2, 3, 1]);
        assert_eq!(generator.position(), 1);
    }

    #[test]
    fn test_no_valid_bytes_is_exhausted() {
        for bytes in [&b""[..], b"0789abc\n"] {
            let mut generator = FileReplayGenerator::from_bytes(bytes, "junk");
            let err = generator.roll().unwrap_err();
            assert!(
                matches!(err, DiceError::SourceExhausted { ref source_name, .. } if source_name == "junk"),
                "{err:?}"
            );
        }
    }

    #[test]
    fn test_unopened_yields_sentinel() {
        let mut generator = FileReplayGenerator::default();
        assert_eq!(generator.roll().unwrap(), RawRoll::failed(2));
        assert_eq!(generator.seed_report(), SeedReport::NotApplicable);
        assert!(!generator.is_open());
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = FileReplayGenerator::open("/definitely/not/a/dice/file").unwrap_err();
        assert!(matches!(err, DiceError::Io { .. }));
    }

    #[test]
    fn test_duplicate_continues_independently() {
        let mut generator = FileReplayGenerator::from_bytes(*b"123456", "inline");
        generator.roll().unwrap();
        let mut copy = generator.duplicate().unwrap();
        assert_eq!(generator.roll().unwrap().dice, [3, 4]);
        assert_eq!(copy.roll().unwrap().dice, [3, 4]);
        assert_eq!(copy.roll().unwrap().dice, [5, 6]);
    }

    #[test]
    fn test_closed_file_resumes_at_offset() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"1234").unwrap();
        file.flush().unwrap();

        let mut generator = FileReplayGenerator::open(file.path()).unwrap();
        assert_eq!(generator.roll().unwrap().dice, [1, 2]);
        generator.close();
        assert!(!generator.is_open());
        assert_eq!(generator.position(), 2);

        assert_eq!(generator.roll().unwrap().dice, [3, 4]);
        assert!(generator.is_open());
        assert_eq!(generator.roll().unwrap().dice, [1, 2]);
    }

    #[test]
    fn test_closed_file_that_vanished_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dice.txt");
        std::fs::write(&path, b"66").unwrap();

        let mut generator = FileReplayGenerator::open(&path).unwrap();
        generator.close();
        std::fs::remove_file(&path).unwrap();
        assert!(matches!(generator.roll(), Err(DiceError::Io { .. })));
    }

    #[test]
    fn test_memory_report_uses_label() {
        let generator = FileReplayGenerator::from_bytes(*b"1", "fixture");
        assert_eq!(generator.seed_report().to_string(), "Reading dice from file: fixture");
    }
}
