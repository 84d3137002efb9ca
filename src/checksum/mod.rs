//! Signature index parsing and file hashing
//!
//! This module provides:
//! - Parsing of `sha256sum`-style index files
//! - Streaming file digests, with transparent gunzip for `.gz` files
//!
//! Everything here is synchronous and blocking. The verification caller in
//! `verify` moves it onto the blocking pool.

pub mod verify;

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::Path;

use flate2::read::MultiGzDecoder;
use serde::Deserialize;
use sha2::{Digest, Sha256, Sha512};

use crate::error::{IndexError, TaskError};

/// Digest used for file signatures.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Algorithm {
    #[default]
    Sha256,
    Sha512,
}

/// Parsed index: file name -> expected hex signature.
pub type SignatureIndex = BTreeMap<String, String>;

/// Parses an index in `sha256sum` output format.
///
/// Line example:
///     0c4ccc63a912bbd6d45174251415c089522e5c0e75286794ab1f86cb8e2561fd  taxi-01.csv
///
/// - Blank lines are skipped
/// - A leading `*` on the name (binary mode marker) is dropped
/// - A repeated name keeps the last signature
/// - Any other line without exactly two fields fails the whole parse
pub fn parse_index<R: BufRead>(reader: R) -> Result<SignatureIndex, IndexError> {
    let mut sigs = SignatureIndex::new();

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let fields: Vec<&str> = line.split_whitespace().collect();
        match fields.as_slice() {
            [] => continue,
            [sig, name] => {
                let name = name.strip_prefix('*').unwrap_or(*name);
                sigs.insert(name.to_string(), sig.to_string());
            }
            _ => {
                return Err(IndexError::MalformedLine {
                    line: idx + 1,
                    text: line.clone(),
                });
            }
        }
    }

    Ok(sigs)
}

/// Computes the lowercase hex digest of the file at `path`.
///
/// Files whose name ends with `.gz` are hashed after decompression, so
/// the signature matches `gunzip -c file | sha256sum`.
pub fn file_signature(path: &Path, algorithm: Algorithm) -> Result<String, TaskError> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);

    let gzipped = path.extension().is_some_and(|ext| ext == "gz");
    if gzipped {
        digest_reader(MultiGzDecoder::new(reader), algorithm)
    } else {
        digest_reader(reader, algorithm)
    }
}

fn digest_reader<R: Read>(reader: R, algorithm: Algorithm) -> Result<String, TaskError> {
    match algorithm {
        Algorithm::Sha256 => hash_with(reader, Sha256::new()),
        Algorithm::Sha512 => hash_with(reader, Sha512::new()),
    }
}

fn hash_with<R: Read, D: Digest + Write>(mut reader: R, mut hasher: D) -> Result<String, TaskError> {
    io::copy(&mut reader, &mut hasher)?;
    let hash = hasher.finalize();
    Ok(hash.iter().map(|b| format!("{b:02x}")).collect())
}

/// Opens and parses an index file.
pub fn load_index(path: &Path) -> Result<SignatureIndex, IndexError> {
    let file = File::open(path)?;
    parse_index(BufReader::new(file))
}
