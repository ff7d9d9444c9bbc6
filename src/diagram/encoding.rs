//! PlantUML text encoding
//!
//! Raw deflate, then base64 over PlantUML's URL-safe alphabet, emitted in
//! whole four-character groups.

use base64::alphabet::Alphabet;
use base64::engine::general_purpose::{GeneralPurpose, NO_PAD};
use base64::Engine;
use flate2::write::DeflateEncoder;
use flate2::Compression;
use std::io::Write;

const PLANTUML_ALPHABET: Alphabet =
    match Alphabet::new("0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz-_") {
        Ok(alphabet) => alphabet,
        Err(_) => panic!("PlantUML alphabet is valid"),
    };

const PLANTUML_ENGINE: GeneralPurpose = GeneralPurpose::new(&PLANTUML_ALPHABET, NO_PAD);

/// Encode diagram source for a PlantUML server URL
pub fn encode_plantuml(source: &str) -> std::io::Result<String> {
    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::best());
    encoder.write_all(source.as_bytes())?;
    let compressed = encoder.finish()?;

    let mut encoded = PLANTUML_ENGINE.encode(compressed);
    // Partial groups are zero-filled, and zero is '0' in this alphabet
    while encoded.len() % 4 != 0 {
        encoded.push('0');
    }
    Ok(encoded)
}
