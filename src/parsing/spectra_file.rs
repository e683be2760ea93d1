//! Parser for observed spectra files used by the command line.
//!
//! Format: `{"spectra": [{"camera": "b", "wave": [...], "flux": [...], "ivar": [...]}]}`

use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

use crate::core::spectrum::{Spectrum, SpectrumError, SpectrumSet};

#[derive(Error, Debug)]
pub enum SpectraFileError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid spectra file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Spectra file contains no cameras")]
    Empty,

    #[error(transparent)]
    Spectrum(#[from] SpectrumError),
}

#[derive(Debug, Deserialize)]
struct SpectraFile {
    spectra: Vec<Spectrum>,
}

/// Parse a spectra file from disk
///
/// # Errors
///
/// Returns `SpectraFileError::Io` if the file cannot be read, or other
/// errors if the content is invalid.
pub fn parse_spectra_file(path: &Path) -> Result<SpectrumSet, SpectraFileError> {
    let content = std::fs::read_to_string(path)?;
    parse_spectra_text(&content)
}

/// Parse spectra from JSON text
///
/// # Errors
///
/// Returns `SpectraFileError::Json` for malformed JSON, `Empty` when there
/// are no cameras, and `Spectrum` for inconsistent camera data.
pub fn parse_spectra_text(text: &str) -> Result<SpectrumSet, SpectraFileError> {
    let file: SpectraFile = serde_json::from_str(text)?;
    if file.spectra.is_empty() {
        return Err(SpectraFileError::Empty);
    }
    Ok(SpectrumSet::new(file.spectra)?)
}
