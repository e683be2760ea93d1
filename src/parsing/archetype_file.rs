//! Parser for archetype template files.
//!
//! A template file holds one spectral class. Its `header` carries the
//! same keywords as a redrock FITS archetype header and its `data` table the
//! template fluxes and subtype labels:
//!
//! | Field | Location | Meaning |
//! |-------|----------|---------|
//! | `RRTYPE` | header | spectral class |
//! | `VERSION` | header | provenance string |
//! | `CRVAL1` | header | first wavelength (or log10 wavelength) |
//! | `CDELT1` | header | wavelength step |
//! | `LOGLAM` | header | grid is log10(wavelength) |
//! | `ARCHETYPE` | data | `narch × nwave` flux rows |
//! | `SUBTYPE` | data | raw subtype label per row |

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::utils::validation::{count_to_f64, is_strictly_increasing};

#[derive(Error, Debug)]
pub enum FormatError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Missing required field '{0}'")]
    MissingField(&'static str),

    #[error("Invalid value for '{field}': {reason}")]
    InvalidField { field: &'static str, reason: String },

    #[error("ARCHETYPE has {flux} rows but SUBTYPE has {subtype}")]
    RowCountMismatch { flux: usize, subtype: usize },

    #[error("ARCHETYPE row {row} has {found} values, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("Wavelength grid has {0} samples, need at least 2")]
    TooFewSamples(usize),

    #[error("Wavelength grid is not strictly increasing (CDELT1 = {0})")]
    NonIncreasingWave(f64),

    #[error("ARCHETYPE row {row} contains a non-finite flux value")]
    NonFiniteFlux { row: usize },
}

/// Contents of one template file, validated but not yet indexed
#[derive(Debug, Clone, PartialEq)]
pub struct ArchetypeFile {
    /// Spectral class (`RRTYPE`), trimmed
    pub rrtype: String,

    /// Provenance (`VERSION`)
    pub version: String,

    /// Grid origin (`CRVAL1`)
    pub crval1: f64,

    /// Grid step (`CDELT1`)
    pub cdelt1: f64,

    /// Grid values are log10(wavelength) (`LOGLAM`)
    pub loglam: bool,

    /// Raw subtype labels, trimmed (`SUBTYPE`)
    pub subtypes: Vec<String>,

    /// Flux rows (`ARCHETYPE`)
    pub flux: Vec<Vec<f64>>,
}

impl ArchetypeFile {
    /// Number of samples per template
    #[must_use]
    pub fn nwave(&self) -> usize {
        self.flux.first().map_or(0, Vec::len)
    }

    /// Wavelength grid: `CRVAL1 + CDELT1 * k`, exponentiated when `LOGLAM`
    #[must_use]
    pub fn wavelengths(&self) -> Vec<f64> {
        (0..self.nwave())
            .map(|k| {
                let x = self.crval1 + self.cdelt1 * count_to_f64(k);
                if self.loglam {
                    10f64.powf(x)
                } else {
                    x
                }
            })
            .collect()
    }

    /// Serialize in the on-disk layout
    ///
    /// # Errors
    ///
    /// Returns `FormatError::Json` if serialization fails.
    pub fn to_json(&self) -> Result<String, FormatError> {
        let raw = RawArchetypeFile {
            header: Some(RawHeader {
                rrtype: Some(self.rrtype.clone()),
                version: Some(Version::Text(self.version.clone())),
                crval1: Some(self.crval1),
                cdelt1: Some(self.cdelt1),
                loglam: Some(LogLam::Flag(self.loglam)),
            }),
            data: Some(RawData {
                subtype: Some(self.subtypes.clone()),
                archetype: Some(self.flux.clone()),
            }),
        };
        Ok(serde_json::to_string_pretty(&raw)?)
    }

    /// Check the table shape and wavelength grid
    ///
    /// # Errors
    ///
    /// Returns `RowCountMismatch`, `RaggedRow`, `NonFiniteFlux`,
    /// `TooFewSamples` or `NonIncreasingWave`.
    pub fn validate(&self) -> Result<(), FormatError> {
        if self.flux.len() != self.subtypes.len() {
            return Err(FormatError::RowCountMismatch {
                flux: self.flux.len(),
                subtype: self.subtypes.len(),
            });
        }

        let nwave = self.nwave();
        for (row, values) in self.flux.iter().enumerate() {
            if values.len() != nwave {
                return Err(FormatError::RaggedRow {
                    row,
                    expected: nwave,
                    found: values.len(),
                });
            }
            if values.iter().any(|v| !v.is_finite()) {
                return Err(FormatError::NonFiniteFlux { row });
            }
        }

        // An empty table has no grid to check
        if !self.flux.is_empty() {
            if nwave < 2 {
                return Err(FormatError::TooFewSamples(nwave));
            }
            if !is_strictly_increasing(&self.wavelengths()) {
                return Err(FormatError::NonIncreasingWave(self.cdelt1));
            }
        }
        Ok(())
    }
}

/// Parse a template file from disk
///
/// # Errors
///
/// Returns `FormatError::Io` if the file cannot be read, or other format
/// errors if the content is invalid.
pub fn parse_archetype_file(path: &Path) -> Result<ArchetypeFile, FormatError> {
    let content = std::fs::read_to_string(path)?;
    parse_archetype_text(&content)
}

/// Parse template file text
///
/// # Errors
///
/// Returns a `FormatError` if a required header keyword or column is
/// missing, the table is ragged, or the row counts disagree.
pub fn parse_archetype_text(text: &str) -> Result<ArchetypeFile, FormatError> {
    let raw: RawArchetypeFile = serde_json::from_str(text)?;
    let header = raw.header.ok_or(FormatError::MissingField("header"))?;
    let data = raw.data.ok_or(FormatError::MissingField("data"))?;

    let rrtype = header
        .rrtype
        .ok_or(FormatError::MissingField("RRTYPE"))?
        .trim()
        .to_string();
    if rrtype.is_empty() {
        return Err(FormatError::InvalidField {
            field: "RRTYPE",
            reason: "empty class label".to_string(),
        });
    }
    let version = match header.version.ok_or(FormatError::MissingField("VERSION"))? {
        Version::Text(s) => s.trim().to_string(),
        Version::Number(n) => n.to_string(),
    };
    let crval1 = finite_keyword("CRVAL1", header.crval1)?;
    let cdelt1 = finite_keyword("CDELT1", header.cdelt1)?;
    let loglam = match header.loglam.ok_or(FormatError::MissingField("LOGLAM"))? {
        LogLam::Flag(b) => b,
        LogLam::Int(0) => false,
        LogLam::Int(1) => true,
        LogLam::Int(other) => {
            return Err(FormatError::InvalidField {
                field: "LOGLAM",
                reason: format!("expected a boolean or 0/1, got {other}"),
            })
        }
    };

    let subtypes = data
        .subtype
        .ok_or(FormatError::MissingField("SUBTYPE"))?
        .iter()
        .map(|s| s.trim().to_string())
        .collect();
    let flux = data.archetype.ok_or(FormatError::MissingField("ARCHETYPE"))?;

    let file = ArchetypeFile {
        rrtype,
        version,
        crval1,
        cdelt1,
        loglam,
        subtypes,
        flux,
    };
    file.validate()?;
    Ok(file)
}

fn finite_keyword(field: &'static str, value: Option<f64>) -> Result<f64, FormatError> {
    let value = value.ok_or(FormatError::MissingField(field))?;
    if value.is_finite() {
        Ok(value)
    } else {
        Err(FormatError::InvalidField {
            field,
            reason: format!("expected a finite number, got {value}"),
        })
    }
}

/// On-disk layout. Every keyword is optional here so a missing one maps to
/// `FormatError::MissingField` instead of a generic JSON error.
#[derive(Debug, Serialize, Deserialize)]
struct RawArchetypeFile {
    header: Option<RawHeader>,
    data: Option<RawData>,
}

#[derive(Debug, Serialize, Deserialize)]
struct RawHeader {
    #[serde(rename = "RRTYPE")]
    rrtype: Option<String>,
    #[serde(rename = "VERSION")]
    version: Option<Version>,
    #[serde(rename = "CRVAL1")]
    crval1: Option<f64>,
    #[serde(rename = "CDELT1")]
    cdelt1: Option<f64>,
    #[serde(rename = "LOGLAM")]
    loglam: Option<LogLam>,
}

#[derive(Debug, Serialize, Deserialize)]
struct RawData {
    #[serde(rename = "SUBTYPE")]
    subtype: Option<Vec<String>>,
    #[serde(rename = "ARCHETYPE")]
    archetype: Option<Vec<Vec<f64>>>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum Version {
    Text(String),
    Number(serde_json::Number),
}

/// FITS logical keywords are often written as 0/1
#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum LogLam {
    Flag(bool),
    Int(i64),
}
