//! Parsers for archetype files and observed spectra.
//!
//! ## Archetype files
//!
//! ```json
//! {
//!   "header": {"RRTYPE": "GALAXY", "VERSION": "v1", "CRVAL1": 3.55, "CDELT1": 0.0001, "LOGLAM": true},
//!   "data":   {"SUBTYPE": ["ELG", "LRG"], "ARCHETYPE": [[...], [...]]}
//! }
//! ```
//!
//! | Keyword    | Description | Type |
//! |------------|-------------|------|
//! | RRTYPE     | Spectral class | string |
//! | VERSION    | Provenance | string or number |
//! | CRVAL1     | First grid value | number |
//! | CDELT1     | Grid step | number |
//! | LOGLAM     | Grid is log10(wavelength) | bool or 0/1 |
//! | SUBTYPE    | One label per template | strings |
//! | ARCHETYPE  | One flux row per template | numbers |
//!
//! All keywords are required.

pub mod archetype_file;
pub mod spectra_file;
