//! Core data types for archetype fitting.
//!
//! - [`Archetype`](archetype::Archetype): the templates of one spectral class
//! - [`Spectrum`](spectrum::Spectrum) and [`SpectrumSet`](spectrum::SpectrumSet):
//!   observed data, one entry per camera
//! - [`SpectralClass`](types::SpectralClass), [`FullType`](types::FullType):
//!   template labels
//!
//! ## Template Labels
//!
//! Each template gets a subtype of the form `{SUBTYPE}_{row}` so labels stay
//! unique even when the file repeats a subtype. The full type joins class and
//! subtype:
//!
//! | Class  | File subtype | Row | Full type              |
//! |--------|--------------|-----|------------------------|
//! | GALAXY | ELG          | 0   | `GALAXY:::ELG_0`       |
//! | GALAXY | ELG          | 1   | `GALAXY:::ELG_1`       |
//! | STAR   | K            | 0   | `STAR:::K_0`           |

pub mod archetype;
pub mod interp;
pub mod spectrum;
pub mod types;
