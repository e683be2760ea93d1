//! Numerical building blocks for archetype fitting.
//!
//! - [`legendre`]: Legendre continuum basis on normalized wavelength
//! - [`rebin`]: flux-conserving rebinning ([`rebin::FluxRebinner`])
//! - [`solver`]: weighted linear least squares ([`solver::ChiSquareSolver`])
//!
//! The rebinner and solver are traits so the redshift pipeline can plug in
//! its own primitives; the bundled implementations are used by default.

pub mod legendre;
pub mod rebin;
pub mod solver;
