//! Fixture archetype directories and synthetic spectra shared by the
//! integration tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use rr_archetype::core::types::CameraGrids;
use rr_archetype::numeric::rebin::TrapzRebinner;
use rr_archetype::parsing::archetype_file::ArchetypeFile;
use rr_archetype::{Archetype, Spectrum, SpectrumSet};
use tempfile::TempDir;

pub const NWAVE: u32 = 1200;

fn template_wave() -> Vec<f64> {
    (0..NWAVE).map(|k| 3600.0 + f64::from(k)).collect()
}

fn gaussian(w: f64, center: f64, sigma: f64) -> f64 {
    (-0.5 * ((w - center) / sigma).powi(2)).exp()
}

/// Galaxy-like archetypes: one emission line each at different wavelengths
pub fn galaxy_file() -> ArchetypeFile {
    let wave = template_wave();
    let rows = [4000.0, 4250.0, 4450.0]
        .iter()
        .map(|&center| wave.iter().map(|&w| 1.0 + 4.0 * gaussian(w, center, 20.0)).collect())
        .collect();
    ArchetypeFile {
        rrtype: "GALAXY".to_string(),
        version: "fixture-1".to_string(),
        crval1: 3600.0,
        cdelt1: 1.0,
        loglam: false,
        subtypes: vec!["ELG".to_string(), "ELG".to_string(), "LRG".to_string()],
        flux: rows,
    }
}

/// Star-like archetypes: smooth oscillating continua
pub fn star_file() -> ArchetypeFile {
    let wave = template_wave();
    let rows = [0.0, 1.0]
        .iter()
        .map(|&phase| wave.iter().map(|&w| 1.0 + 0.3 * (w / 50.0 + phase).sin()).collect())
        .collect();
    ArchetypeFile {
        rrtype: "STAR".to_string(),
        version: "fixture-1".to_string(),
        crval1: 3600.0,
        cdelt1: 1.0,
        loglam: false,
        subtypes: vec!["G".to_string(), "K".to_string()],
        flux: rows,
    }
}

/// Write both fixture classes as `rrarchetype-*.json` files
pub fn archetype_dir() -> TempDir {
    let dir = TempDir::new().unwrap();
    write_archetype(dir.path(), "rrarchetype-galaxy.json", &galaxy_file());
    write_archetype(dir.path(), "rrarchetype-star.json", &star_file());
    dir
}

pub fn write_archetype(dir: &Path, name: &str, file: &ArchetypeFile) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, file.to_json().unwrap()).unwrap();
    path
}

/// Blue and red camera grids covering rest 3750-4600 A at redshift `z`
pub fn camera_grids(z: f64) -> CameraGrids {
    let mut dwave = CameraGrids::new();
    dwave.insert(
        "b".to_string(),
        (0..200).map(|k| (3750.0 + 2.0 * f64::from(k)) * (1.0 + z)).collect(),
    );
    dwave.insert(
        "r".to_string(),
        (0..180).map(|k| (4150.0 + 2.5 * f64::from(k)) * (1.0 + z)).collect(),
    );
    dwave
}

/// Noise-free observation: `amplitude * template + offset` on each camera
pub fn observe(archetype: &Archetype, index: usize, z: f64, amplitude: f64, offset: f64) -> SpectrumSet {
    let dwave = camera_grids(z);
    let binned = archetype.rebin_exact(index, z, &dwave, &TrapzRebinner).unwrap();
    let spectra = dwave
        .iter()
        .map(|(camera, wave)| {
            let flux = binned[camera].iter().map(|t| amplitude * t + offset).collect();
            Spectrum::new(camera.clone(), wave.clone(), flux, vec![1.0; wave.len()])
        })
        .collect();
    SpectrumSet::new(spectra).unwrap()
}

/// Write `spectra` in the command-line spectra format
pub fn write_spectra(dir: &Path, spectra: &SpectrumSet) -> PathBuf {
    let path = dir.join("spectra.json");
    let json = serde_json::json!({ "spectra": spectra.spectra() });
    std::fs::write(&path, serde_json::to_string(&json).unwrap()).unwrap();
    path
}
