use ndarray::{s, Array2};
use thiserror::Error;

use crate::core::types::{CameraFlux, DesignBundle};
use crate::numeric::legendre::LegendreBasis;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DesignError {
    #[error("No Legendre basis for camera '{0}'")]
    MissingLegendre(String),

    #[error("Camera '{camera}' has {template} template samples but {legendre} Legendre samples")]
    LengthMismatch {
        camera: String,
        template: usize,
        legendre: usize,
    },
}

/// Assemble the design matrix bundle for one rebinned template.
///
/// For each camera the matrix is `[template | P_0 .. P_{nleg-1}]`, one row
/// per observed sample.
///
/// # Errors
///
/// Returns `MissingLegendre` if a camera has no basis rows, or
/// `LengthMismatch` if the basis was evaluated on a different grid.
pub fn build_design(binned: &CameraFlux, legendre: &LegendreBasis) -> Result<DesignBundle, DesignError> {
    binned
        .iter()
        .map(|(camera, template)| -> Result<(String, Array2<f64>), DesignError> {
            let rows = legendre
                .get(camera)
                .ok_or_else(|| DesignError::MissingLegendre(camera.clone()))?;
            if rows.ncols() != template.len() {
                return Err(DesignError::LengthMismatch {
                    camera: camera.clone(),
                    template: template.len(),
                    legendre: rows.ncols(),
                });
            }

            let mut design = Array2::<f64>::zeros((template.len(), rows.nrows() + 1));
            for (d, t) in design.column_mut(0).iter_mut().zip(template) {
                *d = *t;
            }
            design.slice_mut(s![.., 1..]).assign(&rows.t());
            Ok((camera.clone(), design))
        })
        .collect()
}
