use serde::{Deserialize, Serialize};

use crate::error::{ParamError, Result};

/// Base terrain generator.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Algorithm {
    Noise,
    Displacement,
    #[default]
    Hybrid,
}

/// All tunable parameters for one run. Read-only once handed to `generate`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Params {
    pub seed: u32,
    pub size: u32,
    pub algorithm: Algorithm,

    // Noise
    pub scale: f32,
    pub octaves: u32,
    pub persistence: f32,
    pub lacunarity: f32,
    /// Ridge sharpness when `ridged` is set: exponent `1 + roughness`.
    pub roughness: f32,
    pub ridged: bool,

    // Displacement / blending
    pub displacement_roughness: f32,
    pub hybrid_weight: f32,

    // Shaping
    pub mountain_threshold: f32,
    pub mountain_merge: f32,

    // Erosion
    pub thermal_iterations: u32,
    pub erosion_iterations: u32,
    pub erosion_intensity: f32,

    // Post-processing
    pub smoothing_strength: f32,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            seed: 12345,
            size: 257,
            algorithm: Algorithm::Hybrid,
            scale: 120.0,
            octaves: 4,
            persistence: 0.5,
            lacunarity: 2.0,
            roughness: 0.35,
            ridged: false,
            displacement_roughness: 0.5,
            hybrid_weight: 0.4,
            mountain_threshold: 0.6,
            mountain_merge: 0.35,
            thermal_iterations: 3,
            erosion_iterations: 3000,
            erosion_intensity: 0.4,
            smoothing_strength: 0.3,
        }
    }
}

fn unit(field: &'static str, value: f32) -> Result<()> {
    if !value.is_finite() {
        return Err(ParamError::NonFinite { field });
    }
    if !(0.0..=1.0).contains(&value) {
        return Err(ParamError::OutOfUnitRange { field, value });
    }
    Ok(())
}

impl Params {
    /// Reject parameters outside the documented domain.
    pub fn validate(&self) -> Result<()> {
        if self.size == 0 {
            return Err(ParamError::ZeroSize);
        }
        if !self.scale.is_finite() {
            return Err(ParamError::NonFinite { field: "scale" });
        }
        if self.scale <= 0.0 {
            return Err(ParamError::NonPositiveScale(self.scale));
        }
        if self.octaves == 0 {
            return Err(ParamError::ZeroOctaves);
        }
        if !self.persistence.is_finite() {
            return Err(ParamError::NonFinite { field: "persistence" });
        }
        if !(self.lacunarity.is_finite() && self.lacunarity > 0.0) {
            return Err(ParamError::InvalidLacunarity(self.lacunarity));
        }
        unit("roughness", self.roughness)?;
        unit("displacement_roughness", self.displacement_roughness)?;
        unit("hybrid_weight", self.hybrid_weight)?;
        unit("mountain_threshold", self.mountain_threshold)?;
        unit("mountain_merge", self.mountain_merge)?;
        unit("erosion_intensity", self.erosion_intensity)?;
        unit("smoothing_strength", self.smoothing_strength)?;
        Ok(())
    }

    /// Valid but artefact-prone combinations. Logged, never rejected.
    pub fn advisories(&self) -> Vec<&'static str> {
        let mut out = Vec::new();
        if self.scale >= 100.0 && self.scale % 50.0 == 0.0 && self.octaves >= 4 {
            out.push("scale is a multiple of 50 with 4+ octaves; octave grids may align visibly");
        }
        if self.roughness > 0.6 && self.octaves > 5 {
            out.push("high roughness with more than 5 octaves tends to produce speckle");
        }
        if self.displacement_roughness > 0.7 {
            out.push("displacement roughness above 0.7 produces abrupt height steps");
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert_eq!(Params::default().validate(), Ok(()));
    }

    #[test]
    fn rejects_bad_domain() {
        let p = Params { size: 0, ..Params::default() };
        assert_eq!(p.validate(), Err(ParamError::ZeroSize));

        let p = Params { scale: 0.0, ..Params::default() };
        assert_eq!(p.validate(), Err(ParamError::NonPositiveScale(0.0)));

        let p = Params { scale: -3.0, ..Params::default() };
        assert!(matches!(p.validate(), Err(ParamError::NonPositiveScale(_))));

        let p = Params { octaves: 0, ..Params::default() };
        assert_eq!(p.validate(), Err(ParamError::ZeroOctaves));

        let p = Params { hybrid_weight: 1.5, ..Params::default() };
        assert_eq!(
            p.validate(),
            Err(ParamError::OutOfUnitRange { field: "hybrid_weight", value: 1.5 })
        );

        let p = Params { erosion_intensity: f32::NAN, ..Params::default() };
        assert_eq!(p.validate(), Err(ParamError::NonFinite { field: "erosion_intensity" }));
    }

    #[test]
    fn advisories_flag_aligned_scale() {
        let p = Params { scale: 150.0, octaves: 4, ..Params::default() };
        assert_eq!(p.advisories().len(), 1);
        assert!(Params::default().advisories().is_empty());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let p: Params = serde_json::from_str(r#"{"seed": 7, "algorithm": "displacement"}"#).unwrap();
        assert_eq!(p.seed, 7);
        assert_eq!(p.algorithm, Algorithm::Displacement);
        assert_eq!(p.size, Params::default().size);
    }
}
