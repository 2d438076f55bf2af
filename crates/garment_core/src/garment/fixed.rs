//! Deterministic stand-ins for the learned networks. They need no inference
//! runtime and are enough to drape a garment that simply follows the body.

use super::{
    features::MotionFeatures,
    learned::{BlendshapeCorrector, GarmentDecoder, PoseEncoder, SequenceRegressor, SkinningWeightsPredictor},
};
use crate::error::{GarmentError, Result};
use crate::smpl::smpl_model::SmplBody;
use garment_utils::array::GatherRows;
use log::debug;
use ndarray as nd;
use ndarray::prelude::*;
use std::collections::HashMap;
use std::sync::Arc;

/// Uses the body pose itself as the pose code.
#[derive(Clone, Debug, Default)]
pub struct PassthroughPoseEncoder;
impl PoseEncoder for PassthroughPoseEncoder {
    fn encode(&self, body_pose: nd::ArrayView2<f32>) -> Result<nd::Array2<f32>> {
        Ok(body_pose.to_owned())
    }
}

/// Returns an all zero latent code of a fixed width for every frame.
#[derive(Clone, Debug)]
pub struct ZeroLatentRegressor {
    pub latent_dim: usize,
}
impl ZeroLatentRegressor {
    pub fn new(latent_dim: usize) -> Self {
        Self { latent_dim }
    }
}
impl SequenceRegressor for ZeroLatentRegressor {
    fn regress(&self, features: &MotionFeatures) -> Result<nd::Array2<f32>> {
        Ok(nd::Array2::zeros((features.num_frames(), self.latent_dim)))
    }
}

/// Decodes every latent code to the same canonical garment.
#[derive(Clone, Debug)]
pub struct TemplateGarmentDecoder {
    verts: Arc<nd::Array2<f32>>,
}
impl TemplateGarmentDecoder {
    /// `verts` is the canonical garment [V_g, 3]
    pub fn new(verts: nd::Array2<f32>) -> Result<Self> {
        if verts.ncols() != 3 {
            return Err(GarmentError::shape_mismatch("garment template columns", 3, verts.ncols()));
        }
        Ok(Self { verts: Arc::new(verts) })
    }

    pub fn num_verts(&self) -> usize {
        self.verts.nrows()
    }
}
impl GarmentDecoder for TemplateGarmentDecoder {
    fn decode(&self, latent: nd::ArrayView2<f32>) -> Result<nd::Array3<f32>> {
        let nr_frames = latent.nrows();
        let mut decoded = nd::Array3::<f32>::zeros((nr_frames, self.verts.nrows(), 3));
        decoded.assign(&self.verts.view().insert_axis(Axis(0)));
        Ok(decoded)
    }
}

/// Predicts no correction at all.
#[derive(Clone, Debug, Default)]
pub struct ZeroCorrector;
impl BlendshapeCorrector for ZeroCorrector {
    fn correct(&self, verts: nd::ArrayView2<f32>, condition: nd::ArrayView2<f32>) -> Result<nd::Array2<f32>> {
        if condition.nrows() != verts.nrows() {
            return Err(GarmentError::external_model(
                "zero corrector",
                format!("got {} conditioning rows for {} vertices", condition.nrows(), verts.nrows()),
            ));
        }
        Ok(nd::Array2::zeros(verts.raw_dim()))
    }
}

/// Gives every garment vertex the skinning weights of the closest vertex of
/// the rest body.
#[derive(Clone, Debug)]
pub struct NearestBodyWeights {
    /// [V, 3]
    body_verts: Arc<nd::Array2<f32>>,
    /// [V, K]
    body_weights: Arc<nd::Array2<f32>>,
}
impl NearestBodyWeights {
    pub fn new(body_verts: nd::Array2<f32>, body_weights: nd::Array2<f32>) -> Result<Self> {
        if body_verts.ncols() != 3 || body_verts.nrows() == 0 {
            return Err(GarmentError::shape_mismatch("body vertices", "[V, 3] with V > 0", body_verts.dim()));
        }
        if body_weights.nrows() != body_verts.nrows() {
            return Err(GarmentError::shape_mismatch("body weight rows", body_verts.nrows(), body_weights.nrows()));
        }
        Ok(Self {
            body_verts: Arc::new(body_verts),
            body_weights: Arc::new(body_weights),
        })
    }

    /// Uses the template mesh and weights of a body model
    pub fn from_body(body: &SmplBody) -> Result<Self> {
        Self::new(body.verts_template().clone(), body.lbs_weights().clone())
    }

    fn nearest(&self, p: nd::ArrayView1<f32>) -> usize {
        let mut best = (0, f32::INFINITY);
        for (idx, v) in self.body_verts.outer_iter().enumerate() {
            let dist = (v[0] - p[0]).powi(2) + (v[1] - p[1]).powi(2) + (v[2] - p[2]).powi(2);
            if dist < best.1 {
                best = (idx, dist);
            }
        }
        best.0
    }
}
impl SkinningWeightsPredictor for NearestBodyWeights {
    fn predict(&self, verts: nd::ArrayView2<f32>) -> Result<nd::Array2<f32>> {
        if verts.ncols() != 3 {
            return Err(GarmentError::external_model("nearest body weights", format!("expected 3 columns, got {}", verts.ncols())));
        }
        // the same canonical vertex usually shows up once per frame
        let mut lookup: HashMap<[u32; 3], usize> = HashMap::new();
        let indices: Vec<usize> = verts
            .outer_iter()
            .map(|p| *lookup.entry([p[0].to_bits(), p[1].to_bits(), p[2].to_bits()]).or_insert_with(|| self.nearest(p)))
            .collect();
        debug!("Nearest body weights for {} vertices, {} unique", indices.len(), lookup.len());
        Ok(self.body_weights.gather_rows(&indices))
    }
}
