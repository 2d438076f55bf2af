//! Roles of the learned networks the pipeline calls into. The pipeline only
//! relies on the shapes documented on each method and checks every returned
//! array against them, so any inference runtime can sit behind these traits.

use super::features::MotionFeatures;
use crate::error::Result;
use dyn_clone::DynClone;
use ndarray as nd;

/// Compresses the body pose of each frame into a latent code.
pub trait PoseEncoder: DynClone + Send + Sync {
    /// `body_pose` is [N, 3 * (K - 1)], the pose without the root rotation.
    /// Returns [N, D].
    fn encode(&self, body_pose: nd::ArrayView2<f32>) -> Result<nd::Array2<f32>>;
}
dyn_clone::clone_trait_object!(PoseEncoder);

/// Temporal model running over the whole sequence of motion features.
pub trait SequenceRegressor: DynClone + Send + Sync {
    /// Returns the latent garment code of every frame. [N, L]
    fn regress(&self, features: &MotionFeatures) -> Result<nd::Array2<f32>>;
}
dyn_clone::clone_trait_object!(SequenceRegressor);

/// Maps latent garment codes to garment vertices in canonical space.
pub trait GarmentDecoder: DynClone + Send + Sync {
    /// `latent` is [N, L]. Returns [N, V_g, 3].
    fn decode(&self, latent: nd::ArrayView2<f32>) -> Result<nd::Array3<f32>>;
}
dyn_clone::clone_trait_object!(GarmentDecoder);

/// Predicts per vertex offsets of the canonical garment given a conditioning
/// vector repeated for every vertex. Used both for the pose and for the shape
/// blendshape.
pub trait BlendshapeCorrector: DynClone + Send + Sync {
    /// `verts` is [N * V_g, 3] and `condition` is [N * V_g, C]. Returns
    /// [N * V_g, 3].
    fn correct(&self, verts: nd::ArrayView2<f32>, condition: nd::ArrayView2<f32>) -> Result<nd::Array2<f32>>;
}
dyn_clone::clone_trait_object!(BlendshapeCorrector);

/// Predicts skinning weights for canonical garment vertices.
pub trait SkinningWeightsPredictor: DynClone + Send + Sync {
    /// `verts` is [N * V_g, 3]. Returns [N * V_g, K].
    fn predict(&self, verts: nd::ArrayView2<f32>) -> Result<nd::Array2<f32>>;
}
dyn_clone::clone_trait_object!(SkinningWeightsPredictor);
