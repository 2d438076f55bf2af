use ndarray as nd;
use ndarray::prelude::*;

/// Tensors computed on the way to the posed body. The garment pipeline reads
/// the pose feature and the joint transforms from here.
#[derive(Clone, Debug)]
pub struct SmplIntermediates {
    /// [B, V, 3]
    pub shape_blendshape: nd::Array3<f32>,
    /// [B, V, 3]
    pub pose_blendshape: nd::Array3<f32>,
    /// Non-root joint rotations minus identity, flattened. [B, 9 * (K - 1)]
    pub pose_feature: nd::Array2<f32>,
    /// Rest pose joint positions regressed from the shaped mesh. [B, K, 3]
    pub joint_locations_local: nd::Array3<f32>,
    /// Posed joint positions without translation. [B, K, 3]
    pub joint_locations: nd::Array3<f32>,
    /// Template plus shape blendshape. [B, V, 3]
    pub verts_shaped: nd::Array3<f32>,
    /// Shaped vertices plus pose blendshape, right before skinning. [B, V, 3]
    pub verts_posed: nd::Array3<f32>,
}

/// Output of ``SmplBody::forward``
#[derive(Clone, Debug)]
pub struct SmplOutput {
    /// [B, V, 3]
    pub verts: nd::Array3<f32>,
    /// Rest relative joint transforms [B, K, 4, 4]. All zeros when no pose was
    /// given.
    pub joint_transforms: nd::Array4<f32>,
    /// `None` in shape-only mode
    pub intermediates: Option<SmplIntermediates>,
}
impl SmplOutput {
    /// Whether the output came from a shape-only evaluation
    pub fn is_rest(&self) -> bool {
        self.intermediates.is_none()
    }
}

/// Garment and body vertices for every frame of a motion.
#[derive(Clone, Debug, PartialEq)]
pub struct DeformedSequence {
    /// [N, V_garment, 3]
    pub garment: nd::Array3<f32>,
    /// [N, V_body, 3]
    pub body: nd::Array3<f32>,
}
impl DeformedSequence {
    pub fn num_frames(&self) -> usize {
        self.garment.dim().0
    }

    /// Garment and body vertices of a single frame
    /// # Panics
    /// Will panic if `idx` is not a valid frame
    pub fn frame(&self, idx: usize) -> (nd::ArrayView2<'_, f32>, nd::ArrayView2<'_, f32>) {
        (self.garment.index_axis(Axis(0), idx), self.body.index_axis(Axis(0), idx))
    }
}
