use crate::error::{ensure_shape, GarmentError, Result};
use ndarray as nd;
use ndarray::prelude::*;

/// Skinning weights mapping each vertex to its joint influences. Rows are used
/// as given, they are not normalised to sum to one.
#[derive(Clone, Copy, Debug)]
pub enum SkinningWeights<'a> {
    /// One [V, K] matrix shared by every frame of the batch.
    Shared(nd::ArrayView2<'a, f32>),
    /// A [B, V, K] tensor with weights per frame.
    PerFrame(nd::ArrayView3<'a, f32>),
}

impl<'a> SkinningWeights<'a> {
    pub fn num_verts(&self) -> usize {
        match self {
            Self::Shared(w) => w.nrows(),
            Self::PerFrame(w) => w.dim().1,
        }
    }

    pub fn num_joints(&self) -> usize {
        match self {
            Self::Shared(w) => w.ncols(),
            Self::PerFrame(w) => w.dim().2,
        }
    }

    /// Weights used for frame `idx_frame` of the batch
    pub fn frame(&self, idx_frame: usize) -> nd::ArrayView2<'a, f32> {
        match *self {
            Self::Shared(w) => w,
            Self::PerFrame(w) => w.index_axis_move(Axis(0), idx_frame),
        }
    }
}

/// Linear blend skinning.
///
/// `verts` is [B, V, 3] and `joint_transforms` [B, K, 4, 4], typically the rest
/// relative transforms of [`KinematicTree::pose_skeleton`]. Every vertex is
/// moved by `sum_k w[v, k] * A[k]` applied to its homogeneous coordinate.
///
/// [`KinematicTree::pose_skeleton`]: crate::smpl::kinematic_tree::KinematicTree::pose_skeleton
#[allow(non_snake_case)]
pub fn lbs(verts: nd::ArrayView3<f32>, joint_transforms: nd::ArrayView4<f32>, weights: &SkinningWeights) -> Result<nd::Array3<f32>> {
    let (batch, nr_verts, _) = verts.dim();
    let nr_joints = weights.num_joints();
    if verts.dim().2 != 3 {
        return Err(GarmentError::shape_mismatch("skinned vertex columns", 3, verts.dim().2));
    }
    ensure_shape("joint transforms", &[batch, nr_joints, 4, 4], joint_transforms.shape())?;
    if weights.num_verts() != nr_verts {
        return Err(GarmentError::shape_mismatch("skinning weight rows", nr_verts, weights.num_verts()));
    }
    if let SkinningWeights::PerFrame(w) = weights {
        if w.dim().0 != batch {
            return Err(GarmentError::shape_mismatch("skinning weight frames", batch, w.dim().0));
        }
    }

    let mut skinned = nd::Array3::<f32>::zeros((batch, nr_verts, 3));
    for idx_frame in 0..batch {
        let A = joint_transforms
            .index_axis(Axis(0), idx_frame)
            .to_owned()
            .into_shape_with_order((nr_joints, 16))?;
        let T = weights.frame(idx_frame).dot(&A);
        let v_frame = verts.index_axis(Axis(0), idx_frame);
        let mut out_frame = skinned.index_axis_mut(Axis(0), idx_frame);
        nd::Zip::from(out_frame.rows_mut())
            .and(T.rows())
            .and(v_frame.rows())
            .for_each(|mut out, t, v| {
                for r in 0..3 {
                    out[r] = t[4 * r] * v[0] + t[4 * r + 1] * v[1] + t[4 * r + 2] * v[2] + t[4 * r + 3];
                }
            });
    }
    Ok(skinned)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use garment_utils::numerical::batch_rodrigues;
    use std::f32::consts::FRAC_PI_2;

    fn rigid(rotvec: [f32; 3], t: [f32; 3]) -> nd::Array2<f32> {
        let rot = batch_rodrigues(array![[rotvec[0], rotvec[1], rotvec[2]]].view());
        let mut m = nd::Array2::<f32>::eye(4);
        m.slice_mut(s![0..3, 0..3]).assign(&rot.index_axis(Axis(0), 0));
        m.slice_mut(s![0..3, 3]).assign(&array![t[0], t[1], t[2]]);
        m
    }

    #[test]
    fn one_hot_weight_applies_that_joint_only() {
        let t0 = rigid([0.0, 0.0, FRAC_PI_2], [0.0, 0.0, 0.0]);
        let t1 = rigid([0.3, 0.0, 0.0], [1.0, 2.0, 3.0]);
        let mut transforms = nd::Array4::<f32>::zeros((1, 2, 4, 4));
        transforms.slice_mut(s![0, 0, .., ..]).assign(&t0);
        transforms.slice_mut(s![0, 1, .., ..]).assign(&t1);
        let verts = array![[[1.0, 0.0, 0.0], [0.5, -1.0, 2.0]]];
        let weights = array![[1.0, 0.0], [0.0, 1.0]];
        let out = lbs(verts.view(), transforms.view(), &SkinningWeights::Shared(weights.view())).unwrap();

        let expected_0 = t0.dot(&array![1.0, 0.0, 0.0, 1.0]);
        let expected_1 = t1.dot(&array![0.5, -1.0, 2.0, 1.0]);
        for k in 0..3 {
            assert!((out[(0, 0, k)] - expected_0[k]).abs() < 1e-6);
            assert!((out[(0, 1, k)] - expected_1[k]).abs() < 1e-6);
        }
    }

    #[test]
    fn weights_are_not_normalised() {
        let mut transforms = nd::Array4::<f32>::zeros((1, 1, 4, 4));
        transforms.slice_mut(s![0, 0, .., ..]).assign(&nd::Array2::eye(4));
        let verts = array![[[1.0, 2.0, 3.0]]];
        let weights = array![[2.0]];
        let out = lbs(verts.view(), transforms.view(), &SkinningWeights::Shared(weights.view())).unwrap();
        assert_eq!(out.index_axis(Axis(0), 0).row(0).to_vec(), vec![2.0, 4.0, 6.0]);
    }

    #[test]
    fn shared_and_per_frame_weights_agree() {
        let mut transforms = nd::Array4::<f32>::zeros((2, 2, 4, 4));
        transforms.slice_mut(s![0, 0, .., ..]).assign(&rigid([0.1, 0.2, 0.3], [0.0, 1.0, 0.0]));
        transforms.slice_mut(s![0, 1, .., ..]).assign(&rigid([0.0, 0.5, 0.0], [0.5, 0.0, 0.0]));
        transforms.slice_mut(s![1, 0, .., ..]).assign(&rigid([0.7, 0.0, 0.1], [0.0, 0.0, 1.0]));
        transforms.slice_mut(s![1, 1, .., ..]).assign(&rigid([0.0, 0.0, -0.4], [1.0, 1.0, 0.0]));
        let verts = array![[[1.0, 0.0, 0.0], [0.0, 1.0, 1.0]], [[0.2, 0.3, 0.4], [1.0, 1.0, 1.0]]];
        let weights = array![[0.25, 0.75], [0.6, 0.4]];
        let per_frame = weights.broadcast((2, 2, 2)).unwrap().to_owned();

        let shared = lbs(verts.view(), transforms.view(), &SkinningWeights::Shared(weights.view())).unwrap();
        let batched = lbs(verts.view(), transforms.view(), &SkinningWeights::PerFrame(per_frame.view())).unwrap();
        assert!(shared.iter().zip(batched.iter()).all(|(a, b)| (a - b).abs() < 1e-6));
    }

    #[test]
    fn rejects_joint_count_mismatch() {
        let transforms = nd::Array4::<f32>::zeros((1, 3, 4, 4));
        let verts = nd::Array3::<f32>::zeros((1, 2, 3));
        let weights = nd::Array2::<f32>::zeros((2, 2));
        let res = lbs(verts.view(), transforms.view(), &SkinningWeights::Shared(weights.view()));
        assert!(matches!(res, Err(GarmentError::ShapeMismatch { .. })));
    }

    #[test]
    fn rejects_per_frame_batch_mismatch() {
        let transforms = nd::Array4::<f32>::zeros((2, 1, 4, 4));
        let verts = nd::Array3::<f32>::zeros((2, 2, 3));
        let weights = nd::Array3::<f32>::zeros((3, 2, 1));
        let res = lbs(verts.view(), transforms.view(), &SkinningWeights::PerFrame(weights.view()));
        assert!(matches!(res, Err(GarmentError::ShapeMismatch { .. })));
    }

    #[test]
    fn rejects_vertices_without_three_columns() {
        let transforms = nd::Array4::<f32>::zeros((1, 1, 4, 4));
        let verts = nd::Array3::<f32>::zeros((1, 2, 2));
        let weights = nd::Array2::<f32>::ones((2, 1));
        let res = lbs(verts.view(), transforms.view(), &SkinningWeights::Shared(weights.view()));
        assert!(matches!(res, Err(GarmentError::ShapeMismatch { ref what, .. }) if what == "skinned vertex columns"));
    }
}
