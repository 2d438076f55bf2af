use log::trace;
use nalgebra as na;
use ndarray as nd;
use ndarray::prelude::*;

/// Epsilon added component-wise to an axis-angle vector before taking its
/// norm. Keeps the axis normalisation finite for zero rotations.
pub const ROTATION_EPS: f32 = 1e-8;
/// Angles below this are reported as degenerate when tracing.
const DEGENERATE_ANGLE: f32 = 1e-6;
/// Below this cosine of the middle Euler angle we treat the decomposition as
/// gimbal locked.
const GIMBAL_EPS: f32 = 1e-6;

/// Cross-product matrix of a single 3-vector.
pub fn skew(x: f32, y: f32, z: f32) -> nd::Array2<f32> {
    array![[0.0, -z, y], [z, 0.0, -x], [-y, x, 0.0]]
}

/// Skew-symmetric matrices for a batch of 3-vectors of shape [n, 3].
/// # Panics
/// Will panic if the batch does not have 3 columns
pub fn batch_skew(vecs: nd::ArrayView2<f32>) -> nd::Array3<f32> {
    assert_eq!(vecs.ncols(), 3, "skew expects a batch of 3-vectors");
    let mut skews = nd::Array3::<f32>::zeros((vecs.nrows(), 3, 3));
    for (v, mut k) in vecs.outer_iter().zip(skews.outer_iter_mut()) {
        k.assign(&skew(v[0], v[1], v[2]));
    }
    skews
}

/// Rotation matrices for a batch of axis-angle vectors using the default
/// [`ROTATION_EPS`].
pub fn batch_rodrigues(axis_angles: nd::ArrayView2<f32>) -> nd::Array3<f32> {
    batch_rodrigues_eps(axis_angles, ROTATION_EPS)
}

/// Calculates the rotation matrices for a batch of rotation vectors of shape
/// [n, 3]. The angle is the norm of `v + eps` and the axis is `v / angle`, so
/// a zero vector maps to the identity without dividing by zero.
/// # Panics
/// Will panic if the batch does not have 3 columns
pub fn batch_rodrigues_eps(axis_angles: nd::ArrayView2<f32>, eps: f32) -> nd::Array3<f32> {
    assert_eq!(axis_angles.ncols(), 3, "rodrigues expects a batch of 3-vectors");
    let mut rotations_per_joint = nd::Array3::<f32>::zeros((axis_angles.nrows(), 3, 3));
    let identity = nd::Array2::<f32>::eye(3);
    let mut nr_degenerate = 0;
    for (v, mut rot) in axis_angles.outer_iter().zip(rotations_per_joint.outer_iter_mut()) {
        let angle = v.iter().map(|x| (x + eps) * (x + eps)).sum::<f32>().sqrt(); //l2 norm
        if angle < DEGENERATE_ANGLE {
            nr_degenerate += 1;
        }
        let axis = if angle > 0.0 { v.mapv(|x| x / angle) } else { nd::Array1::<f32>::zeros(3) };
        let (sin, cos) = angle.sin_cos();
        let outer = nd::Array2::from_shape_fn((3, 3), |(i, j)| axis[i] * axis[j]);
        let k = skew(axis[0], axis[1], axis[2]);
        rot.assign(&(cos * &identity + (1.0 - cos) * &outer + sin * &k));
    }
    if nr_degenerate > 0 {
        trace!("{nr_degenerate} near-zero rotations went through the epsilon path");
    }
    rotations_per_joint
}

/// Backward first difference along the time axis scaled by `1/h`. The first
/// row has no predecessor and is zero.
pub fn finite_diff(x: nd::ArrayView2<f32>, h: f32) -> nd::Array2<f32> {
    let mut v = nd::Array2::<f32>::zeros(x.raw_dim());
    if x.nrows() > 1 {
        let diff = &x.slice(s![1.., ..]) - &x.slice(s![..-1, ..]);
        v.slice_mut(s![1.., ..]).assign(&(diff / h));
    }
    v
}

/// Extrinsic "zxy" Euler angles of an axis-angle rotation, i.e. the angles
/// `(a, b, c)` such that `R = Ry(c) * Rx(b) * Rz(a)`. The middle angle lies in
/// [-pi/2, pi/2]; on gimbal lock the last angle is set to zero.
pub fn rotvec_to_euler_zxy(rotvec: &na::Vector3<f32>) -> na::Vector3<f32> {
    let rot = na::Rotation3::new(*rotvec);
    let m = rot.matrix();
    let sin_b = (-m[(1, 2)]).clamp(-1.0, 1.0);
    let b = sin_b.asin();
    let cos_b = m[(1, 0)].hypot(m[(1, 1)]);
    let (a, c) = if cos_b > GIMBAL_EPS {
        (m[(1, 0)].atan2(m[(1, 1)]), m[(0, 2)].atan2(m[(2, 2)]))
    } else {
        ((-m[(0, 1)]).atan2(m[(0, 0)]), 0.0)
    };
    na::Vector3::new(a, b, c)
}

/// [`rotvec_to_euler_zxy`] over a batch of axis-angle vectors of shape [n, 3].
/// # Panics
/// Will panic if the batch does not have 3 columns
pub fn batch_rotvec_to_euler_zxy(rotvecs: nd::ArrayView2<f32>) -> nd::Array2<f32> {
    assert_eq!(rotvecs.ncols(), 3, "euler conversion expects a batch of 3-vectors");
    let mut euler = nd::Array2::<f32>::zeros((rotvecs.nrows(), 3));
    for (v, mut e) in rotvecs.outer_iter().zip(euler.outer_iter_mut()) {
        let angles = rotvec_to_euler_zxy(&na::Vector3::new(v[0], v[1], v[2]));
        e.assign(&array![angles.x, angles.y, angles.z]);
    }
    euler
}

/// Forward kinematics for a single frame.
///
/// `parents[j]` is the parent of joint `j` and must be smaller than `j`; the
/// entry of the root is ignored. `rot_mats` holds the local rotation of each
/// joint [K, 3, 3] and `joints` the rest positions [K, 3].
///
/// Returns the posed joint positions [K, 3] and the transforms relative to the
/// rest pose [K, 4, 4], i.e. the global transforms with `G * [j; 0]` removed
/// from their translation column so that a rest-pose point is moved by the
/// skeleton motion only.
///
/// # Panics
/// Will panic if a joint other than the root has a parent that does not come
/// before it, or if `rot_mats` and `joints` hold fewer than `parents.len()` joints
#[allow(clippy::similar_names)]
pub fn rigid_transform(parents: &[usize], rot_mats: nd::ArrayView3<f32>, joints: nd::ArrayView2<f32>) -> (nd::Array2<f32>, nd::Array3<f32>) {
    let num_joints = parents.len();
    assert!(
        parents.iter().enumerate().skip(1).all(|(j, &p)| p < j),
        "every parent must come before its child"
    );

    // rel_joints[1:] -= joints[parents[1:]]
    let mut rel_joints = joints.to_owned();
    for (idx_cur, &idx_parent) in parents.iter().enumerate().skip(1) {
        let mut rel = rel_joints.row_mut(idx_cur);
        rel -= &joints.row(idx_parent);
    }

    let mut transform_chain: Vec<nd::Array2<f32>> = Vec::with_capacity(num_joints);
    for idx in 0..num_joints {
        let mut local = nd::Array2::<f32>::eye(4);
        local.slice_mut(s![0..3, 0..3]).assign(&rot_mats.slice(s![idx, .., ..]));
        local.slice_mut(s![0..3, 3]).assign(&rel_joints.row(idx));
        let global = if idx == 0 { local } else { transform_chain[parents[idx]].dot(&local) };
        transform_chain.push(global);
    }

    let mut posed_joints = nd::Array2::<f32>::zeros((num_joints, 3));
    let mut rel_transforms = nd::Array3::<f32>::zeros((num_joints, 4, 4));
    for (i, transform) in transform_chain.iter().enumerate() {
        posed_joints.row_mut(i).assign(&transform.slice(s![0..3, 3]));

        let joint_homogen = array![joints[(i, 0)], joints[(i, 1)], joints[(i, 2)], 0.0];
        let init_bone = transform.dot(&joint_homogen);
        let mut rel = rel_transforms.slice_mut(s![i, .., ..]);
        rel.assign(transform);
        let mut translation = rel.slice_mut(s![.., 3]);
        translation -= &init_bone;
    }

    (posed_joints, rel_transforms)
}
