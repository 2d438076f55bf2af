use crate::error::{ensure_shape, GarmentError, Result};
use garment_utils::numerical::rigid_transform;
use ndarray as nd;
use ndarray::prelude::*;

/// Joint hierarchy stored as a flat parent table. Every non-root joint has a
/// parent with a strictly smaller index, so walking joints in increasing order
/// always visits a parent before its children.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KinematicTree {
    parents: Vec<usize>,
}

impl KinematicTree {
    /// Builds the tree from a raw parent table as stored in SMPL assets
    /// (`kintree_table[0]`). The root entry is ignored, it is commonly `-1` or
    /// `u32::MAX`.
    pub fn new(raw_parents: &[i64]) -> Result<Self> {
        if raw_parents.is_empty() {
            return Err(GarmentError::shape_mismatch("kinematic tree", "at least one joint", 0));
        }
        let mut parents = Vec::with_capacity(raw_parents.len());
        parents.push(0);
        for (joint, &parent) in raw_parents.iter().enumerate().skip(1) {
            match usize::try_from(parent) {
                Ok(p) if p < joint => parents.push(p),
                _ => return Err(GarmentError::MissingJointParent { joint, parent }),
            }
        }
        Ok(Self { parents })
    }

    pub fn num_joints(&self) -> usize {
        self.parents.len()
    }

    /// Parent of `joint`, `None` for the root.
    pub fn parent(&self, joint: usize) -> Option<usize> {
        if joint == 0 {
            None
        } else {
            self.parents.get(joint).copied()
        }
    }

    /// Parent table with a placeholder `0` at the root.
    pub fn parents(&self) -> &[usize] {
        &self.parents
    }

    /// Forward kinematics for a batch of frames.
    ///
    /// `rot_mats` is [B, K, 3, 3] local joint rotations and `joints` is
    /// [B, K, 3] rest joint positions. Returns the posed joint positions
    /// [B, K, 3] and the rest-relative joint transforms [B, K, 4, 4].
    pub fn pose_skeleton(&self, rot_mats: nd::ArrayView4<f32>, joints: nd::ArrayView3<f32>) -> Result<(nd::Array3<f32>, nd::Array4<f32>)> {
        let num_joints = self.num_joints();
        let batch = rot_mats.dim().0;
        ensure_shape("joint rotations", &[batch, num_joints, 3, 3], rot_mats.shape())?;
        ensure_shape("rest joint positions", &[batch, num_joints, 3], joints.shape())?;

        let mut posed_joints = nd::Array3::<f32>::zeros((batch, num_joints, 3));
        let mut joint_transforms = nd::Array4::<f32>::zeros((batch, num_joints, 4, 4));
        for (idx_frame, (rots, rest)) in rot_mats.outer_iter().zip(joints.outer_iter()).enumerate() {
            let (posed, transforms) = rigid_transform(&self.parents, rots, rest);
            posed_joints.index_axis_mut(Axis(0), idx_frame).assign(&posed);
            joint_transforms.index_axis_mut(Axis(0), idx_frame).assign(&transforms);
        }
        Ok((posed_joints, joint_transforms))
    }
}
