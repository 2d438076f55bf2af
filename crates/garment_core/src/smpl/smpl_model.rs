use super::kinematic_tree::KinematicTree;
use crate::common::{
    npz::{read_f32, read_i64},
    outputs::{SmplIntermediates, SmplOutput},
    smpl_options::SmplOptions,
};
use crate::error::{ensure_shape, GarmentError, Result};
use crate::skinning::lbs::{lbs, SkinningWeights};
use garment_utils::numerical::batch_rodrigues_eps;
use log::{debug, info, warn};
use ndarray as nd;
use ndarray::prelude::*;
use ndarray_npy::NpzReader;
use std::io::{Read, Seek};
use std::path::Path;

/// SMPL style body model. Built once from its basis matrices and never
/// mutated afterwards, so it can be shared between threads behind an `Arc`.
#[derive(Clone, Debug)]
pub struct SmplBody {
    /// [V, 3]
    verts_template: nd::Array2<f32>,
    /// [F, 3]
    faces: nd::Array2<u32>,
    /// [V * 3, S]
    shape_dirs: nd::Array2<f32>,
    /// [V * 3, 9 * (K - 1)]
    pose_dirs: nd::Array2<f32>,
    /// [K, V]
    joint_regressor: nd::Array2<f32>,
    /// [V, K]
    lbs_weights: nd::Array2<f32>,
    kintree: KinematicTree,
}

impl SmplBody {
    /// Builds the model from dense matrices laid out as in the SMPL assets.
    /// `shape_dirs` is [V, 3, S], `pose_dirs` is [V, 3, 9 * (K - 1)] and
    /// `parents` is the first row of the kinematic tree table.
    #[allow(clippy::too_many_arguments)]
    pub fn new_from_matrices(
        verts_template: &nd::Array2<f32>,
        faces: &nd::Array2<u32>,
        shape_dirs: &nd::Array3<f32>,
        pose_dirs: &nd::Array3<f32>,
        joint_regressor: &nd::Array2<f32>,
        lbs_weights: nd::Array2<f32>,
        parents: &[i64],
    ) -> Result<Self> {
        let kintree = KinematicTree::new(parents)?;
        let num_joints = kintree.num_joints();
        let num_verts = verts_template.nrows();
        let num_shapes = shape_dirs.dim().2;
        let num_pose_feats = 9 * (num_joints - 1);

        ensure_shape("v_template", &[num_verts, 3], verts_template.shape())?;
        ensure_shape("f", &[faces.nrows(), 3], faces.shape())?;
        if let Some(&idx) = faces.iter().find(|&&idx| idx as usize >= num_verts) {
            return Err(GarmentError::shape_mismatch("face vertex index", format!("< {num_verts}"), idx));
        }
        ensure_shape("shapedirs", &[num_verts, 3, num_shapes], shape_dirs.shape())?;
        ensure_shape("posedirs", &[num_verts, 3, num_pose_feats], pose_dirs.shape())?;
        ensure_shape("J_regressor", &[num_joints, num_verts], joint_regressor.shape())?;
        ensure_shape("weights", &[num_verts, num_joints], lbs_weights.shape())?;

        let shape_dirs = shape_dirs.to_shape((num_verts * 3, num_shapes))?.into_owned();
        let pose_dirs = pose_dirs.to_shape((num_verts * 3, num_pose_feats))?.into_owned();
        debug!("Body model with {num_verts} verts, {num_joints} joints and {num_shapes} shape components");

        Ok(Self {
            verts_template: verts_template.clone(),
            faces: faces.clone(),
            shape_dirs,
            pose_dirs,
            joint_regressor: joint_regressor.clone(),
            lbs_weights,
            kintree,
        })
    }

    fn new_from_npz_reader<R: Read + Seek>(npz: &mut NpzReader<R>) -> Result<Self> {
        let verts_template: nd::Array2<f32> = read_f32(npz, "v_template")?;
        let faces_raw: nd::Array2<i64> = read_i64(npz, "f")?;
        let shape_dirs: nd::Array3<f32> = read_f32(npz, "shapedirs")?;
        let pose_dirs: nd::Array3<f32> = read_f32(npz, "posedirs")?;
        let joint_regressor: nd::Array2<f32> = read_f32(npz, "J_regressor")?;
        let lbs_weights: nd::Array2<f32> = read_f32(npz, "weights")?;
        let kintree_table: nd::Array2<i64> = read_i64(npz, "kintree_table")?;

        let faces = faces_raw
            .iter()
            .map(|&idx| u32::try_from(idx).map_err(|_| GarmentError::shape_mismatch("face vertex index", "a non-negative u32", idx)))
            .collect::<Result<Vec<u32>>>()?;
        let faces = nd::Array2::from_shape_vec(faces_raw.dim(), faces)?;
        if kintree_table.nrows() == 0 {
            return Err(GarmentError::shape_mismatch("kintree_table rows", "at least 1", 0));
        }
        if kintree_table.nrows() != 2 {
            warn!("kintree_table has {} rows, only the parent row is used", kintree_table.nrows());
        }
        let parents = kintree_table.row(0).to_vec();

        Self::new_from_matrices(&verts_template, &faces, &shape_dirs, &pose_dirs, &joint_regressor, lbs_weights, &parents)
    }

    /// Loads the model from an npz archive on disk
    #[cfg(not(target_arch = "wasm32"))]
    pub fn new_from_npz(model_path: impl AsRef<Path>) -> Result<Self> {
        let model_path = model_path.as_ref();
        info!("Loading body model from {}", model_path.display());
        let mut npz = NpzReader::new(std::fs::File::open(model_path)?)?;
        Self::new_from_npz_reader(&mut npz)
    }

    /// Loads the model from any reader over an npz archive
    pub fn new_from_reader<R: Read + Seek>(reader: R) -> Result<Self> {
        let mut npz = NpzReader::new(reader)?;
        Self::new_from_npz_reader(&mut npz)
    }

    pub fn num_shapes(&self) -> usize {
        self.shape_dirs.ncols()
    }

    pub fn num_verts(&self) -> usize {
        self.verts_template.nrows()
    }

    pub fn num_faces(&self) -> usize {
        self.faces.nrows()
    }

    pub fn num_joints(&self) -> usize {
        self.kintree.num_joints()
    }

    pub fn faces(&self) -> &nd::Array2<u32> {
        &self.faces
    }

    pub fn verts_template(&self) -> &nd::Array2<f32> {
        &self.verts_template
    }

    pub fn lbs_weights(&self) -> &nd::Array2<f32> {
        &self.lbs_weights
    }

    pub fn kintree(&self) -> &KinematicTree {
        &self.kintree
    }

    /// Shape blendshape offsets for a batch of coefficients [B, S] -> [B, V, 3]
    pub fn betas2offsets(&self, betas: nd::ArrayView2<f32>) -> Result<nd::Array3<f32>> {
        let batch = betas.nrows();
        ensure_shape("shape coefficients", &[batch, self.num_shapes()], betas.shape())?;
        Ok(betas.dot(&self.shape_dirs.t()).into_shape_with_order((batch, self.num_verts(), 3))?)
    }

    /// Rest joint positions regressed from a batch of meshes [B, V, 3] -> [B, K, 3]
    pub fn verts2joints(&self, verts: nd::ArrayView3<f32>) -> Result<nd::Array3<f32>> {
        let batch = verts.dim().0;
        ensure_shape("regressed vertices", &[batch, self.num_verts(), 3], verts.shape())?;
        let mut joints = nd::Array3::<f32>::zeros((batch, self.num_joints(), 3));
        for (mut joints_frame, verts_frame) in joints.outer_iter_mut().zip(verts.outer_iter()) {
            joints_frame.assign(&self.joint_regressor.dot(&verts_frame));
        }
        Ok(joints)
    }

    /// Evaluates the body for a batch of B frames.
    ///
    /// `betas` is [B, S], `pose` is [B, 3K] axis-angle per joint and
    /// `translation` is [B, 3]. Without a pose the shaped rest mesh is
    /// returned together with all-zero joint transforms and the translation is
    /// not applied.
    pub fn forward(
        &self,
        options: &SmplOptions,
        betas: nd::ArrayView2<f32>,
        pose: Option<nd::ArrayView2<f32>>,
        translation: Option<nd::ArrayView2<f32>>,
    ) -> Result<SmplOutput> {
        let batch = betas.nrows();
        let num_joints = self.num_joints();

        let shape_blendshape = self.betas2offsets(betas)?;
        let verts_shaped = &shape_blendshape + &self.verts_template;

        let Some(pose) = pose else {
            debug!("No pose given, returning the shaped rest mesh");
            return Ok(SmplOutput {
                verts: verts_shaped,
                joint_transforms: nd::Array4::<f32>::zeros((batch, num_joints, 4, 4)),
                intermediates: None,
            });
        };
        ensure_shape("pose", &[batch, 3 * num_joints], pose.shape())?;
        if let Some(translation) = translation {
            ensure_shape("translation", &[batch, 3], translation.shape())?;
        }

        let rot_mats = batch_rodrigues_eps(pose.to_shape((batch * num_joints, 3))?.view(), options.rotation_eps)
            .into_shape_with_order((batch, num_joints, 3, 3))?;

        let joints = self.verts2joints(verts_shaped.view())?;

        let identity = nd::Array2::<f32>::eye(3);
        let pose_feature = (&rot_mats.slice(s![.., 1.., .., ..]) - &identity)
            .to_shape((batch, 9 * (num_joints - 1)))?
            .into_owned();

        let pose_blendshape = if options.enable_pose_corrective {
            pose_feature.dot(&self.pose_dirs.t()).into_shape_with_order((batch, self.num_verts(), 3))?
        } else {
            nd::Array3::<f32>::zeros((batch, self.num_verts(), 3))
        };
        let verts_posed = &verts_shaped + &pose_blendshape;

        let (joints_posed, joint_transforms) = self.kintree.pose_skeleton(rot_mats.view(), joints.view())?;

        let mut verts = lbs(verts_posed.view(), joint_transforms.view(), &SkinningWeights::Shared(self.lbs_weights.view()))?;
        if let Some(translation) = translation {
            verts += &translation.insert_axis(Axis(1));
        }

        Ok(SmplOutput {
            verts,
            joint_transforms,
            intermediates: Some(SmplIntermediates {
                shape_blendshape,
                pose_blendshape,
                pose_feature,
                joint_locations_local: joints,
                joint_locations: joints_posed,
                verts_shaped,
                verts_posed,
            }),
        })
    }
}
