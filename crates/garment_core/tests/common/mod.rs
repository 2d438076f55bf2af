#![allow(dead_code)]

use garment_core::garment::{
    fixed::{NearestBodyWeights, PassthroughPoseEncoder, TemplateGarmentDecoder, ZeroCorrector, ZeroLatentRegressor},
    pipeline::GarmentModels,
};
use garment_core::smpl::smpl_model::SmplBody;
use ndarray as nd;
use ndarray::prelude::*;
use ndarray_npy::NpzWriter;
use std::io::Cursor;
use std::sync::Arc;

/// Root at the origin and one child at (0, 1, 0). Vertex 1 sits on the child
/// joint and is skinned to it, the rest follow the root.
pub fn two_joint_template() -> nd::Array2<f32> {
    array![[0.0, 0.0, 0.0], [0.0, 1.0, 0.0], [1.0, 0.0, 0.0], [0.5, 0.5, 0.3]]
}

pub fn two_joint_weights() -> nd::Array2<f32> {
    array![[1.0, 0.0], [0.0, 1.0], [1.0, 0.0], [1.0, 0.0]]
}

pub fn two_joint_shape_dirs() -> nd::Array3<f32> {
    let mut shape_dirs = nd::Array3::<f32>::zeros((4, 3, 2));
    shape_dirs[(2, 0, 0)] = 1.0;
    shape_dirs[(3, 1, 1)] = -0.5;
    shape_dirs
}

pub fn two_joint_regressor() -> nd::Array2<f32> {
    array![[1.0, 0.0, 0.0, 0.0], [0.0, 1.0, 0.0, 0.0]]
}

pub fn two_joint_body() -> SmplBody {
    SmplBody::new_from_matrices(
        &two_joint_template(),
        &array![[0_u32, 1, 2], [0, 2, 3]],
        &two_joint_shape_dirs(),
        &nd::Array3::zeros((4, 3, 9)),
        &two_joint_regressor(),
        two_joint_weights(),
        &[-1, 0],
    )
    .unwrap()
}

/// The same body written the way exported SMPL assets are: f64 floats, i32
/// faces and a 2-row kinematic tree table.
pub fn two_joint_npz() -> Vec<u8> {
    let mut writer = NpzWriter::new(Cursor::new(Vec::new()));
    writer.add_array("v_template", &two_joint_template().mapv(f64::from)).unwrap();
    writer.add_array("f", &array![[0_i32, 1, 2], [0, 2, 3]]).unwrap();
    writer.add_array("shapedirs", &two_joint_shape_dirs().mapv(f64::from)).unwrap();
    writer.add_array("posedirs", &nd::Array3::<f64>::zeros((4, 3, 9))).unwrap();
    writer.add_array("J_regressor", &two_joint_regressor().mapv(f64::from)).unwrap();
    writer.add_array("weights", &two_joint_weights().mapv(f64::from)).unwrap();
    writer.add_array("kintree_table", &array![[-1_i64, 0], [0, 1]]).unwrap();
    writer.finish().unwrap().into_inner()
}

/// A small garment floating around the two joint body
pub fn garment_template() -> nd::Array2<f32> {
    array![[0.1, 0.1, 0.0], [0.0, 0.9, 0.1], [0.9, 0.1, 0.0], [0.4, 0.6, 0.3], [0.0, 1.2, 0.0]]
}

pub fn fixed_models(smpl: Arc<SmplBody>) -> GarmentModels {
    let skinning_weights = NearestBodyWeights::from_body(&smpl).unwrap();
    GarmentModels {
        pose_encoder: Box::new(PassthroughPoseEncoder),
        regressor: Box::new(ZeroLatentRegressor::new(8)),
        decoder: Box::new(TemplateGarmentDecoder::new(garment_template()).unwrap()),
        pose_blendshape: Box::new(ZeroCorrector),
        shape_blendshape: Box::new(ZeroCorrector),
        skinning_weights: Box::new(skinning_weights),
        smpl,
    }
}

pub fn max_abs_diff<D: nd::Dimension>(a: &nd::Array<f32, D>, b: &nd::Array<f32, D>) -> f32 {
    assert_eq!(a.shape(), b.shape());
    a.iter().zip(b.iter()).fold(0.0_f32, |m, (x, y)| m.max((x - y).abs()))
}
