#![allow(clippy::unwrap_used)]

mod common;

use common::{max_abs_diff, two_joint_body, two_joint_npz, two_joint_template};
use garment_core::common::smpl_options::SmplOptions;
use garment_core::smpl::smpl_model::SmplBody;
use garment_core::GarmentError;
use ndarray as nd;
use ndarray::prelude::*;
use std::f32::consts::FRAC_PI_2;
use std::io::Cursor;

#[test]
fn shape_only_evaluation_is_template_plus_blendshape() {
    let body = two_joint_body();
    let betas = array![[0.5, 2.0]];
    let out = body.forward(&SmplOptions::default(), betas.view(), None, None).unwrap();

    let mut expected = two_joint_template();
    expected[(2, 0)] += 0.5;
    expected[(3, 1)] -= 1.0;
    assert_eq!(out.verts.index_axis(Axis(0), 0), expected);
    assert!(out.is_rest());
    assert!(out.joint_transforms.iter().all(|&x| x == 0.0));
}

#[test]
fn root_quarter_turn_rotates_the_whole_mesh() {
    let body = two_joint_body();
    let betas = nd::Array2::<f32>::zeros((2, 2));
    let pose = array![[0.0, 0.0, 0.0, 0.0, 0.0, 0.0], [0.0, 0.0, FRAC_PI_2, 0.0, 0.0, 0.0]];
    let translation = nd::Array2::<f32>::zeros((2, 3));
    let out = body
        .forward(&SmplOptions::default(), betas.view(), Some(pose.view()), Some(translation.view()))
        .unwrap();

    let template = two_joint_template();
    assert!(max_abs_diff(&out.verts.index_axis(Axis(0), 0).to_owned(), &template) < 1e-5);

    // rotating 90 degrees about z maps (x, y, z) to (-y, x, z)
    let rotated = nd::Array2::from_shape_fn((4, 3), |(v, c)| match c {
        0 => -template[(v, 1)],
        1 => template[(v, 0)],
        _ => template[(v, 2)],
    });
    assert!(max_abs_diff(&out.verts.index_axis(Axis(0), 1).to_owned(), &rotated) < 1e-5);

    let intermediates = out.intermediates.unwrap();
    let child = intermediates.joint_locations.slice(s![1, 1, ..]).to_owned();
    assert!(max_abs_diff(&child, &array![-1.0, 0.0, 0.0]) < 1e-5);
    // only non-root joints contribute to the pose feature
    assert!(intermediates.pose_feature.iter().all(|x| x.abs() < 1e-6));
}

#[test]
fn translation_is_added_to_every_vertex() {
    let body = two_joint_body();
    let betas = nd::Array2::<f32>::zeros((1, 2));
    let pose = array![[0.0, 0.3, 0.0, 0.2, 0.0, 0.0]];
    let translation = array![[1.0, 2.0, 3.0]];
    let options = SmplOptions::default();
    let moved = body.forward(&options, betas.view(), Some(pose.view()), Some(translation.view())).unwrap();
    let still = body.forward(&options, betas.view(), Some(pose.view()), None).unwrap();
    let offset = &moved.verts - &still.verts;
    for row in offset.index_axis(Axis(0), 0).rows() {
        assert!(max_abs_diff(&row.to_owned(), &array![1.0, 2.0, 3.0]) < 1e-5);
    }
}

#[test]
fn npz_assets_load_like_the_matrices() {
    let from_npz = SmplBody::new_from_reader(Cursor::new(two_joint_npz())).unwrap();
    let from_matrices = two_joint_body();
    assert_eq!(from_npz.num_verts(), 4);
    assert_eq!(from_npz.num_faces(), 2);
    assert_eq!(from_npz.num_joints(), 2);
    assert_eq!(from_npz.num_shapes(), 2);
    assert_eq!(from_npz.faces(), from_matrices.faces());

    let betas = array![[0.3, -0.2]];
    let pose = array![[0.1, 0.2, 0.3, -0.4, 0.0, 0.5]];
    let options = SmplOptions::default();
    let a = from_npz.forward(&options, betas.view(), Some(pose.view()), None).unwrap();
    let b = from_matrices.forward(&options, betas.view(), Some(pose.view()), None).unwrap();
    assert!(max_abs_diff(&a.verts, &b.verts) < 1e-6);
}

#[test]
fn npz_without_weights_is_rejected() {
    let mut writer = ndarray_npy::NpzWriter::new(Cursor::new(Vec::new()));
    writer.add_array("v_template", &nd::Array2::<f32>::zeros((4, 3))).unwrap();
    let buf = writer.finish().unwrap().into_inner();
    let res = SmplBody::new_from_reader(Cursor::new(buf));
    assert!(matches!(res, Err(GarmentError::Npz(_))));
}

#[test]
fn unordered_kinematic_tree_is_rejected() {
    let res = SmplBody::new_from_matrices(
        &two_joint_template(),
        &array![[0_u32, 1, 2]],
        &nd::Array3::zeros((4, 3, 2)),
        &nd::Array3::zeros((4, 3, 18)),
        &nd::Array2::zeros((3, 4)),
        nd::Array2::zeros((4, 3)),
        &[-1, 2, 0],
    );
    assert!(matches!(res, Err(GarmentError::MissingJointParent { joint: 1, parent: 2 })));
}

#[test]
fn body_model_is_shareable_between_threads() {
    let body = std::sync::Arc::new(two_joint_body());
    let handles: Vec<_> = (0..2)
        .map(|i| {
            let body = body.clone();
            std::thread::spawn(move || {
                #[allow(clippy::cast_precision_loss)]
                let betas = array![[i as f32, 0.0]];
                body.forward(&SmplOptions::default(), betas.view(), None, None).unwrap().verts
            })
        })
        .collect();
    let outputs: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(outputs[0][(0, 2, 0)], 1.0);
    assert_eq!(outputs[1][(0, 2, 0)], 2.0);
}
