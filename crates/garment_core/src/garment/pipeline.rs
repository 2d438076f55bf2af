use super::{
    features::MotionFeatures,
    learned::{BlendshapeCorrector, GarmentDecoder, PoseEncoder, SequenceRegressor, SkinningWeightsPredictor},
};
use crate::common::{config::PipelineConfig, motion::Motion, outputs::DeformedSequence};
use crate::error::{GarmentError, Result};
use crate::skinning::lbs::{lbs, SkinningWeights};
use crate::smpl::smpl_model::SmplBody;
use garment_utils::array::RepeatRows;
use log::{debug, info};
use ndarray::prelude::*;
use std::sync::Arc;

/// The body model and the learned networks of one garment.
#[derive(Clone)]
pub struct GarmentModels {
    pub smpl: Arc<SmplBody>,
    pub pose_encoder: Box<dyn PoseEncoder>,
    pub regressor: Box<dyn SequenceRegressor>,
    pub decoder: Box<dyn GarmentDecoder>,
    pub pose_blendshape: Box<dyn BlendshapeCorrector>,
    pub shape_blendshape: Box<dyn BlendshapeCorrector>,
    pub skinning_weights: Box<dyn SkinningWeightsPredictor>,
}

/// Runs a motion through the networks of [`GarmentModels`] and skins both the
/// garment and the body. Holds no state between runs.
#[derive(Clone)]
pub struct GarmentPipeline {
    models: GarmentModels,
    config: PipelineConfig,
}

impl GarmentPipeline {
    pub fn new(models: GarmentModels, config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { models, config })
    }

    pub fn models(&self) -> &GarmentModels {
        &self.models
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    fn check_motion(&self, motion: &Motion) -> Result<()> {
        let smpl = &self.models.smpl;
        if motion.num_joints() != smpl.num_joints() {
            return Err(GarmentError::shape_mismatch("motion joints", smpl.num_joints(), motion.num_joints()));
        }
        if motion.shape.len() != smpl.num_shapes() {
            return Err(GarmentError::shape_mismatch("motion shape coefficients", smpl.num_shapes(), motion.shape.len()));
        }
        Ok(())
    }

    /// Encodes the pose and derives the per frame inputs of the sequence
    /// regressor.
    pub fn compute_features(&self, motion: &Motion) -> Result<MotionFeatures> {
        self.check_motion(motion)?;
        let nr_frames = motion.num_frames();
        let pose_encoded = self
            .models
            .pose_encoder
            .encode(motion.body_pose())
            .map_err(as_external("pose encoder"))?;
        if pose_encoded.nrows() != nr_frames {
            return Err(GarmentError::external_model(
                "pose encoder",
                format!("expected {nr_frames} rows, got {:?}", pose_encoded.dim()),
            ));
        }
        MotionFeatures::compute(
            motion.shape_per_frame(),
            pose_encoded,
            motion.translation.view(),
            motion.root_rotation(),
            self.config.timestep(),
        )
    }

    /// Deforms the garment for every frame of `motion`.
    #[allow(clippy::similar_names)]
    pub fn run(&self, motion: &Motion) -> Result<DeformedSequence> {
        let models = &self.models;
        let features = self.compute_features(motion)?;
        let nr_frames = features.num_frames();

        info!("Running sequence regressor on {nr_frames} frames");
        let latent = models.regressor.regress(&features).map_err(as_external("sequence regressor"))?;
        if latent.nrows() != nr_frames {
            return Err(GarmentError::external_model(
                "sequence regressor",
                format!("expected {nr_frames} rows, got {:?}", latent.dim()),
            ));
        }

        info!("Decoding garment to canonical space");
        let canonical = models.decoder.decode(latent.view()).map_err(as_external("garment decoder"))?;
        let nr_garment_verts = canonical.dim().1;
        check_output("garment decoder", &[nr_frames, nr_garment_verts, 3], canonical.shape())?;
        let canonical_flat = canonical.to_shape((nr_frames * nr_garment_verts, 3))?;

        info!("Evaluating body model");
        let shape = features.shape.view();
        let body = models
            .smpl
            .forward(&self.config.smpl, shape, Some(motion.pose.view()), None)?;
        let pose_feature = body
            .intermediates
            .as_ref()
            .map(|intermediates| intermediates.pose_feature.view())
            .ok_or_else(|| GarmentError::shape_mismatch("body model output", "posed evaluation", "shape-only evaluation"))?;

        info!("Predicting garment blendshapes and skinning weights");
        let pose_repeat = pose_feature.repeat_rows(nr_garment_verts);
        let pose_correction = models
            .pose_blendshape
            .correct(canonical_flat.view(), pose_repeat.view())
            .map_err(as_external("pose blendshape"))?;
        check_output("pose blendshape", canonical_flat.shape(), pose_correction.shape())?;

        let shape_repeat = shape.repeat_rows(nr_garment_verts);
        let shape_correction = models
            .shape_blendshape
            .correct(canonical_flat.view(), shape_repeat.view())
            .map_err(as_external("shape blendshape"))?;
        check_output("shape blendshape", canonical_flat.shape(), shape_correction.shape())?;

        let nr_joints = models.smpl.num_joints();
        let skinning_weights = models
            .skinning_weights
            .predict(canonical_flat.view())
            .map_err(as_external("skinning weights"))?;
        check_output("skinning weights", &[nr_frames * nr_garment_verts, nr_joints], skinning_weights.shape())?;
        let skinning_weights = skinning_weights.to_shape((nr_frames, nr_garment_verts, nr_joints))?;

        let unposed_flat = &canonical_flat + &pose_correction + &shape_correction;
        let unposed = unposed_flat.to_shape((nr_frames, nr_garment_verts, 3))?;

        info!("Skinning garment");
        let mut garment = lbs(
            unposed.view(),
            body.joint_transforms.view(),
            &SkinningWeights::PerFrame(skinning_weights.view()),
        )?;
        let mut body_verts = body.verts;

        let translation = motion.translation.view().insert_axis(Axis(1));
        garment += &translation;
        body_verts += &translation;
        debug!(
            "Deformed {nr_garment_verts} garment and {} body vertices over {nr_frames} frames",
            body_verts.dim().1
        );

        Ok(DeformedSequence { garment, body: body_verts })
    }
}

/// Runs `motion` through `models` with the default configuration.
pub fn run(models: &GarmentModels, motion: &Motion) -> Result<DeformedSequence> {
    GarmentPipeline::new(models.clone(), PipelineConfig::default())?.run(motion)
}

/// Errors coming out of a network are reported against its role, unless the
/// network already raised an external model error itself.
fn as_external(model: &'static str) -> impl Fn(GarmentError) -> GarmentError {
    move |err| match err {
        GarmentError::ExternalModel { .. } => err,
        other => GarmentError::external_model(model, other.to_string()),
    }
}

fn check_output(model: &str, expected: &[usize], found: &[usize]) -> Result<()> {
    if expected == found {
        Ok(())
    } else {
        Err(GarmentError::external_model(model, format!("expected output shape {expected:?}, got {found:?}")))
    }
}
