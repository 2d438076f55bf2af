use clap::Parser;
use garment_rs::garment_core::{
    common::{
        config::{MotionConfig, PipelineConfig},
        motion::Motion,
        obj::{write_obj, ObjMesh},
    },
    garment::{
        fixed::{NearestBodyWeights, PassthroughPoseEncoder, TemplateGarmentDecoder, ZeroCorrector, ZeroLatentRegressor},
        pipeline::{GarmentModels, GarmentPipeline},
    },
    smpl::smpl_model::SmplBody,
    Result,
};
use log::{error, info};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(version, about, long_about = "Drapes a garment over an animated SMPL body and writes one obj pair per frame")]
struct Args {
    /// Motion capture archive with poses, trans, betas and mocap_framerate
    #[arg(long)]
    motion: PathBuf,
    /// SMPL body model as npz
    #[arg(long)]
    body_model: PathBuf,
    /// Canonical garment mesh as obj
    #[arg(long)]
    garment: PathBuf,
    /// Directory the meshes are written to
    #[arg(long, default_value = "results")]
    export_dir: PathBuf,
    /// Optional json with the pipeline config
    #[arg(long)]
    config: Option<PathBuf>,
    /// Optional json with the motion normalisation config
    #[arg(long)]
    motion_config: Option<PathBuf>,
    /// Width of the latent garment code
    #[arg(long, default_value_t = 128)]
    latent_dim: usize,
}

fn drape(args: &Args) -> Result<()> {
    let config = args.config.as_ref().map_or_else(|| Ok(PipelineConfig::default()), PipelineConfig::from_json_file)?;
    let motion_config = args
        .motion_config
        .as_ref()
        .map_or_else(|| Ok(MotionConfig::default()), MotionConfig::from_json_file)?;

    let motion = Motion::new_from_npz(&args.motion, &motion_config)?;
    let smpl = Arc::new(SmplBody::new_from_npz(&args.body_model)?);
    let garment = ObjMesh::read(&args.garment)?;
    info!(
        "Draping a garment with {} vertices over {} frames",
        garment.num_verts(),
        motion.num_frames()
    );

    let models = GarmentModels {
        pose_encoder: Box::new(PassthroughPoseEncoder),
        regressor: Box::new(ZeroLatentRegressor::new(args.latent_dim)),
        decoder: Box::new(TemplateGarmentDecoder::new(garment.verts.clone())?),
        pose_blendshape: Box::new(ZeroCorrector),
        shape_blendshape: Box::new(ZeroCorrector),
        skinning_weights: Box::new(NearestBodyWeights::from_body(&smpl)?),
        smpl: smpl.clone(),
    };
    let pipeline = GarmentPipeline::new(models, config)?;
    let deformed = pipeline.run(&motion)?;

    for idx in 0..deformed.num_frames() {
        let (garment_verts, body_verts) = deformed.frame(idx);
        write_obj(args.export_dir.join(format!("{idx:04}_body.obj")), body_verts, smpl.faces().view())?;
        write_obj(args.export_dir.join(format!("{idx:04}_garment.obj")), garment_verts, garment.faces.view())?;
    }
    info!("Wrote {} frames to {}", deformed.num_frames(), args.export_dir.display());
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    if let Err(err) = drape(&args) {
        error!("{err}");
        std::process::exit(1);
    }
}
