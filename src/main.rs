use std::path::PathBuf;

use anyhow::{Context, Result};
use pose_mirror::{
    Config, Orchestrator,
    control::{HttpRobot, RobotSink},
    display::MinifbDisplay,
    model_download::ensure_pose_model_ready,
    pipeline::{YoloPoseDetector, detector::YoloPoseConfig},
    types::JointTarget,
};

const DEFAULT_CONFIG_PATH: &str = "pose-mirror.toml";

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config_path = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
    let cfg = Config::load_or_default(&config_path)
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;

    let mut robot = HttpRobot::new(&cfg.robot)?;
    robot
        .goto_target(&JointTarget::neutral(), cfg.robot.goto_duration())
        .context("robot did not accept the neutral pose, is the daemon running?")?;
    log::info!("robot connected at {}", cfg.robot.base_url);

    ensure_pose_model_ready(&cfg.detector.model_path, cfg.detector.model_url.as_deref())?;
    let detector = YoloPoseDetector::new(
        &cfg.detector.model_path,
        cfg.detector.intra_threads,
        YoloPoseConfig::from(&cfg.detector),
    )?;

    log_cameras();
    let camera_index = cfg.camera.index;
    let orchestrator = Orchestrator::start(&cfg, move || open_camera(camera_index), detector, robot)?;

    let stop = orchestrator.stop_flag();
    ctrlc::set_handler(move || {
        log::info!("interrupt received");
        stop.set();
    })
    .context("failed to install Ctrl-C handler")?;

    log::info!("press 'c' to calibrate hip sway, 'q' or Esc to quit");
    let mut display = MinifbDisplay::new(&cfg.display.title);
    orchestrator.run(&mut display)
}

#[cfg(feature = "camera-nokhwa")]
fn log_cameras() {
    match pose_mirror::pipeline::available_cameras() {
        Ok(devices) => {
            for device in devices {
                log::info!("found camera {:?}: {}", device.index, device.label);
            }
        }
        Err(err) => log::warn!("failed to list cameras: {err:?}"),
    }
}

#[cfg(not(feature = "camera-nokhwa"))]
fn log_cameras() {}

#[cfg(feature = "camera-nokhwa")]
fn open_camera(
    index: u32,
) -> Result<pose_mirror::pipeline::Webcam, pose_mirror::error::CameraError> {
    pose_mirror::pipeline::Webcam::open(index)
}

#[cfg(not(feature = "camera-nokhwa"))]
fn open_camera(
    _index: u32,
) -> Result<Box<dyn pose_mirror::pipeline::FrameSource>, pose_mirror::error::CameraError> {
    Err(pose_mirror::error::CameraError::Open(
        "built without the camera-nokhwa feature".to_string(),
    ))
}
