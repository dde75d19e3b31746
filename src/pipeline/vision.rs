use std::thread;

use crossbeam_channel::Sender;

use super::{camera::FrameSource, detector::PoseDetector, overlay, signals::SignalExtractor};
use crate::{
    error::CameraError,
    queue,
    types::{AnnotatedFrame, SignalBundle},
    worker::{StopFlag, WorkerState, WorkerStatus},
};

pub struct VisionWorker<D> {
    pub detector: D,
    pub extractor: SignalExtractor,
    /// Full-scale hip sway, only used to scale the on-screen gauge.
    pub sway_range: f32,
}

/// Spawns the capture/inference thread.
///
/// The camera is opened on the worker thread; capture handles are usually
/// not `Send`. The stop flag is raised whenever the worker exits.
pub fn start_vision_worker<C, O, D>(
    open_camera: O,
    worker: VisionWorker<D>,
    frame_tx: Sender<AnnotatedFrame>,
    stop: StopFlag,
    status: WorkerStatus,
) -> std::io::Result<thread::JoinHandle<()>>
where
    C: FrameSource,
    O: FnOnce() -> Result<C, CameraError> + Send + 'static,
    D: PoseDetector,
{
    thread::Builder::new()
        .name("vision".to_string())
        .spawn(move || {
            match open_camera() {
                Ok(camera) => {
                    log::info!("vision worker started");
                    run_vision_loop(camera, worker, &frame_tx, &stop, &status);
                }
                Err(err) => {
                    log::error!("{err}");
                }
            }
            status.advance(WorkerState::Stopping);
            stop.set();
            status.advance(WorkerState::Stopped);
            log::info!("vision worker stopped");
        })
}

fn run_vision_loop<C, D>(
    mut camera: C,
    worker: VisionWorker<D>,
    frame_tx: &Sender<AnnotatedFrame>,
    stop: &StopFlag,
    status: &WorkerStatus,
) where
    C: FrameSource,
    D: PoseDetector,
{
    let VisionWorker {
        mut detector,
        mut extractor,
        sway_range,
    } = worker;

    while !stop.is_set() {
        let mut frame = match camera.read_frame() {
            Ok(frame) => frame,
            Err(CameraError::Decode(err)) => {
                log::warn!("failed to decode camera frame: {err}");
                continue;
            }
            Err(err) => {
                log::error!("{err}, vision worker exiting");
                break;
            }
        };

        let subjects = match detector.detect(&frame) {
            Ok(subjects) => subjects,
            Err(err) => {
                log::debug!("pose detection failed: {err:?}");
                Vec::new()
            }
        };

        let signals = match extractor.extract(&subjects) {
            Ok(signals) => signals,
            Err(err) => {
                log::debug!("keypoint processing failed: {err}");
                SignalBundle::default()
            }
        };

        overlay::annotate(
            &mut frame,
            &subjects,
            &signals,
            extractor.confidence_threshold(),
            sway_range,
        );

        // Drop the result if the display loop is behind.
        queue::offer(frame_tx, AnnotatedFrame { frame, signals });
    }

    status.advance(WorkerState::Stopping);
    // Dropping the camera here releases the device before the thread ends.
    drop(camera);
}
