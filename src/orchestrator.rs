use std::thread::JoinHandle;

use anyhow::{Context, Result};
use crossbeam_channel::{Receiver, Sender};

use crate::{
    calibration::{CalibrationStore, RecalibrateTrigger},
    config::Config,
    control::{ActuatorMapper, ControlTiming, RobotSink, start_control_worker},
    display::{Display, KeyCommand},
    error::CameraError,
    pipeline::{
        FrameSource, PoseDetector, SignalExtractor, VisionWorker, start_vision_worker,
    },
    queue::{self, Poll},
    types::{AnnotatedFrame, SignalBundle},
    worker::{StopFlag, WorkerState, WorkerStatus},
};

struct Worker {
    handle: JoinHandle<()>,
    status: WorkerStatus,
}

impl Worker {
    fn join(self) {
        let name = self.status.name();
        if self.handle.join().is_err() {
            log::error!("{name} worker panicked");
            self.status.advance(WorkerState::Stopped);
        }
    }
}

/// Owns the queues and shared flags, and drives the display from the
/// calling thread while the vision and control workers run in the background.
pub struct Orchestrator {
    stop: StopFlag,
    trigger: RecalibrateTrigger,
    frame_rx: Receiver<AnnotatedFrame>,
    signal_tx: Sender<SignalBundle>,
    poll_timeout: std::time::Duration,
    vision: Worker,
    control: Worker,
}

impl Orchestrator {
    pub fn start<C, O, D, S>(cfg: &Config, open_camera: O, detector: D, robot: S) -> Result<Self>
    where
        C: FrameSource,
        O: FnOnce() -> Result<C, CameraError> + Send + 'static,
        D: PoseDetector,
        S: RobotSink,
    {
        let stop = StopFlag::new();
        let trigger = RecalibrateTrigger::new();
        let (frame_tx, frame_rx) = queue::drop_queue(cfg.pipeline.frame_queue_capacity);
        let (signal_tx, signal_rx) = queue::drop_queue(cfg.pipeline.signal_queue_capacity);

        let control_status = WorkerStatus::new("control");
        let control_handle = start_control_worker(
            robot,
            ActuatorMapper::new(&cfg.mapping),
            signal_rx,
            stop.clone(),
            control_status.clone(),
            ControlTiming {
                poll_timeout: cfg.pipeline.poll_timeout(),
                goto_duration: cfg.robot.goto_duration(),
            },
        )
        .context("failed to spawn control worker")?;
        let control = Worker {
            handle: control_handle,
            status: control_status,
        };

        let vision_status = WorkerStatus::new("vision");
        let extractor = SignalExtractor::new(
            CalibrationStore::new(),
            trigger.clone(),
            cfg.signals.confidence_threshold,
        );
        let spawned = start_vision_worker(
            open_camera,
            VisionWorker {
                detector,
                extractor,
                sway_range: cfg.mapping.sway_pixel_max,
            },
            frame_tx,
            stop.clone(),
            vision_status.clone(),
        );
        let vision_handle = match spawned {
            Ok(handle) => handle,
            Err(err) => {
                stop.set();
                control.join();
                return Err(err).context("failed to spawn vision worker");
            }
        };

        Ok(Self {
            stop,
            trigger,
            frame_rx,
            signal_tx,
            poll_timeout: cfg.pipeline.poll_timeout(),
            vision: Worker {
                handle: vision_handle,
                status: vision_status,
            },
            control,
        })
    }

    pub fn stop_flag(&self) -> StopFlag {
        self.stop.clone()
    }

    pub fn recalibrate_trigger(&self) -> RecalibrateTrigger {
        self.trigger.clone()
    }

    pub fn vision_status(&self) -> WorkerStatus {
        self.vision.status.clone()
    }

    pub fn control_status(&self) -> WorkerStatus {
        self.control.status.clone()
    }

    /// Runs the display loop until quit, Ctrl-C or a worker failure, then
    /// joins both workers. The robot is back at neutral when this returns.
    pub fn run<V: Display>(self, display: &mut V) -> Result<()> {
        let Self {
            stop,
            trigger,
            frame_rx,
            signal_tx,
            poll_timeout,
            vision,
            control,
        } = self;

        let mut outcome = Ok(());
        while !stop.is_set() {
            match queue::poll(&frame_rx, poll_timeout) {
                Poll::Item(annotated) => {
                    queue::offer(&signal_tx, annotated.signals);
                    if let Err(err) = display.show(&annotated.frame) {
                        log::error!("display failed: {err:?}");
                        outcome = Err(err);
                        break;
                    }
                }
                Poll::Empty => match display.refresh() {
                    Ok(true) => {}
                    Ok(false) => continue,
                    Err(err) => {
                        log::error!("display failed: {err:?}");
                        outcome = Err(err);
                        break;
                    }
                },
                Poll::Disconnected => break,
            }

            match display.poll_command() {
                Some(KeyCommand::Quit) => {
                    log::info!("quit requested");
                    break;
                }
                Some(KeyCommand::Calibrate) => {
                    log::info!("recalibration requested");
                    trigger.fire();
                }
                None => {}
            }
        }

        stop.set();
        drop(signal_tx);
        drop(frame_rx);
        log::info!("shutting down, waiting for workers");
        vision.join();
        control.join();
        log::info!("shutdown complete");
        outcome
    }
}
