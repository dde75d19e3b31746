use std::{
    sync::{Arc, Mutex},
    thread,
    time::Duration,
};

use pose_mirror::{
    Config, Orchestrator,
    control::RobotSink,
    display::{Display, KeyCommand},
    error::{CameraError, RobotError},
    pipeline::{
        FrameSource,
        detector::{
            LEFT_ELBOW, LEFT_HIP, LEFT_SHOULDER, NUM_KEYPOINTS, RIGHT_ELBOW, RIGHT_HIP,
            RIGHT_SHOULDER,
        },
    },
    types::{Frame, JointTarget, Keypoint, Subject},
    worker::WorkerState,
};

const EPS: f32 = 1e-4;

/// Camera that produces `remaining` frames and then reports a read failure.
struct FakeCamera {
    remaining: usize,
    interval: Duration,
}

impl FakeCamera {
    fn new(remaining: usize) -> Self {
        Self {
            remaining,
            interval: Duration::from_millis(5),
        }
    }
}

impl FrameSource for FakeCamera {
    fn read_frame(&mut self) -> Result<Frame, CameraError> {
        if self.remaining == 0 {
            return Err(CameraError::Read("camera unplugged".to_string()));
        }
        self.remaining -= 1;
        thread::sleep(self.interval);
        Ok(Frame::filled(64, 48, [0, 0, 0, 255]))
    }
}

/// Upright operator with arms straight out and hips 20 px right of the shoulders.
fn operator(_: &Frame) -> anyhow::Result<Vec<Subject>> {
    let mut keypoints = vec![Keypoint::new(0.0, 0.0, 0.0); NUM_KEYPOINTS];
    keypoints[LEFT_SHOULDER] = Keypoint::new(260.0, 100.0, 0.9);
    keypoints[RIGHT_SHOULDER] = Keypoint::new(140.0, 100.0, 0.9);
    keypoints[LEFT_ELBOW] = Keypoint::new(340.0, 100.0, 0.9);
    keypoints[RIGHT_ELBOW] = Keypoint::new(60.0, 100.0, 0.9);
    keypoints[LEFT_HIP] = Keypoint::new(280.0, 300.0, 0.9);
    keypoints[RIGHT_HIP] = Keypoint::new(160.0, 300.0, 0.9);
    Ok(vec![Subject::new(keypoints)])
}

#[derive(Clone, Debug, PartialEq)]
enum Call {
    Goto(JointTarget),
    Set(JointTarget),
}

#[derive(Clone, Default)]
struct RecordingRobot {
    calls: Arc<Mutex<Vec<Call>>>,
}

impl RecordingRobot {
    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }
}

impl RobotSink for RecordingRobot {
    fn goto_target(&mut self, target: &JointTarget, _: Duration) -> Result<(), RobotError> {
        self.calls.lock().unwrap().push(Call::Goto(*target));
        Ok(())
    }

    fn set_target(&mut self, target: &JointTarget) -> Result<(), RobotError> {
        self.calls.lock().unwrap().push(Call::Set(*target));
        Ok(())
    }
}

/// Presses `c` after `calibrate_at` frames and `q` after `quit_at` frames.
struct ScriptedDisplay {
    shown: usize,
    calibrate_at: Option<usize>,
    quit_at: Option<usize>,
    pending: Option<KeyCommand>,
}

impl ScriptedDisplay {
    fn new(calibrate_at: Option<usize>, quit_at: Option<usize>) -> Self {
        Self {
            shown: 0,
            calibrate_at,
            quit_at,
            pending: None,
        }
    }
}

impl Display for ScriptedDisplay {
    fn show(&mut self, frame: &Frame) -> anyhow::Result<()> {
        assert_eq!(frame.rgba.len(), (frame.width * frame.height * 4) as usize);
        self.shown += 1;
        if Some(self.shown) == self.calibrate_at {
            self.pending = Some(KeyCommand::Calibrate);
        } else if Some(self.shown) == self.quit_at {
            // Give the control worker a moment to drain what was forwarded.
            thread::sleep(Duration::from_millis(50));
            self.pending = Some(KeyCommand::Quit);
        }
        Ok(())
    }

    fn poll_command(&mut self) -> Option<KeyCommand> {
        self.pending.take()
    }
}

/// Behaves like a minifb window: a key stays "pressed" from the moment it goes
/// down until the next window update, no matter how often it is read.
#[derive(Default)]
struct WindowLikeDisplay {
    shown: usize,
    refreshes: usize,
    pressed: Option<KeyCommand>,
    calibrations_seen: usize,
}

impl WindowLikeDisplay {
    fn update(&mut self) {
        self.pressed = None;
    }
}

impl Display for WindowLikeDisplay {
    fn show(&mut self, _: &Frame) -> anyhow::Result<()> {
        self.update();
        self.shown += 1;
        match self.shown {
            1 => self.pressed = Some(KeyCommand::Calibrate),
            4 => self.pressed = Some(KeyCommand::Quit),
            _ => {}
        }
        Ok(())
    }

    fn refresh(&mut self) -> anyhow::Result<bool> {
        self.update();
        self.refreshes += 1;
        Ok(true)
    }

    fn poll_command(&mut self) -> Option<KeyCommand> {
        if self.pressed == Some(KeyCommand::Calibrate) {
            self.calibrations_seen += 1;
        }
        self.pressed
    }
}

fn config() -> Config {
    let mut cfg = Config::default();
    cfg.pipeline.poll_timeout_ms = 10;
    cfg.robot.goto_duration_secs = 0.0;
    cfg
}

fn sets(calls: &[Call]) -> Vec<JointTarget> {
    calls
        .iter()
        .filter_map(|c| match c {
            Call::Set(t) => Some(*t),
            Call::Goto(_) => None,
        })
        .collect()
}

#[test]
fn quit_key_shuts_down_and_returns_robot_to_neutral() {
    let robot = RecordingRobot::default();
    let orchestrator = Orchestrator::start(
        &config(),
        || Ok(FakeCamera::new(10_000)),
        operator,
        robot.clone(),
    )
    .unwrap();
    let (vision, control) = (orchestrator.vision_status(), orchestrator.control_status());

    let mut display = ScriptedDisplay::new(None, Some(5));
    orchestrator.run(&mut display).unwrap();

    assert!(orchestrator_stopped(&vision, &control));
    assert_eq!(display.shown, 5);

    let calls = robot.calls();
    assert_eq!(calls.last(), Some(&Call::Goto(JointTarget::neutral())));
    let sets = sets(&calls);
    assert!(!sets.is_empty());
    // 20 px of sway, mirrored onto the lateral axis.
    let first = sets[0];
    assert!((first.head_lateral_mm + 8.75).abs() < EPS, "{first:?}");
    assert!((first.antenna_left_rad + std::f32::consts::FRAC_PI_2).abs() < EPS);
    assert!((first.antenna_right_rad - std::f32::consts::FRAC_PI_2).abs() < EPS);
}

#[test]
fn calibrate_key_zeroes_current_sway() {
    let robot = RecordingRobot::default();
    let orchestrator = Orchestrator::start(
        &config(),
        || Ok(FakeCamera::new(10_000)),
        operator,
        robot.clone(),
    )
    .unwrap();

    let mut display = ScriptedDisplay::new(Some(3), Some(20));
    orchestrator.run(&mut display).unwrap();

    let sets = sets(&robot.calls());
    assert!((sets[0].head_lateral_mm + 8.75).abs() < EPS);
    let last = sets.last().unwrap();
    assert!(last.head_lateral_mm.abs() < EPS, "{last:?}");
}

#[test]
fn one_key_press_calibrates_once_while_frames_are_slow() {
    let robot = RecordingRobot::default();
    let orchestrator = Orchestrator::start(
        &config(),
        || {
            Ok(FakeCamera {
                remaining: 10_000,
                interval: Duration::from_millis(120),
            })
        },
        operator,
        robot.clone(),
    )
    .unwrap();
    let trigger = orchestrator.recalibrate_trigger();

    let mut display = WindowLikeDisplay::default();
    orchestrator.run(&mut display).unwrap();

    assert_eq!(display.shown, 4);
    assert!(display.refreshes > 0);
    assert_eq!(display.calibrations_seen, 1);
    assert!(!trigger.is_pending());
}

#[test]
fn camera_failure_stops_everything_without_a_key() {
    let robot = RecordingRobot::default();
    let orchestrator = Orchestrator::start(
        &config(),
        || Ok(FakeCamera::new(3)),
        operator,
        robot.clone(),
    )
    .unwrap();
    let (vision, control) = (orchestrator.vision_status(), orchestrator.control_status());
    let stop = orchestrator.stop_flag();

    let mut display = ScriptedDisplay::new(None, None);
    orchestrator.run(&mut display).unwrap();

    assert!(stop.is_set());
    assert!(orchestrator_stopped(&vision, &control));
    assert!(display.shown <= 3);
    assert_eq!(robot.calls().last(), Some(&Call::Goto(JointTarget::neutral())));
}

#[test]
fn external_stop_ends_the_run() {
    let robot = RecordingRobot::default();
    let orchestrator = Orchestrator::start(
        &config(),
        || Ok(FakeCamera::new(10_000)),
        operator,
        robot.clone(),
    )
    .unwrap();
    let stop = orchestrator.stop_flag();
    let interrupter = thread::spawn(move || {
        thread::sleep(Duration::from_millis(60));
        stop.set();
    });

    let mut display = ScriptedDisplay::new(None, None);
    orchestrator.run(&mut display).unwrap();
    interrupter.join().unwrap();

    assert_eq!(robot.calls().last(), Some(&Call::Goto(JointTarget::neutral())));
}

#[test]
fn camera_open_failure_still_parks_the_robot() {
    let robot = RecordingRobot::default();
    let orchestrator = Orchestrator::start(
        &config(),
        || -> Result<FakeCamera, CameraError> { Err(CameraError::Open("no device".to_string())) },
        operator,
        robot.clone(),
    )
    .unwrap();

    let mut display = ScriptedDisplay::new(None, None);
    orchestrator.run(&mut display).unwrap();

    assert_eq!(display.shown, 0);
    assert_eq!(robot.calls(), vec![Call::Goto(JointTarget::neutral())]);
}

fn orchestrator_stopped(
    vision: &pose_mirror::worker::WorkerStatus,
    control: &pose_mirror::worker::WorkerStatus,
) -> bool {
    vision.get() == WorkerState::Stopped && control.get() == WorkerState::Stopped
}
