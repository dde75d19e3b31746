use std::{thread, time::Duration};

use crossbeam_channel::Receiver;

use super::{mapper::ActuatorMapper, robot::RobotSink};
use crate::{
    queue::{self, Poll},
    types::{JointTarget, SignalBundle},
    worker::{StopFlag, WorkerState, WorkerStatus},
};

#[derive(Clone, Copy, Debug)]
pub struct ControlTiming {
    /// How long one wait on the signal queue may block before re-checking stop.
    pub poll_timeout: Duration,
    /// Duration of the return-to-neutral move on shutdown.
    pub goto_duration: Duration,
}

/// Spawns the robot control thread.
///
/// Each received bundle is mapped and streamed with `set_target`. Once the
/// stop flag is seen (or every producer is gone) the robot is sent back to
/// neutral before the worker reports `Stopped`.
pub fn start_control_worker<S>(
    sink: S,
    mapper: ActuatorMapper,
    signal_rx: Receiver<SignalBundle>,
    stop: StopFlag,
    status: WorkerStatus,
    timing: ControlTiming,
) -> std::io::Result<thread::JoinHandle<()>>
where
    S: RobotSink,
{
    thread::Builder::new()
        .name("control".to_string())
        .spawn(move || {
            log::info!("control worker started");
            let mut sink = sink;
            run_control_loop(&mut sink, mapper, &signal_rx, &stop, timing.poll_timeout);

            status.advance(WorkerState::Stopping);
            log::info!("returning robot to neutral");
            if let Err(err) = sink.goto_target(&JointTarget::neutral(), timing.goto_duration) {
                log::error!("failed to return robot to neutral: {err}");
            }
            status.advance(WorkerState::Stopped);
            log::info!("control worker stopped");
        })
}

fn run_control_loop<S: RobotSink>(
    sink: &mut S,
    mut mapper: ActuatorMapper,
    signal_rx: &Receiver<SignalBundle>,
    stop: &StopFlag,
    poll_timeout: Duration,
) {
    while !stop.is_set() {
        let signals = match queue::poll(signal_rx, poll_timeout) {
            Poll::Item(signals) => signals,
            Poll::Empty => continue,
            Poll::Disconnected => {
                log::debug!("signal queue closed");
                break;
            }
        };

        let target = mapper.map(&signals);
        log::trace!("target {target:?}");
        if let Err(err) = sink.set_target(&target) {
            log::warn!("set_target failed: {err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::MappingConfig, error::RobotError};
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Debug, PartialEq)]
    enum Call {
        Goto(JointTarget, Duration),
        Set(JointTarget),
    }

    #[derive(Clone, Default)]
    struct RecordingSink {
        calls: Arc<Mutex<Vec<Call>>>,
        fail_set: bool,
    }

    impl RobotSink for RecordingSink {
        fn goto_target(
            &mut self,
            target: &JointTarget,
            duration: Duration,
        ) -> Result<(), RobotError> {
            self.calls.lock().unwrap().push(Call::Goto(*target, duration));
            Ok(())
        }

        fn set_target(&mut self, target: &JointTarget) -> Result<(), RobotError> {
            self.calls.lock().unwrap().push(Call::Set(*target));
            if self.fail_set {
                return Err(RobotError::Unavailable("daemon busy".to_string()));
            }
            Ok(())
        }
    }

    fn timing() -> ControlTiming {
        ControlTiming {
            poll_timeout: Duration::from_millis(10),
            goto_duration: Duration::from_millis(250),
        }
    }

    fn mapper() -> ActuatorMapper {
        ActuatorMapper::new(&MappingConfig::default())
    }

    #[test]
    fn streams_targets_then_returns_to_neutral() {
        let sink = RecordingSink::default();
        let calls = sink.calls.clone();
        let (tx, rx) = queue::drop_queue(4);
        let status = WorkerStatus::new("control");

        queue::offer(
            &tx,
            SignalBundle {
                hip_sway: Some(80.0),
                ..SignalBundle::default()
            },
        );
        queue::offer(&tx, SignalBundle::default());
        drop(tx);

        start_control_worker(sink, mapper(), rx, StopFlag::new(), status.clone(), timing())
            .unwrap()
            .join()
            .unwrap();

        let calls = calls.lock().unwrap().clone();
        assert_eq!(calls.len(), 3);
        let held = JointTarget {
            head_lateral_mm: -35.0,
            ..JointTarget::neutral()
        };
        assert_eq!(calls[0], Call::Set(held));
        assert_eq!(calls[1], Call::Set(held));
        assert_eq!(
            calls[2],
            Call::Goto(JointTarget::neutral(), Duration::from_millis(250))
        );
        assert_eq!(status.get(), WorkerState::Stopped);
    }

    #[test]
    fn robot_errors_do_not_stop_the_loop() {
        let sink = RecordingSink {
            fail_set: true,
            ..RecordingSink::default()
        };
        let calls = sink.calls.clone();
        let (tx, rx) = queue::drop_queue(4);
        queue::offer(&tx, SignalBundle::default());
        queue::offer(&tx, SignalBundle::default());
        drop(tx);

        start_control_worker(
            sink,
            mapper(),
            rx,
            StopFlag::new(),
            WorkerStatus::new("control"),
            timing(),
        )
        .unwrap()
        .join()
        .unwrap();

        let calls = calls.lock().unwrap();
        let sets = calls.iter().filter(|c| matches!(c, Call::Set(_))).count();
        assert_eq!(sets, 2);
        assert!(matches!(calls.last(), Some(Call::Goto(..))));
    }

    #[test]
    fn stop_flag_ends_idle_worker() {
        let sink = RecordingSink::default();
        let calls = sink.calls.clone();
        let (_tx, rx) = queue::drop_queue::<SignalBundle>(4);
        let stop = StopFlag::new();
        let status = WorkerStatus::new("control");

        let handle =
            start_control_worker(sink, mapper(), rx, stop.clone(), status.clone(), timing())
                .unwrap();
        thread::sleep(Duration::from_millis(30));
        assert_eq!(status.get(), WorkerState::Running);
        stop.set();
        handle.join().unwrap();

        assert_eq!(status.get(), WorkerState::Stopped);
        assert_eq!(
            *calls.lock().unwrap(),
            vec![Call::Goto(JointTarget::neutral(), Duration::from_millis(250))]
        );
    }
}
