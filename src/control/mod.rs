pub mod mapper;
pub mod robot;
pub mod worker;

pub use mapper::ActuatorMapper;
pub use robot::{HttpRobot, RobotSink};
pub use worker::{ControlTiming, start_control_worker};
