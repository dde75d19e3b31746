use std::{thread, time::Duration};

use reqwest::blocking::Client;
use serde::Serialize;

use crate::{
    config::RobotConfig,
    error::RobotError,
    types::{HeadPose, JointTarget},
};

const GOTO_PATH: &str = "/api/move/goto";
const SET_TARGET_PATH: &str = "/api/move/set_target";

/// Something that accepts joint-space targets.
pub trait RobotSink: Send + 'static {
    /// Interpolated move that returns once the robot got there.
    fn goto_target(&mut self, target: &JointTarget, duration: Duration) -> Result<(), RobotError>;

    /// Streaming command; returns immediately.
    fn set_target(&mut self, target: &JointTarget) -> Result<(), RobotError>;
}

impl RobotSink for Box<dyn RobotSink> {
    fn goto_target(&mut self, target: &JointTarget, duration: Duration) -> Result<(), RobotError> {
        (**self).goto_target(target, duration)
    }

    fn set_target(&mut self, target: &JointTarget) -> Result<(), RobotError> {
        (**self).set_target(target)
    }
}

#[derive(Debug, Serialize, PartialEq)]
pub struct HeadPosePayload {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub roll: f32,
    pub pitch: f32,
    pub yaw: f32,
}

impl From<HeadPose> for HeadPosePayload {
    /// The daemon works in metres.
    fn from(pose: HeadPose) -> Self {
        Self {
            x: pose.x_mm / 1000.0,
            y: pose.y_mm / 1000.0,
            z: pose.z_mm / 1000.0,
            roll: pose.roll,
            pitch: pose.pitch,
            yaw: pose.yaw,
        }
    }
}

#[derive(Debug, Serialize, PartialEq)]
pub struct GotoRequest {
    pub head_pose: HeadPosePayload,
    pub antennas: [f32; 2],
    pub duration: f32,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct SetTargetRequest {
    pub target_head_pose: HeadPosePayload,
    pub target_antennas: [f32; 2],
}

impl GotoRequest {
    pub fn new(target: &JointTarget, duration: Duration) -> Self {
        Self {
            head_pose: target.head_pose().into(),
            antennas: target.antennas(),
            duration: duration.as_secs_f32(),
        }
    }
}

impl SetTargetRequest {
    pub fn new(target: &JointTarget) -> Self {
        Self {
            target_head_pose: target.head_pose().into(),
            target_antennas: target.antennas(),
        }
    }
}

/// Robot daemon reached over its HTTP/JSON API.
pub struct HttpRobot {
    client: Client,
    base_url: String,
}

impl HttpRobot {
    pub fn new(cfg: &RobotConfig) -> Result<Self, RobotError> {
        let base_url = cfg.base_url.trim_end_matches('/').to_string();
        let client = Client::builder()
            .timeout(cfg.request_timeout())
            .build()
            .map_err(|source| RobotError::Transport {
                url: base_url.clone(),
                source,
            })?;
        Ok(Self { client, base_url })
    }

    fn post<T: Serialize>(&self, path: &str, body: &T) -> Result<(), RobotError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .map_err(|source| RobotError::Transport {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(RobotError::Status { url, status });
        }
        Ok(())
    }
}

impl RobotSink for HttpRobot {
    fn goto_target(&mut self, target: &JointTarget, duration: Duration) -> Result<(), RobotError> {
        self.post(GOTO_PATH, &GotoRequest::new(target, duration))?;
        // The daemon answers as soon as the move is queued.
        thread::sleep(duration);
        Ok(())
    }

    fn set_target(&mut self, target: &JointTarget) -> Result<(), RobotError> {
        self.post(SET_TARGET_PATH, &SetTargetRequest::new(target))
    }
}
