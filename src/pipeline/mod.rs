pub mod camera;
pub mod detector;
pub mod overlay;
pub mod rgba_converter;
pub mod signals;
pub mod vision;

pub use camera::FrameSource;
#[cfg(feature = "camera-nokhwa")]
pub use camera::{CameraDevice, Webcam, available_cameras};
pub use detector::{PoseDetector, YoloPoseDetector};
pub use signals::SignalExtractor;
pub use vision::{VisionWorker, start_vision_worker};
