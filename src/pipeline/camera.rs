use crate::{error::CameraError, types::Frame};

/// A blocking source of frames. A `Read` error means the device is gone; a
/// `Decode` error only spoils the current frame.
pub trait FrameSource {
    fn read_frame(&mut self) -> Result<Frame, CameraError>;
}

impl FrameSource for Box<dyn FrameSource> {
    fn read_frame(&mut self) -> Result<Frame, CameraError> {
        (**self).read_frame()
    }
}

#[cfg(feature = "camera-nokhwa")]
pub use webcam::{CameraDevice, Webcam, available_cameras};

#[cfg(feature = "camera-nokhwa")]
mod webcam {
    use std::time::Instant;

    use anyhow::Result;
    use nokhwa::{
        Camera,
        pixel_format::RgbFormat,
        query,
        utils::{
            ApiBackend, CameraIndex, FrameFormat, RequestedFormat, RequestedFormatType,
        },
    };

    use super::FrameSource;
    use crate::{error::CameraError, pipeline::rgba_converter, types::Frame};

    // Tried in order. Some built-in cameras advertise YUYV but refuse to stream it.
    const PREFERRED_PIXEL_FORMATS: &[FrameFormat] = &[
        FrameFormat::RAWRGB,
        FrameFormat::RAWBGR,
        FrameFormat::GRAY,
        FrameFormat::YUYV,
        FrameFormat::NV12,
        FrameFormat::MJPEG,
    ];

    fn requested_formats() -> [RequestedFormat<'static>; 4] {
        [
            RequestedFormat::with_formats(
                RequestedFormatType::AbsoluteHighestFrameRate,
                PREFERRED_PIXEL_FORMATS,
            ),
            RequestedFormat::with_formats(
                RequestedFormatType::AbsoluteHighestResolution,
                PREFERRED_PIXEL_FORMATS,
            ),
            RequestedFormat::new::<RgbFormat>(RequestedFormatType::AbsoluteHighestFrameRate),
            RequestedFormat::new::<RgbFormat>(RequestedFormatType::None),
        ]
    }

    #[derive(Clone, Debug)]
    pub struct CameraDevice {
        pub index: CameraIndex,
        pub label: String,
    }

    pub fn available_cameras() -> Result<Vec<CameraDevice>> {
        let cameras = query(ApiBackend::Auto)?;
        Ok(cameras
            .into_iter()
            .map(|info| CameraDevice {
                index: info.index().clone(),
                label: info.human_name(),
            })
            .collect())
    }

    /// Webcam opened with the first format the driver accepts. The stream is
    /// closed when the value is dropped.
    pub struct Webcam {
        camera: Camera,
    }

    impl Webcam {
        pub fn open(index: u32) -> Result<Self, CameraError> {
            let index = CameraIndex::Index(index);
            let mut last_err = None;

            for requested in requested_formats() {
                match Camera::new(index.clone(), requested) {
                    Ok(mut camera) => match camera.open_stream() {
                        Ok(()) => {
                            log::info!(
                                "camera {} opened at {:?}",
                                camera.info().human_name(),
                                camera.camera_format()
                            );
                            return Ok(Self { camera });
                        }
                        Err(err) => last_err = Some(err.to_string()),
                    },
                    Err(err) => last_err = Some(err.to_string()),
                }
            }

            Err(CameraError::Open(last_err.unwrap_or_else(|| {
                "no supported format for camera".to_string()
            })))
        }
    }

    impl FrameSource for Webcam {
        fn read_frame(&mut self) -> Result<Frame, CameraError> {
            let frame_start = Instant::now();
            let buffer = self.camera.frame().map_err(|err| {
                CameraError::Read(format!("{err} (after {:?})", frame_start.elapsed()))
            })?;

            let converted = rgba_converter::convert_camera_frame(&buffer)
                .map_err(|err| CameraError::Decode(format!("{err:?}")))?;

            Ok(Frame::new(converted.rgba, converted.width, converted.height))
        }
    }

    impl Drop for Webcam {
        fn drop(&mut self) {
            if let Err(err) = self.camera.stop_stream() {
                log::warn!("failed to stop camera stream: {err}");
            }
        }
    }
}
