use rayon::prelude::*;
use yuv::{
    YuvBiPlanarImage, YuvConversionMode, YuvPackedImage, YuvRange, YuvStandardMatrix,
    yuv_nv12_to_rgba, yuyv422_to_rgba,
};
use zune_jpeg::{
    JpegDecoder,
    zune_core::{bytestream::ZCursor, colorspace::ColorSpace, options::DecoderOptions},
};

use crate::error::CameraError;

/// Native camera pixel layouts we know how to expand to RGBA.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PixelLayout {
    Nv12,
    Yuyv,
    Mjpeg,
    Rgb,
    Bgr,
    Gray,
}

#[derive(Debug)]
pub struct RgbaFrame {
    pub rgba: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

#[cfg(feature = "camera-nokhwa")]
pub fn convert_camera_frame(frame: &nokhwa::Buffer) -> Result<RgbaFrame, CameraError> {
    use nokhwa::utils::FrameFormat;

    let layout = match frame.source_frame_format() {
        FrameFormat::NV12 => PixelLayout::Nv12,
        FrameFormat::YUYV => PixelLayout::Yuyv,
        FrameFormat::MJPEG => PixelLayout::Mjpeg,
        FrameFormat::RAWRGB => PixelLayout::Rgb,
        FrameFormat::RAWBGR => PixelLayout::Bgr,
        FrameFormat::GRAY => PixelLayout::Gray,
    };
    let resolution = frame.resolution();
    to_rgba(layout, frame.buffer(), resolution.width_x, resolution.height_y)
}

pub fn to_rgba(
    layout: PixelLayout,
    data: &[u8],
    width: u32,
    height: u32,
) -> Result<RgbaFrame, CameraError> {
    let rgba = match layout {
        PixelLayout::Mjpeg => return mjpeg_to_rgba(data),
        PixelLayout::Nv12 => nv12_to_rgba(data, width, height)?,
        PixelLayout::Yuyv => yuyv_to_rgba(data, width, height)?,
        PixelLayout::Rgb => rgb_like_to_rgba(data, width, height, false)?,
        PixelLayout::Bgr => rgb_like_to_rgba(data, width, height, true)?,
        PixelLayout::Gray => gray_to_rgba(data, width, height)?,
    };

    Ok(RgbaFrame {
        rgba,
        width,
        height,
    })
}

fn check_len(label: &str, data: &[u8], expected: usize) -> Result<(), CameraError> {
    if data.len() < expected {
        return Err(CameraError::Decode(format!(
            "{label} buffer too small: got {}, expected {expected}",
            data.len()
        )));
    }
    Ok(())
}

fn nv12_to_rgba(data: &[u8], width: u32, height: u32) -> Result<Vec<u8>, CameraError> {
    let y_plane_len = width as usize * height as usize;
    let uv_plane_len = y_plane_len / 2;
    check_len("NV12", data, y_plane_len + uv_plane_len)?;

    let mut rgba = vec![0u8; y_plane_len * 4];
    let image = YuvBiPlanarImage {
        y_plane: &data[..y_plane_len],
        y_stride: width,
        uv_plane: &data[y_plane_len..y_plane_len + uv_plane_len],
        uv_stride: width,
        width,
        height,
    };

    yuv_nv12_to_rgba(
        &image,
        &mut rgba,
        width * 4,
        YuvRange::Full,
        YuvStandardMatrix::Bt709,
        YuvConversionMode::Balanced,
    )
    .map_err(|err| CameraError::Decode(format!("NV12 to RGBA failed: {err:?}")))?;

    Ok(rgba)
}

fn yuyv_to_rgba(data: &[u8], width: u32, height: u32) -> Result<Vec<u8>, CameraError> {
    check_len("YUYV", data, width as usize * height as usize * 2)?;

    let mut rgba = vec![0u8; width as usize * height as usize * 4];
    let packed = YuvPackedImage {
        yuy: data,
        yuy_stride: width * 2,
        width,
        height,
    };

    yuyv422_to_rgba(
        &packed,
        &mut rgba,
        width * 4,
        YuvRange::Full,
        YuvStandardMatrix::Bt709,
    )
    .map_err(|err| CameraError::Decode(format!("YUYV422 to RGBA failed: {err:?}")))?;

    Ok(rgba)
}

/// MJPEG carries its own dimensions, which win over what the driver reports.
fn mjpeg_to_rgba(data: &[u8]) -> Result<RgbaFrame, CameraError> {
    let options = DecoderOptions::default().jpeg_set_out_colorspace(ColorSpace::RGBA);
    let mut decoder = JpegDecoder::new_with_options(ZCursor::new(data), options);
    let rgba = decoder
        .decode()
        .map_err(|err| CameraError::Decode(format!("MJPEG decode failed: {err:?}")))?;

    let info = decoder
        .info()
        .ok_or_else(|| CameraError::Decode("MJPEG header missing".to_string()))?;
    let (width, height) = u32::try_from(info.width)
        .and_then(|w| u32::try_from(info.height).map(|h| (w, h)))
        .map_err(|_| CameraError::Decode("MJPEG dimensions do not fit u32".to_string()))?;
    check_len("MJPEG output", &rgba, width as usize * height as usize * 4)?;

    Ok(RgbaFrame {
        rgba,
        width,
        height,
    })
}

fn rgb_like_to_rgba(
    data: &[u8],
    width: u32,
    height: u32,
    swap_rb: bool,
) -> Result<Vec<u8>, CameraError> {
    check_len("RGB", data, width as usize * height as usize * 3)?;

    let mut rgba = vec![0u8; width as usize * height as usize * 4];
    rgba.par_chunks_mut(4)
        .zip(data.par_chunks_exact(3))
        .for_each(|(dst, src)| {
            let (r, b) = if swap_rb { (src[2], src[0]) } else { (src[0], src[2]) };
            dst.copy_from_slice(&[r, src[1], b, 255]);
        });

    Ok(rgba)
}

fn gray_to_rgba(data: &[u8], width: u32, height: u32) -> Result<Vec<u8>, CameraError> {
    let pixels = width as usize * height as usize;
    check_len("GRAY", data, pixels)?;

    let mut rgba = vec![0u8; pixels * 4];
    rgba.par_chunks_mut(4)
        .zip(data.par_iter().copied())
        .for_each(|(dst, value)| dst.copy_from_slice(&[value, value, value, 255]));

    Ok(rgba)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bgr_swaps_red_and_blue() {
        let frame = to_rgba(PixelLayout::Bgr, &[10, 20, 30, 1, 2, 3], 2, 1).unwrap();
        assert_eq!(frame.rgba, vec![30, 20, 10, 255, 3, 2, 1, 255]);
    }

    #[test]
    fn rgb_keeps_channel_order() {
        let frame = to_rgba(PixelLayout::Rgb, &[10, 20, 30], 1, 1).unwrap();
        assert_eq!(frame.rgba, vec![10, 20, 30, 255]);
    }

    #[test]
    fn gray_expands_to_opaque_rgba() {
        let frame = to_rgba(PixelLayout::Gray, &[7, 200], 2, 1).unwrap();
        assert_eq!(frame.rgba, vec![7, 7, 7, 255, 200, 200, 200, 255]);
        assert_eq!((frame.width, frame.height), (2, 1));
    }

    #[test]
    fn short_buffers_are_decode_errors() {
        let err = to_rgba(PixelLayout::Yuyv, &[0; 3], 2, 2).unwrap_err();
        assert!(matches!(err, CameraError::Decode(_)));
        let err = to_rgba(PixelLayout::Nv12, &[0; 4], 2, 2).unwrap_err();
        assert!(matches!(err, CameraError::Decode(_)));
    }

    #[test]
    fn garbage_mjpeg_is_decode_error() {
        let err = to_rgba(PixelLayout::Mjpeg, &[0, 1, 2, 3], 0, 0).unwrap_err();
        assert!(matches!(err, CameraError::Decode(_)));
    }
}
