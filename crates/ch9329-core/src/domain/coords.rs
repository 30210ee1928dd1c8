//! Screen-to-device coordinate mapping.
//!
//! The chip's absolute mouse report addresses the target screen through a
//! fixed `0..=4095` grid on each axis, whatever the real resolution is.
//! [`to_device_space`] scales a pixel position into that grid.

use thiserror::Error;

use crate::protocol::constants::ABSOLUTE_AXIS_MAX;

/// Errors from coordinate mapping.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum CoordinateError {
    /// Screen width or height is zero, so no scale factor exists.
    #[error("screen dimensions must be non-zero, got {width}x{height}")]
    ZeroDimension { width: u32, height: u32 },
}

/// Maps a screen pixel position into the chip's absolute coordinate space.
///
/// Each axis is scaled as `pos * 4095 / extent` in 64-bit arithmetic, then
/// clamped to 4095, so positions past the edge pin to the edge.
///
/// # Errors
///
/// Returns [`CoordinateError::ZeroDimension`] if `width` or `height` is zero.
///
/// # Examples
///
/// ```rust
/// use ch9329_core::domain::coords::to_device_space;
///
/// assert_eq!(to_device_space(960, 540, 1920, 1080).unwrap(), (2047, 2047));
/// ```
pub fn to_device_space(
    screen_x: u32,
    screen_y: u32,
    width: u32,
    height: u32,
) -> Result<(u16, u16), CoordinateError> {
    if width == 0 || height == 0 {
        return Err(CoordinateError::ZeroDimension { width, height });
    }
    Ok((scale_axis(screen_x, width), scale_axis(screen_y, height)))
}

fn scale_axis(pos: u32, extent: u32) -> u16 {
    let scaled = u64::from(pos) * u64::from(ABSOLUTE_AXIS_MAX) / u64::from(extent);
    scaled.min(u64::from(ABSOLUTE_AXIS_MAX)) as u16
}
