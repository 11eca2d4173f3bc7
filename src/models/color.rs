//! RGB colors and the linear blend used by the budget progress indicator.

/// An opaque color with channels in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgb {
    /// Red channel.
    pub red: f64,
    /// Green channel.
    pub green: f64,
    /// Blue channel.
    pub blue: f64,
}

impl Rgb {
    /// System green, used while spending is comfortably within budget.
    pub const GREEN: Self = Self::new(52.0 / 255.0, 199.0 / 255.0, 89.0 / 255.0);
    /// System orange, used once half of the budget is gone.
    pub const ORANGE: Self = Self::new(1.0, 149.0 / 255.0, 0.0);
    /// System red, used when the limit is near or exceeded.
    pub const RED: Self = Self::new(1.0, 59.0 / 255.0, 48.0 / 255.0);

    /// Creates a color from raw channel values.
    #[inline]
    #[must_use]
    pub const fn new(red: f64, green: f64, blue: f64) -> Self {
        Self { red, green, blue }
    }

    /// Blends `self` towards `target` by `progress`.
    ///
    /// Each channel is interpolated linearly; `progress` is clamped to
    /// `[0, 1]` first, so values outside the band pin to an endpoint.
    /// NaN progress is treated as `0`.
    #[inline]
    #[must_use]
    pub fn interpolated(self, target: Self, progress: f64) -> Self {
        let factor = if progress.is_nan() {
            0.0
        } else {
            progress.clamp(0.0, 1.0)
        };
        Self {
            red: lerp(self.red, target.red, factor),
            green: lerp(self.green, target.green, factor),
            blue: lerp(self.blue, target.blue, factor),
        }
    }

    /// Returns the channels scaled to 8-bit values.
    #[inline]
    #[must_use]
    pub fn to_rgb8(self) -> (u8, u8, u8) {
        (
            channel_to_u8(self.red),
            channel_to_u8(self.green),
            channel_to_u8(self.blue),
        )
    }
}

/// Smooth color for a budget percentage.
///
/// Pure green up to 50%, green→orange across 50–75%, orange→red across
/// 75–100%, pure red from 100% on.
#[inline]
#[must_use]
pub fn progress_color(percentage: f64) -> Rgb {
    if percentage <= 50.0 {
        Rgb::GREEN
    } else if percentage <= 75.0 {
        Rgb::GREEN.interpolated(Rgb::ORANGE, (percentage - 50.0) / 25.0)
    } else if percentage < 100.0 {
        Rgb::ORANGE.interpolated(Rgb::RED, (percentage - 75.0) / 25.0)
    } else {
        Rgb::RED
    }
}

/// Linear interpolation between two channel values.
fn lerp(from: f64, to: f64, factor: f64) -> f64 {
    (to - from).mul_add(factor, from)
}

/// Converts a `[0, 1]` channel into `0..=255`.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::as_conversions,
    reason = "value is clamped to [0, 255] before the cast"
)]
fn channel_to_u8(channel: f64) -> u8 {
    let clamped = if channel.is_nan() {
        0.0
    } else {
        channel.clamp(0.0, 1.0)
    };
    (clamped * 255.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(left: Rgb, right: Rgb) {
        assert!((left.red - right.red).abs() < 1e-9, "{left:?} != {right:?}");
        assert!((left.green - right.green).abs() < 1e-9, "{left:?} != {right:?}");
        assert!((left.blue - right.blue).abs() < 1e-9, "{left:?} != {right:?}");
    }

    #[test]
    fn interpolated_endpoints() {
        assert_close(Rgb::GREEN.interpolated(Rgb::ORANGE, 0.0), Rgb::GREEN);
        assert_close(Rgb::GREEN.interpolated(Rgb::ORANGE, 1.0), Rgb::ORANGE);
    }

    #[test]
    fn interpolated_clamps_progress() {
        assert_close(Rgb::GREEN.interpolated(Rgb::RED, -3.0), Rgb::GREEN);
        assert_close(Rgb::GREEN.interpolated(Rgb::RED, 7.5), Rgb::RED);
        assert_close(Rgb::GREEN.interpolated(Rgb::RED, f64::NAN), Rgb::GREEN);
    }

    #[test]
    fn interpolated_midpoint_is_channel_average() {
        let mid = Rgb::new(0.0, 0.0, 0.0).interpolated(Rgb::new(1.0, 0.5, 0.2), 0.5);
        assert_close(mid, Rgb::new(0.5, 0.25, 0.1));
    }

    #[test]
    fn progress_color_bands() {
        assert_close(progress_color(0.0), Rgb::GREEN);
        assert_close(progress_color(50.0), Rgb::GREEN);
        assert_close(progress_color(75.0), Rgb::ORANGE);
        assert_close(progress_color(100.0), Rgb::RED);
        assert_close(progress_color(250.0), Rgb::RED);
    }

    #[test]
    fn progress_color_blends_within_caution_band() {
        let expected = Rgb::GREEN.interpolated(Rgb::ORANGE, 0.8);
        assert_close(progress_color(70.0), expected);
    }

    #[test]
    fn progress_color_blends_within_warning_band() {
        let expected = Rgb::ORANGE.interpolated(Rgb::RED, 0.2);
        assert_close(progress_color(80.0), expected);
    }

    #[test]
    fn rgb8_of_named_colors() {
        assert_eq!(Rgb::GREEN.to_rgb8(), (52, 199, 89));
        assert_eq!(Rgb::ORANGE.to_rgb8(), (255, 149, 0));
        assert_eq!(Rgb::RED.to_rgb8(), (255, 59, 48));
    }

    #[test]
    fn rgb8_clamps_out_of_range_channels() {
        assert_eq!(Rgb::new(-1.0, 2.0, f64::NAN).to_rgb8(), (0, 255, 0));
    }
}
