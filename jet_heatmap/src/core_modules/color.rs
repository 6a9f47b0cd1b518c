// THEORY:
// The `color` module is the leaf of the whole library: a stateless mapping from a
// scalar measurement to a color on the classic "jet" palette
// (dark blue -> blue -> cyan -> green -> yellow -> red -> dark red).
//
// Key architectural principles:
// 1.  **No lookup table**: The palette is three tent functions over a value that has
//     been rescaled onto [-1, 1]. Each channel peaks at one point of the domain
//     (blue at -0.5, green at 0, red at +0.5) and is clipped to the unit interval,
//     which gives the five linear segments of jet.
// 2.  **Saturating input**: Values outside the configured range are pinned to the
//     nearest end of the range before rescaling. Conversion never fails.
// 3.  **Two representations**: A `Color` keeps three normalized channels for math.
//     The packed `u32` form is what crosses the C boundary and what spreadsheet
//     callers store as a cell color.
//
// Packing order: red occupies the least-significant byte, then green, then blue,
// and the top byte is zero (`0x00BBGGRR`). This is the `RGB()` color-value layout
// spreadsheet hosts use, so a returned value can be assigned to a cell directly.

pub mod color {
    use crate::error::{HeatmapError, Result};

    pub type Channel = f32;
    pub type Scalar = f32;
    pub type Byte = u8;
    pub type PackedColor = u32;

    const BYTE_SCALE: Channel = 255.0;

    /// A color with three channels normalized to [0.0, 1.0].
    #[derive(Debug, Clone, Copy, PartialEq, Default)]
    pub struct Color {
        pub red: Channel,
        pub green: Channel,
        pub blue: Channel,
    }

    impl Color {
        pub const BLACK: Color = Color {
            red: 0.0,
            green: 0.0,
            blue: 0.0,
        };

        pub fn new(red: Channel, green: Channel, blue: Channel) -> Self {
            Self { red, green, blue }
        }

        /// Channels scaled to 0..=255 and rounded, in (red, green, blue) order.
        /// NaN channels become 0.
        pub fn to_bytes(&self) -> [Byte; 3] {
            [
                Self::channel_to_byte(self.red),
                Self::channel_to_byte(self.green),
                Self::channel_to_byte(self.blue),
            ]
        }

        pub fn from_bytes(bytes: [Byte; 3]) -> Self {
            Self {
                red: bytes[0] as Channel / BYTE_SCALE,
                green: bytes[1] as Channel / BYTE_SCALE,
                blue: bytes[2] as Channel / BYTE_SCALE,
            }
        }

        /// Packs the color as `0x00BBGGRR`.
        pub fn encode(&self) -> PackedColor {
            let [red, green, blue] = self.to_bytes();
            (blue as PackedColor) << 16 | (green as PackedColor) << 8 | red as PackedColor
        }

        /// Inverse of [`Color::encode`]. The top byte is ignored.
        pub fn decode(packed: PackedColor) -> Self {
            Self::from_bytes(unpack(packed))
        }

        #[inline]
        fn channel_to_byte(channel: Channel) -> Byte {
            // `as` saturates and maps NaN to 0.
            (clamp(channel) * BYTE_SCALE).round() as Byte
        }
    }

    /// Splits a packed color into (red, green, blue) bytes.
    pub fn unpack(packed: PackedColor) -> [Byte; 3] {
        [
            (packed & 0xFF) as Byte,
            ((packed >> 8) & 0xFF) as Byte,
            ((packed >> 16) & 0xFF) as Byte,
        ]
    }

    /// Clips a channel to [0, 1]. NaN collapses to 0 through `max`.
    #[inline]
    pub fn clamp(value: Channel) -> Channel {
        value.max(0.0).min(1.0)
    }

    /// Maps `value` on the `[vmin, vmax]` range to the jet palette.
    ///
    /// - Out-of-range values saturate to the nearest end.
    /// - `vmin` maps to dark blue `(0, 0, 0.5)`, the midpoint to green
    ///   `(0.5, 1, 0.5)` and `vmax` to dark red `(0.5, 0, 0)`.
    /// - A degenerate range (`vmax == vmin`) divides zero by zero; every channel
    ///   clamps to 0 and the result is black. Use [`ValueRange::new`] to reject
    ///   such ranges up front.
    pub fn convert(value: Scalar, vmin: Scalar, vmax: Scalar) -> Color {
        let mut value = value;
        if value > vmax {
            value = vmax;
        }
        if value < vmin {
            value = vmin;
        }

        // Jet is defined on [-1, 1].
        let t = (2.0 * (value - vmin)) / (vmax - vmin) - 1.0;

        Color {
            red: clamp(1.5 - (2.0 * t - 1.0).abs()),
            green: clamp(1.5 - (2.0 * t).abs()),
            blue: clamp(1.5 - (2.0 * t + 1.0).abs()),
        }
    }

    /// Stateless lookup: [`convert`] followed by [`Color::encode`].
    pub fn convert_single(value: Scalar, vmin: Scalar, vmax: Scalar) -> PackedColor {
        convert(value, vmin, vmax).encode()
    }

    /// A validated normalization range with `min < max`, both finite.
    #[derive(Debug, Clone, Copy, PartialEq)]
    pub struct ValueRange {
        min: Scalar,
        max: Scalar,
    }

    impl ValueRange {
        pub fn new(min: Scalar, max: Scalar) -> Result<Self> {
            if !min.is_finite() || !max.is_finite() || max <= min {
                return Err(HeatmapError::InvalidRange { min, max });
            }
            Ok(Self { min, max })
        }

        pub fn min(&self) -> Scalar {
            self.min
        }

        pub fn max(&self) -> Scalar {
            self.max
        }

        pub fn convert(&self, value: Scalar) -> Color {
            convert(value, self.min, self.max)
        }
    }

    /// Checked conversion: fails on a range `ValueRange::new` would reject.
    pub fn try_convert(value: Scalar, vmin: Scalar, vmax: Scalar) -> Result<Color> {
        Ok(ValueRange::new(vmin, vmax)?.convert(value))
    }
}

#[cfg(test)]
mod tests {
    use super::color::*;
    use crate::error::HeatmapError;

    const EPSILON: f32 = 1e-6;

    fn assert_color(actual: Color, red: f32, green: f32, blue: f32) {
        assert!(
            (actual.red - red).abs() < EPSILON
                && (actual.green - green).abs() < EPSILON
                && (actual.blue - blue).abs() < EPSILON,
            "expected ({red}, {green}, {blue}), got {actual:?}"
        );
    }

    #[test]
    fn range_ends_are_blue_and_red() {
        assert_color(convert(10.0, 10.0, 20.0), 0.0, 0.0, 0.5);
        assert_color(convert(20.0, 10.0, 20.0), 0.5, 0.0, 0.0);
    }

    #[test]
    fn midpoint_is_green_dominant() {
        let mid = convert(15.0, 10.0, 20.0);
        assert_color(mid, 0.5, 1.0, 0.5);
        assert!(mid.green > mid.red && mid.green > mid.blue);
    }

    #[test]
    fn quarter_points_are_cyan_and_yellow() {
        assert_color(convert(0.25, 0.0, 1.0), 0.0, 0.5, 1.0);
        assert_color(convert(0.75, 0.0, 1.0), 1.0, 0.5, 0.0);
    }

    #[test]
    fn channels_stay_in_unit_interval() {
        for step in 0..=1000 {
            let value = -3.0 + step as f32 * 0.006;
            let c = convert(value, -3.0, 3.0);
            for channel in [c.red, c.green, c.blue] {
                assert!((0.0..=1.0).contains(&channel), "{value} -> {c:?}");
            }
        }
    }

    #[test]
    fn out_of_range_values_saturate() {
        assert_eq!(convert(-100.0, 0.0, 1.0), convert(0.0, 0.0, 1.0));
        assert_eq!(convert(100.0, 0.0, 1.0), convert(1.0, 0.0, 1.0));
    }

    #[test]
    fn conversion_is_pure() {
        assert_eq!(convert(0.37, 0.0, 1.0), convert(0.37, 0.0, 1.0));
        assert_eq!(convert_single(0.37, 0.0, 1.0), convert_single(0.37, 0.0, 1.0));
    }

    #[test]
    fn degenerate_range_is_black() {
        assert_eq!(convert(5.0, 5.0, 5.0), Color::BLACK);
        assert!(matches!(
            try_convert(5.0, 5.0, 5.0),
            Err(HeatmapError::InvalidRange { .. })
        ));
        assert!(ValueRange::new(1.0, f32::INFINITY).is_err());
    }

    #[test]
    fn packing_puts_red_in_low_byte() {
        assert_eq!(Color::new(1.0, 0.0, 0.0).encode(), 0x0000_00FF);
        assert_eq!(Color::new(0.0, 1.0, 0.0).encode(), 0x0000_FF00);
        assert_eq!(Color::new(0.0, 0.0, 1.0).encode(), 0x00FF_0000);
        // 0.5 * 255 rounds up to 128.
        assert_eq!(convert_single(0.0, 0.0, 1.0), 0x0080_0000);
        assert_eq!(unpack(0x00AB_CDEF), [0xEF, 0xCD, 0xAB]);
    }

    #[test]
    fn decoded_channels_are_within_one_step() {
        for step in 0..=200 {
            let original = convert(step as f32, 0.0, 200.0);
            let decoded = Color::decode(original.encode());
            assert!((decoded.red - original.red).abs() <= 1.0 / 255.0);
            assert!((decoded.green - original.green).abs() <= 1.0 / 255.0);
            assert!((decoded.blue - original.blue).abs() <= 1.0 / 255.0);
        }
    }
}
