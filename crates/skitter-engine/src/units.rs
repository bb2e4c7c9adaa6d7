//! Pixel/meter unit conversion.
//!
//! Physics runs in meters, rendering in pixels, with a fixed scale of
//! [`PIXELS_PER_METER`] between them. Every crossing of the physics/render
//! boundary goes through these two functions so the scale lives in exactly
//! one place.

/// Fixed render scale: how many screen pixels one physics meter spans.
pub const PIXELS_PER_METER: f32 = 100.0;

/// Convert screen pixels to physics meters.
///
/// ```
/// use skitter_engine::units::pixel_to_meter;
/// assert_eq!(pixel_to_meter(250.0), 2.5);
/// ```
pub fn pixel_to_meter(pixels: f32) -> f32 {
    pixels / PIXELS_PER_METER
}

/// Convert physics meters to screen pixels.
///
/// ```
/// use skitter_engine::units::meter_to_pixel;
/// assert_eq!(meter_to_pixel(2.5), 250.0);
/// ```
pub fn meter_to_pixel(meters: f32) -> f32 {
    meters * PIXELS_PER_METER
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn known_values_convert_exactly() {
        assert_eq!(meter_to_pixel(1.0), 100.0);
        assert_eq!(meter_to_pixel(0.0), 0.0);
        assert_eq!(pixel_to_meter(100.0), 1.0);
        assert_eq!(pixel_to_meter(-50.0), -0.5);
    }

    #[test]
    fn round_trip_is_identity_within_tolerance() {
        for x in [-1234.5f32, -1.0, 0.0, 0.01, 7.25, 99999.0] {
            let back = pixel_to_meter(meter_to_pixel(x));
            assert!(
                (back - x).abs() <= x.abs() * f32::EPSILON * 4.0,
                "round trip drifted: {x} -> {back}"
            );
        }
    }

    proptest! {
        #[test]
        fn round_trip_holds_for_finite_values(px in -1.0e6f32..1.0e6f32) {
            let back = meter_to_pixel(pixel_to_meter(px));
            prop_assert!((back - px).abs() <= px.abs() * f32::EPSILON * 4.0);
        }
    }
}
