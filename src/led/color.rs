//! Color math for the pattern generators.

/// Colour as (R, G, B) tuple, each 0–255.
pub type Rgb = (u8, u8, u8);

pub const BLACK: Rgb = (0, 0, 0);

/// Unpack a packed 0xRRGGBB value (trait colors are stored packed).
pub const fn unpack(color: u32) -> Rgb {
    ((color >> 16) as u8, (color >> 8) as u8, color as u8)
}

/// Dim a color by an intensity (0–255). The +1 bias makes 255 an exact
/// identity instead of dimming full channels by one count.
pub fn scale(color: Rgb, intensity: u8) -> Rgb {
    let i = intensity as u16 + 1;
    (
        ((color.0 as u16 * i) >> 8) as u8,
        ((color.1 as u16 * i) >> 8) as u8,
        ((color.2 as u16 * i) >> 8) as u8,
    )
}

/// Per-channel maximum; used to overlay a spark on a resting glow.
pub fn max_channel(a: Rgb, b: Rgb) -> Rgb {
    (a.0.max(b.0), a.1.max(b.1), a.2.max(b.2))
}

/// RGB → HSV. Hue in degrees [0, 360), saturation and value in [0, 1].
pub fn rgb_to_hsv(color: Rgb) -> (f32, f32, f32) {
    let r = color.0 as f32 / 255.0;
    let g = color.1 as f32 / 255.0;
    let b = color.2 as f32 / 255.0;
    let cmax = r.max(g).max(b);
    let cmin = r.min(g).min(b);
    let delta = cmax - cmin;

    let mut h = if delta == 0.0 {
        0.0
    } else if cmax == r {
        60.0 * (((g - b) / delta) % 6.0)
    } else if cmax == g {
        60.0 * (((b - r) / delta) + 2.0)
    } else {
        60.0 * (((r - g) / delta) + 4.0)
    };
    if h < 0.0 {
        h += 360.0;
    }

    let s = if cmax == 0.0 { 0.0 } else { delta / cmax };
    (h, s, cmax)
}

/// HSV → RGB. Hue in degrees (wrapped), saturation and value in [0, 1].
pub fn hsv_to_rgb(h: f32, s: f32, v: f32) -> Rgb {
    let h = h.rem_euclid(360.0);
    let c = v * s;
    let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
    let m = v - c;

    let (r, g, b) = match h {
        h if h < 60.0 => (c, x, 0.0),
        h if h < 120.0 => (x, c, 0.0),
        h if h < 180.0 => (0.0, c, x),
        h if h < 240.0 => (0.0, x, c),
        h if h < 300.0 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };

    (
        ((r + m) * 255.0) as u8,
        ((g + m) * 255.0) as u8,
        ((b + m) * 255.0) as u8,
    )
}

/// Rotate a color's hue by `degrees`, keeping saturation and value.
pub fn shift_hue(color: Rgb, degrees: f32) -> Rgb {
    let (h, s, v) = rgb_to_hsv(color);
    hsv_to_rgb(h + degrees, s, v)
}

/// Fully-saturated hue wheel position, `t` in [0, 1).
pub fn wheel(t: f32) -> Rgb {
    hsv_to_rgb(t * 360.0, 1.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unpack_splits_channels() {
        assert_eq!(unpack(0xFF2800), (0xFF, 0x28, 0x00));
        assert_eq!(unpack(0x1400FF), (0x14, 0x00, 0xFF));
    }

    #[test]
    fn scale_full_is_identity_and_zero_is_black() {
        let c = (200, 100, 50);
        assert_eq!(scale(c, 0), (0, 0, 0));
        assert_eq!(scale(c, 255), c);
        assert_eq!(scale((255, 255, 255), 255), (255, 255, 255));
        let half = scale((255, 0, 0), 128);
        assert_eq!(half.0, 128);
    }

    #[test]
    fn hsv_roundtrip_primaries() {
        for c in [(255, 0, 0), (0, 255, 0), (0, 0, 255)] {
            let (h, s, v) = rgb_to_hsv(c);
            let back = hsv_to_rgb(h, s, v);
            assert_eq!(back, c);
        }
    }

    #[test]
    fn wheel_covers_the_spectrum() {
        assert_eq!(wheel(0.0), (255, 0, 0));
        let third = wheel(1.0 / 3.0);
        assert!(third.1 > 200 && third.0 < 20, "one third around is green: {third:?}");
        let two_thirds = wheel(2.0 / 3.0);
        assert!(two_thirds.2 > 200 && two_thirds.1 < 20, "two thirds is blue: {two_thirds:?}");
    }

    #[test]
    fn hue_shift_of_zero_is_near_identity() {
        let c = (0xFF, 0x28, 0x00);
        let shifted = shift_hue(c, 0.0);
        assert!((shifted.0 as i16 - c.0 as i16).abs() <= 2);
        assert!((shifted.1 as i16 - c.1 as i16).abs() <= 2);
        assert!((shifted.2 as i16 - c.2 as i16).abs() <= 2);
    }
}
