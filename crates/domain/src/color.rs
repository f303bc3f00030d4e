//! Color model: conversions between the color encodings a routine author can
//! use and the encodings a light bridge accepts.
//!
//! All functions are pure. Chromaticity is expressed as CIE 1931 `[x, y]`,
//! color temperature as mirek (10⁶ / Kelvin), hue as `0..=65535` and
//! saturation as `0..=254`.
//!
//! RGB ↔ XYZ conversion uses the wide-gamut matrix of the target bridge rather
//! than the sRGB primaries, so the resulting xy points are what the bulbs
//! actually render.

use serde::{Deserialize, Serialize};

/// CIE 1931 chromaticity coordinates `[x, y]`.
pub type Xy = [f64; 2];

/// D65 white point, returned whenever a conversion would otherwise divide by zero.
pub const D65_WHITE: Xy = [0.3127, 0.3291];

/// A color as written in a routine definition.
///
/// Serialized externally tagged, so exactly one key is present:
/// `{"xy": [x, y]}`, `{"mirek": 370}` (alias `ct`), `{"hex": "#ff8800"}` or
/// `{"hs": {"hue": 8000, "saturation": 200}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorSpec {
    Xy(Xy),
    #[serde(alias = "ct")]
    Mirek(u16),
    Hex(String),
    Hs { hue: u16, saturation: u8 },
}

/// A color in one of the encodings the device bridge understands natively.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceColor {
    Xy(Xy),
    Mirek(u16),
    HueSaturation { hue: u16, saturation: u8 },
}

/// Result of [`preview`]: the chromaticity (if any) and an approximate sRGB hex.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorPreview {
    pub xy: Option<Xy>,
    pub hex: String,
}

const BLACK_HEX: &str = "#000000";

/// Linear interpolation between `a` and `b`.
#[must_use]
pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Round to the nearest `u8`, saturating at the type bounds.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn round_u8(value: f64) -> u8 {
    value.round().clamp(0.0, f64::from(u8::MAX)) as u8
}

/// Round to the nearest `u16`, saturating at the type bounds.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn round_u16(value: f64) -> u16 {
    value.round().clamp(0.0, f64::from(u16::MAX)) as u16
}

/// Convert a color temperature to xy with McCamy's piecewise-cubic
/// approximation. Both coordinates are clamped to `[0, 1]`.
#[must_use]
pub fn color_temperature_to_xy(mirek: u16) -> Xy {
    let kelvin = 1_000_000.0 / f64::from(mirek);
    let k2 = kelvin * kelvin;
    let k3 = k2 * kelvin;

    let x = if kelvin <= 4000.0 {
        -0.266_123_9e9 / k3 - 0.234_358_9e6 / k2 + 0.877_695_6e3 / kelvin + 0.179_910
    } else {
        -3.025_846_9e9 / k3 + 2.107_037_9e6 / k2 + 0.222_634_7e3 / kelvin + 0.240_390
    };

    let y = if kelvin <= 2222.0 {
        -1.106_381_4 * x.powi(3) - 1.348_110_2 * x * x + 2.185_558_3 * x - 0.202_196_8
    } else if kelvin <= 4000.0 {
        -0.954_947_6 * x.powi(3) - 1.374_185_9 * x * x + 2.091_370_2 * x - 0.167_488_7
    } else {
        3.081_758 * x.powi(3) - 5.873_386_7 * x * x + 3.751_13 * x - 0.370_014_8
    };

    [x.clamp(0.0, 1.0), y.clamp(0.0, 1.0)]
}

/// Parse `#rrggbb` (the `#` is optional) into normalized `[r, g, b]` channels.
#[must_use]
pub fn hex_to_rgb(hex: &str) -> Option<[f64; 3]> {
    let digits = hex.strip_prefix('#').unwrap_or(hex);
    if digits.len() != 6 || !digits.is_ascii() {
        return None;
    }
    let channel = |range: std::ops::Range<usize>| {
        u8::from_str_radix(&digits[range], 16)
            .ok()
            .map(|v| f64::from(v) / 255.0)
    };
    Some([channel(0..2)?, channel(2..4)?, channel(4..6)?])
}

fn srgb_to_linear(c: f64) -> f64 {
    if c <= 0.040_45 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

fn linear_to_srgb(c: f64) -> f64 {
    if c <= 0.003_130_8 {
        12.92 * c
    } else {
        1.055 * c.powf(1.0 / 2.4) - 0.055
    }
}

/// Convert gamma-encoded sRGB channels (`0.0..=1.0`) to xy using the bridge's
/// wide-gamut matrix. Pure black maps to [`D65_WHITE`].
#[must_use]
pub fn rgb_to_xy(r: f64, g: f64, b: f64) -> Xy {
    let (r, g, b) = (srgb_to_linear(r), srgb_to_linear(g), srgb_to_linear(b));

    let x = r * 0.664_511 + g * 0.154_324 + b * 0.162_028;
    let y = r * 0.283_881 + g * 0.668_433 + b * 0.047_685;
    let z = r * 0.000_088 + g * 0.072_310 + b * 0.986_039;

    let sum = x + y + z;
    if sum == 0.0 {
        return D65_WHITE;
    }
    [x / sum, y / sum]
}

/// Convert bridge hue (`0..=65535`) and saturation (`0..=254`) to xy, with the
/// HSV value fixed at 1.0.
#[must_use]
pub fn hs_to_xy(hue: u16, saturation: u8) -> Xy {
    let h = f64::from(hue) / 65535.0 * 360.0;
    let s = f64::from(saturation) / 254.0;
    let v = 1.0;

    let c = v * s;
    let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
    let m = v - c;

    let (r, g, b) = if h < 60.0 {
        (c, x, 0.0)
    } else if h < 120.0 {
        (x, c, 0.0)
    } else if h < 180.0 {
        (0.0, c, x)
    } else if h < 240.0 {
        (0.0, x, c)
    } else if h < 300.0 {
        (x, 0.0, c)
    } else {
        (c, 0.0, x)
    };

    rgb_to_xy(r + m, g + m, b + m)
}

/// Convert any color spec to xy. Returns `None` for an absent spec or a hex
/// string that does not parse.
#[must_use]
pub fn color_to_xy(spec: Option<&ColorSpec>) -> Option<Xy> {
    match spec? {
        ColorSpec::Xy(xy) => Some(*xy),
        ColorSpec::Mirek(mirek) => Some(color_temperature_to_xy(*mirek)),
        ColorSpec::Hex(hex) => hex_to_rgb(hex).map(|[r, g, b]| rgb_to_xy(r, g, b)),
        ColorSpec::Hs { hue, saturation } => Some(hs_to_xy(*hue, *saturation)),
    }
}

/// Map a color spec onto the fields a bridge command carries.
///
/// xy, mirek and hue/saturation pass through; hex is converted to xy.
#[must_use]
pub fn resolve_device_color(spec: Option<&ColorSpec>) -> Option<DeviceColor> {
    match spec? {
        ColorSpec::Xy(xy) => Some(DeviceColor::Xy(*xy)),
        ColorSpec::Mirek(mirek) => Some(DeviceColor::Mirek(*mirek)),
        ColorSpec::Hs { hue, saturation } => Some(DeviceColor::HueSaturation {
            hue: *hue,
            saturation: *saturation,
        }),
        ColorSpec::Hex(hex) => {
            hex_to_rgb(hex).map(|[r, g, b]| DeviceColor::Xy(rgb_to_xy(r, g, b)))
        }
    }
}

/// Interpolate between two colors at `t ∈ [0, 1]`.
///
/// Two color temperatures stay in mirek space; two xy points interpolate per
/// coordinate; anything else is converted to xy first. When either side
/// cannot be converted the result snaps to `a` below `t = 0.5` and to `b`
/// from there on.
#[must_use]
pub fn interpolate_color(a: Option<&ColorSpec>, b: Option<&ColorSpec>, t: f64) -> Option<DeviceColor> {
    match (a, b) {
        (Some(ColorSpec::Mirek(from)), Some(ColorSpec::Mirek(to))) => Some(DeviceColor::Mirek(
            round_u16(lerp(f64::from(*from), f64::from(*to), t)),
        )),
        (Some(ColorSpec::Xy(from)), Some(ColorSpec::Xy(to))) => Some(DeviceColor::Xy(lerp_xy(*from, *to, t))),
        _ => match (color_to_xy(a), color_to_xy(b)) {
            (Some(from), Some(to)) => Some(DeviceColor::Xy(lerp_xy(from, to, t))),
            _ if t < 0.5 => resolve_device_color(a),
            _ => resolve_device_color(b),
        },
    }
}

fn lerp_xy(from: Xy, to: Xy, t: f64) -> Xy {
    [lerp(from[0], to[0], t), lerp(from[1], to[1], t)]
}

/// Approximate the sRGB hex of an xy point at a bridge brightness
/// (`0..=254`), for UI display only.
///
/// `y ≤ 0` has no defined luminance and yields black, as does non-finite
/// input.
#[must_use]
pub fn xy_to_preview_hex(x: f64, y: f64, brightness: u8) -> String {
    if !x.is_finite() || !y.is_finite() || y <= 0.0 {
        return BLACK_HEX.to_string();
    }

    let z = 1.0 - x - y;
    let big_y = f64::from(brightness) / 254.0;
    let big_x = (big_y / y) * x;
    let big_z = (big_y / y) * z;

    let r = big_x * 1.656_492 - big_y * 0.354_851 - big_z * 0.255_038;
    let g = -big_x * 0.707_196 + big_y * 1.655_397 + big_z * 0.036_152;
    let b = big_x * 0.051_713 - big_y * 0.121_364 + big_z * 1.011_530;

    let encode = |c: f64| round_u8(linear_to_srgb(c).clamp(0.0, 1.0) * 255.0);
    format!("#{:02x}{:02x}{:02x}", encode(r), encode(g), encode(b))
}

/// Build the UI preview for a color spec. Brightness defaults to full (254).
#[must_use]
pub fn preview(spec: Option<&ColorSpec>, brightness: Option<u8>) -> ColorPreview {
    let xy = color_to_xy(spec);
    let hex = xy.map_or_else(
        || BLACK_HEX.to_string(),
        |[x, y]| xy_to_preview_hex(x, y, brightness.unwrap_or(254)),
    );
    ColorPreview { xy, hex }
}

/// Check a color spec for values the bridge would reject.
///
/// # Errors
///
/// Returns [`ValidationError::InvalidColor`](crate::error::ValidationError::InvalidColor)
/// for a malformed hex string, a zero mirek, or xy coordinates outside `[0, 1]`.
pub fn validate(spec: &ColorSpec) -> Result<(), crate::error::ValidationError> {
    use crate::error::ValidationError;

    match spec {
        ColorSpec::Xy([x, y]) if !(0.0..=1.0).contains(x) || !(0.0..=1.0).contains(y) => {
            Err(ValidationError::InvalidColor(format!("xy [{x}, {y}] outside [0, 1]")))
        }
        ColorSpec::Mirek(0) => Err(ValidationError::InvalidColor("mirek must be positive".to_string())),
        ColorSpec::Hex(hex) if hex_to_rgb(hex).is_none() => {
            Err(ValidationError::InvalidColor(format!("`{hex}` is not #rrggbb")))
        }
        _ => Ok(()),
    }
}
