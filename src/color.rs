use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// 8-bit RGB with a fractional alpha in `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f32,
}

impl Rgba {
    pub const fn new(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 1.0)
    }

    /// Builds a colour from panel components, clamping each into range
    /// (0-255 per channel, 0-100 for the alpha percentage).
    pub fn from_components(r: i32, g: i32, b: i32, alpha_percent: i32) -> Self {
        Self {
            r: r.clamp(0, 255) as u8,
            g: g.clamp(0, 255) as u8,
            b: b.clamp(0, 255) as u8,
            a: alpha_percent.clamp(0, 100) as f32 / 100.0,
        }
    }

    /// Alpha as a rounded percentage, the unit the property panel shows.
    pub fn alpha_percent(&self) -> u8 {
        (self.a.clamp(0.0, 1.0) * 100.0).round() as u8
    }

    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Straight-alpha bytes for raster output.
    pub fn to_rgba8(&self) -> [u8; 4] {
        [
            self.r,
            self.g,
            self.b,
            (self.a.clamp(0.0, 1.0) * 255.0).round() as u8,
        ]
    }

    fn parse_hex(s: &str) -> Option<Self> {
        let digits = s.strip_prefix('#')?;
        if digits.len() != 6 || !digits.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).ok();
        Some(Self::opaque(channel(0)?, channel(2)?, channel(4)?))
    }

    fn parse_functional(s: &str) -> Option<Self> {
        let body = s
            .strip_prefix("rgba(")
            .or_else(|| s.strip_prefix("rgb("))?
            .strip_suffix(')')?;
        let parts: Vec<&str> = body.split(',').map(str::trim).collect();
        if !(3..=4).contains(&parts.len()) {
            return None;
        }
        let channel = |p: &str| p.parse::<u32>().ok().map(|v| v.min(255) as u8);
        let a = match parts.get(3) {
            Some(p) => p.parse::<f32>().ok().filter(|a| a.is_finite())?,
            None => 1.0,
        };
        Some(Self::new(
            channel(parts[0])?,
            channel(parts[1])?,
            channel(parts[2])?,
            a.clamp(0.0, 1.0),
        ))
    }
}

impl Default for Rgba {
    fn default() -> Self {
        Self::new(255, 0, 0, 0.5)
    }
}

impl FromStr for Rgba {
    type Err = Error;

    /// Accepts `#rrggbb`, `rgb(r, g, b)` and `rgba(r, g, b, a)`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::parse_hex(s)
            .or_else(|| Self::parse_functional(s))
            .ok_or_else(|| Error::InvalidColor(s.to_string()))
    }
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_round_trips_exactly() {
        let c: Rgba = "#3366ff".parse().unwrap();
        assert_eq!((c.r, c.g, c.b), (51, 102, 255));
        assert_eq!(c.to_hex(), "#3366ff");
    }

    #[test]
    fn rgba_string_yields_alpha_percent() {
        let c: Rgba = "rgba(51,102,255,0.5)".parse().unwrap();
        assert_eq!((c.r, c.g, c.b), (51, 102, 255));
        assert_eq!(c.alpha_percent(), 50);
        assert_eq!(c.to_hex(), "#3366ff");
    }

    #[test]
    fn display_matches_css_syntax() {
        let c = Rgba::new(1, 2, 3, 0.25);
        assert_eq!(c.to_string(), "rgba(1, 2, 3, 0.25)");
        assert_eq!(c.to_string().parse::<Rgba>().unwrap(), c);
    }

    #[test]
    fn rgb_without_alpha_is_opaque() {
        let c: Rgba = "rgb(10, 20, 30)".parse().unwrap();
        assert_eq!(c, Rgba::opaque(10, 20, 30));
    }

    #[test]
    fn rejects_garbage() {
        assert!("#12".parse::<Rgba>().is_err());
        assert!("#zzzzzz".parse::<Rgba>().is_err());
        assert!("rgba(1,2)".parse::<Rgba>().is_err());
        assert!("blue".parse::<Rgba>().is_err());
    }

    #[test]
    fn components_are_clamped() {
        let c = Rgba::from_components(300, -4, 128, 150);
        assert_eq!((c.r, c.g, c.b), (255, 0, 128));
        assert_eq!(c.alpha_percent(), 100);
    }
}
