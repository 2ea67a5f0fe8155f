use std::fmt;
use std::str::FromStr;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// sRGB color parsed from a CSS-style hex string.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub const WHITE: Self = Self::rgb(1.0, 1.0, 1.0);
    pub const BLACK: Self = Self::rgb(0.0, 0.0, 0.0);

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Parses `#RRGGBB` or `#RGB`. The leading `#` is mandatory.
    pub fn from_hex(value: &str) -> Result<Self, ConfigError> {
        let malformed = || ConfigError::MalformedColor(value.to_string());
        let digits = value.strip_prefix('#').ok_or_else(malformed)?;
        if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(malformed());
        }
        let channel = |hex: &str| u8::from_str_radix(hex, 16).map_err(|_| malformed());
        let (r, g, b) = match digits.len() {
            6 => (
                channel(&digits[0..2])?,
                channel(&digits[2..4])?,
                channel(&digits[4..6])?,
            ),
            3 => {
                // #abc expands to #aabbcc
                let expand = |c: u8| c * 17;
                (
                    expand(channel(&digits[0..1])?),
                    expand(channel(&digits[1..2])?),
                    expand(channel(&digits[2..3])?),
                )
            }
            _ => return Err(malformed()),
        };
        Ok(Self::from_rgb8(r, g, b))
    }

    pub fn from_rgb8(r: u8, g: u8, b: u8) -> Self {
        Self::rgb(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0)
    }

    pub fn to_rgb8(self) -> [u8; 3] {
        let quantize = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        [quantize(self.r), quantize(self.g), quantize(self.b)]
    }

    pub fn to_vec3(self) -> Vec3 {
        Vec3::new(self.r, self.g, self.b)
    }

    /// Converts the sRGB components to linear light for shading.
    pub fn to_linear(self) -> Vec3 {
        fn decode(c: f32) -> f32 {
            if c <= 0.04045 {
                c / 12.92
            } else {
                ((c + 0.055) / 1.055).powf(2.4)
            }
        }
        Vec3::new(decode(self.r), decode(self.g), decode(self.b))
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

impl FromStr for Color {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [r, g, b] = self.to_rgb8();
        write!(f, "#{r:02X}{g:02X}{b:02X}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_long_and_short_forms() {
        assert_eq!(Color::from_hex("#FFFFFF").unwrap(), Color::WHITE);
        assert_eq!(Color::from_hex("#fff").unwrap(), Color::WHITE);
        let red = Color::from_hex("#B01D11").unwrap();
        assert_eq!(red.to_rgb8(), [0xB0, 0x1D, 0x11]);
        assert_eq!(red.to_string(), "#B01D11");
    }

    #[test]
    fn missing_hash_is_rejected() {
        assert_eq!(
            Color::from_hex("B01D11"),
            Err(ConfigError::MalformedColor("B01D11".to_string()))
        );
    }

    #[test]
    fn rejects_bad_lengths_and_digits() {
        assert!(Color::from_hex("#12345").is_err());
        assert!(Color::from_hex("#GG0000").is_err());
        assert!(Color::from_hex("#").is_err());
        assert!("#+1+1+1".parse::<Color>().is_err());
    }

    #[test]
    fn linear_conversion_keeps_endpoints() {
        assert_eq!(Color::BLACK.to_linear(), Vec3::ZERO);
        let white = Color::WHITE.to_linear();
        assert!((white - Vec3::ONE).abs().max_element() < 1e-6);
        let grey = Color::from_rgb8(128, 128, 128).to_linear();
        assert!(grey.x > 0.2 && grey.x < 0.22);
    }
}
