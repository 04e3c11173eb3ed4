use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use palette::{FromColor, Hsv, Srgb};
use serde::{Deserialize, Serialize};

/// Largest value a bulb accepts for `set_rgb`.
pub const MAX_RGB_VALUE: u32 = 0xFF_FFFF;

/// An 8-bit per channel color.
///
/// Yeelight transports colors as a single integer `0xRRGGBB`, both in
/// `set_rgb` params and in the `rgb` field of discovery replies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl Rgb {
    pub fn new(red: u8, green: u8, blue: u8) -> Self {
        Rgb { red, green, blue }
    }

    /// Packs the color into the integer form the bulb expects.
    pub fn to_packed(self) -> u32 {
        (u32::from(self.red) << 16) | (u32::from(self.green) << 8) | u32::from(self.blue)
    }

    /// Unpacks an integer color, ignoring any bits above the low 24.
    pub fn from_packed(value: u32) -> Self {
        Rgb {
            red: ((value >> 16) & 0xFF) as u8,
            green: ((value >> 8) & 0xFF) as u8,
            blue: (value & 0xFF) as u8,
        }
    }

    /// Converts a bulb hue (0..=359 degrees) and saturation (0..=100) to a fully bright color.
    pub fn from_hsv(hue: u32, sat: u32) -> Self {
        let saturation = sat.min(100) as f32 / 100.0;
        let hsv = Hsv::new((hue % 360) as f32, saturation, 1.0);
        let rgb_color = Srgb::from_color(hsv);
        let (r, g, b) = rgb_color.into_components();
        Rgb {
            red: (r * 255.0).round() as u8,
            green: (g * 255.0).round() as u8,
            blue: (b * 255.0).round() as u8,
        }
    }
}

impl From<(u8, u8, u8)> for Rgb {
    fn from(tuple: (u8, u8, u8)) -> Self {
        Rgb::new(tuple.0, tuple.1, tuple.2)
    }
}

impl From<Rgb> for (u8, u8, u8) {
    fn from(rgb: Rgb) -> Self {
        (rgb.red, rgb.green, rgb.blue)
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:06X}", self.to_packed())
    }
}

impl FromStr for Rgb {
    type Err = String;

    /// Accepts `#RRGGBB`, `0xRRGGBB`, or a color name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let hex = trimmed
            .strip_prefix('#')
            .or_else(|| trimmed.strip_prefix("0x"))
            .or_else(|| trimmed.strip_prefix("0X"));
        match hex {
            Some(digits) if digits.len() == 6 => u32::from_str_radix(digits, 16)
                .map(Rgb::from_packed)
                .map_err(|e| format!("Invalid hex color {:?}: {}", s, e)),
            Some(_) => Err(format!("Invalid hex color {:?}: expected 6 digits", s)),
            None => <NamedColor as ValueEnum>::from_str(trimmed, true).map(Rgb::from),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum NamedColor {
    Red,
    Green,
    Blue,
    White,
    Yellow,
    Orange,
    Purple,
    Cyan,
    Magenta,
    Pink,
    Teal,
    Lavender,
    Mint,
}

impl From<NamedColor> for Rgb {
    fn from(color: NamedColor) -> Self {
        match color {
            NamedColor::Red => Rgb::new(255, 0, 0),
            NamedColor::Green => Rgb::new(0, 255, 0),
            NamedColor::Blue => Rgb::new(0, 0, 255),
            NamedColor::White => Rgb::new(255, 255, 255),
            NamedColor::Yellow => Rgb::new(255, 255, 0),
            NamedColor::Orange => Rgb::new(255, 165, 0),
            NamedColor::Purple => Rgb::new(128, 0, 128),
            NamedColor::Cyan => Rgb::new(0, 255, 255),
            NamedColor::Magenta => Rgb::new(255, 0, 255),
            NamedColor::Pink => Rgb::new(255, 192, 203),
            NamedColor::Teal => Rgb::new(0, 128, 128),
            NamedColor::Lavender => Rgb::new(230, 230, 250),
            NamedColor::Mint => Rgb::new(189, 252, 201),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_packing() {
        let color = Rgb::new(0x12, 0x34, 0x56);
        assert_eq!(color.to_packed(), 0x123456);
        assert_eq!(Rgb::from_packed(0x123456), color);
        assert_eq!(Rgb::from_packed(MAX_RGB_VALUE), Rgb::new(255, 255, 255));
    }

    #[test]
    fn test_from_packed_ignores_high_bits() {
        assert_eq!(Rgb::from_packed(0x01FF_0000), Rgb::new(255, 0, 0));
    }

    #[test]
    fn test_from_hsv_primaries() {
        assert_eq!(Rgb::from_hsv(0, 100), Rgb::new(255, 0, 0));
        assert_eq!(Rgb::from_hsv(120, 100), Rgb::new(0, 255, 0));
        assert_eq!(Rgb::from_hsv(240, 100), Rgb::new(0, 0, 255));
    }

    #[test]
    fn test_from_hsv_unsaturated_is_white() {
        assert_eq!(Rgb::from_hsv(200, 0), Rgb::new(255, 255, 255));
    }

    #[test]
    fn test_parse() {
        assert_eq!("#FF8000".parse::<Rgb>().unwrap(), Rgb::new(255, 128, 0));
        assert_eq!("0x00ff00".parse::<Rgb>().unwrap(), Rgb::new(0, 255, 0));
        assert_eq!("teal".parse::<Rgb>().unwrap(), Rgb::new(0, 128, 128));
        assert!("#FFF".parse::<Rgb>().is_err());
        assert!("chartreuse".parse::<Rgb>().is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(Rgb::new(255, 0, 16).to_string(), "#FF0010");
    }
}
