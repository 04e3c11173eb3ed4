use std::collections::HashMap;
use std::fmt::{Display, Formatter};

use derivative::Derivative;
use lazy_static::lazy_static;
use log::debug;
use regex::Regex;
use serde::Serialize;

use crate::control_interface::command::Power;
use crate::error::{Error, Result};
use crate::led::led_color::Rgb;

/// Port bulbs listen on for commands.
pub const DEFAULT_PORT: u16 = 55443;

lazy_static! {
    static ref HOST_PATTERN: Regex = Regex::new(r"(?:\d+\.)+\d+").unwrap();
    static ref PORT_PATTERN: Regex = Regex::new(r"\d+$").unwrap();
}

/// Extracts host and port from a location such as `yeelight://192.168.1.23:55443`.
///
/// The host is the first dotted-decimal run, the port the trailing digits.
pub fn parse_location(location: &str) -> Result<(String, u16)> {
    let host = HOST_PATTERN
        .find(location)
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| Error::InvalidLocation(location.to_string()))?;
    let port = PORT_PATTERN
        .find(location.trim_end())
        .and_then(|m| m.as_str().parse::<u16>().ok())
        .ok_or_else(|| Error::InvalidLocation(location.to_string()))?;
    Ok((host, port))
}

/// A bulb and the state it last reported.
///
/// Only `id`, `host` and `port` identify the bulb. Everything else is a snapshot
/// taken at discovery or construction time and is never refreshed; query the bulb
/// with `get_prop` for its current state.
#[derive(Derivative)]
#[derivative(Hash, PartialEq, Eq)]
#[derive(Debug, Clone, Serialize)]
pub struct Device {
    id: String,
    host: String,
    port: u16,
    #[derivative(Hash = "ignore", PartialEq = "ignore")]
    pub location: String,
    #[derivative(Hash = "ignore", PartialEq = "ignore")]
    pub name: String,
    #[derivative(Hash = "ignore", PartialEq = "ignore")]
    pub power: Power,
    #[derivative(Hash = "ignore", PartialEq = "ignore")]
    pub bright: u32,
    #[derivative(Hash = "ignore", PartialEq = "ignore")]
    pub color_mode: u32,
    #[derivative(Hash = "ignore", PartialEq = "ignore")]
    pub ct: u32,
    #[derivative(Hash = "ignore", PartialEq = "ignore")]
    pub rgb: u32,
    #[derivative(Hash = "ignore", PartialEq = "ignore")]
    pub hue: u32,
    #[derivative(Hash = "ignore", PartialEq = "ignore")]
    pub sat: u32,
}

impl Device {
    /// Builds a device whose address is already known. State fields start at their
    /// defaults and can be filled with the `with_*` methods.
    pub fn new(id: &str, location: &str, name: &str) -> Result<Self> {
        let (host, port) = parse_location(location)?;
        Ok(Device {
            id: id.to_string(),
            host,
            port,
            location: location.to_string(),
            name: name.to_string(),
            power: Power::default(),
            bright: 0,
            color_mode: 0,
            ct: 0,
            rgb: 0,
            hue: 0,
            sat: 0,
        })
    }

    /**
    Builds a device from the normalized header fields of a discovery reply.

    `id` and `location` are required. Numeric fields that are absent or unparsable
    become 0, an unknown power state becomes [`Power::On`], and fields the device
    does not model are ignored.
     */
    pub fn from_fields(fields: &HashMap<String, String>) -> Result<Self> {
        let id = fields.get("id").ok_or(Error::MissingField("id"))?;
        let location = fields
            .get("location")
            .ok_or(Error::MissingField("location"))?;
        let name = fields.get("name").map(String::as_str).unwrap_or_default();

        let number = |key: &str| -> u32 {
            match fields.get(key) {
                Some(value) => value.parse().unwrap_or_else(|_| {
                    debug!("Ignoring non-numeric {} {:?} for device {}", key, value, id);
                    0
                }),
                None => 0,
            }
        };
        let power = match fields.get("power") {
            Some(value) => value.parse().unwrap_or_else(|e| {
                debug!("{} for device {}, assuming on", e, id);
                Power::On
            }),
            None => Power::default(),
        };

        Ok(Device::new(id, location, name)?
            .with_power(power)
            .with_bright(number("bright"))
            .with_color_mode(number("color_mode"))
            .with_ct(number("ct"))
            .with_rgb(number("rgb"))
            .with_hsv(number("hue"), number("sat")))
    }

    pub fn with_power(mut self, power: Power) -> Self {
        self.power = power;
        self
    }

    pub fn with_bright(mut self, bright: u32) -> Self {
        self.bright = bright;
        self
    }

    pub fn with_color_mode(mut self, color_mode: u32) -> Self {
        self.color_mode = color_mode;
        self
    }

    pub fn with_ct(mut self, ct: u32) -> Self {
        self.ct = ct;
        self
    }

    pub fn with_rgb(mut self, rgb: u32) -> Self {
        self.rgb = rgb;
        self
    }

    pub fn with_hsv(mut self, hue: u32, sat: u32) -> Self {
        self.hue = hue;
        self.sat = sat;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// The color implied by the snapshot: `rgb` in color mode 1, hue and saturation
    /// in mode 3. Color temperature mode (2) has no RGB equivalent.
    pub fn color(&self) -> Option<Rgb> {
        match self.color_mode {
            1 => Some(Rgb::from_packed(self.rgb)),
            3 => Some(Rgb::from_hsv(self.hue, self.sat)),
            _ => None,
        }
    }
}

impl Display for Device {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}) at {}:{}", self.name, self.id, self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_parse_location() {
        let (host, port) = parse_location("yeelight://192.168.1.23:55443").unwrap();
        assert_eq!(host, "192.168.1.23");
        assert_eq!(port, 55443);
    }

    #[test]
    fn test_parse_location_rejects_missing_parts() {
        assert!(matches!(
            parse_location("yeelight://bulb.local:55443"),
            Err(Error::InvalidLocation(_))
        ));
        assert!(matches!(
            parse_location("yeelight://192.168.1.23:"),
            Err(Error::InvalidLocation(_))
        ));
        assert!(parse_location("yeelight://192.168.1.23:99999").is_err());
    }

    #[test]
    fn test_new_derives_address() {
        let device = Device::new("0x123", "yeelight://10.0.0.5:55443", "desk").unwrap();
        assert_eq!(device.id(), "0x123");
        assert_eq!(device.host(), "10.0.0.5");
        assert_eq!(device.port(), 55443);
        assert_eq!(device.power, Power::On);
        assert_eq!(device.bright, 0);
    }

    #[test]
    fn test_from_fields() {
        let device = Device::from_fields(&fields(&[
            ("id", "0x000000000015243f"),
            ("location", "yeelight://192.168.1.239:55443"),
            ("name", "bedroom"),
            ("power", "off"),
            ("bright", "100"),
            ("color_mode", "2"),
            ("ct", "4000"),
            ("rgb", "16711680"),
            ("hue", "100"),
            ("sat", "35"),
            ("model", "color"),
            ("support", "get_prop set_default set_power toggle"),
        ]))
        .unwrap();

        assert_eq!(device.id(), "0x000000000015243f");
        assert_eq!(device.host(), "192.168.1.239");
        assert_eq!(device.name, "bedroom");
        assert_eq!(device.power, Power::Off);
        assert_eq!(device.bright, 100);
        assert_eq!(device.color_mode, 2);
        assert_eq!(device.ct, 4000);
        assert_eq!(device.rgb, 16711680);
        assert_eq!(device.hue, 100);
        assert_eq!(device.sat, 35);
    }

    #[test]
    fn test_from_fields_defaults() {
        let device = Device::from_fields(&fields(&[
            ("id", "0x1"),
            ("location", "yeelight://10.0.0.9:55443"),
            ("bright", "bright"),
            ("power", "unknown"),
        ]))
        .unwrap();
        assert_eq!(device.name, "");
        assert_eq!(device.bright, 0);
        assert_eq!(device.ct, 0);
        assert_eq!(device.power, Power::On);
    }

    #[test]
    fn test_from_fields_requires_id_and_location() {
        let missing_id = fields(&[("location", "yeelight://10.0.0.9:55443")]);
        assert!(matches!(
            Device::from_fields(&missing_id),
            Err(Error::MissingField("id"))
        ));
        let missing_location = fields(&[("id", "0x1")]);
        assert!(matches!(
            Device::from_fields(&missing_location),
            Err(Error::MissingField("location"))
        ));
    }

    #[test]
    fn test_equality_ignores_snapshot() {
        let a = Device::new("0x1", "yeelight://10.0.0.9:55443", "a").unwrap();
        let b = a.clone().with_bright(80).with_power(Power::Off);
        assert_eq!(a, b);
        let c = Device::new("0x2", "yeelight://10.0.0.9:55443", "a").unwrap();
        assert_ne!(a, c);
    }

    #[test]
    fn test_color_from_snapshot() {
        let device = Device::new("0x1", "yeelight://10.0.0.9:55443", "a").unwrap();
        let rgb_mode = device.clone().with_color_mode(1).with_rgb(0x00FF00);
        assert_eq!(rgb_mode.color(), Some(Rgb::new(0, 255, 0)));

        let hsv_mode = device.clone().with_color_mode(3).with_hsv(0, 100);
        assert_eq!(hsv_mode.color(), Some(Rgb::new(255, 0, 0)));

        assert_eq!(device.with_color_mode(2).color(), None);
    }
}
