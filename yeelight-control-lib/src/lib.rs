//! # Yeelight Control Library
//!
//! `yeelight-control-lib` is a Rust library for controlling Yeelight smart bulbs on the
//! local network. Bulbs are found with a multicast search request and controlled with
//! JSON commands sent over short-lived TCP connections.
//!
//! ## Features
//!
//! - Device discovery on local networks
//! - One request per connection, each bounded by a short timeout
//! - Call builders for every bulb method (power, brightness, color, scenes, timers, color flows)
//! - Color helpers and a color flow expression builder
//!
//! ## Example
//!
//! Here is a simple example of how to use the library to discover bulbs and turn them on:
//!
//! ```no_run
//! use yeelight_control_lib::control_interface::ControlInterface;
//! use yeelight_control_lib::util::discovery::{Discovery, DEFAULT_DISCOVERY_WINDOW};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let devices = Discovery::find_devices(DEFAULT_DISCOVERY_WINDOW).await?;
//!
//!     for device in &devices {
//!         println!("Found device: {}", device);
//!         ControlInterface::from_device(device).turn_on().await?;
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Disclaimer
//!
//! This project is not affiliated with, authorized by, endorsed by, or in any way officially connected
//! with Yeelight or its affiliates.
//!
//! ## License
//!
//! This project is dual-licensed under the MIT License and the Apache License, Version 2.0.
//! You may choose to use either license, depending on your project needs.

// The `control_interface` module sends commands to a single bulb. It holds the
// request/response exchange and one convenience method per bulb command.
//
// Example usage:
//
// ```
// use yeelight_control_lib::control_interface::ControlInterface;
//
// #[tokio::main]
// async fn main() {
//     let control = ControlInterface::new("192.168.1.100", 55443);
//     control.set_bright(40).await.unwrap();
// }
// ```
pub mod control_interface;

pub mod error;

// The `led` module contains color helpers: packing RGB values the way bulbs expect
// them and building color flow expressions.
//
// Example usage:
//
// ```
// use yeelight_control_lib::led::flow::{FlowExpression, FlowStep};
// use yeelight_control_lib::led::led_color::Rgb;
// use std::time::Duration;
//
// let flow = FlowExpression::new()
//     .step(FlowStep::color(Duration::from_millis(500), Rgb::new(255, 0, 0), 100))
//     .step(FlowStep::sleep(Duration::from_millis(500)));
// ```
pub mod led;

// The `util` module provides the device record, discovery, and helpers for reading
// command replies.
//
// Example usage:
//
// ```
// use yeelight_control_lib::util::device::Device;
//
// let device = Device::new("0x123", "yeelight://10.0.0.5:55443", "desk").unwrap();
// assert_eq!(device.port(), 55443);
// ```
pub mod util;

pub use error::{Error, Result};
