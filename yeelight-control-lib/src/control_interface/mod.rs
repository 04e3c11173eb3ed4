use std::time::Duration;

use log::{debug, warn};
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::time::timeout;

use crate::error::{Error, Result};
use crate::led::flow::{FlowAction, FlowExpression};
use crate::led::led_color::Rgb;
use crate::util::device::Device;

pub mod command;

use command::{
    AdjustAction, AdjustProp, Command, CronType, Power, SceneClass, Transition,
    POWER_TRANSITION_DURATION,
};

/// Upper bound for a whole request: connect, send, and wait for the reply line.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_millis(500);

/// Sends commands to one bulb.
///
/// Every request opens its own TCP connection and closes it before returning,
/// whether it succeeded, failed, or timed out. Nothing is retried. Interfaces hold
/// no connection state, so requests to different bulbs can run concurrently.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlInterface {
    pub host: String,
    pub port: u16,
    timeout: Duration,
}

impl ControlInterface {
    pub fn new(host: &str, port: u16) -> Self {
        ControlInterface {
            host: host.to_string(),
            port,
            timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /**
    Creates a [ControlInterface] by a [Device].
     */
    pub fn from_device(device: &Device) -> Self {
        ControlInterface::new(device.host(), device.port())
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Performs one request/response exchange.
    ///
    /// The reply is returned as parsed JSON without interpretation, since its shape
    /// depends on the method; see [`crate::util::traits::CommandReply`].
    pub async fn request(&self, command: &Command) -> Result<Value> {
        let line = command.to_line()?;
        debug!(
            "Sending {} to {}:{}: {}",
            command.method,
            self.host,
            self.port,
            line.trim_end()
        );

        match timeout(self.timeout, self.exchange(&line)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    "Yeelight at {}:{} did not answer {} within {:?}",
                    self.host, self.port, command.method, self.timeout
                );
                Err(Error::Timeout(self.timeout))
            }
        }
    }

    async fn exchange(&self, line: &str) -> Result<Value> {
        let reply = {
            let stream = TcpStream::connect((self.host.as_str(), self.port)).await?;
            let mut reader = BufReader::new(stream);
            reader.get_mut().write_all(line.as_bytes()).await?;

            let mut reply = Vec::new();
            let number_of_bytes = reader.read_until(b'\n', &mut reply).await?;
            if number_of_bytes == 0 {
                return Err(Error::EmptyReply);
            }
            reply
        };

        // Invalid UTF-8 is rejected by the JSON parser as a malformed reply.
        let reply = reply.trim_ascii_end();
        debug!(
            "Reply from {}:{}: {}",
            self.host,
            self.port,
            String::from_utf8_lossy(reply)
        );
        serde_json::from_slice(reply).map_err(Error::MalformedReply)
    }

    /// Reads the named properties, e.g. `["power", "bright", "ct"]`.
    pub async fn get_prop(&self, props: &[&str]) -> Result<Value> {
        self.request(&Command::get_prop(props)).await
    }

    /// Changes the color temperature (1700..=6500 K).
    pub async fn set_ct_abx(&self, ct_value: u32) -> Result<Value> {
        self.set_ct_abx_with(ct_value, Transition::default()).await
    }

    pub async fn set_ct_abx_with(&self, ct_value: u32, transition: Transition) -> Result<Value> {
        self.request(&Command::set_ct_abx(ct_value, transition)).await
    }

    /// Changes the color. Expects an integer hex triplet such as `0xFFFFFF`.
    pub async fn set_rgb(&self, rgb_value: u32) -> Result<Value> {
        self.set_rgb_with(rgb_value, Transition::default()).await
    }

    pub async fn set_rgb_with(&self, rgb_value: u32, transition: Transition) -> Result<Value> {
        self.request(&Command::set_rgb(rgb_value, transition)).await
    }

    pub async fn set_color(&self, color: Rgb) -> Result<Value> {
        self.set_rgb(color.to_packed()).await
    }

    /// Changes hue (0..=359) and saturation (0..=100).
    pub async fn set_hsv(&self, hue: u32, sat: u32) -> Result<Value> {
        self.set_hsv_with(hue, sat, Transition::default()).await
    }

    pub async fn set_hsv_with(&self, hue: u32, sat: u32, transition: Transition) -> Result<Value> {
        self.request(&Command::set_hsv(hue, sat, transition)).await
    }

    /// Changes the brightness (1..=100).
    pub async fn set_bright(&self, brightness: u32) -> Result<Value> {
        self.set_bright_with(brightness, Transition::default()).await
    }

    pub async fn set_bright_with(&self, brightness: u32, transition: Transition) -> Result<Value> {
        self.request(&Command::set_bright(brightness, transition)).await
    }

    /// Software managed on/off.
    pub async fn set_power(&self, power: Power) -> Result<Value> {
        self.set_power_with(power, Transition::default()).await
    }

    pub async fn set_power_with(&self, power: Power, transition: Transition) -> Result<Value> {
        self.request(&Command::set_power(power, transition)).await
    }

    pub async fn turn_on(&self) -> Result<Value> {
        self.set_power_with(Power::On, Transition::smooth(POWER_TRANSITION_DURATION))
            .await
    }

    pub async fn turn_off(&self) -> Result<Value> {
        self.set_power_with(Power::Off, Transition::smooth(POWER_TRANSITION_DURATION))
            .await
    }

    pub async fn toggle(&self) -> Result<Value> {
        self.request(&Command::toggle()).await
    }

    /// Saves the current state as the one restored after a hard power cycle.
    pub async fn set_default(&self) -> Result<Value> {
        self.request(&Command::set_default()).await
    }

    /// Starts a color flow. `count` is the number of steps to run, 0 for endless.
    pub async fn start_cf(
        &self,
        count: u32,
        action: FlowAction,
        flow_expression: &str,
    ) -> Result<Value> {
        self.request(&Command::start_cf(count, action, flow_expression))
            .await
    }

    /// Runs every step of `flow` once.
    pub async fn start_flow(&self, flow: &FlowExpression, action: FlowAction) -> Result<Value> {
        let count = u32::try_from(flow.len()).unwrap_or(u32::MAX);
        self.start_cf(count, action, &flow.to_string())
            .await
    }

    pub async fn stop_cf(&self) -> Result<Value> {
        self.request(&Command::stop_cf()).await
    }

    /// Sets the bulb directly to a state, turning it on first if needed.
    pub async fn set_scene(&self, class: SceneClass, val1: Value, val2: Value) -> Result<Value> {
        self.request(&Command::set_scene(class, val1, val2)).await
    }

    /// Starts a timer that powers the bulb off after `minutes`.
    pub async fn cron_add(&self, cron_type: CronType, minutes: u32) -> Result<Value> {
        self.request(&Command::cron_add(cron_type, minutes)).await
    }

    pub async fn cron_get(&self, cron_type: CronType) -> Result<Value> {
        self.request(&Command::cron_get(cron_type)).await
    }

    pub async fn cron_del(&self, cron_type: CronType) -> Result<Value> {
        self.request(&Command::cron_del(cron_type)).await
    }

    /// Nudges brightness, color temperature or color without knowing the current value.
    pub async fn set_adjust(&self, action: AdjustAction, prop: AdjustProp) -> Result<Value> {
        self.request(&Command::set_adjust(action, prop)).await
    }

    /// Stores a name on the bulb; it is reported in discovery replies from then on.
    pub async fn set_name(&self, name: &str) -> Result<Value> {
        self.request(&Command::set_name(name)).await
    }
}
