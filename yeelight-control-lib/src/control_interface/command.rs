use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use clap::ValueEnum;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{json, Value};

use crate::error::{Error, Result};
use crate::led::flow::FlowAction;

/// Transition used when the caller does not pick one.
pub const DEFAULT_TRANSITION_DURATION: Duration = Duration::from_millis(200);

/// Transition used by [`crate::control_interface::ControlInterface::turn_on`] and `turn_off`.
pub const POWER_TRANSITION_DURATION: Duration = Duration::from_millis(1000);

/// Every method the bulb understands, each with its fixed protocol id.
///
/// The id is constant per method rather than per request, so it cannot be used to
/// match replies on a shared connection. Each request therefore gets its own connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    GetProp,
    SetCtAbx,
    SetRgb,
    SetHsv,
    SetBright,
    SetPower,
    Toggle,
    SetDefault,
    StartCf,
    StopCf,
    SetScene,
    CronAdd,
    CronGet,
    CronDel,
    SetAdjust,
    SetName,
}

impl Method {
    pub fn id(&self) -> u32 {
        match self {
            Method::GetProp => 1,
            Method::SetCtAbx => 2,
            Method::SetRgb => 3,
            Method::SetHsv => 4,
            Method::SetBright => 5,
            Method::SetPower => 6,
            Method::Toggle => 7,
            Method::SetDefault => 8,
            Method::StartCf => 9,
            Method::StopCf => 10,
            Method::SetScene => 11,
            Method::CronAdd => 12,
            Method::CronGet => 13,
            Method::CronDel => 14,
            Method::SetAdjust => 15,
            Method::SetName => 16,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Method::GetProp => "get_prop",
            Method::SetCtAbx => "set_ct_abx",
            Method::SetRgb => "set_rgb",
            Method::SetHsv => "set_hsv",
            Method::SetBright => "set_bright",
            Method::SetPower => "set_power",
            Method::Toggle => "toggle",
            Method::SetDefault => "set_default",
            Method::StartCf => "start_cf",
            Method::StopCf => "stop_cf",
            Method::SetScene => "set_scene",
            Method::CronAdd => "cron_add",
            Method::CronGet => "cron_get",
            Method::CronDel => "cron_del",
            Method::SetAdjust => "set_adjust",
            Method::SetName => "set_name",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl Serialize for Method {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

/// How a state change is applied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Effect {
    #[default]
    Smooth,
    Sudden,
}

/// The `effect, duration` pair appended to state changing commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub effect: Effect,
    pub duration: Duration,
}

impl Transition {
    pub fn new(effect: Effect, duration: Duration) -> Self {
        Transition { effect, duration }
    }

    pub fn smooth(duration: Duration) -> Self {
        Transition::new(Effect::Smooth, duration)
    }

    /// The bulb ignores the duration of a sudden change, but still expects one.
    pub fn sudden() -> Self {
        Transition::new(Effect::Sudden, DEFAULT_TRANSITION_DURATION)
    }

    fn append_to(&self, mut params: Vec<Value>) -> Vec<Value> {
        params.push(json!(self.effect));
        params.push(json!(self.duration.as_millis() as u64));
        params
    }
}

impl Default for Transition {
    fn default() -> Self {
        Transition::smooth(DEFAULT_TRANSITION_DURATION)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Power {
    #[default]
    On,
    Off,
}

impl FromStr for Power {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "on" => Ok(Power::On),
            "off" => Ok(Power::Off),
            other => Err(format!("Invalid power state: {}", other)),
        }
    }
}

impl fmt::Display for Power {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let power_str = match self {
            Power::On => "on",
            Power::Off => "off",
        };
        write!(f, "{}", power_str)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AdjustAction {
    Increase,
    Decrease,
    /// Wraps around to the minimum once the maximum is reached.
    Circle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AdjustProp {
    Bright,
    Ct,
    /// Only `circle` is accepted for color.
    Color,
}

/// The kind of state `set_scene` jumps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SceneClass {
    Color,
    Hsv,
    Ct,
    Cf,
    AutoDelayOff,
}

/// Timer kinds accepted by the cron commands. Bulbs only implement power-off timers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CronType {
    #[default]
    PowerOff,
}

impl Serialize for CronType {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            CronType::PowerOff => serializer.serialize_u8(0),
        }
    }
}

/// A single request: `{"id": .., "method": .., "params": [..]}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Command {
    pub id: u32,
    pub method: Method,
    pub params: Vec<Value>,
}

impl Command {
    pub fn new(method: Method, params: Vec<Value>) -> Self {
        Command {
            id: method.id(),
            method,
            params,
        }
    }

    /// Serializes the command into one CRLF terminated line.
    pub fn to_line(&self) -> Result<String> {
        let mut line = serde_json::to_string(self).map_err(Error::Encode)?;
        line.push_str("\r\n");
        Ok(line)
    }

    pub fn get_prop(props: &[&str]) -> Self {
        Command::new(Method::GetProp, props.iter().map(|p| json!(p)).collect())
    }

    pub fn set_ct_abx(ct_value: u32, transition: Transition) -> Self {
        Command::new(Method::SetCtAbx, transition.append_to(vec![json!(ct_value)]))
    }

    pub fn set_rgb(rgb_value: u32, transition: Transition) -> Self {
        Command::new(Method::SetRgb, transition.append_to(vec![json!(rgb_value)]))
    }

    pub fn set_hsv(hue: u32, sat: u32, transition: Transition) -> Self {
        Command::new(
            Method::SetHsv,
            transition.append_to(vec![json!(hue), json!(sat)]),
        )
    }

    pub fn set_bright(brightness: u32, transition: Transition) -> Self {
        Command::new(Method::SetBright, transition.append_to(vec![json!(brightness)]))
    }

    pub fn set_power(power: Power, transition: Transition) -> Self {
        Command::new(Method::SetPower, transition.append_to(vec![json!(power)]))
    }

    pub fn toggle() -> Self {
        Command::new(Method::Toggle, vec![])
    }

    pub fn set_default() -> Self {
        Command::new(Method::SetDefault, vec![])
    }

    /// `count` is the number of steps to run, 0 meaning forever.
    pub fn start_cf(count: u32, action: FlowAction, flow_expression: &str) -> Self {
        Command::new(
            Method::StartCf,
            vec![json!(count), json!(action), json!(flow_expression)],
        )
    }

    pub fn stop_cf() -> Self {
        Command::new(Method::StopCf, vec![])
    }

    pub fn set_scene(class: SceneClass, val1: Value, val2: Value) -> Self {
        Command::new(Method::SetScene, vec![json!(class), val1, val2])
    }

    pub fn cron_add(cron_type: CronType, minutes: u32) -> Self {
        Command::new(Method::CronAdd, vec![json!(cron_type), json!(minutes)])
    }

    pub fn cron_get(cron_type: CronType) -> Self {
        Command::new(Method::CronGet, vec![json!(cron_type)])
    }

    pub fn cron_del(cron_type: CronType) -> Self {
        Command::new(Method::CronDel, vec![json!(cron_type)])
    }

    pub fn set_adjust(action: AdjustAction, prop: AdjustProp) -> Self {
        Command::new(Method::SetAdjust, vec![json!(action), json!(prop)])
    }

    pub fn set_name(name: &str) -> Self {
        Command::new(Method::SetName, vec![json!(name)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_ids_and_names() {
        let table = [
            (Method::GetProp, 1, "get_prop"),
            (Method::SetCtAbx, 2, "set_ct_abx"),
            (Method::SetRgb, 3, "set_rgb"),
            (Method::SetHsv, 4, "set_hsv"),
            (Method::SetBright, 5, "set_bright"),
            (Method::SetPower, 6, "set_power"),
            (Method::Toggle, 7, "toggle"),
            (Method::SetDefault, 8, "set_default"),
            (Method::StartCf, 9, "start_cf"),
            (Method::StopCf, 10, "stop_cf"),
            (Method::SetScene, 11, "set_scene"),
            (Method::CronAdd, 12, "cron_add"),
            (Method::CronGet, 13, "cron_get"),
            (Method::CronDel, 14, "cron_del"),
            (Method::SetAdjust, 15, "set_adjust"),
            (Method::SetName, 16, "set_name"),
        ];
        for (method, id, name) in table {
            assert_eq!(method.id(), id);
            assert_eq!(method.name(), name);
        }
    }

    #[test]
    fn test_wire_line() {
        let line = Command::set_bright(50, Transition::default()).to_line().unwrap();
        assert_eq!(
            line,
            "{\"id\":5,\"method\":\"set_bright\",\"params\":[50,\"smooth\",200]}\r\n"
        );
    }

    #[test]
    fn test_default_transition_params() {
        let command = Command::set_bright(50, Transition::default());
        assert_eq!(command.params, vec![json!(50), json!("smooth"), json!(200)]);

        let command = Command::set_hsv(120, 80, Transition::default());
        assert_eq!(
            command.params,
            vec![json!(120), json!(80), json!("smooth"), json!(200)]
        );
    }

    #[test]
    fn test_explicit_transition_params() {
        let command = Command::set_power(
            Power::Off,
            Transition::smooth(POWER_TRANSITION_DURATION),
        );
        assert_eq!(command.id, 6);
        assert_eq!(command.params, vec![json!("off"), json!("smooth"), json!(1000)]);

        let command = Command::set_ct_abx(2700, Transition::sudden());
        assert_eq!(command.params[1], json!("sudden"));
    }

    #[test]
    fn test_start_cf_uses_its_own_method_name() {
        let command = Command::start_cf(4, FlowAction::Stay, "1000,1,255,100");
        assert_eq!(command.id, 9);
        assert_eq!(command.method.name(), "start_cf");
        assert_eq!(command.params, vec![json!(4), json!(1), json!("1000,1,255,100")]);
    }

    #[test]
    fn test_parameterless_commands() {
        for command in [Command::toggle(), Command::set_default(), Command::stop_cf()] {
            assert!(command.params.is_empty());
        }
    }

    #[test]
    fn test_scene_cron_adjust_name() {
        let scene = Command::set_scene(SceneClass::AutoDelayOff, json!(50), json!(5));
        assert_eq!(scene.params, vec![json!("auto_delay_off"), json!(50), json!(5)]);

        assert_eq!(
            Command::cron_add(CronType::PowerOff, 15).params,
            vec![json!(0), json!(15)]
        );
        assert_eq!(Command::cron_get(CronType::PowerOff).params, vec![json!(0)]);
        assert_eq!(Command::cron_del(CronType::PowerOff).id, 14);

        let adjust = Command::set_adjust(AdjustAction::Circle, AdjustProp::Color);
        assert_eq!(adjust.params, vec![json!("circle"), json!("color")]);

        assert_eq!(Command::set_name("desk").params, vec![json!("desk")]);
    }

    #[test]
    fn test_get_prop_keeps_order() {
        let command = Command::get_prop(&["power", "bright", "name"]);
        assert_eq!(
            command.params,
            vec![json!("power"), json!("bright"), json!("name")]
        );
    }

    #[test]
    fn test_power_parsing() {
        assert_eq!("on".parse::<Power>().unwrap(), Power::On);
        assert_eq!(" OFF ".parse::<Power>().unwrap(), Power::Off);
        assert!("dim".parse::<Power>().is_err());
        assert_eq!(Power::default(), Power::On);
    }
}
