use std::time::Duration;

use anyhow::{anyhow, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde_json::Value;

use yeelight_control_lib::control_interface::command::{
    AdjustAction, AdjustProp, CronType, Effect, Power, SceneClass, Transition,
};
use yeelight_control_lib::control_interface::ControlInterface;
use yeelight_control_lib::led::flow::{FlowAction, FlowExpression, FlowStep, KEEP_BRIGHTNESS};
use yeelight_control_lib::led::led_color::{NamedColor, Rgb};
use yeelight_control_lib::util::device::DEFAULT_PORT;
use yeelight_control_lib::util::discovery::Discovery;
use yeelight_control_lib::util::traits::CommandReply;

const DEFAULT_PROPS: &[&str] = &[
    "power",
    "bright",
    "color_mode",
    "ct",
    "rgb",
    "hue",
    "sat",
    "name",
];

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    handle_cli(cli).await
}

/// This struct defines the command line interface of the application
#[derive(Parser)]
#[clap(
    name = "yeelight_control",
    about = "Controls Yeelight smart bulbs on the local network",
    version = "0.1.0"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

/// Supported output formats for the `discover` command.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
pub enum OutputFormat {
    /// Plain text format.
    Plaintext,
    /// JSON format.
    Json,
    /// YAML format.
    Yaml,
}

/// Subcommands available for the CLI
#[derive(Subcommand)]
pub enum Commands {
    /// Sends a single command to a bulb
    #[clap(name = "device-call")]
    DeviceCall {
        /// Sets the IP address of the bulb
        #[clap(long)]
        ip: String,

        /// Sets the command port of the bulb
        #[clap(long, default_value_t = DEFAULT_PORT)]
        port: u16,

        /// Request timeout in milliseconds
        #[clap(short = 't', long = "timeout", default_value_t = 500)]
        timeout: u64,

        #[clap(subcommand)]
        action: DeviceAction,
    },
    /// Searches the local network for bulbs
    #[clap(name = "discover")]
    Discover {
        /// Output format (plaintext, json, yaml)
        #[clap(short, long, value_enum, default_value_t = OutputFormat::Plaintext)]
        output: OutputFormat,

        /// Search window in milliseconds
        #[clap(short = 't', long = "timeout", default_value_t = 500)]
        timeout: u64,
    },
}

/// How a state change is applied.
#[derive(Args)]
pub struct TransitionArgs {
    /// Transition effect
    #[clap(long, value_enum, default_value_t = Effect::Smooth)]
    effect: Effect,

    /// Transition duration in milliseconds
    #[clap(long, value_parser = parse_duration, default_value = "200")]
    duration: Duration,
}

impl From<TransitionArgs> for Transition {
    fn from(args: TransitionArgs) -> Self {
        Transition::new(args.effect, args.duration)
    }
}

fn parse_duration(s: &str) -> Result<Duration, &'static str> {
    let millis = s
        .parse::<u64>()
        .map_err(|_| "could not parse duration in milliseconds")?;
    Ok(Duration::from_millis(millis))
}

/// Scene values are sent as JSON when they parse as JSON, and as strings otherwise.
fn parse_scene_value(s: &str) -> Value {
    serde_json::from_str(s).unwrap_or_else(|_| Value::String(s.to_string()))
}

/// Actions available under the `device-call` subcommand
#[derive(Subcommand)]
pub enum DeviceAction {
    /// Reads properties (all common ones when none are given).
    #[clap(name = "get-prop")]
    GetProp {
        props: Vec<String>,
    },
    /// Sets the color temperature in Kelvin.
    #[clap(name = "set-ct")]
    SetCtAbx {
        ct: u32,
        #[clap(flatten)]
        transition: TransitionArgs,
    },
    /// Sets the color as `#RRGGBB`, `0xRRGGBB` or a color name.
    #[clap(name = "set-rgb")]
    SetRgb {
        color: Rgb,
        #[clap(flatten)]
        transition: TransitionArgs,
    },
    /// Sets hue (0-359) and saturation (0-100).
    #[clap(name = "set-hsv")]
    SetHsv {
        hue: u32,
        sat: u32,
        #[clap(flatten)]
        transition: TransitionArgs,
    },
    /// Sets the brightness (1-100).
    #[clap(name = "set-bright")]
    SetBright {
        brightness: u32,
        #[clap(flatten)]
        transition: TransitionArgs,
    },
    /// Switches the bulb on or off.
    #[clap(name = "set-power")]
    SetPower {
        #[clap(value_enum)]
        power: Power,
        #[clap(flatten)]
        transition: TransitionArgs,
    },
    /// Turns the bulb on.
    On,
    /// Turns the bulb off.
    Off,
    /// Toggles the bulb.
    Toggle,
    /// Saves the current state as the power-on default.
    #[clap(name = "set-default")]
    SetDefault,
    /// Starts a color flow from an expression or a list of colors.
    #[clap(name = "start-cf")]
    StartCf {
        /// Number of steps to run, 0 for endless
        #[clap(long, default_value_t = 0)]
        count: u32,

        /// What to do when the flow ends
        #[clap(long, value_enum, default_value_t = FlowAction::Recover)]
        action: FlowAction,

        /// Raw flow expression (`duration,mode,value,brightness,...`)
        #[clap(long, conflicts_with = "colors")]
        expression: Option<String>,

        /// Colors to cycle through
        #[clap(long, value_enum, use_value_delimiter = true)]
        colors: Vec<NamedColor>,

        /// Duration of each color step in milliseconds
        #[clap(long, value_parser = parse_duration, default_value = "1000")]
        step_duration: Duration,
    },
    /// Stops a running color flow.
    #[clap(name = "stop-cf")]
    StopCf,
    /// Sets the bulb directly to a state.
    #[clap(name = "set-scene")]
    SetScene {
        #[clap(value_enum)]
        class: SceneClass,
        val1: String,
        val2: String,
    },
    /// Powers the bulb off after a number of minutes.
    #[clap(name = "cron-add")]
    CronAdd {
        minutes: u32,
    },
    /// Shows the power-off timer.
    #[clap(name = "cron-get")]
    CronGet,
    /// Cancels the power-off timer.
    #[clap(name = "cron-del")]
    CronDel,
    /// Adjusts a property relative to its current value.
    #[clap(name = "set-adjust")]
    SetAdjust {
        #[clap(value_enum)]
        action: AdjustAction,
        #[clap(value_enum)]
        prop: AdjustProp,
    },
    /// Stores a name on the bulb.
    #[clap(name = "set-name")]
    SetName {
        name: String,
    },
}

fn color_flow(colors: Vec<NamedColor>, step_duration: Duration) -> Result<String> {
    if colors.is_empty() {
        return Err(anyhow!("Either --expression or --colors must be given"));
    }
    let steps: Vec<FlowStep> = colors
        .into_iter()
        .map(|color| FlowStep::color(step_duration, color.into(), KEEP_BRIGHTNESS))
        .collect();
    Ok(FlowExpression::from(steps).to_string())
}

fn print_reply(reply: &Value) -> Result<()> {
    if let Some(error) = reply.device_error() {
        return Err(anyhow!(
            "Bulb rejected the command: {} (code {})",
            error.message,
            error.code
        ));
    }
    println!("{}", serde_json::to_string_pretty(reply)?);
    Ok(())
}

async fn handle_cli(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Discover { output, timeout } => {
            let devices = Discovery::find_devices(Duration::from_millis(timeout)).await?;
            match output {
                OutputFormat::Plaintext => {
                    Discovery::pretty_print_devices(&devices);
                }
                OutputFormat::Json => {
                    let json = serde_json::to_string(&devices)?;
                    println!("{}", json);
                }
                OutputFormat::Yaml => {
                    let yaml = serde_yaml::to_string(&devices)?;
                    println!("{}", yaml);
                }
            }
        }
        Commands::DeviceCall {
            ip,
            port,
            timeout,
            action,
        } => {
            let control =
                ControlInterface::new(&ip, port).with_timeout(Duration::from_millis(timeout));

            let reply = match action {
                DeviceAction::GetProp { props } => {
                    let props: Vec<&str> = if props.is_empty() {
                        DEFAULT_PROPS.to_vec()
                    } else {
                        props.iter().map(String::as_str).collect()
                    };
                    control.get_prop(&props).await?
                }
                DeviceAction::SetCtAbx { ct, transition } => {
                    control.set_ct_abx_with(ct, transition.into()).await?
                }
                DeviceAction::SetRgb { color, transition } => {
                    control
                        .set_rgb_with(color.to_packed(), transition.into())
                        .await?
                }
                DeviceAction::SetHsv {
                    hue,
                    sat,
                    transition,
                } => control.set_hsv_with(hue, sat, transition.into()).await?,
                DeviceAction::SetBright {
                    brightness,
                    transition,
                } => control.set_bright_with(brightness, transition.into()).await?,
                DeviceAction::SetPower { power, transition } => {
                    control.set_power_with(power, transition.into()).await?
                }
                DeviceAction::On => control.turn_on().await?,
                DeviceAction::Off => control.turn_off().await?,
                DeviceAction::Toggle => control.toggle().await?,
                DeviceAction::SetDefault => control.set_default().await?,
                DeviceAction::StartCf {
                    count,
                    action,
                    expression,
                    colors,
                    step_duration,
                } => {
                    let expression = match expression {
                        Some(expression) => expression,
                        None => color_flow(colors, step_duration)?,
                    };
                    control.start_cf(count, action, &expression).await?
                }
                DeviceAction::StopCf => control.stop_cf().await?,
                DeviceAction::SetScene { class, val1, val2 } => {
                    control
                        .set_scene(class, parse_scene_value(&val1), parse_scene_value(&val2))
                        .await?
                }
                DeviceAction::CronAdd { minutes } => {
                    control.cron_add(CronType::PowerOff, minutes).await?
                }
                DeviceAction::CronGet => control.cron_get(CronType::PowerOff).await?,
                DeviceAction::CronDel => control.cron_del(CronType::PowerOff).await?,
                DeviceAction::SetAdjust { action, prop } => {
                    control.set_adjust(action, prop).await?
                }
                DeviceAction::SetName { name } => control.set_name(&name).await?,
            };

            print_reply(&reply)?;
        }
    }

    Ok(())
}
