//! ch9329-ctl: command-line driver for a CH9329 on a serial port.
//!
//! Each invocation opens the port, runs one subcommand, prints the result and
//! closes the port again.
//!
//! # Usage
//!
//! ```text
//! ch9329-ctl [OPTIONS] <COMMAND>
//!
//! Options:
//!   --config <PATH>      Config file [default: platform config dir]
//!   --port <PATH>        Serial port, overrides the config file
//!   --baud <RATE>        Baud rate, overrides the config file
//!   --log-level <LEVEL>  error | warn | info | debug | trace
//!   --json               Print results as JSON
//!   --simulate           Talk to an in-memory chip instead of a port
//! ```
//!
//! # Environment variable overrides
//!
//! | Variable        | Flag          |
//! |-----------------|---------------|
//! | `CH9329_CONFIG` | `--config`    |
//! | `CH9329_PORT`   | `--port`      |
//! | `CH9329_BAUD`   | `--baud`      |
//! | `CH9329_LOG`    | `--log-level` |
//!
//! Without `--log-level`, `RUST_LOG` is honoured, then the config file level.

use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::json;
use tracing::info;
use tracing_subscriber::EnvFilter;

use ch9329_core::{
    to_device_space, AbsoluteMouseReport, DeviceInfo, MediaKeyReport, ModifierKeys,
    MouseButtons, ParameterBlock, RelativeMouseReport, UsbStringDescriptor, UsbStringType,
};
use ch9329_ctl::application::gestures::GesturePlayer;
use ch9329_ctl::infrastructure::storage::config::{
    default_config_path, load_config, save_config, AppConfig,
};
use ch9329_ctl::infrastructure::transport::{ScriptedTransport, SerialTransport};
use ch9329_ctl::{Ch9329Controller, CommandDispatcher, Transport};

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Drive a CH9329 UART-to-USB HID chip.
#[derive(Debug, Parser)]
#[command(name = "ch9329-ctl", about = "Host-side driver for the CH9329 HID chip", version)]
struct Cli {
    /// Path of the TOML config file.
    #[arg(long, env = "CH9329_CONFIG")]
    config: Option<PathBuf>,

    /// Serial port device, e.g. `/dev/ttyUSB0` or `COM3`.
    #[arg(long, env = "CH9329_PORT")]
    port: Option<String>,

    /// UART baud rate.  Must match the chip's configured rate.
    #[arg(long, env = "CH9329_BAUD")]
    baud: Option<u32>,

    /// Log level for stderr output.
    #[arg(long, env = "CH9329_LOG")]
    log_level: Option<String>,

    /// Print results as JSON on stdout.
    #[arg(long)]
    json: bool,

    /// Use an in-memory simulated chip.
    #[arg(long)]
    simulate: bool,

    #[command(subcommand)]
    command: Cmd,
}

#[derive(Debug, Subcommand)]
enum Cmd {
    /// Show version, USB state and lock LEDs.
    Info,
    /// Press keys (HID usage codes), then release them.
    Key {
        /// Modifier bitmask (bit 0 = left ctrl ... bit 7 = right win).
        #[arg(long, default_value = "0", value_parser = parse_u8)]
        modifiers: u8,
        /// Up to six key codes, decimal or `0x`-prefixed hex.
        #[arg(value_parser = parse_u8)]
        keys: Vec<u8>,
        /// Leave the keys pressed.
        #[arg(long)]
        no_release: bool,
    },
    /// Send a multimedia key, then release it.
    Media {
        #[arg(value_parser = parse_u8)]
        report_id: u8,
        #[arg(value_parser = parse_u16)]
        keycode: u16,
        #[arg(long)]
        no_release: bool,
    },
    /// Move the pointer to an absolute position in the 0..=4095 grid.
    MoveAbs { x: u16, y: u16 },
    /// Move the pointer to a screen pixel position.
    MoveScreen {
        x: u32,
        y: u32,
        /// Screen width, overrides the config file.
        #[arg(long)]
        width: Option<u32>,
        /// Screen height, overrides the config file.
        #[arg(long)]
        height: Option<u32>,
    },
    /// Move the pointer relative to its current position.
    MoveRel {
        #[arg(allow_negative_numbers = true)]
        dx: i8,
        #[arg(allow_negative_numbers = true)]
        dy: i8,
    },
    /// Click a mouse button.
    Click {
        #[arg(long, value_enum, default_value_t = Button::Left)]
        button: Button,
        #[arg(long)]
        double: bool,
    },
    /// Turn the wheel; positive scrolls up.
    Scroll {
        #[arg(allow_negative_numbers = true)]
        delta: i8,
    },
    /// Send up to 64 hex bytes to the custom HID interface.
    Hid { data: String },
    /// Dump the 50-byte parameter block as hex.
    GetParams,
    /// Write a 50-byte parameter block given as hex.
    SetParams { data: String },
    /// Read a USB string descriptor.
    GetString {
        #[arg(value_enum)]
        kind: StringKind,
    },
    /// Write a USB string descriptor.
    SetString {
        #[arg(value_enum)]
        kind: StringKind,
        text: String,
    },
    /// Restore factory parameters (applies after reset).
    RestoreDefaults,
    /// Soft-reset the chip.
    Reset,
    /// Read one frame of custom HID data sent by the target PC.
    ReadHid,
    /// Write the effective settings to the config file.
    InitConfig,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Button {
    Left,
    Right,
    Middle,
}

impl From<Button> for MouseButtons {
    fn from(b: Button) -> Self {
        match b {
            Button::Left => MouseButtons::LEFT_ONLY,
            Button::Right => MouseButtons::RIGHT_ONLY,
            Button::Middle => MouseButtons::MIDDLE_ONLY,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum StringKind {
    Manufacturer,
    Product,
    Serial,
}

impl From<StringKind> for UsbStringType {
    fn from(k: StringKind) -> Self {
        match k {
            StringKind::Manufacturer => UsbStringType::Manufacturer,
            StringKind::Product => UsbStringType::Product,
            StringKind::Serial => UsbStringType::SerialNumber,
        }
    }
}

/// What a subcommand produced, ready for printing.
enum Outcome {
    Done,
    Info(DeviceInfo),
    Params(ParameterBlock),
    UsbString(UsbStringDescriptor),
    HidData(Vec<u8>),
    ConfigWritten(PathBuf),
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config_path = cli
        .config
        .clone()
        .or_else(default_config_path)
        .unwrap_or_else(|| PathBuf::from("ch9329-ctl.toml"));
    let mut config = load_config(&config_path)
        .with_context(|| format!("loading config from {}", config_path.display()))?;
    if let Some(port) = &cli.port {
        config.serial.port = port.clone();
    }
    if let Some(baud) = cli.baud {
        config.serial.baud_rate = baud;
    }
    if let Some(level) = &cli.log_level {
        config.log.level = level.clone();
    }

    init_logging(cli.log_level.as_deref(), &config.log.level);

    if let Cmd::InitConfig = cli.command {
        save_config(&config_path, &config)
            .with_context(|| format!("writing config to {}", config_path.display()))?;
        return print_outcome(Outcome::ConfigWritten(config_path), cli.json);
    }

    let transport: Box<dyn Transport> = if cli.simulate {
        info!("using simulated CH9329");
        Box::new(ScriptedTransport::simulated())
    } else {
        Box::new(
            SerialTransport::open(
                &config.serial.port,
                config.serial.baud_rate,
                config.serial.read_timeout(),
            )
            .context("opening CH9329 serial port")?,
        )
    };
    let mut controller = Ch9329Controller::with_dispatcher(CommandDispatcher::with_settle_delay(
        transport,
        config.serial.settle_delay(),
    ));

    let outcome = run(&mut controller, cli.command, &config);
    controller.close();
    print_outcome(outcome?, cli.json)
}

/// `--log-level` wins, then `RUST_LOG`, then the config file.
fn init_logging(flag: Option<&str>, configured: &str) {
    let filter = match flag {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(configured)),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run<T: Transport>(
    ctl: &mut Ch9329Controller<T>,
    command: Cmd,
    config: &AppConfig,
) -> anyhow::Result<Outcome> {
    match command {
        Cmd::Info => return Ok(Outcome::Info(ctl.get_info()?)),
        Cmd::Key {
            modifiers,
            keys,
            no_release,
        } => {
            ctl.send_keys(ModifierKeys(modifiers), &keys)?;
            if !no_release {
                ctl.release_keys()?;
            }
        }
        Cmd::Media {
            report_id,
            keycode,
            no_release,
        } => {
            ctl.send_media_key(&MediaKeyReport { report_id, keycode })?;
            if !no_release {
                ctl.send_media_key(&MediaKeyReport {
                    report_id,
                    keycode: 0,
                })?;
            }
        }
        Cmd::MoveAbs { x, y } => ctl.send_mouse_absolute(&AbsoluteMouseReport {
            x,
            y,
            ..AbsoluteMouseReport::default()
        })?,
        Cmd::MoveScreen {
            x,
            y,
            width,
            height,
        } => {
            let (dx, dy) = to_device_space(
                x,
                y,
                width.unwrap_or(config.screen.width),
                height.unwrap_or(config.screen.height),
            )?;
            ctl.send_mouse_absolute(&AbsoluteMouseReport {
                x: dx,
                y: dy,
                ..AbsoluteMouseReport::default()
            })?;
        }
        Cmd::MoveRel { dx, dy } => ctl.send_mouse_relative(&RelativeMouseReport {
            dx,
            dy,
            ..RelativeMouseReport::default()
        })?,
        Cmd::Click { button, double } => {
            let mut player = GesturePlayer::new(ctl);
            if double {
                player.double_click(button.into())?;
            } else {
                player.click(button.into())?;
            }
        }
        Cmd::Scroll { delta } => GesturePlayer::new(ctl).scroll(delta)?,
        Cmd::Hid { data } => ctl.send_custom_hid(&parse_hex(&data)?)?,
        Cmd::GetParams => return Ok(Outcome::Params(ctl.get_parameters()?)),
        Cmd::SetParams { data } => {
            let bytes = parse_hex(&data)?;
            let Ok(block) = <[u8; 50]>::try_from(bytes.as_slice()) else {
                bail!("parameter block must be 50 bytes, got {}", bytes.len());
            };
            ctl.set_parameters(&ParameterBlock(block))?;
        }
        Cmd::GetString { kind } => return Ok(Outcome::UsbString(ctl.get_usb_string(kind.into())?)),
        Cmd::SetString { kind, text } => ctl.set_usb_string(kind.into(), text)?,
        Cmd::RestoreDefaults => ctl.restore_defaults()?,
        Cmd::Reset => ctl.reset()?,
        Cmd::ReadHid => return Ok(Outcome::HidData(ctl.read_hid_data()?)),
        Cmd::InitConfig => bail!("init-config does not talk to the chip"),
    }
    Ok(Outcome::Done)
}

// ── Output ────────────────────────────────────────────────────────────────────

fn print_outcome(outcome: Outcome, as_json: bool) -> anyhow::Result<()> {
    if as_json {
        let value = match outcome {
            Outcome::Done => json!({ "ok": true }),
            Outcome::Info(info) => serde_json::to_value(info)?,
            Outcome::Params(block) => json!({ "parameters": to_hex(block.as_bytes()) }),
            Outcome::UsbString(desc) => json!({
                "kind": desc.kind,
                "text": desc.text(),
                "bytes": to_hex(&desc.bytes),
            }),
            Outcome::HidData(data) => json!({ "data": to_hex(&data) }),
            Outcome::ConfigWritten(path) => json!({ "config": path }),
        };
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    match outcome {
        Outcome::Done => println!("ok"),
        Outcome::Info(info) => {
            println!(
                "version      {}.{} (raw 0x{:02X})",
                info.version_major, info.version_minor, info.version_raw
            );
            let usb = if info.usb_connected {
                "connected"
            } else {
                "not connected"
            };
            println!("usb          {usb}");
            println!(
                "locks        num={} caps={} scroll={}",
                info.num_lock, info.caps_lock, info.scroll_lock
            );
            println!("pc sleeping  {}", info.pc_sleeping);
        }
        Outcome::Params(block) => println!("{}", to_hex(block.as_bytes())),
        Outcome::UsbString(desc) => println!("{:?}: {}", desc.kind, desc.text()),
        Outcome::HidData(data) => println!("{}", to_hex(&data)),
        Outcome::ConfigWritten(path) => println!("wrote {}", path.display()),
    }
    Ok(())
}

// ── Argument parsing helpers ──────────────────────────────────────────────────

fn parse_u32(s: &str) -> Result<u32, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => s.parse(),
    };
    parsed.map_err(|e| format!("invalid number {s:?}: {e}"))
}

fn parse_u8(s: &str) -> Result<u8, String> {
    u8::try_from(parse_u32(s)?).map_err(|_| format!("{s} does not fit in a byte"))
}

fn parse_u16(s: &str) -> Result<u16, String> {
    u16::try_from(parse_u32(s)?).map_err(|_| format!("{s} does not fit in 16 bits"))
}

/// Parses `"01 02 ff"`, `"01:02:FF"`, `"0x01,0x02"` or `"0102ff"`.
fn parse_hex(s: &str) -> anyhow::Result<Vec<u8>> {
    let mut out = Vec::new();
    for token in s
        .split(|c: char| c.is_whitespace() || c == ',' || c == ':')
        .filter(|t| !t.is_empty())
    {
        let digits = token
            .strip_prefix("0x")
            .or_else(|| token.strip_prefix("0X"))
            .unwrap_or(token);
        if digits.len() % 2 != 0 {
            bail!("odd number of hex digits in {token:?}");
        }
        for i in (0..digits.len()).step_by(2) {
            let pair = digits.get(i..i + 2).context("non-ASCII hex input")?;
            out.push(u8::from_str_radix(pair, 16).with_context(|| format!("bad hex {pair:?}"))?);
        }
    }
    Ok(out)
}

fn to_hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{b:02X}"))
        .collect::<Vec<_>>()
        .join(" ")
}
