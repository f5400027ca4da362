//! Command-line interface for pi-minion.
//!
//! This binary talks to the daemon's HTTP API: pin reads, i2c byte
//! transfers and audio playback, plus health and capability queries.

use anyhow::Result;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::process::ExitCode;

use pi_minion::api_client::{Client, DEFAULT_URL, URL_ENV};
use pi_minion::audio::Track;
use pi_minion::capability::Availability;
use pi_minion::tracing;
use pi_minion::types::I2cAddress;

/// Raspberry Pi hardware from the command line
#[derive(Parser)]
#[command(name = "pi-cli")]
#[command(version, about = "Query and drive a pi-minion daemon")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Daemon base URL (default: $PI_MINION_API_URL or http://127.0.0.1:7786)
    #[arg(long, global = true)]
    url: Option<String>,

    /// Print the daemon's JSON response instead of a summary
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that the daemon is up
    Health,

    /// Show which hardware the daemon found
    Capabilities,

    /// Read a GPIO pin (BCM numbering)
    Pin {
        /// Pin number
        pin: u8,
    },

    /// Write one byte to an i2c device
    I2cWrite {
        /// Device address, decimal or 0x-prefixed hex (default: daemon's default address)
        #[arg(short, long)]
        address: Option<I2cAddress>,

        /// Byte to write, decimal or 0x-prefixed hex
        #[arg(value_parser = parse_byte)]
        value: u8,
    },

    /// Read one byte from an i2c device
    I2cRead {
        /// Device address, decimal or 0x-prefixed hex (default: daemon's default address)
        #[arg(short, long)]
        address: Option<I2cAddress>,
    },

    /// Play a track (victory or khan)
    Play {
        track: Track,
    },
}

fn parse_byte(s: &str) -> std::result::Result<u8, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u8::from_str_radix(hex, 16),
        None => s.parse(),
    };
    parsed.map_err(|e| format!("'{}' is not a byte: {}", s, e))
}

async fn resolve_address(client: &Client, address: Option<I2cAddress>) -> Result<I2cAddress> {
    match address {
        Some(address) => Ok(address),
        None => Ok(client.capabilities().await?.default_address),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn describe(availability: &Availability) -> String {
    match availability {
        Availability::Available => "available".to_string(),
        Availability::Unavailable { reason } => format!("unavailable ({})", reason),
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing::init_stderr();
    let cli = Cli::parse();

    let url = cli
        .url
        .or_else(|| std::env::var(URL_ENV).ok())
        .unwrap_or_else(|| DEFAULT_URL.to_string());
    let client = Client::new(&url);

    match cli.command {
        Commands::Health => {
            println!("{}", client.health().await?);
        }
        Commands::Capabilities => {
            let caps = client.capabilities().await?;
            if cli.json {
                return print_json(&caps).map(|_| ExitCode::SUCCESS);
            }
            println!("gpio:  {}", describe(&caps.capabilities.gpio));
            println!("i2c:   {}", describe(&caps.capabilities.i2c));
            println!("audio: {}", describe(&caps.capabilities.audio));
            println!("default i2c address: {}", caps.default_address);
            match caps.open_bus {
                Some(bus) => println!("open i2c bus: {}", bus),
                None => println!("open i2c bus: none"),
            }
        }
        Commands::Pin { pin } => {
            let status = client.pin_status(pin).await?;
            if cli.json {
                print_json(&status)?;
            } else {
                println!("{}", status.value);
            }
        }
        Commands::I2cWrite { address, value } => {
            let address = resolve_address(&client, address).await?;
            let response = client.i2c_write(address, value).await?;
            if cli.json {
                print_json(&response)?;
            } else {
                println!("{}", response.success);
            }
        }
        Commands::I2cRead { address } => {
            let address = resolve_address(&client, address).await?;
            let response = client.i2c_read(address).await?;
            if cli.json {
                print_json(&response)?;
            } else {
                println!("0x{:02X}", response.value);
            }
        }
        Commands::Play { track } => {
            let response = client.play(track).await?;
            if cli.json {
                print_json(&response)?;
            } else {
                println!("{}", response.code);
            }
            if !response.success {
                return Ok(ExitCode::FAILURE);
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}
