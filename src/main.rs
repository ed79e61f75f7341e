//! Dump the properties of a built-in demo device.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use daq_properties::adapters::MockAdapter;
use daq_properties::catalog::DeviceType;
use daq_properties::config::PropertiesConfig;
use daq_properties::configurable::ConfigurableSnapshot;
use daq_properties::logging;
use daq_properties::session::{DeviceInfo, DeviceSession};

#[derive(Parser)]
#[command(name = "property-dump")]
#[command(about = "Discover a demo device and print its properties")]
struct Cli {
    /// Configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Demo device to open
    #[arg(short, long, value_enum, default_value = "psu")]
    device: DemoDevice,

    /// Print JSON instead of a table
    #[arg(long)]
    json: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum DemoDevice {
    /// Two-channel power supply
    Psu,
    /// Multimeter
    Dmm,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = PropertiesConfig::load(cli.config.as_deref()).context("loading configuration")?;
    logging::init(&config.logging).context("initialising logging")?;

    let (adapter, info) = match cli.device {
        DemoDevice::Psu => (
            MockAdapter::demo_power_supply(),
            DeviceInfo::new("Demo PSU", DeviceType::PowerSupply, "demo-psu"),
        ),
        DemoDevice::Dmm => (
            MockAdapter::demo_multimeter(),
            DeviceInfo::new("Demo DMM", DeviceType::Multimeter, "demo-dmm"),
        ),
    };

    let session = DeviceSession::open(Arc::new(adapter), info, &config);
    let snapshot = session.snapshot();

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    } else {
        print_table(&snapshot);
    }
    Ok(())
}

fn print_table(configurables: &[ConfigurableSnapshot]) {
    for configurable in configurables {
        println!(
            "[{}] {} ({})",
            configurable.index,
            configurable.display_name,
            configurable.device_type.name()
        );
        for property in &configurable.properties {
            let access = format!(
                "{}{}{}",
                if property.readable { 'r' } else { '-' },
                if property.writable { 'w' } else { '-' },
                if property.enumerable { 'l' } else { '-' },
            );
            println!(
                "    {:<36} {:<18} {} {}",
                property.name,
                property.kind.name(),
                access,
                property.display.as_deref().unwrap_or("")
            );
        }
    }
}
