//! Configuration from command line and environment
//!
//! Every option can also be given through an environment variable. The
//! broker password should only ever come from `MQTT_CLIENT_PASSWORD`; passing
//! it as an argument works but is logged as a warning by the binary.

use crate::domain::types::Zone;
use crate::infra::error::ConfigError;
use crate::infra::zones::load_zones;
use crate::io::cache::default_cache_dir;
use clap::Parser;
use std::path::{Path, PathBuf};

/// Publish FindMy device locations to Home Assistant via MQTT discovery
#[derive(Parser, Debug, Clone)]
#[command(name = "findmy-bridge", version, about)]
pub struct CliArgs {
    /// Path to the known locations (zones) file, JSON or .toml
    #[arg(short, long)]
    pub locations: Option<PathBuf>,

    /// Hide device details from the console output
    #[arg(short, long)]
    pub privacy: bool,

    /// Publish every device on every scan, ignoring unchanged timestamps
    #[arg(short, long)]
    pub force_sync: bool,

    /// IP or host name of the MQTT broker
    #[arg(long, env = "MQTT_BROKER_IP")]
    pub ip: String,

    /// Port of the MQTT broker
    #[arg(long, env = "MQTT_BROKER_PORT", default_value_t = 1883)]
    pub port: u16,

    /// MQTT client username
    #[arg(long, env = "MQTT_CLIENT_USERNAME")]
    pub username: String,

    /// [WARNING] Set this via environment variable! MQTT client password
    #[arg(long, env = "MQTT_CLIENT_PASSWORD", hide_env_values = true)]
    pub password: String,

    /// Cache scan interval in seconds
    #[arg(
        long,
        env = "FINDMY_FILE_SCAN_INTERVAL",
        default_value_t = 5,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub scan_interval: u64,

    /// FindMy cache directory (default: ~/Library/Caches/com.apple.findmy.fmipcore)
    #[arg(long, env = "FINDMY_CACHE_DIR")]
    pub cache_dir: Option<PathBuf>,

    /// MQTT client id
    #[arg(long, default_value = "ha-findmy")]
    pub client_id: String,
}

/// Resolved, validated configuration
#[derive(Debug, Clone)]
pub struct Config {
    mqtt_host: String,
    mqtt_port: u16,
    mqtt_username: String,
    mqtt_password: String,
    client_id: String,
    scan_interval_secs: u64,
    privacy: bool,
    force_sync: bool,
    cache_dir: PathBuf,
    locations_file: Option<PathBuf>,
    zones: Vec<Zone>,
}

impl Config {
    /// Resolve arguments into a configuration, loading the zone file if given
    pub fn from_args(args: CliArgs) -> Result<Self, ConfigError> {
        let zones = match &args.locations {
            Some(path) => load_zones(path)?,
            None => Vec::new(),
        };
        let cache_dir = match args.cache_dir {
            Some(dir) => dir,
            None => default_cache_dir()?,
        };

        Ok(Self {
            mqtt_host: args.ip,
            mqtt_port: args.port,
            mqtt_username: args.username,
            mqtt_password: args.password,
            client_id: args.client_id,
            scan_interval_secs: args.scan_interval,
            privacy: args.privacy,
            force_sync: args.force_sync,
            cache_dir,
            locations_file: args.locations,
            zones,
        })
    }

    pub fn mqtt_host(&self) -> &str {
        &self.mqtt_host
    }

    pub fn mqtt_port(&self) -> u16 {
        self.mqtt_port
    }

    pub fn mqtt_username(&self) -> &str {
        &self.mqtt_username
    }

    pub fn mqtt_password(&self) -> &str {
        &self.mqtt_password
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn scan_interval_secs(&self) -> u64 {
        self.scan_interval_secs
    }

    pub fn privacy(&self) -> bool {
        self.privacy
    }

    pub fn force_sync(&self) -> bool {
        self.force_sync
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    pub fn locations_file(&self) -> Option<&Path> {
        self.locations_file.as_deref()
    }

    pub fn zones(&self) -> &[Zone] {
        &self.zones
    }

    /// Whether zones come from a known-locations file rather than Home Assistant
    pub fn has_manual_zones(&self) -> bool {
        !self.zones.is_empty()
    }
}
