use std::env;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::path::PathBuf;

use tracing::{info, warn};

use crate::allocator::{AllocationConfig, AllocationStrategy};
use crate::model::ContainerCatalog;
use crate::utilization::WarningThresholds;

/// Complete application configuration, loaded from environment variables or default values.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub catalog: ContainerCatalog,
    pub allocation: AllocationConfig,
}

impl AppConfig {
    /// Creates a configuration from the currently available environment variables.
    pub fn from_env() -> Self {
        Self {
            api: ApiConfig::from_env(),
            catalog: load_catalog(env_string(CATALOG_PATH_VAR).map(PathBuf::from)),
            allocation: allocation_from_env(),
        }
    }
}

/// Configuration for the API server.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    bind_ip: IpAddr,
    display_host: String,
    port: u16,
}

impl ApiConfig {
    const DEFAULT_HOST: &'static str = "0.0.0.0";
    const DEFAULT_PORT: u16 = 8001;
    const HOST_VAR: &'static str = "CONTAINER_FIT_API_HOST";
    const PORT_VAR: &'static str = "CONTAINER_FIT_API_PORT";

    fn from_env() -> Self {
        Self::from_values(env_string(Self::HOST_VAR), env_string(Self::PORT_VAR))
    }

    fn from_values(host: Option<String>, port: Option<String>) -> Self {
        let default_ip = IpAddr::V4(Ipv4Addr::UNSPECIFIED);
        let (bind_ip, display_host) = match host {
            Some(raw) => match raw.parse::<IpAddr>() {
                Ok(ip) => (ip, raw),
                Err(err) => {
                    warn!(
                        "Could not parse {} ('{}'): {}. Using {}.",
                        Self::HOST_VAR,
                        raw,
                        err,
                        Self::DEFAULT_HOST
                    );
                    (default_ip, Self::DEFAULT_HOST.to_string())
                }
            },
            None => (default_ip, Self::DEFAULT_HOST.to_string()),
        };

        let port = match port {
            Some(raw) => match raw.parse::<u16>() {
                Ok(value) if value != 0 => value,
                Ok(_) => {
                    warn!(
                        "{} must not be 0. Using {}.",
                        Self::PORT_VAR,
                        Self::DEFAULT_PORT
                    );
                    Self::DEFAULT_PORT
                }
                Err(err) => {
                    warn!(
                        "Could not parse {} ('{}'): {}. Using {}.",
                        Self::PORT_VAR,
                        raw,
                        err,
                        Self::DEFAULT_PORT
                    );
                    Self::DEFAULT_PORT
                }
            },
            None => Self::DEFAULT_PORT,
        };

        Self {
            bind_ip,
            display_host,
            port,
        }
    }

    /// Socket address to bind the server to.
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_ip, self.port)
    }

    /// Visible hostname for logging and hints.
    pub fn display_host(&self) -> &str {
        &self.display_host
    }

    /// Configured port.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Indicates whether binding to all interfaces.
    pub fn binds_to_all_interfaces(&self) -> bool {
        match self.bind_ip {
            IpAddr::V4(addr) => addr == Ipv4Addr::UNSPECIFIED,
            IpAddr::V6(addr) => addr == Ipv6Addr::UNSPECIFIED,
        }
    }
}

const CATALOG_PATH_VAR: &str = "CONTAINER_FIT_CATALOG_PATH";
const STRATEGY_VAR: &str = "CONTAINER_FIT_STRATEGY";
const VOLUME_WARNING_VAR: &str = "CONTAINER_FIT_VOLUME_WARNING_PERCENT";
const WEIGHT_WARNING_VAR: &str = "CONTAINER_FIT_WEIGHT_WARNING_PERCENT";

/// Loads the container catalog, falling back to the standard classes.
fn load_catalog(path: Option<PathBuf>) -> ContainerCatalog {
    let Some(path) = path else {
        return ContainerCatalog::standard();
    };

    match ContainerCatalog::load(&path) {
        Ok(catalog) => {
            info!(
                "Loaded {} container classes from {}",
                catalog.len(),
                path.display()
            );
            catalog
        }
        Err(err) => {
            warn!("{}. Using the standard container catalog.", err);
            ContainerCatalog::standard()
        }
    }
}

fn allocation_from_env() -> AllocationConfig {
    let strategy = parse_strategy(env_string(STRATEGY_VAR));

    let volume_percent = load_percent(VOLUME_WARNING_VAR, env_string(VOLUME_WARNING_VAR));
    let weight_percent = load_percent(WEIGHT_WARNING_VAR, env_string(WEIGHT_WARNING_VAR));

    AllocationConfig::builder()
        .strategy(strategy)
        .volume_warning_percent(volume_percent)
        .weight_warning_percent(weight_percent)
        .build()
}

fn parse_strategy(raw: Option<String>) -> AllocationStrategy {
    let Some(raw) = raw else {
        return AllocationStrategy::default();
    };
    match AllocationStrategy::parse(&raw) {
        Some(strategy) => {
            if strategy != AllocationStrategy::default() {
                info!(
                    "Item types are allocated with the '{}' strategy ({} = {}).",
                    strategy.code(),
                    STRATEGY_VAR,
                    raw
                );
            }
            strategy
        }
        None => {
            warn!(
                "{} has unknown strategy '{}' (input_order or largest_first). Using {}.",
                STRATEGY_VAR,
                raw,
                AllocationStrategy::default().code()
            );
            AllocationStrategy::default()
        }
    }
}

fn load_percent(var_name: &str, raw: Option<String>) -> f64 {
    load_f64_with_warning(
        var_name,
        raw,
        WarningThresholds::DEFAULT_PERCENT,
        |value| value > 0.0 && value <= 100.0,
        "must be greater than 0 and at most 100",
    )
}

fn env_string(name: &str) -> Option<String> {
    match env::var(name) {
        Ok(value) => {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_owned())
            }
        }
        Err(env::VarError::NotPresent) => None,
        Err(err) => {
            warn!("Access to {} failed: {}. Using default value.", name, err);
            None
        }
    }
}

fn load_f64_with_warning(
    var_name: &str,
    raw: Option<String>,
    default: f64,
    validator: impl Fn(f64) -> bool,
    invalid_hint: &str,
) -> f64 {
    match raw {
        Some(raw) => match raw.parse::<f64>() {
            Ok(value) if validator(value) => value,
            Ok(_) => {
                warn!(
                    "{} contains invalid value '{}': {}. Using {}.",
                    var_name, raw, invalid_hint, default
                );
                default
            }
            Err(err) => {
                warn!(
                    "Could not parse {} ('{}') as number: {}. Using {}.",
                    var_name, raw, err, default
                );
                default
            }
        },
        None => default,
    }
}
