use std::net::{IpAddr, Ipv4Addr};

pub const DEFAULT_BEACON_API_ENDPOINT: &str = "http://localhost:5052";
pub const DEFAULT_EXECUTION_API_ENDPOINT: &str = "http://localhost:8545";
pub const DEFAULT_HTTP_ADDRESS: IpAddr = IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1));
pub const DEFAULT_HTTP_PORT: u16 = 8281;
pub const DEFAULT_METRICS_ENABLED: bool = false;
pub const DEFAULT_METRICS_ADDRESS: IpAddr = IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1));
pub const DEFAULT_METRICS_PORT: u16 = 8080;
pub const DEFAULT_NETWORK: &str = "mainnet";
pub const DEFAULT_NODESET_API_URL: &str = "https://nodeset.io/api";
pub const DEFAULT_REQUEST_TIMEOUT: &str = "60";
pub const DEFAULT_TASK_COOLDOWN: &str = "5";
pub const DEFAULT_TASK_INTERVAL: &str = "300";
pub const DEFAULT_VERBOSITY: &str = "3";
