use clap::Parser;
use pdpdb::ConnectorArgs;
use std::time::Duration;

#[derive(Debug, Parser)]
pub struct Cli {
    #[clap(long, value_name = "HOST", env = "HOST", default_value = "0.0.0.0")]
    pub host: String,
    /// Port to listen on; stored with its leading separator, e.g. `:8080`
    #[clap(long, value_name = "PORT", env = "PORT", default_value = "8080", value_parser = parse_port)]
    pub port: String,
    /// Bearer token required to create policies or reload
    #[clap(long, value_name = "API_KEY", env = "API_KEY", hide_env_values = true, value_parser = parse_api_key)]
    pub api_key: String,
    #[clap(flatten)]
    pub connector: ConnectorArgs,
    #[clap(long, value_name = "STORE_TIMEOUT_MS", env = "STORE_TIMEOUT_MS", default_value = "5000")]
    pub store_timeout_ms: u64,
    #[clap(long, value_name = "READY_TIMEOUT_MS", env = "READY_TIMEOUT_MS", default_value = "10000")]
    pub ready_timeout_ms: u64,
    #[clap(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    pub fn listen_addr(&self) -> String {
        format!("{}{}", self.host, self.port)
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }

    pub fn ready_timeout(&self) -> Duration {
        Duration::from_millis(self.ready_timeout_ms)
    }
}

/// Prefix the port with `:` unless it already has one.
pub fn normalize_port(port: &str) -> String {
    if port.starts_with(':') {
        port.to_string()
    } else {
        format!(":{port}")
    }
}

fn parse_port(s: &str) -> Result<String, String> {
    let port = normalize_port(s.trim());
    port[1..].parse::<u16>()
        .map(|_| port.clone())
        .map_err(|_| format!("{s:?} is not a valid port"))
}

fn parse_api_key(s: &str) -> Result<String, String> {
    if s.is_empty() {
        Err("the API key must not be empty".to_string())
    } else {
        Ok(s.to_string())
    }
}
