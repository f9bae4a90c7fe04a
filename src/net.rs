//! Network reachability checks.

use crate::config::Config;
use color_eyre::{eyre::eyre, Result};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Answers "is a network path to the API currently available".
///
/// Implementations are synchronous and side-effect free from the caller's
/// point of view.
pub trait Connectivity: Send + Sync {
  fn is_connected(&self) -> bool;
}

/// Probes reachability by opening (and immediately dropping) a TCP connection.
#[derive(Debug, Clone)]
pub struct TcpProbe {
  addr: String,
  timeout: Duration,
}

impl TcpProbe {
  pub fn new(addr: impl Into<String>, timeout: Duration) -> Self {
    Self {
      addr: addr.into(),
      timeout,
    }
  }

  /// Build a probe from config, defaulting to the API host and its scheme port.
  pub fn from_config(config: &Config) -> Result<Self> {
    let timeout = Duration::from_millis(config.connectivity.probe_timeout_ms);

    if let Some(addr) = &config.connectivity.probe_addr {
      return Ok(Self::new(addr.clone(), timeout));
    }

    Ok(Self::new(probe_addr_for(&config.api.base_url)?, timeout))
  }

  pub fn addr(&self) -> &str {
    &self.addr
  }
}

impl Connectivity for TcpProbe {
  fn is_connected(&self) -> bool {
    let addrs = match self.addr.to_socket_addrs() {
      Ok(addrs) => addrs,
      Err(e) => {
        debug!(addr = %self.addr, error = %e, "connectivity probe could not resolve");
        return false;
      }
    };

    for addr in addrs {
      if TcpStream::connect_timeout(&addr, self.timeout).is_ok() {
        return true;
      }
    }

    debug!(addr = %self.addr, "connectivity probe failed");
    false
  }
}

/// Oracle that always reports no network, for cache-only browsing.
#[derive(Debug, Clone, Copy, Default)]
pub struct Offline;

impl Connectivity for Offline {
  fn is_connected(&self) -> bool {
    false
  }
}

/// Derive `host:port` from a base URL
fn probe_addr_for(base_url: &str) -> Result<String> {
  let url = Url::parse(base_url).map_err(|e| eyre!("Invalid API base URL '{}': {}", base_url, e))?;
  let host = url
    .host_str()
    .ok_or_else(|| eyre!("API base URL has no host: {}", base_url))?;
  let port = url
    .port_or_known_default()
    .ok_or_else(|| eyre!("Could not determine port for {}", base_url))?;
  Ok(format!("{}:{}", host, port))
}
