// Process configuration.
// Reads the GitHub token, listen port, and resolver policy from environment variables.

use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

use crate::error::{RedirectError, Result};
use crate::github::GITHUB_API_BASE;

pub const DEFAULT_PORT: u16 = 3001;
pub const DEFAULT_UPSTREAM_TIMEOUT: Duration = Duration::from_secs(30);

/// How a matched asset is handed to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Delivery {
    /// `302 Found` pointing at the asset's download URL.
    #[default]
    Redirect,
    /// Stream the asset through this server.
    Proxy,
}

impl Delivery {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "redirect" => Some(Delivery::Redirect),
            "proxy" => Some(Delivery::Proxy),
            _ => None,
        }
    }
}

/// Knobs for how requests are resolved against the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvePolicy {
    /// Cache TTL shared by every entry.
    pub ttl: Duration,
    /// Serve the stale record when a refresh fails.
    pub stale_fallback: bool,
    /// Match asset names ignoring case.
    pub case_insensitive: bool,
}

impl Default for ResolvePolicy {
    fn default() -> Self {
        Self {
            ttl: crate::cache::DEFAULT_TTL,
            stale_fallback: false,
            case_insensitive: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub github_token: String,
    pub github_api_url: String,
    pub port: u16,
    pub delivery: Delivery,
    pub upstream_timeout: Duration,
    pub policy: ResolvePolicy,
}

impl Config {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let github_token = lookup("GITHUB_TOKEN")
            .filter(|t| !t.is_empty())
            .ok_or(RedirectError::MissingToken)?;

        let port = match lookup("PORT").filter(|p| !p.is_empty()) {
            Some(p) => p.parse().map_err(|e| RedirectError::InvalidConfig {
                var: "PORT",
                reason: format!("{}", e),
            })?,
            None => DEFAULT_PORT,
        };

        let delivery = match lookup("DELIVERY").filter(|d| !d.is_empty()) {
            Some(d) => Delivery::parse(&d).ok_or_else(|| RedirectError::InvalidConfig {
                var: "DELIVERY",
                reason: format!("expected \"redirect\" or \"proxy\", got {:?}", d),
            })?,
            None => Delivery::default(),
        };

        let upstream_timeout = match lookup("UPSTREAM_TIMEOUT_SECS").filter(|t| !t.is_empty()) {
            Some(t) => {
                let secs: u64 = t.parse().map_err(|e| RedirectError::InvalidConfig {
                    var: "UPSTREAM_TIMEOUT_SECS",
                    reason: format!("{}", e),
                })?;
                Duration::from_secs(secs)
            }
            None => DEFAULT_UPSTREAM_TIMEOUT,
        };

        let policy = ResolvePolicy {
            stale_fallback: parse_flag(&lookup, "STALE_FALLBACK")?,
            case_insensitive: parse_flag(&lookup, "CASE_INSENSITIVE")?,
            ..ResolvePolicy::default()
        };

        let github_api_url = lookup("GITHUB_API_URL")
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| GITHUB_API_BASE.to_string());

        Ok(Self {
            github_token,
            github_api_url,
            port,
            delivery,
            upstream_timeout,
            policy,
        })
    }

    /// Address the HTTP listener binds to (all interfaces).
    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::from((Ipv4Addr::UNSPECIFIED, self.port))
    }
}

fn parse_flag<F>(lookup: &F, var: &'static str) -> Result<bool>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(var).map(|v| v.trim().to_ascii_lowercase()) {
        None => Ok(false),
        Some(v) => match v.as_str() {
            "" | "0" | "false" | "no" | "off" => Ok(false),
            "1" | "true" | "yes" | "on" => Ok(true),
            _ => Err(RedirectError::InvalidConfig {
                var,
                reason: format!("expected a boolean, got {:?}", v),
            }),
        },
    }
}
