use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr};

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub trace_moe: TraceMoeConfig,
    #[serde(default)]
    pub anilist: AnilistConfig,
    #[serde(default)]
    pub messages: SessionMessages,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

fn default_port() -> u16 {
    8080
}

/// trace.moe reverse image search backend configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TraceMoeConfig {
    /// API base URL (e.g., "https://api.trace.moe")
    #[serde(default = "default_trace_moe_url")]
    pub base_url: String,
    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// Ask the backend to crop black borders before matching
    #[serde(default)]
    pub cut_borders: bool,
}

impl Default for TraceMoeConfig {
    fn default() -> Self {
        Self {
            base_url: default_trace_moe_url(),
            timeout_secs: default_timeout(),
            cut_borders: false,
        }
    }
}

fn default_trace_moe_url() -> String {
    "https://api.trace.moe".to_string()
}

/// AniList GraphQL metadata backend configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AnilistConfig {
    /// GraphQL endpoint
    #[serde(default = "default_anilist_endpoint")]
    pub endpoint: String,
    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl Default for AnilistConfig {
    fn default() -> Self {
        Self {
            endpoint: default_anilist_endpoint(),
            timeout_secs: default_timeout(),
        }
    }
}

fn default_anilist_endpoint() -> String {
    "https://graphql.anilist.co".to_string()
}

fn default_timeout() -> u64 {
    30
}

/// User-facing strings shown for failed sessions and unresolved titles.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SessionMessages {
    #[serde(default = "default_no_results")]
    pub no_results: String,
    #[serde(default = "default_cannot_read_file")]
    pub cannot_read_file: String,
    /// Used when a transport or backend error carries no message of its own.
    #[serde(default = "default_unknown_error")]
    pub unknown_error: String,
    /// Shown in place of a title when a match has no usable identifier.
    #[serde(default = "default_title_unavailable")]
    pub title_unavailable: String,
}

impl Default for SessionMessages {
    fn default() -> Self {
        Self {
            no_results: default_no_results(),
            cannot_read_file: default_cannot_read_file(),
            unknown_error: default_unknown_error(),
            title_unavailable: default_title_unavailable(),
        }
    }
}

fn default_no_results() -> String {
    "no results found".to_string()
}

fn default_cannot_read_file() -> String {
    "cannot read file".to_string()
}

fn default_unknown_error() -> String {
    "unknown error".to_string()
}

fn default_title_unavailable() -> String {
    "title unavailable".to_string()
}
