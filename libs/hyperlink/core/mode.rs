//! Connection mode and error-mode policy
//!
//! A [`ConnectionMode`] is chosen on every (re)start and resolved against the
//! registered URL into a concrete [`ResolvedMode`]: which transport family to
//! run, whether it should stop after a single meaningful result, and the URL
//! the transport actually dials.

use crate::error::HyperLinkError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Requested connection mode for a label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionMode {
    /// Socket for `ws://`/`wss://` URLs, polling otherwise
    #[default]
    Auto,
    /// Always a persistent socket
    Persistent,
    /// Deliver one meaningful result, then stop
    OneShot,
}

/// What happens after a transport error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorMode {
    /// Retry with a fixed backoff until disconnected or re-registered
    #[default]
    AutoReconnect,
    /// Halt the transport; the host reacts to the error event itself
    HatOnly,
}

/// Transport family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportKind {
    Poll,
    Socket,
}

/// A mode resolved against a concrete URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedMode {
    pub kind: TransportKind,
    pub one_shot: bool,
    pub url: String,
}

impl ConnectionMode {
    /// Resolve this mode against `url`
    pub fn resolve(self, url: &str) -> ResolvedMode {
        let socket_scheme = is_socket_url(url);
        match self {
            ConnectionMode::Auto => ResolvedMode {
                kind: if socket_scheme { TransportKind::Socket } else { TransportKind::Poll },
                one_shot: false,
                url: url.to_string(),
            },
            ConnectionMode::Persistent => ResolvedMode {
                kind: TransportKind::Socket,
                one_shot: false,
                url: upgrade_to_socket_url(url),
            },
            ConnectionMode::OneShot => ResolvedMode {
                kind: if socket_scheme { TransportKind::Socket } else { TransportKind::Poll },
                one_shot: true,
                url: url.to_string(),
            },
        }
    }
}

/// Split `scheme://rest`, returning the lowercased scheme
fn scheme(url: &str) -> Option<String> {
    let (scheme, _) = url.split_once("://")?;
    if scheme.is_empty() || !scheme.chars().all(|c| c.is_ascii_alphanumeric() || "+-.".contains(c)) {
        return None;
    }
    Some(scheme.to_ascii_lowercase())
}

/// Check whether the URL names a WebSocket endpoint
pub fn is_socket_url(url: &str) -> bool {
    matches!(scheme(url).as_deref(), Some("ws") | Some("wss"))
}

/// Rewrite a URL so a socket transport can dial it
///
/// `http` maps to `ws`, `https` to `wss`, and a bare host/path gets the
/// secure default `wss://`.
pub fn upgrade_to_socket_url(url: &str) -> String {
    match scheme(url).as_deref() {
        Some("ws") | Some("wss") => url.to_string(),
        Some("http") => format!("ws://{}", &url["http://".len()..]),
        Some("https") => format!("wss://{}", &url["https://".len()..]),
        _ => format!("wss://{}", url),
    }
}

impl FromStr for ConnectionMode {
    type Err = HyperLinkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "自動変換" => return Ok(ConnectionMode::Auto),
            "常時接続" => return Ok(ConnectionMode::Persistent),
            "直出力" => return Ok(ConnectionMode::OneShot),
            _ => {}
        }
        match s.trim().to_ascii_lowercase().replace(&['-', '_', ' '][..], "").as_str() {
            "auto" => Ok(ConnectionMode::Auto),
            "persistent" | "socket" | "ws" => Ok(ConnectionMode::Persistent),
            "oneshot" | "once" => Ok(ConnectionMode::OneShot),
            _ => Err(HyperLinkError::Configuration(format!("Unknown connection mode: {}", s))),
        }
    }
}

impl FromStr for ErrorMode {
    type Err = HyperLinkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "1. 自動再接続" => return Ok(ErrorMode::AutoReconnect),
            "2. ハットでの対応" => return Ok(ErrorMode::HatOnly),
            _ => {}
        }
        match s.trim().to_ascii_lowercase().replace(&['-', '_', ' '][..], "").as_str() {
            "1" | "autoreconnect" | "reconnect" => Ok(ErrorMode::AutoReconnect),
            "2" | "hatonly" | "hat" | "manual" => Ok(ErrorMode::HatOnly),
            _ => Err(HyperLinkError::Configuration(format!("Unknown error mode: {}", s))),
        }
    }
}

impl fmt::Display for ConnectionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionMode::Auto => write!(f, "auto"),
            ConnectionMode::Persistent => write!(f, "persistent"),
            ConnectionMode::OneShot => write!(f, "oneshot"),
        }
    }
}

impl fmt::Display for ErrorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorMode::AutoReconnect => write!(f, "auto-reconnect"),
            ErrorMode::HatOnly => write!(f, "hat-only"),
        }
    }
}
