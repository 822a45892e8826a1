// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Environment variable names, generation defaults and the proxy service
//! configuration loaded at startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `DATA_DIR` | Directory holding the key/value database (`GenerationSession::open_default`) | `./data` |
//! | `HOST` | Proxy bind address | `127.0.0.1` |
//! | `PORT` | Proxy bind port | `3000` |
//! | `OPENROUTER_API_KEY` | Upstream credential (proxy only) | Required for generation |
//! | `OPENROUTER_BASE_URL` | Upstream chat-completions endpoint | OpenRouter |
//! | `OPENROUTER_MODEL` | Upstream model identifier | `x-ai/grok-4.1-fast:free` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

/// Environment variable name for the data directory path.
pub const DATA_DIR_ENV: &str = "DATA_DIR";

/// Environment variable name for the proxy bind host.
pub const HOST_ENV: &str = "HOST";

/// Environment variable name for the proxy bind port.
pub const PORT_ENV: &str = "PORT";

/// Environment variable holding the upstream API key.
///
/// Only the proxy reads it; the client-side core never sees credentials.
pub const API_KEY_ENV: &str = "OPENROUTER_API_KEY";

/// Environment variable overriding the upstream endpoint.
pub const BASE_URL_ENV: &str = "OPENROUTER_BASE_URL";

/// Environment variable overriding the upstream model.
pub const MODEL_ENV: &str = "OPENROUTER_MODEL";

/// Environment variable selecting the log output format.
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const DEFAULT_DATA_DIR: &str = "./data";
pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_LOG_FILTER: &str = "info,tower_http=debug";

/// Path of the generation endpoint exposed by the proxy.
pub const GENERATE_PATH: &str = "/api/generate-gifts";

/// Sampling and model defaults for suggestion generation.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationConfig {
    pub model: String,
    /// Temperature for a first generation.
    pub default_temperature: f32,
    /// Higher temperature used when regenerating for more variety.
    pub regenerate_temperature: f32,
    pub max_tokens: u32,
    pub base_url: String,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            model: "x-ai/grok-4.1-fast:free".to_string(),
            default_temperature: 0.7,
            regenerate_temperature: 0.9,
            max_tokens: 1000,
            base_url: "https://openrouter.ai/api/v1/chat/completions".to_string(),
        }
    }
}

/// Configuration of the proxy service.
#[derive(Debug, Clone)]
pub struct ProxyConfig {
    pub host: String,
    pub port: u16,
    /// `None` when the credential is absent; requests then fail with 500.
    pub api_key: Option<String>,
    pub generation: GenerationConfig,
}

impl ProxyConfig {
    pub fn from_env() -> Self {
        let mut generation = GenerationConfig::default();
        if let Some(base_url) = env_optional(BASE_URL_ENV) {
            generation.base_url = base_url;
        }
        if let Some(model) = env_optional(MODEL_ENV) {
            generation.model = model;
        }

        let port = env_optional(PORT_ENV)
            .and_then(|p| p.parse().ok())
            .unwrap_or(DEFAULT_PORT);

        Self {
            host: env_or_default(HOST_ENV, DEFAULT_HOST),
            port,
            api_key: env_optional(API_KEY_ENV),
            generation,
        }
    }
}

pub(crate) fn env_optional(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub(crate) fn env_or_default(name: &str, default: &str) -> String {
    env_optional(name).unwrap_or_else(|| default.to_string())
}
