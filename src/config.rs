//! Configuration management for Folio Server

use std::env;
use std::path::PathBuf;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub catalog: CatalogConfig,
    pub auth: AuthConfig,
    pub render: RenderConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CatalogConfig {
    /// Root directory holding uploaded document bytes.
    pub assets_dir: PathBuf,
    /// JSON manifest describing the documents served by this instance.
    /// Written by the book-management layer; read-only here.
    pub manifest: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    pub jwt_secret: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RenderConfig {
    /// Wall-clock bound on a single sandboxed render.
    pub timeout_secs: u64,
    /// Upper bound on concurrently live render sandboxes.
    pub max_concurrent: usize,
    /// Page numbers above this clamp down to it.
    pub max_page: i64,
    /// Logical render scale applied to the page.
    pub scale: f32,
    /// Device pixel ratio multiplier on top of `scale`.
    pub device_scale: f32,
    /// Path to the page-worker binary. When unset, a sibling of the server
    /// executable named `page-worker` is used.
    pub worker_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 5000,
            },
            catalog: CatalogConfig {
                assets_dir: PathBuf::from("./public/static"),
                manifest: Some(PathBuf::from("./public/catalog.json")),
            },
            auth: AuthConfig {
                jwt_secret: "dev_secret".to_string(),
            },
            render: RenderConfig::default(),
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        RenderConfig {
            timeout_secs: 15,
            max_concurrent: 4,
            max_page: 50,
            scale: 1.8,
            device_scale: 2.0,
            worker_path: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, env::VarError> {
        let defaults = RenderConfig::default();
        Ok(Config {
            server: ServerConfig {
                host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: env::var("SERVER_PORT")
                    .unwrap_or_else(|_| "5000".to_string())
                    .parse()
                    .unwrap_or(5000),
            },
            catalog: CatalogConfig {
                assets_dir: env::var("ASSETS_DIR")
                    .map(PathBuf::from)
                    .unwrap_or_else(|_| PathBuf::from("./public/static")),
                manifest: env::var("CATALOG_MANIFEST").ok().map(PathBuf::from),
            },
            auth: AuthConfig {
                jwt_secret: env::var("JWT_SECRET").unwrap_or_else(|_| "dev_secret".to_string()),
            },
            render: RenderConfig {
                timeout_secs: parse_env("RENDER_TIMEOUT_SECS", defaults.timeout_secs),
                max_concurrent: parse_env("RENDER_MAX_CONCURRENT", defaults.max_concurrent),
                max_page: parse_env("RENDER_MAX_PAGE", defaults.max_page),
                scale: parse_env("RENDER_SCALE", defaults.scale),
                device_scale: parse_env("RENDER_DEVICE_SCALE", defaults.device_scale),
                worker_path: env::var("PAGE_WORKER_PATH").ok().map(PathBuf::from),
            },
        })
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_render_geometry() {
        let config = Config::default();
        assert_eq!(config.render.timeout_secs, 15);
        assert_eq!(config.render.max_page, 50);
        assert_eq!(config.render.scale, 1.8);
        assert_eq!(config.render.device_scale, 2.0);
        assert_eq!(config.render.max_concurrent, 4);
    }

    #[test]
    fn default_secret_is_dev_secret() {
        assert_eq!(Config::default().auth.jwt_secret, "dev_secret");
    }
}
