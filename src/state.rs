//! Application state management

use std::sync::Arc;
use std::time::Duration;

use crate::auth::IdentityVerifier;
use crate::catalog::Catalog;
use crate::config::Config;
use crate::events::EventBus;
use crate::render::sandbox::SandboxPool;
use crate::render::{RenderOptions, Renderer};
use crate::storage::AssetStore;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: Config,
    catalog: Catalog,
    assets: AssetStore,
    verifier: IdentityVerifier,
    renderer: Renderer,
    events: EventBus,
}

impl AppState {
    pub fn new(config: Config, catalog: Catalog) -> Self {
        let worker = config
            .render
            .worker_path
            .clone()
            .unwrap_or_else(SandboxPool::default_worker_path);
        let pool = SandboxPool::new(
            worker,
            Duration::from_secs(config.render.timeout_secs),
            config.render.max_concurrent,
        );
        let renderer = Renderer::new(
            pool,
            RenderOptions {
                scale: config.render.scale,
                device_scale: config.render.device_scale,
            },
        );
        let assets = AssetStore::new(config.catalog.assets_dir.clone());
        let verifier = IdentityVerifier::new(&config.auth.jwt_secret);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                catalog,
                assets,
                verifier,
                renderer,
                events: EventBus::default(),
            }),
        }
    }

    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    pub fn catalog(&self) -> &Catalog {
        &self.inner.catalog
    }

    pub fn assets(&self) -> &AssetStore {
        &self.inner.assets
    }

    pub fn verifier(&self) -> &IdentityVerifier {
        &self.inner.verifier
    }

    pub fn renderer(&self) -> &Renderer {
        &self.inner.renderer
    }

    pub fn events(&self) -> &EventBus {
        &self.inner.events
    }
}
