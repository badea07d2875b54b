#![forbid(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::todo)]
#![warn(clippy::panic)]
#![warn(clippy::dbg_macro)]
#![warn(clippy::print_stdout)]
#![warn(clippy::print_stderr)]
#![warn(clippy::clone_on_ref_ptr)]
#![warn(unreachable_pub)]
#![warn(missing_debug_implementations)]
#![warn(unused_qualifications)]
#![deny(unused_must_use)]

pub mod adapters;
pub mod api;
pub mod config;
pub mod domain;
pub mod error;
pub mod services;
pub mod telemetry;

use crate::adapters::telegram::TelegramConnector;
use crate::api::MgmtState;
use crate::config::Config;
use crate::services::health_service::HealthService;
use crate::services::relay_service::RelayService;
use crate::services::sender::SenderFactory;
use std::sync::Arc;
use tokio::sync::watch;

/// Routers ready to be served.
#[derive(Debug)]
pub struct App {
    pub app_router: axum::Router,
    pub mgmt_router: axum::Router,
}

#[derive(Debug)]
pub struct AppBuilder {
    config: Config,
    sender_factory: Option<Arc<dyn SenderFactory>>,
}

impl AppBuilder {
    #[must_use]
    pub const fn new(config: Config) -> Self {
        Self { config, sender_factory: None }
    }

    /// Replaces the Telegram connector, e.g. with a recording sender in tests.
    #[must_use]
    pub fn with_sender_factory(mut self, factory: Arc<dyn SenderFactory>) -> Self {
        self.sender_factory = Some(factory);
        self
    }

    /// Wires services and routers.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be created or the delivery settings are invalid.
    pub fn build(self) -> anyhow::Result<App> {
        let factory: Arc<dyn SenderFactory> = match self.sender_factory {
            Some(factory) => factory,
            None => Arc::new(TelegramConnector::new(self.config.telegram.clone())?),
        };

        let relay_service = RelayService::new(Arc::clone(&factory), &self.config.delivery)?;
        let health_service = HealthService::new(factory, self.config.health.clone());

        Ok(App {
            app_router: api::app_router(self.config, relay_service),
            mgmt_router: api::mgmt_router(MgmtState { health_service }),
        })
    }
}

/// Routes panics through tracing so they reach the structured log output.
pub fn setup_panic_hook() {
    std::panic::set_hook(Box::new(|info| {
        let location = info.location().map(ToString::to_string).unwrap_or_default();
        let payload = info
            .payload()
            .downcast_ref::<&str>()
            .map(ToString::to_string)
            .or_else(|| info.payload().downcast_ref::<String>().cloned())
            .unwrap_or_default();
        tracing::error!(%location, %payload, "panic occurred");
    }));
}

/// Flips the shutdown flag on SIGINT or SIGTERM.
pub fn spawn_signal_handler(shutdown_tx: watch::Sender<bool>) {
    tokio::spawn(async move {
        let ctrl_c = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            }
        };

        #[cfg(unix)]
        let terminate = async {
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(mut signal) => {
                    signal.recv().await;
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to install SIGTERM handler");
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            () = ctrl_c => {},
            () = terminate => {},
        }

        tracing::info!("Shutdown signal received, draining connections");
        let _ = shutdown_tx.send(true);
    });
}
