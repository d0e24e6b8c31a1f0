//! HTTP server bootstrap for the clinic records service.
//!
//! This module wires together:
//! - configuration
//! - database connection pool
//! - token codec, authenticator, and request gate
//! - the Axum router

use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::{HeaderValue, Method};
use axum::Router;
use chrono::Duration;
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::AllowOrigin;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

use crate::auth::{token, AuthGateState, AuthService, PublicRoutes, TokenCodec};
use crate::infra::{PatientStore, PgPatientStore};
use crate::metrics::{metric_names, MetricsRegistry};

/// Server configuration.
///
/// Loaded once at startup and treated as immutable for the process
/// lifetime; rotating the signing key means restarting with new
/// configuration, which invalidates all outstanding tokens.
#[derive(Clone)]
pub struct Config {
    /// PostgreSQL connection URL.
    pub database_url: String,
    /// Server listen address.
    pub listen_addr: SocketAddr,
    /// Maximum database connections.
    pub max_connections: u32,
    /// HMAC signing key for bearer tokens.
    pub signing_key: Vec<u8>,
    /// Token validity window.
    pub token_ttl: Duration,
    /// Path prefixes exempt from token inspection.
    pub public_routes: PublicRoutes,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// `JWT_SECRET` is required; everything else has a default.
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "postgres://localhost/clinic_records".to_string());

        let port: u16 = std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8080);

        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());

        let listen_addr: SocketAddr = format!("{host}:{port}")
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid listen address {host}:{port}: {e}"))?;

        let max_connections: u32 = std::env::var("MAX_DB_CONNECTIONS")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(10);

        let secret = std::env::var("JWT_SECRET").map_err(|_| {
            anyhow::anyhow!("JWT_SECRET must be set (at least 32 bytes, raw or hex-encoded)")
        })?;
        let signing_key = decode_signing_secret(&secret);

        let token_ttl_hours: i64 = std::env::var("JWT_TTL_HOURS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(token::DEFAULT_VALIDITY_HOURS);

        let public_routes = PublicRoutes::from_csv(
            &std::env::var("PUBLIC_ROUTE_PREFIXES").unwrap_or_else(|_| "/api/v1/auth".to_string()),
        );

        Ok(Self {
            database_url,
            listen_addr,
            max_connections,
            signing_key,
            token_ttl: Duration::hours(token_ttl_hours),
            public_routes,
        })
    }
}

// The signing key must never reach the logs, so Debug shows only its size.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("database_url", &self.database_url)
            .field("listen_addr", &self.listen_addr)
            .field("max_connections", &self.max_connections)
            .field("signing_key", &format_args!("<{} bytes>", self.signing_key.len()))
            .field("token_ttl", &self.token_ttl)
            .field("public_routes", &self.public_routes)
            .finish()
    }
}

/// Decode the configured signing secret.
///
/// A string that is plausibly a hex encoding of a full-strength key (64+
/// hex digits, even length) is decoded; anything else is used as raw bytes.
fn decode_signing_secret(raw: &str) -> Vec<u8> {
    let trimmed = raw.trim();
    if trimmed.len() >= 64
        && trimmed.len() % 2 == 0
        && trimmed.chars().all(|c| c.is_ascii_hexdigit())
    {
        if let Ok(bytes) = hex::decode(trimmed) {
            return bytes;
        }
    }
    trimmed.as_bytes().to_vec()
}

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn PatientStore>,
    pub auth: AuthService,
    pub metrics: Arc<MetricsRegistry>,
}

/// Start the HTTP server.
pub async fn run() -> anyhow::Result<()> {
    init_tracing();

    info!(
        "Starting clinic records service v{}",
        env!("CARGO_PKG_VERSION")
    );

    // Load configuration
    let config = Config::from_env()?;
    info!("Configuration loaded");
    info!("  Listen address: {}", config.listen_addr);
    info!("  Max connections: {}", config.max_connections);
    info!("  Token validity: {}h", config.token_ttl.num_hours());
    info!("  Public route prefixes: {:?}", config.public_routes.prefixes());

    let codec = Arc::new(TokenCodec::new(&config.signing_key, config.token_ttl)?);

    // Connect to PostgreSQL
    info!("Connecting to PostgreSQL...");
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.database_url)
        .await?;
    info!("Connected to PostgreSQL");

    let store = Arc::new(PgPatientStore::new(pool.clone()));

    let migrate_on_startup = std::env::var("DB_MIGRATE_ON_STARTUP")
        .ok()
        .map(|v| {
            !matches!(
                v.trim().to_ascii_lowercase().as_str(),
                "0" | "false" | "off"
            )
        })
        .unwrap_or(true);
    if migrate_on_startup {
        info!("Initializing database schema...");
        store.initialize().await?;
        info!("Database schema ready");
    } else {
        info!("Schema initialization skipped (DB_MIGRATE_ON_STARTUP=0)");
    }

    let metrics = Arc::new(MetricsRegistry::new());
    metrics
        .set_gauge(metric_names::DB_POOL_SIZE, u64::from(pool.size()))
        .await;

    // Initialize services
    let store: Arc<dyn PatientStore> = store;
    let auth = AuthService::new(store.clone(), codec.clone());

    let gate_state = AuthGateState {
        codec,
        store: store.clone(),
        public_routes: Arc::new(config.public_routes.clone()),
    };

    // Create application state
    let state = AppState {
        store,
        auth,
        metrics,
    };

    // Build router
    let app = build_router(gate_state)?
        .with_state(state)
        .into_make_service_with_connect_info::<SocketAddr>();

    // Start server
    info!("Starting HTTP server on {}", config.listen_addr);
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;

    info!("Clinic records service is ready to accept connections");
    axum::serve(listener, app).await?;

    Ok(())
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(Level::INFO.to_string()));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();
}

fn build_router(gate_state: AuthGateState) -> anyhow::Result<Router<AppState>> {
    let api = crate::api::router().layer(axum::middleware::from_fn_with_state(
        gate_state,
        crate::auth::auth_gate,
    ));

    let mut router = Router::new()
        .merge(crate::api::ops_router())
        .nest("/api", api)
        .layer(TraceLayer::new_for_http());

    if let Some(cors_layer) = cors_layer_from_env()? {
        router = router.layer(cors_layer);
    }

    Ok(router)
}

fn cors_layer_from_env() -> anyhow::Result<Option<CorsLayer>> {
    let origins = match std::env::var("CORS_ALLOW_ORIGINS") {
        Ok(v) => v,
        Err(_) => return Ok(None),
    };

    let origins = origins.trim();
    if origins.is_empty() {
        return Ok(None);
    }

    let allow_origin = if origins == "*" {
        AllowOrigin::any()
    } else {
        let origins: Vec<HeaderValue> = origins
            .split(',')
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(|s| {
                s.parse::<HeaderValue>()
                    .map_err(|e| anyhow::anyhow!("Invalid CORS origin {s:?}: {e}"))
            })
            .collect::<anyhow::Result<_>>()?;
        AllowOrigin::list(origins)
    };

    Ok(Some(
        CorsLayer::new()
            .allow_origin(allow_origin)
            .allow_methods([Method::GET, Method::POST, Method::PATCH])
            .allow_headers([
                axum::http::header::AUTHORIZATION,
                axum::http::header::CONTENT_TYPE,
            ]),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_secret_is_decoded() {
        let hex_key = "00112233445566778899aabbccddeeff00112233445566778899aabbccddeeff";
        let decoded = decode_signing_secret(hex_key);
        assert_eq!(decoded.len(), 32);
        assert_eq!(decoded[0], 0x00);
        assert_eq!(decoded[1], 0x11);
    }

    #[test]
    fn test_raw_secret_is_kept_verbatim() {
        // Hex-looking but too short to be an encoded key.
        assert_eq!(decode_signing_secret("abcdef"), b"abcdef");
        // Long enough but not hex.
        let raw = "this-is-a-perfectly-fine-raw-secret-with-enough-bytes-in-it!!!!!";
        assert_eq!(decode_signing_secret(raw), raw.as_bytes());
    }

    #[test]
    fn test_config_debug_redacts_signing_key() {
        let config = Config {
            database_url: "postgres://localhost/clinic_records".to_string(),
            listen_addr: "127.0.0.1:8080".parse().unwrap(),
            max_connections: 10,
            signing_key: b"0123456789abcdef0123456789abcdef".to_vec(),
            token_ttl: Duration::hours(24),
            public_routes: PublicRoutes::new(["/api/v1/auth"]),
        };

        let debug = format!("{config:?}");
        assert!(debug.contains("<32 bytes>"));
        assert!(!debug.contains("0123456789abcdef"));
    }
}
