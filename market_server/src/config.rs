use std::{env, time::Duration};

use chrono::Duration as ChronoDuration;
use log::*;
use mkt_common::{helpers::parse_boolean_flag, Secret};
use rand::{distributions::Alphanumeric, thread_rng, Rng};
use stripe_tools::StripeConfig;

use crate::errors::ServerError;

const DEFAULT_MKT_HOST: &str = "127.0.0.1";
const DEFAULT_MKT_PORT: u16 = 8360;
const DEFAULT_DATABASE_URL: &str = "sqlite://data/market.db";
const DEFAULT_MAX_CONNECTIONS: u32 = 25;
const DEFAULT_GATEWAY_TIMEOUT: Duration = Duration::from_secs(10);
/// The JWT secret must be at least this long. HS256 keys shorter than the hash output are weak.
const MIN_JWT_SECRET_LENGTH: usize = 32;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub max_connections: u32,
    /// If true, the embedded database migrations are applied at startup.
    pub run_migrations: bool,
    pub auth: AuthConfig,
    /// Upper bound on any single call to the payment gateway.
    pub gateway_timeout: Duration,
    pub stripe: StripeConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_MKT_HOST.to_string(),
            port: DEFAULT_MKT_PORT,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            run_migrations: true,
            auth: AuthConfig::default(),
            gateway_timeout: DEFAULT_GATEWAY_TIMEOUT,
            stripe: StripeConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("MKT_HOST").ok().unwrap_or_else(|| DEFAULT_MKT_HOST.into());
        let port = env::var("MKT_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for MKT_PORT. {e} Using the default, {DEFAULT_MKT_PORT}, instead."
                    );
                    DEFAULT_MKT_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_MKT_PORT);
        let database_url = env::var("MKT_DATABASE_URL").ok().unwrap_or_else(|| {
            warn!("🪛️ MKT_DATABASE_URL is not set. Using the default, {DEFAULT_DATABASE_URL}.");
            DEFAULT_DATABASE_URL.to_string()
        });
        let max_connections = env::var("MKT_DB_MAX_CONNECTIONS")
            .ok()
            .and_then(|s| {
                s.parse::<u32>()
                    .map_err(|e| warn!("🪛️ Invalid configuration value for MKT_DB_MAX_CONNECTIONS. {e}"))
                    .ok()
            })
            .filter(|&n| n > 0)
            .unwrap_or(DEFAULT_MAX_CONNECTIONS);
        let run_migrations = parse_boolean_flag(env::var("MKT_RUN_MIGRATIONS").ok(), true);
        let auth = AuthConfig::try_from_env().unwrap_or_else(|e| {
            warn!(
                "🪛️ Could not load the authentication configuration from environment variables. {e}. Reverting to the \
                 default configuration."
            );
            AuthConfig::default()
        });
        let gateway_timeout = configure_gateway_timeout();
        let mut stripe = StripeConfig::new_from_env_or_default();
        stripe.timeout = gateway_timeout;
        Self { host, port, database_url, max_connections, run_migrations, auth, gateway_timeout, stripe }
    }
}

fn configure_gateway_timeout() -> Duration {
    env::var("MKT_GATEWAY_TIMEOUT")
        .map_err(|_| {
            info!(
                "🪛️ MKT_GATEWAY_TIMEOUT is not set. Using the default value of {} s.",
                DEFAULT_GATEWAY_TIMEOUT.as_secs()
            )
        })
        .and_then(|s| {
            s.parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|e| warn!("🪛️ Invalid configuration value for MKT_GATEWAY_TIMEOUT. {e}"))
        })
        .ok()
        .filter(|d| !d.is_zero())
        .unwrap_or(DEFAULT_GATEWAY_TIMEOUT)
}

//-------------------------------------------------  AuthConfig  -------------------------------------------------------
#[derive(Clone, Debug)]
pub struct AuthConfig {
    /// The HS256 key that identity tokens are signed with.
    pub jwt_secret: Secret<String>,
    /// Allowed clock skew when checking token expiry.
    pub leeway: ChronoDuration,
}

impl Default for AuthConfig {
    fn default() -> Self {
        warn!(
            "🚨️🚨️🚨️ The JWT secret has not been set. I'm using a random value for this session. DO NOT operate on \
             production like this, since no externally issued token will be accepted. 🚨️🚨️🚨️"
        );
        let secret: String = thread_rng().sample_iter(&Alphanumeric).take(64).map(char::from).collect();
        Self { jwt_secret: Secret::new(secret), leeway: ChronoDuration::seconds(60) }
    }
}

impl AuthConfig {
    pub fn new(jwt_secret: &str) -> Self {
        Self { jwt_secret: Secret::new(jwt_secret.to_string()), leeway: ChronoDuration::seconds(60) }
    }

    pub fn try_from_env() -> Result<Self, ServerError> {
        let secret =
            env::var("MKT_JWT_SECRET").map_err(|e| ServerError::ConfigurationError(format!("{e} [MKT_JWT_SECRET]")))?;
        if secret.len() < MIN_JWT_SECRET_LENGTH {
            return Err(ServerError::ConfigurationError(format!(
                "MKT_JWT_SECRET must be at least {MIN_JWT_SECRET_LENGTH} characters long"
            )));
        }
        Ok(Self::new(&secret))
    }
}
