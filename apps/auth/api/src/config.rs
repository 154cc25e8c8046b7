use core_config::{
    ConfigError, Environment, FromEnv, env_or_default, env_parse_or_default, env_required,
    server::ServerConfig,
};
use credentials::{CredentialPolicy, UserIdentity};
use std::fmt;

/// Application configuration, composed from the shared config pieces.
#[derive(Clone, Debug)]
pub struct Config {
    pub environment: Environment,
    pub server: ServerConfig,
    pub credentials: CredentialPolicy,
    pub demo_user: DemoUser,
}

impl Config {
    pub fn from_env() -> eyre::Result<Self> {
        let environment = Environment::from_env();
        let server = ServerConfig::from_env()?; // HOST=0.0.0.0, PORT=8080 by default
        let credentials = CredentialPolicy::from_env()?; // JWT_SECRET is required
        let demo_user = DemoUser::from_env()?;

        Ok(Self {
            environment,
            server,
            credentials,
            demo_user,
        })
    }
}

/// The single account the in-memory directory is seeded with.
#[derive(Clone)]
pub struct DemoUser {
    pub identity: UserIdentity,
    pub email: String,
    pub password: String,
}

impl fmt::Debug for DemoUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DemoUser")
            .field("identity", &self.identity)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

impl FromEnv for DemoUser {
    fn from_env() -> Result<Self, ConfigError> {
        let id = env_parse_or_default("DEMO_USER_ID", 1i64)?;
        let password = env_required("DEMO_USER_PASSWORD")?;
        if password.len() < 8 {
            return Err(ConfigError::parse(
                "DEMO_USER_PASSWORD",
                "must be at least 8 characters",
            ));
        }

        Ok(Self {
            identity: UserIdentity::new(
                id,
                env_or_default("DEMO_USER_FIRST_NAME", "Admin"),
                env_or_default("DEMO_USER_LAST_NAME", "User"),
            ),
            email: env_or_default("DEMO_USER_EMAIL", "admin@example.com"),
            password,
        })
    }
}
