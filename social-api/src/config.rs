/// Configuration management for the social API
///
/// Loads configuration from environment variables with development defaults.
/// Production deployments must provide real secrets; placeholder values are
/// rejected when `APP_ENV=production`.
use serde::{Deserialize, Serialize};

const DEV_JWT_SECRET: &str = "dev-secret-change-me";
const DEV_JOB_RUNNER_TOKEN: &str = "dev-job-token-change-me";

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub cors: CorsConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub job_runner: JobRunnerConfig,
}

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application environment (development, staging, production)
    pub env: String,
    pub host: String,
    pub port: u16,
}

/// CORS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    /// Comma-separated list of allowed origins
    pub allowed_origins: String,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

/// JWT validation settings; token issuance lives with the external
/// identity collaborator, we only verify.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub jwt_secret: String,
}

/// Deferred-job runner collaborator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRunnerConfig {
    /// Base URL of the job-runner HTTP API
    pub url: String,
    /// Shared token the runner presents on the internal callback route
    pub callback_token: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, String> {
        let app_env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());
        let is_production = app_env.eq_ignore_ascii_case("production");

        let jwt_secret = match std::env::var("JWT_SECRET") {
            Ok(value) if !value.trim().is_empty() => value,
            _ if is_production => return Err("JWT_SECRET must be set in production".to_string()),
            _ => DEV_JWT_SECRET.to_string(),
        };

        let callback_token = match std::env::var("JOB_RUNNER_CALLBACK_TOKEN") {
            Ok(value) if !value.trim().is_empty() => value,
            _ if is_production => {
                return Err("JOB_RUNNER_CALLBACK_TOKEN must be set in production".to_string())
            }
            _ => DEV_JOB_RUNNER_TOKEN.to_string(),
        };

        let allowed_origins = match std::env::var("CORS_ALLOWED_ORIGINS") {
            Ok(value) => value,
            Err(_) if is_production => {
                return Err("CORS_ALLOWED_ORIGINS must be set in production".to_string())
            }
            Err(_) => "http://localhost:3000".to_string(),
        };
        if is_production && allowed_origins.trim() == "*" {
            return Err("CORS_ALLOWED_ORIGINS cannot be '*' in production".to_string());
        }

        Ok(Config {
            app: AppConfig {
                env: app_env,
                host: std::env::var("SOCIAL_API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: std::env::var("SOCIAL_API_PORT")
                    .ok()
                    .and_then(|p| p.parse().ok())
                    .unwrap_or(8080),
            },
            cors: CorsConfig { allowed_origins },
            database: DatabaseConfig {
                url: std::env::var("DATABASE_URL")
                    .unwrap_or_else(|_| "postgresql://localhost/social_api".to_string()),
                max_connections: std::env::var("DATABASE_MAX_CONNECTIONS")
                    .ok()
                    .and_then(|c| c.parse().ok())
                    .unwrap_or(10),
            },
            auth: AuthConfig { jwt_secret },
            job_runner: JobRunnerConfig {
                url: std::env::var("JOB_RUNNER_URL")
                    .unwrap_or_else(|_| "http://localhost:8090".to_string()),
                callback_token,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Environment variables are process-global; serialize the tests that
    // touch them.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn clear_env() {
        for key in [
            "APP_ENV",
            "JWT_SECRET",
            "JOB_RUNNER_CALLBACK_TOKEN",
            "CORS_ALLOWED_ORIGINS",
            "SOCIAL_API_HOST",
            "SOCIAL_API_PORT",
            "DATABASE_URL",
            "DATABASE_MAX_CONNECTIONS",
            "JOB_RUNNER_URL",
        ] {
            std::env::remove_var(key);
        }
    }

    #[test]
    fn development_defaults_apply() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();

        let config = Config::from_env().expect("defaults should load");
        assert_eq!(config.app.env, "development");
        assert_eq!(config.app.port, 8080);
        assert_eq!(config.database.max_connections, 10);
        assert_eq!(config.auth.jwt_secret, DEV_JWT_SECRET);
    }

    #[test]
    fn production_requires_secrets() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();
        std::env::set_var("APP_ENV", "production");

        let err = Config::from_env().unwrap_err();
        assert!(err.contains("JWT_SECRET"));

        std::env::set_var("JWT_SECRET", "real-secret");
        let err = Config::from_env().unwrap_err();
        assert!(err.contains("JOB_RUNNER_CALLBACK_TOKEN"));

        clear_env();
    }

    #[test]
    fn production_rejects_wildcard_cors() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();
        std::env::set_var("APP_ENV", "production");
        std::env::set_var("JWT_SECRET", "real-secret");
        std::env::set_var("JOB_RUNNER_CALLBACK_TOKEN", "real-token");
        std::env::set_var("CORS_ALLOWED_ORIGINS", "*");

        let err = Config::from_env().unwrap_err();
        assert!(err.contains("CORS_ALLOWED_ORIGINS"));

        clear_env();
    }
}
