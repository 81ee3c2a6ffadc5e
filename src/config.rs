/*
 * Responsibility
 * - Load settings from the environment (.env via dotenvy): secret key, CORS policy,
 *   supported languages, protected roles, maintenance flag source
 * - Validate them (missing or invalid values fail startup)
 */
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::middleware::cors::{CorsConfigError, CorsOptions};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    fn parse(raw: Option<&str>) -> Self {
        match raw.unwrap_or("development").to_ascii_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing configuration: {0}")]
    Missing(&'static str),
    #[error("invalid configuration: {0}")]
    Invalid(&'static str),
    #[error("invalid CORS configuration: {0}")]
    Cors(#[from] CorsConfigError),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub app_env: AppEnv,

    pub auth_secret_key: String,
    pub auth_issuer: String,

    pub cors: CorsOptions,
    pub supported_languages: Vec<String>,
    pub admin_roles: Vec<String>,
    pub maintenance_flag_file: Option<PathBuf>,

    pub request_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. `from_env` uses the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port: u16 = parse_or(&lookup, "PORT", 3000)?;
        let addr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let app_env = AppEnv::parse(lookup("APP_ENV").as_deref());

        let auth_secret_key = lookup("AUTH_SECRET_KEY")
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::Missing("AUTH_SECRET_KEY"))?;
        let auth_issuer = lookup("AUTH_ISSUER").unwrap_or_else(|| "gatehouse".to_string());

        let cors = CorsOptions {
            origins: list_or(&lookup, "CORS_ALLOWED_ORIGINS", ""),
            methods: list_or(&lookup, "CORS_ALLOWED_METHODS", "GET,POST,PUT,PATCH,DELETE"),
            headers: list_or(
                &lookup,
                "CORS_ALLOWED_HEADERS",
                "Authorization,Content-Type,Accept",
            ),
            allow_credentials: flag_or(&lookup, "CORS_ALLOW_CREDENTIALS", false)?,
            max_age: parse_or(&lookup, "CORS_MAX_AGE_SECONDS", 600)?,
            permissive: flag_or(&lookup, "CORS_PERMISSIVE", true)?,
            strict_headers: flag_or(&lookup, "CORS_STRICT_HEADERS", false)?,
        };
        cors.validate()?;

        let supported_languages = list_or(&lookup, "SUPPORTED_LANGUAGES", "en");
        let admin_roles = list_or(&lookup, "ADMIN_ROLES", "admin");
        let maintenance_flag_file = lookup("MAINTENANCE_FLAG_FILE")
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from);

        let request_timeout =
            Duration::from_secs(parse_or(&lookup, "REQUEST_TIMEOUT_SECONDS", 30)?);

        Ok(Self {
            addr,
            app_env,
            auth_secret_key,
            auth_issuer,
            cors,
            supported_languages,
            admin_roles,
            maintenance_flag_file,
            request_timeout,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => {
            raw.trim().parse().map_err(|_| ConfigError::Invalid(key))
        }
        _ => Ok(default),
    }
}

fn flag_or<F>(lookup: &F, key: &'static str, default: bool) -> Result<bool, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key).map(|v| v.trim().to_ascii_lowercase()) {
        None => Ok(default),
        Some(v) => match v.as_str() {
            "" => Ok(default),
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::Invalid(key)),
        },
    }
}

// comma-separated, blanks dropped
fn list_or<F>(lookup: &F, key: &str, default: &str) -> Vec<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .unwrap_or_else(|| default.to_string())
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn defaults() {
        let c = config(&[("AUTH_SECRET_KEY", "s3cret")]).unwrap();

        assert_eq!(c.addr.port(), 3000);
        assert_eq!(c.app_env, AppEnv::Development);
        assert_eq!(c.auth_issuer, "gatehouse");
        assert!(c.cors.origins.is_empty());
        assert!(c.cors.permissive);
        assert!(!c.cors.allow_credentials);
        assert_eq!(c.cors.max_age, 600);
        assert_eq!(c.cors.methods, ["GET", "POST", "PUT", "PATCH", "DELETE"]);
        assert_eq!(c.supported_languages, ["en"]);
        assert_eq!(c.admin_roles, ["admin"]);
        assert!(c.maintenance_flag_file.is_none());
        assert_eq!(c.request_timeout, Duration::from_secs(30));
    }

    #[test]
    fn secret_key_is_required() {
        assert!(matches!(
            config(&[]),
            Err(ConfigError::Missing("AUTH_SECRET_KEY"))
        ));
        assert!(matches!(
            config(&[("AUTH_SECRET_KEY", "")]),
            Err(ConfigError::Missing("AUTH_SECRET_KEY"))
        ));
    }

    #[test]
    fn lists_are_trimmed() {
        let c = config(&[
            ("AUTH_SECRET_KEY", "s3cret"),
            ("CORS_ALLOWED_ORIGINS", " https://a.example , ,https://b.example"),
            ("SUPPORTED_LANGUAGES", "en-US, fa-IR"),
            ("ADMIN_ROLES", "admin,ops"),
        ])
        .unwrap();

        assert_eq!(c.cors.origins, ["https://a.example", "https://b.example"]);
        assert_eq!(c.supported_languages, ["en-US", "fa-IR"]);
        assert_eq!(c.admin_roles, ["admin", "ops"]);
    }

    #[test]
    fn invalid_values_fail() {
        assert!(matches!(
            config(&[("AUTH_SECRET_KEY", "s"), ("PORT", "http")]),
            Err(ConfigError::Invalid("PORT"))
        ));
        assert!(matches!(
            config(&[("AUTH_SECRET_KEY", "s"), ("CORS_PERMISSIVE", "maybe")]),
            Err(ConfigError::Invalid("CORS_PERMISSIVE"))
        ));
        assert!(matches!(
            config(&[("AUTH_SECRET_KEY", "s"), ("CORS_ALLOWED_ORIGINS", "example.com")]),
            Err(ConfigError::Cors(_))
        ));
    }

    #[test]
    fn production_env() {
        let c = config(&[("AUTH_SECRET_KEY", "s"), ("APP_ENV", "PROD")]).unwrap();
        assert!(c.app_env.is_production());
    }
}
