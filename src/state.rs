/*
 * Responsibility
 * - Shared context attached to the Router (AppState)
 * - Everything here is read-only after startup; Clone is cheap (Arc inside)
 */
use std::sync::Arc;

use crate::config::Config;
use crate::middleware::cors::CorsOptions;
use crate::services::auth::TokenVerifier;
use crate::services::lang::{LangError, LanguageMatcher};
use crate::services::maintenance::{FlagFileProbe, MaintenanceProbe, NeverInMaintenance};

#[derive(Clone)]
pub struct AppState {
    pub verifier: Arc<TokenVerifier>,
    pub cors: CorsOptions,
    pub languages: LanguageMatcher,
    pub maintenance: Arc<dyn MaintenanceProbe>,
    pub admin_roles: Arc<[String]>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("verifier", &self.verifier)
            .field("cors", &self.cors)
            .field("languages", &self.languages)
            .field("admin_roles", &self.admin_roles)
            .finish_non_exhaustive()
    }
}

impl AppState {
    pub fn from_config(config: &Config) -> Result<Self, LangError> {
        let verifier = TokenVerifier::new(&config.auth_secret_key)
            .with_issuers(&[config.auth_issuer.as_str()]);

        let maintenance: Arc<dyn MaintenanceProbe> = match &config.maintenance_flag_file {
            Some(path) => Arc::new(FlagFileProbe::new(path)),
            None => Arc::new(NeverInMaintenance),
        };

        Ok(Self {
            verifier: Arc::new(verifier),
            cors: config.cors.clone(),
            languages: LanguageMatcher::new(&config.supported_languages[..])?,
            maintenance,
            admin_roles: config.admin_roles.iter().cloned().collect(),
        })
    }
}
