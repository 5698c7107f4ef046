// ============================================================================
// Configuration : Config
// ============================================================================
// Paramètres de l'application lus depuis l'environnement
//
// Variables reconnues :
// - QFOLIO_API_URL : URL de base de l'API d'optimisation
// - QFOLIO_PRODUCTION=1 : utilise l'API hébergée au lieu de localhost
// ============================================================================

use std::time::Duration;

/// URL de l'API en développement local
pub const LOCAL_API_URL: &str = "http://localhost:8000";

/// URL de l'API hébergée
pub const PRODUCTION_API_URL: &str = "https://quantum-portfolio-api.onrender.com";

/// Configuration de l'application
#[derive(Debug, Clone)]
pub struct Config {
    /// URL de base de l'API (sans slash final)
    pub api_url: String,

    /// Taille de portefeuille par défaut (k)
    pub default_k: u32,

    /// Aversion au risque par défaut (lambda, 0 = rendement max, 1 = risque min)
    pub default_lambda: f64,

    /// Profondeur du circuit QAOA par défaut (p)
    pub default_p: u32,

    /// Nombre d'itérations de l'optimiseur par défaut
    pub default_iterations: u32,

    /// Nombre de mesures (shots) par défaut
    pub default_shots: u32,

    /// Durée d'affichage d'un message d'erreur avant disparition
    pub toast_duration: Duration,

    /// Timeout des requêtes HTTP (l'optimisation peut être longue)
    pub request_timeout: Duration,
}

impl Config {
    /// Construit la configuration depuis les variables d'environnement
    ///
    /// CONCEPT : Priorité des sources
    /// - QFOLIO_API_URL gagne toujours
    /// - Sinon QFOLIO_PRODUCTION=1 sélectionne l'API hébergée
    /// - Sinon localhost
    pub fn from_env() -> Self {
        let explicit = std::env::var("QFOLIO_API_URL").ok();
        let production = std::env::var("QFOLIO_PRODUCTION")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        Self::default().with_api_url(resolve_api_url(explicit.as_deref(), production))
    }

    /// Remplace l'URL de l'API
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into().trim_end_matches('/').to_string();
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: LOCAL_API_URL.to_string(),
            default_k: 3,
            default_lambda: 0.5,
            default_p: 1,
            default_iterations: 50,
            default_shots: 1024,
            toast_duration: Duration::from_secs(5),
            request_timeout: Duration::from_secs(120),
        }
    }
}

/// Choisit l'URL de l'API selon les variables lues
fn resolve_api_url(explicit: Option<&str>, production: bool) -> String {
    match explicit.map(str::trim) {
        Some(url) if !url.is_empty() => url.to_string(),
        _ if production => PRODUCTION_API_URL.to_string(),
        _ => LOCAL_API_URL.to_string(),
    }
}
