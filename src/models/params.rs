// ============================================================================
// Paramètres d'optimisation
// ============================================================================
// Valeurs réglables par l'utilisateur avant d'envoyer la requête
//
// Les bornes sont celles qu'accepte l'API :
// - k (taille du portefeuille) : 2..=10
// - lambda (aversion au risque) : 0.0..=1.0
// - p (profondeur QAOA) : 1..=3
// - maxiter : 10..=200
// - shots : 256..=4096
// ============================================================================

use crate::config::Config;

pub const MIN_PORTFOLIO_SIZE: u32 = 2;
pub const MAX_PORTFOLIO_SIZE: u32 = 10;
pub const MIN_QAOA_DEPTH: u32 = 1;
pub const MAX_QAOA_DEPTH: u32 = 3;
pub const MIN_ITERATIONS: u32 = 10;
pub const MAX_ITERATIONS: u32 = 200;
pub const ITERATIONS_STEP: u32 = 10;
pub const MIN_SHOTS: u32 = 256;
pub const MAX_SHOTS: u32 = 4096;

/// Pas du curseur d'aversion au risque (en centièmes)
pub const RISK_STEP: u32 = 5;

/// Paramètre actuellement focalisé dans le panneau de réglages
///
/// CONCEPT : Cycle d'états
/// - PortfolioSize → RiskAversion → QaoaDepth → MaxIterations → Shots → PortfolioSize
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Param {
    PortfolioSize,
    RiskAversion,
    QaoaDepth,
    MaxIterations,
    Shots,
}

impl Param {
    /// Tous les paramètres dans l'ordre d'affichage
    pub const ALL: [Param; 5] = [
        Param::PortfolioSize,
        Param::RiskAversion,
        Param::QaoaDepth,
        Param::MaxIterations,
        Param::Shots,
    ];

    /// Libellé affiché dans le panneau
    pub fn label(&self) -> &'static str {
        match self {
            Param::PortfolioSize => "Portfolio size (k)",
            Param::RiskAversion => "Risk aversion (λ)",
            Param::QaoaDepth => "QAOA depth (p)",
            Param::MaxIterations => "Max iterations",
            Param::Shots => "Shots",
        }
    }

    /// Paramètre suivant (cycle)
    pub fn next(&self) -> Param {
        match self {
            Param::PortfolioSize => Param::RiskAversion,
            Param::RiskAversion => Param::QaoaDepth,
            Param::QaoaDepth => Param::MaxIterations,
            Param::MaxIterations => Param::Shots,
            Param::Shots => Param::PortfolioSize, // Boucle
        }
    }

    /// Paramètre précédent (cycle)
    pub fn previous(&self) -> Param {
        match self {
            Param::PortfolioSize => Param::Shots, // Boucle
            Param::RiskAversion => Param::PortfolioSize,
            Param::QaoaDepth => Param::RiskAversion,
            Param::MaxIterations => Param::QaoaDepth,
            Param::Shots => Param::MaxIterations,
        }
    }
}

impl Default for Param {
    fn default() -> Self {
        Param::PortfolioSize
    }
}

/// Réglages de l'optimisation
#[derive(Debug, Clone, PartialEq)]
pub struct OptimizationParams {
    /// Nombre d'actions à retenir (k)
    pub portfolio_size: u32,

    /// Aversion au risque en centièmes (0..=100), comme un slider
    /// CONCEPT : Entier plutôt que f64
    /// - Évite l'accumulation d'erreurs d'arrondi à chaque pas
    pub risk_percent: u32,

    /// Profondeur du circuit QAOA (p)
    pub qaoa_depth: u32,

    /// Itérations maximales de l'optimiseur classique
    pub max_iterations: u32,

    /// Nombre de mesures du circuit
    pub shots: u32,
}

impl OptimizationParams {
    /// Crée les réglages à partir des valeurs par défaut de la config
    pub fn from_config(config: &Config) -> Self {
        Self {
            portfolio_size: config.default_k.clamp(MIN_PORTFOLIO_SIZE, MAX_PORTFOLIO_SIZE),
            risk_percent: (config.default_lambda.clamp(0.0, 1.0) * 100.0).round() as u32,
            qaoa_depth: config.default_p.clamp(MIN_QAOA_DEPTH, MAX_QAOA_DEPTH),
            max_iterations: config.default_iterations.clamp(MIN_ITERATIONS, MAX_ITERATIONS),
            shots: config.default_shots.clamp(MIN_SHOTS, MAX_SHOTS),
        }
    }

    /// Lambda envoyé à l'API
    pub fn risk_aversion(&self) -> f64 {
        self.risk_percent as f64 / 100.0
    }

    /// Augmente le paramètre donné d'un pas (borné)
    pub fn increase(&mut self, param: Param) {
        match param {
            Param::PortfolioSize => {
                self.portfolio_size = (self.portfolio_size + 1).min(MAX_PORTFOLIO_SIZE);
            }
            Param::RiskAversion => {
                self.risk_percent = (self.risk_percent + RISK_STEP).min(100);
            }
            Param::QaoaDepth => {
                self.qaoa_depth = (self.qaoa_depth + 1).min(MAX_QAOA_DEPTH);
            }
            Param::MaxIterations => {
                self.max_iterations = (self.max_iterations + ITERATIONS_STEP).min(MAX_ITERATIONS);
            }
            Param::Shots => {
                self.shots = (self.shots * 2).min(MAX_SHOTS);
            }
        }
    }

    /// Diminue le paramètre donné d'un pas (borné)
    pub fn decrease(&mut self, param: Param) {
        match param {
            Param::PortfolioSize => {
                self.portfolio_size = self.portfolio_size.saturating_sub(1).max(MIN_PORTFOLIO_SIZE);
            }
            Param::RiskAversion => {
                self.risk_percent = self.risk_percent.saturating_sub(RISK_STEP);
            }
            Param::QaoaDepth => {
                self.qaoa_depth = self.qaoa_depth.saturating_sub(1).max(MIN_QAOA_DEPTH);
            }
            Param::MaxIterations => {
                self.max_iterations = self
                    .max_iterations
                    .saturating_sub(ITERATIONS_STEP)
                    .max(MIN_ITERATIONS);
            }
            Param::Shots => {
                self.shots = (self.shots / 2).max(MIN_SHOTS);
            }
        }
    }

    /// Valeur formatée d'un paramètre pour l'affichage
    pub fn display_value(&self, param: Param) -> String {
        match param {
            Param::PortfolioSize => self.portfolio_size.to_string(),
            Param::RiskAversion => format!("{:.2}", self.risk_aversion()),
            Param::QaoaDepth => self.qaoa_depth.to_string(),
            Param::MaxIterations => self.max_iterations.to_string(),
            Param::Shots => self.shots.to_string(),
        }
    }
}

impl Default for OptimizationParams {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_config() {
        let params = OptimizationParams::default();
        assert_eq!(params.portfolio_size, 3);
        assert_eq!(params.risk_percent, 50);
        assert_eq!(params.qaoa_depth, 1);
        assert_eq!(params.max_iterations, 50);
        assert_eq!(params.shots, 1024);
        assert_eq!(params.display_value(Param::RiskAversion), "0.50");
    }

    #[test]
    fn test_adjustments_are_clamped() {
        let mut params = OptimizationParams::default();

        for _ in 0..20 {
            params.increase(Param::PortfolioSize);
            params.increase(Param::RiskAversion);
            params.increase(Param::QaoaDepth);
            params.increase(Param::MaxIterations);
            params.increase(Param::Shots);
        }
        assert_eq!(params.portfolio_size, MAX_PORTFOLIO_SIZE);
        assert_eq!(params.risk_percent, 100);
        assert_eq!(params.qaoa_depth, MAX_QAOA_DEPTH);
        assert_eq!(params.max_iterations, MAX_ITERATIONS);
        assert_eq!(params.shots, MAX_SHOTS);

        for _ in 0..40 {
            params.decrease(Param::PortfolioSize);
            params.decrease(Param::RiskAversion);
            params.decrease(Param::QaoaDepth);
            params.decrease(Param::MaxIterations);
            params.decrease(Param::Shots);
        }
        assert_eq!(params.portfolio_size, MIN_PORTFOLIO_SIZE);
        assert_eq!(params.risk_percent, 0);
        assert_eq!(params.qaoa_depth, MIN_QAOA_DEPTH);
        assert_eq!(params.max_iterations, MIN_ITERATIONS);
        assert_eq!(params.shots, MIN_SHOTS);
    }

    #[test]
    fn test_risk_step() {
        let mut params = OptimizationParams::default();
        params.increase(Param::RiskAversion);
        assert_eq!(params.display_value(Param::RiskAversion), "0.55");
        assert!((params.risk_aversion() - 0.55).abs() < 1e-9);
    }

    #[test]
    fn test_param_cycle() {
        let mut param = Param::default();
        for _ in 0..Param::ALL.len() {
            param = param.next();
        }
        assert_eq!(param, Param::PortfolioSize);
        assert_eq!(Param::PortfolioSize.previous(), Param::Shots);
    }
}
