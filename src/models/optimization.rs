// ============================================================================
// Optimisation : requête, réponse et validation
// ============================================================================
// Structures échangées avec POST /api/optimize
//
// CONCEPTS RUST :
// 1. Serde : les noms de champs matchent exactement le JSON de l'API
// 2. thiserror : erreurs de validation typées avec messages lisibles
// 3. Désérialisation custom : accepter bool OU nombre pour "selected"
// ============================================================================

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::models::OptimizationParams;

/// Nombre minimum d'actions à sélectionner avant d'optimiser
pub const MIN_SELECTED_STOCKS: usize = 3;

/// Nombre maximum d'actions accepté par l'API
pub const MAX_SELECTED_STOCKS: usize = 15;

/// Corps JSON envoyé à l'API
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptimizationRequest {
    pub stocks: Vec<String>,
    pub k: u32,
    pub lambda_param: f64,
    pub p: u32,
    pub maxiter: u32,
    pub shots: u32,
}

/// Erreurs de validation avant l'envoi de la requête
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    #[error("Please select at least 3 stocks")]
    TooFewStocks { selected: usize },

    #[error("Please select at most 15 stocks (currently {selected})")]
    TooManyStocks { selected: usize },

    #[error("Portfolio size ({k}) cannot exceed selected stocks ({selected})")]
    PortfolioTooLarge { k: u32, selected: usize },
}

impl OptimizationRequest {
    /// Construit la requête après validation de la sélection
    ///
    /// CONCEPT RUST : Result<T, E> avec erreur typée
    /// - Ok(request) : prête à envoyer
    /// - Err(SelectionError) : message à afficher dans le toast
    pub fn build(selected: &[String], params: &OptimizationParams) -> Result<Self, SelectionError> {
        let count = selected.len();

        if count < MIN_SELECTED_STOCKS {
            return Err(SelectionError::TooFewStocks { selected: count });
        }

        if count > MAX_SELECTED_STOCKS {
            return Err(SelectionError::TooManyStocks { selected: count });
        }

        if params.portfolio_size as usize > count {
            return Err(SelectionError::PortfolioTooLarge {
                k: params.portfolio_size,
                selected: count,
            });
        }

        Ok(Self {
            stocks: selected.to_vec(),
            k: params.portfolio_size,
            lambda_param: params.risk_aversion(),
            p: params.qaoa_depth,
            maxiter: params.max_iterations,
            shots: params.shots,
        })
    }
}

/// Portefeuille retenu par l'optimiseur
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PortfolioResult {
    pub selected_stocks: Vec<String>,
    #[serde(default)]
    pub num_selected: usize,
    pub expected_return: f64,
    pub portfolio_risk: f64,
    pub sharpe_ratio: f64,
    pub weights: Vec<f64>,
}

impl PortfolioResult {
    /// Associe chaque action retenue à son poids
    ///
    /// Un poids manquant est affiché comme 0
    pub fn allocations(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.selected_stocks
            .iter()
            .enumerate()
            .map(|(i, ticker)| (ticker.as_str(), self.weights.get(i).copied().unwrap_or(0.0)))
    }
}

/// Métriques du circuit QAOA
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct QaoaMetrics {
    pub num_qubits: u32,
    pub circuit_depth: u32,
    pub qaoa_layers: u32,
    pub iterations: u32,
    #[serde(default)]
    pub optimal_cost: f64,
}

/// Métriques individuelles d'une action candidate
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StockMetric {
    pub expected_return: f64,
    pub volatility: f64,
    #[serde(default, deserialize_with = "bool_or_number")]
    pub selected: bool,
}

/// Réponse complète de POST /api/optimize
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OptimizationResponse {
    #[serde(default)]
    pub success: bool,
    pub portfolio: PortfolioResult,
    pub qaoa_metrics: QaoaMetrics,
    /// CONCEPT : BTreeMap
    /// - Ordre alphabétique stable d'un rendu à l'autre
    pub stock_metrics: BTreeMap<String, StockMetric>,
    pub computation_time: f64,
}

/// Corps d'erreur renvoyé par l'API (FastAPI : {"detail": "..."})
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    pub detail: Option<serde_json::Value>,
}

impl ApiErrorBody {
    /// Message lisible extrait du champ detail
    ///
    /// CONCEPT : detail peut être une string ou une liste d'erreurs de validation
    pub fn message(&self) -> Option<String> {
        match self.detail.as_ref()? {
            serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
            serde_json::Value::Null => None,
            serde_json::Value::Array(items) => {
                let messages: Vec<String> = items
                    .iter()
                    .filter_map(|item| item.get("msg").and_then(|m| m.as_str()))
                    .map(str::to_string)
                    .collect();
                if messages.is_empty() {
                    None
                } else {
                    Some(messages.join("; "))
                }
            }
            other => Some(other.to_string()),
        }
    }
}

/// État de santé de l'API (GET /health)
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub version: String,
    pub quantum_ready: bool,
}

/// Métriques historiques d'une action (GET /api/stocks/{ticker}/metrics)
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TickerMetrics {
    pub ticker: String,
    pub expected_return: f64,
    pub volatility: f64,
    pub sharpe_ratio: f64,
}

/// Accepte `true`/`false` ou `1.0`/`0.0` (l'API peut coercer le bool en float)
fn bool_or_number<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum BoolOrNumber {
        Bool(bool),
        Number(f64),
    }

    Ok(match BoolOrNumber::deserialize(deserializer)? {
        BoolOrNumber::Bool(b) => b,
        BoolOrNumber::Number(n) => n != 0.0,
    })
}

// ============================================================================
// Formatage des valeurs pour l'affichage
// ============================================================================

/// Fraction → pourcentage à 2 décimales (0.1834 → "18.34%")
pub fn format_percent(value: f64) -> String {
    format!("{:.2}%", value * 100.0)
}

/// Poids → pourcentage à 1 décimale (0.333 → "33.3%")
pub fn format_weight(value: f64) -> String {
    format!("{:.1}%", value * 100.0)
}

/// Ratio de Sharpe à 3 décimales
pub fn format_sharpe(value: f64) -> String {
    format!("{:.3}", value)
}

/// Durée de calcul en secondes
pub fn format_duration(seconds: f64) -> String {
    format!("⏱ {:.2}s", seconds)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RESPONSE: &str = r#"{
        "success": true,
        "portfolio": {
            "selected_stocks": ["RELIANCE", "TCS", "INFY"],
            "num_selected": 3,
            "expected_return": 0.18,
            "portfolio_risk": 0.22,
            "sharpe_ratio": 0.82,
            "weights": [0.333, 0.333, 0.334]
        },
        "qaoa_metrics": {
            "num_qubits": 5,
            "circuit_depth": 15,
            "qaoa_layers": 1,
            "iterations": 50,
            "optimal_cost": -0.45
        },
        "stock_metrics": {
            "TCS": {"expected_return": 0.18, "volatility": 0.22, "selected": 1.0},
            "HDFCBANK": {"expected_return": 0.12, "volatility": 0.19, "selected": false},
            "RELIANCE": {"expected_return": 0.15, "volatility": 0.25, "selected": true}
        },
        "computation_time": 2.5
    }"#;

    fn tickers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_build_rejects_small_selection() {
        let params = OptimizationParams::default();
        let err = OptimizationRequest::build(&tickers(&["TCS", "INFY"]), &params).unwrap_err();
        assert_eq!(err, SelectionError::TooFewStocks { selected: 2 });
        assert_eq!(err.to_string(), "Please select at least 3 stocks");
    }

    #[test]
    fn test_build_rejects_large_k() {
        let mut params = OptimizationParams::default();
        params.portfolio_size = 5;
        let err = OptimizationRequest::build(&tickers(&["TCS", "INFY", "LT"]), &params).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Portfolio size (5) cannot exceed selected stocks (3)"
        );
    }

    #[test]
    fn test_build_rejects_too_many_stocks() {
        let params = OptimizationParams::default();
        let many: Vec<String> = (0..16).map(|i| format!("S{}", i)).collect();
        let err = OptimizationRequest::build(&many, &params).unwrap_err();
        assert_eq!(err, SelectionError::TooManyStocks { selected: 16 });
    }

    #[test]
    fn test_build_request_json() {
        let params = OptimizationParams::default();
        let request =
            OptimizationRequest::build(&tickers(&["RELIANCE", "TCS", "INFY"]), &params).unwrap();

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["stocks"][0], "RELIANCE");
        assert_eq!(json["k"], 3);
        assert_eq!(json["lambda_param"], 0.5);
        assert_eq!(json["p"], 1);
        assert_eq!(json["maxiter"], 50);
        assert_eq!(json["shots"], 1024);
    }

    #[test]
    fn test_parse_response() {
        let response: OptimizationResponse = serde_json::from_str(SAMPLE_RESPONSE).unwrap();
        assert!(response.success);
        assert_eq!(response.qaoa_metrics.num_qubits, 5);
        assert!(response.stock_metrics["TCS"].selected);
        assert!(!response.stock_metrics["HDFCBANK"].selected);

        // BTreeMap : ordre alphabétique
        let order: Vec<&str> = response.stock_metrics.keys().map(String::as_str).collect();
        assert_eq!(order, vec!["HDFCBANK", "RELIANCE", "TCS"]);

        let allocations: Vec<(&str, f64)> = response.portfolio.allocations().collect();
        assert_eq!(allocations[2], ("INFY", 0.334));
    }

    #[test]
    fn test_error_body_message() {
        let body: ApiErrorBody =
            serde_json::from_str(r#"{"detail": "Invalid stock tickers: ['FOO']"}"#).unwrap();
        assert_eq!(body.message().as_deref(), Some("Invalid stock tickers: ['FOO']"));

        let body: ApiErrorBody = serde_json::from_str(
            r#"{"detail": [{"loc": ["body", "k"], "msg": "Input should be less than or equal to 10"}]}"#,
        )
        .unwrap();
        assert_eq!(
            body.message().as_deref(),
            Some("Input should be less than or equal to 10")
        );

        let body: ApiErrorBody = serde_json::from_str(r#"{}"#).unwrap();
        assert_eq!(body.message(), None);
    }

    #[test]
    fn test_formatting() {
        assert_eq!(format_percent(0.1834), "18.34%");
        assert_eq!(format_weight(0.333), "33.3%");
        assert_eq!(format_sharpe(0.82), "0.820");
        assert_eq!(format_duration(2.5), "⏱ 2.50s");
    }
}
