// ============================================================================
// Module : models
// ============================================================================
// Ce module contient toutes les structures de données de l'application
//
// CONCEPT RUST : Modules et visibilité
// - "pub mod" : déclare un sous-module publique (accessible depuis l'extérieur)
// - Sans "pub", le module serait privé au crate
// ============================================================================

pub mod optimization; // Requête / réponse de l'optimiseur
pub mod params;       // Réglages de l'optimisation (k, lambda, p, ...)
pub mod stock;        // Actions disponibles et liste de démo

// Re-export des structures principales pour simplifier les imports
// On peut faire : use qfolio::models::StockInfo;
pub use optimization::{
    format_duration, format_percent, format_sharpe, format_weight, ApiErrorBody, HealthStatus,
    OptimizationRequest, OptimizationResponse, PortfolioResult, QaoaMetrics, SelectionError,
    StockMetric, TickerMetrics,
};
pub use params::{OptimizationParams, Param};
pub use stock::{demo_stocks, SearchResponse, StockInfo, StockListResponse};
