// ============================================================================
// Module : api
// ============================================================================
// Client HTTP de l'API d'optimisation de portefeuille
// (liste des actions, recherche, optimisation, santé)
// ============================================================================

pub mod client; // Client API d'optimisation

// Re-export des fonctions principales
pub use client::{load_stocks_or_demo, ApiClient, StockSource};
