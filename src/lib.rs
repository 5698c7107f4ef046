// ============================================================================
// qfolio - Library
// ============================================================================
// Expose les modules publics pour le binaire et les tests
// ============================================================================

pub mod api;    // Client de l'API d'optimisation
pub mod app;    // État de l'application
pub mod config; // Configuration (variables d'environnement)
pub mod models; // Structures de données
pub mod ui;     // Interface utilisateur
