// ============================================================================
// Module : ui
// ============================================================================
// Gère toute l'interface utilisateur (Terminal User Interface)
// ============================================================================

pub mod dashboard; // Grille des actions, réglages, toast
pub mod events;    // Gestion des événements clavier
pub mod results;   // Écran des résultats d'optimisation
pub mod search;    // Popup de recherche d'actions

// Re-exports pour simplifier les imports
pub use dashboard::render;
pub use events::{Event, EventHandler};
