// ============================================================================
// Gestion des événements
// ============================================================================
// Gère les événements clavier et les ticks de l'application
//
// CONCEPTS RUST :
// 1. Enums avec variants : représenter différents types d'événements
// 2. matches! : tester un pattern en une expression
// 3. Error handling avec Result
// ============================================================================

use std::time::Duration;

use anyhow::Result;
use crossterm::event::{self, Event as CrosstermEvent, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// Événements de l'application
#[derive(Debug, Clone)]
pub enum Event {
    /// Touche pressée
    Key(KeyEvent),

    /// Tick régulier (expiration du toast, rafraîchissement)
    Tick,
}

/// Gestionnaire d'événements
pub struct EventHandler {
    tick_rate: Duration,
}

impl EventHandler {
    /// Crée un gestionnaire avec un tick de 250ms
    pub fn new() -> Self {
        Self {
            tick_rate: Duration::from_millis(250),
        }
    }

    /// Lit le prochain événement (bloquant avec timeout)
    ///
    /// CONCEPT : Non-blocking I/O avec timeout
    /// - poll(timeout) attend au plus tick_rate
    /// - Si pas d'événement, retourne Ok(Event::Tick)
    pub fn next(&self) -> Result<Event> {
        if event::poll(self.tick_rate)? {
            match event::read()? {
                // Sur certains OS, on reçoit Press ET Release : on ne garde que Press
                CrosstermEvent::Key(key) if key.kind == KeyEventKind::Press => Ok(Event::Key(key)),
                _ => Ok(Event::Tick),
            }
        } else {
            Ok(Event::Tick)
        }
    }
}

impl Default for EventHandler {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Helpers : Convertir KeyEvent en action
// ============================================================================

/// Vérifie si l'événement correspond à l'un des codes donnés
fn is_key(event: &Event, codes: &[KeyCode]) -> bool {
    if let Event::Key(key) = event {
        codes.contains(&key.code)
    } else {
        false
    }
}

/// 'q' : quitter
pub fn is_quit_event(event: &Event) -> bool {
    is_key(event, &[KeyCode::Char('q'), KeyCode::Char('Q')])
}

/// Ctrl+C : quitter sans confirmation
pub fn is_interrupt_event(event: &Event) -> bool {
    if let Event::Key(key) = event {
        key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL)
    } else {
        false
    }
}

pub fn is_escape_event(event: &Event) -> bool {
    is_key(event, &[KeyCode::Esc])
}

pub fn is_enter_event(event: &Event) -> bool {
    is_key(event, &[KeyCode::Enter])
}

pub fn is_space_event(event: &Event) -> bool {
    is_key(event, &[KeyCode::Char(' ')])
}

/// Tab / Shift+Tab : changer de panneau
pub fn is_tab_event(event: &Event) -> bool {
    is_key(event, &[KeyCode::Tab, KeyCode::BackTab])
}

pub fn is_backspace_event(event: &Event) -> bool {
    is_key(event, &[KeyCode::Backspace])
}

/// Flèche haut ou 'k' (vim)
pub fn is_up_event(event: &Event) -> bool {
    is_key(event, &[KeyCode::Up, KeyCode::Char('k'), KeyCode::Char('K')])
}

/// Flèche bas ou 'j' (vim)
pub fn is_down_event(event: &Event) -> bool {
    is_key(event, &[KeyCode::Down, KeyCode::Char('j'), KeyCode::Char('J')])
}

/// Flèches haut/bas uniquement (en recherche, j/k sont des caractères)
pub fn is_arrow_up_event(event: &Event) -> bool {
    is_key(event, &[KeyCode::Up])
}

pub fn is_arrow_down_event(event: &Event) -> bool {
    is_key(event, &[KeyCode::Down])
}

/// Flèche gauche ou 'h' : diminuer le réglage
pub fn is_decrease_event(event: &Event) -> bool {
    is_key(event, &[KeyCode::Left, KeyCode::Char('h'), KeyCode::Char('-')])
}

/// Flèche droite ou 'l' : augmenter le réglage
pub fn is_increase_event(event: &Event) -> bool {
    is_key(event, &[KeyCode::Right, KeyCode::Char('l'), KeyCode::Char('+')])
}

/// 'a' : tout sélectionner
pub fn is_select_all_event(event: &Event) -> bool {
    is_key(event, &[KeyCode::Char('a'), KeyCode::Char('A')])
}

/// 'c' : tout désélectionner
pub fn is_clear_all_event(event: &Event) -> bool {
    if is_interrupt_event(event) {
        return false;
    }
    is_key(event, &[KeyCode::Char('c'), KeyCode::Char('C')])
}

/// 'o' : lancer l'optimisation
pub fn is_optimize_event(event: &Event) -> bool {
    is_key(event, &[KeyCode::Char('o'), KeyCode::Char('O')])
}

/// '/' : ouvrir la recherche
pub fn is_search_event(event: &Event) -> bool {
    is_key(event, &[KeyCode::Char('/')])
}

/// 'r' : afficher les derniers résultats
pub fn is_results_event(event: &Event) -> bool {
    is_key(event, &[KeyCode::Char('r'), KeyCode::Char('R')])
}

/// 'x' : fermer le message d'erreur
pub fn is_dismiss_event(event: &Event) -> bool {
    is_key(event, &[KeyCode::Char('x'), KeyCode::Char('X')])
}

/// 'i' : métriques historiques de l'action sous le curseur
pub fn is_details_event(event: &Event) -> bool {
    is_key(event, &[KeyCode::Char('i'), KeyCode::Char('I')])
}

/// Caractère accepté dans la requête de recherche
pub fn is_search_char_event(event: &Event) -> bool {
    if let Event::Key(key) = event {
        matches!(key.code, KeyCode::Char(c) if c.is_alphanumeric() || matches!(c, ' ' | '-' | '.' | '&'))
    } else {
        false
    }
}

/// Extrait le caractère d'un événement clavier si c'est un caractère
pub fn get_char_from_event(event: &Event) -> Option<char> {
    if let Event::Key(key) = event {
        if let KeyCode::Char(c) = key.code {
            return Some(c);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code, KeyModifiers::empty()))
    }

    #[test]
    fn test_is_quit_event() {
        assert!(is_quit_event(&key(KeyCode::Char('q'))));
        assert!(!is_quit_event(&key(KeyCode::Char('a'))));
        assert!(!is_quit_event(&Event::Tick));
    }

    #[test]
    fn test_ctrl_c_is_not_clear_all() {
        let ctrl_c = Event::Key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert!(is_interrupt_event(&ctrl_c));
        assert!(!is_clear_all_event(&ctrl_c));
        assert!(is_clear_all_event(&key(KeyCode::Char('c'))));
    }

    #[test]
    fn test_search_chars() {
        assert!(is_search_char_event(&key(KeyCode::Char('&'))));
        assert!(is_search_char_event(&key(KeyCode::Char('7'))));
        assert!(!is_search_char_event(&key(KeyCode::Char('/'))));
        assert_eq!(get_char_from_event(&key(KeyCode::Char('z'))), Some('z'));
        assert_eq!(get_char_from_event(&Event::Tick), None);
    }

    #[test]
    fn test_adjust_keys() {
        assert!(is_increase_event(&key(KeyCode::Right)));
        assert!(is_decrease_event(&key(KeyCode::Char('h'))));
        assert!(is_up_event(&key(KeyCode::Char('k'))));
        assert!(!is_arrow_up_event(&key(KeyCode::Char('k'))));
    }
}
