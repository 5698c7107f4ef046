// ============================================================================
// Structure : App
// ============================================================================
// Gère l'état global de l'application TUI
//
// - Liste des actions et sélection de l'utilisateur
// - Réglages de l'optimisation
// - État de chargement, résultats, message d'erreur (toast)
// - Recherche d'actions
//
// PATTERN : "Application State"
// - Tous les composants de l'UI lisent depuis App
// - Toutes les modifications passent par les méthodes de App
// ============================================================================

use std::time::{Duration, Instant};

use chrono::{DateTime, Local};

use crate::config::Config;
use crate::models::{
    HealthStatus, OptimizationParams, OptimizationRequest, OptimizationResponse, Param,
    SelectionError, StockInfo, TickerMetrics,
};

/// Écrans de l'application
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen {
    /// Vue principale : grille des actions + réglages
    Dashboard,

    /// Vue des résultats de la dernière optimisation
    Results,

    /// Mode recherche : saisie d'une requête + liste de résultats
    Search,
}

/// Panneau qui reçoit les touches de navigation sur le dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Stocks,
    Params,
}

/// Message d'erreur temporaire
///
/// CONCEPT : Expiration par comparaison d'Instant
/// - Pas de timer : tick() vérifie l'âge du toast à chaque itération
#[derive(Debug, Clone)]
pub struct Toast {
    pub message: String,
    pub shown_at: Instant,
}

impl Toast {
    pub fn new(message: String) -> Self {
        Self {
            message,
            shown_at: Instant::now(),
        }
    }

    /// Vrai si le toast est affiché depuis au moins `duration`
    pub fn is_expired(&self, now: Instant, duration: Duration) -> bool {
        now.saturating_duration_since(self.shown_at) >= duration
    }
}

/// État principal de l'application
pub struct App {
    /// Indique si l'application doit continuer à tourner
    pub running: bool,

    /// Écran actuellement affiché
    pub current_screen: Screen,

    /// Panneau actif sur le dashboard
    pub focus: Focus,

    /// Actions disponibles (API ou démo)
    pub stocks: Vec<StockInfo>,

    /// Tickers sélectionnés, dans l'ordre de sélection
    /// CONCEPT : Vec + contains plutôt que HashSet
    /// - Conserve l'ordre d'insertion (envoyé tel quel à l'API)
    /// - Quelques dizaines d'actions au plus
    pub selected: Vec<String>,

    /// Index de l'action sous le curseur
    pub cursor: usize,

    /// Indique que la liste des actions est en cours de chargement
    pub stocks_loading: bool,

    /// Réglages de l'optimisation
    pub params: OptimizationParams,

    /// Réglage sous le curseur dans le panneau de paramètres
    pub param_cursor: Param,

    /// Indique si une optimisation est en cours
    pub is_loading: bool,

    /// Message de chargement optionnel
    pub loading_message: Option<String>,

    /// Résultat de la dernière optimisation
    pub results: Option<OptimizationResponse>,

    /// Heure de réception du dernier résultat
    pub results_received_at: Option<DateTime<Local>>,

    /// Message d'erreur affiché
    pub toast: Option<Toast>,

    /// Durée d'affichage d'un toast
    pub toast_duration: Duration,

    /// Buffer de saisie de la recherche
    pub search_query: String,

    /// Résultats de la recherche (None tant qu'aucune recherche n'a abouti)
    pub search_results: Option<Vec<StockInfo>>,

    /// Index du résultat de recherche sous le curseur
    pub search_cursor: usize,

    /// État de santé de l'API (None si inconnu ou injoignable)
    pub health: Option<HealthStatus>,

    /// Métriques historiques de l'action sous le curseur
    pub details: Option<TickerMetrics>,

    /// Two-step quit pour éviter les sorties accidentelles
    pub confirm_quit: bool,
}

impl App {
    /// Crée l'application avec les réglages par défaut de la config
    pub fn new(config: &Config) -> Self {
        Self {
            running: true,
            current_screen: Screen::Dashboard,
            focus: Focus::Stocks,
            stocks: Vec::new(),
            selected: Vec::new(),
            cursor: 0,
            stocks_loading: false,
            params: OptimizationParams::from_config(config),
            param_cursor: Param::default(),
            is_loading: false,
            loading_message: None,
            results: None,
            results_received_at: None,
            toast: None,
            toast_duration: config.toast_duration,
            search_query: String::new(),
            search_results: None,
            search_cursor: 0,
            health: None,
            details: None,
            confirm_quit: false,
        }
    }

    /// Crée une App avec une liste d'actions préchargée
    pub fn with_stocks(config: &Config, stocks: Vec<StockInfo>) -> Self {
        let mut app = Self::new(config);
        app.set_stocks(stocks);
        app
    }

    /// Quitte l'application
    pub fn quit(&mut self) {
        self.running = false;
    }

    /// Vérifie si l'application doit continuer
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Tick : appelé à chaque itération de la boucle
    ///
    /// Fait disparaître le toast une fois sa durée écoulée
    pub fn tick(&mut self) {
        self.expire_toast(Instant::now());
    }

    fn expire_toast(&mut self, now: Instant) {
        let expired = self
            .toast
            .as_ref()
            .map(|t| t.is_expired(now, self.toast_duration))
            .unwrap_or(false);
        if expired {
            self.toast = None;
        }
    }

    // ========================================================================
    // Liste des actions et sélection
    // ========================================================================

    /// Marque la liste comme en cours de chargement
    pub fn start_stock_loading(&mut self) {
        self.stocks_loading = true;
    }

    /// Remplace la liste des actions
    ///
    /// La sélection est conservée ; le curseur est ramené dans les bornes.
    /// Un ticker sélectionné absent de la nouvelle liste (ajouté depuis la
    /// recherche pendant le chargement) reste affiché en fin de grille.
    pub fn set_stocks(&mut self, stocks: Vec<StockInfo>) {
        let previous = std::mem::replace(&mut self.stocks, stocks);
        for ticker in &self.selected {
            if !self.stocks.iter().any(|s| s.ticker == *ticker) {
                let stock = previous
                    .iter()
                    .find(|s| s.ticker == *ticker)
                    .cloned()
                    .unwrap_or_else(|| StockInfo::placeholder(ticker));
                self.stocks.push(stock);
            }
        }
        self.stocks_loading = false;
        self.cursor = self.cursor.min(self.stocks.len().saturating_sub(1));
        self.details = None;
    }

    /// Action sous le curseur
    pub fn current_stock(&self) -> Option<&StockInfo> {
        self.stocks.get(self.cursor)
    }

    /// Vérifie si un ticker est sélectionné
    pub fn is_selected(&self, ticker: &str) -> bool {
        self.selected.iter().any(|t| t == ticker)
    }

    /// Ajoute ou retire un ticker de la sélection
    pub fn toggle_stock(&mut self, ticker: &str) {
        if let Some(pos) = self.selected.iter().position(|t| t == ticker) {
            self.selected.remove(pos);
        } else {
            self.selected.push(ticker.to_string());
        }
    }

    /// Bascule l'action sous le curseur
    pub fn toggle_current(&mut self) {
        if let Some(ticker) = self.current_stock().map(|s| s.ticker.clone()) {
            self.toggle_stock(&ticker);
        }
    }

    /// Sélectionne toutes les actions de la liste
    pub fn select_all(&mut self) {
        for stock in &self.stocks {
            if !self.selected.iter().any(|t| *t == stock.ticker) {
                self.selected.push(stock.ticker.clone());
            }
        }
    }

    /// Vide la sélection
    pub fn clear_all(&mut self) {
        self.selected.clear();
    }

    /// Nombre d'actions sélectionnées
    pub fn selected_count(&self) -> usize {
        self.selected.len()
    }

    /// Libellé du compteur ("3 selected")
    pub fn selected_count_label(&self) -> String {
        format!("{} selected", self.selected_count())
    }

    /// Ajoute un ticker trouvé par la recherche à la sélection
    ///
    /// - Ajoute une action provisoire si le ticker n'est pas dans la liste
    /// - Sélectionne le ticker et place le curseur dessus
    /// - Ferme la recherche
    pub fn add_stock_to_selection(&mut self, ticker: &str) {
        let index = match self.stocks.iter().position(|s| s.ticker == ticker) {
            Some(index) => index,
            None => {
                let stock = self
                    .search_results
                    .as_ref()
                    .and_then(|results| results.iter().find(|s| s.ticker == ticker))
                    .cloned()
                    .unwrap_or_else(|| StockInfo::placeholder(ticker));
                self.stocks.push(stock);
                self.stocks.len() - 1
            }
        };

        if !self.is_selected(ticker) {
            self.selected.push(ticker.to_string());
        }
        self.cursor = index;
        self.details = None;
        self.close_search();
    }

    // ========================================================================
    // Navigation
    // ========================================================================

    /// Navigue vers le haut dans le panneau actif
    pub fn navigate_up(&mut self) {
        match self.focus {
            Focus::Stocks => {
                self.cursor = self.cursor.saturating_sub(1);
                self.details = None;
            }
            Focus::Params => self.param_cursor = self.param_cursor.previous(),
        }
    }

    /// Navigue vers le bas dans le panneau actif
    pub fn navigate_down(&mut self) {
        match self.focus {
            Focus::Stocks => {
                let max_index = self.stocks.len().saturating_sub(1);
                self.cursor = (self.cursor + 1).min(max_index);
                self.details = None;
            }
            Focus::Params => self.param_cursor = self.param_cursor.next(),
        }
    }

    /// Passe d'un panneau à l'autre
    pub fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            Focus::Stocks => Focus::Params,
            Focus::Params => Focus::Stocks,
        };
    }

    /// Augmente le réglage sous le curseur
    pub fn increase_param(&mut self) {
        self.params.increase(self.param_cursor);
    }

    /// Diminue le réglage sous le curseur
    pub fn decrease_param(&mut self) {
        self.params.decrease(self.param_cursor);
    }

    // ========================================================================
    // Optimisation
    // ========================================================================

    /// Construit la requête d'optimisation depuis l'état courant
    pub fn build_request(&self) -> Result<OptimizationRequest, SelectionError> {
        OptimizationRequest::build(&self.selected, &self.params)
    }

    /// Démarre le chargement avec un message optionnel
    pub fn start_loading(&mut self, message: Option<String>) {
        self.is_loading = true;
        self.loading_message = message;
    }

    /// Termine le chargement
    pub fn stop_loading(&mut self) {
        self.is_loading = false;
        self.loading_message = None;
    }

    /// Vérifie si une optimisation est en cours
    pub fn is_loading_data(&self) -> bool {
        self.is_loading
    }

    /// Enregistre le résultat et affiche l'écran des résultats
    pub fn show_results(&mut self, results: OptimizationResponse) {
        self.results = Some(results);
        self.results_received_at = Some(Local::now());
        self.current_screen = Screen::Results;
    }

    // ========================================================================
    // Toast d'erreur
    // ========================================================================

    /// Affiche un message d'erreur (disparaît après toast_duration)
    pub fn show_error(&mut self, message: impl Into<String>) {
        self.toast = Some(Toast::new(message.into()));
    }

    /// Ferme le message d'erreur
    pub fn hide_error(&mut self) {
        self.toast = None;
    }

    // ========================================================================
    // Écrans
    // ========================================================================

    /// Affiche les résultats s'il y en a
    pub fn show_results_screen(&mut self) {
        if self.results.is_some() {
            self.current_screen = Screen::Results;
        }
    }

    /// Retourne au dashboard
    pub fn show_dashboard(&mut self) {
        self.current_screen = Screen::Dashboard;
    }

    pub fn is_on_dashboard(&self) -> bool {
        self.current_screen == Screen::Dashboard
    }

    // ========================================================================
    // Recherche
    // ========================================================================

    /// Ouvre le mode recherche avec un buffer vide
    pub fn open_search(&mut self) {
        self.current_screen = Screen::Search;
        self.search_query.clear();
        self.search_results = None;
        self.search_cursor = 0;
    }

    /// Ferme la recherche et retourne au dashboard
    pub fn close_search(&mut self) {
        self.current_screen = Screen::Dashboard;
        self.search_query.clear();
        self.search_results = None;
        self.search_cursor = 0;
    }

    pub fn is_in_search(&self) -> bool {
        self.current_screen == Screen::Search
    }

    /// Ajoute un caractère à la requête
    pub fn append_char(&mut self, c: char) {
        self.search_query.push(c);
    }

    /// Supprime le dernier caractère de la requête
    ///
    /// Une requête vide masque les résultats
    pub fn backspace(&mut self) {
        self.search_query.pop();
        if self.search_query.trim().is_empty() {
            self.search_results = None;
            self.search_cursor = 0;
        }
    }

    /// Enregistre les résultats de la recherche
    ///
    /// Ignore les réponses d'une requête qui n'est plus celle affichée
    pub fn set_search_results(&mut self, query: &str, results: Vec<StockInfo>) {
        if !self.is_in_search() || self.search_query.trim() != query.trim() {
            return;
        }
        self.search_results = Some(results);
        self.search_cursor = 0;
    }

    pub fn search_up(&mut self) {
        self.search_cursor = self.search_cursor.saturating_sub(1);
    }

    pub fn search_down(&mut self) {
        let len = self.search_results.as_ref().map(Vec::len).unwrap_or(0);
        self.search_cursor = (self.search_cursor + 1).min(len.saturating_sub(1));
    }

    /// Ticker du résultat de recherche sous le curseur
    pub fn current_search_result(&self) -> Option<&StockInfo> {
        self.search_results.as_ref()?.get(self.search_cursor)
    }

    // ========================================================================
    // Quit
    // ========================================================================

    pub fn request_quit(&mut self) {
        self.confirm_quit = true;
    }

    pub fn cancel_quit(&mut self) {
        self.confirm_quit = false;
    }

    pub fn is_awaiting_quit_confirmation(&self) -> bool {
        self.confirm_quit
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new(&Config::default())
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::demo_stocks;

    fn demo_app() -> App {
        App::with_stocks(&Config::default(), demo_stocks())
    }

    #[test]
    fn test_app_creation() {
        let app = App::default();
        assert!(app.is_running());
        assert!(app.stocks.is_empty());
        assert_eq!(app.selected_count_label(), "0 selected");
        assert_eq!(app.params.portfolio_size, 3);
    }

    #[test]
    fn test_toggle_stock() {
        let mut app = demo_app();
        app.toggle_stock("TCS");
        app.toggle_stock("INFY");
        assert!(app.is_selected("TCS"));
        assert_eq!(app.selected_count_label(), "2 selected");

        app.toggle_stock("TCS");
        assert!(!app.is_selected("TCS"));
        assert_eq!(app.selected, vec!["INFY".to_string()]);
    }

    #[test]
    fn test_select_all_and_clear() {
        let mut app = demo_app();
        app.toggle_stock("LT");
        app.select_all();
        assert_eq!(app.selected_count(), 10);
        // LT reste en tête : l'ordre d'insertion est conservé
        assert_eq!(app.selected[0], "LT");

        app.clear_all();
        assert_eq!(app.selected_count(), 0);
    }

    #[test]
    fn test_navigation_is_clamped() {
        let mut app = demo_app();
        app.navigate_up();
        assert_eq!(app.cursor, 0);

        for _ in 0..20 {
            app.navigate_down();
        }
        assert_eq!(app.cursor, 9);
        assert_eq!(app.current_stock().unwrap().ticker, "LT");
    }

    #[test]
    fn test_param_focus() {
        let mut app = demo_app();
        app.toggle_focus();
        assert_eq!(app.focus, Focus::Params);

        app.increase_param();
        assert_eq!(app.params.portfolio_size, 4);

        app.navigate_down();
        assert_eq!(app.param_cursor, Param::RiskAversion);
        app.decrease_param();
        assert_eq!(app.params.risk_percent, 45);
        // Le curseur de la liste n'a pas bougé
        assert_eq!(app.cursor, 0);
    }

    #[test]
    fn test_build_request_validation() {
        let mut app = demo_app();
        app.toggle_stock("TCS");
        app.toggle_stock("INFY");
        assert_eq!(
            app.build_request().unwrap_err().to_string(),
            "Please select at least 3 stocks"
        );

        app.toggle_stock("SBIN");
        let request = app.build_request().unwrap();
        assert_eq!(request.stocks, vec!["TCS", "INFY", "SBIN"]);
        assert_eq!(request.k, 3);
    }

    #[test]
    fn test_add_unknown_stock_from_search() {
        let mut app = demo_app();
        app.open_search();
        app.append_char('W');
        app.set_search_results("W", vec![StockInfo::new("WIPRO", "Wipro", "IT")]);

        app.add_stock_to_selection("WIPRO");
        assert_eq!(app.stocks.len(), 11);
        assert_eq!(app.stocks[10].name, "Wipro");
        assert_eq!(app.cursor, 10);
        assert!(app.is_selected("WIPRO"));
        assert!(app.is_on_dashboard());
        assert!(app.search_query.is_empty());
    }

    #[test]
    fn test_add_stock_without_search_entry_uses_placeholder() {
        let mut app = demo_app();
        app.add_stock_to_selection("ZOMATO");
        assert_eq!(app.stocks.last().unwrap().name, "Loading...");
        assert!(app.is_selected("ZOMATO"));

        // Ajouter un ticker existant ne le duplique pas
        app.add_stock_to_selection("TCS");
        assert_eq!(app.stocks.len(), 11);
        assert_eq!(app.cursor, 1);
        assert_eq!(app.selected_count(), 2);
    }

    #[test]
    fn test_late_stock_list_keeps_stock_added_from_search() {
        let mut app = App::new(&Config::default());
        app.start_stock_loading();

        app.open_search();
        app.append_char('W');
        app.set_search_results("W", vec![StockInfo::new("WIPRO", "Wipro", "IT")]);
        app.add_stock_to_selection("WIPRO");
        app.toggle_stock("ZOMATO");

        app.set_stocks(demo_stocks());
        assert!(!app.stocks_loading);
        assert_eq!(app.stocks.len(), 12);
        assert_eq!(app.stocks[10].ticker, "WIPRO");
        assert_eq!(app.stocks[10].name, "Wipro");
        assert_eq!(app.stocks[11].name, "Loading...");
        assert_eq!(app.selected, vec!["WIPRO".to_string(), "ZOMATO".to_string()]);

        // Un ticker déjà présent dans la nouvelle liste n'est pas dupliqué
        app.toggle_stock("TCS");
        app.set_stocks(demo_stocks());
        assert_eq!(app.stocks.len(), 12);
    }

    #[test]
    fn test_stale_search_results_are_ignored() {
        let mut app = demo_app();
        app.open_search();
        app.append_char('T');
        app.append_char('C');
        app.set_search_results("T", vec![StockInfo::new("TCS", "Tata", "IT")]);
        assert!(app.search_results.is_none());

        app.set_search_results("TC", vec![StockInfo::new("TCS", "Tata", "IT")]);
        assert_eq!(app.current_search_result().unwrap().ticker, "TCS");

        app.backspace();
        app.backspace();
        assert!(app.search_results.is_none());
    }

    #[test]
    fn test_toast_expiry() {
        let mut app = demo_app();
        app.show_error("Failed to load stocks. Using demo data...");

        let shown_at = app.toast.as_ref().unwrap().shown_at;
        app.expire_toast(shown_at + Duration::from_secs(4));
        assert!(app.toast.is_some());

        app.expire_toast(shown_at + Duration::from_secs(5));
        assert!(app.toast.is_none());
    }

    #[test]
    fn test_hide_error() {
        let mut app = demo_app();
        app.show_error("boom");
        app.hide_error();
        assert!(app.toast.is_none());
    }

    #[test]
    fn test_loading_state() {
        let mut app = demo_app();
        app.start_loading(Some("Optimizing...".to_string()));
        assert!(app.is_loading_data());
        app.stop_loading();
        assert!(!app.is_loading_data());
        assert!(app.loading_message.is_none());
    }

    #[test]
    fn test_results_screen_requires_results() {
        let mut app = demo_app();
        app.show_results_screen();
        assert!(app.is_on_dashboard());
    }
}
