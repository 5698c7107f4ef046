// ============================================================================
// qfolio - Client TUI de l'optimiseur de portefeuille quantique
// ============================================================================
// Programme TUI qui :
// - Charge la liste des actions depuis l'API (ou une liste de démo)
// - Laisse l'utilisateur choisir ses actions et régler k, λ, p, maxiter, shots
// - Envoie la requête d'optimisation et affiche les résultats
//
// CONCEPTS RUST CLÉS :
// 1. Terminal raw mode : contrôle total du terminal
// 2. Event loop : boucle qui gère événements et rendering
// 3. Worker thread + runtime tokio : appels API sans bloquer l'UI
// 4. Channels mpsc : commandes vers le worker, résultats vers l'UI
// ============================================================================

use std::io;
use std::sync::mpsc;

use anyhow::{Context, Result};
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{debug, error, info, warn};

use qfolio::api::{client::SEARCH_LIMIT, load_stocks_or_demo, ApiClient, StockSource};
use qfolio::app::{App, Screen};
use qfolio::config::Config;
use qfolio::models::{
    HealthStatus, OptimizationRequest, OptimizationResponse, StockInfo, TickerMetrics,
};
use qfolio::ui::{events::EventHandler, render};

// ============================================================================
// AppCommand / AppResult : messages entre l'UI et le worker
// ============================================================================

/// Commandes envoyées au worker thread pour exécuter des tâches async
#[derive(Debug, Clone)]
enum AppCommand {
    /// Charger la liste des actions (démo en cas d'échec)
    LoadStocks,

    /// Rechercher des actions par ticker ou nom
    Search { query: String },

    /// Lancer l'optimisation
    Optimize { request: OptimizationRequest },

    /// Vérifier l'état de l'API
    CheckHealth,

    /// Charger les métriques historiques d'une action
    LoadStockMetrics { ticker: String },
}

/// Résultats renvoyés par le worker thread
#[derive(Debug)]
enum AppResult {
    StocksLoaded {
        stocks: Vec<StockInfo>,
        source: StockSource,
    },

    SearchCompleted {
        query: String,
        stocks: Vec<StockInfo>,
    },

    SearchFailed {
        query: String,
        error: String,
    },

    OptimizationDone(Box<OptimizationResponse>),

    OptimizationFailed {
        error: String,
    },

    Health(HealthStatus),

    HealthFailed {
        error: String,
    },

    StockMetricsLoaded(TickerMetrics),

    StockMetricsFailed {
        ticker: String,
        error: String,
    },
}

// ============================================================================
// Initialisation du logging
// ============================================================================
// Les println! ne fonctionnent pas une fois le TUI lancé : on log vers un
// fichier avec rotation quotidienne
// ============================================================================

/// Initialise le système de logging vers fichier
///
/// Les logs sont écrits dans :
/// - Linux : ~/.local/share/qfolio/logs/qfolio.log
/// - macOS : ~/Library/Application Support/qfolio/logs/qfolio.log
/// - Windows : C:\Users\<user>\AppData\Local\qfolio\logs\qfolio.log
///
/// ```bash
/// tail -f ~/.local/share/qfolio/logs/qfolio.log
/// RUST_LOG=qfolio=trace cargo run
/// ```
fn init_logging() -> Result<()> {
    use tracing_appender::rolling::{RollingFileAppender, Rotation};
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let log_dir = dirs::data_local_dir()
        .map(|dir| dir.join("qfolio").join("logs"))
        .unwrap_or_else(|| std::path::PathBuf::from("./logs"));

    std::fs::create_dir_all(&log_dir).context("Failed to create the log directory")?;

    let file_appender = RollingFileAppender::new(Rotation::DAILY, log_dir.clone(), "qfolio.log");

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(file_appender)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(true)
                .with_line_number(true),
        )
        .with(
            // Par défaut : debug pour qfolio, info pour les dépendances
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "qfolio=debug,info".into()),
        )
        .init();

    info!(?log_dir, "Logging initialized");
    Ok(())
}

// ============================================================================
// Point d'entrée du programme
// ============================================================================

fn main() -> Result<()> {
    init_logging().unwrap_or_else(|e| {
        eprintln!("⚠️  Warning: Failed to initialize logging: {}", e);
        eprintln!("   Continuing without logging...");
    });

    let config = Config::from_env();
    info!(api_url = %config.api_url, "qfolio starting up");

    let client = ApiClient::new(&config)?;
    info!(base_url = %client.base_url(), "API client ready");
    let runtime = tokio::runtime::Runtime::new().context("Failed to create the tokio runtime")?;

    debug!("Setting up terminal");
    let mut terminal = setup_terminal()?;

    let mut app = App::new(&config);

    let (command_tx, command_rx) = mpsc::channel::<AppCommand>();
    let (result_tx, result_rx) = mpsc::channel::<AppResult>();

    info!("Spawning background worker thread");
    spawn_background_worker(runtime, client, command_rx, result_tx);

    // Chargement initial : la grille affiche "Loading stocks..." en attendant
    app.start_stock_loading();
    let _ = command_tx.send(AppCommand::CheckHealth);
    let _ = command_tx.send(AppCommand::LoadStocks);

    let events = EventHandler::new();

    info!("Starting event loop");
    let result = run(&mut terminal, app, &events, command_tx, result_rx);

    // Restaure le terminal (même en cas d'erreur)
    debug!("Restoring terminal");
    restore_terminal(&mut terminal)?;

    match &result {
        Ok(_) => info!("Application exited normally"),
        Err(e) => error!(error = ?e, "Application exited with error"),
    }

    result
}

// ============================================================================
// Background Worker Thread
// ============================================================================
// - Thread séparé qui reçoit des AppCommand
// - Chaque commande devient une tâche sur le runtime tokio
// - Une recherche n'attend donc pas la fin d'une optimisation longue
// - Le worker ne touche jamais App : tout revient par le channel de résultats
// ============================================================================

fn spawn_background_worker(
    runtime: tokio::runtime::Runtime,
    client: ApiClient,
    command_rx: mpsc::Receiver<AppCommand>,
    result_tx: mpsc::Sender<AppResult>,
) {
    std::thread::spawn(move || {
        while let Ok(command) = command_rx.recv() {
            debug!(?command, "Worker received command");

            let client = client.clone();
            let result_tx = result_tx.clone();

            runtime.spawn(async move {
                let result = execute_command(&client, command).await;
                if result_tx.send(result).is_err() {
                    debug!("UI closed before result could be delivered");
                }
            });
        }

        info!("Worker thread exiting (channel closed)");
        // Le runtime est détruit ici : les tâches en cours sont annulées
    });
}

/// Exécute une commande et la convertit en résultat pour l'UI
async fn execute_command(client: &ApiClient, command: AppCommand) -> AppResult {
    match command {
        AppCommand::LoadStocks => {
            let (stocks, source) = load_stocks_or_demo(client).await;
            AppResult::StocksLoaded { stocks, source }
        }

        AppCommand::Search { query } => match client.search_stocks(&query, SEARCH_LIMIT).await {
            Ok(stocks) => AppResult::SearchCompleted { query, stocks },
            Err(e) => AppResult::SearchFailed {
                query,
                error: format!("{:#}", e),
            },
        },

        AppCommand::Optimize { request } => match client.optimize(&request).await {
            Ok(response) => AppResult::OptimizationDone(Box::new(response)),
            Err(e) => AppResult::OptimizationFailed {
                error: format!("{:#}", e),
            },
        },

        AppCommand::CheckHealth => match client.health().await {
            Ok(health) => AppResult::Health(health),
            Err(e) => AppResult::HealthFailed {
                error: format!("{:#}", e),
            },
        },

        AppCommand::LoadStockMetrics { ticker } => match client.stock_metrics(&ticker).await {
            Ok(metrics) => AppResult::StockMetricsLoaded(metrics),
            Err(e) => AppResult::StockMetricsFailed {
                ticker,
                error: format!("{:#}", e),
            },
        },
    }
}

// ============================================================================
// Event Loop Principal
// ============================================================================
// À chaque itération :
//   0. Appliquer les résultats du worker
//   1. Dessiner l'interface
//   2. Traiter les événements clavier
//   3. Mettre à jour l'état (expiration du toast)
// ============================================================================

fn run(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    mut app: App,
    events: &EventHandler,
    command_tx: mpsc::Sender<AppCommand>,
    result_rx: mpsc::Receiver<AppResult>,
) -> Result<()> {
    loop {
        if !app.is_running() {
            break;
        }

        // 0. RÉSULTATS : vide le channel sans bloquer
        loop {
            match result_rx.try_recv() {
                Ok(result) => apply_result(&mut app, result),
                Err(mpsc::TryRecvError::Empty) => break,
                Err(mpsc::TryRecvError::Disconnected) => {
                    error!("Worker thread disconnected!");
                    break;
                }
            }
        }

        // 1. RENDER
        terminal.draw(|frame| render(frame, &app))?;

        // 2. INPUT
        match events.next() {
            Ok(event) => handle_event(&mut app, event, &command_tx),
            Err(e) => warn!(error = ?e, "Failed to read terminal event"),
        }

        // 3. UPDATE
        app.tick();
    }

    Ok(())
}

/// Applique un résultat du worker à l'état de l'application
fn apply_result(app: &mut App, result: AppResult) {
    match result {
        AppResult::StocksLoaded { stocks, source } => {
            info!(count = stocks.len(), ?source, "Stock list ready");
            app.set_stocks(stocks);
            if source == StockSource::Demo {
                app.show_error("Failed to load stocks. Using demo data...");
            }
        }

        AppResult::SearchCompleted { query, stocks } => {
            debug!(query = %query, count = stocks.len(), "Search results received");
            app.set_search_results(&query, stocks);
        }

        AppResult::SearchFailed { query, error } => {
            // Comme une recherche dans une barre de saisie : erreur loggée seulement
            error!(query = %query, error = %error, "Search error");
        }

        AppResult::OptimizationDone(response) => {
            info!(
                selected = ?response.portfolio.selected_stocks,
                sharpe = response.portfolio.sharpe_ratio,
                "Optimization complete"
            );
            app.stop_loading();
            app.show_results(*response);
        }

        AppResult::OptimizationFailed { error } => {
            error!(error = %error, "Optimization error");
            app.stop_loading();
            app.show_error(format!("Optimization failed: {}", error));
        }

        AppResult::Health(health) => {
            info!(status = %health.status, version = %health.version, quantum_ready = health.quantum_ready, "API health");
            app.health = Some(health);
        }

        AppResult::HealthFailed { error } => {
            warn!(error = %error, "Health check failed");
            app.health = None;
        }

        AppResult::StockMetricsLoaded(metrics) => {
            debug!(ticker = %metrics.ticker, "Stock metrics received");
            // Ignore la réponse si le curseur a changé d'action entre-temps
            if app.current_stock().map(|s| s.ticker == metrics.ticker).unwrap_or(false) {
                app.details = Some(metrics);
            }
        }

        AppResult::StockMetricsFailed { ticker, error } => {
            error!(ticker = %ticker, error = %error, "Failed to load stock metrics");
            app.show_error(format!("Failed to load metrics for {}: {}", ticker, error));
        }
    }
}

// ============================================================================
// Gestion des événements
// ============================================================================

/// Traite un événement et met à jour l'état de l'application
///
/// CONCEPT : Routing par écran
/// - En recherche, les lettres vont dans le buffer (pas de raccourcis)
/// - Sur le dashboard et les résultats, les lettres sont des raccourcis
fn handle_event(app: &mut App, event: qfolio::ui::events::Event, command_tx: &mpsc::Sender<AppCommand>) {
    use qfolio::ui::events::{is_interrupt_event, Event};

    if matches!(event, Event::Tick) {
        return;
    }

    if is_interrupt_event(&event) {
        info!("User interrupted (Ctrl+C)");
        app.quit();
        return;
    }

    match app.current_screen {
        Screen::Search => handle_search_event(app, &event, command_tx),
        Screen::Results => handle_results_event(app, &event, command_tx),
        Screen::Dashboard => handle_dashboard_event(app, &event, command_tx),
    }
}

/// Two-step quit : première pression demande confirmation, deuxième quitte
fn handle_quit(app: &mut App) {
    if app.is_awaiting_quit_confirmation() {
        info!("User confirmed quit");
        app.quit();
    } else {
        info!("User requested quit (awaiting confirmation)");
        app.request_quit();
    }
}

/// Valide la sélection et envoie la requête d'optimisation
fn request_optimization(app: &mut App, command_tx: &mpsc::Sender<AppCommand>) {
    // Le bouton est désactivé pendant le chargement
    if app.is_loading_data() {
        debug!("Optimization already running, ignoring");
        return;
    }

    match app.build_request() {
        Ok(request) => {
            info!(stocks = ?request.stocks, k = request.k, "User requested optimization");
            app.start_loading(Some(format!(
                "Optimizing {} stocks (k = {})...",
                request.stocks.len(),
                request.k
            )));
            if command_tx.send(AppCommand::Optimize { request }).is_err() {
                error!("Worker unavailable, cannot optimize");
                app.stop_loading();
                app.show_error("Optimization failed: background worker stopped");
            }
        }
        Err(e) => {
            info!(error = %e, "Selection rejected");
            app.show_error(e.to_string());
        }
    }
}

fn handle_dashboard_event(app: &mut App, event: &qfolio::ui::events::Event, command_tx: &mpsc::Sender<AppCommand>) {
    use qfolio::ui::events::{
        is_clear_all_event, is_decrease_event, is_details_event, is_dismiss_event, is_down_event,
        is_enter_event, is_increase_event, is_optimize_event, is_quit_event, is_results_event,
        is_search_event, is_select_all_event, is_space_event, is_tab_event, is_up_event,
    };
    use qfolio::app::Focus;

    if is_quit_event(event) {
        handle_quit(app);
        return;
    }
    app.cancel_quit();

    if is_up_event(event) {
        app.navigate_up();
    } else if is_down_event(event) {
        app.navigate_down();
    } else if is_tab_event(event) {
        app.toggle_focus();
        debug!(focus = ?app.focus, "Focus changed");
    } else if (is_space_event(event) || is_enter_event(event)) && app.focus == Focus::Stocks {
        app.toggle_current();
        debug!(selected = app.selected_count(), "Selection toggled");
    } else if is_increase_event(event) && app.focus == Focus::Params {
        app.increase_param();
    } else if is_decrease_event(event) && app.focus == Focus::Params {
        app.decrease_param();
    } else if is_select_all_event(event) {
        app.select_all();
        info!(selected = app.selected_count(), "User selected all stocks");
    } else if is_clear_all_event(event) {
        app.clear_all();
        info!("User cleared selection");
    } else if is_optimize_event(event) {
        request_optimization(app, command_tx);
    } else if is_search_event(event) {
        app.open_search();
    } else if is_results_event(event) {
        app.show_results_screen();
    } else if is_dismiss_event(event) {
        app.hide_error();
    } else if is_details_event(event) {
        if let Some(stock) = app.current_stock() {
            let ticker = stock.ticker.clone();
            debug!(ticker = %ticker, "User requested stock metrics");
            let _ = command_tx.send(AppCommand::LoadStockMetrics { ticker });
        }
    }
}

fn handle_results_event(app: &mut App, event: &qfolio::ui::events::Event, command_tx: &mpsc::Sender<AppCommand>) {
    use qfolio::ui::events::{
        is_dismiss_event, is_escape_event, is_optimize_event, is_quit_event, is_space_event,
    };

    if is_quit_event(event) {
        handle_quit(app);
        return;
    }
    app.cancel_quit();

    if is_escape_event(event) || is_space_event(event) {
        debug!("User returned to dashboard");
        app.show_dashboard();
    } else if is_optimize_event(event) {
        request_optimization(app, command_tx);
    } else if is_dismiss_event(event) {
        app.hide_error();
    }
}

fn handle_search_event(app: &mut App, event: &qfolio::ui::events::Event, command_tx: &mpsc::Sender<AppCommand>) {
    use qfolio::ui::events::{
        get_char_from_event, is_arrow_down_event, is_arrow_up_event, is_backspace_event,
        is_enter_event, is_escape_event, is_search_char_event,
    };

    if is_escape_event(event) {
        info!("User cancelled search");
        app.close_search();
    } else if is_enter_event(event) {
        if let Some(ticker) = app.current_search_result().map(|s| s.ticker.clone()) {
            info!(ticker = %ticker, "User added stock from search");
            app.add_stock_to_selection(&ticker);
        }
    } else if is_arrow_up_event(event) {
        app.search_up();
    } else if is_arrow_down_event(event) {
        app.search_down();
    } else if is_backspace_event(event) {
        app.backspace();
        send_search(app, command_tx);
    } else if is_search_char_event(event) {
        if let Some(c) = get_char_from_event(event) {
            app.append_char(c);
            send_search(app, command_tx);
        }
    }
}

/// Lance une recherche pour la requête courante (rien si elle est vide)
fn send_search(app: &App, command_tx: &mpsc::Sender<AppCommand>) {
    let query = app.search_query.trim().to_string();
    if !query.is_empty() {
        let _ = command_tx.send(AppCommand::Search { query });
    }
}

// ============================================================================
// Setup et restauration du terminal
// ============================================================================

/// Configure le terminal en mode TUI (raw mode + alternate screen)
fn setup_terminal() -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;

    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend).map_err(|e| e.into())
}

/// Restaure le terminal à son état normal
fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;
    Ok(())
}

// ============================================================================
// Tests unitaires
// ============================================================================
