// ============================================================================
// Dashboard - Rendu de l'interface principale
// ============================================================================
// Dessine la grille des actions, le panneau des réglages et le bouton
// d'optimisation
//
// CONCEPTS RATATUI :
// 1. Frame : surface de dessin
// 2. Layout : découpage de l'espace en zones
// 3. List + ListState : liste avec élément sélectionné et défilement
// 4. Clear : efface une zone avant d'y dessiner un popup
// ============================================================================

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, Focus, Screen};
use crate::models::{format_percent, format_sharpe, Param};
use crate::ui::{results, search};

/// Dessine l'interface complète
///
/// CONCEPT RUST : Routing avec match sur enum
/// - Le compilateur garantit l'exhaustivité (tous les écrans gérés)
pub fn render(frame: &mut Frame, app: &App) {
    match app.current_screen {
        Screen::Dashboard => render_dashboard(frame, app),
        Screen::Results => {
            let area = frame.size();
            results::render_results(frame, app, area);
        }
        Screen::Search => {
            // La recherche s'affiche en popup par-dessus le dashboard
            render_dashboard(frame, app);
            search::render_search(frame, app);
        }
    }

    // Le toast d'erreur est visible sur tous les écrans
    if let Some(toast) = &app.toast {
        render_toast(frame, &toast.message);
    }
}

/// Dessine le dashboard
fn render_dashboard(frame: &mut Frame, app: &App) {
    let chunks = create_layout(frame.size());

    render_header(frame, app, chunks[0]);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(chunks[1]);

    render_stock_grid(frame, app, body[0]);
    render_side_panel(frame, app, body[1]);

    render_footer(frame, app, chunks[2]);
}

/// Crée le layout principal (header, content, footer)
pub(crate) fn create_layout(area: Rect) -> Vec<Rect> {
    Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Content
            Constraint::Length(3), // Footer
        ])
        .split(area)
        .to_vec()
}

// ============================================================================
// Header : titre + état de l'API
// ============================================================================

pub(crate) fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" Quantum Portfolio Optimizer ")
        .title_alignment(Alignment::Center);

    let status = match &app.health {
        Some(health) => {
            let color = if health.status == "healthy" {
                Color::Green
            } else {
                Color::Yellow
            };
            let quantum = if health.quantum_ready {
                "quantum ready"
            } else {
                "quantum unavailable"
            };
            Span::styled(
                format!("● API {} v{} · {}", health.status, health.version, quantum),
                Style::default().fg(color),
            )
        }
        None => Span::styled("○ API status unknown", Style::default().fg(Color::Gray)),
    };

    let paragraph = Paragraph::new(Line::from(status))
        .block(block)
        .alignment(Alignment::Center);

    frame.render_widget(paragraph, area);
}

// ============================================================================
// Grille des actions
// ============================================================================

fn panel_border(focused: bool) -> Style {
    if focused {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default().fg(Color::Cyan)
    }
}

/// Dessine la liste des actions avec cases à cocher
fn render_stock_grid(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(panel_border(app.focus == Focus::Stocks))
        .title(" 📈 Stocks ")
        .title(
            ratatui::widgets::block::Title::from(format!(" {} ", app.selected_count_label()))
                .alignment(Alignment::Right),
        );

    if app.stocks_loading && app.stocks.is_empty() {
        let paragraph = Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled("⏳ Loading stocks...", Style::default().fg(Color::Gray))),
        ])
        .block(block)
        .alignment(Alignment::Center);
        frame.render_widget(paragraph, area);
        return;
    }

    if app.stocks.is_empty() {
        let paragraph = Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled("No stocks available", Style::default().fg(Color::Gray))),
        ])
        .block(block)
        .alignment(Alignment::Center);
        frame.render_widget(paragraph, area);
        return;
    }

    let items: Vec<ListItem> = app
        .stocks
        .iter()
        .map(|stock| {
            let selected = app.is_selected(&stock.ticker);
            let checkbox = if selected { "[✓]" } else { "[ ]" };
            let style = if selected {
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::White)
            };
            ListItem::new(format!(" {} {}", checkbox, stock.display())).style(style)
        })
        .collect();

    let highlight = if app.focus == Focus::Stocks {
        Style::default().add_modifier(Modifier::REVERSED)
    } else {
        Style::default().add_modifier(Modifier::UNDERLINED)
    };

    let list = List::new(items).block(block).highlight_style(highlight);

    // CONCEPT RATATUI : ListState
    // - Le widget fait défiler la liste pour garder l'élément sélectionné visible
    let mut state = ListState::default().with_selected(Some(app.cursor));
    frame.render_stateful_widget(list, area, &mut state);
}

// ============================================================================
// Panneau latéral : réglages, bouton, détails
// ============================================================================

fn render_side_panel(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(Param::ALL.len() as u16 + 2), // Réglages
            Constraint::Length(3),                           // Bouton
            Constraint::Min(0),                              // Détails
        ])
        .split(area);

    render_params(frame, app, chunks[0]);
    render_optimize_button(frame, app, chunks[1]);
    render_details(frame, app, chunks[2]);
}

/// Dessine les réglages de l'optimisation
fn render_params(frame: &mut Frame, app: &App, area: Rect) {
    let focused = app.focus == Focus::Params;
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(panel_border(focused))
        .title(" ⚙ Parameters ");

    let lines: Vec<Line> = Param::ALL
        .iter()
        .map(|&param| {
            let active = focused && param == app.param_cursor;
            let marker = if active { "▶ " } else { "  " };
            let value_style = if active {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::White)
            };
            Line::from(vec![
                Span::raw(format!("{}{:<20}", marker, param.label())),
                Span::styled(format!("◀ {} ▶", app.params.display_value(param)), value_style),
            ])
        })
        .collect();

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

/// Dessine le bouton d'optimisation (désactivé pendant le chargement)
fn render_optimize_button(frame: &mut Frame, app: &App, area: Rect) {
    let (text, style) = if app.is_loading_data() {
        let message = app
            .loading_message
            .clone()
            .unwrap_or_else(|| "Optimizing...".to_string());
        (
            format!("⏳ {}", message),
            Style::default().fg(Color::Gray).add_modifier(Modifier::ITALIC),
        )
    } else {
        (
            "⚛ [o] Optimize Portfolio".to_string(),
            Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD),
        )
    };

    let paragraph = Paragraph::new(Line::from(Span::styled(text, style)))
        .block(Block::default().borders(Borders::ALL).border_style(style))
        .alignment(Alignment::Center);

    frame.render_widget(paragraph, area);
}

/// Dessine les métriques historiques de l'action sous le curseur
fn render_details(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" ℹ Details ");

    let lines = match (app.current_stock(), &app.details) {
        (Some(stock), Some(metrics)) if metrics.ticker == stock.ticker => vec![
            Line::from(Span::styled(
                format!("{} · {}", stock.ticker, stock.name),
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(format!("Sector:           {}", stock.sector)),
            Line::from(format!("Expected return:  {}", format_percent(metrics.expected_return))),
            Line::from(format!("Volatility:       {}", format_percent(metrics.volatility))),
            Line::from(format!("Sharpe ratio:     {}", format_sharpe(metrics.sharpe_ratio))),
        ],
        (Some(stock), _) => vec![
            Line::from(Span::styled(
                format!("{} · {}", stock.ticker, stock.name),
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(format!("Sector: {}  ({})", stock.sector, stock.symbol)),
            Line::from(Span::styled(
                "[i] load historical metrics",
                Style::default().fg(Color::Gray),
            )),
        ],
        (None, _) => vec![Line::from("")],
    };

    frame.render_widget(
        Paragraph::new(lines).block(block).wrap(Wrap { trim: true }),
        area,
    );
}

// ============================================================================
// Footer : raccourcis
// ============================================================================

fn render_footer(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let key = |k: &'static str| Span::styled(k, Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD));

    let shortcuts = if app.is_awaiting_quit_confirmation() {
        quit_confirmation_line()
    } else {
        Line::from(vec![
            key("[q]"),
            Span::raw(" Quit  "),
            key("[Space]"),
            Span::raw(" Toggle  "),
            key("[a/c]"),
            Span::raw(" All/Clear  "),
            key("[Tab]"),
            Span::raw(" Panel  "),
            key("[←→]"),
            Span::raw(" Adjust  "),
            key("[/]"),
            Span::raw(" Search  "),
            key("[o]"),
            Span::raw(" Optimize  "),
            key("[r]"),
            Span::raw(" Results"),
        ])
    };

    let paragraph = Paragraph::new(vec![shortcuts])
        .block(block)
        .alignment(Alignment::Center);

    frame.render_widget(paragraph, area);
}

/// Message de confirmation de quit (partagé avec l'écran des résultats)
pub(crate) fn quit_confirmation_line() -> Line<'static> {
    Line::from(vec![
        Span::styled(
            "⚠  Press ",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            "[q]",
            Style::default()
                .fg(Color::Red)
                .add_modifier(Modifier::BOLD)
                .add_modifier(Modifier::SLOW_BLINK),
        ),
        Span::styled(
            " again to quit, any other key to cancel ⚠",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        ),
    ])
}

// ============================================================================
// Toast d'erreur
// ============================================================================

/// Dessine le toast en bas de l'écran, au-dessus du footer
fn render_toast(frame: &mut Frame, message: &str) {
    let area = toast_area(frame.size());

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Red))
        .title(" ⚠ Error ")
        .title(
            ratatui::widgets::block::Title::from(" [x] ")
                .alignment(Alignment::Right),
        );

    let paragraph = Paragraph::new(Line::from(Span::styled(
        message.to_string(),
        Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
    )))
    .block(block)
    .wrap(Wrap { trim: true });

    frame.render_widget(Clear, area);
    frame.render_widget(paragraph, area);
}

/// Zone du toast : 60% de la largeur, 4 lignes, collée au-dessus du footer
fn toast_area(size: Rect) -> Rect {
    let width = (size.width * 3 / 5).max(20).min(size.width);
    let height = 4.min(size.height);
    let x = size.x + (size.width - width) / 2;
    let y = size.y + size.height.saturating_sub(height + 3);
    Rect::new(x, y, width, height)
}

/// Zone centrée de `percent_x` × `percent_y` (popups)
pub(crate) fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::models::demo_stocks;
    use ratatui::{backend::TestBackend, Terminal};

    fn draw(app: &App) -> String {
        let backend = TestBackend::new(120, 30);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal.draw(|frame| render(frame, app)).unwrap();
        let buffer = terminal.backend().buffer().clone();
        buffer
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect::<String>()
    }

    #[test]
    fn test_dashboard_shows_stocks_and_count() {
        let mut app = App::with_stocks(&Config::default(), demo_stocks());
        app.toggle_stock("TCS");
        let screen = draw(&app);
        assert!(screen.contains("RELIANCE"));
        assert!(screen.contains("1 selected"));
        assert!(screen.contains("Optimize Portfolio"));
    }

    #[test]
    fn test_loading_disables_button() {
        let mut app = App::with_stocks(&Config::default(), demo_stocks());
        app.start_loading(Some("Optimizing 3 stocks...".to_string()));
        let screen = draw(&app);
        assert!(screen.contains("Optimizing 3 stocks..."));
        assert!(!screen.contains("Optimize Portfolio"));
    }

    #[test]
    fn test_toast_is_rendered() {
        let mut app = App::with_stocks(&Config::default(), demo_stocks());
        app.show_error("Please select at least 3 stocks");
        let screen = draw(&app);
        assert!(screen.contains("Please select at least 3 stocks"));
    }

    #[test]
    fn test_toast_area_fits_small_terminals() {
        let area = toast_area(Rect::new(0, 0, 10, 3));
        assert!(area.width <= 10);
        assert!(area.height <= 3);
    }
}
