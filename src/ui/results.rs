// ============================================================================
// Results - Rendu des résultats d'optimisation
// ============================================================================
// Affiche :
// - Les métriques du portefeuille (rendement, risque, Sharpe, durée)
// - Les actions retenues avec leur poids
// - Les métriques du circuit QAOA
// - Le tableau des actions candidates
// ============================================================================

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, Wrap},
    Frame,
};

use crate::app::App;
use crate::models::{
    format_duration, format_percent, format_sharpe, format_weight, OptimizationResponse,
};
use crate::ui::dashboard::{create_layout, quit_confirmation_line, render_header};

/// Dessine l'écran des résultats
pub fn render_results(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = create_layout(area);
    render_header(frame, app, chunks[0]);

    match &app.results {
        Some(results) => render_body(frame, app, results, chunks[1]),
        None => {
            let paragraph = Paragraph::new("No results yet")
                .block(Block::default().borders(Borders::ALL))
                .alignment(Alignment::Center);
            frame.render_widget(paragraph, chunks[1]);
        }
    }

    render_results_footer(frame, app, chunks[2]);
}

fn render_body(frame: &mut Frame, app: &App, results: &OptimizationResponse, area: Rect) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4), // Cartes de métriques
            Constraint::Length(4), // Actions retenues
            Constraint::Min(0),    // QAOA + tableau
        ])
        .split(area);

    render_metric_cards(frame, app, results, rows[0]);
    render_selected_chips(frame, results, rows[1]);

    let bottom = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(32), Constraint::Min(0)])
        .split(rows[2]);

    render_qaoa_metrics(frame, results, bottom[0]);
    render_stock_table(frame, results, bottom[1]);
}

/// Une carte : titre + valeur en gras
fn metric_card<'a>(title: &'a str, value: String, color: Color) -> Paragraph<'a> {
    Paragraph::new(Line::from(Span::styled(
        value,
        Style::default().fg(color).add_modifier(Modifier::BOLD),
    )))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(title),
    )
    .alignment(Alignment::Center)
}

fn render_metric_cards(frame: &mut Frame, app: &App, results: &OptimizationResponse, area: Rect) {
    let cards = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, 4); 4])
        .split(area);

    let portfolio = &results.portfolio;
    let return_color = if portfolio.expected_return >= 0.0 {
        Color::Green
    } else {
        Color::Red
    };

    frame.render_widget(
        metric_card(" Expected Return ", format_percent(portfolio.expected_return), return_color),
        cards[0],
    );
    frame.render_widget(
        metric_card(" Risk ", format_percent(portfolio.portfolio_risk), Color::Yellow),
        cards[1],
    );
    frame.render_widget(
        metric_card(" Sharpe Ratio ", format_sharpe(portfolio.sharpe_ratio), Color::Magenta),
        cards[2],
    );

    let received = app
        .results_received_at
        .map(|t| format!(" at {}", t.format("%H:%M:%S")))
        .unwrap_or_default();
    frame.render_widget(
        metric_card(
            " Computation ",
            format!("{}{}", format_duration(results.computation_time), received),
            Color::White,
        ),
        cards[3],
    );
}

/// Actions retenues sous forme de "chips" TICKER 33.3%
fn render_selected_chips(frame: &mut Frame, results: &OptimizationResponse, area: Rect) {
    let mut spans = Vec::new();
    for (ticker, weight) in results.portfolio.allocations() {
        spans.push(Span::styled(
            format!(" {} ", ticker),
            Style::default().fg(Color::Black).bg(Color::Green).add_modifier(Modifier::BOLD),
        ));
        spans.push(Span::styled(
            format!(" {} ", format_weight(weight)),
            Style::default().fg(Color::Green),
        ));
        spans.push(Span::raw("  "));
    }

    let title = format!(" ✓ Selected Stocks ({}) ", results.portfolio.selected_stocks.len());
    let paragraph = Paragraph::new(Line::from(spans))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan))
                .title(title),
        )
        .wrap(Wrap { trim: false });

    frame.render_widget(paragraph, area);
}

fn render_qaoa_metrics(frame: &mut Frame, results: &OptimizationResponse, area: Rect) {
    let m = &results.qaoa_metrics;
    let label = Style::default().fg(Color::Gray);
    let value = Style::default().fg(Color::White).add_modifier(Modifier::BOLD);

    let line = |name: &'static str, v: String| {
        Line::from(vec![Span::styled(format!("{:<14}", name), label), Span::styled(v, value)])
    };

    let lines = vec![
        line("Qubits", m.num_qubits.to_string()),
        line("Circuit depth", m.circuit_depth.to_string()),
        line("QAOA layers", m.qaoa_layers.to_string()),
        line("Iterations", m.iterations.to_string()),
        line("Optimal cost", format!("{:.4}", m.optimal_cost)),
    ];

    frame.render_widget(
        Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan))
                .title(" ⚛ QAOA Metrics "),
        ),
        area,
    );
}

/// Tableau : ticker, rendement, volatilité, statut
fn render_stock_table(frame: &mut Frame, results: &OptimizationResponse, area: Rect) {
    let header = Row::new(vec!["Stock", "Expected Return", "Volatility", "Status"])
        .style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD));

    let rows: Vec<Row> = results
        .stock_metrics
        .iter()
        .map(|(ticker, metric)| {
            let status = if metric.selected {
                Cell::from("✓ Selected").style(Style::default().fg(Color::Green))
            } else {
                Cell::from("—").style(Style::default().fg(Color::Gray))
            };
            Row::new(vec![
                Cell::from(ticker.clone()),
                Cell::from(format_percent(metric.expected_return)),
                Cell::from(format_percent(metric.volatility)),
                status,
            ])
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(12),
            Constraint::Length(16),
            Constraint::Length(12),
            Constraint::Min(10),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(" 📊 Stock Metrics "),
    );

    frame.render_widget(table, area);
}

fn render_results_footer(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let line = if app.is_awaiting_quit_confirmation() {
        quit_confirmation_line()
    } else {
        Line::from(vec![
            Span::styled("[ESC]", Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)),
            Span::raw(" Back  "),
            Span::styled("[o]", Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)),
            Span::raw(" Re-run  "),
            Span::styled("[q]", Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)),
            Span::raw(" Quit"),
        ])
    };

    frame.render_widget(
        Paragraph::new(line).block(block).alignment(Alignment::Center),
        area,
    );
}
