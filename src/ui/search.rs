// ============================================================================
// Search - Popup de recherche d'actions
// ============================================================================
// Ligne de saisie + liste des résultats renvoyés par /api/stocks/search
// ============================================================================

use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph},
    Frame,
};

use crate::app::App;
use crate::ui::dashboard::centered_rect;

/// Dessine le popup de recherche par-dessus l'écran courant
pub fn render_search(frame: &mut Frame, app: &App) {
    let area = centered_rect(70, 60, frame.size());
    frame.render_widget(Clear, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(4), Constraint::Min(0)])
        .split(area);

    // Ligne de saisie
    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Green))
        .title(" 🔍 Search stocks ");

    let input_line = Line::from(vec![
        Span::styled("Query: ", Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
        Span::styled(app.search_query.as_str(), Style::default().fg(Color::White)),
        Span::styled("█", Style::default().fg(Color::White).add_modifier(Modifier::SLOW_BLINK)),
    ]);

    let help_line = Line::from(vec![
        Span::styled("[Enter]", Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)),
        Span::raw(" Add to selection  "),
        Span::styled("[↑↓]", Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)),
        Span::raw(" Move  "),
        Span::styled("[ESC]", Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)),
        Span::raw(" Cancel"),
    ]);

    frame.render_widget(
        Paragraph::new(vec![input_line, help_line]).block(input_block),
        chunks[0],
    );

    // Résultats : masqués tant qu'aucune recherche n'a abouti
    let results_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Green));

    match &app.search_results {
        None => {
            frame.render_widget(results_block, chunks[1]);
        }
        Some(results) if results.is_empty() => {
            let paragraph = Paragraph::new(Line::from(Span::styled(
                "No stocks found",
                Style::default().fg(Color::Gray),
            )))
            .block(results_block);
            frame.render_widget(paragraph, chunks[1]);
        }
        Some(results) => {
            let items: Vec<ListItem> = results
                .iter()
                .map(|stock| {
                    let marker = if app.is_selected(&stock.ticker) { "✓" } else { " " };
                    ListItem::new(format!(" {} {}", marker, stock.display()))
                })
                .collect();

            let list = List::new(items)
                .block(results_block)
                .highlight_style(Style::default().add_modifier(Modifier::REVERSED));

            let mut state = ListState::default().with_selected(Some(app.search_cursor));
            frame.render_stateful_widget(list, chunks[1], &mut state);
        }
    }
}
