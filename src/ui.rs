//! Terminal UI rendering.
//!
//! All drawing logic lives here, separated from application state ([`App`])
//! and input handling ([`crate::input`]).  Rendering only reads the feed's
//! published signals, never the controller's internals.
//!
//! ## For contributors
//!
//! * Each screen has its own `draw_*` function; the feed screen is a list,
//!   an optional one-line search box and a one-line status bar.
//! * Colours and styles are defined inline.

use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, DetailView, LoginField, LoginForm, Screen};

/// Draw the complete UI for one frame.
pub fn draw(app: &mut App, frame: &mut Frame) {
    let area = frame.area();
    match &app.screen {
        Screen::Login(form) => draw_login(form, frame, area),
        Screen::Detail(view) => draw_detail(view, frame, area),
        Screen::Feed => draw_feed(app, frame),
    }
}

fn draw_feed(app: &mut App, frame: &mut Frame) {
    let search_height = u16::from(app.search.active);
    let [list_area, search_area, status_area] = Layout::vertical([
        Constraint::Min(1),
        Constraint::Length(search_height),
        Constraint::Length(1),
    ])
    .areas(frame.area());

    draw_dish_list(app, frame, list_area);
    if app.search.active {
        draw_search_box(app, frame, search_area);
    }
    draw_status_bar(app, frame, status_area);
}

/// Render the scrollable dish list.
fn draw_dish_list(app: &mut App, frame: &mut Frame, area: Rect) {
    let list_items: Vec<ListItem> = app
        .signals
        .items
        .borrow()
        .iter()
        .map(|dish| {
            let mut spans = vec![
                Span::styled(format!("{:>5}", dish.id), Style::default().fg(Color::DarkGray)),
                Span::raw(" "),
                Span::styled(dish.name.clone(), Style::default().fg(Color::White)),
            ];
            if !dish.description.is_empty() {
                spans.push(Span::raw("  "));
                spans.push(Span::styled(
                    dish.description.clone(),
                    Style::default().fg(Color::Gray),
                ));
            }
            if dish.has_image {
                spans.push(Span::styled(" [img]", Style::default().fg(Color::Cyan)));
            }
            ListItem::new(Line::from(spans))
        })
        .collect();

    let title = match app.feed.current_search() {
        Some(term) => format!(" Dishes matching \"{term}\" "),
        None => " Dishes ".to_string(),
    };

    let list = List::new(list_items)
        .block(Block::default().title(title).borders(Borders::ALL))
        .highlight_style(
            Style::default()
                .add_modifier(Modifier::BOLD)
                .bg(Color::DarkGray),
        )
        .highlight_symbol("▸ ");

    frame.render_stateful_widget(list, area, &mut app.list_state);
}

fn draw_search_box(app: &App, frame: &mut Frame, area: Rect) {
    let line = Line::from(vec![
        Span::styled(" / ", Style::default().fg(Color::Yellow)),
        Span::raw(app.search.input.as_str()),
        Span::styled("█", Style::default().fg(Color::Yellow)),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

/// Render the bottom status bar.
fn draw_status_bar(app: &App, frame: &mut Frame, area: Rect) {
    let mut spans = vec![
        Span::raw(" "),
        Span::styled(app.status.as_str(), Style::default().fg(Color::Yellow)),
        Span::raw("  "),
        Span::styled(
            format!("{} dishes", app.item_count()),
            Style::default().fg(Color::Green),
        ),
    ];
    if app.is_loading() {
        spans.push(Span::styled("  loading…", Style::default().fg(Color::Magenta)));
    } else if app.feed.is_last_page() {
        spans.push(Span::styled("  (end)", Style::default().fg(Color::DarkGray)));
    }
    if let Some(at) = app.last_updated {
        spans.push(Span::styled(
            format!("  updated {}", at.format("%H:%M:%S")),
            Style::default().fg(Color::DarkGray),
        ));
    }
    spans.push(Span::raw(
        "  q: quit  ↑/↓: scroll  r: refresh  /: search  ⏎: open  L: logout",
    ));
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn draw_login(form: &LoginForm, frame: &mut Frame, area: Rect) {
    let [_, form_area, _] = Layout::vertical([
        Constraint::Fill(1),
        Constraint::Length(9),
        Constraint::Fill(1),
    ])
    .areas(area);

    let field = |label: &str, value: String, focused: bool| {
        let style = if focused {
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        Line::from(vec![
            Span::styled(format!(" {label:<10}"), style),
            Span::raw(value),
            Span::styled(if focused { "█" } else { "" }, style),
        ])
    };

    let mut lines = vec![
        Line::raw(""),
        field(
            "Login",
            form.username.clone(),
            form.focus == LoginField::Username,
        ),
        field(
            "Password",
            "•".repeat(form.password.chars().count()),
            form.focus == LoginField::Password,
        ),
        Line::raw(""),
    ];
    if form.submitting {
        lines.push(Line::styled(" Signing in…", Style::default().fg(Color::Magenta)));
    } else if let Some(err) = &form.error {
        lines.push(Line::styled(format!(" {err}"), Style::default().fg(Color::Red)));
    }
    lines.push(Line::styled(
        " Tab: switch field  ⏎: sign in  Esc: quit",
        Style::default().fg(Color::DarkGray),
    ));

    let block = Block::default().title(" Sign in ").borders(Borders::ALL);
    frame.render_widget(Paragraph::new(lines).block(block), form_area);
}

fn draw_detail(view: &DetailView, frame: &mut Frame, area: Rect) {
    let mut lines: Vec<Line> = Vec::new();

    match (&view.detail, &view.error) {
        (Some(detail), _) => {
            let dish = &detail.dish;
            lines.push(Line::styled(
                dish.name.clone(),
                Style::default().add_modifier(Modifier::BOLD),
            ));
            lines.push(Line::raw(""));
            if !dish.description.is_empty() {
                lines.push(Line::raw(dish.description.clone()));
                lines.push(Line::raw(""));
            }
            lines.push(Line::styled(
                if dish.has_image {
                    "Image available"
                } else {
                    "No image"
                },
                Style::default().fg(Color::DarkGray),
            ));
            lines.push(Line::raw(""));
            lines.push(Line::styled(
                "Ingredients",
                Style::default().fg(Color::Cyan),
            ));
            for ingredient in &detail.ingredients {
                lines.push(Line::from(vec![
                    Span::raw(format!("  {:<30}", ingredient.name)),
                    Span::styled(
                        format!("{:>8.1} g", ingredient.weight_grams),
                        Style::default().fg(Color::Green),
                    ),
                ]));
            }
            lines.push(Line::from(vec![
                Span::raw(format!("  {:<30}", "Total")),
                Span::styled(
                    format!("{:>8.1} g", detail.total_weight_grams()),
                    Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
                ),
            ]));
        }
        (None, Some(err)) => {
            lines.push(Line::styled(err.clone(), Style::default().fg(Color::Red)));
        }
        (None, None) if view.loading => {
            lines.push(Line::styled("Loading…", Style::default().fg(Color::Magenta)));
        }
        (None, None) => {}
    }

    let block = Block::default()
        .title(format!(" {} ", view.title))
        .title_bottom(" Esc: back  ↑/↓: scroll  q: quit ")
        .borders(Borders::ALL);
    let body = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((view.scroll, 0));
    frame.render_widget(body, area);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
