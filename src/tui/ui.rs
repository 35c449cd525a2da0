use crate::detail::{Citations, DetailView, LongText, Segment};
use crate::directory::LoadState;
use crate::error::FetchError;
use crate::search::Phase;
use crate::tui::app::{App, Focus};
use crate::tui::colors;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use unicode_width::UnicodeWidthStr;

const SEARCH_PREFIX: &str = " > ";

pub fn draw(frame: &mut Frame, app: &App) {
    let area = frame.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Title bar
            Constraint::Length(3), // Search bar
            Constraint::Min(5),    // Suggestions / detail
            Constraint::Length(1), // Status bar
        ])
        .split(area);

    draw_title_bar(frame, chunks[0]);
    draw_search_bar(frame, app, chunks[1]);

    match &app.load_state {
        LoadState::NotStarted | LoadState::Loading => draw_loading(frame, chunks[2]),
        LoadState::Failed(e) => draw_load_error(frame, e, chunks[2]),
        LoadState::Ready(_) => draw_body(frame, app, chunks[2]),
    }

    draw_status_bar(frame, app, chunks[3]);

    // Show cursor in the search bar while it (or the list under it) has focus
    if matches!(app.load_state, LoadState::Ready(_)) && app.focus != Focus::ConfirmButton {
        let cursor_x =
            chunks[1].x + 1 + SEARCH_PREFIX.len() as u16 + app.input.cursor_column() as u16;
        let cursor_y = chunks[1].y + 1;
        frame.set_cursor_position(Position::new(cursor_x, cursor_y));
    }
}

fn draw_title_bar(frame: &mut Frame, area: Rect) {
    let title = format!(" Fertilikey {}", crate::VERSION);
    let subtitle = " Fertility & family benefits by institution ";
    let padding = (area.width as usize).saturating_sub(title.width() + subtitle.width());

    let line = Line::from(vec![
        Span::styled(title, Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(" ".repeat(padding)),
        Span::raw(subtitle),
    ]);
    frame.render_widget(
        Paragraph::new(line).style(Style::default().fg(Color::White).bg(colors::HEADER_BG)),
        area,
    );
}

fn draw_search_bar(frame: &mut Frame, app: &App, area: Rect) {
    let focused = app.focus == Focus::QueryInput;
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(colors::border_style(focused))
        .title(" Search institutions ");

    let paragraph = if app.input.text.is_empty() && focused {
        Paragraph::new(Line::from(vec![
            Span::raw(SEARCH_PREFIX),
            Span::styled(
                "Institution name or city",
                Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
            ),
        ]))
    } else {
        Paragraph::new(format!("{}{}", SEARCH_PREFIX, app.input.text))
            .style(Style::default().fg(Color::White))
    };

    frame.render_widget(paragraph.block(block), area);
}

fn draw_loading(frame: &mut Frame, area: Rect) {
    let text = vec![
        Line::raw(""),
        Line::styled(
            "\u{23F3} Loading institutions...",
            Style::default().fg(Color::Cyan),
        ),
    ];
    frame.render_widget(Paragraph::new(text).alignment(Alignment::Center), area);
}

fn draw_load_error(frame: &mut Frame, error: &FetchError, area: Rect) {
    let text = vec![
        Line::raw(""),
        Line::styled(
            "Error Loading Data",
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        ),
        Line::raw(""),
        Line::raw(error.user_message()),
        Line::raw(""),
        Line::styled(
            "Please try refreshing later or contact support if the problem persists.",
            Style::default().fg(Color::Gray),
        ),
    ];
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Red));
    frame.render_widget(
        Paragraph::new(text)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .block(block),
        area,
    );
}

fn draw_body(frame: &mut Frame, app: &App, area: Rect) {
    match app.controller.phase() {
        Phase::Suggesting => draw_suggestions(frame, app, area),
        Phase::Selected => {
            if let Some(detail) = app.controller.detail() {
                draw_detail(frame, &detail, app.focus == Focus::ConfirmButton, area);
            }
        }
        Phase::Typing => {
            let query = &app.controller.state().query_text;
            let min_chars = app.controller.options().min_query_chars;
            let hint = if crate::search::is_searchable(query, min_chars) {
                format!("No institutions match '{}'", query)
            } else {
                "Keep typing to see suggestions".to_string()
            };
            draw_hint(frame, &hint, area);
        }
        Phase::Idle => {
            let hint = format!(
                "Type an institution name or city, or press \u{2193} to browse all {} institutions",
                app.controller.directory().len()
            );
            draw_hint(frame, &hint, area);
        }
    }
}

fn draw_hint(frame: &mut Frame, hint: &str, area: Rect) {
    let text = vec![
        Line::raw(""),
        Line::styled(hint.to_string(), Style::default().fg(Color::DarkGray)),
    ];
    frame.render_widget(
        Paragraph::new(text)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true }),
        area,
    );
}

fn draw_suggestions(frame: &mut Frame, app: &App, area: Rect) {
    let state = app.controller.state();
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(colors::border_style(matches!(app.focus, Focus::Suggestion(_))))
        .title(format!(" Suggestions ({}) ", state.suggestions.len()));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    // Keep the highlighted row on screen when the whole directory is listed
    let visible = inner.height as usize;
    let highlighted = state.highlighted();
    let offset = highlighted
        .map(|h| (h + 1).saturating_sub(visible))
        .unwrap_or(0);

    let lines: Vec<Line> = state
        .suggestions
        .iter()
        .enumerate()
        .skip(offset)
        .take(visible)
        .map(|(idx, record)| {
            let is_highlighted = highlighted == Some(idx);
            let bg = if is_highlighted {
                colors::HIGHLIGHT_BG
            } else if idx % 2 == 1 {
                colors::STRIPE_BG
            } else {
                Color::Reset
            };
            let name_style = if is_highlighted {
                Style::default().fg(Color::White).bg(bg).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::White).bg(bg)
            };

            let name = format!(" {}", record.name);
            let location = format!("  {}", record.location());
            let used = name.width() + location.width();
            let fill = (inner.width as usize).saturating_sub(used);

            Line::from(vec![
                Span::styled(name, name_style),
                Span::styled(location, Style::default().fg(Color::Gray).bg(bg)),
                Span::styled(" ".repeat(fill), Style::default().bg(bg)),
            ])
        })
        .collect();

    frame.render_widget(Paragraph::new(lines), inner);
}

fn section_heading(symbol: &'static str, title: &'static str, style: Style) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!(" {} ", symbol), style),
        Span::styled(title, Style::default().add_modifier(Modifier::BOLD)),
    ])
}

fn draw_detail(frame: &mut Frame, detail: &DetailView, focused: bool, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(colors::border_style(focused))
        .title(format!(" {} ", detail.title))
        .title_style(Style::default().fg(Color::White).add_modifier(Modifier::BOLD));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let text_width = (inner.width as usize).saturating_sub(4).max(10);
    let mut lines: Vec<Line> = Vec::new();

    // Paid leave
    lines.push(section_heading(
        detail.paid_leave.symbol(),
        "Paid Leave",
        colors::indicator_style(detail.paid_leave),
    ));
    for leave in &detail.leave_lines {
        lines.push(Line::from(vec![
            Span::styled(format!("   {}: ", leave.label), Style::default().fg(Color::Gray)),
            Span::raw(leave.text.clone()),
        ]));
    }
    if let Some(note) = detail.leave_note {
        lines.push(Line::styled(format!("   {}", note), Style::default().fg(Color::DarkGray)));
    }
    lines.push(Line::raw(""));

    // Fertility
    lines.push(section_heading(
        detail.fertility.symbol(),
        "Fertility Benefits",
        colors::indicator_style(detail.fertility),
    ));
    lines.push(Line::raw(format!("   {}", detail.fertility_message)));
    for item in &detail.fertility_details {
        lines.push(Line::raw(format!("   \u{2022} {}", item)));
    }
    lines.push(Line::from(vec![
        Span::styled("   Elective treatment covered: ", Style::default().fg(Color::Gray)),
        Span::styled(
            detail.elective,
            Style::default().fg(colors::color_for_elective(detail.elective)),
        ),
    ]));

    if let Some(benefits) = &detail.benefits_offered {
        push_long_text(&mut lines, "Benefits Offered", 'r', benefits, text_width);
    }
    if let Some(other) = &detail.other_details {
        push_long_text(&mut lines, "Additional Information", 'a', other, text_width);
    }

    // Sources
    if detail.citations != Citations::None {
        lines.push(Line::raw(""));
        lines.push(Line::styled(
            format!(" {}", detail.citations.heading()),
            Style::default().add_modifier(Modifier::BOLD),
        ));
        let bulleted = matches!(detail.citations, Citations::List(_));
        let mut link_no = 0;
        for citation in detail.citations.entries() {
            let lead = if bulleted { "   \u{2022} " } else { "   " };
            let mut spans = vec![Span::raw(lead)];
            for segment in &citation.segments {
                match segment {
                    Segment::Text(t) => spans.push(Span::raw(t.clone())),
                    Segment::Link(url) => {
                        link_no += 1;
                        spans.push(Span::styled(url.clone(), colors::link_style()));
                        if link_no <= 9 {
                            spans.push(Span::styled(
                                format!(" [{}]", link_no),
                                Style::default().fg(Color::Cyan),
                            ));
                        }
                    }
                }
            }
            lines.push(Line::from(spans));
        }
    }

    // Footer
    lines.push(Line::raw(""));
    lines.push(Line::styled(
        format!(" {}", detail.footer.name),
        Style::default().add_modifier(Modifier::BOLD),
    ));
    if let Some(address) = &detail.footer.address {
        lines.push(Line::styled(format!(" {}", address), Style::default().fg(Color::Gray)));
    }
    lines.push(Line::styled(
        format!(" {}", detail.footer.location),
        Style::default().fg(Color::Gray),
    ));
    if let Some(url) = &detail.footer.url_display {
        lines.push(Line::from(vec![
            Span::raw(" "),
            Span::styled(url.clone(), colors::link_style()),
            Span::styled(" [o]", Style::default().fg(Color::Cyan)),
        ]));
    }

    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner);
}

/// Collapsible block with its toggle hint underneath.
fn push_long_text<'a>(
    lines: &mut Vec<Line<'a>>,
    title: &'static str,
    key: char,
    text: &LongText,
    width: usize,
) {
    lines.push(Line::raw(""));
    lines.push(Line::styled(
        format!(" {}", title),
        Style::default().add_modifier(Modifier::BOLD),
    ));
    for line in text.visible_lines(width) {
        lines.push(Line::raw(format!("   {}", line)));
    }
    if text.overflows(width) {
        lines.push(Line::styled(
            format!("   [{}] {}", key, text.toggle_label()),
            Style::default().fg(Color::Cyan),
        ));
    }
}

fn draw_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let left_text = match (&app.status, &app.load_state) {
        (Some(status), _) => format!(" {}", status.text),
        (None, LoadState::NotStarted | LoadState::Loading) => {
            " \u{23F3} Loading...".to_string()
        }
        (None, LoadState::Failed(_)) => " Directory unavailable".to_string(),
        (None, LoadState::Ready(directory)) => format!(" {} institutions", directory.len()),
    };

    let right_text = match (&app.load_state, app.focus) {
        (LoadState::Ready(_), Focus::ConfirmButton) => {
            " r/a:Read More  o:Open site  y:Copy URL  1-9:Sources  Esc:Clear  Tab:Search  Ctrl+Q:Quit "
        }
        (LoadState::Ready(_), _) => {
            " \u{2191}\u{2193}:Navigate  Enter:Select  Esc:Close  Ctrl+Q:Quit "
        }
        _ => " Esc:Quit ",
    };

    // Build the status line: left-aligned text + padding + right-aligned text
    let available_width = area.width as usize;
    let left_len = left_text.width();
    let right_len = right_text.width();

    let status_str = if left_len + right_len < available_width {
        let padding = available_width - left_len - right_len;
        format!("{}{:padding$}{}", left_text, "", right_text, padding = padding)
    } else {
        // Not enough space, just show left text
        format!("{:width$}", left_text, width = available_width)
    };

    let status = Paragraph::new(status_str)
        .style(Style::default().fg(Color::White).bg(colors::HEADER_BG));

    frame.render_widget(status, area);
}
