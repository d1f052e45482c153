use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Clear, Gauge, Padding, Paragraph, Wrap};

use crate::app::media::BUFFER_WINDOW_SECS;

use super::{PlayerNotice, PlayerView, format_clock, truncate};

pub(super) fn draw_player(
    frame: &mut Frame,
    view: &PlayerView,
    status: &str,
    notice: Option<&PlayerNotice>,
    console_input: Option<&str>,
) {
    let bg = Block::default().style(Style::default().bg(Color::Black));
    frame.render_widget(bg, frame.area());

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(8),
            Constraint::Length(3),
            Constraint::Length(3),
        ])
        .split(frame.area());

    frame.render_widget(header_line(view), chunks[0]);

    let body_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(62), Constraint::Percentage(38)])
        .split(chunks[1]);

    draw_playback_panel(frame, view, body_chunks[0]);
    draw_guard_panel(frame, view, body_chunks[1]);

    let mut controls =
        "Space play/pause  ←/→ seek ±10s  0 rewind  ↑/↓ volume  q quit".to_string();
    if view.dev_mode {
        controls.push_str("  : console");
    }
    let command_bar = Paragraph::new(controls)
        .style(Style::default().fg(Color::Rgb(185, 195, 210)))
        .alignment(Alignment::Center)
        .block(panel_block("Controls"));
    frame.render_widget(command_bar, chunks[2]);

    let status_widget = Paragraph::new(status.to_string())
        .style(status_style(status))
        .block(panel_block("Status"));
    frame.render_widget(status_widget, chunks[3]);

    if let Some(notice) = notice {
        let popup_area = popup_rect_for_text(frame.area(), &notice.message);
        frame.render_widget(Clear, popup_area);
        let popup = Paragraph::new(format!("{}\n\nPress any key to continue.", notice.message))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .block(modal_block(notice.title));
        frame.render_widget(popup, popup_area);
    } else if let Some(input) = console_input {
        let popup_area = console_rect(frame.area());
        frame.render_widget(Clear, popup_area);
        let prompt = Paragraph::new(format!("> {input}_"))
            .style(Style::default().fg(Color::Rgb(230, 230, 230)))
            .block(modal_block("Debug Console (Enter run, Esc close)"));
        frame.render_widget(prompt, popup_area);
    }
}

fn header_line(view: &PlayerView) -> Paragraph<'static> {
    let source_text = match &view.source {
        Some(source) => truncate(source, 48),
        None => "<no source>".to_string(),
    };
    let state_text = if view.source.is_none() {
        "STOPPED"
    } else if view.paused {
        "PAUSED"
    } else {
        "PLAYING"
    };
    let mut spans = vec![
        Span::styled(
            "SEEKGUARD",
            Style::default()
                .fg(Color::Rgb(110, 170, 255))
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled("   ", Style::default()),
        Span::styled(source_text, Style::default().fg(Color::Rgb(185, 195, 210))),
        Span::styled("   ", Style::default()),
        Span::styled(state_text, Style::default().fg(Color::Yellow)),
    ];
    if view.dev_mode {
        spans.push(Span::styled("   ", Style::default()));
        spans.push(Span::styled(
            "DEV",
            Style::default()
                .fg(Color::Rgb(255, 145, 120))
                .add_modifier(Modifier::BOLD),
        ));
    }
    Paragraph::new(Line::from(spans))
        .alignment(Alignment::Center)
        .block(panel_block("Player"))
}

fn draw_playback_panel(frame: &mut Frame, view: &PlayerView, area: Rect) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(0),
        ])
        .split(area);

    let position_ratio = if view.duration > 0.0 {
        (view.position / view.duration).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let position = Gauge::default()
        .block(panel_block("Position"))
        .gauge_style(
            Style::default()
                .fg(Color::Rgb(130, 190, 255))
                .bg(Color::Black)
                .add_modifier(Modifier::BOLD),
        )
        .label(format!(
            "{} / {}",
            format_clock(view.position),
            format_clock(view.duration)
        ))
        .ratio(position_ratio);
    frame.render_widget(position, rows[0]);

    let buffered_ratio = (view.buffered_ahead / BUFFER_WINDOW_SECS).clamp(0.0, 1.0);
    let buffered = Gauge::default()
        .block(panel_block("Buffered"))
        .gauge_style(
            Style::default()
                .fg(Color::Rgb(125, 135, 150))
                .bg(Color::Black),
        )
        .label(format!("{:.0}s ahead", view.buffered_ahead))
        .ratio(buffered_ratio);
    frame.render_widget(buffered, rows[1]);

    let volume = Gauge::default()
        .block(panel_block("Volume"))
        .gauge_style(
            Style::default()
                .fg(Color::Rgb(205, 165, 255))
                .bg(Color::Black),
        )
        .label(format!("{:.0}%", view.volume * 100.0))
        .ratio(view.volume.clamp(0.0, 1.0));
    frame.render_widget(volume, rows[2]);
}

fn draw_guard_panel(frame: &mut Frame, view: &PlayerView, area: Rect) {
    let state_text = if view.emergency { "EMERGENCY" } else { "OK" };
    let text = format!(
        "Seeks (this video)\n{}\n\nLast 10s / 30s\n{} / {}\n\nSession seeks\n{}\n\nRate-limit hits\n{}\n\nGuard state\n{}",
        view.seek_count,
        view.recent_10s,
        view.recent_30s,
        view.total_seeks,
        view.rate_limit_hits,
        state_text,
    );
    let style = if view.emergency {
        Style::default()
            .fg(Color::Rgb(255, 145, 120))
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::Rgb(230, 230, 230))
    };
    let panel = Paragraph::new(text)
        .style(style)
        .alignment(Alignment::Left)
        .block(panel_block("Seek Guard"));
    frame.render_widget(panel, area);
}

fn panel_block(title: &'static str) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(Color::Rgb(125, 135, 150)))
        .title(title)
}

fn modal_block(title: &'static str) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(
            Style::default()
                .fg(Color::Rgb(160, 190, 235))
                .add_modifier(Modifier::BOLD),
        )
        .title(title)
        .padding(Padding::new(2, 2, 1, 1))
}

fn status_style(status: &str) -> Style {
    if status.starts_with("ERROR:") {
        Style::default()
            .fg(Color::Rgb(255, 145, 120))
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::Rgb(205, 165, 255))
    }
}

fn centered_fixed_rect(width: u16, height: u16, area: Rect) -> Rect {
    let clamped_width = width.min(area.width.max(1));
    let clamped_height = height.min(area.height.max(1));
    let x = area.x + area.width.saturating_sub(clamped_width) / 2;
    let y = area.y + area.height.saturating_sub(clamped_height) / 2;
    Rect::new(x, y, clamped_width, clamped_height)
}

fn popup_rect_for_text(area: Rect, text: &str) -> Rect {
    let max_line_width = text
        .lines()
        .map(|line| line.chars().count() as u16)
        .max()
        .unwrap_or(0);
    let line_count = text.lines().count() as u16;

    let available_width = area.width.saturating_sub(2).max(1);
    let width = max_line_width
        .saturating_add(10)
        .clamp(44.min(available_width), 72.min(available_width));

    let available_height = area.height.saturating_sub(2).max(1);
    let height = line_count
        .saturating_add(7)
        .clamp(9.min(available_height), 20.min(available_height));

    centered_fixed_rect(width, height, area)
}

fn console_rect(area: Rect) -> Rect {
    let width = area.width.saturating_sub(8).clamp(1, 72);
    let height = 5.min(area.height.max(1));
    centered_fixed_rect(width, height, area)
}
