use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use tf_core::frame::AsciiFrame;

use crate::player::LoopState;
use crate::session::Mode;

/// Ce que la barre d'état affiche.
#[derive(Clone, Debug)]
pub struct Status {
    pub mode: Mode,
    pub state: LoopState,
    pub width: u32,
    pub invert: bool,
    pub frames: u64,
    /// Message transitoire (sauvegarde, rechargement…).
    pub message: Option<String>,
    pub show_help: bool,
}

/// Dessine la frame ASCII et la barre d'état.
pub fn draw(frame: &mut Frame, ascii: Option<&AsciiFrame>, status: &Status) {
    let area = frame.area();
    let [canvas_area, status_area] =
        Layout::vertical([Constraint::Min(1), Constraint::Length(1)]).areas(area);

    // Le texte est affiché tel quel : une ligne de frame = une ligne terminal.
    let text = ascii.map_or_else(
        || vec![Line::from(Span::styled(
            " Aucune source",
            Style::default().fg(Color::DarkGray),
        ))],
        |f| f.lines().map(Line::from).collect(),
    );
    frame.render_widget(Paragraph::new(text), canvas_area);

    frame.render_widget(Paragraph::new(status_line(status)), status_area);

    if status.show_help {
        draw_help_overlay(frame, area);
    }
}

fn status_line(status: &Status) -> Line<'static> {
    let state_str = match (status.mode, status.state) {
        (Mode::Empty, _) => "· VIDE",
        (Mode::Image, _) => "■ IMAGE",
        (Mode::Video, LoopState::Running) => "▶ RUN",
        (Mode::Video, LoopState::Paused) => "⏸ PAUSE",
        (Mode::Video, LoopState::Idle | LoopState::Stopped) => "⏹ STOP",
    };

    let mut spans = vec![
        Span::styled(format!(" {state_str} "), Style::default().fg(Color::Green)),
        Span::raw(format!(
            "│ W:{} │ Inv:{} │ #{} ",
            status.width,
            if status.invert { "ON" } else { "OFF" },
            status.frames
        )),
    ];
    if let Some(msg) = &status.message {
        spans.push(Span::styled(
            format!("│ {msg} "),
            Style::default().fg(Color::Yellow),
        ));
    }
    spans.push(Span::styled("│ ? = aide", Style::default().fg(Color::DarkGray)));
    Line::from(spans)
}

fn draw_help_overlay(frame: &mut Frame, area: Rect) {
    let help_text = vec![
        Line::from(Span::styled(
            " txtframe : contrôles ",
            Style::default().fg(Color::Yellow),
        )),
        Line::from(""),
        Line::from(" q/Esc    Quitter"),
        Line::from(" Space    Lecture/Pause"),
        Line::from(" +/-      Largeur ±"),
        Line::from(" i        Inverser"),
        Line::from(" r        Réinitialiser"),
        Line::from(" ←/→      Seek ∓5 s"),
        Line::from(" s        Sauver la frame"),
        Line::from(" ?        Aide"),
    ];

    let help_width = 30u16;
    let help_height = help_text.len() as u16 + 2;
    let x = area.x + area.width.saturating_sub(help_width) / 2;
    let y = area.y + area.height.saturating_sub(help_height) / 2;
    let help_area = Rect::new(x, y, help_width.min(area.width), help_height.min(area.height));

    let help = Paragraph::new(help_text).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Aide ")
            .style(Style::default().bg(Color::Black).fg(Color::White)),
    );
    frame.render_widget(Clear, help_area);
    frame.render_widget(help, help_area);
}
