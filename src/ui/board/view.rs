use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use ratatui::Frame;

use crate::task::{Task, TaskColumn, TaskPriority, TASK_COLUMNS};

use super::app::{AppState, DeleteConfirmState, StatusKind};
use super::editor::{DialogField, DialogMode, TaskDialog};

const COLOR_TEXT: Color = Color::Rgb(234, 236, 239);
const COLOR_MUTED: Color = Color::Rgb(160, 165, 172);
const COLOR_MUTED_DARK: Color = Color::Rgb(118, 124, 130);
const COLOR_INFO: Color = Color::Rgb(116, 198, 219);
const COLOR_WARNING: Color = Color::Rgb(244, 200, 98);
const COLOR_ERROR: Color = Color::Rgb(255, 107, 107);
const COLOR_SUCCESS: Color = Color::Rgb(126, 210, 146);
const COLOR_ACCENT: Color = Color::Rgb(122, 170, 255);
const COLOR_BORDER: Color = Color::Rgb(92, 126, 166);
const COLOR_MAGENTA: Color = Color::Rgb(214, 140, 230);

pub fn render(frame: &mut Frame, app: &mut AppState) {
    let area = frame.size();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Length(1),
                Constraint::Min(0),
                Constraint::Length(3),
            ]
            .as_ref(),
        )
        .split(area);
    let header = chunks[0];
    let main = chunks[1];
    let footer = chunks[2];

    render_header(frame, app, header);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(
            [
                Constraint::Percentage(25),
                Constraint::Percentage(25),
                Constraint::Percentage(25),
                Constraint::Percentage(25),
            ]
            .as_ref(),
        )
        .split(main);
    for (index, column) in TASK_COLUMNS.iter().enumerate() {
        render_column(frame, app, *column, index, columns[index]);
    }

    render_footer(frame, app, footer);

    if let Some(dialog) = app.dialog.as_ref() {
        render_dialog_modal(frame, area, dialog);
    }
    if let Some(state) = app.delete_confirm.as_ref() {
        render_delete_confirm_modal(frame, area, state);
    }
}

fn render_header(frame: &mut Frame, app: &AppState, area: Rect) {
    let mut spans = vec![Span::styled(
        "deck",
        Style::default().fg(COLOR_ACCENT).add_modifier(Modifier::BOLD),
    )];

    let search_label = if app.search_active {
        format!("  search: {}_", app.search_input)
    } else if !app.search_input.is_empty() {
        format!("  search: {}", app.search_input)
    } else {
        String::new()
    };
    if !search_label.is_empty() {
        spans.push(Span::styled(search_label, Style::default().fg(COLOR_INFO)));
    }
    if app.drag.active_task().is_some() {
        spans.push(Span::styled(
            "  moving…",
            Style::default().fg(COLOR_MAGENTA),
        ));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn priority_style(priority: TaskPriority) -> Style {
    match priority {
        TaskPriority::Low => Style::default().fg(COLOR_MUTED),
        TaskPriority::Medium => Style::default().fg(COLOR_WARNING),
        TaskPriority::Hard => Style::default().fg(COLOR_ERROR),
    }
}

fn card_lines<'a>(task: &Task, selected: bool, dragging: bool) -> Vec<Line<'a>> {
    let title_style = if dragging {
        Style::default()
            .fg(COLOR_MAGENTA)
            .add_modifier(Modifier::BOLD)
    } else if selected {
        Style::default()
            .fg(COLOR_TEXT)
            .add_modifier(Modifier::BOLD | Modifier::REVERSED)
    } else {
        Style::default().fg(COLOR_TEXT)
    };

    let marker = if selected { "> " } else { "  " };
    vec![
        Line::from(vec![
            Span::styled(marker.to_string(), Style::default().fg(COLOR_ACCENT)),
            Span::styled(task.title.clone(), title_style),
        ]),
        Line::from(vec![
            Span::raw("  "),
            Span::styled(format!("#{}", task.id), Style::default().fg(COLOR_MUTED_DARK)),
            Span::raw(" "),
            Span::styled(task.priority.to_string(), priority_style(task.priority)),
        ]),
    ]
}

fn render_column(frame: &mut Frame, app: &AppState, column: TaskColumn, index: usize, area: Rect) {
    let focused = app.focused == index;
    let tasks = app.tasks_in(column);
    let selected = app.selected_index(column);
    let dragging = app.drag.active_task();

    let mut lines: Vec<Line> = Vec::new();
    for (position, task) in tasks.iter().enumerate() {
        let is_selected = focused && selected == Some(position);
        let is_dragging = dragging == Some(task.id);
        lines.extend(card_lines(task, is_selected, is_dragging));
    }

    if app.is_loading(column) {
        lines.push(Line::from(Span::styled(
            "  loading…",
            Style::default().fg(COLOR_MUTED),
        )));
    } else if tasks.is_empty() {
        lines.push(Line::from(Span::styled(
            "  no tasks",
            Style::default().fg(COLOR_MUTED_DARK),
        )));
    }
    if app.column_has_more(column) {
        lines.push(Line::from(Span::styled(
            "  more… (f)",
            Style::default().fg(COLOR_MUTED),
        )));
    }

    let border_style = if focused {
        Style::default().fg(COLOR_BORDER).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(COLOR_MUTED_DARK)
    };
    let title = format!(" {} ({}) ", column.title(), app.column_count(column));

    let widget = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(border_style)
            .title(Span::styled(title, Style::default().fg(COLOR_TEXT))),
    );
    frame.render_widget(widget, area);
}

fn render_footer(frame: &mut Frame, app: &AppState, area: Rect) {
    let mut lines = Vec::new();
    if let Some((message, kind)) = app.feedback() {
        let style = match kind {
            StatusKind::Error => Style::default().fg(COLOR_ERROR),
            StatusKind::Info => Style::default().fg(COLOR_SUCCESS),
        };
        lines.push(Line::from(Span::styled(message.to_string(), style)));
    } else {
        lines.push(Line::from(""));
    }
    lines.push(Line::from(Span::styled(
        app.footer_hint(),
        Style::default().fg(COLOR_MUTED),
    )));

    let widget = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::TOP)
            .border_style(Style::default().fg(COLOR_MUTED_DARK)),
    );
    frame.render_widget(widget, area);
}

fn field_line<'a>(label: &str, value: String, active: bool) -> Line<'a> {
    let label_style = if active {
        Style::default().fg(COLOR_ACCENT).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(COLOR_MUTED)
    };
    let marker = if active { "> " } else { "  " };
    Line::from(vec![
        Span::styled(format!("{marker}{label:<12}"), label_style),
        Span::styled(value, Style::default().fg(COLOR_TEXT)),
    ])
}

fn render_dialog_modal(frame: &mut Frame, area: Rect, dialog: &TaskDialog) {
    let title = match dialog.mode() {
        DialogMode::Create => " New Task ",
        DialogMode::Edit => " Edit Task ",
    };

    let active = dialog.active_field();
    let mut lines = vec![
        field_line(
            "Title",
            dialog.title().to_string(),
            active == DialogField::Title,
        ),
        field_line(
            "Description",
            dialog.description().to_string(),
            active == DialogField::Description,
        ),
        field_line(
            "Column",
            dialog.column().title().to_string(),
            active == DialogField::Column,
        ),
        field_line(
            "Priority",
            dialog.priority().to_string(),
            active == DialogField::Priority,
        ),
    ];
    if let Some(error) = dialog.error() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            error.to_string(),
            Style::default().fg(COLOR_ERROR),
        )));
    }

    let modal = centered_rect(area, 60, (lines.len() + 2) as u16);
    frame.render_widget(Clear, modal);
    let widget = Paragraph::new(lines).wrap(Wrap { trim: false }).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(COLOR_BORDER))
            .title(Span::styled(
                title,
                Style::default().fg(COLOR_ACCENT).add_modifier(Modifier::BOLD),
            )),
    );
    frame.render_widget(widget, modal);
}

fn render_delete_confirm_modal(frame: &mut Frame, area: Rect, state: &DeleteConfirmState) {
    let lines = vec![
        Line::from(Span::styled(
            format!("Delete \"{}\"?", state.task.title),
            Style::default().fg(COLOR_TEXT),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "y delete  esc cancel",
            Style::default().fg(COLOR_MUTED),
        )),
    ];

    let modal = centered_rect(area, 50, 5);
    frame.render_widget(Clear, modal);
    let widget = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(COLOR_ERROR))
                .title(Span::styled(
                    " Confirm ",
                    Style::default().fg(COLOR_ERROR).add_modifier(Modifier::BOLD),
                )),
        );
    frame.render_widget(widget, modal);
}

fn centered_rect(area: Rect, percent_x: u16, height: u16) -> Rect {
    let width = area.width * percent_x / 100;
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect {
        x,
        y,
        width,
        height: height.min(area.height),
    }
}
