//! Pure rendering: everything drawn comes from the view model, the mode and the date.

use chrono::NaiveDate;
use mytodo_core::attachment::Attachment;
use mytodo_core::task::{ReminderType, Task};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap};

use crate::app::{Mode, SectionField};
use crate::components::{sidebar, task_list};
use crate::format::{due_label, reminder_label};
use crate::view_model::{ToastKind, ViewModel};

const SIDEBAR_WIDTH: u16 = 26;

pub fn draw(frame: &mut Frame, model: &ViewModel, mode: &Mode, today: NaiveDate) {
    let area = frame.area();

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(area);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(SIDEBAR_WIDTH), Constraint::Min(0)])
        .split(layout[1]);

    render_title_bar(frame, model, layout[0]);
    sidebar::render(frame, body[0], model);
    task_list::render(frame, body[1], model, today);
    render_status_bar(frame, model, mode, layout[2]);

    // Overlays
    match mode {
        Mode::Normal => {}
        Mode::NewTask { input } => render_input_bar(frame, " New task ", input, area),
        Mode::TaskDetail {
            task,
            attachments,
            cursor,
        } => render_task_detail(frame, task, attachments, *cursor, today, area),
        Mode::EditTitle { input, .. } => render_input_bar(frame, " Title ", input, area),
        Mode::EditDescription { input, .. } => {
            render_input_bar(frame, " Description ", input, area)
        }
        Mode::EditDueDate { input, .. } => {
            render_input_bar(frame, " Due date (YYYY-MM-DD, empty clears) ", input, area)
        }
        Mode::ReminderPick { index, .. } => {
            let items: Vec<String> = ReminderType::ALL
                .iter()
                .map(|r| r.display_name().to_string())
                .collect();
            render_picker(frame, " Reminder ", &items, *index, area)
        }
        Mode::ReminderDay { kind, input, .. } => {
            let label = match kind {
                ReminderType::Weekly => " Weekday (0 = Sun .. 6 = Sat) ",
                _ => " Day of month (1-31) ",
            };
            render_input_bar(frame, label, input, area)
        }
        Mode::SectionPick { index, .. } => {
            let items: Vec<String> = std::iter::once("(no section)".to_string())
                .chain(model.sections.iter().map(|s| format!("{} {}", s.icon, s.name)))
                .collect();
            render_picker(frame, " Move to section ", &items, *index, area)
        }
        Mode::AddUrl { input, .. } => render_input_bar(frame, " Attach URL ", input, area),
        Mode::AttachFile { input, .. } => {
            render_input_bar(frame, " Attach file (image or PDF path) ", input, area)
        }
        Mode::ConfirmDelete { task } => render_confirm(
            frame,
            &format!("Delete \"{}\" permanently?", task.title),
            area,
        ),
        Mode::SectionList { index } => {
            let items: Vec<String> = model
                .sections
                .iter()
                .map(|s| format!("{} {} ({})", s.icon, s.name, s.task_count))
                .collect();
            render_picker(frame, " Sections ", &items, *index, area)
        }
        Mode::NewSection { input } => render_input_bar(frame, " New section ", input, area),
        Mode::EditSection { field, input, .. } => {
            let label = match field {
                SectionField::Name => " Section name ",
                SectionField::Icon => " Section icon ",
            };
            render_input_bar(frame, label, input, area)
        }
        Mode::ConfirmDeleteSection { section } => render_confirm(
            frame,
            &format!(
                "Delete section \"{}\"? Its tasks are kept without a section.",
                section.name
            ),
            area,
        ),
    }
}

fn render_title_bar(frame: &mut Frame, model: &ViewModel, area: Rect) {
    let mut spans = vec![
        Span::styled(" MyToDo ", Style::default().bold().fg(Color::Cyan)),
        Span::raw("| "),
        Span::styled(model.view_title(), Style::default().fg(Color::Yellow)),
    ];
    if model.stats.reminders > 0 {
        spans.push(Span::raw(" | "));
        spans.push(Span::styled(
            format!("{} reminder(s) due", model.stats.reminders),
            Style::default().fg(Color::Magenta),
        ));
    }
    if model.has_pending() {
        spans.push(Span::styled(" …", Style::default().fg(Color::DarkGray)));
    }
    frame.render_widget(Line::from(spans), area);
}

fn render_status_bar(frame: &mut Frame, model: &ViewModel, mode: &Mode, area: Rect) {
    if let Some(toast) = &model.toast {
        let color = match toast.kind {
            ToastKind::Info => Color::Green,
            ToastKind::Error => Color::Red,
        };
        let line = Line::from(Span::styled(
            format!(" {}", toast.message),
            Style::default().fg(color),
        ));
        frame.render_widget(line, area);
        return;
    }

    let hints: &[(&str, &str)] = match mode {
        Mode::Normal => &[
            ("q", "quit"),
            ("j/k", "move"),
            ("tab", "lists"),
            ("n", "new"),
            ("x", "done"),
            ("i", "important"),
            ("d", "delete"),
            ("r", "restore"),
            ("s", "sections"),
            ("enter", "open"),
        ],
        Mode::TaskDetail { .. } => &[
            ("esc", "back"),
            ("t", "title"),
            ("e", "notes"),
            ("D", "due"),
            ("r", "reminder"),
            ("m", "section"),
            ("u", "url"),
            ("f", "file"),
            ("X", "remove attachment"),
            ("a", "ack reminder"),
        ],
        Mode::SectionList { .. } => &[
            ("esc", "back"),
            ("enter", "open"),
            ("n", "new"),
            ("r", "rename"),
            ("i", "icon"),
            ("J/K", "reorder"),
            ("d", "delete"),
        ],
        Mode::ReminderPick { .. } | Mode::SectionPick { .. } => {
            &[("j/k", "move"), ("enter", "choose"), ("esc", "back")]
        }
        Mode::ConfirmDelete { .. } | Mode::ConfirmDeleteSection { .. } => {
            &[("y", "confirm"), ("any", "cancel")]
        }
        _ => &[("enter", "save"), ("esc", "cancel")],
    };

    let mut spans = Vec::new();
    for (k, label) in hints {
        spans.push(Span::styled(format!(" {k}"), Style::default().fg(Color::Cyan)));
        spans.push(Span::styled(
            format!(" {label} "),
            Style::default().fg(Color::DarkGray),
        ));
    }
    frame.render_widget(Line::from(spans), area);
}

fn render_input_bar(frame: &mut Frame, label: &str, input: &str, area: Rect) {
    let input_area = Rect {
        x: area.x,
        y: area.y + area.height.saturating_sub(3),
        width: area.width,
        height: 3.min(area.height),
    };
    frame.render_widget(Clear, input_area);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(label.to_string());
    frame.render_widget(Paragraph::new(input.to_string()).block(block), input_area);
}

fn render_picker(frame: &mut Frame, title: &str, items: &[String], index: usize, area: Rect) {
    let popup = centered_rect(40, 50, area);
    frame.render_widget(Clear, popup);

    let list_items: Vec<ListItem> = items.iter().map(|i| ListItem::new(i.as_str())).collect();
    let list = List::new(list_items)
        .block(
            Block::default()
                .title(title.to_string())
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan)),
        )
        .highlight_style(Style::default().fg(Color::Black).bg(Color::Cyan))
        .highlight_symbol("> ");

    let mut state = ListState::default();
    if !items.is_empty() {
        state.select(Some(index.min(items.len() - 1)));
    }
    frame.render_stateful_widget(list, popup, &mut state);
}

fn render_confirm(frame: &mut Frame, question: &str, area: Rect) {
    let popup = centered_rect(50, 20, area);
    frame.render_widget(Clear, popup);
    let block = Block::default()
        .title(" Confirm ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Red));
    let text = vec![
        Line::from(question.to_string()),
        Line::from(""),
        Line::from(Span::styled(
            "y to confirm, any other key to cancel",
            Style::default().fg(Color::DarkGray),
        )),
    ];
    frame.render_widget(
        Paragraph::new(text).block(block).wrap(Wrap { trim: true }),
        popup,
    );
}

fn field(label: &str, value: String) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("{label}: "), Style::default().bold()),
        Span::raw(value),
    ])
}

fn render_task_detail(
    frame: &mut Frame,
    task: &Task,
    attachments: &[Attachment],
    cursor: usize,
    today: NaiveDate,
    area: Rect,
) {
    let popup = centered_rect(70, 80, area);
    frame.render_widget(Clear, popup);

    let block = Block::default()
        .title(" Task ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let state = match task.state() {
        mytodo_core::TaskState::Active => "Active",
        mytodo_core::TaskState::Completed => "Completed",
        mytodo_core::TaskState::Trashed => "In trash",
    };
    let due = task
        .due_date
        .map(|d| format!("{} ({})", d.format("%Y-%m-%d"), due_label(d, today)))
        .unwrap_or_else(|| "-".into());
    let section = match (&task.section_icon, &task.section_name) {
        (Some(icon), Some(name)) => format!("{icon} {name}"),
        _ => "-".into(),
    };
    let reminder = reminder_label(task.reminder_type, task.reminder_day);

    let mut lines = vec![
        field("Title", task.title.clone()),
        field("State", state.into()),
        field("Due", due),
        field("Important", if task.is_important { "yes" } else { "no" }.into()),
        field("Section", section),
        field(
            "Reminder",
            if reminder.is_empty() { "-".into() } else { reminder },
        ),
        Line::from(""),
        Line::from(Span::styled("Notes", Style::default().bold())),
        Line::from(task.description.clone().unwrap_or_else(|| "-".into())),
        Line::from(""),
        Line::from(Span::styled(
            format!("Attachments ({})", attachments.len()),
            Style::default().bold(),
        )),
    ];
    for (i, a) in attachments.iter().enumerate() {
        let marker = if i == cursor { "> " } else { "  " };
        let style = if i == cursor {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default()
        };
        lines.push(Line::from(Span::styled(
            format!("{marker}[{}] {}  {}", a.kind.as_str(), a.name, a.url),
            style,
        )));
    }

    frame.render_widget(
        Paragraph::new(lines).block(block).wrap(Wrap { trim: false }),
        popup,
    );
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
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
        .split(popup_layout[1])[1]
}
