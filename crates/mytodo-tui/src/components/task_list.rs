use chrono::NaiveDate;
use mytodo_core::task::Task;
use mytodo_core::view::View;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};

use crate::format::{due_badge, task_meta, DueBadge};
use crate::view_model::ViewModel;

fn empty_message(view: View) -> &'static str {
    match view {
        View::Today => "Nothing due today",
        View::Upcoming => "Nothing scheduled",
        View::Important => "No important tasks",
        View::Logbox => "No completed tasks",
        View::Trash => "Trash is empty",
        View::All | View::Section(_) => "No tasks",
    }
}

fn due_style(task: &Task, today: NaiveDate) -> Style {
    match task.due_date.map(|d| due_badge(d, today)) {
        Some(DueBadge::Overdue) if !task.is_completed => Style::default().fg(Color::Red),
        Some(DueBadge::Today) => Style::default().fg(Color::Yellow),
        _ => Style::default().fg(Color::DarkGray),
    }
}

fn task_item(task: &Task, today: NaiveDate) -> ListItem<'static> {
    let check = if task.is_completed { "[x] " } else { "[ ] " };
    let mut title_style = Style::default();
    if task.is_completed || task.is_deleted {
        title_style = title_style.fg(Color::DarkGray).crossed_out();
    }
    let mut spans = vec![
        Span::raw(check),
        Span::styled(task.title.clone(), title_style),
    ];
    if task.is_important {
        spans.push(Span::styled(" ★", Style::default().fg(Color::Yellow)));
    }
    let meta = task_meta(task, today);
    if !meta.is_empty() {
        spans.push(Span::styled(
            format!("  {}", meta.join(" · ")),
            due_style(task, today),
        ));
    }
    ListItem::new(Line::from(spans))
}

pub fn render(frame: &mut Frame, area: Rect, model: &ViewModel, today: NaiveDate) {
    let block = Block::default()
        .title(format!(" {} ({}) ", model.view_title(), model.tasks.len()))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    if model.tasks.is_empty() {
        let paragraph = Paragraph::new(empty_message(model.view()))
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        frame.render_widget(paragraph, area);
        return;
    }

    let items: Vec<ListItem> = model.tasks.iter().map(|t| task_item(t, today)).collect();
    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().fg(Color::Black).bg(Color::Cyan).bold())
        .highlight_symbol("> ");

    let mut state = ListState::default();
    state.select(model.selected_task().map(|_| model.cursor));
    frame.render_stateful_widget(list, area, &mut state);
}
