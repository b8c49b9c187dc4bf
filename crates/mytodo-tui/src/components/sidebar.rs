use mytodo_core::view::View;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState};

use crate::view_model::ViewModel;

fn view_icon(view: &View) -> &'static str {
    match view {
        View::Today => "☀",
        View::Upcoming => "📅",
        View::Important => "★",
        View::All => "☰",
        View::Logbox => "✔",
        View::Trash => "🗑",
        View::Section(_) => "",
    }
}

fn badge(count: i64, style: Style) -> Span<'static> {
    if count > 0 {
        Span::styled(format!(" {count}"), style)
    } else {
        Span::raw("")
    }
}

pub fn render(frame: &mut Frame, area: Rect, model: &ViewModel) {
    let dim = Style::default().fg(Color::DarkGray);
    let mut items: Vec<ListItem> = View::NAMED
        .iter()
        .map(|view| {
            let mut spans = vec![
                Span::raw(format!("{} ", view_icon(view))),
                Span::raw(view.display_name()),
            ];
            if let Some(count) = model.stats.count_for(view) {
                spans.push(badge(count, dim));
            }
            if *view == View::Today {
                spans.push(badge(model.stats.overdue, Style::default().fg(Color::Red)));
            }
            ListItem::new(Line::from(spans))
        })
        .collect();

    items.extend(model.sections.iter().map(|section| {
        ListItem::new(Line::from(vec![
            Span::raw(format!("{} ", section.icon)),
            Span::raw(section.name.clone()),
            badge(section.task_count, dim),
        ]))
    }));

    let selected = model
        .sidebar_views()
        .iter()
        .position(|v| *v == model.view());
    let mut state = ListState::default();
    state.select(selected);

    let list = List::new(items)
        .block(
            Block::default()
                .title(" Lists ")
                .borders(Borders::ALL)
                .border_style(dim),
        )
        .highlight_style(Style::default().fg(Color::Cyan).bold())
        .highlight_symbol("> ");

    frame.render_stateful_widget(list, area, &mut state);
}
