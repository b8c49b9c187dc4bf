//! Client-side state as a value.
//!
//! A [`ViewModel`] is never mutated in place by the UI: every change goes
//! through [`ViewModel::reduce`], which consumes the old model and returns the
//! next one. Rendering only ever borrows a model.
//!
//! Optimistic edits are modelled as a `Tentative` event that applies the change
//! locally and records a before-image, followed by `Confirmed` (drop the
//! before-image) or `Failed` (restore it and raise an error toast).

use mytodo_core::clock::Clock;
use mytodo_core::section::Section;
use mytodo_core::stats::TaskStats;
use mytodo_core::task::{Task, UpdateTask};
use mytodo_core::view::View;

pub type OpId = u64;

/// What the user is looking at. The only state carried across reloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub view: View,
    pub task_id: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub message: String,
    pub kind: ToastKind,
}

/// A change applied locally before the server has answered.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    UpdateTask { id: i64, update: UpdateTask },
    /// Soft delete, restore and permanent delete all take the task out of
    /// the list being shown.
    RemoveTask { id: i64 },
    DeleteSection { id: i64 },
}

/// Rows touched by a tentative mutation, with the positions they held.
#[derive(Debug, Clone, Default, PartialEq)]
struct BeforeImage {
    tasks: Vec<(usize, Task)>,
    sections: Vec<(usize, Section)>,
}

#[derive(Debug, Clone, PartialEq)]
struct Pending {
    op: OpId,
    before: BeforeImage,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Loaded {
        sections: Vec<Section>,
        tasks: Vec<Task>,
        stats: TaskStats,
    },
    SelectView(View),
    SelectTask(i64),
    MoveCursor(isize),
    Tentative { op: OpId, mutation: Mutation },
    Confirmed(OpId),
    Failed { op: OpId, message: String },
    Notice(String),
    /// Error toast not tied to a tentative mutation.
    Alert(String),
    ClearToast,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewModel {
    pub sections: Vec<Section>,
    pub tasks: Vec<Task>,
    pub stats: TaskStats,
    pub selection: Selection,
    pub cursor: usize,
    pub toast: Option<Toast>,
    pending: Vec<Pending>,
}

impl Default for ViewModel {
    fn default() -> Self {
        Self::new(View::default())
    }
}

impl ViewModel {
    pub fn new(view: View) -> Self {
        Self {
            sections: Vec::new(),
            tasks: Vec::new(),
            stats: TaskStats::default(),
            selection: Selection {
                view,
                task_id: None,
            },
            cursor: 0,
            toast: None,
            pending: Vec::new(),
        }
    }

    pub fn view(&self) -> View {
        self.selection.view
    }

    pub fn selected_task(&self) -> Option<&Task> {
        let task = self.tasks.get(self.cursor)?;
        (Some(task.id) == self.selection.task_id).then_some(task)
    }

    pub fn section(&self, id: i64) -> Option<&Section> {
        self.sections.iter().find(|s| s.id == id)
    }

    /// Title for the current view: the section name for section views.
    pub fn view_title(&self) -> String {
        match self.selection.view {
            View::Section(id) => self
                .section(id)
                .map(|s| format!("{} {}", s.icon, s.name))
                .unwrap_or_else(|| "Section".into()),
            named => named.display_name().to_string(),
        }
    }

    /// Sidebar entries in display order: the named views, then each section.
    pub fn sidebar_views(&self) -> Vec<View> {
        View::NAMED
            .iter()
            .copied()
            .chain(self.sections.iter().map(|s| View::Section(s.id)))
            .collect()
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn reduce(self, event: Event, clock: &Clock) -> Self {
        match event {
            Event::Loaded {
                sections,
                tasks,
                stats,
            } => Self {
                sections,
                tasks,
                stats,
                ..self
            }
            .resync(),
            Event::SelectView(view) => Self {
                tasks: Vec::new(),
                selection: Selection {
                    view,
                    task_id: None,
                },
                cursor: 0,
                ..self
            },
            Event::SelectTask(id) => {
                let mut next = self;
                if let Some(pos) = next.tasks.iter().position(|t| t.id == id) {
                    next.cursor = pos;
                    next.selection.task_id = Some(id);
                }
                next
            }
            Event::MoveCursor(delta) => {
                let mut next = self;
                if next.tasks.is_empty() {
                    return next;
                }
                let max = next.tasks.len() - 1;
                next.cursor = next.cursor.saturating_add_signed(delta).min(max);
                next.selection.task_id = Some(next.tasks[next.cursor].id);
                next
            }
            Event::Tentative { op, mutation } => self.apply(op, mutation, clock),
            Event::Confirmed(op) => {
                let mut next = self;
                next.pending.retain(|p| p.op != op);
                next
            }
            Event::Failed { op, message } => {
                let mut next = self;
                if let Some(idx) = next.pending.iter().position(|p| p.op == op) {
                    let pending = next.pending.remove(idx);
                    next = next.restore(pending.before);
                }
                next.toast = Some(Toast {
                    message,
                    kind: ToastKind::Error,
                });
                next.resync()
            }
            Event::Notice(message) => Self {
                toast: Some(Toast {
                    message,
                    kind: ToastKind::Info,
                }),
                ..self
            },
            Event::Alert(message) => Self {
                toast: Some(Toast {
                    message,
                    kind: ToastKind::Error,
                }),
                ..self
            },
            Event::ClearToast => Self {
                toast: None,
                ..self
            },
        }
    }

    fn apply(mut self, op: OpId, mutation: Mutation, clock: &Clock) -> Self {
        let mut before = BeforeImage::default();
        match mutation {
            Mutation::UpdateTask { id, update } => {
                if let Some(pos) = self.tasks.iter().position(|t| t.id == id) {
                    let original = self.tasks[pos].clone();
                    let updated = self.patched(&original, &update, clock);
                    before.tasks.push((pos, original));
                    if self.selection.view.matches(&updated, clock) {
                        self.tasks[pos] = updated;
                    } else {
                        self.tasks.remove(pos);
                    }
                }
            }
            Mutation::RemoveTask { id } => {
                if let Some(pos) = self.tasks.iter().position(|t| t.id == id) {
                    before.tasks.push((pos, self.tasks.remove(pos)));
                }
            }
            Mutation::DeleteSection { id } => {
                if let Some(pos) = self.sections.iter().position(|s| s.id == id) {
                    before.sections.push((pos, self.sections.remove(pos)));
                }
                if self.selection.view == View::Section(id) {
                    before.tasks = self.tasks.drain(..).enumerate().collect();
                }
                for (pos, task) in self.tasks.iter_mut().enumerate() {
                    if task.section_id == Some(id) {
                        before.tasks.push((pos, task.clone()));
                        task.section_id = None;
                        task.section_name = None;
                        task.section_icon = None;
                    }
                }
            }
        }
        self.pending.push(Pending { op, before });
        self.resync()
    }

    /// Local approximation of what the server will return for `update`.
    fn patched(&self, task: &Task, update: &UpdateTask, clock: &Clock) -> Task {
        let mut t = task.clone();
        if let Some(title) = &update.title {
            t.title = title.trim().to_string();
        }
        if let Some(description) = &update.description {
            t.description = description.clone();
        }
        if let Some(section_id) = update.section_id {
            t.section_id = section_id;
            let section = section_id.and_then(|id| self.section(id));
            t.section_name = section.map(|s| s.name.clone());
            t.section_icon = section.map(|s| s.icon.clone());
        }
        if let Some(due_date) = update.due_date {
            t.due_date = due_date;
        }
        if let Some(important) = update.is_important {
            t.is_important = important;
        }
        if let Some(done) = update.is_completed {
            if done != t.is_completed {
                t.completed_at = done.then_some(clock.now);
            }
            t.is_completed = done;
        }
        if let Some(kind) = update.reminder_type {
            t.reminder_type = kind;
        }
        if let Some(day) = update.reminder_day {
            t.reminder_day = day;
        }
        t.updated_at = clock.now;
        t
    }

    fn restore(mut self, before: BeforeImage) -> Self {
        for (pos, section) in before.sections {
            if !self.sections.iter().any(|s| s.id == section.id) {
                let at = pos.min(self.sections.len());
                self.sections.insert(at, section);
            }
        }
        for (pos, task) in before.tasks {
            match self.tasks.iter().position(|t| t.id == task.id) {
                Some(existing) => self.tasks[existing] = task,
                None => {
                    let at = pos.min(self.tasks.len());
                    self.tasks.insert(at, task);
                }
            }
        }
        self
    }

    /// Re-anchor the cursor on the selected task, or the nearest row if it is gone.
    fn resync(mut self) -> Self {
        if self.tasks.is_empty() {
            self.cursor = 0;
            self.selection.task_id = None;
            return self;
        }
        let found = self
            .selection
            .task_id
            .and_then(|id| self.tasks.iter().position(|t| t.id == id));
        self.cursor = found.unwrap_or_else(|| self.cursor.min(self.tasks.len() - 1));
        self.selection.task_id = Some(self.tasks[self.cursor].id);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};
    use mytodo_core::task::ReminderType;

    fn clock() -> Clock {
        Clock::fixed(
            NaiveDate::from_ymd_opt(2026, 6, 1).unwrap(),
            Utc.with_ymd_and_hms(2026, 6, 1, 12, 0, 0).unwrap(),
        )
    }

    fn task(id: i64) -> Task {
        let at = Utc.with_ymd_and_hms(2026, 5, 20, 8, 0, 0).unwrap();
        Task {
            id,
            title: format!("task {id}"),
            description: None,
            section_id: None,
            due_date: None,
            is_important: false,
            is_completed: false,
            completed_at: None,
            is_deleted: false,
            deleted_at: None,
            reminder_type: ReminderType::None,
            reminder_day: None,
            last_reminded_on: None,
            created_at: at,
            updated_at: at,
            section_name: None,
            section_icon: None,
            attachment_count: 0,
        }
    }

    fn section(id: i64, name: &str) -> Section {
        Section {
            id,
            name: name.into(),
            icon: "📁".into(),
            sort_order: id,
            task_count: 0,
        }
    }

    fn loaded(view: View, tasks: Vec<Task>) -> ViewModel {
        ViewModel::new(view).reduce(
            Event::Loaded {
                sections: vec![section(1, "Work"), section(2, "Home")],
                tasks,
                stats: TaskStats::default(),
            },
            &clock(),
        )
    }

    #[test]
    fn load_selects_first_task() {
        let vm = loaded(View::All, vec![task(1), task(2)]);
        assert_eq!(vm.selection.task_id, Some(1));
        assert_eq!(vm.selected_task().unwrap().id, 1);
    }

    #[test]
    fn selection_survives_reload() {
        let c = clock();
        let vm = loaded(View::All, vec![task(1), task(2), task(3)])
            .reduce(Event::MoveCursor(2), &c);
        assert_eq!(vm.selection.task_id, Some(3));

        let vm = vm.reduce(
            Event::Loaded {
                sections: Vec::new(),
                tasks: vec![task(4), task(3), task(1)],
                stats: TaskStats::default(),
            },
            &c,
        );
        assert_eq!(vm.cursor, 1);
        assert_eq!(vm.selected_task().unwrap().id, 3);
        assert!(vm.sections.is_empty());
    }

    #[test]
    fn vanished_selection_falls_back_to_nearest_row() {
        let c = clock();
        let vm = loaded(View::All, vec![task(1), task(2), task(3)])
            .reduce(Event::MoveCursor(2), &c)
            .reduce(
                Event::Loaded {
                    sections: Vec::new(),
                    tasks: vec![task(1), task(2)],
                    stats: TaskStats::default(),
                },
                &c,
            );
        assert_eq!(vm.selected_task().unwrap().id, 2);
    }

    #[test]
    fn cursor_is_clamped() {
        let c = clock();
        let vm = loaded(View::All, vec![task(1), task(2)])
            .reduce(Event::MoveCursor(-5), &c);
        assert_eq!(vm.cursor, 0);
        let vm = vm.reduce(Event::MoveCursor(10), &c);
        assert_eq!(vm.cursor, 1);

        let empty = loaded(View::All, Vec::new()).reduce(Event::MoveCursor(1), &c);
        assert_eq!(empty.cursor, 0);
        assert!(empty.selected_task().is_none());
    }

    #[test]
    fn select_view_drops_rows_of_previous_view() {
        let vm = loaded(View::All, vec![task(1)]).reduce(Event::SelectView(View::Trash), &clock());
        assert_eq!(vm.view(), View::Trash);
        assert!(vm.tasks.is_empty());
        assert_eq!(vm.selection.task_id, None);
        assert_eq!(vm.sections.len(), 2);
    }

    #[test]
    fn completing_leaves_active_view_then_confirm_keeps_it_out() {
        let c = clock();
        let vm = loaded(View::All, vec![task(1), task(2)]).reduce(
            Event::Tentative {
                op: 1,
                mutation: Mutation::UpdateTask {
                    id: 1,
                    update: UpdateTask::completed(true),
                },
            },
            &c,
        );
        assert_eq!(vm.tasks.len(), 1);
        assert_eq!(vm.selected_task().unwrap().id, 2);
        assert!(vm.has_pending());

        let vm = vm.reduce(Event::Confirmed(1), &c);
        assert!(!vm.has_pending());
        assert_eq!(vm.tasks.len(), 1);
    }

    #[test]
    fn failure_restores_before_image_and_raises_toast() {
        let c = clock();
        let start = loaded(View::All, vec![task(1), task(2), task(3)]);
        let vm = start
            .clone()
            .reduce(
                Event::Tentative {
                    op: 7,
                    mutation: Mutation::UpdateTask {
                        id: 2,
                        update: UpdateTask::completed(true),
                    },
                },
                &c,
            )
            .reduce(
                Event::Failed {
                    op: 7,
                    message: "update failed".into(),
                },
                &c,
            );
        assert_eq!(vm.tasks, start.tasks);
        assert!(!vm.has_pending());
        let toast = vm.toast.clone().unwrap();
        assert_eq!(toast.kind, ToastKind::Error);
        assert_eq!(toast.message, "update failed");

        let vm = vm.reduce(Event::ClearToast, &c);
        assert!(vm.toast.is_none());
    }

    #[test]
    fn in_place_edit_updates_row() {
        let c = clock();
        let vm = loaded(View::All, vec![task(1)]).reduce(
            Event::Tentative {
                op: 1,
                mutation: Mutation::UpdateTask {
                    id: 1,
                    update: UpdateTask {
                        is_important: Some(true),
                        section_id: Some(Some(2)),
                        ..Default::default()
                    },
                },
            },
            &c,
        );
        let t = &vm.tasks[0];
        assert!(t.is_important);
        assert_eq!(t.section_name.as_deref(), Some("Home"));
        assert_eq!(t.updated_at, c.now);
    }

    #[test]
    fn completion_stamps_locally() {
        let c = clock();
        let mut done = task(1);
        done.is_completed = true;
        done.completed_at = Some(c.now);
        let vm = loaded(View::Logbox, vec![done]).reduce(
            Event::Tentative {
                op: 1,
                mutation: Mutation::UpdateTask {
                    id: 1,
                    update: UpdateTask::completed(false),
                },
            },
            &c,
        );
        assert!(vm.tasks.is_empty());

        let vm = vm.reduce(
            Event::Failed {
                op: 1,
                message: "offline".into(),
            },
            &c,
        );
        assert_eq!(vm.tasks[0].completed_at, Some(c.now));
    }

    #[test]
    fn remove_and_rollback_keeps_position() {
        let c = clock();
        let vm = loaded(View::All, vec![task(1), task(2), task(3)])
            .reduce(Event::SelectTask(2), &c)
            .reduce(
                Event::Tentative {
                    op: 3,
                    mutation: Mutation::RemoveTask { id: 2 },
                },
                &c,
            );
        let ids: Vec<i64> = vm.tasks.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![1, 3]);
        assert_eq!(vm.selected_task().unwrap().id, 3);

        let vm = vm.reduce(
            Event::Failed {
                op: 3,
                message: "nope".into(),
            },
            &c,
        );
        let ids: Vec<i64> = vm.tasks.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn deleting_section_detaches_rows_and_rolls_back() {
        let c = clock();
        let mut filed = task(1);
        filed.section_id = Some(1);
        filed.section_name = Some("Work".into());
        filed.section_icon = Some("📁".into());
        let start = loaded(View::All, vec![filed, task(2)]);

        let vm = start.clone().reduce(
            Event::Tentative {
                op: 9,
                mutation: Mutation::DeleteSection { id: 1 },
            },
            &c,
        );
        assert_eq!(vm.sections.len(), 1);
        assert_eq!(vm.tasks[0].section_id, None);
        assert_eq!(vm.tasks[0].section_name, None);

        let vm = vm.reduce(
            Event::Failed {
                op: 9,
                message: "x".into(),
            },
            &c,
        );
        assert_eq!(vm.sections, start.sections);
        assert_eq!(vm.tasks, start.tasks);
    }

    #[test]
    fn deleting_viewed_section_empties_list() {
        let c = clock();
        let mut filed = task(1);
        filed.section_id = Some(1);
        let vm = loaded(View::Section(1), vec![filed]).reduce(
            Event::Tentative {
                op: 1,
                mutation: Mutation::DeleteSection { id: 1 },
            },
            &c,
        );
        assert!(vm.tasks.is_empty());
        assert_eq!(vm.view_title(), "Section");
    }

    #[test]
    fn unknown_failure_only_toasts() {
        let c = clock();
        let start = loaded(View::All, vec![task(1)]);
        let vm = start.clone().reduce(
            Event::Failed {
                op: 42,
                message: "late".into(),
            },
            &c,
        );
        assert_eq!(vm.tasks, start.tasks);
        assert!(vm.toast.is_some());
    }

    #[test]
    fn notice_is_info_toast_and_alert_is_error() {
        let c = clock();
        let vm = loaded(View::All, Vec::new()).reduce(Event::Notice("Task added".into()), &c);
        assert_eq!(vm.toast.clone().unwrap().kind, ToastKind::Info);
        let vm = vm.reduce(Event::Alert("server unreachable".into()), &c);
        assert_eq!(vm.toast.unwrap().kind, ToastKind::Error);
    }

    #[test]
    fn sidebar_lists_named_views_then_sections() {
        let views = loaded(View::All, Vec::new()).sidebar_views();
        assert_eq!(views.len(), View::NAMED.len() + 2);
        assert_eq!(views[0], View::Today);
        assert_eq!(views[views.len() - 2..], [View::Section(1), View::Section(2)]);
    }

    #[test]
    fn section_view_title_uses_section() {
        let vm = loaded(View::Section(2), Vec::new());
        assert_eq!(vm.view_title(), "📁 Home");
        assert_eq!(loaded(View::Today, Vec::new()).view_title(), "Today");
    }
}
