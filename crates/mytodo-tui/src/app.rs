use std::path::Path;

use anyhow::Result;
use chrono::NaiveDate;
use crossterm::event::{KeyCode, KeyEvent};
use mytodo_core::attachment::{classify_upload, Attachment, AttachmentUpload, FileUpload};
use mytodo_core::clock::Clock;
use mytodo_core::section::{CreateSection, Section, UpdateSection};
use mytodo_core::task::{normalize_reminder, CreateTask, ReminderType, Task, UpdateTask};
use mytodo_core::view::View;
use mytodo_service::{BlockingHttpService, ServiceError};
use ratatui::prelude::*;

use crate::view_model::{Event, Mutation, OpId, ViewModel};

/// What the app is currently doing
#[derive(Debug, Clone)]
pub enum Mode {
    /// Task list navigation
    Normal,
    /// Typing a new task title
    NewTask { input: String },
    /// Viewing a task with its attachments
    TaskDetail {
        task: Task,
        attachments: Vec<Attachment>,
        cursor: usize,
    },
    EditTitle { task_id: i64, input: String },
    EditDescription { task_id: i64, input: String },
    /// `YYYY-MM-DD`, empty clears
    EditDueDate { task_id: i64, input: String },
    /// Index into `ReminderType::ALL`
    ReminderPick { task_id: i64, index: usize },
    ReminderDay {
        task_id: i64,
        kind: ReminderType,
        input: String,
    },
    /// Index 0 is "no section", then one entry per section
    SectionPick { task_id: i64, index: usize },
    AddUrl { task_id: i64, input: String },
    /// Path of a local file to upload
    AttachFile { task_id: i64, input: String },
    /// Confirm permanent delete from the trash
    ConfirmDelete { task: Task },
    /// Section manager
    SectionList { index: usize },
    NewSection { input: String },
    EditSection {
        section_id: i64,
        field: SectionField,
        input: String,
    },
    ConfirmDeleteSection { section: Section },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionField {
    Name,
    Icon,
}

enum Input {
    Submit(String),
    Cancel,
    Editing(String),
}

fn edit_input(key: KeyEvent, mut input: String) -> Input {
    match key.code {
        KeyCode::Enter => Input::Submit(input),
        KeyCode::Esc => Input::Cancel,
        KeyCode::Backspace => {
            input.pop();
            Input::Editing(input)
        }
        KeyCode::Char(c) => {
            input.push(c);
            Input::Editing(input)
        }
        _ => Input::Editing(input),
    }
}

fn step(index: usize, len: usize, key: KeyCode) -> usize {
    match key {
        KeyCode::Char('j') | KeyCode::Down if index + 1 < len => index + 1,
        KeyCode::Char('k') | KeyCode::Up => index.saturating_sub(1),
        _ => index,
    }
}

pub struct App {
    service: BlockingHttpService,
    model: ViewModel,
    mode: Mode,
    next_op: OpId,
}

impl App {
    /// Sweep expired tasks, then load the today view.
    pub fn new(service: BlockingHttpService) -> Result<Self> {
        let mut app = Self {
            service,
            model: ViewModel::new(View::Today),
            mode: Mode::Normal,
            next_op: 1,
        };

        match app.service.cleanup() {
            Ok(report) if report.total() > 0 => app.dispatch(Event::Notice(format!(
                "Cleaned up {} old task(s)",
                report.total()
            ))),
            Ok(_) => {}
            Err(e) => app.dispatch(Event::Alert(format!("Cleanup failed: {e}"))),
        }

        app.reload()?;
        Ok(app)
    }

    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    pub fn model(&self) -> &ViewModel {
        &self.model
    }

    pub fn is_input_mode(&self) -> bool {
        matches!(
            self.mode,
            Mode::NewTask { .. }
                | Mode::EditTitle { .. }
                | Mode::EditDescription { .. }
                | Mode::EditDueDate { .. }
                | Mode::ReminderDay { .. }
                | Mode::AddUrl { .. }
                | Mode::AttachFile { .. }
                | Mode::NewSection { .. }
                | Mode::EditSection { .. }
        )
    }

    pub fn render(&self, frame: &mut Frame) {
        crate::ui::draw(frame, &self.model, &self.mode, today());
    }

    fn dispatch(&mut self, event: Event) {
        self.model = std::mem::take(&mut self.model).reduce(event, &Clock::local());
    }

    fn reload(&mut self) -> Result<(), ServiceError> {
        let sections = self.service.list_sections()?;
        let tasks = self.service.list_tasks(&self.model.view())?;
        let stats = self.service.task_stats()?;
        self.dispatch(Event::Loaded {
            sections,
            tasks,
            stats,
        });
        Ok(())
    }

    fn refresh(&mut self) {
        if let Err(e) = self.reload() {
            self.dispatch(Event::Alert(format!("Reload failed: {e}")));
        }
    }

    fn select_view(&mut self, view: View) {
        self.dispatch(Event::SelectView(view));
        self.refresh();
    }

    /// Apply `mutation` locally, then run `call` against the server.
    /// Success reloads; failure rolls the local change back.
    fn mutate<F>(&mut self, mutation: Mutation, call: F, done: &str) -> bool
    where
        F: FnOnce(&BlockingHttpService) -> Result<(), ServiceError>,
    {
        let op = self.next_op;
        self.next_op += 1;
        self.dispatch(Event::Tentative { op, mutation });
        match call(&self.service) {
            Ok(()) => {
                self.dispatch(Event::Confirmed(op));
                self.dispatch(Event::Notice(done.to_string()));
                self.refresh();
                true
            }
            Err(e) => {
                self.dispatch(Event::Failed {
                    op,
                    message: e.to_string(),
                });
                let _ = self.reload();
                false
            }
        }
    }

    fn update_task(&mut self, id: i64, update: UpdateTask, done: &str) -> bool {
        let mutation = Mutation::UpdateTask {
            id,
            update: update.clone(),
        };
        self.mutate(
            mutation,
            |svc| svc.update_task(id, &update).map(|_| ()),
            done,
        )
    }

    fn open_detail(&mut self, id: i64) {
        let loaded = self
            .service
            .get_task(id)
            .and_then(|task| Ok((task, self.service.list_attachments(id)?)));
        match loaded {
            Ok((task, attachments)) => {
                self.mode = Mode::TaskDetail {
                    task,
                    attachments,
                    cursor: 0,
                }
            }
            Err(e) => {
                self.dispatch(Event::Alert(e.to_string()));
                self.mode = Mode::Normal;
            }
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if self.model.toast.is_some() {
            self.dispatch(Event::ClearToast);
        }

        match &self.mode.clone() {
            Mode::Normal => self.handle_normal(key),
            Mode::NewTask { input } => self.handle_new_task(key, input.clone()),
            Mode::TaskDetail {
                task,
                attachments,
                cursor,
            } => self.handle_task_detail(key, task.clone(), attachments.clone(), *cursor),
            Mode::EditTitle { task_id, input } => {
                self.handle_edit_title(key, *task_id, input.clone())
            }
            Mode::EditDescription { task_id, input } => {
                self.handle_edit_description(key, *task_id, input.clone())
            }
            Mode::EditDueDate { task_id, input } => {
                self.handle_edit_due_date(key, *task_id, input.clone())
            }
            Mode::ReminderPick { task_id, index } => {
                self.handle_reminder_pick(key, *task_id, *index)
            }
            Mode::ReminderDay {
                task_id,
                kind,
                input,
            } => self.handle_reminder_day(key, *task_id, *kind, input.clone()),
            Mode::SectionPick { task_id, index } => {
                self.handle_section_pick(key, *task_id, *index)
            }
            Mode::AddUrl { task_id, input } => self.handle_add_url(key, *task_id, input.clone()),
            Mode::AttachFile { task_id, input } => {
                self.handle_attach_file(key, *task_id, input.clone())
            }
            Mode::ConfirmDelete { task } => self.handle_confirm_delete(key, task.clone()),
            Mode::SectionList { index } => self.handle_section_list(key, *index),
            Mode::NewSection { input } => self.handle_new_section(key, input.clone()),
            Mode::EditSection {
                section_id,
                field,
                input,
            } => self.handle_edit_section(key, *section_id, *field, input.clone()),
            Mode::ConfirmDeleteSection { section } => {
                self.handle_confirm_delete_section(key, section.clone())
            }
        }
    }

    fn handle_normal(&mut self, key: KeyEvent) {
        let selected = self.model.selected_task().cloned();
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => self.dispatch(Event::MoveCursor(1)),
            KeyCode::Char('k') | KeyCode::Up => self.dispatch(Event::MoveCursor(-1)),
            KeyCode::Char('g') => self.dispatch(Event::MoveCursor(isize::MIN)),
            KeyCode::Char('G') => self.dispatch(Event::MoveCursor(isize::MAX)),
            KeyCode::Tab | KeyCode::BackTab => {
                let views = self.model.sidebar_views();
                let pos = views
                    .iter()
                    .position(|v| *v == self.model.view())
                    .unwrap_or(0);
                let next = if key.code == KeyCode::Tab {
                    (pos + 1) % views.len()
                } else {
                    (pos + views.len() - 1) % views.len()
                };
                self.select_view(views[next]);
            }
            KeyCode::Char(c @ '1'..='6') => {
                let idx = c as usize - '1' as usize;
                if let Some(view) = View::NAMED.get(idx) {
                    self.select_view(*view);
                }
            }
            KeyCode::Char('n') => {
                self.mode = Mode::NewTask {
                    input: String::new(),
                };
            }
            KeyCode::Enter => {
                if let Some(task) = selected {
                    self.open_detail(task.id);
                }
            }
            KeyCode::Char(' ') | KeyCode::Char('x') => {
                if let Some(task) = selected {
                    self.toggle_completed(&task);
                }
            }
            KeyCode::Char('i') => {
                if let Some(task) = selected {
                    self.toggle_important(&task);
                }
            }
            KeyCode::Char('d') => {
                if let Some(task) = selected {
                    self.delete_task(task);
                }
            }
            KeyCode::Char('r') => {
                if let Some(task) = selected.filter(|t| t.is_deleted) {
                    let id = task.id;
                    self.mutate(
                        Mutation::RemoveTask { id },
                        |svc| svc.restore_task(id).map(|_| ()),
                        "Task restored",
                    );
                }
            }
            KeyCode::Char('s') => self.mode = Mode::SectionList { index: 0 },
            KeyCode::Char('R') => self.refresh(),
            KeyCode::Char('C') => match self.service.cleanup() {
                Ok(report) => {
                    self.dispatch(Event::Notice(format!(
                        "Purged {} trashed and {} completed",
                        report.trashed_purged, report.completed_purged
                    )));
                    self.refresh();
                }
                Err(e) => self.dispatch(Event::Alert(format!("Cleanup failed: {e}"))),
            },
            _ => {}
        }
    }

    fn toggle_completed(&mut self, task: &Task) -> bool {
        if task.is_deleted {
            self.dispatch(Event::Alert("Restore the task first".into()));
            return false;
        }
        let done = !task.is_completed;
        let msg = if done {
            "Completed, moved to the logbox"
        } else {
            "Marked as not completed"
        };
        self.update_task(task.id, UpdateTask::completed(done), msg)
    }

    fn toggle_important(&mut self, task: &Task) -> bool {
        let update = UpdateTask {
            is_important: Some(!task.is_important),
            ..Default::default()
        };
        self.update_task(task.id, update, "Task updated")
    }

    /// Trashed tasks need confirmation; everything else goes to the trash.
    fn delete_task(&mut self, task: Task) {
        if task.is_deleted {
            self.mode = Mode::ConfirmDelete { task };
            return;
        }
        let id = task.id;
        self.mutate(
            Mutation::RemoveTask { id },
            |svc| svc.delete_task(id, false),
            "Moved to trash",
        );
        self.mode = Mode::Normal;
    }

    fn handle_new_task(&mut self, key: KeyEvent, input: String) {
        match edit_input(key, input) {
            Input::Editing(input) => self.mode = Mode::NewTask { input },
            Input::Cancel => self.mode = Mode::Normal,
            Input::Submit(input) => {
                self.mode = Mode::Normal;
                let title = input.trim();
                if title.is_empty() {
                    return;
                }
                let mut create = CreateTask::new(title);
                match self.model.view() {
                    View::Section(id) => create.section_id = Some(id),
                    View::Today => create.due_date = Some(today()),
                    View::Important => create.is_important = true,
                    _ => {}
                }
                match self.service.create_task(&create) {
                    Ok(task) => {
                        self.refresh();
                        self.dispatch(Event::SelectTask(task.id));
                        self.dispatch(Event::Notice("Task added".into()));
                    }
                    Err(e) => self.dispatch(Event::Alert(format!("Could not add task: {e}"))),
                }
            }
        }
    }

    fn handle_task_detail(
        &mut self,
        key: KeyEvent,
        task: Task,
        attachments: Vec<Attachment>,
        cursor: usize,
    ) {
        let id = task.id;
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => self.mode = Mode::Normal,
            KeyCode::Char('j') | KeyCode::Down | KeyCode::Char('k') | KeyCode::Up => {
                self.mode = Mode::TaskDetail {
                    cursor: step(cursor, attachments.len(), key.code),
                    task,
                    attachments,
                };
            }
            KeyCode::Char('t') => {
                self.mode = Mode::EditTitle {
                    task_id: id,
                    input: task.title,
                };
            }
            KeyCode::Char('e') => {
                self.mode = Mode::EditDescription {
                    task_id: id,
                    input: task.description.unwrap_or_default(),
                };
            }
            KeyCode::Char('D') => {
                self.mode = Mode::EditDueDate {
                    task_id: id,
                    input: task
                        .due_date
                        .map(|d| d.format("%Y-%m-%d").to_string())
                        .unwrap_or_default(),
                };
            }
            KeyCode::Char('r') => {
                let index = ReminderType::ALL
                    .iter()
                    .position(|r| *r == task.reminder_type)
                    .unwrap_or(0);
                self.mode = Mode::ReminderPick { task_id: id, index };
            }
            KeyCode::Char('m') => {
                let index = task
                    .section_id
                    .and_then(|sid| self.model.sections.iter().position(|s| s.id == sid))
                    .map_or(0, |pos| pos + 1);
                self.mode = Mode::SectionPick { task_id: id, index };
            }
            KeyCode::Char('u') => {
                self.mode = Mode::AddUrl {
                    task_id: id,
                    input: String::new(),
                };
            }
            KeyCode::Char('f') => {
                self.mode = Mode::AttachFile {
                    task_id: id,
                    input: String::new(),
                };
            }
            KeyCode::Char('x') | KeyCode::Char(' ') => {
                self.toggle_completed(&task);
                self.open_detail(id);
            }
            KeyCode::Char('i') => {
                self.toggle_important(&task);
                self.open_detail(id);
            }
            KeyCode::Char('a') => {
                match self.service.mark_task_reminded(id) {
                    Ok(_) => {
                        self.dispatch(Event::Notice("Reminder acknowledged".into()));
                        self.refresh();
                    }
                    Err(e) => self.dispatch(Event::Alert(e.to_string())),
                }
                self.open_detail(id);
            }
            KeyCode::Char('X') => {
                if let Some(attachment) = attachments.get(cursor) {
                    match self.service.delete_attachment(attachment.id) {
                        Ok(()) => {
                            self.dispatch(Event::Notice("Attachment removed".into()));
                            self.refresh();
                        }
                        Err(e) => self.dispatch(Event::Alert(e.to_string())),
                    }
                    self.open_detail(id);
                }
            }
            KeyCode::Char('d') => self.delete_task(task),
            _ => {}
        }
    }

    /// Shared tail of the detail editors: send the update, then show the task again.
    fn finish_edit(&mut self, task_id: i64, update: UpdateTask, done: &str) {
        self.update_task(task_id, update, done);
        self.open_detail(task_id);
    }

    fn handle_edit_title(&mut self, key: KeyEvent, task_id: i64, input: String) {
        match edit_input(key, input) {
            Input::Editing(input) => self.mode = Mode::EditTitle { task_id, input },
            Input::Cancel => self.open_detail(task_id),
            Input::Submit(input) => {
                if input.trim().is_empty() {
                    self.dispatch(Event::Alert("Title cannot be empty".into()));
                    self.mode = Mode::EditTitle { task_id, input };
                    return;
                }
                let update = UpdateTask {
                    title: Some(input),
                    ..Default::default()
                };
                self.finish_edit(task_id, update, "Title updated");
            }
        }
    }

    fn handle_edit_description(&mut self, key: KeyEvent, task_id: i64, input: String) {
        match edit_input(key, input) {
            Input::Editing(input) => self.mode = Mode::EditDescription { task_id, input },
            Input::Cancel => self.open_detail(task_id),
            Input::Submit(input) => {
                let description = Some(input.trim().to_string()).filter(|d| !d.is_empty());
                let update = UpdateTask {
                    description: Some(description),
                    ..Default::default()
                };
                self.finish_edit(task_id, update, "Description updated");
            }
        }
    }

    fn handle_edit_due_date(&mut self, key: KeyEvent, task_id: i64, input: String) {
        match edit_input(key, input) {
            Input::Editing(input) => self.mode = Mode::EditDueDate { task_id, input },
            Input::Cancel => self.open_detail(task_id),
            Input::Submit(input) => {
                let trimmed = input.trim();
                let due = if trimmed.is_empty() {
                    None
                } else {
                    match NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
                        Ok(date) => Some(date),
                        Err(_) => {
                            self.dispatch(Event::Alert("Use YYYY-MM-DD".into()));
                            self.mode = Mode::EditDueDate { task_id, input };
                            return;
                        }
                    }
                };
                let update = UpdateTask {
                    due_date: Some(due),
                    ..Default::default()
                };
                self.finish_edit(task_id, update, "Due date updated");
            }
        }
    }

    fn handle_reminder_pick(&mut self, key: KeyEvent, task_id: i64, index: usize) {
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => self.open_detail(task_id),
            KeyCode::Enter => {
                let kind = ReminderType::ALL[index.min(ReminderType::ALL.len() - 1)];
                if kind.day_range().is_some() {
                    self.mode = Mode::ReminderDay {
                        task_id,
                        kind,
                        input: String::new(),
                    };
                    return;
                }
                let update = UpdateTask {
                    reminder_type: Some(kind),
                    reminder_day: Some(None),
                    ..Default::default()
                };
                self.finish_edit(task_id, update, "Reminder updated");
            }
            code => {
                self.mode = Mode::ReminderPick {
                    task_id,
                    index: step(index, ReminderType::ALL.len(), code),
                };
            }
        }
    }

    fn handle_reminder_day(
        &mut self,
        key: KeyEvent,
        task_id: i64,
        kind: ReminderType,
        input: String,
    ) {
        match edit_input(key, input) {
            Input::Editing(input) => {
                self.mode = Mode::ReminderDay {
                    task_id,
                    kind,
                    input,
                }
            }
            Input::Cancel => self.mode = Mode::ReminderPick { task_id, index: 0 },
            Input::Submit(input) => {
                let day = input.trim().parse::<i64>().ok();
                match normalize_reminder(kind, day) {
                    Ok(day) => {
                        let update = UpdateTask {
                            reminder_type: Some(kind),
                            reminder_day: Some(day),
                            ..Default::default()
                        };
                        self.finish_edit(task_id, update, "Reminder updated");
                    }
                    Err(e) => {
                        self.dispatch(Event::Alert(e.to_string()));
                        self.mode = Mode::ReminderDay {
                            task_id,
                            kind,
                            input,
                        };
                    }
                }
            }
        }
    }

    fn handle_section_pick(&mut self, key: KeyEvent, task_id: i64, index: usize) {
        let choices = self.model.sections.len() + 1;
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => self.open_detail(task_id),
            KeyCode::Enter => {
                let section_id = index
                    .checked_sub(1)
                    .and_then(|i| self.model.sections.get(i))
                    .map(|s| s.id);
                let update = UpdateTask {
                    section_id: Some(section_id),
                    ..Default::default()
                };
                self.finish_edit(task_id, update, "Section updated");
            }
            code => {
                self.mode = Mode::SectionPick {
                    task_id,
                    index: step(index, choices, code),
                };
            }
        }
    }

    fn handle_add_url(&mut self, key: KeyEvent, task_id: i64, input: String) {
        match edit_input(key, input) {
            Input::Editing(input) => self.mode = Mode::AddUrl { task_id, input },
            Input::Cancel => self.open_detail(task_id),
            Input::Submit(input) => {
                let url = input.trim().to_string();
                if !url.is_empty() {
                    match self
                        .service
                        .add_attachment(task_id, AttachmentUpload::Url(url))
                    {
                        Ok(_) => {
                            self.dispatch(Event::Notice("Link attached".into()));
                            self.refresh();
                        }
                        Err(e) => self.dispatch(Event::Alert(e.to_string())),
                    }
                }
                self.open_detail(task_id);
            }
        }
    }

    fn handle_attach_file(&mut self, key: KeyEvent, task_id: i64, input: String) {
        match edit_input(key, input) {
            Input::Editing(input) => self.mode = Mode::AttachFile { task_id, input },
            Input::Cancel => self.open_detail(task_id),
            Input::Submit(input) => {
                let path = input.trim();
                if !path.is_empty() {
                    match read_upload(Path::new(path)) {
                        Ok(upload) => match self.service.add_attachment(task_id, upload) {
                            Ok(_) => {
                                self.dispatch(Event::Notice("File attached".into()));
                                self.refresh();
                            }
                            Err(e) => self.dispatch(Event::Alert(format!("Upload failed: {e}"))),
                        },
                        Err(msg) => self.dispatch(Event::Alert(msg)),
                    }
                }
                self.open_detail(task_id);
            }
        }
    }

    fn handle_confirm_delete(&mut self, key: KeyEvent, task: Task) {
        if let KeyCode::Char('y') | KeyCode::Char('Y') = key.code {
            let id = task.id;
            self.mutate(
                Mutation::RemoveTask { id },
                |svc| svc.delete_task(id, true),
                "Deleted permanently",
            );
        }
        self.mode = Mode::Normal;
    }

    fn handle_section_list(&mut self, key: KeyEvent, index: usize) {
        let section = self.model.sections.get(index).cloned();
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => self.mode = Mode::Normal,
            KeyCode::Enter => {
                if let Some(section) = section {
                    self.select_view(View::Section(section.id));
                    self.mode = Mode::Normal;
                }
            }
            KeyCode::Char('n') => {
                self.mode = Mode::NewSection {
                    input: String::new(),
                };
            }
            KeyCode::Char('r') | KeyCode::Char('i') => {
                if let Some(section) = section {
                    let (field, input) = if key.code == KeyCode::Char('r') {
                        (SectionField::Name, section.name)
                    } else {
                        (SectionField::Icon, section.icon)
                    };
                    self.mode = Mode::EditSection {
                        section_id: section.id,
                        field,
                        input,
                    };
                }
            }
            KeyCode::Char('d') => {
                if let Some(section) = section {
                    self.mode = Mode::ConfirmDeleteSection { section };
                }
            }
            KeyCode::Char('J') | KeyCode::Char('K') => {
                let len = self.model.sections.len();
                let target = if key.code == KeyCode::Char('J') {
                    index + 1
                } else {
                    index.wrapping_sub(1)
                };
                if index < len && target < len {
                    let mut ids: Vec<i64> = self.model.sections.iter().map(|s| s.id).collect();
                    ids.swap(index, target);
                    match self.service.reorder_sections(&ids) {
                        Ok(_) => {
                            self.refresh();
                            self.mode = Mode::SectionList { index: target };
                        }
                        Err(e) => self.dispatch(Event::Alert(e.to_string())),
                    }
                }
            }
            code => {
                self.mode = Mode::SectionList {
                    index: step(index, self.model.sections.len(), code),
                };
            }
        }
    }

    fn handle_new_section(&mut self, key: KeyEvent, input: String) {
        match edit_input(key, input) {
            Input::Editing(input) => self.mode = Mode::NewSection { input },
            Input::Cancel => self.mode = Mode::SectionList { index: 0 },
            Input::Submit(input) => {
                let name = input.trim();
                let mut index = 0;
                if !name.is_empty() {
                    let create = CreateSection {
                        name: name.to_string(),
                        icon: None,
                    };
                    match self.service.create_section(&create) {
                        Ok(section) => {
                            self.refresh();
                            index = self
                                .model
                                .sections
                                .iter()
                                .position(|s| s.id == section.id)
                                .unwrap_or(0);
                            self.dispatch(Event::Notice("Section added".into()));
                        }
                        Err(e) => self.dispatch(Event::Alert(e.to_string())),
                    }
                }
                self.mode = Mode::SectionList { index };
            }
        }
    }

    fn handle_edit_section(
        &mut self,
        key: KeyEvent,
        section_id: i64,
        field: SectionField,
        input: String,
    ) {
        let index = self
            .model
            .sections
            .iter()
            .position(|s| s.id == section_id)
            .unwrap_or(0);
        match edit_input(key, input) {
            Input::Editing(input) => {
                self.mode = Mode::EditSection {
                    section_id,
                    field,
                    input,
                }
            }
            Input::Cancel => self.mode = Mode::SectionList { index },
            Input::Submit(input) => {
                let value = input.trim().to_string();
                let update = match field {
                    SectionField::Name => UpdateSection {
                        name: Some(value),
                        ..Default::default()
                    },
                    SectionField::Icon => UpdateSection {
                        icon: Some(value),
                        ..Default::default()
                    },
                };
                match self.service.update_section(section_id, &update) {
                    Ok(_) => {
                        self.refresh();
                        self.dispatch(Event::Notice("Section updated".into()));
                    }
                    Err(e) => self.dispatch(Event::Alert(e.to_string())),
                }
                self.mode = Mode::SectionList { index };
            }
        }
    }

    fn handle_confirm_delete_section(&mut self, key: KeyEvent, section: Section) {
        if let KeyCode::Char('y') | KeyCode::Char('Y') = key.code {
            let id = section.id;
            let deleted = self.mutate(
                Mutation::DeleteSection { id },
                |svc| svc.delete_section(id),
                "Section deleted",
            );
            if deleted && self.model.view() == View::Section(id) {
                self.select_view(View::All);
            }
        }
        self.mode = Mode::SectionList { index: 0 };
    }
}

fn today() -> NaiveDate {
    Clock::local().today
}

/// Read a local file for upload, applying the server's size and type rules first.
fn read_upload(path: &Path) -> Result<AttachmentUpload, String> {
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| format!("{} is not a file", path.display()))?;
    let content_type = mytodo_store::content_type_for_key(&filename);
    let data = std::fs::read(path).map_err(|e| format!("{}: {e}", path.display()))?;
    classify_upload(content_type, data.len()).map_err(|e| e.to_string())?;
    Ok(AttachmentUpload::File(FileUpload {
        filename,
        content_type: content_type.to_string(),
        data: data.into(),
    }))
}
