use std::collections::{HashMap, HashSet};
use std::io;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tokio::runtime::Runtime;
use tracing::debug;

use crate::api::TaskApi;
use crate::cache::TaskCache;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::mutation::{self, MutationGuard};
use crate::order::top_insert_order;
use crate::query::TaskListKey;
use crate::search::normalize_search_term;
use crate::task::{CreateTaskInput, Task, TaskColumn, TaskPage, UpdateTaskInput, TASK_COLUMNS};

use super::controller::{resolve_drop, DragState, DropTarget};
use super::editor::{DialogAction, DialogMode, TaskDialog};
use super::view;

const EVENT_POLL_MS: u64 = 120;

enum UiMsg {
    PageLoaded {
        key: TaskListKey,
        generation: u64,
        page: TaskPage,
    },
    PageFailed {
        key: TaskListKey,
        page: u32,
        message: String,
    },
    MutationDone {
        token: u64,
        outcome: Result<String>,
    },
}

#[derive(Clone, Copy)]
pub(crate) enum StatusKind {
    Error,
    Info,
}

pub(crate) struct DeleteConfirmState {
    pub(crate) task: Task,
}

pub struct AppState {
    pub(crate) cache: TaskCache,
    pub(crate) focused: usize,
    pub(crate) selected: HashMap<TaskColumn, usize>,
    pub(crate) search_input: String,
    pub(crate) search_active: bool,
    pub(crate) applied_search: String,
    search_deadline: Option<Instant>,
    pub(crate) dialog: Option<TaskDialog>,
    pub(crate) delete_confirm: Option<DeleteConfirmState>,
    pub(crate) drag: DragState,
    feedback: Option<(String, StatusKind)>,
    pending_fetches: HashSet<(TaskListKey, u32)>,
    pending_mutations: HashMap<u64, MutationGuard>,
    next_token: u64,
    config: Config,
    api: Arc<dyn TaskApi>,
    runtime: Runtime,
    ui_tx: Sender<UiMsg>,
}

impl AppState {
    fn new(api: Arc<dyn TaskApi>, config: Config, runtime: Runtime, ui_tx: Sender<UiMsg>) -> Self {
        Self {
            cache: TaskCache::new(),
            focused: 0,
            selected: HashMap::new(),
            search_input: String::new(),
            search_active: false,
            applied_search: String::new(),
            search_deadline: None,
            dialog: None,
            delete_confirm: None,
            drag: DragState::default(),
            feedback: None,
            pending_fetches: HashSet::new(),
            pending_mutations: HashMap::new(),
            next_token: 0,
            config,
            api,
            runtime,
            ui_tx,
        }
    }

    pub(crate) fn focused_column(&self) -> TaskColumn {
        TASK_COLUMNS[self.focused]
    }

    pub(crate) fn key_for(&self, column: TaskColumn) -> TaskListKey {
        TaskListKey::new(
            column,
            self.applied_search.clone(),
            self.config.board.page_size,
        )
    }

    pub(crate) fn tasks_in(&self, column: TaskColumn) -> Vec<Task> {
        self.cache.tasks_for(&self.key_for(column))
    }

    pub(crate) fn column_count(&self, column: TaskColumn) -> u64 {
        self.cache.count_for(&self.key_for(column))
    }

    pub(crate) fn column_has_more(&self, column: TaskColumn) -> bool {
        self.cache.has_more(&self.key_for(column))
    }

    pub(crate) fn is_loading(&self, column: TaskColumn) -> bool {
        let key = self.key_for(column);
        self.pending_fetches.iter().any(|(pending, _)| *pending == key)
    }

    pub(crate) fn selected_index(&self, column: TaskColumn) -> Option<usize> {
        let len = self.tasks_in(column).len();
        if len == 0 {
            return None;
        }
        let index = self.selected.get(&column).copied().unwrap_or(0);
        Some(index.min(len - 1))
    }

    pub(crate) fn selected_task(&self) -> Option<Task> {
        let column = self.focused_column();
        let index = self.selected_index(column)?;
        self.tasks_in(column).into_iter().nth(index)
    }

    pub(crate) fn feedback(&self) -> Option<(&str, StatusKind)> {
        self.feedback
            .as_ref()
            .map(|(message, kind)| (message.as_str(), *kind))
    }

    pub(crate) fn footer_hint(&self) -> String {
        if self.dialog.is_some() {
            return "tab next field  arrows pick column/priority  enter save  esc cancel"
                .to_string();
        }
        if self.delete_confirm.is_some() {
            return "y confirm delete  esc cancel".to_string();
        }
        if self.search_active {
            return "type to search  enter done  esc clear".to_string();
        }
        if self.drag.active_task().is_some() {
            return "h/l column  j/k position  space drop  esc cancel".to_string();
        }
        "h/l column  j/k move  space grab  n new  e edit  d delete  / search  f more  r refresh  q quit"
            .to_string()
    }

    fn set_info(&mut self, message: impl Into<String>) {
        self.feedback = Some((message.into(), StatusKind::Info));
    }

    fn set_error(&mut self, message: impl Into<String>) {
        self.feedback = Some((message.into(), StatusKind::Error));
    }

    fn board_map(&self) -> HashMap<TaskColumn, Vec<Task>> {
        TASK_COLUMNS
            .iter()
            .map(|column| (*column, self.tasks_in(*column)))
            .collect()
    }

    fn find_task(&self, task_id: i64) -> Option<Task> {
        TASK_COLUMNS
            .iter()
            .flat_map(|column| self.tasks_in(*column))
            .find(|task| task.id == task_id)
    }

    fn request_page(&mut self, key: TaskListKey, page: u32) {
        if !self.pending_fetches.insert((key.clone(), page)) {
            return;
        }

        let generation = self.cache.begin_fetch(&key);
        let api = Arc::clone(&self.api);
        let tx = self.ui_tx.clone();
        let column = key.column;
        let term = key.search_term.clone();
        let limit = key.page_size;
        self.runtime.spawn(async move {
            let message = match api.fetch_page(column, &term, page, limit).await {
                Ok(fetched) => UiMsg::PageLoaded {
                    key,
                    generation,
                    page: fetched,
                },
                Err(err) => UiMsg::PageFailed {
                    key,
                    page,
                    message: err.user_message(),
                },
            };
            let _ = tx.send(message);
        });
    }

    fn refetch_key(&mut self, key: TaskListKey) {
        let pages = self.cache.loaded_pages(&key).max(1);
        for page in 1..=pages {
            self.request_page(key.clone(), page);
        }
    }

    fn refetch_stale(&mut self) {
        for key in self.cache.stale_keys() {
            self.refetch_key(key);
        }
    }

    fn load_initial(&mut self) {
        for column in TASK_COLUMNS {
            let key = self.key_for(column);
            self.request_page(key, 1);
        }
    }

    fn load_more(&mut self) {
        let column = self.focused_column();
        let key = self.key_for(column);
        if !self.cache.has_more(&key) {
            self.set_info(format!("All {} tasks are loaded", column.title()));
            return;
        }
        let next = self.cache.loaded_pages(&key) + 1;
        self.request_page(key, next);
    }

    fn refresh_all(&mut self) {
        for column in TASK_COLUMNS {
            let key = self.key_for(column);
            self.refetch_key(key);
        }
    }

    fn move_focus(&mut self, delta: isize) {
        let max = TASK_COLUMNS.len() as isize - 1;
        self.focused = (self.focused as isize + delta).clamp(0, max) as usize;
    }

    fn move_selection(&mut self, delta: isize) {
        let column = self.focused_column();
        let len = self.tasks_in(column).len();
        if len == 0 {
            return;
        }
        let current = self.selected_index(column).unwrap_or(0) as isize;
        let next = (current + delta).clamp(0, len as isize - 1) as usize;
        self.selected.insert(column, next);
    }

    fn schedule_search(&mut self) {
        self.search_deadline = Some(
            Instant::now() + Duration::from_millis(self.config.board.search_debounce_ms),
        );
    }

    /// Apply a debounced search edit once its deadline has passed. Returns
    /// true when the applied term changed and a redraw is needed.
    fn apply_search_if_due(&mut self) -> bool {
        let due = self
            .search_deadline
            .map(|deadline| Instant::now() >= deadline)
            .unwrap_or(false);
        if !due {
            return false;
        }
        self.search_deadline = None;

        let normalized = normalize_search_term(&self.search_input);
        if normalized == self.applied_search {
            return false;
        }

        debug!(term = %normalized, "applying search");
        self.applied_search = normalized;
        for column in TASK_COLUMNS {
            let key = self.key_for(column);
            self.request_page(key, 1);
        }
        true
    }

    fn spawn_mutation<F>(&mut self, guard: MutationGuard, request: F)
    where
        F: std::future::Future<Output = Result<String>> + Send + 'static,
    {
        let token = self.next_token;
        self.next_token += 1;
        self.pending_mutations.insert(token, guard);

        let tx = self.ui_tx.clone();
        self.runtime.spawn(async move {
            let outcome = request.await;
            let _ = tx.send(UiMsg::MutationDone { token, outcome });
        });
    }

    fn submit_dialog(&mut self, dialog: TaskDialog) {
        let values = match dialog.validate() {
            Ok(values) => values,
            Err(message) => {
                self.set_error(message);
                return;
            }
        };

        match dialog.mode() {
            DialogMode::Create => {
                let order = top_insert_order(&self.tasks_in(values.column));
                let input = CreateTaskInput {
                    title: values.title,
                    description: values.description,
                    column: values.column,
                    priority: values.priority,
                    order: Some(order),
                };

                let guard = mutation::begin_create(&mut self.cache, &input);
                let api = Arc::clone(&self.api);
                self.spawn_mutation(guard, async move {
                    let task = api.create(&input).await?;
                    Ok(format!("Created task #{}", task.id))
                });
            }
            DialogMode::Edit => {
                let Some(task_id) = dialog.task_id() else {
                    return;
                };
                let Some(previous) = self.find_task(task_id) else {
                    self.set_error(Error::TaskNotFound(task_id).user_message());
                    return;
                };

                let input = UpdateTaskInput {
                    id: task_id,
                    title: Some(values.title),
                    description: Some(values.description),
                    column: Some(values.column),
                    priority: Some(values.priority),
                    order: None,
                };

                let guard = mutation::begin_update(&mut self.cache, &previous, &input);
                let api = Arc::clone(&self.api);
                self.spawn_mutation(guard, async move {
                    let task = api.update(&input).await?;
                    Ok(format!("Updated task #{}", task.id))
                });
            }
        }
    }

    fn confirm_delete(&mut self, state: DeleteConfirmState) {
        let guard = mutation::begin_delete(&mut self.cache, &state.task);
        let api = Arc::clone(&self.api);
        let task_id = state.task.id;
        self.spawn_mutation(guard, async move {
            api.delete(task_id).await?;
            Ok(format!("Deleted task #{task_id}"))
        });
    }

    fn finish_drag(&mut self) {
        let Some(source_id) = self.drag.finish() else {
            return;
        };

        let column = self.focused_column();
        let target = match self.selected_task() {
            Some(task) => DropTarget::Task(task.id),
            None => DropTarget::Column(column),
        };

        let board = self.board_map();
        let Some(request) = resolve_drop(&board, source_id, target, self.config.order.min_gap)
        else {
            self.set_info("Nothing to move");
            return;
        };

        let guard = mutation::begin_update(&mut self.cache, &request.previous, &request.input);
        let api = Arc::clone(&self.api);
        self.spawn_mutation(guard, async move {
            let task = mutation::send_update(api.as_ref(), &request).await?;
            Ok(format!("Moved task #{}", task.id))
        });
    }

    fn handle_ui_msg(&mut self, msg: UiMsg) {
        match msg {
            UiMsg::PageLoaded {
                key,
                generation,
                page,
            } => {
                let page_number = page.page;
                self.pending_fetches.remove(&(key.clone(), page_number));
                if !self.cache.complete_fetch(&key, generation, page) {
                    debug!(%key, "dropped cancelled fetch");
                    // A commit may have tried to refetch this view while the
                    // cancelled fetch still occupied the pending slot. The
                    // view is stale with nothing in flight, so refetch now.
                    if self.cache.is_stale(&key) {
                        self.request_page(key, page_number);
                    }
                }
            }
            UiMsg::PageFailed { key, page, message } => {
                self.pending_fetches.remove(&(key.clone(), page));
                self.set_error(message);
                if self.cache.is_stale(&key) {
                    self.request_page(key, page);
                }
            }
            UiMsg::MutationDone { token, outcome } => {
                let Some(guard) = self.pending_mutations.remove(&token) else {
                    return;
                };
                match outcome {
                    Ok(message) => {
                        mutation::commit(&mut self.cache, guard);
                        self.refetch_stale();
                        self.set_info(message);
                    }
                    Err(err) => {
                        mutation::rollback(&mut self.cache, guard);
                        self.set_error(err.user_message());
                    }
                }
            }
        }
    }
}

/// Run the interactive board against the given API until the user quits.
pub fn run(api: Arc<dyn TaskApi>, config: Config) -> Result<()> {
    let runtime = Runtime::new()?;
    let (ui_tx, ui_rx) = mpsc::channel();

    let mut app = AppState::new(api, config, runtime, ui_tx);
    app.load_initial();
    run_terminal(&mut app, ui_rx)
}

fn run_terminal(app: &mut AppState, ui_rx: Receiver<UiMsg>) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_loop(&mut terminal, app, ui_rx);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut AppState,
    ui_rx: Receiver<UiMsg>,
) -> Result<()> {
    let mut dirty = true;
    loop {
        while let Ok(msg) = ui_rx.try_recv() {
            app.handle_ui_msg(msg);
            dirty = true;
        }

        if app.apply_search_if_due() {
            dirty = true;
        }

        if dirty {
            terminal.draw(|frame| view::render(frame, app))?;
            dirty = false;
        }

        if event::poll(Duration::from_millis(EVENT_POLL_MS))? {
            match event::read()? {
                Event::Key(key) => {
                    if handle_key(app, key) {
                        break;
                    }
                    dirty = true;
                }
                Event::Resize(..) => {
                    dirty = true;
                }
                _ => {}
            }
        }
    }
    Ok(())
}

/// Handle one key press; returns true when the app should exit.
fn handle_key(app: &mut AppState, key: KeyEvent) -> bool {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return true;
    }

    if let Some(mut dialog) = app.dialog.take() {
        match dialog.handle_key(key) {
            DialogAction::Cancel => {}
            DialogAction::Submit => app.submit_dialog(dialog),
            DialogAction::None => app.dialog = Some(dialog),
        }
        return false;
    }

    if let Some(confirm) = app.delete_confirm.take() {
        match key.code {
            KeyCode::Char('y') | KeyCode::Enter => app.confirm_delete(confirm),
            KeyCode::Esc | KeyCode::Char('n') => {}
            _ => app.delete_confirm = Some(confirm),
        }
        return false;
    }

    if app.search_active {
        match key.code {
            KeyCode::Enter => app.search_active = false,
            KeyCode::Esc => {
                app.search_active = false;
                app.search_input.clear();
                app.schedule_search();
            }
            KeyCode::Backspace => {
                app.search_input.pop();
                app.schedule_search();
            }
            KeyCode::Char(ch) => {
                app.search_input.push(ch);
                app.schedule_search();
            }
            _ => {}
        }
        return false;
    }

    match key.code {
        KeyCode::Char('q') => {
            if app.drag.active_task().is_some() {
                app.drag.cancel();
                return false;
            }
            return true;
        }
        KeyCode::Esc => {
            if app.drag.active_task().is_some() {
                app.drag.cancel();
            } else if !app.search_input.is_empty() {
                app.search_input.clear();
                app.schedule_search();
            } else {
                return true;
            }
        }
        KeyCode::Char('h') | KeyCode::Left => app.move_focus(-1),
        KeyCode::Char('l') | KeyCode::Right => app.move_focus(1),
        KeyCode::Char('j') | KeyCode::Down => app.move_selection(1),
        KeyCode::Char('k') | KeyCode::Up => app.move_selection(-1),
        KeyCode::Char('/') => app.search_active = true,
        KeyCode::Char('n') => {
            app.dialog = Some(TaskDialog::create(app.focused_column()));
        }
        KeyCode::Char('e') => {
            if let Some(task) = app.selected_task() {
                app.dialog = Some(TaskDialog::edit(&task));
            }
        }
        KeyCode::Char('d') => {
            if let Some(task) = app.selected_task() {
                app.delete_confirm = Some(DeleteConfirmState { task });
            }
        }
        KeyCode::Char(' ') => {
            if app.drag.active_task().is_some() {
                app.finish_drag();
            } else if let Some(task) = app.selected_task() {
                app.drag.start(task.id);
            }
        }
        KeyCode::Char('f') => app.load_more(),
        KeyCode::Char('r') => app.refresh_all(),
        _ => {}
    }
    false
}
