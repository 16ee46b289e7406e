use std::io::{self, Stdout};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use litebrowse_adapters::sqlite::SqliteStore;
use litebrowse_core::config::UiConfig;
use litebrowse_core::schema::{ColumnDescriptor, TableDescriptor};
use litebrowse_core::store::{Grid, QueryOutcome, StoreError};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Cell, List, ListItem, Paragraph, Row, Table, Tabs};
use ratatui::{Frame, Terminal};
use thiserror::Error;
use tokio::runtime::Runtime;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

const TICK_RATE: Duration = Duration::from_millis(120);

#[derive(Debug, Error)]
pub enum TuiError {
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Screen {
    TableList,
    TableView,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tab {
    Data,
    Info,
    Query,
    Edit,
}

impl Tab {
    /// The tab-switch cycle. `Edit` sits outside it and is only entered by
    /// selecting a row.
    fn next(self) -> Self {
        match self {
            Self::Data => Self::Info,
            Self::Info => Self::Query,
            Self::Query => Self::Data,
            Self::Edit => Self::Edit,
        }
    }

    fn title(self) -> &'static str {
        match self {
            Self::Data => "Data",
            Self::Info => "Info",
            Self::Query => "Query",
            Self::Edit => "Edit",
        }
    }
}

/// One asynchronous unit of work against the store. Every request produces
/// exactly one `StoreMsg`.
#[derive(Debug, Clone, PartialEq)]
enum Request {
    LoadTables,
    LoadDatabaseInfo,
    OpenTable {
        seq: u64,
        table: String,
        limit: u32,
    },
    LoadPage {
        seq: u64,
        table: String,
        term: String,
        page: u32,
        limit: u32,
    },
    RunQuery {
        statement: String,
    },
    SubmitEdit {
        table: String,
        columns: Vec<ColumnDescriptor>,
        values: Vec<String>,
    },
}

/// Everything loaded when a table is first opened, delivered as one event.
#[derive(Debug, Clone, PartialEq)]
struct TableSnapshot {
    columns: Vec<ColumnDescriptor>,
    info: TableDescriptor,
    grid: Grid,
}

/// Result event for a dispatched request. Page-shaped events carry the
/// sequence number of the request that produced them so stale answers can
/// be discarded.
#[derive(Debug, Clone, PartialEq)]
enum StoreMsg {
    Tables(Result<Vec<String>, StoreError>),
    DatabaseInfo(Result<Vec<(String, String)>, StoreError>),
    TableOpened {
        seq: u64,
        table: String,
        result: Result<TableSnapshot, StoreError>,
    },
    Page {
        seq: u64,
        page: u32,
        result: Result<Grid, StoreError>,
    },
    Query(Result<QueryOutcome, StoreError>),
    EditDone(Result<(), StoreError>),
}

/// The in-progress edit: one buffer per column plus a save confirmation.
/// At most one of these is live per session.
#[derive(Debug, Clone, PartialEq)]
struct EditForm {
    values: Vec<String>,
    field: usize,
    confirm: bool,
    in_flight: bool,
    error: Option<StoreError>,
}

impl EditForm {
    fn new(values: Vec<String>) -> Self {
        Self {
            values,
            field: 0,
            confirm: false,
            in_flight: false,
            error: None,
        }
    }

    /// Index of the confirmation toggle, one past the last column field.
    fn confirm_index(&self) -> usize {
        self.values.len()
    }
}

#[derive(Debug)]
struct App {
    config: UiConfig,
    screen: Screen,
    tab: Tab,
    tables: Vec<String>,
    table_cursor: usize,
    db_info: Vec<(String, String)>,
    selected_table: Option<String>,
    columns: Vec<ColumnDescriptor>,
    table_info: Option<TableDescriptor>,
    grid: Grid,
    row_cursor: usize,
    page: u32,
    search_term: String,
    search_input: Option<String>,
    query_input: String,
    query_result: Option<QueryOutcome>,
    query_error: Option<StoreError>,
    edit: Option<EditForm>,
    status: String,
    next_seq: u64,
    latest_seq: u64,
    should_quit: bool,
}

impl App {
    fn new(config: UiConfig) -> Self {
        Self {
            config,
            screen: Screen::TableList,
            tab: Tab::Data,
            tables: Vec::new(),
            table_cursor: 0,
            db_info: Vec::new(),
            selected_table: None,
            columns: Vec::new(),
            table_info: None,
            grid: Grid::default(),
            row_cursor: 0,
            page: 0,
            search_term: String::new(),
            search_input: None,
            query_input: String::new(),
            query_result: None,
            query_error: None,
            edit: None,
            status: "Loading tables...".to_string(),
            next_seq: 0,
            latest_seq: 0,
            should_quit: false,
        }
    }

    fn next_seq(&mut self) -> u64 {
        self.next_seq += 1;
        self.latest_seq = self.next_seq;
        self.next_seq
    }

    /// Maps one key press to a state transition plus any requests to
    /// dispatch. Pure apart from mutating session state: no I/O happens
    /// here.
    fn handle_key(&mut self, key: KeyEvent) -> Vec<Request> {
        if key.modifiers == KeyModifiers::CONTROL && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return Vec::new();
        }

        match self.screen {
            Screen::TableList => self.handle_table_list_key(key),
            Screen::TableView => match self.tab {
                Tab::Edit => self.handle_edit_key(key),
                Tab::Query => self.handle_query_key(key),
                Tab::Data if self.search_input.is_some() => self.handle_search_key(key),
                Tab::Data | Tab::Info => self.handle_browse_key(key),
            },
        }
    }

    fn handle_table_list_key(&mut self, key: KeyEvent) -> Vec<Request> {
        match key.code {
            KeyCode::Char('q') => {
                self.should_quit = true;
                Vec::new()
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.table_cursor = self.table_cursor.saturating_sub(1);
                Vec::new()
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if !self.tables.is_empty() {
                    self.table_cursor = (self.table_cursor + 1).min(self.tables.len() - 1);
                }
                Vec::new()
            }
            KeyCode::Enter => {
                let Some(table) = self.tables.get(self.table_cursor).cloned() else {
                    return Vec::new();
                };
                self.open_table(table)
            }
            // Esc on the list is a no-op by contract.
            _ => Vec::new(),
        }
    }

    fn open_table(&mut self, table: String) -> Vec<Request> {
        self.screen = Screen::TableView;
        self.tab = Tab::Data;
        self.selected_table = Some(table.clone());
        self.columns.clear();
        self.table_info = None;
        self.grid = Grid::default();
        self.row_cursor = 0;
        self.page = 0;
        self.search_term.clear();
        self.search_input = None;
        self.edit = None;
        self.status = format!("Loading {table}...");

        let limit = self.config.page_size;
        let seq = self.next_seq();
        vec![Request::OpenTable { seq, table, limit }]
    }

    fn handle_browse_key(&mut self, key: KeyEvent) -> Vec<Request> {
        match key.code {
            KeyCode::Char('q') => {
                self.should_quit = true;
                Vec::new()
            }
            KeyCode::Esc => {
                self.back_to_list();
                Vec::new()
            }
            KeyCode::Tab => {
                self.tab = self.tab.next();
                Vec::new()
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.row_cursor = self.row_cursor.saturating_sub(1);
                Vec::new()
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if !self.grid.rows.is_empty() {
                    self.row_cursor = (self.row_cursor + 1).min(self.grid.rows.len() - 1);
                }
                Vec::new()
            }
            KeyCode::Char('n') if self.tab == Tab::Data => self.load_page(self.page + 1),
            KeyCode::Char('p') if self.tab == Tab::Data && self.page > 0 => {
                self.load_page(self.page - 1)
            }
            KeyCode::Char('/') if self.tab == Tab::Data => {
                self.search_input = Some(self.search_term.clone());
                Vec::new()
            }
            KeyCode::Char('e') if self.tab == Tab::Data => {
                self.start_edit();
                Vec::new()
            }
            _ => Vec::new(),
        }
    }

    fn handle_search_key(&mut self, key: KeyEvent) -> Vec<Request> {
        let Some(input) = self.search_input.as_mut() else {
            return Vec::new();
        };

        match key.code {
            KeyCode::Esc => {
                // Cancelling the prompt also clears an active filter.
                self.search_input = None;
                if self.search_term.is_empty() {
                    return Vec::new();
                }
                self.search_term.clear();
                self.load_page(0)
            }
            KeyCode::Enter => {
                self.search_term = self.search_input.take().unwrap_or_default();
                self.load_page(0)
            }
            KeyCode::Backspace => {
                input.pop();
                Vec::new()
            }
            KeyCode::Char(ch) => {
                input.push(ch);
                Vec::new()
            }
            _ => Vec::new(),
        }
    }

    fn handle_query_key(&mut self, key: KeyEvent) -> Vec<Request> {
        match (key.modifiers, key.code) {
            (KeyModifiers::CONTROL, KeyCode::Char('u')) => {
                self.query_input.clear();
                Vec::new()
            }
            (_, KeyCode::Esc) => {
                self.back_to_list();
                Vec::new()
            }
            (_, KeyCode::Tab) => {
                self.tab = self.tab.next();
                Vec::new()
            }
            (_, KeyCode::Enter) => {
                let statement = self.query_input.clone();
                self.status = "Running query...".to_string();
                vec![Request::RunQuery { statement }]
            }
            (_, KeyCode::Backspace) => {
                self.query_input.pop();
                Vec::new()
            }
            (_, KeyCode::Char(ch)) => {
                self.query_input.push(ch);
                Vec::new()
            }
            _ => Vec::new(),
        }
    }

    fn handle_edit_key(&mut self, key: KeyEvent) -> Vec<Request> {
        let Some(form) = self.edit.as_mut() else {
            self.tab = Tab::Data;
            return Vec::new();
        };

        if form.in_flight {
            // A submission is pending; its result event decides what
            // happens next.
            return Vec::new();
        }

        let confirm_index = form.confirm_index();
        match key.code {
            KeyCode::Esc => {
                self.edit = None;
                self.tab = Tab::Data;
                self.status = "Edit cancelled".to_string();
                Vec::new()
            }
            KeyCode::Up => {
                form.field = form.field.saturating_sub(1);
                Vec::new()
            }
            KeyCode::Down | KeyCode::Tab => {
                form.field = (form.field + 1).min(confirm_index);
                Vec::new()
            }
            KeyCode::Char(' ') if form.field == confirm_index => {
                form.confirm = !form.confirm;
                Vec::new()
            }
            KeyCode::Enter if form.field == confirm_index => {
                if form.confirm {
                    self.submit_edit()
                } else {
                    self.edit = None;
                    self.tab = Tab::Data;
                    self.status = "Edit cancelled".to_string();
                    Vec::new()
                }
            }
            KeyCode::Enter => {
                form.field = (form.field + 1).min(confirm_index);
                Vec::new()
            }
            KeyCode::Backspace => {
                if let Some(value) = form.values.get_mut(form.field) {
                    value.pop();
                }
                Vec::new()
            }
            KeyCode::Char(ch) => {
                if let Some(value) = form.values.get_mut(form.field) {
                    value.push(ch);
                }
                Vec::new()
            }
            _ => Vec::new(),
        }
    }

    fn back_to_list(&mut self) {
        self.screen = Screen::TableList;
        self.tab = Tab::Data;
        self.edit = None;
        self.search_input = None;
        self.status = "Select a table".to_string();
    }

    fn start_edit(&mut self) {
        let Some(row) = self.grid.rows.get(self.row_cursor) else {
            self.status = "No row selected".to_string();
            return;
        };
        // Inputs are seeded with the row's already-encoded values, one per
        // column.
        self.edit = Some(EditForm::new(row.clone()));
        self.tab = Tab::Edit;
    }

    fn submit_edit(&mut self) -> Vec<Request> {
        let Some(table) = self.selected_table.clone() else {
            return Vec::new();
        };
        let Some(form) = self.edit.as_mut() else {
            return Vec::new();
        };

        form.in_flight = true;
        form.error = None;
        self.status = "Saving row...".to_string();
        vec![Request::SubmitEdit {
            table,
            columns: self.columns.clone(),
            values: form.values.clone(),
        }]
    }

    fn load_page(&mut self, page: u32) -> Vec<Request> {
        let Some(table) = self.selected_table.clone() else {
            return Vec::new();
        };
        let limit = self.config.page_size;
        let seq = self.next_seq();
        vec![Request::LoadPage {
            seq,
            table,
            term: self.search_term.clone(),
            page,
            limit,
        }]
    }

    /// Merges one result event into session state. Stale page-shaped events
    /// (an older sequence number than the latest issued) are discarded;
    /// errors are stored for display without touching previously loaded
    /// data.
    fn apply(&mut self, msg: StoreMsg) -> Vec<Request> {
        match msg {
            StoreMsg::Tables(Ok(tables)) => {
                self.table_cursor = self.table_cursor.min(tables.len().saturating_sub(1));
                self.tables = tables;
                self.status = format!("{} tables", self.tables.len());
                Vec::new()
            }
            StoreMsg::Tables(Err(error)) => {
                self.status = error.to_string();
                Vec::new()
            }
            StoreMsg::DatabaseInfo(Ok(info)) => {
                self.db_info = info;
                Vec::new()
            }
            StoreMsg::DatabaseInfo(Err(error)) => {
                self.status = error.to_string();
                Vec::new()
            }
            StoreMsg::TableOpened { seq, table, result } => {
                if seq != self.latest_seq || Some(&table) != self.selected_table.as_ref() {
                    return Vec::new();
                }
                match result {
                    Ok(snapshot) => {
                        self.columns = snapshot.columns;
                        self.table_info = Some(snapshot.info);
                        self.grid = snapshot.grid;
                        self.row_cursor = 0;
                        self.page = 0;
                        self.status = format!("Opened {table}");
                    }
                    Err(error) => self.status = error.to_string(),
                }
                Vec::new()
            }
            StoreMsg::Page { seq, page, result } => {
                if seq != self.latest_seq {
                    return Vec::new();
                }
                match result {
                    Ok(grid) => {
                        self.grid = grid;
                        self.page = page;
                        self.row_cursor =
                            self.row_cursor.min(self.grid.rows.len().saturating_sub(1));
                        self.status = format!("Page {}", page + 1);
                    }
                    Err(error) => self.status = error.to_string(),
                }
                Vec::new()
            }
            StoreMsg::Query(result) => {
                match result {
                    Ok(outcome) => {
                        self.query_result = Some(outcome);
                        self.query_error = None;
                        self.status = "Query finished".to_string();
                    }
                    Err(error) => {
                        // Keep the previous result on screen; only the
                        // error line changes.
                        self.query_error = Some(error);
                        self.status = "Query failed".to_string();
                    }
                }
                Vec::new()
            }
            StoreMsg::EditDone(Ok(())) => {
                self.edit = None;
                self.tab = Tab::Data;
                self.status = "Row updated".to_string();
                self.load_page(self.page)
            }
            StoreMsg::EditDone(Err(error)) => {
                if let Some(form) = self.edit.as_mut() {
                    form.in_flight = false;
                    form.error = Some(error);
                } else {
                    self.status = error.to_string();
                }
                Vec::new()
            }
        }
    }
}

pub fn run(store: SqliteStore, config: UiConfig) -> Result<(), TuiError> {
    let runtime = Runtime::new()?;
    let store = Arc::new(store);
    let (tx, mut rx) = mpsc::unbounded_channel();

    let mut terminal = setup_terminal()?;
    let run_result = run_loop(&mut terminal, &runtime, &store, &tx, &mut rx, config);
    let restore_result = restore_terminal(&mut terminal);

    // Dropping the runtime waits for in-flight blocking work, after which
    // this process holds the last reference and the connection closes
    // exactly once.
    drop(tx);
    drop(runtime);
    if let Ok(store) = Arc::try_unwrap(store) {
        if let Err(error) = store.close() {
            tracing::warn!(%error, "failed to close database cleanly");
        }
    }

    if let Err(error) = run_result {
        restore_result?;
        return Err(error);
    }
    restore_result?;
    Ok(())
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>, TuiError> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;
    Ok(terminal)
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<(), TuiError> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    runtime: &Runtime,
    store: &Arc<SqliteStore>,
    tx: &UnboundedSender<StoreMsg>,
    rx: &mut UnboundedReceiver<StoreMsg>,
    config: UiConfig,
) -> Result<(), TuiError> {
    let mut app = App::new(config);
    for request in [Request::LoadTables, Request::LoadDatabaseInfo] {
        dispatch(runtime, store, tx, request);
    }

    let mut last_tick = Instant::now();
    loop {
        terminal.draw(|frame| render(frame, &app))?;

        while let Ok(msg) = rx.try_recv() {
            for request in app.apply(msg) {
                dispatch(runtime, store, tx, request);
            }
        }

        let timeout = TICK_RATE
            .checked_sub(last_tick.elapsed())
            .unwrap_or(Duration::ZERO);
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    for request in app.handle_key(key) {
                        dispatch(runtime, store, tx, request);
                    }
                }
            }
        }

        if last_tick.elapsed() >= TICK_RATE {
            last_tick = Instant::now();
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}

/// Fires one request as an independently scheduled blocking task. The event
/// loop never waits on it; the result comes back as a message.
fn dispatch(
    runtime: &Runtime,
    store: &Arc<SqliteStore>,
    tx: &UnboundedSender<StoreMsg>,
    request: Request,
) {
    let store = Arc::clone(store);
    let tx = tx.clone();
    tracing::debug!(?request, "dispatching store request");

    runtime.spawn_blocking(move || {
        let msg = match request {
            Request::LoadTables => StoreMsg::Tables(store.list_tables()),
            Request::LoadDatabaseInfo => StoreMsg::DatabaseInfo(store.database_info()),
            Request::OpenTable { seq, table, limit } => {
                let result = open_snapshot(&store, &table, limit);
                StoreMsg::TableOpened { seq, table, result }
            }
            Request::LoadPage {
                seq,
                table,
                term,
                page,
                limit,
            } => {
                let result = store.search(&table, &term, limit, page * limit);
                StoreMsg::Page { seq, page, result }
            }
            Request::RunQuery { statement } => StoreMsg::Query(store.execute(&statement)),
            Request::SubmitEdit {
                table,
                columns,
                values,
            } => StoreMsg::EditDone(store.update_row(&table, &columns, &values)),
        };

        // The receiver disappears on quit; a lost result is fine then.
        let _ = tx.send(msg);
    });
}

fn open_snapshot(
    store: &SqliteStore,
    table: &str,
    page_size: u32,
) -> Result<TableSnapshot, StoreError> {
    let columns = store.describe_table(table)?;
    let info = store.table_info(table)?;
    let grid = store.list_page(table, page_size, 0)?;
    Ok(TableSnapshot {
        columns,
        info,
        grid,
    })
}

fn parse_color(name: &str) -> Color {
    match name {
        "black" => Color::Black,
        "red" => Color::Red,
        "green" => Color::Green,
        "yellow" => Color::Yellow,
        "blue" => Color::Blue,
        "magenta" => Color::Magenta,
        "cyan" => Color::Cyan,
        "gray" => Color::Gray,
        "dark_gray" => Color::DarkGray,
        "white" => Color::White,
        _ => Color::Reset,
    }
}

fn render(frame: &mut Frame<'_>, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(5), Constraint::Length(4)])
        .split(frame.area());

    match app.screen {
        Screen::TableList => render_table_list(frame, app, chunks[0]),
        Screen::TableView => render_table_view(frame, app, chunks[0]),
    }

    let footer = Paragraph::new(vec![
        Line::from(app.status.as_str()),
        Line::from(Span::styled(
            key_hints(app),
            Style::default().fg(Color::DarkGray),
        )),
    ])
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(parse_color(&app.config.border_color))),
    );
    frame.render_widget(footer, chunks[1]);
}

fn key_hints(app: &App) -> &'static str {
    match app.screen {
        Screen::TableList => "enter: open  j/k: move  q: quit",
        Screen::TableView => match app.tab {
            Tab::Data => {
                "tab: switch  j/k: move  n/p: page  /: search  e: edit  esc: back  q: quit"
            }
            Tab::Info => "tab: switch  esc: back  q: quit",
            Tab::Query => "enter: run  ctrl+u: clear  tab: switch  esc: back",
            Tab::Edit => "up/down: field  space: toggle save  enter: submit  esc: cancel",
        },
    }
}

fn render_table_list(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(area);

    let items: Vec<ListItem<'_>> = app
        .tables
        .iter()
        .enumerate()
        .map(|(index, table)| {
            let marker = if index == app.table_cursor { "> " } else { "  " };
            ListItem::new(format!("{marker}{table}"))
        })
        .collect();

    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .title("Database Tables")
            .border_style(Style::default().fg(parse_color(&app.config.selection_color))),
    );
    frame.render_widget(list, chunks[0]);

    let info_lines: Vec<Line<'_>> = app
        .db_info
        .iter()
        .map(|(key, value)| {
            Line::from(vec![
                Span::styled(
                    format!("{key}: "),
                    Style::default().fg(parse_color(&app.config.accent_color)),
                ),
                Span::raw(value.as_str()),
            ])
        })
        .collect();

    let info = Paragraph::new(info_lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title(app.config.title.as_str())
            .border_style(Style::default().fg(parse_color(&app.config.border_color))),
    );
    frame.render_widget(info, chunks[1]);
}

fn render_table_view(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(2), Constraint::Min(3)])
        .split(area);

    let mut titles = vec![Tab::Data.title(), Tab::Info.title(), Tab::Query.title()];
    if app.edit.is_some() {
        titles.push(Tab::Edit.title());
    }
    let selected = match app.tab {
        Tab::Data => 0,
        Tab::Info => 1,
        Tab::Query => 2,
        Tab::Edit => 3,
    };
    let tabs = Tabs::new(titles).select(selected).highlight_style(
        Style::default()
            .fg(parse_color(&app.config.accent_color))
            .add_modifier(Modifier::BOLD),
    );
    frame.render_widget(tabs, chunks[0]);

    match app.tab {
        Tab::Data => render_data_tab(frame, app, chunks[1]),
        Tab::Info => render_info_tab(frame, app, chunks[1]),
        Tab::Query => render_query_tab(frame, app, chunks[1]),
        Tab::Edit => render_edit_tab(frame, app, chunks[1]),
    }
}

fn grid_table<'a>(app: &'a App, grid: &'a Grid, title: String) -> Table<'a> {
    let header = Row::new(
        grid.columns
            .iter()
            .map(|name| Cell::from(name.as_str()))
            .collect::<Vec<_>>(),
    )
    .style(Style::default().add_modifier(Modifier::BOLD));

    let rows: Vec<Row<'_>> = grid
        .rows
        .iter()
        .enumerate()
        .map(|(index, row)| {
            let cells: Vec<Cell<'_>> =
                row.iter().map(|value| Cell::from(value.as_str())).collect();
            let style = if index == app.row_cursor {
                Style::default()
                    .bg(parse_color(&app.config.selection_color))
                    .fg(Color::White)
            } else {
                Style::default()
            };
            Row::new(cells).style(style)
        })
        .collect();

    let width = 100 / u16::try_from(grid.columns.len().max(1)).unwrap_or(1);
    let constraints: Vec<Constraint> = grid
        .columns
        .iter()
        .map(|_| Constraint::Percentage(width))
        .collect();

    Table::new(rows, constraints).header(header).block(
        Block::default()
            .borders(Borders::ALL)
            .title(title)
            .border_style(Style::default().fg(parse_color(&app.config.border_color))),
    )
}

fn render_data_tab(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let table_name = app.selected_table.as_deref().unwrap_or("?");

    let (search_area, table_area) = if app.search_input.is_some() {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(3)])
            .split(area);
        (Some(chunks[0]), chunks[1])
    } else {
        (None, area)
    };

    if let (Some(search_area), Some(input)) = (search_area, app.search_input.as_ref()) {
        let search = Paragraph::new(format!("/{input}")).block(
            Block::default()
                .borders(Borders::ALL)
                .title("Search")
                .border_style(Style::default().fg(parse_color(&app.config.accent_color))),
        );
        frame.render_widget(search, search_area);
    }

    let mut title = format!("Table: {table_name} (Page {})", app.page + 1);
    if !app.search_term.is_empty() {
        title.push_str(&format!(" [filter: {}]", app.search_term));
    }
    frame.render_widget(grid_table(app, &app.grid, title), table_area);
}

fn render_info_tab(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let mut lines = Vec::new();
    if let Some(info) = &app.table_info {
        let rows = info
            .row_count
            .map(|count| format!(", {count} rows"))
            .unwrap_or_default();
        lines.push(Line::from(format!(
            "{} ({}), {} columns{rows}",
            info.name,
            info.kind.as_str(),
            info.column_count,
        )));
        lines.push(Line::from(""));
    }

    let info_grid = Grid {
        columns: vec![
            "CID".to_string(),
            "Name".to_string(),
            "Type".to_string(),
            "NotNull".to_string(),
            "Default".to_string(),
            "PK".to_string(),
        ],
        rows: app
            .columns
            .iter()
            .map(|column| {
                vec![
                    column.ordinal.to_string(),
                    column.name.clone(),
                    column.decl_type.clone(),
                    column.not_null.to_string(),
                    column
                        .default_value
                        .clone()
                        .unwrap_or_else(|| "NULL".to_string()),
                    column.primary_key.to_string(),
                ]
            })
            .collect(),
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(u16::try_from(lines.len()).unwrap_or(2)),
            Constraint::Min(3),
        ])
        .split(area);

    frame.render_widget(Paragraph::new(lines), chunks[0]);
    frame.render_widget(grid_table(app, &info_grid, "Columns".to_string()), chunks[1]);
}

fn render_query_tab(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(3)])
        .split(area);

    let input = Paragraph::new(app.query_input.as_str()).block(
        Block::default()
            .borders(Borders::ALL)
            .title("SQL Query")
            .border_style(Style::default().fg(parse_color(&app.config.accent_color))),
    );
    frame.render_widget(input, chunks[0]);

    if let Some(error) = &app.query_error {
        let message = Paragraph::new(format!("Error: {error}"))
            .style(Style::default().fg(Color::Red))
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(message, chunks[1]);
        return;
    }

    match &app.query_result {
        Some(QueryOutcome::Rows(grid)) => {
            frame.render_widget(grid_table(app, grid, "Result".to_string()), chunks[1]);
        }
        Some(QueryOutcome::Mutation {
            rows_affected,
            last_insert_id,
        }) => {
            let summary = Paragraph::new(format!(
                "{rows_affected} row(s) affected (last id {last_insert_id})"
            ))
            .block(Block::default().borders(Borders::ALL));
            frame.render_widget(summary, chunks[1]);
        }
        None => {
            let hint = Paragraph::new("Type a statement and press Enter")
                .block(Block::default().borders(Borders::ALL));
            frame.render_widget(hint, chunks[1]);
        }
    }
}

fn render_edit_tab(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let Some(form) = &app.edit else {
        return;
    };

    let mut lines = vec![Line::from(Span::styled(
        "Edit Entry",
        Style::default()
            .fg(parse_color(&app.config.accent_color))
            .add_modifier(Modifier::BOLD),
    ))];

    if let Some(error) = &form.error {
        lines.push(Line::from(Span::styled(
            format!("Error: {error}"),
            Style::default().fg(Color::Red),
        )));
    }
    lines.push(Line::from(""));

    for (index, column) in app.columns.iter().enumerate() {
        let marker = if index == form.field { ">" } else { " " };
        let value = form.values.get(index).map_or("", String::as_str);
        let type_hint = if column.decl_type.is_empty() {
            String::new()
        } else {
            format!(" ({})", column.decl_type)
        };
        lines.push(Line::from(format!(
            "{marker} {}{type_hint}: {value}",
            column.name
        )));
    }

    let confirm_marker = if form.field == form.confirm_index() {
        ">"
    } else {
        " "
    };
    let confirm_state = if form.confirm { "[x]" } else { "[ ]" };
    lines.push(Line::from(""));
    lines.push(Line::from(format!("{confirm_marker} Save {confirm_state}")));
    if form.in_flight {
        lines.push(Line::from("Saving..."));
    }

    let panel = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title("Edit")
            .border_style(Style::default().fg(parse_color(&app.config.border_color))),
    );
    frame.render_widget(panel, area);
}

#[cfg(test)]
mod tests {
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use litebrowse_core::config::UiConfig;
    use litebrowse_core::schema::{ColumnDescriptor, TableDescriptor, TableKind};
    use litebrowse_core::store::{Grid, QueryOutcome, StoreError};

    use super::{App, Request, Screen, StoreMsg, Tab, TableSnapshot};

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn users_columns() -> Vec<ColumnDescriptor> {
        vec![
            ColumnDescriptor {
                ordinal: 0,
                name: "id".to_string(),
                decl_type: "INTEGER".to_string(),
                not_null: true,
                default_value: None,
                primary_key: true,
            },
            ColumnDescriptor {
                ordinal: 1,
                name: "name".to_string(),
                decl_type: "TEXT".to_string(),
                not_null: false,
                default_value: None,
                primary_key: false,
            },
        ]
    }

    fn users_grid() -> Grid {
        Grid {
            columns: vec!["id".to_string(), "name".to_string()],
            rows: vec![
                vec!["1".to_string(), "Kevin".to_string()],
                vec!["2".to_string(), "Mike".to_string()],
            ],
        }
    }

    fn opened_app() -> App {
        let mut app = App::new(UiConfig::default());
        app.apply(StoreMsg::Tables(Ok(vec!["users".to_string()])));
        let requests = app.handle_key(key(KeyCode::Enter));
        let seq = match requests.as_slice() {
            [Request::OpenTable { seq, .. }] => *seq,
            other => panic!("expected one open request, got {other:?}"),
        };
        app.apply(StoreMsg::TableOpened {
            seq,
            table: "users".to_string(),
            result: Ok(TableSnapshot {
                columns: users_columns(),
                info: TableDescriptor {
                    name: "users".to_string(),
                    kind: TableKind::Table,
                    row_count: Some(2),
                    column_count: 2,
                },
                grid: users_grid(),
            }),
        });
        app
    }

    #[test]
    fn choosing_a_table_moves_to_data_and_fires_one_load() {
        let mut app = App::new(UiConfig::default());
        app.apply(StoreMsg::Tables(Ok(vec!["users".to_string()])));

        let requests = app.handle_key(key(KeyCode::Enter));
        assert_eq!(app.screen, Screen::TableView);
        assert_eq!(app.tab, Tab::Data);
        assert!(matches!(
            requests.as_slice(),
            [Request::OpenTable { table, limit: 50, .. }] if table == "users"
        ));
    }

    #[test]
    fn tabs_cycle_data_info_query_data() {
        assert_eq!(Tab::Data.next(), Tab::Info);
        assert_eq!(Tab::Info.next(), Tab::Query);
        assert_eq!(Tab::Query.next(), Tab::Data);
        // Edit never participates in the cycle.
        assert_eq!(Tab::Edit.next(), Tab::Edit);
    }

    #[test]
    fn escape_returns_to_the_table_list_and_is_a_noop_there() {
        let mut app = opened_app();
        assert!(app.handle_key(key(KeyCode::Esc)).is_empty());
        assert_eq!(app.screen, Screen::TableList);

        assert!(app.handle_key(key(KeyCode::Esc)).is_empty());
        assert_eq!(app.screen, Screen::TableList);
    }

    #[test]
    fn edit_seeds_fields_from_the_selected_row() {
        let mut app = opened_app();
        app.handle_key(key(KeyCode::Down));
        app.handle_key(key(KeyCode::Char('e')));

        assert_eq!(app.tab, Tab::Edit);
        let form = app.edit.as_ref().expect("edit form should be live");
        assert_eq!(form.values, vec!["2".to_string(), "Mike".to_string()]);
        assert!(!form.confirm);
    }

    #[test]
    fn escape_in_edit_cancels_to_data_not_the_list() {
        let mut app = opened_app();
        app.handle_key(key(KeyCode::Char('e')));
        assert_eq!(app.tab, Tab::Edit);

        app.handle_key(key(KeyCode::Esc));
        assert_eq!(app.screen, Screen::TableView);
        assert_eq!(app.tab, Tab::Data);
        assert!(app.edit.is_none());
    }

    #[test]
    fn confirmed_edit_submits_once_and_suppresses_resubmission() {
        let mut app = opened_app();
        app.handle_key(key(KeyCode::Char('e')));

        // Move to the confirm toggle (two fields), arm it, submit.
        app.handle_key(key(KeyCode::Down));
        app.handle_key(key(KeyCode::Down));
        app.handle_key(key(KeyCode::Char(' ')));
        let requests = app.handle_key(key(KeyCode::Enter));
        assert!(matches!(
            requests.as_slice(),
            [Request::SubmitEdit { table, values, .. }]
                if table == "users" && values[0] == "1"
        ));

        // While in flight no key can fire another submission.
        let requests = app.handle_key(key(KeyCode::Enter));
        assert!(requests.is_empty());
    }

    #[test]
    fn successful_edit_returns_to_data_and_reloads_the_page() {
        let mut app = opened_app();
        app.handle_key(key(KeyCode::Char('e')));

        let requests = app.apply(StoreMsg::EditDone(Ok(())));
        assert_eq!(app.tab, Tab::Data);
        assert!(app.edit.is_none());
        assert!(matches!(
            requests.as_slice(),
            [Request::LoadPage { page: 0, .. }]
        ));
    }

    #[test]
    fn failed_edit_stays_in_edit_and_shows_the_error() {
        let mut app = opened_app();
        app.handle_key(key(KeyCode::Char('e')));
        app.handle_key(key(KeyCode::Down));
        app.handle_key(key(KeyCode::Down));
        app.handle_key(key(KeyCode::Char(' ')));
        app.handle_key(key(KeyCode::Enter));

        let requests = app.apply(StoreMsg::EditDone(Err(StoreError::NoRowsAffected)));
        assert!(requests.is_empty());
        assert_eq!(app.tab, Tab::Edit);
        let form = app.edit.as_ref().expect("edit form should survive");
        assert!(!form.in_flight);
        assert_eq!(form.error, Some(StoreError::NoRowsAffected));
    }

    #[test]
    fn stale_page_results_are_discarded() {
        let mut app = opened_app();

        let first = app.handle_key(key(KeyCode::Char('n')));
        let first_seq = match first.as_slice() {
            [Request::LoadPage { seq, .. }] => *seq,
            other => panic!("expected page request, got {other:?}"),
        };
        let second = app.handle_key(key(KeyCode::Char('n')));
        let second_seq = match second.as_slice() {
            [Request::LoadPage { seq, .. }] => *seq,
            other => panic!("expected page request, got {other:?}"),
        };

        // The older request answers after the newer one was issued.
        app.apply(StoreMsg::Page {
            seq: first_seq,
            page: 1,
            result: Ok(Grid {
                columns: vec!["id".to_string(), "name".to_string()],
                rows: vec![vec!["9".to_string(), "Stale".to_string()]],
            }),
        });
        assert_eq!(app.grid, users_grid());

        app.apply(StoreMsg::Page {
            seq: second_seq,
            page: 2,
            result: Ok(Grid {
                columns: vec!["id".to_string(), "name".to_string()],
                rows: vec![vec!["5".to_string(), "Fresh".to_string()]],
            }),
        });
        assert_eq!(app.page, 2);
        assert_eq!(app.grid.rows[0][1], "Fresh");
    }

    #[test]
    fn search_prompt_submits_the_term_with_a_fresh_page() {
        let mut app = opened_app();
        app.handle_key(key(KeyCode::Char('/')));
        app.handle_key(key(KeyCode::Char('m')));
        app.handle_key(key(KeyCode::Char('i')));

        let requests = app.handle_key(key(KeyCode::Enter));
        assert!(matches!(
            requests.as_slice(),
            [Request::LoadPage { term, page: 0, .. }] if term == "mi"
        ));
        assert_eq!(app.search_term, "mi");
    }

    #[test]
    fn cancelling_search_clears_an_active_filter() {
        let mut app = opened_app();
        app.handle_key(key(KeyCode::Char('/')));
        app.handle_key(key(KeyCode::Char('x')));
        app.handle_key(key(KeyCode::Enter));
        assert_eq!(app.search_term, "x");

        app.handle_key(key(KeyCode::Char('/')));
        let requests = app.handle_key(key(KeyCode::Esc));
        assert!(app.search_term.is_empty());
        assert!(matches!(
            requests.as_slice(),
            [Request::LoadPage { term, .. }] if term.is_empty()
        ));
    }

    #[test]
    fn query_tab_collects_text_and_runs_on_enter() {
        let mut app = opened_app();
        app.handle_key(key(KeyCode::Tab));
        app.handle_key(key(KeyCode::Tab));
        assert_eq!(app.tab, Tab::Query);

        for ch in "select 1".chars() {
            app.handle_key(key(KeyCode::Char(ch)));
        }
        let requests = app.handle_key(key(KeyCode::Enter));
        assert!(matches!(
            requests.as_slice(),
            [Request::RunQuery { statement }] if statement == "select 1"
        ));

        app.handle_key(KeyEvent::new(KeyCode::Char('u'), KeyModifiers::CONTROL));
        assert!(app.query_input.is_empty());
    }

    #[test]
    fn query_errors_replace_only_the_error_line() {
        let mut app = opened_app();
        app.apply(StoreMsg::Query(Ok(QueryOutcome::Rows(users_grid()))));
        app.apply(StoreMsg::Query(Err(StoreError::Query(
            "no such table: ghost".to_string(),
        ))));

        assert!(app.query_error.is_some());
        // The previous result stays for when the error clears.
        assert_eq!(app.query_result, Some(QueryOutcome::Rows(users_grid())));
    }

    #[test]
    fn quit_works_from_any_state() {
        let mut app = App::new(UiConfig::default());
        app.handle_key(key(KeyCode::Char('q')));
        assert!(app.should_quit);

        let mut app = opened_app();
        app.handle_key(key(KeyCode::Char('q')));
        assert!(app.should_quit);

        // Inside a text input only Ctrl+C quits.
        let mut app = opened_app();
        app.handle_key(key(KeyCode::Tab));
        app.handle_key(key(KeyCode::Tab));
        app.handle_key(key(KeyCode::Char('q')));
        assert!(!app.should_quit);
        assert_eq!(app.query_input, "q");
        app.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert!(app.should_quit);
    }

    #[test]
    fn open_errors_keep_the_session_alive() {
        let mut app = App::new(UiConfig::default());
        app.apply(StoreMsg::Tables(Ok(vec!["ghost".to_string()])));
        let requests = app.handle_key(key(KeyCode::Enter));
        let seq = match requests.as_slice() {
            [Request::OpenTable { seq, .. }] => *seq,
            other => panic!("expected open request, got {other:?}"),
        };

        app.apply(StoreMsg::TableOpened {
            seq,
            table: "ghost".to_string(),
            result: Err(StoreError::NotFound("ghost".to_string())),
        });
        assert!(!app.should_quit);
        assert_eq!(app.status, "no such table: ghost");
    }
}
