use crate::aggregate::totals;
use crate::config::Config;
use crate::dashboard::Dashboard;
use crate::editor::{Column, EditSession};
use crate::entries::{payday_rows, record_entry, record_payday, EntryForm};
use crate::ledger::{
    load_ledger, parse_amount, parse_date, Category, Ledger, Transaction, TransactionType,
    DATE_FORMAT,
};
use crate::query::{available_years, month_name, Filter, Selection};
use anyhow::Result;
use chrono::NaiveDate;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols::Marker,
    text::{Line, Span},
    widgets::{
        canvas::{Canvas, Points},
        Axis, Bar, BarChart, BarGroup, Block, Borders, Cell, Chart, Dataset, GraphType,
        Paragraph, Row, Table, TableState,
    },
    Frame, Terminal,
};
use std::f64::consts::PI;
use std::io;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Entries,
    Dashboard,
    Statement,
}

impl Page {
    pub fn next(&self) -> Self {
        match self {
            Page::Entries => Page::Dashboard,
            Page::Dashboard => Page::Statement,
            Page::Statement => Page::Entries,
        }
    }

    pub fn previous(&self) -> Self {
        match self {
            Page::Entries => Page::Statement,
            Page::Dashboard => Page::Entries,
            Page::Statement => Page::Dashboard,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Page::Entries => "Entries",
            Page::Dashboard => "Dashboard & Charts",
            Page::Statement => "Statement",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Date,
    Kind,
    Amount,
    Category,
    Description,
}

impl FormField {
    pub const ALL: [FormField; 5] = [
        FormField::Date,
        FormField::Kind,
        FormField::Amount,
        FormField::Category,
        FormField::Description,
    ];

    fn title(&self) -> &'static str {
        match self {
            FormField::Date => "Date",
            FormField::Kind => "Type",
            FormField::Amount => "Amount",
            FormField::Category => "Category",
            FormField::Description => "Description",
        }
    }

    /// Free-text fields; the others cycle with ←/→
    fn is_text(&self) -> bool {
        matches!(self, FormField::Date | FormField::Amount | FormField::Description)
    }
}

/// What the keyboard is currently typing into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    FormField(FormField),
    GridCell,
    Search,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatusMessage {
    pub text: String,
    pub is_error: bool,
}

pub struct App {
    pub config: Config,
    pub ledger: Ledger,
    pub today: NaiveDate,
    pub current_page: Page,
    pub should_quit: bool,

    // Dashboard
    pub selection: Selection,

    // Entries
    pub form: EntryForm,
    pub form_field: FormField,

    // Statement grid
    pub session: EditSession,
    pub state: TableState,
    pub column: Column,

    pub input_mode: InputMode,
    pub input: String,
    pub status: Option<StatusMessage>,
}

impl App {
    pub fn new(config: Config, ledger: Ledger, today: NaiveDate) -> Self {
        let selection = Selection::default_for(&ledger, today);
        let session = EditSession::open(&ledger, Filter::default_for(&ledger, today));

        let mut state = TableState::default();
        if !session.is_empty() {
            state.select(Some(0));
        }

        Self {
            config,
            ledger,
            today,
            current_page: Page::Entries,
            should_quit: false,
            selection,
            form: EntryForm::blank(today),
            form_field: FormField::Date,
            session,
            state,
            column: Column::Date,
            input_mode: InputMode::Normal,
            input: String::new(),
            status: None,
        }
    }

    fn info(&mut self, text: impl Into<String>) {
        self.status = Some(StatusMessage {
            text: text.into(),
            is_error: false,
        });
    }

    fn error(&mut self, text: impl Into<String>) {
        self.status = Some(StatusMessage {
            text: text.into(),
            is_error: true,
        });
    }

    pub fn next_page(&mut self) {
        self.current_page = self.current_page.next();
    }

    pub fn previous_page(&mut self) {
        self.current_page = self.current_page.previous();
    }

    pub fn dashboard(&self) -> Dashboard {
        Dashboard::build(&self.ledger, self.selection, &self.config)
    }

    /// New ledger from disk: keep the dashboard year valid, reopen a clean grid
    fn replace_ledger(&mut self, ledger: Ledger) {
        self.ledger = ledger;

        let years = available_years(&self.ledger);
        if !years.is_empty() && !years.contains(&self.selection.year) {
            self.selection.year = years[years.len() - 1];
        }

        if !self.session.is_dirty() {
            self.reopen_grid(self.session.filter.clone());
        }
    }

    pub fn reload(&mut self) {
        match load_ledger(&self.config.data_file) {
            Ok(ledger) => {
                // Reload throws away pending grid edits
                self.session = EditSession::open(&ledger, self.session.filter.clone());
                self.replace_ledger(ledger);
                self.info("Ledger reloaded.");
            }
            Err(e) => self.error(format!("Error loading: {:#}", e)),
        }
    }

    // ------------------------------------------------------------------------
    // Entries
    // ------------------------------------------------------------------------

    pub fn record_payday(&mut self) {
        match record_payday(&self.config.data_file, self.today, &self.config) {
            Ok(ledger) => {
                self.replace_ledger(ledger);
                self.info("Salary and voucher recorded!");
            }
            Err(e) => self.error(format!("{:#}", e)),
        }
    }

    pub fn submit_form(&mut self) {
        match record_entry(&self.config.data_file, &self.form) {
            Ok(ledger) => {
                self.replace_ledger(ledger);
                self.form = EntryForm::blank(self.today);
                self.form_field = FormField::Date;
                self.info("Transaction saved!");
            }
            Err(e) => self.error(format!("{:#}", e)),
        }
    }

    fn form_text(&self, field: FormField) -> String {
        match field {
            FormField::Date => self.form.date.format(DATE_FORMAT).to_string(),
            FormField::Kind => self.form.kind.label().to_string(),
            FormField::Amount => format!("{:.2}", self.form.amount),
            FormField::Category => self.form.category.label().to_string(),
            FormField::Description => self.form.description.clone(),
        }
    }

    fn cycle_form_field(&mut self, forward: bool) {
        match self.form_field {
            FormField::Kind => self.form.kind = self.form.kind.toggle(),
            FormField::Category => {
                let options = &Category::FORM;
                let i = options
                    .iter()
                    .position(|c| *c == self.form.category)
                    .unwrap_or(0);
                let next = if forward {
                    (i + 1) % options.len()
                } else {
                    (i + options.len() - 1) % options.len()
                };
                self.form.category = options[next];
            }
            _ => {}
        }
    }

    fn commit_form_field(&mut self, field: FormField) {
        let text = std::mem::take(&mut self.input);
        let result = match field {
            FormField::Date => parse_date(&text).map(|d| self.form.date = d),
            FormField::Amount => parse_amount(&text).map(|a| self.form.amount = a),
            FormField::Description => {
                self.form.description = text;
                Ok(())
            }
            FormField::Kind | FormField::Category => Ok(()),
        };
        if let Err(e) = result {
            self.error(e.to_string());
        }
    }

    // ------------------------------------------------------------------------
    // Statement grid
    // ------------------------------------------------------------------------

    fn reopen_grid(&mut self, filter: Filter) {
        self.session = EditSession::open(&self.ledger, filter);
        self.reset_grid_selection();
    }

    fn reset_grid_selection(&mut self) {
        if self.session.is_empty() {
            self.state.select(None);
        } else {
            let keep = self.state.selected().unwrap_or(0).min(self.session.len() - 1);
            self.state.select(Some(keep));
        }
    }

    /// Changing the filter drops unsaved grid edits
    fn change_filter(&mut self, filter: Filter) {
        if self.session.is_dirty() {
            self.error("Unsaved table changes discarded.");
        }
        self.reopen_grid(filter);
        self.state.select(if self.session.is_empty() { None } else { Some(0) });
    }

    pub fn cycle_filter_year(&mut self) {
        // Statement lists years newest first
        let mut years = available_years(&self.ledger);
        years.reverse();
        if years.is_empty() {
            return;
        }
        let pos = years.iter().position(|y| *y == self.session.filter.year);
        let year = match pos {
            Some(i) => years[(i + 1) % years.len()],
            None => years[0],
        };
        let text = self.session.filter.text.clone().unwrap_or_default();
        self.change_filter(Filter::year(year).with_text(&text));
    }

    pub fn cycle_filter_month(&mut self) {
        let options = self.session.filter.month_options(&self.ledger);
        let pos = options
            .iter()
            .position(|m| *m == self.session.filter.month)
            .unwrap_or(0);
        let month = options[(pos + 1) % options.len()];
        let filter = self.session.filter.clone().with_month(month);
        self.change_filter(filter);
    }

    pub fn selected_row(&self) -> Option<&Transaction> {
        self.state.selected().and_then(|i| self.session.rows.get(i))
    }

    pub fn next(&mut self) {
        let len = self.session.len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(i) => {
                if i >= len - 1 {
                    0
                } else {
                    i + 1
                }
            }
            None => 0,
        };
        self.state.select(Some(i));
    }

    pub fn previous(&mut self) {
        let len = self.session.len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(i) => {
                if i == 0 {
                    len - 1
                } else {
                    i - 1
                }
            }
            None => 0,
        };
        self.state.select(Some(i));
    }

    pub fn next_column(&mut self, forward: bool) {
        let i = Column::ALL.iter().position(|c| *c == self.column).unwrap_or(0);
        let n = Column::ALL.len();
        self.column = Column::ALL[if forward { (i + 1) % n } else { (i + n - 1) % n }];
    }

    fn commit_grid_cell(&mut self) {
        let text = std::mem::take(&mut self.input);
        if let Some(row) = self.state.selected() {
            if let Err(e) = self.session.set_cell(row, self.column, &text) {
                self.error(e.to_string());
            }
        }
    }

    pub fn delete_selected_row(&mut self) {
        if let Some(row) = self.state.selected() {
            match self.session.delete_row(row) {
                Ok(_) => self.reset_grid_selection(),
                Err(e) => self.error(e.to_string()),
            }
        }
    }

    /// Blank expense row dated today, on top of the grid
    pub fn add_row(&mut self) {
        self.session.insert_row(Transaction::new(
            self.today,
            Category::Other,
            "",
            0.0,
            TransactionType::Expense,
        ));
        self.state.select(Some(0));
        self.column = Column::Date;
    }

    pub fn save_grid(&mut self) {
        match self.session.save(&self.config.data_file) {
            Ok(ledger) => {
                self.replace_ledger(ledger);
                self.info("Data updated successfully! (merge done)");
            }
            Err(e) => self.error(format!("Error saving: {:#}", e)),
        }
    }
}

pub fn run_ui(app: &mut App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run the app
    let res = run_app(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("Error: {:?}", err);
    }

    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            handle_key(app, key);
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

// ============================================================================
// KEY HANDLING
// ============================================================================

pub fn handle_key(app: &mut App, key: KeyEvent) {
    if key.kind != KeyEventKind::Press {
        return;
    }

    match app.input_mode {
        InputMode::Normal => handle_key_normal(app, key),
        mode => handle_key_input(app, key, mode),
    }
}

/// Typing into a form field, grid cell or the search box
fn handle_key_input(app: &mut App, key: KeyEvent, mode: InputMode) {
    match key.code {
        KeyCode::Esc => {
            app.input.clear();
            app.input_mode = InputMode::Normal;
        }
        KeyCode::Enter => {
            app.input_mode = InputMode::Normal;
            match mode {
                InputMode::FormField(field) => app.commit_form_field(field),
                InputMode::GridCell => app.commit_grid_cell(),
                InputMode::Search => {
                    let text = std::mem::take(&mut app.input);
                    let filter = app.session.filter.clone().with_text(&text);
                    app.change_filter(filter);
                }
                InputMode::Normal => {}
            }
        }
        KeyCode::Backspace => {
            app.input.pop();
        }
        KeyCode::Char(c) => app.input.push(c),
        _ => {}
    }
}

fn handle_key_normal(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => {
            app.should_quit = true;
            return;
        }
        KeyCode::Tab => {
            if key.modifiers.contains(KeyModifiers::SHIFT) {
                app.previous_page();
            } else {
                app.next_page();
            }
            return;
        }
        KeyCode::BackTab => {
            app.previous_page();
            return;
        }
        _ => {}
    }

    match app.current_page {
        Page::Entries => handle_key_entries(app, key),
        Page::Dashboard => handle_key_dashboard(app, key),
        Page::Statement => handle_key_statement(app, key),
    }
}

fn handle_key_entries(app: &mut App, key: KeyEvent) {
    let fields = FormField::ALL;
    let i = fields.iter().position(|f| *f == app.form_field).unwrap_or(0);

    match key.code {
        KeyCode::Char('p') => app.record_payday(),
        KeyCode::Char('s') => app.submit_form(),
        KeyCode::Down | KeyCode::Char('j') => app.form_field = fields[(i + 1) % fields.len()],
        KeyCode::Up | KeyCode::Char('k') => {
            app.form_field = fields[(i + fields.len() - 1) % fields.len()]
        }
        KeyCode::Left => app.cycle_form_field(false),
        KeyCode::Right => app.cycle_form_field(true),
        KeyCode::Enter => {
            if app.form_field.is_text() {
                app.input = app.form_text(app.form_field);
                app.input_mode = InputMode::FormField(app.form_field);
            } else {
                app.cycle_form_field(true);
            }
        }
        _ => {}
    }
}

fn handle_key_dashboard(app: &mut App, key: KeyEvent) {
    let years = available_years(&app.ledger);
    match key.code {
        KeyCode::Left | KeyCode::Char('h') => app.selection.previous_month(),
        KeyCode::Right | KeyCode::Char('l') => app.selection.next_month(),
        KeyCode::Char('[') => app.selection.cycle_year(&years, false),
        KeyCode::Char(']') => app.selection.cycle_year(&years, true),
        KeyCode::Char('r') => app.reload(),
        _ => {}
    }
}

fn handle_key_statement(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Down | KeyCode::Char('j') => app.next(),
        KeyCode::Up | KeyCode::Char('k') => app.previous(),
        KeyCode::Right | KeyCode::Char('l') => app.next_column(true),
        KeyCode::Left | KeyCode::Char('h') => app.next_column(false),
        KeyCode::Home => {
            if !app.session.is_empty() {
                app.state.select(Some(0));
            }
        }
        KeyCode::End => {
            if !app.session.is_empty() {
                app.state.select(Some(app.session.len() - 1));
            }
        }
        KeyCode::Enter => {
            if let Some(tx) = app.selected_row() {
                app.input = app.column.text(tx);
                app.input_mode = InputMode::GridCell;
            }
        }
        KeyCode::Char('d') => app.delete_selected_row(),
        KeyCode::Char('a') => app.add_row(),
        KeyCode::Char('s') => app.save_grid(),
        KeyCode::Char('y') => app.cycle_filter_year(),
        KeyCode::Char('m') => app.cycle_filter_month(),
        KeyCode::Char('/') => {
            app.input = app.session.filter.text.clone().unwrap_or_default();
            app.input_mode = InputMode::Search;
        }
        KeyCode::Char('r') => app.reload(),
        _ => {}
    }
}

// ============================================================================
// RENDERING
// ============================================================================

pub fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header with navigation
            Constraint::Min(0),    // Content area
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);

    match app.current_page {
        Page::Entries => render_entries(f, chunks[1], app),
        Page::Dashboard => render_dashboard(f, chunks[1], app),
        Page::Statement => render_statement(f, chunks[1], app),
    }

    render_status_bar(f, chunks[2], app);
}

fn type_color(t: TransactionType) -> Color {
    match t {
        TransactionType::Income => Color::Green,
        TransactionType::Expense => Color::Red,
    }
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let all = totals(app.ledger.iter());

    let pages = [Page::Entries, Page::Dashboard, Page::Statement];

    let mut tab_spans = vec![];
    for (i, page) in pages.iter().enumerate() {
        if i > 0 {
            tab_spans.push(Span::raw(" │ "));
        }

        let style = if *page == app.current_page {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default().fg(Color::DarkGray)
        };

        tab_spans.push(Span::styled(page.title().to_string(), style));
    }

    tab_spans.push(Span::raw("  |  "));
    tab_spans.push(Span::styled(
        format!("Rows: {}", app.ledger.len()),
        Style::default().fg(Color::White),
    ));
    tab_spans.push(Span::raw("  |  "));
    tab_spans.push(Span::styled(
        format!("↑ {}", app.config.money(all.income)),
        Style::default().fg(Color::Green),
    ));
    tab_spans.push(Span::raw("  "));
    tab_spans.push(Span::styled(
        format!("↓ {}", app.config.money(all.expense)),
        Style::default().fg(Color::Red),
    ));

    let header = Paragraph::new(vec![Line::from(tab_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(" 💸 Personal Finance Control "),
    );

    f.render_widget(header, area);
}

fn render_entries(f: &mut Frame, area: Rect, app: &App) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(35), Constraint::Percentage(65)])
        .split(area);

    let [salary, voucher] = payday_rows(app.today, &app.config);
    let key = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);
    let fixed = vec![
        Line::from(""),
        Line::from(vec![
            Span::styled("  Salary: ", key),
            Span::raw(app.config.money(salary.amount)),
        ]),
        Line::from(vec![
            Span::styled("  Voucher: ", key),
            Span::raw(app.config.money(voucher.amount)),
        ]),
        Line::from(""),
        Line::from(Span::styled(
            "  Press p when your pay arrives.",
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
        )),
    ];
    f.render_widget(
        Paragraph::new(fixed).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::White))
                .title(" 1. Fixed income "),
        ),
        columns[0],
    );

    let mut lines = vec![Line::from("")];
    for field in FormField::ALL {
        let focused = field == app.form_field;
        let editing = app.input_mode == InputMode::FormField(field);

        let value = if editing {
            format!("{}▏", app.input)
        } else {
            app.form_text(field)
        };
        let value = if field.is_text() || editing {
            value
        } else {
            format!("◀ {} ▶", value)
        };

        let marker = if focused { "→ " } else { "  " };
        let value_style = if editing {
            Style::default().fg(Color::Black).bg(Color::Yellow)
        } else if focused {
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::White)
        };

        lines.push(Line::from(vec![
            Span::styled(marker, Style::default().fg(Color::Green)),
            Span::styled(format!("{:<13}", field.title()), key),
            Span::styled(value, value_style),
        ]));
        lines.push(Line::from(""));
    }
    lines.push(Line::from(Span::styled(
        "  Enter edit · ←/→ change · s save entry",
        Style::default()
            .fg(Color::DarkGray)
            .add_modifier(Modifier::ITALIC),
    )));

    f.render_widget(
        Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::White))
                .title(" 2. Variable transactions "),
        ),
        columns[1],
    );
}

fn render_notice(f: &mut Frame, area: Rect, title: &str, message: &str) {
    let paragraph = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled(
            format!("  {}", message),
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )),
    ])
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(format!(" {} ", title)),
    );
    f.render_widget(paragraph, area);
}

fn render_dashboard(f: &mut Frame, area: Rect, app: &App) {
    let dash = app.dashboard();

    if dash.ledger_empty {
        render_notice(f, area, "Dashboard", crate::dashboard::EMPTY_LEDGER_MESSAGE);
        return;
    }

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),      // KPIs
            Constraint::Percentage(45), // donut + monthly bars
            Constraint::Min(8),         // cumulative balance
        ])
        .split(area);

    render_kpis(f, rows[0], &dash);

    let middle = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(rows[1]);

    render_donut(f, middle[0], &dash);
    render_monthly_bars(f, middle[1], &dash);
    render_cumulative(f, rows[2], &dash);
}

fn render_kpis(f: &mut Frame, area: Rect, dash: &Dashboard) {
    let cells = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
        ])
        .split(area);

    for (i, kpi) in dash.kpis.iter().enumerate() {
        let color = match i {
            0 => Color::Green,
            1 => Color::Red,
            _ if kpi.value < 0.0 => Color::Red,
            _ => Color::Cyan,
        };
        let title = if i == 0 {
            format!(" {} · {} ", dash.title, kpi.label)
        } else {
            format!(" {} ", kpi.label)
        };
        let widget = Paragraph::new(Line::from(Span::styled(
            format!("  {}", kpi.formatted),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        )))
        .block(Block::default().borders(Borders::ALL).title(title));
        f.render_widget(widget, cells[i]);
    }
}

const SLICE_COLORS: [Color; 11] = [
    Color::Cyan,
    Color::Yellow,
    Color::LightRed,
    Color::Magenta,
    Color::Green,
    Color::Blue,
    Color::LightMagenta,
    Color::LightYellow,
    Color::LightGreen,
    Color::LightBlue,
    Color::Gray,
];

/// Ring points for each slice; angle 0 = 12 o'clock, clockwise, hole = half radius
fn donut_points(shares: &[f64]) -> Vec<Vec<(f64, f64)>> {
    let mut start = 0.0;
    shares
        .iter()
        .map(|share| {
            let end = start + share * 2.0 * PI;
            let mut points = Vec::new();
            let mut angle = start;
            while angle < end {
                let mut r = 0.5;
                while r <= 1.0 {
                    points.push((r * angle.sin(), r * angle.cos()));
                    r += 0.04;
                }
                angle += 0.015;
            }
            start = end;
            points
        })
        .collect()
}

fn render_donut(f: &mut Frame, area: Rect, dash: &Dashboard) {
    let title = format!("Spending breakdown ({})", dash.selection.month_name());
    if let Some(message) = dash.donut_notice() {
        render_notice(f, area, &title, &message);
        return;
    }

    let parts = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(area);

    let shares: Vec<f64> = dash.expense_slices.iter().map(|s| s.share).collect();
    let rings = donut_points(&shares);

    let canvas = Canvas::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" {} ", title)),
        )
        .marker(Marker::Braille)
        .x_bounds([-1.1, 1.1])
        .y_bounds([-1.1, 1.1])
        .paint(|ctx| {
            for (i, coords) in rings.iter().enumerate() {
                ctx.draw(&Points {
                    coords: coords.as_slice(),
                    color: SLICE_COLORS[i % SLICE_COLORS.len()],
                });
            }
        });
    f.render_widget(canvas, parts[0]);

    let legend: Vec<Line> = dash
        .expense_slices
        .iter()
        .enumerate()
        .map(|(i, slice)| {
            Line::from(vec![
                Span::styled("■ ", Style::default().fg(SLICE_COLORS[i % SLICE_COLORS.len()])),
                Span::raw(format!("{:>5.1}% {}", slice.share * 100.0, slice.category.label())),
            ])
        })
        .collect();
    f.render_widget(
        Paragraph::new(legend).block(Block::default().borders(Borders::ALL)),
        parts[1],
    );
}

fn render_monthly_bars(f: &mut Frame, area: Rect, dash: &Dashboard) {
    let title = format!("Monthly overview {}: income vs expenses", dash.selection.year);
    if let Some(message) = dash.annual_notice() {
        render_notice(f, area, &title, message);
        return;
    }

    let mut chart = BarChart::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" {} ", title)),
        )
        .bar_width(6)
        .bar_gap(1)
        .group_gap(3);

    for m in &dash.monthly {
        let bars = [
            Bar::default()
                .value(m.income.round().max(0.0) as u64)
                .text_value(crate::charts::si_label(m.income))
                .style(Style::default().fg(Color::Green)),
            Bar::default()
                .value(m.expense.round().max(0.0) as u64)
                .text_value(crate::charts::si_label(m.expense))
                .style(Style::default().fg(Color::Red)),
        ];
        // Group label carries the month balance (the line in the web chart)
        let label = format!("{} {:+.0}", &m.month_name[..3], m.balance);
        chart = chart.data(BarGroup::default().label(Line::from(label)).bars(&bars));
    }

    f.render_widget(chart, area);
}

fn render_cumulative(f: &mut Frame, area: Rect, dash: &Dashboard) {
    let title = format!(
        "Cumulative balance {}: what is left month by month?",
        dash.selection.year
    );
    if let Some(message) = dash.annual_notice() {
        render_notice(f, area, &title, message);
        return;
    }

    let points: Vec<(f64, f64)> = dash
        .monthly
        .iter()
        .map(|m| (m.month as f64, m.cumulative))
        .collect();
    let zero: Vec<(f64, f64)> = vec![(1.0, 0.0), (12.0, 0.0)];

    let (mut lo, mut hi) = (0.0_f64, 0.0_f64);
    for (_, y) in &points {
        lo = lo.min(*y);
        hi = hi.max(*y);
    }
    let pad = ((hi - lo).abs() * 0.1).max(1.0);

    let datasets = vec![
        Dataset::default()
            .name("zero")
            .marker(Marker::Dot)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(Color::DarkGray))
            .data(&zero),
        Dataset::default()
            .name("cumulative")
            .marker(Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(Color::Blue))
            .data(&points),
    ];

    let x_labels: Vec<Span> = [1u32, 4, 7, 10, 12]
        .iter()
        .map(|m| Span::raw(&month_name(*m)[..3]))
        .collect();

    let chart = Chart::new(datasets)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" {} ", title)),
        )
        .x_axis(
            Axis::default()
                .bounds([1.0, 12.0])
                .labels(x_labels)
                .style(Style::default().fg(Color::Gray)),
        )
        .y_axis(
            Axis::default()
                .bounds([lo - pad, hi + pad])
                .labels(vec![
                    Span::raw(crate::charts::si_label(lo - pad)),
                    Span::raw("0"),
                    Span::raw(crate::charts::si_label(hi + pad)),
                ])
                .style(Style::default().fg(Color::Gray)),
        );

    f.render_widget(chart, area);
}

fn render_statement(f: &mut Frame, area: Rect, app: &mut App) {
    let parts = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)])
        .split(area);

    let filter = &app.session.filter;
    let search = if app.input_mode == InputMode::Search {
        format!("{}▏", app.input)
    } else {
        filter.text.clone().unwrap_or_default()
    };
    let key = Style::default().fg(Color::Yellow);
    let filter_line = Line::from(vec![
        Span::styled(" y ", key),
        Span::raw(format!("Year {}   ", filter.year)),
        Span::styled("m ", key),
        Span::raw(format!("Month {}   ", filter.month.map(month_name).unwrap_or("All"))),
        Span::styled("/ ", key),
        Span::raw(format!("Search [{}]   ", search)),
        Span::styled(
            app.session.caption(),
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        ),
        if app.session.is_dirty() {
            Span::styled("  (unsaved changes)", Style::default().fg(Color::LightRed))
        } else {
            Span::raw("")
        },
    ]);
    f.render_widget(
        Paragraph::new(filter_line).block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Edit & view data "),
        ),
        parts[0],
    );

    let header_cells = Column::ALL.iter().map(|c| {
        let style = if *c == app.column {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
        };
        Cell::from(c.title()).style(style)
    });

    let header = Row::new(header_cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1);

    let selected = app.state.selected();
    let editing = app.input_mode == InputMode::GridCell;

    let rows = app.session.rows.iter().enumerate().map(|(i, tx)| {
        let color = type_color(tx.transaction_type);

        let cells = Column::ALL.iter().map(|col| {
            let is_cursor = Some(i) == selected && *col == app.column;
            let text = if is_cursor && editing {
                format!("{}▏", app.input)
            } else {
                col.text(tx)
            };

            let style = if is_cursor && editing {
                Style::default().fg(Color::Black).bg(Color::Yellow)
            } else if is_cursor {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::REVERSED)
            } else if matches!(col, Column::Amount | Column::Type) {
                Style::default().fg(color)
            } else {
                Style::default()
            };
            Cell::from(text).style(style)
        });

        Row::new(cells.collect::<Vec<_>>()).height(1)
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(12),
            Constraint::Length(14),
            Constraint::Min(20),
            Constraint::Length(12),
            Constraint::Length(9),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(format!(" Statement · {} ", app.session.filter.describe())),
    )
    .highlight_style(Style::default().bg(Color::DarkGray))
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, parts[1], &mut app.state);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let mut status_spans = vec![];

    if let Some(status) = &app.status {
        let color = if status.is_error { Color::Red } else { Color::Green };
        status_spans.push(Span::styled(format!(" {} ", status.text), Style::default().fg(color)));
        status_spans.push(Span::raw("| "));
    }

    let hints: &[(&str, &str)] = match (app.input_mode, app.current_page) {
        (InputMode::Normal, Page::Entries) => &[("p", " Payday"), ("s", " Save entry"), ("↑/↓", " Field")],
        (InputMode::Normal, Page::Dashboard) => &[("←/→", " Month"), ("[/]", " Year"), ("r", " Reload")],
        (InputMode::Normal, Page::Statement) => &[
            ("Enter", " Edit"),
            ("a", " Add"),
            ("d", " Delete"),
            ("s", " Save"),
        ],
        _ => &[("Enter", " Apply"), ("Esc", " Cancel")],
    };

    for (key, action) in hints {
        status_spans.push(Span::styled(*key, Style::default().fg(Color::Yellow)));
        status_spans.push(Span::raw(format!("{} | ", action)));
    }
    status_spans.push(Span::styled("Tab", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Page | "));
    status_spans.push(Span::styled("q", Style::default().fg(Color::Red)));
    status_spans.push(Span::raw(" Quit"));

    let status_bar = Paragraph::new(vec![Line::from(status_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );

    f.render_widget(status_bar, area);
}
