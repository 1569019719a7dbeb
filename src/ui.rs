use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState, Wrap},
    Frame, Terminal,
};
use std::io;
use student_registry::{
    catalog, Address, Changes, FieldError, Record, Registrar, Schema, Session, StoreContents,
    Submission, WorkflowError,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Home,
    Register,
    Students,
    Manage,
    Courses,
}

impl Page {
    pub const ALL: [Page; 5] = [
        Page::Home,
        Page::Register,
        Page::Students,
        Page::Manage,
        Page::Courses,
    ];

    pub fn next(&self) -> Self {
        match self {
            Page::Home => Page::Register,
            Page::Register => Page::Students,
            Page::Students => Page::Manage,
            Page::Manage => Page::Courses,
            Page::Courses => Page::Home,
        }
    }

    pub fn previous(&self) -> Self {
        match self {
            Page::Home => Page::Courses,
            Page::Register => Page::Home,
            Page::Students => Page::Register,
            Page::Manage => Page::Students,
            Page::Courses => Page::Manage,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Page::Home => "Home",
            Page::Register => "Register",
            Page::Students => "Students",
            Page::Manage => "Manage",
            Page::Courses => "Courses",
        }
    }
}

// ============================================================================
// FORMS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKey {
    FullName,
    Identifier,
    Email,
    BirthDate,
    PostalCode,
    Number,
    Complement,
}

impl FieldKey {
    pub fn label(&self) -> &str {
        match self {
            FieldKey::FullName => "Full name",
            FieldKey::Identifier => "Identifier (11 digits)",
            FieldKey::Email => "Email",
            FieldKey::BirthDate => "Birth date (dd/mm/yyyy)",
            FieldKey::PostalCode => "Postal code (8 digits)",
            FieldKey::Number => "Number",
            FieldKey::Complement => "Complement",
        }
    }

    fn registration_fields(schema: Schema) -> Vec<FieldKey> {
        let mut keys = vec![FieldKey::FullName, FieldKey::Identifier, FieldKey::Email];
        if schema.has_birth_date() {
            keys.push(FieldKey::BirthDate);
        }
        keys.extend([FieldKey::PostalCode, FieldKey::Number, FieldKey::Complement]);
        keys
    }

    fn edit_fields(schema: Schema) -> Vec<FieldKey> {
        let mut keys = vec![FieldKey::Email];
        if schema.has_birth_date() {
            keys.push(FieldKey::BirthDate);
        }
        keys.extend([FieldKey::PostalCode, FieldKey::Number, FieldKey::Complement]);
        keys
    }
}

/// Text inputs with one focused line
#[derive(Debug, Clone)]
pub struct Form {
    pub fields: Vec<(FieldKey, String)>,
    pub focused: usize,
}

impl Form {
    pub fn new(keys: Vec<FieldKey>) -> Self {
        Form {
            fields: keys.into_iter().map(|k| (k, String::new())).collect(),
            focused: 0,
        }
    }

    pub fn value(&self, key: FieldKey) -> &str {
        self.fields
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
            .unwrap_or("")
    }

    pub fn set(&mut self, key: FieldKey, value: impl Into<String>) {
        if let Some((_, v)) = self.fields.iter_mut().find(|(k, _)| *k == key) {
            *v = value.into();
        }
    }

    pub fn focused_key(&self) -> FieldKey {
        self.fields[self.focused].0
    }

    pub fn is_last(&self) -> bool {
        self.focused + 1 == self.fields.len()
    }

    pub fn push_char(&mut self, c: char) {
        self.fields[self.focused].1.push(c);
    }

    pub fn pop_char(&mut self) {
        self.fields[self.focused].1.pop();
    }

    pub fn next(&mut self) {
        self.focused = (self.focused + 1) % self.fields.len();
    }

    pub fn previous(&mut self) {
        self.focused = if self.focused == 0 {
            self.fields.len() - 1
        } else {
            self.focused - 1
        };
    }

    pub fn clear(&mut self) {
        for (_, v) in self.fields.iter_mut() {
            v.clear();
        }
        self.focused = 0;
    }

    fn birth_date(&self) -> Option<String> {
        self.fields
            .iter()
            .find(|(k, _)| *k == FieldKey::BirthDate)
            .map(|(_, v)| v.clone())
    }

    fn submission(&self) -> Submission {
        Submission {
            full_name: self.value(FieldKey::FullName).to_string(),
            identifier: self.value(FieldKey::Identifier).to_string(),
            email: self.value(FieldKey::Email).to_string(),
            birth_date: self.birth_date(),
            postal_code: self.value(FieldKey::PostalCode).to_string(),
            number: self.value(FieldKey::Number).to_string(),
            complement: self.value(FieldKey::Complement).to_string(),
        }
    }

    fn changes(&self) -> Changes {
        Changes {
            email: self.value(FieldKey::Email).to_string(),
            birth_date: self.birth_date(),
            postal_code: self.value(FieldKey::PostalCode).to_string(),
            number: self.value(FieldKey::Number).to_string(),
            complement: self.value(FieldKey::Complement).to_string(),
        }
    }

    fn fill(&mut self, changes: &Changes) {
        self.set(FieldKey::Email, changes.email.clone());
        self.set(FieldKey::BirthDate, changes.birth_date.clone().unwrap_or_default());
        self.set(FieldKey::PostalCode, changes.postal_code.clone());
        self.set(FieldKey::Number, changes.number.clone());
        self.set(FieldKey::Complement, changes.complement.clone());
        self.focused = 0;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Success,
    Info,
    Error,
}

#[derive(Debug, Clone)]
pub struct Notice {
    pub tone: Tone,
    pub text: String,
}

#[derive(Debug, Clone)]
pub enum ManageStage {
    Search,
    Editing(Record),
}

// ============================================================================
// APP
// ============================================================================

pub struct App {
    pub registrar: Registrar,
    pub session: Session,
    pub current_page: Page,
    pub register_form: Form,
    pub register_preview: Option<Result<Address, FieldError>>,
    pub students: Vec<Record>,
    pub students_note: Option<String>,
    pub students_state: TableState,
    pub manage_search: String,
    pub manage_stage: ManageStage,
    pub edit_form: Form,
    pub edit_preview: Option<Result<Address, FieldError>>,
    pub course_scroll: u16,
    pub notices: Vec<Notice>,
}

impl App {
    pub fn new(registrar: Registrar) -> Self {
        let schema = registrar.schema();

        Self {
            registrar,
            session: Session::new(),
            current_page: Page::Home,
            register_form: Form::new(FieldKey::registration_fields(schema)),
            register_preview: None,
            students: Vec::new(),
            students_note: None,
            students_state: TableState::default(),
            manage_search: String::new(),
            manage_stage: ManageStage::Search,
            edit_form: Form::new(FieldKey::edit_fields(schema)),
            edit_preview: None,
            course_scroll: 0,
            notices: Vec::new(),
        }
    }

    pub fn next_page(&mut self) {
        self.goto(self.current_page.next());
    }

    pub fn previous_page(&mut self) {
        self.goto(self.current_page.previous());
    }

    pub fn goto(&mut self, page: Page) {
        self.current_page = page;
        self.notices.clear();
        if page == Page::Students {
            self.reload_students();
        }
    }

    fn notify(&mut self, tone: Tone, text: impl Into<String>) {
        self.notices = vec![Notice {
            tone,
            text: text.into(),
        }];
    }

    fn notify_failure(&mut self, err: &WorkflowError) {
        self.notices = err
            .messages()
            .into_iter()
            .map(|text| Notice {
                tone: Tone::Error,
                text,
            })
            .collect();
    }

    pub fn reload_students(&mut self) {
        self.students.clear();
        self.students_note = None;

        match self.registrar.list() {
            Ok(StoreContents::Missing) => {
                self.students_note = Some("No registered students found.".to_string())
            }
            Ok(StoreContents::Empty) => {
                self.students_note = Some("The student file is empty.".to_string())
            }
            Ok(StoreContents::Rows(records)) => self.students = records,
            Err(e) => self.students_note = Some(e.messages().join(" ")),
        }

        self.students_state
            .select(if self.students.is_empty() { None } else { Some(0) });
    }

    /// Address preview for the postal code field being left
    fn preview_for(&self, form: &Form) -> Option<Option<Result<Address, FieldError>>> {
        if form.focused_key() != FieldKey::PostalCode {
            return None;
        }
        let code = form.value(FieldKey::PostalCode);
        if code.is_empty() {
            return Some(None);
        }
        Some(Some(self.registrar.preview_address(code)))
    }

    pub fn submit_registration(&mut self) {
        let submission = self.register_form.submission();

        match self.registrar.create(&mut self.session, &submission) {
            Ok(record) => {
                self.register_form.clear();
                self.register_preview = None;
                self.notify(
                    Tone::Success,
                    format!("Registration of {} completed successfully!", record.full_name),
                );
            }
            Err(e) => self.notify_failure(&e),
        }
    }

    pub fn search_registration(&mut self) {
        match self.registrar.find(self.manage_search.trim()) {
            Ok(record) => {
                self.edit_form.fill(&Changes::from_record(&record));
                self.edit_preview = Some(Ok(record.address.clone()));
                self.manage_stage = ManageStage::Editing(record);
                self.notify(Tone::Info, "Registration found.");
            }
            Err(e) => self.notify_failure(&e),
        }
    }

    pub fn save_changes(&mut self) {
        let identifier = match &self.manage_stage {
            ManageStage::Editing(record) => record.identifier.clone(),
            ManageStage::Search => return,
        };

        match self.registrar.update(&identifier, &self.edit_form.changes()) {
            Ok(record) => {
                self.edit_preview = Some(Ok(record.address.clone()));
                self.manage_stage = ManageStage::Editing(record);
                self.notify(Tone::Success, "Registration updated successfully!");
            }
            Err(e) => self.notify_failure(&e),
        }
    }

    pub fn delete_registration(&mut self) {
        let identifier = match &self.manage_stage {
            ManageStage::Editing(record) => record.identifier.clone(),
            ManageStage::Search => return,
        };

        match self.registrar.delete(&identifier) {
            Ok(()) => {
                self.manage_stage = ManageStage::Search;
                self.manage_search.clear();
                self.edit_preview = None;
                self.notify(Tone::Success, "Registration deleted successfully!");
            }
            Err(e) => self.notify_failure(&e),
        }
    }

    pub fn next_student(&mut self) {
        let len = self.students.len();
        if len == 0 {
            return;
        }
        let i = match self.students_state.selected() {
            Some(i) if i + 1 < len => i + 1,
            _ => 0,
        };
        self.students_state.select(Some(i));
    }

    pub fn previous_student(&mut self) {
        let len = self.students.len();
        if len == 0 {
            return;
        }
        let i = match self.students_state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        self.students_state.select(Some(i));
    }

    /// Apply one key press. Returns true when the app should exit.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return true;
        }

        match key.code {
            KeyCode::Tab => {
                self.next_page();
                return false;
            }
            KeyCode::BackTab => {
                self.previous_page();
                return false;
            }
            _ => {}
        }

        match self.current_page {
            Page::Home => self.handle_home_key(key),
            Page::Register => self.handle_register_key(key),
            Page::Students => self.handle_students_key(key),
            Page::Manage => self.handle_manage_key(key),
            Page::Courses => self.handle_courses_key(key),
        }
    }

    fn handle_home_key(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Char('1') => self.goto(Page::Register),
            KeyCode::Char('2') => self.goto(Page::Students),
            KeyCode::Char('3') => self.goto(Page::Manage),
            KeyCode::Char('4') => self.goto(Page::Courses),
            _ => {}
        }
        false
    }

    fn handle_register_key(&mut self, key: KeyEvent) -> bool {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

        match key.code {
            KeyCode::Esc => return true,
            KeyCode::Char('s') if ctrl => self.submit_registration(),
            KeyCode::Enter if self.register_form.is_last() => self.submit_registration(),
            KeyCode::Enter | KeyCode::Down => {
                if let Some(preview) = self.preview_for(&self.register_form) {
                    self.register_preview = preview;
                }
                self.register_form.next();
            }
            KeyCode::Up => {
                if let Some(preview) = self.preview_for(&self.register_form) {
                    self.register_preview = preview;
                }
                self.register_form.previous();
            }
            KeyCode::Backspace => self.register_form.pop_char(),
            KeyCode::Char(c) if !ctrl => self.register_form.push_char(c),
            _ => {}
        }
        false
    }

    fn handle_students_key(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Char('r') => self.reload_students(),
            KeyCode::Down | KeyCode::Char('j') => self.next_student(),
            KeyCode::Up | KeyCode::Char('k') => self.previous_student(),
            KeyCode::Home if !self.students.is_empty() => self.students_state.select(Some(0)),
            KeyCode::End if !self.students.is_empty() => {
                self.students_state.select(Some(self.students.len() - 1))
            }
            _ => {}
        }
        false
    }

    fn handle_manage_key(&mut self, key: KeyEvent) -> bool {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

        match self.manage_stage {
            ManageStage::Search => match key.code {
                KeyCode::Esc => return true,
                KeyCode::Enter => self.search_registration(),
                KeyCode::Backspace => {
                    self.manage_search.pop();
                }
                KeyCode::Char(c) if !ctrl => self.manage_search.push(c),
                _ => {}
            },
            ManageStage::Editing(_) => match key.code {
                KeyCode::Esc => {
                    self.manage_stage = ManageStage::Search;
                    self.edit_preview = None;
                    self.notices.clear();
                }
                KeyCode::Char('s') if ctrl => self.save_changes(),
                KeyCode::Char('d') if ctrl => self.delete_registration(),
                KeyCode::Enter if self.edit_form.is_last() => self.save_changes(),
                KeyCode::Enter | KeyCode::Down => {
                    if let Some(preview) = self.preview_for(&self.edit_form) {
                        self.edit_preview = preview;
                    }
                    self.edit_form.next();
                }
                KeyCode::Up => {
                    if let Some(preview) = self.preview_for(&self.edit_form) {
                        self.edit_preview = preview;
                    }
                    self.edit_form.previous();
                }
                KeyCode::Backspace => self.edit_form.pop_char(),
                KeyCode::Char(c) if !ctrl => self.edit_form.push_char(c),
                _ => {}
            },
        }
        false
    }

    fn handle_courses_key(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Down | KeyCode::Char('j') => {
                self.course_scroll = self.course_scroll.saturating_add(1)
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.course_scroll = self.course_scroll.saturating_sub(1)
            }
            KeyCode::Home => self.course_scroll = 0,
            _ => {}
        }
        false
    }
}

// ============================================================================
// TERMINAL LOOP
// ============================================================================

pub fn run_ui(app: &mut App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

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
            if key.kind != KeyEventKind::Press {
                continue;
            }
            if app.handle_key(key) {
                return Ok(());
            }
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
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
        Page::Home => render_home(f, chunks[1], app),
        Page::Register => render_register(f, chunks[1], app),
        Page::Students => render_students(f, chunks[1], app),
        Page::Manage => render_manage(f, chunks[1], app),
        Page::Courses => render_courses(f, chunks[1], app),
    }

    render_status_bar(f, chunks[2], app);
}

fn label_style() -> Style {
    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
}

fn key_style() -> Style {
    Style::default().fg(Color::Yellow)
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let mut tab_spans = vec![];
    for (i, page) in Page::ALL.iter().enumerate() {
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
    match app.session.registered_identifier() {
        Some(identifier) => tab_spans.push(Span::styled(
            format!("✓ Registered: {}", identifier),
            Style::default().fg(Color::Green),
        )),
        None => tab_spans.push(Span::styled(
            "Not registered",
            Style::default().fg(Color::DarkGray),
        )),
    }

    let header = Paragraph::new(vec![Line::from(tab_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(" 🎓 Student Registry "),
    );

    f.render_widget(header, area);
}

fn render_home(f: &mut Frame, area: Rect, app: &App) {
    let store = app.registrar.store();
    let menu = [
        ("1", "Register a new student"),
        ("2", "List registered students"),
        ("3", "Find, edit or delete a registration"),
        ("4", "Courses (requires a registration)"),
    ];

    let mut content = vec![
        Line::from(""),
        Line::from(Span::styled(
            "  Welcome to the student registration system",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
    ];
    for (key, text) in menu {
        content.push(Line::from(vec![
            Span::raw("   "),
            Span::styled(key, key_style()),
            Span::raw(format!(". {}", text)),
        ]));
    }
    content.push(Line::from(""));
    content.push(Line::from(vec![
        Span::styled("  Record file: ", label_style()),
        Span::raw(store.path().display().to_string()),
        Span::raw(format!(" ({} columns)", store.schema().column_count())),
    ]));

    let paragraph = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" Home "),
    );

    f.render_widget(paragraph, area);
}

fn form_lines(form: &Form, active: bool) -> Vec<Line<'static>> {
    let mut lines = vec![Line::from("")];

    for (i, (key, value)) in form.fields.iter().enumerate() {
        let focused = active && i == form.focused;
        let marker = if focused { "→ " } else { "  " };
        let value_style = if focused {
            Style::default().fg(Color::White).bg(Color::DarkGray)
        } else {
            Style::default().fg(Color::White)
        };
        let cursor = if focused { "▏" } else { "" };

        lines.push(Line::from(vec![
            Span::styled(marker.to_string(), Style::default().fg(Color::Green)),
            Span::styled(format!("{:<24}", key.label()), label_style()),
            Span::styled(format!("{}{}", value, cursor), value_style),
        ]));
    }

    lines
}

fn preview_lines(preview: &Option<Result<Address, FieldError>>) -> Vec<Line<'static>> {
    let mut lines = vec![Line::from(""), Line::from(Span::styled(
        "  ADDRESS",
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
    ))];

    match preview {
        None => lines.push(Line::from(Span::styled(
            "  Filled in from the postal code",
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        ))),
        Some(Err(e)) => lines.push(Line::from(Span::styled(
            format!("  {}", e),
            Style::default().fg(Color::Red),
        ))),
        Some(Ok(address)) => {
            for (label, value) in [
                ("  Locality: ", &address.locality),
                ("  Street:   ", &address.street),
                ("  District: ", &address.district),
            ] {
                lines.push(Line::from(vec![
                    Span::styled(label, label_style()),
                    Span::raw(value.clone()),
                ]));
            }
        }
    }

    lines
}

fn notice_lines(notices: &[Notice]) -> Vec<Line<'static>> {
    let mut lines = vec![Line::from("")];
    for notice in notices {
        let (symbol, color) = match notice.tone {
            Tone::Success => ("✓", Color::Green),
            Tone::Info => ("•", Color::Cyan),
            Tone::Error => ("✗", Color::Red),
        };
        lines.push(Line::from(Span::styled(
            format!("  {} {}", symbol, notice.text),
            Style::default().fg(color),
        )));
    }
    lines
}

fn render_register(f: &mut Frame, area: Rect, app: &App) {
    let mut content = form_lines(&app.register_form, true);
    content.extend(preview_lines(&app.register_preview));
    content.extend(notice_lines(&app.notices));

    let paragraph = Paragraph::new(content)
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::White))
                .title(" Register a Student "),
        );

    f.render_widget(paragraph, area);
}

fn render_students(f: &mut Frame, area: Rect, app: &mut App) {
    let schema = app.registrar.schema();
    let title = format!(" Registered Students ({}) ", app.students.len());

    if let Some(note) = &app.students_note {
        let paragraph = Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled(
                format!("  {}", note),
                Style::default().fg(Color::Yellow),
            )),
        ])
        .block(Block::default().borders(Borders::ALL).title(title));
        f.render_widget(paragraph, area);
        return;
    }

    let header_cells = schema.headers().into_iter().map(|h| {
        Cell::from(h).style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
    });

    let header = Row::new(header_cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1);

    let rows = app.students.iter().map(|record| {
        let cells: Vec<Cell> = record
            .to_row(schema)
            .into_iter()
            .map(|value| Cell::from(truncate(value, 28)))
            .collect();
        Row::new(cells).height(1)
    });

    let widths: Vec<Constraint> = schema
        .headers()
        .iter()
        .map(|h| match *h {
            "Full Name" | "Email" | "Street" => Constraint::Length(28),
            "Locality" | "District" | "Complement" => Constraint::Length(18),
            _ => Constraint::Length(12),
        })
        .collect();

    let table = Table::new(rows, widths)
        .header(header)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::White))
                .title(title),
        )
        .highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.students_state);
}

fn render_manage(f: &mut Frame, area: Rect, app: &App) {
    let searching = matches!(app.manage_stage, ManageStage::Search);

    let mut content = vec![
        Line::from(""),
        Line::from(vec![
            Span::styled(if searching { "→ " } else { "  " }, Style::default().fg(Color::Green)),
            Span::styled(format!("{:<24}", "Identifier"), label_style()),
            Span::raw(format!(
                "{}{}",
                app.manage_search,
                if searching { "▏" } else { "" }
            )),
        ]),
    ];

    if let ManageStage::Editing(record) = &app.manage_stage {
        content.push(Line::from(""));
        content.push(Line::from(vec![
            Span::styled("  Name:       ", label_style()),
            Span::raw(record.full_name.clone()),
        ]));
        content.push(Line::from(vec![
            Span::styled("  Identifier: ", label_style()),
            Span::raw(record.identifier.clone()),
        ]));
        content.extend(form_lines(&app.edit_form, true));
        content.extend(preview_lines(&app.edit_preview));
    }

    content.extend(notice_lines(&app.notices));

    let paragraph = Paragraph::new(content)
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::White))
                .title(" Manage Registration "),
        );

    f.render_widget(paragraph, area);
}

fn render_courses(f: &mut Frame, area: Rect, app: &App) {
    let content = match catalog::open(&app.session) {
        Err(e) => vec![
            Line::from(""),
            Line::from(Span::styled(
                format!("  ⚠ {}", e),
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            )),
        ],
        Ok(catalog) => {
            let mut lines = vec![
                Line::from(""),
                Line::from(Span::styled(
                    format!(
                        "  {} courses, {} lessons",
                        catalog.course_count(),
                        catalog.lesson_count()
                    ),
                    Style::default().fg(Color::DarkGray),
                )),
            ];
            for subject in catalog.areas() {
                lines.push(Line::from(""));
                lines.push(Line::from(Span::styled(
                    format!("  {}", subject.name),
                    Style::default()
                        .fg(Color::Yellow)
                        .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
                )));
                for course in &subject.courses {
                    lines.push(Line::from(Span::styled(
                        format!("    {}", course.name),
                        label_style(),
                    )));
                    for lesson in &course.lessons {
                        lines.push(Line::from(format!("      • {}", lesson)));
                    }
                }
            }
            lines
        }
    };

    let paragraph = Paragraph::new(content)
        .scroll((app.course_scroll, 0))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::White))
                .title(" Courses "),
        );

    f.render_widget(paragraph, area);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let hints: &[(&str, &str)] = match (&app.current_page, &app.manage_stage) {
        (Page::Home, _) => &[("1-4", "Open"), ("q", "Quit")],
        (Page::Register, _) => &[("↑/↓", "Field"), ("Ctrl+S", "Submit"), ("Esc", "Quit")],
        (Page::Students, _) => &[("↑/↓", "Nav"), ("r", "Reload"), ("q", "Quit")],
        (Page::Manage, ManageStage::Search) => &[("Enter", "Find"), ("Esc", "Quit")],
        (Page::Manage, ManageStage::Editing(_)) => &[
            ("↑/↓", "Field"),
            ("Ctrl+S", "Save"),
            ("Ctrl+D", "Delete"),
            ("Esc", "Back"),
        ],
        (Page::Courses, _) => &[("↑/↓", "Scroll"), ("q", "Quit")],
    };

    let mut status_spans = vec![Span::styled(
        format!(" {} ", app.current_page.title()),
        Style::default().fg(Color::Cyan),
    )];

    status_spans.push(Span::raw(" | "));
    status_spans.push(Span::styled("Tab", key_style()));
    status_spans.push(Span::raw(" Page"));
    for (key, action) in hints {
        status_spans.push(Span::raw(" | "));
        status_spans.push(Span::styled(key.to_string(), key_style()));
        status_spans.push(Span::raw(format!(" {}", action)));
    }

    let status_bar = Paragraph::new(vec![Line::from(status_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );

    f.render_widget(status_bar, area);
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len - 3).collect();
        format!("{}...", head)
    }
}
