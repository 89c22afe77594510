//! ratatui-based UI.

use std::io::{self, Stdout};
use std::ops::Range;
use std::sync::mpsc::Receiver;
use std::time::Duration;

use adminshell_application::{LoginCompletion, Shell, ShellEvent};
use adminshell_core::menu::{self, MenuRow};
use adminshell_core::{Route, TabDescriptor};
use anyhow::Context as _;
use chrono::Timelike as _;
use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{event, terminal};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Clear, HighlightSpacing, List, ListItem, ListState, Paragraph, Wrap};
use unicode_width::UnicodeWidthStr;

mod login;
mod palette;

use login::{LoginAction, LoginField, LoginForm};
pub use palette::Palette;

const SIDEBAR_WIDTH: u16 = 24;
const SIDEBAR_COLLAPSED_WIDTH: u16 = 6;
const TAB_CLOSE_MARKER: &str = " ×";

pub struct Ui {
    shell: Shell,
    events: Receiver<ShellEvent>,
    palette: Palette,
    route: Route,
    sidebar_cursor: usize,
    login: LoginForm,
    status: Option<String>,
}

impl Ui {
    pub fn new(shell: Shell) -> Self {
        let events = shell.subscribe();
        let palette = Palette::for_class(shell.theme().class());
        let mut ui = Self {
            shell,
            events,
            palette,
            route: Route::Login,
            sidebar_cursor: 0,
            login: LoginForm::default(),
            status: None,
        };
        ui.route = ui.shell.route();
        ui.sync_sidebar_cursor();
        ui
    }

    pub fn shell(&self) -> &Shell {
        &self.shell
    }

    pub fn run(&mut self) -> anyhow::Result<()> {
        let mut terminal = setup_terminal()?;
        terminal.clear().ok();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            self.event_loop(&mut terminal)
        }));
        let restore_result = restore_terminal(&mut terminal);

        match (result, restore_result) {
            (Ok(Ok(())), Ok(())) => Ok(()),
            (Ok(Ok(())), Err(err)) => Err(err),
            (Ok(Err(err)), _) => Err(err),
            (Err(panic), Ok(())) => Err(anyhow::anyhow!(panic_to_string(panic))),
            (Err(panic), Err(err)) => Err(anyhow::anyhow!(
                "{}\n(additionally failed to restore terminal: {err})",
                panic_to_string(panic)
            )),
        }
    }

    fn event_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    ) -> anyhow::Result<()> {
        let tick_rate = Duration::from_millis(100);
        let mut needs_redraw = true;

        loop {
            if self.poll_background() {
                needs_redraw = true;
            }

            if needs_redraw {
                terminal.draw(|frame| self.draw(frame.area(), frame))?;
                needs_redraw = false;
            }

            if !event::poll(tick_rate)? {
                continue;
            }

            match event::read()? {
                Event::Resize(_, _) => {
                    needs_redraw = true;
                }
                Event::Key(key) => {
                    if key.kind == KeyEventKind::Release {
                        continue;
                    }
                    needs_redraw = true;
                    if self.handle_key(key) {
                        return Ok(());
                    }
                }
                _ => {}
            }
        }
    }

    /// Applies finished logins and drains shell events. Returns whether
    /// anything visible changed.
    fn poll_background(&mut self) -> bool {
        let mut changed = false;

        if let Some(completion) = self.shell.poll_login() {
            changed = true;
            match completion {
                LoginCompletion::Authenticated(_) => self.login.reset(),
                LoginCompletion::Failed(message) => self.login.error = Some(message),
                LoginCompletion::Stale => {}
            }
        }

        while let Ok(event) = self.events.try_recv() {
            changed = true;
            match event {
                ShellEvent::ThemeApplied(class) => self.palette = Palette::for_class(class),
                ShellEvent::ActiveTabChanged(_) | ShellEvent::SidebarChanged(_) => {
                    self.sync_sidebar_cursor()
                }
                _ => {}
            }
        }

        changed
    }

    /// Returns `true` when the UI should exit.
    fn handle_key(&mut self, key: KeyEvent) -> bool {
        match self.route {
            Route::Login => self.handle_login_key(key),
            Route::Protected(_) => self.handle_shell_key(key),
        }
    }

    fn handle_login_key(&mut self, key: KeyEvent) -> bool {
        let pending = self.shell.auth().is_pending();
        match self.login.handle_key(key, pending) {
            LoginAction::None => false,
            LoginAction::Quit => true,
            LoginAction::Cancel => {
                self.shell.cancel_login();
                false
            }
            LoginAction::Submit => {
                let username = self.login.username.trim().to_string();
                let password = self.login.password.clone();
                tracing::debug!(%username, remember = self.login.remember, "submit login");
                self.shell
                    .submit_login(&username, &password, self.login.remember);
                false
            }
        }
    }

    fn handle_shell_key(&mut self, key: KeyEvent) -> bool {
        self.status = None;
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => return true,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => return true,
            KeyCode::Up => self.move_sidebar_cursor(-1),
            KeyCode::Down => self.move_sidebar_cursor(1),
            KeyCode::Enter => {
                if let Some(row) = self.sidebar_rows().get(self.sidebar_cursor) {
                    let key = row.node.key;
                    self.shell.menu_select(key);
                }
            }
            KeyCode::Tab => self.shell.cycle_tab(true),
            KeyCode::BackTab => self.shell.cycle_tab(false),
            KeyCode::Char(ch @ '1'..='9') => {
                let idx = ch as usize - '1' as usize;
                if let Some(tab) = self.shell.tabs().tabs().get(idx) {
                    let key = tab.key.clone();
                    self.shell.switch_tab(&key);
                }
            }
            KeyCode::Char('w') => {
                let active = self.shell.tabs().active_key().to_string();
                if self.shell.tabs().closable(&active) {
                    self.shell.close_tab(&active);
                } else {
                    tracing::debug!(key = %active, "close refused");
                    self.status = Some("仪表盘不可关闭".to_string());
                }
            }
            KeyCode::Char('b') => self.shell.toggle_sidebar(),
            KeyCode::Char('t') => self.shell.toggle_theme(),
            KeyCode::Char('L') => self.shell.logout(),
            _ => {}
        }
        self.poll_background();
        false
    }

    fn sidebar_rows(&self) -> Vec<MenuRow> {
        if self.shell.tabs().collapsed() {
            menu::collapsed_rows()
        } else {
            menu::rows()
        }
    }

    fn move_sidebar_cursor(&mut self, delta: isize) {
        let len = self.sidebar_rows().len();
        if len == 0 {
            return;
        }
        let next = (self.sidebar_cursor as isize + delta).rem_euclid(len as isize);
        self.sidebar_cursor = next as usize;
    }

    /// Puts the sidebar cursor on the row for the active tab, or on its
    /// group when the sidebar is collapsed.
    fn sync_sidebar_cursor(&mut self) {
        let active = self.shell.tabs().active_key().to_string();
        let rows = self.sidebar_rows();
        let target = if self.shell.tabs().collapsed() {
            menu::find_child(&active)
                .map(|(parent, _)| parent.key)
                .unwrap_or(active.as_str())
                .to_string()
        } else {
            active
        };
        if let Some(pos) = rows.iter().position(|row| row.node.key == target) {
            self.sidebar_cursor = pos;
        } else {
            self.sidebar_cursor = self.sidebar_cursor.min(rows.len().saturating_sub(1));
        }
    }

    fn draw(&mut self, area: Rect, frame: &mut ratatui::Frame) {
        self.route = self.shell.route();
        frame.render_widget(Clear, area);
        frame.render_widget(Block::default().style(self.palette.base()), area);

        match self.route {
            Route::Login => self.draw_login(area, frame),
            Route::Protected(_) => self.draw_shell(area, frame),
        }
    }

    fn draw_shell(&self, area: Rect, frame: &mut ratatui::Frame) {
        let sidebar_width = if self.shell.tabs().collapsed() {
            SIDEBAR_COLLAPSED_WIDTH
        } else {
            SIDEBAR_WIDTH
        };
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(sidebar_width), Constraint::Min(0)])
            .split(area);

        self.draw_sidebar(columns[0], frame);

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(2),
                Constraint::Length(2),
                Constraint::Min(0),
                Constraint::Length(2),
            ])
            .split(columns[1]);

        let header = Paragraph::new(self.header_line(rows[0].width))
            .block(Block::default().borders(Borders::BOTTOM).border_style(self.palette.border()));
        frame.render_widget(header, rows[0]);

        let tab_bar = Paragraph::new(self.tab_bar_line(rows[1].width))
            .block(Block::default().borders(Borders::BOTTOM).border_style(self.palette.border()));
        frame.render_widget(tab_bar, rows[1]);

        self.draw_content(rows[2], frame);

        let footer = Paragraph::new(Text::from(self.shell_footer_lines()))
            .alignment(Alignment::Center)
            .style(self.palette.muted());
        frame.render_widget(footer, rows[3]);
    }

    fn draw_sidebar(&self, area: Rect, frame: &mut ratatui::Frame) {
        let collapsed = self.shell.tabs().collapsed();
        let title = if collapsed { "" } else { "Admin Shell" };
        let block = Block::default()
            .borders(Borders::RIGHT)
            .border_style(self.palette.border())
            .title(Span::styled(title, self.palette.accent()));

        let active = self.shell.tabs().active_key();
        let items: Vec<ListItem> = self
            .sidebar_rows()
            .iter()
            .map(|row| {
                let text = if collapsed {
                    row.node.label.chars().next().map(String::from).unwrap_or_default()
                } else {
                    format!("{}{}", "  ".repeat(row.depth), row.node.label)
                };
                let style = if row.node.key == active {
                    self.palette.accent()
                } else if row.node.is_group() {
                    self.palette.muted()
                } else {
                    Style::default()
                };
                ListItem::new(Line::from(Span::styled(text, style)))
            })
            .collect();

        let list = List::new(items)
            .block(block)
            .highlight_style(self.palette.highlight())
            .highlight_symbol("> ")
            .highlight_spacing(HighlightSpacing::Always);

        let mut state = ListState::default();
        state.select(Some(self.sidebar_cursor));
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn header_line(&self, width: u16) -> Line<'static> {
        let toggle = if self.shell.tabs().collapsed() { "»" } else { "«" };
        let breadcrumb = self.shell.tabs().breadcrumb().join(" / ");
        let theme_action = if self.shell.theme().is_dark() {
            "浅色模式"
        } else {
            "深色模式"
        };
        let user = self
            .shell
            .auth()
            .user()
            .map(|u| u.username.clone())
            .unwrap_or_default();

        let left = format!(" {toggle} {breadcrumb}");
        let right = format!("[t] {theme_action}  {user} ");
        let gap = (width as usize)
            .saturating_sub(left.width() + right.width())
            .max(1);

        Line::from(vec![
            Span::styled(left, Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(" ".repeat(gap)),
            Span::styled(right, self.palette.muted()),
        ])
    }

    fn tab_bar_line(&self, width: u16) -> Line<'static> {
        let tabs = self.shell.tabs();
        let titles: Vec<String> = tabs
            .tabs()
            .iter()
            .map(|tab| tab_title(tab, tabs.closable(&tab.key)))
            .collect();
        let widths: Vec<usize> = titles.iter().map(|t| t.width() + 1).collect();
        let active = tabs.tabs().iter().position(|t| t.key == tabs.active_key());
        let window = visible_tab_window(&widths, active, width as usize);

        let mut spans = Vec::new();
        if window.start > 0 {
            spans.push(Span::styled("‹", self.palette.muted()));
        }
        for idx in window.clone() {
            let style = if Some(idx) == active {
                self.palette.highlight()
            } else {
                self.palette.muted()
            };
            spans.push(Span::styled(titles[idx].clone(), style));
            spans.push(Span::raw(" "));
        }
        if window.end < titles.len() {
            spans.push(Span::styled("›", self.palette.muted()));
        }
        Line::from(spans)
    }

    fn draw_content(&self, area: Rect, frame: &mut ratatui::Frame) {
        let Some(tab) = self.shell.tabs().active_descriptor() else {
            return;
        };
        let mut lines = vec![Line::from(Span::styled(tab.label.clone(), self.palette.accent()))];
        lines.push(Line::raw(""));
        lines.push(Line::raw(tab.content().body()));

        let paragraph = Paragraph::new(Text::from(lines))
            .block(Block::default().borders(Borders::NONE))
            .wrap(Wrap { trim: true });
        let inner = Rect {
            x: area.x.saturating_add(2),
            y: area.y.saturating_add(1),
            width: area.width.saturating_sub(4),
            height: area.height.saturating_sub(1),
        };
        frame.render_widget(paragraph, inner);
    }

    fn shell_footer_lines(&self) -> Vec<Line<'static>> {
        if let Some(status) = &self.status {
            return vec![Line::from(Span::styled(status.clone(), self.palette.error()))];
        }
        let bold = Style::default().add_modifier(Modifier::BOLD);
        vec![Line::from(vec![
            Span::styled("↑/↓", bold),
            Span::raw(" menu  "),
            Span::styled("Enter", bold),
            Span::raw(" open  "),
            Span::styled("Tab", bold),
            Span::raw(" next tab  "),
            Span::styled("w", bold),
            Span::raw(" close  "),
            Span::styled("b", bold),
            Span::raw(" sidebar  "),
            Span::styled("t", bold),
            Span::raw(" theme  "),
            Span::styled("L", bold),
            Span::raw(" logout  "),
            Span::styled("q", bold),
            Span::raw(" quit"),
        ])]
    }

    fn draw_login(&self, area: Rect, frame: &mut ratatui::Frame) {
        let popup_area = centered_rect(60, 60, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(self.palette.border())
            .style(self.palette.base())
            .title(Span::styled(" 登录 ", self.palette.accent()))
            .title_alignment(Alignment::Center);
        frame.render_widget(block.clone(), popup_area);

        let inner = block.inner(popup_area);
        let sections = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(2)])
            .split(inner);

        let pending = self.shell.auth().is_pending();
        let hour = chrono::Local::now().hour();
        let field_style = |field: LoginField| {
            if self.login.field == field {
                self.palette.highlight()
            } else {
                Style::default()
            }
        };

        let mut lines = vec![
            Line::raw(login::greeting_line(hour)),
            Line::raw(""),
            Line::from(vec![
                Span::styled("用户名 ", self.palette.muted()),
                Span::styled(format!(" {} ", self.login.username), field_style(LoginField::Username)),
            ]),
            Line::raw(""),
            Line::from(vec![
                Span::styled("密码   ", self.palette.muted()),
                Span::styled(
                    format!(" {} ", self.login.masked_password()),
                    field_style(LoginField::Password),
                ),
            ]),
            Line::raw(""),
            Line::from(Span::styled(
                format!("[{}] 记住我", if self.login.remember { "x" } else { " " }),
                field_style(LoginField::Remember),
            )),
            Line::raw(""),
        ];

        if pending {
            lines.push(Line::from(Span::styled("[ 登录中... ]", self.palette.muted())));
        } else {
            lines.push(Line::from(Span::styled("[ 登录 ]", self.palette.accent())));
        }

        if let Some(error) = &self.login.error {
            lines.push(Line::raw(""));
            lines.push(Line::from(Span::styled(error.clone(), self.palette.error())));
        }

        let form = Paragraph::new(Text::from(lines)).wrap(Wrap { trim: false });
        frame.render_widget(form, sections[0]);

        let bold = Style::default().add_modifier(Modifier::BOLD);
        let esc_action = if pending { " cancel  " } else { " quit  " };
        let help = Paragraph::new(Line::from(vec![
            Span::styled("Tab", bold),
            Span::raw(" field  "),
            Span::styled("Space", bold),
            Span::raw(" remember  "),
            Span::styled("Enter", bold),
            Span::raw(" login  "),
            Span::styled("Esc", bold),
            Span::raw(esc_action),
        ]))
        .style(self.palette.muted())
        .alignment(Alignment::Center);
        frame.render_widget(help, sections[1]);
    }
}

fn tab_title(tab: &TabDescriptor, closable: bool) -> String {
    if closable {
        format!(" {}{TAB_CLOSE_MARKER} ", tab.label)
    } else {
        format!(" {} ", tab.label)
    }
}

/// Picks a contiguous run of tabs that fits in `max_width` columns and
/// contains the active tab. Two columns are reserved for scroll markers.
fn visible_tab_window(widths: &[usize], active: Option<usize>, max_width: usize) -> Range<usize> {
    let total: usize = widths.iter().sum();
    if total <= max_width {
        return 0..widths.len();
    }

    let budget = max_width.saturating_sub(2);
    let anchor = active.unwrap_or(0).min(widths.len().saturating_sub(1));
    let mut start = anchor;
    let mut end = anchor + 1;
    let mut used = widths.get(anchor).copied().unwrap_or(0);

    loop {
        let mut grew = false;
        if end < widths.len() && used + widths[end] <= budget {
            used += widths[end];
            end += 1;
            grew = true;
        }
        if start > 0 && used + widths[start - 1] <= budget {
            start -= 1;
            used += widths[start];
            grew = true;
        }
        if !grew {
            break;
        }
    }
    start..end
}

fn setup_terminal() -> anyhow::Result<Terminal<CrosstermBackend<Stdout>>> {
    terminal::enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    crossterm::execute!(stdout, EnterAlternateScreen).context("enter alt screen")?;
    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend).context("create terminal")
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> anyhow::Result<()> {
    terminal::disable_raw_mode().context("disable raw mode")?;
    crossterm::execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("leave alt screen")?;
    terminal.show_cursor().context("show cursor")?;
    Ok(())
}

fn panic_to_string(panic: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        format!("panic: {s}")
    } else if let Some(s) = panic.downcast_ref::<String>() {
        format!("panic: {s}")
    } else {
        "panic: (unknown payload)".to_string()
    }
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
