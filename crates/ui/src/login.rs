//! Login screen state.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LoginField {
    Username,
    Password,
    Remember,
}

impl LoginField {
    fn next(self) -> Self {
        match self {
            LoginField::Username => LoginField::Password,
            LoginField::Password => LoginField::Remember,
            LoginField::Remember => LoginField::Username,
        }
    }

    fn prev(self) -> Self {
        match self {
            LoginField::Username => LoginField::Remember,
            LoginField::Password => LoginField::Username,
            LoginField::Remember => LoginField::Password,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum LoginAction {
    None,
    Submit,
    Cancel,
    Quit,
}

#[derive(Debug, Clone)]
pub(crate) struct LoginForm {
    pub username: String,
    pub password: String,
    pub remember: bool,
    pub field: LoginField,
    pub error: Option<String>,
}

impl Default for LoginForm {
    fn default() -> Self {
        Self {
            username: String::new(),
            password: String::new(),
            remember: false,
            field: LoginField::Username,
            error: None,
        }
    }
}

impl LoginForm {
    /// Applies a key press. `pending` disables submission and turns `Esc`
    /// into a cancel of the running attempt.
    pub fn handle_key(&mut self, key: KeyEvent, pending: bool) -> LoginAction {
        match key.code {
            KeyCode::Esc if pending => LoginAction::Cancel,
            KeyCode::Esc => LoginAction::Quit,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                LoginAction::Quit
            }
            KeyCode::Tab | KeyCode::Down => {
                self.field = self.field.next();
                LoginAction::None
            }
            KeyCode::BackTab | KeyCode::Up => {
                self.field = self.field.prev();
                LoginAction::None
            }
            KeyCode::Enter if pending => LoginAction::None,
            KeyCode::Enter => {
                self.error = None;
                LoginAction::Submit
            }
            KeyCode::Backspace => {
                match self.field {
                    LoginField::Username => {
                        self.username.pop();
                    }
                    LoginField::Password => {
                        self.password.pop();
                    }
                    LoginField::Remember => {}
                }
                LoginAction::None
            }
            KeyCode::Char(' ') if self.field == LoginField::Remember => {
                self.remember = !self.remember;
                LoginAction::None
            }
            KeyCode::Char(ch) => {
                match self.field {
                    LoginField::Username => self.username.push(ch),
                    LoginField::Password => self.password.push(ch),
                    LoginField::Remember => {}
                }
                LoginAction::None
            }
            _ => LoginAction::None,
        }
    }

    pub fn masked_password(&self) -> String {
        "•".repeat(self.password.chars().count())
    }

    /// Clears secrets after a successful login.
    pub fn reset(&mut self) {
        self.password.clear();
        self.error = None;
        self.field = LoginField::Username;
    }
}

pub(crate) fn greeting(hour: u32) -> &'static str {
    match hour {
        5..=11 => "早上好",
        12..=13 => "中午好",
        14..=17 => "下午好",
        18..=21 => "晚上好",
        _ => "夜深了，注意休息哦",
    }
}

pub(crate) fn greeting_line(hour: u32) -> String {
    let greeting = greeting(hour);
    if (5..22).contains(&hour) {
        format!("{greeting}，欢迎使用本系统")
    } else {
        greeting.to_string()
    }
}
