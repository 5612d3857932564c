use std::io::{self, IsTerminal, Write};

use anyhow::{bail, Context, Result};
use crossterm::event::{read, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal;
use diigo_core::{CredentialProvider, DiigoError, Login};
use secrecy::SecretString;

const USERNAME_PROMPT: &str = "username";
const PASSWORD_PROMPT: &str = "password";

pub fn prompt_input(message: &str, default: Option<&str>) -> Result<String> {
    print_prompt(message, default)?;
    let mut buffer = String::new();
    io::stdin()
        .read_line(&mut buffer)
        .context("failed to read input")?;
    let input = buffer.trim().to_string();
    if input.is_empty() {
        Ok(default.unwrap_or_default().to_string())
    } else {
        Ok(input)
    }
}

/// Reads a line without echoing it. Falls back to a plain read when stdin
/// is not a terminal so piped input keeps working.
pub fn prompt_password(message: &str) -> Result<String> {
    print_prompt(message, None)?;
    if !io::stdin().is_terminal() {
        let mut buffer = String::new();
        io::stdin()
            .read_line(&mut buffer)
            .context("failed to read password")?;
        return Ok(buffer.trim_end_matches(['\r', '\n']).to_string());
    }

    terminal::enable_raw_mode().context("failed to switch terminal to raw mode")?;
    let result = read_hidden_line();
    terminal::disable_raw_mode().ok();
    println!();
    result
}

fn read_hidden_line() -> Result<String> {
    let mut password = String::new();
    loop {
        if let Event::Key(key) = read()? {
            match classify_key(key) {
                Some(HiddenKey::Char(ch)) => password.push(ch),
                Some(HiddenKey::Backspace) => {
                    password.pop();
                }
                Some(HiddenKey::Submit) => return Ok(password),
                Some(HiddenKey::Abort) => bail!("password entry cancelled"),
                None => {}
            }
        }
    }
}

enum HiddenKey {
    Char(char),
    Backspace,
    Submit,
    Abort,
}

fn classify_key(key: KeyEvent) -> Option<HiddenKey> {
    if key.kind != KeyEventKind::Press {
        return None;
    }
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('c') | KeyCode::Char('d') => Some(HiddenKey::Abort),
            _ => None,
        };
    }
    match key.code {
        KeyCode::Enter => Some(HiddenKey::Submit),
        KeyCode::Esc => Some(HiddenKey::Abort),
        KeyCode::Backspace => Some(HiddenKey::Backspace),
        KeyCode::Char(ch) => Some(HiddenKey::Char(ch)),
        _ => None,
    }
}

fn prompt_text(message: &str, default: Option<&str>) -> String {
    match default {
        Some(value) if !value.is_empty() => format!("{} [{}]: ", message, value),
        _ => format!("{}: ", message),
    }
}

fn print_prompt(message: &str, default: Option<&str>) -> Result<()> {
    let mut stdout = io::stdout();
    write!(stdout, "{}", prompt_text(message, default))?;
    stdout.flush().context("failed to flush prompt")?;
    Ok(())
}

/// Asks for whatever part of the login was not supplied up front.
pub struct PromptCredentials {
    pub username: Option<String>,
}

impl CredentialProvider for PromptCredentials {
    fn login(&self) -> Result<Login, DiigoError> {
        let username = match &self.username {
            Some(username) => username.clone(),
            None => prompt_input(USERNAME_PROMPT, None).map_err(credentials_error)?,
        };
        let password = prompt_password(PASSWORD_PROMPT).map_err(credentials_error)?;
        Ok(Login {
            username,
            password: SecretString::new(password),
        })
    }
}

fn credentials_error(err: anyhow::Error) -> DiigoError {
    DiigoError::Credentials(format!("{err:#}"))
}
