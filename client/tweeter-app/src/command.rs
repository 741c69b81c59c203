//! Line commands read from stdin

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Go(String),
    Login { email: String, password: String },
    Logout,
    Post(String),
    Refresh,
    Rename(String),
    Dismiss,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError(pub String);

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

pub const HELP: &str = "\
Commands:
  /, /profile, /login     open a view
  go <path>               same as typing the path
  login <email> <password>
  logout
  post <text>             publish a tweet
  refresh                 reload the feed
  name <new name>         change your display name
  dismiss                 hide the current error
  help
  quit";

impl Command {
    /// `Ok(None)` for a blank line
    pub fn parse(line: &str) -> Result<Option<Self>, ParseError> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }
        if line.starts_with('/') {
            return Ok(Some(Self::Go(line.to_string())));
        }

        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        let command = match word.to_ascii_lowercase().as_str() {
            "go" if !rest.is_empty() => Self::Go(rest.to_string()),
            "login" => {
                let mut parts = rest.split_whitespace();
                match (parts.next(), parts.next()) {
                    (Some(email), Some(password)) => Self::Login {
                        email: email.to_string(),
                        password: password.to_string(),
                    },
                    _ => return Err(ParseError("usage: login <email> <password>".to_string())),
                }
            }
            "logout" => Self::Logout,
            // Content is passed through untouched, empty included
            "post" => Self::Post(rest.to_string()),
            "refresh" => Self::Refresh,
            "name" => Self::Rename(rest.to_string()),
            "dismiss" => Self::Dismiss,
            "help" | "?" => Self::Help,
            "quit" | "exit" => Self::Quit,
            _ => return Err(ParseError(format!("unknown command `{}`; try `help`", word))),
        };

        Ok(Some(command))
    }
}
