use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    SetIcon,
    SetTooltip,
    Show,
    Hide,
    Remove,
    Blink,
    Unblink,
}

impl Verb {
    pub const ALL: [Verb; 7] = [
        Verb::SetIcon,
        Verb::SetTooltip,
        Verb::Show,
        Verb::Hide,
        Verb::Remove,
        Verb::Blink,
        Verb::Unblink,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Verb::SetIcon => "set-icon",
            Verb::SetTooltip => "set-tooltip",
            Verb::Show => "show",
            Verb::Hide => "hide",
            Verb::Remove => "remove",
            Verb::Blink => "blink",
            Verb::Unblink => "unblink",
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("No such command: {0}")]
pub struct UnknownVerb(pub String);

impl FromStr for Verb {
    type Err = UnknownVerb;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Verb::ALL
            .into_iter()
            .find(|verb| verb.as_str() == s)
            .ok_or_else(|| UnknownVerb(s.to_string()))
    }
}

/// One parsed line: `<icon> <verb> [args...]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub icon: String,
    pub verb: Verb,
    pub args: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("Not enough params in command: {line:?}")]
    Empty { line: String },
    #[error("Unbalanced quoting in command: {line:?}")]
    Tokenize { line: String },
    #[error("Missing command for icon {icon}")]
    MissingVerb { icon: String },
    #[error("No such command: {verb} (icon {icon})")]
    UnknownVerb { icon: String, verb: String },
    #[error("Command {verb} for icon {icon} requires an argument")]
    MissingArgument { icon: String, verb: Verb },
}

impl CommandError {
    /// Icon named by the line, for errors raised after the name was read.
    pub fn icon(&self) -> Option<&str> {
        match self {
            CommandError::Empty { .. } | CommandError::Tokenize { .. } => None,
            CommandError::MissingVerb { icon }
            | CommandError::UnknownVerb { icon, .. }
            | CommandError::MissingArgument { icon, .. } => Some(icon),
        }
    }
}

/// Escapes every unquoted `#` that opens a word, so it is kept as text
/// instead of starting a comment.
fn escape_comment_marks(line: &str) -> Cow<'_, str> {
    if !line.contains('#') {
        return Cow::Borrowed(line);
    }

    let mut escaped = String::with_capacity(line.len() + 4);
    let mut chars = line.chars();
    let mut word_start = true;

    while let Some(ch) = chars.next() {
        match ch {
            ' ' | '\t' | '\n' => {
                escaped.push(ch);
                word_start = true;
                continue;
            }
            '#' if word_start => escaped.push_str("\\#"),
            '\\' => {
                escaped.push(ch);
                escaped.extend(chars.next());
            }
            '\'' => {
                escaped.push(ch);
                for quoted in chars.by_ref() {
                    escaped.push(quoted);
                    if quoted == '\'' {
                        break;
                    }
                }
            }
            '"' => {
                escaped.push(ch);
                while let Some(quoted) = chars.next() {
                    escaped.push(quoted);
                    match quoted {
                        '\\' => escaped.extend(chars.next()),
                        '"' => break,
                        _ => {}
                    }
                }
            }
            _ => escaped.push(ch),
        }
        word_start = false;
    }

    Cow::Owned(escaped)
}

pub fn parse_line(line: &str) -> Result<Command, CommandError> {
    let escaped = escape_comment_marks(line);
    let tokens = shlex::split(&escaped).ok_or_else(|| CommandError::Tokenize {
        line: line.to_string(),
    })?;
    let mut tokens = tokens.into_iter();

    let icon = tokens.next().ok_or_else(|| CommandError::Empty {
        line: line.to_string(),
    })?;

    let Some(verb) = tokens.next() else {
        return Err(CommandError::MissingVerb { icon });
    };

    let verb = match verb.parse::<Verb>() {
        Ok(verb) => verb,
        Err(UnknownVerb(verb)) => return Err(CommandError::UnknownVerb { icon, verb }),
    };

    let args: Vec<String> = tokens.collect();
    if verb == Verb::SetIcon && args.is_empty() {
        return Err(CommandError::MissingArgument { icon, verb });
    }

    Ok(Command { icon, verb, args })
}
