//! Command line parsing for the player

/// Parsed `:` command
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Submit a quiz score: :score 80
    Score(f64),
    /// Answer comprehension questions by letter, `-` to skip: :answers b a
    Answers(Vec<Option<usize>>),
    /// Report how much of a video was watched: :watched 90
    Watched(f64),
    /// Jump to block n (1-based): :goto 3
    Goto(usize),
    /// Switch dark/light: :theme
    Theme,
    /// Save progress now: :w
    Save,
    /// Quit the player: :q or :quit
    Quit,
    Help,
    /// Empty input
    Nop,
}

/// Result of parsing a command
#[derive(Debug, PartialEq)]
pub enum ParseResult {
    Ok(Command),
    UnknownCommand(String),
    MissingArgument(String),
    InvalidArgument { command: String, value: String },
}

fn percent(cmd: &str, args: &str, make: fn(f64) -> Command) -> ParseResult {
    if args.is_empty() {
        return ParseResult::MissingArgument(cmd.to_string());
    }
    match args.trim_end_matches('%').parse::<f64>() {
        Ok(value) if (0.0..=100.0).contains(&value) => ParseResult::Ok(make(value)),
        _ => ParseResult::InvalidArgument { command: cmd.to_string(), value: args.to_string() },
    }
}

fn answers(args: &str) -> ParseResult {
    if args.is_empty() {
        return ParseResult::MissingArgument("answers".to_string());
    }
    let picks: Option<Vec<Option<usize>>> = args
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|part| !part.is_empty())
        .map(|part| match part.to_ascii_lowercase().as_bytes() {
            [b'-'] => Some(None),
            [letter @ b'a'..=b'z'] => Some(Some((letter - b'a') as usize)),
            _ => None,
        })
        .collect();
    match picks {
        Some(picks) => ParseResult::Ok(Command::Answers(picks)),
        None => ParseResult::InvalidArgument { command: "answers".into(), value: args.to_string() },
    }
}

/// Parse a command string (without the leading :)
pub fn parse_command(input: &str) -> ParseResult {
    let input = input.trim();
    if input.is_empty() {
        return ParseResult::Ok(Command::Nop);
    }

    let mut parts = input.splitn(2, char::is_whitespace);
    let cmd = parts.next().unwrap_or("").to_lowercase();
    let args = parts.next().map(str::trim).unwrap_or("");

    match cmd.as_str() {
        "score" | "quiz" => percent("score", args, Command::Score),
        "answers" | "comprehension" => answers(args),
        "watched" => percent("watched", args, Command::Watched),
        "goto" | "g" => {
            if args.is_empty() {
                return ParseResult::MissingArgument("goto".to_string());
            }
            match args.parse::<usize>() {
                Ok(n) if n > 0 => ParseResult::Ok(Command::Goto(n)),
                _ => ParseResult::InvalidArgument { command: "goto".into(), value: args.to_string() },
            }
        }
        "theme" => ParseResult::Ok(Command::Theme),
        "w" | "write" | "save" => ParseResult::Ok(Command::Save),
        "q" | "quit" | "wq" => ParseResult::Ok(Command::Quit),
        "help" | "h" | "?" => ParseResult::Ok(Command::Help),
        _ => ParseResult::UnknownCommand(cmd),
    }
}

/// One-line help shown for :help
pub const HELP: &str = "j/k move  m mark  C-Enter run  e edit  r reset  h hint  s solution  y copy  t theme  :score N  :answers a b  :q";
