//! Commands typed at the interactive watch prompt.

/// One line of input, parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptCommand {
    /// Watch a folder; `None` asks for one on the next line.
    Start(Option<String>),
    Stop,
    Status,
    Help,
    Quit,
    Empty,
}

pub const HELP: &str = "\
Commands:
  start [DIR]  watch DIR (asks for it when omitted), replacing any current watch
  stop         stop watching
  status       show what is being watched
  help         show this help
  quit         stop watching and exit";

/// Parses a prompt line.
///
/// # Errors
///
/// Returns a message for the user when the command is unknown.
pub fn parse(line: &str) -> Result<PromptCommand, String> {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    let command = match word.to_lowercase().as_str() {
        "" => PromptCommand::Empty,
        "start" | "s" => PromptCommand::Start((!rest.is_empty()).then(|| rest.to_string())),
        "stop" => PromptCommand::Stop,
        "status" => PromptCommand::Status,
        "help" | "h" | "?" => PromptCommand::Help,
        "quit" | "q" | "exit" => PromptCommand::Quit,
        other => return Err(format!("unknown command `{other}`; type `help`")),
    };
    Ok(command)
}
