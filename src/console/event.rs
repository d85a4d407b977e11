/// Console input, one per line typed by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleEvent {
    /// Select a row. Zero-based; the user types one-based numbers.
    Select(usize),
    /// Trigger the screen's right button.
    PrimaryAction,
    Back,
    Redraw,
    Quit,
    Unknown(String),
}

/// Parses one input line. Blank lines yield `None`.
pub fn parse_line(line: &str) -> Option<ConsoleEvent> {
    let input = line.trim();
    if input.is_empty() {
        return None;
    }
    let event = match input.to_ascii_lowercase().as_str() {
        "a" => ConsoleEvent::PrimaryAction,
        "b" | "back" => ConsoleEvent::Back,
        "r" => ConsoleEvent::Redraw,
        "q" | "quit" | "exit" => ConsoleEvent::Quit,
        other => match other.parse::<usize>() {
            Ok(n) if n > 0 => ConsoleEvent::Select(n - 1),
            _ => ConsoleEvent::Unknown(input.to_string()),
        },
    };
    Some(event)
}
