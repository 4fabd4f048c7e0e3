//! The player-facing console seam.
//!
//! The engine never touches stdin/stdout directly. Front-ends implement
//! [`Console`]; tests use [`crate::testing::ScriptedConsole`].

/// Text output plus blocking numbered choices.
pub trait Console {
    /// Show a block of text to the player.
    fn show(&mut self, text: &str);

    /// Present numbered options and block until the player picks one.
    ///
    /// Returns a 1-based index in `[1, options.len()]`. Implementations
    /// re-prompt on non-numeric or out-of-range input for as long as it
    /// takes.
    fn choose(&mut self, prompt: &str, options: &[String]) -> usize;

    /// Ask for a line of free text.
    fn ask(&mut self, prompt: &str) -> String;
}

/// Parse a raw selection; `None` means the console should ask again.
pub fn parse_choice(raw: &str, number_of_choices: usize) -> Option<usize> {
    let choice: usize = raw.trim().parse().ok()?;
    (1..=number_of_choices).contains(&choice).then_some(choice)
}

/// Render options as a numbered list, one per line.
pub fn numbered(options: &[String]) -> String {
    options
        .iter()
        .enumerate()
        .map(|(i, option)| format!("{}) {}", i + 1, option))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_choice() {
        assert_eq!(parse_choice("2", 3), Some(2));
        assert_eq!(parse_choice(" 3\n", 3), Some(3));
        assert_eq!(parse_choice("0", 3), None);
        assert_eq!(parse_choice("4", 3), None);
        assert_eq!(parse_choice("two", 3), None);
        assert_eq!(parse_choice("-1", 3), None);
    }

    #[test]
    fn test_numbered() {
        let options = vec!["Fight".to_string(), "Flee".to_string()];
        assert_eq!(numbered(&options), "1) Fight\n2) Flee");
    }
}
