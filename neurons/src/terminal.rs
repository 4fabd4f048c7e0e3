//! Line-oriented terminal console.
//!
//! Narrative goes to stdout; prompts are styled with crossterm. Input is read
//! one line at a time and invalid choices are asked for again.

use crossterm::style::Stylize;
use neurons_core::console::{numbered, parse_choice, Console};
use std::io::{self, BufRead, Write};

pub struct TerminalConsole<R> {
    input: R,
}

impl TerminalConsole<io::StdinLock<'static>> {
    pub fn stdin() -> Self {
        Self::new(io::stdin().lock())
    }
}

impl<R: BufRead> TerminalConsole<R> {
    pub fn new(input: R) -> Self {
        Self { input }
    }

    /// Next input line without its line ending.
    ///
    /// The game is saved after every scene, so closing input simply ends the
    /// program.
    fn read_line(&mut self) -> String {
        let _ = io::stdout().flush();
        let mut line = String::new();
        match self.input.read_line(&mut line) {
            Ok(0) => {
                println!();
                println!("{}", "Farewell, adventurer.".italic());
                tracing::info!("input closed");
                std::process::exit(0);
            }
            Ok(_) => line.trim_end_matches(['\r', '\n']).to_string(),
            Err(e) => {
                tracing::error!(error = %e, "failed to read input");
                std::process::exit(1);
            }
        }
    }
}

impl<R: BufRead> Console for TerminalConsole<R> {
    fn show(&mut self, text: &str) {
        println!("{text}");
        println!();
    }

    fn choose(&mut self, prompt: &str, options: &[String]) -> usize {
        println!("{}", numbered(options));
        loop {
            print!("{} ", format!("{prompt}:").bold().yellow());
            let line = self.read_line();
            match parse_choice(&line, options.len()) {
                Some(choice) => {
                    println!();
                    return choice;
                }
                None => println!("{}", "Invalid choice. Try again.".red()),
            }
        }
    }

    fn ask(&mut self, prompt: &str) -> String {
        print!("{} ", format!("{prompt}:").bold().yellow());
        self.read_line()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_choose_reprompts_until_valid() {
        let mut console = TerminalConsole::new(Cursor::new("abc\n9\n2\n"));
        let options = vec!["Fight".to_string(), "Flee".to_string()];
        assert_eq!(console.choose("Your action", &options), 2);
    }

    #[test]
    fn test_ask_strips_line_ending() {
        let mut console = TerminalConsole::new(Cursor::new("Aria\r\n"));
        assert_eq!(console.ask("Name"), "Aria");
    }
}
