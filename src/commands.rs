//! This module defines the `Command` enum and its associated methods for parsing
//! and handling user commands in the FAT32 navigator.
//!
//! The whole input line is upper-cased before parsing, as 8.3 short names are stored
//! upper-case on disk.

/// Represents a user command in the FAT32 navigator.
#[derive(Debug, PartialEq)]
pub enum Command {
    /// Command to quit the program.
    Quit,
    /// Command to print the volume information and layout.
    Info,
    /// Command to list the current directory.
    Dir,
    /// Command to change the current directory, encapsulating the target path.
    Cd(String),
    /// Command to extract a file of the current directory, encapsulating its name.
    Get(String),
    /// Command for an unknown input, encapsulating the raw input as a `String`.
    Unknown(String),
    /// Command for invalid input, encapsulating an error message as a `String`.
    Invalid(String),
    /// Command for an empty input.
    Empty,
}

impl Command {
    /// Parses a string into a `Command` instance.
    ///
    /// # Parameters
    /// - `s`: A string slice representing the user input.
    ///
    /// # Returns
    /// - `Command::Quit` if the input is "quit".
    /// - `Command::Info` if the input is "info".
    /// - `Command::Dir` if the input is "dir".
    /// - `Command::Cd` with the target if the input starts with "cd" followed by an argument.
    /// - `Command::Get` with the file name if the input starts with "get" followed by an argument.
    /// - `Command::Unknown` if the input does not match any known command.
    /// - `Command::Invalid` if "cd" or "get" is missing its argument.
    /// - `Command::Empty` if the input is empty or contains only whitespace.
    pub fn from_string(s: &str) -> Self {
        let s = s.to_ascii_uppercase();
        let mut parts = s.split_whitespace();
        match parts.next() {
            Some("QUIT") => Command::Quit,
            Some("INFO") => Command::Info,
            Some("DIR") => Command::Dir,
            Some("CD") => match parts.next() {
                Some(arg) => Command::Cd(arg.to_string()),
                None => Command::Invalid(String::from(
                    "Missing arg: 'cd' expects the name of a folder.",
                )),
            },
            Some("GET") => match parts.next() {
                Some(arg) => Command::Get(arg.to_string()),
                None => Command::Invalid(String::from(
                    "Missing arg: 'get' expects the name of a file.",
                )),
            },
            Some(other) => Command::Unknown(other.to_string()),
            None => Command::Empty,
        }
    }
}
