//! Text command parsing for the interactive shell.
//!
//! One command per line, space delimited. Parse failures are soft errors:
//! the caller reports the message and reads the next line.

use crate::error::{Result, SlateError};

/// A parsed shell command.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Begin { txn_id: String },
    Set { txn_id: String, key: String, value: String },
    Get { key: String },
    Exists { key: String },
    Commit { txn_id: String },
    Abort { txn_id: String },
    Checkpoint,
    Exit,
}

impl Command {
    /// Parse one input line.
    pub fn parse(line: &str) -> Result<Command> {
        let mut fields = line.split_whitespace();
        let name = fields
            .next()
            .ok_or_else(|| SlateError::Command("invalid command".to_string()))?;

        let mut require = |what: &str| {
            fields
                .next()
                .map(str::to_string)
                .ok_or_else(|| SlateError::Command(format!("{} required", what)))
        };

        match name {
            "begin" => Ok(Command::Begin {
                txn_id: require("transaction id")?,
            }),
            "set" => Ok(Command::Set {
                txn_id: require("transaction id")?,
                key: require("key")?,
                value: require("value")?,
            }),
            "get" => Ok(Command::Get {
                key: require("key")?,
            }),
            "exist" | "exists" => Ok(Command::Exists {
                key: require("key")?,
            }),
            "commit" => Ok(Command::Commit {
                txn_id: require("transaction id")?,
            }),
            "abort" => Ok(Command::Abort {
                txn_id: require("transaction id")?,
            }),
            "checkpoint" => Ok(Command::Checkpoint),
            "exit" | "quit" => Ok(Command::Exit),
            _ => Err(SlateError::Command("invalid command".to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_command_set() {
        assert_eq!(
            Command::parse("begin t1").unwrap(),
            Command::Begin {
                txn_id: "t1".to_string()
            }
        );
        assert_eq!(
            Command::parse("set t1 a 5").unwrap(),
            Command::Set {
                txn_id: "t1".to_string(),
                key: "a".to_string(),
                value: "5".to_string()
            }
        );
        assert_eq!(
            Command::parse("get a").unwrap(),
            Command::Get {
                key: "a".to_string()
            }
        );
        assert_eq!(
            Command::parse("commit t1").unwrap(),
            Command::Commit {
                txn_id: "t1".to_string()
            }
        );
        assert_eq!(
            Command::parse("abort t1").unwrap(),
            Command::Abort {
                txn_id: "t1".to_string()
            }
        );
        assert_eq!(Command::parse("checkpoint").unwrap(), Command::Checkpoint);
        assert_eq!(Command::parse("exit").unwrap(), Command::Exit);
    }

    #[test]
    fn test_exist_and_exists_are_synonyms() {
        let expected = Command::Exists {
            key: "a".to_string(),
        };
        assert_eq!(Command::parse("exist a").unwrap(), expected);
        assert_eq!(Command::parse("exists a").unwrap(), expected);
    }

    #[test]
    fn test_quit_is_exit() {
        assert_eq!(Command::parse("quit").unwrap(), Command::Exit);
    }

    #[test]
    fn test_missing_arguments_name_the_missing_field() {
        assert_eq!(
            Command::parse("begin").unwrap_err().to_string(),
            "transaction id required"
        );
        assert_eq!(
            Command::parse("set t1").unwrap_err().to_string(),
            "key required"
        );
        assert_eq!(
            Command::parse("set t1 a").unwrap_err().to_string(),
            "value required"
        );
        assert_eq!(
            Command::parse("get").unwrap_err().to_string(),
            "key required"
        );
    }

    #[test]
    fn test_unknown_and_blank_input_are_invalid() {
        assert_eq!(
            Command::parse("frobnicate").unwrap_err().to_string(),
            "invalid command"
        );
        assert_eq!(Command::parse("").unwrap_err().to_string(), "invalid command");
        assert_eq!(
            Command::parse("   ").unwrap_err().to_string(),
            "invalid command"
        );
    }

    #[test]
    fn test_extra_fields_are_ignored() {
        assert_eq!(
            Command::parse("get a trailing junk").unwrap(),
            Command::Get {
                key: "a".to_string()
            }
        );
    }
}
