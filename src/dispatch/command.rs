//! Command surface and argument validation

use crate::errors::{SimError, SimResult};
use crate::memory::Pid;
use std::fmt;

/// A single validated request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Allocate { size: u64 },
    Deallocate { pid: Pid },
    Compact,
    AddRelation { from: Pid, to: Pid },
    ShowGraph,
    Display,
    Stats,
    Logout,
}

impl Command {
    /// Build a command from its name and raw arguments.
    ///
    /// Numeric arguments are validated here so that a malformed size surfaces as
    /// [`SimError::InvalidSize`] and malformed relation endpoints as
    /// [`SimError::InvalidRelation`].
    pub fn parse<S: AsRef<str>>(name: &str, args: &[S]) -> SimResult<Command> {
        let args: Vec<&str> = args.iter().map(|a| a.as_ref().trim()).collect();

        let command = match name.trim() {
            "allocate" => {
                expect_args(name, &args, 1)?;
                Command::Allocate {
                    size: parse_size(args[0])?,
                }
            }
            "deallocate" => {
                expect_args(name, &args, 1)?;
                Command::Deallocate {
                    pid: args[0].parse().map_err(|_| {
                        SimError::InvalidCommand(format!("invalid pid '{}'", args[0]))
                    })?,
                }
            }
            "add_relation" | "add-relation" => {
                expect_args(name, &args, 2)?;
                match (parse_endpoint(args[0]), parse_endpoint(args[1])) {
                    (Some(from), Some(to)) => Command::AddRelation { from, to },
                    _ => {
                        return Err(SimError::invalid_relation(
                            args[0],
                            args[1],
                            "pids must be positive integers",
                        ))
                    }
                }
            }
            "compact" => no_args(name, &args, Command::Compact)?,
            "show_graph" | "show-graph" => no_args(name, &args, Command::ShowGraph)?,
            "display" => no_args(name, &args, Command::Display)?,
            "stats" => no_args(name, &args, Command::Stats)?,
            "logout" => no_args(name, &args, Command::Logout)?,
            other => {
                return Err(SimError::InvalidCommand(format!(
                    "unknown command '{}'",
                    other
                )))
            }
        };

        Ok(command)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Command::Allocate { .. } => "allocate",
            Command::Deallocate { .. } => "deallocate",
            Command::Compact => "compact",
            Command::AddRelation { .. } => "add_relation",
            Command::ShowGraph => "show_graph",
            Command::Display => "display",
            Command::Stats => "stats",
            Command::Logout => "logout",
        }
    }

    /// Whether a successful run must be persisted
    pub fn mutates(&self) -> bool {
        !matches!(self, Command::ShowGraph | Command::Display | Command::Stats)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Allocate { size } => write!(f, "allocate {}", size),
            Command::Deallocate { pid } => write!(f, "deallocate {}", pid),
            Command::AddRelation { from, to } => write!(f, "add_relation {} {}", from, to),
            other => f.write_str(other.name()),
        }
    }
}

fn expect_args(name: &str, args: &[&str], count: usize) -> SimResult<()> {
    if args.len() != count {
        return Err(SimError::InvalidCommand(format!(
            "'{}' expects {} argument{}, got {}",
            name,
            count,
            if count == 1 { "" } else { "s" },
            args.len()
        )));
    }
    Ok(())
}

fn no_args(name: &str, args: &[&str], command: Command) -> SimResult<Command> {
    expect_args(name, args, 0)?;
    Ok(command)
}

fn parse_size(raw: &str) -> SimResult<u64> {
    match raw.parse::<u64>() {
        Ok(size) if size > 0 => Ok(size),
        _ => Err(SimError::InvalidSize(raw.to_string())),
    }
}

fn parse_endpoint(raw: &str) -> Option<Pid> {
    raw.parse::<Pid>().ok().filter(|pid| *pid > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> SimResult<Command> {
        let mut words = line.split_whitespace();
        let name = words.next().unwrap_or("");
        let args: Vec<&str> = words.collect();
        Command::parse(name, &args)
    }

    #[test]
    fn test_parse_every_command() {
        assert_eq!(parse("allocate 30").unwrap(), Command::Allocate { size: 30 });
        assert_eq!(parse("deallocate 2").unwrap(), Command::Deallocate { pid: 2 });
        assert_eq!(parse("compact").unwrap(), Command::Compact);
        assert_eq!(
            parse("add_relation 3 5").unwrap(),
            Command::AddRelation { from: 3, to: 5 }
        );
        assert_eq!(parse("show_graph").unwrap(), Command::ShowGraph);
        assert_eq!(parse("display").unwrap(), Command::Display);
        assert_eq!(parse("stats").unwrap(), Command::Stats);
        assert_eq!(parse("logout").unwrap(), Command::Logout);
    }

    #[test]
    fn test_bad_sizes() {
        for line in ["allocate 0", "allocate -4", "allocate ten", "allocate 1.5"] {
            assert!(
                matches!(parse(line), Err(SimError::InvalidSize(_))),
                "{} should be an invalid size",
                line
            );
        }
    }

    #[test]
    fn test_bad_relation_endpoints() {
        for line in ["add_relation a 2", "add_relation 1 -2", "add_relation 0 1"] {
            assert!(matches!(
                parse(line),
                Err(SimError::InvalidRelation { .. })
            ));
        }
    }

    #[test]
    fn test_arity_and_unknown_commands() {
        assert!(matches!(parse("allocate"), Err(SimError::InvalidCommand(_))));
        assert!(matches!(parse("compact now"), Err(SimError::InvalidCommand(_))));
        assert!(matches!(parse("malloc 4"), Err(SimError::InvalidCommand(_))));
        assert!(matches!(parse("deallocate x"), Err(SimError::InvalidCommand(_))));
    }

    #[test]
    fn test_only_queries_are_read_only() {
        assert!(!Command::Display.mutates());
        assert!(!Command::ShowGraph.mutates());
        assert!(!Command::Stats.mutates());
        assert!(Command::Logout.mutates());
        assert!(Command::Compact.mutates());
    }

    #[test]
    fn test_display_round_trips_through_parse() {
        let command = Command::AddRelation { from: 4, to: 9 };
        assert_eq!(parse(&command.to_string()).unwrap(), command);
    }
}
