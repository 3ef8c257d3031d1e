use clap::{Args, Parser, Subcommand};
use std::{ffi::OsString, path::PathBuf};

/// Flags clap handles itself at the top level.
const BUILTIN_FLAGS: [&str; 4] = ["-h", "--help", "-V", "--version"];

#[derive(Parser)]
#[command(name = env!("CARGO_PKG_NAME"))]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = env!("CARGO_PKG_DESCRIPTION"))]
#[command(author = env!("CARGO_PKG_AUTHORS"))]
#[command(disable_help_subcommand = true)]
#[command(after_help = "With no command, lines are read from standard input until an empty line.\n\
                        Any other first argument logs all arguments as a one-line entry.")]
pub struct Cli {
    /// Directory holding the log file and its settings
    #[arg(long, value_name = "DIR")]
    pub config_dir: Option<PathBuf>,

    #[clap(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Log lines from standard input until an empty line
    #[command(name = "log")]
    LogFull {
        #[arg(hide = true, allow_hyphen_values = true, trailing_var_arg = true)]
        extra: Vec<String>,
    },
    /// Search entries by date (YYYYMMDDhhmm)
    #[command(alias = "t")]
    Date(SearchArgs),
    /// Search entries by the directory they were written in
    #[command(alias = "d")]
    Dir(SearchArgs),
    /// Search the text of entries
    #[command(alias = "b")]
    Body(SearchArgs),
    /// Print this message
    Help {
        #[arg(hide = true, allow_hyphen_values = true, trailing_var_arg = true)]
        extra: Vec<String>,
    },
    #[command(external_subcommand)]
    Oneliner(Vec<String>),
}

#[derive(Args, Clone, Debug, PartialEq, Eq)]
pub struct SearchArgs {
    /// Regular expression, matched case-insensitively
    #[arg(allow_hyphen_values = true)]
    pub pattern: Option<String>,

    #[arg(hide = true, allow_hyphen_values = true, trailing_var_arg = true)]
    pub extra: Vec<String>,
}

impl Cli {
    /// Parses `args` like clap, except that a first word which looks like an
    /// unknown flag (`-5 degrees outside`) starts a oneliner.
    pub fn parse_args<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        let args: Vec<OsString> = args.into_iter().map(Into::into).collect();
        let start = command_index(&args);

        match args.get(start).and_then(|arg| arg.to_str()) {
            Some(word) if word.starts_with('-') && !BUILTIN_FLAGS.contains(&word) => {
                let mut cli = Cli::try_parse_from(args[..start].iter().cloned())?;
                cli.command = Some(Command::Oneliner(
                    args[start..]
                        .iter()
                        .map(|arg| arg.to_string_lossy().into_owned())
                        .collect(),
                ));
                Ok(cli)
            }
            _ => Cli::try_parse_from(args),
        }
    }
}

/// Index of the first argument after the program name and `--config-dir`.
fn command_index(args: &[OsString]) -> usize {
    let mut index = 1;

    while let Some(arg) = args.get(index).and_then(|arg| arg.to_str()) {
        if arg == "--config-dir" {
            index += 2;
        } else if arg.starts_with("--config-dir=") {
            index += 1;
        } else {
            break;
        }
    }

    index
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Option<Command> {
        Cli::parse_args(std::iter::once("logcli").chain(args.iter().copied()))
            .unwrap()
            .command
    }

    fn strings(words: &[&str]) -> Vec<String> {
        words.iter().map(|s| s.to_string()).collect()
    }

    fn search_args(pattern: Option<&str>, extra: &[&str]) -> SearchArgs {
        SearchArgs {
            pattern: pattern.map(str::to_owned),
            extra: strings(extra),
        }
    }

    #[test]
    fn definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn no_arguments_is_full_log() {
        assert_eq!(parse(&[]), None);
        assert_eq!(parse(&["log"]), Some(Command::LogFull { extra: vec![] }));
    }

    #[test]
    fn words_after_log_are_collected() {
        assert_eq!(
            parse(&["log", "now", "please"]),
            Some(Command::LogFull {
                extra: strings(&["now", "please"])
            })
        );
    }

    #[test]
    fn search_commands_and_aliases() {
        let args = search_args(Some("2024"), &[]);
        assert_eq!(parse(&["date", "2024"]), Some(Command::Date(args.clone())));
        assert_eq!(parse(&["t", "2024"]), Some(Command::Date(args.clone())));
        assert_eq!(parse(&["d", "2024"]), Some(Command::Dir(args.clone())));
        assert_eq!(parse(&["dir", "2024"]), Some(Command::Dir(args.clone())));
        assert_eq!(parse(&["b", "2024"]), Some(Command::Body(args.clone())));
        assert_eq!(parse(&["body", "2024"]), Some(Command::Body(args)));
    }

    #[test]
    fn pattern_may_be_missing() {
        assert_eq!(parse(&["body"]), Some(Command::Body(search_args(None, &[]))));
    }

    #[test]
    fn extra_patterns_are_collected() {
        assert_eq!(
            parse(&["dir", "proj", "docs", "-x"]),
            Some(Command::Dir(search_args(Some("proj"), &["docs", "-x"])))
        );
    }

    #[test]
    fn pattern_may_start_with_hyphen() {
        assert_eq!(
            parse(&["body", "-rc1"]),
            Some(Command::Body(search_args(Some("-rc1"), &[])))
        );
    }

    #[test]
    fn anything_else_is_a_oneliner() {
        assert_eq!(
            parse(&["bought", "milk", "today"]),
            Some(Command::Oneliner(strings(&["bought", "milk", "today"])))
        );
        assert_eq!(
            parse(&["hello", "--world"]),
            Some(Command::Oneliner(strings(&["hello", "--world"])))
        );
    }

    #[test]
    fn oneliner_may_start_with_hyphen() {
        assert_eq!(
            parse(&["-5", "degrees", "outside"]),
            Some(Command::Oneliner(strings(&["-5", "degrees", "outside"])))
        );
        assert_eq!(
            parse(&["--fix", "the", "sink"]),
            Some(Command::Oneliner(strings(&["--fix", "the", "sink"])))
        );
    }

    #[test]
    fn oneliner_with_hyphen_keeps_config_dir() {
        let cli = Cli::parse_args(["logcli", "--config-dir", "/tmp/x", "-5", "degrees"]).unwrap();
        assert_eq!(cli.config_dir, Some(PathBuf::from("/tmp/x")));
        assert_eq!(cli.command, Some(Command::Oneliner(strings(&["-5", "degrees"]))));

        let cli = Cli::parse_args(["logcli", "--config-dir=/tmp/y", "-x"]).unwrap();
        assert_eq!(cli.config_dir, Some(PathBuf::from("/tmp/y")));
        assert_eq!(cli.command, Some(Command::Oneliner(strings(&["-x"]))));
    }

    #[test]
    fn config_dir_comes_before_command() {
        let cli = Cli::parse_args(["logcli", "--config-dir", "/tmp/x", "b", "bug"]).unwrap();
        assert_eq!(cli.config_dir, Some(PathBuf::from("/tmp/x")));
        assert_eq!(cli.command, Some(Command::Body(search_args(Some("bug"), &[]))));
    }

    #[test]
    fn help_ignores_trailing_words() {
        assert_eq!(parse(&["help"]), Some(Command::Help { extra: vec![] }));
        assert_eq!(
            parse(&["help", "me"]),
            Some(Command::Help {
                extra: strings(&["me"])
            })
        );
    }

    #[test]
    fn help_flag_is_still_clap_help() {
        let err = Cli::parse_args(["logcli", "--help"]).err().unwrap();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);

        let err = Cli::parse_args(["logcli", "-V"]).err().unwrap();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayVersion);
    }
}
