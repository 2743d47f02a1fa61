use clap::{Arg, ArgAction, ArgMatches, Command, value_parser};
use std::path::PathBuf;

/// Command-line arguments for the shovel tool
#[derive(Debug)]
pub struct Args {
    /// Enable verbose output
    pub verbose: bool,

    /// Path to Shovel.toml or directory containing it
    pub config: Option<PathBuf>,

    /// Unix timestamp used for archive and deploy names
    pub timestamp: Option<i64>,

    pub action: Action,
}

#[derive(Debug, PartialEq)]
pub enum Action {
    Create {
        source: Option<PathBuf>,
        output: Option<PathBuf>,
        ignore: Option<String>,
        no_ignore: bool,
        flush_every: Option<usize>,
    },
    Extract {
        archive: PathBuf,
        destination: Option<PathBuf>,
    },
    List {
        archive: PathBuf,
    },
    Names,
}

impl Args {
    /// Parse command-line arguments
    pub fn parse() -> Self {
        Self::from_matches(&Self::command().get_matches())
    }

    pub fn command() -> Command {
        Command::new("shovel")
            .version(env!("CARGO_PKG_VERSION"))
            .about("Package a source tree into a timestamped zip and extract it into a deploy directory")
            .subcommand_required(true)
            .arg_required_else_help(true)
            .arg(
                Arg::new("verbose")
                    .short('v')
                    .long("verbose")
                    .global(true)
                    .action(ArgAction::SetTrue)
                    .help("Enable verbose output")
            )
            .arg(
                Arg::new("config")
                    .short('c')
                    .long("config")
                    .global(true)
                    .value_name("FILE")
                    .env("SHOVEL_CONFIG")
                    .value_parser(value_parser!(PathBuf))
                    .help("Path to Shovel.toml or directory containing it")
            )
            .arg(
                Arg::new("timestamp")
                    .short('t')
                    .long("timestamp")
                    .global(true)
                    .value_name("SECONDS")
                    .value_parser(value_parser!(i64))
                    .help("Unix timestamp for archive and deploy names (default: now)")
            )
            .subcommand(
                Command::new("create")
                    .about("Zip a source directory into source_<stamp>.zip")
                    .arg(
                        Arg::new("source")
                            .value_name("SOURCE")
                            .value_parser(value_parser!(PathBuf))
                            .help("Directory to archive (default: current directory)")
                    )
                    .arg(
                        Arg::new("output")
                            .short('o')
                            .long("output")
                            .value_name("DIR")
                            .value_parser(value_parser!(PathBuf))
                            .help("Directory to write the archive into")
                    )
                    .arg(
                        Arg::new("ignore")
                            .short('i')
                            .long("ignore")
                            .value_name("REGEX")
                            .conflicts_with("no-ignore")
                            .help("Skip files whose full path matches this regex")
                    )
                    .arg(
                        Arg::new("no-ignore")
                            .long("no-ignore")
                            .action(ArgAction::SetTrue)
                            .help("Archive every file")
                    )
                    .arg(
                        Arg::new("flush-every")
                            .long("flush-every")
                            .value_name("N")
                            .value_parser(value_parser!(usize))
                            .help("Finish and reopen the archive every N files (0 disables)")
                    )
            )
            .subcommand(
                Command::new("extract")
                    .about("Extract an archive into deploy_<stamp>")
                    .arg(
                        Arg::new("archive")
                            .value_name("ARCHIVE")
                            .required(true)
                            .value_parser(value_parser!(PathBuf))
                    )
                    .arg(
                        Arg::new("destination")
                            .short('d')
                            .long("destination")
                            .value_name("DIR")
                            .value_parser(value_parser!(PathBuf))
                            .help("Directory to create the deploy directory in")
                    )
            )
            .subcommand(
                Command::new("list")
                    .about("List the entries of an archive")
                    .arg(
                        Arg::new("archive")
                            .value_name("ARCHIVE")
                            .required(true)
                            .value_parser(value_parser!(PathBuf))
                    )
            )
            .subcommand(Command::new("names").about("Print the archive and deploy names"))
    }

    pub fn from_matches(matches: &ArgMatches) -> Self {
        let action = match matches.subcommand() {
            Some(("create", sub)) => Action::Create {
                source: sub.get_one::<PathBuf>("source").cloned(),
                output: sub.get_one::<PathBuf>("output").cloned(),
                ignore: sub.get_one::<String>("ignore").cloned(),
                no_ignore: sub.get_flag("no-ignore"),
                flush_every: sub.get_one::<usize>("flush-every").copied(),
            },
            Some(("extract", sub)) => Action::Extract {
                archive: sub.get_one::<PathBuf>("archive").cloned().unwrap_or_default(),
                destination: sub.get_one::<PathBuf>("destination").cloned(),
            },
            Some(("list", sub)) => Action::List {
                archive: sub.get_one::<PathBuf>("archive").cloned().unwrap_or_default(),
            },
            _ => Action::Names,
        };

        Self {
            verbose: matches.get_flag("verbose"),
            config: matches.get_one::<PathBuf>("config").cloned(),
            timestamp: matches.get_one::<i64>("timestamp").copied(),
            action,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(argv: &[&str]) -> Args {
        let matches = Args::command().try_get_matches_from(argv).unwrap();
        Args::from_matches(&matches)
    }

    #[test]
    fn test_create_args() {
        let args = parse(&[
            "shovel", "-t", "1518044860", "create", "web", "-o", "builds", "-i", "vendor", "-v",
        ]);
        assert!(args.verbose);
        assert_eq!(args.timestamp, Some(1518044860));
        assert_eq!(
            args.action,
            Action::Create {
                source: Some(PathBuf::from("web")),
                output: Some(PathBuf::from("builds")),
                ignore: Some("vendor".into()),
                no_ignore: false,
                flush_every: None,
            }
        );
    }

    #[test]
    fn test_extract_args() {
        let args = parse(&["shovel", "extract", "source_2018.02.07.230740.zip", "-d", "/srv"]);
        assert_eq!(args.timestamp, None);
        assert_eq!(
            args.action,
            Action::Extract {
                archive: PathBuf::from("source_2018.02.07.230740.zip"),
                destination: Some(PathBuf::from("/srv")),
            }
        );
    }

    #[test]
    fn test_ignore_conflicts_with_no_ignore() {
        let result = Args::command().try_get_matches_from([
            "shovel", "create", "-i", "x", "--no-ignore",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_subcommand_required() {
        assert!(Args::command().try_get_matches_from(["shovel"]).is_err());
    }

    #[test]
    fn test_command_is_consistent() {
        Args::command().debug_assert();
    }
}
