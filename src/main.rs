mod args;

use args::{Action, Args};
use shovel::config::{Config, IgnoreRule};
use shovel::context::Context;
use shovel::tpl::Tpl;
use shovel::{Archiver, Timestamp, naming, utils};
use std::fmt::Display;
use std::io;

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> shovel::Result<()> {
    // Parse command-line arguments
    let Args {
        verbose,
        config,
        timestamp,
        action,
    } = Args::parse();

    let timestamp = match (timestamp, &action) {
        (Some(seconds), _) => Timestamp::from_unix(seconds)?,
        // Reuse the archive's own stamp so the deploy pairs up with it
        (None, Action::Extract { archive, .. }) => archive
            .file_name()
            .and_then(|name| Timestamp::from_name(&name.to_string_lossy()))
            .unwrap_or_else(Timestamp::now),
        (None, _) => Timestamp::now(),
    };

    let config_path = utils::find_config(config.as_deref())?;
    let ctx = Context::new(config_path, verbose)?;
    let config = Config::load(&ctx, &Tpl::for_timestamp(timestamp))?;

    let mut archiver = Archiver::new(Some(timestamp)).with_verbose(ctx.verbose);

    match action {
        Action::Create {
            source,
            output,
            ignore,
            no_ignore,
            flush_every,
        } => {
            let rule = match (ignore, no_ignore) {
                (_, true) => IgnoreRule::Disabled,
                (Some(pattern), false) => IgnoreRule::Pattern(pattern),
                (None, false) => config.ignore.clone(),
            };
            // Compile before touching the filesystem
            let ignore = rule.build()?;

            let source = source
                .or(config.source.clone())
                .unwrap_or_else(|| ctx.base_dir.clone());
            let output = output.or(config.output_folder.clone());
            archiver = archiver.with_flush_every(flush_every.unwrap_or(config.flush_every));

            cliclack::intro("shovel")?;
            let progress = Progress::start(
                ctx.verbose,
                format!("Creating {}...", archiver.current_archive_name()),
            )?;

            match archiver.try_create(&source, output.as_deref(), ignore.as_ref()) {
                Ok(outcome) => progress.stop(format!(
                    "Created {} ({} files, {} ignored, {:.2}s)",
                    outcome.path.display(),
                    outcome.entries,
                    outcome.skipped,
                    outcome.elapsed.as_secs_f64()
                ))?,
                Err(e) => {
                    progress.error("Failed to create archive")?;
                    return Err(e);
                }
            }

            cliclack::outro("Archive ready")?;
        }
        Action::Extract {
            archive,
            destination,
        } => {
            let destination = destination.or(config.deploy_folder.clone());

            cliclack::intro("shovel")?;
            let progress = Progress::start(
                ctx.verbose,
                format!("Extracting into {}...", archiver.current_deploy_name()),
            )?;

            match archiver.try_extract(&archive, destination.as_deref()) {
                Ok(outcome) => progress.stop(format!(
                    "Extracted {} files into {} ({:.2}s)",
                    outcome.entries,
                    outcome.path.display(),
                    outcome.elapsed.as_secs_f64()
                ))?,
                Err(e) => {
                    progress.error("Failed to extract archive")?;
                    return Err(e);
                }
            }

            cliclack::outro("Deploy ready")?;
        }
        Action::List { archive } => {
            for name in archiver.list(&archive)? {
                println!("{}", name);
            }
        }
        Action::Names => {
            println!("{}", naming::archive_name(timestamp));
            println!("{}", naming::deploy_name(timestamp));
        }
    }

    Ok(())
}

/// Spinner for quiet runs; verbose runs print plain log lines so the
/// archiver's own output does not land inside the spinner
enum Progress {
    Spinner(cliclack::ProgressBar),
    Plain,
}

impl Progress {
    fn start(verbose: bool, msg: impl Display) -> io::Result<Self> {
        if verbose {
            cliclack::log::step(msg)?;
            Ok(Progress::Plain)
        } else {
            let spinner = cliclack::spinner();
            spinner.start(msg);
            Ok(Progress::Spinner(spinner))
        }
    }

    fn stop(self, msg: impl Display) -> io::Result<()> {
        match self {
            Progress::Spinner(spinner) => {
                spinner.stop(msg);
                Ok(())
            }
            Progress::Plain => cliclack::log::success(msg),
        }
    }

    fn error(self, msg: impl Display) -> io::Result<()> {
        match self {
            Progress::Spinner(spinner) => {
                spinner.error(msg);
                Ok(())
            }
            Progress::Plain => cliclack::log::error(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbose_progress_skips_spinner() {
        let progress = Progress::start(true, "Creating source.zip...").unwrap();
        assert!(matches!(progress, Progress::Plain));
        progress.stop("Created source.zip").unwrap();
    }
}
