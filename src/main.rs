//! Command line front end for inspecting, merging and comparing keyboard
//! shortcut files.

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use synthetic_config::{SyntheticConfig, config_path};
use synthetic_shortcuts::{
    ExchangeFormat, ExchangeOptions, NO_SHORTCUT, ShortcutEntry, ShortcutRegistry,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "synthetic")]
#[command(about = "Inspect, merge and compare keyboard shortcut files")]
#[command(version)]
struct Cli {
    /// Configuration file (default: ./synthetic.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List every command and its shortcuts
    Show {
        file: PathBuf,
    },

    /// List shortcuts bound to more than one command
    Duplicates {
        file: PathBuf,
    },

    /// Find bindings shared between two files
    Compare {
        first: PathBuf,
        second: PathBuf,

        /// Write the duplicate bindings to this file
        #[arg(long)]
        duplicates: Option<PathBuf>,

        /// Write the conflicting bindings to this file
        #[arg(long)]
        conflicts: Option<PathBuf>,
    },

    /// Merge the bindings of `other` into `base`
    Merge {
        base: PathBuf,
        other: PathBuf,

        /// Output file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Drop commands without any shortcut
    Purge {
        file: PathBuf,

        /// Output file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Bind a shortcut to a command
    Bind {
        file: PathBuf,
        command: String,
        shortcut: String,

        /// Output file (default: overwrite the input)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Remove a shortcut from a command
    Unbind {
        file: PathBuf,
        command: String,
        shortcut: String,

        /// Output file (default: overwrite the input)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Rewrite a shortcut file, converting between XML and JSON by extension
    Convert {
        input: PathBuf,
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;
    init_logging(&config)?;

    let options = config.exchange_options();
    match cli.command {
        Commands::Show { file } => {
            let registry = load(&file, &options)?;
            for entry in registry.entries() {
                println!(
                    "{}\t{}\t{}",
                    entry.command_name,
                    entry
                        .shortcut_string_with(options.separator)
                        .as_deref()
                        .unwrap_or(NO_SHORTCUT),
                    entry.paths
                );
            }
        }
        Commands::Duplicates { file } => {
            let registry = load(&file, &options)?;
            let duplicates = registry.duplicate_shortcuts();
            if duplicates.is_empty() {
                println!("No shortcut is bound to more than one command");
            }
            for (shortcut, entries) in duplicates {
                let commands: Vec<&str> = entries
                    .iter()
                    .map(|entry| entry.command_name.as_str())
                    .collect();
                println!("{}: {}", shortcut, commands.join(", "));
            }
        }
        Commands::Compare {
            first,
            second,
            duplicates,
            conflicts,
        } => {
            let first = load(&first, &options)?;
            let second = load(&second, &options)?;
            let comparison = first.compare(&second);

            println!("Duplicates ({}):", comparison.duplicates.len());
            print_entries(&comparison.duplicates, &options);
            println!("Conflicts ({}):", comparison.conflicts.len());
            print_entries(&comparison.conflicts, &options);

            if let Some(path) = duplicates {
                save(&comparison.duplicates, &path, &options)?;
            }
            if let Some(path) = conflicts {
                save(&comparison.conflicts, &path, &options)?;
            }
        }
        Commands::Merge {
            base,
            other,
            output,
        } => {
            let mut registry = load(&base, &options)?;
            let other = load(&other, &options)?;
            let results = registry.merge_from(&other);
            let changed = results.iter().filter(|added| **added).count();
            println!("Applied {} of {} bindings", changed, results.len());
            save(&registry, &output, &options)?;
        }
        Commands::Purge { file, output } => {
            let registry = load(&file, &options)?;
            let purged = registry.remove_empty_shortcuts();
            println!(
                "Removed {} commands without shortcuts",
                registry.len() - purged.len()
            );
            save(&purged, &output, &options)?;
        }
        Commands::Bind {
            file,
            command,
            shortcut,
            output,
        } => {
            let mut registry = load(&file, &options)?;
            if !bind_shortcut(&mut registry, &command, &shortcut, options.separator)? {
                println!("{} is already bound to {}", command, shortcut);
                return Ok(());
            }
            save(&registry, output_path(output.as_deref(), &file), &options)?;
            println!("Bound {} to {}", shortcut, command);
        }
        Commands::Unbind {
            file,
            command,
            shortcut,
            output,
        } => {
            let mut registry = load(&file, &options)?;
            if !unbind_shortcut(&mut registry, &command, &shortcut, options.separator)? {
                println!("{} is not bound to {}", command, shortcut);
                return Ok(());
            }
            save(&registry, output_path(output.as_deref(), &file), &options)?;
            println!("Removed {} from {}", shortcut, command);
        }
        Commands::Convert { input, output } => {
            let registry = load(&input, &options)?;
            save(&registry, &output, &options)?;
            println!(
                "Wrote {} entries as {:?}",
                registry.len(),
                ExchangeFormat::from_path(&output)
            );
        }
    }

    Ok(())
}

/// Bind `shortcut` to `command`, adding the command when it is missing.
///
/// Returns `false` when the binding already existed.
fn bind_shortcut(
    registry: &mut ShortcutRegistry,
    command: &str,
    shortcut: &str,
    separator: char,
) -> Result<bool> {
    let mut entry = ShortcutEntry::empty(command);
    if !entry.add_shortcut_with(shortcut, separator) {
        bail!("'{}' is not a usable shortcut", shortcut);
    }
    Ok(!registry.add_shortcuts([entry]).contains(&false))
}

/// Returns `false` when `command` does not carry `shortcut`.
fn unbind_shortcut(
    registry: &mut ShortcutRegistry,
    command: &str,
    shortcut: &str,
    separator: char,
) -> Result<bool> {
    if !registry.contains_command(command) {
        bail!("Unknown command '{}'", command);
    }
    let mut entry = ShortcutEntry::empty(command);
    entry.add_shortcut_with(shortcut, separator);
    Ok(registry.remove_shortcuts(&[entry]).contains(&true))
}

fn output_path<'a>(output: Option<&'a Path>, input: &'a Path) -> &'a Path {
    output.unwrap_or(input)
}

fn load_config(path: Option<&Path>) -> Result<SyntheticConfig> {
    match path {
        Some(path) => SyntheticConfig::load(path)
            .with_context(|| format!("Failed to load configuration {}", path.display())),
        None => SyntheticConfig::load_or_default(config_path("."))
            .context("Failed to load configuration"),
    }
}

fn init_logging(config: &SyntheticConfig) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(config.log_filter.as_deref().unwrap_or("warn"))
            .context("Invalid log filter in configuration")?,
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

fn load(path: &Path, options: &ExchangeOptions) -> Result<ShortcutRegistry> {
    let registry = ShortcutRegistry::load_from_file(path, options)
        .with_context(|| format!("Failed to read shortcuts from {}", path.display()))?;
    info!(path = %path.display(), entries = registry.len(), "loaded shortcuts");
    Ok(registry)
}

fn save(registry: &ShortcutRegistry, path: &Path, options: &ExchangeOptions) -> Result<()> {
    registry
        .save_to_file(path, options)
        .with_context(|| format!("Failed to write shortcuts to {}", path.display()))?;
    info!(path = %path.display(), entries = registry.len(), "wrote shortcuts");
    Ok(())
}

fn print_entries(registry: &ShortcutRegistry, options: &ExchangeOptions) {
    for entry in registry.entries() {
        println!(
            "  {}\t{}",
            entry.command_name,
            entry
                .shortcut_string_with(options.separator)
                .unwrap_or_default()
        );
    }
}
