mod commands;
mod core;
mod files;
mod metadata;
mod pivnet;
mod release;
mod storage;
mod ui;
mod versions;

use clap::{Parser, Subcommand};
use core::error::{ResourceError, print_error};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Concourse resource for Pivotal Network releases
#[derive(Parser)]
#[command(name = "pivnet-resource")]
#[command(version, about, long_about = None)]
#[command(styles = get_styles())]
struct Cli {
  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Discover new release versions (request on stdin)
  Check,

  /// Download a release's product files and metadata
  In {
    /// Directory to write files into
    destination: PathBuf,
  },

  /// Publish a new release
  Out {
    /// Directory that file params are relative to
    sources: PathBuf,
  },
}

fn get_styles() -> clap::builder::Styles {
  clap::builder::Styles::styled()
    .usage(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
    )
    .header(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
    )
    .literal(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))))
    .invalid(
      anstyle::Style::new()
        .bold()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
    )
    .error(
      anstyle::Style::new()
        .bold()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
    )
    .valid(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))),
    )
    .placeholder(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::White))))
}

/// Concourse invokes `/opt/resource/{check,in,out}`; treat those names as the subcommand
fn normalize_args(args: Vec<OsString>) -> Vec<OsString> {
  let invoked_as = args
    .first()
    .and_then(|a| Path::new(a).file_name())
    .and_then(|n| n.to_str())
    .map(str::to_string);

  match invoked_as.as_deref() {
    Some(verb @ ("check" | "in" | "out")) => {
      let mut normalized = vec![OsString::from("pivnet-resource"), OsString::from(verb)];
      normalized.extend(args.into_iter().skip(1));
      normalized
    }
    _ => args,
  }
}

fn main() {
  let cli = Cli::parse_from(normalize_args(std::env::args_os().collect()));

  let stdin = std::io::stdin().lock();
  let stdout = std::io::stdout().lock();
  let result = match cli.command {
    Commands::Check => commands::check(stdin, stdout),
    Commands::In { destination } => commands::download(&destination, stdin, stdout),
    Commands::Out { sources } => commands::publish(&sources, stdin, stdout),
  };

  if let Err(err) = result {
    handle_error(err);
  }
}

fn handle_error(err: ResourceError) -> ! {
  print_error(&err);
  std::process::exit(err.exit_code().as_i32());
}

#[cfg(test)]
mod tests {
  use super::*;

  fn args(list: &[&str]) -> Vec<OsString> {
    list.iter().map(OsString::from).collect()
  }

  #[test]
  fn test_invoked_as_verb() {
    assert_eq!(
      normalize_args(args(&["/opt/resource/in", "/tmp/build/get"])),
      args(&["pivnet-resource", "in", "/tmp/build/get"])
    );
    assert_eq!(
      normalize_args(args(&["/opt/resource/check"])),
      args(&["pivnet-resource", "check"])
    );
  }

  #[test]
  fn test_invoked_by_binary_name() {
    let original = args(&["pivnet-resource", "out", "/tmp/build/put"]);
    assert_eq!(normalize_args(original.clone()), original);
  }

  #[test]
  fn test_cli_parses_subcommands() {
    let cli = Cli::parse_from(args(&["pivnet-resource", "out", "/tmp/src"]));
    assert!(matches!(cli.command, Commands::Out { sources } if sources == Path::new("/tmp/src")));
  }
}
