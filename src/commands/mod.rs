//! Resource commands
//!
//! Concourse runs each command with a JSON request on stdin and expects a JSON
//! response on stdout:
//!
//! - **check**: list versions newer than the one given
//! - **in** (`download`): fetch a release's files and metadata into a directory
//! - **out**: publish a release from the files in a directory
//!
//! The entry points here do the I/O and build the production clients; the
//! `run_*` functions in each module take their collaborators as arguments.

pub mod check;
pub mod download;
pub mod out;

pub use check::run_check;
pub use download::run_in;
pub use out::run_out;

use crate::core::config::{CheckRequest, InRequest, OutRequest, read_request};
use crate::core::error::{ResourceResult, ResultExt};
use crate::pivnet::http::HttpClient;
use crate::release::{ContentStore, SystemClock};
use crate::storage::s3::{S3Config, S3ContentStore};
use crate::ui::logging;
use serde::Serialize;
use std::io::{IsTerminal, Read, Write};
use std::path::Path;

/// `check`: stdin request, stdout version list
pub fn check<R: Read, W: Write>(input: R, output: W) -> ResourceResult<()> {
  let request: CheckRequest = read_request(input)?;
  logging::init(request.source.verbose);
  request.source.validate()?;

  let client = HttpClient::new(&request.source)?;
  let versions = run_check(&client, &request)?;
  respond(output, &versions)
}

/// `in <destination>`
pub fn download<R: Read, W: Write>(destination: &Path, input: R, output: W) -> ResourceResult<()> {
  let request: InRequest = read_request(input)?;
  logging::init(request.source.verbose);
  request.source.validate()?;

  let client = HttpClient::new(&request.source)?;
  let show_progress = std::io::stderr().is_terminal();
  let response = run_in(&client, &request, destination, show_progress)?;
  respond(output, &response)
}

/// `out <sources>`
pub fn publish<R: Read, W: Write>(sources: &Path, input: R, output: W) -> ResourceResult<()> {
  let request: OutRequest = read_request(input)?;
  logging::init(request.source.verbose);
  request.source.validate()?;
  request.params.validate()?;

  let client = HttpClient::new(&request.source)?;
  let store = if request.params.skip_upload() {
    None
  } else {
    Some(S3ContentStore::new(&S3Config::from_source(&request.source)?)?)
  };
  let response = run_out(
    &client,
    store.as_ref().map(|s| s as &dyn ContentStore),
    &SystemClock,
    &request,
    sources,
  )?;
  respond(output, &response)
}

fn respond<W: Write, T: Serialize>(mut output: W, value: &T) -> ResourceResult<()> {
  serde_json::to_writer(&mut output, value)?;
  writeln!(output).context("writing response")?;
  Ok(())
}
