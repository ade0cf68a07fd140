//! Streaming file digests, rendered as lowercase hex

use crate::core::error::{ResourceResult, ResultExt};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::Read;
use std::path::Path;

const CHUNK: usize = 64 * 1024;

pub fn md5_file(path: &Path) -> ResourceResult<String> {
  let mut context = md5::Context::new();
  for_each_chunk(path, |chunk| context.consume(chunk))?;
  Ok(format!("{:x}", context.compute()))
}

pub fn sha256_file(path: &Path) -> ResourceResult<String> {
  let mut hasher = Sha256::new();
  for_each_chunk(path, |chunk| hasher.update(chunk))?;
  Ok(format!("{:x}", hasher.finalize()))
}

fn for_each_chunk(path: &Path, mut f: impl FnMut(&[u8])) -> ResourceResult<()> {
  let mut file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
  let mut buf = vec![0u8; CHUNK];
  loop {
    let n = file.read(&mut buf).with_context(|| format!("reading {}", path.display()))?;
    if n == 0 {
      return Ok(());
    }
    f(&buf[..n]);
  }
}
