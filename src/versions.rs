//! Version tokens and version filtering
//!
//! Versions exchanged with Concourse carry the release's file fingerprint:
//! `<version>#<fingerprint>`, or the bare version when there is none.

use crate::core::error::ResourceResult;
use regex::Regex;
use semver::Version;

/// Encode a version and fingerprint into a version token
pub fn combine(version: &str, fingerprint: &str) -> String {
  if fingerprint.is_empty() {
    version.to_string()
  } else {
    format!("{}#{}", version, fingerprint)
  }
}

/// Split a version token into version and fingerprint (empty when absent)
pub fn split(token: &str) -> (String, String) {
  match token.split_once('#') {
    Some((version, fingerprint)) => (version.to_string(), fingerprint.to_string()),
    None => (token.to_string(), String::new()),
  }
}

/// Regex that must match a whole version
pub fn anchored(pattern: &str) -> ResourceResult<Regex> {
  Ok(Regex::new(&format!("^(?:{})$", pattern))?)
}

/// Parse a release version as semver, padding `1` and `1.2` to three components
pub fn parse_lenient(version: &str) -> Option<Version> {
  if let Ok(v) = Version::parse(version) {
    return Some(v);
  }
  let (core, rest) = match version.find(['-', '+']) {
    Some(i) => version.split_at(i),
    None => (version, ""),
  };
  let padded = match core.split('.').count() {
    1 => format!("{}.0.0{}", core, rest),
    2 => format!("{}.0{}", core, rest),
    _ => return None,
  };
  Version::parse(&padded).ok()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_combine_and_split() {
    assert_eq!(combine("1.2.3", "2024-01-02T03:04:05.000Z"), "1.2.3#2024-01-02T03:04:05.000Z");
    assert_eq!(combine("1.2.3", ""), "1.2.3");
    assert_eq!(split("1.2.3#abc"), ("1.2.3".to_string(), "abc".to_string()));
    assert_eq!(split("1.2.3"), ("1.2.3".to_string(), String::new()));
  }

  #[test]
  fn test_anchored_matches_whole_version() {
    let re = anchored("1\\.2\\..*").unwrap();
    assert!(re.is_match("1.2.0"));
    assert!(!re.is_match("11.2.0"));
    let re = anchored("1.0|2.0").unwrap();
    assert!(re.is_match("2.0"));
    assert!(!re.is_match("2.0.1"));
  }

  #[test]
  fn test_invalid_pattern_is_an_error() {
    assert!(anchored("(").is_err());
  }

  #[test]
  fn test_parse_lenient() {
    assert_eq!(parse_lenient("1.2.3"), Some(Version::new(1, 2, 3)));
    assert_eq!(parse_lenient("1.2"), Some(Version::new(1, 2, 0)));
    assert_eq!(parse_lenient("7"), Some(Version::new(7, 0, 0)));
    assert_eq!(parse_lenient("1.2-rc.1").map(|v| v.pre.to_string()), Some("rc.1".to_string()));
    assert_eq!(parse_lenient("not-a-version"), None);
  }
}
