//! Team join codes.
//!
//! A code is six characters from an alphabet without the look-alikes `0/O`
//! and `1/I`. Codes are generated client-side; joining checks only the shape,
//! never whether anyone else is using the code.

use rand_core::{OsRng, RngCore};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

pub const CODE_LEN: usize = 6;

/// Characters used when generating a code.
pub const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TeamCode(String);

impl TeamCode {
  /// Generate a fresh code from the operating system's RNG.
  pub fn generate() -> Self { Self::generate_with(&mut OsRng) }

  pub fn generate_with(rng: &mut impl RngCore) -> Self {
    let code = (0..CODE_LEN)
      .map(|_| {
        let i = rng.next_u32() as usize % CODE_ALPHABET.len();
        CODE_ALPHABET[i] as char
      })
      .collect();
    Self(code)
  }

  /// Normalise user input: trim and uppercase, then require exactly six ASCII
  /// letters or digits.
  ///
  /// Codes typed by hand may contain characters the generator never emits;
  /// those are accepted so that any code a teammate shares still works.
  pub fn parse(input: &str) -> Result<Self> {
    let normalised = input.trim().to_ascii_uppercase();
    let valid = normalised.len() == CODE_LEN
      && normalised.bytes().all(|b| b.is_ascii_uppercase() || b.is_ascii_digit());
    if !valid {
      return Err(Error::InvalidTeamCode(input.to_string()));
    }
    Ok(Self(normalised))
  }

  pub fn as_str(&self) -> &str { &self.0 }
}

impl std::fmt::Display for TeamCode {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { f.write_str(&self.0) }
}

impl std::str::FromStr for TeamCode {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> { Self::parse(s) }
}

impl TryFrom<String> for TeamCode {
  type Error = Error;

  fn try_from(value: String) -> Result<Self> { Self::parse(&value) }
}

impl From<TeamCode> for String {
  fn from(code: TeamCode) -> Self { code.0 }
}

#[cfg(test)]
mod tests {
  use super::*;

  /// Deterministic RNG that walks through the alphabet.
  struct Counter(u32);

  impl RngCore for Counter {
    fn next_u32(&mut self) -> u32 {
      self.0 += 1;
      self.0
    }

    fn next_u64(&mut self) -> u64 { u64::from(self.next_u32()) }

    fn fill_bytes(&mut self, dest: &mut [u8]) { rand_core::impls::fill_bytes_via_next(self, dest) }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand_core::Error> {
      self.fill_bytes(dest);
      Ok(())
    }
  }

  #[test]
  fn lowercase_input_is_normalised() {
    assert_eq!(TeamCode::parse("ab12cd").unwrap(), TeamCode::parse("AB12CD").unwrap());
    assert_eq!(TeamCode::parse("  xk7p9q ").unwrap().as_str(), "XK7P9Q");
  }

  #[test]
  fn wrong_shape_is_rejected() {
    for bad in ["", "ABC12", "ABCDEFG", "AB-12C", "ÄB12CD"] {
      assert!(TeamCode::parse(bad).is_err(), "{bad:?} should be rejected");
    }
  }

  #[test]
  fn generated_codes_avoid_ambiguous_characters() {
    for _ in 0..200 {
      let code = TeamCode::generate();
      assert_eq!(code.as_str().len(), CODE_LEN);
      assert!(!code.as_str().contains(['0', 'O', '1', 'I']), "{code}");
      assert!(TeamCode::parse(code.as_str()).is_ok());
    }
  }

  #[test]
  fn generation_uses_supplied_rng() {
    let code = TeamCode::generate_with(&mut Counter(0));
    assert_eq!(code.as_str(), "BCDEFG");
  }

  #[test]
  fn serde_round_trips_through_string() {
    let code: TeamCode = serde_json::from_str("\"qwerty\"").unwrap();
    assert_eq!(code.as_str(), "QWERTY");
    assert!(serde_json::from_str::<TeamCode>("\"nope\"").is_err());
  }
}
