// SPDX-FileCopyrightText: 2026 Linecast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Canonical phone number handling.
//!
//! Every equality check on phone numbers (DNC lookups, bucket deduplication,
//! line numbers) goes through [`PhoneNumber`], which only ever holds the
//! canonical `(AAA) BBB-CCCC` rendering of ten digits.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::LinecastError;

const DIGITS: usize = 10;

/// A ten-digit phone number in canonical `(AAA) BBB-CCCC` form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PhoneNumber(String);

impl PhoneNumber {
    /// Normalize free-form input by keeping the last ten digits.
    ///
    /// Country prefixes and punctuation are discarded, so `+1 555.123.4567`
    /// and `5551234567` yield the same number. Returns `None` when fewer than
    /// ten digits are present.
    pub fn normalize(input: &str) -> Option<Self> {
        let digits = digits_of(input);
        if digits.len() < DIGITS {
            return None;
        }
        Some(Self(format_canonical(&digits[digits.len() - DIGITS..])))
    }

    /// Accept input only if stripping non-digits leaves exactly ten digits.
    ///
    /// This is the stricter rule applied to audience records.
    pub fn parse_exact(input: &str) -> Option<Self> {
        let digits = digits_of(input);
        if digits.len() != DIGITS {
            return None;
        }
        Some(Self(format_canonical(&digits)))
    }

    /// The canonical rendering.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The bare ten digits.
    pub fn digits(&self) -> String {
        digits_of(&self.0)
    }
}

fn digits_of(input: &str) -> String {
    input.chars().filter(char::is_ascii_digit).collect()
}

fn format_canonical(digits: &str) -> String {
    format!("({}) {}-{}", &digits[0..3], &digits[3..6], &digits[6..10])
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for PhoneNumber {
    type Err = LinecastError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::normalize(s).ok_or_else(|| LinecastError::InvalidPhoneNumber {
            input: s.to_string(),
        })
    }
}

impl TryFrom<String> for PhoneNumber {
    type Error = LinecastError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PhoneNumber> for String {
    fn from(number: PhoneNumber) -> Self {
        number.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn formats_plain_digits() {
        let n = PhoneNumber::normalize("5551234567").unwrap();
        assert_eq!(n.as_str(), "(555) 123-4567");
        assert_eq!(n.digits(), "5551234567");
    }

    #[test]
    fn keeps_last_ten_digits_of_longer_input() {
        let n = PhoneNumber::normalize("+1 (555) 123-4567").unwrap();
        assert_eq!(n.as_str(), "(555) 123-4567");
    }

    #[test]
    fn short_input_does_not_normalize() {
        assert!(PhoneNumber::normalize("555-1234").is_none());
        assert!(PhoneNumber::normalize("").is_none());
        assert!("123".parse::<PhoneNumber>().is_err());
    }

    #[test]
    fn parse_exact_rejects_country_prefix() {
        assert!(PhoneNumber::parse_exact("15551234567").is_none());
        assert_eq!(
            PhoneNumber::parse_exact("555.123.4567").unwrap().as_str(),
            "(555) 123-4567"
        );
    }

    #[test]
    fn serde_uses_canonical_string() {
        let n: PhoneNumber = serde_json::from_str("\"555-123-4567\"").unwrap();
        assert_eq!(serde_json::to_string(&n).unwrap(), "\"(555) 123-4567\"");
        assert!(serde_json::from_str::<PhoneNumber>("\"12\"").is_err());
    }

    proptest! {
        #[test]
        fn any_formatting_of_ten_digits_is_equivalent(digits in "[0-9]{10}") {
            let plain = PhoneNumber::normalize(&digits).unwrap();
            let dashed = format!("{}-{}-{}", &digits[0..3], &digits[3..6], &digits[6..]);
            let parens = format!("({}) {} {}", &digits[0..3], &digits[3..6], &digits[6..]);
            prop_assert_eq!(&plain, &PhoneNumber::normalize(&dashed).unwrap());
            prop_assert_eq!(&plain, &PhoneNumber::normalize(&parens).unwrap());
            prop_assert_eq!(&plain, &PhoneNumber::normalize(plain.as_str()).unwrap());
        }
    }
}
