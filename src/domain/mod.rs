//! Domain types for the lottery with strong typing.
//!
//! Newtype ids keep user and draw ids from being mixed up, and
//! [`DrawNumbers`] is the only way a set of picks reaches the cipher.

use rand::seq::index;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::config::LotteryConfig;

/// Unique identifier for a registered user.
///
/// # Examples
///
/// ```rust
/// use lottery::domain::UserId;
///
/// let id = UserId::new(42);
/// assert_eq!(id.value(), 42);
/// assert_eq!(id.to_string(), "42");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct UserId(i32);

impl UserId {
    #[must_use]
    pub const fn new(id: i32) -> Self {
        debug_assert!(id >= 0, "UserId should be non-negative");
        Self(id)
    }

    #[must_use]
    pub const fn value(&self) -> i32 {
        self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i32> for UserId {
    fn from(id: i32) -> Self {
        Self::new(id)
    }
}

impl From<UserId> for i32 {
    fn from(id: UserId) -> Self {
        id.0
    }
}

impl Serialize for UserId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_i32(self.0)
    }
}

impl<'de> Deserialize<'de> for UserId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        i32::deserialize(deserializer).map(Self)
    }
}

/// Unique identifier for a stored draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
#[serde(transparent)]
pub struct DrawId(i32);

impl DrawId {
    #[must_use]
    pub const fn new(id: i32) -> Self {
        Self(id)
    }

    #[must_use]
    pub const fn value(&self) -> i32 {
        self.0
    }
}

impl fmt::Display for DrawId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Account role, stored as a lower-case string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "admin" => Ok(Self::Admin),
            other => Err(DomainError::UnknownRole(other.to_string())),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("Unknown role: {0}")]
    UnknownRole(String),

    #[error("Expected {expected} numbers, got {actual}")]
    WrongCount { expected: usize, actual: usize },

    #[error("'{0}' is not a number")]
    NotANumber(String),

    #[error("{value} is outside the range {min}-{max}")]
    OutOfRange { value: u32, min: u8, max: u8 },

    #[error("{0} was picked more than once")]
    Duplicate(u8),

    #[error("Draw plaintext is malformed: {0}")]
    Malformed(String),
}

/// Shape of a valid draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawRules {
    pub numbers_per_draw: usize,
    pub min_number: u8,
    pub max_number: u8,
}

impl Default for DrawRules {
    fn default() -> Self {
        Self::from(&LotteryConfig::default())
    }
}

impl From<&LotteryConfig> for DrawRules {
    fn from(config: &LotteryConfig) -> Self {
        Self {
            numbers_per_draw: config.numbers_per_draw,
            min_number: config.min_number,
            max_number: config.max_number,
        }
    }
}

/// A validated set of picks, kept sorted ascending.
///
/// The [`Display`](fmt::Display) form (numbers joined by single spaces) is
/// the canonical plaintext that gets encrypted, so two draws with the same
/// picks always compare equal after decryption.
///
/// ```rust
/// use lottery::domain::{DrawNumbers, DrawRules};
///
/// let draw = DrawNumbers::parse("38, 3 17 11 59 24", &DrawRules::default()).unwrap();
/// assert_eq!(draw.to_string(), "3 11 17 24 38 59");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct DrawNumbers(Vec<u8>);

impl DrawNumbers {
    /// Parses user input separated by whitespace and/or commas.
    pub fn parse(input: &str, rules: &DrawRules) -> Result<Self, DomainError> {
        let tokens: Vec<&str> = input
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|t| !t.is_empty())
            .collect();

        if tokens.len() != rules.numbers_per_draw {
            return Err(DomainError::WrongCount {
                expected: rules.numbers_per_draw,
                actual: tokens.len(),
            });
        }

        let mut numbers = Vec::with_capacity(tokens.len());
        for token in tokens {
            let value: u32 = token
                .parse()
                .map_err(|_| DomainError::NotANumber(token.to_string()))?;

            let in_range = u32::from(rules.min_number)..=u32::from(rules.max_number);
            let number = u8::try_from(value)
                .ok()
                .filter(|_| in_range.contains(&value))
                .ok_or(DomainError::OutOfRange {
                    value,
                    min: rules.min_number,
                    max: rules.max_number,
                })?;

            numbers.push(number);
        }

        Self::from_numbers(numbers)
    }

    /// Parses a decrypted canonical plaintext without re-applying range rules.
    pub fn from_canonical(plaintext: &str) -> Result<Self, DomainError> {
        let numbers = plaintext
            .split(' ')
            .map(|t| {
                t.parse::<u8>()
                    .map_err(|_| DomainError::Malformed(plaintext.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Self::from_numbers(numbers)
    }

    /// Uniform sample of distinct numbers within the rules, sorted.
    #[must_use]
    pub fn random(rules: &DrawRules) -> Self {
        let span = usize::from(rules.max_number - rules.min_number) + 1;
        let mut rng = rand::rng();

        let mut numbers: Vec<u8> = index::sample(&mut rng, span, rules.numbers_per_draw)
            .into_iter()
            .filter_map(|offset| u8::try_from(offset).ok())
            .map(|offset| rules.min_number + offset)
            .collect();
        numbers.sort_unstable();

        Self(numbers)
    }

    fn from_numbers(mut numbers: Vec<u8>) -> Result<Self, DomainError> {
        numbers.sort_unstable();
        if let Some(pair) = numbers.windows(2).find(|pair| pair[0] == pair[1]) {
            return Err(DomainError::Duplicate(pair[0]));
        }
        Ok(Self(numbers))
    }

    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for DrawNumbers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for number in &self.0 {
            if !first {
                f.write_str(" ")?;
            }
            write!(f, "{number}")?;
            first = false;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules() -> DrawRules {
        DrawRules::default()
    }

    #[test]
    fn parse_sorts_and_formats_canonically() {
        let draw = DrawNumbers::parse("59 1, 30,2   7 44", &rules()).unwrap();
        assert_eq!(draw.as_slice(), &[1, 2, 7, 30, 44, 59]);
        assert_eq!(draw.to_string(), "1 2 7 30 44 59");
    }

    #[test]
    fn parse_rejects_wrong_count() {
        let err = DrawNumbers::parse("1 2 3 4 5", &rules()).unwrap_err();
        assert_eq!(
            err,
            DomainError::WrongCount {
                expected: 6,
                actual: 5
            }
        );
    }

    #[test]
    fn parse_rejects_out_of_range_and_garbage() {
        assert!(matches!(
            DrawNumbers::parse("0 2 3 4 5 6", &rules()),
            Err(DomainError::OutOfRange { value: 0, .. })
        ));
        assert!(matches!(
            DrawNumbers::parse("1 2 3 4 5 60", &rules()),
            Err(DomainError::OutOfRange { value: 60, .. })
        ));
        assert!(matches!(
            DrawNumbers::parse("1 2 3 4 5 1000", &rules()),
            Err(DomainError::OutOfRange { value: 1000, .. })
        ));
        assert!(matches!(
            DrawNumbers::parse("1 2 3 4 5 x", &rules()),
            Err(DomainError::NotANumber(_))
        ));
    }

    #[test]
    fn parse_rejects_duplicates() {
        assert_eq!(
            DrawNumbers::parse("5 1 2 3 4 5", &rules()).unwrap_err(),
            DomainError::Duplicate(5)
        );
    }

    #[test]
    fn random_draw_respects_rules() {
        let rules = rules();
        for _ in 0..200 {
            let draw = DrawNumbers::random(&rules);
            let numbers = draw.as_slice();
            assert_eq!(numbers.len(), 6);
            assert!(numbers.windows(2).all(|w| w[0] < w[1]));
            assert!(numbers.iter().all(|n| (1..=59).contains(n)));
        }
    }

    #[test]
    fn random_draw_can_cover_whole_range() {
        let rules = DrawRules {
            numbers_per_draw: 3,
            min_number: 10,
            max_number: 12,
        };
        assert_eq!(DrawNumbers::random(&rules).as_slice(), &[10, 11, 12]);
    }

    #[test]
    fn canonical_form_round_trips() {
        let draw = DrawNumbers::parse("8 4 15 16 23 42", &rules()).unwrap();
        let parsed = DrawNumbers::from_canonical(&draw.to_string()).unwrap();
        assert_eq!(draw, parsed);
        assert!(DrawNumbers::from_canonical("1  2").is_err());
    }

    #[test]
    fn role_parses_stored_strings() {
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!("user".parse::<Role>().unwrap(), Role::User);
        assert!("root".parse::<Role>().is_err());
        assert_eq!(Role::Admin.to_string(), "admin");
    }
}
