use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// Length of codes produced by [`RoomId::generate`].
pub const ROOM_CODE_LEN: usize = 6;

/// Longest code a user may type.
pub const ROOM_CODE_MAX_LEN: usize = 16;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RoomIdError {
    #[error("room code is empty")]
    Empty,

    #[error("room code is longer than {ROOM_CODE_MAX_LEN} characters")]
    TooLong,

    #[error("room code contains a non-alphanumeric character: {0:?}")]
    InvalidCharacter(char),
}

/// Short, case-insensitive room code meant for manual entry.
///
/// Construction always normalises (trim + ASCII upper case), so `"ab12cd"` and
/// `" AB12CD "` name the same room. Deserialisation normalises but does not
/// validate; the broker calls [`RoomId::validate`] before creating a room.
#[derive(Debug, Serialize, Deserialize, Clone, Hash, Eq, PartialEq, Ord, PartialOrd)]
#[serde(from = "String", into = "String")]
pub struct RoomId(String);

impl RoomId {
    /// Fresh random code of [`ROOM_CODE_LEN`] characters.
    pub fn generate() -> Self {
        let simple = Uuid::new_v4().simple().to_string();
        Self::from(&simple[..ROOM_CODE_LEN])
    }

    /// Normalise and validate user input.
    pub fn parse(raw: &str) -> Result<Self, RoomIdError> {
        let id = Self::from(raw);
        id.validate()?;
        Ok(id)
    }

    pub fn validate(&self) -> Result<(), RoomIdError> {
        if self.0.is_empty() {
            return Err(RoomIdError::Empty);
        }
        if self.0.chars().count() > ROOM_CODE_MAX_LEN {
            return Err(RoomIdError::TooLong);
        }
        if let Some(c) = self.0.chars().find(|c| !c.is_ascii_alphanumeric()) {
            return Err(RoomIdError::InvalidCharacter(c));
        }
        Ok(())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RoomId {
    fn from(raw: &str) -> Self {
        Self(raw.trim().to_ascii_uppercase())
    }
}

impl From<String> for RoomId {
    fn from(raw: String) -> Self {
        Self::from(raw.as_str())
    }
}

impl From<RoomId> for String {
    fn from(id: RoomId) -> Self {
        id.0
    }
}

impl FromStr for RoomId {
    type Err = RoomIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
