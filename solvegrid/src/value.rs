use crate::{Error, SERIAL_TAG, serial_tag};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::time::{SystemTime, UNIX_EPOCH};

/// The current time in milliseconds since the Unix epoch.
pub fn now_ms() -> u64 {
  SystemTime::now()
    .duration_since(UNIX_EPOCH)
    .map(|d| d.as_millis() as u64)
    .unwrap_or(1)
}

/// The content of one square: a single uppercased character, or empty.
/// Published squares hold the solution character; player squares hold
/// whatever the player typed, with `""` meaning erased.
#[derive(Debug, Eq, PartialEq, Hash, Clone, Default, Serialize, Deserialize)]
#[serde(try_from = "WirePositionValue", into = "WirePositionValue")]
pub struct PositionValue(String);

impl PositionValue {
  pub fn new(value: &str) -> Result<Self, Error> {
    if value.chars().count() > 1 {
      return Err(Error::ValueTooLong(value.to_string()));
    }
    Ok(Self(value.to_uppercase()))
  }

  pub fn empty() -> Self {
    Self(String::new())
  }

  pub fn from_char(c: char) -> Self {
    Self(c.to_ascii_uppercase().to_string())
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }
}

impl Display for PositionValue {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.0)
  }
}

#[derive(Serialize, Deserialize)]
struct WirePositionValue {
  #[serde(default = "serial_tag")]
  serialized: u8,
  value: String,
}

impl From<PositionValue> for WirePositionValue {
  fn from(value: PositionValue) -> Self {
    Self {
      serialized: SERIAL_TAG,
      value: value.0,
    }
  }
}

impl TryFrom<WirePositionValue> for PositionValue {
  type Error = Error;
  fn try_from(wire: WirePositionValue) -> Result<Self, Error> {
    if wire.serialized != SERIAL_TAG {
      return Err(Error::UnsupportedSerializedTag(wire.serialized));
    }
    Self::new(&wire.value)
  }
}

/// When a player value was written, in milliseconds since the Unix epoch.
/// The timestamp decides which device wins when progress is merged.
#[derive(Debug, Eq, PartialEq, Copy, Clone, Serialize, Deserialize)]
#[serde(try_from = "WirePositionValueMetadata", into = "WirePositionValueMetadata")]
pub struct PositionValueMetadata {
  time: u64,
}

impl PositionValueMetadata {
  pub fn new(time: u64) -> Result<Self, Error> {
    if time == 0 {
      return Err(Error::MissingTimestamp);
    }
    Ok(Self { time })
  }

  pub fn time(&self) -> u64 {
    self.time
  }
}

#[derive(Serialize, Deserialize)]
struct WirePositionValueMetadata {
  #[serde(default = "serial_tag")]
  serialized: u8,
  time: u64,
}

impl From<PositionValueMetadata> for WirePositionValueMetadata {
  fn from(metadata: PositionValueMetadata) -> Self {
    Self {
      serialized: SERIAL_TAG,
      time: metadata.time,
    }
  }
}

impl TryFrom<WirePositionValueMetadata> for PositionValueMetadata {
  type Error = Error;
  fn try_from(wire: WirePositionValueMetadata) -> Result<Self, Error> {
    if wire.serialized != SERIAL_TAG {
      return Err(Error::UnsupportedSerializedTag(wire.serialized));
    }
    Self::new(wire.time)
  }
}

/// The characters of one entry, first cell to last.
#[derive(Debug, Eq, PartialEq, Clone, Default, Serialize, Deserialize)]
#[serde(try_from = "WireEntryValue", into = "WireEntryValue")]
pub struct EntryValue(Vec<PositionValue>);

impl EntryValue {
  pub fn new(values: Vec<PositionValue>) -> Self {
    Self(values)
  }

  pub fn len(&self) -> usize {
    self.0.len()
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  pub fn values(&self) -> &[PositionValue] {
    &self.0
  }
}

impl Display for EntryValue {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    for value in &self.0 {
      write!(f, "{value}")?;
    }
    Ok(())
  }
}

#[derive(Serialize, Deserialize)]
struct WireEntryValue {
  #[serde(default = "serial_tag")]
  serialized: u8,
  value: Vec<PositionValue>,
}

impl From<EntryValue> for WireEntryValue {
  fn from(value: EntryValue) -> Self {
    Self {
      serialized: SERIAL_TAG,
      value: value.0,
    }
  }
}

impl TryFrom<WireEntryValue> for EntryValue {
  type Error = Error;
  fn try_from(wire: WireEntryValue) -> Result<Self, Error> {
    if wire.serialized != SERIAL_TAG {
      return Err(Error::UnsupportedSerializedTag(wire.serialized));
    }
    Ok(Self(wire.value))
  }
}

/// The clue text of one entry.
#[derive(Debug, Eq, PartialEq, Clone, Default, Serialize, Deserialize)]
#[serde(try_from = "WireEntryClue", into = "WireEntryClue")]
pub struct EntryClue(String);

impl EntryClue {
  pub fn new(clue: impl Into<String>) -> Self {
    Self(clue.into())
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl Display for EntryClue {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.0)
  }
}

#[derive(Serialize, Deserialize)]
struct WireEntryClue {
  #[serde(default = "serial_tag")]
  serialized: u8,
  value: String,
}

impl From<EntryClue> for WireEntryClue {
  fn from(clue: EntryClue) -> Self {
    Self {
      serialized: SERIAL_TAG,
      value: clue.0,
    }
  }
}

impl TryFrom<WireEntryClue> for EntryClue {
  type Error = Error;
  fn try_from(wire: WireEntryClue) -> Result<Self, Error> {
    if wire.serialized != SERIAL_TAG {
      return Err(Error::UnsupportedSerializedTag(wire.serialized));
    }
    Ok(Self(wire.value))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn position_values_are_uppercased_and_at_most_one_character() {
    assert_eq!(PositionValue::new("a").unwrap().as_str(), "A");
    assert_eq!(PositionValue::new("Z").unwrap().as_str(), "Z");
    assert_eq!(PositionValue::new("").unwrap(), PositionValue::empty());
    assert!(PositionValue::new("ab").is_err());
    assert_eq!(PositionValue::from_char('q').as_str(), "Q");
  }

  #[test]
  fn position_value_metadata_requires_a_positive_timestamp() {
    assert!(PositionValueMetadata::new(0).is_err());
    assert_eq!(PositionValueMetadata::new(17).unwrap().time(), 17);
  }

  #[test]
  fn wire_records_carry_the_version_tag() {
    let value = PositionValue::new("k").unwrap();
    let json = serde_json::to_string(&value).unwrap();
    assert_eq!(json, r#"{"serialized":1,"value":"K"}"#);
    assert_eq!(serde_json::from_str::<PositionValue>(&json).unwrap(), value);

    let metadata = PositionValueMetadata::new(42).unwrap();
    let json = serde_json::to_string(&metadata).unwrap();
    assert_eq!(json, r#"{"serialized":1,"time":42}"#);
    assert_eq!(
      serde_json::from_str::<PositionValueMetadata>(&json).unwrap(),
      metadata
    );

    assert!(serde_json::from_str::<PositionValue>(r#"{"serialized":2,"value":"K"}"#).is_err());
  }

  #[test]
  fn deserialization_applies_the_same_construction_checks() {
    assert!(serde_json::from_str::<PositionValue>(r#"{"serialized":1,"value":"AB"}"#).is_err());
    assert!(serde_json::from_str::<PositionValueMetadata>(r#"{"serialized":1,"time":0}"#).is_err());
  }

  #[test]
  fn entry_value_concatenates_for_display() {
    let value = EntryValue::new(vec![
      PositionValue::new("c").unwrap(),
      PositionValue::new("a").unwrap(),
      PositionValue::new("t").unwrap(),
    ]);
    assert_eq!(value.to_string(), "CAT");
    assert_eq!(value.len(), 3);
  }
}
