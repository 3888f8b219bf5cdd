use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ParseIdError;

/// Identifier of a list item.
///
/// Crosses the wire (DOM element ids, form params, JSON) as `i-<n>`, so the
/// string form is the canonical one and serde goes through it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemId(pub i64);

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "i-{}", self.0)
    }
}

impl FromStr for ItemId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s
            .strip_prefix("i-")
            .ok_or_else(|| ParseIdError::new(s, "missing 'i-' prefix"))?;
        let n = digits
            .parse()
            .map_err(|_| ParseIdError::new(s, "non-numeric id"))?;
        Ok(Self(n))
    }
}

impl Serialize for ItemId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ItemId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_with_prefix() {
        assert_eq!(ItemId(7).to_string(), "i-7");
    }

    #[test]
    fn parses_prefixed_ids() {
        assert_eq!("i-42".parse::<ItemId>().expect("parse"), ItemId(42));
    }

    #[test]
    fn rejects_unprefixed_and_junk_ids() {
        assert!("42".parse::<ItemId>().is_err());
        assert!("i-".parse::<ItemId>().is_err());
        assert!("i-banana".parse::<ItemId>().is_err());
        assert!("x-42".parse::<ItemId>().is_err());
    }

    #[test]
    fn serde_round_trips_through_string_form() {
        let json = serde_json::to_string(&ItemId(3)).expect("serialize");
        assert_eq!(json, "\"i-3\"");
        let back: ItemId = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, ItemId(3));
    }
}
