//! Serde helpers that encode `chrono::Duration` as a whole number of seconds.

use chrono::Duration;
use serde::de::Error;
use serde::{Deserialize, Deserializer, Serializer};

pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_i64(duration.num_seconds())
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let secs = i64::deserialize(deserializer)?;
    from_secs(secs)
}

fn from_secs<E: Error>(secs: i64) -> Result<Duration, E> {
    Duration::try_seconds(secs)
        .ok_or_else(|| E::custom(format!("duration of {} seconds is out of range", secs)))
}

/// Same encoding for optional durations; `None` maps to a missing/null value.
pub mod option {
    use chrono::Duration;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match duration {
            Some(duration) => serializer.serialize_some(&duration.num_seconds()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<i64>::deserialize(deserializer)?
            .map(super::from_secs)
            .transpose()
    }
}
