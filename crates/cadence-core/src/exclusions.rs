//! Per-series set of excluded anchors.
//!
//! The set is persisted on the series row as a small JSON document:
//!
//! ```json
//! {"version":1,"instants":[1704708000000]}
//! ```
//!
//! `instants` are epoch milliseconds in ascending order. Older rows may hold a
//! bare JSON array of RFC 3339 strings; both shapes decode. Anything else
//! decodes to an empty set so that a bad payload never breaks an occurrence
//! query.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::models::truncate_to_millis;

const PAYLOAD_VERSION: u32 = 1;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(into = "Vec<DateTime<Utc>>")]
pub struct ExclusionSet {
    instants: BTreeSet<i64>,
}

#[derive(Serialize)]
struct PayloadOut<'a> {
    version: u32,
    instants: &'a BTreeSet<i64>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PayloadIn {
    Versioned { version: u32, instants: Vec<i64> },
    Legacy(Vec<serde_json::Value>),
}

impl ExclusionSet {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn contains(&self, anchor: DateTime<Utc>) -> bool {
        self.instants
            .contains(&truncate_to_millis(anchor).timestamp_millis())
    }

    /// Adds an anchor. Returns `false` when it was already present.
    pub fn insert(&mut self, anchor: DateTime<Utc>) -> bool {
        self.instants
            .insert(truncate_to_millis(anchor).timestamp_millis())
    }

    pub fn len(&self) -> usize {
        self.instants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instants.is_empty()
    }

    /// Anchors in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = DateTime<Utc>> + '_ {
        self.instants
            .iter()
            .filter_map(|ms| DateTime::from_timestamp_millis(*ms))
    }

    /// Serializes to the versioned payload stored on the series row.
    pub fn encode(&self) -> String {
        let payload = PayloadOut {
            version: PAYLOAD_VERSION,
            instants: &self.instants,
        };
        // A map of integers cannot fail to serialize.
        serde_json::to_string(&payload).unwrap_or_else(|_| String::from("[]"))
    }

    /// Decodes a persisted payload, degrading to an empty set on anything
    /// malformed.
    pub fn decode(payload: Option<&str>) -> Self {
        let raw = match payload.map(str::trim) {
            None | Some("") => return Self::new(),
            Some(raw) => raw,
        };

        match serde_json::from_str::<PayloadIn>(raw) {
            Ok(PayloadIn::Versioned { version, instants }) if version == PAYLOAD_VERSION => Self {
                instants: instants.into_iter().collect(),
            },
            Ok(PayloadIn::Versioned { version, .. }) => {
                tracing::warn!(version, "unknown exclusion payload version, treating as empty");
                Self::new()
            }
            Ok(PayloadIn::Legacy(items)) => items
                .iter()
                .filter_map(|item| item.as_str())
                .filter_map(|item| DateTime::parse_from_rfc3339(item).ok())
                .map(|instant| instant.with_timezone(&Utc))
                .collect(),
            Err(e) => {
                tracing::warn!(error = %e, "malformed exclusion payload, treating as empty");
                Self::new()
            }
        }
    }
}

impl FromIterator<DateTime<Utc>> for ExclusionSet {
    fn from_iter<I: IntoIterator<Item = DateTime<Utc>>>(iter: I) -> Self {
        let mut set = Self::new();
        for anchor in iter {
            set.insert(anchor);
        }
        set
    }
}

impl From<ExclusionSet> for Vec<DateTime<Utc>> {
    fn from(set: ExclusionSet) -> Self {
        set.iter().collect()
    }
}
