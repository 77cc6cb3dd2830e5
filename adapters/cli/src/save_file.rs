#![allow(clippy::missing_errors_doc)]

use std::{error::Error, fmt};

use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine as _};
use revolution_core::{SkillNode, MAX_SPEED_LEVEL, RING_COUNT};
use revolution_world::Snapshot;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const SNAPSHOT_DOMAIN: &str = "revolution";
const SNAPSHOT_VERSION: &str = "v1";

/// Identifier prefix emitted before the encoded save payload.
pub(crate) const SNAPSHOT_HEADER: &str = "revolution:v1";
/// Delimiter used to separate the prefix, version and payload.
const FIELD_DELIMITER: char = ':';

/// Encodes a world snapshot into a single-line string suitable for a save
/// file or clipboard transfer.
#[must_use]
pub(crate) fn encode(snapshot: &Snapshot) -> String {
    let payload = StoredState::from_snapshot(snapshot);
    let json = serde_json::to_vec(&payload).expect("save snapshot serialization never fails");
    let encoded = STANDARD_NO_PAD.encode(json);
    format!("{SNAPSHOT_HEADER}:{encoded}")
}

/// Decodes a snapshot from the provided string representation.
///
/// Decoding is lenient about payload contents: absent fields fall back to
/// their defaults and unknown skill keys are ignored, so saves written by
/// older or newer builds still load. Structural problems (wrong prefix,
/// malformed base64 or JSON) are errors.
pub(crate) fn decode(value: &str) -> Result<Snapshot, SaveFileError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(SaveFileError::EmptyPayload);
    }

    let mut parts = trimmed.splitn(3, FIELD_DELIMITER);
    let domain = parts.next().ok_or(SaveFileError::MissingPrefix)?;
    let version = parts.next().ok_or(SaveFileError::MissingVersion)?;
    let payload = parts.next().ok_or(SaveFileError::MissingPayload)?;

    if domain != SNAPSHOT_DOMAIN {
        return Err(SaveFileError::InvalidPrefix(domain.to_owned()));
    }
    if version != SNAPSHOT_VERSION {
        return Err(SaveFileError::UnsupportedVersion(version.to_owned()));
    }

    let bytes = STANDARD_NO_PAD
        .decode(payload.as_bytes())
        .map_err(SaveFileError::InvalidEncoding)?;
    let decoded: StoredState =
        serde_json::from_slice(&bytes).map_err(SaveFileError::InvalidPayload)?;

    Ok(decoded.into_snapshot())
}

/// Serialised progression state. Every field is optional so partially
/// corrupted or out-of-date payloads degrade to defaults per field rather
/// than rejecting the whole save.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct StoredState {
    ring_values: Option<Vec<f64>>,
    speed_levels: Option<Vec<u8>>,
    purchase_counts: Option<Vec<u32>>,
    score: Option<f64>,
    prestige_points: Option<f64>,
    prestige_strength: Option<f64>,
    last_prestige_score: Option<f64>,
    promotion_level: Option<u32>,
    infinity_points: Option<u64>,
    has_reached_infinity: Option<bool>,
    auto_buy: Option<bool>,
    auto_promo: Option<bool>,
    skill_tree: Option<BTreeMap<String, u8>>,
}

impl StoredState {
    fn from_snapshot(snapshot: &Snapshot) -> Self {
        let skill_tree = SkillNode::ALL
            .into_iter()
            .filter(|node| snapshot.skills.level(*node) > 0)
            .map(|node| (node.key().to_owned(), snapshot.skills.level(node)))
            .collect::<BTreeMap<_, _>>();

        Self {
            ring_values: Some(snapshot.ring_values.iter().map(|value| finite_or_nan_free(*value)).collect()),
            speed_levels: Some(snapshot.speed_levels.to_vec()),
            purchase_counts: Some(snapshot.purchase_counts.to_vec()),
            score: Some(finite_or_nan_free(snapshot.score)),
            prestige_points: Some(finite_or_nan_free(snapshot.prestige_points)),
            prestige_strength: Some(finite_or_nan_free(snapshot.prestige_strength)),
            last_prestige_score: Some(finite_or_nan_free(snapshot.last_prestige_score)),
            promotion_level: Some(snapshot.promotion_level),
            infinity_points: Some(snapshot.infinity_points),
            has_reached_infinity: Some(snapshot.has_reached_infinity),
            auto_buy: Some(snapshot.auto_buy),
            auto_promo: Some(snapshot.auto_promo),
            skill_tree: Some(skill_tree),
        }
    }

    fn into_snapshot(self) -> Snapshot {
        let mut snapshot = Snapshot::default();

        copy_padded(&mut snapshot.ring_values, self.ring_values, 1.0);
        copy_padded(&mut snapshot.speed_levels, self.speed_levels, 0);
        copy_padded(&mut snapshot.purchase_counts, self.purchase_counts, 0);
        for level in snapshot.speed_levels.iter_mut() {
            *level = (*level).min(MAX_SPEED_LEVEL);
        }

        snapshot.score = self.score.unwrap_or(0.0);
        snapshot.prestige_points = self.prestige_points.unwrap_or(0.0);
        snapshot.prestige_strength = self.prestige_strength.unwrap_or(0.0);
        snapshot.last_prestige_score = self.last_prestige_score.unwrap_or(0.0);
        snapshot.promotion_level = self.promotion_level.unwrap_or(0);
        snapshot.infinity_points = self.infinity_points.unwrap_or(0);
        snapshot.has_reached_infinity = self.has_reached_infinity.unwrap_or(false);
        snapshot.auto_buy = self.auto_buy.unwrap_or(false);
        snapshot.auto_promo = self.auto_promo.unwrap_or(false);

        if let Some(skill_tree) = self.skill_tree {
            for (key, level) in &skill_tree {
                if let Some(node) = SkillNode::from_key(key) {
                    snapshot.skills.set_level(node, *level);
                }
            }
        }

        snapshot
    }
}

/// JSON has no encoding for NaN or the infinities; serde_json writes them
/// as null, which the lenient decoder would then reject field-wide. Store
/// the largest finite value instead so an overflowed score survives a
/// save/load cycle as something the Infinity check can still be reached
/// from.
fn finite_or_nan_free(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else if value == f64::INFINITY {
        f64::MAX
    } else if value == f64::NEG_INFINITY {
        0.0
    } else {
        value
    }
}

fn copy_padded<T: Copy>(target: &mut [T; RING_COUNT], source: Option<Vec<T>>, fallback: T) {
    let source = source.unwrap_or_default();
    for (index, slot) in target.iter_mut().enumerate() {
        *slot = source.get(index).copied().unwrap_or(fallback);
    }
}

/// Errors that can occur while decoding save strings.
#[derive(Debug)]
pub(crate) enum SaveFileError {
    /// The provided string was empty or contained only whitespace.
    EmptyPayload,
    /// The prefix segment was missing from the encoded save.
    MissingPrefix,
    /// The encoded save did not contain a version segment.
    MissingVersion,
    /// The encoded save did not include the payload segment.
    MissingPayload,
    /// The encoded save used an unexpected prefix segment.
    InvalidPrefix(String),
    /// The encoded save used an unsupported version identifier.
    UnsupportedVersion(String),
    /// The base64 payload could not be decoded.
    InvalidEncoding(base64::DecodeError),
    /// The decoded payload could not be deserialised.
    InvalidPayload(serde_json::Error),
}

impl fmt::Display for SaveFileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyPayload => write!(f, "save payload was empty"),
            Self::MissingPrefix => write!(f, "save string is missing the prefix"),
            Self::MissingVersion => write!(f, "save string is missing the version"),
            Self::MissingPayload => write!(f, "save string is missing the payload"),
            Self::InvalidPrefix(prefix) => write!(f, "save prefix '{prefix}' is not supported"),
            Self::UnsupportedVersion(version) => {
                write!(f, "save version '{version}' is not supported")
            }
            Self::InvalidEncoding(error) => {
                write!(f, "could not decode save payload: {error}")
            }
            Self::InvalidPayload(error) => {
                write!(f, "could not parse save payload: {error}")
            }
        }
    }
}

impl Error for SaveFileError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidEncoding(error) => Some(error),
            Self::InvalidPayload(error) => Some(error),
            _ => None,
        }
    }
}
