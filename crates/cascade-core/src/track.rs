//! Distribution tracks and per-product track membership.
//!
//! A track is a named deployment ring. Updates enter the fleet on the
//! unstable track and advance toward stable; the ordering of tracks (and
//! which of them accept automatic promotion) is carried by
//! [`RolloutConfig`](crate::config::RolloutConfig), not hard-coded here.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A named deployment ring controlling which endpoints receive an update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Track {
    /// Entry track; every update starts here.
    Unstable,
    /// First promotion target.
    Testing,
    /// Most conservative ring, served to the bulk of the fleet.
    Stable,
}

impl Track {
    /// Returns the track as a lowercase path/key segment.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unstable => "unstable",
            Self::Testing => "testing",
            Self::Stable => "stable",
        }
    }
}

impl std::fmt::Display for Track {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Track {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unstable" => Ok(Self::Unstable),
            "testing" => Ok(Self::Testing),
            "stable" => Ok(Self::Stable),
            other => Err(crate::error::Error::InvalidInput(format!(
                "unknown track: {other}"
            ))),
        }
    }
}

/// The set of tracks a product is currently approved for.
///
/// Membership is monotonic within one promotion cycle: products are added
/// to tracks and only removed by manual curation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackSet(BTreeSet<Track>);

impl TrackSet {
    /// Creates an empty track set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns whether the product is approved for `track`.
    #[must_use]
    pub fn contains(&self, track: Track) -> bool {
        self.0.contains(&track)
    }

    /// Approves the product for `track`. Returns whether the set changed.
    pub fn insert(&mut self, track: Track) -> bool {
        self.0.insert(track)
    }

    /// Revokes approval for `track` (manual curation only).
    pub fn remove(&mut self, track: Track) -> bool {
        self.0.remove(&track)
    }

    /// Iterates over the approved tracks in promotion order.
    pub fn iter(&self) -> impl Iterator<Item = Track> + '_ {
        self.0.iter().copied()
    }

    /// Returns whether no track is approved.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<Track> for TrackSet {
    fn from_iter<I: IntoIterator<Item = Track>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn track_round_trips_through_str() {
        for track in [Track::Unstable, Track::Testing, Track::Stable] {
            let parsed: Track = track.as_str().parse().expect("parse");
            assert_eq!(parsed, track);
        }
    }

    #[test]
    fn unknown_track_is_rejected() {
        assert!("canary".parse::<Track>().is_err());
    }

    #[test]
    fn track_set_membership() {
        let mut set = TrackSet::new();
        assert!(set.is_empty());
        assert!(set.insert(Track::Unstable));
        assert!(!set.insert(Track::Unstable));
        assert!(set.contains(Track::Unstable));
        assert!(!set.contains(Track::Testing));
    }

    #[test]
    fn track_set_serializes_as_list() {
        let set: TrackSet = [Track::Unstable, Track::Testing].into_iter().collect();
        let json = serde_json::to_string(&set).expect("serialize");
        assert_eq!(json, r#"["unstable","testing"]"#);
    }
}
