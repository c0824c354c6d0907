//! Rollout policy configuration.
//!
//! All policy values that vary per deployment live here: the supported
//! platform versions, the ordered track list, and the per-track automatic
//! promotion rules. Components take a [`RolloutConfig`] at construction
//! time; nothing in Cascade reads policy from module-level constants.

use chrono::Weekday;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::track::Track;

/// Weekday constraint applied to a computed promotion date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeekdayRule {
    /// Candidate dates falling on Saturday or Sunday advance to the
    /// following Monday; weekdays are used as-is.
    SkipWeekend,
    /// Candidate dates advance to the next occurrence of the given weekday
    /// on or after the candidate (the candidate itself if it already is
    /// that weekday).
    PinTo(Weekday),
}

/// Automatic promotion rule for one target track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromotionRule {
    /// Days an update must sit on the previous track before becoming
    /// eligible.
    pub grace_days: u32,
    /// Weekday constraint applied after the grace period.
    pub weekday_rule: WeekdayRule,
}

/// Deployment-wide rollout policy.
///
/// The default carries the canonical policy: three tracks in promotion
/// order, a four-day grace into testing avoiding weekends, and a seven-day
/// grace into stable pinned to Wednesdays. The testing/stable asymmetry is
/// a deliberate business rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RolloutConfig {
    /// Platform versions catalogs are generated for.
    pub platform_versions: Vec<String>,
    /// Tracks in promotion order; the first entry is the entry track.
    pub track_order: Vec<Track>,
    /// Per-track automatic promotion rules. Tracks absent from this map
    /// (notably the entry track) are never auto-promotion targets.
    pub promotion: BTreeMap<Track, PromotionRule>,
}

impl Default for RolloutConfig {
    fn default() -> Self {
        Self {
            platform_versions: vec!["10.5".into(), "10.6".into(), "10.7".into()],
            track_order: vec![Track::Unstable, Track::Testing, Track::Stable],
            promotion: BTreeMap::from([
                (
                    Track::Testing,
                    PromotionRule {
                        grace_days: 4,
                        weekday_rule: WeekdayRule::SkipWeekend,
                    },
                ),
                (
                    Track::Stable,
                    PromotionRule {
                        grace_days: 7,
                        weekday_rule: WeekdayRule::PinTo(Weekday::Wed),
                    },
                ),
            ]),
        }
    }
}

impl RolloutConfig {
    /// Returns the entry track (the first track in promotion order).
    #[must_use]
    pub fn entry_track(&self) -> Track {
        // An empty track order is a configuration defect; the canonical
        // default always has one.
        self.track_order.first().copied().unwrap_or(Track::Unstable)
    }

    /// Returns the track immediately preceding `track` in promotion order.
    #[must_use]
    pub fn predecessor(&self, track: Track) -> Option<Track> {
        let idx = self.track_order.iter().position(|t| *t == track)?;
        idx.checked_sub(1).map(|i| self.track_order[i])
    }

    /// Returns the promotion rule for `track`, if it is an auto-promotion
    /// target.
    #[must_use]
    pub fn promotion_rule(&self, track: Track) -> Option<PromotionRule> {
        self.promotion.get(&track).copied()
    }

    /// Returns every configured track in promotion order.
    #[must_use]
    pub fn tracks(&self) -> &[Track] {
        &self.track_order
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_policy_values() {
        let config = RolloutConfig::default();
        assert_eq!(config.entry_track(), Track::Unstable);
        assert_eq!(config.promotion_rule(Track::Testing).map(|r| r.grace_days), Some(4));
        assert_eq!(config.promotion_rule(Track::Stable).map(|r| r.grace_days), Some(7));
        assert_eq!(config.promotion_rule(Track::Unstable), None);
    }

    #[test]
    fn predecessor_walks_track_order() {
        let config = RolloutConfig::default();
        assert_eq!(config.predecessor(Track::Stable), Some(Track::Testing));
        assert_eq!(config.predecessor(Track::Testing), Some(Track::Unstable));
        assert_eq!(config.predecessor(Track::Unstable), None);
    }

    #[test]
    fn config_deserializes_from_json_override() {
        let json = r#"{
            "platform_versions": ["12.0"],
            "track_order": ["unstable", "stable"],
            "promotion": {
                "stable": {"grace_days": 10, "weekday_rule": {"pin_to": "Wed"}}
            }
        }"#;
        let config: RolloutConfig = serde_json::from_str(json).expect("deserialize");
        assert_eq!(config.platform_versions, vec!["12.0".to_string()]);
        assert_eq!(config.predecessor(Track::Stable), Some(Track::Unstable));
        assert_eq!(
            config.promotion_rule(Track::Stable).map(|r| r.grace_days),
            Some(10)
        );
    }
}
