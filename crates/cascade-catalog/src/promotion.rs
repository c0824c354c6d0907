//! Automatic track promotion scheduling.
//!
//! Computes the date a product becomes eligible to advance to a stricter
//! track. The cadence (grace days and weekday constraints) comes from
//! [`RolloutConfig`]; the canonical policy gives testing a four-day grace
//! that avoids weekends and stable a seven-day grace pinned to Wednesdays.
//! The asymmetry between the two rules is deliberate.

use chrono::{Datelike, Days, NaiveDate, Weekday};

use cascade_core::{Product, RolloutConfig, Track, WeekdayRule};

use crate::error::{CatalogError, Result};

/// Computes auto-promotion eligibility dates.
#[derive(Debug, Clone)]
pub struct PromotionScheduler {
    config: RolloutConfig,
}

impl PromotionScheduler {
    /// Creates a scheduler over the given rollout policy.
    #[must_use]
    pub fn new(config: RolloutConfig) -> Self {
        Self { config }
    }

    /// Returns the date `product` becomes eligible for promotion to
    /// `track`, or `None` if it never will.
    ///
    /// `None` is returned when the product carries a manual override or
    /// has not yet entered the entry track. The eligibility anchor is the
    /// date the product reached the track preceding `track`; when the
    /// product has not reached that track either, the anchor is computed
    /// recursively as that track's own eligibility date.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::InvalidTrack`] if `track` is not a
    /// configured auto-promotion target.
    pub fn next_promotion_date(
        &self,
        track: Track,
        product: &Product,
    ) -> Result<Option<NaiveDate>> {
        let rule = self
            .config
            .promotion_rule(track)
            .ok_or_else(|| CatalogError::InvalidTrack {
                track: track.to_string(),
            })?;

        if product.manual_override {
            return Ok(None);
        }
        if !product.tracks.contains(self.config.entry_track()) {
            return Ok(None);
        }

        let Some(previous_track_date) = self.previous_track_date(track, product)? else {
            return Ok(None);
        };

        let candidate = previous_track_date + Days::new(u64::from(rule.grace_days));
        Ok(Some(apply_weekday_rule(rule.weekday_rule, candidate)))
    }

    /// Date the product most recently reached the track preceding `track`.
    ///
    /// The product's mtime records its last track-set change, so it is the
    /// anchor whenever the product already sits on the predecessor (or the
    /// predecessor is the entry track). Otherwise the anchor is the
    /// predecessor's own projected promotion date.
    fn previous_track_date(&self, track: Track, product: &Product) -> Result<Option<NaiveDate>> {
        match self.config.predecessor(track) {
            Some(pred)
                if pred != self.config.entry_track() && !product.tracks.contains(pred) =>
            {
                self.next_promotion_date(pred, product)
            }
            _ => Ok(Some(product.mtime.date_naive())),
        }
    }
}

/// Applies a weekday constraint to a candidate promotion date.
fn apply_weekday_rule(rule: WeekdayRule, candidate: NaiveDate) -> NaiveDate {
    match rule {
        WeekdayRule::SkipWeekend => match candidate.weekday() {
            Weekday::Sat | Weekday::Sun => next_weekday_on_or_after(Weekday::Mon, candidate),
            _ => candidate,
        },
        WeekdayRule::PinTo(weekday) => next_weekday_on_or_after(weekday, candidate),
    }
}

/// Earliest date on or after `min_date` that falls on `weekday`.
///
/// Returns `min_date` unchanged when it already is that weekday.
fn next_weekday_on_or_after(weekday: Weekday, min_date: NaiveDate) -> NaiveDate {
    let offset =
        (7 + weekday.num_days_from_monday() - min_date.weekday().num_days_from_monday()) % 7;
    min_date + Days::new(u64::from(offset))
}
