use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::detector::{DetectionOutcome, DetectionSnapshot};
use super::types::{
    Autonomy, DetectedPattern, DismissedPattern, PatternPreference, PatternPreferences,
    PatternType, Quotas, RateLimitState,
};
use crate::config::PatternConfig;
use crate::model::{Client, Task};

/// What the executor needs from the pattern side.
pub trait PatternAccess {
    fn active_patterns(&self) -> &[DetectedPattern];
    fn preferences(&self) -> &PatternPreferences;
    /// Remove an active pattern because its remedy was applied.
    fn accept_pattern(&mut self, id: &str) -> Option<DetectedPattern>;

    fn active_for(&self, pattern_type: PatternType, task_id: &str) -> Option<&DetectedPattern> {
        self.active_patterns().iter().find(|p| {
            p.pattern_type == pattern_type && p.primary_task_id().map(String::as_str) == Some(task_id)
        })
    }
}

/// Preferences, dismissals, quota counters and the visible pattern set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternStore {
    preferences: PatternPreferences,
    dismissed: Vec<DismissedPattern>,
    rate_limit: RateLimitState,
    quotas: Quotas,
    active: Vec<DetectedPattern>,
}

impl Default for PatternStore {
    fn default() -> Self {
        Self::new(&PatternConfig::default())
    }
}

impl PatternStore {
    pub fn new(config: &PatternConfig) -> Self {
        let mut preferences = PatternPreferences::default();
        preferences.postpone = PatternPreference {
            autonomy: config.postpone_autonomy,
            threshold: Some(config.postpone_threshold),
        };
        preferences.deadline_warning = PatternPreference {
            autonomy: config.deadline_autonomy,
            threshold: Some(config.deadline_threshold_days),
        };
        preferences.auto_client.autonomy = config.auto_client_autonomy;
        Self {
            preferences,
            dismissed: Vec::new(),
            rate_limit: RateLimitState::default(),
            quotas: Quotas {
                per_day: config.max_suggestions_per_day,
                per_week: config.max_suggestions_per_week,
            },
            active: Vec::new(),
        }
    }

    pub fn dismissed(&self) -> &[DismissedPattern] {
        &self.dismissed
    }

    pub fn rate_limit(&self) -> &RateLimitState {
        &self.rate_limit
    }

    pub fn quotas(&self) -> Quotas {
        self.quotas
    }

    pub fn set_preference(&mut self, pattern_type: PatternType, preference: PatternPreference) {
        *self.preferences.get_mut(pattern_type) = preference;
        info!(
            pattern_type = pattern_type.as_str(),
            autonomy = ?preference.autonomy,
            "pattern preference updated"
        );
    }

    /// Whether a new suggestion of `pattern_type` may be shown on `today`.
    pub fn can_show_pattern(&self, pattern_type: PatternType, today: NaiveDate) -> bool {
        self.preferences.get(pattern_type).autonomy != Autonomy::Off
            && self.rate_limit.allows(today, self.quotas)
    }

    pub fn record_shown(&mut self, today: NaiveDate) {
        self.rate_limit.record(today);
    }

    /// Snapshot for one detector run.
    pub fn detection_snapshot<'a>(
        &'a self,
        tasks: &'a [Task],
        clients: &'a [Client],
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> DetectionSnapshot<'a> {
        DetectionSnapshot {
            tasks,
            clients,
            preferences: self.preferences,
            dismissed: &self.dismissed,
            rate_limit: self.rate_limit,
            quotas: self.quotas,
            active_ids: self.active.iter().map(|p| p.id.clone()).collect(),
            today,
            now,
        }
    }

    /// Record quota use for newly shown patterns and swap in the new active
    /// set. Returns whether the visible set changed.
    pub fn apply_scan(&mut self, outcome: &DetectionOutcome, today: NaiveDate) -> bool {
        for _ in &outcome.newly_shown {
            self.record_shown(today);
        }
        let changed = self.replace_active(outcome.patterns.clone());
        if changed {
            info!(
                active = self.active.len(),
                newly_shown = outcome.newly_shown.len(),
                "active patterns replaced"
            );
        }
        changed
    }

    fn replace_active(&mut self, next: Vec<DetectedPattern>) -> bool {
        let changed = next.len() != self.active.len()
            || next.iter().zip(&self.active).any(|(a, b)| {
                a.pattern_type != b.pattern_type || a.primary_task_id() != b.primary_task_id()
            });
        self.active = next;
        changed
    }

    /// Remove a pattern and remember the dismissal. Unknown ids are ignored.
    ///
    /// A permanent dismissal silences the pattern type; otherwise only the
    /// pattern's task is silenced.
    pub fn dismiss_pattern(&mut self, id: &str, permanent: bool, now: DateTime<Utc>) -> bool {
        let Some(index) = self.active.iter().position(|p| p.id == id) else {
            debug!(id, "dismiss ignored, pattern not active");
            return false;
        };
        let pattern = self.active.remove(index);
        let task_id = if permanent {
            None
        } else {
            pattern.primary_task_id().cloned()
        };
        self.dismissed.push(DismissedPattern {
            pattern_type: pattern.pattern_type,
            task_id,
            dismissed_at: now,
            permanent,
        });
        info!(
            pattern_type = pattern.pattern_type.as_str(),
            permanent, "pattern dismissed"
        );
        true
    }
}

impl PatternAccess for PatternStore {
    fn active_patterns(&self) -> &[DetectedPattern] {
        &self.active
    }

    fn preferences(&self) -> &PatternPreferences {
        &self.preferences
    }

    fn accept_pattern(&mut self, id: &str) -> Option<DetectedPattern> {
        let index = self.active.iter().position(|p| p.id == id)?;
        let pattern = self.active.remove(index);
        info!(pattern_type = pattern.pattern_type.as_str(), "pattern accepted");
        Some(pattern)
    }
}
