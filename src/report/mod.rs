//! Per-app usage totals for the reports view.

pub mod chart;

use std::{collections::HashMap, sync::Arc};

use serde::Serialize;

use crate::storage::entities::UsageEvent;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppTotal {
    pub app_name: Arc<str>,
    /// Minutes.
    pub total_duration: u64,
}

/// Sums durations per app. Larger totals come first, equal totals keep the order in which the apps
/// first appear in the log.
pub fn aggregate(log: &[UsageEvent]) -> Vec<AppTotal> {
    let mut positions = HashMap::<Arc<str>, usize>::new();
    let mut totals = Vec::<AppTotal>::new();

    for event in log {
        let position = *positions.entry(event.app_name.clone()).or_insert_with(|| {
            totals.push(AppTotal {
                app_name: event.app_name.clone(),
                total_duration: 0,
            });
            totals.len() - 1
        });
        totals[position].total_duration += u64::from(event.duration);
    }

    // sort_by is stable, ties stay in first-appearance order
    totals.sort_by(|a, b| b.total_duration.cmp(&a.total_duration));
    totals
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::{aggregate, AppTotal};
    use crate::storage::entities::UsageEvent;

    fn log(entries: &[(&str, u32)]) -> Vec<UsageEvent> {
        let now = Utc::now();
        entries
            .iter()
            .map(|(app, duration)| UsageEvent::new(*app, *duration, now))
            .collect()
    }

    fn total(app: &str, total_duration: u64) -> AppTotal {
        AppTotal {
            app_name: app.into(),
            total_duration,
        }
    }

    #[test]
    fn sums_per_app_largest_first() {
        let events = log(&[("Social Media", 5), ("Games", 5), ("Social Media", 3)]);
        assert_eq!(
            aggregate(&events),
            vec![total("Social Media", 8), total("Games", 5)]
        );
    }

    #[test]
    fn ties_keep_first_appearance_order() {
        let events = log(&[("YouTube", 2), ("Browser", 4), ("TikTok", 4), ("YouTube", 1)]);
        assert_eq!(
            aggregate(&events),
            vec![total("Browser", 4), total("TikTok", 4), total("YouTube", 3)]
        );
    }

    #[test]
    fn totals_preserve_overall_duration() {
        let events = log(&[("A", 1), ("B", 2), ("C", 3), ("A", 4), ("B", 5)]);
        let totals = aggregate(&events);

        let source: u64 = events.iter().map(|v| u64::from(v.duration)).sum();
        let aggregated: u64 = totals.iter().map(|v| v.total_duration).sum();
        assert_eq!(source, aggregated);
        assert_eq!(totals.len(), 3);
    }

    #[test]
    fn empty_log_has_no_totals() {
        assert!(aggregate(&[]).is_empty());
    }
}
