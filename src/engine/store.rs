use chrono::Duration;
use std::collections::VecDeque;

use crate::constants::SNAPSHOT_MAX_AGE_SECS;
use crate::models::Snapshot;

/// Time-ordered snapshot history for one exchange.
///
/// Appends go to the back; eviction trims from the front only, keeping
/// every retained snapshot within `SNAPSHOT_MAX_AGE_SECS` of the newest.
/// Once the first poll lands the sequence is never empty again.
#[derive(Debug, Default)]
pub struct SnapshotHistory {
    snapshots: VecDeque<Snapshot>,
}

impl SnapshotHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a snapshot and evict everything older than the retention window
    pub fn append(&mut self, snapshot: Snapshot) {
        let cutoff = snapshot.ts - Duration::seconds(SNAPSHOT_MAX_AGE_SECS);
        self.snapshots.push_back(snapshot);

        while self
            .snapshots
            .front()
            .map_or(false, |oldest| oldest.ts < cutoff)
        {
            self.snapshots.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn oldest(&self) -> Option<&Snapshot> {
        self.snapshots.front()
    }

    pub fn newest(&self) -> Option<&Snapshot> {
        self.snapshots.back()
    }

    pub fn get(&self, index: usize) -> Option<&Snapshot> {
        self.snapshots.get(index)
    }

    /// Iterate oldest to newest
    pub fn iter(&self) -> impl Iterator<Item = &Snapshot> {
        self.snapshots.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TickerMap;
    use chrono::{TimeZone, Utc};

    fn snapshot_at(hours_ago: i64, now: chrono::DateTime<Utc>) -> Snapshot {
        Snapshot::new(now - Duration::hours(hours_ago), TickerMap::new())
    }

    #[test]
    fn test_eviction_trims_front_only() {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        let mut history = SnapshotHistory::new();

        for hours_ago in [30, 28, 26, 24, 12, 0] {
            history.append(snapshot_at(hours_ago, now));
        }

        // 30h/28h/26h snapshots fall outside the 25h window
        assert_eq!(history.len(), 3);
        assert_eq!(history.oldest().unwrap().ts, now - Duration::hours(24));
        assert_eq!(history.newest().unwrap().ts, now);
    }

    #[test]
    fn test_retained_spread_never_exceeds_max_age() {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        let mut history = SnapshotHistory::new();

        for minutes in (0..3000).step_by(10) {
            history.append(Snapshot::new(
                now + Duration::minutes(minutes),
                TickerMap::new(),
            ));
            let newest = history.newest().unwrap().ts;
            let oldest = history.oldest().unwrap().ts;
            assert!((newest - oldest).num_seconds() <= SNAPSHOT_MAX_AGE_SECS);
        }
        assert!(!history.is_empty());
    }
}
