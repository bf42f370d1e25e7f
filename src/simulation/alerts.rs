//! Bounded alert log, newest first.
//!
//! `total_alerts` counts onsets since start (or since the last clear) and is
//! not affected by tail trimming.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};

use crate::types::{AlertEvent, AnomalyKind, ZoneId};

#[derive(Debug, Clone)]
pub struct AlertLog {
    events: VecDeque<AlertEvent>,
    capacity: usize,
    next_seq: u64,
    total_alerts: u64,
}

impl AlertLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            events: VecDeque::with_capacity(capacity + 1),
            capacity,
            next_seq: 1,
            total_alerts: 0,
        }
    }

    /// Record a None → active transition and return its sequence number.
    pub fn on_anomaly_onset(
        &mut self,
        zone: ZoneId,
        zone_name: &str,
        kind: AnomalyKind,
        timestamp: DateTime<Utc>,
    ) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;

        self.events.push_front(AlertEvent {
            seq,
            timestamp,
            zone,
            kind,
            message: kind.alert_message(zone_name),
        });
        self.total_alerts += 1;
        self.events.truncate(self.capacity);
        seq
    }

    /// Empty the log and zero the counter. Sequence numbers keep counting.
    pub fn clear(&mut self) -> usize {
        let cleared = self.events.len();
        self.events.clear();
        self.total_alerts = 0;
        cleared
    }

    pub const fn total_alerts(&self) -> u64 {
        self.total_alerts
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Newest first.
    pub fn iter(&self) -> impl Iterator<Item = &AlertEvent> {
        self.events.iter()
    }

    pub fn to_vec(&self) -> Vec<AlertEvent> {
        self.events.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn onset(log: &mut AlertLog, zone: usize, kind: AnomalyKind) -> u64 {
        log.on_anomaly_onset(ZoneId::new(zone), "Zone X", kind, Utc::now())
    }

    #[test]
    fn test_newest_first_with_monotonic_seq() {
        let mut log = AlertLog::new(50);
        let a = onset(&mut log, 0, AnomalyKind::Leak);
        let b = onset(&mut log, 1, AnomalyKind::Burst);
        assert!(b > a);

        let events = log.to_vec();
        assert_eq!(events[0].seq, b);
        assert_eq!(events[0].kind, AnomalyKind::Burst);
        assert_eq!(events[0].message, "Pipe burst alert in Zone X!");
        assert_eq!(events[1].seq, a);
        assert_eq!(log.total_alerts(), 2);
    }

    #[test]
    fn test_trim_keeps_total() {
        let mut log = AlertLog::new(50);
        for i in 0..75 {
            onset(&mut log, i % 4, AnomalyKind::LowPressure);
        }
        assert_eq!(log.len(), 50);
        assert_eq!(log.total_alerts(), 75);
        // oldest surviving entry is onset #26
        assert_eq!(log.iter().last().map(|e| e.seq), Some(26));
        assert_eq!(log.iter().next().map(|e| e.seq), Some(75));
    }

    #[test]
    fn test_clear_resets_counter_not_sequence() {
        let mut log = AlertLog::new(50);
        onset(&mut log, 0, AnomalyKind::Leak);
        onset(&mut log, 1, AnomalyKind::Leak);

        assert_eq!(log.clear(), 2);
        assert!(log.is_empty());
        assert_eq!(log.total_alerts(), 0);

        let next = onset(&mut log, 2, AnomalyKind::Burst);
        assert_eq!(next, 3);
        assert_eq!(log.total_alerts(), 1);
    }

    #[test]
    fn test_clock_label_format() {
        let mut log = AlertLog::new(5);
        let ts = DateTime::parse_from_rfc3339("2024-03-01T14:05:09Z")
            .expect("timestamp")
            .with_timezone(&Utc);
        log.on_anomaly_onset(ZoneId::new(0), "Zone A", AnomalyKind::Leak, ts);
        assert_eq!(log.to_vec()[0].clock_label(), "14:05:09");
    }
}
