use std::collections::VecDeque;

pub const MAX_RECENT: usize = 5;

/// One detection reported by the backend. Immutable once decoded.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionRecord {
    confidence: f64,
    timestamp_ms: i64,
    label: String,
}

impl DetectionRecord {
    pub(crate) fn new(confidence: f64, timestamp_ms: i64, label: String) -> Self {
        Self {
            confidence,
            timestamp_ms,
            label,
        }
    }

    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    pub fn timestamp_ms(&self) -> i64 {
        self.timestamp_ms
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

/// Newest-first ring of the most recent detections, in arrival order.
#[derive(Debug, Clone, Default)]
pub struct DetectionHistory {
    records: VecDeque<DetectionRecord>,
}

impl DetectionHistory {
    pub fn new() -> Self {
        Self {
            records: VecDeque::with_capacity(MAX_RECENT + 1),
        }
    }

    pub fn record(&mut self, detection: DetectionRecord) {
        self.records.push_front(detection);
        if self.records.len() > MAX_RECENT {
            self.records.pop_back();
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &DetectionRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detection(timestamp_ms: i64) -> DetectionRecord {
        DetectionRecord::new(0.9, timestamp_ms, "face".to_string())
    }

    #[test]
    fn starts_empty() {
        let history = DetectionHistory::new();
        assert!(history.is_empty());
        assert_eq!(history.len(), 0);
    }

    #[test]
    fn newest_detection_is_first() {
        let mut history = DetectionHistory::new();
        history.record(detection(1));
        history.record(detection(2));

        let order: Vec<i64> = history.iter().map(DetectionRecord::timestamp_ms).collect();
        assert_eq!(order, vec![2, 1]);
    }

    #[test]
    fn length_never_exceeds_capacity_and_evicts_oldest() {
        let mut history = DetectionHistory::new();

        for ts in 1..=12 {
            history.record(detection(ts));
            assert!(history.len() <= MAX_RECENT, "history grew past capacity");
        }

        let order: Vec<i64> = history.iter().map(DetectionRecord::timestamp_ms).collect();
        assert_eq!(order, vec![12, 11, 10, 9, 8]);
    }

    #[test]
    fn order_follows_arrival_not_timestamp() {
        let mut history = DetectionHistory::new();
        history.record(detection(500));
        history.record(detection(100));
        history.record(detection(300));

        let order: Vec<i64> = history.iter().map(DetectionRecord::timestamp_ms).collect();
        assert_eq!(order, vec![300, 100, 500]);
    }

    #[test]
    fn duplicates_are_kept() {
        let mut history = DetectionHistory::new();
        history.record(detection(7));
        history.record(detection(7));
        assert_eq!(history.len(), 2);
    }
}
