use serde::{Deserialize, Serialize};

/// One unit of data fetched from upstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceRecord<R> {
    /// Monotonically increasing key used for paging and for the next cursor.
    pub sequence_key: i64,
    pub payload: R,
}

impl<R> SourceRecord<R> {
    pub fn new(sequence_key: i64, payload: R) -> Self {
        Self {
            sequence_key,
            payload,
        }
    }
}

/// An ordered, bounded page of records produced by one fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch<R> {
    records: Vec<SourceRecord<R>>,
}

impl<R> Batch<R> {
    pub fn new(records: Vec<SourceRecord<R>>) -> Self {
        Self { records }
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn records(&self) -> &[SourceRecord<R>] {
        &self.records
    }

    /// Maximum key over the whole batch.
    ///
    /// Not the last element: paged sources do not guarantee ordering.
    pub fn max_sequence_key(&self) -> Option<i64> {
        self.records.iter().map(|r| r.sequence_key).max()
    }

    /// Whether keys are strictly increasing in batch order.
    pub fn is_strictly_ascending(&self) -> bool {
        self.records
            .windows(2)
            .all(|pair| pair[0].sequence_key < pair[1].sequence_key)
    }
}

impl<R> From<Vec<SourceRecord<R>>> for Batch<R> {
    fn from(records: Vec<SourceRecord<R>>) -> Self {
        Self::new(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn batch(keys: &[i64]) -> Batch<()> {
        keys.iter().map(|k| SourceRecord::new(*k, ())).collect::<Vec<_>>().into()
    }

    #[test]
    fn test_max_over_whole_batch() {
        let b = batch(&[4, 9, 2]);
        assert_eq!(b.max_sequence_key(), Some(9));
        assert!(!b.is_strictly_ascending());
    }

    #[test]
    fn test_empty_batch() {
        let b: Batch<()> = Batch::new(Vec::new());
        assert!(b.is_empty());
        assert_eq!(b.max_sequence_key(), None);
        assert!(b.is_strictly_ascending());
    }

    #[test]
    fn test_duplicate_keys_are_not_ascending() {
        assert!(!batch(&[1, 1, 2]).is_strictly_ascending());
        assert!(batch(&[1, 2, 3]).is_strictly_ascending());
    }
}
