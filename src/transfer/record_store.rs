use crate::protocol::sector::SectorDataSet;

/// The records of one read sequence, by index. Positions that were announced but not (yet)
///  received hold default records.
#[derive(Debug, Default)]
pub struct RecordStore {
    records: Vec<SectorDataSet>,
    expected: usize,
    received: usize,
}
impl RecordStore {
    pub fn new() -> RecordStore {
        Default::default()
    }

    /// discards everything from a previous sequence
    pub fn clear(&mut self) {
        self.records.clear();
        self.expected = 0;
        self.received = 0;
    }

    /// pre-sizes the store once the peer announced how many records there are
    pub fn expect(&mut self, expected: usize) {
        self.expected = expected;
        if self.records.len() < expected {
            self.records.resize(expected, SectorDataSet::default());
        }
    }

    pub fn store(&mut self, index: usize, record: SectorDataSet) {
        if index >= self.records.len() {
            self.records.resize(index + 1, SectorDataSet::default());
        }
        self.records[index] = record;
        self.received += 1;
    }

    pub fn expected(&self) -> usize {
        self.expected
    }

    pub fn received(&self) -> usize {
        self.received
    }

    pub fn all(&self) -> &[SectorDataSet] {
        &self.records
    }

    pub fn get(&self, index: usize) -> Option<SectorDataSet> {
        self.records.get(index).copied()
    }
}
