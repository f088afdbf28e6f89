use rustc_hash::{FxBuildHasher, FxHashMap as HashMap};

/// Running min/max/sum/count for one key.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatEntry {
    pub min: f64,
    pub max: f64,
    pub sum: f64,
    pub count: u64,
}

impl Default for StatEntry {
    /// The empty seed. Never observable in a finished table: entries are only
    /// created right before their first `add`.
    fn default() -> Self {
        StatEntry {
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
            sum: 0.0,
            count: 0,
        }
    }
}

impl From<f64> for StatEntry {
    fn from(value: f64) -> Self {
        let mut e = StatEntry::default();
        e.add(value);
        e
    }
}

impl StatEntry {
    pub fn add(&mut self, v: f64) {
        self.min = self.min.min(v);
        self.max = self.max.max(v);
        self.sum += v;
        self.count += 1;
    }

    pub fn merge(&mut self, other: &Self) {
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
        self.sum += other.sum;
        self.count += other.count;
    }

    /// `sum / count`. If the running sum has overflowed, the mean saturates to
    /// the extreme on the side of the overflow.
    pub fn mean(&self) -> f64 {
        if self.sum.is_finite() {
            self.sum / self.count as f64
        } else if self.sum == f64::INFINITY {
            self.max
        } else if self.sum == f64::NEG_INFINITY {
            self.min
        } else {
            // both directions overflowed
            self.min / 2.0 + self.max / 2.0
        }
    }
}

/// Per-key statistics, unordered.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatsTable {
    entries: HashMap<Vec<u8>, StatEntry>,
}

impl StatsTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        StatsTable {
            entries: HashMap::with_capacity_and_hasher(capacity, FxBuildHasher),
        }
    }

    /// Looks the key up, inserting a seeded entry if it is absent, then folds
    /// `value` in. The key is only copied on first sight.
    pub fn record(&mut self, key: &[u8], value: f64) {
        if let Some(e) = self.entries.get_mut(key) {
            e.add(value);
        } else {
            self.entries.insert(Vec::from(key), StatEntry::from(value));
        }
    }

    /// Folds every entry of `other` into `self`. Keys only present in `other`
    /// are moved over as-is.
    pub fn merge(&mut self, mut other: StatsTable) {
        // iterate the smaller side
        if other.entries.len() > self.entries.len() {
            std::mem::swap(&mut self.entries, &mut other.entries);
        }
        for (k, e) in other.entries {
            self.entries
                .entry(k)
                .and_modify(|mine| mine.merge(&e))
                .or_insert(e);
        }
    }

    pub fn get(&self, key: &[u8]) -> Option<&StatEntry> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total number of records folded into the table.
    pub fn records(&self) -> u64 {
        self.entries.values().map(|e| e.count).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&[u8], &StatEntry)> {
        self.entries.iter().map(|(k, e)| (k.as_slice(), e))
    }

    /// Entries ordered by raw key bytes.
    pub fn sorted(&self) -> Vec<(&[u8], &StatEntry)> {
        let mut v: Vec<_> = self.iter().collect();
        v.sort_unstable_by(|a, b| a.0.cmp(b.0));
        v
    }
}

impl<'a> FromIterator<(&'a [u8], f64)> for StatsTable {
    fn from_iter<I: IntoIterator<Item = (&'a [u8], f64)>>(iter: I) -> Self {
        let mut table = StatsTable::new();
        table.extend(iter);
        table
    }
}

impl<'a> Extend<(&'a [u8], f64)> for StatsTable {
    fn extend<I: IntoIterator<Item = (&'a [u8], f64)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.record(k, v);
        }
    }
}
