use std::sync::atomic::{AtomicU64, Ordering};

/// Counters collected over one normalisation run
#[derive(Debug, Default)]
pub struct PipelineStats {
    pub rows_loaded: AtomicU64,
    pub rows_malformed: AtomicU64,
    pub records_identified: AtomicU64,
    pub records_disambiguated: AtomicU64,
    pub families_resolved: AtomicU64,
    pub family_ties: AtomicU64,
    pub identifiers_renamed: AtomicU64,
    pub verses_canonicalized: AtomicU64,
    pub links_rewritten: AtomicU64,
    pub links_broken: AtomicU64,
    pub values_cleaned: AtomicU64,
    pub translation_fallbacks: AtomicU64,
    pub records_dropped: AtomicU64,
}

impl PipelineStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_rows(&self, count: u64) {
        self.rows_loaded.fetch_add(count, Ordering::Relaxed);
    }

    pub fn inc_malformed_rows(&self) {
        self.rows_malformed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_identified(&self, count: u64) {
        self.records_identified.fetch_add(count, Ordering::Relaxed);
    }

    pub fn inc_disambiguated(&self) {
        self.records_disambiguated.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_families(&self) {
        self.families_resolved.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_ties(&self) {
        self.family_ties.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_renamed(&self, count: u64) {
        self.identifiers_renamed.fetch_add(count, Ordering::Relaxed);
    }

    pub fn add_verses(&self, count: u64) {
        self.verses_canonicalized.fetch_add(count, Ordering::Relaxed);
    }

    pub fn inc_links(&self) {
        self.links_rewritten.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_broken_links(&self) {
        self.links_broken.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_cleaned(&self) {
        self.values_cleaned.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_translation_fallbacks(&self) {
        self.translation_fallbacks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_dropped(&self) {
        self.records_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn rows(&self) -> u64 {
        self.rows_loaded.load(Ordering::Relaxed)
    }

    pub fn malformed_rows(&self) -> u64 {
        self.rows_malformed.load(Ordering::Relaxed)
    }

    pub fn identified(&self) -> u64 {
        self.records_identified.load(Ordering::Relaxed)
    }

    pub fn disambiguated(&self) -> u64 {
        self.records_disambiguated.load(Ordering::Relaxed)
    }

    pub fn families(&self) -> u64 {
        self.families_resolved.load(Ordering::Relaxed)
    }

    pub fn ties(&self) -> u64 {
        self.family_ties.load(Ordering::Relaxed)
    }

    pub fn renamed(&self) -> u64 {
        self.identifiers_renamed.load(Ordering::Relaxed)
    }

    pub fn verses(&self) -> u64 {
        self.verses_canonicalized.load(Ordering::Relaxed)
    }

    pub fn links(&self) -> u64 {
        self.links_rewritten.load(Ordering::Relaxed)
    }

    pub fn broken_links(&self) -> u64 {
        self.links_broken.load(Ordering::Relaxed)
    }

    pub fn cleaned(&self) -> u64 {
        self.values_cleaned.load(Ordering::Relaxed)
    }

    pub fn translation_fallbacks(&self) -> u64 {
        self.translation_fallbacks.load(Ordering::Relaxed)
    }

    pub fn dropped(&self) -> u64 {
        self.records_dropped.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_values_are_zero() {
        let stats = PipelineStats::new();
        assert_eq!(stats.rows(), 0);
        assert_eq!(stats.identified(), 0);
        assert_eq!(stats.families(), 0);
        assert_eq!(stats.links(), 0);
        assert_eq!(stats.broken_links(), 0);
        assert_eq!(stats.translation_fallbacks(), 0);
    }

    #[test]
    fn increments_accumulate() {
        let stats = PipelineStats::new();
        stats.add_rows(10);
        stats.add_rows(5);
        stats.inc_broken_links();
        stats.inc_broken_links();
        stats.inc_links();
        stats.add_renamed(2);
        assert_eq!(stats.rows(), 15);
        assert_eq!(stats.broken_links(), 2);
        assert_eq!(stats.links(), 1);
        assert_eq!(stats.renamed(), 2);
    }
}
