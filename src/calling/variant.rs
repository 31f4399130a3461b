use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};

/// VCF-style filter column value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterStatus {
    Pass,
    Fail(String),
}

impl std::fmt::Display for FilterStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FilterStatus::Pass => write!(f, "PASS"),
            FilterStatus::Fail(id) => write!(f, "{}", id),
        }
    }
}

/// A called variant. Immutable after construction.
///
/// The `info` map is an open key-value bag; the keys `DP` (total depth)
/// and `AD` (alternate depth) are reserved and always present, inserted
/// by the constructor.
///
/// Identity (equality, hashing, ordering) is defined over chromosome,
/// position and alleles; quality and info do not participate.
#[derive(Debug, Clone)]
pub struct Variant {
    chromosome: String,
    position: i64,
    identifier: String,
    reference_allele: String,
    alternate_allele: String,
    quality: f64,
    filter_status: FilterStatus,
    info: BTreeMap<String, String>,
}

impl Variant {
    pub fn new(
        chromosome: impl Into<String>,
        position: i64,
        reference_allele: impl Into<String>,
        alternate_allele: impl Into<String>,
        quality: f64,
        depth: u32,
        alt_depth: u32,
    ) -> Variant {
        let mut info = BTreeMap::new();
        info.insert("DP".to_string(), depth.to_string());
        info.insert("AD".to_string(), alt_depth.to_string());
        Variant {
            chromosome: chromosome.into(),
            position,
            identifier: ".".to_string(),
            reference_allele: reference_allele.into(),
            alternate_allele: alternate_allele.into(),
            quality,
            filter_status: FilterStatus::Pass,
            info,
        }
    }

    pub fn chromosome(&self) -> &str {
        &self.chromosome
    }

    pub fn position(&self) -> i64 {
        self.position
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn reference_allele(&self) -> &str {
        &self.reference_allele
    }

    pub fn alternate_allele(&self) -> &str {
        &self.alternate_allele
    }

    pub fn quality(&self) -> f64 {
        self.quality
    }

    pub fn filter_status(&self) -> &FilterStatus {
        &self.filter_status
    }

    pub fn info(&self) -> &BTreeMap<String, String> {
        &self.info
    }

    pub fn depth(&self) -> u32 {
        self.info["DP"].parse().unwrap_or(0)
    }

    pub fn alt_depth(&self) -> u32 {
        self.info["AD"].parse().unwrap_or(0)
    }

    fn identity(&self) -> (&str, i64, &str, &str) {
        (
            &self.chromosome,
            self.position,
            &self.reference_allele,
            &self.alternate_allele,
        )
    }
}

impl PartialEq for Variant {
    fn eq(&self, other: &Self) -> bool {
        self.identity() == other.identity()
    }
}

impl Eq for Variant {}

impl Hash for Variant {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.identity().hash(state);
    }
}

impl PartialOrd for Variant {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Variant {
    fn cmp(&self, other: &Self) -> Ordering {
        self.identity().cmp(&other.identity())
    }
}

impl std::fmt::Display for Variant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{} {}>{}",
            self.chromosome, self.position, self.reference_allele, self.alternate_allele
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn info_carries_depths_after_construction() {
        let v = Variant::new("chr1", 100, "A", "G", 30.0, 20, 10);
        assert_eq!(v.info()["DP"], "20");
        assert_eq!(v.info()["AD"], "10");
        assert_eq!(v.depth(), 20);
        assert_eq!(v.alt_depth(), 10);
        assert_eq!(v.identifier(), ".");
        assert_eq!(*v.filter_status(), FilterStatus::Pass);
    }

    #[test]
    fn identity_ignores_quality_and_depths() {
        let a = Variant::new("chr1", 100, "A", "G", 30.0, 20, 10);
        let b = Variant::new("chr1", 100, "A", "G", 99.0, 50, 40);
        assert_eq!(a, b);
        let mut set = HashSet::new();
        set.insert(a);
        assert!(set.contains(&b));
    }

    #[test]
    fn ordering_is_chromosome_then_position() {
        let mut variants = vec![
            Variant::new("chr2", 50, "A", "G", 30.0, 20, 10),
            Variant::new("chr1", 200, "C", "T", 30.0, 20, 10),
            Variant::new("chr1", 100, "A", "G", 30.0, 20, 10),
        ];
        variants.sort();
        let order: Vec<(String, i64)> = variants
            .iter()
            .map(|v| (v.chromosome().to_string(), v.position()))
            .collect();
        assert_eq!(
            order,
            vec![
                ("chr1".to_string(), 100),
                ("chr1".to_string(), 200),
                ("chr2".to_string(), 50)
            ]
        );
    }
}
