use crate::utils::Result;

/// A closed genomic interval in 1-based reference coordinates.
#[derive(Debug, PartialEq, Eq, Clone, Hash)]
pub struct GenomicRegion {
    pub contig: String,
    pub start: i64,
    pub end: i64,
}

impl GenomicRegion {
    pub fn new(contig: impl Into<String>, start: i64, end: i64) -> Result<Self> {
        if start < 1 {
            return Err(format!("Invalid region: start {} < 1", start));
        }
        if start > end {
            return Err(format!("Invalid region: start {} > end {}", start, end));
        }

        Ok(Self {
            contig: contig.into(),
            start,
            end,
        })
    }

    pub fn point(contig: impl Into<String>, position: i64) -> Result<Self> {
        Self::new(contig, position, position)
    }

    pub fn from_string(encoding: &str) -> Result<Self> {
        let elements: Vec<&str> = encoding.split(&[':', '-']).collect();
        if elements.len() != 3 {
            return Err(format!(
                "Invalid region encoding '{}': expected 'chrom:start-end'",
                encoding
            ));
        }

        let start: i64 = elements[1].parse().map_err(|_| {
            format!(
                "Invalid region encoding '{}': start '{}' must be a positive integer",
                encoding, elements[1]
            )
        })?;

        let end: i64 = elements[2].parse().map_err(|_| {
            format!(
                "Invalid region encoding '{}': end '{}' must be a positive integer",
                encoding, elements[2]
            )
        })?;

        Self::new(elements[0], start, end)
    }

    pub fn len(&self) -> i64 {
        self.end - self.start + 1
    }

    pub fn intersect_position(&self, position: i64) -> bool {
        position >= self.start && position <= self.end
    }
}

impl std::fmt::Display for GenomicRegion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}-{}", self.contig, self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::GenomicRegion;

    #[test]
    fn init_region_from_valid_string_ok() {
        let region = GenomicRegion::from_string("chr1:100-200").unwrap();
        assert_eq!(region.contig, "chr1");
        assert_eq!(region.start, 100);
        assert_eq!(region.end, 200);
    }

    #[test]
    fn init_single_position_region_ok() {
        let region = GenomicRegion::point("chr2", 42).unwrap();
        assert_eq!(region.len(), 1);
        assert!(region.intersect_position(42));
        assert!(!region.intersect_position(43));
    }

    #[test]
    fn init_region_from_invalid_string_err() {
        assert_eq!(
            GenomicRegion::from_string("chr:1:100-200"),
            Err("Invalid region encoding 'chr:1:100-200': expected 'chrom:start-end'".to_string())
        );
    }

    #[test]
    fn init_region_from_invalid_interval_err() {
        assert_eq!(
            GenomicRegion::new("chr1", 200, 100),
            Err("Invalid region: start 200 > end 100".to_string())
        );
    }

    #[test]
    fn init_region_before_first_base_err() {
        assert!(GenomicRegion::new("chr1", 0, 10).is_err());
    }

    #[test]
    fn region_length_is_inclusive() {
        let region = GenomicRegion::new("chr1", 100, 200).unwrap();
        assert_eq!(region.len(), 101);
    }
}
