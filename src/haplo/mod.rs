mod discover;
mod haplotype;
mod linkage;
mod simulate;

pub use discover::{discover, passes_gate, DiscoveryParams, HaplotypeEvidence};
pub use haplotype::{Call, Haplotype, OccurrenceTable};
pub use linkage::{linkage, LinkageResult};
pub use simulate::{simulate, SimulationParams, DEFAULT_ITERATIONS};
