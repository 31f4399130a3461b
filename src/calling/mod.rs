mod caller;
mod pileup;
mod variant;

pub use caller::{call_variants, CallerParams};
pub use pileup::{parse_pileup, PileupRow};
pub use variant::{FilterStatus, Variant};
