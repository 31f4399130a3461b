//! Linkage-disequilibrium statistic over occurrence tables.

use super::haplotype::OccurrenceTable;
use statrs::distribution::{ChiSquared, ContinuousCDF};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinkageResult {
    /// Deviation of the joint all-reference frequency from the product of
    /// the per-position reference marginals.
    pub delta: f64,
    /// Chi-squared (df=1) p-value of the normalized deviation. NaN for
    /// degenerate tables; callers must treat NaN as not significant.
    pub p_value: f64,
}

/// Computes `(Δ, p)` for a table of any dimensionality.
///
/// The test statistic is `χ² = r²·N` with
/// `r = Δ / (Π_d P_ref_d (1 − P_ref_d))^(1/k)`, always tested against one
/// degree of freedom regardless of `k`.
pub fn linkage(table: &OccurrenceTable) -> LinkageResult {
    let n = table.total();
    let k = table.ndims();
    if n == 0 || k == 0 {
        return LinkageResult {
            delta: f64::NAN,
            p_value: f64::NAN,
        };
    }

    let n = n as f64;
    let p_all_ref = table.all_reference() as f64 / n;
    let mut product_ref = 1.0;
    let mut product_var = 1.0;
    for dim in 0..k {
        let p_ref = table.marginal_reference(dim) as f64 / n;
        product_ref *= p_ref;
        product_var *= p_ref * (1.0 - p_ref);
    }

    let delta = p_all_ref - product_ref;
    let r = delta / product_var.powf(1.0 / k as f64);
    let chi_squared = r * r * n;

    let p_value = if chi_squared.is_finite() {
        let dist = ChiSquared::new(1.0).expect("one degree of freedom is valid");
        1.0 - dist.cdf(chi_squared)
    } else {
        f64::NAN
    };

    LinkageResult { delta, p_value }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::haplo::haplotype::Call;

    fn fill(table: &mut OccurrenceTable, calls: &[Call], times: u64) {
        for _ in 0..times {
            table.record(calls);
        }
    }

    #[test]
    fn perfectly_linked_table_is_significant() {
        use Call::{Alternate as A, Reference as R};
        let mut table = OccurrenceTable::new(2);
        fill(&mut table, &[R, R], 50);
        fill(&mut table, &[A, A], 50);

        let result = linkage(&table);
        // Δ = 0.5 − 0.25, r = 1, χ² = 100
        assert!((result.delta - 0.25).abs() < 1e-12);
        assert!(result.p_value < 1e-9);
    }

    #[test]
    fn independent_table_has_zero_delta_and_p_one() {
        use Call::{Alternate as A, Reference as R};
        // counts exactly matching the product of the marginals
        let mut table = OccurrenceTable::new(2);
        fill(&mut table, &[R, R], 25);
        fill(&mut table, &[R, A], 25);
        fill(&mut table, &[A, R], 25);
        fill(&mut table, &[A, A], 25);

        let result = linkage(&table);
        assert_eq!(result.delta, 0.0);
        assert_eq!(result.p_value, 1.0);
    }

    #[test]
    fn degenerate_marginals_yield_nan_p() {
        use Call::Reference as R;
        // all mass in the all-reference cell collapses every marginal
        let mut table = OccurrenceTable::new(2);
        fill(&mut table, &[R, R], 100);

        let result = linkage(&table);
        assert!(result.p_value.is_nan());
    }

    #[test]
    fn empty_table_yields_nan_p() {
        let table = OccurrenceTable::new(2);
        assert!(linkage(&table).p_value.is_nan());
    }

    #[test]
    fn three_way_table_still_tests_one_degree_of_freedom() {
        use Call::{Alternate as A, Reference as R};
        let mut table = OccurrenceTable::new(3);
        fill(&mut table, &[R, R, R], 60);
        fill(&mut table, &[A, A, A], 40);

        let result = linkage(&table);
        // q = 0.6: Δ = q − q³, r = (1 + q)
        assert!((result.delta - (0.6 - 0.6f64.powi(3))).abs() < 1e-12);
        assert!(result.p_value < 1e-9);
    }
}
