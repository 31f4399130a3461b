use statrs::function::gamma::ln_gamma;

/// Converts a PHRED-scaled quality score into the probability of error.
pub fn phred_error(quality: f64) -> f64 {
    10f64.powf(-quality / 10.0)
}

/// Sums the cells of a column-major `2^ndims` contingency table whose
/// coordinate along `dim` (0-based, dimension 0 varies fastest) is fixed
/// at `index` (0 or 1).
pub fn marginal_sum(table: &[u64], ndims: usize, dim: usize, index: usize) -> u64 {
    debug_assert_eq!(table.len(), 1 << ndims);
    debug_assert!(dim < ndims);
    debug_assert!(index < 2);
    table
        .iter()
        .enumerate()
        .filter(|(cell, _)| (cell >> dim) & 1 == index)
        .map(|(_, count)| count)
        .sum()
}

fn ln_binomial(n: u64, k: u64) -> f64 {
    ln_gamma(n as f64 + 1.0) - ln_gamma(k as f64 + 1.0) - ln_gamma((n - k) as f64 + 1.0)
}

fn ln_hypergeometric(x: u64, row1: u64, row2: u64, col1: u64, n: u64) -> f64 {
    ln_binomial(row1, x) + ln_binomial(row2, col1 - x) - ln_binomial(n, col1)
}

/// Two-sided Fisher's exact test on the 2x2 table [[a, b], [c, d]].
///
/// Sums the point probabilities of every table with the observed margins
/// that is no more likely than the observed one, matching R's fisher.test.
pub fn fisher_exact(a: u64, b: u64, c: u64, d: u64) -> f64 {
    let row1 = a + b;
    let row2 = c + d;
    let col1 = a + c;
    let n = row1 + row2;
    if n == 0 {
        return 1.0;
    }

    let ln_observed = ln_hypergeometric(a, row1, row2, col1, n);
    // Relative tolerance guards against ties lost to floating-point noise
    let cutoff = ln_observed + 1e-7;

    let x_min = col1.saturating_sub(row2);
    let x_max = col1.min(row1);
    let p: f64 = (x_min..=x_max)
        .map(|x| ln_hypergeometric(x, row1, row2, col1, n))
        .filter(|&ln_p| ln_p <= cutoff)
        .map(f64::exp)
        .sum();
    p.min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64, rel: f64) -> bool {
        (a - b).abs() <= rel * b.abs().max(1e-300)
    }

    #[test]
    fn phred_error_matches_reference_values() {
        assert!(close(phred_error(10.0), 0.1, 1e-9));
        assert!(close(phred_error(20.0), 0.01, 1e-9));
        assert!(close(phred_error(30.0), 0.001, 1e-9));
    }

    #[test]
    fn marginal_sum_over_middle_dimension() {
        // 2x2x2 table holding 1..8 in column-major order
        let table: Vec<u64> = (1..=8).collect();
        assert_eq!(marginal_sum(&table, 3, 1, 0), 14);
        assert_eq!(marginal_sum(&table, 3, 1, 1), 22);
    }

    #[test]
    fn marginal_sum_over_outer_dimensions() {
        let table: Vec<u64> = (1..=8).collect();
        assert_eq!(marginal_sum(&table, 3, 0, 0), 1 + 3 + 5 + 7);
        assert_eq!(marginal_sum(&table, 3, 2, 1), 5 + 6 + 7 + 8);
    }

    #[test]
    fn fisher_exact_tea_tasting() {
        // Classic lady-tasting-tea table; R gives p = 34/70
        let p = fisher_exact(3, 1, 1, 3);
        assert!(close(p, 34.0 / 70.0, 1e-9));
    }

    #[test]
    fn fisher_exact_balanced_table_is_one() {
        assert!(close(fisher_exact(2, 2, 2, 2), 1.0, 1e-9));
    }

    #[test]
    fn fisher_exact_skewed_table_is_significant() {
        let p = fisher_exact(0, 50, 50, 0);
        assert!(p < 1e-9);
    }

    #[test]
    fn fisher_exact_empty_table_is_one() {
        assert_eq!(fisher_exact(0, 0, 0, 0), 1.0);
    }
}
