//! Small numeric helpers for proposal moves: sorting three values while
//! tracking where each came from, and selecting the minimum of three.

/// Sorts three values ascending with a fixed three-compare-swap network,
/// carrying along the input position of each value.
///
/// The network compares positions (0,1), (0,2), (1,2) and swaps only on
/// strict `>`, so equal values never swap and the result is deterministic
/// on ties.
///
/// # Arguments
/// * `values` - The three values to sort
///
/// # Returns
/// `(sorted, provenance)` where `sorted[0] <= sorted[1] <= sorted[2]` and
/// `provenance[i]` is the input position `sorted[i]` came from
///
/// # Examples
/// ```
/// # use rootmove::moves::utils::sort3;
/// assert_eq!(sort3([2.0, 0.5, 1.0]), ([0.5, 1.0, 2.0], [1, 2, 0]));
/// assert_eq!(sort3([1.0, 1.0, 0.5]), ([0.5, 1.0, 1.0], [2, 1, 0]));
/// assert_eq!(sort3([1.0, 2.0, 3.0]), ([1.0, 2.0, 3.0], [0, 1, 2]));
/// ```
pub fn sort3(values: [f64; 3]) -> ([f64; 3], [usize; 3]) {
    let mut sorted = values;
    let mut provenance = [0usize, 1, 2];

    if sorted[0] > sorted[1] {
        sorted.swap(0, 1);
        provenance.swap(0, 1);
    }
    if sorted[0] > sorted[2] {
        sorted.swap(0, 2);
        provenance.swap(0, 2);
    }
    if sorted[1] > sorted[2] {
        sorted.swap(1, 2);
        provenance.swap(1, 2);
    }

    (sorted, provenance)
}

/// Returns the minimum of three values.
///
/// # Examples
/// ```
/// # use rootmove::moves::utils::min3;
/// assert_eq!(min3(2.0, 0.5, 1.0), 0.5);
/// assert_eq!(min3(1.0, 1.0, 3.0), 1.0);
/// ```
pub fn min3(a: f64, b: f64, c: f64) -> f64 {
    a.min(b).min(c)
}
