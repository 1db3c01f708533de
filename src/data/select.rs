use rand::seq::index;
use rand::Rng;

/// Row positions eligible for sampling.
///
/// With no mode filter every row is eligible; otherwise only rows whose
/// label equals `mode` exactly. The result is strictly ascending.
pub fn eligible_rows(labels: &[f64], mode: Option<f64>) -> Vec<usize> {
    match mode {
        None => (0..labels.len()).collect(),
        Some(m) => labels
            .iter()
            .enumerate()
            .filter(|&(_, &v)| v == m)
            .map(|(i, _)| i)
            .collect(),
    }
}

/// Number of rows a request for `sample_size` yields out of `eligible` rows.
///
/// Requests larger than the eligible set are clipped, so callers get
/// "up to N" rows rather than an error.
pub fn effective_sample_size(sample_size: Option<usize>, eligible: usize) -> usize {
    match sample_size {
        Some(n) => n.min(eligible),
        None => eligible,
    }
}

/// Draw a sorted, duplicate-free random sample of row indices.
///
/// Returns `effective_sample_size(sample_size, eligible)` indices drawn
/// uniformly without replacement from [`eligible_rows`], in ascending order.
/// An empty eligible set yields an empty sample.
pub fn select_rows<R: Rng + ?Sized>(
    labels: &[f64],
    mode: Option<f64>,
    sample_size: Option<usize>,
    rng: &mut R,
) -> Vec<usize> {
    let eligible = eligible_rows(labels, mode);
    let amount = effective_sample_size(sample_size, eligible.len());

    if amount == eligible.len() {
        // Whole eligible set: already sorted, no draw needed.
        return eligible;
    }

    let mut picked: Vec<usize> = index::sample(rng, eligible.len(), amount)
        .into_iter()
        .map(|pos| eligible[pos])
        .collect();
    picked.sort_unstable();
    picked
}
