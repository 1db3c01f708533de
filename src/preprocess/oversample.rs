use ndarray::{Array1, Array2, ArrayView1, Axis};
use rand::Rng;

use crate::error::{LoadError, Result};

pub const DEFAULT_K_NEIGHBORS: usize = 5;

/// Count rows per class, sorted by class value.
pub fn class_counts(y: &[f64]) -> Vec<(f64, usize)> {
    let mut sorted = y.to_vec();
    sorted.sort_by(f64::total_cmp);

    let mut counts: Vec<(f64, usize)> = Vec::new();
    for v in sorted {
        if let Some((last, n)) = counts.last_mut() {
            if last.total_cmp(&v).is_eq() {
                *n += 1;
                continue;
            }
        }
        counts.push((v, 1));
    }
    counts
}

/// Minority class and the number of rows it is short of the majority.
fn minority_deficit(y: &[f64]) -> Option<(f64, usize)> {
    let counts = class_counts(y);
    let majority = counts.iter().map(|&(_, n)| n).max()?;
    // ties resolve to the smallest class value
    let &(minority, n) = counts.iter().min_by_key(|&&(_, n)| n)?;
    Some((minority, majority - n))
}

fn single_label_column(y: &Array2<f64>) -> Result<Vec<f64>> {
    if y.ncols() != 1 {
        return Err(LoadError::InvalidLabelShape(y.ncols()));
    }
    Ok(y.column(0).to_vec())
}

/// Append `extra` rows (features and a constant label) to the inputs.
fn append_rows(
    x: &Array2<f64>,
    y: &Array2<f64>,
    extra: Vec<Array1<f64>>,
    label: f64,
) -> Result<(Array2<f64>, Array2<f64>)> {
    let mut x_out = x.clone();
    let mut y_out = y.clone();
    for row in &extra {
        x_out
            .push_row(row.view())
            .map_err(|e| LoadError::Format(format!("appending synthetic row: {e}")))?;
        y_out
            .push_row(ArrayView1::from(&[label][..]))
            .map_err(|e| LoadError::Format(format!("appending synthetic label: {e}")))?;
    }
    Ok((x_out, y_out))
}

/// Duplicate random minority rows until the minority class matches the
/// majority count. Original rows come first, in their input order.
pub fn random_oversample<R: Rng + ?Sized>(
    x: &Array2<f64>,
    y: &Array2<f64>,
    rng: &mut R,
) -> Result<(Array2<f64>, Array2<f64>)> {
    let labels = single_label_column(y)?;
    let Some((minority, deficit)) = minority_deficit(&labels) else {
        return Ok((x.clone(), y.clone()));
    };
    let members = rows_of_class(&labels, minority);
    log::debug!("random oversampling: {deficit} extra rows of class {minority}");

    let extra = (0..deficit)
        .map(|_| x.row(members[rng.gen_range(0..members.len())]).to_owned())
        .collect();
    append_rows(x, y, extra, minority)
}

/// SMOTE: synthesise minority rows on the segment between a random minority
/// row and one of its `k_neighbors` nearest minority neighbours.
///
/// `k_neighbors` is clipped to the minority size minus one; a minority class
/// of a single row falls back to duplication.
pub fn smote<R: Rng + ?Sized>(
    x: &Array2<f64>,
    y: &Array2<f64>,
    k_neighbors: usize,
    rng: &mut R,
) -> Result<(Array2<f64>, Array2<f64>)> {
    let labels = single_label_column(y)?;
    let Some((minority, deficit)) = minority_deficit(&labels) else {
        return Ok((x.clone(), y.clone()));
    };
    let members = rows_of_class(&labels, minority);
    let k = k_neighbors.min(members.len().saturating_sub(1));
    if k == 0 {
        return random_oversample(x, y, rng);
    }
    log::debug!("SMOTE: {deficit} synthetic rows of class {minority}, k = {k}");

    let minority_x = x.select(Axis(0), &members);
    let neighbors = nearest_neighbors(&minority_x, k);

    let extra = (0..deficit)
        .map(|_| {
            let i = rng.gen_range(0..members.len());
            let j = neighbors[i][rng.gen_range(0..k)];
            let gap: f64 = rng.gen();
            let base = minority_x.row(i);
            &base + &((&minority_x.row(j) - &base) * gap)
        })
        .collect();
    append_rows(x, y, extra, minority)
}

fn rows_of_class(labels: &[f64], class: f64) -> Vec<usize> {
    labels
        .iter()
        .enumerate()
        .filter(|&(_, &v)| v.total_cmp(&class).is_eq())
        .map(|(i, _)| i)
        .collect()
}

/// Indices of the `k` nearest other rows (Euclidean) for every row.
fn nearest_neighbors(x: &Array2<f64>, k: usize) -> Vec<Vec<usize>> {
    let n = x.nrows();
    (0..n)
        .map(|i| {
            let mut dists: Vec<(f64, usize)> = (0..n)
                .filter(|&j| j != i)
                .map(|j| {
                    let d: f64 = (&x.row(i) - &x.row(j)).mapv(|v| v * v).sum();
                    (d, j)
                })
                .collect();
            dists.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
            dists.into_iter().take(k).map(|(_, j)| j).collect()
        })
        .collect()
}
