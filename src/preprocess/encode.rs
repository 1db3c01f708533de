use ndarray::Array2;

/// One-hot encoder over the columns of a label matrix.
///
/// Each input column gets one output column per distinct value seen during
/// `fit`, in ascending value order; blocks follow input column order.
/// Values not seen during `fit` encode as an all-zero block.
#[derive(Debug, Clone, PartialEq)]
pub struct OneHotEncoder {
    pub categories: Vec<Vec<f64>>,
}

impl OneHotEncoder {
    pub fn fit(y: &Array2<f64>) -> Self {
        let categories = y
            .columns()
            .into_iter()
            .map(|col| {
                let mut values = col.to_vec();
                values.sort_by(f64::total_cmp);
                values.dedup_by(|a, b| a.total_cmp(b).is_eq());
                values
            })
            .collect();
        OneHotEncoder { categories }
    }

    /// Total number of output columns.
    pub fn n_outputs(&self) -> usize {
        self.categories.iter().map(Vec::len).sum()
    }

    pub fn transform(&self, y: &Array2<f64>) -> Array2<f64> {
        let mut out = Array2::zeros((y.nrows(), self.n_outputs()));
        let mut offset = 0;
        for (j, cats) in self.categories.iter().enumerate() {
            if j >= y.ncols() {
                break;
            }
            for (i, &v) in y.column(j).iter().enumerate() {
                if let Ok(k) = cats.binary_search_by(|c| c.total_cmp(&v)) {
                    out[[i, offset + k]] = 1.0;
                }
            }
            offset += cats.len();
        }
        out
    }

    pub fn fit_transform(y: &Array2<f64>) -> (Self, Array2<f64>) {
        let encoder = Self::fit(y);
        let encoded = encoder.transform(y);
        (encoder, encoded)
    }
}
