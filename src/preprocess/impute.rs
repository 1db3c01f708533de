use ndarray::{Array2, Axis};

/// Mean imputation fitted on a feature matrix.
///
/// Columns without a single observed value carry no mean and are dropped by
/// `transform`, so the output may be narrower than the input. A matrix with
/// no rows keeps all of its columns.
#[derive(Debug, Clone, PartialEq)]
pub struct MeanImputer {
    /// Input column index and the mean that fills its NaN cells.
    pub statistics: Vec<(usize, f64)>,
    pub n_input: usize,
}

impl MeanImputer {
    pub fn fit(x: &Array2<f64>) -> Self {
        let n_input = x.ncols();
        if x.nrows() == 0 {
            return MeanImputer {
                statistics: (0..n_input).map(|j| (j, 0.0)).collect(),
                n_input,
            };
        }

        let statistics = x
            .axis_iter(Axis(1))
            .enumerate()
            .filter_map(|(j, column)| {
                let (sum, count) = column
                    .iter()
                    .filter(|v| !v.is_nan())
                    .fold((0.0, 0usize), |(s, n), &v| (s + v, n + 1));
                (count > 0).then(|| (j, sum / count as f64))
            })
            .collect();
        MeanImputer { statistics, n_input }
    }

    /// Input columns that survive imputation, in order.
    pub fn kept(&self) -> Vec<usize> {
        self.statistics.iter().map(|&(j, _)| j).collect()
    }

    /// Input columns dropped for having no observed value.
    pub fn dropped(&self) -> Vec<usize> {
        let kept = self.kept();
        (0..self.n_input).filter(|j| !kept.contains(j)).collect()
    }

    pub fn transform(&self, x: &Array2<f64>) -> Array2<f64> {
        let mut out = x.select(Axis(1), &self.kept());
        for (mut column, &(_, mean)) in out.axis_iter_mut(Axis(1)).zip(&self.statistics) {
            column.mapv_inplace(|v| if v.is_nan() { mean } else { v });
        }
        out
    }

    pub fn fit_transform(x: &Array2<f64>) -> (Self, Array2<f64>) {
        let imputer = Self::fit(x);
        let imputed = imputer.transform(x);
        (imputer, imputed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn nan_cells_take_column_mean() {
        let x = array![[1.0, 7.0], [f64::NAN, 7.0], [3.0, f64::NAN], [5.0, 7.0]];
        let (imputer, out) = MeanImputer::fit_transform(&x);
        assert_eq!(out.column(0).to_vec(), vec![1.0, 3.0, 3.0, 5.0]);
        assert_eq!(out.column(1).to_vec(), vec![7.0; 4]);
        assert!(imputer.dropped().is_empty());
    }

    #[test]
    fn all_nan_column_is_dropped() {
        let x = array![[1.0, f64::NAN, 2.0], [3.0, f64::NAN, f64::NAN]];
        let (imputer, out) = MeanImputer::fit_transform(&x);
        assert_eq!(out, array![[1.0, 2.0], [3.0, 2.0]]);
        assert_eq!(imputer.kept(), vec![0, 2]);
        assert_eq!(imputer.dropped(), vec![1]);
    }

    #[test]
    fn complete_matrix_is_untouched() {
        let x = array![[1.0, 2.0], [3.0, 4.0]];
        let (_, out) = MeanImputer::fit_transform(&x);
        assert_eq!(out, x);
    }

    #[test]
    fn empty_matrix_keeps_its_width() {
        let x = Array2::<f64>::zeros((0, 3));
        let (imputer, out) = MeanImputer::fit_transform(&x);
        assert_eq!(out.dim(), (0, 3));
        assert!(imputer.dropped().is_empty());
    }
}
