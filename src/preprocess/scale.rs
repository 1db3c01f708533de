use ndarray::{Array1, Array2, Axis};

/// Per-column standardisation to zero mean and unit variance.
///
/// Uses the population standard deviation; constant columns keep a scale of
/// one so they map to zero instead of NaN.
#[derive(Debug, Clone, PartialEq)]
pub struct StandardScaler {
    pub mean: Array1<f64>,
    pub scale: Array1<f64>,
}

impl StandardScaler {
    pub fn fit(x: &Array2<f64>) -> Self {
        let n_cols = x.ncols();
        let mean = x
            .mean_axis(Axis(0))
            .unwrap_or_else(|| Array1::zeros(n_cols));
        let scale = if x.nrows() == 0 {
            Array1::ones(n_cols)
        } else {
            x.std_axis(Axis(0), 0.0)
                .mapv(|s| if s == 0.0 || !s.is_finite() { 1.0 } else { s })
        };
        StandardScaler { mean, scale }
    }

    pub fn transform(&self, x: &Array2<f64>) -> Array2<f64> {
        (x - &self.mean) / &self.scale
    }

    pub fn fit_transform(x: &Array2<f64>) -> Array2<f64> {
        Self::fit(x).transform(x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn columns_are_centred_and_scaled() {
        let x = array![[1.0, 10.0, 4.0], [2.0, 20.0, 4.0], [3.0, 30.0, 4.0], [4.0, 40.0, 4.0]];
        let z = StandardScaler::fit_transform(&x);

        for j in 0..2 {
            let col = z.column(j);
            assert!(col.mean().unwrap().abs() < 1e-12);
            assert!((col.std(0.0) - 1.0).abs() < 1e-12);
        }
        // constant column maps to zero
        assert!(z.column(2).iter().all(|&v| v == 0.0));
    }

    #[test]
    fn fitted_scaler_applies_to_new_rows() {
        let scaler = StandardScaler::fit(&array![[0.0], [2.0]]);
        assert_eq!(scaler.mean, array![1.0]);
        assert_eq!(scaler.scale, array![1.0]);
        assert_eq!(scaler.transform(&array![[3.0]]), array![[2.0]]);
    }

    #[test]
    fn empty_matrix_keeps_shape() {
        let z = StandardScaler::fit_transform(&Array2::zeros((0, 3)));
        assert_eq!(z.dim(), (0, 3));
    }
}
