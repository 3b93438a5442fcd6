use anyhow::{Result, ensure};
use ndarray::{Array1, Array2, ArrayView2, Axis};

/// Per-feature standardisation to zero mean and unit variance.
///
/// Fitted on training rows only and then applied unchanged to every other
/// matrix. Constant features are centred but not scaled.
#[derive(Debug, Clone, PartialEq)]
pub struct StandardScaler {
    mean: Array1<f64>,
    scale: Array1<f64>,
}

impl StandardScaler {
    pub fn fit(x: ArrayView2<f64>) -> Result<Self> {
        ensure!(x.nrows() > 0, "[classify::scaler] cannot fit on zero rows");
        let mean = x.mean_axis(Axis(0))
            .ok_or_else(|| anyhow::anyhow!("[classify::scaler] empty feature matrix"))?;
        let scale = x.std_axis(Axis(0), 0.0)
            .mapv(|std| if std > 0.0 && std.is_finite() { std } else { 1.0 });
        Ok(Self { mean, scale })
    }

    #[inline] pub fn mean(&self) -> &Array1<f64> { &self.mean }

    #[inline] pub fn scale(&self) -> &Array1<f64> { &self.scale }

    pub fn transform(&self, x: ArrayView2<f64>) -> Array2<f64> {
        (&x - &self.mean) / &self.scale
    }
}
