use crate::error::BayesError;
use crate::model::{ClassModel, FeatureVector};

/// The discriminant function used to score the classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscriminantKind {
    /// Full Gaussian model: log prior, log determinant and Mahalanobis distance.
    #[default]
    Quadratic,
    /// Shared isotropic covariance and equal priors: negative squared Euclidean distance
    /// to the class mean.
    Isotropic,
}

impl DiscriminantKind {
    /// Score a feature vector under a class model.
    pub fn evaluate<const N: usize>(&self, x: &FeatureVector<N>, model: &ClassModel<N>) -> f64 {
        match self {
            DiscriminantKind::Quadratic => model.discriminant(x),
            DiscriminantKind::Isotropic => discriminant_isotropic(x, model.mean()),
        }
    }
}

/// Compute the quadratic discriminant of a feature vector for a Gaussian class.
///
/// `d = ln(prior) - 0.5 * (ln(det(Σ)) + (x - μ)ᵀ Σ⁻¹ (x - μ))`
///
/// For two classes with equal priors, `d_i(x) > d_j(x)` exactly when the Gaussian density
/// of class `i` at `x` exceeds the density of class `j`. The value is a log posterior up
/// to a shared constant, not a probability.
///
/// # Arguments
///
/// * `x` - The feature vector to score.
/// * `mean` - The class mean μ.
/// * `covariance` - The class covariance Σ, symmetric positive definite.
/// * `prior` - The class prior probability in (0, 1].
///
/// # Errors
///
/// * [`BayesError::DegenerateModel`] if the covariance is singular or not positive definite.
/// * [`BayesError::AsymmetricCovariance`] if the covariance is not symmetric.
/// * [`BayesError::InvalidPrior`] if the prior is not in (0, 1].
/// * [`BayesError::NonFinite`] if any input is NaN or infinite.
///
/// # Examples
///
/// ```
/// use silhouette_bayes::discriminant;
///
/// let d = discriminant(&[0.5, 0.6], &[0.7, 0.9], &[[0.7, 0.3], [0.3, 0.9]], 0.5).unwrap();
/// assert!((d + 0.4433874441813701).abs() < 1e-9);
/// ```
pub fn discriminant<const N: usize>(
    x: &FeatureVector<N>,
    mean: &FeatureVector<N>,
    covariance: &[[f64; N]; N],
    prior: f64,
) -> Result<f64, BayesError> {
    check_finite(x)?;
    let model = ClassModel::new(*mean, *covariance, prior)?;
    Ok(model.discriminant(x))
}

/// Compute the squared Mahalanobis distance `(x - μ)ᵀ Σ⁻¹ (x - μ)`.
///
/// # Errors
///
/// Same as [`discriminant`], except that no prior is involved.
pub fn mahalanobis_squared<const N: usize>(
    x: &FeatureVector<N>,
    mean: &FeatureVector<N>,
    covariance: &[[f64; N]; N],
) -> Result<f64, BayesError> {
    check_finite(x)?;
    let model = ClassModel::new(*mean, *covariance, 1.0)?;
    Ok(model.mahalanobis_squared(x))
}

/// Compute the isotropic discriminant of a feature vector: `d = -||x - μ||²`.
///
/// Equivalent to [`discriminant`] when every class shares one covariance σ²·I and the
/// priors are equal, since the dropped terms are then the same for all the classes.
///
/// # Examples
///
/// ```
/// use silhouette_bayes::discriminant_isotropic;
///
/// assert_eq!(discriminant_isotropic(&[1.0, 2.0], &[4.0, 6.0]), -25.0);
/// ```
pub fn discriminant_isotropic<const N: usize>(x: &FeatureVector<N>, mean: &FeatureVector<N>) -> f64 {
    -x.iter()
        .zip(mean.iter())
        .map(|(a, b)| (a - b) * (a - b))
        .sum::<f64>()
}

/// Check that every component of a feature vector is finite.
pub(crate) fn check_finite<const N: usize>(x: &FeatureVector<N>) -> Result<(), BayesError> {
    if x.iter().all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(BayesError::NonFinite)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    /// Gaussian density of a 2d normal distribution.
    fn density_2d(x: &[f64; 2], mean: &[f64; 2], cov: &[[f64; 2]; 2]) -> f64 {
        let det = cov[0][0] * cov[1][1] - cov[0][1] * cov[1][0];
        let inv = [
            [cov[1][1] / det, -cov[0][1] / det],
            [-cov[1][0] / det, cov[0][0] / det],
        ];
        let d = [x[0] - mean[0], x[1] - mean[1]];
        let q = d[0] * (inv[0][0] * d[0] + inv[0][1] * d[1])
            + d[1] * (inv[1][0] * d[0] + inv[1][1] * d[1]);
        (-0.5 * q).exp() / (2.0 * std::f64::consts::PI * det.sqrt())
    }

    #[test]
    fn reference_value() -> Result<(), BayesError> {
        let d = discriminant(&[0.5, 0.6], &[0.7, 0.9], &[[0.7, 0.3], [0.3, 0.9]], 0.5)?;
        assert_abs_diff_eq!(d, -0.4433874441813701, epsilon = 1e-9);
        Ok(())
    }

    #[test]
    fn singular_covariance() {
        let result = discriminant(&[0.5, 0.6], &[0.7, 0.9], &[[1.0, 1.0], [1.0, 1.0]], 0.5);
        assert!(matches!(result, Err(BayesError::DegenerateModel(_))));

        let result = discriminant(&[0.5], &[0.7], &[[0.0]], 0.5);
        assert!(matches!(result, Err(BayesError::DegenerateModel(_))));
    }

    #[test]
    fn invalid_inputs() {
        let cov = [[1.0, 0.0], [0.0, 1.0]];
        assert_eq!(
            discriminant(&[0.0, 0.0], &[0.0, 0.0], &cov, 0.0),
            Err(BayesError::InvalidPrior(0.0))
        );
        assert_eq!(
            discriminant(&[f64::INFINITY, 0.0], &[0.0, 0.0], &cov, 0.5),
            Err(BayesError::NonFinite)
        );
    }

    #[test]
    fn ranking_follows_density() -> Result<(), BayesError> {
        let (mean_a, cov_a) = ([0.0, 0.0], [[1.0, 0.3], [0.3, 0.5]]);
        let (mean_b, cov_b) = ([1.5, -0.5], [[0.4, -0.1], [-0.1, 2.0]]);

        for i in -8..=8 {
            for j in -8..=8 {
                let x = [i as f64 * 0.4, j as f64 * 0.4];
                let d_a = discriminant(&x, &mean_a, &cov_a, 0.5)?;
                let d_b = discriminant(&x, &mean_b, &cov_b, 0.5)?;
                let p_a = density_2d(&x, &mean_a, &cov_a);
                let p_b = density_2d(&x, &mean_b, &cov_b);

                // the discriminant is the log density up to a shared constant
                assert_abs_diff_eq!(d_a - d_b, p_a.ln() - p_b.ln(), epsilon = 1e-9);
                assert_eq!(d_a > d_b, p_a > p_b);
            }
        }

        Ok(())
    }

    #[test]
    fn mahalanobis_diagonal() -> Result<(), BayesError> {
        let d2 = mahalanobis_squared(&[2.0, 3.0], &[0.0, 0.0], &[[4.0, 0.0], [0.0, 9.0]])?;
        assert_abs_diff_eq!(d2, 2.0, epsilon = 1e-12);
        Ok(())
    }

    #[test]
    fn isotropic_matches_identity_covariance() -> Result<(), BayesError> {
        let identity = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];
        let mean = [0.2, -1.0, 3.0];
        let x = [1.0, 0.5, 2.0];

        let quadratic = discriminant(&x, &mean, &identity, 0.25)?;
        let isotropic = discriminant_isotropic(&x, &mean);

        assert_abs_diff_eq!(quadratic, 0.25f64.ln() + 0.5 * isotropic, epsilon = 1e-12);

        Ok(())
    }

    #[test]
    fn kind_evaluate() -> Result<(), BayesError> {
        let model = ClassModel::new([0.7, 0.9], [[0.7, 0.3], [0.3, 0.9]], 0.5)?;
        let x = [0.5, 0.6];

        assert_eq!(
            DiscriminantKind::Quadratic.evaluate(&x, &model),
            model.discriminant(&x)
        );
        assert_abs_diff_eq!(
            DiscriminantKind::Isotropic.evaluate(&x, &model),
            -0.13,
            epsilon = 1e-12
        );

        Ok(())
    }
}
