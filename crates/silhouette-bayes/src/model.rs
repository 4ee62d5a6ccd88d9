use std::collections::BTreeMap;
use std::fmt::Debug;

use faer::prelude::SpSolver;

use crate::error::BayesError;

/// A feature vector of dimension `N`.
pub type FeatureVector<const N: usize> = [f64; N];

/// Labeled training samples, one collection of feature vectors per class.
pub type TrainingSet<L, const N: usize> = BTreeMap<L, Vec<FeatureVector<N>>>;

/// How the class prior probabilities are assigned during estimation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priors {
    /// Every class gets the same prior, 1 / number of classes.
    #[default]
    Uniform,
    /// The prior of a class is its share of the training samples.
    Empirical,
}

/// Gaussian parameters of one class.
///
/// The covariance is validated on construction: it must be positive definite. The log
/// determinant and the inverse (precision matrix) are computed once and cached, so the
/// model can be evaluated any number of times without refactorizing it.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassModel<const N: usize> {
    mean: FeatureVector<N>,
    covariance: [[f64; N]; N],
    prior: f64,
    log_det: f64,
    precision: [[f64; N]; N],
}

impl<const N: usize> ClassModel<N> {
    /// Create a new class model.
    ///
    /// # Arguments
    ///
    /// * `mean` - The mean feature vector of the class.
    /// * `covariance` - The symmetric positive definite covariance matrix of the class.
    /// * `prior` - The prior probability of the class in (0, 1].
    ///
    /// # Errors
    ///
    /// * [`BayesError::InvalidPrior`] if the prior is not in (0, 1].
    /// * [`BayesError::NonFinite`] if any parameter is NaN or infinite.
    /// * [`BayesError::AsymmetricCovariance`] if the covariance is not symmetric.
    /// * [`BayesError::DegenerateModel`] if the covariance is not positive definite, or so
    ///   close to singular that its inverse is dominated by rounding errors.
    ///
    /// # Examples
    ///
    /// ```
    /// use silhouette_bayes::ClassModel;
    ///
    /// let model = ClassModel::new([0.7, 0.9], [[0.7, 0.3], [0.3, 0.9]], 0.5).unwrap();
    /// assert_eq!(model.prior(), 0.5);
    ///
    /// let singular = ClassModel::new([0.0, 0.0], [[1.0, 1.0], [1.0, 1.0]], 0.5);
    /// assert!(singular.is_err());
    /// ```
    pub fn new(
        mean: FeatureVector<N>,
        covariance: [[f64; N]; N],
        prior: f64,
    ) -> Result<Self, BayesError> {
        check_prior(prior)?;

        if !mean
            .iter()
            .chain(covariance.iter().flatten())
            .all(|v| v.is_finite())
        {
            return Err(BayesError::NonFinite);
        }

        let (log_det, precision) = invert_covariance(&covariance)?;

        Ok(Self {
            mean,
            covariance,
            prior,
            log_det,
            precision,
        })
    }

    /// Create a copy of the model with a different prior probability.
    pub fn with_prior(&self, prior: f64) -> Result<Self, BayesError> {
        check_prior(prior)?;
        Ok(Self {
            prior,
            ..self.clone()
        })
    }

    /// The mean feature vector of the class.
    pub fn mean(&self) -> &FeatureVector<N> {
        &self.mean
    }

    /// The covariance matrix of the class.
    pub fn covariance(&self) -> &[[f64; N]; N] {
        &self.covariance
    }

    /// The prior probability of the class.
    pub fn prior(&self) -> f64 {
        self.prior
    }

    /// The natural logarithm of the covariance determinant.
    pub fn log_determinant(&self) -> f64 {
        self.log_det
    }

    /// The inverse of the covariance matrix.
    pub fn precision(&self) -> &[[f64; N]; N] {
        &self.precision
    }

    /// The squared Mahalanobis distance `(x - mean)ᵀ Σ⁻¹ (x - mean)` of a feature vector.
    pub fn mahalanobis_squared(&self, x: &FeatureVector<N>) -> f64 {
        let diff: [f64; N] = std::array::from_fn(|i| x[i] - self.mean[i]);

        self.precision
            .iter()
            .zip(diff.iter())
            .map(|(row, di)| {
                let row_dot = row.iter().zip(diff.iter()).map(|(p, dj)| p * dj).sum::<f64>();
                di * row_dot
            })
            .sum()
    }

    /// The quadratic discriminant of a feature vector under this model.
    ///
    /// `d = ln(prior) - 0.5 * (ln(det(Σ)) + (x - mean)ᵀ Σ⁻¹ (x - mean))`
    ///
    /// This is the log posterior up to a term shared by all the classes, so it can be
    /// compared across classes but it is not a probability.
    pub fn discriminant(&self, x: &FeatureVector<N>) -> f64 {
        self.prior.ln() - 0.5 * (self.log_det + self.mahalanobis_squared(x))
    }
}

/// Check that a prior probability lies in (0, 1].
pub(crate) fn check_prior(prior: f64) -> Result<(), BayesError> {
    if prior > 0.0 && prior <= 1.0 {
        Ok(())
    } else {
        Err(BayesError::InvalidPrior(prior))
    }
}

/// Relative tolerance of the symmetry and singularity checks of a covariance.
const SINGULARITY_TOLERANCE: f64 = 1e3 * f64::EPSILON;

/// Compute the log determinant and the inverse of a positive definite matrix.
fn invert_covariance<const N: usize>(
    covariance: &[[f64; N]; N],
) -> Result<(f64, [[f64; N]; N]), BayesError> {
    if N == 0 {
        return Err(BayesError::InvalidDimension {
            expected: 1,
            actual: 0,
        });
    }

    for i in 0..N {
        for j in (i + 1)..N {
            let (a, b) = (covariance[i][j], covariance[j][i]);
            if (a - b).abs() > SINGULARITY_TOLERANCE * a.abs().max(b.abs()) {
                return Err(BayesError::AsymmetricCovariance { row: i, col: j });
            }
        }
    }

    if let Some(variance) = (0..N).map(|i| covariance[i][i]).find(|v| *v <= 0.0) {
        return Err(BayesError::DegenerateModel(variance));
    }

    let mat = faer::Mat::<f64>::from_fn(N, N, |i, j| covariance[i][j]);

    // Sylvester's criterion, each leading minor relative to the product of its diagonal
    // entries, which bounds it for positive definite matrices
    let tolerance = N as f64 * SINGULARITY_TOLERANCE;
    let mut diagonal_product = 1.0;
    for k in 1..=N {
        diagonal_product *= covariance[k - 1][k - 1];
        let minor = mat.as_ref().submatrix(0, 0, k, k).determinant();
        if !(minor.is_finite() && minor > tolerance * diagonal_product) {
            return Err(BayesError::DegenerateModel(minor));
        }
    }

    let det = mat.determinant();
    let inverse = mat
        .partial_piv_lu()
        .solve(faer::Mat::<f64>::identity(N, N));

    let mut precision = [[0.0; N]; N];
    for (i, row) in precision.iter_mut().enumerate() {
        for (j, value) in row.iter_mut().enumerate() {
            *value = inverse.read(i, j);
        }
    }

    if !precision.iter().flatten().all(|v| v.is_finite()) {
        return Err(BayesError::DegenerateModel(det));
    }

    Ok((det.ln(), precision))
}

/// Compute the componentwise mean of a collection of feature vectors.
///
/// # Errors
///
/// Fails with [`BayesError::InsufficientSamples`] when the collection is empty.
pub fn mean_vector<const N: usize>(
    samples: &[FeatureVector<N>],
) -> Result<FeatureVector<N>, BayesError> {
    if samples.is_empty() {
        return Err(BayesError::InsufficientSamples(0));
    }

    let mut mean = [0.0; N];
    for sample in samples {
        for (m, v) in mean.iter_mut().zip(sample.iter()) {
            *m += v;
        }
    }

    let n = samples.len() as f64;
    mean.iter_mut().for_each(|m| *m /= n);

    Ok(mean)
}

/// Compute the unbiased sample covariance matrix of a collection of feature vectors.
///
/// The deviations are accumulated around the sample mean and divided by `n - 1`.
///
/// # Errors
///
/// Fails with [`BayesError::InsufficientSamples`] when there are fewer than 2 samples.
///
/// # Examples
///
/// ```
/// use silhouette_bayes::model::covariance_matrix;
///
/// let cov = covariance_matrix(&[[1.0, 2.0], [3.0, 4.0], [5.0, 9.0]]).unwrap();
/// assert_eq!(cov, [[4.0, 7.0], [7.0, 13.0]]);
/// ```
pub fn covariance_matrix<const N: usize>(
    samples: &[FeatureVector<N>],
) -> Result<[[f64; N]; N], BayesError> {
    if samples.len() < 2 {
        return Err(BayesError::InsufficientSamples(samples.len()));
    }

    let mean = mean_vector(samples)?;

    let mut cov = [[0.0; N]; N];
    for sample in samples {
        let diff: [f64; N] = std::array::from_fn(|i| sample[i] - mean[i]);
        for i in 0..N {
            for j in i..N {
                cov[i][j] += diff[i] * diff[j];
            }
        }
    }

    let denom = (samples.len() - 1) as f64;
    for i in 0..N {
        for j in i..N {
            cov[i][j] /= denom;
            cov[j][i] = cov[i][j];
        }
    }

    Ok(cov)
}

/// Estimate the Gaussian model of one class from its training samples.
///
/// # Arguments
///
/// * `samples` - The feature vectors of the class, at least 2.
/// * `prior` - The prior probability of the class.
pub fn estimate_class<const N: usize>(
    samples: &[FeatureVector<N>],
    prior: f64,
) -> Result<ClassModel<N>, BayesError> {
    let covariance = covariance_matrix(samples)?;
    let mean = mean_vector(samples)?;
    ClassModel::new(mean, covariance, prior)
}

/// Estimate the Gaussian model of every class of a training set.
///
/// The estimation is all or nothing: if any class fails, the whole call fails with
/// [`BayesError::ClassEstimation`] naming the class, and no model is returned.
///
/// # Arguments
///
/// * `training_set` - The labeled training samples.
/// * `priors` - How to assign the class priors.
///
/// # Returns
///
/// One model per label.
pub fn estimate<L, const N: usize>(
    training_set: &TrainingSet<L, N>,
    priors: Priors,
) -> Result<BTreeMap<L, ClassModel<N>>, BayesError>
where
    L: Ord + Clone + Debug,
{
    if training_set.is_empty() {
        return Err(BayesError::EmptyModelSet);
    }

    let num_classes = training_set.len() as f64;
    let num_samples = training_set.values().map(Vec::len).sum::<usize>() as f64;

    training_set
        .iter()
        .map(|(label, samples)| {
            let prior = match priors {
                Priors::Uniform => 1.0 / num_classes,
                Priors::Empirical => samples.len() as f64 / num_samples,
            };

            let model = estimate_class(samples, prior).map_err(|err| {
                log::warn!("failed to estimate class {label:?}: {err}");
                BayesError::ClassEstimation {
                    label: format!("{label:?}"),
                    source: Box::new(err),
                }
            })?;

            log::debug!(
                "estimated class {label:?} from {} samples: mean {:?}, prior {:.4}, log det {:.4}",
                samples.len(),
                model.mean(),
                model.prior(),
                model.log_determinant(),
            );

            Ok((label.clone(), model))
        })
        .collect()
}

/// Convert dynamically sized rows, e.g. read from a file, into feature vectors.
///
/// # Errors
///
/// Fails with [`BayesError::InvalidDimension`] on the first row whose length is not `N`.
pub fn feature_vectors_from_rows<const N: usize>(
    rows: &[Vec<f64>],
) -> Result<Vec<FeatureVector<N>>, BayesError> {
    rows.iter()
        .map(|row| {
            <[f64; N]>::try_from(row.as_slice()).map_err(|_| BayesError::InvalidDimension {
                expected: N,
                actual: row.len(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::ShapeClass;

    #[test]
    fn mean_and_covariance() -> Result<(), BayesError> {
        let samples = [[1.0, 2.0], [3.0, 4.0], [5.0, 9.0]];

        assert_eq!(mean_vector(&samples)?, [3.0, 5.0]);
        assert_eq!(covariance_matrix(&samples)?, [[4.0, 7.0], [7.0, 13.0]]);

        Ok(())
    }

    #[test]
    fn insufficient_samples() {
        assert_eq!(
            covariance_matrix(&[[1.0, 2.0]]),
            Err(BayesError::InsufficientSamples(1))
        );
        assert_eq!(
            mean_vector::<2>(&[]),
            Err(BayesError::InsufficientSamples(0))
        );
        assert_eq!(
            estimate_class(&[[1.0, 2.0, 3.0]], 0.5),
            Err(BayesError::InsufficientSamples(1))
        );
    }

    #[test]
    fn circle_reference_statistics() -> Result<(), BayesError> {
        let mean: [f64; 2] = [0.15954, 0.0000999];
        let cov: [[f64; 2]; 2] = [[1.0219e-7, 3.332e-8], [3.332e-8, 1.093e-8]];

        // four samples at mean ± a and mean ± b, with a aᵀ + b bᵀ = 1.5 cov, have exactly
        // the reference mean and unbiased covariance
        let l00 = (1.5 * cov[0][0]).sqrt();
        let l10 = 1.5 * cov[1][0] / l00;
        let l11 = (1.5 * cov[1][1] - l10 * l10).sqrt();
        let a = [l00, l10];
        let b = [0.0, l11];

        let samples = [
            [mean[0] + a[0], mean[1] + a[1]],
            [mean[0] - a[0], mean[1] - a[1]],
            [mean[0] + b[0], mean[1] + b[1]],
            [mean[0] - b[0], mean[1] - b[1]],
        ];

        let model = estimate_class(&samples, 1.0 / 3.0)?;

        for i in 0..2 {
            assert_relative_eq!(model.mean()[i], mean[i], max_relative = 1e-6);
            for j in 0..2 {
                assert_relative_eq!(model.covariance()[i][j], cov[i][j], max_relative = 1e-6);
            }
        }

        Ok(())
    }

    #[test]
    fn degenerate_covariance() {
        // collinear samples have a singular covariance
        let samples = [[1.0, 2.0], [2.0, 4.0], [3.0, 6.0]];
        assert!(matches!(
            estimate_class(&samples, 0.5),
            Err(BayesError::DegenerateModel(_))
        ));

        // identical samples have a zero covariance
        let samples = [[1.0, 2.0], [1.0, 2.0]];
        assert!(matches!(
            estimate_class(&samples, 0.5),
            Err(BayesError::DegenerateModel(_))
        ));

        // collinear samples whose covariance is singular only up to rounding
        let samples = [[0.1, 0.3], [0.2, 0.6], [0.3, 0.9], [0.7, 2.1], [0.11, 0.33]];
        assert!(matches!(
            estimate_class(&samples, 0.5),
            Err(BayesError::DegenerateModel(_))
        ));

        // symmetric but not positive definite
        assert!(matches!(
            ClassModel::new([0.0, 0.0], [[-1.0, 0.0], [0.0, -1.0]], 0.5),
            Err(BayesError::DegenerateModel(_))
        ));
    }

    #[test]
    fn asymmetric_covariance() {
        assert_eq!(
            ClassModel::new([0.0, 0.0], [[1.0, 5.0], [0.0, 1.0]], 0.5),
            Err(BayesError::AsymmetricCovariance { row: 0, col: 1 })
        );
        assert_eq!(
            ClassModel::new([0.0; 3], [[2.0, 0.0, 0.1], [0.0, 2.0, 0.0], [0.2, 0.0, 2.0]], 0.5),
            Err(BayesError::AsymmetricCovariance { row: 0, col: 2 })
        );
    }

    #[test]
    fn small_variances_are_not_degenerate() -> Result<(), BayesError> {
        // the scale of the Hu features of a circle
        let model = ClassModel::new(
            [0.15954, 0.0000999],
            [[1.0219e-7, 3.332e-8], [3.332e-8, 1.093e-8]],
            1.0 / 3.0,
        )?;
        assert!(model.log_determinant().is_finite());

        Ok(())
    }

    #[test]
    fn invalid_parameters() {
        let cov = [[1.0, 0.0], [0.0, 1.0]];
        for prior in [0.0, -0.1, 1.5, f64::NAN] {
            assert!(matches!(
                ClassModel::new([0.0, 0.0], cov, prior),
                Err(BayesError::InvalidPrior(_))
            ));
        }

        assert_eq!(
            ClassModel::new([f64::NAN, 0.0], cov, 0.5),
            Err(BayesError::NonFinite)
        );
    }

    #[test]
    fn precision_is_inverse() -> Result<(), BayesError> {
        let model = ClassModel::new(
            [0.0; 3],
            [[4.0, 1.0, 0.5], [1.0, 3.0, 0.2], [0.5, 0.2, 2.0]],
            1.0,
        )?;

        let cov = model.covariance();
        let precision = model.precision();
        for i in 0..3 {
            for j in 0..3 {
                let value = (0..3).map(|k| cov[i][k] * precision[k][j]).sum::<f64>();
                let expected = if i == j { 1.0 } else { 0.0 };
                approx::assert_abs_diff_eq!(value, expected, epsilon = 1e-12);
            }
        }

        // det = 4 * (6 - 0.04) - 1 * (2 - 0.1) + 0.5 * (0.2 - 1.5)
        approx::assert_abs_diff_eq!(model.log_determinant(), 21.29f64.ln(), epsilon = 1e-12);

        Ok(())
    }

    #[test]
    fn estimate_priors() -> Result<(), BayesError> {
        let mut training_set = TrainingSet::new();
        training_set.insert(
            ShapeClass::Triangle,
            vec![[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]],
        );
        training_set.insert(
            ShapeClass::Circle,
            vec![[5.0, 5.0], [6.0, 5.0], [5.0, 6.0], [6.0, 6.5], [5.5, 5.2]],
        );

        let models = estimate(&training_set, Priors::Uniform)?;
        assert_eq!(models.len(), 2);
        assert_eq!(models[&ShapeClass::Triangle].prior(), 0.5);
        assert_eq!(models[&ShapeClass::Circle].prior(), 0.5);

        let models = estimate(&training_set, Priors::Empirical)?;
        assert_relative_eq!(models[&ShapeClass::Triangle].prior(), 3.0 / 8.0);
        assert_relative_eq!(models[&ShapeClass::Circle].prior(), 5.0 / 8.0);

        Ok(())
    }

    #[test]
    fn estimate_is_all_or_nothing() {
        let mut training_set = TrainingSet::new();
        training_set.insert(ShapeClass::Circle, vec![[5.0, 5.0], [6.0, 5.0], [5.0, 6.0]]);
        training_set.insert(ShapeClass::Square, vec![[1.0, 1.0]]);

        assert_eq!(
            estimate(&training_set, Priors::Uniform),
            Err(BayesError::ClassEstimation {
                label: "Square".to_string(),
                source: Box::new(BayesError::InsufficientSamples(1)),
            })
        );

        assert_eq!(
            estimate(&TrainingSet::<ShapeClass, 2>::new(), Priors::Uniform),
            Err(BayesError::EmptyModelSet)
        );
    }

    #[test]
    fn rows_to_feature_vectors() {
        let rows = vec![vec![0.1, 0.2], vec![0.3, 0.4]];
        assert_eq!(
            feature_vectors_from_rows::<2>(&rows),
            Ok(vec![[0.1, 0.2], [0.3, 0.4]])
        );

        let rows = vec![vec![0.1, 0.2], vec![0.3, 0.4, 0.5]];
        assert_eq!(
            feature_vectors_from_rows::<2>(&rows),
            Err(BayesError::InvalidDimension {
                expected: 2,
                actual: 3
            })
        );
    }
}
