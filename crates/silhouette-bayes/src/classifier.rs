use std::collections::BTreeMap;
use std::fmt::Debug;

use crate::discriminant::{check_finite, DiscriminantKind};
use crate::error::BayesError;
use crate::model::{estimate, ClassModel, FeatureVector, Priors, TrainingSet};

/// The outcome of classifying a feature vector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision<L> {
    /// The feature vector belongs to the class with this label.
    Class(L),
    /// The two most probable classes are too close to decide.
    Rejected,
}

impl<L> Decision<L> {
    /// The decided label, or `None` if the decision was rejected.
    pub fn label(&self) -> Option<&L> {
        match self {
            Decision::Class(label) => Some(label),
            Decision::Rejected => None,
        }
    }

    /// Whether the decision was rejected.
    pub fn is_rejected(&self) -> bool {
        matches!(self, Decision::Rejected)
    }
}

/// Configuration of the classification decision.
///
/// # Examples
///
/// ```
/// use silhouette_bayes::{ClassifierConfig, DiscriminantKind};
///
/// let config: ClassifierConfig = serde_json::from_str(r#"{"rejection_threshold": 0.2}"#).unwrap();
/// assert_eq!(config.kind, DiscriminantKind::Quadratic);
/// assert_eq!(config.rejection_threshold, 0.2);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// The discriminant function used to score the classes.
    pub kind: DiscriminantKind,
    /// Minimum posterior gap between the two most probable classes, in [0, 1].
    ///
    /// A value of 0 disables the rejection.
    ///
    /// With [`DiscriminantKind::Isotropic`] the posteriors are those of Gaussians with a
    /// shared covariance `I / 2`, so the gap depends on the scale of the features: classes
    /// whose means are much closer than 1 get nearly uniform posteriors and every vector
    /// is rejected. Scale the features, or use the quadratic discriminant, before setting
    /// a threshold.
    pub rejection_threshold: f64,
}

impl ClassifierConfig {
    /// Check that the rejection threshold lies in [0, 1].
    pub fn validate(&self) -> Result<(), BayesError> {
        if (0.0..=1.0).contains(&self.rejection_threshold) {
            Ok(())
        } else {
            Err(BayesError::InvalidThreshold(self.rejection_threshold))
        }
    }
}

/// Compute the discriminant of a feature vector for every class.
///
/// # Arguments
///
/// * `x` - The feature vector to score.
/// * `models` - The class models.
/// * `kind` - The discriminant function.
///
/// # Returns
///
/// The score of every class, in label order.
pub fn scores<L, const N: usize>(
    x: &FeatureVector<N>,
    models: &BTreeMap<L, ClassModel<N>>,
    kind: DiscriminantKind,
) -> Result<Vec<(L, f64)>, BayesError>
where
    L: Ord + Clone,
{
    if models.is_empty() {
        return Err(BayesError::EmptyModelSet);
    }

    check_finite(x)?;

    models
        .iter()
        .map(|(label, model)| {
            let score = kind.evaluate(x, model);
            // far away vectors overflow the distance to infinity
            if !score.is_finite() {
                return Err(BayesError::NonFinite);
            }
            Ok((label.clone(), score))
        })
        .collect()
}

/// Compute the posterior probability of every class.
///
/// The scores are renormalized with a softmax shifted by the maximum score. With the
/// quadratic discriminant these are the Bayes posteriors of the Gaussian model.
///
/// # Returns
///
/// The posterior of every class, in label order. The posteriors sum to 1.
pub fn posteriors<L, const N: usize>(
    x: &FeatureVector<N>,
    models: &BTreeMap<L, ClassModel<N>>,
    kind: DiscriminantKind,
) -> Result<Vec<(L, f64)>, BayesError>
where
    L: Ord + Clone,
{
    let scores = scores(x, models, kind)?;
    Ok(softmax(scores))
}

fn softmax<L>(scores: Vec<(L, f64)>) -> Vec<(L, f64)> {
    let max = scores
        .iter()
        .map(|(_, s)| *s)
        .fold(f64::NEG_INFINITY, f64::max);

    let exps = scores
        .into_iter()
        .map(|(label, s)| (label, (s - max).exp()))
        .collect::<Vec<_>>();

    let total = exps.iter().map(|(_, e)| e).sum::<f64>();

    exps.into_iter().map(|(label, e)| (label, e / total)).collect()
}

/// Classify a feature vector.
///
/// The decided class is the one with the largest discriminant; exact ties go to the
/// first label in map order. When the rejection threshold θ is positive and there are
/// at least two classes, the decision is [`Decision::Rejected`] if the two largest
/// posteriors differ by less than θ.
///
/// # Arguments
///
/// * `x` - The feature vector to classify.
/// * `models` - The class models.
/// * `config` - The discriminant function and the rejection threshold.
///
/// # Errors
///
/// * [`BayesError::EmptyModelSet`] if there are no models.
/// * [`BayesError::InvalidThreshold`] if the rejection threshold is not in [0, 1].
/// * [`BayesError::NonFinite`] if the feature vector or any of its scores is not finite.
///
/// # Examples
///
/// ```
/// use std::collections::BTreeMap;
/// use silhouette_bayes::{classify, ClassModel, ClassifierConfig, Decision, ShapeClass};
///
/// let mut models = BTreeMap::new();
/// models.insert(
///     ShapeClass::Circle,
///     ClassModel::new([0.0, 0.0], [[1.0, 0.0], [0.0, 1.0]], 0.5).unwrap(),
/// );
/// models.insert(
///     ShapeClass::Square,
///     ClassModel::new([5.0, 5.0], [[1.0, 0.0], [0.0, 1.0]], 0.5).unwrap(),
/// );
///
/// let decision = classify(&[4.5, 5.2], &models, &ClassifierConfig::default()).unwrap();
/// assert_eq!(decision, Decision::Class(ShapeClass::Square));
/// ```
pub fn classify<L, const N: usize>(
    x: &FeatureVector<N>,
    models: &BTreeMap<L, ClassModel<N>>,
    config: &ClassifierConfig,
) -> Result<Decision<L>, BayesError>
where
    L: Ord + Clone + Debug,
{
    config.validate()?;

    let mut scores = scores(x, models, config.kind)?;
    log::debug!("class scores for {x:?}: {scores:?}");

    // strict comparison keeps the first label on ties
    let mut best = 0;
    for (i, (_, score)) in scores.iter().enumerate() {
        if *score > scores[best].1 {
            best = i;
        }
    }

    if config.rejection_threshold > 0.0 && scores.len() > 1 {
        let mut probs = softmax(scores.clone())
            .into_iter()
            .map(|(_, p)| p)
            .collect::<Vec<_>>();
        probs.sort_by(|a, b| b.total_cmp(a));

        let gap = probs[0] - probs[1];
        if gap < config.rejection_threshold {
            log::debug!(
                "rejected {x:?}: posterior gap {gap:.4} below {}",
                config.rejection_threshold
            );
            return Ok(Decision::Rejected);
        }
    }

    let label = scores.swap_remove(best).0;
    Ok(Decision::Class(label))
}

/// A Gaussian classifier: a set of class models with a decision configuration.
///
/// The classifier is immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct GaussianClassifier<L: Ord, const N: usize> {
    models: BTreeMap<L, ClassModel<N>>,
    config: ClassifierConfig,
}

impl<L, const N: usize> GaussianClassifier<L, N>
where
    L: Ord + Clone + Debug,
{
    /// Estimate the class models from a training set.
    ///
    /// # Arguments
    ///
    /// * `training_set` - The labeled training samples, at least 2 per class.
    /// * `priors` - How to assign the class priors.
    /// * `config` - The decision configuration.
    pub fn fit(
        training_set: &TrainingSet<L, N>,
        priors: Priors,
        config: ClassifierConfig,
    ) -> Result<Self, BayesError> {
        config.validate()?;
        let models = estimate(training_set, priors)?;
        Ok(Self { models, config })
    }

    /// Create a classifier from already estimated models.
    pub fn from_models(
        models: BTreeMap<L, ClassModel<N>>,
        config: ClassifierConfig,
    ) -> Result<Self, BayesError> {
        if models.is_empty() {
            return Err(BayesError::EmptyModelSet);
        }
        config.validate()?;
        Ok(Self { models, config })
    }

    /// Classify a feature vector. See [`classify`].
    pub fn classify(&self, x: &FeatureVector<N>) -> Result<Decision<L>, BayesError> {
        classify(x, &self.models, &self.config)
    }

    /// The score of every class, in label order. See [`scores`].
    pub fn scores(&self, x: &FeatureVector<N>) -> Result<Vec<(L, f64)>, BayesError> {
        scores(x, &self.models, self.config.kind)
    }

    /// The posterior of every class, in label order. See [`posteriors`].
    pub fn posteriors(&self, x: &FeatureVector<N>) -> Result<Vec<(L, f64)>, BayesError> {
        posteriors(x, &self.models, self.config.kind)
    }

    /// The class models.
    pub fn models(&self) -> &BTreeMap<L, ClassModel<N>> {
        &self.models
    }

    /// The decision configuration.
    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }
}
