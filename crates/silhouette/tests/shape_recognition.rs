use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use silhouette::bayes::{
    model::feature_vectors_from_rows, ClassifierConfig, Decision, DiscriminantKind,
    GaussianClassifier, Priors, ShapeClass, TrainingSet,
};
use silhouette::image::{Image, ImageSize};
use silhouette::imgproc::{draw, features};
use silhouette::io::array;

const IMAGE_SIZE: ImageSize = ImageSize {
    width: 128,
    height: 128,
};

/// Render a dark traffic-sign shape on a light background at a random pose.
fn render(
    class: ShapeClass,
    rng: &mut StdRng,
) -> Result<Image<u8, 3>, Box<dyn std::error::Error>> {
    let mut img = Image::<u8, 3>::from_size_val(IMAGE_SIZE, 235)?;

    let center = (
        64.0 + rng.random_range(-8.0..8.0),
        64.0 + rng.random_range(-8.0..8.0),
    );
    let radius = rng.random_range(22.0..40.0);
    let rotation = rng.random_range(0.0..std::f64::consts::TAU);

    match class {
        ShapeClass::Triangle => {
            let vertices = draw::regular_polygon(center, radius, 3, rotation);
            draw::fill_polygon(&mut img, &vertices, [200, 20, 20]);
        }
        ShapeClass::Circle => draw::fill_circle(&mut img, center, radius, [20, 40, 200]),
        ShapeClass::Square => {
            let vertices = draw::regular_polygon(center, radius, 4, rotation);
            draw::fill_polygon(&mut img, &vertices, [40, 40, 40]);
        }
    }

    Ok(img)
}

fn features_of(
    class: ShapeClass,
    rng: &mut StdRng,
) -> Result<[f64; 2], Box<dyn std::error::Error>> {
    let rgb = render(class, rng)?;
    let binary = features::silhouette_from_rgb(&rgb, features::SilhouetteThreshold::Otsu, true)?;
    Ok(features::shape_features(&binary)?)
}

fn dataset(
    samples_per_class: usize,
    rng: &mut StdRng,
) -> Result<TrainingSet<ShapeClass, 2>, Box<dyn std::error::Error>> {
    let mut set = TrainingSet::new();
    for class in ShapeClass::ALL {
        let samples = (0..samples_per_class)
            .map(|_| features_of(class, rng))
            .collect::<Result<Vec<_>, _>>()?;
        set.insert(class, samples);
    }
    Ok(set)
}

fn accuracy(
    classifier: &GaussianClassifier<ShapeClass, 2>,
    test_set: &TrainingSet<ShapeClass, 2>,
) -> Result<f64, Box<dyn std::error::Error>> {
    let mut correct = 0;
    let mut total = 0;
    for (class, samples) in test_set.iter() {
        for x in samples {
            if classifier.classify(x)? == Decision::Class(*class) {
                correct += 1;
            }
            total += 1;
        }
    }
    Ok(correct as f64 / total as f64)
}

#[test]
fn hu_features_of_rendered_shapes() -> Result<(), Box<dyn std::error::Error>> {
    let mut rng = StdRng::seed_from_u64(7);

    // continuous values: disk 1/(2π), square 1/6, equilateral triangle 1/(3√3)
    let expected = [
        (ShapeClass::Triangle, 1.0 / (3.0 * 3f64.sqrt())),
        (ShapeClass::Circle, 1.0 / (2.0 * std::f64::consts::PI)),
        (ShapeClass::Square, 1.0 / 6.0),
    ];

    for (class, hu1) in expected {
        for _ in 0..5 {
            let [h1, h2] = features_of(class, &mut rng)?;
            approx::assert_abs_diff_eq!(h1, hu1, epsilon = 2e-3);
            approx::assert_abs_diff_eq!(h2, 0.0, epsilon = 1e-4);
        }
    }

    Ok(())
}

#[test]
fn recognize_synthesized_shapes() -> Result<(), Box<dyn std::error::Error>> {
    let mut rng = StdRng::seed_from_u64(2024);
    let training_set = dataset(30, &mut rng)?;
    let test_set = dataset(15, &mut rng)?;

    for kind in [DiscriminantKind::Quadratic, DiscriminantKind::Isotropic] {
        let config = ClassifierConfig {
            kind,
            rejection_threshold: 0.0,
        };
        let classifier = GaussianClassifier::fit(&training_set, Priors::Uniform, config)?;
        let accuracy = accuracy(&classifier, &test_set)?;
        assert!(accuracy >= 0.95, "{kind:?} accuracy {accuracy}");
    }

    Ok(())
}

#[test]
fn ambiguous_features_are_rejected() -> Result<(), Box<dyn std::error::Error>> {
    let mut rng = StdRng::seed_from_u64(11);
    let mut training_set = dataset(20, &mut rng)?;

    // the boundary between circles and squares, with no third class beyond it
    training_set.remove(&ShapeClass::Triangle);

    let config = ClassifierConfig {
        kind: DiscriminantKind::Quadratic,
        rejection_threshold: 0.2,
    };
    let classifier = GaussianClassifier::fit(&training_set, Priors::Uniform, config)?;

    let circle = *classifier.models()[&ShapeClass::Circle].mean();
    let square = *classifier.models()[&ShapeClass::Square].mean();
    let lerp = |t: f64| {
        [
            circle[0] + t * (square[0] - circle[0]),
            circle[1] + t * (square[1] - circle[1]),
        ]
    };

    // posterior of circle minus posterior of square along the segment between the means
    let balance = |t: f64| -> Result<f64, Box<dyn std::error::Error>> {
        let posteriors = classifier.posteriors(&lerp(t))?;
        let of = |class: ShapeClass| {
            posteriors
                .iter()
                .find(|(label, _)| *label == class)
                .map_or(0.0, |(_, p)| *p)
        };
        Ok(of(ShapeClass::Circle) - of(ShapeClass::Square))
    };

    assert!(balance(0.0)? > 0.0);
    assert!(balance(1.0)? < 0.0);

    let (mut lo, mut hi) = (0.0, 1.0);
    for _ in 0..60 {
        let mid = (lo + hi) / 2.0;
        if balance(mid)? > 0.0 {
            lo = mid;
        } else {
            hi = mid;
        }
    }

    assert!(classifier.classify(&lerp(lo))?.is_rejected());
    assert!(classifier.classify(&lerp(hi))?.is_rejected());
    assert_eq!(
        classifier.classify(&circle)?,
        Decision::Class(ShapeClass::Circle)
    );
    assert_eq!(
        classifier.classify(&square)?,
        Decision::Class(ShapeClass::Square)
    );

    Ok(())
}

#[test]
fn train_from_feature_files() -> Result<(), Box<dyn std::error::Error>> {
    let mut rng = StdRng::seed_from_u64(3);
    let training_set = dataset(10, &mut rng)?;

    let tmp_dir = tempfile::tempdir()?;
    let mut from_files = BTreeMap::new();
    for (class, samples) in training_set.iter() {
        let rows = samples.iter().map(|s| s.to_vec()).collect::<Vec<_>>();

        let file_path = tmp_dir.path().join(format!("{class}s.npy"));
        array::write_array2_npy(&file_path, &rows)?;

        let rows = array::read_array2(&file_path)?;
        from_files.insert(*class, feature_vectors_from_rows::<2>(&rows)?);
    }

    let config = ClassifierConfig::default();
    let expected = GaussianClassifier::fit(&training_set, Priors::Uniform, config)?;
    let actual = GaussianClassifier::fit(&from_files, Priors::Uniform, config)?;
    assert_eq!(actual, expected);

    Ok(())
}
