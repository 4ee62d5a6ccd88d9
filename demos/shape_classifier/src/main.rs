use argh::FromArgs;
use std::path::PathBuf;

use silhouette::bayes::{
    model::feature_vectors_from_rows, ClassifierConfig, Decision, DiscriminantKind,
    GaussianClassifier, Priors, ShapeClass, TrainingSet,
};
use silhouette::imgproc::features::{self, SilhouetteThreshold};
use silhouette::io::{array, functional as F};

#[derive(FromArgs)]
/// Train a Gaussian shape classifier from per-class feature arrays and classify
/// an image or a feature array
struct Args {
    /// feature array of the triangle class
    #[argh(option)]
    triangles: Option<PathBuf>,

    /// feature array of the circle class
    #[argh(option)]
    circles: Option<PathBuf>,

    /// feature array of the square class
    #[argh(option)]
    squares: Option<PathBuf>,

    /// json file with the classifier configuration
    #[argh(option, short = 'c')]
    config: Option<PathBuf>,

    /// use the isotropic discriminant
    #[argh(switch)]
    isotropic: bool,

    /// reject decisions whose top two posteriors differ by less than this
    #[argh(option)]
    reject: Option<f64>,

    /// weight the classes by their number of training samples
    #[argh(switch)]
    empirical_priors: bool,

    /// path to an image with a dark shape on a light background
    #[argh(option, short = 'i')]
    image_path: Option<PathBuf>,

    /// fixed gray level to segment the image, otsu when absent
    #[argh(option)]
    threshold: Option<u8>,

    /// the shape is brighter than the background
    #[argh(switch)]
    bright_shape: bool,

    /// feature array to classify, one sample per row
    #[argh(option, short = 'f')]
    features: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args: Args = argh::from_env();

    // gather the training samples
    let mut training_set = TrainingSet::new();
    for (class, path) in [
        (ShapeClass::Triangle, &args.triangles),
        (ShapeClass::Circle, &args.circles),
        (ShapeClass::Square, &args.squares),
    ] {
        let Some(path) = path else {
            continue;
        };
        let rows = array::read_array2(path)?;
        training_set.insert(class, feature_vectors_from_rows::<2>(&rows)?);
    }

    if training_set.len() < 2 {
        return Err("at least two classes are required to train".into());
    }

    // resolve the configuration, the flags override the file
    let mut config: ClassifierConfig = match &args.config {
        Some(path) => serde_json::from_str(&std::fs::read_to_string(path)?)?,
        None => ClassifierConfig::default(),
    };
    if args.isotropic {
        config.kind = DiscriminantKind::Isotropic;
    }
    if let Some(threshold) = args.reject {
        config.rejection_threshold = threshold;
    }

    let priors = if args.empirical_priors {
        Priors::Empirical
    } else {
        Priors::Uniform
    };

    let classifier = GaussianClassifier::fit(&training_set, priors, config)?;

    for (class, model) in classifier.models() {
        log::info!(
            "{class}: mean {:?}, covariance {:?}, prior {:.3}",
            model.mean(),
            model.covariance(),
            model.prior()
        );
    }

    // collect what to classify
    let mut queries = Vec::new();

    if let Some(image_path) = &args.image_path {
        let rgb = F::read_image_any_rgb8(image_path)?;
        let threshold = args
            .threshold
            .map_or(SilhouetteThreshold::Otsu, SilhouetteThreshold::Fixed);
        let binary = features::silhouette_from_rgb(&rgb, threshold, !args.bright_shape)?;
        queries.push((image_path.display().to_string(), features::shape_features(&binary)?));
    }

    if let Some(path) = &args.features {
        let rows = array::read_array2(path)?;
        for (i, x) in feature_vectors_from_rows::<2>(&rows)?.into_iter().enumerate() {
            queries.push((format!("{}[{i}]", path.display()), x));
        }
    }

    if queries.is_empty() {
        println!("nothing to classify, pass --image-path or --features");
        return Ok(());
    }

    for (name, x) in queries {
        let decision = classifier.classify(&x)?;
        let posteriors = classifier
            .posteriors(&x)?
            .iter()
            .map(|(class, p)| format!("{class}={p:.3}"))
            .collect::<Vec<_>>()
            .join(" ");

        match decision {
            Decision::Class(class) => println!("{name}: {class} ({posteriors})"),
            Decision::Rejected => println!("{name}: rejected ({posteriors})"),
        }
    }

    Ok(())
}
