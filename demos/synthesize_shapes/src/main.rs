use argh::FromArgs;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::path::PathBuf;

use silhouette::bayes::ShapeClass;
use silhouette::image::Image;
use silhouette::imgproc::{draw, features};
use silhouette::io::{array, functional as F};

#[derive(FromArgs)]
/// Render traffic-sign silhouettes and write their Hu features, one array file per class
struct Args {
    /// directory to write the feature arrays to
    #[argh(option, short = 'o')]
    output_dir: PathBuf,

    /// number of shapes per class
    #[argh(option, short = 'n', default = "50")]
    num_samples: usize,

    /// side of the square canvas in pixels
    #[argh(option, default = "128")]
    size: usize,

    /// seed of the random poses
    #[argh(option, default = "42")]
    seed: u64,

    /// array file format: npy, txt or json
    #[argh(option, default = "String::from(\"npy\")")]
    format: String,

    /// also write the first silhouette of every class as a png
    #[argh(switch)]
    save_images: bool,
}

/// Render a dark shape on a light background with a random center, size and rotation.
fn render(
    class: ShapeClass,
    size: usize,
    rng: &mut StdRng,
) -> Result<Image<u8, 3>, Box<dyn std::error::Error>> {
    let mut img = Image::<u8, 3>::from_size_val([size, size].into(), 235)?;

    let half = size as f64 / 2.0;
    let center = (
        half + rng.random_range(-0.1..0.1) * half,
        half + rng.random_range(-0.1..0.1) * half,
    );
    let radius = rng.random_range(0.35..0.6) * half;
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

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args: Args = argh::from_env();

    if !matches!(args.format.as_str(), "npy" | "txt" | "json") {
        return Err(format!("unsupported format {}", args.format).into());
    }

    std::fs::create_dir_all(&args.output_dir)?;

    let mut rng = StdRng::seed_from_u64(args.seed);

    for class in ShapeClass::ALL {
        let mut rows = Vec::with_capacity(args.num_samples);

        for i in 0..args.num_samples {
            let rgb = render(class, args.size, &mut rng)?;
            let binary =
                features::silhouette_from_rgb(&rgb, features::SilhouetteThreshold::Otsu, true)?;

            if args.save_images && i == 0 {
                let image_path = args.output_dir.join(format!("{class}.png"));
                F::write_image_gray8(&image_path, &binary)?;
                log::info!("wrote {}", image_path.display());
            }

            rows.push(features::shape_features(&binary)?.to_vec());
        }

        let file_path = args.output_dir.join(format!("{class}s.{}", args.format));
        match args.format.as_str() {
            "npy" => array::write_array2_npy(&file_path, &rows)?,
            "txt" => array::write_array2_txt(&file_path, &rows)?,
            _ => std::fs::write(&file_path, serde_json::to_string(&rows)?)?,
        }

        println!("{class}: {} samples -> {}", rows.len(), file_path.display());
    }

    Ok(())
}

