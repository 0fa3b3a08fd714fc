use std::path::PathBuf;
use std::time::{Duration, Instant};

use image::{DynamicImage, Rgb, RgbImage};
use tracing::info;

use nail_condition_detector::classifier::{LoadOptions, Vgg16Classifier};
use nail_condition_detector::preprocess::preprocess;
use nail_condition_detector::task::ConditionModel;
use nail_condition_detector::utils::{ort_init, tracing_subscriber_init};

const COUNT: u32 = 30;

fn main() -> anyhow::Result<()> {
    tracing_subscriber_init();
    ort_init()?;

    let path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("models/nail_vgg16.onnx"));
    let model = Vgg16Classifier::load(&path, &LoadOptions::default())?;

    info!("{model:?}");

    let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(1280, 960, Rgb([190, 150, 140])));

    let mut avg = Duration::new(0, 0);
    for _ in 0..COUNT {
        let start = Instant::now();
        let input = preprocess(&image)?;
        let scores = model.infer(input.view())?;
        let dura = start.elapsed();
        avg += dura / COUNT;
        info!("Time: {:?}, scores: {:?}", dura, scores);
    }
    info!("Avg Time: {:?}", avg);

    Ok(())
}
