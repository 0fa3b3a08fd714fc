//! The single upload page served at `/`.

use std::fmt::Write;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::ImageFormat;

use crate::condition::{NailCondition, PredictionResult};

/// Accuracy measured on the validation split when the model was trained.
pub const MODEL_ACCURACY: &str = "90.56%";

pub const AUTHOR: &str = "Alfiana Hidayati";

/// Route of the optional example photo shown in the sidebar.
pub const SAMPLE_IMAGE_PATH: &str = "/sample-image";

const STYLE: &str = r#"
body { font-family: Arial, sans-serif; margin: 0; display: flex; min-height: 100vh; }
aside { width: 280px; padding: 24px; background-color: #f8f4f8; }
main { flex: 1; max-width: 760px; margin: 0 auto; padding: 24px; }
.title-text { color: #2c3e50; text-align: center; margin-bottom: 20px; }
button { background-color: #007bff; color: white; border: none; border-radius: 5px; padding: 10px 20px; font-weight: bold; cursor: pointer; }
button:hover { background-color: #0056b3; }
.prediction-box { background-color: #e8f4f8; padding: 20px; border-radius: 10px; margin-top: 20px; }
.prediction-box progress { width: 100%; accent-color: #28a745; }
.preview { max-width: 300px; display: block; margin-top: 16px; }
.info { background-color: #d9ecf7; padding: 12px; border-radius: 6px; }
.error { background-color: #fbe3e4; color: #8a1f11; padding: 12px; border-radius: 6px; margin-top: 20px; }
aside img { width: 100%; border-radius: 6px; }
.caption { font-size: 0.85em; color: #666; text-align: center; }
#processing { display: none; color: #2c3e50; }
form.busy #processing { display: block; }
footer { margin-top: 40px; border-top: 1px solid #ddd; padding-top: 12px; color: #666; }
"#;

#[derive(Debug, Default)]
pub struct PageView<'a> {
    pub preview: Option<String>,
    pub result: Option<&'a PredictionResult>,
    pub error: Option<&'a str>,
    pub sample_image: bool,
}

/// Builds a `data:` URL so the upload can be shown back without storing it.
pub fn preview_data_url(bytes: &[u8]) -> Option<String> {
    let mime = match image::guess_format(bytes).ok()? {
        ImageFormat::Png => "image/png",
        ImageFormat::Jpeg => "image/jpeg",
        _ => return None,
    };
    Some(format!("data:{mime};base64,{}", STANDARD.encode(bytes)))
}

pub fn render(view: &PageView<'_>) -> String {
    let mut body = String::new();

    if let Some(preview) = &view.preview {
        let _ = write!(
            body,
            r#"<img class="preview" src="{}" alt="Uploaded nail image">"#,
            html_escape::encode_double_quoted_attribute(preview)
        );
    }

    if let Some(result) = view.result {
        let _ = write!(
            body,
            r#"<div class="prediction-box">
<h3>Prediction: <strong>{label}</strong></h3>
<progress value="{progress}" max="100">{progress}%</progress>
<p><strong>Confidence</strong>: {confidence:.2}%</p>
<p class="info">{description}</p>
</div>"#,
            label = html_escape::encode_text(result.label),
            progress = result.progress_percent(),
            confidence = result.confidence,
            description = html_escape::encode_text(result.description),
        );
    }

    if let Some(error) = view.error {
        let _ = write!(
            body,
            r#"<div class="error">{}</div>"#,
            html_escape::encode_text(error)
        );
    }

    let sample = if view.sample_image {
        format!(
            r#"<img src="{SAMPLE_IMAGE_PATH}" alt="Example upload">
<p class="caption">Example of an upload image</p>"#
        )
    } else {
        String::new()
    };

    let mut info = String::new();
    for condition in NailCondition::ALL {
        let _ = write!(
            info,
            "<li><strong>{}</strong>: {}</li>",
            html_escape::encode_text(condition.label()),
            html_escape::encode_text(condition.summary())
        );
    }

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>Nail Condition Detection</title>
<style>{STYLE}</style>
</head>
<body>
<aside>
<h2>About</h2>
<p>This application uses a <strong>VGG16</strong> model to detect nail conditions from a photo.
It is meant to help with early screening for non-communicable diseases such as anemia
(koilonychia) and diabetes (onychomycosis).</p>
<p><strong>Model accuracy</strong>: {MODEL_ACCURACY}<br>
<strong>Created by</strong>: {AUTHOR}.</p>
{sample}
</aside>
<main>
<h1 class="title-text">AI-Based Nail Disease Detection</h1>
<p>Upload a photo of a nail to find out whether it is healthy, shows koilonychia, or shows onychomycosis.</p>
<form action="/predict" method="post" enctype="multipart/form-data" onsubmit="this.classList.add('busy')">
<label for="image">Choose a nail image (JPG/PNG)</label>
<input id="image" name="image" type="file" accept=".jpg,.jpeg,.png,image/jpeg,image/png" required>
<button type="submit">Predict now</button>
<p id="processing">Processing image...</p>
</form>
{body}
<details>
<summary>Important information</summary>
<ul>
{info}<li><strong>Note</strong>: the prediction is not a medical diagnosis. Consult a doctor to be sure.</li>
</ul>
</details>
<footer>&copy; 2025 {AUTHOR}. Nail Condition Detection v{version}</footer>
</main>
</body>
</html>
"#,
        version = env!("CARGO_PKG_VERSION"),
    )
}
