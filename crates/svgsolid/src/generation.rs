use crate::deadline::Deadline;
use crate::error::Result;
use crate::export::{export, StlFormat};
use crate::geometry::ConversionId;
use crate::mesh::MeshBuilder;
use crate::pipeline::GeometryPipeline;
use crate::settings::ProfileSettings;
use serde::{Deserialize, Serialize};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{error, info, info_span};

/// Per-request knobs that are not part of the profile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GenerateOptions {
    pub format: StlFormat,
    pub timeout: Option<Duration>,
}

/// Outcome of one conversion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResult {
    pub success: bool,
    #[serde(skip)]
    pub blob: Option<Vec<u8>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Wall-clock milliseconds from parse through export.
    pub processing_time: f64,
    pub conversion_id: ConversionId,
    #[serde(default)]
    pub warnings: Vec<String>,
}

/// Convert outline markup into an STL blob. Never panics; failures are reported
/// in the result.
pub fn generate(
    markup: &str,
    settings: &ProfileSettings,
    options: GenerateOptions,
) -> GenerationResult {
    let conversion_id = ConversionId::new();
    let span = info_span!("conversion", id = %conversion_id);
    let _enter = span.enter();

    let started = Instant::now();
    let mut warnings = Vec::new();
    let outcome = convert(markup, settings, options, &conversion_id, &mut warnings);
    let processing_time = started.elapsed().as_secs_f64() * 1000.0;

    match outcome {
        Ok(blob) => {
            info!(bytes = blob.len(), processing_time, "conversion finished");
            GenerationResult {
                success: true,
                blob: Some(blob),
                error: None,
                processing_time,
                conversion_id,
                warnings,
            }
        }
        Err(err) => {
            error!(error = %err, processing_time, "conversion failed");
            GenerationResult {
                success: false,
                blob: None,
                error: Some(err.to_string()),
                processing_time,
                conversion_id,
                warnings,
            }
        }
    }
}

/// Run [`generate`] on its own worker thread so the caller is not blocked.
pub fn spawn_generate(
    markup: String,
    settings: ProfileSettings,
    options: GenerateOptions,
) -> JoinHandle<GenerationResult> {
    thread::spawn(move || generate(&markup, &settings, options))
}

fn convert(
    markup: &str,
    settings: &ProfileSettings,
    options: GenerateOptions,
    id: &ConversionId,
    warnings: &mut Vec<String>,
) -> Result<Vec<u8>> {
    let deadline = Deadline::from_timeout(options.timeout);
    let pipeline = GeometryPipeline::new(settings.clone()).with_deadline(deadline);

    let parsed = pipeline.parse(markup)?;
    let processed = pipeline.process(&parsed)?;
    warnings.extend(processed.warnings);

    let built = MeshBuilder::new(settings).build(&processed.compound, &deadline)?;
    warnings.extend(built.warnings);

    deadline.check("export")?;
    export(&built.mesh, options.format, &id.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SQUARE: &str = r#"<svg xmlns="http://www.w3.org/2000/svg">
        <rect width="20" height="20"/>
    </svg>"#;

    #[test]
    fn square_converts_to_binary_stl() {
        let result = generate(SQUARE, &ProfileSettings::default(), GenerateOptions::default());
        assert!(result.success, "{:?}", result.error);
        let blob = result.blob.expect("blob");
        let count = u32::from_le_bytes([blob[80], blob[81], blob[82], blob[83]]);
        assert_eq!(count, 12);
        assert!(result.processing_time >= 0.0);
    }

    #[test]
    fn unparseable_input_reports_error() {
        let result = generate("not svg", &ProfileSettings::default(), GenerateOptions::default());
        assert!(!result.success);
        assert!(result.blob.is_none());
        assert!(result.error.expect("error").contains("could not read"));
    }

    #[test]
    fn zero_timeout_reports_timeout() {
        let options = GenerateOptions {
            timeout: Some(Duration::ZERO),
            ..GenerateOptions::default()
        };
        let result = generate(SQUARE, &ProfileSettings::default(), options);
        assert!(!result.success);
        assert!(result.error.expect("error").contains("timed out"));
    }

    #[test]
    fn spawned_generation_runs_off_thread() {
        let options = GenerateOptions {
            format: StlFormat::Ascii,
            timeout: None,
        };
        let handle = spawn_generate(SQUARE.to_string(), ProfileSettings::default(), options);
        let result = handle.join().expect("worker");
        assert!(result.success);
        let text = String::from_utf8(result.blob.expect("blob")).expect("utf8");
        assert!(text.starts_with("solid "));
    }

    #[test]
    fn result_json_omits_blob() {
        let result = generate(SQUARE, &ProfileSettings::default(), GenerateOptions::default());
        let json = serde_json::to_string(&result).expect("serialize");
        assert!(json.contains("\"processingTime\""));
        assert!(json.contains("\"conversionId\""));
        assert!(!json.contains("blob"));
    }
}
