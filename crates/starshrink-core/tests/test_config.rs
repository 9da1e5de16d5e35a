use starshrink_core::erosion::ErosionMode;
use starshrink_core::error::StarShrinkError;
use starshrink_core::io::image_io::{OutputFormat, OutputMode};
use starshrink_core::mask::MaskParams;
use starshrink_core::normalize::FlatChannelPolicy;
use starshrink_core::pipeline::{BatchConfig, OutputConfig, PipelineConfig, PipelineStage};

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

#[test]
fn test_pipeline_defaults() {
    let c = PipelineConfig::default();
    assert_eq!(c.kernel_size, 5);
    assert_eq!(c.erosion_iterations, 1);
    assert_eq!(c.threshold_percentile, 88.0);
    assert!(!c.pre_erosion_pass);
    assert_eq!(c.erosion_mode, ErosionMode::ErodeOnly);
    assert_eq!(c.flat_channel, FlatChannelPolicy::MidGray);
    assert!(c.validate().is_ok());
}

#[test]
fn test_mask_defaults() {
    let m = MaskParams::default();
    assert_eq!(m.cleanup_kernel_size, 3);
    assert_eq!(m.halo_dilation_iterations, 2);
    assert_eq!(m.blur_kernel_size, 9);
    assert_eq!(m.blur_sigma, 1.5);
    assert_eq!(m.gain, 1.4);
}

#[test]
fn test_output_defaults() {
    let o = OutputConfig::default();
    assert_eq!(o.mode, OutputMode::Normalized);
    assert_eq!(o.format, OutputFormat::Png);
    assert_eq!(o.suffix, "_processed");
    assert!(!o.save_intermediates);
    assert_eq!(BatchConfig::default().jobs, None);
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn assert_invalid(config: PipelineConfig, needle: &str) {
    match config.validate() {
        Err(StarShrinkError::InvalidConfig(msg)) => {
            assert!(msg.contains(needle), "expected {needle:?} in {msg:?}")
        }
        other => panic!("expected InvalidConfig, got {other:?}"),
    }
}

#[test]
fn test_even_or_zero_kernels_rejected() {
    for k in [0, 2, 4] {
        assert_invalid(
            PipelineConfig {
                kernel_size: k,
                ..Default::default()
            },
            "kernel_size",
        );
    }
    assert_invalid(
        PipelineConfig {
            pre_pass_kernel_size: 6,
            ..Default::default()
        },
        "pre_pass_kernel_size",
    );
    assert_invalid(
        PipelineConfig {
            mask: MaskParams {
                blur_kernel_size: 8,
                ..Default::default()
            },
            ..Default::default()
        },
        "mask.blur_kernel_size",
    );
}

#[test]
fn test_iterations_and_percentile_bounds() {
    assert_invalid(
        PipelineConfig {
            erosion_iterations: 0,
            ..Default::default()
        },
        "erosion_iterations",
    );
    for p in [0.0, 100.0, -5.0, 120.0, f64::NAN] {
        assert_invalid(
            PipelineConfig {
                threshold_percentile: p,
                ..Default::default()
            },
            "threshold_percentile",
        );
    }
    let ok = PipelineConfig {
        threshold_percentile: 99.9,
        kernel_size: 1,
        ..Default::default()
    };
    assert!(ok.validate().is_ok());
}

#[test]
fn test_mask_sigma_and_gain_must_be_positive() {
    assert_invalid(
        PipelineConfig {
            mask: MaskParams {
                blur_sigma: 0.0,
                ..Default::default()
            },
            ..Default::default()
        },
        "blur_sigma",
    );
    assert_invalid(
        PipelineConfig {
            mask: MaskParams {
                gain: -1.0,
                ..Default::default()
            },
            ..Default::default()
        },
        "gain",
    );
}

// ---------------------------------------------------------------------------
// Serde
// ---------------------------------------------------------------------------

#[test]
fn test_partial_json_fills_defaults() {
    let c: PipelineConfig = serde_json::from_str(r#"{"kernel_size": 7}"#).unwrap();
    assert_eq!(c.kernel_size, 7);
    assert_eq!(c.threshold_percentile, 88.0);
    assert_eq!(c.mask, MaskParams::default());
}

#[test]
fn test_batch_config_from_json() {
    let json = r#"{
        "jobs": 2,
        "pipeline": { "threshold_percentile": 95.0, "erosion_mode": "Opening" },
        "output": { "format": "Tiff", "mode": "Clamped" }
    }"#;
    let c: BatchConfig = serde_json::from_str(json).unwrap();
    assert_eq!(c.jobs, Some(2));
    assert_eq!(c.pipeline.threshold_percentile, 95.0);
    assert_eq!(c.pipeline.erosion_mode, ErosionMode::Opening);
    assert_eq!(c.output.format, OutputFormat::Tiff);
    assert_eq!(c.output.mode, OutputMode::Clamped);
    assert_eq!(c.output.suffix, "_processed");
}

#[test]
fn test_config_json_roundtrip() {
    let c = BatchConfig {
        jobs: Some(3),
        ..Default::default()
    };
    let json = serde_json::to_string(&c).unwrap();
    let back: BatchConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(back, c);
}

// ---------------------------------------------------------------------------
// Display
// ---------------------------------------------------------------------------

#[test]
fn test_display_strings() {
    assert_eq!(format!("{}", OutputFormat::Png), "PNG (8-bit)");
    assert_eq!(format!("{}", OutputFormat::Tiff), "TIFF (16-bit)");
    assert_eq!(format!("{}", OutputMode::Clamped), "Clamped");
    assert_eq!(format!("{}", PipelineStage::MaskAndErode), "Masking and eroding");
    assert_eq!(format!("{}", PipelineStage::Reading), "Reading FITS");
}
