#[allow(dead_code)]
mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use ndarray::{Array2, Array3};

use starshrink_core::composite::composite;
use starshrink_core::erosion::{erode_selective, precondition, ErosionMode};
use starshrink_core::error::StarShrinkError;
use starshrink_core::image::{ImageBuffer, Mask};
use starshrink_core::io::image_io::OutputFormat;
use starshrink_core::pipeline::{
    process_file, process_file_reported, reduce_image, reduce_stars, reduce_stars_reported,
    OutputConfig, PipelineConfig, PipelineStage, ProgressReporter,
};

use common::{build_mono_fits, make_noise_u8, make_square_image, make_star_field, write_file};

// ---------------------------------------------------------------------------
// Erosion engine
// ---------------------------------------------------------------------------

#[test]
fn test_erode_selective_per_channel() {
    let mut data = Array3::<u8>::zeros((9, 9, 3));
    data[[4, 4, 0]] = 255;
    for r in 2..7 {
        for c in 2..7 {
            data[[r, c, 1]] = 200;
        }
    }
    let img = ImageBuffer::new(data).unwrap();
    let out = erode_selective(&img, 3, 1, ErosionMode::ErodeOnly);
    assert_eq!(out.data[[4, 4, 0]], 0);
    assert_eq!(out.data[[4, 4, 1]], 200);
    assert_eq!(out.data[[2, 2, 1]], 0);
    assert!(out.channel(2).iter().all(|&v| v == 0));
}

#[test]
fn test_opening_mode_restores_large_features() {
    let mut data = Array2::<u8>::zeros((15, 15));
    for r in 3..10 {
        for c in 3..10 {
            data[[r, c]] = 220;
        }
    }
    let img = ImageBuffer::from_mono(data);
    let eroded = erode_selective(&img, 3, 1, ErosionMode::ErodeOnly);
    let opened = erode_selective(&img, 3, 1, ErosionMode::Opening);
    assert_eq!(eroded.data[[3, 3, 0]], 0);
    assert_eq!(opened.data[[3, 3, 0]], 220);
    assert!(opened.data.iter().zip(img.data.iter()).all(|(o, i)| o <= i));
}

#[test]
fn test_erosion_more_iterations_never_brighter() {
    let img = ImageBuffer::from_mono(make_noise_u8(30, 30, 4));
    let one = erode_selective(&img, 5, 1, ErosionMode::ErodeOnly);
    let two = erode_selective(&img, 5, 2, ErosionMode::ErodeOnly);
    assert!(two.data.iter().zip(one.data.iter()).all(|(b, a)| b <= a));
}

#[test]
fn test_precondition_removes_specks() {
    let mut data = Array2::<u8>::from_elem((12, 12), 10);
    data[[5, 5]] = 250;
    let out = precondition(&ImageBuffer::from_mono(data), 5);
    assert!(out.data.iter().all(|&v| v == 10));
}

#[test]
fn test_erosion_mode_display() {
    assert_eq!(format!("{}", ErosionMode::ErodeOnly), "Erode only");
    assert_eq!(format!("{}", ErosionMode::Opening), "Opening");
}

// ---------------------------------------------------------------------------
// Compositor
// ---------------------------------------------------------------------------

#[test]
fn test_composite_blend_is_convex() {
    let original = ImageBuffer::from_mono(make_noise_u8(20, 20, 1));
    let eroded = ImageBuffer::from_mono(make_noise_u8(20, 20, 2));
    let weights = Array2::from_shape_fn((20, 20), |(r, c)| ((r * 20 + c) % 11) as f32 / 10.0);
    let blended = composite(&original, &eroded, &Mask::new(weights)).unwrap();

    for ((&f, &i), &e) in blended
        .data
        .iter()
        .zip(original.data.iter())
        .zip(eroded.data.iter())
    {
        let lo = i.min(e) as f32;
        let hi = i.max(e) as f32;
        assert!(f >= lo && f <= hi, "{f} outside [{i}, {e}]");
    }
}

#[test]
fn test_composite_equal_inputs_are_exact() {
    let values = Array2::from_shape_fn((16, 16), |(r, c)| (r * 16 + c) as u8);
    let original = ImageBuffer::from_mono(values.clone());
    let eroded = ImageBuffer::from_mono(values);
    for step in 0..=100 {
        let m = step as f32 / 100.0;
        let blended =
            composite(&original, &eroded, &Mask::new(Array2::from_elem((16, 16), m))).unwrap();
        for (&f, &i) in blended.data.iter().zip(original.data.iter()) {
            assert_eq!(f, i as f32, "weight {m}");
        }
    }
}

#[test]
fn test_composite_extreme_weights() {
    let original = ImageBuffer::from_mono(Array2::from_elem((2, 2), 200u8));
    let eroded = ImageBuffer::from_mono(Array2::from_elem((2, 2), 40u8));
    let weights = Array2::from_shape_vec((2, 2), vec![0.0, 1.0, 0.5, 0.25]).unwrap();
    let blended = composite(&original, &eroded, &Mask::new(weights)).unwrap();
    assert_eq!(blended.data[[0, 0, 0]], 200.0);
    assert_eq!(blended.data[[0, 1, 0]], 40.0);
    assert_eq!(blended.data[[1, 0, 0]], 120.0);
    assert_eq!(blended.data[[1, 1, 0]], 160.0);
}

#[test]
fn test_composite_broadcasts_mask_over_channels() {
    let original = ImageBuffer::new(Array3::from_elem((3, 3, 3), 100u8)).unwrap();
    let eroded = ImageBuffer::new(Array3::zeros((3, 3, 3))).unwrap();
    let blended = composite(&original, &eroded, &Mask::new(Array2::from_elem((3, 3), 0.5))).unwrap();
    assert!(blended.data.iter().all(|&v| v == 50.0));
}

#[test]
fn test_composite_shape_mismatch() {
    let original = ImageBuffer::from_mono(Array2::zeros((4, 4)));
    let eroded = ImageBuffer::from_mono(Array2::zeros((4, 5)));
    let mask = Mask::new(Array2::zeros((4, 4)));
    let err = composite(&original, &eroded, &mask).unwrap_err();
    assert!(matches!(err, StarShrinkError::ShapeMismatch { .. }));

    let bad_mask = Mask::new(Array2::zeros((3, 4)));
    let err = composite(&original, &original, &bad_mask).unwrap_err();
    assert!(matches!(err, StarShrinkError::ShapeMismatch { .. }));
}

// ---------------------------------------------------------------------------
// Full chain
// ---------------------------------------------------------------------------

#[test]
fn test_uniform_image_passes_through() {
    let raw = Array2::<f32>::from_elem((24, 24), 7.0).into_dyn();
    let result = reduce_stars(&raw, &PipelineConfig::default()).unwrap();
    assert!(result.mask.is_empty());
    let expected = result.normalized.data.mapv(|v| v as f32);
    assert_eq!(result.blended.data, expected);
}

#[test]
fn test_single_square_end_to_end() {
    let raw = make_square_image(100, 100, 5, 0.0, 255.0).into_dyn();
    let result = reduce_stars(&raw, &PipelineConfig::default()).unwrap();

    // Square occupies rows and columns 47..52, centered on (49, 49).
    // Normalization is the identity on a 0..255 input.
    assert_eq!(result.normalized.data[[49, 49, 0]], 255);
    assert_eq!(result.normalized.data[[0, 0, 0]], 0);

    // Mask: blob over the square, zero elsewhere.
    assert_eq!(result.mask.data[[49, 49]], 1.0);
    assert_eq!(result.mask.data[[5, 5]], 0.0);
    assert!(result.mask.data[[49, 56]] > 0.0 && result.mask.data[[49, 56]] < 1.0);

    // A 5x5 element fits the 5x5 square only at its center.
    let survivors = result.eroded.data.iter().filter(|&&v| v > 0).count();
    assert_eq!(survivors, 1);
    assert_eq!(result.eroded.data[[49, 49, 0]], 255);

    // The square is pulled down to background apart from the core.
    let mut dimmed = 0;
    for r in 47..52 {
        for c in 47..52 {
            let f = result.blended.data[[r, c, 0]];
            assert!(f <= 255.0);
            if f < 1.0 {
                dimmed += 1;
            }
        }
    }
    assert_eq!(dimmed, 24);
    // Background untouched.
    assert_eq!(result.blended.data[[10, 10, 0]], 0.0);
}

#[test]
fn test_star_field_is_dimmed() {
    let raw = make_star_field(64, 64).into_dyn();
    let result = reduce_stars(&raw, &PipelineConfig::default()).unwrap();
    let working: f32 = result.normalized.data.iter().map(|&v| v as f32).sum();
    let blended: f32 = result.blended.data.iter().sum();
    assert!(blended < working);
    assert!(result.blended.data.iter().all(|&v| (0.0..=255.0).contains(&v)));
}

#[test]
fn test_pre_pass_feeds_mask_and_erosion() {
    let raw = make_star_field(48, 48).into_dyn();
    let config = PipelineConfig {
        pre_erosion_pass: true,
        ..PipelineConfig::default()
    };
    let result = reduce_stars(&raw, &config).unwrap();
    let pre = result.preconditioned.as_ref().unwrap();
    assert_eq!(result.working(), pre);

    let direct = reduce_image(pre.clone(), &PipelineConfig::default()).unwrap();
    assert_eq!(direct.mask, result.mask);
    assert_eq!(direct.blended, result.blended);
}

#[test]
fn test_invalid_config_is_rejected_before_work() {
    let raw = make_star_field(16, 16).into_dyn();
    let config = PipelineConfig {
        kernel_size: 4,
        ..PipelineConfig::default()
    };
    let err = reduce_stars(&raw, &config).unwrap_err();
    assert!(matches!(err, StarShrinkError::InvalidConfig(_)));
}

struct RecordingReporter {
    stages: Mutex<Vec<PipelineStage>>,
    finished: AtomicUsize,
}

impl ProgressReporter for RecordingReporter {
    fn begin_stage(&self, stage: PipelineStage, _total_items: Option<usize>) {
        self.stages.lock().unwrap().push(stage);
    }

    fn finish_stage(&self) {
        self.finished.fetch_add(1, Ordering::Relaxed);
    }
}

#[test]
fn test_reporter_sees_stages_in_order() {
    let reporter = RecordingReporter {
        stages: Mutex::new(Vec::new()),
        finished: AtomicUsize::new(0),
    };
    let raw = make_star_field(16, 16).into_dyn();
    reduce_stars_reported(&raw, &PipelineConfig::default(), &reporter).unwrap();
    let stages = reporter.stages.lock().unwrap().clone();
    assert_eq!(
        stages,
        vec![
            PipelineStage::Normalizing,
            PipelineStage::MaskAndErode,
            PipelineStage::Compositing
        ]
    );
    assert_eq!(reporter.finished.load(Ordering::Relaxed), 3);
}

// ---------------------------------------------------------------------------
// File processing
// ---------------------------------------------------------------------------

#[test]
fn test_process_file_writes_blended_png() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_file(dir.path(), "m31.fits", &build_mono_fits(&make_star_field(32, 40)));
    let out_dir = dir.path().join("out");

    let output = process_file(&input, &out_dir, &PipelineConfig::default(), &OutputConfig::default())
        .unwrap();
    assert_eq!(output, out_dir.join("m31_processed.png"));

    let img = image::open(&output).unwrap();
    assert_eq!((img.width(), img.height()), (40, 32));
    assert_eq!(std::fs::read_dir(&out_dir).unwrap().count(), 1);
}

#[test]
fn test_process_file_intermediates_and_tiff() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_file(dir.path(), "ngc.fit", &build_mono_fits(&make_star_field(24, 24)));
    let pipeline = PipelineConfig {
        pre_erosion_pass: true,
        ..PipelineConfig::default()
    };
    let output = OutputConfig {
        format: OutputFormat::Tiff,
        save_intermediates: true,
        ..OutputConfig::default()
    };

    let reporter = RecordingReporter {
        stages: Mutex::new(Vec::new()),
        finished: AtomicUsize::new(0),
    };
    let path = process_file_reported(&input, dir.path(), &pipeline, &output, &reporter).unwrap();
    assert_eq!(path, dir.path().join("ngc_processed.tiff"));
    for suffix in ["_original", "_preconditioned", "_mask", "_eroded", "_processed"] {
        assert!(dir.path().join(format!("ngc{suffix}.tiff")).exists(), "{suffix}");
    }
    let stages = reporter.stages.lock().unwrap().clone();
    assert_eq!(stages.first(), Some(&PipelineStage::Reading));
    assert_eq!(stages.last(), Some(&PipelineStage::Writing));
}

#[test]
fn test_process_file_failure_leaves_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_file(dir.path(), "junk.fits", b"SIMPLE nonsense");
    let out_dir = dir.path().join("out");
    let result = process_file(&input, &out_dir, &PipelineConfig::default(), &OutputConfig::default());
    assert!(result.is_err());
    assert!(!out_dir.exists());
}
