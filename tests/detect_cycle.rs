//! End-to-end cycles through the monitor: model-backed decode path,
//! simulated fallback, and failure isolation.

use image::RgbImage;

use traffic_tally::{
    DetectError, Detection, DetectionSource, InferenceModel, InputTensor, ModelAdapter,
    ModelBackedSource, ModelLoader, Monitor, MonitorConfig, RawOutputs, VehicleCategory,
};

/// Model producing a fixed SSD-style output for every frame.
struct FixedModel {
    outputs: RawOutputs,
}

impl InferenceModel for FixedModel {
    fn name(&self) -> &'static str {
        "fixed"
    }

    fn predict(&self, input: &InputTensor) -> Result<RawOutputs, DetectError> {
        assert_eq!(input.shape(), [1, 320, 320, 3]);
        Ok(self.outputs.clone())
    }
}

struct FixedLoader {
    outputs: RawOutputs,
}

impl ModelLoader for FixedLoader {
    fn load(&self) -> Result<Box<dyn InferenceModel>, DetectError> {
        Ok(Box::new(FixedModel {
            outputs: self.outputs.clone(),
        }))
    }
}

struct FailingSource;

impl DetectionSource for FailingSource {
    fn name(&self) -> &'static str {
        "failing"
    }

    fn is_real(&self) -> bool {
        true
    }

    fn detect(&mut self, _image: &RgbImage) -> Result<Vec<Detection>, DetectError> {
        Err(DetectError::Decode("truncated output tensor".to_string()))
    }
}

fn model_backed_monitor(outputs: RawOutputs) -> Monitor {
    let mut adapter = ModelAdapter::new();
    adapter.initialize(&FixedLoader { outputs });
    assert!(adapter.is_ready());
    Monitor::with_source(Box::new(ModelBackedSource::new(adapter)), 100)
}

#[test]
fn model_backed_cycle_decodes_and_records() {
    // Three rows: a confident car, a sub-threshold bus, a person.
    let outputs = RawOutputs {
        boxes: vec![
            0.1, 0.2, 0.5, 0.6, //
            0.0, 0.0, 0.5, 0.5, //
            0.2, 0.2, 0.8, 0.8,
        ],
        classes: vec![2.0, 5.0, 0.0],
        scores: vec![0.9, 0.2, 0.99],
        valid_count: 3,
    };
    let mut monitor = model_backed_monitor(outputs);
    assert!(monitor.is_real_model_active());

    let frame = RgbImage::new(640, 480);
    let detections = monitor.detect(&frame).expect("detect cycle");

    assert_eq!(detections.len(), 1);
    assert_eq!(detections[0].category, VehicleCategory::Car);
    let bbox = detections[0].bbox;
    assert!((bbox.x - 64.0).abs() < 1e-3);
    assert!((bbox.y - 32.0).abs() < 1e-3);
    assert!((bbox.width - 128.0).abs() < 1e-3);
    assert!((bbox.height - 128.0).abs() < 1e-3);

    let snapshot = monitor.snapshot();
    assert_eq!(snapshot.car, 1);
    assert_eq!(snapshot.total, 1);
    assert_eq!(monitor.history(None).len(), 1);
}

#[test]
fn repeated_cycles_accumulate() {
    let outputs = RawOutputs {
        boxes: vec![0.1, 0.1, 0.4, 0.4],
        classes: vec![7.0], // truck
        scores: vec![0.8],
        valid_count: 1,
    };
    let mut monitor = model_backed_monitor(outputs);
    let frame = RgbImage::new(320, 320);

    for _ in 0..4 {
        monitor.detect(&frame).expect("detect cycle");
    }

    let snapshot = monitor.snapshot();
    assert_eq!(snapshot.truck, 4);
    assert_eq!(snapshot.total, 4);
    assert_eq!(snapshot.total, snapshot.category_sum());
}

#[test]
fn failed_cycle_leaves_counts_and_history_untouched() {
    let mut monitor = Monitor::with_source(Box::new(FailingSource), 100);
    let frame = RgbImage::new(320, 320);

    let err = monitor.detect(&frame).unwrap_err();
    assert!(matches!(err, DetectError::Decode(_)));

    assert_eq!(monitor.snapshot().total, 0);
    assert!(monitor.history(None).is_empty());
}

#[test]
fn monitor_without_model_falls_back_to_simulation() {
    let cfg = MonitorConfig {
        simulation_seed: Some(11),
        ..MonitorConfig::default()
    };
    let mut monitor = Monitor::open(&cfg);
    assert!(!monitor.is_real_model_active());

    let frame = RgbImage::new(320, 320);
    for _ in 0..50 {
        monitor.detect(&frame).expect("simulated cycle");
        let snapshot = monitor.snapshot();
        assert_eq!(snapshot.total, snapshot.category_sum());
    }
    assert_eq!(monitor.snapshot().total as usize, monitor.history(None).len());
}

#[test]
fn reset_clears_a_running_session() {
    let cfg = MonitorConfig {
        simulation_seed: Some(3),
        ..MonitorConfig::default()
    };
    let mut monitor = Monitor::open(&cfg);
    let frame = RgbImage::new(320, 320);
    for _ in 0..20 {
        monitor.detect(&frame).expect("simulated cycle");
    }

    monitor.reset();
    assert_eq!(monitor.snapshot().total, 0);
    assert!(monitor.history(None).is_empty());
}
