use std::sync::mpsc;
use std::time::Duration;

use image::{Rgb, RgbImage};

use roadscan::detect::{
    BackendRegistry, ConfidenceThreshold, DetectionEngine, EngineSettings, LabelScore,
    RawCandidate, StubBackend, SuppressionConfig,
};
use roadscan::geometry::{
    compute_letterbox, map_to_image_coordinates, BoxConvention, Point, Rect, Size,
};
use roadscan::history::{DetectionRecord, HistoryStore, InMemoryHistoryStore};
use roadscan::render::draw_detections;
use roadscan::report::report_message;
use roadscan::{filter_detections, DefectClass};

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-6
}

fn road_image() -> RgbImage {
    RgbImage::from_pixel(320, 180, Rgb([70, 70, 70]))
}

#[test]
fn full_hd_frame_letterboxes_into_640_tile() {
    let geometry = compute_letterbox(Size::new(1920.0, 1080.0), 640.0).unwrap();
    assert!(approx(geometry.scale, 1.0 / 3.0));
    assert!(approx(geometry.offset_x, 0.0));
    assert!(approx(geometry.offset_y, 140.0));

    let scaled = geometry.scaled_size();
    assert!(approx(scaled.width, 640.0));
    assert!(approx(scaled.height, 360.0));
}

#[test]
fn center_box_maps_to_top_left_pixels() {
    let mapped = map_to_image_coordinates(
        Rect::new(0.5, 0.5, 0.1, 0.1),
        Size::new(1920.0, 1080.0),
        Point::default(),
        BoxConvention::Center,
    )
    .unwrap();
    assert!(approx(mapped.x, 864.0));
    assert!(approx(mapped.y, 486.0));
    assert!(approx(mapped.width, 192.0));
    assert!(approx(mapped.height, 108.0));
}

#[test]
fn threshold_is_inclusive_and_order_is_stable() {
    let bbox = Rect::new(0.1, 0.1, 0.2, 0.2);
    let candidates: Vec<RawCandidate> = [("D00", 0.9), ("D01", 0.1), ("D20", 0.5), ("D40", 0.39), ("D11", 0.4)]
        .iter()
        .map(|(label, conf)| RawCandidate::labeled(vec![LabelScore::new(*label, *conf)], bbox))
        .collect();

    let kept = filter_detections(&candidates, ConfidenceThreshold::new(0.4).unwrap());
    let classes: Vec<DefectClass> = kept.iter().map(|d| d.class_name).collect();
    assert_eq!(
        classes,
        vec![DefectClass::LongitudinalCrack, DefectClass::MarkingBlur, DefectClass::Pothole]
    );
    assert!(filter_detections(&[], ConfidenceThreshold::default()).is_empty());
}

#[test]
fn engine_maps_detections_back_to_image_space() {
    let candidates = vec![
        RawCandidate::labeled(
            vec![LabelScore::new("D40", 0.8), LabelScore::new("D00", 0.1)],
            Rect::new(0.25, 0.25, 0.5, 0.5),
        ),
        RawCandidate::class_scores(
            vec![0.05, 0.0, 0.1, 0.7, 0.0, 0.0],
            Rect::new(0.5, 0.5, 0.25, 0.25),
        ),
        RawCandidate::labeled(vec![LabelScore::new("D20", 0.2)], Rect::new(0.0, 0.3, 0.1, 0.1)),
    ];
    let engine = DetectionEngine::new(
        StubBackend::new(64).with_candidates(candidates),
        EngineSettings::default(),
    )
    .unwrap();

    let report = engine.detect(&road_image());
    assert_eq!(report.detections.len(), 2);

    // 320x180 into 64: scale 0.2, 14px bars above and below.
    let mapped = report.image_space();
    assert_eq!(mapped[0].class_name, DefectClass::RoadRepair);
    let b = mapped[0].bounding_box;
    assert!(approx(b.x, 80.0));
    assert!(approx(b.y, 10.0));
    assert!(approx(b.width, 160.0));
    assert!(approx(b.height, 160.0));

    assert_eq!(mapped[1].class_name, DefectClass::Pothole);
    let b = mapped[1].bounding_box;
    assert!(approx(b.x, 120.0));
    assert!(approx(b.y, 50.0));
    assert!(approx(b.width, 80.0));
    assert!(approx(b.height, 80.0));
}

#[test]
fn suppression_is_a_toggle() {
    let overlapping = vec![
        RawCandidate::labeled(vec![LabelScore::new("D10", 0.6)], Rect::new(0.2, 0.2, 0.3, 0.3)),
        RawCandidate::labeled(vec![LabelScore::new("D10", 0.9)], Rect::new(0.21, 0.2, 0.3, 0.3)),
    ];

    let mut registry = BackendRegistry::new();
    registry.register(StubBackend::new(64).with_candidates(overlapping));

    let off = DetectionEngine::from_registry(&registry, EngineSettings::default()).unwrap();
    assert_eq!(off.detect(&road_image()).detections.len(), 2);

    let settings = EngineSettings {
        suppression: SuppressionConfig {
            enabled: true,
            ..SuppressionConfig::default()
        },
        ..EngineSettings::default()
    };
    let on = DetectionEngine::from_registry(&registry, settings).unwrap();
    let report = on.detect(&road_image());
    assert_eq!(report.detections.len(), 1);
    assert_eq!(report.detections[0].confidence, 0.9);
}

#[test]
fn failing_backend_completes_with_empty_result() {
    let engine =
        DetectionEngine::new(StubBackend::failing(64, "no model"), EngineSettings::default()).unwrap();
    let (tx, rx) = mpsc::channel();
    engine.detect_with_callback(road_image(), move |report| {
        tx.send(report.detections.len()).unwrap();
    });
    assert_eq!(rx.recv_timeout(Duration::from_secs(10)).unwrap(), 0);
}

#[test]
fn session_flows_into_history_and_report() {
    let engine = DetectionEngine::new(
        StubBackend::new(64).with_candidates(vec![RawCandidate::labeled(
            vec![LabelScore::new("D11", 0.93)],
            Rect::new(0.4, 0.4, 0.1, 0.1),
        )]),
        EngineSettings::default(),
    )
    .unwrap();
    let report = engine.spawn_detect(road_image()).recv_timeout(Duration::from_secs(10)).unwrap();

    let record = DetectionRecord::new(vec![1, 2, 3], report.image_space(), None);
    let text = report_message(&record);
    assert!(text.contains("1. D11 - 93% confidence"));
    assert!(text.contains("Pothole (D11): 1"));

    let mut store = InMemoryHistoryStore::new();
    store.save(record.clone()).unwrap();
    let restored = InMemoryHistoryStore::from_encoded(&store.encoded().unwrap());
    assert_eq!(restored.records_filtered_by(DefectClass::Pothole), vec![record]);
}

#[test]
fn overlay_marks_detections_in_class_color() {
    let engine = DetectionEngine::new(
        StubBackend::new(64).with_candidates(vec![RawCandidate::labeled(
            vec![LabelScore::new("D40", 0.8)],
            Rect::new(0.25, 0.25, 0.5, 0.5),
        )]),
        EngineSettings::default(),
    )
    .unwrap();
    let mut frame = road_image();
    let detections = engine.detect(&frame).image_space();

    // Box lands at (80, 10) 160x160; strokes are drawn inward.
    assert_eq!(draw_detections(&mut frame, &detections), 1);
    let color = Rgb(DefectClass::RoadRepair.color());
    assert_eq!(*frame.get_pixel(81, 11), color);
    assert_eq!(*frame.get_pixel(238, 100), color);
    assert_eq!(*frame.get_pixel(160, 168), color);
    assert_eq!(*frame.get_pixel(160, 175), Rgb([70, 70, 70]));
    assert_eq!(*frame.get_pixel(160, 100), Rgb([70, 70, 70]));
}
