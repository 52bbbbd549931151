use std::collections::HashSet;
use std::path::PathBuf;

use video2yolo::{
    balance_report, from_normalized, split, to_normalized, verify_no_leakage, AssignmentRule,
    Category, DatasetError, Feature, GroupPolicy, PixelBox, Split, SplitAssignment, SplitMode,
    SplitRatios, VideoRecord,
};

fn record(folder: &str, camera: &str, frames: usize) -> VideoRecord {
    VideoRecord {
        category: Category::Handgun,
        folder: folder.to_string(),
        frames_dir: PathBuf::from(folder).join("frames"),
        image_files: (0..frames).map(|i| format!("frame_{:04}.jpg", i)).collect(),
        label_files: (0..frames).map(|i| format!("frame_{:04}.txt", i)).collect(),
        subject: "S1".to_string(),
        brightness: "Light".to_string(),
        camera: camera.to_string(),
        place: "P1".to_string(),
    }
}

fn camera_group(camera: &str, count: usize) -> Vec<VideoRecord> {
    (0..count)
        .map(|i| record(&format!("V{:03}_{}_P1_S1_Light", i, camera), camera, 3))
        .collect()
}

fn count_camera(records: &[VideoRecord], camera: &str) -> usize {
    records.iter().filter(|r| r.camera == camera).count()
}

#[test]
fn test_ratio_split_per_group_sizes() {
    let mut records = camera_group("C1", 10);
    records.extend(camera_group("C2", 20));
    let mode = SplitMode::Ratios(SplitRatios::new(0.7, 0.2, 0.1).unwrap());

    let outcome = split(records, &mode, Feature::Camera, 42);
    let a = &outcome.assignment;

    assert!(outcome.gaps.is_empty());
    assert_eq!(
        (count_camera(&a.train, "C1"), count_camera(&a.val, "C1"), count_camera(&a.test, "C1")),
        (7, 2, 1)
    );
    assert_eq!(
        (count_camera(&a.train, "C2"), count_camera(&a.val, "C2"), count_camera(&a.test, "C2")),
        (14, 4, 2)
    );
}

#[test]
fn test_ratio_split_keeps_every_record_once() {
    for seed in 0..20u64 {
        let mut records = camera_group("C1", 7);
        records.extend(camera_group("C2", 13));
        records.extend(camera_group("C3", 1));
        let input: HashSet<String> = records.iter().map(|r| r.folder.clone()).collect();
        let mode = SplitMode::Ratios(SplitRatios::new(0.6, 0.3, 0.1).unwrap());

        let outcome = split(records, &mode, Feature::Camera, seed);
        let a = &outcome.assignment;

        assert_eq!(a.len(), input.len());
        let output: HashSet<String> = a.iter().map(|(_, r)| r.folder.clone()).collect();
        assert_eq!(output.len(), a.len(), "duplicate record with seed {}", seed);
        assert_eq!(output, input);
        assert!(verify_no_leakage(a).is_ok());
    }
}

#[test]
fn test_group_proportions_match_floor_formula() {
    let ratios = SplitRatios::new(0.55, 0.25, 0.2).unwrap();
    for n in 0..40usize {
        let outcome = split(camera_group("C1", n), &SplitMode::Ratios(ratios), Feature::Camera, 7);
        let a = &outcome.assignment;
        let train = (n as f64 * 0.55).floor() as usize;
        let val = (n as f64 * 0.25).floor() as usize;
        assert_eq!(a.train.len(), train, "n = {}", n);
        assert_eq!(a.val.len(), val, "n = {}", n);
        assert_eq!(a.test.len(), n - train - val, "n = {}", n);
    }
}

#[test]
fn test_split_is_deterministic_for_seed() {
    let mode = SplitMode::Ratios(SplitRatios::new(0.5, 0.25, 0.25).unwrap());
    let first = split(camera_group("C1", 12), &mode, Feature::Camera, 3);
    let second = split(camera_group("C1", 12), &mode, Feature::Camera, 3);
    assert_eq!(first.assignment, second.assignment);

    let other = split(camera_group("C1", 12), &mode, Feature::Camera, 4);
    assert_eq!(other.assignment.len(), first.assignment.len());
}

#[test]
fn test_policy_halves_c1_between_val_and_test() {
    let policy = GroupPolicy::default_for(Feature::Camera).unwrap();
    let outcome = split(camera_group("C1", 10), &SplitMode::Policy(policy), Feature::Camera, 42);
    let a = &outcome.assignment;

    assert_eq!(a.train.len(), 0);
    assert_eq!(a.val.len(), 5);
    assert_eq!(a.test.len(), 5);
    assert!(outcome.gaps.is_empty());
}

#[test]
fn test_policy_sends_c2_to_train() {
    let mut records = camera_group("C2", 6);
    records.extend(camera_group("C1", 4));
    let policy = GroupPolicy::default_for(Feature::Camera).unwrap();
    let outcome = split(records, &SplitMode::Policy(policy), Feature::Camera, 42);
    let a = &outcome.assignment;

    assert_eq!(a.train.len(), 6);
    assert!(a.train.iter().all(|r| r.camera == "C2"));
    assert_eq!((a.val.len(), a.test.len()), (2, 2));
}

#[test]
fn test_policy_drops_unmapped_group_values() {
    let mut records = camera_group("C1", 4);
    records.extend(camera_group("C9", 3));
    let policy = GroupPolicy::default_for(Feature::Camera).unwrap();

    let outcome = split(records, &SplitMode::Policy(policy), Feature::Camera, 42);

    assert_eq!(outcome.assignment.len(), 4);
    assert_eq!(outcome.dropped_records(), 3);
    assert_eq!(outcome.gaps.len(), 1);
    assert_eq!(outcome.gaps[0].group_value, "C9");
    assert_eq!(outcome.gaps[0].folders.len(), 3);
    assert!(outcome.assignment.iter().all(|(_, r)| r.camera != "C9"));
}

#[test]
fn test_policy_groups_by_other_features() {
    let mut records = camera_group("C1", 4);
    for (i, r) in records.iter_mut().enumerate() {
        r.place = if i % 2 == 0 { "P1" } else { "P2" }.to_string();
    }
    let policy = GroupPolicy::new()
        .with_rule("P1", AssignmentRule::Whole(Split::Test))
        .with_rule("P2", AssignmentRule::Whole(Split::Val));

    let outcome = split(records, &SplitMode::Policy(policy), Feature::Place, 1);
    let a = &outcome.assignment;

    assert!(a.test.iter().all(|r| r.place == "P1"));
    assert!(a.val.iter().all(|r| r.place == "P2"));
    assert_eq!((a.train.len(), a.val.len(), a.test.len()), (0, 2, 2));
}

#[test]
fn test_split_ratio_configuration_errors() {
    assert!(SplitRatios::new(0.7, 0.2, 0.1).is_ok());
    assert!(SplitRatios::new(0.7, 0.2, 0.1 + 5e-11).is_ok());
    assert!(matches!(
        SplitRatios::new(0.7, 0.2, 0.2),
        Err(DatasetError::Configuration(_))
    ));
    assert!(matches!(
        SplitMode::from_options(None, None),
        Err(DatasetError::Configuration(_))
    ));
}

#[test]
fn test_verifier_reports_leaked_folder() {
    let mut assignment = SplitAssignment::default();
    assignment.train.push(record("V001_C1_P1_S1_Light", "C1", 2));
    assignment.val.push(record("V002_C1_P1_S1_Light", "C1", 2));
    assignment.test.push(record("V001_C1_P1_S1_Light", "C1", 2));

    let violations = verify_no_leakage(&assignment).unwrap_err();
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].folder, "V001_C1_P1_S1_Light");
    assert_eq!(violations[0].first, Split::Train);
    assert_eq!(violations[0].second, Split::Test);
}

#[test]
fn test_verifier_accepts_empty_assignment() {
    assert!(verify_no_leakage(&SplitAssignment::default()).is_ok());
}

#[test]
fn test_balance_report_counts_images() {
    let mut assignment = SplitAssignment::default();
    assignment.train.push(record("a", "C1", 6));
    assignment.val.push(record("b", "C1", 3));
    assignment.test.push(record("c", "C1", 1));
    assignment.train.push(record("d", "C2", 4));
    assignment.train.push(record("e", "C3", 0));

    let report = balance_report(&assignment, Feature::Camera);

    let values: Vec<&str> = report.rows.iter().map(|r| r.value.as_str()).collect();
    assert_eq!(values, vec!["C1", "C2", "C3"]);

    let c1 = report.row("C1").unwrap();
    assert_eq!((c1.total, c1.train, c1.val, c1.test), (10, 6, 3, 1));
    assert!((c1.train_percent - 60.0).abs() < 1e-9);
    assert!((c1.train_percent + c1.val_percent + c1.test_percent - 100.0).abs() < 1e-9);

    let c2 = report.row("C2").unwrap();
    assert!((c2.train_percent - 100.0).abs() < 1e-9);

    let c3 = report.row("C3").unwrap();
    assert_eq!(c3.total, 0);
    assert_eq!((c3.train_percent, c3.val_percent, c3.test_percent), (0.0, 0.0, 0.0));

    let rendered = report.to_string();
    assert!(rendered.contains("Balancing based on camera:"));
    assert!(rendered.contains("60.00"));
}

#[test]
fn test_balance_report_by_category() {
    let mut assignment = SplitAssignment::default();
    let mut no_gun = record("n", "C1", 2);
    no_gun.category = Category::NoGun;
    no_gun.label_files.clear();
    assignment.val.push(no_gun);
    assignment.train.push(record("h", "C1", 2));

    let report = balance_report(&assignment, Feature::Category);
    assert_eq!(report.row("No_Gun").unwrap().val, 2);
    assert_eq!(report.row("Handgun").unwrap().train, 2);
}

#[test]
fn test_box_round_trip() {
    let boxes = [
        PixelBox { x_min: 10.0, y_min: 20.0, width: 30.0, height: 40.0 },
        PixelBox { x_min: 0.0, y_min: 0.0, width: 1920.0, height: 1080.0 },
        PixelBox { x_min: 123.5, y_min: 77.25, width: 0.5, height: 301.0 },
    ];
    for original in boxes {
        let normalized = to_normalized(original, 1920, 1080).unwrap();
        for v in [normalized.x_center, normalized.y_center, normalized.width, normalized.height] {
            assert!((0.0..=1.0).contains(&v));
        }
        let back = from_normalized(normalized, 1920, 1080).unwrap();
        assert!((back.x_min - original.x_min).abs() < 1e-9);
        assert!((back.y_min - original.y_min).abs() < 1e-9);
        assert!((back.width - original.width).abs() < 1e-9);
        assert!((back.height - original.height).abs() < 1e-9);
    }
}

#[test]
fn test_box_conversion_values() {
    let bbox = PixelBox { x_min: 10.0, y_min: 10.0, width: 10.0, height: 10.0 };
    let yolo = to_normalized(bbox, 100, 100).unwrap();
    assert!((yolo.x_center - 0.15).abs() < 1e-12);
    assert!((yolo.y_center - 0.15).abs() < 1e-12);
    assert!((yolo.width - 0.1).abs() < 1e-12);
    assert!((yolo.height - 0.1).abs() < 1e-12);
}

#[test]
fn test_box_conversion_rejects_zero_image_size() {
    let bbox = PixelBox { x_min: 1.0, y_min: 1.0, width: 1.0, height: 1.0 };
    assert!(matches!(
        to_normalized(bbox, 0, 100),
        Err(DatasetError::InvalidImageSize { width: 0, height: 100 })
    ));
    assert!(to_normalized(bbox, 100, 0).is_err());
}
