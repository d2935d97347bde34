use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tiledet::lowlevel::{iou, suppress_with_mode};
use tiledet::{suppress, BoundingBox, NmsMode};

fn random_boxes(rng: &mut StdRng, count: usize) -> Vec<BoundingBox> {
    (0..count)
        .map(|_| {
            let x1: f32 = rng.random_range(0.0..0.8);
            let y1: f32 = rng.random_range(0.0..0.8);
            let w: f32 = rng.random_range(0.01..0.2);
            let h: f32 = rng.random_range(0.01..0.2);
            // Coarse scores so equal-confidence ties actually occur.
            let confidence = rng.random_range(3..10) as f32 / 10.0;
            let class_index = rng.random_range(0..3);
            BoundingBox::from_corners(x1, y1, x1 + w, y1 + h, confidence, class_index, "1")
        })
        .collect()
}

#[test]
fn suppression_is_idempotent() {
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..50 {
        let boxes = random_boxes(&mut rng, 60);
        for mode in [NmsMode::ClassAgnostic, NmsMode::PerClass] {
            let once = suppress_with_mode(&boxes, 0.5, mode);
            let twice = suppress_with_mode(&once, 0.5, mode);
            assert_eq!(once, twice);
        }
    }
}

#[test]
fn suppression_is_deterministic() {
    let mut rng = StdRng::seed_from_u64(11);
    let boxes = random_boxes(&mut rng, 200);
    let first = suppress(&boxes, 0.4);
    for _ in 0..5 {
        assert_eq!(suppress(&boxes, 0.4), first);
    }
}

#[test]
fn survivors_do_not_overlap_above_threshold() {
    let mut rng = StdRng::seed_from_u64(23);
    let boxes = random_boxes(&mut rng, 150);
    let kept = suppress(&boxes, 0.3);
    for (i, a) in kept.iter().enumerate() {
        for b in kept.iter().skip(i + 1) {
            assert!(iou(a, b) < 0.3);
        }
    }
    for pair in kept.windows(2) {
        assert!(pair[0].confidence >= pair[1].confidence);
    }
}

#[test]
fn iou_equal_to_threshold_suppresses() {
    // Second box covers half of the first: IoU = 0.125 / 0.25 = 0.5 exactly.
    let a = BoundingBox::from_corners(0.0, 0.0, 0.5, 0.5, 0.9, 0, "1");
    let b = BoundingBox::from_corners(0.0, 0.0, 0.5, 0.25, 0.8, 0, "1");
    assert_eq!(iou(&a, &b), 0.5);
    let kept = suppress(&[b, a.clone()], 0.5);
    assert_eq!(kept, vec![a]);
}

#[test]
fn iou_below_threshold_keeps_both() {
    let a = BoundingBox::from_corners(0.0, 0.0, 0.5, 0.5, 0.9, 0, "1");
    let b = BoundingBox::from_corners(0.0, 0.0, 0.5, 0.125, 0.8, 0, "1");
    assert!(iou(&a, &b) < 0.5);
    let kept = suppress(&[a, b], 0.5);
    assert_eq!(kept.len(), 2);
}

#[test]
fn equal_confidence_keeps_earliest_input() {
    let first = BoundingBox::from_corners(0.1, 0.1, 0.3, 0.3, 0.7, 0, "first");
    let second = BoundingBox::from_corners(0.1, 0.1, 0.3, 0.3, 0.7, 0, "second");
    let kept = suppress(&[first.clone(), second.clone()], 0.5);
    assert_eq!(kept, vec![first.clone()]);
    let kept = suppress(&[second.clone(), first], 0.5);
    assert_eq!(kept, vec![second]);
}

#[test]
fn degenerate_boxes_never_suppress() {
    let point = BoundingBox::from_corners(0.2, 0.2, 0.2, 0.2, 0.9, 0, "1");
    let line = BoundingBox::from_corners(0.2, 0.2, 0.2, 0.6, 0.8, 0, "1");
    let kept = suppress(&[point, line], 0.1);
    assert_eq!(kept.len(), 2);
}

#[test]
fn output_is_a_subset_of_input() {
    let mut rng = StdRng::seed_from_u64(3);
    let boxes = random_boxes(&mut rng, 80);
    for kept in suppress(&boxes, 0.5) {
        assert!(boxes.contains(&kept));
    }
}

#[test]
fn degenerate_box_never_suppresses_at_zero_threshold() {
    let point = BoundingBox::from_corners(0.2, 0.2, 0.2, 0.2, 0.9, 0, "1");
    let real = BoundingBox::from_corners(0.6, 0.6, 0.8, 0.8, 0.8, 0, "1");
    let kept = suppress(&[point, real], 0.0);
    assert_eq!(kept.len(), 2);
}
