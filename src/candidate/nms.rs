//! Greedy non-maximum suppression over detection boxes.

use crate::candidate::bbox::{iou, BoundingBox};
use crate::candidate::order::sort_boxes_desc;
use crate::trace::{trace_event, trace_span};

/// Which boxes are allowed to suppress each other.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum NmsMode {
    /// All boxes compete regardless of class.
    #[default]
    ClassAgnostic,
    /// Only boxes with the same `class_index` compete.
    PerClass,
}

/// Class-agnostic greedy NMS.
///
/// Boxes are stably sorted by descending confidence. The best remaining box is
/// accepted and every remaining box with a non-zero `iou >= iou_threshold`
/// against it is dropped, until no boxes remain. The result is a subset of the input in
/// descending confidence order.
pub fn suppress(boxes: &[BoundingBox], iou_threshold: f32) -> Vec<BoundingBox> {
    suppress_with_mode(boxes, iou_threshold, NmsMode::ClassAgnostic)
}

/// Greedy NMS with an explicit [`NmsMode`].
pub fn suppress_with_mode(
    boxes: &[BoundingBox],
    iou_threshold: f32,
    mode: NmsMode,
) -> Vec<BoundingBox> {
    let _span = trace_span!("nms", input = boxes.len()).entered();

    let mut pool = boxes.to_vec();
    sort_boxes_desc(&mut pool);

    let mut removed = vec![false; pool.len()];
    for i in 0..pool.len() {
        if removed[i] {
            continue;
        }
        for j in (i + 1)..pool.len() {
            if removed[j] {
                continue;
            }
            if mode == NmsMode::PerClass && pool[i].class_index != pool[j].class_index {
                continue;
            }
            // Disjoint or degenerate pairs never suppress, whatever the threshold.
            let overlap = iou(&pool[i], &pool[j]);
            if overlap > 0.0 && overlap >= iou_threshold {
                removed[j] = true;
            }
        }
    }

    let out: Vec<BoundingBox> = pool
        .into_iter()
        .enumerate()
        .filter_map(|(idx, b)| (!removed[idx]).then_some(b))
        .collect();

    trace_event!("nms_kept", kept = out.len(), suppressed = boxes.len() - out.len());
    out
}
