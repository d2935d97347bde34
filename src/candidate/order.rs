//! Confidence ordering for detection boxes.

use crate::candidate::bbox::BoundingBox;
use std::cmp::Ordering;

fn confidence_cmp_desc(a: &BoundingBox, b: &BoundingBox) -> Ordering {
    b.confidence.total_cmp(&a.confidence)
}

/// Sorts boxes by descending confidence; equal scores keep their input order.
pub(crate) fn sort_boxes_desc(boxes: &mut [BoundingBox]) {
    boxes.sort_by(confidence_cmp_desc);
}

/// Keeps at most `limit` boxes from an already sorted list.
pub(crate) fn truncate_top(boxes: &mut Vec<BoundingBox>, limit: Option<usize>) {
    if let Some(limit) = limit {
        boxes.truncate(limit);
    }
}

#[cfg(test)]
mod tests {
    use super::{sort_boxes_desc, truncate_top};
    use crate::candidate::bbox::BoundingBox;

    fn scored(confidence: f32, class_index: usize) -> BoundingBox {
        BoundingBox::from_center(0.5, 0.5, 0.1, 0.1, confidence, class_index, "1")
    }

    #[test]
    fn ties_keep_input_order() {
        let mut boxes = vec![scored(0.5, 0), scored(0.9, 1), scored(0.5, 2), scored(0.5, 3)];
        sort_boxes_desc(&mut boxes);
        let order: Vec<usize> = boxes.iter().map(|b| b.class_index).collect();
        assert_eq!(order, vec![1, 0, 2, 3]);
    }

    #[test]
    fn truncate_top_respects_limit() {
        let mut boxes = vec![scored(0.9, 0), scored(0.8, 1), scored(0.7, 2)];
        truncate_top(&mut boxes, Some(2));
        assert_eq!(boxes.len(), 2);
        truncate_top(&mut boxes, None);
        assert_eq!(boxes.len(), 2);
    }
}
