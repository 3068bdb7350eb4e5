//! Point-to-pad lookup over a [`GeometryIndex`].

use crate::pad_engine::geometry::{GeometryIndex, Point};
use crate::pad_engine::pad::PadId;

/// Return the first pad whose rectangle contains `point`.
///
/// Linear scan in index order; runs on touch callbacks, so it must not
/// allocate or block.
#[inline]
pub fn hit_test(index: &GeometryIndex, point: Point) -> Option<PadId> {
    index
        .entries()
        .iter()
        .find(|entry| entry.rect.contains(point))
        .map(|entry| entry.pad)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pad_engine::geometry::{IndexEntry, Resolution, ScreenRect};

    /// 2x2 grid of 500px pads over a 1000x1000 screen, row-major from the origin.
    fn quad_index() -> GeometryIndex {
        let mut entries = Vec::new();
        for row in 0..2 {
            for col in 0..2 {
                entries.push(IndexEntry {
                    rect: ScreenRect::from_origin_size(
                        col as f32 * 500.0,
                        row as f32 * 500.0,
                        500.0,
                        500.0,
                    ),
                    pad: PadId(row * 2 + col),
                });
            }
        }
        GeometryIndex::from_entries(entries, Resolution::new(1000, 1000))
    }

    #[test]
    fn test_quadrant_centres() {
        let index = quad_index();

        assert_eq!(hit_test(&index, Point::new(250.0, 250.0)), Some(PadId(0)));
        assert_eq!(hit_test(&index, Point::new(750.0, 250.0)), Some(PadId(1)));
        assert_eq!(hit_test(&index, Point::new(250.0, 750.0)), Some(PadId(2)));
        assert_eq!(hit_test(&index, Point::new(750.0, 750.0)), Some(PadId(3)));
    }

    #[test]
    fn test_shared_corner_goes_to_lower_right() {
        let index = quad_index();

        assert_eq!(hit_test(&index, Point::new(500.0, 500.0)), Some(PadId(3)));
        assert_eq!(hit_test(&index, Point::new(0.0, 0.0)), Some(PadId(0)));
    }

    #[test]
    fn test_max_edges_are_outside() {
        let index = quad_index();

        assert_eq!(hit_test(&index, Point::new(1000.0, 250.0)), None);
        assert_eq!(hit_test(&index, Point::new(250.0, 1000.0)), None);
        assert_eq!(hit_test(&index, Point::new(-0.5, 10.0)), None);
    }

    #[test]
    fn test_every_interior_point_hits_its_own_pad() {
        let index = quad_index();

        for entry in index.entries() {
            let mut y = entry.rect.y_min + 1.0;
            while y < entry.rect.y_max {
                let mut x = entry.rect.x_min + 1.0;
                while x < entry.rect.x_max {
                    assert_eq!(hit_test(&index, Point::new(x, y)), Some(entry.pad));
                    x += 37.0;
                }
                y += 37.0;
            }
        }
    }

    #[test]
    fn test_overlap_resolves_to_first_entry() {
        let rect = ScreenRect::from_origin_size(0.0, 0.0, 10.0, 10.0);
        let index = GeometryIndex::from_entries(
            vec![
                IndexEntry { rect, pad: PadId(7) },
                IndexEntry { rect, pad: PadId(3) },
            ],
            Resolution::new(10, 10),
        );

        assert_eq!(hit_test(&index, Point::new(5.0, 5.0)), Some(PadId(7)));
    }

    #[test]
    fn test_empty_index_never_hits() {
        let index = GeometryIndex::empty(Resolution::new(100, 100));
        assert_eq!(hit_test(&index, Point::new(1.0, 1.0)), None);
    }
}
