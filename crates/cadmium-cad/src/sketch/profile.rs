//! Region extraction for circle sketches.

use crate::kernel::{Circle2D, Profile2D};

use super::SketchError;

/// Compute the closed regions bounded by a set of non-crossing circles.
///
/// Every circle bounds exactly one region: its disc minus the discs of the
/// circles directly nested inside it. Regions follow the order of their
/// outer circle, holes follow drawing order.
pub(crate) fn regions(circles: &[Circle2D], tol: f32) -> Result<Vec<Profile2D>, SketchError> {
    for (i, a) in circles.iter().enumerate() {
        for (j, b) in circles.iter().enumerate().skip(i + 1) {
            if a.crosses(b, tol) {
                return Err(SketchError::IntersectingCircles {
                    first: i,
                    second: j,
                });
            }
        }
    }

    // Smallest enclosing circle of each circle
    let parents: Vec<Option<usize>> = circles
        .iter()
        .enumerate()
        .map(|(i, inner)| {
            circles
                .iter()
                .enumerate()
                .filter(|&(j, outer)| j != i && outer.contains(inner, tol))
                .min_by(|(_, a), (_, b)| a.radius.total_cmp(&b.radius))
                .map(|(j, _)| j)
        })
        .collect();

    Ok(circles
        .iter()
        .enumerate()
        .map(|(i, outer)| Profile2D {
            outer: *outer,
            holes: circles
                .iter()
                .zip(&parents)
                .filter(|&(_, parent)| *parent == Some(i))
                .map(|(c, _)| *c)
                .collect(),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;

    const TOL: f32 = 1e-5;

    fn circle(x: f32, y: f32, r: f32) -> Circle2D {
        Circle2D::new(Vec2::new(x, y), r)
    }

    #[test]
    fn test_single_circle_is_disc() {
        let profiles = regions(&[circle(0.0, 0.0, 1.0)], TOL).unwrap();
        assert_eq!(profiles.len(), 1);
        assert_eq!(profiles[0].loop_count(), 1);
    }

    #[test]
    fn test_concentric_pair_gives_ring_and_disc() {
        let profiles = regions(&[circle(0.0, 0.0, 2.0), circle(0.0, 0.0, 1.0)], TOL).unwrap();
        assert_eq!(profiles.len(), 2);
        assert_eq!(profiles[0].loop_count(), 2);
        assert_eq!(profiles[0].holes[0].radius, 1.0);
        assert_eq!(profiles[1].loop_count(), 1);
    }

    #[test]
    fn test_inner_drawn_first_keeps_order() {
        let profiles = regions(&[circle(0.0, 0.0, 1.0), circle(0.0, 0.0, 2.0)], TOL).unwrap();
        assert_eq!(profiles[0].loop_count(), 1);
        assert_eq!(profiles[1].loop_count(), 2);
    }

    #[test]
    fn test_three_levels_nest_only_direct_children() {
        let profiles = regions(
            &[circle(0.0, 0.0, 3.0), circle(0.0, 0.0, 2.0), circle(0.0, 0.0, 1.0)],
            TOL,
        )
        .unwrap();
        assert_eq!(profiles[0].holes, vec![circle(0.0, 0.0, 2.0)]);
        assert_eq!(profiles[1].holes, vec![circle(0.0, 0.0, 1.0)]);
        assert!(profiles[2].holes.is_empty());
    }

    #[test]
    fn test_plate_with_two_holes() {
        let profiles = regions(
            &[circle(0.0, 0.0, 5.0), circle(-2.0, 0.0, 1.0), circle(2.0, 0.0, 1.0)],
            TOL,
        )
        .unwrap();
        assert_eq!(profiles[0].loop_count(), 3);
    }

    #[test]
    fn test_disjoint_circles() {
        let profiles = regions(&[circle(0.0, 0.0, 1.0), circle(5.0, 0.0, 1.0)], TOL).unwrap();
        assert!(profiles.iter().all(|p| p.loop_count() == 1));
    }

    #[test]
    fn test_crossing_circles_rejected() {
        let result = regions(&[circle(0.0, 0.0, 1.0), circle(1.0, 0.0, 1.0)], TOL);
        assert!(matches!(
            result,
            Err(SketchError::IntersectingCircles {
                first: 0,
                second: 1
            })
        ));
    }
}
