//! Planar segment predicates on (longitude, latitude) pairs.

use super::Location;

/// Sign of the cross product (b - a) x (c - a).
fn orientation(a: Location, b: Location, c: Location) -> i8 {
    let value = (b.longitude - a.longitude) * (c.latitude - a.latitude)
        - (b.latitude - a.latitude) * (c.longitude - a.longitude);
    if value > 0.0 {
        1
    } else if value < 0.0 {
        -1
    } else {
        0
    }
}

/// Whether `q` lies within the bounding box of the collinear segment `p`-`r`.
fn on_segment(p: Location, q: Location, r: Location) -> bool {
    q.longitude <= p.longitude.max(r.longitude)
        && q.longitude >= p.longitude.min(r.longitude)
        && q.latitude <= p.latitude.max(r.latitude)
        && q.latitude >= p.latitude.min(r.latitude)
}

/// Whether segments `p1`-`p2` and `q1`-`q2` share at least one point.
pub(crate) fn segments_intersect(p1: Location, p2: Location, q1: Location, q2: Location) -> bool {
    let o1 = orientation(p1, p2, q1);
    let o2 = orientation(p1, p2, q2);
    let o3 = orientation(q1, q2, p1);
    let o4 = orientation(q1, q2, p2);

    if o1 != o2 && o3 != o4 {
        return true;
    }

    (o1 == 0 && on_segment(p1, q1, p2))
        || (o2 == 0 && on_segment(p1, q2, p2))
        || (o3 == 0 && on_segment(q1, p1, q2))
        || (o4 == 0 && on_segment(q1, p2, q2))
}
