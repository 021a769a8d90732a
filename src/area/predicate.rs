/// Tolerance used on the curved and slanted edges so that points lying
/// exactly on the boundary survive floating-point rounding.
const EPSILON: f64 = 1e-12;

/// Decide whether `(x, y)` lies inside the target area scaled by `r`.
///
/// The area is the union of three pieces:
/// - rectangle in the second quadrant: `-r <= x <= 0`, `0 <= y <= r`
/// - quarter disk of radius `r` in the first quadrant
/// - right triangle in the fourth quadrant with legs `r/2`, below `y = x - r/2`
///
/// No range checks are applied here; callers validate input first.
pub fn is_hit(x: f64, y: f64, r: i32) -> bool {
    let r = f64::from(r);

    in_rectangle(x, y, r) || in_quarter_disk(x, y, r) || in_triangle(x, y, r)
}

fn in_rectangle(x: f64, y: f64, r: f64) -> bool {
    (-r..=0.0).contains(&x) && (0.0..=r).contains(&y)
}

fn in_quarter_disk(x: f64, y: f64, r: f64) -> bool {
    x >= 0.0 && y >= 0.0 && x * x + y * y <= r * r + EPSILON
}

fn in_triangle(x: f64, y: f64, r: f64) -> bool {
    let half = r / 2.0;

    (0.0..=half).contains(&x) && (-half..=0.0).contains(&y) && y >= x - half - EPSILON
}
