#[derive(Clone, Debug, PartialEq)]
pub struct HitResult {
    /// Result ID
    pub id: u64,
    /// Owning user
    pub user_id: u64,
    pub x: f64,
    pub y: f64,
    /// Area scale, one of 1, 2, 3
    pub r: i32,
    /// Whether the point landed inside the area
    pub hit: bool,
    /// Check time in milliseconds since epoch
    pub ts: i64,
}

impl HitResult {
    pub fn new(id: u64, user_id: u64, x: f64, y: f64, r: i32, hit: bool, ts: i64) -> Self {
        Self {
            id,
            user_id,
            x,
            y,
            r,
            hit,
            ts,
        }
    }
}
