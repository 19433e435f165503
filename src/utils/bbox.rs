use serde::{Deserialize, Serialize};

/// Integer pixel position, used both for centroids and predicted positions
///
/// Positions stay integral end-to-end so the binder can match the tracker
/// output back to detections by plain equality.
///
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "[i64; 2]", into = "[i64; 2]")]
pub struct Position {
    pub x: i64,
    pub y: i64,
}

impl Position {
    pub fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another position
    ///
    pub fn distance(&self, other: &Position) -> f64 {
        let dx = (self.x - other.x) as f64;
        let dy = (self.y - other.y) as f64;
        (dx * dx + dy * dy).sqrt()
    }
}

impl From<[i64; 2]> for Position {
    fn from(p: [i64; 2]) -> Self {
        Self::new(p[0], p[1])
    }
}

impl From<Position> for [i64; 2] {
    fn from(p: Position) -> Self {
        [p.x, p.y]
    }
}

impl From<(i64, i64)> for Position {
    fn from((x, y): (i64, i64)) -> Self {
        Self::new(x, y)
    }
}

/// Axis-aligned bounding box in the format (x_min, y_min, x_max, y_max)
///
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "[i64; 4]", into = "[i64; 4]")]
pub struct BBox {
    pub x_min: i64,
    pub y_min: i64,
    pub x_max: i64,
    pub y_max: i64,
}

impl BBox {
    pub fn new(x_min: i64, y_min: i64, x_max: i64, y_max: i64) -> Self {
        Self {
            x_min,
            y_min,
            x_max,
            y_max,
        }
    }

    pub fn width(&self) -> i64 {
        self.x_max - self.x_min
    }

    pub fn height(&self) -> i64 {
        self.y_max - self.y_min
    }

    /// Geometric center, truncated toward zero
    ///
    pub fn centroid(&self) -> Position {
        let x = self.x_min as f64 + self.width() as f64 / 2.0;
        let y = self.y_min as f64 + self.height() as f64 / 2.0;
        Position::new(x.trunc() as i64, y.trunc() as i64)
    }

    pub fn as_array(&self) -> [i64; 4] {
        [self.x_min, self.y_min, self.x_max, self.y_max]
    }
}

impl From<[i64; 4]> for BBox {
    fn from(b: [i64; 4]) -> Self {
        Self::new(b[0], b[1], b[2], b[3])
    }
}

impl From<BBox> for [i64; 4] {
    fn from(b: BBox) -> Self {
        b.as_array()
    }
}
