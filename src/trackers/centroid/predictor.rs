use crate::utils::bbox::Position;
use crate::utils::kalman::kalman_2d_point::{Point2DKalmanFilter, DIM_2D_POINT_X2};
use crate::utils::kalman::KalmanState;
use nalgebra::Point2;

/// Per-identity motion predictor
///
/// The first measured position becomes the anchor, the filter then works on
/// offsets from the anchor so its state stays small over a long video.
///
#[derive(Debug, Clone)]
pub struct MotionPredictor {
    filter: Point2DKalmanFilter,
    anchor: Option<Position>,
    state: KalmanState<DIM_2D_POINT_X2>,
}

impl Default for MotionPredictor {
    fn default() -> Self {
        let filter = Point2DKalmanFilter::default();
        let state = filter.initiate(&Point2::origin());
        Self {
            filter,
            anchor: None,
            state,
        }
    }
}

impl MotionPredictor {
    pub fn anchor(&self) -> Option<Position> {
        self.anchor
    }

    pub fn state(&self) -> &KalmanState<DIM_2D_POINT_X2> {
        &self.state
    }

    /// Corrects the filter with the measured position and returns the one step ahead estimate
    ///
    pub fn predict(&mut self, measured: Position) -> Position {
        let anchor = match self.anchor {
            None => {
                self.anchor = Some(measured);
                return measured;
            }
            Some(anchor) => anchor,
        };

        let offset = Point2::from([
            (measured.x - anchor.x) as f32,
            (measured.y - anchor.y) as f32,
        ]);
        let corrected = self.filter.update(&self.state, &offset);
        self.state = self.filter.predict(&corrected);

        let estimate = Point2::from(self.state);
        Position::new(
            anchor.x + estimate.x.trunc() as i64,
            anchor.y + estimate.y.trunc() as i64,
        )
    }
}
