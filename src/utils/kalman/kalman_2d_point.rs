use crate::utils::kalman::KalmanState;
use nalgebra::{Point2, SMatrix, SVector};

pub const DIM_2D_POINT: usize = 2;
pub const DIM_2D_POINT_X2: usize = DIM_2D_POINT * 2;

/// Fraction of the velocity applied to the position on every step
pub const DAMPED_DT: f32 = 0.01;

/// Kalman filter with `(x, y, vx, vy)` state and `(x, y)` measurement
///
/// Noise covariances are identities and the initial error covariance is zero,
/// so the very first correction keeps the initial mean.
///
#[derive(Debug, Clone)]
pub struct Point2DKalmanFilter {
    motion_matrix: SMatrix<f32, DIM_2D_POINT_X2, DIM_2D_POINT_X2>,
    update_matrix: SMatrix<f32, DIM_2D_POINT, DIM_2D_POINT_X2>,
    process_noise: SMatrix<f32, DIM_2D_POINT_X2, DIM_2D_POINT_X2>,
    measurement_noise: SMatrix<f32, DIM_2D_POINT, DIM_2D_POINT>,
}

/// Default initializer
impl Default for Point2DKalmanFilter {
    fn default() -> Self {
        Point2DKalmanFilter::new(DAMPED_DT)
    }
}

impl Point2DKalmanFilter {
    pub fn new(dt: f32) -> Self {
        let mut motion_matrix: SMatrix<f32, DIM_2D_POINT_X2, DIM_2D_POINT_X2> = SMatrix::identity();

        for i in 0..DIM_2D_POINT {
            motion_matrix[(i, DIM_2D_POINT + i)] = dt;
        }

        Point2DKalmanFilter {
            motion_matrix,
            update_matrix: SMatrix::identity(),
            process_noise: SMatrix::identity(),
            measurement_noise: SMatrix::identity(),
        }
    }

    pub fn initiate(&self, p: &Point2<f32>) -> KalmanState<DIM_2D_POINT_X2> {
        let mean: SVector<f32, DIM_2D_POINT_X2> = SVector::from_iterator([p.x, p.y, 0.0, 0.0]);
        KalmanState::new(mean, SMatrix::zeros())
    }

    pub fn predict(&self, state: &KalmanState<DIM_2D_POINT_X2>) -> KalmanState<DIM_2D_POINT_X2> {
        let (mean, covariance) = (state.mean(), state.covariance());
        let mean = self.motion_matrix * mean;
        let covariance =
            self.motion_matrix * covariance * self.motion_matrix.transpose() + self.process_noise;
        KalmanState::new(mean, covariance)
    }

    pub fn update(
        &self,
        state: &KalmanState<DIM_2D_POINT_X2>,
        p: &Point2<f32>,
    ) -> KalmanState<DIM_2D_POINT_X2> {
        let (mean, covariance) = (state.mean(), state.covariance());
        let cross_cov = covariance * self.update_matrix.transpose();
        let innovation_cov = self.update_matrix * cross_cov + self.measurement_noise;

        // measurement noise keeps the innovation covariance positive definite
        let kalman_gain = match innovation_cov.try_inverse() {
            Some(inverted) => cross_cov * inverted,
            None => return *state,
        };

        let innovation = SVector::from_iterator([p.x, p.y]) - self.update_matrix * mean;

        let mean = mean + kalman_gain * innovation;
        let covariance = covariance - kalman_gain * self.update_matrix * covariance;
        KalmanState::new(mean, covariance)
    }
}

impl From<KalmanState<{ DIM_2D_POINT_X2 }>> for Point2<f32> {
    fn from(s: KalmanState<{ DIM_2D_POINT_X2 }>) -> Self {
        let mean = s.mean();
        Point2::from([mean[0], mean[1]])
    }
}
