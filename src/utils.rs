/// Integer pixel positions and bounding boxes
pub mod bbox;

/// Kalman filter
pub mod kalman;

/// Optimal assignment over a distance matrix
pub mod linear_sum_assignment;

/// Display colors assigned to identities
pub mod palette;
