/// Centroid tracker with Kalman prediction and Hungarian association
pub mod centroid;
