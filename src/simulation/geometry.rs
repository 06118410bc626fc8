//! Planar geometry for the single-cell layout.
//!
//! The base station sits at the origin; every UE lives inside the disc of
//! radius `cell_radius_m` around it.

use std::f64::consts::PI;
use std::ops::{Add, Mul, Sub};

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Simple 2D point in meters.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ORIGIN: Point = Point { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Point at `distance` from the origin along `bearing` (radians).
    pub fn from_polar(distance: f64, bearing: f64) -> Self {
        Self {
            x: distance * bearing.cos(),
            y: distance * bearing.sin(),
        }
    }

    /// Euclidean length of the vector from the origin.
    pub fn norm(&self) -> f64 {
        self.x.hypot(self.y)
    }

    /// Euclidean distance to another point.
    pub fn distance_to(&self, other: &Point) -> f64 {
        (*self - *other).norm()
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Point {
    type Output = Point;

    fn mul(self, rhs: f64) -> Point {
        Point::new(self.x * rhs, self.y * rhs)
    }
}

/// Draw a point uniformly (by area) inside the disc of `radius` centred at the origin.
///
/// Uses `r = R·√u` so that the areal density is uniform; drawing `r` uniformly
/// would cluster points near the centre. Consumes exactly two draws:
/// the radius fraction first, then the angle.
pub fn random_point_in_disc<R: Rng + ?Sized>(rng: &mut R, radius: f64) -> Point {
    let r = radius * rng.r#gen::<f64>().sqrt();
    let angle = 2.0 * PI * rng.r#gen::<f64>();
    Point::from_polar(r, angle)
}

/// Whether `point` lies inside (or on) the disc of `radius` around the origin.
pub fn is_inside_disc(point: &Point, radius: f64) -> bool {
    point.norm() <= radius
}

/// Pull a point radially back onto the disc boundary if it lies outside.
pub fn clamp_to_disc(point: Point, radius: f64) -> Point {
    let norm = point.norm();
    if norm <= radius || norm == 0.0 {
        point
    } else {
        point * (radius / norm)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn distance_is_symmetric_and_euclidean() {
        let a = Point::new(3.0, 0.0);
        let b = Point::new(0.0, 4.0);
        assert_eq!(a.distance_to(&b), 5.0);
        assert_eq!(b.distance_to(&a), 5.0);
        assert_eq!(a.distance_to(&a), 0.0);
    }

    #[test]
    fn disc_samples_stay_inside_radius() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..10_000 {
            let p = random_point_in_disc(&mut rng, 500.0);
            assert!(is_inside_disc(&p, 500.0), "{:?} outside the cell", p);
        }
    }

    #[test]
    fn disc_samples_are_uniform_by_area() {
        // Half the area of a disc lies beyond r = R/√2.
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let n = 20_000;
        let inner = (0..n)
            .filter(|_| random_point_in_disc(&mut rng, 1.0).norm() < std::f64::consts::FRAC_1_SQRT_2)
            .count();
        let share = inner as f64 / n as f64;
        assert!((share - 0.5).abs() < 0.02, "inner share {}", share);
    }

    #[test]
    fn clamp_pulls_outside_points_to_boundary() {
        let clamped = clamp_to_disc(Point::new(600.0, 800.0), 500.0);
        assert!((clamped.norm() - 500.0).abs() < 1e-9);
        assert!((clamped.x - 300.0).abs() < 1e-9);

        let inside = Point::new(1.0, 1.0);
        assert_eq!(clamp_to_disc(inside, 500.0), inside);
    }
}
