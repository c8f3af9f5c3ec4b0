/// Geometry kernel: vectors, planes and line segments
use nalgebra::{Point3, Vector3};

use crate::error::{Error, Result};

/// Below this `|direction . normal|` a line is treated as parallel to a plane.
pub const PARALLEL_TOLERANCE: f64 = 1e-6;

pub type Vec3 = Vector3<f64>;
pub type Point = Point3<f64>;

/// Return a unit-length copy of `v`.
pub fn normalized(v: &Vec3) -> Result<Vec3> {
    let magnitude = v.norm();
    if magnitude == 0.0 || !magnitude.is_finite() {
        return Err(Error::degenerate(format!(
            "cannot normalize vector ({}, {}, {}) with magnitude {}",
            v.x, v.y, v.z, magnitude
        )));
    }
    Ok(v / magnitude)
}

/// Normalize `v` in place.
pub fn normalize_mut(v: &mut Vec3) -> Result<()> {
    *v = normalized(v)?;
    Ok(())
}

/// A plane defined by a unit normal and a point lying on it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    normal: Vec3,
    point: Point,
}

impl Plane {
    /// Build a plane through `point`. The normal is normalized.
    pub fn new(normal: Vec3, point: Point) -> Result<Self> {
        Ok(Self {
            normal: normalized(&normal)?,
            point,
        })
    }

    /// Build a plane from a normal alone; the normal's tip is the reference point.
    pub fn from_normal(normal: Vec3) -> Result<Self> {
        Self::new(normal, Point::from(normal))
    }

    /// The horizontal plane `z = height`, facing +Z.
    pub fn horizontal(height: f64) -> Self {
        Self {
            normal: Vec3::z(),
            point: Point::new(0.0, 0.0, height),
        }
    }

    pub fn normal(&self) -> &Vec3 {
        &self.normal
    }

    pub fn point(&self) -> &Point {
        &self.point
    }

    /// Distance from `p` to the plane, negative on the side opposite the normal.
    pub fn signed_distance(&self, p: &Point) -> f64 {
        (p - self.point).dot(&self.normal)
    }

    /// Unsigned distance from `p` to the plane.
    pub fn distance(&self, p: &Point) -> f64 {
        self.signed_distance(p).abs()
    }

    /// Intersect the line through `point` along `direction` with this plane.
    ///
    /// Without a direction the plane normal is used. Returns `None` when the
    /// line is parallel to the plane, which includes lines lying in it.
    pub fn line_intersection(&self, point: &Point, direction: Option<&Vec3>) -> Option<Point> {
        let direction = match direction {
            Some(d) => normalized(d).ok()?,
            None => self.normal,
        };

        let ddn = direction.dot(&self.normal);
        if ddn.abs() < PARALLEL_TOLERANCE {
            return None;
        }

        let mu = (self.point - point).dot(&self.normal) / ddn;
        Some(point + direction * mu)
    }

    /// Foot of the perpendicular dropped from `p` onto the plane.
    pub fn project(&self, p: &Point) -> Result<Point> {
        self.line_intersection(p, None).ok_or_else(|| {
            Error::degenerate(format!(
                "projection of ({}, {}, {}) onto plane did not intersect",
                p.x, p.y, p.z
            ))
        })
    }
}

/// A straight segment between two points, produced by slicing
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub start: Point,
    pub end: Point,
}

impl Segment {
    pub fn new(start: Point, end: Point) -> Self {
        Self { start, end }
    }

    pub fn length(&self) -> f64 {
        (self.end - self.start).norm()
    }

    pub fn reversed(&self) -> Self {
        Self::new(self.end, self.start)
    }
}
