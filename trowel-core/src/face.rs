/// Mesh triangles and triangle/plane intersection
use crate::error::{Error, Result};
use crate::geometry::{normalized, Plane, Point, Segment, Vec3};
use crate::stl::RawTriangle;

/// Vertical extent of a face: min and max Z of its vertices.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZBounds {
    pub lower: f64,
    pub upper: f64,
}

impl ZBounds {
    /// Whether the horizontal plane at `z` touches this extent (bounds inclusive).
    pub fn contains(&self, z: f64) -> bool {
        self.lower <= z && z <= self.upper
    }
}

/// One triangle of a mesh.
///
/// Derived values are rebuilt by `refresh` after every change to the vertices,
/// so they never go stale.
#[derive(Debug, Clone)]
pub struct Face {
    vertices: [Point; 3],
    normal: Option<Vec3>,
    centroid: Point,
    z_bounds: ZBounds,
}

impl Face {
    pub fn new(v1: Point, v2: Point, v3: Point) -> Self {
        let mut face = Self {
            vertices: [v1, v2, v3],
            normal: None,
            centroid: Point::origin(),
            z_bounds: ZBounds {
                lower: 0.0,
                upper: 0.0,
            },
        };
        face.refresh();
        face
    }

    pub fn from_raw(triangle: &RawTriangle) -> Self {
        let [a, b, c] = triangle.map(Point::from);
        Self::new(a, b, c)
    }

    fn refresh(&mut self) {
        let [v1, v2, v3] = &self.vertices;
        self.normal = normalized(&(v2 - v1).cross(&(v3 - v1))).ok();
        self.centroid = Point::from((v1.coords + v2.coords + v3.coords) / 3.0);
        self.z_bounds = ZBounds {
            lower: v1.z.min(v2.z).min(v3.z),
            upper: v1.z.max(v2.z).max(v3.z),
        };
    }

    pub fn vertices(&self) -> &[Point; 3] {
        &self.vertices
    }

    /// Outward unit normal, `normalize((v2 - v1) x (v3 - v1))`.
    pub fn normal(&self) -> Result<Vec3> {
        self.normal.ok_or_else(|| {
            let [v1, v2, v3] = &self.vertices;
            Error::degenerate(format!(
                "face ({v1}, {v2}, {v3}) has collinear vertices and no normal"
            ))
        })
    }

    pub fn is_degenerate(&self) -> bool {
        self.normal.is_none()
    }

    pub fn centroid(&self) -> Point {
        self.centroid
    }

    pub fn z_bounds(&self) -> ZBounds {
        self.z_bounds
    }

    pub fn area(&self) -> f64 {
        let [v1, v2, v3] = &self.vertices;
        (v2 - v1).cross(&(v3 - v1)).norm() / 2.0
    }

    /// Reverse the winding by swapping the first and last vertices.
    pub fn flip_winding(&mut self) -> &mut Self {
        self.vertices.swap(0, 2);
        self.refresh();
        self
    }

    /// Replace every vertex with `f(vertex)`.
    pub fn map_vertices(&mut self, f: impl Fn(&Point) -> Point) {
        self.vertices = self.vertices.map(|v| f(&v));
        self.refresh();
    }

    /// Segments where this triangle crosses `plane`, comparing distances to
    /// zero exactly.
    pub fn plane_intersection(&self, plane: &Plane) -> Result<Vec<Segment>> {
        self.plane_intersection_with_tolerance(plane, 0.0)
    }

    /// Like [`Face::plane_intersection`], but vertices closer than `tolerance`
    /// to the plane count as lying on it.
    ///
    /// A tolerance of zero reproduces exact classification; a small positive
    /// value is more robust on meshes that are not aligned to the slicing
    /// plane to machine precision.
    pub fn plane_intersection_with_tolerance(
        &self,
        plane: &Plane,
        tolerance: f64,
    ) -> Result<Vec<Segment>> {
        let snap = |d: f64| if d.abs() <= tolerance { 0.0 } else { d };
        let [v1, v2, v3] = &self.vertices;
        let d = [
            snap(plane.signed_distance(v1)),
            snap(plane.signed_distance(v2)),
            snap(plane.signed_distance(v3)),
        ];

        if d.iter().all(|&x| x > 0.0) || d.iter().all(|&x| x < 0.0) {
            return Ok(Vec::new());
        }

        match d.map(|x| x == 0.0) {
            [true, true, true] => {
                return Ok(vec![
                    Segment::new(*v1, *v2),
                    Segment::new(*v2, *v3),
                    Segment::new(*v1, *v3),
                ]);
            }
            [true, true, false] => return Ok(vec![Segment::new(*v1, *v2)]),
            [true, false, true] => return Ok(vec![Segment::new(*v1, *v3)]),
            [false, true, true] => return Ok(vec![Segment::new(*v2, *v3)]),
            _ => {}
        }

        // A lone vertex on the plane counts as the non-negative side
        let side = d.map(|x| x >= 0.0);
        let (apex, a, b) = if side[1] == side[2] && side[0] != side[1] {
            (v1, v2, v3)
        } else if side[0] == side[2] && side[1] != side[0] {
            (v2, v1, v3)
        } else if side[0] == side[1] && side[2] != side[0] {
            (v3, v2, v1)
        } else {
            return Ok(Vec::new());
        };

        let start = edge_crossing(plane, apex, a)?;
        let end = edge_crossing(plane, apex, b)?;
        Ok(vec![Segment::new(start, end)])
    }
}

/// Point where the edge from `from` towards `to` meets the plane.
fn edge_crossing(plane: &Plane, from: &Point, to: &Point) -> Result<Point> {
    plane
        .line_intersection(from, Some(&(to - from)))
        .ok_or_else(|| {
            Error::degenerate(format!(
                "edge ({from}) -> ({to}) crosses the plane but is parallel to it"
            ))
        })
}
