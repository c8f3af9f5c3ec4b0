/// Triangle meshes indexed by face Z-extent
use std::path::Path;

use nalgebra::Matrix4;
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::face::Face;
use crate::geometry::{Plane, Point, Segment, Vec3};
use crate::index::ZIndex;
use crate::params::SliceParams;
use crate::stl::{read_stl, RawTriangle};
use crate::transform::Transform;

/// A named, ordered collection of faces with a Z-extent index.
///
/// The index is updated inside every mutating call, so it always covers every
/// face exactly once and stays sorted.
#[derive(Debug, Clone)]
pub struct Mesh {
    name: String,
    faces: Vec<Face>,
    index: ZIndex,
}

impl Mesh {
    /// Create an empty mesh. The name must not be empty.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(Error::type_mismatch(
                "non-empty mesh name",
                format!("{name:?}"),
            ));
        }
        Ok(Self {
            name,
            faces: Vec::new(),
            index: ZIndex::new(),
        })
    }

    /// Build a mesh with one face per triangle, in the given order.
    pub fn from_triangles(name: impl Into<String>, triangles: &[RawTriangle]) -> Result<Self> {
        let mut mesh = Self::new(name)?;
        mesh.add_faces(triangles.iter().map(Face::from_raw));

        let degenerate = mesh.faces.iter().filter(|f| f.is_degenerate()).count();
        if degenerate > 0 {
            warn!(
                mesh = %mesh.name,
                degenerate,
                "mesh contains faces with collinear vertices"
            );
        }
        Ok(mesh)
    }

    /// Load an ASCII or binary STL file.
    pub fn from_stl(name: impl Into<String>, path: impl AsRef<Path>) -> Result<Self> {
        let triangles = read_stl(path)?;
        Self::from_triangles(name, &triangles)
    }

    /// Axis-aligned cube of edge `size` centred on the origin, wound outward.
    pub fn cube(name: impl Into<String>, size: f64) -> Result<Self> {
        let h = size / 2.0;
        let p = |x: f64, y: f64, z: f64| Point::new(x * h, y * h, z * h);
        // Each quad is counter-clockwise seen from outside
        let quads = [
            // Top
            [p(-1., -1., 1.), p(1., -1., 1.), p(1., 1., 1.), p(-1., 1., 1.)],
            // Bottom
            [p(-1., -1., -1.), p(-1., 1., -1.), p(1., 1., -1.), p(1., -1., -1.)],
            // Front
            [p(-1., -1., -1.), p(1., -1., -1.), p(1., -1., 1.), p(-1., -1., 1.)],
            // Back
            [p(-1., 1., -1.), p(-1., 1., 1.), p(1., 1., 1.), p(1., 1., -1.)],
            // Right
            [p(1., -1., -1.), p(1., 1., -1.), p(1., 1., 1.), p(1., -1., 1.)],
            // Left
            [p(-1., -1., -1.), p(-1., -1., 1.), p(-1., 1., 1.), p(-1., 1., -1.)],
        ];

        let mut mesh = Self::new(name)?;
        mesh.add_faces(
            quads
                .iter()
                .flat_map(|&[a, b, c, d]| [Face::new(a, b, c), Face::new(a, c, d)]),
        );
        Ok(mesh)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.faces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    /// Faces in insertion order.
    pub fn faces(&self) -> &[Face] {
        &self.faces
    }

    /// Faces sorted ascending by lower Z bound.
    pub fn by_lower_bound(&self) -> impl Iterator<Item = &Face> + '_ {
        self.index.by_lower().iter().map(|&i| &self.faces[i])
    }

    /// Faces sorted ascending by upper Z bound.
    pub fn by_upper_bound(&self) -> impl Iterator<Item = &Face> + '_ {
        self.index.by_upper().iter().map(|&i| &self.faces[i])
    }

    /// Face positions in lower-bound order.
    pub fn lower_bound_order(&self) -> &[usize] {
        self.index.by_lower()
    }

    /// Face positions in upper-bound order.
    pub fn upper_bound_order(&self) -> &[usize] {
        self.index.by_upper()
    }

    /// Append one face, inserting it at its sorted position in both orders.
    pub fn add_face(&mut self, face: Face) -> &mut Self {
        self.faces.push(face);
        self.index.insert(&self.faces, self.faces.len() - 1);
        self
    }

    /// Append a batch of faces and resort both orders.
    pub fn add_faces(&mut self, faces: impl IntoIterator<Item = Face>) -> &mut Self {
        self.faces.extend(faces);
        self.reindex();
        self
    }

    fn reindex(&mut self) {
        self.index.rebuild(&self.faces);
        debug!(mesh = %self.name, faces = self.faces.len(), "rebuilt Z index");
    }

    /// Faces whose vertical extent includes `z`, in face order.
    pub fn faces_intersecting(&self, z: f64) -> Vec<&Face> {
        self.index
            .stab(&self.faces, z)
            .into_iter()
            .map(|i| &self.faces[i])
            .collect()
    }

    /// Segments where the horizontal plane at `z` cuts the mesh.
    pub fn slice(&self, z: f64) -> Result<Vec<Segment>> {
        self.slice_with(z, &SliceParams::default())
    }

    pub fn slice_with(&self, z: f64, params: &SliceParams) -> Result<Vec<Segment>> {
        let plane = Plane::horizontal(z);
        let tolerance = params.tolerance.abs();
        let candidates: Vec<&Face> = self
            .index
            .overlapping(&self.faces, z - tolerance, z + tolerance)
            .into_iter()
            .map(|i| &self.faces[i])
            .collect();

        #[cfg(feature = "parallel")]
        let per_face: Vec<Vec<Segment>> = candidates
            .par_iter()
            .map(|face| face.plane_intersection_with_tolerance(&plane, tolerance))
            .collect::<Result<_>>()?;
        #[cfg(not(feature = "parallel"))]
        let per_face: Vec<Vec<Segment>> = candidates
            .iter()
            .map(|face| face.plane_intersection_with_tolerance(&plane, tolerance))
            .collect::<Result<_>>()?;

        let segments: Vec<Segment> = per_face.into_iter().flatten().collect();
        debug!(
            z,
            candidates = candidates.len(),
            segments = segments.len(),
            "sliced mesh"
        );
        Ok(segments)
    }

    /// Mean of the face centroids.
    pub fn centroid(&self) -> Result<Point> {
        if self.faces.is_empty() {
            return Err(Error::degenerate(format!(
                "mesh `{}` has no faces and no centroid",
                self.name
            )));
        }
        let sum = self
            .faces
            .iter()
            .fold(Vec3::zeros(), |acc, f| acc + f.centroid().coords);
        Ok(Point::from(sum / self.faces.len() as f64))
    }

    /// Axis-aligned extrema over every vertex, as `(min, max)`.
    pub fn bounding_box(&self) -> Result<(Point, Point)> {
        let centroid = self.centroid()?;
        let mut min = centroid;
        let mut max = centroid;
        for v in self.faces.iter().flat_map(|f| f.vertices()) {
            min = min.inf(v);
            max = max.sup(v);
        }
        Ok((min, max))
    }

    /// Width, height and depth of the bounding box.
    pub fn bounding_box_dimensions(&self) -> Result<Vec3> {
        let (min, max) = self.bounding_box()?;
        Ok(max - min)
    }

    pub fn surface_area(&self) -> f64 {
        self.faces.iter().map(Face::area).sum()
    }

    /// Scale every vertex by `ratio` about the centroid.
    pub fn scale(&mut self, ratio: f64) -> Result<()> {
        let center = self.centroid()?;
        self.apply_transform(&Transform::scale_about(&center, ratio));
        Ok(())
    }

    /// Move every vertex by `offset`.
    pub fn translate(&mut self, offset: &Vec3) {
        for face in &mut self.faces {
            face.map_vertices(|p| p + offset);
        }
        self.reindex();
    }

    /// Rotate by `angle_degrees` around `axis` passing through the centroid.
    pub fn rotate(&mut self, angle_degrees: f64, axis: &Vec3) -> Result<()> {
        let center = self.centroid()?;
        let matrix = Transform::rotation_about(&center, axis, angle_degrees)?;
        self.apply_transform(&matrix);
        Ok(())
    }

    /// Apply an affine transform to every vertex and rebuild the index.
    pub fn apply_transform(&mut self, matrix: &Matrix4<f64>) {
        for face in &mut self.faces {
            face.map_vertices(|p| matrix.transform_point(p));
        }
        self.reindex();
    }
}
