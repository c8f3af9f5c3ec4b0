/// STL reader and writer for binary and ASCII formats
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use nom::{
    bytes::complete::take,
    character::complete::{alpha1, multispace0, multispace1},
    multi::count,
    number::complete::{double, le_f32, le_u16, le_u32},
    sequence::{preceded, tuple},
    IResult,
};
use tracing::debug;

use crate::error::{Error, Result};
use crate::geometry::Vec3;
use crate::mesh::Mesh;

/// Three vertices of one triangle, in file order and model units.
pub type RawTriangle = [[f64; 3]; 3];

const HEADER_LEN: usize = 80;
/// Facet normal, three vertices and the attribute word.
const RECORD_LEN: usize = 50;

/// Read and parse an STL file from disk.
pub fn read_stl(path: impl AsRef<Path>) -> Result<Vec<RawTriangle>> {
    let path = path.as_ref();
    let data = fs::read(path)?;
    debug!(path = %path.display(), bytes = data.len(), "read STL file");
    parse_stl(&data)
}

/// Detect the encoding and parse an STL file held in memory
pub fn parse_stl(data: &[u8]) -> Result<Vec<RawTriangle>> {
    if is_ascii_stl(data) {
        let text = std::str::from_utf8(data)
            .map_err(|e| Error::format(format!("ASCII STL is not valid UTF-8: {e}")))?;
        parse_ascii_stl(text)
    } else {
        parse_binary_stl(data)
    }
}

/// Text files start with `solid`. Plenty of binary exporters also write
/// `solid` into the free-form header, so a file whose size matches its
/// declared binary triangle count exactly is still read as binary.
fn is_ascii_stl(data: &[u8]) -> bool {
    if !data.starts_with(b"solid") {
        return false;
    }
    match binary_size(data) {
        Some(size) => size != data.len(),
        None => true,
    }
}

/// Total byte size implied by the triangle count at offset 80.
fn binary_size(data: &[u8]) -> Option<usize> {
    let raw: [u8; 4] = data.get(HEADER_LEN..HEADER_LEN + 4)?.try_into().ok()?;
    let triangles = u32::from_le_bytes(raw) as usize;
    triangles
        .checked_mul(RECORD_LEN)?
        .checked_add(HEADER_LEN + 4)
}

/// Parse a binary STL file
pub fn parse_binary_stl(data: &[u8]) -> Result<Vec<RawTriangle>> {
    if data.len() < HEADER_LEN + 4 {
        return Err(Error::format(format!(
            "file too small to be a binary STL ({} bytes, need at least {})",
            data.len(),
            HEADER_LEN + 4
        )));
    }

    let (body, triangle_count) =
        binary_header(data).map_err(|_| Error::format("unreadable binary STL header"))?;
    let triangle_count = triangle_count as usize;

    let expected = triangle_count
        .checked_mul(RECORD_LEN)
        .ok_or_else(|| Error::format(format!("triangle count {triangle_count} overflows")))?;
    if body.len() < expected {
        return Err(Error::format(format!(
            "truncated binary STL: {} triangles need {} bytes, only {} present",
            triangle_count,
            expected,
            body.len()
        )));
    }

    let (rest, triangles) = count(binary_record, triangle_count)(body)
        .map_err(|_| Error::format("truncated binary STL record"))?;
    if !rest.is_empty() {
        debug!(trailing = rest.len(), "ignoring bytes after last STL record");
    }

    ensure_finite(&triangles)?;
    debug!(triangles = triangles.len(), "parsed binary STL");
    Ok(triangles)
}

fn binary_header(input: &[u8]) -> IResult<&[u8], u32> {
    // Header text is free-form and unused
    let (input, _) = take(HEADER_LEN)(input)?;
    le_u32(input)
}

fn binary_record(input: &[u8]) -> IResult<&[u8], RawTriangle> {
    // The stored normal is not trusted; faces recompute it
    let (input, _normal) = le_vector3(input)?;
    let (input, v1) = le_vector3(input)?;
    let (input, v2) = le_vector3(input)?;
    let (input, v3) = le_vector3(input)?;
    let (input, _attribute) = le_u16(input)?;
    Ok((input, [v1, v2, v3]))
}

/// Binary coordinates are single precision; widen them for the geometry.
fn le_vector3(input: &[u8]) -> IResult<&[u8], [f64; 3]> {
    let (input, (x, y, z)) = tuple((le_f32, le_f32, le_f32))(input)?;
    Ok((input, [x.into(), y.into(), z.into()]))
}

/// Parse an ASCII STL file
pub fn parse_ascii_stl(input: &str) -> Result<Vec<RawTriangle>> {
    let mut lines = input
        .lines()
        .enumerate()
        .skip_while(|(_, line)| line.trim().is_empty());

    match lines.next().and_then(|(_, line)| line.split_whitespace().next()) {
        Some("solid") => {}
        found => {
            return Err(Error::format(format!(
                "expected `solid` as first token, found {}",
                found.map_or_else(|| "end of input".to_string(), |t| format!("`{t}`"))
            )));
        }
    }

    let mut triangles = Vec::new();
    let mut current: Vec<[f64; 3]> = Vec::with_capacity(3);

    for (index, line) in lines {
        let Ok((rest, word)) = keyword(line) else {
            continue;
        };

        match word {
            "endsolid" => break,
            "outer" => current.clear(),
            "vertex" => {
                let (_, (x, y, z)) = parse_vector3(rest).map_err(|_| {
                    Error::type_mismatch(
                        "three floats after `vertex`",
                        format!("`{}` on line {}", line.trim(), index + 1),
                    )
                })?;
                current.push([x, y, z]);
            }
            "endfacet" => {
                let triangle: RawTriangle = current.as_slice().try_into().map_err(|_| {
                    Error::format(format!(
                        "facet ending on line {} has {} vertices, expected 3",
                        index + 1,
                        current.len()
                    ))
                })?;
                triangles.push(triangle);
                current.clear();
            }
            // facet, endloop and any extension keywords
            _ => {}
        }
    }

    ensure_finite(&triangles)?;
    debug!(triangles = triangles.len(), "parsed ASCII STL");
    Ok(triangles)
}

fn keyword(line: &str) -> IResult<&str, &str> {
    preceded(multispace0, alpha1)(line)
}

fn parse_vector3(input: &str) -> IResult<&str, (f64, f64, f64)> {
    let (input, _) = multispace0(input)?;
    let (input, x) = double(input)?;
    let (input, _) = multispace1(input)?;
    let (input, y) = double(input)?;
    let (input, _) = multispace1(input)?;
    let (input, z) = double(input)?;
    Ok((input, (x, y, z)))
}

fn ensure_finite(triangles: &[RawTriangle]) -> Result<()> {
    for (i, triangle) in triangles.iter().enumerate() {
        if triangle.iter().flatten().any(|c| !c.is_finite()) {
            return Err(Error::format(format!(
                "triangle {i} has a non-finite vertex coordinate"
            )));
        }
    }
    Ok(())
}

/// Encode a mesh as binary STL.
///
/// Normals are recomputed from the winding; degenerate faces get a zero normal.
/// Coordinates are narrowed to single precision.
pub fn write_binary_stl(mesh: &Mesh) -> Result<Vec<u8>> {
    let triangle_count = u32::try_from(mesh.len()).map_err(|_| {
        Error::format(format!(
            "{} faces do not fit the 32-bit binary STL triangle count",
            mesh.len()
        ))
    })?;
    let mut buf = Vec::with_capacity(HEADER_LEN + 4 + mesh.len() * RECORD_LEN);

    let header = format!("binary STL: {}", mesh.name());
    let header = header.as_bytes();
    buf.extend_from_slice(&header[..header.len().min(HEADER_LEN)]);
    buf.resize(HEADER_LEN, 0u8);

    buf.extend_from_slice(&triangle_count.to_le_bytes());

    for face in mesh.faces() {
        let normal = face.normal().unwrap_or_else(|_| Vec3::zeros());
        for c in normal.iter() {
            buf.extend_from_slice(&(*c as f32).to_le_bytes());
        }
        for vertex in face.vertices() {
            for c in vertex.iter() {
                buf.extend_from_slice(&(*c as f32).to_le_bytes());
            }
        }
        buf.extend_from_slice(&0u16.to_le_bytes());
    }

    Ok(buf)
}

/// Encode a mesh as ASCII STL.
pub fn write_ascii_stl(mesh: &Mesh) -> String {
    let mut out = String::with_capacity(mesh.len() * 256);
    // Writing to a String cannot fail
    let _ = writeln!(out, "solid {}", mesh.name());
    for face in mesh.faces() {
        let n = face.normal().unwrap_or_else(|_| Vec3::zeros());
        let _ = writeln!(out, "  facet normal {} {} {}", n.x, n.y, n.z);
        out.push_str("    outer loop\n");
        for v in face.vertices() {
            let _ = writeln!(out, "      vertex {} {} {}", v.x, v.y, v.z);
        }
        out.push_str("    endloop\n");
        out.push_str("  endfacet\n");
    }
    let _ = writeln!(out, "endsolid {}", mesh.name());
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn binary_stl(header: &[u8], triangles: &[RawTriangle]) -> Vec<u8> {
        let mut data = vec![0u8; HEADER_LEN];
        data[..header.len()].copy_from_slice(header);
        data.extend_from_slice(&(triangles.len() as u32).to_le_bytes());
        for triangle in triangles {
            data.extend_from_slice(&[0u8; 12]);
            for c in triangle.iter().flatten() {
                data.extend_from_slice(&(*c as f32).to_le_bytes());
            }
            data.extend_from_slice(&[0u8; 2]);
        }
        data
    }

    const SQUARE: [RawTriangle; 2] = [
        [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0]],
        [[0.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.5]],
    ];

    #[test]
    fn test_parse_binary_header() {
        let mut data = vec![0u8; 84];
        // Set triangle count to 0
        data[80..84].copy_from_slice(&0u32.to_le_bytes());

        let triangles = parse_binary_stl(&data).unwrap();
        assert!(triangles.is_empty());
    }

    #[test]
    fn test_parse_binary_in_file_order() {
        let data = binary_stl(b"exporter", &SQUARE);
        assert_eq!(parse_stl(&data).unwrap(), SQUARE.to_vec());
    }

    #[test]
    fn test_binary_truncated_record() {
        let mut data = binary_stl(b"", &SQUARE);
        data.truncate(data.len() - 10);
        assert!(matches!(parse_stl(&data), Err(Error::Format { .. })));
    }

    #[test]
    fn test_binary_too_short_for_header() {
        assert!(matches!(
            parse_binary_stl(&[0u8; 40]),
            Err(Error::Format { .. })
        ));
    }

    #[test]
    fn test_binary_trailing_bytes_ignored() {
        let mut data = binary_stl(b"", &SQUARE[..1]);
        data.extend_from_slice(b"junk");
        assert_eq!(parse_binary_stl(&data).unwrap().len(), 1);
    }

    #[test]
    fn test_binary_with_solid_header() {
        let data = binary_stl(b"solid exported by some CAD tool", &SQUARE);
        assert_eq!(parse_stl(&data).unwrap(), SQUARE.to_vec());
    }

    #[test]
    fn test_binary_rejects_nan() {
        let data = binary_stl(b"", &[[[0.0, f64::NAN, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]]);
        assert!(matches!(parse_stl(&data), Err(Error::Format { .. })));
    }

    #[test]
    fn test_parse_ascii() {
        let text = "solid square
  facet normal 0 0 1
    outer loop
      vertex 0 0 0
      vertex 1 0 0
      vertex 1 1 0
    endloop
  endfacet
  facet normal 0 0 1
    outer loop
      vertex 0 0 0
      vertex 1.0 1.0 0.0
      vertex 0 1 5e-1
    endloop
  endfacet
endsolid square
";
        assert_eq!(parse_stl(text.as_bytes()).unwrap(), SQUARE.to_vec());
    }

    #[test]
    fn test_ascii_ignores_unknown_keywords_and_stops_at_endsolid() {
        let text = "solid
facet normal 0 0 1
color 1 0 0
outer loop
vertex 0 0 0
vertex 1 0 0
vertex 1 1 0
endloop
endfacet
endsolid
facet normal 0 0 1
outer loop
vertex 9 9 9
vertex 9 9 9
vertex 9 9 9
endloop
endfacet
";
        assert_eq!(parse_ascii_stl(text).unwrap(), vec![SQUARE[0]]);
    }

    #[test]
    fn test_ascii_missing_solid() {
        let err = parse_ascii_stl("facet normal 0 0 1\nendfacet\n").unwrap_err();
        assert!(matches!(err, Error::Format { .. }));

        // starts with the bytes `solid` but the first token is something else
        let err = parse_stl(b"solidify\nfacet normal 0 0 1\n").unwrap_err();
        assert!(matches!(err, Error::Format { .. }));
    }

    #[test]
    fn test_ascii_bad_vertex() {
        let text = "solid x\nfacet normal 0 0 1\nouter loop\nvertex 0 zero 0\n";
        let err = parse_ascii_stl(text).unwrap_err();
        assert!(matches!(err, Error::TypeMismatch { .. }));
        assert!(err.to_string().contains("line 4"));
    }

    #[test]
    fn test_ascii_short_facet() {
        let text = "solid x\nfacet normal 0 0 1\nouter loop\nvertex 0 0 0\nvertex 1 0 0\nendloop\nendfacet\nendsolid x\n";
        assert!(matches!(
            parse_ascii_stl(text),
            Err(Error::Format { .. })
        ));
    }

    #[test]
    fn test_ascii_keeps_double_precision() {
        let text = "solid layer\nfacet normal 0 0 1\nouter loop\nvertex 0 0 0.3\nvertex 1 0 0.3\nvertex 0 1 1\nendloop\nendfacet\nendsolid layer\n";
        let triangles = parse_ascii_stl(text).unwrap();
        assert_eq!(triangles[0][0][2], 0.3);

        let mesh = Mesh::from_triangles("layer", &triangles).unwrap();
        let segments = mesh.slice(0.3).unwrap();
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].length(), 1.0);
    }

    #[test]
    fn test_binary_widens_single_precision() {
        let data = binary_stl(b"", &[[[0.0, 0.0, 0.3], [1.0, 0.0, 0.3], [0.0, 1.0, 1.0]]]);
        let triangles = parse_binary_stl(&data).unwrap();
        assert_eq!(triangles[0][0][2], f64::from(0.3f32));
    }

    #[test]
    fn test_write_then_parse() {
        let mesh = Mesh::from_triangles("square", &SQUARE).unwrap();

        let binary = write_binary_stl(&mesh).unwrap();
        assert_eq!(binary.len(), 84 + 2 * 50);
        assert_eq!(parse_stl(&binary).unwrap(), SQUARE.to_vec());

        let ascii = write_ascii_stl(&mesh);
        assert!(ascii.starts_with("solid square\n"));
        assert_eq!(parse_stl(ascii.as_bytes()).unwrap(), SQUARE.to_vec());
    }
}
