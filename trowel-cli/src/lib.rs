//! Terminal reporting for trowel meshes and slices

use crossterm::{
    queue,
    style::{Color, Print, ResetColor, SetForegroundColor},
};
use std::io::{self, Write};
use trowel_core::{Mesh, Segment};

pub mod plot;

pub use plot::SlicePlot;

fn heading<W: Write>(out: &mut W, text: &str) -> io::Result<()> {
    queue!(
        out,
        SetForegroundColor(Color::Yellow),
        Print(text),
        Print('\n'),
        ResetColor
    )
}

/// Print face count, extent and mesh-wide derived quantities.
pub fn write_info<W: Write>(out: &mut W, mesh: &Mesh) -> io::Result<()> {
    heading(out, &format!("Mesh {}", mesh.name()))?;
    writeln!(out, "  faces:        {}", mesh.len())?;

    let degenerate = mesh.faces().iter().filter(|f| f.is_degenerate()).count();
    if degenerate > 0 {
        writeln!(out, "  degenerate:   {degenerate}")?;
    }

    let (Ok(centroid), Ok(dimensions)) = (mesh.centroid(), mesh.bounding_box_dimensions()) else {
        writeln!(out, "  (no faces, nothing to measure)")?;
        return Ok(());
    };

    writeln!(out, "  surface area: {:.4}", mesh.surface_area())?;
    writeln!(
        out,
        "  centroid:     ({:.4}, {:.4}, {:.4})",
        centroid.x, centroid.y, centroid.z
    )?;
    writeln!(
        out,
        "  dimensions:   {:.4} x {:.4} x {:.4}",
        dimensions.x, dimensions.y, dimensions.z
    )?;

    if let (Some(bottom), Some(top)) = (mesh.by_lower_bound().next(), mesh.by_upper_bound().last()) {
        writeln!(
            out,
            "  z range:      {:.4} .. {:.4}",
            bottom.z_bounds().lower,
            top.z_bounds().upper
        )?;
    }
    Ok(())
}

/// Print one line per segment of the slice at `z`.
pub fn write_segments<W: Write>(out: &mut W, z: f64, segments: &[Segment]) -> io::Result<()> {
    heading(out, &format!("Slice at z = {z} ({} segments)", segments.len()))?;
    for s in segments {
        writeln!(
            out,
            "  ({:.4}, {:.4}) -> ({:.4}, {:.4})",
            s.start.x, s.start.y, s.end.x, s.end.y
        )?;
    }
    let length: f64 = segments.iter().map(Segment::length).sum();
    writeln!(out, "  total length: {length:.4}")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(f: impl FnOnce(&mut Vec<u8>) -> io::Result<()>) -> String {
        let mut out = Vec::new();
        f(&mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_info_for_cube() {
        let cube = Mesh::cube("cube", 2.0).unwrap();
        let text = render(|out| write_info(out, &cube));
        assert!(text.contains("Mesh cube"));
        assert!(text.contains("faces:        12"));
        assert!(text.contains("dimensions:   2.0000 x 2.0000 x 2.0000"));
        assert!(text.contains("z range:      -1.0000 .. 1.0000"));
    }

    #[test]
    fn test_info_for_empty_mesh() {
        let mesh = Mesh::new("empty").unwrap();
        let text = render(|out| write_info(out, &mesh));
        assert!(text.contains("faces:        0"));
        assert!(text.contains("nothing to measure"));
    }

    #[test]
    fn test_segments_listing() {
        let cube = Mesh::cube("cube", 2.0).unwrap();
        let segments = cube.slice(0.0).unwrap();
        let text = render(|out| write_segments(out, 0.0, &segments));
        assert!(text.contains("8 segments"));
        assert!(text.contains("total length: 8.0000"));
    }
}
