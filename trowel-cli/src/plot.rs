/// ASCII plot of slice segments for terminal output
use crossterm::{
    style::{Color, Print, ResetColor, SetForegroundColor},
    QueueableCommand,
};
use std::io::Write;
use trowel_core::Segment;

const EMPTY: char = ' ';
const STROKE: char = '#';
const ENDPOINT: char = 'o';

/// Terminal cells are roughly twice as tall as they are wide.
const CELL_ASPECT: f64 = 2.0;

/// Character grid onto which slice segments are projected along Z
pub struct SlicePlot {
    width: usize,
    height: usize,
    cells: Vec<char>,
}

impl SlicePlot {
    pub fn new(width: usize, height: usize) -> Self {
        let width = width.max(2);
        let height = height.max(2);
        Self {
            width,
            height,
            cells: vec![EMPTY; width * height],
        }
    }

    pub fn clear(&mut self) {
        self.cells.fill(EMPTY);
    }

    pub fn cell(&self, x: usize, y: usize) -> char {
        self.cells[y * self.width + x]
    }

    /// Fit the XY extent of `segments` into the grid and draw them.
    pub fn render(&mut self, segments: &[Segment]) {
        self.clear();
        let Some((min_x, min_y, max_x, max_y)) = xy_bounds(segments) else {
            return;
        };

        let span_x = (max_x - min_x).max(f64::EPSILON);
        let span_y = (max_y - min_y).max(f64::EPSILON);
        let cols = (self.width - 1) as f64;
        let rows = (self.height - 1) as f64;
        let scale = (cols / span_x).min(rows * CELL_ASPECT / span_y);

        // Row 0 is the top of the terminal, so Y is flipped
        let to_cell = |x: f64, y: f64| -> (f64, f64) {
            ((x - min_x) * scale, rows - (y - min_y) * scale / CELL_ASPECT)
        };

        for segment in segments {
            let start = to_cell(segment.start.x, segment.start.y);
            let end = to_cell(segment.end.x, segment.end.y);
            self.rasterize_line(start, end);
            self.plot(start, ENDPOINT);
            self.plot(end, ENDPOINT);
        }
    }

    fn rasterize_line(&mut self, start: (f64, f64), end: (f64, f64)) {
        let steps = (end.0 - start.0)
            .abs()
            .max((end.1 - start.1).abs())
            .ceil()
            .max(1.0) as usize;
        for i in 0..=steps {
            let t = i as f64 / steps as f64;
            let point = (
                start.0 + (end.0 - start.0) * t,
                start.1 + (end.1 - start.1) * t,
            );
            if self.at(point) != Some(ENDPOINT) {
                self.plot(point, STROKE);
            }
        }
    }

    fn index(&self, (x, y): (f64, f64)) -> Option<usize> {
        let col = x.round();
        let row = y.round();
        if col < 0.0 || row < 0.0 || col >= self.width as f64 || row >= self.height as f64 {
            return None;
        }
        Some(row as usize * self.width + col as usize)
    }

    fn at(&self, point: (f64, f64)) -> Option<char> {
        self.index(point).map(|i| self.cells[i])
    }

    fn plot(&mut self, point: (f64, f64), character: char) {
        if let Some(i) = self.index(point) {
            self.cells[i] = character;
        }
    }

    pub fn draw<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        for row in self.cells.chunks(self.width) {
            for &c in row {
                let color = match c {
                    ENDPOINT => Color::Yellow,
                    STROKE => Color::Cyan,
                    _ => Color::DarkGrey,
                };
                writer.queue(SetForegroundColor(color))?;
                writer.queue(Print(c))?;
            }
            writer.queue(Print('\n'))?;
        }
        writer.queue(ResetColor)?;
        Ok(())
    }
}

fn xy_bounds(segments: &[Segment]) -> Option<(f64, f64, f64, f64)> {
    let mut points = segments.iter().flat_map(|s| [s.start, s.end]);
    let first = points.next()?;
    Some(points.fold(
        (first.x, first.y, first.x, first.y),
        |(min_x, min_y, max_x, max_y), p| {
            (min_x.min(p.x), min_y.min(p.y), max_x.max(p.x), max_y.max(p.y))
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use trowel_core::Point;

    fn square() -> Vec<Segment> {
        let corners = [
            Point::new(0.0, 0.0, 0.0),
            Point::new(4.0, 0.0, 0.0),
            Point::new(4.0, 4.0, 0.0),
            Point::new(0.0, 4.0, 0.0),
        ];
        (0..4)
            .map(|i| Segment::new(corners[i], corners[(i + 1) % 4]))
            .collect()
    }

    #[test]
    fn test_empty_plot() {
        let mut plot = SlicePlot::new(10, 5);
        plot.render(&[]);
        assert!((0..5).all(|y| (0..10).all(|x| plot.cell(x, y) == EMPTY)));
    }

    #[test]
    fn test_square_corners_and_edges() {
        let mut plot = SlicePlot::new(21, 11);
        plot.render(&square());

        // 4 model units fill 20 columns and 10 rows
        assert_eq!(plot.cell(0, 0), ENDPOINT);
        assert_eq!(plot.cell(20, 0), ENDPOINT);
        assert_eq!(plot.cell(0, 10), ENDPOINT);
        assert_eq!(plot.cell(20, 10), ENDPOINT);
        assert_eq!(plot.cell(10, 0), STROKE);
        assert_eq!(plot.cell(0, 5), STROKE);
        assert_eq!(plot.cell(10, 5), EMPTY);
    }

    #[test]
    fn test_draw_emits_every_row() {
        let mut plot = SlicePlot::new(6, 3);
        plot.render(&square());
        let mut out = Vec::new();
        plot.draw(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.matches('\n').count(), 3);
        assert!(text.contains(ENDPOINT));
    }
}
