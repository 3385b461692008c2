//! Terminal rendering: emissions binned into a character grid.

use std::io::Write;

use crate::animation::{Frame, FrameSink};
use crate::error::SimResult;
use crate::geometry::Point;
use crate::simulation::Scene;

const RAMP: &[u8] = b" .:-=+*#%@";
const OUTLINE: u8 = b'o';
const CLEAR: &str = "\x1b[2J\x1b[H";

/// Draws each frame as a `cols` x `rows` density grid with the organ
/// outline. Terminal cells are roughly twice as tall as wide, so `rows`
/// is usually about half of `cols`.
pub struct ConsoleSink<'a, W: Write> {
    scene: &'a Scene,
    out: W,
    cols: usize,
    rows: usize,
    clear: bool,
}

impl<'a, W: Write> ConsoleSink<'a, W> {
    pub fn new(scene: &'a Scene, out: W, cols: usize, rows: usize) -> Self {
        ConsoleSink {
            scene,
            out,
            cols: cols.max(8),
            rows: rows.max(4),
            clear: true,
        }
    }

    /// Append frames instead of redrawing in place.
    pub fn without_clear(mut self) -> Self {
        self.clear = false;
        self
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn cell(&self, x: f64, y: f64) -> Option<(usize, usize)> {
        let size = self.scene.canvas_size;
        if !(0.0..size).contains(&x) || !(0.0..size).contains(&y) {
            return None;
        }
        let col = (x / size * self.cols as f64) as usize;
        // top row is the top of the canvas
        let row = ((size - y) / size * self.rows as f64) as usize;
        Some((col.min(self.cols - 1), row.min(self.rows - 1)))
    }

    /// Grid lines, top row first.
    pub fn grid(&self, visible: &[Point]) -> Vec<String> {
        let mut counts = vec![0usize; self.cols * self.rows];
        for p in visible {
            if let Some((c, r)) = self.cell(p[0], p[1]) {
                counts[r * self.cols + c] += 1;
            }
        }
        let peak = counts.iter().copied().max().unwrap_or(0);

        let mut cells: Vec<u8> = counts
            .iter()
            .map(|&n| {
                if n == 0 {
                    RAMP[0]
                } else {
                    let level = (n * (RAMP.len() - 1)).div_ceil(peak);
                    RAMP[level.min(RAMP.len() - 1)]
                }
            })
            .collect();

        let region = &self.scene.region;
        let samples = 4 * (self.cols + self.rows);
        for i in 0..samples {
            let theta = std::f64::consts::TAU * i as f64 / samples as f64;
            let [x, y] = region.boundary_point(theta);
            if let Some((c, r)) = self.cell(x, y) {
                let idx = r * self.cols + c;
                if cells[idx] == RAMP[0] {
                    cells[idx] = OUTLINE;
                }
            }
        }

        cells
            .chunks(self.cols)
            .map(|row| String::from_utf8_lossy(row).into_owned())
            .collect()
    }
}

impl<W: Write> FrameSink for ConsoleSink<'_, W> {
    fn draw(&mut self, frame: Frame, visible: &[Point]) -> SimResult<()> {
        let lines = self.grid(visible);
        if self.clear {
            write!(self.out, "{CLEAR}")?;
        }
        writeln!(self.out, "{}", self.scene.title(frame.terminal))?;
        writeln!(
            self.out,
            "frame {} | {} of {} emissions",
            frame.index,
            frame.visible,
            self.scene.points.len()
        )?;
        for line in lines {
            writeln!(self.out, "{line}")?;
        }
        self.out.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::Sequencer;
    use crate::geometry::OrganRegion;
    use crate::pathology::Pathology;
    use std::time::Duration;

    fn scene(points: Vec<Point>) -> Scene {
        Scene {
            pathology: Pathology::HotNodule,
            canvas_size: 100.0,
            region: OrganRegion::new(50.0, 50.0, 40.0, 30.0).unwrap(),
            points,
        }
    }

    #[test]
    fn test_grid_shape_and_outline() {
        let scene = scene(Vec::new());
        let sink = ConsoleSink::new(&scene, Vec::new(), 40, 20);
        let grid = sink.grid(&[]);
        assert_eq!(grid.len(), 20);
        assert!(grid.iter().all(|l| l.len() == 40));
        let outline_cells: usize = grid.iter().map(|l| l.matches('o').count()).sum();
        assert!(outline_cells > 20);
        // center is empty
        assert_eq!(grid[10].as_bytes()[20], b' ');
    }

    #[test]
    fn test_densest_cell_gets_darkest_glyph() {
        let mut points = vec![[50.5, 50.5]; 9];
        points.push([20.5, 50.5]);
        let scene = scene(points.clone());
        let sink = ConsoleSink::new(&scene, Vec::new(), 10, 10);
        let grid = sink.grid(&points);
        // y = 50.5 lands in row 4, x = 50.5 in column 5
        assert_eq!(grid[4].as_bytes()[5], b'@');
        assert_eq!(grid[4].as_bytes()[2], b'.');
    }

    #[test]
    fn test_play_writes_every_frame() {
        let points: Vec<Point> = (0..30).map(|i| [30.0 + i as f64, 50.0]).collect();
        let scene = scene(points);
        let mut sink = ConsoleSink::new(&scene, Vec::new(), 20, 10).without_clear();
        Sequencer::new(3, Duration::ZERO)
            .play(&scene.points, &mut sink)
            .unwrap();
        let text = String::from_utf8(sink.into_inner()).unwrap();
        assert_eq!(text.matches("frame ").count(), 3);
        assert!(text.contains("frame 3 | 30 of 30 emissions"));
        assert!(text.contains("(final)"));
        assert!(!text.contains(CLEAR));
    }
}
