//! Bitmap rendering of emission frames.
//!
//! The canvas has its origin at the bottom left, like a plot; image rows
//! run top down, so y is flipped when rasterizing.

use std::f64::consts::PI;
use std::fs;
use std::path::{Path, PathBuf};

use image::{Rgba, RgbaImage};
use tracing::debug;

use crate::animation::{Frame, FrameSink};
use crate::config::SimulationConfig;
use crate::error::{SimError, SimResult};
use crate::geometry::{OrganRegion, Point};
use crate::simulation::Scene;

const BACKGROUND: [u8; 3] = [255, 255, 255];
const POINT_COLOR: [u8; 3] = [31, 119, 180];
const OUTLINE_COLOR: [u8; 3] = [0, 0, 0];
/// Dash and gap length of the organ outline, in pixels.
const DASH: f64 = 7.0;
const GAP: f64 = 4.0;

/// Display-only parameters; they never touch sampling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderStyle {
    /// Marker area, in the same units as the point-size control.
    pub point_size: f32,
    pub alpha: f32,
    pub color: [u8; 3],
}

impl Default for RenderStyle {
    fn default() -> Self {
        RenderStyle {
            point_size: 8.0,
            alpha: 0.7,
            color: POINT_COLOR,
        }
    }
}

impl RenderStyle {
    pub fn from_config(config: &SimulationConfig) -> Self {
        RenderStyle {
            point_size: config.point_size,
            alpha: config.alpha,
            ..RenderStyle::default()
        }
    }

    /// Marker radius in pixels; the control is an area, so take the root.
    pub fn radius(&self) -> f64 {
        (0.9 * f64::from(self.point_size).sqrt()).max(0.5)
    }
}

/// Square raster of `size` x `size` pixels, one pixel per canvas unit.
pub struct Raster {
    image: RgbaImage,
}

impl Raster {
    pub fn new(size: u32) -> Self {
        let [r, g, b] = BACKGROUND;
        Raster {
            image: RgbaImage::from_pixel(size, size, Rgba([r, g, b, 255])),
        }
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    fn blend(&mut self, px: i64, py: i64, color: [u8; 3], alpha: f64) {
        if px < 0 || py < 0 || px >= i64::from(self.image.width()) || py >= i64::from(self.image.height())
        {
            return;
        }
        let pixel = self.image.get_pixel_mut(px as u32, py as u32);
        for (dst, src) in pixel.0.iter_mut().zip(color) {
            let mixed = f64::from(src) * alpha + f64::from(*dst) * (1.0 - alpha);
            *dst = mixed.round().clamp(0.0, 255.0) as u8;
        }
    }

    /// Canvas (x, y) to pixel column and row.
    fn to_pixel(&self, x: f64, y: f64) -> (f64, f64) {
        (x, f64::from(self.image.height()) - y)
    }

    pub fn draw_points(&mut self, points: &[Point], style: &RenderStyle) {
        let radius = style.radius();
        let alpha = f64::from(style.alpha).clamp(0.0, 1.0);
        let reach = radius.ceil() as i64;
        for p in points {
            let (fx, fy) = self.to_pixel(p[0], p[1]);
            let (cx, cy) = (fx.floor() as i64, fy.floor() as i64);
            for py in (cy - reach)..=(cy + reach) {
                for px in (cx - reach)..=(cx + reach) {
                    let dx = px as f64 + 0.5 - fx;
                    let dy = py as f64 + 0.5 - fy;
                    if dx * dx + dy * dy <= radius * radius {
                        self.blend(px, py, style.color, alpha);
                    }
                }
            }
        }
    }

    /// Dashed ellipse outline.
    pub fn draw_outline(&mut self, region: &OrganRegion) {
        let perimeter_guess = 2.0 * PI * region.a.max(region.b);
        let steps = (perimeter_guess * 2.0).ceil().max(64.0) as usize;
        let mut travelled = 0.0;
        let mut prev = region.boundary_point(0.0);
        for i in 0..=steps {
            let theta = 2.0 * PI * i as f64 / steps as f64;
            let p = region.boundary_point(theta);
            travelled += ((p[0] - prev[0]).powi(2) + (p[1] - prev[1]).powi(2)).sqrt();
            prev = p;
            if travelled % (DASH + GAP) < DASH {
                let (fx, fy) = self.to_pixel(p[0], p[1]);
                self.blend(fx.floor() as i64, fy.floor() as i64, OUTLINE_COLOR, 1.0);
            }
        }
    }

    pub fn save(&self, path: &Path) -> SimResult<()> {
        self.image
            .save(path)
            .map_err(|e| SimError::render(format!("write '{}': {e}", path.display())))
    }
}

/// Rasterize the visible prefix of a scene with its outline.
pub fn render_frame(scene: &Scene, visible: &[Point], style: &RenderStyle) -> Raster {
    let mut raster = Raster::new(scene.canvas_size.round() as u32);
    raster.draw_points(visible, style);
    raster.draw_outline(&scene.region);
    raster
}

/// Writes frames as PNG files into a directory.
///
/// With `every_frame` off only the terminal frame is written, as
/// `emissions.png`; otherwise each frame becomes `frame_NNN.png`.
pub struct PngSink<'a> {
    scene: &'a Scene,
    style: RenderStyle,
    dir: PathBuf,
    every_frame: bool,
    written: Vec<PathBuf>,
}

impl<'a> PngSink<'a> {
    pub fn new(scene: &'a Scene, style: RenderStyle, dir: impl Into<PathBuf>, every_frame: bool) -> SimResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(PngSink {
            scene,
            style,
            dir,
            every_frame,
            written: Vec::new(),
        })
    }

    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }
}

impl FrameSink for PngSink<'_> {
    fn draw(&mut self, frame: Frame, visible: &[Point]) -> SimResult<()> {
        let name = if self.every_frame {
            format!("frame_{:03}.png", frame.index)
        } else if frame.terminal {
            "emissions.png".to_string()
        } else {
            return Ok(());
        };
        let path = self.dir.join(name);
        render_frame(self.scene, visible, &self.style).save(&path)?;
        debug!(path = %path.display(), visible = frame.visible, "wrote frame");
        self.written.push(path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::Sequencer;
    use crate::pathology::Pathology;
    use std::time::Duration;

    fn scene(points: Vec<Point>) -> Scene {
        Scene {
            pathology: Pathology::Normal,
            canvas_size: 200.0,
            region: OrganRegion::for_canvas(200.0).unwrap(),
            points,
        }
    }

    #[test]
    fn test_radius_tracks_marker_area() {
        let small = RenderStyle {
            point_size: 1.0,
            ..RenderStyle::default()
        };
        let large = RenderStyle {
            point_size: 16.0,
            ..RenderStyle::default()
        };
        assert!((large.radius() / small.radius() - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_point_is_blended_with_y_flipped() {
        let mut raster = Raster::new(100);
        let style = RenderStyle {
            alpha: 1.0,
            ..RenderStyle::default()
        };
        raster.draw_points(&[[10.5, 89.5]], &style);
        let [r, g, b] = POINT_COLOR;
        assert_eq!(*raster.image().get_pixel(10, 10), Rgba([r, g, b, 255]));
        assert_eq!(*raster.image().get_pixel(10, 89), Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn test_alpha_mixes_with_background() {
        let mut raster = Raster::new(10);
        let style = RenderStyle {
            alpha: 0.5,
            color: [0, 0, 0],
            ..RenderStyle::default()
        };
        raster.draw_points(&[[5.5, 4.5]], &style);
        assert_eq!(raster.image().get_pixel(5, 5).0[0], 128);
    }

    #[test]
    fn test_outline_is_dashed() {
        let region = OrganRegion::new(50.0, 50.0, 30.0, 20.0).unwrap();
        let mut raster = Raster::new(100);
        raster.draw_outline(&region);
        let dark = raster
            .image()
            .pixels()
            .filter(|p| p.0[..3] == OUTLINE_COLOR)
            .count();
        assert!(dark > 50);
        // Fewer pixels than a solid line of the same length.
        assert!((dark as f64) < 0.8 * 2.0 * PI * 30.0);
        assert_ne!(raster.image().get_pixel(50, 50).0[..3], OUTLINE_COLOR);
    }

    #[test]
    fn test_points_off_canvas_are_ignored() {
        let mut raster = Raster::new(20);
        raster.draw_points(&[[-50.0, -50.0], [500.0, 5.0]], &RenderStyle::default());
        assert!(raster
            .image()
            .pixels()
            .all(|p| *p == Rgba([255, 255, 255, 255])));
    }

    #[test]
    fn test_png_sink_final_only() {
        let dir = tempfile::tempdir().unwrap();
        let scene = scene(vec![[100.0, 100.0]; 4]);
        let mut sink = PngSink::new(&scene, RenderStyle::default(), dir.path(), false).unwrap();
        Sequencer::new(4, Duration::ZERO)
            .play(&scene.points, &mut sink)
            .unwrap();
        assert_eq!(sink.written().len(), 1);
        assert!(dir.path().join("emissions.png").exists());
    }

    #[test]
    fn test_png_sink_every_frame() {
        let dir = tempfile::tempdir().unwrap();
        let scene = scene(vec![[100.0, 100.0]; 4]);
        let mut sink = PngSink::new(&scene, RenderStyle::default(), dir.path().join("out"), true).unwrap();
        Sequencer::new(3, Duration::ZERO)
            .play(&scene.points, &mut sink)
            .unwrap();
        assert_eq!(sink.written().len(), 3);
        let dims = image::image_dimensions(dir.path().join("out/frame_003.png")).unwrap();
        assert_eq!(dims, (200, 200));
    }
}
