//! Drawing surface: stroke capture, undo history and the raster layers that
//! get exported.
//!
//! In the browser the surface is a third-party widget; [`DrawingSurface`] is the
//! seam the rest of the pipeline talks to. [`PixelSurface`] is the in-memory
//! implementation used headless and in tests.

use crate::brush::BrushColor;
use crate::stroke::Stroke;
use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use kurbo::{Point, Rect};

/// Brush radius the widget is configured with. It is not user-adjustable.
pub const DEFAULT_BRUSH_RADIUS: f64 = 2.0;

/// Default canvas width and height in pixels.
pub const DEFAULT_CANVAS_SIZE: u32 = 400;

/// Spacing between grid lines in pixels.
pub const GRID_SIZE: u32 = 25;

const GRID_COLOR: Rgba<u8> = Rgba([150, 150, 150, 43]);
const PAPER_COLOR: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// The interface consumed from the drawing widget.
///
/// Layers returned by [`drawing_layer`](DrawingSurface::drawing_layer) and
/// [`background_layer`](DrawingSurface::background_layer) are what gets
/// exported. The grid is a display concern and never appears in either.
pub trait DrawingSurface {
    /// Stroke layer. Unpainted pixels are fully transparent.
    fn drawing_layer(&self) -> &RgbaImage;

    /// Background image fitted to the canvas, if one is set.
    fn background_layer(&self) -> Option<&RgbaImage>;

    fn set_brush_color(&mut self, color: BrushColor);

    fn brush_radius(&self) -> f64;

    fn set_hide_grid(&mut self, hide: bool);

    /// Replace the background image. `None` removes it.
    fn set_background(&mut self, image: Option<&RgbaImage>);

    fn begin_stroke(&mut self, point: Point);

    fn extend_stroke(&mut self, point: Point);

    fn end_stroke(&mut self);

    /// Remove everything drawn, the undo history and the background.
    fn clear(&mut self);

    /// Remove the last completed stroke.
    /// Returns true if a stroke was removed.
    fn undo(&mut self) -> bool;
}

/// In-memory drawing surface backed by `image` buffers.
#[derive(Debug, Clone)]
pub struct PixelSurface {
    width: u32,
    height: u32,
    brush_color: BrushColor,
    brush_radius: f64,
    hide_grid: bool,
    /// Completed strokes, oldest first. This is the undo history.
    strokes: Vec<Stroke>,
    /// Stroke currently under the pointer.
    active: Option<Stroke>,
    drawing: RgbaImage,
    background: Option<RgbaImage>,
}

impl PixelSurface {
    /// Create a surface of the given size.
    ///
    /// A zero-sized surface is allowed: it models a widget that has not been
    /// laid out yet, and export rejects it.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            brush_color: BrushColor::BLACK,
            brush_radius: DEFAULT_BRUSH_RADIUS,
            hide_grid: true,
            strokes: Vec::new(),
            active: None,
            drawing: RgbaImage::new(width, height),
            background: None,
        }
    }

    pub fn with_brush_radius(mut self, radius: f64) -> Self {
        self.brush_radius = radius.max(0.5);
        self
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn brush_color(&self) -> BrushColor {
        self.brush_color
    }

    pub fn hide_grid(&self) -> bool {
        self.hide_grid
    }

    /// Number of completed strokes in the undo history.
    pub fn stroke_count(&self) -> usize {
        self.strokes.len()
    }

    /// True if no pixel of the drawing layer is painted.
    pub fn is_blank(&self) -> bool {
        self.drawing.pixels().all(|p| p[3] == 0)
    }

    /// Draw a complete stroke through `points`.
    pub fn draw_stroke(&mut self, points: &[Point]) {
        let Some((first, rest)) = points.split_first() else {
            return;
        };
        self.begin_stroke(*first);
        for point in rest {
            self.extend_stroke(*point);
        }
        self.end_stroke();
    }

    /// On-screen composition: paper, background, grid (unless hidden), drawing.
    pub fn preview(&self) -> RgbaImage {
        let mut out = RgbaImage::from_pixel(self.width, self.height, PAPER_COLOR);
        if let Some(background) = &self.background {
            imageops::overlay(&mut out, background, 0, 0);
        }
        if !self.hide_grid {
            imageops::overlay(&mut out, &render_grid(self.width, self.height), 0, 0);
        }
        imageops::overlay(&mut out, &self.drawing, 0, 0);
        out
    }

    /// Repaint the drawing layer from the stroke history.
    fn redraw(&mut self) {
        self.drawing = RgbaImage::new(self.width, self.height);
        for stroke in &self.strokes {
            stamp_stroke(&mut self.drawing, stroke);
        }
        if let Some(active) = &self.active {
            stamp_stroke(&mut self.drawing, active);
        }
    }
}

impl Default for PixelSurface {
    fn default() -> Self {
        Self::new(DEFAULT_CANVAS_SIZE, DEFAULT_CANVAS_SIZE)
    }
}

impl DrawingSurface for PixelSurface {
    fn drawing_layer(&self) -> &RgbaImage {
        &self.drawing
    }

    fn background_layer(&self) -> Option<&RgbaImage> {
        self.background.as_ref()
    }

    fn set_brush_color(&mut self, color: BrushColor) {
        self.brush_color = color;
    }

    fn brush_radius(&self) -> f64 {
        self.brush_radius
    }

    fn set_hide_grid(&mut self, hide: bool) {
        self.hide_grid = hide;
    }

    fn set_background(&mut self, image: Option<&RgbaImage>) {
        self.background = image.map(|image| fit_to_canvas(image, self.width, self.height));
    }

    fn begin_stroke(&mut self, point: Point) {
        // A stroke left open by a lost pointer-up is committed first.
        self.end_stroke();
        let stroke = Stroke::new(point, self.brush_color, self.brush_radius);
        stamp_disc(&mut self.drawing, point, stroke.radius, stroke.color.to_rgba());
        self.active = Some(stroke);
    }

    fn extend_stroke(&mut self, point: Point) {
        let Some(stroke) = self.active.as_mut() else {
            return;
        };
        if let Some(last) = stroke.last_point() {
            stamp_segment(&mut self.drawing, last, point, stroke.radius, stroke.color.to_rgba());
        }
        stroke.add_point(point);
    }

    fn end_stroke(&mut self) {
        if let Some(stroke) = self.active.take() {
            self.strokes.push(stroke);
        }
    }

    fn clear(&mut self) {
        self.strokes.clear();
        self.active = None;
        self.background = None;
        self.drawing = RgbaImage::new(self.width, self.height);
    }

    fn undo(&mut self) -> bool {
        if self.active.take().is_some() {
            self.redraw();
            return true;
        }
        if self.strokes.pop().is_some() {
            self.redraw();
            true
        } else {
            false
        }
    }
}

/// Scale `image` to fit inside the canvas keeping its aspect ratio, centered on
/// a transparent layer of exactly the canvas size.
fn fit_to_canvas(image: &RgbaImage, width: u32, height: u32) -> RgbaImage {
    let mut layer = RgbaImage::new(width, height);
    let (src_w, src_h) = image.dimensions();
    if src_w == 0 || src_h == 0 || width == 0 || height == 0 {
        return layer;
    }

    let scale = (width as f64 / src_w as f64).min(height as f64 / src_h as f64);
    let fit_w = ((src_w as f64 * scale).round() as u32).clamp(1, width);
    let fit_h = ((src_h as f64 * scale).round() as u32).clamp(1, height);

    let x = i64::from((width - fit_w) / 2);
    let y = i64::from((height - fit_h) / 2);
    if (fit_w, fit_h) == (src_w, src_h) {
        imageops::overlay(&mut layer, image, x, y);
    } else {
        let scaled = imageops::resize(image, fit_w, fit_h, FilterType::Triangle);
        imageops::overlay(&mut layer, &scaled, x, y);
    }
    layer
}

/// Grid texture for the on-screen preview.
fn render_grid(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_fn(width, height, |x, y| {
        if x % GRID_SIZE == 0 || y % GRID_SIZE == 0 {
            GRID_COLOR
        } else {
            Rgba([0, 0, 0, 0])
        }
    })
}

fn stamp_stroke(layer: &mut RgbaImage, stroke: &Stroke) {
    let (width, height) = layer.dimensions();
    let canvas = Rect::new(0.0, 0.0, f64::from(width), f64::from(height));
    if stroke.bounds().intersect(canvas).area() <= 0.0 {
        return;
    }

    let color = stroke.color.to_rgba();
    let Some(first) = stroke.points.first() else {
        return;
    };
    stamp_disc(layer, *first, stroke.radius, color);
    for pair in stroke.points.windows(2) {
        stamp_segment(layer, pair[0], pair[1], stroke.radius, color);
    }
}

/// Stamp discs along a segment, spaced closely enough to leave no gaps.
///
/// Only the part of the segment within reach of the canvas is stamped.
fn stamp_segment(layer: &mut RgbaImage, from: Point, to: Point, radius: f64, color: Rgba<u8>) {
    let (width, height) = layer.dimensions();
    let reach = Rect::new(0.0, 0.0, f64::from(width), f64::from(height)).inflate(radius, radius);
    let Some((from, to)) = clip_segment(from, to, reach) else {
        return;
    };

    let step = (radius / 2.0).max(0.5);
    let steps = (from.distance(to) / step).ceil().max(1.0) as usize;
    // Start at 0: after clipping, `from` may not have been stamped yet.
    for i in 0..=steps {
        let t = i as f64 / steps as f64;
        stamp_disc(layer, from.lerp(to, t), radius, color);
    }
}

/// Liang-Barsky clip of the segment `from..to` against `rect`.
fn clip_segment(from: Point, to: Point, rect: Rect) -> Option<(Point, Point)> {
    if !from.is_finite() || !to.is_finite() {
        return None;
    }

    let d = to - from;
    let mut t0 = 0.0_f64;
    let mut t1 = 1.0_f64;
    let edges = [
        (-d.x, from.x - rect.x0),
        (d.x, rect.x1 - from.x),
        (-d.y, from.y - rect.y0),
        (d.y, rect.y1 - from.y),
    ];
    for (p, q) in edges {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            if r > t1 {
                return None;
            }
            t0 = t0.max(r);
        } else {
            if r < t0 {
                return None;
            }
            t1 = t1.min(r);
        }
    }
    Some((from.lerp(to, t0), from.lerp(to, t1)))
}

fn stamp_disc(layer: &mut RgbaImage, center: Point, radius: f64, color: Rgba<u8>) {
    let (width, height) = layer.dimensions();
    if width == 0 || height == 0 {
        return;
    }

    let min_x = (center.x - radius).floor().max(0.0) as u32;
    let min_y = (center.y - radius).floor().max(0.0) as u32;
    let max_x = (center.x + radius).ceil().min(f64::from(width - 1));
    let max_y = (center.y + radius).ceil().min(f64::from(height - 1));
    if max_x < 0.0 || max_y < 0.0 {
        return;
    }

    let r2 = radius * radius;
    for y in min_y..=max_y as u32 {
        for x in min_x..=max_x as u32 {
            let dx = f64::from(x) + 0.5 - center.x;
            let dy = f64::from(y) + 0.5 - center.y;
            if dx * dx + dy * dy <= r2 {
                layer.put_pixel(x, y, color);
            }
        }
    }
}
