use aimex_core::{Point, SessionPhase};
use tiny_skia::{Color, FillRule, Paint, PathBuilder, Pixmap, Rect, Stroke, Transform};

/// Everything the scene needs from the session for one frame.
pub struct SceneView {
    pub phase: SessionPhase,
    pub circle_center: Point,
    pub orbit_radius: f64,
    pub target_center: Point,
    pub target_radius: f64,
    pub ghost_target: Option<Point>,
    pub crossing_point: Option<Point>,
    pub cursor: Point,
    pub progress: (usize, usize),
    /// Typed length of the report name while the filename dialog is open.
    pub filename_len: Option<usize>,
    pub popup: bool,
}

/// Immediate-mode scene renderer on a tiny-skia canvas.
pub struct SceneRenderer {
    width: u32,
    height: u32,
}

impl SceneRenderer {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
    }

    pub fn render(&mut self, canvas: &mut Pixmap, view: &SceneView) {
        canvas.fill(sky_blue());

        self.stroke_circle(canvas, view.circle_center, view.orbit_radius, black(), 2.0);

        match view.phase {
            SessionPhase::Aiming => {
                self.draw_target(canvas, view.target_center, view.target_radius);
            }
            SessionPhase::ResultDisplay => {
                if let Some(ghost) = view.ghost_target {
                    self.draw_ghost_target(canvas, ghost, view.target_radius);
                }
                if let Some(point) = view.crossing_point {
                    self.fill_circle(canvas, point, 8.0, green());
                    self.stroke_circle(canvas, point, 8.0, black(), 2.0);
                }
            }
            SessionPhase::Ended => {
                self.draw_end_panel(canvas);
            }
        }

        if !view.phase.is_ended() {
            self.draw_cursor(canvas, view.cursor);
            self.draw_progress(canvas, view.progress);
        }

        if let Some(len) = view.filename_len {
            self.draw_filename_box(canvas, len);
        }
        if view.popup {
            self.draw_popup_frame(canvas);
        }
    }

    /// Concentric target rings, red/white/red with a black center dot.
    fn draw_target(&self, canvas: &mut Pixmap, center: Point, radius: f64) {
        self.fill_circle(canvas, center, radius, red());
        self.stroke_circle(canvas, center, radius, dark_red(), 2.0);

        self.fill_circle(canvas, center, radius * 0.7, white());
        self.stroke_circle(canvas, center, radius * 0.7, dark_red(), 2.0);

        self.fill_circle(canvas, center, radius * 0.4, red());
        self.stroke_circle(canvas, center, radius * 0.4, dark_red(), 2.0);

        self.fill_circle(canvas, center, (radius * 0.15).max(3.0), black());
    }

    /// Same rings in gray, shown where the target was during the pause.
    fn draw_ghost_target(&self, canvas: &mut Pixmap, center: Point, radius: f64) {
        self.fill_circle(canvas, center, radius, gray(150));
        self.stroke_circle(canvas, center, radius, black(), 2.0);

        self.fill_circle(canvas, center, radius * 0.7, gray(200));
        self.stroke_circle(canvas, center, radius * 0.7, black(), 2.0);

        self.fill_circle(canvas, center, radius * 0.4, gray(150));
        self.stroke_circle(canvas, center, radius * 0.4, black(), 2.0);

        self.fill_circle(canvas, center, (radius * 0.15).max(3.0), black());
    }

    /// Crosshair standing in for the hidden OS pointer; drawn at the
    /// effective position so the deviation applies to what the player sees.
    fn draw_cursor(&self, canvas: &mut Pixmap, cursor: Point) {
        let mut paint = Paint::default();
        paint.set_color(black());

        let arm = 12.0;
        let thickness = 2.0;
        let x = cursor.x as f32;
        let y = cursor.y as f32;

        if let Some(horizontal) = Rect::from_xywh(x - arm, y - thickness / 2.0, arm * 2.0, thickness)
        {
            canvas.fill_rect(horizontal, &paint, Transform::identity(), None);
        }
        if let Some(vertical) = Rect::from_xywh(x - thickness / 2.0, y - arm, thickness, arm * 2.0)
        {
            canvas.fill_rect(vertical, &paint, Transform::identity(), None);
        }
    }

    /// One tick per trial along the top edge, filled for completed trials.
    fn draw_progress(&self, canvas: &mut Pixmap, (current, max): (usize, usize)) {
        let mut paint = Paint::default();
        for i in 0..max {
            let filled = i + 1 < current;
            paint.set_color(if filled { black() } else { gray(220) });
            if let Some(tick) = Rect::from_xywh(20.0 + i as f32 * 16.0, 20.0, 10.0, 10.0) {
                canvas.fill_rect(tick, &paint, Transform::identity(), None);
            }
        }
    }

    fn draw_end_panel(&self, canvas: &mut Pixmap) {
        let width = self.width as f32 * 0.4;
        let height = self.height as f32 * 0.18;
        self.draw_panel(canvas, width, height, white());
    }

    fn draw_filename_box(&self, canvas: &mut Pixmap, typed_chars: usize) {
        let width = self.width as f32 * 0.4;
        let height = self.height as f32 * 0.12;
        self.draw_panel(canvas, width, height, white());

        // One block per typed character plus a caret; the name itself is
        // echoed on the log output.
        let x0 = (self.width as f32 - width) / 2.0 + 20.0;
        let y0 = self.height as f32 / 2.0 - 8.0;
        let mut paint = Paint::default();
        paint.set_color(black());
        for i in 0..typed_chars {
            if let Some(block) = Rect::from_xywh(x0 + i as f32 * 14.0, y0, 10.0, 16.0) {
                canvas.fill_rect(block, &paint, Transform::identity(), None);
            }
        }
        if let Some(caret) = Rect::from_xywh(x0 + typed_chars as f32 * 14.0, y0, 2.0, 16.0) {
            canvas.fill_rect(caret, &paint, Transform::identity(), None);
        }
    }

    fn draw_popup_frame(&self, canvas: &mut Pixmap) {
        let width = self.width as f32 * 0.35;
        let height = self.height as f32 * 0.1;
        self.draw_panel(canvas, width, height, wheat());
    }

    fn draw_panel(&self, canvas: &mut Pixmap, width: f32, height: f32, fill: Color) {
        let x = (self.width as f32 - width) / 2.0;
        let y = (self.height as f32 - height) / 2.0;

        let Some(rect) = Rect::from_xywh(x, y, width, height) else {
            return;
        };
        let mut paint = Paint::default();
        paint.set_color(fill);
        canvas.fill_rect(rect, &paint, Transform::identity(), None);

        let mut border = Paint::default();
        border.set_color(black());
        border.anti_alias = true;
        let path = PathBuilder::from_rect(rect);
        let stroke = Stroke {
            width: 3.0,
            ..Stroke::default()
        };
        canvas.stroke_path(&path, &border, &stroke, Transform::identity(), None);
    }

    fn fill_circle(&self, canvas: &mut Pixmap, center: Point, radius: f64, color: Color) {
        let mut paint = Paint::default();
        paint.set_color(color);
        paint.anti_alias = true;

        let mut pb = PathBuilder::new();
        pb.push_circle(center.x as f32, center.y as f32, radius as f32);
        if let Some(path) = pb.finish() {
            canvas.fill_path(&path, &paint, FillRule::Winding, Transform::identity(), None);
        }
    }

    fn stroke_circle(
        &self,
        canvas: &mut Pixmap,
        center: Point,
        radius: f64,
        color: Color,
        width: f32,
    ) {
        let mut paint = Paint::default();
        paint.set_color(color);
        paint.anti_alias = true;

        let mut pb = PathBuilder::new();
        pb.push_circle(center.x as f32, center.y as f32, radius as f32);
        if let Some(path) = pb.finish() {
            let stroke = Stroke {
                width,
                ..Stroke::default()
            };
            canvas.stroke_path(&path, &paint, &stroke, Transform::identity(), None);
        }
    }
}

fn sky_blue() -> Color {
    Color::from_rgba8(135, 206, 235, 255)
}

fn black() -> Color {
    Color::from_rgba8(0, 0, 0, 255)
}

fn white() -> Color {
    Color::from_rgba8(255, 255, 255, 255)
}

fn red() -> Color {
    Color::from_rgba8(255, 0, 0, 255)
}

fn dark_red() -> Color {
    Color::from_rgba8(139, 0, 0, 255)
}

fn green() -> Color {
    Color::from_rgba8(0, 255, 0, 255)
}

fn wheat() -> Color {
    Color::from_rgba8(245, 222, 179, 255)
}

fn gray(level: u8) -> Color {
    Color::from_rgba8(level, level, level, 255)
}
