//! Peak-envelope drawing and click-to-seek.

use std::fmt::Write as _;

use crate::playback::{seek_and_resume, Player, SeekOutcome};

pub const BACKGROUND: &str = "#f4f4f5";
pub const PLACEHOLDER_TEXT: &str = "No waveform data";
pub const PLACEHOLDER_COLOR: &str = "#9ca3af";

/// Minimal 2D drawing surface, shaped after a browser canvas context.
pub trait Canvas {
    fn width(&self) -> f64;
    fn height(&self) -> f64;
    fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64, color: &str);
    /// Draws `text` centered on (`x`, `y`).
    fn fill_text(&mut self, text: &str, x: f64, y: f64, color: &str);
    fn begin_path(&mut self);
    fn move_to(&mut self, x: f64, y: f64);
    fn line_to(&mut self, x: f64, y: f64);
    fn stroke(&mut self, color: &str, line_width: f64);
}

/// One envelope plus the state needed to turn clicks into seek times.
pub struct WaveformView {
    data: Vec<f64>,
    color: String,
    duration: Option<f64>,
    on_seek: Option<Box<dyn FnMut(f64)>>,
}

impl WaveformView {
    pub fn new(color: impl Into<String>) -> Self {
        Self {
            data: Vec::new(),
            color: color.into(),
            duration: None,
            on_seek: None,
        }
    }

    /// Replaces the envelope wholesale. `None` clears it.
    pub fn set_data(&mut self, data: Option<Vec<f64>>) {
        self.data = data.unwrap_or_default();
    }

    pub fn data(&self) -> &[f64] {
        &self.data
    }

    pub fn set_duration(&mut self, seconds: Option<f64>) {
        self.duration = seconds;
    }

    pub fn on_seek(&mut self, cb: impl FnMut(f64) + 'static) {
        self.on_seek = Some(Box::new(cb));
    }

    pub fn render(&self, canvas: &mut dyn Canvas) {
        let (w, h) = (canvas.width(), canvas.height());
        canvas.fill_rect(0.0, 0.0, w, h, BACKGROUND);

        if self.data.is_empty() {
            canvas.fill_text(PLACEHOLDER_TEXT, w / 2.0, h / 2.0, PLACEHOLDER_COLOR);
            return;
        }

        let step = w / self.data.len() as f64;
        let middle = h / 2.0;

        for sign in [-1.0_f64, 1.0] {
            canvas.begin_path();
            for (i, &v) in self.data.iter().enumerate() {
                let x = i as f64 * step;
                let y = middle + sign * v * middle;
                if i == 0 {
                    canvas.move_to(x, y);
                } else {
                    canvas.line_to(x, y);
                }
            }
            canvas.stroke(&self.color, 1.0);
        }
    }

    /// Seek time for a click at canvas-local `x`, if seeking is possible.
    pub fn seek_time(&self, x: f64, canvas_width: f64) -> Option<f64> {
        let duration = self.duration.filter(|d| d.is_finite() && *d > 0.0)?;
        if self.data.is_empty() || canvas_width <= 0.0 {
            return None;
        }
        Some((x / canvas_width).clamp(0.0, 1.0) * duration)
    }

    /// Handles a click. Returns the seek time when the callback fired.
    pub fn click(&mut self, x: f64, canvas_width: f64) -> Option<f64> {
        self.on_seek.as_ref()?;
        let t = self.seek_time(x, canvas_width)?;
        if let Some(cb) = self.on_seek.as_mut() {
            cb(t);
        }
        Some(t)
    }

    /// Click handling wired straight to a player: seek, then resume.
    /// The player's own duration wins over any previously set one.
    pub fn click_to_player(
        &mut self,
        x: f64,
        canvas_width: f64,
        player: &mut dyn Player,
    ) -> Option<SeekOutcome> {
        if let Some(d) = player.duration() {
            self.duration = Some(d);
        }
        let t = self.seek_time(x, canvas_width)?;
        Some(seek_and_resume(player, t))
    }
}

/// Canvas that records into an SVG document.
pub struct SvgCanvas {
    width: f64,
    height: f64,
    body: String,
    path: String,
}

impl SvgCanvas {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            body: String::new(),
            path: String::new(),
        }
    }

    pub fn finish(self) -> String {
        format!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\">\n{body}</svg>\n",
            w = self.width,
            h = self.height,
            body = self.body
        )
    }
}

impl Canvas for SvgCanvas {
    fn width(&self) -> f64 {
        self.width
    }

    fn height(&self) -> f64 {
        self.height
    }

    fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64, color: &str) {
        let _ = writeln!(
            self.body,
            "<rect x=\"{x}\" y=\"{y}\" width=\"{w}\" height=\"{h}\" fill=\"{color}\"/>"
        );
    }

    fn fill_text(&mut self, text: &str, x: f64, y: f64, color: &str) {
        let _ = writeln!(
            self.body,
            "<text x=\"{x}\" y=\"{y}\" fill=\"{color}\" text-anchor=\"middle\" dominant-baseline=\"middle\" font-family=\"sans-serif\" font-size=\"14\">{}</text>",
            escape(text)
        );
    }

    fn begin_path(&mut self) {
        self.path.clear();
    }

    fn move_to(&mut self, x: f64, y: f64) {
        let _ = write!(self.path, "M{x:.2} {y:.2} ");
    }

    fn line_to(&mut self, x: f64, y: f64) {
        let _ = write!(self.path, "L{x:.2} {y:.2} ");
    }

    fn stroke(&mut self, color: &str, line_width: f64) {
        let _ = writeln!(
            self.body,
            "<path d=\"{}\" fill=\"none\" stroke=\"{color}\" stroke-width=\"{line_width}\"/>",
            self.path.trim_end()
        );
        self.path.clear();
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{cell::RefCell, rc::Rc};

    #[derive(Debug, Clone, PartialEq)]
    enum Op {
        Rect,
        Text(String, f64, f64),
        Begin,
        Move(f64, f64),
        Line(f64, f64),
        Stroke,
    }

    struct Recorder {
        w: f64,
        h: f64,
        ops: Vec<Op>,
    }

    impl Canvas for Recorder {
        fn width(&self) -> f64 {
            self.w
        }
        fn height(&self) -> f64 {
            self.h
        }
        fn fill_rect(&mut self, _: f64, _: f64, _: f64, _: f64, _: &str) {
            self.ops.push(Op::Rect);
        }
        fn fill_text(&mut self, text: &str, x: f64, y: f64, _: &str) {
            self.ops.push(Op::Text(text.into(), x, y));
        }
        fn begin_path(&mut self) {
            self.ops.push(Op::Begin);
        }
        fn move_to(&mut self, x: f64, y: f64) {
            self.ops.push(Op::Move(x, y));
        }
        fn line_to(&mut self, x: f64, y: f64) {
            self.ops.push(Op::Line(x, y));
        }
        fn stroke(&mut self, _: &str, _: f64) {
            self.ops.push(Op::Stroke);
        }
    }

    fn recorder() -> Recorder {
        Recorder {
            w: 100.0,
            h: 50.0,
            ops: Vec::new(),
        }
    }

    #[test]
    fn empty_data_draws_placeholder() {
        let view = WaveformView::new("#000");
        let mut c = recorder();
        view.render(&mut c);
        assert_eq!(
            c.ops,
            vec![Op::Rect, Op::Text(PLACEHOLDER_TEXT.into(), 50.0, 25.0)]
        );
    }

    #[test]
    fn draws_top_then_bottom_envelope() {
        let mut view = WaveformView::new("#000");
        view.set_data(Some(vec![0.0, 1.0, 0.5, 0.2]));
        let mut c = recorder();
        view.render(&mut c);

        assert_eq!(
            c.ops,
            vec![
                Op::Rect,
                Op::Begin,
                Op::Move(0.0, 25.0),
                Op::Line(25.0, 0.0),
                Op::Line(50.0, 12.5),
                Op::Line(75.0, 20.0),
                Op::Stroke,
                Op::Begin,
                Op::Move(0.0, 25.0),
                Op::Line(25.0, 50.0),
                Op::Line(50.0, 37.5),
                Op::Line(75.0, 30.0),
                Op::Stroke,
            ]
        );
    }

    #[test]
    fn click_at_middle_seeks_to_half_duration() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let mut view = WaveformView::new("#000");
        view.set_data(Some(vec![0.3; 8]));
        view.set_duration(Some(10.0));
        view.on_seek(move |t| sink.borrow_mut().push(t));

        let t = view.click(400.0, 800.0).unwrap();
        assert!((t - 5.0).abs() < 1e-9);
        assert_eq!(seen.borrow().len(), 1);
        assert!((seen.borrow()[0] - 5.0).abs() < 1e-9);
    }

    #[test]
    fn click_on_empty_waveform_never_seeks() {
        let seen = Rc::new(RefCell::new(0));
        let sink = Rc::clone(&seen);
        let mut view = WaveformView::new("#000");
        view.set_duration(Some(10.0));
        view.on_seek(move |_| *sink.borrow_mut() += 1);

        let mut c = recorder();
        view.render(&mut c);
        assert!(matches!(c.ops[1], Op::Text(..)));
        assert_eq!(view.click(50.0, 100.0), None);
        assert_eq!(*seen.borrow(), 0);
    }

    #[test]
    fn clicks_outside_the_canvas_pin_to_the_ends() {
        let mut view = WaveformView::new("#000");
        view.set_data(Some(vec![0.4; 4]));
        view.set_duration(Some(12.0));
        assert_eq!(view.seek_time(-30.0, 600.0), Some(0.0));
        assert_eq!(view.seek_time(900.0, 600.0), Some(12.0));
        assert_eq!(view.seek_time(600.0, 600.0), Some(12.0));
    }

    #[test]
    fn click_needs_callback_and_positive_duration() {
        let mut view = WaveformView::new("#000");
        view.set_data(Some(vec![0.5]));
        view.set_duration(Some(3.0));
        assert_eq!(view.click(10.0, 100.0), None, "no callback registered");

        view.on_seek(|_| {});
        view.set_duration(Some(0.0));
        assert_eq!(view.click(10.0, 100.0), None);
        view.set_duration(None);
        assert_eq!(view.click(10.0, 100.0), None);
        view.set_duration(Some(f64::NAN));
        assert_eq!(view.click(10.0, 100.0), None);
    }

    #[test]
    fn svg_canvas_emits_two_paths() {
        let mut view = WaveformView::new("#2563eb");
        view.set_data(Some(vec![0.1, 0.9]));
        let mut svg = SvgCanvas::new(200.0, 80.0);
        view.render(&mut svg);
        let doc = svg.finish();
        assert!(doc.starts_with("<svg"));
        assert_eq!(doc.matches("<path").count(), 2);
        assert!(doc.contains("stroke=\"#2563eb\""));
    }

    #[test]
    fn svg_placeholder_text_is_escaped() {
        let mut svg = SvgCanvas::new(10.0, 10.0);
        svg.fill_text("a<b", 5.0, 5.0, "#000");
        assert!(svg.finish().contains("a&lt;b"));
    }
}
