//! Two-way binding between the selected rectangle and the property panel.

use crate::color::Rgba;
use crate::error::Result;
use crate::geometry::Rect;

/// Geometry and decomposed colour of a rectangle as the panel shows it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RectSpec {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
    pub red: u8,
    pub green: u8,
    pub blue: u8,
    /// 0-100
    pub alpha: u8,
}

impl RectSpec {
    /// Shown when nothing is selected.
    pub fn placeholder(color: Rgba) -> Self {
        Self::from_rect(&Rect::new(10, 10, 100, 100, color))
    }

    pub fn from_rect(rect: &Rect) -> Self {
        Self {
            x: rect.x,
            y: rect.y,
            width: rect.width,
            height: rect.height,
            red: rect.color.r,
            green: rect.color.g,
            blue: rect.color.b,
            alpha: rect.color.alpha_percent(),
        }
    }

    pub fn color(&self) -> Rgba {
        Rgba::from_components(
            self.red as i32,
            self.green as i32,
            self.blue as i32,
            self.alpha as i32,
        )
    }

    pub fn to_rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height, self.color())
    }

    pub fn hex(&self) -> String {
        self.color().to_hex()
    }
}

impl Default for RectSpec {
    fn default() -> Self {
        Self::placeholder(Rgba::default())
    }
}

/// Raw text of the eight panel fields, exactly as the user typed it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PanelFields {
    pub x: String,
    pub y: String,
    pub width: String,
    pub height: String,
    pub red: String,
    pub green: String,
    pub blue: String,
    pub alpha: String,
}

impl From<&RectSpec> for PanelFields {
    fn from(spec: &RectSpec) -> Self {
        Self {
            x: spec.x.to_string(),
            y: spec.y.to_string(),
            width: spec.width.to_string(),
            height: spec.height.to_string(),
            red: spec.red.to_string(),
            green: spec.green.to_string(),
            blue: spec.blue.to_string(),
            alpha: spec.alpha.to_string(),
        }
    }
}

/// The user-visible fields editing the selected rectangle.
pub trait PropertyPanel {
    fn read(&self) -> PanelFields;
    fn write(&mut self, spec: &RectSpec);
}

/// Parses panel text with last-valid-value fallback and range clamping.
#[derive(Debug, Default, Clone)]
pub struct PropertySync {
    last: RectSpec,
}

impl PropertySync {
    pub fn new(initial: RectSpec) -> Self {
        Self { last: initial }
    }

    pub fn last(&self) -> &RectSpec {
        &self.last
    }

    /// Reads the panel. Fields that do not parse keep their last valid value.
    pub fn pull(&mut self, panel: &dyn PropertyPanel) -> RectSpec {
        let fields = panel.read();
        let last = self.last;
        let channel = |s: &str, prev: u8| parse_int(s).map_or(prev, |v| v.clamp(0, 255) as u8);

        let spec = RectSpec {
            x: parse_int(&fields.x).unwrap_or(last.x),
            y: parse_int(&fields.y).unwrap_or(last.y),
            width: parse_int(&fields.width).map_or(last.width, |v| v.max(0) as u32),
            height: parse_int(&fields.height).map_or(last.height, |v| v.max(0) as u32),
            red: channel(&fields.red, last.red),
            green: channel(&fields.green, last.green),
            blue: channel(&fields.blue, last.blue),
            alpha: parse_int(&fields.alpha).map_or(last.alpha, |v| v.clamp(0, 100) as u8),
        };
        self.last = spec;
        spec
    }

    pub fn push(&mut self, panel: &mut dyn PropertyPanel, spec: &RectSpec) {
        self.last = *spec;
        panel.write(spec);
    }

    /// Resets the geometry fields to the placeholder, keeping the colour.
    pub fn reset(&mut self, panel: &mut dyn PropertyPanel) {
        let spec = RectSpec::placeholder(self.last.color());
        self.push(panel, &spec);
    }

    /// Applies a `#rrggbb` or `rgba(...)` string to the colour fields. A hex
    /// colour leaves the alpha field untouched.
    pub fn apply_color_text(&mut self, panel: &mut dyn PropertyPanel, text: &str) -> Result<RectSpec> {
        let color: Rgba = text.parse()?;
        let mut spec = self.pull(panel);
        spec.red = color.r;
        spec.green = color.g;
        spec.blue = color.b;
        if !text.trim_start().starts_with('#') {
            spec.alpha = color.alpha_percent();
        }
        self.push(panel, &spec);
        Ok(spec)
    }
}

/// Integer prefix parsing: leading whitespace, an optional sign, then digits.
/// Trailing garbage is ignored; no digits at all yields `None`.
pub fn parse_int(s: &str) -> Option<i32> {
    let s = s.trim_start();
    let (negative, rest) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let end = rest
        .bytes()
        .position(|b| !b.is_ascii_digit())
        .unwrap_or(rest.len());
    if end == 0 {
        return None;
    }
    let magnitude = rest[..end]
        .parse::<i64>()
        .unwrap_or(i64::MAX)
        .min(i32::MAX as i64);
    let value = if negative { -magnitude } else { magnitude };
    Some(value as i32)
}
