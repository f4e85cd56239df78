//! The interaction state machine.
//!
//! [`Editor`] owns the scene, the undo history and the current mode. Every
//! input goes through [`Editor::handle`], which mutates the scene and returns
//! the [`Effect`]s the front end must apply (repaint, update the property
//! panel, show feedback, save). The editor itself never calls out.

use image::RgbaImage;
use std::fmt;

use crate::color::Rgba;
use crate::config::Config;
use crate::error::Result;
use crate::geometry::{Point, Rect};
use crate::history::{History, Snapshot};
use crate::input::{InputEvent, Keymap, Shortcut};
use crate::props::RectSpec;
use crate::render::{self, Layer};
use crate::scene::{Draft, Scene};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Mode {
    #[default]
    Select,
    Draw,
}

impl Mode {
    pub fn toggled(self) -> Self {
        match self {
            Mode::Select => Mode::Draw,
            Mode::Draw => Mode::Select,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Select => write!(f, "Select Mode"),
            Mode::Draw => write!(f, "Draw Mode"),
        }
    }
}

/// Transient user-visible messages.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Feedback {
    RectangleCreated,
    RectangleMoved,
    RectangleDeleted,
    RectangleRemoved,
    RectanglesCleared,
    Moved,
    Deselected,
    Undo,
    Redo,
    ModeChanged(Mode),
    Greyscale,
    NothingToSave,
}

impl fmt::Display for Feedback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Feedback::RectangleCreated => "Rectangle Created",
            Feedback::RectangleMoved => "Rectangle Moved",
            Feedback::RectangleDeleted => "Rectangle Deleted",
            Feedback::RectangleRemoved => "Rectangle Removed",
            Feedback::RectanglesCleared => "Rectangles Cleared",
            Feedback::Moved => "Moved",
            Feedback::Deselected => "Deselected",
            Feedback::Undo => "Undo",
            Feedback::Redo => "Redo",
            Feedback::ModeChanged(mode) => return write!(f, "{mode}"),
            Feedback::Greyscale => "Greyscale",
            Feedback::NothingToSave => "No image to save",
        };
        f.write_str(msg)
    }
}

/// What the front end must do after an event.
#[derive(Clone, Debug, PartialEq)]
pub enum Effect {
    Redraw,
    ShowProperties(RectSpec),
    ResetProperties,
    Feedback(Feedback),
    /// Export the scene and hand it to the image store.
    Save,
}

#[derive(Clone, Debug, Default)]
enum Gesture {
    #[default]
    Idle,
    /// The draft lives in `Scene::draft`.
    Drawing,
    Dragging {
        index: usize,
        offset: Point,
        before: Snapshot,
    },
}

/// A run of small edits on one rectangle that share a single undo step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum EditRun {
    Nudge(usize),
    Properties(usize),
}

#[derive(Clone, Copy, Debug)]
struct Tuning {
    hit_tolerance: i32,
    min_draw_size: i32,
    nudge_step: i32,
    fast_nudge_step: i32,
    clear_on_load: bool,
}

#[derive(Debug)]
pub struct Editor {
    scene: Scene,
    history: History,
    mode: Mode,
    gesture: Gesture,
    color: Rgba,
    run: Option<EditRun>,
    keymap: Keymap,
    tuning: Tuning,
}

impl Editor {
    pub fn new(config: &Config) -> Self {
        Self {
            scene: Scene::new(config.canvas_size()),
            history: History::with_limit(config.history_limit),
            mode: Mode::default(),
            gesture: Gesture::Idle,
            color: config.initial_color(),
            run: None,
            keymap: Keymap::default(),
            tuning: Tuning {
                hit_tolerance: config.hit_tolerance,
                min_draw_size: config.min_draw_size,
                nudge_step: config.nudge_step,
                fast_nudge_step: config.fast_nudge_step,
                clear_on_load: config.clear_on_load,
            },
        }
    }

    pub fn with_keymap(mut self, keymap: Keymap) -> Self {
        self.keymap = keymap;
        self
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn color(&self) -> Rgba {
        self.color
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// True while a draw or drag gesture is in progress.
    pub fn is_busy(&self) -> bool {
        !matches!(self.gesture, Gesture::Idle)
    }

    pub fn handle(&mut self, event: InputEvent) -> Vec<Effect> {
        let run = self.run.take();
        match event {
            InputEvent::PointerDown(p) => self.pointer_down(p),
            InputEvent::PointerMove(p) => self.pointer_move(p),
            InputEvent::PointerUp(p) => self.pointer_up(p),
            InputEvent::KeyDown { key, modifiers } => match self.keymap.resolve(key, modifiers) {
                Some(shortcut) => self.shortcut(shortcut, run),
                None => {
                    self.run = run;
                    Vec::new()
                }
            },
            InputEvent::Shortcut(shortcut) => self.shortcut(shortcut, run),
        }
    }

    fn pointer_down(&mut self, p: Point) -> Vec<Effect> {
        if self.is_busy() {
            return Vec::new();
        }
        match self.mode {
            Mode::Draw => {
                let draft = Draft::new(p, self.color);
                let spec = RectSpec::from_rect(&draft.normalized());
                self.scene.draft = Some(draft);
                self.gesture = Gesture::Drawing;
                vec![Effect::ShowProperties(spec), Effect::Redraw]
            }
            Mode::Select => {
                let Some(index) = self.scene.hit_test(p, self.tuning.hit_tolerance) else {
                    return Vec::new();
                };
                let origin = self.scene.rects[index].origin();
                self.scene.selected = Some(index);
                self.color = self.scene.rects[index].color;
                self.gesture = Gesture::Dragging {
                    index,
                    offset: Point::new(p.x - origin.x, p.y - origin.y),
                    before: self.scene.rects.clone(),
                };
                vec![
                    Effect::ShowProperties(RectSpec::from_rect(&self.scene.rects[index])),
                    Effect::Redraw,
                ]
            }
        }
    }

    fn pointer_move(&mut self, p: Point) -> Vec<Effect> {
        match &self.gesture {
            Gesture::Idle => Vec::new(),
            Gesture::Drawing => {
                let Some(draft) = self.scene.draft.as_mut() else {
                    return Vec::new();
                };
                draft.current = p;
                let spec = RectSpec::from_rect(&draft.normalized());
                vec![Effect::ShowProperties(spec), Effect::Redraw]
            }
            Gesture::Dragging { index, offset, .. } => {
                let (index, offset) = (*index, *offset);
                let canvas = self.scene.size();
                let Some(rect) = self.scene.rects.get_mut(index) else {
                    return Vec::new();
                };
                rect.move_clamped(Point::new(p.x - offset.x, p.y - offset.y), canvas);
                vec![Effect::ShowProperties(RectSpec::from_rect(rect)), Effect::Redraw]
            }
        }
    }

    fn pointer_up(&mut self, p: Point) -> Vec<Effect> {
        match std::mem::take(&mut self.gesture) {
            Gesture::Idle => Vec::new(),
            Gesture::Drawing => {
                let Some(mut draft) = self.scene.draft.take() else {
                    return vec![Effect::Redraw];
                };
                draft.current = p;
                let (dx, dy) = draft.extent();
                let min = self.tuning.min_draw_size;
                if dx.abs() <= min || dy.abs() <= min {
                    log::debug!("Discarded {dx}x{dy} draft below {min}px");
                    return vec![Effect::Redraw];
                }
                self.history.save(&self.scene.rects);
                let rect = draft.normalized();
                let spec = RectSpec::from_rect(&rect);
                let index = self.scene.push(rect);
                self.scene.selected = Some(index);
                vec![
                    Effect::ShowProperties(spec),
                    Effect::Feedback(Feedback::RectangleCreated),
                    Effect::Redraw,
                ]
            }
            Gesture::Dragging { index, before, .. } => {
                let moved = match (self.scene.rects.get(index), before.get(index)) {
                    (Some(now), Some(was)) => now.origin() != was.origin(),
                    _ => false,
                };
                if !moved {
                    return vec![Effect::Redraw];
                }
                self.history.save(&before);
                vec![Effect::Feedback(Feedback::RectangleMoved), Effect::Redraw]
            }
        }
    }

    /// Abandons a gesture: the draft is dropped and a dragged rectangle
    /// returns to where it started.
    fn cancel_gesture(&mut self) {
        match std::mem::take(&mut self.gesture) {
            Gesture::Idle => {}
            Gesture::Drawing => self.scene.draft = None,
            Gesture::Dragging { index, before, .. } => {
                if let (Some(rect), Some(was)) = (self.scene.rects.get_mut(index), before.get(index)) {
                    *rect = was.clone();
                }
            }
        }
    }

    fn shortcut(&mut self, shortcut: Shortcut, run: Option<EditRun>) -> Vec<Effect> {
        // Only a mode switch may interrupt a gesture.
        if self.is_busy() && shortcut != Shortcut::ToggleMode {
            return Vec::new();
        }
        match shortcut {
            Shortcut::ToggleMode => self.toggle_mode(),
            Shortcut::Undo => self.undo(),
            Shortcut::Redo => self.redo(),
            Shortcut::DeleteSelected => match self.scene.selected {
                Some(index) => self.remove(index),
                None => Vec::new(),
            },
            Shortcut::Deselect => {
                if self.scene.selected.take().is_none() {
                    return Vec::new();
                }
                vec![
                    Effect::ResetProperties,
                    Effect::Redraw,
                    Effect::Feedback(Feedback::Deselected),
                ]
            }
            Shortcut::Move { direction, fast } => {
                let Some(index) = self.scene.selected else {
                    return Vec::new();
                };
                if run != Some(EditRun::Nudge(index)) {
                    self.history.save(&self.scene.rects);
                }
                self.run = Some(EditRun::Nudge(index));

                let step = if fast {
                    self.tuning.fast_nudge_step
                } else {
                    self.tuning.nudge_step
                };
                let (dx, dy) = direction.delta(step);
                let canvas = self.scene.size();
                let Some(rect) = self.scene.rects.get_mut(index) else {
                    return Vec::new();
                };
                let target = Point::new(rect.x + dx, rect.y + dy);
                rect.move_clamped(target, canvas);
                vec![
                    Effect::ShowProperties(RectSpec::from_rect(rect)),
                    Effect::Redraw,
                    Effect::Feedback(Feedback::Moved),
                ]
            }
            Shortcut::Save => {
                if self.scene.is_empty() {
                    log::warn!("Nothing to save");
                    vec![Effect::Feedback(Feedback::NothingToSave)]
                } else {
                    vec![Effect::Save]
                }
            }
            Shortcut::ClearAll => self.clear_all(),
            Shortcut::UndoLastCreated => self.undo_last_created(),
            Shortcut::Greyscale => self.greyscale(),
        }
    }

    fn toggle_mode(&mut self) -> Vec<Effect> {
        self.cancel_gesture();
        self.mode = self.mode.toggled();
        log::debug!("Switched to {}", self.mode);
        vec![Effect::Feedback(Feedback::ModeChanged(self.mode)), Effect::Redraw]
    }

    fn undo(&mut self) -> Vec<Effect> {
        if let Some(prev) = self.history.undo(&self.scene.rects) {
            self.scene.restore(prev);
        }
        self.scene.selected = None;
        vec![
            Effect::ResetProperties,
            Effect::Redraw,
            Effect::Feedback(Feedback::Undo),
        ]
    }

    fn redo(&mut self) -> Vec<Effect> {
        if let Some(next) = self.history.redo(&self.scene.rects) {
            self.scene.restore(next);
        }
        self.scene.selected = None;
        vec![
            Effect::ResetProperties,
            Effect::Redraw,
            Effect::Feedback(Feedback::Redo),
        ]
    }

    fn clear_all(&mut self) -> Vec<Effect> {
        if self.scene.rects.is_empty() {
            return Vec::new();
        }
        self.history.save(&self.scene.rects);
        self.scene.clear();
        vec![
            Effect::ResetProperties,
            Effect::Redraw,
            Effect::Feedback(Feedback::RectanglesCleared),
        ]
    }

    fn undo_last_created(&mut self) -> Vec<Effect> {
        let Some(last) = self.scene.rects.len().checked_sub(1) else {
            return Vec::new();
        };
        self.history.save(&self.scene.rects);
        let was_selected = self.scene.selected == Some(last);
        self.scene.remove(last);
        let mut effects = vec![Effect::Redraw, Effect::Feedback(Feedback::RectangleRemoved)];
        if was_selected {
            effects.insert(0, Effect::ResetProperties);
        }
        effects
    }

    /// Flattens the scene into a greyscale background. Rectangles are kept.
    fn greyscale(&mut self) -> Vec<Effect> {
        if self.scene.background.is_none() {
            return Vec::new();
        }
        let composite = render::render(&self.scene, Layer::Export);
        self.scene.background = Some(render::greyscale(&composite));
        vec![Effect::Redraw, Effect::Feedback(Feedback::Greyscale)]
    }

    /// Writes panel values into the selected rectangle and adopts the panel
    /// colour for new drafts. Consecutive edits of one rectangle share one
    /// undo step.
    pub fn apply_properties(&mut self, spec: RectSpec) -> Vec<Effect> {
        let run = self.run.take();
        self.color = spec.color();
        if self.is_busy() {
            return Vec::new();
        }
        let Some(index) = self.scene.selected else {
            return Vec::new();
        };
        let mut updated = spec.to_rect();
        updated.fit_to(self.scene.size());
        if self.scene.rects.get(index) == Some(&updated) {
            self.run = run;
            return Vec::new();
        }
        if run != Some(EditRun::Properties(index)) {
            self.history.save(&self.scene.rects);
        }
        self.run = Some(EditRun::Properties(index));
        self.scene.rects[index] = updated;
        vec![Effect::Redraw]
    }

    /// Selects the rectangle at `index`, as from the rectangle list.
    pub fn select(&mut self, index: usize) -> Vec<Effect> {
        self.run = None;
        if self.is_busy() {
            return Vec::new();
        }
        let Some(rect) = self.scene.rects.get(index) else {
            return Vec::new();
        };
        let spec = RectSpec::from_rect(rect);
        self.color = rect.color;
        self.scene.selected = Some(index);
        vec![Effect::ShowProperties(spec), Effect::Redraw]
    }

    /// Deletes the rectangle at `index`.
    pub fn remove(&mut self, index: usize) -> Vec<Effect> {
        self.run = None;
        if self.is_busy() || index >= self.scene.rects.len() {
            return Vec::new();
        }
        self.history.save(&self.scene.rects);
        let was_selected = self.scene.selected == Some(index);
        self.scene.remove(index);
        let mut effects = vec![Effect::Redraw, Effect::Feedback(Feedback::RectangleDeleted)];
        if was_selected {
            effects.insert(0, Effect::ResetProperties);
        }
        effects
    }

    /// Adds a rectangle programmatically; negative sizes extend left or up.
    pub fn add_rect(&mut self, x: i32, y: i32, width: i32, height: i32, color: Rgba) -> Vec<Effect> {
        self.run = None;
        self.history.save(&self.scene.rects);
        self.scene.push(Rect::from_extent(x, y, width, height, color));
        vec![Effect::Redraw]
    }

    /// Installs a new background; the canvas takes its size.
    pub fn set_background(&mut self, image: RgbaImage) -> Vec<Effect> {
        self.run = None;
        self.cancel_gesture();
        let mut effects = Vec::new();
        if self.tuning.clear_on_load && !self.scene.rects.is_empty() {
            self.history.save(&self.scene.rects);
            self.scene.clear();
            effects.push(Effect::ResetProperties);
        }
        log::info!("Background set to {}x{}", image.width(), image.height());
        self.scene.background = Some(image);
        effects.push(Effect::Redraw);
        effects
    }

    /// The live canvas, with draft preview and selection outline.
    pub fn render(&self) -> RgbaImage {
        render::render(&self.scene, Layer::Interactive)
    }

    /// The composited scene as PNG, without selection or draft.
    pub fn export_png(&self) -> Result<Vec<u8>> {
        render::encode_png(&render::render(&self.scene, Layer::Export))
    }
}
