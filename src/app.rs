//! eframe front end: translates egui input into editor events and applies
//! the resulting effects.

use eframe::egui;
use image::RgbaImage;
use std::sync::{mpsc, Arc};
use std::time::{Duration, Instant};

use crate::config::Config;
use crate::editor::{Editor, Effect, Mode};
use crate::error::Result;
use crate::geometry::Point;
use crate::input::{InputEvent, Key, Modifiers, Shortcut};
use crate::props::{PanelFields, PropertyPanel, PropertySync, RectSpec};
use crate::store::{self, ImageStore, StoredImage};

const FEEDBACK_DURATION: Duration = Duration::from_secs(2);
const SAVE_NAME: &str = "edited_image.png";
const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "gif", "webp"];

// ── Property Panel ──────────────────────────────────────────────────────────

#[derive(Default)]
struct PanelState {
    fields: PanelFields,
    color_text: String,
}

impl PropertyPanel for PanelState {
    fn read(&self) -> PanelFields {
        self.fields.clone()
    }

    fn write(&mut self, spec: &RectSpec) {
        self.fields = PanelFields::from(spec);
        self.color_text = spec.hex();
    }
}

enum ListAction {
    Select(usize),
    Remove(usize),
}

// ── App ─────────────────────────────────────────────────────────────────────

pub struct AnnotateApp {
    editor: Editor,
    sync: PropertySync,
    panel: PanelState,

    store: Arc<dyn ImageStore>,
    gallery: Vec<StoredImage>,
    uploads_tx: mpsc::Sender<Result<StoredImage>>,
    uploads_rx: mpsc::Receiver<Result<StoredImage>>,
    pending_uploads: usize,

    texture: Option<egui::TextureHandle>,
    dirty: bool,
    feedback: Option<(String, Instant)>,
}

impl AnnotateApp {
    pub fn new(config: &Config, store: Arc<dyn ImageStore>, background: Option<RgbaImage>) -> Self {
        let editor = Editor::new(config);
        let mut panel = PanelState::default();
        let mut sync = PropertySync::new(RectSpec::placeholder(editor.color()));
        sync.reset(&mut panel);
        let (uploads_tx, uploads_rx) = mpsc::channel();

        let mut app = Self {
            editor,
            sync,
            panel,
            store,
            gallery: Vec::new(),
            uploads_tx,
            uploads_rx,
            pending_uploads: 0,
            texture: None,
            dirty: true,
            feedback: None,
        };
        if let Some(img) = background {
            let effects = app.editor.set_background(img);
            app.apply(effects);
        }
        app.refresh_gallery();
        app
    }

    fn apply(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::Redraw => self.dirty = true,
                Effect::ShowProperties(spec) => self.sync.push(&mut self.panel, &spec),
                Effect::ResetProperties => self.sync.reset(&mut self.panel),
                Effect::Feedback(feedback) => {
                    self.feedback = Some((feedback.to_string(), Instant::now()));
                }
                Effect::Save => self.save(),
            }
        }
    }

    fn dispatch(&mut self, event: InputEvent) {
        let effects = self.editor.handle(event);
        self.apply(effects);
    }

    fn refresh_gallery(&mut self) {
        match self.store.list() {
            Ok(images) => self.gallery = images,
            Err(e) => log::error!("Failed to list images: {e}"),
        }
    }

    /// Uploads on a worker thread; the result arrives through `uploads_rx`.
    fn save(&mut self) {
        let bytes = match self.editor.export_png() {
            Ok(bytes) => bytes,
            Err(e) => {
                log::error!("Failed to export canvas: {e}");
                return;
            }
        };
        log::info!("Saving image ({} bytes)", bytes.len());
        let store = Arc::clone(&self.store);
        let tx = self.uploads_tx.clone();
        std::thread::spawn(move || {
            let _ = tx.send(store.upload(SAVE_NAME, &bytes));
        });
        self.pending_uploads += 1;
    }

    fn poll_uploads(&mut self) {
        while let Ok(result) = self.uploads_rx.try_recv() {
            self.pending_uploads = self.pending_uploads.saturating_sub(1);
            match result {
                Ok(stored) => {
                    log::info!("Uploaded {} as #{}", stored.name, stored.id);
                    self.refresh_gallery();
                }
                Err(e) => log::error!("Upload failed: {e}"),
            }
        }
    }

    fn set_background(&mut self, loaded: Result<RgbaImage>) {
        match loaded {
            Ok(img) => {
                let effects = self.editor.set_background(img);
                self.apply(effects);
            }
            Err(e) => log::error!("Failed to load image: {e}"),
        }
    }

    fn open_file(&mut self) {
        let Some(path) = rfd::FileDialog::new()
            .add_filter("Images", IMAGE_EXTENSIONS)
            .pick_file()
        else {
            return;
        };
        self.set_background(store::load_image(&path));
    }

    fn ensure_texture(&mut self, ctx: &egui::Context) {
        if !self.dirty && self.texture.is_some() {
            return;
        }
        let img = self.editor.render();
        let size = [img.width() as usize, img.height() as usize];
        let color_image = egui::ColorImage::from_rgba_unmultiplied(size, img.as_raw());
        match &mut self.texture {
            Some(tex) => tex.set(color_image, egui::TextureOptions::NEAREST),
            None => {
                self.texture = Some(ctx.load_texture(
                    "canvas",
                    color_image,
                    egui::TextureOptions::NEAREST,
                ));
            }
        }
        self.dirty = false;
    }

    fn handle_keys(&mut self, ctx: &egui::Context) {
        if ctx.wants_keyboard_input() {
            return;
        }
        let presses: Vec<(Key, Modifiers)> = ctx.input(|i| {
            i.events
                .iter()
                .filter_map(|ev| match ev {
                    egui::Event::Key {
                        key,
                        pressed: true,
                        modifiers,
                        ..
                    } => Some((map_key(*key), map_modifiers(*modifiers))),
                    _ => None,
                })
                .collect()
        });
        for (key, modifiers) in presses {
            self.dispatch(InputEvent::KeyDown { key, modifiers });
        }
    }

    fn toolbar(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            if ui
                .button(self.editor.mode().to_string())
                .on_hover_text("Space")
                .clicked()
            {
                self.dispatch(InputEvent::Shortcut(Shortcut::ToggleMode));
            }
            ui.separator();
            if ui.button("Open Image…").clicked() {
                self.open_file();
            }
            let actions = [
                ("Save Image", "Ctrl/⌘ + S", Shortcut::Save),
                ("Clear Rectangles", "Ctrl/⌘ + Delete", Shortcut::ClearAll),
                ("Undo Last Rectangle", "", Shortcut::UndoLastCreated),
                ("Greyscale", "G", Shortcut::Greyscale),
            ];
            for (label, hint, shortcut) in actions {
                let button = ui.button(label);
                let button = if hint.is_empty() {
                    button
                } else {
                    button.on_hover_text(hint)
                };
                if button.clicked() {
                    self.dispatch(InputEvent::Shortcut(shortcut));
                }
            }
            ui.separator();
            let history = self.editor.history();
            let (can_undo, can_redo) = (history.can_undo(), history.can_redo());
            if ui.add_enabled(can_undo, egui::Button::new("Undo")).clicked() {
                self.dispatch(InputEvent::Shortcut(Shortcut::Undo));
            }
            if ui.add_enabled(can_redo, egui::Button::new("Redo")).clicked() {
                self.dispatch(InputEvent::Shortcut(Shortcut::Redo));
            }
            if self.pending_uploads > 0 {
                ui.separator();
                ui.spinner();
            }
        });
    }

    fn properties(&mut self, ui: &mut egui::Ui) {
        ui.heading("Rectangle");
        let mut changed = false;
        egui::Grid::new("rect_properties")
            .num_columns(2)
            .show(ui, |ui| {
                let f = &mut self.panel.fields;
                changed |= field(ui, "X", &mut f.x);
                changed |= field(ui, "Y", &mut f.y);
                changed |= field(ui, "Width", &mut f.width);
                changed |= field(ui, "Height", &mut f.height);
                changed |= field(ui, "Red", &mut f.red);
                changed |= field(ui, "Green", &mut f.green);
                changed |= field(ui, "Blue", &mut f.blue);
                changed |= field(ui, "Alpha %", &mut f.alpha);
            });

        ui.horizontal(|ui| {
            ui.label("Color");
            let edit = ui.add(egui::TextEdit::singleline(&mut self.panel.color_text).desired_width(120.0));
            if edit.lost_focus() {
                let text = self.panel.color_text.clone();
                match self.sync.apply_color_text(&mut self.panel, &text) {
                    Ok(_) => changed = true,
                    Err(e) => log::debug!("{e}"),
                }
            }
            let spec = self.sync.last();
            let [r, g, b, a] = spec.color().to_rgba8();
            let (rect, _) = ui.allocate_exact_size(egui::vec2(40.0, 18.0), egui::Sense::hover());
            ui.painter()
                .rect_filled(rect, 2.0, egui::Color32::from_rgba_unmultiplied(r, g, b, a));
        });

        if changed {
            let spec = self.sync.pull(&self.panel);
            let effects = self.editor.apply_properties(spec);
            self.apply(effects);
        }
    }

    fn rectangle_list(&mut self, ui: &mut egui::Ui) {
        ui.heading("Rectangles");
        let scene = self.editor.scene();
        let mut action = None;
        egui::ScrollArea::vertical()
            .id_salt("rect_list")
            .max_height(240.0)
            .show(ui, |ui| {
                for (i, r) in scene.rects.iter().enumerate() {
                    ui.horizontal(|ui| {
                        let label = format!(
                            "Rectangle {}  X:{} Y:{} W:{} H:{}",
                            i + 1,
                            r.x,
                            r.y,
                            r.width,
                            r.height
                        );
                        if ui.selectable_label(scene.selected == Some(i), label).clicked() {
                            action = Some(ListAction::Select(i));
                        }
                        if ui.small_button("×").clicked() {
                            action = Some(ListAction::Remove(i));
                        }
                    });
                }
            });
        let effects = match action {
            Some(ListAction::Select(i)) => self.editor.select(i),
            Some(ListAction::Remove(i)) => self.editor.remove(i),
            None => return,
        };
        self.apply(effects);
    }

    fn gallery(&mut self, ui: &mut egui::Ui) {
        ui.heading("Images");
        if ui.button("Refresh").clicked() {
            self.refresh_gallery();
        }
        let mut picked = None;
        egui::ScrollArea::vertical().id_salt("gallery").show(ui, |ui| {
            for image in &self.gallery {
                let uri = format!("file://{}", image.path.display());
                let thumb = ui
                    .add(
                        egui::Image::new(uri)
                            .max_width(160.0)
                            .sense(egui::Sense::click()),
                    )
                    .on_hover_text(image.name.as_str());
                if thumb.clicked() {
                    picked = Some(image.clone());
                }
            }
        });
        if let Some(image) = picked {
            let loaded = self.store.load(&image);
            self.set_background(loaded);
        }
    }

    fn canvas(&mut self, ui: &mut egui::Ui) {
        let Some(texture_id) = self.texture.as_ref().map(|t| t.id()) else {
            return;
        };
        let (w, h) = self.editor.scene().size();
        let busy = self.editor.is_busy();
        let mode = self.editor.mode();
        let mut events = Vec::new();

        egui::ScrollArea::both().show(ui, |ui| {
            let (response, painter) =
                ui.allocate_painter(egui::vec2(w as f32, h as f32), egui::Sense::click_and_drag());
            let canvas_rect = response.rect;
            painter.rect_filled(canvas_rect, 0.0, egui::Color32::from_gray(40));
            painter.image(
                texture_id,
                canvas_rect,
                egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                egui::Color32::WHITE,
            );

            if response.hovered() && mode == Mode::Draw {
                ui.ctx().set_cursor_icon(egui::CursorIcon::Crosshair);
            }

            let (pressed, released, moved, pos) = ui.input(|i| {
                (
                    i.pointer.primary_pressed(),
                    i.pointer.primary_released(),
                    i.pointer.delta() != egui::Vec2::ZERO,
                    i.pointer.interact_pos(),
                )
            });
            let Some(pos) = pos else {
                return;
            };
            let rel = pos - canvas_rect.min;
            let p = Point::new(rel.x.floor() as i32, rel.y.floor() as i32);

            let started = pressed && response.hovered();
            if started {
                events.push(InputEvent::PointerDown(p));
            }
            if moved && (busy || started) {
                events.push(InputEvent::PointerMove(p));
            }
            if released {
                events.push(InputEvent::PointerUp(p));
            }
        });

        for event in events {
            self.dispatch(event);
        }
    }

    fn show_feedback(&mut self, ctx: &egui::Context) {
        let Some((message, shown_at)) = &self.feedback else {
            return;
        };
        let elapsed = shown_at.elapsed();
        if elapsed >= FEEDBACK_DURATION {
            self.feedback = None;
            return;
        }
        egui::Area::new(egui::Id::new("action_feedback"))
            .anchor(egui::Align2::RIGHT_TOP, egui::vec2(-20.0, 20.0))
            .order(egui::Order::Foreground)
            .show(ctx, |ui| {
                egui::Frame::default()
                    .fill(egui::Color32::from_rgb(0xff, 0x42, 0x42))
                    .corner_radius(4.0)
                    .inner_margin(egui::Margin::symmetric(20, 10))
                    .show(ui, |ui| {
                        ui.colored_label(egui::Color32::WHITE, message.as_str());
                    });
            });
        ctx.request_repaint_after(FEEDBACK_DURATION - elapsed);
    }
}

// ── Widget & Input Helpers ──────────────────────────────────────────────────

fn field(ui: &mut egui::Ui, label: &str, value: &mut String) -> bool {
    ui.label(label);
    let changed = ui
        .add(egui::TextEdit::singleline(value).desired_width(60.0))
        .changed();
    ui.end_row();
    changed
}

fn map_key(key: egui::Key) -> Key {
    match key {
        egui::Key::Delete => Key::Delete,
        egui::Key::Backspace => Key::Backspace,
        egui::Key::Escape => Key::Escape,
        egui::Key::Space => Key::Space,
        egui::Key::ArrowLeft => Key::ArrowLeft,
        egui::Key::ArrowRight => Key::ArrowRight,
        egui::Key::ArrowUp => Key::ArrowUp,
        egui::Key::ArrowDown => Key::ArrowDown,
        egui::Key::Z => Key::Z,
        egui::Key::S => Key::S,
        egui::Key::G => Key::G,
        _ => Key::Other,
    }
}

fn map_modifiers(m: egui::Modifiers) -> Modifiers {
    Modifiers {
        ctrl: m.ctrl,
        shift: m.shift,
        alt: m.alt,
        meta: m.mac_cmd,
    }
}

// ── eframe App impl ────────────────────────────────────────────────────────

impl eframe::App for AnnotateApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_uploads();
        self.handle_keys(ctx);

        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| self.toolbar(ui));

        egui::SidePanel::left("gallery")
            .default_width(180.0)
            .show(ctx, |ui| self.gallery(ui));

        egui::SidePanel::right("properties")
            .default_width(220.0)
            .show(ctx, |ui| {
                self.properties(ui);
                ui.separator();
                self.rectangle_list(ui);
            });

        // Render after every panel had a chance to mutate the scene.
        egui::CentralPanel::default().show(ctx, |ui| {
            self.ensure_texture(ui.ctx());
            self.canvas(ui);
        });
        if self.dirty {
            ctx.request_repaint();
        }

        self.show_feedback(ctx);
        if self.pending_uploads > 0 {
            ctx.request_repaint_after(Duration::from_millis(200));
        }
    }
}
