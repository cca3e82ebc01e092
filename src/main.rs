use annotate_boxes::config::{self, AnnotatorConfig};
use annotate_boxes::export::{export_path, ExportFilter, ExportRecord};
use annotate_boxes::interaction::{Event, Interaction, Key, ResizeHandle};
use annotate_boxes::{
    merge, AnnotationId, AnnotationStore, AnnotatorError, BoundingBox, ImageSize, Point, Source,
    Tag, Vector,
};
use eframe::egui;
use image::DynamicImage;
use std::path::PathBuf;

// ── Styling ─────────────────────────────────────────────────────────────────

const MANUAL_COLOR: egui::Color32 = egui::Color32::from_rgb(0x25, 0x63, 0xeb);
const PREDICTED_COLOR: egui::Color32 = egui::Color32::from_rgb(0xea, 0x58, 0x0c);
const PREVIEW_COLOR: egui::Color32 = egui::Color32::from_rgb(0x05, 0x96, 0x69);

fn source_color(source: Source) -> egui::Color32 {
    match source {
        Source::Manual => MANUAL_COLOR,
        Source::Predicted => PREDICTED_COLOR,
    }
}

fn dashed_rect(painter: &egui::Painter, rect: egui::Rect, stroke: egui::Stroke, dash: f32, gap: f32) {
    let outline = [
        rect.left_top(),
        rect.right_top(),
        rect.right_bottom(),
        rect.left_bottom(),
        rect.left_top(),
    ];
    painter.extend(egui::Shape::dashed_line(&outline, stroke, dash, gap));
}

// ── App ─────────────────────────────────────────────────────────────────────

struct AnnotateApp {
    config: AnnotatorConfig,

    image_path: Option<PathBuf>,
    texture: Option<egui::TextureHandle>,
    raw_image: Option<DynamicImage>,

    store: AnnotationStore,
    interaction: Interaction,

    // pan & zoom
    pan: egui::Vec2,
    zoom: f32,
    panning: bool,

    status: String,
}

impl AnnotateApp {
    fn new(config: AnnotatorConfig, image_path: Option<PathBuf>) -> Self {
        let mut app = Self {
            config,
            image_path: None,
            texture: None,
            raw_image: None,
            store: AnnotationStore::new(ImageSize::new(0.0, 0.0)),
            interaction: Interaction::new(),
            pan: egui::Vec2::ZERO,
            zoom: 1.0,
            panning: false,
            status: String::new(),
        };
        if let Some(path) = image_path {
            app.open_image(path);
        }
        app
    }

    fn image_size(&self) -> (f32, f32) {
        let size = self.store.image_size();
        (size.width, size.height)
    }

    fn image_filename(&self) -> String {
        self.image_path
            .as_ref()
            .and_then(|p| p.file_name())
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string()
    }

    fn open_image(&mut self, path: PathBuf) {
        match image::open(&path) {
            Ok(img) => {
                let size = ImageSize::new(img.width() as f32, img.height() as f32);
                log::info!(
                    "Loaded {} ({}x{})",
                    path.display(),
                    size.width,
                    size.height
                );
                self.store.load_image(size);
                self.interaction.reset();
                self.raw_image = Some(img);
                self.texture = None;
                self.image_path = Some(path);
                self.pan = egui::Vec2::ZERO;
                self.zoom = 1.0;
                self.status = "Drag on the image to draw a box".to_string();
            }
            Err(e) => {
                let err = AnnotatorError::ImageLoad(path, e);
                log::warn!("{err}");
                self.status = err.to_string();
            }
        }
    }

    fn pick_image(&mut self) {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("Images", &["png", "jpg", "jpeg"])
            .pick_file()
        {
            self.open_image(path);
        }
    }

    /// Reads a prediction response from disk and merges it. The generation is
    /// captured before the dialog so a response for a replaced image is
    /// dropped.
    fn load_predictions(&mut self) {
        let generation = self.store.generation();
        let Some(path) = rfd::FileDialog::new()
            .add_filter("Predictions", &["json"])
            .pick_file()
        else {
            return;
        };
        let result = std::fs::read_to_string(&path)
            .map_err(|e| AnnotatorError::Read(path.clone(), e))
            .and_then(|body| merge::parse_batch(&body));
        match result {
            Ok(batch) => match merge::apply_predictions_for(&mut self.store, generation, batch) {
                Some(admitted) => {
                    self.status = format!("Loaded {admitted} predicted boxes");
                }
                None => {
                    self.status = "Predictions belong to a different image".to_string();
                }
            },
            Err(e) => {
                log::warn!("{e}");
                self.status = format!("Prediction failed: {e}");
            }
        }
    }

    fn export(&mut self, filter: ExportFilter) {
        let Some(image_path) = self.image_path.clone() else {
            return;
        };
        let default_path = export_path(&image_path, &self.config.export.suffix);
        let mut dialog = rfd::FileDialog::new().add_filter("JSON", &["json"]);
        if let Some(name) = default_path.file_name().and_then(|n| n.to_str()) {
            dialog = dialog.set_file_name(name);
        }
        if let Some(dir) = default_path.parent() {
            dialog = dialog.set_directory(dir);
        }
        let Some(out_path) = dialog.save_file() else {
            return;
        };

        let record = ExportRecord::project(&self.store, &self.image_filename(), filter);
        self.status = match record.write(&out_path, self.config.export.pretty) {
            Ok(()) => format!(
                "Exported {} boxes to {}",
                record.annotations.len(),
                out_path.display()
            ),
            Err(e) => {
                log::warn!("{e}");
                e.to_string()
            }
        };
    }

    fn dispatch(&mut self, event: Event) {
        log::trace!("{event:?}");
        self.interaction.handle(event, &mut self.store);
    }

    /// Convert image-space coords to screen-space
    fn image_to_screen(&self, canvas_rect: egui::Rect, img_pos: Point) -> egui::Pos2 {
        let (w, h) = self.image_size();
        let center = canvas_rect.center();
        center + self.pan + (egui::vec2(img_pos.x, img_pos.y) - egui::vec2(w, h) * 0.5) * self.zoom
    }

    /// Convert screen-space coords to image-space
    fn screen_to_image(&self, canvas_rect: egui::Rect, screen_pos: egui::Pos2) -> Point {
        let (w, h) = self.image_size();
        let center = canvas_rect.center();
        let rel = screen_pos - center - self.pan;
        Point::new(rel.x / self.zoom + w * 0.5, rel.y / self.zoom + h * 0.5)
    }

    fn box_on_screen(&self, canvas_rect: egui::Rect, rect: BoundingBox) -> egui::Rect {
        egui::Rect::from_two_pos(
            self.image_to_screen(canvas_rect, Point::new(rect.x, rect.y)),
            self.image_to_screen(canvas_rect, Point::new(rect.right(), rect.bottom())),
        )
    }

    fn image_rect_on_screen(&self, canvas_rect: egui::Rect) -> egui::Rect {
        let (w, h) = self.image_size();
        self.box_on_screen(canvas_rect, BoundingBox::new(0.0, 0.0, w, h))
    }

    fn ensure_texture(&mut self, ctx: &egui::Context) {
        if self.texture.is_some() {
            return;
        }
        if let Some(ref img) = self.raw_image {
            let rgba = img.to_rgba8();
            let size = [rgba.width() as usize, rgba.height() as usize];
            let pixels = rgba.as_flat_samples();
            let color_image =
                egui::ColorImage::from_rgba_unmultiplied(size, pixels.as_slice());
            self.texture = Some(ctx.load_texture(
                "image",
                color_image,
                egui::TextureOptions::LINEAR,
            ));
        }
    }

    fn draw_annotations(&self, painter: &egui::Painter, canvas_rect: egui::Rect) {
        let selected = self.store.selected();
        for ann in self.store.annotations() {
            let is_selected = selected == Some(ann.id());
            let rect = self.box_on_screen(canvas_rect, ann.rect);
            let stroke = egui::Stroke::new(
                if is_selected { 3.0 } else { 2.0 },
                source_color(ann.source()),
            );
            match ann.source() {
                Source::Manual => {
                    painter.rect_stroke(rect, 0.0, stroke, egui::StrokeKind::Middle);
                }
                Source::Predicted => dashed_rect(painter, rect, stroke, 8.0, 4.0),
            }
            painter.text(
                rect.left_top() + egui::vec2(2.0, -2.0),
                egui::Align2::LEFT_BOTTOM,
                ann.tag.name(),
                egui::FontId::proportional(12.0),
                stroke.color,
            );
            if is_selected {
                self.draw_handles(painter, canvas_rect, ann.rect);
            }
        }

        // Live preview stays unclamped while drawing.
        if let Some(preview) = self.interaction.drawing_preview() {
            let rect = self.box_on_screen(canvas_rect, preview);
            dashed_rect(painter, rect, egui::Stroke::new(2.0, PREVIEW_COLOR), 4.0, 4.0);
        }
    }

    fn draw_handles(&self, painter: &egui::Painter, canvas_rect: egui::Rect, rect: BoundingBox) {
        let half = self.config.canvas.handle_radius * 0.6;
        for handle in ResizeHandle::ALL {
            let center = self.image_to_screen(canvas_rect, handle.position(rect));
            let square = egui::Rect::from_center_size(center, egui::vec2(half * 2.0, half * 2.0));
            painter.rect_filled(square, 1.0, egui::Color32::WHITE);
            painter.rect_stroke(
                square,
                1.0,
                egui::Stroke::new(1.0, MANUAL_COLOR),
                egui::StrokeKind::Middle,
            );
        }
    }

    fn record_at(&self, canvas_rect: egui::Rect, screen_pos: egui::Pos2) -> Option<AnnotationId> {
        let p = self.screen_to_image(canvas_rect, screen_pos);
        self.store.hit_test(p).map(|a| a.id().clone())
    }

    fn handle_at(
        &self,
        canvas_rect: egui::Rect,
        screen_pos: egui::Pos2,
    ) -> Option<(AnnotationId, ResizeHandle)> {
        let ann = self.store.selected_annotation()?;
        let p = self.screen_to_image(canvas_rect, screen_pos);
        let radius = self.config.canvas.handle_radius / self.zoom;
        ResizeHandle::hit(ann.rect, p, radius).map(|handle| (ann.id().clone(), handle))
    }

    fn toolbar(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            if ui.button("Open image…").clicked() {
                self.pick_image();
            }
            let has_image = self.image_path.is_some();
            ui.add_enabled_ui(has_image, |ui| {
                if ui.button("Load predictions…").clicked() {
                    self.load_predictions();
                }
                if ui.button("Clear predictions").clicked() {
                    merge::apply_predictions(&mut self.store, Vec::new());
                }
                ui.separator();
                ui.menu_button("Export", |ui| {
                    let default = self.config.export.filter;
                    for (label, filter) in [
                        ("All boxes", ExportFilter::All),
                        ("Manual only", ExportFilter::Only(Source::Manual)),
                        ("Predicted only", ExportFilter::Only(Source::Predicted)),
                    ] {
                        let text = if filter == default {
                            format!("{label} (default)")
                        } else {
                            label.to_string()
                        };
                        if ui.button(text).clicked() {
                            ui.close_menu();
                            self.export(filter);
                        }
                    }
                });
            });
            ui.separator();
            ui.label(format!("Zoom: {:.0}%", self.zoom * 100.0));
            ui.separator();
            ui.label(self.status.as_str());
        });
    }

    fn inspector(&mut self, ui: &mut egui::Ui) {
        ui.heading("Selected element");
        let Some(ann) = self.store.selected_annotation() else {
            ui.label("Click a box to select it.");
            return;
        };
        let id = ann.id().clone();
        let current = ann.tag;
        let source = match ann.source() {
            Source::Manual => "Manual",
            Source::Predicted => "AI generated",
        };
        ui.label(format!("Source: {source}"));
        ui.label(format!(
            "Box: {:.0}, {:.0}  {:.0}×{:.0}",
            ann.rect.x, ann.rect.y, ann.rect.width, ann.rect.height
        ));
        ui.separator();
        ui.label("Type:");
        for tag in Tag::ALL {
            if ui.selectable_label(tag == current, tag.name()).clicked() && tag != current {
                self.store.retag(&id, tag);
            }
        }
    }

    fn handle_canvas_input(
        &mut self,
        ctx: &egui::Context,
        response: &egui::Response,
        canvas_rect: egui::Rect,
    ) {
        let primary = egui::PointerButton::Primary;

        if response.double_clicked() {
            if let Some(pos) = response.interact_pointer_pos() {
                if let Some(id) = self.record_at(canvas_rect, pos) {
                    self.dispatch(Event::RecordDoubleClicked(id));
                }
            }
        } else if response.clicked() {
            if let Some(pos) = response.interact_pointer_pos() {
                match self.record_at(canvas_rect, pos) {
                    Some(id) => self.dispatch(Event::RecordClicked(id)),
                    None => {
                        let p = self.screen_to_image(canvas_rect, pos);
                        self.dispatch(Event::PointerDown(p));
                        self.dispatch(Event::PointerUp(p));
                    }
                }
            }
        }

        if response.drag_started_by(primary) {
            let origin = ctx.input(|i| i.pointer.press_origin());
            let current = response.interact_pointer_pos();
            if let (Some(origin), Some(current)) = (origin, current) {
                if let Some((id, handle)) = self.handle_at(canvas_rect, origin) {
                    self.dispatch(Event::ResizeStart { id, handle });
                } else if let Some(id) = self.record_at(canvas_rect, origin) {
                    self.dispatch(Event::DragStart(id.clone()));
                    // catch up on the motion egui needed to recognise the drag
                    let delta = self.screen_to_image(canvas_rect, current)
                        - self.screen_to_image(canvas_rect, origin);
                    self.dispatch(Event::DragBy { id, delta });
                } else {
                    let p = self.screen_to_image(canvas_rect, origin);
                    self.dispatch(Event::PointerDown(p));
                }
            }
        } else if response.dragged_by(primary) {
            let latest = ctx.input(|i| i.pointer.latest_pos());
            if self.interaction.is_drawing() {
                match latest {
                    Some(pos) if canvas_rect.contains(pos) => {
                        let p = self.screen_to_image(canvas_rect, pos);
                        self.dispatch(Event::PointerMove(p));
                    }
                    _ => self.dispatch(Event::PointerLeave),
                }
            } else if let Some(id) = self.interaction.active_record().cloned() {
                if self.interaction.is_dragging() {
                    let d = response.drag_delta() / self.zoom;
                    self.dispatch(Event::DragBy {
                        id,
                        delta: Vector::new(d.x, d.y),
                    });
                } else if let Some(pos) = latest {
                    let pointer = self.screen_to_image(canvas_rect, pos);
                    self.dispatch(Event::ResizeTo { id, pointer });
                }
            }
        }

        if response.drag_stopped_by(primary) {
            if self.interaction.is_drawing() {
                match ctx.input(|i| i.pointer.latest_pos()) {
                    Some(pos) => {
                        let p = self.screen_to_image(canvas_rect, pos);
                        self.dispatch(Event::PointerUp(p));
                    }
                    None => self.dispatch(Event::PointerLeave),
                }
            } else if self.interaction.is_dragging() {
                self.dispatch(Event::DragEnd);
            } else if self.interaction.is_resizing() {
                self.dispatch(Event::ResizeEnd);
            }
        }
    }
}

// ── eframe App impl ────────────────────────────────────────────────────────

impl eframe::App for AnnotateApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.ensure_texture(ctx);

        // Keyboard shortcuts
        if !ctx.wants_keyboard_input() {
            let (delete, escape) = ctx.input(|i| {
                (
                    i.key_pressed(egui::Key::Delete) || i.key_pressed(egui::Key::Backspace),
                    i.key_pressed(egui::Key::Escape),
                )
            });
            if delete {
                self.dispatch(Event::Key(Key::Delete));
            }
            if escape {
                self.dispatch(Event::Key(Key::Escape));
            }
        }

        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| self.toolbar(ui));
        egui::SidePanel::right("inspector")
            .min_width(180.0)
            .show(ctx, |ui| self.inspector(ui));

        // Canvas
        egui::CentralPanel::default().show(ctx, |ui| {
            let (response, painter) = ui.allocate_painter(
                ui.available_size(),
                egui::Sense::click_and_drag(),
            );
            let canvas_rect = response.rect;

            // Draw background
            painter.rect_filled(canvas_rect, 0.0, egui::Color32::from_gray(40));

            let Some(ref tex) = self.texture else {
                painter.text(
                    canvas_rect.center(),
                    egui::Align2::CENTER_CENTER,
                    "Open an image to start annotating",
                    egui::FontId::proportional(18.0),
                    egui::Color32::from_gray(180),
                );
                return;
            };
            let img_rect = self.image_rect_on_screen(canvas_rect);
            painter.image(
                tex.id(),
                img_rect,
                egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                egui::Color32::WHITE,
            );

            self.draw_annotations(&painter, canvas_rect);

            // Handle pan (middle mouse button)
            let middle_down = ctx.input(|i| i.pointer.middle_down());
            if middle_down {
                let delta = ctx.input(|i| i.pointer.delta());
                self.pan += delta;
                self.panning = true;
            } else {
                self.panning = false;
            }

            // Handle zoom (scroll wheel)
            let scroll_delta = ctx.input(|i| i.smooth_scroll_delta.y);
            if scroll_delta != 0.0 && response.hovered() {
                let zoom_factor = 1.0 + scroll_delta * 0.002;
                let canvas = &self.config.canvas;
                let new_zoom = (self.zoom * zoom_factor).clamp(canvas.min_zoom, canvas.max_zoom);
                if let Some(cursor) = response.hover_pos() {
                    let cursor_rel = cursor - canvas_rect.center() - self.pan;
                    self.pan -= cursor_rel * (new_zoom / self.zoom - 1.0);
                }
                self.zoom = new_zoom;
            }

            if !self.panning {
                self.handle_canvas_input(ctx, &response, canvas_rect);
            }
        });
    }
}

// ── Main ────────────────────────────────────────────────────────────────────

fn main() -> eframe::Result {
    env_logger::init();

    let config = config::load_config();
    let image_path = std::env::args().nth(1).map(PathBuf::from);
    if let Some(path) = &image_path {
        if !path.exists() {
            eprintln!("File not found: {}", path.display());
            std::process::exit(1);
        }
    }

    let title = match image_path.as_ref().and_then(|p| p.file_name()) {
        Some(name) => format!("annotate-boxes — {}", name.to_string_lossy()),
        None => "annotate-boxes".to_string(),
    };

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([config.window.width, config.window.height])
            .with_title(&title),
        ..Default::default()
    };

    eframe::run_native(
        &title,
        options,
        Box::new(move |_cc| Ok(Box::new(AnnotateApp::new(config, image_path)))),
    )
}
