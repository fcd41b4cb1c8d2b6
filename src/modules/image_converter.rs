use eframe::egui;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::time::Instant;
use crate::style::{self, ColorPalette, ThemeColors, ThemeMode};
use super::AppModule;
use super::image_export::OutputFormat;

pub mod ic_batch;
pub mod ic_convert;
pub mod ic_log;
pub mod ic_progress;
pub mod ic_scan;

use ic_convert::{ConversionJob, Preview, THUMBNAIL_SIDE};
use ic_log::FailureLog;
use ic_progress::{ProgressSink, ProgressState, WorkerEvent};

pub const DEFAULT_QUALITY: u8 = 80;
pub const SLIDER_QUALITY: std::ops::RangeInclusive<u8> = 10..=100;

pub struct ImageConverter {
    folder: Option<PathBuf>,
    files: Vec<PathBuf>,
    target_format: OutputFormat,
    quality: u8,
    progress: ProgressState,
    worker_events: Option<Receiver<WorkerEvent>>,
    preview: Option<egui::TextureHandle>,
    preview_dirty: bool,
    failure_log: FailureLog,
}

impl ImageConverter {
    pub fn new() -> Self {
        Self::with_log(FailureLog::in_working_dir())
    }

    pub fn with_log(failure_log: FailureLog) -> Self {
        Self {
            folder: None,
            files: Vec::new(),
            target_format: OutputFormat::default(),
            quality: DEFAULT_QUALITY,
            progress: ProgressState::default(),
            worker_events: None,
            preview: None,
            preview_dirty: false,
            failure_log,
        }
    }

    pub fn is_converting(&self) -> bool {
        self.worker_events.is_some()
    }

    fn file_count_label(&self) -> String {
        format!("{} files selected", self.files.len())
    }

    pub fn set_folder(&mut self, folder: PathBuf) {
        self.folder = Some(folder);
        self.refresh_listing();
    }

    /// Re-reads the selected folder for the file list and queues the
    /// thumbnail of the first match.
    fn refresh_listing(&mut self) {
        self.files = match &self.folder {
            Some(folder) if folder.is_dir() => ic_scan::scan_folder(folder).unwrap_or_else(|e| {
                tracing::warn!("Could not list {}: {}", folder.display(), e);
                Vec::new()
            }),
            _ => Vec::new(),
        };
        self.preview = None;
        self.preview_dirty = !self.files.is_empty();
    }

    pub fn reset(&mut self) {
        if self.is_converting() {
            return;
        }
        self.folder = None;
        self.files.clear();
        self.target_format = OutputFormat::default();
        self.quality = DEFAULT_QUALITY;
        self.progress = ProgressState::default();
        self.preview = None;
        self.preview_dirty = false;
    }

    pub fn start_conversion(&mut self, repaint: Option<egui::Context>) {
        if self.is_converting() {
            return;
        }
        let Some(folder) = self.folder.clone() else {
            self.progress.message = "❌ Please select a folder and format.".to_string();
            return;
        };

        let job = match ConversionJob::prepare(&folder, self.target_format, self.quality) {
            Ok(job) => job,
            Err(e) => {
                tracing::error!("Could not prepare job: {}", e);
                self.failure_log.record("Critical error", e.detail());
                self.progress.message = format!("❌ Error: {}", e);
                return;
            }
        };

        let (tx, rx) = mpsc::channel();
        let sink = ProgressSink::new(tx, repaint);
        match ic_batch::spawn_worker(job, self.failure_log.clone(), sink) {
            Ok(_) => self.worker_events = Some(rx),
            Err(e) => {
                tracing::error!("Could not start conversion worker: {}", e);
                self.failure_log.record("Critical error", format!("failed to start worker thread: {}", e));
                self.progress.message = format!("❌ Error: {}", e);
            }
        }
    }

    /// Drains the worker queue on the interface thread. Controls come back
    /// on any terminal event or when the worker disappears.
    fn poll_worker(&mut self, now: Instant) {
        let Some(rx) = &self.worker_events else {
            return;
        };

        let mut finished = false;
        loop {
            match rx.try_recv() {
                Ok(event) => {
                    finished |= event.is_terminal();
                    self.progress.apply(event, now);
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    if !finished {
                        tracing::error!("Conversion worker exited without reporting");
                        self.progress.abandon(now);
                        finished = true;
                    }
                    break;
                }
            }
            if finished {
                break;
            }
        }

        if finished {
            self.worker_events = None;
            self.refresh_listing();
        }
    }

    fn ensure_preview(&mut self, ctx: &egui::Context) {
        if !self.preview_dirty {
            return;
        }
        self.preview_dirty = false;
        let Some(first) = self.files.first() else {
            return;
        };
        match ic_convert::load_preview(first) {
            Preview::Ready(image) => {
                self.preview = Some(ctx.load_texture("converter_preview", image, egui::TextureOptions::LINEAR));
            }
            Preview::Unavailable(reason) => {
                tracing::debug!("No preview for {}: {}", first.display(), reason);
            }
        }
    }

    fn render_folder_picker(&mut self, ui: &mut egui::Ui, colors: &ThemeColors) {
        let busy = self.is_converting();
        ui.horizontal(|ui| {
            ui.label(egui::RichText::new("Image Folder:").size(14.0).color(colors.text));
            let browse = style::action_button("📁 Browse", colors.accent, ColorPalette::INK, 110.0);
            if ui
                .add_enabled(!busy, browse)
                .on_hover_text("Select the folder containing images to convert.")
                .clicked()
            {
                if let Some(dir) = rfd::FileDialog::new().pick_folder() {
                    self.set_folder(dir);
                }
            }
        });

        let folder_text = self.folder.as_deref().map(Path::display).map(|d| d.to_string()).unwrap_or_default();
        ui.label(egui::RichText::new(folder_text).size(12.0).color(colors.accent));
    }

    fn render_file_list(&self, ui: &mut egui::Ui, colors: &ThemeColors) {
        ui.label(egui::RichText::new(self.file_count_label()).size(12.0).color(colors.weak_text));

        ui.horizontal(|ui| {
            style::panel_frame(colors)
                .show(ui, |ui| {
                    ui.set_width(240.0);
                    ui.set_height(THUMBNAIL_SIDE as f32 - 24.0);
                    let row_height = ui.text_style_height(&egui::TextStyle::Body);
                    egui::ScrollArea::vertical()
                        .id_salt("converter_file_list")
                        .auto_shrink([false, false])
                        .show_rows(ui, row_height, self.files.len(), |ui, rows| {
                            for path in &self.files[rows] {
                                ui.label(egui::RichText::new(ic_scan::display_name(path)).color(colors.text));
                            }
                        });
                })
                .response
                .on_hover_text("Preview of image files in the selected folder.");

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Min), |ui| {
                let side = THUMBNAIL_SIDE as f32;
                let (rect, response) = ui.allocate_exact_size(egui::vec2(side, side), egui::Sense::hover());
                ui.painter().rect_filled(rect, 6.0, colors.panel_bg);

                if let Some(texture) = &self.preview {
                    let image_rect = egui::Rect::from_center_size(rect.center(), texture.size_vec2());
                    egui::Image::new(egui::load::SizedTexture::from_handle(texture)).paint_at(ui, image_rect);
                }
                response.on_hover_text("Thumbnail of the first image in the folder.");
            });
        });
    }

    fn render_options(&mut self, ui: &mut egui::Ui, colors: &ThemeColors) {
        ui.add_enabled_ui(!self.is_converting(), |ui| {
            ui.horizontal(|ui| {
                ui.label(egui::RichText::new("Choose Format:").size(14.0).color(colors.text));
                for format in OutputFormat::all() {
                    let selected = self.target_format == format;
                    let (fill, text) = if selected {
                        (colors.accent, ColorPalette::INK)
                    } else {
                        (colors.panel_bg, colors.text)
                    };
                    let button = egui::Button::new(egui::RichText::new(format.extension()).size(12.0).color(text))
                        .fill(fill)
                        .stroke(egui::Stroke::new(1.0, colors.border))
                        .corner_radius(6.0)
                        .min_size(egui::vec2(42.0, 26.0));
                    if ui.add(button).on_hover_text("Select the output image format.").clicked() {
                        self.target_format = format;
                    }
                }
            });

            ui.horizontal(|ui| {
                ui.label(egui::RichText::new("Compression (1-100):").size(14.0).color(colors.text));
                ui.add(egui::Slider::new(&mut self.quality, SLIDER_QUALITY))
                    .on_hover_text(self.target_format.quality_hint());
            });
        });
    }

    fn render_actions(&mut self, ui: &mut egui::Ui, ctx: &egui::Context) {
        let busy = self.is_converting();
        ui.horizontal(|ui| {
            let convert = style::action_button("🚀 Convert Images", ColorPalette::CONVERT_GREEN, ColorPalette::INK, 170.0);
            if ui.add_enabled(!busy, convert).on_hover_text("Convert or reset the form.").clicked() {
                self.start_conversion(Some(ctx.clone()));
            }

            let reset = style::action_button("🔄 Reset", ColorPalette::RESET_RED, egui::Color32::WHITE, 110.0);
            if ui.add_enabled(!busy, reset).on_hover_text("Convert or reset the form.").clicked() {
                self.reset();
            }
        });
    }

    fn render_progress(&self, ui: &mut egui::Ui, colors: &ThemeColors) {
        if !self.progress.visible {
            return;
        }

        let (rect, _) = ui.allocate_exact_size(egui::vec2(ui.available_width(), 24.0), egui::Sense::hover());
        ui.painter().rect_filled(rect, 4.0, colors.panel_bg);

        let fill_rect = egui::Rect::from_min_size(
            rect.min,
            egui::vec2(rect.width() * self.progress.fraction(), rect.height()),
        );
        ui.painter().rect_filled(fill_rect, 4.0, colors.accent);

        ui.painter().text(
            rect.center(),
            egui::Align2::CENTER_CENTER,
            format!("{:.0}%", self.progress.percent),
            egui::FontId::proportional(12.0),
            colors.text,
        );
    }

    fn render_status(&self, ui: &mut egui::Ui, colors: &ThemeColors) {
        ui.vertical_centered(|ui| {
            ui.label(egui::RichText::new(&self.progress.message).size(14.0).strong().color(colors.status));
        });
    }
}

impl AppModule for ImageConverter {
    fn ui(&mut self, ui: &mut egui::Ui, ctx: &egui::Context) {
        let now = Instant::now();
        self.poll_worker(now);
        self.ensure_preview(ctx);
        if let Some(remaining) = self.progress.tick(now) {
            ctx.request_repaint_after(remaining);
        }

        let colors = ThemeColors::for_mode(ThemeMode::from_egui(ctx.theme()));

        ui.add_space(4.0);
        self.render_folder_picker(ui, &colors);
        self.render_file_list(ui, &colors);

        ui.add_space(8.0);
        self.render_options(ui, &colors);

        ui.add_space(12.0);
        ui.vertical_centered(|ui| self.render_actions(ui, ctx));

        ui.add_space(8.0);
        self.render_progress(ui, &colors);
        self.render_status(ui, &colors);
    }

    fn get_title(&self) -> String {
        "Batch Image Converter".to_string()
    }

    fn get_subtitle(&self) -> String {
        "Convert a folder of images to one format".to_string()
    }
}
