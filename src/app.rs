use eframe::egui;
use crate::style::{self, ThemeColors, ThemeMode};
use super::modules::{AppModule, image_converter::ImageConverter};

pub struct ConverterApp {
    module: Box<dyn AppModule>,
    theme_mode: ThemeMode,
}

impl ConverterApp {
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        let theme_mode = ThemeMode::from_egui(cc.egui_ctx.theme());
        style::apply_theme(&cc.egui_ctx, theme_mode);
        tracing::debug!("Starting with {:?} theme", theme_mode);

        Self {
            module: Box::new(ImageConverter::new()),
            theme_mode,
        }
    }

    fn header(&self, ctx: &egui::Context) {
        let colors = ThemeColors::for_mode(self.theme_mode);

        egui::TopBottomPanel::top("header")
            .frame(egui::Frame::new().fill(colors.panel_bg).inner_margin(12.0))
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.label(egui::RichText::new("🖼").size(28.0).color(colors.accent));
                    ui.vertical(|ui| {
                        ui.label(egui::RichText::new(self.module.get_title()).size(20.0).strong().color(colors.text));
                        let subtitle = self.module.get_subtitle();
                        if !subtitle.is_empty() {
                            ui.label(egui::RichText::new(subtitle).size(12.0).color(colors.weak_text));
                        }
                    });
                });
            });
    }
}

impl eframe::App for ConverterApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let system_theme = ThemeMode::from_egui(ctx.theme());
        if self.theme_mode != system_theme {
            self.theme_mode = system_theme;
            style::apply_theme(ctx, self.theme_mode);
        }

        self.header(ctx);

        egui::CentralPanel::default()
            .frame(egui::Frame::central_panel(&ctx.style()).inner_margin(egui::Margin::symmetric(24, 10)))
            .show(ctx, |ui| {
                self.module.ui(ui, ctx);
            });
    }
}
