use eframe::egui;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ThemeMode {
    Light,
    Dark,
}

impl ThemeMode {
    pub fn from_egui(theme: egui::Theme) -> Self {
        match theme {
            egui::Theme::Dark => ThemeMode::Dark,
            egui::Theme::Light => ThemeMode::Light,
        }
    }
}

pub struct ColorPalette;

impl ColorPalette {
    pub const ACCENT_CYAN: egui::Color32 = egui::Color32::from_rgb(0, 230, 230);
    pub const ACCENT_CYAN_DEEP: egui::Color32 = egui::Color32::from_rgb(0, 179, 179);

    pub const CONVERT_GREEN: egui::Color32 = egui::Color32::from_rgb(0, 230, 118);
    pub const CONVERT_GREEN_DEEP: egui::Color32 = egui::Color32::from_rgb(0, 179, 107);

    pub const RESET_RED: egui::Color32 = egui::Color32::from_rgb(255, 102, 102);

    pub const NAVY_PANEL: egui::Color32 = egui::Color32::from_rgb(35, 41, 58);
    pub const NAVY_BACKGROUND: egui::Color32 = egui::Color32::from_rgb(24, 28, 36);

    pub const LIGHT_PANEL: egui::Color32 = egui::Color32::from_rgb(249, 250, 251);
    pub const LIGHT_TRACK: egui::Color32 = egui::Color32::from_rgb(229, 231, 235);
    pub const LIGHT_BORDER: egui::Color32 = egui::Color32::from_rgb(209, 213, 219);
    pub const SLATE_TEXT: egui::Color32 = egui::Color32::from_rgb(107, 114, 128);
    pub const INK: egui::Color32 = egui::Color32::from_rgb(31, 41, 55);

    pub const SILVER_TEXT: egui::Color32 = egui::Color32::from_rgb(179, 179, 179);
    pub const DARK_BORDER: egui::Color32 = egui::Color32::from_rgb(82, 82, 91);
}

/// Per-theme colors shared by every panel.
#[derive(Debug, Clone, Copy)]
pub struct ThemeColors {
    pub panel_bg: egui::Color32,
    pub border: egui::Color32,
    pub text: egui::Color32,
    pub weak_text: egui::Color32,
    pub accent: egui::Color32,
    pub status: egui::Color32,
}

impl ThemeColors {
    pub fn for_mode(theme: ThemeMode) -> Self {
        match theme {
            ThemeMode::Dark => Self {
                panel_bg: ColorPalette::NAVY_PANEL,
                border: ColorPalette::DARK_BORDER,
                text: egui::Color32::WHITE,
                weak_text: ColorPalette::SILVER_TEXT,
                accent: ColorPalette::ACCENT_CYAN,
                status: ColorPalette::CONVERT_GREEN,
            },
            ThemeMode::Light => Self {
                panel_bg: ColorPalette::LIGHT_PANEL,
                border: ColorPalette::LIGHT_BORDER,
                text: ColorPalette::INK,
                weak_text: ColorPalette::SLATE_TEXT,
                accent: ColorPalette::ACCENT_CYAN_DEEP,
                status: ColorPalette::CONVERT_GREEN_DEEP,
            },
        }
    }
}

pub fn apply_theme(ctx: &egui::Context, theme: ThemeMode) {
    let mut style = (*ctx.style()).clone();

    style.visuals = match theme {
        ThemeMode::Dark => egui::Visuals::dark(),
        ThemeMode::Light => egui::Visuals::light(),
    };
    for widget in [
        &mut style.visuals.widgets.noninteractive,
        &mut style.visuals.widgets.inactive,
        &mut style.visuals.widgets.hovered,
        &mut style.visuals.widgets.active,
    ] {
        widget.corner_radius = egui::CornerRadius::same(4);
    }

    if theme == ThemeMode::Dark {
        style.visuals.panel_fill = ColorPalette::NAVY_BACKGROUND;
        style.visuals.window_fill = ColorPalette::NAVY_BACKGROUND;
        style.visuals.extreme_bg_color = ColorPalette::NAVY_PANEL;
    } else {
        style.visuals.panel_fill = egui::Color32::WHITE;
        style.visuals.extreme_bg_color = ColorPalette::LIGHT_TRACK;
    }
    style.visuals.selection.bg_fill = ColorPalette::ACCENT_CYAN_DEEP;

    style.spacing.item_spacing = egui::vec2(8.0, 8.0);
    style.spacing.button_padding = egui::vec2(12.0, 6.0);
    style.spacing.slider_width = 180.0;

    ctx.set_style(style);
}

pub fn panel_frame(colors: &ThemeColors) -> egui::Frame {
    egui::Frame::new()
        .fill(colors.panel_bg)
        .stroke(egui::Stroke::new(1.0, colors.border))
        .corner_radius(8.0)
        .inner_margin(12.0)
}

/// Flat filled button in the style of the action row.
pub fn action_button(text: &str, fill: egui::Color32, text_color: egui::Color32, width: f32) -> egui::Button<'static> {
    egui::Button::new(egui::RichText::new(text.to_string()).size(14.0).strong().color(text_color))
        .fill(fill)
        .stroke(egui::Stroke::NONE)
        .corner_radius(6.0)
        .min_size(egui::vec2(width, 36.0))
}
