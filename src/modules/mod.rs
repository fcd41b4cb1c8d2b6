use eframe::egui;
pub mod image_converter;
pub mod image_export;

pub trait AppModule {
    fn ui(&mut self, ui: &mut egui::Ui, ctx: &egui::Context);
    fn get_title(&self) -> String;
    fn get_subtitle(&self) -> String {
        String::new()
    }
}
