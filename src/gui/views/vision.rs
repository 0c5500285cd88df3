//! Image analysis panel. Images arrive by drag-and-drop.

use std::sync::mpsc;

use eframe::egui;
use tracing::warn;

use crate::api;
use crate::api::vision::analyze_image;
use crate::config::Config;

pub struct VisionView {
    image_bytes: Option<Vec<u8>>,
    texture: Option<egui::TextureHandle>,
    prompt: String,
    response: String,
    error: Option<String>,
    rx: Option<mpsc::Receiver<Result<String, String>>>,
}

impl VisionView {
    pub fn new() -> Self {
        Self {
            image_bytes: None,
            texture: None,
            prompt: String::new(),
            response: String::new(),
            error: None,
            rx: None,
        }
    }

    fn poll(&mut self) {
        let Some(rx) = &self.rx else {
            return;
        };
        match rx.try_recv() {
            Ok(Ok(text)) => {
                self.response = text;
                self.rx = None;
            }
            Ok(Err(e)) => {
                warn!("image analysis failed: {}", e);
                self.error = Some("Error analyzing image.".into());
                self.rx = None;
            }
            Err(mpsc::TryRecvError::Empty) => {}
            Err(mpsc::TryRecvError::Disconnected) => self.rx = None,
        }
    }

    fn take_dropped_file(&mut self, ctx: &egui::Context) {
        let dropped = ctx.input(|i| i.raw.dropped_files.clone());
        let Some(file) = dropped.first() else {
            return;
        };
        let bytes = if let Some(bytes) = &file.bytes {
            Some(bytes.to_vec())
        } else if let Some(path) = &file.path {
            std::fs::read(path).ok()
        } else {
            None
        };
        let Some(bytes) = bytes else {
            self.error = Some("Could not read the dropped file.".into());
            return;
        };

        match super::texture_from_bytes(ctx, "vision-preview", &bytes) {
            Some(texture) => {
                self.texture = Some(texture);
                self.image_bytes = Some(bytes);
                self.response.clear();
                self.error = None;
            }
            None => self.error = Some("Unsupported image format.".into()),
        }
    }

    fn start_analyze(&mut self, ctx: &egui::Context, config: &Config) {
        let Some(bytes) = self.image_bytes.clone() else {
            return;
        };
        let (tx, rx) = mpsc::channel();
        self.rx = Some(rx);
        self.response.clear();
        self.error = None;

        let api_key = config.gemini_api_key.clone();
        let prompt = self.prompt.clone();
        let ctx = ctx.clone();
        std::thread::spawn(move || {
            let result = analyze_image(&api_key, api::FLASH_MODEL, &prompt, &bytes)
                .map_err(|e| e.to_string());
            let _ = tx.send(result);
            ctx.request_repaint();
        });
    }

    pub fn ui(&mut self, ui: &mut egui::Ui, config: &Config) {
        self.poll();
        self.take_dropped_file(ui.ctx());
        let busy = self.rx.is_some();

        ui.add_space(6.0);
        ui.heading("Multimodal Vision");
        ui.label("Drop an image anywhere in the window, then ask about it.");
        ui.add_space(10.0);

        egui::ScrollArea::vertical()
            .auto_shrink([false, false])
            .show(ui, |ui| {
                match &self.texture {
                    Some(texture) => {
                        ui.add(egui::Image::new(texture).max_width(420.0));
                        if ui.button("Clear image").clicked() {
                            self.texture = None;
                            self.image_bytes = None;
                            self.response.clear();
                            self.error = None;
                        }
                    }
                    None => {
                        ui.group(|ui| {
                            ui.set_min_height(120.0);
                            ui.centered_and_justified(|ui| {
                                ui.label("Drop a PNG, JPEG, WEBP, GIF, or BMP here");
                            });
                        });
                    }
                }
                ui.add_space(8.0);

                ui.add(
                    egui::TextEdit::singleline(&mut self.prompt)
                        .hint_text("What do you want to know about this image?")
                        .desired_width(f32::INFINITY),
                );
                ui.add_space(6.0);

                ui.horizontal(|ui| {
                    let can_analyze =
                        !busy && self.image_bytes.is_some() && !self.prompt.trim().is_empty();
                    if ui
                        .add_enabled(can_analyze, egui::Button::new("Analyze"))
                        .clicked()
                    {
                        self.start_analyze(ui.ctx(), config);
                    }
                    if busy {
                        ui.spinner();
                    }
                });

                if let Some(error) = &self.error {
                    ui.colored_label(egui::Color32::LIGHT_RED, error);
                }
                if !self.response.is_empty() {
                    ui.add_space(8.0);
                    ui.group(|ui| {
                        ui.label(&self.response);
                    });
                }
            });
    }
}
