//! Image generation panel.

use std::sync::mpsc;

use eframe::egui;
use tracing::warn;

use crate::api::image::{generate_image, GeneratedImage, ASPECT_RATIOS};
use crate::config::Config;

pub struct ImagineView {
    prompt: String,
    aspect_ratio: &'static str,
    rx: Option<mpsc::Receiver<Result<Vec<GeneratedImage>, String>>>,
    images: Vec<(GeneratedImage, egui::TextureHandle)>,
    error: Option<String>,
    saved_note: Option<String>,
}

impl ImagineView {
    pub fn new() -> Self {
        Self {
            prompt: String::new(),
            aspect_ratio: ASPECT_RATIOS[0],
            rx: None,
            images: Vec::new(),
            error: None,
            saved_note: None,
        }
    }

    fn poll(&mut self, ctx: &egui::Context) {
        let Some(rx) = &self.rx else {
            return;
        };
        match rx.try_recv() {
            Ok(Ok(generated)) => {
                self.images = generated
                    .into_iter()
                    .enumerate()
                    .filter_map(|(i, img)| {
                        super::texture_from_bytes(ctx, &format!("imagine-{i}"), &img.bytes)
                            .map(|tex| (img, tex))
                    })
                    .collect();
                if self.images.is_empty() {
                    self.error = Some("The model returned no images.".into());
                }
                self.rx = None;
            }
            Ok(Err(e)) => {
                warn!("image generation failed: {}", e);
                self.error = Some("Failed to generate image. Please try again.".into());
                self.rx = None;
            }
            Err(mpsc::TryRecvError::Empty) => {}
            Err(mpsc::TryRecvError::Disconnected) => self.rx = None,
        }
    }

    fn start_generate(&mut self, ctx: &egui::Context, config: &Config) {
        let (tx, rx) = mpsc::channel();
        self.rx = Some(rx);
        self.images.clear();
        self.error = None;
        self.saved_note = None;

        let api_key = config.gemini_api_key.clone();
        let prompt = self.prompt.clone();
        let aspect_ratio = self.aspect_ratio;
        let ctx = ctx.clone();
        std::thread::spawn(move || {
            let result =
                generate_image(&api_key, &prompt, aspect_ratio).map_err(|e| e.to_string());
            let _ = tx.send(result);
            ctx.request_repaint();
        });
    }

    fn save_image(&mut self, index: usize) {
        let Some((image, _)) = self.images.get(index) else {
            return;
        };
        let extension = match image.mime_type.as_str() {
            "image/jpeg" => "jpg",
            _ => "png",
        };
        let dir = dirs::download_dir().unwrap_or_else(std::env::temp_dir);
        let stamp = chrono::Local::now().format("%Y%m%d-%H%M%S");
        let path = dir.join(format!("airdrop-hub-{stamp}-{index}.{extension}"));
        match std::fs::write(&path, &image.bytes) {
            Ok(()) => self.saved_note = Some(format!("Saved to {}", path.display())),
            Err(e) => {
                warn!("failed to save image: {}", e);
                self.error = Some("Failed to save image.".into());
            }
        }
    }

    pub fn ui(&mut self, ui: &mut egui::Ui, config: &Config) {
        self.poll(ui.ctx());
        let busy = self.rx.is_some();

        ui.add_space(6.0);
        ui.heading("Imagine & Create");
        ui.label("Turn your words into stunning visuals.");
        ui.add_space(10.0);

        ui.add(
            egui::TextEdit::multiline(&mut self.prompt)
                .hint_text("A futuristic city with flying cars at sunset, cyberpunk style...")
                .desired_rows(3)
                .desired_width(f32::INFINITY),
        );
        ui.add_space(6.0);

        ui.horizontal(|ui| {
            for ratio in ASPECT_RATIOS {
                ui.selectable_value(&mut self.aspect_ratio, ratio, ratio);
            }
            let can_generate = !busy && !self.prompt.trim().is_empty();
            if ui
                .add_enabled(can_generate, egui::Button::new("Generate"))
                .clicked()
            {
                self.start_generate(ui.ctx(), config);
            }
            if busy {
                ui.spinner();
            }
        });

        if let Some(error) = &self.error {
            ui.colored_label(egui::Color32::LIGHT_RED, error);
        }
        if let Some(note) = &self.saved_note {
            ui.colored_label(egui::Color32::LIGHT_GREEN, note);
        }
        ui.add_space(8.0);

        let mut save_clicked = None;
        egui::ScrollArea::vertical()
            .auto_shrink([false, false])
            .show(ui, |ui| {
                for (index, (_, texture)) in self.images.iter().enumerate() {
                    ui.add(egui::Image::new(texture).max_width(460.0));
                    if ui.button("Save").clicked() {
                        save_clicked = Some(index);
                    }
                    ui.add_space(8.0);
                }
            });
        if let Some(index) = save_clicked {
            self.save_image(index);
        }
    }
}
