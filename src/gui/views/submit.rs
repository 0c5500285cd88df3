//! Airdrop submission form with AI-polished descriptions.

use std::sync::mpsc;

use eframe::egui;
use tracing::warn;

use crate::api::text::enhance_airdrop_description;
use crate::config::Config;
use crate::gui::app::ActiveView;

pub struct SubmitView {
    name: String,
    notes: String,
    description: String,
    enhance_rx: Option<mpsc::Receiver<Result<String, String>>>,
    error: Option<String>,
}

impl SubmitView {
    pub fn new() -> Self {
        Self {
            name: String::new(),
            notes: String::new(),
            description: String::new(),
            enhance_rx: None,
            error: None,
        }
    }

    fn poll(&mut self) {
        let Some(rx) = &self.enhance_rx else {
            return;
        };
        match rx.try_recv() {
            Ok(Ok(polished)) => {
                self.description = polished;
                self.enhance_rx = None;
            }
            Ok(Err(e)) => {
                warn!("enhancement failed: {}", e);
                self.error = Some("AI enhancement failed. Please try again.".into());
                self.enhance_rx = None;
            }
            Err(mpsc::TryRecvError::Empty) => {}
            Err(mpsc::TryRecvError::Disconnected) => self.enhance_rx = None,
        }
    }

    fn start_enhance(&mut self, ctx: &egui::Context, config: &Config) {
        let (tx, rx) = mpsc::channel();
        self.enhance_rx = Some(rx);
        self.error = None;

        let api_key = config.gemini_api_key.clone();
        let name = self.name.clone();
        let notes = self.notes.clone();
        let ctx = ctx.clone();
        std::thread::spawn(move || {
            let result = enhance_airdrop_description(&api_key, &name, &notes)
                .map_err(|e| e.to_string());
            let _ = tx.send(result);
            ctx.request_repaint();
        });
    }

    pub fn ui(&mut self, ui: &mut egui::Ui, config: &Config, view: &mut ActiveView) {
        self.poll();
        let enhancing = self.enhance_rx.is_some();

        ui.add_space(6.0);
        ui.heading("Publish Airdrop");
        ui.label("Contribute to the community. Submissions are vetted by our AI and community moderators.");
        ui.add_space(10.0);

        egui::ScrollArea::vertical()
            .auto_shrink([false, false])
            .show(ui, |ui| {
                ui.label(egui::RichText::new("Project Name").small().strong());
                ui.add(
                    egui::TextEdit::singleline(&mut self.name)
                        .hint_text("e.g. StarkNet")
                        .desired_width(f32::INFINITY),
                );
                ui.add_space(8.0);

                ui.label(egui::RichText::new("Rough Notes / Details").small().strong());
                ui.add(
                    egui::TextEdit::multiline(&mut self.notes)
                        .hint_text("Paste URLs, requirements, or rough points here...")
                        .desired_rows(5)
                        .desired_width(f32::INFINITY),
                );
                ui.add_space(8.0);

                ui.horizontal(|ui| {
                    let can_enhance =
                        !enhancing && !self.name.is_empty() && !self.notes.is_empty();
                    if ui
                        .add_enabled(
                            can_enhance,
                            egui::Button::new("Generate Professional Description"),
                        )
                        .clicked()
                    {
                        self.start_enhance(ui.ctx(), config);
                    }
                    if enhancing {
                        ui.spinner();
                    }
                });
                if let Some(error) = &self.error {
                    ui.colored_label(egui::Color32::LIGHT_RED, error);
                }
                ui.add_space(8.0);

                ui.label(egui::RichText::new("Final Description").small().strong());
                ui.add(
                    egui::TextEdit::multiline(&mut self.description)
                        .hint_text("The polished description will appear here...")
                        .desired_rows(7)
                        .desired_width(f32::INFINITY),
                );
                ui.add_space(10.0);

                let can_submit = !self.name.is_empty() && !self.description.is_empty();
                if ui
                    .add_enabled(can_submit, egui::Button::new("Submit Airdrop"))
                    .clicked()
                {
                    // Demo only: nothing is persisted.
                    self.name.clear();
                    self.notes.clear();
                    self.description.clear();
                    self.error = None;
                    *view = ActiveView::Feed;
                }
            });
    }
}
