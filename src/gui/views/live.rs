//! Live voice conversation panel.

use std::time::Duration;

use eframe::egui;

use crate::api::live::{LiveConfig, LiveSession, LiveStatus};
use crate::config::Config;

pub struct LiveView {
    session: Option<LiveSession>,
}

impl LiveView {
    pub fn new() -> Self {
        Self { session: None }
    }

    fn status(&self) -> LiveStatus {
        self.session
            .as_ref()
            .map(|s| s.status())
            .unwrap_or(LiveStatus::Disconnected)
    }

    pub fn ui(&mut self, ui: &mut egui::Ui, config: &Config) {
        let status = self.status();
        let volume = self.session.as_ref().map(|s| s.volume()).unwrap_or(0.0);

        // Keep the visualizer and status text moving while a session runs.
        if status != LiveStatus::Disconnected {
            ui.ctx().request_repaint_after(Duration::from_millis(100));
        }

        ui.add_space(6.0);
        ui.heading("Live Voice");
        ui.label("Have a real-time voice conversation. Requires a microphone.");
        ui.add_space(16.0);

        ui.vertical_centered(|ui| {
            let (status_text, color) = match status {
                LiveStatus::Disconnected => ("DISCONNECTED", egui::Color32::GRAY),
                LiveStatus::Connecting => ("CONNECTING", egui::Color32::LIGHT_YELLOW),
                LiveStatus::Connected => ("CONNECTED", egui::Color32::LIGHT_GREEN),
                LiveStatus::Error => ("ERROR", egui::Color32::LIGHT_RED),
            };
            ui.label(egui::RichText::new(status_text).strong().color(color));
            ui.add_space(8.0);

            // Speech RMS rarely exceeds ~0.25; stretch it for the meter.
            let level = (volume * 4.0).clamp(0.0, 1.0);
            ui.add(egui::ProgressBar::new(level).desired_width(240.0));
            ui.add_space(12.0);

            if status == LiveStatus::Connecting {
                ui.spinner();
                ui.add_space(8.0);
            }
            if status == LiveStatus::Error {
                ui.colored_label(
                    egui::Color32::LIGHT_RED,
                    "Connection failed. Please try again.",
                );
                ui.add_space(8.0);
            }

            match status {
                LiveStatus::Disconnected | LiveStatus::Error => {
                    if ui.button("Start Conversation").clicked() {
                        let live_config = LiveConfig {
                            voice: config.live_voice.clone(),
                            ..Default::default()
                        };
                        self.session = Some(LiveSession::start(
                            config.gemini_api_key.clone(),
                            live_config,
                        ));
                    }
                }
                LiveStatus::Connecting | LiveStatus::Connected => {
                    if ui.button("End Session").clicked() {
                        if let Some(session) = &self.session {
                            session.stop();
                        }
                    }
                }
            }

            ui.add_space(12.0);
            ui.label(
                egui::RichText::new(format!("Status: {}", status.label()))
                    .small()
                    .weak(),
            );
        });
    }
}
