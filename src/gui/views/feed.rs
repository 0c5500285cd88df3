//! The airdrop feed: a card per opportunity.

use eframe::egui;
use tracing::warn;

use crate::feed::{mock_airdrops, Airdrop, AirdropStatus};

pub struct FeedView {
    airdrops: Vec<Airdrop>,
}

impl FeedView {
    pub fn new() -> Self {
        Self {
            airdrops: mock_airdrops(),
        }
    }

    pub fn ui(&mut self, ui: &mut egui::Ui) {
        ui.add_space(6.0);
        ui.heading("Hunt the Next Big Airdrop");
        ui.label("Discover verified crypto airdrops, track your eligibility, and maximize your earnings with AI-powered insights.");
        ui.add_space(10.0);

        egui::ScrollArea::vertical()
            .auto_shrink([false, false])
            .show(ui, |ui| {
                for airdrop in &self.airdrops {
                    render_card(ui, airdrop);
                    ui.add_space(8.0);
                }
            });
    }
}

fn status_color(status: AirdropStatus) -> egui::Color32 {
    match status {
        AirdropStatus::Active => egui::Color32::from_rgb(74, 222, 128),
        AirdropStatus::Upcoming => egui::Color32::from_rgb(250, 204, 21),
        AirdropStatus::Ended => egui::Color32::GRAY,
    }
}

fn render_card(ui: &mut egui::Ui, airdrop: &Airdrop) {
    ui.group(|ui| {
        ui.horizontal(|ui| {
            ui.label(egui::RichText::new(&airdrop.name).strong().size(16.0));
            ui.colored_label(status_color(airdrop.status), airdrop.status.label());
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                ui.label(egui::RichText::new(&airdrop.value).monospace());
            });
        });

        ui.label(&airdrop.description);
        ui.add_space(4.0);

        ui.horizontal_wrapped(|ui| {
            for tag in &airdrop.tags {
                ui.label(egui::RichText::new(format!("#{tag}")).small().weak());
            }
        });

        ui.add_space(4.0);
        ui.label(egui::RichText::new("Requirements").small().strong());
        for requirement in &airdrop.requirements {
            ui.label(format!("  • {requirement}"));
        }

        if let Some(url) = &airdrop.url {
            ui.add_space(4.0);
            if ui.button("Claim").clicked() {
                if let Err(e) = open::that(url) {
                    warn!("failed to open {}: {}", url, e);
                }
            }
        }
    });
}
