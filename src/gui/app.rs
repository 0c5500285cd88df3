//! Application shell: header, navigation rail, and the active panel.

use eframe::egui;

use crate::config::{load_config, save_config, Config};

use super::views::{ChatView, FeedView, ImagineView, LiveView, SubmitView, VisionView};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActiveView {
    Feed,
    Submit,
    Chat,
    Imagine,
    Vision,
    Live,
}

impl ActiveView {
    fn label(&self) -> &'static str {
        match self {
            ActiveView::Feed => "Feed",
            ActiveView::Submit => "Submit",
            ActiveView::Chat => "Chat",
            ActiveView::Imagine => "Imagine",
            ActiveView::Vision => "Vision",
            ActiveView::Live => "Live",
        }
    }
}

const NAV_ITEMS: [ActiveView; 6] = [
    ActiveView::Feed,
    ActiveView::Submit,
    ActiveView::Chat,
    ActiveView::Imagine,
    ActiveView::Vision,
    ActiveView::Live,
];

pub struct AirdropHubApp {
    config: Config,
    view: ActiveView,
    feed: FeedView,
    submit: SubmitView,
    chat: ChatView,
    imagine: ImagineView,
    vision: VisionView,
    live: LiveView,
}

impl AirdropHubApp {
    pub fn new(_cc: &eframe::CreationContext<'_>) -> Self {
        let config = load_config();
        let chat = ChatView::new(&config);
        Self {
            config,
            view: ActiveView::Feed,
            feed: FeedView::new(),
            submit: SubmitView::new(),
            chat,
            imagine: ImagineView::new(),
            vision: VisionView::new(),
            live: LiveView::new(),
        }
    }

    fn render_header(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("header").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("Airdrop Hub");
                ui.label(
                    egui::RichText::new("LIVE ALPHA")
                        .small()
                        .color(egui::Color32::LIGHT_GREEN),
                );

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    let response = ui.add(
                        egui::TextEdit::singleline(&mut self.config.gemini_api_key)
                            .password(true)
                            .hint_text("Gemini API key")
                            .desired_width(220.0),
                    );
                    if response.lost_focus() {
                        save_config(&self.config);
                    }
                    ui.label("Key:");
                });
            });
        });
    }

    fn render_nav(&mut self, ctx: &egui::Context) {
        egui::SidePanel::left("nav")
            .resizable(false)
            .default_width(110.0)
            .show(ctx, |ui| {
                ui.add_space(8.0);
                for item in NAV_ITEMS {
                    if ui
                        .selectable_label(self.view == item, item.label())
                        .clicked()
                    {
                        self.view = item;
                    }
                    ui.add_space(2.0);
                }
            });
    }
}

impl eframe::App for AirdropHubApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.render_header(ctx);
        self.render_nav(ctx);

        egui::CentralPanel::default().show(ctx, |ui| match self.view {
            ActiveView::Feed => self.feed.ui(ui),
            ActiveView::Submit => self.submit.ui(ui, &self.config, &mut self.view),
            ActiveView::Chat => self.chat.ui(ui, &self.config),
            ActiveView::Imagine => self.imagine.ui(ui, &self.config),
            ActiveView::Vision => self.vision.ui(ui, &self.config),
            ActiveView::Live => self.live.ui(ui, &self.config),
        });
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        save_config(&self.config);
    }
}
