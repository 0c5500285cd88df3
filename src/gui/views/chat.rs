//! Streaming chat with the analyst persona.

use std::sync::{mpsc, Arc, Mutex};

use eframe::egui;
use tracing::warn;

use crate::api;
use crate::api::chat::{ChatRole, ChatSession};
use crate::config::Config;

struct ChatMessage {
    role: ChatRole,
    text: String,
    is_error: bool,
}

enum StreamEvent {
    Chunk(String),
    Done,
    Failed(String),
}

pub struct ChatView {
    input: String,
    messages: Vec<ChatMessage>,
    session: Arc<Mutex<ChatSession>>,
    selected_model: &'static str,
    stream_rx: Option<mpsc::Receiver<StreamEvent>>,
}

impl ChatView {
    pub fn new(config: &Config) -> Self {
        let initial_model = if config.chat_model == api::PRO_MODEL {
            api::PRO_MODEL
        } else {
            api::FLASH_MODEL
        };
        let mut view = Self {
            input: String::new(),
            messages: Vec::new(),
            session: Arc::new(Mutex::new(ChatSession::new(
                initial_model,
                api::CHAT_SYSTEM_PROMPT,
            ))),
            selected_model: initial_model,
            stream_rx: None,
        };
        view.reset_session(initial_model);
        view
    }

    /// Recreate the session on model change; history resets with it.
    fn reset_session(&mut self, model: &'static str) {
        self.selected_model = model;
        self.session = Arc::new(Mutex::new(ChatSession::new(model, api::CHAT_SYSTEM_PROMPT)));
        self.messages = vec![ChatMessage {
            role: ChatRole::Model,
            text: api::CHAT_WELCOME.into(),
            is_error: false,
        }];
        self.stream_rx = None;
    }

    fn poll(&mut self) {
        let Some(rx) = &self.stream_rx else {
            return;
        };
        let mut done = false;
        loop {
            match rx.try_recv() {
                Ok(StreamEvent::Chunk(delta)) => {
                    if let Some(last) = self.messages.last_mut() {
                        last.text.push_str(&delta);
                    }
                }
                Ok(StreamEvent::Done) => {
                    done = true;
                    break;
                }
                Ok(StreamEvent::Failed(e)) => {
                    warn!("chat stream failed: {}", e);
                    if let Some(last) = self.messages.last_mut() {
                        last.text = "Error generating response. Please try again.".into();
                        last.is_error = true;
                    }
                    done = true;
                    break;
                }
                Err(mpsc::TryRecvError::Empty) => break,
                Err(mpsc::TryRecvError::Disconnected) => {
                    done = true;
                    break;
                }
            }
        }
        if done {
            self.stream_rx = None;
        }
    }

    fn send(&mut self, ctx: &egui::Context, config: &Config) {
        let text = self.input.trim().to_string();
        if text.is_empty() || self.stream_rx.is_some() {
            return;
        }
        self.input.clear();

        self.messages.push(ChatMessage {
            role: ChatRole::User,
            text: text.clone(),
            is_error: false,
        });
        self.messages.push(ChatMessage {
            role: ChatRole::Model,
            text: String::new(),
            is_error: false,
        });

        let (tx, rx) = mpsc::channel();
        self.stream_rx = Some(rx);

        let session = self.session.clone();
        let api_key = config.gemini_api_key.clone();
        let ctx = ctx.clone();
        std::thread::spawn(move || {
            let result = match session.lock() {
                Ok(mut session) => session.send_stream(&api_key, &text, |delta| {
                    let _ = tx.send(StreamEvent::Chunk(delta.to_string()));
                    ctx.request_repaint();
                }),
                Err(_) => Err(anyhow::anyhow!("chat session unavailable")),
            };
            match result {
                Ok(_) => {
                    let _ = tx.send(StreamEvent::Done);
                }
                Err(e) => {
                    let _ = tx.send(StreamEvent::Failed(e.to_string()));
                }
            }
            ctx.request_repaint();
        });
    }

    pub fn ui(&mut self, ui: &mut egui::Ui, config: &Config) {
        self.poll();
        let streaming = self.stream_rx.is_some();

        ui.horizontal(|ui| {
            ui.heading("Airdrop Analyst AI");
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                let mut selected = self.selected_model;
                egui::ComboBox::from_id_salt("chat_model")
                    .selected_text(model_label(selected))
                    .show_ui(ui, |ui| {
                        for model in [api::FLASH_MODEL, api::PRO_MODEL] {
                            ui.selectable_value(&mut selected, model, model_label(model));
                        }
                    });
                if selected != self.selected_model && !streaming {
                    self.reset_session(selected);
                }
            });
        });
        ui.separator();

        let input_height = 32.0;
        egui::ScrollArea::vertical()
            .auto_shrink([false, false])
            .stick_to_bottom(true)
            .max_height(ui.available_height() - input_height)
            .show(ui, |ui| {
                for message in &self.messages {
                    let (who, color) = match message.role {
                        ChatRole::User => ("You", egui::Color32::LIGHT_BLUE),
                        ChatRole::Model => ("Analyst", egui::Color32::LIGHT_GREEN),
                    };
                    ui.colored_label(color, who);
                    if message.is_error {
                        ui.colored_label(egui::Color32::LIGHT_RED, &message.text);
                    } else if message.text.is_empty() {
                        ui.spinner();
                    } else {
                        ui.label(&message.text);
                    }
                    ui.add_space(6.0);
                }
            });

        ui.horizontal(|ui| {
            let response = ui.add(
                egui::TextEdit::singleline(&mut self.input)
                    .hint_text("Ask about airdrops, tokens, scams...")
                    .desired_width(ui.available_width() - 70.0),
            );
            let submitted = response.lost_focus()
                && ui.input(|i| i.key_pressed(egui::Key::Enter));
            let clicked = ui
                .add_enabled(!streaming, egui::Button::new("Send"))
                .clicked();
            if submitted || clicked {
                self.send(ui.ctx(), config);
            }
        });
    }
}

fn model_label(model: &str) -> &'static str {
    if model == api::PRO_MODEL {
        "Gemini 3 Pro"
    } else {
        "Gemini 3 Flash"
    }
}
