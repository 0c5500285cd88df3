//! The six panels behind the navigation rail.

mod chat;
mod feed;
mod imagine;
mod live;
mod submit;
mod vision;

pub use chat::ChatView;
pub use feed::FeedView;
pub use imagine::ImagineView;
pub use live::LiveView;
pub use submit::SubmitView;
pub use vision::VisionView;

use eframe::egui;

/// Decode an encoded image into a GPU texture for display.
pub(crate) fn texture_from_bytes(
    ctx: &egui::Context,
    name: &str,
    bytes: &[u8],
) -> Option<egui::TextureHandle> {
    let decoded = image::load_from_memory(bytes).ok()?;
    let rgba = decoded.to_rgba8();
    let size = [rgba.width() as usize, rgba.height() as usize];
    let color_image = egui::ColorImage::from_rgba_unmultiplied(size, rgba.as_raw());
    Some(ctx.load_texture(name, color_image, egui::TextureOptions::LINEAR))
}
