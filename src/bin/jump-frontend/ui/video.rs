use egui::{vec2, Align2, Color32, FontId, Ui};

use crate::model::Model;

const CAPTION_OFFSET: f32 = 12.;
const CAPTION_SIZE: f32 = 28.;

pub fn render_video(model: &Model, ui: &mut Ui) {
    let Some(texture) = &model.view.texture else {
        ui.centered_and_justified(|ui| {
            ui.label("No video yet");
        });
        return;
    };

    // Fit inside the panel, keeping aspect ratio
    let size = texture.size_vec2();
    let available = ui.available_size();
    let scale = (available.x / size.x).min(available.y / size.y);
    let response = ui.image(texture, size * scale);

    if let Some(caption) = &model.view.caption {
        ui.painter().text(
            response.rect.left_top() + vec2(CAPTION_OFFSET, CAPTION_OFFSET),
            Align2::LEFT_TOP,
            caption,
            FontId::proportional(CAPTION_SIZE),
            Color32::YELLOW,
        );
    }
}
