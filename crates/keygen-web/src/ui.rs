//! Control panel overlay using bevy_egui

use bevy::prelude::*;
use bevy_egui::{egui, EguiContexts, EguiPrimaryContextPass};
use keygen_core::Status;

use crate::app::Generation;
use crate::network::{DownloadRequested, GenerateRequested};

pub struct UiPlugin;

impl Plugin for UiPlugin {
    fn build(&self, app: &mut App) {
        // Runs in EguiPrimaryContextPass for proper input handling (bevy_egui 0.38+)
        app.add_systems(EguiPrimaryContextPass, ui_system);
    }
}

fn status_color(status: &Status) -> egui::Color32 {
    match status {
        Status::Generated { .. } => egui::Color32::LIGHT_GREEN,
        Status::GenerationFailed | Status::ModelLoadFailed => egui::Color32::LIGHT_RED,
        Status::Ready | Status::Generating => egui::Color32::LIGHT_GRAY,
    }
}

fn ui_system(
    mut contexts: EguiContexts,
    generation: Res<Generation>,
    mut generate: MessageWriter<GenerateRequested>,
    mut download: MessageWriter<DownloadRequested>,
) {
    let Ok(ctx) = contexts.ctx_mut() else { return };
    let controller = &generation.0;

    egui::TopBottomPanel::top("controls").show(ctx, |ui| {
        ui.horizontal(|ui| {
            ui.heading("Key Generator");
            ui.separator();

            if ui
                .add_enabled(controller.can_generate(), egui::Button::new("Generate Key"))
                .clicked()
            {
                generate.write(GenerateRequested);
            }

            if ui
                .add_enabled(controller.can_download(), egui::Button::new("Download STL"))
                .clicked()
            {
                download.write(DownloadRequested);
            }

            ui.separator();

            let status = controller.status();
            if status.is_busy() {
                ui.spinner();
            }
            ui.colored_label(status_color(status), status.to_string());
        });
    });
}
