//! Bevy application setup

use bevy::prelude::*;
use bevy_egui::EguiPlugin;
use bevy_picking::DefaultPickingPlugins;
use keygen_core::{GenerationController, Viewport};

use crate::models::ModelsPlugin;
use crate::network::NetworkPlugin;
use crate::scene::ScenePlugin;
use crate::ui::UiPlugin;

/// Generate/download workflow, including the session's key identifier
#[derive(Debug, Resource)]
pub struct Generation(pub GenerationController);

/// Size of the render surface, tracked from window resize messages
#[derive(Debug, Clone, Copy, Resource, Default)]
pub struct ViewportState(pub Viewport);

/// Orbit camera state with damped inertia
///
/// Input accumulates into the `pending_*` fields and `target_*` goals; each
/// frame [`CameraSettings::step`] applies a damped share of them, so motion
/// keeps gliding briefly after the pointer is released.
#[derive(Debug, Clone, Resource)]
pub struct CameraSettings {
    pub distance: f32,
    pub target_distance: f32, // For smooth zoom
    pub azimuth: f32,
    pub elevation: f32,
    pub pending_azimuth: f32,
    pub pending_elevation: f32,
    pub target: Vec3,
    pub target_focus: Vec3, // For smooth panning
    pub sensitivity: f32,
    pub zoom_speed: f32,
    /// Share of the remaining motion applied per 60 Hz frame
    pub damping: f32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            distance: 50.0, // mm; frames a 22 mm key
            target_distance: 50.0,
            azimuth: 0.0,
            elevation: 0.0,
            pending_azimuth: 0.0,
            pending_elevation: 0.0,
            target: Vec3::ZERO,
            target_focus: Vec3::ZERO,
            sensitivity: 0.005,
            zoom_speed: 0.1,
            damping: 0.05,
        }
    }
}

impl CameraSettings {
    pub const MIN_DISTANCE: f32 = 5.0;
    pub const MAX_DISTANCE: f32 = 90.0;
    const ELEVATION_LIMIT: f32 = 1.55;

    /// Advance the damped state by `dt` seconds
    pub fn step(&mut self, dt: f32) {
        let frames = (dt * 60.0).max(0.0);
        let applied = 1.0 - (1.0 - self.damping).powf(frames);

        let d_azimuth = self.pending_azimuth * applied;
        self.azimuth += d_azimuth;
        self.pending_azimuth -= d_azimuth;

        let d_elevation = self.pending_elevation * applied;
        self.elevation = (self.elevation + d_elevation)
            .clamp(-Self::ELEVATION_LIMIT, Self::ELEVATION_LIMIT);
        self.pending_elevation -= d_elevation;

        self.distance += (self.target_distance - self.distance) * applied;
        self.target += (self.target_focus - self.target) * applied;
    }

    /// Apply a scroll or pinch zoom factor to the goal distance
    pub fn zoom(&mut self, factor: f32) {
        self.target_distance =
            (self.target_distance * factor).clamp(Self::MIN_DISTANCE, Self::MAX_DISTANCE);
    }

    /// Zoom by a wheel delta measured in lines; one event moves at most half the distance
    pub fn scroll_zoom(&mut self, lines: f32) {
        let factor = (1.0 - lines * self.zoom_speed).clamp(0.5, 1.5);
        self.zoom(factor);
    }

    /// Camera position relative to the orbit target (Y is up)
    pub fn orbit_offset(&self) -> Vec3 {
        let (sin_az, cos_az) = self.azimuth.sin_cos();
        let (sin_el, cos_el) = self.elevation.sin_cos();
        self.distance * Vec3::new(cos_el * sin_az, sin_el, cos_el * cos_az)
    }
}

/// Run the Bevy application
pub fn run() {
    App::new()
        .insert_resource(ClearColor(Color::srgb_u8(0x33, 0x33, 0x33))) // Neutral dark gray
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: "Key Generator".to_string(),
                canvas: Some("#keygen-canvas".to_string()),
                fit_canvas_to_parent: true,
                prevent_default_event_handling: false,
                ..default()
            }),
            ..default()
        }))
        // Must be added BEFORE EguiPlugin so it can detect PickingPlugin
        .add_plugins(DefaultPickingPlugins)
        .add_plugins(EguiPlugin::default())
        .init_resource::<CameraSettings>()
        .init_resource::<ViewportState>()
        .add_plugins(NetworkPlugin)
        .add_plugins(ScenePlugin)
        .add_plugins(ModelsPlugin)
        .add_plugins(UiPlugin)
        .run();
}
