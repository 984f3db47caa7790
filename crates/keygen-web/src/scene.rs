//! 3D scene management: camera, lights, orbit controls and resize handling

use bevy::input::mouse::{MouseMotion, MouseScrollUnit, MouseWheel};
use bevy::prelude::*;
use bevy::window::WindowResized;

use crate::app::{CameraSettings, ViewportState};

pub struct ScenePlugin;

impl Plugin for ScenePlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, setup_scene)
            .add_systems(Update, (handle_resize, update_camera.after(handle_resize)));
    }
}

/// Marker component for the main camera
#[derive(Component)]
pub struct MainCamera;

fn setup_scene(
    mut commands: Commands,
    settings: Res<CameraSettings>,
    mut viewport: ResMut<ViewportState>,
    windows: Query<&Window>,
) {
    if let Ok(window) = windows.single() {
        viewport.0.resize(window.width(), window.height());
    }

    // Y is up; scene units are millimetres
    commands.spawn((
        Camera3d::default(),
        Projection::Perspective(PerspectiveProjection {
            fov: 45_f32.to_radians(),
            aspect_ratio: viewport.0.aspect(),
            near: 0.1,
            far: 100.0,
            ..default()
        }),
        Transform::from_translation(settings.target + settings.orbit_offset())
            .looking_at(settings.target, Vec3::Y),
        MainCamera,
    ));

    commands.insert_resource(AmbientLight {
        color: Color::WHITE,
        brightness: 500.0,
        ..default()
    });

    // Key light
    commands.spawn((
        DirectionalLight {
            illuminance: 8000.0,
            shadows_enabled: false,
            ..default()
        },
        Transform::from_xyz(10.0, 10.0, 10.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));

    // Dim fill light from the opposite side
    commands.spawn((
        DirectionalLight {
            illuminance: 2000.0,
            shadows_enabled: false,
            ..default()
        },
        Transform::from_xyz(-10.0, -5.0, -10.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));
}

/// Keep the tracked output size and the camera aspect in step with the window
fn handle_resize(
    mut resized: MessageReader<WindowResized>,
    mut viewport: ResMut<ViewportState>,
    mut projections: Query<&mut Projection, With<MainCamera>>,
) {
    for event in resized.read() {
        if !viewport.0.resize(event.width, event.height) {
            continue;
        }

        let aspect = viewport.0.aspect();
        for mut projection in &mut projections {
            if let Projection::Perspective(perspective) = projection.as_mut() {
                perspective.aspect_ratio = aspect;
            }
        }
        tracing::debug!(
            "Viewport resized to {}x{} (aspect {:.3})",
            event.width,
            event.height,
            aspect
        );
    }
}

/// Browsers report wheel deltas in pixels (about 100 per notch); normalize to lines
fn wheel_lines(unit: MouseScrollUnit, y: f32) -> f32 {
    match unit {
        MouseScrollUnit::Line => y,
        MouseScrollUnit::Pixel => y / PIXELS_PER_LINE,
    }
}

const PIXELS_PER_LINE: f32 = 100.0;

/// Zoom factor for a two-finger pinch; `None` when the previous spread is degenerate
fn pinch_factor(prev_dist: f32, curr_dist: f32) -> Option<f32> {
    if prev_dist <= f32::EPSILON {
        return None;
    }
    Some(prev_dist / curr_dist.max(1.0))
}

fn update_camera(
    mut camera_query: Query<&mut Transform, With<MainCamera>>,
    mut settings: ResMut<CameraSettings>,
    mut mouse_motion: MessageReader<MouseMotion>,
    mut mouse_wheel: MessageReader<MouseWheel>,
    mouse_button: Res<ButtonInput<MouseButton>>,
    touch_input: Res<Touches>,
    time: Res<Time>,
    mut contexts: bevy_egui::EguiContexts,
) {
    // Don't orbit while the pointer is over the control panel
    let egui_wants_pointer = contexts
        .ctx_mut()
        .map(|ctx| ctx.wants_pointer_input())
        .unwrap_or(false);

    let mut total_motion = Vec2::ZERO;
    for motion in mouse_motion.read() {
        total_motion += motion.delta;
    }

    // Rotate with left mouse drag
    if mouse_button.pressed(MouseButton::Left) && !egui_wants_pointer {
        settings.pending_azimuth -= total_motion.x * settings.sensitivity;
        settings.pending_elevation += total_motion.y * settings.sensitivity;
    }

    // Pan with right mouse drag, in the camera's view plane
    if mouse_button.pressed(MouseButton::Right) && !egui_wants_pointer {
        if let Ok(transform) = camera_query.single() {
            let pan_speed = settings.distance * 0.002;
            let right = transform.right().as_vec3();
            let up = transform.up().as_vec3();
            settings.target_focus += (-right * total_motion.x + up * total_motion.y) * pan_speed;
        }
    }

    if !egui_wants_pointer {
        for scroll in mouse_wheel.read() {
            settings.scroll_zoom(wheel_lines(scroll.unit, scroll.y));
        }
    } else {
        // Drain the scroll events even if we're not using them
        for _ in mouse_wheel.read() {}
    }

    // One finger rotates
    if touch_input.iter().count() == 1 && !egui_wants_pointer {
        for touch in touch_input.iter() {
            let delta = touch.delta();
            settings.pending_azimuth -= delta.x * settings.sensitivity;
            settings.pending_elevation += delta.y * settings.sensitivity;
        }
    }

    // Pinch to zoom
    if touch_input.iter().count() == 2 && !egui_wants_pointer {
        let touches: Vec<_> = touch_input.iter().collect();
        let curr_dist = touches[0].position().distance(touches[1].position());
        let prev_dist = (touches[0].position() - touches[0].delta())
            .distance(touches[1].position() - touches[1].delta());
        if let Some(factor) = pinch_factor(prev_dist, curr_dist) {
            settings.zoom(factor);
        }
    }

    settings.step(time.delta_secs());

    if let Ok(mut transform) = camera_query.single_mut() {
        transform.translation = settings.target + settings.orbit_offset();
        transform.look_at(settings.target, Vec3::Y);
    }
}
