//! STL key model loading and replacement

use bevy::asset::RenderAssetUsages;
use bevy::prelude::*;
use bevy::render::render_resource::PrimitiveTopology;
use keygen_core::{load_geometry, Install, KeyGeometry, LoadToken, ModelError, ModelSlot};
use std::f32::consts::FRAC_PI_2;
use std::sync::{Arc, Mutex};

use crate::app::Generation;
use crate::network::{spawn_task, HttpKeyService};

pub struct ModelsPlugin;

impl Plugin for ModelsPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<DisplayedModel>()
            .init_resource::<PendingModels>()
            .add_message::<LoadModel>()
            .add_systems(Update, start_model_loads)
            .add_systems(Update, apply_loaded_models.after(start_model_loads));
    }
}

/// Request to replace the displayed key with the model at `url`
#[derive(Message, Debug, Clone)]
pub struct LoadModel {
    pub url: String,
}

/// Everything that must be released when a key model leaves the scene
#[derive(Debug)]
pub struct KeyModel {
    pub entity: Entity,
    pub mesh: Handle<Mesh>,
    pub material: Handle<StandardMaterial>,
}

/// The single key model slot, sequenced by load token
#[derive(Resource, Default)]
pub struct DisplayedModel(pub ModelSlot<KeyModel>);

/// Decoded models delivered by async fetches, drained each frame
#[derive(Resource, Default)]
pub struct PendingModels(pub Arc<Mutex<Vec<(LoadToken, Result<KeyGeometry, ModelError>)>>>);

/// Orientation that lays the key flat, facing the camera
pub fn key_rotation() -> Quat {
    Quat::from_euler(EulerRot::XYZ, -FRAC_PI_2, 0.0, FRAC_PI_2)
}

/// Gold-toned metal, chosen for visibility against the dark background
pub fn key_material() -> StandardMaterial {
    StandardMaterial {
        base_color: Color::srgb_u8(0xD4, 0xAF, 0x37),
        metallic: 0.8,
        perceptual_roughness: 0.3,
        ..default()
    }
}

/// Build a flat-shaded triangle list from decoded STL geometry
pub fn key_mesh(geometry: &KeyGeometry) -> Mesh {
    Mesh::new(PrimitiveTopology::TriangleList, RenderAssetUsages::default())
        .with_inserted_attribute(Mesh::ATTRIBUTE_POSITION, geometry.positions.clone())
        .with_inserted_attribute(Mesh::ATTRIBUTE_NORMAL, geometry.normals.clone())
}

fn dispose(
    commands: &mut Commands,
    meshes: &mut Assets<Mesh>,
    materials: &mut Assets<StandardMaterial>,
    model: KeyModel,
) {
    commands.entity(model.entity).despawn();
    meshes.remove(&model.mesh);
    materials.remove(&model.material);
}

/// Evict the current key and start fetching the requested one
fn start_model_loads(
    mut commands: Commands,
    mut requests: MessageReader<LoadModel>,
    mut displayed: ResMut<DisplayedModel>,
    pending: Res<PendingModels>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    for request in requests.read() {
        let (token, evicted) = displayed.0.begin();
        if let Some(old) = evicted {
            dispose(&mut commands, &mut meshes, &mut materials, old);
        }

        tracing::info!("Loading key model {} (load {})", request.url, token.value());
        let queue = pending.0.clone();
        let url = request.url.clone();
        spawn_task(async move {
            let result = load_geometry(&HttpKeyService, &url).await;
            if let Ok(mut queue) = queue.lock() {
                queue.push((token, result));
            }
        });
    }
}

/// Spawn finished loads that are still current; drop everything else
fn apply_loaded_models(
    mut commands: Commands,
    mut displayed: ResMut<DisplayedModel>,
    pending: Res<PendingModels>,
    mut generation: ResMut<Generation>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let finished = match pending.0.try_lock() {
        Ok(mut queue) if !queue.is_empty() => std::mem::take(&mut *queue),
        _ => return,
    };

    for (token, result) in finished {
        let geometry = match result {
            Ok(geometry) => geometry,
            Err(e) => {
                if displayed.0.reject(token) {
                    tracing::error!("An error happened loading the key model: {}", e);
                    generation.0.model_failed();
                } else {
                    tracing::debug!("Superseded load {} failed: {}", token.value(), e);
                }
                continue;
            }
        };

        // Stale results never reach the GPU
        if !displayed.0.is_current(token) {
            tracing::debug!("Dropping superseded load {}", token.value());
            continue;
        }

        let mesh = meshes.add(key_mesh(&geometry));
        let material = materials.add(key_material());
        let entity = commands
            .spawn((
                Mesh3d(mesh.clone()),
                MeshMaterial3d(material.clone()),
                Transform::from_rotation(key_rotation()),
            ))
            .id();

        let model = KeyModel {
            entity,
            mesh,
            material,
        };
        match displayed.0.install(token, model) {
            Install::Applied { evicted } => {
                tracing::info!(
                    "Key model loaded: {} triangles",
                    geometry.triangle_count()
                );
                if let Some(old) = evicted {
                    dispose(&mut commands, &mut meshes, &mut materials, old);
                }
            }
            Install::Stale(model) => dispose(&mut commands, &mut meshes, &mut materials, model),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keygen_core::{GenerationController, ServiceConfig, Status};

    fn triangle() -> KeyGeometry {
        KeyGeometry {
            positions: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            normals: vec![[0.0, 0.0, 1.0]; 3],
        }
    }

    fn test_app() -> App {
        let mut app = App::new();
        app.init_resource::<Assets<Mesh>>()
            .init_resource::<Assets<StandardMaterial>>()
            .init_resource::<DisplayedModel>()
            .init_resource::<PendingModels>()
            .insert_resource(Generation(GenerationController::new(ServiceConfig::default())))
            .add_message::<LoadModel>()
            .add_systems(Update, start_model_loads)
            .add_systems(Update, apply_loaded_models.after(start_model_loads));
        app
    }

    fn deliver(app: &mut App, token: LoadToken, result: Result<KeyGeometry, ModelError>) {
        let queue = app.world().resource::<PendingModels>().0.clone();
        queue.lock().unwrap().push((token, result));
    }

    fn key_entities(app: &mut App) -> usize {
        let world = app.world_mut();
        world.query::<&Mesh3d>().iter(world).count()
    }

    #[test]
    fn test_stale_load_creates_no_assets() {
        let mut app = test_app();
        let (first, second) = {
            let mut displayed = app.world_mut().resource_mut::<DisplayedModel>();
            (displayed.0.begin().0, displayed.0.begin().0)
        };

        deliver(&mut app, first, Ok(triangle()));
        app.update();
        assert_eq!(app.world().resource::<Assets<Mesh>>().len(), 0);
        assert_eq!(app.world().resource::<Assets<StandardMaterial>>().len(), 0);
        assert_eq!(key_entities(&mut app), 0);

        deliver(&mut app, second, Ok(triangle()));
        app.update();
        assert_eq!(app.world().resource::<Assets<Mesh>>().len(), 1);
        assert_eq!(app.world().resource::<Assets<StandardMaterial>>().len(), 1);
        assert_eq!(key_entities(&mut app), 1);
        assert!(!app.world().resource::<DisplayedModel>().0.is_empty());
    }

    #[test]
    fn test_new_load_disposes_displayed_key() {
        let mut app = test_app();
        let token = app.world_mut().resource_mut::<DisplayedModel>().0.begin().0;
        deliver(&mut app, token, Ok(triangle()));
        app.update();
        assert_eq!(key_entities(&mut app), 1);

        app.world_mut().write_message(LoadModel {
            url: "http://localhost:8000/download/7".to_string(),
        });
        app.update();

        assert_eq!(app.world().resource::<Assets<Mesh>>().len(), 0);
        assert_eq!(app.world().resource::<Assets<StandardMaterial>>().len(), 0);
        assert_eq!(key_entities(&mut app), 0);
        assert!(app.world().resource::<DisplayedModel>().0.is_empty());

        // There is no fetch off the web, so the replacement load fails
        assert_eq!(
            app.world().resource::<Generation>().0.status(),
            &Status::ModelLoadFailed
        );
    }

    #[test]
    fn test_stale_failure_keeps_status() {
        let mut app = test_app();
        let first = app.world_mut().resource_mut::<DisplayedModel>().0.begin().0;
        app.world_mut().resource_mut::<DisplayedModel>().0.begin();

        deliver(&mut app, first, Err(ModelError::Empty));
        app.update();
        assert_eq!(
            app.world().resource::<Generation>().0.status(),
            &Status::Ready
        );
    }

    #[test]
    fn test_key_mesh_vertex_count() {
        let geometry = KeyGeometry {
            positions: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            normals: vec![[0.0, 0.0, 1.0]; 3],
        };
        let mesh = key_mesh(&geometry);
        assert_eq!(mesh.count_vertices(), 3);
        assert!(mesh.attribute(Mesh::ATTRIBUTE_NORMAL).is_some());
    }

    #[test]
    fn test_key_rotation_lays_flat() {
        // STL "up" (+Z) becomes world up (+Y)
        let up = key_rotation() * Vec3::Z;
        assert!(up.abs_diff_eq(Vec3::Y, 1e-5));
    }

    #[test]
    fn test_key_material_is_gold() {
        let material = key_material();
        assert_eq!(material.metallic, 0.8);
        assert_eq!(material.perceptual_roughness, 0.3);
        assert_eq!(material.base_color, Color::srgb_u8(0xD4, 0xAF, 0x37));
    }
}
