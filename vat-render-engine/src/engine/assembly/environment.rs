use bevy::prelude::*;

/// Image-based lighting the VAT surfaces are lit by.
///
/// Applied to every 3D camera as an `EnvironmentMapLight`. Changing the maps
/// also rebuilds every mount; removing the resource removes the light.
#[derive(Resource, Debug, Clone, PartialEq)]
pub struct VatEnvironment {
    pub diffuse_map: Handle<Image>,
    pub specular_map: Handle<Image>,
    pub intensity: f32,
}

impl VatEnvironment {
    pub fn new(diffuse_map: Handle<Image>, specular_map: Handle<Image>) -> Self {
        Self {
            diffuse_map,
            specular_map,
            intensity: 1.0,
        }
    }

    /// Identity of the maps, as used by mount rebuild keys.
    pub fn maps(&self) -> (AssetId<Image>, AssetId<Image>) {
        (self.diffuse_map.id(), self.specular_map.id())
    }

    pub fn light(&self) -> EnvironmentMapLight {
        EnvironmentMapLight {
            diffuse_map: self.diffuse_map.clone(),
            specular_map: self.specular_map.clone(),
            intensity: self.intensity,
            ..default()
        }
    }
}

/// Keep every 3D camera's environment light in step with `VatEnvironment`.
pub fn apply_vat_environment(
    mut commands: Commands,
    environment: Option<Res<VatEnvironment>>,
    cameras: Query<Entity, With<Camera3d>>,
    new_cameras: Query<Entity, Added<Camera3d>>,
    mut applied: Local<bool>,
) {
    match environment {
        Some(environment) => {
            let targets: Vec<Entity> = if environment.is_changed() {
                cameras.iter().collect()
            } else {
                new_cameras.iter().collect()
            };
            for camera in targets {
                commands.entity(camera).insert(environment.light());
            }
            *applied = true;
        }
        None if *applied => {
            for camera in &cameras {
                commands.entity(camera).remove::<EnvironmentMapLight>();
            }
            *applied = false;
        }
        None => {}
    }
}
