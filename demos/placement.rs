//! Desktop placement demo.
//!
//! A simulated floor surface stands in for an AR backend and the mouse
//! stands in for touch: left click places or moves, right drag rotates,
//! the scroll wheel pinch-scales.

use bevy::input::mouse::MouseWheel;
use bevy::prelude::*;
use bevy::window::PrimaryWindow;
use bevy_placement_tools::{
    GestureIntent, ManipulationControllers, ModelBanner, ModelCatalog, ModelPart, ModelTemplate,
    ObjectRegistry, PartTarget, PlacementCamera, PlacementCommand, PlacementDebugDrawPlugin, PlacementPlugin,
    TrackedPlanes, TrackedSurface, Tutorial, TutorialCommand,
};

/// Finger spread used as the starting point of a simulated pinch.
const PINCH_BASE: f32 = 200.0;

#[derive(Component)]
struct Hud;

#[derive(Component)]
struct Banner;

fn main() {
    App::new()
        .add_plugins(DefaultPlugins)
        .add_plugins((PlacementPlugin, PlacementDebugDrawPlugin))
        .add_systems(Startup, setup)
        .add_systems(Update, (keyboard_controls, mouse_gestures, update_hud))
        .run();
}

fn setup(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut planes: ResMut<TrackedPlanes>,
) {
    // Camera
    commands.spawn((
        Camera3d::default(),
        Transform::from_xyz(0.0, 1.6, 3.0).looking_at(Vec3::ZERO, Vec3::Y),
        PlacementCamera,
    ));

    // Light
    commands.spawn((
        DirectionalLight {
            shadows_enabled: true,
            ..default()
        },
        Transform::from_xyz(4.0, 8.0, 4.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));

    // Ground
    commands.spawn((
        Mesh3d(meshes.add(Plane3d::new(Vec3::Y, Vec2::splat(2.0)))),
        MeshMaterial3d(materials.add(Color::srgb(0.2, 0.35, 0.18))),
    ));

    // Simulated tracked surfaces
    planes.upsert(TrackedSurface::horizontal(0, Vec3::ZERO, Vec2::splat(2.0)));
    planes.upsert(TrackedSurface::horizontal(
        1,
        Vec3::new(-1.0, 0.5, -1.0),
        Vec2::new(0.4, 0.3),
    ));

    // Catalog
    let bone = materials.add(Color::srgb(0.9, 0.88, 0.8));
    let shaft = ModelPart::new("shaft", meshes.add(Capsule3d::new(0.05, 0.4)), bone.clone());
    let head = ModelPart::new("head", meshes.add(Sphere::new(0.08)), bone.clone())
        .with_offset(Transform::from_xyz(0.0, 0.28, 0.0));
    let head_variant = ModelPart::new(
        "head (fractured)",
        meshes.add(Sphere::new(0.08)),
        materials.add(Color::srgb(0.9, 0.4, 0.35)),
    )
    .with_offset(Transform::from_xyz(0.04, 0.3, 0.0));

    commands.insert_resource(ModelCatalog::new(vec![
        ModelTemplate::new("Femur")
            .with_scale_override(1.0)
            .with_part(shaft.clone())
            .with_part(head.clone())
            .with_variant(vec![shaft, head_variant]),
        ModelTemplate::new("Small cube").with_part(ModelPart::new(
            "cube",
            meshes.add(Cuboid::from_length(0.3)),
            materials.add(Color::srgb(0.2, 0.7, 1.0)),
        )),
        ModelTemplate::new("Big torus").with_part(ModelPart::new(
            "ring",
            meshes.add(Torus::new(0.05, 0.1)),
            materials.add(Color::srgb(1.0, 0.6, 0.2)),
        )),
    ]));

    // HUD
    commands
        .spawn((
            Node {
                position_type: PositionType::Absolute,
                top: Val::Px(10.0),
                left: Val::Px(10.0),
                ..default()
            },
            BackgroundColor(Color::srgba(0.0, 0.0, 0.0, 0.7)),
        ))
        .with_children(|p| {
            p.spawn((
                Text::new(""),
                TextFont {
                    font_size: 14.0,
                    ..default()
                },
                TextColor(Color::WHITE),
                Hud,
            ));
        });

    commands.spawn((
        Node {
            position_type: PositionType::Absolute,
            bottom: Val::Px(40.0),
            right: Val::Px(20.0),
            ..default()
        },
        Text::new(""),
        TextFont {
            font_size: 28.0,
            ..default()
        },
        TextColor(Color::WHITE),
        Banner,
    ));
}

fn keyboard_controls(
    keys: Res<ButtonInput<KeyCode>>,
    mut commands: MessageWriter<PlacementCommand>,
    mut tutorial: MessageWriter<TutorialCommand>,
) {
    let bindings = [
        (KeyCode::KeyM, PlacementCommand::ToggleMoveMode),
        (KeyCode::KeyR, PlacementCommand::ToggleRotateMode),
        (KeyCode::KeyC, PlacementCommand::CycleModel),
        (KeyCode::Delete, PlacementCommand::DeleteSelected),
        (KeyCode::KeyX, PlacementCommand::DeleteTargeted),
        (KeyCode::KeyV, PlacementCommand::ToggleVariant),
        (KeyCode::Space, PlacementCommand::TriggerAutoSpawn),
    ];
    for (key, command) in bindings {
        if keys.just_pressed(key) {
            commands.write(command);
        }
    }
    if keys.just_pressed(KeyCode::Enter) {
        tutorial.write(TutorialCommand::Next);
    }
    if keys.just_pressed(KeyCode::Escape) {
        tutorial.write(TutorialCommand::Skip);
    }
}

/// Translates mouse input into the intents touch would produce.
fn mouse_gestures(
    buttons: Res<ButtonInput<MouseButton>>,
    mut wheel: MessageReader<MouseWheel>,
    windows: Query<&Window, With<PrimaryWindow>>,
    mut intents: MessageWriter<GestureIntent>,
) {
    let Some(window) = windows.iter().next() else {
        return;
    };
    let Some(cursor) = window.cursor_position() else {
        return;
    };

    if buttons.just_pressed(MouseButton::Left) {
        intents.write(GestureIntent::DoubleTap { position: cursor });
    }

    if buttons.just_pressed(MouseButton::Right) {
        intents.write(GestureIntent::ContactDown);
    }
    if buttons.pressed(MouseButton::Right) {
        intents.write(GestureIntent::Drag { position: cursor });
    }
    if buttons.just_released(MouseButton::Right) {
        intents.write(GestureIntent::ContactUp);
    }

    let scroll: f32 = wheel.read().map(|w| w.y).sum();
    if scroll != 0.0 {
        let centre = window.size() / 2.0;
        let half = |spread: f32| Vec2::X * spread / 2.0;
        let spread = PINCH_BASE + scroll * 10.0;
        intents.write(GestureIntent::ContactDown);
        intents.write(GestureIntent::Pinch {
            a: centre - half(PINCH_BASE),
            b: centre + half(PINCH_BASE),
        });
        intents.write(GestureIntent::Pinch {
            a: centre - half(spread),
            b: centre + half(spread),
        });
        intents.write(GestureIntent::ContactUp);
    }
}

fn update_hud(
    registry: Option<Res<ObjectRegistry>>,
    controllers: Res<ManipulationControllers>,
    tutorial: Res<Tutorial>,
    banner: Res<ModelBanner>,
    target: Res<PartTarget>,
    mut hud: Query<&mut Text, (With<Hud>, Without<Banner>)>,
    mut banner_text: Query<(&mut Text, &mut TextColor), (With<Banner>, Without<Hud>)>,
) {
    if let Ok(mut text) = hud.single_mut() {
        let (selected, placed) = registry.as_ref().map_or((String::from("-"), 0), |r| {
            let name = r
                .template(r.selected())
                .map_or(String::from("?"), |t| t.name.clone());
            (name, r.len())
        });
        let on_off = |enabled: bool| if enabled { "on" } else { "off" };
        let looking_at = target.current().map_or("-", |t| t.name.as_str());
        let dwell = if target.is_activated() { " (active)" } else { "" };
        text.0 = format!(
            "Selected: {selected} | Placed: {placed} | Looking at: {looking_at}{dwell}\n\
             Move mode: {} | Rotate mode: {}\n\n\
             [Left click] Place/Move [Right drag] Rotate [Wheel] Scale\n\
             [M] Move mode [R] Rotate mode [C] Cycle [V] Variant\n\
             [Del] Delete [X] Delete looked-at [Space] Auto place [Enter] Next [Esc] Skip\n\n\
             {}",
            on_off(controllers.moving.is_enabled()),
            on_off(controllers.rotate.is_enabled()),
            tutorial.text().unwrap_or(""),
        );
    }

    if let Ok((mut text, mut color)) = banner_text.single_mut() {
        text.0 = banner.text().to_string();
        color.0 = Color::WHITE.with_alpha(banner.alpha());
    }
}
