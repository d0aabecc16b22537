//! The layered sprite tree mirroring the character state.
//!
//! One node per zmap layer, ordered by the layer's zmap index; under each
//! node one part sprite per item that contributes to the layer anywhere in
//! the current sequence. A layer node's lock restricts display to the
//! winning item, matching the character's occlusion lock map.

use bevy::prelude::*;
use bevy::sprite::Anchor;

use crate::character::{CharacterState, RebuildScene, SceneInvalidated};
use crate::content::registry::Zmap;

/// Marker for the root the whole character hangs from.
#[derive(Component, Debug)]
pub struct CharacterRoot;

/// One zmap layer container.
#[derive(Component, Debug)]
pub struct ZmapLayerNode {
    pub name: String,
    /// Item id whose parts this layer displays; `None` shows all.
    pub only_display_id: Option<u32>,
}

/// One item's sprite on one layer.
#[derive(Component, Debug)]
pub struct PartSprite {
    pub item_id: u32,
    pub layer: String,
}

/// Z coordinate for a layer's zmap index. Lower indices render behind.
pub fn layer_z(index: usize) -> f32 {
    index as f32 * 0.01
}

pub fn setup_character_root(mut commands: Commands) {
    commands.spawn((
        CharacterRoot,
        Transform::default(),
        Visibility::default(),
    ));
}

/// Tear down and respawn the layer tree after a completed load pass.
pub fn rebuild_scene(
    mut rebuilds: MessageReader<RebuildScene>,
    mut commands: Commands,
    state: Res<CharacterState>,
    zmap: Res<Zmap>,
    root_query: Query<Entity, With<CharacterRoot>>,
    layer_query: Query<Entity, With<ZmapLayerNode>>,
    mut invalidate_writer: MessageWriter<SceneInvalidated>,
) {
    let mut current = false;
    for rebuild in rebuilds.read() {
        if rebuild.generation == state.generation() {
            current = true;
        }
    }
    if !current {
        return;
    }

    for entity in &layer_query {
        commands.entity(entity).despawn();
    }
    let Ok(root) = root_query.single() else {
        return;
    };

    for (index, layer_name) in zmap.layers().iter().enumerate() {
        let item_ids = state.items_for_layer(layer_name);
        if item_ids.is_empty() {
            continue;
        }
        let node = commands
            .spawn((
                ZmapLayerNode {
                    name: layer_name.clone(),
                    only_display_id: state.lock_for(layer_name),
                },
                Transform::from_xyz(0.0, 0.0, layer_z(index)),
                Visibility::default(),
            ))
            .id();
        commands.entity(root).add_child(node);

        for item_id in item_ids {
            let part = commands
                .spawn((
                    PartSprite {
                        item_id,
                        layer: layer_name.clone(),
                    },
                    Sprite::default(),
                    Anchor::TOP_LEFT,
                    Transform::default(),
                    Visibility::default(),
                ))
                .id();
            commands.entity(node).add_child(part);
        }
    }

    invalidate_writer.write(SceneInvalidated);
}

/// Apply each layer's display lock to its part children: a locked layer
/// only shows the winning item's part.
pub fn refresh_layer_locks(
    layer_query: Query<(&ZmapLayerNode, &Children), Changed<ZmapLayerNode>>,
    mut part_query: Query<(&PartSprite, &mut Visibility)>,
) {
    for (node, children) in &layer_query {
        for child in children.iter() {
            if let Ok((part, mut visibility)) = part_query.get_mut(child) {
                if node.only_display_id.is_some_and(|id| id != part.item_id) {
                    *visibility = Visibility::Hidden;
                }
            }
        }
    }
}
