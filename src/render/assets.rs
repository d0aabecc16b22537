//! Texture loading for load passes.
//!
//! Textures are fetched through the shared cache; a pending-load record
//! tracks one pass at a time under its generation token. Completions whose
//! generation no longer matches the character are discarded, never applied.

use bevy::asset::LoadState;
use bevy::prelude::*;
use std::collections::{BTreeSet, HashMap};

use crate::character::{
    CharacterState, LoadFailure, LoadFailuresReported, LoadPassStarted, RebuildScene,
};

/// Loading is only surfaced to observers after this many seconds, to avoid
/// flicker on fast loads.
pub const LOADING_GRACE_SECS: f32 = 0.15;

/// Shared url-to-handle cache. Shared across all items; dedup happens here
/// at the asset level.
#[derive(Resource, Default)]
pub struct TextureCache {
    handles: HashMap<String, Handle<Image>>,
}

impl TextureCache {
    pub fn get(&self, url: &str) -> Option<Handle<Image>> {
        self.handles.get(url).cloned()
    }

    pub fn get_or_load(&mut self, url: &str, asset_server: &AssetServer) -> Handle<Image> {
        if let Some(handle) = self.handles.get(url) {
            return handle.clone();
        }
        let handle: Handle<Image> = asset_server.load(url.to_string());
        self.handles.insert(url.to_string(), handle.clone());
        handle
    }
}

/// The texture set of the load pass currently in flight.
#[derive(Resource, Default)]
pub struct PendingLoad {
    pub active: bool,
    pub generation: u64,
    pub textures: Vec<(u32, String, Handle<Image>)>,
    /// Definition failures carried from the resolve stage, merged with
    /// texture failures into one batch report.
    pub failures: Vec<LoadFailure>,
    pub elapsed: f32,
}

/// Whether a load has been visibly in progress past the grace delay.
#[derive(Resource, Default)]
pub struct LoadingIndicator {
    pub visible: bool,
}

/// Start fetching the texture set of a freshly started load pass.
pub fn begin_texture_load(
    mut passes: MessageReader<LoadPassStarted>,
    asset_server: Res<AssetServer>,
    mut cache: ResMut<TextureCache>,
    mut pending: ResMut<PendingLoad>,
) {
    for LoadPassStarted(pass) in passes.read() {
        let mut seen = BTreeSet::new();
        pending.textures = pass
            .textures
            .iter()
            .filter(|(id, url)| seen.insert((*id, url.clone())))
            .map(|(id, url)| (*id, url.clone(), cache.get_or_load(url, &asset_server)))
            .collect();
        pending.failures = pass.failures.clone();
        pending.generation = pass.generation;
        pending.active = true;
        pending.elapsed = 0.0;
    }
}

/// Poll the in-flight texture set; on completion, rebuild the scene if the
/// pass is still current and report the failure batch once.
pub fn poll_pending_load(
    time: Res<Time>,
    asset_server: Res<AssetServer>,
    state: Res<CharacterState>,
    mut pending: ResMut<PendingLoad>,
    mut indicator: ResMut<LoadingIndicator>,
    mut rebuild_writer: MessageWriter<RebuildScene>,
    mut failure_writer: MessageWriter<LoadFailuresReported>,
) {
    if !pending.active {
        indicator.visible = false;
        return;
    }
    if pending.generation != state.generation() {
        info!("discarding stale load pass {}", pending.generation);
        pending.active = false;
        indicator.visible = false;
        return;
    }

    pending.elapsed += time.delta_secs();
    indicator.visible = pending.elapsed > LOADING_GRACE_SECS;

    let mut failed_ids: BTreeSet<u32> = BTreeSet::new();
    let mut all_done = true;
    for (id, url, handle) in &pending.textures {
        match asset_server.load_state(handle.id()) {
            LoadState::Loaded => {}
            LoadState::Failed(_) => {
                warn!("texture '{url}' failed to load");
                failed_ids.insert(*id);
            }
            _ => all_done = false,
        }
    }
    if !all_done {
        return;
    }

    pending.active = false;
    indicator.visible = false;

    let mut failures = std::mem::take(&mut pending.failures);
    for id in failed_ids {
        if !failures.iter().any(|f| f.id == id) {
            failures.push(LoadFailure {
                id,
                reason: "texture load failed".to_string(),
            });
        }
    }
    if !failures.is_empty() {
        failure_writer.write(LoadFailuresReported { failures });
    }

    info!(
        "load pass {} complete ({} textures)",
        pending.generation,
        pending.textures.len()
    );
    rebuild_writer.write(RebuildScene {
        generation: pending.generation,
    });
}
