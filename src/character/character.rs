//! The top-level character aggregate.
//!
//! Owns all equipped items, the per-instant body frames, the occlusion lock
//! map, and playback state. `update` diffs an external descriptor against
//! the current state; `load_items` is the orchestration entry point that
//! resolves definitions, converges anchors, and hands the texture set to
//! the asset layer under a generation token.

#![allow(dead_code)]

use bevy::prelude::*;
use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::content::data::CharacterDescriptor;
use crate::content::registry::{EquipRegistry, Zmap};

use super::actions::{Action, EarType, Expression, HandType};
use super::anchor::AnchorMap;
use super::body_frame::BodyFrame;
use super::instruction::{Instruction, build_instructions};
use super::item::{Item, LoadFailure};

/// What a `load_items` pass produced: the texture set to fetch and the
/// per-item failures to report, stamped with the pass's generation so stale
/// completions can be discarded.
#[derive(Debug, Clone)]
pub struct LoadPass {
    pub generation: u64,
    /// (item id, texture url) pairs, deduplicated.
    pub textures: Vec<(u32, String)>,
    pub failures: Vec<LoadFailure>,
}

/// Outcome of an `update` call.
#[derive(Debug)]
pub enum UpdateOutcome {
    /// Descriptor matched current state; nothing to do.
    NoChange,
    /// Only cosmetic state changed (dye, filter, pause); re-render without
    /// reloading.
    Rerender,
    /// Structural change; a full load pass ran and its texture set needs
    /// fetching.
    FullLoad(LoadPass),
}

/// Everything the render layer needs to draw one piece this instant.
#[derive(Debug, Clone)]
pub struct PiecePlacement {
    pub url: String,
    /// Final position in definition space (y-down).
    pub position: Vec2,
    pub tint: Color,
    /// Dye overlay url and blend alpha, when the piece dyes.
    pub dye: Option<(String, f32)>,
}

#[derive(Resource)]
pub struct CharacterState {
    action: Action,
    /// The action the caller asked for, before weapon fallback. Diffed
    /// against incoming descriptors so an active fallback does not read as a
    /// perpetual structural change.
    requested_action: Action,
    expression: Expression,
    ear_type: EarType,
    hand_type: HandType,

    pub items: BTreeMap<u32, Item>,
    pub action_anchors: HashMap<Action, Vec<AnchorMap>>,
    pub body_frames: HashMap<Action, Vec<BodyFrame>>,
    /// Layer name to winning item id; a layer with no entry is open.
    pub locks: BTreeMap<String, u32>,

    pub instructions: Vec<Instruction>,
    pub instruction_index: usize,
    frame: usize,
    current_delta: f32,
    is_animating: bool,
    is_playing: bool,
    start_frame: usize,

    /// Monotonic load token; async completions carrying an older value are
    /// discarded.
    generation: u64,
    effects_hidden: bool,
    effects_include_normal: bool,
    pub name_tag: Option<String>,
    destroyed: bool,
}

impl Default for CharacterState {
    fn default() -> Self {
        Self {
            action: Action::default(),
            requested_action: Action::default(),
            expression: Expression::default(),
            ear_type: EarType::default(),
            hand_type: HandType::default(),
            items: BTreeMap::new(),
            action_anchors: HashMap::new(),
            body_frames: HashMap::new(),
            locks: BTreeMap::new(),
            instructions: Vec::new(),
            instruction_index: 0,
            frame: 0,
            current_delta: 0.0,
            is_animating: false,
            is_playing: false,
            start_frame: 0,
            generation: 0,
            effects_hidden: false,
            effects_include_normal: false,
            name_tag: None,
            destroyed: false,
        }
    }
}

impl CharacterState {
    pub fn action(&self) -> Action {
        self.action
    }

    pub fn expression(&self) -> Expression {
        self.expression
    }

    pub fn ear_type(&self) -> EarType {
        self.ear_type
    }

    pub fn hand_type(&self) -> HandType {
        self.hand_type
    }

    pub fn frame(&self) -> usize {
        self.frame
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_animating(&self) -> bool {
        self.is_animating
    }

    pub fn is_playing(&self) -> bool {
        self.is_playing
    }

    pub fn current_instruction(&self) -> Option<&Instruction> {
        self.instructions.get(self.instruction_index)
    }

    /// Diff an external descriptor against current state.
    ///
    /// Unchanged ids get a dye/filter refresh only; membership or attribute
    /// changes (and animation flipping off to on) run a full load pass.
    pub fn update(
        &mut self,
        desc: &CharacterDescriptor,
        registry: &EquipRegistry,
        zmap: &Zmap,
    ) -> UpdateOutcome {
        if self.destroyed {
            warn!("update on a destroyed character is ignored");
            return UpdateOutcome::NoChange;
        }

        let requested_action = desc.action.for_hand_type(desc.hand_type);
        let is_stop_to_play = desc.is_animating && !self.is_animating;

        let new_ids: BTreeSet<u32> = desc.items.iter().map(|i| i.id).collect();
        let old_ids: BTreeSet<u32> = self.items.keys().copied().collect();
        let membership_changed = new_ids != old_ids;
        let attrs_changed = requested_action != self.requested_action
            || desc.expression != self.expression
            || desc.ear_type != self.ear_type
            || desc.hand_type != self.hand_type;

        // unchanged ids: refresh dye/filter in place
        let mut cosmetic_changed = false;
        for item_desc in &desc.items {
            if let Some(item) = self.items.get_mut(&item_desc.id) {
                cosmetic_changed |= item.update_descriptor(item_desc);
            }
        }
        self.name_tag = desc.name_tag.clone();

        if membership_changed || attrs_changed || is_stop_to_play {
            // removed ids are destroyed, new ids created
            self.items.retain(|id, _| new_ids.contains(id));
            for item_desc in &desc.items {
                self.items
                    .entry(item_desc.id)
                    .or_insert_with(|| Item::new(item_desc.clone()));
            }
            self.requested_action = requested_action;
            self.action = requested_action;
            self.expression = desc.expression;
            self.ear_type = desc.ear_type;
            self.hand_type = desc.hand_type;
            self.is_animating = desc.is_animating;
            self.is_playing = desc.is_animating;
            self.start_frame = desc.frame.unwrap_or(0);
            return UpdateOutcome::FullLoad(self.load_items(registry, zmap));
        }

        let play_changed = self.is_animating != desc.is_animating;
        self.is_animating = desc.is_animating;
        self.is_playing = desc.is_animating;
        if let Some(frame) = desc.frame {
            if !desc.is_animating && frame != self.instruction_index {
                self.seek(frame);
                cosmetic_changed = true;
            }
        }

        if play_changed || cosmetic_changed {
            UpdateOutcome::Rerender
        } else {
            UpdateOutcome::NoChange
        }
    }

    /// The orchestration entry point for a full load pass.
    ///
    /// Resolves the body item first (its frame set drives the instruction
    /// sequence), applies the weapon's action fallback, loads the rest,
    /// converges anchors, caches body frames, and rebuilds the lock map.
    /// Per-item failures are collected, never fatal.
    pub fn load_items(&mut self, registry: &EquipRegistry, zmap: &Zmap) -> LoadPass {
        self.generation += 1;
        self.action_anchors.clear();
        self.body_frames.clear();
        self.locks.clear();
        self.instructions.clear();
        self.instruction_index = 0;
        self.current_delta = 0.0;

        let mut failures = Vec::new();

        // resolve definitions: the body first (its frames drive the
        // sequence), then the weapon (it can force an action fallback),
        // then the rest. Classification needs the definition, so order by
        // what the registry says each id is.
        let slot_rank = |id: &u32| {
            let islot = registry.get(*id).map(|d| d.islot.as_slice()).unwrap_or(&[]);
            if islot.iter().any(|s| s == "body") {
                0
            } else if islot.iter().any(|s| s == "weapon") {
                1
            } else {
                2
            }
        };
        let mut ordered: Vec<u32> = self.items.keys().copied().collect();
        ordered.sort_by_key(|id| (slot_rank(id), *id));

        for id in ordered {
            let Some(item) = self.items.get_mut(&id) else {
                continue;
            };
            if let Err(e) = item.load(registry, zmap, self.ear_type) {
                warn!("equip {id} failed to load: {e}");
                failures.push(LoadFailure {
                    id,
                    reason: e.to_string(),
                });
            }
        }

        // weapon availability can force a stand/walk fallback
        if let Some(weapon) = self.items.values().find(|i| i.is_weapon() && i.is_loaded()) {
            if !weapon.has_action(self.action) {
                if let Some(swapped) = self.action.swapped_variant() {
                    if weapon.has_action(swapped) {
                        info!(
                            "weapon {} lacks {:?}; falling back to {:?}",
                            weapon.id, self.action, swapped
                        );
                        self.action = swapped;
                    }
                }
            }
        }
        let action = self.action;
        let expression = self.expression;

        // materialize parts and collect the deduplicated texture set
        let mut textures: Vec<(u32, String)> = Vec::new();
        for (id, item) in self.items.iter_mut() {
            item.reset_anchors();
            for url in item.prepare_resources(action, expression) {
                textures.push((*id, url));
            }
        }
        textures.sort();
        textures.dedup();

        // instruction sequence from the body item's frame set
        if let Some(body) = self.items.values().find(|i| i.is_body()) {
            if let Some(variant) = body.action_variants.get(&action) {
                self.instructions = build_instructions(action, variant);
            }
        }
        if self.instructions.is_empty() {
            error!("no body frames for {action:?}; nothing will render");
        }

        // anchor convergence, bounded to avoid spinning on unreachable pieces
        let mut anchors: Vec<AnchorMap> = Vec::new();
        let max_passes = self.items.len().max(1) * 4;
        for _ in 0..max_passes {
            if self.is_all_anchor_built() {
                break;
            }
            for item in self.items.values_mut() {
                item.try_build_anchor(action, expression, &mut anchors);
            }
        }
        if !self.is_all_anchor_built() {
            let unresolved: usize = self
                .items
                .values()
                .filter_map(|i| i.active_variant(action, expression))
                .map(|v| v.unresolved_anchor_count())
                .sum();
            warn!(
                "{unresolved} pieces left unanchored after {max_passes} passes; they stay at the origin"
            );
        }

        // one cached body frame per instant the sequence references
        let frame_count = self
            .instructions
            .iter()
            .map(|i| i.frame + 1)
            .max()
            .unwrap_or(0);
        let mut frames = Vec::with_capacity(frame_count);
        for frame in 0..frame_count {
            let map = anchors
                .get(frame)
                .cloned()
                .unwrap_or_else(AnchorMap::with_navel);
            frames.push(BodyFrame::build(
                action,
                frame,
                expression,
                &self.items,
                zmap,
                map,
            ));
        }
        self.action_anchors.insert(action, anchors);
        self.body_frames.insert(action, frames);

        self.build_lock(zmap);

        if !self.instructions.is_empty() {
            self.instruction_index = self.start_frame.min(self.instructions.len() - 1);
            self.frame = self.instructions[self.instruction_index].frame;
        } else {
            self.frame = 0;
        }

        LoadPass {
            generation: self.generation,
            textures,
            failures,
        }
    }

    /// Rebuild the occlusion lock map: iterate items in zmap-slot order
    /// (ascending id within a slot) and let each claim every layer in its
    /// vslot; later claims overwrite earlier ones.
    pub fn build_lock(&mut self, zmap: &Zmap) {
        self.locks.clear();
        let mut ordered: Vec<u32> = Vec::new();
        for layer in zmap.layers() {
            for (id, item) in &self.items {
                if item.islot.iter().any(|s| s == layer) {
                    ordered.push(*id);
                }
            }
        }
        for id in ordered {
            let Some(item) = self.items.get(&id) else {
                continue;
            };
            for slot in &item.vslot {
                self.locks.insert(slot.clone(), id);
            }
        }
    }

    pub fn lock_for(&self, layer: &str) -> Option<u32> {
        self.locks.get(layer).copied()
    }

    pub fn is_all_anchor_built(&self) -> bool {
        self.items
            .values()
            .all(|item| item.is_all_anchor_built(self.action, self.expression))
    }

    /// Advance playback by `delta_ms`. Returns whether the visible frame
    /// changed.
    pub fn tick(&mut self, delta_ms: f32) -> bool {
        if !self.is_playing || !self.is_animating || self.instructions.is_empty() {
            return false;
        }
        self.current_delta += delta_ms;
        let delay = self.instructions[self.instruction_index].delay as f32;
        if self.current_delta <= delay {
            return false;
        }
        self.current_delta = 0.0;
        self.instruction_index = (self.instruction_index + 1) % self.instructions.len();
        let instruction = &self.instructions[self.instruction_index];
        self.action = instruction.action;
        self.frame = instruction.frame;
        true
    }

    pub fn play(&mut self, frame: Option<usize>) {
        self.is_playing = true;
        self.is_animating = true;
        if let Some(frame) = frame {
            self.seek(frame);
        }
    }

    pub fn stop(&mut self) {
        self.is_playing = false;
        self.current_delta = 0.0;
    }

    fn seek(&mut self, instruction_index: usize) {
        if self.instructions.is_empty() {
            return;
        }
        self.instruction_index = instruction_index % self.instructions.len();
        self.frame = self.instructions[self.instruction_index].frame;
        self.current_delta = 0.0;
    }

    /// Hide or show effect layers. `hide = None` toggles; `include_normal`
    /// extends the hiding to the plain item-effect layer.
    pub fn toggle_effect_visibility(&mut self, hide: Option<bool>, include_normal: bool) {
        self.effects_hidden = hide.unwrap_or(!self.effects_hidden);
        self.effects_include_normal = include_normal;
    }

    pub fn is_effect_layer_hidden(&self, layer: &str) -> bool {
        if !self.effects_hidden || !Zmap::is_effect_layer(layer) {
            return false;
        }
        if !self.effects_include_normal && layer == "itemEffect" {
            return false;
        }
        true
    }

    /// The effect layers present in the current sequence, in render order.
    /// A finite sequence the caller can iterate from the start at any time.
    pub fn effect_layers(&self) -> Vec<String> {
        let mut layers = Vec::new();
        for frame in self.body_frames.get(&self.action).into_iter().flatten() {
            for entry in &frame.entries {
                if Zmap::is_effect_layer(&entry.layer) && !layers.contains(&entry.layer) {
                    layers.push(entry.layer.clone());
                }
            }
        }
        layers
    }

    pub fn current_body_frame(&self) -> Option<&BodyFrame> {
        self.body_frames.get(&self.action)?.get(self.frame)
    }

    /// Item ids that contribute to `layer` anywhere in the current sequence.
    pub fn items_for_layer(&self, layer: &str) -> Vec<u32> {
        let mut ids = Vec::new();
        for frame in self.body_frames.get(&self.action).into_iter().flatten() {
            for entry in &frame.entries {
                if entry.layer == layer && !ids.contains(&entry.item_id) {
                    ids.push(entry.item_id);
                }
            }
        }
        ids
    }

    /// Layers visible this instant after lock filtering.
    pub fn visible_layers(&self) -> Vec<String> {
        let Some(frame) = self.current_body_frame() else {
            return Vec::new();
        };
        frame
            .entries
            .iter()
            .filter(|e| self.lock_for(&e.layer).is_none_or(|id| id == e.item_id))
            .map(|e| e.layer.clone())
            .collect()
    }

    /// Resolve everything needed to draw `layer` for `item_id` this instant.
    ///
    /// Returns `None` when the item does not win the layer this frame, the
    /// lock map suppresses it, or the frame has no body piece.
    pub fn piece_for(&self, layer: &str, item_id: u32) -> Option<PiecePlacement> {
        let body_frame = self.current_body_frame()?;
        if !body_frame.has_body {
            return None;
        }
        body_frame.entry_for(layer, item_id)?;
        if self.lock_for(layer).is_some_and(|id| id != item_id) {
            return None;
        }

        let item = self.items.get(&item_id)?;
        let variant = item.active_variant(self.action, self.expression)?;
        let part = variant.parts.get(layer)?;
        let (_, piece) = part.piece_or_first(self.frame)?;

        // the current instant's anchor map positions the piece, even when
        // the piece itself fell back to frame 0; anchors the instant never
        // learned (single-frame pieces in a longer sequence) come from the
        // frame the piece was built against
        let anchor = body_frame
            .anchors
            .get(&piece.base_anchor_name)
            .or_else(|| {
                self.action_anchors
                    .get(&self.action)
                    .and_then(|maps| maps.first())
                    .and_then(|map| map.get(&piece.base_anchor_name))
            })
            .unwrap_or(Vec2::ZERO);
        let movement = self
            .current_instruction()
            .and_then(|i| i.movement)
            .unwrap_or(Vec2::ZERO);

        let dye = if piece.is_dyeable {
            item.dye_url_for(&piece.info.url)
                .map(|url| (url, item.dye_alpha()))
        } else {
            None
        };

        Some(PiecePlacement {
            url: piece.info.url.clone(),
            position: anchor + piece.position + movement,
            tint: item.filter_tint(),
            dye,
        })
    }

    /// Release everything. Safe to call mid-load: the generation bump makes
    /// any in-flight completion stale.
    pub fn destroy(&mut self) {
        self.generation += 1;
        self.items.clear();
        self.action_anchors.clear();
        self.body_frames.clear();
        self.locks.clear();
        self.instructions.clear();
        self.instruction_index = 0;
        self.is_playing = false;
        self.is_animating = false;
        self.destroyed = true;
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }
}
