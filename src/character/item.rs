//! One equipped item: a variant per relevant action or expression.

#![allow(dead_code)]

use bevy::prelude::*;
use std::collections::BTreeMap;
use thiserror::Error;

use crate::content::data::ItemDescriptor;
use crate::content::registry::{EquipRegistry, Zmap};

use super::actions::{Action, EarType, Expression};
use super::anchor::AnchorMap;
use super::piece::replace_id_in_path;
use super::variant::{ItemVariant, ResolveContext, VariantKey};

#[derive(Debug, Error)]
pub enum ItemError {
    #[error("no definition for equip {0}")]
    DefinitionMissing(u32),
}

/// One per-item failure collected during a load pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadFailure {
    pub id: u32,
    pub reason: String,
}

#[derive(Debug)]
pub struct Item {
    pub id: u32,
    pub descriptor: ItemDescriptor,
    pub islot: Vec<String>,
    pub vslot: Vec<String>,
    /// Color index to the equip id carrying the recolored textures.
    pub dyes: BTreeMap<u8, u32>,
    pub action_variants: BTreeMap<Action, ItemVariant>,
    pub expression_variants: BTreeMap<Expression, ItemVariant>,
    /// Ear type the variants were resolved with; a different ear forces a
    /// re-resolve because ear sub-pieces are filtered at resolution.
    loaded_for: Option<EarType>,
}

impl Item {
    pub fn new(descriptor: ItemDescriptor) -> Self {
        Self {
            id: descriptor.id,
            descriptor,
            islot: Vec::new(),
            vslot: Vec::new(),
            dyes: BTreeMap::new(),
            action_variants: BTreeMap::new(),
            expression_variants: BTreeMap::new(),
            loaded_for: None,
        }
    }

    /// Resolve definitions from the static source and construct one variant
    /// per action/expression the definition carries. Lazy: already-loaded
    /// items only rebuild when the ear type changed.
    pub fn load(
        &mut self,
        registry: &EquipRegistry,
        zmap: &Zmap,
        ear_type: EarType,
    ) -> Result<(), ItemError> {
        if self.loaded_for == Some(ear_type) {
            return Ok(());
        }

        let def = registry
            .get(self.id)
            .ok_or(ItemError::DefinitionMissing(self.id))?;

        self.islot = def.islot.clone();
        self.vslot = def.vslot.clone();
        self.dyes = def.dyes.clone();
        self.action_variants.clear();
        self.expression_variants.clear();

        let fallback = def.islot.first().cloned().unwrap_or_default();
        let ctx = ResolveContext {
            item_id: self.id,
            islot_fallback: &fallback,
            has_dye: self.descriptor.dye.is_some(),
            ear_type,
            zmap,
        };

        for (action, variant_def) in &def.actions {
            self.action_variants.insert(
                *action,
                ItemVariant::new(VariantKey::Action(*action), variant_def, &ctx),
            );
        }
        for (expression, variant_def) in &def.expressions {
            self.expression_variants.insert(
                *expression,
                ItemVariant::new(VariantKey::Expression(*expression), variant_def, &ctx),
            );
        }

        self.loaded_for = Some(ear_type);
        debug!(
            "loaded equip {} ({} action / {} expression variants)",
            self.id,
            self.action_variants.len(),
            self.expression_variants.len()
        );
        Ok(())
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded_for.is_some()
    }

    // Classification is derived from slot metadata, never stored.
    pub fn is_body(&self) -> bool {
        self.islot.iter().any(|s| s == "body")
    }

    pub fn is_head(&self) -> bool {
        self.islot.iter().any(|s| s == "head")
    }

    pub fn is_face(&self) -> bool {
        self.islot.iter().any(|s| s == "face")
    }

    pub fn is_weapon(&self) -> bool {
        self.islot.iter().any(|s| s == "weapon")
    }

    /// Items keyed by facial expression rather than body action.
    pub fn is_use_expression_item(&self) -> bool {
        self.is_face() || !self.expression_variants.is_empty()
    }

    pub fn has_action(&self, action: Action) -> bool {
        self.action_variants.contains_key(&action)
    }

    /// The variant shown for the given character attributes: expression for
    /// face-category items, action for everything else.
    pub fn active_variant(&self, action: Action, expression: Expression) -> Option<&ItemVariant> {
        if self.is_use_expression_item() {
            self.expression_variants.get(&expression)
        } else {
            self.action_variants.get(&action)
        }
    }

    fn active_variant_mut(
        &mut self,
        action: Action,
        expression: Expression,
    ) -> Option<&mut ItemVariant> {
        if self.is_use_expression_item() {
            self.expression_variants.get_mut(&expression)
        } else {
            self.action_variants.get_mut(&action)
        }
    }

    /// Materialize the active variant's parts and return the texture urls it
    /// needs resident.
    pub fn prepare_resources(&mut self, action: Action, expression: Expression) -> Vec<String> {
        let dye = self.descriptor.dye;
        let dyes = self.dyes.clone();
        let id = self.id;
        let Some(variant) = self.active_variant_mut(action, expression) else {
            return Vec::new();
        };
        let mut urls = variant.prepare_resources();

        // dye overlays need their recolored textures resident as well
        if let Some(dye) = dye {
            if dye.alpha > 0 {
                if let Some(&dye_id) = dyes.get(&dye.color) {
                    let overlays: Vec<String> = urls
                        .iter()
                        .map(|url| replace_id_in_path(url, id, dye_id))
                        .filter(|overlay| !urls.contains(overlay))
                        .collect();
                    urls.extend(overlays);
                }
            }
        }
        urls
    }

    /// One anchor pass over the active variant. See
    /// [`ItemVariant::try_build_anchor`].
    pub fn try_build_anchor(
        &mut self,
        action: Action,
        expression: Expression,
        anchors: &mut Vec<AnchorMap>,
    ) {
        if let Some(variant) = self.active_variant_mut(action, expression) {
            variant.try_build_anchor(anchors);
        }
    }

    pub fn is_all_anchor_built(&self, action: Action, expression: Expression) -> bool {
        self.active_variant(action, expression)
            .is_none_or(ItemVariant::is_all_anchor_built)
    }

    pub fn reset_anchors(&mut self) {
        for variant in self.action_variants.values_mut() {
            variant.reset_anchors();
        }
        for variant in self.expression_variants.values_mut() {
            variant.reset_anchors();
        }
    }

    /// Refresh dye/filter settings in place. Returns whether anything
    /// changed; frame resolution is untouched.
    pub fn update_descriptor(&mut self, descriptor: &ItemDescriptor) -> bool {
        if self.descriptor == *descriptor {
            return false;
        }
        self.descriptor = descriptor.clone();
        true
    }

    /// The dye overlay url for a base texture url, when a dye is selected
    /// and the color resolves. A missing color entry legitimately yields
    /// `None` (base-only rendering).
    pub fn dye_url_for(&self, url: &str) -> Option<String> {
        let dye = self.descriptor.dye?;
        if dye.alpha == 0 {
            return None;
        }
        let dye_id = *self.dyes.get(&dye.color)?;
        if url.contains(&self.id.to_string()) {
            Some(replace_id_in_path(url, self.id, dye_id))
        } else {
            Some(url.to_string())
        }
    }

    /// Dye blend alpha as a 0.0-1.0 fraction.
    pub fn dye_alpha(&self) -> f32 {
        self.descriptor
            .dye
            .map(|d| f32::from(d.alpha) / 100.0)
            .unwrap_or(0.0)
    }

    /// Tint color approximating the item's hue/brightness/saturation filter.
    pub fn filter_tint(&self) -> Color {
        if !self.descriptor.has_filter() {
            return Color::WHITE;
        }
        let hue = self.descriptor.hue.unwrap_or(0.0).rem_euclid(360.0);
        let saturation = self.descriptor.saturation.unwrap_or(0.5).clamp(0.0, 1.0);
        let brightness = self.descriptor.brightness.unwrap_or(0.0).clamp(-1.0, 1.0);
        let lightness = (0.75 + brightness * 0.25).clamp(0.0, 1.0);
        Color::hsl(hue, saturation, lightness)
    }
}
