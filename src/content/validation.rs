//! Validation of loaded equip definitions.
//!
//! Checks cross-references and layer tags after startup loading. Issues are
//! reported as warnings; a definition with issues still loads (the renderer
//! degrades per piece, not per file).

use super::data::EquipDef;
use super::registry::{EquipRegistry, Zmap};

/// A validation issue with context about what failed.
#[derive(Debug)]
pub struct ValidationIssue {
    pub equip_id: u32,
    pub message: String,
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "equip {}: {}", self.equip_id, self.message)
    }
}

fn validate_equip(def: &EquipDef, registry: &EquipRegistry, zmap: &Zmap) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    if def.islot.is_empty() {
        issues.push(ValidationIssue {
            equip_id: def.id,
            message: "empty islot; pieces with unknown z tags cannot resolve a layer".into(),
        });
    }

    for slot in def.islot.iter().chain(def.vslot.iter()) {
        if !zmap.contains(slot) {
            issues.push(ValidationIssue {
                equip_id: def.id,
                message: format!("slot '{slot}' is not a recognized zmap layer"),
            });
        }
    }

    for (color, target) in &def.dyes {
        if !registry.contains(*target) {
            issues.push(ValidationIssue {
                equip_id: def.id,
                message: format!("dye color {color} references missing equip {target}"),
            });
        }
    }

    let variants = def.actions.values().chain(def.expressions.values());
    for variant in variants {
        for frame in variant.frames.values().chain(variant.default_frame.iter()) {
            for (name, piece) in &frame.pieces {
                if piece.path.is_none() && piece.outlink.is_none() {
                    issues.push(ValidationIssue {
                        equip_id: def.id,
                        message: format!("piece '{name}' has neither path nor outlink"),
                    });
                }
            }
        }
    }

    issues
}

/// Validate every definition in the registry. Returns all issues, empty when
/// the content is clean.
pub fn validate_equips(registry: &EquipRegistry, zmap: &Zmap) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    for (_, def) in registry.iter() {
        issues.extend(validate_equip(def, registry, zmap));
    }
    issues.sort_by_key(|i| i.equip_id);
    issues
}
