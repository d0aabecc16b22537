//! Content domain: unit tests for definition parsing and validation.

use std::collections::BTreeMap;

use super::data::{CharacterDescriptor, EquipDef, FrameDef, PieceDef, VariantDef};
use super::loader::parse_equip;
use super::registry::{EquipRegistry, Zmap};
use super::validation::validate_equips;

use crate::character::Action;

const SAMPLE_EQUIP: &str = r#"{
    "id": 1702000,
    "name": "Test Saber",
    "islot": ["weapon"],
    "vslot": ["weapon"],
    "actions": {
        "Stand1": {
            "frames": {
                "0": {
                    "delay": 180,
                    "weapon": {
                        "path": "equip/1702000/stand1_0.png",
                        "origin": { "x": 2.0, "y": 30.0 },
                        "z": "weapon",
                        "map": { "hand": { "x": 6.0, "y": 40.0 } }
                    }
                },
                "1": {
                    "delay": 200,
                    "weapon": {
                        "_outlink": "equip/1702001/stand1_1.png",
                        "z": "weapon",
                        "map": { "hand": { "x": 7.0, "y": 41.0 } }
                    }
                }
            }
        }
    },
    "dyes": { "0": 1702007 }
}"#;

#[test]
fn test_parse_equip_json() {
    let def = parse_equip("sample", SAMPLE_EQUIP).unwrap();
    assert_eq!(def.id, 1702000);
    assert_eq!(def.islot, vec!["weapon".to_string()]);
    assert_eq!(def.dyes[&0], 1702007);

    let stand = &def.actions[&Action::Stand1];
    assert_eq!(stand.frame_count(), 2);

    let frame0 = stand.frame(0).unwrap();
    assert_eq!(frame0.delay, Some(180));
    let piece = &frame0.pieces["weapon"];
    assert_eq!(piece.path.as_deref(), Some("equip/1702000/stand1_0.png"));
    assert_eq!(piece.map["hand"].x, 6.0);

    // outlinks take precedence over paths at resolution time
    let frame1 = stand.frame(1).unwrap();
    let piece = &frame1.pieces["weapon"];
    assert!(piece.path.is_none());
    assert_eq!(piece.outlink.as_deref(), Some("equip/1702001/stand1_1.png"));
}

#[test]
fn test_parse_keyless_default_variant() {
    let json = r#"{
        "id": 20000,
        "islot": ["face"],
        "vslot": ["face"],
        "expressions": {
            "Default": {
                "default_frame": {
                    "face": {
                        "path": "equip/20000/default.png",
                        "z": "face",
                        "map": { "brow": { "x": 9.0, "y": 7.0 } }
                    }
                }
            }
        }
    }"#;
    let def = parse_equip("sample", json).unwrap();
    let variant = def.expressions.values().next().unwrap();
    assert_eq!(variant.frame_count(), 1);
    assert!(variant.frame(0).is_some());
    assert!(variant.frame(1).is_none());
}

#[test]
fn test_parse_rejects_malformed_json() {
    assert!(parse_equip("bad", "{ not json").is_err());
    assert!(parse_equip("bad", r#"{"id": "not a number"}"#).is_err());
}

#[test]
fn test_default_character_ron_shape() {
    let ron_src = r#"(
        action: Stand1,
        expression: Default,
        ear_type: HumanEar,
        hand_type: SingleHand,
        items: [
            (id: 2000),
            (id: 30000, dye: (color: 0, alpha: 50)),
            (id: 1103580, hue: 180.0, brightness: 0.1, saturation: 0.5),
        ],
        is_animating: true,
    )"#;
    let desc: CharacterDescriptor = ron::Options::default()
        .with_default_extension(ron::extensions::Extensions::IMPLICIT_SOME)
        .from_str(ron_src)
        .unwrap();
    assert_eq!(desc.action, Action::Stand1);
    assert_eq!(desc.items.len(), 3);
    assert_eq!(desc.items[1].dye.unwrap().alpha, 50);
    assert!(desc.items[2].has_filter());
    assert!(desc.is_animating);
}

#[test]
fn test_validation_flags_bad_references() {
    let mut registry = EquipRegistry::default();
    let mut frames = BTreeMap::new();
    frames.insert(
        0,
        FrameDef {
            delay: None,
            pieces: BTreeMap::from([(
                "pathless".to_string(),
                PieceDef::default(),
            )]),
        },
    );
    let mut actions = BTreeMap::new();
    actions.insert(
        Action::Stand1,
        VariantDef {
            frames,
            default_frame: None,
        },
    );
    registry.insert(EquipDef {
        id: 42,
        name: "broken".into(),
        islot: vec!["notALayer".into()],
        vslot: vec!["weapon".into()],
        actions,
        expressions: BTreeMap::new(),
        dyes: BTreeMap::from([(0u8, 4242u32)]),
    });

    let issues = validate_equips(&registry, &Zmap::builtin());
    let messages: Vec<String> = issues.iter().map(|i| i.to_string()).collect();
    assert!(messages.iter().any(|m| m.contains("notALayer")));
    assert!(messages.iter().any(|m| m.contains("missing equip 4242")));
    assert!(messages.iter().any(|m| m.contains("pathless")));
}

#[test]
fn test_builtin_zmap_ordering() {
    let zmap = Zmap::builtin();
    assert!(zmap.contains("body"));
    assert!(zmap.contains("backBody"));
    // back layers render behind the body; the weapon in front of the arm
    assert!(zmap.index_of("backHair").unwrap() < zmap.index_of("body").unwrap());
    assert!(zmap.index_of("head").unwrap() < zmap.index_of("hair").unwrap());
    assert!(zmap.index_of("arm").unwrap() < zmap.index_of("weapon").unwrap());
    assert!(Zmap::is_effect_layer("itemEffect"));
    assert!(Zmap::is_effect_layer("backEffect"));
    assert!(!Zmap::is_effect_layer("body"));
}
