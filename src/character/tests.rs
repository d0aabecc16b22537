//! Character domain: unit tests for anchor building, equip diffing,
//! instruction sequences, and lock resolution.

use bevy::math::Vec2;
use std::collections::BTreeMap;

use crate::content::data::{
    CharacterDescriptor, DyeDescriptor, EquipDef, FrameDef, ItemDescriptor, PieceDef, Vec2Def,
    VariantDef,
};
use crate::content::registry::{EquipRegistry, Zmap};

use super::actions::{Action, EarType, Expression, HandType};
use super::anchor::AnchorMap;
use super::body_frame::BodyFrame;
use super::character::{CharacterState, UpdateOutcome};
use super::instruction::build_instructions;
use super::item::Item;
use super::piece::{Piece, PieceInfo};
use super::variant::{ItemVariant, ResolveContext, VariantKey};

const BODY_ID: u32 = 2000;
const HEAD_ID: u32 = 12000;
const FACE_ID: u32 = 20000;
const HAIR_ID: u32 = 30000;
const HAIR_DYE_ID: u32 = 30007;
const CAP_ID: u32 = 1002000;
const WEAPON_ID: u32 = 1702000;

fn v(x: f32, y: f32) -> Vec2Def {
    Vec2Def { x, y }
}

fn piece(path: &str, z: &str, anchors: &[(&str, (f32, f32))]) -> PieceDef {
    PieceDef {
        path: Some(path.to_string()),
        outlink: None,
        origin: Some(v(2.0, 3.0)),
        z: Some(z.to_string()),
        map: anchors
            .iter()
            .map(|(name, (x, y))| (name.to_string(), v(*x, *y)))
            .collect(),
        group: None,
    }
}

fn frame(delay: u32, pieces: Vec<(&str, PieceDef)>) -> FrameDef {
    FrameDef {
        delay: Some(delay),
        pieces: pieces
            .into_iter()
            .map(|(name, def)| (name.to_string(), def))
            .collect(),
    }
}

fn variant(frames: Vec<FrameDef>) -> VariantDef {
    VariantDef {
        frames: frames
            .into_iter()
            .enumerate()
            .map(|(i, f)| (i as u32, f))
            .collect(),
        default_frame: None,
    }
}

fn body_frames(count: usize) -> VariantDef {
    variant(
        (0..count)
            .map(|i| {
                frame(
                    180 + i as u32 * 20,
                    vec![
                        (
                            "body",
                            piece(
                                &format!("equip/2000/body_{i}.png"),
                                "body",
                                &[("navel", (16.0, 30.0)), ("neck", (8.0, 2.0))],
                            ),
                        ),
                        (
                            "arm",
                            piece(
                                &format!("equip/2000/arm_{i}.png"),
                                "arm",
                                &[("navel", (14.0, 28.0)), ("hand", (20.0, 36.0))],
                            ),
                        ),
                    ],
                )
            })
            .collect(),
    )
}

fn body_def() -> EquipDef {
    let mut actions = BTreeMap::new();
    actions.insert(Action::Stand1, body_frames(3));
    actions.insert(Action::Stand2, body_frames(3));
    actions.insert(Action::Walk1, body_frames(2));
    actions.insert(Action::Walk2, body_frames(2));
    actions.insert(Action::Alert, body_frames(3));
    EquipDef {
        id: BODY_ID,
        name: "body".into(),
        islot: vec!["body".into()],
        vslot: vec!["body".into(), "arm".into()],
        actions,
        expressions: BTreeMap::new(),
        dyes: BTreeMap::new(),
    }
}

fn head_def() -> EquipDef {
    let head_frame = || {
        frame(
            0,
            vec![
                (
                    "head",
                    piece(
                        "equip/12000/head.png",
                        "head",
                        &[("neck", (4.0, 28.0)), ("brow", (10.0, 8.0))],
                    ),
                ),
                (
                    "humanEar",
                    piece(
                        "equip/12000/human_ear.png",
                        "accessoryEar",
                        &[("neck", (2.0, 26.0))],
                    ),
                ),
                (
                    "ear",
                    piece(
                        "equip/12000/elf_ear.png",
                        "accessoryEar",
                        &[("neck", (2.0, 26.0))],
                    ),
                ),
            ],
        )
    };
    let mut actions = BTreeMap::new();
    for action in [
        Action::Stand1,
        Action::Stand2,
        Action::Walk1,
        Action::Walk2,
        Action::Alert,
    ] {
        actions.insert(action, variant(vec![head_frame()]));
    }
    EquipDef {
        id: HEAD_ID,
        name: "head".into(),
        islot: vec!["head".into()],
        vslot: vec!["head".into()],
        actions,
        expressions: BTreeMap::new(),
        dyes: BTreeMap::new(),
    }
}

fn face_def() -> EquipDef {
    let face_frame = frame(
        0,
        vec![(
            "face",
            piece("equip/20000/default.png", "face", &[("brow", (9.0, 7.0))]),
        )],
    );
    let mut expressions = BTreeMap::new();
    expressions.insert(
        Expression::Default,
        VariantDef {
            frames: BTreeMap::new(),
            default_frame: Some(face_frame),
        },
    );
    expressions.insert(
        Expression::Smile,
        variant(vec![frame(
            120,
            vec![(
                "face",
                piece("equip/20000/smile.png", "face", &[("brow", (9.0, 7.0))]),
            )],
        )]),
    );
    EquipDef {
        id: FACE_ID,
        name: "face".into(),
        islot: vec!["face".into()],
        vslot: vec!["face".into()],
        actions: BTreeMap::new(),
        expressions,
        dyes: BTreeMap::new(),
    }
}

fn hair_def() -> EquipDef {
    let hair_frame = || {
        frame(
            0,
            vec![
                (
                    "hair",
                    piece("equip/30000/hair.png", "hair", &[("brow", (12.0, 10.0))]),
                ),
                (
                    "backHair",
                    piece(
                        "equip/30000/back_hair.png",
                        "backHair",
                        &[("neck", (6.0, 22.0))],
                    ),
                ),
            ],
        )
    };
    let mut actions = BTreeMap::new();
    for action in [
        Action::Stand1,
        Action::Stand2,
        Action::Walk1,
        Action::Walk2,
        Action::Alert,
    ] {
        actions.insert(action, variant(vec![hair_frame()]));
    }
    let mut dyes = BTreeMap::new();
    dyes.insert(0u8, HAIR_DYE_ID);
    EquipDef {
        id: HAIR_ID,
        name: "hair".into(),
        islot: vec!["hair".into()],
        vslot: vec!["hair".into(), "backHair".into()],
        actions,
        expressions: BTreeMap::new(),
        dyes,
    }
}

fn cap_def() -> EquipDef {
    let cap_frame = frame(
        0,
        vec![(
            "cap",
            piece("equip/1002000/cap.png", "cap", &[("brow", (11.0, 12.0))]),
        )],
    );
    let mut actions = BTreeMap::new();
    for action in [Action::Stand1, Action::Stand2, Action::Walk1, Action::Walk2] {
        actions.insert(action, variant(vec![cap_frame.clone()]));
    }
    EquipDef {
        id: CAP_ID,
        name: "cap".into(),
        islot: vec!["cap".into()],
        vslot: vec!["cap".into(), "hair".into()],
        actions,
        expressions: BTreeMap::new(),
        dyes: BTreeMap::new(),
    }
}

fn weapon_def() -> EquipDef {
    let weapon_frame = frame(
        0,
        vec![(
            "weapon",
            piece(
                "equip/1702000/weapon.png",
                "weapon",
                &[("hand", (6.0, 40.0))],
            ),
        )],
    );
    let mut actions = BTreeMap::new();
    actions.insert(Action::Stand1, variant(vec![weapon_frame.clone()]));
    actions.insert(Action::Walk1, variant(vec![weapon_frame]));
    EquipDef {
        id: WEAPON_ID,
        name: "weapon".into(),
        islot: vec!["weapon".into()],
        vslot: vec!["weapon".into()],
        actions,
        expressions: BTreeMap::new(),
        dyes: BTreeMap::new(),
    }
}

fn fixture_registry() -> EquipRegistry {
    let mut registry = EquipRegistry::default();
    registry.insert(body_def());
    registry.insert(head_def());
    registry.insert(face_def());
    registry.insert(hair_def());
    registry.insert(cap_def());
    registry.insert(weapon_def());
    registry
}

fn descriptor(ids: &[u32]) -> CharacterDescriptor {
    CharacterDescriptor {
        items: ids.iter().map(|id| ItemDescriptor::new(*id)).collect(),
        ..Default::default()
    }
}

fn loaded_state(ids: &[u32]) -> (CharacterState, EquipRegistry, Zmap) {
    let registry = fixture_registry();
    let zmap = Zmap::builtin();
    let mut state = CharacterState::default();
    let outcome = state.update(&descriptor(ids), &registry, &zmap);
    assert!(matches!(outcome, UpdateOutcome::FullLoad(_)));
    (state, registry, zmap)
}

fn resolve_ctx<'a>(item_id: u32, fallback: &'a str, zmap: &'a Zmap) -> ResolveContext<'a> {
    ResolveContext {
        item_id,
        islot_fallback: fallback,
        has_dye: false,
        ear_type: EarType::HumanEar,
        zmap,
    }
}

#[test]
fn test_body_only_loads_clean() {
    let (state, _, _) = loaded_state(&[BODY_ID]);
    let body = state.items.values().find(|i| i.is_body());
    assert!(body.is_some());
    assert!(state.is_all_anchor_built());
    assert!(!state.instructions.is_empty());
    assert!(state.current_body_frame().is_some_and(|f| f.has_body));
}

#[test]
fn test_load_failures_are_collected_not_fatal() {
    let registry = fixture_registry();
    let zmap = Zmap::builtin();
    let mut state = CharacterState::default();
    let outcome = state.update(&descriptor(&[BODY_ID, 99999]), &registry, &zmap);
    let UpdateOutcome::FullLoad(pass) = outcome else {
        panic!("expected a full load");
    };
    assert_eq!(pass.failures.len(), 1);
    assert_eq!(pass.failures[0].id, 99999);
    // the body still loaded and renders
    assert!(!state.visible_layers().is_empty());
}

#[test]
fn test_identical_update_loads_once() {
    let registry = fixture_registry();
    let zmap = Zmap::builtin();
    let desc = descriptor(&[BODY_ID, HEAD_ID]);
    let mut state = CharacterState::default();
    assert!(matches!(
        state.update(&desc, &registry, &zmap),
        UpdateOutcome::FullLoad(_)
    ));
    assert!(matches!(
        state.update(&desc, &registry, &zmap),
        UpdateOutcome::NoChange
    ));
}

#[test]
fn test_stop_to_play_triggers_full_load() {
    let registry = fixture_registry();
    let zmap = Zmap::builtin();
    let mut desc = descriptor(&[BODY_ID]);
    let mut state = CharacterState::default();
    state.update(&desc, &registry, &zmap);

    desc.is_animating = true;
    assert!(matches!(
        state.update(&desc, &registry, &zmap),
        UpdateOutcome::FullLoad(_)
    ));
    // pausing again is only a re-render
    desc.is_animating = false;
    assert!(matches!(
        state.update(&desc, &registry, &zmap),
        UpdateOutcome::Rerender
    ));
}

#[test]
fn test_dye_change_is_cosmetic() {
    let registry = fixture_registry();
    let zmap = Zmap::builtin();
    let mut desc = descriptor(&[BODY_ID, HAIR_ID]);
    desc.items[1].dye = Some(DyeDescriptor {
        color: 0,
        alpha: 50,
    });
    let mut state = CharacterState::default();
    state.update(&desc, &registry, &zmap);

    desc.items[1].dye = Some(DyeDescriptor {
        color: 0,
        alpha: 80,
    });
    assert!(matches!(
        state.update(&desc, &registry, &zmap),
        UpdateOutcome::Rerender
    ));
}

#[test]
fn test_double_hand_forces_walk2() {
    let registry = fixture_registry();
    let zmap = Zmap::builtin();
    let mut desc = descriptor(&[BODY_ID]);
    desc.action = Action::Walk1;
    desc.hand_type = HandType::DoubleHand;
    let mut state = CharacterState::default();
    state.update(&desc, &registry, &zmap);
    assert_eq!(state.action(), Action::Walk2);
}

#[test]
fn test_weapon_forces_stand_fallback() {
    let registry = fixture_registry();
    let zmap = Zmap::builtin();
    let mut desc = descriptor(&[BODY_ID, WEAPON_ID]);
    desc.action = Action::Stand2;
    desc.hand_type = HandType::DoubleHand;
    let mut state = CharacterState::default();
    state.update(&desc, &registry, &zmap);
    // the weapon has no Stand2 frames, so Stand1 substitutes
    assert_eq!(state.action(), Action::Stand1);

    // the fallback is stable: re-sending the same descriptor is a no-op
    assert!(matches!(
        state.update(&desc, &registry, &zmap),
        UpdateOutcome::NoChange
    ));
}

#[test]
fn test_bounce_sequence_shape() {
    let registry = fixture_registry();
    let zmap = Zmap::builtin();
    let def = registry.get(BODY_ID).unwrap();
    let ctx = resolve_ctx(BODY_ID, "body", &zmap);

    // 3 frames: forward 0..2 then interior reverse
    let mut stand = ItemVariant::new(
        VariantKey::Action(Action::Stand1),
        &def.actions[&Action::Stand1],
        &ctx,
    );
    stand.prepare_resources();
    let seq = build_instructions(Action::Stand1, &stand);
    let frames: Vec<usize> = seq.iter().map(|i| i.frame).collect();
    assert_eq!(frames, vec![0, 1, 1]);
    assert_eq!(seq.len(), 2 * 3 - 3);

    // non-bounce actions play straight through
    let mut walk = ItemVariant::new(
        VariantKey::Action(Action::Walk1),
        &def.actions[&Action::Walk1],
        &ctx,
    );
    walk.prepare_resources();
    let seq = build_instructions(Action::Walk1, &walk);
    let frames: Vec<usize> = seq.iter().map(|i| i.frame).collect();
    assert_eq!(frames, vec![0, 1]);
}

#[test]
fn test_bounce_sequence_longer_and_degenerate() {
    let zmap = Zmap::builtin();
    let ctx = resolve_ctx(BODY_ID, "body", &zmap);

    let mut four = ItemVariant::new(VariantKey::Action(Action::Stand1), &body_frames(4), &ctx);
    four.prepare_resources();
    let frames: Vec<usize> = build_instructions(Action::Stand1, &four)
        .iter()
        .map(|i| i.frame)
        .collect();
    assert_eq!(frames, vec![0, 1, 2, 2, 1]);
    assert_eq!(frames.len(), 2 * 4 - 3);

    // single-frame bounce: one step, no reverse segment
    let mut one = ItemVariant::new(VariantKey::Action(Action::Stand1), &body_frames(1), &ctx);
    one.prepare_resources();
    let frames: Vec<usize> = build_instructions(Action::Stand1, &one)
        .iter()
        .map(|i| i.frame)
        .collect();
    assert_eq!(frames, vec![0]);

    // two frames: 2n - 3 = 1
    let mut two = ItemVariant::new(VariantKey::Action(Action::Stand1), &body_frames(2), &ctx);
    two.prepare_resources();
    assert_eq!(build_instructions(Action::Stand1, &two).len(), 1);
}

#[test]
fn test_instruction_delays_come_from_body_frames() {
    let (state, _, _) = loaded_state(&[BODY_ID]);
    // Walk1 fixture frames carry 180 and 200
    assert_eq!(state.instructions[0].delay, 180);
    assert_eq!(state.instructions[1].delay, 200);
}

#[test]
fn test_anchor_propagation_across_items() {
    let (state, _, _) = loaded_state(&[BODY_ID, HEAD_ID, FACE_ID, WEAPON_ID]);
    assert!(state.is_all_anchor_built());

    let anchors = &state.action_anchors[&state.action()][0];
    // body placed navel, declared neck; head picked neck up and declared brow;
    // the face resolves purely through the propagated brow
    assert!(anchors.contains("navel"));
    assert!(anchors.contains("neck"));
    assert!(anchors.contains("brow"));
    // the arm declared hand, which the weapon aligned on
    assert!(anchors.contains("hand"));

    let body = &state.items[&BODY_ID];
    let variant = body
        .active_variant(state.action(), state.expression())
        .unwrap();
    let body_piece = variant.parts["body"].piece_or_first(0).unwrap().1;
    // navel seed is the origin, so the body sits at -local_navel
    assert_eq!(body_piece.anchor, Vec2::new(-16.0, -30.0));
    assert_eq!(body_piece.position, Vec2::new(-18.0, -33.0));
}

#[test]
fn test_anchor_convergence_is_idempotent() {
    let (mut state, _, _) = loaded_state(&[BODY_ID, HEAD_ID, FACE_ID]);
    assert!(state.is_all_anchor_built());
    let action = state.action();
    let expression = state.expression();

    let mut anchors = state.action_anchors[&action].clone();
    let before = anchors.clone();
    for item in state.items.values_mut() {
        item.try_build_anchor(action, expression, &mut anchors);
    }
    assert_eq!(anchors, before);
}

#[test]
fn test_unreachable_anchor_is_not_fatal() {
    let registry = {
        let mut registry = fixture_registry();
        // a cape whose only anchor name no other piece ever declares
        let cape_frame = frame(
            0,
            vec![(
                "cape",
                piece(
                    "equip/1102000/cape.png",
                    "cape",
                    &[("tailUnreachable", (5.0, 5.0))],
                ),
            )],
        );
        let mut actions = BTreeMap::new();
        actions.insert(Action::Walk1, variant(vec![cape_frame]));
        registry.insert(EquipDef {
            id: 1102000,
            name: "cape".into(),
            islot: vec!["cape".into()],
            vslot: vec!["cape".into()],
            actions,
            expressions: BTreeMap::new(),
            dyes: BTreeMap::new(),
        });
        registry
    };
    let zmap = Zmap::builtin();
    let mut state = CharacterState::default();
    let outcome = state.update(&descriptor(&[BODY_ID, 1102000]), &registry, &zmap);
    let UpdateOutcome::FullLoad(pass) = outcome else {
        panic!("expected a full load");
    };
    // bounded convergence gave up on the cape, but nothing failed
    assert!(pass.failures.is_empty());
    assert!(!state.is_all_anchor_built());
    let cape = &state.items[&1102000];
    let variant = cape
        .active_variant(state.action(), state.expression())
        .unwrap();
    let cape_piece = variant.parts["cape"].piece_or_first(0).unwrap().1;
    assert!(!cape_piece.is_anchor_built);
    assert_eq!(cape_piece.position, Vec2::ZERO);
}

#[test]
fn test_lock_map_is_deterministic() {
    let (mut state, _, zmap) = loaded_state(&[BODY_ID, HAIR_ID, CAP_ID]);
    let first = state.locks.clone();
    state.build_lock(&zmap);
    assert_eq!(state.locks, first);

    // the cap's islot sits later in the zmap, so it wins the hair layer
    assert_eq!(state.locks["hair"], CAP_ID);
    assert_eq!(state.locks["cap"], CAP_ID);
    assert_eq!(state.locks["backHair"], HAIR_ID);
    assert_eq!(state.locks["body"], BODY_ID);
}

#[test]
fn test_lock_suppresses_losing_item() {
    let (state, _, _) = loaded_state(&[BODY_ID, HAIR_ID, CAP_ID]);
    // hair lost the "hair" layer to the cap; its placement is suppressed
    assert!(state.piece_for("hair", HAIR_ID).is_none());
    assert!(state.piece_for("cap", CAP_ID).is_some());
    assert!(state.piece_for("backHair", HAIR_ID).is_some());
}

#[test]
fn test_descriptor_round_trip() {
    let registry = fixture_registry();
    let zmap = Zmap::builtin();
    let mut desc = descriptor(&[BODY_ID, HEAD_ID, FACE_ID, HAIR_ID]);
    desc.action = Action::Stand1;
    desc.expression = Expression::Smile;
    desc.ear_type = EarType::Ear;
    desc.items[3].dye = Some(DyeDescriptor {
        color: 0,
        alpha: 50,
    });

    let mut state = CharacterState::default();
    state.update(&desc, &registry, &zmap);

    let json = serde_json::to_string(&desc).unwrap();
    let parsed: CharacterDescriptor = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, desc);

    let mut fresh = CharacterState::default();
    fresh.update(&parsed, &registry, &zmap);
    assert_eq!(fresh.locks, state.locks);
    assert_eq!(fresh.visible_layers(), state.visible_layers());
}

#[test]
fn test_frame_count_rules() {
    // keyless default: exactly one frame
    let keyless = VariantDef {
        frames: BTreeMap::new(),
        default_frame: Some(frame(0, vec![])),
    };
    assert_eq!(keyless.frame_count(), 1);

    // sparse tables count to the highest referenced index
    let mut sparse = VariantDef::default();
    sparse.frames.insert(0, frame(0, vec![]));
    sparse.frames.insert(2, frame(0, vec![]));
    assert_eq!(sparse.frame_count(), 3);

    let mut lone = VariantDef::default();
    lone.frames.insert(5, frame(0, vec![]));
    assert_eq!(lone.frame_count(), 6);
}

#[test]
fn test_ear_pieces_filtered_by_ear_type() {
    let zmap = Zmap::builtin();
    let def = head_def();

    let mut ctx = resolve_ctx(HEAD_ID, "head", &zmap);
    ctx.ear_type = EarType::HumanEar;
    let mut human = ItemVariant::new(
        VariantKey::Action(Action::Walk1),
        &def.actions[&Action::Walk1],
        &ctx,
    );
    human.prepare_resources();
    let ear = human.parts["accessoryEar"].piece_or_first(0).unwrap().1;
    assert_eq!(ear.info.slot, "humanEar");

    ctx.ear_type = EarType::Ear;
    let mut elf = ItemVariant::new(
        VariantKey::Action(Action::Walk1),
        &def.actions[&Action::Walk1],
        &ctx,
    );
    elf.prepare_resources();
    let ear = elf.parts["accessoryEar"].piece_or_first(0).unwrap().1;
    assert_eq!(ear.info.slot, "ear");
}

#[test]
fn test_layer_resolution_prefers_z_then_name_then_islot() {
    let zmap = Zmap::builtin();
    let ctx = resolve_ctx(77, "weapon", &zmap);

    let def = variant(vec![frame(
        0,
        vec![
            // recognized z tag wins
            ("whatever", piece("a.png", "hair", &[("navel", (0.0, 0.0))])),
            // unknown z, recognized raw key
            (
                "body",
                piece("b.png", "bogusTag", &[("navel", (0.0, 0.0))]),
            ),
            // neither recognized: falls to the item's first islot
            (
                "mystery",
                piece("c.png", "alsoBogus", &[("navel", (0.0, 0.0))]),
            ),
        ],
    )]);
    let mut v = ItemVariant::new(VariantKey::Action(Action::Walk1), &def, &ctx);
    v.prepare_resources();
    assert!(v.parts.contains_key("hair"));
    assert!(v.parts.contains_key("body"));
    assert!(v.parts.contains_key("weapon"));
}

#[test]
fn test_piece_anchor_build_and_propagation() {
    let mut map = AnchorMap::with_navel();
    let info = PieceInfo {
        item_id: 1,
        url: "p.png".into(),
        slot: "body".into(),
        z: Some("body".into()),
        group: None,
        origin: Vec2::new(1.0, 2.0),
        map: [
            ("navel".to_string(), Vec2::new(10.0, 20.0)),
            ("neck".to_string(), Vec2::new(4.0, -6.0)),
        ]
        .into_iter()
        .collect(),
        delay: 0,
    };
    let mut piece = Piece::new(info, false);
    piece.build_anchor(&mut map);

    assert!(piece.is_anchor_built);
    assert_eq!(piece.base_anchor_name, "navel");
    assert_eq!(piece.anchor, Vec2::new(-10.0, -20.0));
    assert_eq!(piece.position, Vec2::new(-11.0, -22.0));
    // the piece's other anchor was propagated into the frame map
    assert_eq!(map.get("neck"), Some(Vec2::new(-6.0, -26.0)));
}

#[test]
fn test_piece_without_shared_anchor_is_skipped() {
    let mut map = AnchorMap::with_navel();
    let info = PieceInfo {
        item_id: 1,
        url: "p.png".into(),
        slot: "cape".into(),
        z: None,
        group: None,
        origin: Vec2::ZERO,
        map: [("tail".to_string(), Vec2::new(3.0, 3.0))]
            .into_iter()
            .collect(),
        delay: 0,
    };
    let mut piece = Piece::new(info, false);
    piece.build_anchor(&mut map);
    assert!(!piece.is_anchor_built);
    assert!(!map.contains("tail"));
}

#[test]
fn test_body_frame_requires_body_piece() {
    let registry = fixture_registry();
    let zmap = Zmap::builtin();
    let mut items = BTreeMap::new();
    let mut hair = Item::new(ItemDescriptor::new(HAIR_ID));
    hair.load(&registry, &zmap, EarType::HumanEar).unwrap();
    hair.prepare_resources(Action::Walk1, Expression::Default);
    items.insert(HAIR_ID, hair);

    let frame = BodyFrame::build(
        Action::Walk1,
        0,
        Expression::Default,
        &items,
        &zmap,
        AnchorMap::with_navel(),
    );
    assert!(!frame.has_body);
}

#[test]
fn test_tick_advances_and_wraps() {
    let (mut state, _, _) = loaded_state(&[BODY_ID]);
    state.play(None);
    // Walk1: two instructions, delays 180 and 200
    assert_eq!(state.frame(), 0);
    assert!(!state.tick(100.0));
    assert!(state.tick(100.0));
    assert_eq!(state.frame(), 1);
    assert!(state.tick(250.0));
    assert_eq!(state.frame(), 0);

    state.stop();
    assert!(!state.tick(1000.0));
}

#[test]
fn test_expression_selects_face_variant() {
    let registry = fixture_registry();
    let zmap = Zmap::builtin();
    let mut desc = descriptor(&[BODY_ID, HEAD_ID, FACE_ID]);
    desc.expression = Expression::Smile;
    let mut state = CharacterState::default();
    state.update(&desc, &registry, &zmap);

    let placement = state.piece_for("face", FACE_ID).unwrap();
    assert_eq!(placement.url, "equip/20000/smile.png");

    // an expression the face has no variant for drops the face layer
    desc.expression = Expression::Hit;
    state.update(&desc, &registry, &zmap);
    assert!(state.piece_for("face", FACE_ID).is_none());
}

#[test]
fn test_dye_url_resolution() {
    let registry = fixture_registry();
    let zmap = Zmap::builtin();
    let mut item = Item::new(ItemDescriptor {
        id: HAIR_ID,
        dye: Some(DyeDescriptor {
            color: 0,
            alpha: 50,
        }),
        hue: None,
        brightness: None,
        saturation: None,
    });
    item.load(&registry, &zmap, EarType::HumanEar).unwrap();

    assert_eq!(
        item.dye_url_for("equip/30000/hair.png"),
        Some("equip/30007/hair.png".to_string())
    );
    assert!((item.dye_alpha() - 0.5).abs() < f32::EPSILON);

    // alpha 0 disables the overlay entirely
    item.descriptor.dye = Some(DyeDescriptor {
        color: 0,
        alpha: 0,
    });
    assert_eq!(item.dye_url_for("equip/30000/hair.png"), None);

    // a color the dye table does not know degrades to base-only
    item.descriptor.dye = Some(DyeDescriptor {
        color: 9,
        alpha: 50,
    });
    assert_eq!(item.dye_url_for("equip/30000/hair.png"), None);
}

#[test]
fn test_dyeable_expression_requires_eye() {
    assert!(VariantKey::Expression(Expression::Default).is_dyeable(true));
    assert!(!VariantKey::Expression(Expression::Blink).is_dyeable(true));
    assert!(!VariantKey::Expression(Expression::Default).is_dyeable(false));
    assert!(VariantKey::Action(Action::Walk1).is_dyeable(true));
}

#[test]
fn test_effect_layer_toggle() {
    let (mut state, _, _) = loaded_state(&[BODY_ID]);
    assert!(!state.is_effect_layer_hidden("frontEffect"));

    state.toggle_effect_visibility(None, false);
    assert!(state.is_effect_layer_hidden("frontEffect"));
    assert!(!state.is_effect_layer_hidden("itemEffect"));
    assert!(!state.is_effect_layer_hidden("body"));

    state.toggle_effect_visibility(Some(true), true);
    assert!(state.is_effect_layer_hidden("itemEffect"));

    state.toggle_effect_visibility(Some(false), true);
    assert!(!state.is_effect_layer_hidden("frontEffect"));
}

#[test]
fn test_destroy_is_safe_mid_load() {
    let registry = fixture_registry();
    let zmap = Zmap::builtin();
    let mut state = CharacterState::default();
    let outcome = state.update(&descriptor(&[BODY_ID]), &registry, &zmap);
    let UpdateOutcome::FullLoad(pass) = outcome else {
        panic!("expected a full load");
    };

    state.destroy();
    // the in-flight pass is now stale and must be discarded by its token
    assert_ne!(pass.generation, state.generation());
    assert!(state.items.is_empty());
    assert!(matches!(
        state.update(&descriptor(&[BODY_ID]), &registry, &zmap),
        UpdateOutcome::NoChange
    ));
}

#[test]
fn test_alert_seeds_hand_move_anchor() {
    let registry = fixture_registry();
    let zmap = Zmap::builtin();
    let mut desc = descriptor(&[BODY_ID]);
    desc.action = Action::Alert;
    let mut state = CharacterState::default();
    state.update(&desc, &registry, &zmap);
    assert_eq!(state.action(), Action::Alert);
    let anchors = &state.action_anchors[&Action::Alert];
    assert!(anchors.iter().all(|map| map.contains("handMove")));
}
