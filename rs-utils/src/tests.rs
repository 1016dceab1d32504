use bevy::prelude::{IVec3, Vec3};

use crate::block::{BLOCK_AIR, BLOCK_ROPE, BLOCK_SLAB, BLOCK_STONE, BLOCK_WATER};
use crate::{
    Aabb, BlockWorld, Chat, ClientSettings, NameMode, PackedCol, ShadowMode, WorldMap, clamp_degrees,
    dir_vector, lerp_angle, next_pow2, rotate_y, strip_color_codes, touches_any,
};

#[test]
fn clamp_degrees_range_and_idempotence() {
    let samples = [
        -1080.5, -720.0, -370.0, -360.0, -10.0, -1e-6, 0.0, 1e-6, 10.0, 180.0, 359.999, 360.0,
        370.0, 725.25, 100_000.0,
    ];
    for angle in samples {
        let once = clamp_degrees(angle);
        assert!((0.0..360.0).contains(&once), "{angle} -> {once}");
        assert_eq!(clamp_degrees(once), once);
    }
    assert_eq!(clamp_degrees(370.0), 10.0);
    assert_eq!(clamp_degrees(-10.0), 350.0);
}

#[test]
fn clamp_degrees_reduces_huge_angles() {
    for angle in [1.0e10, -1.0e10, 3.0e7, f32::MAX, -f32::MAX] {
        let once = clamp_degrees(angle);
        assert!((0.0..360.0).contains(&once), "{angle} -> {once}");
        assert_eq!(clamp_degrees(once), once);
    }
    assert_eq!(clamp_degrees(1.0e10), 1.0e10_f32.rem_euclid(360.0));
    assert!(lerp_angle(1.0e10, -1.0e10, 0.5).is_finite());
}

#[test]
fn lerp_angle_takes_short_path() {
    assert!(lerp_angle(350.0, 10.0, 0.5).abs() < 1e-4);
    assert!((lerp_angle(10.0, 350.0, 0.5)).abs() < 1e-4);
    assert!((lerp_angle(90.0, 180.0, 0.5) - 135.0).abs() < 1e-4);
    assert!((lerp_angle(350.0, 10.0, 0.25) - 355.0).abs() < 1e-4);
}

#[test]
fn next_pow2_rounds_up() {
    assert_eq!(next_pow2(40), 64);
    assert_eq!(next_pow2(64), 64);
    assert_eq!(next_pow2(65), 128);
    assert_eq!(next_pow2(0), 1);
}

#[test]
fn dir_vector_points_forward() {
    let forward = dir_vector(0.0, 0.0);
    assert!((forward - Vec3::new(0.0, 0.0, -1.0)).length() < 1e-6);
    let down = dir_vector(0.0, std::f32::consts::FRAC_PI_2);
    assert!((down.y + 1.0).abs() < 1e-6);
}

#[test]
fn rotate_y_quarter_turn() {
    let v = rotate_y(Vec3::new(1.0, 0.0, 0.0), std::f32::consts::FRAC_PI_2);
    assert!((v - Vec3::new(0.0, 0.0, 1.0)).length() < 1e-6);
}

#[test]
fn aabb_intersection_is_inclusive() {
    let a = Aabb::new(Vec3::ZERO, Vec3::ONE);
    let b = Aabb::new(Vec3::new(1.0, 0.0, 0.0), Vec3::new(2.0, 1.0, 1.0));
    assert!(a.intersects(&b));
    assert!(!a.overlaps(&b));
}

#[test]
fn aabb_ray_distance() {
    let bb = Aabb::new(Vec3::new(-0.5, 0.0, -5.5), Vec3::new(0.5, 2.0, -4.5));
    let hit = bb.ray_distance(Vec3::new(0.0, 1.0, 0.0), Vec3::new(0.0, 0.0, -1.0));
    assert!((hit.unwrap() - 4.5).abs() < 1e-5);
    assert!(bb.ray_distance(Vec3::new(0.0, 1.0, 0.0), Vec3::new(0.0, 0.0, 1.0)).is_none());
}

#[test]
fn physics_block_outside_map() {
    let world = WorldMap::new(8, 8, 8);
    assert_eq!(world.physics_block_at(-1, 3, 3), crate::block::BLOCK_BEDROCK);
    assert_eq!(world.physics_block_at(3, -1, 3), crate::block::BLOCK_BEDROCK);
    assert_eq!(world.physics_block_at(3, 8, 3), BLOCK_AIR);
}

#[test]
fn touches_any_never_matches_in_open_air() {
    let world = WorldMap::flat(16, 16, 16, 4, BLOCK_STONE);
    let bounds = Aabb::new(Vec3::new(4.2, 8.0, 4.2), Vec3::new(4.8, 9.8, 4.8));
    assert!(!touches_any(&world, &bounds, |_| false));
    assert!(!touches_any(&world, &bounds, |block| block != BLOCK_AIR));

    // Empty predicate set never matches, even against solid ground.
    let buried = Aabb::new(Vec3::new(1.0, 0.5, 1.0), Vec3::new(2.0, 2.5, 2.0));
    assert!(!touches_any(&world, &buried, |_| false));
    assert!(touches_any(&world, &buried, |block| block == BLOCK_STONE));
}

#[test]
fn touches_any_uses_block_bounds() {
    let mut world = WorldMap::new(8, 8, 8);
    world.set_block(2, 0, 2, BLOCK_SLAB);
    // Hovering above the slab's half height, still inside its cell.
    let above_slab = Aabb::new(Vec3::new(2.2, 0.6, 2.2), Vec3::new(2.8, 0.9, 2.8));
    assert!(!touches_any(&world, &above_slab, |b| b == BLOCK_SLAB));
    let on_slab = Aabb::new(Vec3::new(2.2, 0.5, 2.2), Vec3::new(2.8, 0.9, 2.8));
    assert!(touches_any(&world, &on_slab, |b| b == BLOCK_SLAB));

    world.set_block(5, 1, 5, BLOCK_ROPE);
    let beside_rope = Aabb::new(Vec3::new(5.0, 1.0, 5.0), Vec3::new(5.3, 1.5, 5.3));
    assert!(!touches_any(&world, &beside_rope, |b| b == BLOCK_ROPE));
}

#[test]
fn touches_any_clips_to_map() {
    let mut world = WorldMap::new(4, 4, 4);
    world.fill(IVec3::ZERO, IVec3::new(3, 3, 3), BLOCK_WATER);
    let huge = Aabb::new(Vec3::splat(-100.0), Vec3::splat(100.0));
    let mut visited = 0;
    touches_any(&world, &huge, |_| {
        visited += 1;
        false
    });
    assert_eq!(visited, 64);
}

#[test]
fn light_color_under_overhang() {
    let mut world = WorldMap::flat(8, 16, 8, 2, BLOCK_STONE);
    world.set_block(3, 10, 3, BLOCK_STONE);
    assert_eq!(world.light_color(3, 5, 3), PackedCol::SHADOW);
    assert_eq!(world.light_color(4, 5, 4), PackedCol::SUN);
}

#[test]
fn packed_col_hex() {
    assert_eq!(PackedCol::from_hex("#FF8000"), Some(PackedCol::rgb(255, 128, 0)));
    assert_eq!(PackedCol::from_hex("zz0000"), None);
    assert_eq!(PackedCol::WHITE.scale(0.5), PackedCol::rgb(127, 127, 127));
}

#[test]
fn block_parse_by_name_and_id() {
    let registry = crate::BlockRegistry::default();
    assert_eq!(registry.parse("stone"), Some(BLOCK_STONE));
    assert_eq!(registry.parse("44"), Some(BLOCK_SLAB));
    assert_eq!(registry.parse("still_water"), Some(9));
    assert_eq!(registry.parse("unobtainium"), None);
    assert_eq!(registry.parse("999"), None);
}

#[test]
fn strips_colour_codes() {
    assert_eq!(strip_color_codes("&cAdmin&f Bob"), "Admin Bob");
    assert_eq!(strip_color_codes("plain&"), "plain");
}

#[test]
fn settings_clamp_and_fallback() {
    let settings = ClientSettings::from_toml(
        r#"
name_mode = "sideways"
shadow_mode = "circle_all"

[hacks]
speed_multiplier = 400.0
jump_velocity = -3.0
"#,
    )
    .unwrap();
    assert_eq!(settings.name_mode, NameMode::Hovered);
    assert_eq!(settings.shadow_mode, ShadowMode::CircleAll);
    assert_eq!(settings.hacks.speed_multiplier, 50.0);
    assert_eq!(settings.hacks.jump_velocity, 0.0);
    assert!(settings.hacks.enabled);
}

#[test]
fn classic_mode_overrides_render_modes() {
    let settings = ClientSettings::from_toml(
        r#"
classic_mode = true
name_mode = "all"
shadow_mode = "circle"
"#,
    )
    .unwrap();
    assert_eq!(settings.name_mode, NameMode::Hovered);
    assert_eq!(settings.shadow_mode, ShadowMode::None);
}

#[test]
fn missing_settings_file_is_default() {
    let path = std::env::temp_dir().join("rs-utils-missing-settings-test.toml");
    let _ = std::fs::remove_file(&path);
    let settings = ClientSettings::load(&path).unwrap();
    assert_eq!(settings.hacks.speed_multiplier, 10.0);
}

#[test]
fn chat_history_is_capped() {
    let mut chat = Chat::default();
    for i in 0..105 {
        chat.add(format!("line {i}"));
    }
    assert_eq!(chat.len(), 100);
    assert_eq!(chat.total_added(), 105);
    assert_eq!(chat.lines().next(), Some("line 5"));
    assert_eq!(chat.last(), Some("line 104"));
}
