//! Shared Utility Functions
//!
//! Helpers used by several encounter modules.

use bevy::prelude::*;

use crate::combat::log::CombatantId;
use super::components::Enemy;
use super::constants::PLAYER_ID;

/// Log identifier for an enemy.
///
/// Format: "{kind} #{index}" e.g. "Goblin #12", prefixed with "Elite " for elites.
pub fn enemy_id(entity: Entity, enemy: &Enemy) -> CombatantId {
    if enemy.elite {
        format!("Elite {} #{}", enemy.kind.name(), entity.index())
    } else {
        format!("{} #{}", enemy.kind.name(), entity.index())
    }
}

/// Log identifier for any combatant; non-enemies are the player.
pub fn combatant_id(entity: Entity, enemy: Option<&Enemy>) -> CombatantId {
    match enemy {
        Some(enemy) => enemy_id(entity, enemy),
        None => PLAYER_ID.to_string(),
    }
}

/// Random point on a random side of `view`, pushed `margin` units outward.
pub fn edge_position(view: Rect, margin: f32, rng: &mut super::components::GameRng) -> Vec2 {
    let along_x = rng.random_range(view.min.x, view.max.x);
    let along_y = rng.random_range(view.min.y, view.max.y);
    match rng.random_index(4) {
        0 => Vec2::new(along_x, view.max.y + margin),
        1 => Vec2::new(along_x, view.min.y - margin),
        2 => Vec2::new(view.min.x - margin, along_y),
        _ => Vec2::new(view.max.x + margin, along_y),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encounter::components::GameRng;
    use crate::encounter::enemy_config::EnemyKind;

    fn enemy(kind: EnemyKind, elite: bool) -> Enemy {
        Enemy {
            kind,
            elite,
            difficulty: 1,
            attack_range: 30.0,
            attack_interval_ms: 1000,
        }
    }

    #[test]
    fn test_enemy_id_format() {
        let entity = Entity::from_raw(12);
        assert_eq!(enemy_id(entity, &enemy(EnemyKind::Goblin, false)), "Goblin #12");
        assert_eq!(
            enemy_id(entity, &enemy(EnemyKind::Goblin, true)),
            "Elite Goblin #12"
        );
        assert_eq!(combatant_id(entity, None), PLAYER_ID);
    }

    #[test]
    fn test_edge_positions_lie_outside_view() {
        let view = Rect::from_center_size(Vec2::ZERO, Vec2::new(200.0, 100.0));
        let mut rng = GameRng::from_seed(7);
        for _ in 0..200 {
            let p = edge_position(view, 50.0, &mut rng);
            assert!(!view.contains(p), "{:?} should be outside the view", p);
            let on_vertical_edge = (p.x - (view.min.x - 50.0)).abs() < 1e-3
                || (p.x - (view.max.x + 50.0)).abs() < 1e-3;
            let on_horizontal_edge = (p.y - (view.min.y - 50.0)).abs() < 1e-3
                || (p.y - (view.max.y + 50.0)).abs() < 1e-3;
            assert!(on_vertical_edge || on_horizontal_edge);
        }
    }
}
