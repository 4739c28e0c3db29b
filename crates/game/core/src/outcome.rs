//! Round outcome decision from the two revealed die faces.

/// Which combatant a value belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Side {
    Player,
    Enemy,
}

impl Side {
    /// The opposing combatant.
    pub fn other(self) -> Self {
        match self {
            Side::Player => Side::Enemy,
            Side::Enemy => Side::Player,
        }
    }
}

/// Result of comparing the two die faces for one round.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RoundOutcome {
    Player,
    Enemy,
    Draw,
}

/// Decides the round from two faces: strictly higher face wins, equal is a
/// draw.
pub fn decide(player_face: u8, enemy_face: u8) -> RoundOutcome {
    if player_face > enemy_face {
        RoundOutcome::Player
    } else if enemy_face > player_face {
        RoundOutcome::Enemy
    } else {
        RoundOutcome::Draw
    }
}

/// Base damage for the winning side: face difference times ten, with a
/// minimum difference of one so a win never deals zero.
pub fn base_damage(winner_face: u8, loser_face: u8) -> u32 {
    let diff = winner_face.saturating_sub(loser_face).max(1) as u32;
    diff * 10
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn higher_face_wins() {
        assert_eq!(decide(6, 2), RoundOutcome::Player);
        assert_eq!(decide(1, 4), RoundOutcome::Enemy);
        assert_eq!(decide(3, 3), RoundOutcome::Draw);
    }

    #[test]
    fn base_damage_scales_with_margin() {
        assert_eq!(base_damage(6, 2), 40);
        assert_eq!(base_damage(2, 1), 10);
    }

    #[test]
    fn base_damage_floors_at_one_die_step() {
        // Degenerate input (equal faces) still yields one step of damage.
        assert_eq!(base_damage(3, 3), 10);
    }
}
