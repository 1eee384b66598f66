/// Pure best response for one player of a 2×2 game.

/// One of the two pure actions. `First` is index 0 (the action whose
/// empirical frequency is tracked), `Second` is index 1.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Action {
    First = 0,
    Second = 1,
}

impl Action {
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// 1 when this is the first action, else 0. Added to the action counter.
    #[inline]
    pub fn first_indicator(self) -> u64 {
        match self {
            Action::First => 1,
            Action::Second => 0,
        }
    }
}

/// Which side of the matrix a player sits on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    /// Player 1: picks rows; the opponent varies along columns.
    Row,
    /// Player 2: picks columns; the opponent varies along rows.
    Column,
}

/// Expected utility of (first, second) action against an opponent who plays
/// their first action with probability `q`.
///
/// `payoffs` are the player's own cells in the order (00, 01, 10, 11).
#[inline]
pub fn expected_utilities(payoffs: &[i64; 4], role: Role, q: f64) -> (f64, f64) {
    let [a, b, c, d] = (*payoffs).map(|u| u as f64);
    match role {
        Role::Row => (a * q + b * (1.0 - q), c * q + d * (1.0 - q)),
        Role::Column => (a * q + c * (1.0 - q), b * q + d * (1.0 - q)),
    }
}

/// argmax over the two pure actions. Ties go to `Action::First`.
#[inline]
pub fn best_response(payoffs: &[i64; 4], role: Role, q: f64) -> Action {
    let (first, second) = expected_utilities(payoffs, role, q);
    if first >= second { Action::First } else { Action::Second }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_player_pairs_cells_along_rows() {
        // first = 3q + 0(1-q), second = 1q + 2(1-q)
        let p = [3, 0, 1, 2];
        assert_eq!(expected_utilities(&p, Role::Row, 0.5), (1.5, 1.5));
        assert_eq!(best_response(&p, Role::Row, 1.0), Action::First);
        assert_eq!(best_response(&p, Role::Row, 0.0), Action::Second);
    }

    #[test]
    fn column_player_pairs_cells_along_columns() {
        // first = 3q + 1(1-q), second = 0q + 2(1-q)
        let p = [3, 0, 1, 2];
        assert_eq!(expected_utilities(&p, Role::Column, 0.0), (1.0, 2.0));
        assert_eq!(best_response(&p, Role::Column, 0.0), Action::Second);
        assert_eq!(best_response(&p, Role::Column, 1.0), Action::First);
    }

    #[test]
    fn ties_resolve_to_first_action() {
        let flat = [5, 5, 5, 5];
        for q in [0.0, 0.25, 0.5, 1.0] {
            assert_eq!(best_response(&flat, Role::Row, q), Action::First);
            assert_eq!(best_response(&flat, Role::Column, q), Action::First);
        }
        // Mixed indifference point of matching pennies.
        let pennies = [1, -1, -1, 1];
        assert_eq!(best_response(&pennies, Role::Row, 0.5), Action::First);
    }

    #[test]
    fn indicator_counts_only_first_action() {
        assert_eq!(Action::First.first_indicator(), 1);
        assert_eq!(Action::Second.first_indicator(), 0);
        assert_eq!(Action::Second.index(), 1);
    }
}
