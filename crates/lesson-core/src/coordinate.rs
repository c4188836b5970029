//! Coordinate move notation ("e2e4", "a7a8q").

use std::fmt;
use std::str::FromStr;

use shakmaty::{uci::UciMove, Role, Square};

use crate::error::LessonError;

/// A from/to square pair with an optional promotion piece.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CoordinateMove {
    pub from: Square,
    pub to: Square,
    pub promotion: Option<Role>,
}

impl CoordinateMove {
    pub fn with_promotion(self, role: Role) -> Self {
        Self { promotion: Some(role), ..self }
    }

    pub fn to_uci(self) -> UciMove {
        UciMove::Normal {
            from: self.from,
            to: self.to,
            promotion: self.promotion,
        }
    }
}

impl FromStr for CoordinateMove {
    type Err = LessonError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || LessonError::InvalidMove(s.to_string());

        if !s.is_ascii() || !(s.len() == 4 || s.len() == 5) {
            return Err(invalid());
        }

        let from: Square = s[0..2].parse().map_err(|_| invalid())?;
        let to: Square = s[2..4].parse().map_err(|_| invalid())?;
        if from == to {
            return Err(invalid());
        }

        let promotion = match s.as_bytes().get(4) {
            None => None,
            Some(b'q') => Some(Role::Queen),
            Some(b'r') => Some(Role::Rook),
            Some(b'b') => Some(Role::Bishop),
            Some(b'n') => Some(Role::Knight),
            Some(_) => return Err(invalid()),
        };

        Ok(Self { from, to, promotion })
    }
}

impl fmt::Display for CoordinateMove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.from, self.to)?;
        if let Some(role) = self.promotion {
            write!(f, "{}", role.char())?;
        }
        Ok(())
    }
}

/// Split a 4-or-5 character move into its from/to squares, for highlighting.
pub fn squares_of(uci: &str) -> Option<(Square, Square)> {
    uci.parse::<CoordinateMove>().ok().map(|m| (m.from, m.to))
}
