//! Position engine seam.
//!
//! The runner only needs a narrow view of the rules: load a FEN, try a move,
//! read back the position. `ShakmatyEngine` provides it on top of shakmaty.

use shakmaty::{
    fen::Fen, san::San, CastlingMode, Chess, Color, EnPassantMode, Piece, Position, Rank, Role,
    Square,
};

use crate::coordinate::CoordinateMove;
use crate::error::LessonError;

/// A move the engine accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveRecord {
    /// Coordinate form actually played (promotion piece filled in).
    pub uci: String,
    pub san: String,
    pub from: Square,
    pub to: Square,
    pub capture: Option<Role>,
    pub promotion: Option<Role>,
    pub is_check: bool,
    pub is_checkmate: bool,
}

pub trait PositionEngine: Sized {
    /// Build an engine positioned at `fen`.
    fn load(fen: &str) -> Result<Self, LessonError>;

    /// Play `mv` if it is legal. `None` means illegal and leaves the position untouched.
    fn apply_move(&mut self, mv: &CoordinateMove) -> Option<MoveRecord>;

    fn current_fen(&self) -> String;

    fn side_to_move(&self) -> Color;

    fn piece_at(&self, square: Square) -> Option<Piece>;

    /// Parse and play a coordinate string. Unparsable input counts as illegal.
    fn apply_uci(&mut self, uci: &str) -> Option<MoveRecord> {
        let mv: CoordinateMove = uci.parse().ok()?;
        self.apply_move(&mv)
    }
}

#[derive(Debug, Clone)]
pub struct ShakmatyEngine {
    pos: Chess,
}

impl ShakmatyEngine {
    pub fn position(&self) -> &Chess {
        &self.pos
    }

    /// Pawn moves onto the last rank without a piece letter promote to a queen.
    fn resolve_promotion(&self, mv: &CoordinateMove) -> CoordinateMove {
        if mv.promotion.is_some() {
            return *mv;
        }
        let is_pawn = self
            .pos
            .board()
            .piece_at(mv.from)
            .is_some_and(|p| p.role == Role::Pawn);
        let last_rank = matches!(mv.to.rank(), Rank::First | Rank::Eighth);
        if is_pawn && last_rank {
            mv.with_promotion(Role::Queen)
        } else {
            *mv
        }
    }
}

impl Default for ShakmatyEngine {
    fn default() -> Self {
        Self { pos: Chess::default() }
    }
}

impl PositionEngine for ShakmatyEngine {
    fn load(fen: &str) -> Result<Self, LessonError> {
        let invalid = |reason: String| LessonError::InvalidFen {
            fen: fen.to_string(),
            reason,
        };

        let parsed: Fen = fen.trim().parse().map_err(|e| invalid(format!("{e}")))?;
        let pos: Chess = parsed
            .into_position(CastlingMode::Standard)
            .map_err(|e| invalid(format!("{e}")))?;

        Ok(Self { pos })
    }

    fn apply_move(&mut self, mv: &CoordinateMove) -> Option<MoveRecord> {
        let resolved = self.resolve_promotion(mv);
        let legal = resolved.to_uci().to_move(&self.pos).ok()?;

        let san = San::from_move(&self.pos, legal.clone()).to_string();
        self.pos.play_unchecked(legal.clone());

        Some(MoveRecord {
            uci: resolved.to_string(),
            san,
            from: resolved.from,
            to: resolved.to,
            capture: legal.capture(),
            promotion: legal.promotion(),
            is_check: self.pos.is_check(),
            is_checkmate: self.pos.is_checkmate(),
        })
    }

    fn current_fen(&self) -> String {
        Fen::from_position(&self.pos, EnPassantMode::Legal).to_string()
    }

    fn side_to_move(&self) -> Color {
        self.pos.turn()
    }

    fn piece_at(&self, square: Square) -> Option<Piece> {
        self.pos.board().piece_at(square)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::STANDARD_START_FEN;

    #[test]
    fn test_load_and_play() {
        let mut engine = ShakmatyEngine::load(STANDARD_START_FEN).unwrap();
        assert_eq!(engine.side_to_move(), Color::White);

        let record = engine.apply_uci("e2e4").unwrap();
        assert_eq!(record.san, "e4");
        assert_eq!(record.uci, "e2e4");
        assert_eq!(engine.side_to_move(), Color::Black);
        assert_eq!(
            engine.piece_at(Square::E4),
            Some(Piece { color: Color::White, role: Role::Pawn })
        );
        assert_eq!(engine.piece_at(Square::E2), None);
        assert_eq!(
            engine.current_fen(),
            "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1"
        );
    }

    #[test]
    fn test_illegal_move_leaves_position() {
        let mut engine = ShakmatyEngine::load(STANDARD_START_FEN).unwrap();
        let before = engine.current_fen();

        assert!(engine.apply_uci("e2e5").is_none());
        assert!(engine.apply_uci("e7e5").is_none()); // black piece, white to move
        assert!(engine.apply_uci("garbage").is_none());
        assert_eq!(engine.current_fen(), before);
    }

    #[test]
    fn test_invalid_fen() {
        let err = ShakmatyEngine::load("not a fen").unwrap_err();
        assert!(matches!(err, LessonError::InvalidFen { .. }));

        // Parses, but white has no king.
        assert!(ShakmatyEngine::load("4k3/8/8/8/8/8/8/8 w - - 0 1").is_err());
    }

    #[test]
    fn test_promotion_defaults_to_queen() {
        let mut engine = ShakmatyEngine::load("7k/P7/8/8/8/8/8/K7 w - - 0 1").unwrap();
        let record = engine.apply_uci("a7a8").unwrap();
        assert_eq!(record.uci, "a7a8q");
        assert_eq!(record.promotion, Some(Role::Queen));
        assert!(record.is_check);
    }

    #[test]
    fn test_explicit_underpromotion() {
        let mut engine = ShakmatyEngine::load("7k/P7/8/8/8/8/8/K7 w - - 0 1").unwrap();
        let record = engine.apply_uci("a7a8n").unwrap();
        assert_eq!(record.promotion, Some(Role::Knight));
        assert_eq!(
            engine.piece_at(Square::A8),
            Some(Piece { color: Color::White, role: Role::Knight })
        );
    }

    #[test]
    fn test_castling_from_king_step() {
        let mut engine = ShakmatyEngine::load("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();
        let record = engine.apply_uci("e1g1").unwrap();
        assert_eq!(record.san, "O-O");
        assert_eq!(
            engine.piece_at(Square::F1),
            Some(Piece { color: Color::White, role: Role::Rook })
        );
    }

    #[test]
    fn test_scholars_mate_is_checkmate() {
        let mut engine = ShakmatyEngine::load(STANDARD_START_FEN).unwrap();
        for uci in ["e2e4", "e7e5", "f1c4", "b8c6", "d1h5", "g8f6"] {
            assert!(engine.apply_uci(uci).is_some(), "{uci} should be legal");
        }
        let record = engine.apply_uci("h5f7").unwrap();
        assert_eq!(record.capture, Some(Role::Pawn));
        assert!(record.is_checkmate);
    }
}
