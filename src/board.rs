/*
  Tabiya, a chess analysis-board core.
  Copyright (C) 2024 The Tabiya Authors.

  Tabiya is free software: you can redistribute it and/or modify
  it under the terms of the GNU General Public License as published by
  the Free Software Foundation, either version 3 of the License, or
  (at your option) any later version.

  Tabiya is distributed in the hope that it will be useful,
  but WITHOUT ANY WARRANTY; without even the implied warranty of
  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
  GNU General Public License for more details.

  You should have received a copy of the GNU General Public License
  along with this program.  If not, see <http://www.gnu.org/licenses/>.
*/

//! State representations of boards, which contain piece placement but
//! neither history nor meta-information about a game.
//!
//! The position is stored in four compressed bitboards. Each piece type is a
//! three-bit code, referred to as `[xyz]` with `x` the least significant
//! bit; the nth bit of the `x`, `y` and `z` words together encode the piece
//! occupying the nth square. The position is always stored rotated to the
//! perspective of the side to move, which is considered to be "white". The
//! `white` word marks the squares of friendly pieces, and additionally
//! carries a single bit on the (empty) en-passant target square when an en
//! passant capture is available.
//!
//! Castling rights are embedded in the piece encoding itself: a rook that
//! can still castle is stored as a `Castle`, which decays to a `Rook` when
//! it moves or when its king moves.

use thiserror::Error;

use super::{Bitboard, Color, Move, Piece, Square};

use std::fmt::{Display, Formatter};

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
/// The ways a FEN string can fail to describe a position.
pub enum FenError {
    #[error("unexpected character {0:?} in FEN string")]
    UnexpectedCharacter(char),
    #[error("FEN string ended before the position was fully described")]
    UnexpectedEnd,
    #[error("square coordinate out of range in FEN string")]
    SquareOutOfRange,
    #[error("each side must have exactly one king")]
    KingCount,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
/// A representation of a position, stored from the point of view of the side
/// to move.
///
/// Invariants, maintained by every constructor in this crate:
/// * `occupied() == x | y | z`, and the triple of bits at each occupied
///   square forms a valid piece code;
/// * `white` has bits only on friendly occupied squares, plus at most one
///   bit on an empty square naming the en-passant capture target;
/// * each side has exactly one king.
pub struct Board {
    pub(crate) x: Bitboard,
    pub(crate) y: Bitboard,
    pub(crate) z: Bitboard,
    pub(crate) white: Bitboard,
}

impl Board {
    /// The conventional chess starting position.
    pub const STARTPOS: Board = Board {
        x: Bitboard::new(0x34FF_0000_0000_FF34),
        y: Bitboard::new(0x7E00_0000_0000_007E),
        z: Bitboard::new(0x9900_0000_0000_0099),
        white: Bitboard::new(0xFFFF),
    };

    #[must_use]
    /// Construct a `Board` from the standard chess starting position.
    pub const fn new() -> Board {
        Board::STARTPOS
    }

    #[inline(always)]
    #[must_use]
    /// Get the set of occupied squares.
    ///
    /// # Examples
    ///
    /// ```
    /// use tabiya::{Bitboard, Board};
    ///
    /// assert_eq!(Board::new().occupied(), Bitboard::new(0xFFFF00000000FFFF));
    /// ```
    pub const fn occupied(&self) -> Bitboard {
        Bitboard(self.x.0 | self.y.0 | self.z.0)
    }

    #[inline(always)]
    #[must_use]
    /// Get the en-passant target, a bitboard which is either empty or
    /// contains the single square a pawn may capture onto en passant.
    pub const fn en_passant(&self) -> Bitboard {
        Bitboard(self.white.0 & !self.occupied().0)
    }

    #[inline(always)]
    #[must_use]
    /// Get the set of squares occupied by pieces of the given type.
    ///
    /// Asking for `Rook` returns castles as well, since a castle is a rook
    /// that happens to remember a right: both codes match `z & !y`.
    pub const fn extract(&self, piece: Piece) -> Bitboard {
        if matches!(piece, Piece::Rook) {
            return Bitboard(self.z.0 & !self.y.0);
        }

        let bits = piece.bits();
        Bitboard(
            (if bits & 1 != 0 { self.x.0 } else { !self.x.0 })
                & (if bits & 2 != 0 { self.y.0 } else { !self.y.0 })
                & (if bits & 4 != 0 { self.z.0 } else { !self.z.0 }),
        )
    }

    #[inline(always)]
    #[must_use]
    /// Get the type of the piece occupying a given square, or `None` if the
    /// square is empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use tabiya::{Board, Piece, Square};
    ///
    /// let board = Board::new();
    /// assert_eq!(board.piece_at(Square::E1), Some(Piece::King));
    /// assert_eq!(board.piece_at(Square::E4), None);
    /// ```
    pub const fn piece_at(&self, sq: Square) -> Option<Piece> {
        let bits = self.x.contains(sq) as u8
            | (self.y.contains(sq) as u8) << 1
            | (self.z.contains(sq) as u8) << 2;
        Piece::from_bits(bits)
    }

    /// Place a friendly piece on a given square of the board. The square
    /// must be empty beforehand.
    fn set_square(&mut self, sq: Square, piece: Piece) {
        let bit = Bitboard::from(sq);
        let bits = piece.bits();
        if bits & 1 != 0 {
            self.x |= bit;
        }
        if bits & 2 != 0 {
            self.y |= bit;
        }
        if bits & 4 != 0 {
            self.z |= bit;
        }
        self.white |= bit;
    }

    #[must_use]
    /// Apply a legal move to this board and return the resulting position,
    /// rotated so that the opponent is the new side to move.
    ///
    /// Both the board and the move must be legal; this is guaranteed when
    /// the move came from `generate_moves` on this board. Illegal inputs
    /// produce an unspecified board.
    ///
    /// # Examples
    ///
    /// ```
    /// use tabiya::{Board, Color, Move, Piece, Square};
    ///
    /// let board = Board::new();
    /// let after = board.make_move(Move::new(Square::E2, Square::E4, Piece::Pawn));
    ///
    /// // the result is seen from Black's side: the pushed pawn is an enemy
    /// // pawn on e5, and e6 is capturable en passant
    /// assert_eq!(after.piece_at(Square::E5), Some(Piece::Pawn));
    /// assert!(after.en_passant().contains(Square::E6));
    /// ```
    pub fn make_move(self, m: Move) -> Board {
        let init = m.from_square();
        let dest = m.to_square();
        let piece = m.piece();

        let mut next = self;
        let mut clear = Bitboard::from(init) | Bitboard::from(dest);

        // capturing en passant also removes the pawn below the target square
        if matches!(piece, Piece::Pawn) {
            clear |= (next.en_passant() & Bitboard::from(dest)).south();
        }
        // castling removes the rook from its corner
        if m.is_castling() {
            clear |= if (dest as u8) < (init as u8) {
                Bitboard::from(Square::A1)
            } else {
                Bitboard::from(Square::H1)
            };
        }

        next.x &= !clear;
        next.y &= !clear;
        next.z &= !clear;

        // the moved piece; for promotions this is already the new piece
        next.set_square(dest, piece);

        // the castling rook lands on the square between the king's start and
        // end squares
        if m.is_castling() {
            let middle = Square::try_from((init as u8 + dest as u8) >> 1).unwrap();
            next.set_square(middle, Piece::Rook);
        }

        // a king move forfeits both rights: toggling the x bit turns every
        // friendly castle back into a rook
        if matches!(piece, Piece::King) {
            next.x ^= next.extract(Piece::Castle) & Bitboard::RANK_1;
        }

        let mut black = next.occupied() & !next.white;

        // a double push leaves an en-passant target behind the pawn, handed
        // to the opponent inside their occupancy word
        if matches!(piece, Piece::Pawn) && dest as u8 == init as u8 + 16 {
            black |= Bitboard::from(init) << 8;
        }

        Board {
            x: next.x.byteswap(),
            y: next.y.byteswap(),
            z: next.z.byteswap(),
            white: black.byteswap(),
        }
    }

    /// Parse a position from Forsyth-Edwards notation.
    ///
    /// The first four fields (placement, side to move, castling rights, en
    /// passant) are required; the move counters are tolerated and ignored.
    /// The returned board is rotated into the side to move's perspective,
    /// and the returned color names which side that is.
    ///
    /// Castling letters whose rook or king is missing from its home square
    /// are ignored rather than rejected.
    ///
    /// # Errors
    ///
    /// Will return `Err` if the FEN is malformed, with a `FenError`
    /// describing why.
    ///
    /// # Examples
    ///
    /// ```
    /// use tabiya::{Board, Color};
    ///
    /// let (board, side) =
    ///     Board::from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1").unwrap();
    /// assert_eq!(board, Board::new());
    /// assert_eq!(side, Color::White);
    /// ```
    pub fn from_fen(fen: &str) -> Result<(Board, Color), FenError> {
        let mut board = Board {
            x: Bitboard::EMPTY,
            y: Bitboard::EMPTY,
            z: Bitboard::EMPTY,
            white: Bitboard::EMPTY,
        };
        let mut chars = fen.chars();

        // board layout, from the top rank down
        let mut rank = 7usize;
        let mut file = 0usize;
        loop {
            if (rank, file) == (0, 8) {
                break;
            }
            let c = chars.next().ok_or(FenError::UnexpectedEnd)?;
            if file == 8 {
                if c != '/' {
                    return Err(FenError::UnexpectedCharacter(c));
                }
                rank -= 1;
                file = 0;
            } else if let Some(blanks) = c.to_digit(10) {
                if !(1..=8).contains(&blanks) || file + blanks as usize > 8 {
                    return Err(FenError::SquareOutOfRange);
                }
                file += blanks as usize;
            } else {
                let piece = Piece::from_code(c.to_ascii_uppercase())
                    .ok_or(FenError::UnexpectedCharacter(c))?;
                let sq = Square::new(rank, file).unwrap();
                board.set_square(sq, piece);
                if c.is_ascii_lowercase() {
                    board.white ^= Bitboard::from(sq);
                }
                file += 1;
            }
        }

        if chars.next() != Some(' ') {
            return Err(FenError::UnexpectedEnd);
        }

        let side = match chars.next() {
            Some('w') => Color::White,
            Some('b') => Color::Black,
            Some(c) => return Err(FenError::UnexpectedCharacter(c)),
            None => return Err(FenError::UnexpectedEnd),
        };

        if chars.next() != Some(' ') {
            return Err(FenError::UnexpectedEnd);
        }

        // castling rights re-tag the matching rook as a castle; the letter
        // is ignored when the king or rook is not at home
        let mut c = chars.next().ok_or(FenError::UnexpectedEnd)?;
        while c != ' ' {
            let (rook_sq, king_sq, is_white) = match c {
                'K' => (Square::H1, Square::E1, true),
                'Q' => (Square::A1, Square::E1, true),
                'k' => (Square::H8, Square::E8, false),
                'q' => (Square::A8, Square::E8, false),
                '-' => {
                    c = chars.next().ok_or(FenError::UnexpectedEnd)?;
                    continue;
                }
                _ => return Err(FenError::UnexpectedCharacter(c)),
            };
            if board.piece_at(rook_sq) == Some(Piece::Rook)
                && board.piece_at(king_sq) == Some(Piece::King)
                && board.white.contains(rook_sq) == is_white
                && board.white.contains(king_sq) == is_white
            {
                board.x ^= Bitboard::from(rook_sq);
            }
            c = chars.next().ok_or(FenError::UnexpectedEnd)?;
        }

        // en-passant target square, or '-'
        let mut en_passant = Bitboard::EMPTY;
        match chars.next().ok_or(FenError::UnexpectedEnd)? {
            '-' => (),
            file_chr @ 'a'..='h' => {
                let ep_file = file_chr as usize - 'a' as usize;
                let ep_rank = match chars.next().and_then(|r| r.to_digit(10)) {
                    Some(n @ 1..=8) => n as usize - 1,
                    _ => return Err(FenError::SquareOutOfRange),
                };
                en_passant = Bitboard::from(Square::new(ep_rank, ep_file).unwrap());
            }
            c => return Err(FenError::UnexpectedCharacter(c)),
        }

        // anything left over is move counters, which we do not track

        if !(board.extract(Piece::King) & board.white).has_single_bit()
            || !(board.extract(Piece::King) & !board.white).has_single_bit()
        {
            return Err(FenError::KingCount);
        }

        // rotate so the side to move is the local white
        let board = match side {
            Color::White => Board {
                white: board.white | en_passant,
                ..board
            },
            Color::Black => {
                let black = board.occupied() & !board.white;
                Board {
                    x: board.x.byteswap(),
                    y: board.y.byteswap(),
                    z: board.z.byteswap(),
                    white: (black | en_passant).byteswap(),
                }
            }
        };

        Ok((board, side))
    }
}

impl Display for Board {
    /// Display this board as an 8x8 grid with the far rank on top. Friendly
    /// pieces (the side to move) are uppercase and enemy pieces lowercase;
    /// since the board is stored rotated, the absolute colors are not known
    /// here.
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for rank in (0..8).rev() {
            for file in 0..8 {
                let sq = Square::new(rank, file).unwrap();
                match self.piece_at(sq) {
                    Some(piece) if self.white.contains(sq) => write!(f, "{piece} ")?,
                    Some(piece) => write!(f, "{} ", piece.code().to_lowercase())?,
                    None => write!(f, ". ")?,
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

impl Default for Board {
    fn default() -> Board {
        Board::new()
    }
}
