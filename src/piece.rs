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

//! Pieces, which contain no information about their color or current square.

use std::{
    fmt::{Display, Formatter, Result},
    mem::transmute,
};

#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
#[repr(u8)]
/// The type of a piece. This contains no information about the location of a
/// piece, or of its color.
///
/// The discriminants are the three-bit codes stored in the piece words of a
/// `Board`, with zero left for the empty square. `Castle` denotes a rook
/// which still carries a castling right; it decays to a plain `Rook` as soon
/// as it moves or its king moves. The values of `Castle` and `Rook` are
/// chosen so that both match the pattern `z & !y`, which is what lets
/// `Board::extract` treat every castle as a rook.
pub enum Piece {
    Pawn = 1,
    Knight = 2,
    Bishop = 3,
    Castle = 4,
    Rook = 5,
    Queen = 6,
    King = 7,
}

impl Piece {
    /// The pieces a pawn can promote to, in the order the move generator
    /// emits them. Code that selects a promotion by offset relies on this
    /// ordering.
    pub const PROMOTING: [Piece; 4] = [Piece::Knight, Piece::Bishop, Piece::Rook, Piece::Queen];

    #[inline(always)]
    #[must_use]
    /// Get the three-bit board encoding of this piece.
    pub const fn bits(self) -> u8 {
        self as u8
    }

    #[inline(always)]
    #[must_use]
    /// Reconstruct a piece from its three-bit board encoding. Zero encodes
    /// an empty square and yields `None`.
    pub const fn from_bits(bits: u8) -> Option<Piece> {
        match bits {
            // SAFETY: the discriminants cover every value from 1 to 7.
            1..=7 => Some(unsafe { transmute(bits) }),
            _ => None,
        }
    }

    /// Get the FEN code of this piece as an uppercase string. A castle is
    /// written the same way as a rook; the castling right it carries is
    /// expressed in the castling field of the FEN instead.
    pub const fn code(self) -> &'static str {
        match self {
            Piece::Pawn => "P",
            Piece::Knight => "N",
            Piece::Bishop => "B",
            Piece::Castle | Piece::Rook => "R",
            Piece::Queen => "Q",
            Piece::King => "K",
        }
    }

    /// Given a FEN character, convert it to a piece type. Must be uppercase.
    /// Castling rights re-tag rooks as castles separately, so `'R'` maps to
    /// a plain rook.
    pub const fn from_code(c: char) -> Option<Piece> {
        match c {
            'P' => Some(Piece::Pawn),
            'N' => Some(Piece::Knight),
            'B' => Some(Piece::Bishop),
            'R' => Some(Piece::Rook),
            'Q' => Some(Piece::Queen),
            'K' => Some(Piece::King),
            _ => None,
        }
    }
}

impl Display for Piece {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        write!(f, "{}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bits_round_trip() {
        for piece in [
            Piece::Pawn,
            Piece::Knight,
            Piece::Bishop,
            Piece::Castle,
            Piece::Rook,
            Piece::Queen,
            Piece::King,
        ] {
            assert_eq!(Piece::from_bits(piece.bits()), Some(piece));
        }
        assert_eq!(Piece::from_bits(0), None);
    }

    #[test]
    fn rook_pattern_catches_castles() {
        // both encodings have z set and y clear
        assert_eq!(Piece::Castle.bits() & 0b110, 0b100);
        assert_eq!(Piece::Rook.bits() & 0b110, 0b100);
    }
}
