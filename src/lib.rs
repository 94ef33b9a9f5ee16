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

//! Tabiya is the board logic behind a chess analysis GUI: a bitboard-based
//! legal move generator and a game tree that records every line the user
//! explores, with full support for variations, undo/redo, and promotion
//! handling.
//!
//! The position representation is unusual in two ways. Piece placement
//! lives in three overlapping bitboards forming a 3-bit code per square,
//! and the board is vertically mirrored after every move so that the side
//! to move always looks "up" the board. Castling rights are folded into the
//! piece encoding itself. See [`Board`] for details.
//!
//! Rendering, event handling, and engine analysis all live elsewhere; this
//! crate only answers the questions "what is legal here?" and "where has
//! the game been?".

// Many module elements are re-exported to make names more ergonomic to
// access.

mod bitboard;
pub use crate::bitboard::Bitboard;

mod board;
pub use board::{Board, FenError};

mod color;
pub use color::Color;

mod direction;
pub use direction::Direction;

mod game;
pub use game::{GameTree, VariationHandle, Variations};

mod magic;

pub mod movegen;

mod moves;
pub use moves::{Move, MoveBuffer, MAX_MOVES};

pub mod perft;

mod piece;
pub use piece::Piece;

mod square;
pub use square::Square;
