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

//! Performance testing, or "perft". Counting the leaves of the full move
//! tree to a fixed depth and comparing against published reference numbers
//! is the canonical correctness oracle for move generation, and doubles as
//! a benchmark of generation plus make-move.

use super::{movegen::generate_moves, Board};

#[must_use]
/// Count the leaf nodes of the move tree of the given position, `depth`
/// plies deep.
///
/// # Panics
///
/// This function will panic if `fen` is not a legal board.
///
/// # Examples
///
/// ```
/// use tabiya::perft::perft;
///
/// // 400 possible positions after one move by each side
/// assert_eq!(
///     perft("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1", 2),
///     400,
/// );
/// ```
pub fn perft(fen: &str, depth: u8) -> u64 {
    let (board, _) = Board::from_fen(fen).unwrap();
    perft_search(&board, depth)
}

/// The core counting loop. Leaf counts are read straight off the buffer
/// length, which skips an entire layer of make-moves.
fn perft_search(board: &Board, depth: u8) -> u64 {
    if depth == 0 {
        return 1;
    }

    let moves = generate_moves(board);
    if depth == 1 {
        return moves.len() as u64;
    }

    let mut total = 0;
    for &m in &moves {
        total += perft_search(&board.make_move(m), depth - 1);
    }

    total
}
