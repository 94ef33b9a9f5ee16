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

//! Directions, which form a vector field describing motions between `Square`s.

use std::ops::Add;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
/// A difference between two squares. Directions form a vector field, which
/// allows us to define subtraction between squares. Internally, they use the
/// same representation as a `Square` but with a signed integer.
pub struct Direction(pub(crate) i8);

impl Direction {
    /// A `Direction` corresponding to a move "north", in the direction the
    /// side to move pushes its pawns.
    pub const NORTH: Direction = Direction(8);

    /// A `Direction` corresponding to a move "east", toward the H file.
    pub const EAST: Direction = Direction(1);

    /// A `Direction` corresponding to a move "west", toward the A file.
    pub const WEST: Direction = Direction(-1);

    /// A `Direction` corresponding to a move "northwest".
    pub const NORTHWEST: Direction = Direction(Direction::NORTH.0 + Direction::WEST.0);

    /// A `Direction` corresponding to a move "northeast".
    pub const NORTHEAST: Direction = Direction(Direction::NORTH.0 + Direction::EAST.0);
}

impl Add for Direction {
    type Output = Direction;

    #[inline(always)]
    fn add(self, rhs: Direction) -> Direction {
        Direction(self.0 + rhs.0)
    }
}
