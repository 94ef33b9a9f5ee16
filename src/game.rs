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

//! The game tree: every line of play explored in a session, stored as a
//! tree of variations with a cursor walking through it.
//!
//! Variations live in a fixed arena and point at each other by index, with
//! `u16::MAX` as the null index. Each node holds a strip of up to 32
//! consecutive moves; a node whose strip runs full is continued by an
//! extension child, and alternatives branching off earlier in a strip
//! become sub-variation children. Children of one node form a doubly
//! linked list headed at `first_child`, with new forks spliced in at the
//! front. A 32-bit mask per node records which offsets have at least one
//! fork, so the common no-fork case skips the child walk entirely.
//!
//! Moves are stored as single-byte indices into the move buffer generated
//! at each position, rather than as full moves. The generator's promotion
//! quartet ordering makes this compact encoding unambiguous.
//!
//! Boards along the path from the root to the cursor are cached in a
//! stack, so showing the current position never replays the whole game.
//! A free-bit set over the arena recycles deleted variations, keeping long
//! analysis sessions from exhausting the 1024 slots.

use log::warn;

use super::{
    movegen::generate_moves, Board, Color, FenError, Move, MoveBuffer, Piece, Square,
};

/// The size of the variation arena.
const MAX_VARIATIONS: usize = 1024;

/// The number of moves one variation node can hold before it must be
/// continued by an extension child.
const MAX_BRANCH: usize = 32;

/// The deepest supported line, in plies, root position included.
const MAX_PLY: usize = 512;

/// The null variation index.
const NONE: u16 = u16::MAX;

/// The arena slot of the immortal root variation.
const ROOT: u16 = 0;

#[derive(Clone, Copy)]
/// One node of the game tree: a strip of moves plus its links.
struct Variation {
    /// The next and previous siblings in the parent's child list.
    next: u16,
    prev: u16,
    parent: u16,
    /// The head of this node's child list.
    first_child: u16,
    /// The offset in the parent at which this node branches off;
    /// `MAX_BRANCH` marks a direct continuation of a full parent.
    branch_index: u8,
    /// How many of `moves` are in use.
    branch_length: u8,
    /// Whether a continuation child exists for this (full) node.
    extends: bool,
    /// Bit `i` is set iff at least one child forks off at offset `i`.
    sub_variation_mask: u32,
    /// Move-buffer indices, one per consecutive position along the strip.
    moves: [u8; MAX_BRANCH],
}

impl Variation {
    const EMPTY: Variation = Variation {
        next: NONE,
        prev: NONE,
        parent: NONE,
        first_child: NONE,
        branch_index: 0,
        branch_length: 0,
        extends: false,
        sub_variation_mask: 0,
        moves: [0; MAX_BRANCH],
    };
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
/// An opaque reference to a variation, handed out by [`GameTree::variations`]
/// and accepted back by [`GameTree::select_variation`] and
/// [`GameTree::delete_variation`].
pub struct VariationHandle(u16);

/// A tree of variations with a cursor, suitable for driving an analysis
/// board: every move the user makes either walks an existing line, forks a
/// new one, or extends the current one, and undo/redo step the cursor along
/// the tree without forgetting anything.
///
/// # Examples
///
/// ```
/// use tabiya::{GameTree, Square};
///
/// let mut tree = GameTree::new();
/// assert!(tree.make_move(Square::E2, Square::E4, None));
/// assert!(tree.undo_move());
/// assert!(tree.redo_move());
/// assert_eq!(tree.ply(), 1);
/// ```
pub struct GameTree {
    variations: Box<[Variation]>,
    /// A set bit marks a free arena slot.
    free: [u64; MAX_VARIATIONS / 64],
    current_variation: u16,
    /// The cursor's offset within the current variation, 0..=branch_length.
    current_index: u8,
    /// The number of moves from the root to the cursor.
    ply: usize,
    boards: Box<[Board]>,
    moves: Box<[Move]>,
    root_color: Color,
}

impl GameTree {
    #[must_use]
    /// Create a game tree rooted at the conventional starting position.
    pub fn new() -> GameTree {
        GameTree::with_root(Board::STARTPOS, Color::White)
    }

    /// Create a game tree rooted at the position described by a FEN string.
    ///
    /// # Errors
    ///
    /// Will return `Err` if the FEN is malformed.
    pub fn from_fen(fen: &str) -> Result<GameTree, FenError> {
        let (board, side) = Board::from_fen(fen)?;
        Ok(GameTree::with_root(board, side))
    }

    fn with_root(board: Board, side: Color) -> GameTree {
        let mut free = [!0u64; MAX_VARIATIONS / 64];
        free[0] &= !1; // the root slot is permanently taken

        GameTree {
            variations: vec![Variation::EMPTY; MAX_VARIATIONS].into_boxed_slice(),
            free,
            current_variation: ROOT,
            current_index: 0,
            ply: 0,
            boards: vec![board; MAX_PLY].into_boxed_slice(),
            moves: vec![Move::new(Square::A1, Square::A1, Piece::Pawn); MAX_PLY].into_boxed_slice(),
            root_color: side,
        }
    }

    #[inline(always)]
    #[must_use]
    /// Get the board at the cursor, from the point of view of the side to
    /// move.
    pub fn board(&self) -> Board {
        self.boards[self.ply]
    }

    #[inline(always)]
    #[must_use]
    /// Get the move that led to the cursor's position, or `None` at the
    /// root. The move's squares are in the frame of the position it was
    /// played from; useful for highlighting the previous move.
    pub fn last_move(&self) -> Option<Move> {
        (self.ply > 0).then(|| self.moves[self.ply])
    }

    #[inline(always)]
    #[must_use]
    /// Get the number of moves between the root and the cursor.
    pub fn ply(&self) -> usize {
        self.ply
    }

    #[must_use]
    /// Get the color whose turn it is at the cursor. The board itself is
    /// rotated and colorless; this is what a renderer needs to decide which
    /// way to draw it.
    pub fn side_to_move(&self) -> Color {
        if self.ply % 2 == 0 {
            self.root_color
        } else {
            !self.root_color
        }
    }

    /// Make the move from `from` to `to` at the cursor.
    ///
    /// The request does not have to be a fully spelled-out move; any legal
    /// move matching the two squares is accepted, with `promotion` choosing
    /// among a promoting pawn's four options (knight when unspecified).
    /// `promotion` is ignored when the move is not a promotion.
    ///
    /// If the move already lies on the tree at the cursor, whether as the
    /// next move of the current line or as an existing fork, the cursor
    /// walks into it without changing the tree. Otherwise the move is
    /// recorded, appended to the current line or forked off it as needed.
    ///
    /// Returns `false`, changing nothing, if no legal move matches, if the
    /// line has reached the depth limit, or if the arena is out of nodes.
    pub fn make_move(&mut self, from: Square, to: Square, promotion: Option<Piece>) -> bool {
        if self.ply + 1 >= MAX_PLY {
            warn!("line is {} plies deep; refusing to extend it", self.ply);
            return false;
        }

        let position = self.boards[self.ply];
        let moves = generate_moves(&position);
        let found = moves
            .iter()
            .position(|m| m.from_square() == from && m.to_square() == to);
        let mut index = match found {
            Some(i) => i,
            None => return false,
        };

        // promotions for one destination sit contiguously as knight,
        // bishop, rook, queen, so the request selects by offset
        if position.piece_at(from) == Some(Piece::Pawn) && to.rank() == 7 {
            index += match promotion.unwrap_or(Piece::Knight) {
                Piece::Knight => 0,
                Piece::Bishop => 1,
                Piece::Rook => 2,
                Piece::Queen => 3,
                _ => return false,
            };
        }
        #[allow(clippy::cast_possible_truncation)]
        let index = index as u8;

        let recorded = if self.current_index
            == self.variations[self.current_variation as usize].branch_length
        {
            self.append_move(index)
        } else {
            self.insert_move(index)
        };
        if !recorded {
            return false;
        }

        let m = moves[index as usize];
        self.current_index += 1;
        self.push(position.make_move(m), m);
        true
    }

    /// Step the cursor one move back toward the root. Returns `false` at
    /// the root.
    pub fn undo_move(&mut self) -> bool {
        if self.ply == 0 {
            return false;
        }

        self.current_index -= 1;
        self.ply -= 1;
        self.normalize();
        true
    }

    /// Hop the cursor out of variation heads it has backed into, up to the
    /// oldest node describing its position. Forks always hang off that
    /// node, so the cursor must sit there for the sibling search (and the
    /// walk-forward deduplication) to see them.
    fn normalize(&mut self) {
        while self.current_index == 0 && self.current_variation != ROOT {
            let v = self.variations[self.current_variation as usize];
            self.current_index = v.branch_index;
            self.current_variation = v.parent;
        }
    }

    /// Step the cursor one move forward along its current line, replaying
    /// the stored move. Returns `false` at the end of the line.
    pub fn redo_move(&mut self) -> bool {
        // at the end of a full strip, continue into its extension child
        if self.current_index as usize == MAX_BRANCH
            && self.variations[self.current_variation as usize].extends
        {
            if let Some(child) = self.find_child(self.current_variation, MAX_BRANCH as u8, None) {
                self.current_variation = child;
                self.current_index = 0;
            }
        }

        let v = self.variations[self.current_variation as usize];
        if self.current_index == v.branch_length {
            return false;
        }

        let board = self.boards[self.ply];
        let moves = generate_moves(&board);
        let m = moves[v.moves[self.current_index as usize] as usize];

        self.current_index += 1;
        self.push(board.make_move(m), m);
        true
    }

    #[must_use]
    /// Iterate over the alternative lines available at the cursor: each
    /// item is a handle to a variation forking off here, paired with its
    /// first move. The set is exactly the children of the current node
    /// branching at the cursor's offset.
    pub fn variations(&self) -> Variations<'_> {
        Variations {
            tree: self,
            needle: self.variations[self.current_variation as usize].first_child,
            branch_index: self.current_index,
            moves: generate_moves(&self.boards[self.ply]),
        }
    }

    /// Descend into a variation previously returned by [`variations`],
    /// playing its first move. Returns `false` if the handle is stale or
    /// does not belong to the cursor's position.
    ///
    /// [`variations`]: GameTree::variations
    pub fn select_variation(&mut self, handle: VariationHandle) -> bool {
        let slot = handle.0;
        if slot as usize >= MAX_VARIATIONS || !self.is_allocated(slot) {
            return false;
        }
        let v = self.variations[slot as usize];
        if v.parent != self.current_variation || v.branch_index != self.current_index {
            return false;
        }
        if self.ply + 1 >= MAX_PLY {
            return false;
        }

        let board = self.boards[self.ply];
        let moves = generate_moves(&board);
        let m = moves[v.moves[0] as usize];

        self.current_variation = slot;
        self.current_index = 1;
        self.push(board.make_move(m), m);
        true
    }

    /// Delete a variation previously returned by [`variations`], along
    /// with every line branching off it, and recycle their arena slots.
    /// Returns `false` if the handle is stale or does not belong to the
    /// cursor's position.
    ///
    /// [`variations`]: GameTree::variations
    pub fn delete_variation(&mut self, handle: VariationHandle) -> bool {
        let slot = handle.0;
        if slot == ROOT || slot as usize >= MAX_VARIATIONS || !self.is_allocated(slot) {
            return false;
        }
        let v = self.variations[slot as usize];
        if v.parent != self.current_variation {
            return false;
        }

        // unlink from the sibling list
        if v.prev != NONE {
            self.variations[v.prev as usize].next = v.next;
        } else {
            self.variations[v.parent as usize].first_child = v.next;
        }
        if v.next != NONE {
            self.variations[v.next as usize].prev = v.prev;
        }

        // drop the parent's fork marker when the last fork at this offset
        // disappears
        if self.find_child(v.parent, v.branch_index, None).is_none() {
            if v.branch_index as usize == MAX_BRANCH {
                self.variations[v.parent as usize].extends = false;
            } else {
                self.variations[v.parent as usize].sub_variation_mask &= !(1 << v.branch_index);
            }
        }

        self.release_subtree(slot);
        true
    }

    /// Record a move at the end of the current variation, growing the strip
    /// or continuing into an extension node as needed.
    fn append_move(&mut self, index: u8) -> bool {
        let current = self.current_variation as usize;

        if self.variations[current].branch_length as usize == MAX_BRANCH {
            // walk into a matching continuation before allocating a new one
            if self.variations[current].extends {
                if let Some(child) =
                    self.find_child(self.current_variation, MAX_BRANCH as u8, Some(index))
                {
                    self.current_variation = child;
                    self.current_index = 0;
                    return true;
                }
            }
            match self.allocate_variation(MAX_BRANCH as u8, index) {
                Some(slot) => {
                    self.current_variation = slot;
                    self.current_index = 0;
                    true
                }
                None => false,
            }
        } else {
            let length = self.variations[current].branch_length;
            self.variations[current].moves[length as usize] = index;
            self.variations[current].branch_length += 1;
            true
        }
    }

    /// Record a move in the middle of the current variation: walk forward
    /// if it is already the next move, descend into a matching fork, or
    /// create a fresh one.
    fn insert_move(&mut self, index: u8) -> bool {
        let current = self.current_variation as usize;
        let offset = self.current_index;

        if self.variations[current].moves[offset as usize] == index {
            return true;
        }

        if self.variations[current].sub_variation_mask >> offset & 1 != 0 {
            if let Some(child) = self.find_child(self.current_variation, offset, Some(index)) {
                self.current_variation = child;
                self.current_index = 0;
                return true;
            }
        }

        match self.allocate_variation(offset, index) {
            Some(slot) => {
                self.current_variation = slot;
                self.current_index = 0;
                true
            }
            None => false,
        }
    }

    /// Find a child of `parent` branching at `branch_index`, optionally
    /// with a specific first move.
    fn find_child(&self, parent: u16, branch_index: u8, first_move: Option<u8>) -> Option<u16> {
        let mut child = self.variations[parent as usize].first_child;
        while child != NONE {
            let v = &self.variations[child as usize];
            if v.branch_index == branch_index && first_move.map_or(true, |m| v.moves[0] == m) {
                return Some(child);
            }
            child = v.next;
        }
        None
    }

    /// Take a fresh node from the arena and splice it in as the first
    /// child of the current variation. Returns `None` when the arena is
    /// exhausted, leaving the tree untouched.
    fn allocate_variation(&mut self, branch_index: u8, first_move: u8) -> Option<u16> {
        let slot = self.reserve_slot()?;
        let parent = self.current_variation;

        let head = self.variations[parent as usize].first_child;
        if head != NONE {
            self.variations[head as usize].prev = slot;
        }

        let mut moves = [0u8; MAX_BRANCH];
        moves[0] = first_move;
        self.variations[slot as usize] = Variation {
            next: head,
            prev: NONE,
            parent,
            first_child: NONE,
            branch_index,
            branch_length: 1,
            extends: false,
            sub_variation_mask: 0,
            moves,
        };
        self.variations[parent as usize].first_child = slot;

        if branch_index as usize == MAX_BRANCH {
            self.variations[parent as usize].extends = true;
        } else {
            self.variations[parent as usize].sub_variation_mask |= 1 << branch_index;
        }

        Some(slot)
    }

    /// Claim the lowest free arena slot.
    fn reserve_slot(&mut self) -> Option<u16> {
        for (word_index, word) in self.free.iter_mut().enumerate() {
            if *word != 0 {
                let bit = word.trailing_zeros();
                *word &= *word - 1;
                #[allow(clippy::cast_possible_truncation)]
                return Some((word_index * 64) as u16 + bit as u16);
            }
        }
        warn!("variation arena exhausted; refusing to record a new line");
        None
    }

    fn release_slot(&mut self, slot: u16) {
        self.free[slot as usize / 64] |= 1 << (slot % 64);
    }

    fn is_allocated(&self, slot: u16) -> bool {
        self.free[slot as usize / 64] & (1 << (slot % 64)) == 0
    }

    /// Return a variation and all of its descendants to the free set.
    fn release_subtree(&mut self, slot: u16) {
        let mut child = self.variations[slot as usize].first_child;
        while child != NONE {
            let next = self.variations[child as usize].next;
            self.release_subtree(child);
            child = next;
        }
        self.release_slot(slot);
    }

    fn push(&mut self, board: Board, m: Move) {
        self.ply += 1;
        self.boards[self.ply] = board;
        self.moves[self.ply] = m;
    }

    #[cfg(test)]
    fn live_variations(&self) -> usize {
        MAX_VARIATIONS - self.free.iter().map(|w| w.count_ones() as usize).sum::<usize>()
    }
}

impl Default for GameTree {
    fn default() -> GameTree {
        GameTree::new()
    }
}

/// An iterator over the alternative lines at the cursor, created by
/// [`GameTree::variations`]. The cursor position and its legal moves are
/// snapshotted at creation.
pub struct Variations<'a> {
    tree: &'a GameTree,
    needle: u16,
    branch_index: u8,
    moves: MoveBuffer,
}

impl Iterator for Variations<'_> {
    type Item = (VariationHandle, Move);

    fn next(&mut self) -> Option<(VariationHandle, Move)> {
        while self.needle != NONE {
            let v = &self.tree.variations[self.needle as usize];
            let handle = VariationHandle(self.needle);
            self.needle = v.next;
            if v.branch_index == self.branch_index {
                return Some((handle, self.moves[v.moves[0] as usize]));
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A four-ply knight shuffle that is legal forever from the start
    /// position; both sides bounce a knight between its home square and
    /// the third rank. The coordinates are the same for both sides because
    /// the board is rotated between moves.
    const SHUFFLE: [(Square, Square); 4] = [
        (Square::B1, Square::C3),
        (Square::B1, Square::C3),
        (Square::C3, Square::B1),
        (Square::C3, Square::B1),
    ];

    fn shuffle_move(tree: &mut GameTree, i: usize) -> bool {
        let (from, to) = SHUFFLE[i % 4];
        tree.make_move(from, to, None)
    }

    #[test]
    fn walk_undo_redo() {
        let mut tree = GameTree::new();
        assert_eq!(tree.board(), Board::STARTPOS);
        assert_eq!(tree.last_move(), None);
        assert_eq!(tree.side_to_move(), Color::White);

        assert!(tree.make_move(Square::E2, Square::E4, None));
        assert_eq!(tree.ply(), 1);
        assert_eq!(tree.side_to_move(), Color::Black);
        let last = tree.last_move().unwrap();
        assert_eq!(last.from_square(), Square::E2);
        assert_eq!(last.to_square(), Square::E4);

        let after_e4 = tree.board();
        assert!(tree.undo_move());
        assert_eq!(tree.board(), Board::STARTPOS);
        assert!(!tree.undo_move());

        assert!(tree.redo_move());
        assert_eq!(tree.board(), after_e4);
        assert!(!tree.redo_move());
    }

    #[test]
    fn illegal_requests_change_nothing() {
        let mut tree = GameTree::new();
        assert!(!tree.make_move(Square::E2, Square::E5, None));
        assert!(!tree.make_move(Square::E7, Square::E5, None));
        assert_eq!(tree.ply(), 0);
        assert_eq!(tree.live_variations(), 1);
    }

    #[test]
    fn replaying_a_line_is_idempotent() {
        let mut tree = GameTree::new();
        for i in 0..8 {
            assert!(shuffle_move(&mut tree, i));
        }
        let boards: Vec<Board> = (0..=8).map(|p| tree.boards[p]).collect();
        let live = tree.live_variations();

        for _ in 0..8 {
            assert!(tree.undo_move());
        }

        // making the identical moves again walks the stored line without
        // allocating or changing anything
        for i in 0..8 {
            assert!(shuffle_move(&mut tree, i));
            assert_eq!(tree.board(), boards[i + 1]);
        }
        assert_eq!(tree.live_variations(), live);
    }

    #[test]
    fn undo_redo_cross_strip_boundaries() {
        let mut tree = GameTree::new();
        for i in 0..40 {
            assert!(shuffle_move(&mut tree, i));
        }
        // the root strip held 32 moves, the extension holds the rest
        assert_eq!(tree.live_variations(), 2);
        assert_eq!(tree.ply(), 40);

        let boards: Vec<Board> = (0..=40).map(|p| tree.boards[p]).collect();
        for _ in 0..40 {
            assert!(tree.undo_move());
        }
        assert_eq!(tree.ply(), 0);
        for expected in boards.iter().skip(1) {
            assert!(tree.redo_move());
            assert_eq!(tree.board(), *expected);
        }
        assert!(!tree.redo_move());

        // replaying across the boundary must not duplicate the extension
        for _ in 0..40 {
            assert!(tree.undo_move());
        }
        for i in 0..40 {
            assert!(shuffle_move(&mut tree, i));
        }
        assert_eq!(tree.live_variations(), 2);
    }

    #[test]
    fn forks_become_sub_variations() {
        let mut tree = GameTree::new();
        assert!(tree.make_move(Square::E2, Square::E4, None));
        assert!(tree.undo_move());

        // a different move at the same spot forks the tree
        assert!(tree.make_move(Square::D2, Square::D4, None));
        assert_eq!(tree.live_variations(), 2);
        let after_d4 = tree.board();
        assert!(tree.undo_move());

        // both lines are now reachable: e4 on the main line, d4 as a fork
        assert!(tree.make_move(Square::E2, Square::E4, None));
        assert!(tree.undo_move());
        assert!(tree.make_move(Square::D2, Square::D4, None));
        assert_eq!(tree.board(), after_d4);
        assert_eq!(tree.live_variations(), 2);
    }

    #[test]
    fn search_lists_each_alternative_exactly_once() {
        let mut tree = GameTree::new();
        assert!(tree.make_move(Square::E2, Square::E4, None));
        assert!(tree.undo_move());
        assert!(tree.make_move(Square::D2, Square::D4, None));
        assert!(tree.undo_move());
        assert!(tree.make_move(Square::C2, Square::C4, None));
        assert!(tree.undo_move());

        let alternatives: Vec<(VariationHandle, Move)> = tree.variations().collect();
        // e4 is the main line; d4 and c4 are its alternatives, newest first
        assert_eq!(alternatives.len(), 2);
        assert_eq!(alternatives[0].1.from_square(), Square::C2);
        assert_eq!(alternatives[0].1.to_square(), Square::C4);
        assert_eq!(alternatives[1].1.from_square(), Square::D2);
        assert_eq!(alternatives[1].1.to_square(), Square::D4);

        // away from the fork point there are no alternatives
        assert!(tree.make_move(Square::E2, Square::E4, None));
        assert_eq!(tree.variations().count(), 0);
    }

    #[test]
    fn select_descends_into_a_searched_variation() {
        let mut tree = GameTree::new();
        assert!(tree.make_move(Square::E2, Square::E4, None));
        assert!(tree.undo_move());
        assert!(tree.make_move(Square::D2, Square::D4, None));
        let after_d4 = tree.board();
        assert!(tree.undo_move());

        let (handle, m) = tree.variations().next().unwrap();
        assert_eq!(m.to_square(), Square::D4);
        assert!(tree.select_variation(handle));
        assert_eq!(tree.ply(), 1);
        assert_eq!(tree.board(), after_d4);

        // the handle no longer matches the cursor's position
        assert!(!tree.select_variation(handle));
    }

    #[test]
    fn delete_recycles_subtrees() {
        let mut tree = GameTree::new();
        assert!(tree.make_move(Square::E2, Square::E4, None));
        assert!(tree.undo_move());

        // build a fork with its own nested fork; the replies are given in
        // the rotated frame, so Black's ...d5 reads as d2-d4 too
        assert!(tree.make_move(Square::D2, Square::D4, None));
        assert!(tree.make_move(Square::D2, Square::D4, None));
        assert!(tree.undo_move());
        assert!(tree.make_move(Square::G1, Square::F3, None));
        assert!(tree.undo_move());
        assert!(tree.undo_move());
        assert_eq!(tree.live_variations(), 3);

        let (handle, m) = tree.variations().next().unwrap();
        assert_eq!(m.to_square(), Square::D4);
        assert!(tree.delete_variation(handle));
        assert_eq!(tree.live_variations(), 1);
        assert_eq!(tree.variations().count(), 0);

        // the deleted handle is now stale
        assert!(!tree.select_variation(handle));
        assert!(!tree.delete_variation(handle));

        // and the main line is untouched
        assert!(tree.redo_move());
        assert_eq!(tree.ply(), 1);

        // freed slots are reused by the next fork
        assert!(tree.undo_move());
        assert!(tree.make_move(Square::D2, Square::D4, None));
        assert_eq!(tree.live_variations(), 2);
    }

    #[test]
    fn promotion_requests_select_from_the_quartet() {
        let mut tree = GameTree::from_fen("4k3/P7/8/8/8/8/8/4K3 w - -").unwrap();

        // a knight is the default
        assert!(tree.make_move(Square::A7, Square::A8, None));
        assert_eq!(tree.board().piece_at(Square::A1), Some(Piece::Knight));
        assert!(tree.undo_move());

        assert!(tree.make_move(Square::A7, Square::A8, Some(Piece::Queen)));
        assert_eq!(tree.board().piece_at(Square::A1), Some(Piece::Queen));
        assert!(tree.undo_move());

        // promoting to a king is not a thing
        assert!(!tree.make_move(Square::A7, Square::A8, Some(Piece::King)));
    }

    #[test]
    fn ply_stack_exhaustion_is_refused() {
        let mut tree = GameTree::new();
        let mut made = 0;
        for i in 0..MAX_PLY + 8 {
            if !shuffle_move(&mut tree, i) {
                break;
            }
            made += 1;
        }
        assert_eq!(made, MAX_PLY - 1);
        assert_eq!(tree.ply(), MAX_PLY - 1);

        // the refusal left the tree walkable
        assert!(tree.undo_move());
        assert!(tree.redo_move());
    }

    #[test]
    fn arena_exhaustion_is_refused() {
        // lay down the longest possible mainline, then walk it backwards,
        // forking two fresh alternatives at every position along the way
        let mut tree = GameTree::new();
        for i in 0..MAX_PLY - 1 {
            assert!(shuffle_move(&mut tree, i));
        }

        let mut exhausted = false;
        while tree.undo_move() {
            let moves = generate_moves(&tree.board());
            let mut grown = 0;
            for m in moves.iter().copied() {
                if grown == 2 {
                    break;
                }
                let live = tree.live_variations();
                if !tree.make_move(m.from_square(), m.to_square(), None) {
                    exhausted = true;
                    break;
                }
                assert!(tree.undo_move());
                if tree.live_variations() > live {
                    grown += 1;
                }
            }
            if exhausted {
                break;
            }
        }

        assert!(exhausted);
        assert_eq!(tree.live_variations(), MAX_VARIATIONS);

        // the refusal left the tree walkable
        assert!(tree.undo_move());
        assert!(tree.redo_move());
    }
}
