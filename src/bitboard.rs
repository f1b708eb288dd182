//! A compact, computationally efficient bit array representation of a Connect 4 position

use anyhow::{anyhow, Result};

use crate::{HEIGHT, WIDTH};

pub mod masks {
    use crate::{HEIGHT, WIDTH};

    /// Mask of the bottom square of a given column
    pub const fn bottom_cell(column: usize) -> u64 {
        1 << (column * (HEIGHT + 1))
    }

    /// Mask of the top square of a given column
    pub const fn top_cell(column: usize) -> u64 {
        1 << (column * (HEIGHT + 1) + (HEIGHT - 1))
    }

    /// Mask of all squares of a given column
    pub const fn column(column: usize) -> u64 {
        ((1 << HEIGHT) - 1) << (column * (HEIGHT + 1))
    }

    /// Mask of the bottom row of the board
    pub const fn bottom_row() -> u64 {
        let mut mask = 0;
        let mut column = 0;
        while column < WIDTH {
            mask |= bottom_cell(column);
            column += 1;
        }
        mask
    }

    /// Mask of the whole board
    pub const fn board() -> u64 {
        bottom_row() * ((1 << HEIGHT as u64) - 1)
    }
}

/// Returns a bitmap of the empty squares where a stone of `player` would
/// complete a four-in-a-row
///
/// # Notes
/// For each of the four alignment directions the shift stride between
/// neighbouring squares is `1` (vertical), `HEIGHT + 1` (horizontal),
/// `HEIGHT` (diagonal /) and `HEIGHT + 2` (diagonal \). Intersecting
/// shifted copies of `player` marks the squares adjacent to three-in-a-row
/// runs, including the holes of broken runs like `O O _ O`. The result is
/// restricted to squares not yet in `occupied`
pub fn threats(player: u64, occupied: u64) -> u64 {
    // vertical
    // the square on top of a stack of 3
    let mut r = (player << 1) & (player << 2) & (player << 3);

    // horizontal
    let mut p = (player << (HEIGHT + 1)) & (player << (2 * (HEIGHT + 1)));
    // right ends of 3-alignments
    r |= p & (player << (3 * (HEIGHT + 1)));
    // holes of the type ...O O _ O...
    r |= p & (player >> (HEIGHT + 1));

    p = (player >> (HEIGHT + 1)) & (player >> (2 * (HEIGHT + 1)));
    // left ends of 3-alignments
    r |= p & (player >> (3 * (HEIGHT + 1)));
    // holes of the type ...O _ O O...
    r |= p & (player << (HEIGHT + 1));

    // diagonal /
    p = (player << HEIGHT) & (player << (2 * HEIGHT));
    r |= p & (player << (3 * HEIGHT));
    r |= p & (player >> HEIGHT);

    p = (player >> HEIGHT) & (player >> (2 * HEIGHT));
    r |= p & (player >> (3 * HEIGHT));
    r |= p & (player << HEIGHT);

    // diagonal \
    p = (player << (HEIGHT + 2)) & (player << (2 * (HEIGHT + 2)));
    r |= p & (player << (3 * (HEIGHT + 2)));
    r |= p & (player >> (HEIGHT + 2));

    p = (player >> (HEIGHT + 2)) & (player >> (2 * (HEIGHT + 2)));
    r |= p & (player >> (3 * (HEIGHT + 2)));
    r |= p & (player << (HEIGHT + 2));

    r & (masks::board() ^ occupied)
}

/// A Connect 4 position held in two bitboards
///
/// # Notes
/// A 7x6 board fits into the bits of a `u64` like so:
///
/// ```comment
/// Column:  0  1  2  3  4  5  6
///
///          6  13 20 27 34 41 48
///          ____________________
///       5 |05 12 19 26 33 40 47|
///       4 |04 11 18 25 32 39 46|
///       3 |03 10 17 24 31 38 45|
///       2 |02 09 16 23 30 37 44|
///       1 |01 08 15 22 29 36 43|
/// Rows: 0 |00 07 14 21 28 35 42|
/// ```
/// Where bit index 00 is the least significant bit. The extra row of bits on
/// top of the board identifies full columns and prevents carries overflowing
/// into the next column.
///
/// One `u64` stores a mask of all squares containing a stone of either
/// colour, the other stores only the stones of the player whose turn it is.
/// The stones of the opponent are `current XOR mask`
///
/// # Position Keys
/// `current + mask` identifies a position unambiguously in a single `u64`:
/// the addition marks the lowest empty square of each column owned by the
/// side to move, which is a known bijection for this bit layout. The key
/// indexes the [transposition table] and the critical-position database
///
/// [transposition table]: ../transposition_table/struct.TranspositionTable.html
#[derive(Copy, Clone)]
pub struct Position {
    // stones of the player to move
    current: u64,
    // stones of both players
    mask: u64,
    ply: usize,
}

impl Position {
    /// Creates a new, empty position
    pub fn new() -> Self {
        Self {
            current: 0,
            mask: 0,
            ply: 0,
        }
    }

    /// Creates a position from its constituent bit masks and move counter
    pub fn from_parts(current: u64, mask: u64, ply: usize) -> Self {
        Self { current, mask, ply }
    }

    /// Creates a position from a string of 1-indexed moves
    ///
    /// # Notes
    /// The move string is a sequence of columns played, indexed from 1
    /// (meaning `"0"` is an invalid move)
    ///
    /// Returns `Err` if the move string represents an invalid position.
    /// Invalid positions can contain moves outside the column range,
    /// overfilled columns and winning positions for either player
    ///
    /// # Example
    /// ```
    /// use critical4::bitboard::Position;
    ///
    /// # fn main() -> anyhow::Result<()> {
    /// // columns in move strings are 1-indexed
    /// let position = Position::from_moves("112233")?;
    ///
    /// // columns as integers are 0-indexed
    /// assert_eq!(position.winning_col(), Some(3));
    /// # Ok(())
    /// # }
    /// ```
    pub fn from_moves<S: AsRef<str>>(moves: S) -> Result<Self> {
        let mut position = Self::new();

        for column_char in moves.as_ref().chars() {
            match column_char.to_digit(10).map(|c| c as usize) {
                Some(column @ 1..=WIDTH) => {
                    let column = column - 1;
                    if !position.can_play(column) {
                        return Err(anyhow!("Invalid move, column {} full", column + 1));
                    }
                    // abort if the position is won at any point
                    if position.own_threats() & position.move_bit(column) != 0 {
                        return Err(anyhow!("Invalid position, game is over"));
                    }
                    position.play(column);
                }
                _ => return Err(anyhow!("could not parse '{}' as a valid move", column_char)),
            }
        }
        Ok(position)
    }

    /// Accesses the internal mask of the current player's stones
    pub fn current(&self) -> u64 {
        self.current
    }

    /// Accesses the internal mask of stones on the whole board
    pub fn mask(&self) -> u64 {
        self.mask
    }

    /// Accesses the internal move counter
    pub fn ply(&self) -> usize {
        self.ply
    }

    /// Returns the key identifying this position (see [Position Keys])
    ///
    /// [Position Keys]: #position-keys
    pub fn key(&self) -> u64 {
        self.current + self.mask
    }

    /// Returns whether a column has room for another stone
    pub fn can_play(&self, column: usize) -> bool {
        self.mask & masks::top_cell(column) == 0
    }

    /// Returns a bitmap of the next free square of a column, or 0 if the
    /// column is full
    pub fn move_bit(&self, column: usize) -> u64 {
        (self.mask + masks::bottom_cell(column)) & masks::column(column)
    }

    /// Returns a mask of the playable squares, one per non-full column
    pub fn playable_cells(&self) -> u64 {
        (self.mask + masks::bottom_row()) & masks::board()
    }

    /// Drops a stone of the current player into a column and switches players
    pub fn play(&mut self, column: usize) {
        debug_assert!(self.can_play(column));
        let stone = self.move_bit(column);
        self.play_bit(stone);
    }

    /// Applies a pre-computed move bitmap and switches players
    pub fn play_bit(&mut self, stone: u64) {
        // switch the current player
        self.current ^= self.mask;
        // add a stone of the previous player to its column
        self.mask |= stone;
        self.ply += 1;
    }

    /// Removes the top stone of a column and switches players back
    pub fn undo(&mut self, column: usize) {
        self.ply -= 1;
        // find the top stone of the column
        let column_stones = self.mask & masks::column(column);
        let mut top_stone = 0;
        for row in (0..HEIGHT).rev() {
            let bit = 1 << (row + column * (HEIGHT + 1));
            if column_stones & bit != 0 {
                top_stone = bit;
                break;
            }
        }
        self.mask ^= top_stone;
        self.current ^= self.mask;
    }

    /// Returns a bitmap of the empty squares completing an alignment for
    /// the player to move
    pub fn own_threats(&self) -> u64 {
        threats(self.current, self.mask)
    }

    /// Returns a bitmap of the empty squares completing an alignment for
    /// the opponent
    pub fn opponent_threats(&self) -> u64 {
        threats(self.current ^ self.mask, self.mask)
    }

    /// Returns whether the player to move can complete a four-in-a-row on
    /// this turn
    pub fn can_win_immediately(&self) -> bool {
        self.own_threats() & self.playable_cells() != 0
    }

    /// Returns the lowest-index column holding an immediate win for the
    /// player to move, if one exists
    pub fn winning_col(&self) -> Option<usize> {
        let winning_moves = self.own_threats() & self.playable_cells();
        if winning_moves == 0 {
            return None;
        }
        (0..WIDTH).find(|&column| winning_moves & masks::column(column) != 0)
    }

    /// Returns a bitmap of all moves that don't hand the opponent a win on
    /// the next turn
    pub fn non_losing_moves(&self) -> u64 {
        let mut possible = self.playable_cells();
        let opponent_threats = self.opponent_threats();
        let forced = possible & opponent_threats;

        if forced != 0 {
            // with more than one forced square the opponent can't be stopped
            if forced & (forced - 1) != 0 {
                return 0;
            } else {
                possible = forced;
            }
        }
        // never play directly below an opponent threat
        possible & !(opponent_threats >> 1)
    }

    /// Scores a candidate move by counting the threats it creates
    pub fn move_score(&self, candidate: u64) -> i32 {
        threats(self.current | candidate, self.mask).count_ones() as i32
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::new()
    }
}
