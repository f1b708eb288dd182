//! Enumeration of reachable positions and detection of critical ones

use indicatif::{ProgressBar, ProgressStyle};

use crate::bitboard::{masks, Position};
use crate::solver::Solver;
use crate::{MAX_PLY, MIN_PLY, WIDTH};

/// A critical position found by the generator
#[derive(Copy, Clone, Debug)]
pub struct CriticalEntry {
    /// The position key (`current + mask`)
    pub key: u64,
    /// The only winning column of the position
    pub winning_col: u8,
    /// The ply at which the position was found
    pub ply: u8,
}

/// Running counters for a generation pass
#[derive(Copy, Clone, Debug, Default)]
pub struct GenerationStats {
    /// Positions visited by the tree walk
    pub visited: u64,
    /// Positions inside the ply window handed to the classifier
    pub analyzed: u64,
    /// Positions classified as critical
    pub critical: u64,
    /// Positions analysed but rejected
    pub skipped: u64,
    /// Solver nodes searched across all classifications
    pub nodes_searched: usize,
}

/// A classifier deciding whether a single position is critical
///
/// # Notes
/// A position is critical when exactly one of its moves wins while every
/// other move draws or loses, and the winning move is not *obvious*: not an
/// immediate four-in-a-row and not the sole block of an opposing threat
pub struct Analyzer {
    /// The solver used to score candidate moves; its transposition table is
    /// shared across all classifications
    pub solver: Solver,
    min_ply: usize,
    max_ply: usize,
}

impl Analyzer {
    /// Creates an `Analyzer` for the default ply window
    pub fn new() -> Self {
        Self::with_ply_window(MIN_PLY, MAX_PLY)
    }

    /// Creates an `Analyzer` restricted to the given ply window
    pub fn with_ply_window(min_ply: usize, max_ply: usize) -> Self {
        Self {
            solver: Solver::new(),
            min_ply,
            max_ply,
        }
    }

    /// Returns the unique winning column if the position is critical
    pub fn classify(&mut self, position: &Position) -> Option<usize> {
        if position.ply() < self.min_ply || position.ply() > self.max_ply {
            return None;
        }
        // a win-in-1 needs no lookup table
        if position.can_win_immediately() {
            return None;
        }
        // a lost position has no winning move to record
        let possible = position.non_losing_moves();
        if possible == 0 {
            return None;
        }

        let mut winning_col = None;
        let mut win_count = 0;
        for column in 0..WIDTH {
            if !position.can_play(column) {
                continue;
            }
            if possible & masks::column(column) == 0 {
                continue;
            }
            let mut child = *position;
            child.play(column);

            // the child score is from the opponent's perspective
            let score = -self.solver.solve(&child);
            if score > 0 {
                win_count += 1;
                winning_col = Some(column);
            }
        }

        match winning_col {
            Some(column) if win_count == 1 && !self.is_obvious(position, column) => Some(column),
            _ => None,
        }
    }

    /// Returns whether a move is obvious: either a win-in-1 or the block of
    /// an immediate opposing threat
    fn is_obvious(&self, position: &Position, column: usize) -> bool {
        let stone = position.move_bit(column);
        position.own_threats() & stone != 0 || position.opponent_threats() & stone != 0
    }
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::new()
    }
}

/// A depth-first generator over all reachable positions in the ply window
///
/// Walks the game tree from the empty board, classifying every node inside
/// the window and collecting the critical ones. Transposed positions reached
/// along different move orders are analysed again rather than de-duplicated;
/// the solver's transposition table absorbs the repeated work
pub struct Generator {
    analyzer: Analyzer,
    critical: Vec<CriticalEntry>,
    stats: GenerationStats,
    progress: ProgressBar,
}

impl Generator {
    const INITIAL_CAPACITY: usize = 1_000_000;

    /// Creates a `Generator` for the default ply window
    pub fn new() -> Self {
        Self::with_ply_window(MIN_PLY, MAX_PLY)
    }

    /// Creates a `Generator` restricted to the given ply window
    pub fn with_ply_window(min_ply: usize, max_ply: usize) -> Self {
        // one progress tick per two-ply subtree
        let progress = ProgressBar::new((WIDTH * WIDTH) as u64);
        progress.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .progress_chars("#>-"),
        );
        Self {
            analyzer: Analyzer::with_ply_window(min_ply, max_ply),
            critical: Vec::with_capacity(Self::INITIAL_CAPACITY),
            stats: GenerationStats::default(),
            progress,
        }
    }

    /// Walks the reachable game tree, returning the critical positions found
    /// and the counters of the pass
    pub fn run(mut self) -> (Vec<CriticalEntry>, GenerationStats) {
        let mut position = Position::new();
        self.descend(&mut position);

        self.stats.nodes_searched = self.analyzer.solver.node_count;
        self.progress.finish_and_clear();
        (self.critical, self.stats)
    }

    fn descend(&mut self, position: &mut Position) {
        self.stats.visited += 1;

        if let Some(winning_col) = self.analyze(position) {
            self.critical.push(CriticalEntry {
                key: position.key(),
                winning_col: winning_col as u8,
                ply: position.ply() as u8,
            });
        }

        // deep enough
        if position.ply() >= self.analyzer.max_ply {
            return;
        }
        // the current player would end the game here, not play on
        if position.can_win_immediately() {
            return;
        }

        for column in 0..WIDTH {
            if !position.can_play(column) {
                continue;
            }
            position.play(column);
            self.descend(position);
            position.undo(column);

            if position.ply() == 1 {
                self.progress.inc(1);
                self.progress.set_message(&format!(
                    "analysed {} | critical {}",
                    self.stats.analyzed, self.stats.critical
                ));
            }
        }
    }

    fn analyze(&mut self, position: &Position) -> Option<usize> {
        if position.ply() < self.analyzer.min_ply || position.ply() > self.analyzer.max_ply {
            return None;
        }
        self.stats.analyzed += 1;
        let result = self.analyzer.classify(position);
        match result {
            Some(_) => self.stats.critical += 1,
            None => self.stats.skipped += 1,
        }
        result
    }
}

impl Default for Generator {
    fn default() -> Self {
        Self::new()
    }
}
