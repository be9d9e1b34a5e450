//! Checkpoint 7: Map Assembly
//!
//! Four map quarters to place, by tapping (next unplaced piece) or by
//! choosing a piece directly. A complete map earns the third key.

use glam::Vec2;

use super::{Lifecycle, Minigame, MinigameContext};
use crate::feedback::{Cue, Sound, vibration};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapPiece {
    pub id: u8,
    pub name: &'static str,
    pub placed: bool,
    /// Slot on the assembled map
    pub correct_position: Vec2,
}

const PIECES: [(u8, &str, Vec2); 4] = [
    (1, "Northwest", Vec2::new(-0.5, 0.5)),
    (2, "Northeast", Vec2::new(0.5, 0.5)),
    (3, "Southwest", Vec2::new(-0.5, -0.5)),
    (4, "Southeast", Vec2::new(0.5, -0.5)),
];

#[derive(Debug)]
pub struct MapGame {
    lc: Lifecycle,
    pieces: Vec<MapPiece>,
}

impl Default for MapGame {
    fn default() -> Self {
        Self::new()
    }
}

impl MapGame {
    pub fn new() -> Self {
        Self {
            lc: Lifecycle::new(7),
            pieces: Self::fresh_pieces(),
        }
    }

    fn fresh_pieces() -> Vec<MapPiece> {
        PIECES
            .iter()
            .map(|&(id, name, correct_position)| MapPiece {
                id,
                name,
                placed: false,
                correct_position,
            })
            .collect()
    }

    pub fn pieces(&self) -> &[MapPiece] {
        &self.pieces
    }

    pub fn placed_count(&self) -> usize {
        self.pieces.iter().filter(|p| p.placed).count()
    }

    /// Place the piece with `id`; returns false for unknown or placed pieces
    pub fn place_piece(&mut self, id: u8) -> bool {
        if !self.lc.accepts_input() {
            return false;
        }
        let Some(piece) = self.pieces.iter_mut().find(|p| p.id == id && !p.placed) else {
            return false;
        };
        piece.placed = true;
        log::debug!("Placed map piece {}", piece.name);

        self.lc
            .cue(Cue::with_vibration(Sound::PiecePlace, vibration::PLACE));
        let placed = self.placed_count();
        self.lc
            .set_progress(placed as f32 / self.pieces.len() as f32 * 100.0);
        if placed == self.pieces.len() {
            self.lc.succeed(Cue::SUCCESS);
        }
        true
    }
}

impl Minigame for MapGame {
    fn lifecycle(&self) -> &Lifecycle {
        &self.lc
    }

    fn lifecycle_mut(&mut self) -> &mut Lifecycle {
        &mut self.lc
    }

    fn initialize(&mut self, _ctx: &mut MinigameContext<'_>) {
        self.lc.activate();
        self.pieces = Self::fresh_pieces();
        self.lc.cue(Cue::sound(Sound::MapUnfold));
    }

    /// Place the next unplaced piece
    fn handle_action(&mut self, _ctx: &mut MinigameContext<'_>) {
        if let Some(id) = self.pieces.iter().find(|p| !p.placed).map(|p| p.id) {
            self.place_piece(id);
        }
    }

    fn reset(&mut self, _ctx: &mut MinigameContext<'_>) {
        self.lc.reset();
        for piece in &mut self.pieces {
            piece.placed = false;
        }
    }

    fn status_text(&self) -> String {
        format!("Pieces: {}/{}", self.placed_count(), self.pieces.len())
    }
}
