//! Tile grid the road layout is placed on

use super::types::Position;

/// A grid cell. Immutable once the grid is built.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tile {
    pub x: usize,
    pub y: usize,
    /// World-space center of the tile
    pub center: Position,
}

/// Square grid of tiles centered on the world origin
#[derive(Debug, Clone)]
pub struct Grid {
    size: usize,
    tile_size: f32,
    tiles: Vec<Tile>,
}

impl Grid {
    pub fn new(size: usize, tile_size: f32) -> Self {
        let world = size as f32 * tile_size;
        let mut tiles = Vec::with_capacity(size * size);

        for y in 0..size {
            for x in 0..size {
                let center = Position::new(
                    x as f32 * tile_size - world / 2.0 + tile_size / 2.0,
                    y as f32 * tile_size - world / 2.0 + tile_size / 2.0,
                );
                tiles.push(Tile { x, y, center });
            }
        }

        Self {
            size,
            tile_size,
            tiles,
        }
    }

    /// Tiles per side
    pub fn size(&self) -> usize {
        self.size
    }

    /// Edge length of the whole grid in world units
    pub fn world_size(&self) -> f32 {
        self.size as f32 * self.tile_size
    }

    pub fn tile(&self, x: usize, y: usize) -> Option<&Tile> {
        if x >= self.size || y >= self.size {
            return None;
        }
        self.tiles.get(y * self.size + x)
    }

    /// All tiles in row-major order
    pub fn tiles(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.iter()
    }
}
