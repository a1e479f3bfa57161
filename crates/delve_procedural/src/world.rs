//! # Voxel World
//!
//! Dense storage for one generated stage.
//!
//! ## Layout
//!
//! Cells are stored column-major: `((x * depth) + z) * height + (y - min_y)`.
//! A block at `(x, y, z)` occupies `[x, x+1) × [y, y+1) × [z, z+1)`.
//!
//! ## Occupancy
//!
//! The [`OccupancyMap`] remembers every coordinate that has **ever** held a
//! block. Mining removes the block but never frees the coordinate, so no
//! coordinate can receive a second block.

use serde::{Deserialize, Serialize};

use crate::biome::{BlockTemplate, MaterialKind};
use crate::error::{ProceduralError, ProceduralResult};

/// Integer cell coordinate.
///
/// Ordered by x, then y, then z.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Coordinate {
    /// East-west.
    pub x: i32,
    /// Vertical.
    pub y: i32,
    /// North-south.
    pub z: i32,
}

impl Coordinate {
    /// Creates a coordinate.
    #[inline]
    #[must_use]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// The cell directly above.
    #[inline]
    #[must_use]
    pub const fn above(self) -> Self {
        Self::new(self.x, self.y + 1, self.z)
    }
}

/// Axis-aligned extent of a generated stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldBounds {
    /// Number of columns along x.
    pub width: u32,
    /// Number of columns along z.
    pub depth: u32,
    /// Lowest y (inclusive).
    pub min_y: i32,
    /// Highest y (inclusive).
    pub max_y: i32,
}

impl WorldBounds {
    /// Number of cells per column.
    #[inline]
    #[must_use]
    pub const fn column_height(&self) -> usize {
        (self.max_y - self.min_y + 1) as usize
    }

    /// Total number of cells.
    #[inline]
    #[must_use]
    pub const fn volume(&self) -> usize {
        self.width as usize * self.depth as usize * self.column_height()
    }

    /// Returns true if the coordinate lies inside the stage.
    #[inline]
    #[must_use]
    pub const fn contains(&self, c: Coordinate) -> bool {
        c.x >= 0
            && c.z >= 0
            && (c.x as u32) < self.width
            && (c.z as u32) < self.depth
            && c.y >= self.min_y
            && c.y <= self.max_y
    }

    /// Dense index of a coordinate, if inside.
    #[inline]
    #[must_use]
    pub const fn index(&self, c: Coordinate) -> Option<usize> {
        if !self.contains(c) {
            return None;
        }
        let column = c.x as usize * self.depth as usize + c.z as usize;
        Some(column * self.column_height() + (c.y - self.min_y) as usize)
    }
}

/// What a depleted block hands to the miner.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlockDrop {
    /// Material granted.
    pub material: MaterialKind,
    /// Quantity granted.
    pub count: u32,
}

/// A live block.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Block {
    /// Cell this block occupies.
    pub coordinate: Coordinate,
    /// Material kind.
    pub material: MaterialKind,
    /// Remaining hit points (always > 0 while the block exists).
    pub hit_points: u32,
    /// Whether mining damages this block.
    pub mineable: bool,
    /// Quantity granted on depletion.
    pub drop_count: u32,
}

impl Block {
    /// Instantiates a template at a coordinate.
    #[must_use]
    pub fn from_template(coordinate: Coordinate, material: MaterialKind, template: &BlockTemplate) -> Self {
        Self {
            coordinate,
            material,
            hit_points: template.hit_points.max(1),
            mineable: template.mineable,
            drop_count: template.drop_count,
        }
    }
}

/// Result of one mining hit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MineOutcome {
    /// The block survived.
    Damaged {
        /// Hit points left.
        remaining: u32,
    },
    /// The block was removed.
    Destroyed {
        /// What it dropped, if anything.
        drop: Option<BlockDrop>,
    },
    /// The block ignores mining (fluids).
    Unmineable,
    /// Nothing lives at this coordinate.
    Empty,
}

/// Set of coordinates that have ever held a block.
#[derive(Clone, Debug)]
pub struct OccupancyMap {
    bounds: WorldBounds,
    cells: Vec<bool>,
    count: usize,
}

impl OccupancyMap {
    /// Creates an empty map covering `bounds`.
    #[must_use]
    pub fn new(bounds: WorldBounds) -> Self {
        Self {
            bounds,
            cells: vec![false; bounds.volume()],
            count: 0,
        }
    }

    /// Claims a coordinate.
    ///
    /// # Errors
    ///
    /// Fails if the coordinate is outside the bounds or was ever claimed.
    pub fn insert(&mut self, c: Coordinate) -> ProceduralResult<()> {
        let index = self.bounds.index(c).ok_or(ProceduralError::OutOfBounds(c))?;
        if self.cells[index] {
            return Err(ProceduralError::DoubleOccupancy(c));
        }
        self.cells[index] = true;
        self.count += 1;
        Ok(())
    }

    /// Returns true if the coordinate has ever been claimed.
    #[must_use]
    pub fn contains(&self, c: Coordinate) -> bool {
        self.bounds.index(c).is_some_and(|i| self.cells[i])
    }

    /// Number of claimed coordinates.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.count
    }

    /// Returns true if nothing has been claimed.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.count == 0
    }
}

/// Ordered, de-duplicated spawn coordinates.
///
/// Kept as a sorted `Vec` so a random claim indexes in constant time.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SpawnPointSet {
    points: Vec<Coordinate>,
}

impl SpawnPointSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a point. Returns false if it was already present.
    pub fn insert(&mut self, c: Coordinate) -> bool {
        // Generation inserts in coordinate order, so this is usually a push
        if self.points.last().map_or(true, |last| *last < c) {
            self.points.push(c);
            return true;
        }
        match self.points.binary_search(&c) {
            Ok(_) => false,
            Err(at) => {
                self.points.insert(at, c);
                true
            }
        }
    }

    /// Removes a point. Returns false if it was absent.
    pub fn remove(&mut self, c: Coordinate) -> bool {
        match self.points.binary_search(&c) {
            Ok(at) => {
                self.points.remove(at);
                true
            }
            Err(_) => false,
        }
    }

    /// The `index`-th point in coordinate order.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<Coordinate> {
        self.points.get(index).copied()
    }

    /// Returns true if the point is in the set.
    #[must_use]
    pub fn contains(&self, c: Coordinate) -> bool {
        self.points.binary_search(&c).is_ok()
    }

    /// Number of points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Returns true if no points remain.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Iterates in coordinate order.
    pub fn iter(&self) -> impl Iterator<Item = Coordinate> + '_ {
        self.points.iter().copied()
    }
}

/// A generated, mineable stage.
#[derive(Clone, Debug)]
pub struct VoxelWorld {
    bounds: WorldBounds,
    cells: Vec<Option<Block>>,
    occupancy: OccupancyMap,
}

impl VoxelWorld {
    /// Creates an empty world.
    #[must_use]
    pub fn new(bounds: WorldBounds) -> Self {
        Self {
            bounds,
            cells: vec![None; bounds.volume()],
            occupancy: OccupancyMap::new(bounds),
        }
    }

    /// Returns the stage extent.
    #[inline]
    #[must_use]
    pub const fn bounds(&self) -> WorldBounds {
        self.bounds
    }

    /// Returns the occupancy map.
    #[inline]
    #[must_use]
    pub const fn occupancy(&self) -> &OccupancyMap {
        &self.occupancy
    }

    /// Places a fresh block.
    ///
    /// # Errors
    ///
    /// Fails on out-of-bounds or previously occupied coordinates.
    pub fn place(
        &mut self,
        c: Coordinate,
        material: MaterialKind,
        template: &BlockTemplate,
    ) -> ProceduralResult<()> {
        self.occupancy.insert(c)?;
        if let Some(index) = self.bounds.index(c) {
            self.cells[index] = Some(Block::from_template(c, material, template));
        }
        Ok(())
    }

    /// Looks up a live block.
    #[inline]
    #[must_use]
    pub fn block(&self, c: Coordinate) -> Option<&Block> {
        self.bounds.index(c).and_then(|i| self.cells[i].as_ref())
    }

    /// Returns true if a live block sits at `c`.
    #[inline]
    #[must_use]
    pub fn is_occupied(&self, c: Coordinate) -> bool {
        self.block(c).is_some()
    }

    /// Highest live block in a column.
    #[must_use]
    pub fn top_block(&self, x: i32, z: i32) -> Option<&Block> {
        (self.bounds.min_y..=self.bounds.max_y)
            .rev()
            .find_map(|y| self.block(Coordinate::new(x, y, z)))
    }

    /// Highest live block in a column at or below `y`.
    #[must_use]
    pub fn highest_block_at_or_below(&self, x: i32, y: i32, z: i32) -> Option<&Block> {
        let top = y.min(self.bounds.max_y);
        (self.bounds.min_y..=top)
            .rev()
            .find_map(|y| self.block(Coordinate::new(x, y, z)))
    }

    /// Applies one mining hit.
    ///
    /// # Errors
    ///
    /// Returns [`ProceduralError::OutOfBounds`] for coordinates outside the stage.
    pub fn mine(&mut self, c: Coordinate, damage: u32) -> ProceduralResult<MineOutcome> {
        let index = self.bounds.index(c).ok_or(ProceduralError::OutOfBounds(c))?;
        let Some(block) = self.cells[index].as_mut() else {
            return Ok(MineOutcome::Empty);
        };
        if !block.mineable {
            return Ok(MineOutcome::Unmineable);
        }

        block.hit_points = block.hit_points.saturating_sub(damage);
        if block.hit_points > 0 {
            return Ok(MineOutcome::Damaged {
                remaining: block.hit_points,
            });
        }

        let drop = (block.drop_count > 0).then_some(BlockDrop {
            material: block.material,
            count: block.drop_count,
        });
        self.cells[index] = None;
        tracing::debug!(?c, ?drop, "block destroyed");
        Ok(MineOutcome::Destroyed { drop })
    }

    /// Number of live blocks.
    #[must_use]
    pub fn block_count(&self) -> usize {
        self.cells.iter().filter(|cell| cell.is_some()).count()
    }

    /// Iterates live blocks in storage order.
    pub fn blocks(&self) -> impl Iterator<Item = &Block> + '_ {
        self.cells.iter().filter_map(Option::as_ref)
    }

    /// One byte per cell in storage order: material id, or 0 when empty.
    ///
    /// Two worlds with equal layouts have identical material placement.
    #[must_use]
    pub fn layout_bytes(&self) -> Vec<u8> {
        self.cells
            .iter()
            .map(|cell| cell.map_or(0, |b| b.material.id()))
            .collect()
    }
}
