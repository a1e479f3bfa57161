//! # Navigation
//!
//! Query contract the simulation uses to keep entities on walkable ground,
//! plus a surface navigator that bakes it from a generated stage.
//!
//! ## Walkable Surface
//!
//! A column is walkable when its top block is terrain strictly above the
//! fluid level. Entities stand on `top_y + 1`. Everything outside the stage
//! and every flooded column counts as a boundary.
//!
//! The navigator is a snapshot: it is baked once per generated stage and is
//! not rebuilt when blocks are mined.

use delve_procedural::{GeneratedWorld, MaterialKind, NavigationBaker};

use crate::math::Vec3;

/// Cells searched around a point when probing for boundaries.
pub const EDGE_SEARCH_CELLS: i32 = 4;

/// How far above its feet a downward cast starts.
pub const CAST_HEAD_ROOM: f32 = 1.0;

/// Highest rise an entity climbs in a single step. Drops of any depth are taken.
pub const MAX_STEP_HEIGHT: f32 = 1.0;

/// A ground contact found by a downward cast.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GroundHit {
    /// Height of the walkable surface.
    pub height: f32,
    /// Material of the block that was hit.
    pub material: MaterialKind,
}

/// Distance to the nearest navigation boundary.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EdgeProbe {
    /// Horizontal distance to the boundary.
    pub distance: f32,
    /// Unit horizontal direction pointing away from the boundary.
    pub normal: Vec3,
}

/// Read-only navigation queries.
pub trait NavQuery {
    /// Nearest walkable point within `radius` (horizontal) of `point`.
    fn sample_navigable(&self, point: Vec3, radius: f32) -> Option<Vec3>;

    /// Casts down from `CAST_HEAD_ROOM` above `origin` for at most `max_distance`.
    fn cast_downward(&self, origin: Vec3, max_distance: f32) -> Option<GroundHit>;

    /// Nearest boundary within [`EDGE_SEARCH_CELLS`], if any.
    fn edge_probe(&self, point: Vec3) -> Option<EdgeProbe>;

    /// Returns true if `point` lies over a walkable column.
    fn is_walkable(&self, point: Vec3) -> bool;

    /// Resolves a horizontal move from `from` to `to` against the terrain.
    ///
    /// Returns `to` with its height snapped onto the destination surface, or
    /// `None` when the destination is not walkable or rises more than
    /// [`MAX_STEP_HEIGHT`] above the feet at `from`.
    fn ground_step(&self, from: Vec3, to: Vec3) -> Option<Vec3> {
        if !self.is_walkable(to) {
            return None;
        }
        let ground = self.cast_downward(Vec3::new(to.x, from.y, to.z), f32::INFINITY)?;
        (ground.height - from.y <= MAX_STEP_HEIGHT).then_some(Vec3::new(to.x, ground.height, to.z))
    }
}

#[derive(Clone, Copy, Debug)]
struct Column {
    top_y: i32,
    material: MaterialKind,
    walkable: bool,
}

/// Navigation over the top surface of a stage.
#[derive(Clone, Debug, Default)]
pub struct SurfaceNavigator {
    width: i32,
    depth: i32,
    columns: Vec<Option<Column>>,
    bakes: u32,
}

impl SurfaceNavigator {
    /// Creates an unbaked navigator. Every query fails until [`NavigationBaker::bake`] runs.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of times this navigator has been baked.
    #[must_use]
    pub const fn bake_count(&self) -> u32 {
        self.bakes
    }

    /// Number of walkable columns.
    #[must_use]
    pub fn walkable_columns(&self) -> usize {
        self.columns
            .iter()
            .filter(|c| c.is_some_and(|c| c.walkable))
            .count()
    }

    fn column(&self, x: i32, z: i32) -> Option<&Column> {
        if x < 0 || z < 0 || x >= self.width || z >= self.depth {
            return None;
        }
        self.columns
            .get((x * self.depth + z) as usize)
            .and_then(Option::as_ref)
    }

    fn walkable_column(&self, x: i32, z: i32) -> Option<&Column> {
        self.column(x, z).filter(|c| c.walkable)
    }
}

impl NavigationBaker for SurfaceNavigator {
    fn bake(&mut self, stage: &GeneratedWorld) {
        let width = stage.config.width as i32;
        let depth = stage.config.depth as i32;
        let fluid_level = stage.config.fluid_level as i32;

        let mut columns = Vec::with_capacity((width * depth) as usize);
        for x in 0..width {
            for z in 0..depth {
                columns.push(stage.world.top_block(x, z).map(|top| Column {
                    top_y: top.coordinate.y,
                    material: top.material,
                    walkable: top.material != stage.fluid && top.coordinate.y > fluid_level,
                }));
            }
        }

        self.width = width;
        self.depth = depth;
        self.columns = columns;
        self.bakes += 1;

        tracing::info!(
            biome = %stage.biome,
            walkable = self.walkable_columns(),
            "navigation baked"
        );
    }
}

/// Closest point of the unit cell square `(cx, cz)` to `(px, pz)`.
fn closest_in_cell(cx: i32, cz: i32, px: f32, pz: f32) -> (f32, f32) {
    let x0 = cx as f32;
    let z0 = cz as f32;
    (px.clamp(x0, x0 + 1.0), pz.clamp(z0, z0 + 1.0))
}

impl NavQuery for SurfaceNavigator {
    fn sample_navigable(&self, point: Vec3, radius: f32) -> Option<Vec3> {
        if !radius.is_finite() || radius < 0.0 {
            return None;
        }
        let reach = radius.ceil() as i32;
        let origin = point.cell();

        let mut best: Option<(f32, Vec3)> = None;
        for x in (origin.x - reach)..=(origin.x + reach) {
            for z in (origin.z - reach)..=(origin.z + reach) {
                let Some(column) = self.walkable_column(x, z) else {
                    continue;
                };
                let (qx, qz) = closest_in_cell(x, z, point.x, point.z);
                let distance = Vec3::new(qx - point.x, 0.0, qz - point.z).length();
                if distance > radius {
                    continue;
                }
                if best.map_or(true, |(d, _)| distance < d) {
                    let stand = (column.top_y + 1) as f32;
                    // Keep the sample a hair inside the cell so it maps back to it
                    let inset_x = qx.clamp(x as f32 + 0.001, x as f32 + 0.999);
                    let inset_z = qz.clamp(z as f32 + 0.001, z as f32 + 0.999);
                    best = Some((distance, Vec3::new(inset_x, stand, inset_z)));
                }
            }
        }
        best.map(|(_, p)| p)
    }

    fn cast_downward(&self, origin: Vec3, max_distance: f32) -> Option<GroundHit> {
        let cell = origin.cell();
        let column = self.column(cell.x, cell.z)?;
        let start = origin.y + CAST_HEAD_ROOM;
        let surface = (column.top_y + 1) as f32;
        if surface > start || start - surface > max_distance {
            return None;
        }
        Some(GroundHit {
            height: surface,
            material: column.material,
        })
    }

    fn edge_probe(&self, point: Vec3) -> Option<EdgeProbe> {
        if self.columns.is_empty() {
            return None;
        }
        let origin = point.cell();
        let mut nearest: Option<(f32, Vec3)> = None;

        for x in (origin.x - EDGE_SEARCH_CELLS)..=(origin.x + EDGE_SEARCH_CELLS) {
            for z in (origin.z - EDGE_SEARCH_CELLS)..=(origin.z + EDGE_SEARCH_CELLS) {
                if self.walkable_column(x, z).is_some() {
                    continue;
                }
                let (qx, qz) = closest_in_cell(x, z, point.x, point.z);
                let away = Vec3::new(point.x - qx, 0.0, point.z - qz);
                let distance = away.length();
                if nearest.map_or(true, |(d, _)| distance < d) {
                    let normal = if distance > f32::EPSILON {
                        away.normalized_or_zero()
                    } else {
                        // Point sits on the boundary: push away from the blocked cell centre
                        Vec3::new(point.x - (x as f32 + 0.5), 0.0, point.z - (z as f32 + 0.5))
                            .normalized_or_zero()
                    };
                    nearest = Some((distance, normal));
                }
            }
        }

        nearest.map(|(distance, normal)| EdgeProbe { distance, normal })
    }

    fn is_walkable(&self, point: Vec3) -> bool {
        let cell = point.cell();
        self.walkable_column(cell.x, cell.z).is_some()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::{Column, EdgeProbe, GroundHit, NavQuery, SurfaceNavigator};
    use crate::math::Vec3;
    use delve_procedural::MaterialKind;

    /// 10 x 10 grass navigator whose top block is `low` for `x < 5` and
    /// `high` from `x = 5` on.
    pub(crate) fn ridge(low: i32, high: i32) -> SurfaceNavigator {
        let mut columns = Vec::with_capacity(100);
        for x in 0..10 {
            for _ in 0..10 {
                columns.push(Some(Column {
                    top_y: if x < 5 { low } else { high },
                    material: MaterialKind::Grass,
                    walkable: true,
                }));
            }
        }
        SurfaceNavigator {
            width: 10,
            depth: 10,
            columns,
            bakes: 1,
        }
    }

    /// Flat walkable rectangle `[0, width) x [0, depth)` standing at y = 1.
    pub(crate) struct FlatArena {
        pub width: f32,
        pub depth: f32,
    }

    impl FlatArena {
        fn inside(&self, p: Vec3) -> bool {
            p.x >= 0.0 && p.z >= 0.0 && p.x < self.width && p.z < self.depth
        }
    }

    impl NavQuery for FlatArena {
        fn sample_navigable(&self, point: Vec3, radius: f32) -> Option<Vec3> {
            let clamped = Vec3::new(
                point.x.clamp(0.0, self.width - 0.001),
                1.0,
                point.z.clamp(0.0, self.depth - 0.001),
            );
            (clamped.flat().distance(point.flat()) <= radius).then_some(clamped)
        }

        fn cast_downward(&self, origin: Vec3, _max_distance: f32) -> Option<GroundHit> {
            self.inside(origin).then_some(GroundHit {
                height: 1.0,
                material: MaterialKind::Grass,
            })
        }

        fn edge_probe(&self, p: Vec3) -> Option<EdgeProbe> {
            let candidates = [
                (p.x, Vec3::new(1.0, 0.0, 0.0)),
                (self.width - p.x, Vec3::new(-1.0, 0.0, 0.0)),
                (p.z, Vec3::new(0.0, 0.0, 1.0)),
                (self.depth - p.z, Vec3::new(0.0, 0.0, -1.0)),
            ];
            candidates
                .into_iter()
                .min_by(|a, b| a.0.total_cmp(&b.0))
                .map(|(distance, normal)| EdgeProbe { distance, normal })
        }

        fn is_walkable(&self, p: Vec3) -> bool {
            self.inside(p)
        }
    }
}
