use bevy::prelude::{IVec3, Resource, Vec3};

use crate::aabb::Aabb;
use crate::block::{BLOCK_AIR, BLOCK_BEDROCK, BlockId, BlockRegistry};
use crate::color::PackedCol;

/// Read access to the loaded map, as seen by entity physics.
pub trait BlockWorld {
    fn width(&self) -> i32;
    fn height(&self) -> i32;
    fn length(&self) -> i32;
    fn blocks(&self) -> &BlockRegistry;

    /// Raw block lookup. Callers must stay inside the map.
    fn block_at(&self, x: i32, y: i32, z: i32) -> BlockId;

    fn max(&self) -> IVec3 {
        IVec3::new(self.width() - 1, self.height() - 1, self.length() - 1)
    }

    fn contains(&self, pos: IVec3) -> bool {
        pos.x >= 0
            && pos.y >= 0
            && pos.z >= 0
            && pos.x < self.width()
            && pos.y < self.height()
            && pos.z < self.length()
    }

    /// Lookup used by physics: map sides and floor are bedrock, the sky is
    /// open air.
    fn physics_block_at(&self, x: i32, y: i32, z: i32) -> BlockId {
        if x < 0 || x >= self.width() || z < 0 || z >= self.length() || y < 0 {
            return BLOCK_BEDROCK;
        }
        if y >= self.height() {
            return BLOCK_AIR;
        }
        self.block_at(x, y, z)
    }

    fn sun_color(&self) -> PackedCol {
        PackedCol::SUN
    }

    fn light_color(&self, _x: i32, _y: i32, _z: i32) -> PackedCol {
        self.sun_color()
    }
}

/// Dense block storage indexed `(y * length + z) * width + x`.
#[derive(Resource, Clone)]
pub struct WorldMap {
    width: i32,
    height: i32,
    length: i32,
    blocks: Vec<BlockId>,
    registry: BlockRegistry,
    sun: PackedCol,
    shadow: PackedCol,
}

impl WorldMap {
    pub fn new(width: i32, height: i32, length: i32) -> Self {
        let (width, height, length) = (width.max(1), height.max(1), length.max(1));
        Self {
            width,
            height,
            length,
            blocks: vec![BLOCK_AIR; (width * height * length) as usize],
            registry: BlockRegistry::default(),
            sun: PackedCol::SUN,
            shadow: PackedCol::SHADOW,
        }
    }

    /// Map with every layer below `ground_height` filled with `block`.
    pub fn flat(width: i32, height: i32, length: i32, ground_height: i32, block: BlockId) -> Self {
        let mut map = Self::new(width, height, length);
        map.fill(
            IVec3::ZERO,
            IVec3::new(width - 1, ground_height - 1, length - 1),
            block,
        );
        map
    }

    fn index(&self, x: i32, y: i32, z: i32) -> Option<usize> {
        self.contains(IVec3::new(x, y, z))
            .then(|| ((y * self.length + z) * self.width + x) as usize)
    }

    pub fn set_block(&mut self, x: i32, y: i32, z: i32, block: BlockId) {
        if let Some(idx) = self.index(x, y, z) {
            self.blocks[idx] = block;
        }
    }

    /// Fills the inclusive cell range `min..=max`.
    pub fn fill(&mut self, min: IVec3, max: IVec3, block: BlockId) {
        for y in min.y..=max.y {
            for z in min.z..=max.z {
                for x in min.x..=max.x {
                    self.set_block(x, y, z, block);
                }
            }
        }
    }

    pub fn set_env_colors(&mut self, sun: PackedCol, shadow: PackedCol) {
        self.sun = sun;
        self.shadow = shadow;
    }

    pub fn registry_mut(&mut self) -> &mut BlockRegistry {
        &mut self.registry
    }

    /// Y of the highest light-blocking block in a column, or -1.
    fn light_height(&self, x: i32, z: i32) -> i32 {
        (0..self.height)
            .rev()
            .find(|&y| self.registry.is_solid(self.block_at(x, y, z)))
            .unwrap_or(-1)
    }
}

impl BlockWorld for WorldMap {
    fn width(&self) -> i32 {
        self.width
    }

    fn height(&self) -> i32 {
        self.height
    }

    fn length(&self) -> i32 {
        self.length
    }

    fn blocks(&self) -> &BlockRegistry {
        &self.registry
    }

    fn block_at(&self, x: i32, y: i32, z: i32) -> BlockId {
        self.index(x, y, z).map_or(BLOCK_AIR, |idx| self.blocks[idx])
    }

    fn sun_color(&self) -> PackedCol {
        self.sun
    }

    fn light_color(&self, x: i32, y: i32, z: i32) -> PackedCol {
        if y > self.light_height(x, z) {
            self.sun
        } else {
            self.shadow
        }
    }
}

/// Returns whether any block cell whose own bounds intersect `bounds`
/// satisfies `pred`. The query is clipped to the map; cells are visited Y,
/// then Z, then X.
pub fn touches_any<W, F>(world: &W, bounds: &Aabb, mut pred: F) -> bool
where
    W: BlockWorld + ?Sized,
    F: FnMut(BlockId) -> bool,
{
    let max = world.max();
    let min_x = (bounds.min.x.floor() as i32).max(0);
    let min_y = (bounds.min.y.floor() as i32).max(0);
    let min_z = (bounds.min.z.floor() as i32).max(0);
    let max_x = (bounds.max.x.floor() as i32).min(max.x);
    let max_y = (bounds.max.y.floor() as i32).min(max.y);
    let max_z = (bounds.max.z.floor() as i32).min(max.z);

    let registry = world.blocks();
    for y in min_y..=max_y {
        for z in min_z..=max_z {
            for x in min_x..=max_x {
                let block = world.block_at(x, y, z);
                let def = registry.get(block);
                let cell = Vec3::new(x as f32, y as f32, z as f32);
                let block_bb = Aabb::new(cell + def.min_bb, cell + def.max_bb);
                if !block_bb.intersects(bounds) {
                    continue;
                }
                if pred(block) {
                    return true;
                }
            }
        }
    }
    false
}
