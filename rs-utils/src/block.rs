use bevy::prelude::Vec3;

pub type BlockId = u16;

pub const BLOCK_AIR: BlockId = 0;
pub const BLOCK_STONE: BlockId = 1;
pub const BLOCK_GRASS: BlockId = 2;
pub const BLOCK_DIRT: BlockId = 3;
pub const BLOCK_BEDROCK: BlockId = 7;
pub const BLOCK_WATER: BlockId = 8;
pub const BLOCK_STILL_WATER: BlockId = 9;
pub const BLOCK_LAVA: BlockId = 10;
pub const BLOCK_STILL_LAVA: BlockId = 11;
pub const BLOCK_SLAB: BlockId = 44;
pub const BLOCK_ROPE: BlockId = 51;

/// How a block interacts with moving entities.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Collide {
    Gas,
    Liquid,
    Solid,
    Ice,
    LiquidWater,
    LiquidLava,
    ClimbRope,
}

#[derive(Clone, Debug)]
pub struct BlockDef {
    pub name: &'static str,
    /// Coarse class used for solidity checks.
    pub collide: Collide,
    /// Fine class used for liquid/rope checks.
    pub extended_collide: Collide,
    pub min_bb: Vec3,
    pub max_bb: Vec3,
    pub speed_multiplier: f32,
}

impl BlockDef {
    const fn full(name: &'static str, collide: Collide) -> Self {
        Self {
            name,
            collide,
            extended_collide: collide,
            min_bb: Vec3::ZERO,
            max_bb: Vec3::ONE,
            speed_multiplier: 1.0,
        }
    }

    const fn sprite(name: &'static str) -> Self {
        Self {
            name,
            collide: Collide::Gas,
            extended_collide: Collide::Gas,
            min_bb: Vec3::new(2.5 / 16.0, 0.0, 2.5 / 16.0),
            max_bb: Vec3::new(13.5 / 16.0, 1.0, 13.5 / 16.0),
            speed_multiplier: 1.0,
        }
    }

    const fn liquid(name: &'static str, extended: Collide) -> Self {
        Self {
            name,
            collide: Collide::Liquid,
            extended_collide: extended,
            min_bb: Vec3::ZERO,
            max_bb: Vec3::ONE,
            speed_multiplier: 1.0,
        }
    }

    const fn slab(name: &'static str) -> Self {
        Self {
            name,
            collide: Collide::Solid,
            extended_collide: Collide::Solid,
            min_bb: Vec3::ZERO,
            max_bb: Vec3::new(1.0, 0.5, 1.0),
            speed_multiplier: 1.0,
        }
    }

    pub fn is_solid(&self) -> bool {
        self.collide == Collide::Solid || self.collide == Collide::Ice
    }
}

/// Per-block collision table. Defaults to the classic + CPE block set.
#[derive(Clone, Debug)]
pub struct BlockRegistry {
    defs: Vec<BlockDef>,
}

impl Default for BlockRegistry {
    fn default() -> Self {
        use Collide::*;

        let rope = BlockDef {
            name: "Rope",
            collide: ClimbRope,
            extended_collide: ClimbRope,
            min_bb: Vec3::new(6.0 / 16.0, 0.0, 6.0 / 16.0),
            max_bb: Vec3::new(10.0 / 16.0, 1.0, 10.0 / 16.0),
            speed_multiplier: 1.0,
        };
        let snow = BlockDef {
            name: "Snow",
            collide: Gas,
            extended_collide: Gas,
            min_bb: Vec3::ZERO,
            max_bb: Vec3::new(1.0, 2.0 / 16.0, 1.0),
            speed_multiplier: 1.0,
        };

        let defs = vec![
            BlockDef::full("Air", Gas),
            BlockDef::full("Stone", Solid),
            BlockDef::full("Grass", Solid),
            BlockDef::full("Dirt", Solid),
            BlockDef::full("Cobblestone", Solid),
            BlockDef::full("Wood", Solid),
            BlockDef::sprite("Sapling"),
            BlockDef::full("Bedrock", Solid),
            BlockDef::liquid("Water", LiquidWater),
            BlockDef::liquid("Still water", LiquidWater),
            BlockDef::liquid("Lava", LiquidLava),
            BlockDef::liquid("Still lava", LiquidLava),
            BlockDef::full("Sand", Solid),
            BlockDef::full("Gravel", Solid),
            BlockDef::full("Gold ore", Solid),
            BlockDef::full("Iron ore", Solid),
            BlockDef::full("Coal ore", Solid),
            BlockDef::full("Log", Solid),
            BlockDef::full("Leaves", Solid),
            BlockDef::full("Sponge", Solid),
            BlockDef::full("Glass", Solid),
            BlockDef::full("Red", Solid),
            BlockDef::full("Orange", Solid),
            BlockDef::full("Yellow", Solid),
            BlockDef::full("Lime", Solid),
            BlockDef::full("Green", Solid),
            BlockDef::full("Teal", Solid),
            BlockDef::full("Aqua", Solid),
            BlockDef::full("Cyan", Solid),
            BlockDef::full("Blue", Solid),
            BlockDef::full("Indigo", Solid),
            BlockDef::full("Violet", Solid),
            BlockDef::full("Magenta", Solid),
            BlockDef::full("Pink", Solid),
            BlockDef::full("Black", Solid),
            BlockDef::full("Gray", Solid),
            BlockDef::full("White", Solid),
            BlockDef::sprite("Dandelion"),
            BlockDef::sprite("Rose"),
            BlockDef::sprite("Brown mushroom"),
            BlockDef::sprite("Red mushroom"),
            BlockDef::full("Gold", Solid),
            BlockDef::full("Iron", Solid),
            BlockDef::full("Double slab", Solid),
            BlockDef::slab("Slab"),
            BlockDef::full("Brick", Solid),
            BlockDef::full("TNT", Solid),
            BlockDef::full("Bookshelf", Solid),
            BlockDef::full("Mossy rocks", Solid),
            BlockDef::full("Obsidian", Solid),
            BlockDef::slab("Cobblestone slab"),
            rope,
            BlockDef::full("Sandstone", Solid),
            snow,
            BlockDef::sprite("Fire"),
            BlockDef::full("Light pink", Solid),
            BlockDef::full("Forest green", Solid),
            BlockDef::full("Brown", Solid),
            BlockDef::full("Deep blue", Solid),
            BlockDef::full("Turquoise", Solid),
            BlockDef::full("Ice", Ice),
            BlockDef::full("Ceramic tile", Solid),
            BlockDef::full("Magma", Solid),
            BlockDef::full("Pillar", Solid),
            BlockDef::full("Crate", Solid),
            BlockDef::full("Stone brick", Solid),
        ];
        Self { defs }
    }
}

impl BlockRegistry {
    pub fn count(&self) -> usize {
        self.defs.len()
    }

    /// Unknown ids resolve to air.
    pub fn get(&self, id: BlockId) -> &BlockDef {
        self.defs.get(id as usize).unwrap_or(&self.defs[BLOCK_AIR as usize])
    }

    pub fn set(&mut self, id: BlockId, def: BlockDef) {
        let idx = id as usize;
        if idx >= self.defs.len() {
            self.defs.resize(idx + 1, BlockDef::full("Air", Collide::Gas));
        }
        self.defs[idx] = def;
    }

    pub fn collide(&self, id: BlockId) -> Collide {
        self.get(id).collide
    }

    pub fn extended_collide(&self, id: BlockId) -> Collide {
        self.get(id).extended_collide
    }

    pub fn is_solid(&self, id: BlockId) -> bool {
        self.get(id).is_solid()
    }

    pub fn is_liquid(&self, id: BlockId) -> bool {
        self.get(id).collide == Collide::Liquid
    }

    /// Resolves a block token: either a numeric id or a (case-insensitive)
    /// block name.
    pub fn parse(&self, token: &str) -> Option<BlockId> {
        let token = token.trim();
        if token.is_empty() {
            return None;
        }
        if let Ok(id) = token.parse::<BlockId>() {
            return ((id as usize) < self.defs.len()).then_some(id);
        }
        self.defs
            .iter()
            .position(|def| {
                def.name.eq_ignore_ascii_case(token)
                    || def.name.replace(' ', "_").eq_ignore_ascii_case(token)
            })
            .map(|idx| idx as BlockId)
    }
}
