use serde::{Deserialize, Serialize};

/// Numeric identifier stored in chunk arrays, save files and inventory slots.
pub type BlockId = u8;

/// The fixed palette shared by world storage and the inventory.
///
/// Discriminants are part of the save format and must never be renumbered.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum BlockType {
    #[default]
    Air = 0,
    Grass = 1,
    Dirt = 2,
    Stone = 3,
    Wood = 4,
    Leaves = 5,
    Bedrock = 6,
    Planks = 7,
    Stick = 8,
    CraftingTable = 9,
    CoalOre = 10,
    IronOre = 11,
    WoodenSword = 20,
    StoneSword = 21,
    WoodenPickaxe = 22,
    StonePickaxe = 23,
    WoodenAxe = 24,
    StoneAxe = 25,
    WoodenShovel = 26,
    StoneShovel = 27,
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum ToolKind {
    Pickaxe,
    Axe,
    Shovel,
    Sword,
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum ToolTier {
    Wood,
    Stone,
}

impl ToolTier {
    /// Divisor applied to the base break time when the tool suits the block.
    pub fn speed(&self) -> f32 {
        match self {
            ToolTier::Wood => 2.0,
            ToolTier::Stone => 4.0,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Tool {
    pub kind: ToolKind,
    pub tier: ToolTier,
}

impl BlockType {
    pub const ALL: [BlockType; 20] = [
        BlockType::Air,
        BlockType::Grass,
        BlockType::Dirt,
        BlockType::Stone,
        BlockType::Wood,
        BlockType::Leaves,
        BlockType::Bedrock,
        BlockType::Planks,
        BlockType::Stick,
        BlockType::CraftingTable,
        BlockType::CoalOre,
        BlockType::IronOre,
        BlockType::WoodenSword,
        BlockType::StoneSword,
        BlockType::WoodenPickaxe,
        BlockType::StonePickaxe,
        BlockType::WoodenAxe,
        BlockType::StoneAxe,
        BlockType::WoodenShovel,
        BlockType::StoneShovel,
    ];

    #[inline]
    pub fn id(self) -> BlockId {
        self as BlockId
    }

    pub fn from_id(id: BlockId) -> Option<BlockType> {
        let block = match id {
            0 => BlockType::Air,
            1 => BlockType::Grass,
            2 => BlockType::Dirt,
            3 => BlockType::Stone,
            4 => BlockType::Wood,
            5 => BlockType::Leaves,
            6 => BlockType::Bedrock,
            7 => BlockType::Planks,
            8 => BlockType::Stick,
            9 => BlockType::CraftingTable,
            10 => BlockType::CoalOre,
            11 => BlockType::IronOre,
            20 => BlockType::WoodenSword,
            21 => BlockType::StoneSword,
            22 => BlockType::WoodenPickaxe,
            23 => BlockType::StonePickaxe,
            24 => BlockType::WoodenAxe,
            25 => BlockType::StoneAxe,
            26 => BlockType::WoodenShovel,
            27 => BlockType::StoneShovel,
            _ => return None,
        };
        Some(block)
    }

    pub fn name(&self) -> &'static str {
        match self {
            BlockType::Air => "air",
            BlockType::Grass => "grass",
            BlockType::Dirt => "dirt",
            BlockType::Stone => "stone",
            BlockType::Wood => "wood",
            BlockType::Leaves => "leaves",
            BlockType::Bedrock => "bedrock",
            BlockType::Planks => "planks",
            BlockType::Stick => "stick",
            BlockType::CraftingTable => "crafting_table",
            BlockType::CoalOre => "coal_ore",
            BlockType::IronOre => "iron_ore",
            BlockType::WoodenSword => "wooden_sword",
            BlockType::StoneSword => "stone_sword",
            BlockType::WoodenPickaxe => "wooden_pickaxe",
            BlockType::StonePickaxe => "stone_pickaxe",
            BlockType::WoodenAxe => "wooden_axe",
            BlockType::StoneAxe => "stone_axe",
            BlockType::WoodenShovel => "wooden_shovel",
            BlockType::StoneShovel => "stone_shovel",
        }
    }

    pub fn is_air(&self) -> bool {
        *self == BlockType::Air
    }

    /// Items exist only in inventories and can never occupy a world cell.
    pub fn is_placeable(&self) -> bool {
        !matches!(self, BlockType::Stick) && self.tool().is_none()
    }

    pub fn is_solid(&self) -> bool {
        self.is_placeable() && !matches!(self, BlockType::Air | BlockType::Leaves)
    }

    pub fn tool(&self) -> Option<Tool> {
        let (kind, tier) = match self {
            BlockType::WoodenSword => (ToolKind::Sword, ToolTier::Wood),
            BlockType::StoneSword => (ToolKind::Sword, ToolTier::Stone),
            BlockType::WoodenPickaxe => (ToolKind::Pickaxe, ToolTier::Wood),
            BlockType::StonePickaxe => (ToolKind::Pickaxe, ToolTier::Stone),
            BlockType::WoodenAxe => (ToolKind::Axe, ToolTier::Wood),
            BlockType::StoneAxe => (ToolKind::Axe, ToolTier::Stone),
            BlockType::WoodenShovel => (ToolKind::Shovel, ToolTier::Wood),
            BlockType::StoneShovel => (ToolKind::Shovel, ToolTier::Stone),
            _ => return None,
        };
        Some(Tool { kind, tier })
    }

    /// Base hardness; seconds to break bare-handed is `hardness * 1.5`.
    pub fn hardness(&self) -> f32 {
        match self {
            BlockType::Grass => 0.6,
            BlockType::Dirt => 0.5,
            BlockType::Stone => 1.5,
            BlockType::Wood => 2.0,
            BlockType::Leaves => 0.2,
            BlockType::Bedrock => f32::INFINITY,
            BlockType::Planks => 2.0,
            BlockType::CraftingTable => 2.5,
            BlockType::CoalOre => 3.0,
            BlockType::IronOre => 3.0,
            _ => 0.0,
        }
    }

    pub fn preferred_tool(&self) -> Option<ToolKind> {
        match self {
            BlockType::Grass | BlockType::Dirt => Some(ToolKind::Shovel),
            BlockType::Stone | BlockType::CoalOre | BlockType::IronOre => Some(ToolKind::Pickaxe),
            BlockType::Wood | BlockType::Planks | BlockType::CraftingTable => Some(ToolKind::Axe),
            _ => None,
        }
    }

    /// Melee damage when this item is held; anything that is not a tool hits for 1.
    pub fn attack_damage(&self) -> f32 {
        match self {
            BlockType::WoodenSword => 4.0,
            BlockType::StoneSword => 5.0,
            BlockType::WoodenAxe => 3.0,
            BlockType::StoneAxe => 4.0,
            BlockType::WoodenPickaxe => 2.0,
            BlockType::StonePickaxe => 3.0,
            BlockType::WoodenShovel => 1.5,
            BlockType::StoneShovel => 2.5,
            _ => 1.0,
        }
    }

    /// Seconds needed to break `self` while holding `held`.
    pub fn break_time(&self, held: BlockType) -> f32 {
        if !self.is_placeable() || self.is_air() {
            return 0.0;
        }
        let base = self.hardness() * 1.5;
        if base.is_infinite() {
            return base;
        }
        match (self.preferred_tool(), held.tool()) {
            (Some(wanted), Some(tool)) if wanted == tool.kind => base / tool.tier.speed(),
            _ => base,
        }
    }
}

impl From<BlockType> for BlockId {
    fn from(block: BlockType) -> Self {
        block.id()
    }
}
