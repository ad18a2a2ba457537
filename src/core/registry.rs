//! Process-wide block table.
//!
//! Built once on first use and never mutated afterwards. The world holds a
//! `&'static BlockRegistry`.

use once_cell::sync::Lazy;
use rustc_hash::FxHashMap;

use crate::core::block::{BlockId, BlockType, ToolKind};

const ID_SPACE: usize = 28;

static REGISTRY: Lazy<BlockRegistry> = Lazy::new(BlockRegistry::build);

#[derive(Clone, Copy, Debug)]
pub struct BlockInfo {
    pub block: BlockType,
    pub name: &'static str,
    pub solid: bool,
    pub placeable: bool,
    pub hardness: f32,
    pub preferred_tool: Option<ToolKind>,
}

pub struct BlockRegistry {
    by_id: [Option<BlockInfo>; ID_SPACE],
    by_name: FxHashMap<&'static str, BlockType>,
    break_times: Box<[[f32; ID_SPACE]; ID_SPACE]>,
}

impl BlockRegistry {
    pub fn global() -> &'static BlockRegistry {
        &REGISTRY
    }

    fn build() -> Self {
        let mut by_id = [None; ID_SPACE];
        let mut by_name = FxHashMap::default();
        let mut break_times = Box::new([[0.0f32; ID_SPACE]; ID_SPACE]);

        for block in BlockType::ALL {
            by_id[block.id() as usize] = Some(BlockInfo {
                block,
                name: block.name(),
                solid: block.is_solid(),
                placeable: block.is_placeable(),
                hardness: block.hardness(),
                preferred_tool: block.preferred_tool(),
            });
            by_name.insert(block.name(), block);
        }

        for target in BlockType::ALL {
            for held in BlockType::ALL {
                break_times[target.id() as usize][held.id() as usize] = target.break_time(held);
            }
        }

        BlockRegistry {
            by_id,
            by_name,
            break_times,
        }
    }

    pub fn info(&self, id: BlockId) -> Option<&BlockInfo> {
        self.by_id.get(id as usize).and_then(|slot| slot.as_ref())
    }

    /// Resolves a block by name (`"stone"`, `"Crafting_Table"`) or by numeric id (`"3"`).
    pub fn lookup(&self, key: &str) -> Option<BlockType> {
        let key = key.trim();
        if let Ok(id) = key.parse::<BlockId>() {
            return BlockType::from_id(id);
        }
        self.by_name
            .get(key.to_ascii_lowercase().replace(' ', "_").as_str())
            .copied()
    }

    /// Seconds to break `block_id` holding `tool_id`. Unknown ids break instantly.
    pub fn get_break_time(&self, block_id: BlockId, tool_id: BlockId) -> f32 {
        let tool = if (tool_id as usize) < ID_SPACE && self.by_id[tool_id as usize].is_some() {
            tool_id as usize
        } else {
            0
        };
        self.break_times
            .get(block_id as usize)
            .map(|row| row[tool])
            .unwrap_or(0.0)
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_by_name_and_id() {
        let registry = BlockRegistry::global();
        assert_eq!(registry.lookup("stone"), Some(BlockType::Stone));
        assert_eq!(registry.lookup("Crafting Table"), Some(BlockType::CraftingTable));
        assert_eq!(registry.lookup("23"), Some(BlockType::StonePickaxe));
        assert_eq!(registry.lookup("12"), None);
        assert_eq!(registry.lookup("diamond"), None);
        assert_eq!(registry.len(), BlockType::ALL.len());
    }

    #[test]
    fn break_time_table_matches_block_rules() {
        let registry = BlockRegistry::global();
        let wood = BlockType::Wood.id();
        let axe = BlockType::StoneAxe.id();
        assert_eq!(
            registry.get_break_time(wood, axe),
            BlockType::Wood.break_time(BlockType::StoneAxe)
        );
        // Unknown tool ids fall back to the bare hand.
        assert_eq!(
            registry.get_break_time(wood, 99),
            BlockType::Wood.break_time(BlockType::Air)
        );
        assert_eq!(registry.get_break_time(200, axe), 0.0);
    }

    #[test]
    fn info_reflects_palette() {
        let info = BlockRegistry::global().info(BlockType::Stick.id()).unwrap();
        assert_eq!(info.name, "stick");
        assert!(!info.placeable);
        assert!(BlockRegistry::global().info(15).is_none());
    }
}
