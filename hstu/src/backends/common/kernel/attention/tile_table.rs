//! Tile size tables.
//!
//! Rows are evaluated top to bottom and the first matching row wins, so more
//! specific rows for a head dimension precede the catch-all row. Adding a head
//! dimension or a hardware tier means adding rows here. A configuration with
//! no matching row has no compiled kernel.

use serde::{Deserialize, Serialize};

use super::variant_flags::{MaskMode, MaskPattern};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Sm90Tile {
    pub block_m: i32,
    pub block_n: i32,
    /// P of the second GEMM stays in registers (RS) instead of going through
    /// shared memory (SS).
    pub mma1_is_rs: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sm90TileRule {
    pub head_dim: i32,
    pub element_size: usize,
    pub mask: MaskPattern,
    pub v_colmajor: Option<bool>,
    pub cross: Option<bool>,
    pub training: Option<bool>,
    pub tile: Sm90Tile,
}

impl Sm90TileRule {
    const fn new(
        head_dim: i32,
        element_size: usize,
        mask: MaskPattern,
    ) -> Self {
        Self {
            head_dim,
            element_size,
            mask,
            v_colmajor: None,
            cross: None,
            training: None,
            tile: Sm90Tile {
                block_m: 0,
                block_n: 0,
                mma1_is_rs: false,
            },
        }
    }

    const fn v_colmajor(
        mut self,
        v_colmajor: bool,
    ) -> Self {
        self.v_colmajor = Some(v_colmajor);
        self
    }

    const fn cross(
        mut self,
        cross: bool,
    ) -> Self {
        self.cross = Some(cross);
        self
    }

    const fn training(
        mut self,
        training: bool,
    ) -> Self {
        self.training = Some(training);
        self
    }

    const fn tile(
        mut self,
        block_m: i32,
        block_n: i32,
        mma1_is_rs: bool,
    ) -> Self {
        self.tile = Sm90Tile {
            block_m,
            block_n,
            mma1_is_rs,
        };
        self
    }

    #[allow(clippy::too_many_arguments)]
    pub fn matches(
        &self,
        head_dim: i32,
        mask: MaskMode,
        element_size: usize,
        v_colmajor: bool,
        cross: bool,
        training: bool,
    ) -> bool {
        self.head_dim == head_dim
            && self.element_size == element_size
            && self.mask.matches(mask)
            && self.v_colmajor.is_none_or(|value| value == v_colmajor)
            && self.cross.is_none_or(|value| value == cross)
            && self.training.is_none_or(|value| value == training)
    }
}

pub static SM90_TILE_TABLE: &[Sm90TileRule] = &[
    // 16-bit
    Sm90TileRule::new(32, 2, MaskPattern::Any).tile(128, 128, true),
    Sm90TileRule::new(64, 2, MaskPattern::Any).training(true).tile(128, 128, true),
    Sm90TileRule::new(64, 2, MaskPattern::Any).tile(192, 128, true),
    Sm90TileRule::new(96, 2, MaskPattern::Local).tile(192, 128, false),
    Sm90TileRule::new(96, 2, MaskPattern::Any).tile(192, 144, false),
    Sm90TileRule::new(128, 2, MaskPattern::Any).cross(true).tile(128, 128, true),
    Sm90TileRule::new(128, 2, MaskPattern::CausalOrLocal).tile(128, 128, true),
    Sm90TileRule::new(128, 2, MaskPattern::Any).training(true).tile(128, 160, true),
    Sm90TileRule::new(128, 2, MaskPattern::Any).tile(128, 176, true),
    Sm90TileRule::new(192, 2, MaskPattern::Local).tile(128, 96, true),
    Sm90TileRule::new(192, 2, MaskPattern::Any).tile(128, 112, true),
    Sm90TileRule::new(256, 2, MaskPattern::Local).tile(128, 64, true),
    Sm90TileRule::new(256, 2, MaskPattern::Any).tile(128, 80, true),
    // 8-bit
    Sm90TileRule::new(64, 1, MaskPattern::Any).tile(192, 160, true),
    Sm90TileRule::new(96, 1, MaskPattern::Any).tile(192, 128, true),
    Sm90TileRule::new(128, 1, MaskPattern::Any).v_colmajor(true).tile(128, 192, true),
    Sm90TileRule::new(128, 1, MaskPattern::Any).tile(128, 224, true),
    Sm90TileRule::new(192, 1, MaskPattern::Any).tile(128, 160, true),
    Sm90TileRule::new(256, 1, MaskPattern::Local).tile(128, 64, true),
    Sm90TileRule::new(256, 1, MaskPattern::Any).tile(128, 128, true),
];

#[allow(clippy::too_many_arguments)]
pub fn lookup_sm90(
    head_dim: i32,
    mask: MaskMode,
    element_size: usize,
    v_colmajor: bool,
    cross: bool,
    training: bool,
) -> Option<Sm90Tile> {
    SM90_TILE_TABLE
        .iter()
        .find(|rule| rule.matches(head_dim, mask, element_size, v_colmajor, cross, training))
        .map(|rule| rule.tile)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Sm8xTile {
    pub block_m: i32,
    pub block_n: i32,
    pub num_warps: i32,
    pub stages: i32,
    pub q_in_regs: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sm8xTileRule {
    pub head_dim: i32,
    pub element_size: usize,
    /// `Some(true)` restricts the row to sm86/sm89.
    pub narrow_core: Option<bool>,
    pub mask: MaskPattern,
    pub tile: Sm8xTile,
}

impl Sm8xTileRule {
    const fn new(
        head_dim: i32,
        element_size: usize,
        mask: MaskPattern,
    ) -> Self {
        Self {
            head_dim,
            element_size,
            narrow_core: None,
            mask,
            tile: Sm8xTile {
                block_m: 0,
                block_n: 0,
                num_warps: 0,
                stages: 0,
                q_in_regs: false,
            },
        }
    }

    const fn narrow_core(
        mut self,
        narrow_core: bool,
    ) -> Self {
        self.narrow_core = Some(narrow_core);
        self
    }

    const fn tile(
        mut self,
        block_m: i32,
        block_n: i32,
        num_warps: i32,
        stages: i32,
        q_in_regs: bool,
    ) -> Self {
        self.tile = Sm8xTile {
            block_m,
            block_n,
            num_warps,
            stages,
            q_in_regs,
        };
        self
    }

    pub fn matches(
        &self,
        narrow_core: bool,
        head_dim: i32,
        mask: MaskMode,
        element_size: usize,
    ) -> bool {
        self.head_dim == head_dim
            && self.element_size == element_size
            && self.narrow_core.is_none_or(|value| value == narrow_core)
            && self.mask.matches(mask)
    }
}

pub static SM8X_TILE_TABLE: &[Sm8xTileRule] = &[
    Sm8xTileRule::new(32, 2, MaskPattern::Any).tile(128, 128, 4, 1, false),
    Sm8xTileRule::new(64, 2, MaskPattern::Local).tile(128, 96, 4, 1, false),
    Sm8xTileRule::new(64, 2, MaskPattern::Any).tile(128, 112, 4, 1, false),
    Sm8xTileRule::new(96, 2, MaskPattern::Local).tile(128, 48, 4, 1, false),
    Sm8xTileRule::new(96, 2, MaskPattern::Any).tile(128, 64, 4, 1, false),
    Sm8xTileRule::new(128, 2, MaskPattern::Local).narrow_core(true).tile(128, 96, 8, 1, true),
    Sm8xTileRule::new(128, 2, MaskPattern::Any).narrow_core(true).tile(128, 128, 8, 1, true),
    Sm8xTileRule::new(128, 2, MaskPattern::Local).tile(128, 48, 4, 1, false),
    Sm8xTileRule::new(128, 2, MaskPattern::Any).tile(128, 64, 4, 1, false),
    Sm8xTileRule::new(192, 2, MaskPattern::Any).narrow_core(true).tile(128, 64, 8, 1, true),
    Sm8xTileRule::new(192, 2, MaskPattern::Any).tile(128, 64, 8, 2, true),
    Sm8xTileRule::new(256, 2, MaskPattern::Local).narrow_core(true).tile(64, 32, 4, 1, false),
    Sm8xTileRule::new(256, 2, MaskPattern::Any).narrow_core(true).tile(64, 64, 4, 1, false),
    Sm8xTileRule::new(256, 2, MaskPattern::Local).tile(128, 64, 8, 1, false),
    Sm8xTileRule::new(256, 2, MaskPattern::Any).tile(128, 96, 8, 1, false),
];

pub fn lookup_sm8x(
    narrow_core: bool,
    head_dim: i32,
    mask: MaskMode,
    element_size: usize,
) -> Option<Sm8xTile> {
    SM8X_TILE_TABLE.iter().find(|rule| rule.matches(narrow_core, head_dim, mask, element_size)).map(|rule| rule.tile)
}

/// Head dimensions with at least one row for `element_size` on the tier.
pub fn supported_head_dims(
    cluster_capable: bool,
    element_size: usize,
) -> Vec<i32> {
    let mut head_dims: Vec<i32> = if cluster_capable {
        SM90_TILE_TABLE.iter().filter(|rule| rule.element_size == element_size).map(|rule| rule.head_dim).collect()
    } else {
        SM8X_TILE_TABLE.iter().filter(|rule| rule.element_size == element_size).map(|rule| rule.head_dim).collect()
    };
    head_dims.sort_unstable();
    head_dims.dedup();
    head_dims
}
