use std::{borrow::Cow, fmt};

use serde::{Deserialize, Serialize};

use super::variant_flags::{MaskMode, MaskPattern};
use crate::{Generation, error::ConfigurationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchedulerVariant {
    /// One block per SM walking a fixed stride over the tile space.
    StaticPersistent,
    /// One block per SM pulling tiles from the semaphore counter.
    DynamicPersistent,
    /// Dynamic persistent over the jagged tile space described by the offsets.
    VarlenDynamicPersistent,
    /// One block per tile.
    SingleTile,
}

impl SchedulerVariant {
    pub fn name(&self) -> &'static str {
        match self {
            SchedulerVariant::StaticPersistent => "static_persistent",
            SchedulerVariant::DynamicPersistent => "dynamic_persistent",
            SchedulerVariant::VarlenDynamicPersistent => "varlen_dynamic_persistent",
            SchedulerVariant::SingleTile => "single_tile",
        }
    }

    pub fn is_persistent(&self) -> bool {
        !matches!(self, SchedulerVariant::SingleTile)
    }

    pub fn uses_tile_count_semaphore(&self) -> bool {
        matches!(self, SchedulerVariant::DynamicPersistent | SchedulerVariant::VarlenDynamicPersistent)
    }
}

impl fmt::Display for SchedulerVariant {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One row of the scheduler policy. `None` columns match anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerRule {
    pub jagged: Option<bool>,
    pub mask: MaskPattern,
    pub generation: Option<Generation>,
    pub scheduler: SchedulerVariant,
}

impl SchedulerRule {
    pub fn matches(
        &self,
        jagged: bool,
        mask: MaskMode,
        generation: Generation,
    ) -> bool {
        self.jagged.is_none_or(|value| value == jagged)
            && self.mask.matches(mask)
            && self.generation.is_none_or(|value| value == generation)
    }
}

// Persistent scheduling amortizes block launch when per-tile work is uneven
// (masking skips tiles) or the tile count is unknown before launch (jagged).
// On sm8x, non-causal persistent runs seem a bit slower than one block per
// tile. These rows are tuned by measurement.
pub static DEFAULT_SCHEDULER_RULES: &[SchedulerRule] = &[
    SchedulerRule {
        jagged: Some(true),
        mask: MaskPattern::Any,
        generation: None,
        scheduler: SchedulerVariant::VarlenDynamicPersistent,
    },
    SchedulerRule {
        jagged: Some(false),
        mask: MaskPattern::None,
        generation: None,
        scheduler: SchedulerVariant::StaticPersistent,
    },
    SchedulerRule {
        jagged: Some(false),
        mask: MaskPattern::CausalOrLocal,
        generation: Some(Generation::Sm90),
        scheduler: SchedulerVariant::DynamicPersistent,
    },
    SchedulerRule {
        jagged: Some(false),
        mask: MaskPattern::Causal,
        generation: Some(Generation::Sm8x),
        scheduler: SchedulerVariant::DynamicPersistent,
    },
    SchedulerRule {
        jagged: Some(false),
        mask: MaskPattern::Any,
        generation: Some(Generation::Sm8x),
        scheduler: SchedulerVariant::SingleTile,
    },
];

/// First-match table from workload shape to tile scheduler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerPolicy {
    rules: Cow<'static, [SchedulerRule]>,
}

impl SchedulerPolicy {
    pub fn new(rules: Vec<SchedulerRule>) -> Self {
        Self {
            rules: Cow::Owned(rules),
        }
    }

    pub fn rules(&self) -> &[SchedulerRule] {
        &self.rules
    }

    pub fn select(
        &self,
        jagged: bool,
        mask: MaskMode,
        generation: Generation,
    ) -> Result<SchedulerVariant, ConfigurationError> {
        self.rules
            .iter()
            .find(|rule| rule.matches(jagged, mask, generation))
            .map(|rule| rule.scheduler)
            .ok_or(ConfigurationError::NoSchedulerRule)
    }
}

impl Default for SchedulerPolicy {
    fn default() -> Self {
        Self {
            rules: Cow::Borrowed(DEFAULT_SCHEDULER_RULES),
        }
    }
}
