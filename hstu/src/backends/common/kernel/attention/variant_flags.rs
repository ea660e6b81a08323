use serde::{Deserialize, Serialize};

use crate::{
    error::ConfigurationError,
    parameters::{ForwardParameters, ValueLayout},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaskMode {
    None,
    Causal,
    Local,
}

impl MaskMode {
    pub const ALL: [MaskMode; 3] = [MaskMode::None, MaskMode::Causal, MaskMode::Local];

    pub fn resolve(
        causal: bool,
        local: bool,
    ) -> Result<Self, ConfigurationError> {
        match (causal, local) {
            (true, true) => Err(ConfigurationError::CausalAndLocal),
            (true, false) => Ok(MaskMode::Causal),
            (false, true) => Ok(MaskMode::Local),
            (false, false) => Ok(MaskMode::None),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            MaskMode::None => "none",
            MaskMode::Causal => "causal",
            MaskMode::Local => "local",
        }
    }
}

/// Mask column of the tile and scheduler tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaskPattern {
    Any,
    None,
    Causal,
    Local,
    CausalOrLocal,
}

impl MaskPattern {
    pub fn matches(
        &self,
        mask: MaskMode,
    ) -> bool {
        match self {
            MaskPattern::Any => true,
            MaskPattern::None => mask == MaskMode::None,
            MaskPattern::Causal => mask == MaskMode::Causal,
            MaskPattern::Local => mask == MaskMode::Local,
            MaskPattern::CausalOrLocal => mask != MaskMode::None,
        }
    }
}

/// Runtime flags of one call, each resolved to the kernel axis it selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VariantFlags {
    pub mask: MaskMode,
    pub contextual_mask: bool,
    pub jagged: bool,
    pub has_targets: bool,
    pub v_colmajor: bool,
    pub cross: bool,
    pub softmax: bool,
    pub training: bool,
}

impl VariantFlags {
    pub fn resolve(params: &ForwardParameters) -> Result<Self, ConfigurationError> {
        let mask = MaskMode::resolve(params.causal, params.local)?;
        let v_colmajor = match params.value_layout {
            ValueLayout::RowMajor => false,
            ValueLayout::ColumnMajor {
                ..
            } if params.data_type.is_fp8() => true,
            ValueLayout::ColumnMajor {
                ..
            } => return Err(ConfigurationError::UnsupportedValueLayout(params.data_type)),
        };

        Ok(Self {
            mask,
            contextual_mask: params.has_contextual_mask,
            jagged: params.is_jagged(),
            has_targets: params.num_targets.is_some(),
            v_colmajor,
            cross: params.is_cross(),
            softmax: params.num_softmax_heads > 0,
            training: params.training,
        })
    }

    /// Every legal flag combination. Column-major V only exists for 8-bit
    /// elements.
    pub fn enumerate(fp8: bool) -> impl Iterator<Item = Self> {
        let layouts: &'static [bool] = if fp8 {
            &[false, true]
        } else {
            &[false]
        };
        MaskMode::ALL.into_iter().flat_map(move |mask| {
            layouts.iter().flat_map(move |&v_colmajor| {
                (0u32..64).map(move |bits| Self {
                    mask,
                    contextual_mask: bits & 1 != 0,
                    jagged: bits & 2 != 0,
                    has_targets: bits & 4 != 0,
                    v_colmajor,
                    cross: bits & 8 != 0,
                    softmax: bits & 16 != 0,
                    training: bits & 32 != 0,
                })
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn causal_and_local_is_rejected() {
        assert_eq!(MaskMode::resolve(true, true), Err(ConfigurationError::CausalAndLocal));
        assert_eq!(MaskMode::resolve(false, true), Ok(MaskMode::Local));
    }

    #[test]
    fn enumerates_every_combination_once() {
        let dense: Vec<_> = VariantFlags::enumerate(false).collect();
        assert_eq!(dense.len(), 3 * 64);
        assert!(dense.iter().all(|flags| !flags.v_colmajor));

        let fp8: std::collections::HashSet<_> = VariantFlags::enumerate(true).collect();
        assert_eq!(fp8.len(), 3 * 2 * 64);
    }

    #[test]
    fn pointer_presence_selects_axes() {
        let params = ForwardParameters {
            seq_offsets: Some(crate::DevicePointer(0x100)),
            num_targets: Some(crate::DevicePointer(0x200)),
            num_softmax_heads: 2,
            ..Default::default()
        };
        let flags = VariantFlags::resolve(&params).unwrap();
        assert!(flags.jagged);
        assert!(flags.has_targets);
        assert!(flags.softmax);
        assert!(!flags.cross);
        assert_eq!(flags.mask, MaskMode::None);
    }

    #[test]
    fn column_major_values_need_fp8() {
        let params = ForwardParameters {
            value_layout: ValueLayout::ColumnMajor {
                dim_stride: 256,
            },
            ..Default::default()
        };
        assert_eq!(
            VariantFlags::resolve(&params),
            Err(ConfigurationError::UnsupportedValueLayout(crate::DataType::BF16))
        );
    }
}
