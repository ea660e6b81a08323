mod common;

use std::collections::HashSet;

use common::{cluster_dispatcher, dense_params, dispatcher, params_for};
use hstu::{
    Architecture, ConfigurationError, DataType, DispatchConfig, FlashAttentionForward,
    backends::{
        common::kernel::attention::{KernelKey, MaskMode, SchedulerPolicy, Specialization, VariantFlags},
        trace::{TraceBackend, TraceEvent, TraceStream},
    },
};
use proptest::prelude::*;

fn any_architecture() -> impl Strategy<Value = Architecture> {
    prop::sample::select(Architecture::ALL.to_vec())
}

fn any_kernel_type() -> impl Strategy<Value = DataType> {
    prop::sample::select(vec![DataType::F16, DataType::BF16, DataType::F8E4M3, DataType::F8E5M2])
}

fn any_flags() -> impl Strategy<Value = VariantFlags> {
    (0usize..3, any::<bool>(), any::<bool>(), any::<bool>(), any::<bool>(), any::<bool>(), any::<bool>()).prop_map(
        |(mask, contextual_mask, jagged, has_targets, cross, softmax, training)| VariantFlags {
            mask: MaskMode::ALL[mask],
            contextual_mask,
            jagged,
            has_targets,
            v_colmajor: false,
            cross,
            softmax,
            training,
        },
    )
}

proptest! {
    #[test]
    fn selection_is_deterministic(
        architecture in any_architecture(),
        data_type in any_kernel_type(),
        head_dim in prop::sample::select(vec![32, 64, 80, 96, 128, 160, 192, 256]),
        flags in any_flags(),
    ) {
        let first = Specialization::select(architecture, head_dim, &flags, data_type);
        let second = Specialization::select(architecture, head_dim, &flags, data_type);
        prop_assert_eq!(first, second);

        let forward = dispatcher(architecture);
        let params = params_for(&flags, data_type, head_dim);
        let first = forward.plan(&params);
        let second = forward.plan(&params);
        prop_assert_eq!(&first, &second);
        if let Ok(plan) = first {
            prop_assert_eq!(plan.entry_point, plan.key.entry_point());
        }
    }
}

#[test]
fn entry_point_names_are_unique() {
    for architecture in Architecture::ALL {
        let keys = KernelKey::enumerate(architecture, &SchedulerPolicy::default());
        assert!(!keys.is_empty(), "{architecture} has no kernels");
        let names: HashSet<String> = keys.iter().map(KernelKey::entry_point).collect();
        assert_eq!(names.len(), keys.len(), "{architecture} has colliding entry points");
    }
}

#[test]
fn every_compiled_specialization_fits_shared_memory() {
    for architecture in Architecture::ALL {
        let limit = architecture.max_shared_memory_per_block_optin();
        for key in KernelKey::enumerate(architecture, &SchedulerPolicy::default()) {
            let specialization = Specialization::select(architecture, key.head_dim, &key.flags, key.element).unwrap();
            assert!(
                specialization.shared_storage_size() <= limit,
                "{key} needs {} bytes, {architecture} allows {limit}",
                specialization.shared_storage_size()
            );
        }
    }
}

#[test]
fn every_legal_combination_resolves_to_a_compiled_entry_point() {
    for architecture in Architecture::ALL {
        let keys = KernelKey::enumerate(architecture, &SchedulerPolicy::default());
        let manifest = || keys.iter().map(KernelKey::entry_point);
        let single = FlashAttentionForward::new(
            TraceBackend::with_entry_points(manifest()),
            architecture,
            DispatchConfig::default(),
        );
        let clustered = FlashAttentionForward::new(
            TraceBackend::with_entry_points(manifest()),
            architecture,
            DispatchConfig {
                enable_cluster: true,
            },
        );

        for key in &keys {
            let mut params = params_for(&key.flags, key.element, key.head_dim);
            let forward = if key.cluster_m == 2 {
                params.max_q_len = 4 * 128;
                &clustered
            } else {
                &single
            };
            let plan = forward.launch(&params, &TraceStream(1)).unwrap_or_else(|error| panic!("{key}: {error}"));
            assert_eq!(&plan.key, key);
        }
        assert_eq!(single.backend().launch_count() + clustered.backend().launch_count(), keys.len());
    }
}

#[test]
fn unsupported_requests_fail_before_the_backend() {
    let forward = dispatcher(Architecture::Sm90);
    let stream = TraceStream(0);

    let params = dense_params(DataType::BF16, 80);
    assert_eq!(
        forward.launch(&params, &stream).unwrap_err().configuration(),
        Some(&ConfigurationError::UnsupportedHeadDim {
            architecture: Architecture::Sm90,
            head_dim: 80,
            element_size: 2,
        })
    );

    let params = dense_params(DataType::F32, 128);
    assert_eq!(forward.plan(&params), Err(ConfigurationError::UnsupportedDataType(DataType::F32)));

    // sm8x kernels are only built for 16-bit elements.
    let sm80 = dispatcher(Architecture::Sm80);
    let params = dense_params(DataType::F8E4M3, 128);
    assert!(matches!(sm80.plan(&params), Err(ConfigurationError::UnsupportedHeadDim { .. })));
    for head_dim in [64, 128, 256] {
        assert_eq!(
            dispatcher(Architecture::Sm89).plan(&dense_params(DataType::F8E5M2, head_dim)),
            Err(ConfigurationError::UnsupportedHeadDim {
                architecture: Architecture::Sm89,
                head_dim,
                element_size: 1,
            })
        );
    }

    assert!(forward.backend().events().is_empty());
    assert!(sm80.backend().events().is_empty());
}

#[test]
fn causal_and_local_is_rejected_before_marshaling() {
    let forward = dispatcher(Architecture::Sm90);
    let params = hstu::ForwardParameters {
        causal: true,
        local: true,
        ..dense_params(DataType::BF16, 128)
    };
    let error = forward.launch(&params, &TraceStream(0)).unwrap_err();
    assert_eq!(error.configuration(), Some(&ConfigurationError::CausalAndLocal));
    assert!(forward.backend().events().is_empty());
}

#[test]
fn functions_are_loaded_once_per_device() {
    let forward = dispatcher(Architecture::Sm90);
    let mut params = dense_params(DataType::BF16, 128);
    forward.launch(&params, &TraceStream(0)).unwrap();
    forward.launch(&params, &TraceStream(1)).unwrap();
    params.device = 1;
    forward.launch(&params, &TraceStream(0)).unwrap();

    let loads: Vec<i32> = forward
        .backend()
        .events()
        .into_iter()
        .filter_map(|event| match event {
            TraceEvent::LoadFunction {
                device,
                ..
            } => Some(device),
            _ => None,
        })
        .collect();
    assert_eq!(loads, vec![0, 1]);
    assert_eq!(forward.backend().launch_count(), 3);
}

#[test]
fn sm90_dense_tile_and_pipeline() {
    let plan = dispatcher(Architecture::Sm90).plan(&dense_params(DataType::BF16, 128)).unwrap();
    let specialization = plan.specialization;
    assert_eq!((specialization.block_m, specialization.block_n), (128, 176));
    assert_eq!(specialization.stages, 2);
    assert_eq!(specialization.num_threads(), 384);
    assert_eq!(plan.geometry.block.x, 384);
    assert_eq!(plan.params.tile_shape, [128, 176, 128]);
    assert_eq!(plan.key.output, DataType::BF16);
}

#[test]
fn fp8_output_is_widened() {
    let plan = dispatcher(Architecture::Sm90).plan(&dense_params(DataType::F8E4M3, 128)).unwrap();
    assert_eq!(plan.key.element, DataType::F8E4M3);
    assert_eq!(plan.key.output, DataType::BF16);
    assert!(plan.entry_point.contains("_e4m3_out_bf16_"));
}

#[test]
fn narrow_core_parts_use_their_own_rows() {
    let params = dense_params(DataType::F16, 128);
    let sm80 = dispatcher(Architecture::Sm80).plan(&params).unwrap();
    let sm86 = dispatcher(Architecture::Sm86).plan(&params).unwrap();
    assert_eq!((sm80.specialization.block_n, sm80.specialization.num_warps), (64, 4));
    assert_eq!((sm86.specialization.block_n, sm86.specialization.num_warps), (128, 8));
    assert!(sm86.specialization.q_in_regs);
    assert_ne!(sm80.entry_point, sm86.entry_point);
}

#[test]
fn cluster_variants_need_the_config_and_an_even_tile_count() {
    let mut params = dense_params(DataType::BF16, 128);
    params.max_q_len = 512;
    assert_eq!(dispatcher(Architecture::Sm90).plan(&params).unwrap().key.cluster_m, 1);
    assert_eq!(cluster_dispatcher(Architecture::Sm90).plan(&params).unwrap().key.cluster_m, 2);

    params.max_q_len = 384;
    assert_eq!(cluster_dispatcher(Architecture::Sm90).plan(&params).unwrap().key.cluster_m, 1);

    params.max_q_len = 512;
    params.causal = true;
    assert_eq!(cluster_dispatcher(Architecture::Sm90).plan(&params).unwrap().key.cluster_m, 1);

    let narrow = dense_params(DataType::BF16, 64);
    assert_eq!(cluster_dispatcher(Architecture::Sm90).plan(&narrow).unwrap().key.cluster_m, 1);
    assert_eq!(cluster_dispatcher(Architecture::Sm80).plan(&dense_params(DataType::BF16, 128)).unwrap().key.cluster_m, 1);
}

#[test]
fn empty_workloads_are_rejected() {
    let forward = dispatcher(Architecture::Sm80);
    let mut params = dense_params(DataType::F16, 128);
    params.max_q_len = 0;
    params.local = true;
    assert_eq!(
        forward.plan(&params),
        Err(ConfigurationError::EmptyWorkload {
            batch_size: 2,
            num_heads: 8,
            max_q_len: 0,
        })
    );

    let params = hstu::ForwardParameters {
        batch_size: 0,
        ..dense_params(DataType::F16, 128)
    };
    assert!(matches!(forward.launch(&params, &TraceStream(0)), Err(error) if error.configuration().is_some()));
    assert!(forward.backend().events().is_empty());
}

#[test]
fn longest_query_length_keeps_a_positive_tile_count() {
    let forward = dispatcher(Architecture::Sm90);
    let mut params = dense_params(DataType::BF16, 128);
    params.max_q_len = i32::MAX;
    let plan = forward.plan(&params).unwrap();
    assert_eq!(plan.params.scheduler.num_blocks_m, 16_777_216);
    assert_eq!((plan.geometry.grid.x, plan.geometry.grid.y, plan.geometry.grid.z), (132, 1, 1));

    let mut params = dense_params(DataType::BF16, 64);
    params.max_q_len = i32::MAX;
    params.local = true;
    let plan = dispatcher(Architecture::Sm80).plan(&params).unwrap();
    assert_eq!(plan.params.scheduler.num_blocks_m, 16_777_216);
    assert_eq!((plan.geometry.grid.x, plan.geometry.grid.y, plan.geometry.grid.z), (16_777_216, 8, 2));
}
