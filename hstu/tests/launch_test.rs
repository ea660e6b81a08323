mod common;

use common::{cluster_dispatcher, dense_params, dispatcher};
use hstu::{
    Architecture, DataType, DispatchConfig, DispatchError, FlashAttentionForward, GridSize,
    architecture::DEFAULT_SHARED_MEMORY_LIMIT,
    backends::{
        common::{
            Backend,
            kernel::attention::{KernelInvoker, LaunchPath, num_query_tiles},
        },
        trace::{TraceBackend, TraceError, TraceEvent, TraceFailure, TraceStream},
    },
};
use proptest::prelude::*;

proptest! {
    #[test]
    fn query_tiles_cover_the_sequence(
        max_q_len in 1i32..100_000,
        block_m in prop::sample::select(vec![64, 128, 192]),
        cluster_m in 1i32..=2,
    ) {
        let tiles = num_query_tiles(max_q_len, block_m, cluster_m);
        let exact = (max_q_len + block_m - 1) / block_m;
        prop_assert_eq!(tiles % cluster_m, 0);
        prop_assert!(tiles >= exact);
        prop_assert!(tiles - exact < cluster_m);
    }
}

#[test]
fn footprint_at_the_threshold_opts_in_once() {
    let forward = dispatcher(Architecture::Sm80);
    let params = dense_params(DataType::F16, 96);
    let plan = forward.plan(&params).unwrap();
    assert_eq!(plan.geometry.shared_memory_bytes, DEFAULT_SHARED_MEMORY_LIMIT);

    for stream in 0..3 {
        forward.launch(&params, &TraceStream(stream)).unwrap();
    }
    let events = forward.backend().events();
    assert_eq!(forward.backend().opt_in_count(), 1);
    assert_eq!(forward.backend().launch_count(), 3);
    assert!(matches!(
        &events[1],
        TraceEvent::SetMaxDynamicSharedMemory {
            bytes: 49152,
            ..
        }
    ));
    assert!(matches!(&events[2], TraceEvent::Launch { .. }));
    assert!(forward.invoker().shared_memory().is_configured(0, &plan.key));
}

#[test]
fn footprint_below_the_threshold_never_opts_in() {
    let forward = dispatcher(Architecture::Sm80);
    let params = dense_params(DataType::F16, 64);
    let plan = forward.launch(&params, &TraceStream(0)).unwrap();
    assert_eq!(plan.geometry.shared_memory_bytes, 45056);
    assert!(!plan.geometry.requires_shared_memory_opt_in());
    assert_eq!(forward.backend().opt_in_count(), 0);
    assert_eq!(forward.backend().launch_count(), 1);
}

#[test]
fn opt_in_is_per_device() {
    let forward = dispatcher(Architecture::Sm90);
    let mut params = dense_params(DataType::BF16, 128);
    forward.launch(&params, &TraceStream(0)).unwrap();
    params.device = 1;
    forward.launch(&params, &TraceStream(0)).unwrap();
    forward.launch(&params, &TraceStream(0)).unwrap();
    assert_eq!(forward.backend().opt_in_count(), 2);
}

#[test]
fn concurrent_first_launches_opt_in_once() {
    let forward = dispatcher(Architecture::Sm90);
    let params = dense_params(DataType::BF16, 256);
    std::thread::scope(|scope| {
        for stream in 0..8 {
            let forward = &forward;
            let params = &params;
            scope.spawn(move || forward.launch(params, &TraceStream(stream)).unwrap());
        }
    });
    assert_eq!(forward.backend().opt_in_count(), 1);
    assert_eq!(forward.backend().launch_count(), 8);
}

#[test]
fn launch_path_follows_the_cluster_shape() {
    let backend = TraceBackend::new();
    let plan = dispatcher(Architecture::Sm90).plan(&dense_params(DataType::BF16, 128)).unwrap();
    let function = backend.load_function(0, &plan.entry_point).unwrap();

    let cases = [
        (GridSize::ONE, LaunchPath::Standard),
        (GridSize::new(2, 1, 1), LaunchPath::Cluster),
        (GridSize::new(1, 2, 1), LaunchPath::Cluster),
        (GridSize::new(1, 1, 2), LaunchPath::Cluster),
        (GridSize::new(2, 2, 1), LaunchPath::Cluster),
    ];
    for (cluster, expected) in cases {
        let invoker = KernelInvoker::new();
        backend.clear();
        let mut descriptor = plan.descriptor();
        descriptor.geometry.cluster = cluster;

        let path = invoker.invoke(&backend, 0, &plan.key, &function, &descriptor, &TraceStream(7)).unwrap();
        assert_eq!(path, expected, "cluster {cluster}");
        let events = backend.events();
        assert_eq!(events.len(), 2, "cluster {cluster}");
        match (&events[1], expected) {
            (
                TraceEvent::ClusterLaunch {
                    geometry,
                    stream,
                    ..
                },
                LaunchPath::Cluster,
            )
            | (
                TraceEvent::Launch {
                    geometry,
                    stream,
                    ..
                },
                LaunchPath::Standard,
            ) => {
                assert_eq!(geometry.cluster, cluster);
                assert_eq!(*stream, TraceStream(7));
            },
            (event, _) => panic!("unexpected {event:?} for cluster {cluster}"),
        }
    }
}

#[test]
fn cluster_dispatch_uses_the_cluster_launch() {
    let forward = cluster_dispatcher(Architecture::Sm90);
    let plan = forward.launch(&dense_params(DataType::BF16, 128), &TraceStream(0)).unwrap();
    assert_eq!(plan.launch_path(), LaunchPath::Cluster);
    assert_eq!(plan.geometry.cluster, GridSize::new(2, 1, 1));
    assert_eq!(plan.params.cluster_shape, [2, 1, 1]);
    assert_eq!(plan.geometry.grid.x % 2, 0);
    assert!(matches!(forward.backend().events().last(), Some(TraceEvent::ClusterLaunch { .. })));
}

#[test]
fn query_tiles_round_up_to_the_cluster() {
    let forward = cluster_dispatcher(Architecture::Sm90);
    let mut params = dense_params(DataType::BF16, 128);
    assert_eq!(num_query_tiles(130, 64, 2), 4);
    params.max_q_len = 130;
    let plan = forward.plan(&params).unwrap();
    assert_eq!(plan.key.cluster_m, 2);
    assert_eq!(plan.params.scheduler.num_blocks_m, 2);

    params.max_q_len = 257;
    let plan = forward.plan(&params).unwrap();
    assert_eq!(plan.key.cluster_m, 1);
    assert_eq!(plan.params.scheduler.num_blocks_m, 3);
}

#[test]
fn backend_failures_are_returned_without_retry() {
    let params = dense_params(DataType::BF16, 128);
    let failing = |failure| {
        FlashAttentionForward::new(TraceBackend::new().failing(failure), Architecture::Sm90, DispatchConfig::default())
    };

    let forward = failing(TraceFailure::SharedMemoryOptIn);
    let error = forward.launch(&params, &TraceStream(0)).unwrap_err();
    assert!(matches!(
        error,
        DispatchError::SharedMemoryOptIn {
            source: TraceError::Injected(TraceFailure::SharedMemoryOptIn),
            ..
        }
    ));
    assert_eq!(forward.backend().launch_count(), 0);
    let key = forward.plan(&params).unwrap().key;
    assert!(!forward.invoker().shared_memory().is_configured(0, &key));

    let forward = failing(TraceFailure::Launch);
    let error = forward.launch(&params, &TraceStream(0)).unwrap_err();
    assert!(matches!(error, DispatchError::Launch { ref entry_point, .. } if *entry_point == key.entry_point()));
    assert_eq!(forward.backend().opt_in_count(), 1);
    assert_eq!(forward.backend().events().len(), 2);

    let forward = failing(TraceFailure::LoadFunction);
    assert!(matches!(forward.launch(&params, &TraceStream(0)), Err(DispatchError::FunctionLoad { .. })));
    assert!(forward.backend().events().is_empty());
}

#[test]
fn cluster_launch_failures_name_the_cluster_path() {
    let forward = FlashAttentionForward::new(
        TraceBackend::new().failing(TraceFailure::ClusterLaunch),
        Architecture::Sm90,
        DispatchConfig {
            enable_cluster: true,
        },
    );
    let error = forward.launch(&dense_params(DataType::BF16, 128), &TraceStream(0)).unwrap_err();
    assert!(matches!(error, DispatchError::ClusterLaunch { .. }));
    assert!(error.to_string().contains("_cluster2_"));
}

#[test]
fn missing_entry_points_fail_to_load() {
    let forward = FlashAttentionForward::new(
        TraceBackend::with_entry_points(Vec::new()),
        Architecture::Sm90,
        DispatchConfig::default(),
    );
    let error = forward.launch(&dense_params(DataType::BF16, 128), &TraceStream(0)).unwrap_err();
    assert!(matches!(
        error,
        DispatchError::FunctionLoad {
            source: TraceError::FunctionNotFound(_),
            ..
        }
    ));
}
