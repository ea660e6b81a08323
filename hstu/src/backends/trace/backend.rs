use std::{collections::HashSet, sync::Arc};

use parking_lot::Mutex;

use super::TraceError;
use crate::backends::common::{Backend, LaunchGeometry, gpu_types::KernelParams};

#[derive(Debug, Clone, PartialEq)]
pub enum TraceEvent {
    LoadFunction {
        device: i32,
        entry_point: String,
    },
    SetMaxDynamicSharedMemory {
        entry_point: String,
        bytes: usize,
    },
    Launch {
        entry_point: String,
        geometry: LaunchGeometry,
        params: Box<KernelParams>,
        stream: TraceStream,
    },
    ClusterLaunch {
        entry_point: String,
        geometry: LaunchGeometry,
        params: Box<KernelParams>,
        stream: TraceStream,
    },
}

/// Backend call to fail on purpose.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceFailure {
    LoadFunction,
    SharedMemoryOptIn,
    Launch,
    ClusterLaunch,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TraceFunction {
    pub device: i32,
    pub entry_point: Arc<str>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TraceStream(pub u64);

#[derive(Debug, Default)]
pub struct TraceBackend {
    events: Mutex<Vec<TraceEvent>>,
    entry_points: Option<HashSet<String>>,
    failure: Option<TraceFailure>,
}

impl TraceBackend {
    /// Backend where every entry point exists.
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend that only knows the given entry points, like a loaded module.
    pub fn with_entry_points<I: IntoIterator<Item = String>>(entry_points: I) -> Self {
        Self {
            entry_points: Some(entry_points.into_iter().collect()),
            ..Self::default()
        }
    }

    pub fn failing(
        mut self,
        failure: TraceFailure,
    ) -> Self {
        self.failure = Some(failure);
        self
    }

    pub fn events(&self) -> Vec<TraceEvent> {
        self.events.lock().clone()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }

    pub fn opt_in_count(&self) -> usize {
        self.events.lock().iter().filter(|event| matches!(event, TraceEvent::SetMaxDynamicSharedMemory { .. })).count()
    }

    pub fn launch_count(&self) -> usize {
        self.events
            .lock()
            .iter()
            .filter(|event| matches!(event, TraceEvent::Launch { .. } | TraceEvent::ClusterLaunch { .. }))
            .count()
    }

    fn check(
        &self,
        call: TraceFailure,
    ) -> Result<(), TraceError> {
        if self.failure == Some(call) {
            Err(TraceError::Injected(call))
        } else {
            Ok(())
        }
    }

    fn record(
        &self,
        event: TraceEvent,
    ) {
        self.events.lock().push(event);
    }
}

impl Backend for TraceBackend {
    type Stream = TraceStream;
    type Function = TraceFunction;
    type Error = TraceError;

    fn load_function(
        &self,
        device: i32,
        entry_point: &str,
    ) -> Result<Self::Function, Self::Error> {
        self.check(TraceFailure::LoadFunction)?;
        if let Some(entry_points) = &self.entry_points {
            if !entry_points.contains(entry_point) {
                return Err(TraceError::FunctionNotFound(entry_point.to_string()));
            }
        }
        self.record(TraceEvent::LoadFunction {
            device,
            entry_point: entry_point.to_string(),
        });
        Ok(TraceFunction {
            device,
            entry_point: Arc::from(entry_point),
        })
    }

    fn set_max_dynamic_shared_memory(
        &self,
        function: &Self::Function,
        bytes: usize,
    ) -> Result<(), Self::Error> {
        self.check(TraceFailure::SharedMemoryOptIn)?;
        self.record(TraceEvent::SetMaxDynamicSharedMemory {
            entry_point: function.entry_point.to_string(),
            bytes,
        });
        Ok(())
    }

    fn launch(
        &self,
        function: &Self::Function,
        geometry: &LaunchGeometry,
        params: &KernelParams,
        stream: &Self::Stream,
    ) -> Result<(), Self::Error> {
        self.check(TraceFailure::Launch)?;
        self.record(TraceEvent::Launch {
            entry_point: function.entry_point.to_string(),
            geometry: *geometry,
            params: Box::new(*params),
            stream: *stream,
        });
        Ok(())
    }

    fn launch_on_cluster(
        &self,
        function: &Self::Function,
        geometry: &LaunchGeometry,
        params: &KernelParams,
        stream: &Self::Stream,
    ) -> Result<(), Self::Error> {
        self.check(TraceFailure::ClusterLaunch)?;
        self.record(TraceEvent::ClusterLaunch {
            entry_point: function.entry_point.to_string(),
            geometry: *geometry,
            params: Box::new(*params),
            stream: *stream,
        });
        Ok(())
    }
}
