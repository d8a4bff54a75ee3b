//! tether integration test harness.
//!
//! Each test spawns a real `BridgeHost` task wired to the in-memory service
//! subsystem and bus from `tether_services::testing`. Status changes are
//! driven through the subsystem's subscription callback, exactly as a live
//! stack would report them.

use std::sync::Arc;

use anyhow::Result;
use tokio::task::JoinHandle;

use tether_core::{PropertyError, ServiceHandle, TetherConfig};
use tether_services::testing::{Entry, FakeBackend, Journal, RecordingBus};
use tether_services::{BridgeClient, BridgeHost};

mod properties;
mod scenarios;

// ── Harness ───────────────────────────────────────────────────────────────────

pub const DEVICE: &str = "/org/bluez/hci0/dev_00_11_22_33_44_55";
pub const A2DP_SINK: &str = "0000110b-0000-1000-8000-00805f9b34fb";
pub const HFP_AG: &str = "0000111f-0000-1000-8000-00805f9b34fb";

/// Naming key the bridge derives for `(DEVICE, uuid)`.
pub fn key_for(uuid: &str) -> String {
    format!("{DEVICE}/{uuid}").replace('-', "_")
}

pub struct Harness {
    pub client: BridgeClient,
    pub backend: Arc<FakeBackend>,
    pub bus: Arc<RecordingBus>,
    pub journal: Journal,
    task: JoinHandle<Result<()>>,
}

impl Harness {
    /// Spawn a host over a subsystem that knows `services` (all disconnected).
    pub fn start(services: &[(ServiceHandle, &str)]) -> Self {
        let backend = Arc::new(FakeBackend::new());
        for (handle, uuid) in services {
            backend.add_service(*handle, DEVICE, uuid);
        }
        let journal = Journal::default();
        let bus = Arc::new(RecordingBus::new(journal.clone()));
        let (client, task) =
            BridgeHost::spawn(&TetherConfig::default(), backend.clone(), bus.clone());
        Self {
            client,
            backend,
            bus,
            journal,
            task,
        }
    }

    /// Wait until every command queued so far has been processed.
    pub async fn settle(&self) {
        let barrier = self.client.properties(ServiceHandle(u64::MAX)).await;
        assert_eq!(barrier, Err(PropertyError::UnknownService));
    }

    pub fn state_labels(&self, uuid: &str) -> Vec<String> {
        let key = key_for(uuid);
        self.journal
            .announcements()
            .into_iter()
            .filter(|(k, _)| *k == key)
            .map(|(_, label)| label)
            .collect()
    }

    pub fn unregistered(&self) -> Vec<String> {
        self.journal
            .entries()
            .into_iter()
            .filter_map(|e| match e {
                Entry::Unregistered(key) => Some(key),
                _ => None,
            })
            .collect()
    }

    pub async fn stop(self) -> Result<()> {
        self.client.shutdown();
        self.task.await??;
        Ok(())
    }
}
