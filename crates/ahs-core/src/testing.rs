//! In-memory collaborators for unit tests.
use std::{
    collections::BTreeMap,
    sync::{
        Mutex,
        atomic::{AtomicU32, Ordering},
    },
};

use ahs_model::{InstanceId, Tags};
use async_trait::async_trait;

use crate::{
    error::{CoreError, CoreResult},
    host::HostnameSink,
    identity::MetadataSource,
    tags::TagStore,
};

pub struct MemoryMetadata {
    pub availability_zone: String,
    pub instance_id: String,
    pub reachable: bool,
    /// Number of calls failing with a transient error before answering.
    pub flaky_calls: AtomicU32,
}

impl MemoryMetadata {
    pub fn new(availability_zone: &str, instance_id: &str) -> Self {
        Self {
            availability_zone: availability_zone.to_string(),
            instance_id: instance_id.to_string(),
            reachable: true,
            flaky_calls: AtomicU32::new(0),
        }
    }

    fn answer(&self, value: &str) -> CoreResult<String> {
        let flaky = self.flaky_calls.load(Ordering::SeqCst);
        if flaky > 0 {
            self.flaky_calls.store(flaky - 1, Ordering::SeqCst);
            return Err(CoreError::Metadata("503 Service Unavailable".into()));
        }
        Ok(value.to_string())
    }
}

#[async_trait]
impl MetadataSource for MemoryMetadata {
    async fn check_available(&self) -> CoreResult<()> {
        if self.reachable {
            Ok(())
        } else {
            Err(CoreError::MetadataUnavailable("connection refused".into()))
        }
    }

    async fn availability_zone(&self) -> CoreResult<String> {
        self.answer(&self.availability_zone)
    }

    async fn instance_id(&self) -> CoreResult<String> {
        self.answer(&self.instance_id)
    }
}

#[derive(Default)]
pub struct MemoryTagStore {
    pub resources: Mutex<BTreeMap<InstanceId, Tags>>,
    /// Extra values returned by `tag_values`, to simulate duplicated keys.
    pub duplicates: Mutex<Vec<(String, String, String)>>,
    /// Number of calls failing with a transient error before answering.
    pub flaky_calls: AtomicU32,
    pub list_calls: AtomicU32,
    pub writes: Mutex<Vec<(String, String, String)>>,
}

impl MemoryTagStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_instance(self, id: &str, tags: &[(&str, &str)]) -> Self {
        self.resources
            .lock()
            .unwrap()
            .insert(id.to_string(), tags.iter().copied().collect());
        self
    }

    pub fn with_flaky_calls(self, n: u32) -> Self {
        self.flaky_calls.store(n, Ordering::SeqCst);
        self
    }

    pub fn tag(&self, id: &str, key: &str) -> Option<String> {
        let resources = self.resources.lock().unwrap();
        resources.get(id).and_then(|t| t.get(key)).map(str::to_string)
    }

    fn fail_if_flaky(&self) -> CoreResult<()> {
        let flaky = self.flaky_calls.load(Ordering::SeqCst);
        if flaky > 0 {
            self.flaky_calls.store(flaky - 1, Ordering::SeqCst);
            return Err(CoreError::TagStore("RequestLimitExceeded".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl TagStore for MemoryTagStore {
    async fn tag_values(&self, resource: &str, key: &str) -> CoreResult<Vec<String>> {
        self.fail_if_flaky()?;
        let mut values: Vec<String> = self
            .resources
            .lock()
            .unwrap()
            .get(resource)
            .and_then(|t| t.get(key))
            .map(str::to_string)
            .into_iter()
            .collect();

        for (r, k, v) in self.duplicates.lock().unwrap().iter() {
            if r == resource && k == key {
                values.push(v.clone());
            }
        }
        Ok(values)
    }

    async fn write_tag(&self, resource: &str, key: &str, value: &str) -> CoreResult<()> {
        self.fail_if_flaky()?;
        self.resources
            .lock()
            .unwrap()
            .entry(resource.to_string())
            .or_default()
            .insert(key, value);
        self.writes
            .lock()
            .unwrap()
            .push((resource.to_string(), key.to_string(), value.to_string()));
        Ok(())
    }

    async fn list_resources_by_tag(
        &self,
        key: &str,
        value: &str,
    ) -> CoreResult<BTreeMap<InstanceId, Tags>> {
        self.fail_if_flaky()?;
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .resources
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, tags)| tags.get(key) == Some(value))
            .map(|(id, tags)| (id.clone(), tags.clone()))
            .collect())
    }
}

#[derive(Default)]
pub struct RecordingHost {
    pub hostnames: Mutex<Vec<String>>,
    pub persisted: Mutex<Vec<String>>,
}

impl HostnameSink for RecordingHost {
    fn set_hostname(&self, hostname: &str) -> CoreResult<()> {
        self.hostnames.lock().unwrap().push(hostname.to_string());
        Ok(())
    }

    fn persist_hostname_file(&self, hostname: &str) -> CoreResult<()> {
        self.persisted
            .lock()
            .unwrap()
            .push(format!("hostname:{hostname}"));
        Ok(())
    }

    fn persist_hosts_entry(&self, hostname: &str) -> CoreResult<()> {
        self.persisted.lock().unwrap().push(format!("hosts:{hostname}"));
        Ok(())
    }
}
