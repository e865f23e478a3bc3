//! Scriptable driver used to test the probes without a GPU

use crate::{
    error::{DriverError, DriverResult},
    result::ResultCode,
    Driver, Helper,
};
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex, Once,
};

/// Set up test logging
pub fn init_logger() {
    static INIT_LOGGER: Once = Once::new();
    INIT_LOGGER.call_once(|| {
        let _ = env_logger::builder().is_test(true).try_init();
    });
}

/// Driver call recorded by [`FakeDriver`]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Call {
    CreateInstance,
    FirstPhysicalDevice,
    CreateDevice,
    AllocateMemory(u64),
}

/// Number of allocations that may still succeed
struct Budget(AtomicUsize);
//
impl Budget {
    fn new(amount: usize) -> Self {
        Self(AtomicUsize::new(amount))
    }

    fn take(&self) -> bool {
        self.0
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |left| {
                left.checked_sub(1)
            })
            .is_ok()
    }
}

/// Handle that keeps track of how many of its kind are still alive
#[derive(Debug)]
pub struct FakeHandle(Arc<AtomicUsize>);
//
impl FakeHandle {
    fn new(live: &Arc<AtomicUsize>) -> Self {
        live.fetch_add(1, Ordering::Relaxed);
        Self(live.clone())
    }
}
//
impl Drop for FakeHandle {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::Relaxed);
    }
}

/// Driver whose limits are set up by the test
pub struct FakeDriver {
    instances: Budget,
    devices: Budget,
    memory_limit: u64,
    physical_devices: usize,
    failure: ResultCode,
    memory_failure: DriverError,
    calls: Mutex<Vec<Call>>,
    live: Arc<AtomicUsize>,
}
//
impl FakeDriver {
    /// Driver without any limit, exposing a single physical device
    pub fn new() -> Self {
        Self {
            instances: Budget::new(usize::MAX),
            devices: Budget::new(usize::MAX),
            memory_limit: u64::MAX,
            physical_devices: 1,
            failure: ResultCode::OutOfHostMemory,
            memory_failure: ResultCode::OutOfDeviceMemory.into(),
            calls: Mutex::new(Vec::new()),
            live: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Only allow `count` instances to be created
    pub fn instances(mut self, count: usize) -> Self {
        self.instances = Budget::new(count);
        self
    }

    /// Only allow `count` logical devices to be created
    pub fn devices(mut self, count: usize) -> Self {
        self.devices = Budget::new(count);
        self
    }

    /// Refuse memory allocations larger than `limit` bytes
    pub fn memory_limit(mut self, limit: u64) -> Self {
        self.memory_limit = limit;
        self
    }

    /// Expose `count` physical devices
    pub fn physical_devices(mut self, count: usize) -> Self {
        self.physical_devices = count;
        self
    }

    /// Result code reported when a limit is reached
    pub fn failing_with(mut self, failure: ResultCode) -> Self {
        self.failure = failure;
        self
    }

    /// Error reported when an allocation exceeds the memory limit
    pub fn memory_failing_with(mut self, failure: DriverError) -> Self {
        self.memory_failure = failure;
        self
    }

    /// Driver calls made so far
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of handles that were created and not released
    pub fn live_handles(&self) -> usize {
        self.live.load(Ordering::Relaxed)
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn refusal(&self) -> DriverError {
        DriverError::Result(self.failure)
    }
}
//
impl Driver for FakeDriver {
    type Instance = FakeHandle;
    type PhysicalDevice = FakeHandle;
    type Device = FakeHandle;
    type Memory = FakeHandle;

    fn create_instance(&self) -> DriverResult<FakeHandle> {
        self.record(Call::CreateInstance);
        if self.instances.take() {
            Ok(FakeHandle::new(&self.live))
        } else {
            Err(self.refusal())
        }
    }

    fn first_physical_device(&self, _instance: &FakeHandle) -> DriverResult<Option<FakeHandle>> {
        self.record(Call::FirstPhysicalDevice);
        Ok((self.physical_devices > 0).then(|| FakeHandle::new(&self.live)))
    }

    fn create_device(&self, _physical_device: &FakeHandle) -> DriverResult<FakeHandle> {
        self.record(Call::CreateDevice);
        if self.devices.take() {
            Ok(FakeHandle::new(&self.live))
        } else {
            Err(self.refusal())
        }
    }

    fn allocate_memory(&self, _device: &FakeHandle, size: u64) -> DriverResult<FakeHandle> {
        self.record(Call::AllocateMemory(size));
        if size <= self.memory_limit {
            Ok(FakeHandle::new(&self.live))
        } else {
            Err(self.memory_failure.clone())
        }
    }
}

/// Helper layer that can only set up a fixed number of contexts
pub struct FakeHelper {
    instance_ok: bool,
    contexts: Budget,
    failure: DriverError,
}
//
impl FakeHelper {
    pub fn new(contexts: usize) -> Self {
        Self {
            instance_ok: true,
            contexts: Budget::new(contexts),
            failure: DriverError::NoMatchingDevice,
        }
    }

    /// Make instance creation fail
    pub fn without_instance(mut self) -> Self {
        self.instance_ok = false;
        self
    }

    /// Error reported when the context budget is exhausted
    pub fn failing_with(mut self, failure: DriverError) -> Self {
        self.failure = failure;
        self
    }
}
//
impl Helper for FakeHelper {
    type Instance = ();
    type Context = ();

    fn create_instance(&self) -> DriverResult<()> {
        if self.instance_ok {
            Ok(())
        } else {
            Err(ResultCode::IncompatibleDriver.into())
        }
    }

    fn create_context(&self, _instance: &()) -> DriverResult<()> {
        if self.contexts.take() {
            Ok(())
        } else {
            Err(self.failure.clone())
        }
    }
}
