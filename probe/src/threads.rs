//! Threaded stress probe
//!
//! Instead of looping on a single thread, this probe spawns threads which
//! each create one instance and logical device, then sleep forever. No thread
//! ever gives anything back, so the process-wide number of driver objects (and
//! threads) keeps growing until either the driver or the OS says stop.

use crate::{
    error::{DriverError, Error, Result},
    exhaust::{Exhaustion, Outcome, Refusal},
    leak::Leaked,
    stress::{park_forever, Chain},
    Driver,
};
use crossbeam_channel::{Receiver, Sender};
#[allow(unused_imports)]
use log::{debug, error, info, log, trace, warn};
use std::{
    io::Write,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    thread,
};

/// What a worker thread has to say after its one allocation attempt
#[derive(Debug)]
pub enum Report {
    /// The worker holds its chain; it was the n-th worker to get there
    Ready(usize),

    /// The driver refused part of the chain
    Refused(DriverError),

    /// Something unrelated to the probed limit went wrong
    Fatal(Error),
}

/// Set of detached worker threads
pub struct Swarm<D: Driver> {
    /// Driver that workers create their resources from
    driver: Arc<D>,

    /// Stack size of worker threads
    stack_size: usize,

    /// Number of workers that hold a complete chain
    successes: Arc<AtomicUsize>,

    /// Number of workers spawned so far
    spawned: usize,

    /// Channel over which each worker sends exactly one report
    sender: Sender<Report>,
    receiver: Receiver<Report>,
}
//
impl<D: Driver> Swarm<D> {
    /// Prepare to spawn workers
    pub fn new(driver: Arc<D>, stack_size: usize) -> Self {
        let (sender, receiver) = crossbeam_channel::unbounded();
        Self {
            driver,
            stack_size,
            successes: Arc::new(AtomicUsize::new(0)),
            spawned: 0,
            sender,
            receiver,
        }
    }

    /// Spawn one more worker
    ///
    /// The worker is detached: nobody will ever join it.
    pub fn spawn_worker(&mut self) -> Result<()> {
        let driver = self.driver.clone();
        let successes = self.successes.clone();
        let sender = self.sender.clone();
        thread::Builder::new()
            .name(format!("probe worker #{}", self.spawned))
            .stack_size(self.stack_size)
            .spawn(move || {
                let (report, chain) = match Chain::create(&*driver) {
                    Ok(chain) => {
                        let rank = successes.fetch_add(1, Ordering::Relaxed) + 1;
                        (Report::Ready(rank), Some(Leaked::new(chain)))
                    }
                    Err(Refusal::Driver(error)) => (Report::Refused(error), None),
                    Err(Refusal::Fatal(error)) => (Report::Fatal(error), None),
                };
                let _ = sender.send(report);
                // Our sender must go away for Drain to see the end of reports
                drop(sender);
                let _chain = chain;
                park_forever()
            })
            .map_err(Error::ThreadSpawn)?;
        self.spawned += 1;
        Ok(())
    }

    /// Number of workers spawned so far
    pub fn spawned(&self) -> usize {
        self.spawned
    }

    /// Check for a worker report without blocking
    pub fn try_report(&self) -> Option<Report> {
        self.receiver.try_recv().ok()
    }

    /// Stop spawning workers, and wait for those in flight to report
    pub fn drain(self) -> Drain {
        Drain {
            successes: self.successes,
            receiver: self.receiver,
        }
    }
}

/// Reports from workers of a [`Swarm`] that won't spawn any more workers
///
/// Iteration ends once every spawned worker has reported.
pub struct Drain {
    successes: Arc<AtomicUsize>,
    receiver: Receiver<Report>,
}
//
impl Drain {
    /// Number of workers that hold a complete chain so far
    pub fn successes(&self) -> usize {
        self.successes.load(Ordering::Relaxed)
    }
}
//
impl Iterator for Drain {
    type Item = Report;

    fn next(&mut self) -> Option<Report> {
        self.receiver.recv().ok()
    }
}

/// Spawn workers holding an instance and a logical device until the driver
/// or the OS refuses
pub fn threads<D: Driver>(
    driver: Arc<D>,
    stack_size: usize,
    out: &mut impl Write,
) -> Result<Outcome> {
    writeln!(
        out,
        "Trying to exhaust threaded instance+device creation limit..."
    )?;
    let mut swarm = Swarm::new(driver, stack_size);
    let error = 'spawn: loop {
        swarm.spawn_worker()?;
        while let Some(report) = swarm.try_report() {
            match report {
                Report::Ready(rank) => writeln!(out, "  {rank}")?,
                Report::Refused(error) => break 'spawn error,
                Report::Fatal(error) => return Err(error),
            }
        }
    };
    debug!(
        "Worker refused by the driver after {} spawns, waiting for the others...",
        swarm.spawned()
    );

    // Let the workers that are still in flight settle down
    let mut drain = swarm.drain();
    for report in drain.by_ref() {
        match report {
            Report::Ready(rank) => writeln!(out, "  {rank}")?,
            Report::Refused(other) => trace!("Another worker was refused: {other}"),
            Report::Fatal(error) => return Err(error),
        }
    }
    let count = drain.successes();
    writeln!(
        out,
        "Threaded instance+device creation failed after {count} successes: {error}"
    )?;
    Ok(Outcome::Exhausted(Exhaustion { count, error }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        result::ResultCode,
        testing::{init_logger, FakeDriver},
    };

    const STACK_SIZE: usize = 64 * 1024;

    #[test]
    fn counter_matches_successful_workers() {
        init_logger();
        let driver = Arc::new(FakeDriver::new().devices(3));
        let mut swarm = Swarm::new(driver.clone(), STACK_SIZE);
        for _ in 0..8 {
            swarm.spawn_worker().unwrap();
        }
        assert_eq!(swarm.spawned(), 8);
        let mut drain = swarm.drain();
        let reports = drain.by_ref().collect::<Vec<_>>();
        assert_eq!(reports.len(), 8);
        let ready = reports
            .iter()
            .filter(|report| matches!(report, Report::Ready(_)))
            .count();
        assert_eq!(ready, 3);
        assert_eq!(drain.successes(), 3);
        assert!(reports.iter().all(|report| matches!(
            report,
            Report::Ready(_) | Report::Refused(DriverError::Result(ResultCode::OutOfHostMemory))
        )));
    }

    #[test]
    fn probe_reports_exact_count() {
        init_logger();
        let driver = Arc::new(
            FakeDriver::new()
                .instances(5)
                .failing_with(ResultCode::TooManyObjects),
        );
        let mut out = Vec::new();
        let outcome = threads(driver.clone(), STACK_SIZE, &mut out).unwrap();
        assert_eq!(
            outcome,
            Outcome::Exhausted(Exhaustion {
                count: 5,
                error: ResultCode::TooManyObjects.into(),
            })
        );
        assert_eq!(driver.live_handles(), 5 * 3);
        let out = String::from_utf8(out).unwrap();
        let mut ranks = out
            .lines()
            .filter_map(|line| line.trim().parse::<usize>().ok())
            .collect::<Vec<_>>();
        ranks.sort_unstable();
        assert_eq!(ranks, vec![1, 2, 3, 4, 5]);
        assert!(out
            .lines()
            .last()
            .unwrap()
            .ends_with("failed after 5 successes: VK_ERROR_TOO_MANY_OBJECTS"));
    }

    #[test]
    fn spawn_failure_is_fatal() {
        init_logger();
        let driver = Arc::new(FakeDriver::new());
        let error = threads(driver.clone(), usize::MAX / 2, &mut Vec::new()).unwrap_err();
        assert!(matches!(error, Error::ThreadSpawn(_)));
        assert_eq!(error.exit_code(), 2);
        assert!(driver.calls().is_empty());
    }

    #[test]
    fn missing_physical_device_is_fatal() {
        let driver = Arc::new(FakeDriver::new().physical_devices(0));
        let error = threads(driver, STACK_SIZE, &mut Vec::new()).unwrap_err();
        assert!(matches!(error, Error::NoPhysicalDevice));
        assert_eq!(error.exit_code(), 2);
    }
}
