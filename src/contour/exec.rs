use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;
use super::ContourError;

/// Flag shared between the thread waiting for a contour and the thread computing it.
/// Jobs call checkpoint() between their stages, and stop as soon as the waiting side
/// gave up on them.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled : Arc<AtomicBool>
}

impl CancelToken {

    pub fn new() -> Self {
        Self { cancelled : Arc::new(AtomicBool::new(false)) }
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    pub fn checkpoint(&self) -> Result<(), ContourError> {
        if self.is_cancelled() {
            Err(ContourError::Cancelled)
        } else {
            Ok(())
        }
    }

}

/// The pure part of a contour calculation. A job owns everything it needs (so it can be
/// moved into a worker thread), and returns the computed quantities that the contour
/// then stores.
pub trait ContourJob
    where Self : Send + 'static
{

    type Output : Send + 'static;

    fn setup(self, cancel : &CancelToken) -> Result<Self::Output, ContourError>;

}

/// Runs the job at the calling thread when no timeout is informed. Otherwise, runs it at a
/// dedicated worker thread, and waits for its result for at most the timeout. When the timeout
/// expires, the job is signaled to stop, its eventual result is discarded and
/// ContourError::Timeout is returned.
pub fn run_bounded<J>(job : J, timeout : Option<Duration>) -> Result<J::Output, ContourError>
where
    J : ContourJob
{
    let cancel = CancelToken::new();
    let limit = match timeout {
        Some(limit) => limit,
        None => return job.setup(&cancel)
    };
    let (tx, rx) = mpsc::sync_channel(1);
    let worker_cancel = cancel.clone();
    thread::Builder::new()
        .name(String::from("contour-worker"))
        .spawn(move || {
            let res = job.setup(&worker_cancel);

            // The receiver is gone if the job finished after the timeout.
            let _ = tx.send(res);
        })
        .map_err(ContourError::Spawn)?;
    match rx.recv_timeout(limit) {
        Ok(res) => res,
        Err(RecvTimeoutError::Timeout) => {
            cancel.cancel();
            Err(ContourError::Timeout { seconds : limit.as_secs_f64() })
        },
        Err(RecvTimeoutError::Disconnected) => Err(ContourError::WorkerLost)
    }
}

#[cfg(test)]
mod tests {

    use super::*;
    use std::time::Instant;

    struct Sleeper {
        steps : usize,
        step : Duration,
        done : Arc<AtomicBool>
    }

    impl ContourJob for Sleeper {

        type Output = usize;

        fn setup(self, cancel : &CancelToken) -> Result<usize, ContourError> {
            for _ in 0..self.steps {
                cancel.checkpoint()?;
                thread::sleep(self.step);
            }
            self.done.store(true, Ordering::SeqCst);
            Ok(self.steps)
        }

    }

    struct Panicker;

    impl ContourJob for Panicker {

        type Output = ();

        fn setup(self, _cancel : &CancelToken) -> Result<(), ContourError> {
            panic!("Worker failure")
        }

    }

    #[test]
    fn unbounded_job_runs_inline() {
        let done = Arc::new(AtomicBool::new(false));
        let job = Sleeper { steps : 2, step : Duration::from_millis(1), done : done.clone() };
        assert_eq!(run_bounded(job, None).unwrap(), 2);
        assert!(done.load(Ordering::SeqCst));
    }

    #[test]
    fn slow_job_times_out_and_stops() {
        let done = Arc::new(AtomicBool::new(false));
        let job = Sleeper { steps : 100, step : Duration::from_millis(10), done : done.clone() };
        let start = Instant::now();
        match run_bounded(job, Some(Duration::from_millis(20))) {
            Err(ContourError::Timeout { seconds }) => assert!((seconds - 0.02).abs() < 1E-9),
            other => panic!("Unexpected result: {:?}", other)
        }
        assert!(start.elapsed() < Duration::from_millis(500));

        // The worker observes the cancellation at its next checkpoint.
        thread::sleep(Duration::from_millis(100));
        assert!(!done.load(Ordering::SeqCst));
    }

    #[test]
    fn fast_job_finishes_within_timeout() {
        let done = Arc::new(AtomicBool::new(false));
        let job = Sleeper { steps : 1, step : Duration::from_millis(1), done };
        assert_eq!(run_bounded(job, Some(Duration::from_secs(5))).unwrap(), 1);
    }

    #[test]
    fn lost_worker_is_reported() {
        match run_bounded(Panicker, Some(Duration::from_secs(5))) {
            Err(ContourError::WorkerLost) => { },
            other => panic!("Unexpected result: {:?}", other)
        }
    }

}
