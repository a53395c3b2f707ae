// src/pacing.rs

//! Frame pacing for animations.
//!
//! `sleep` suspends the calling thread with `nanosleep(2)`. A signal that
//! cuts the sleep short is logged and reported in the outcome; it is never
//! retried or escalated.

use log::{trace, warn};
use nix::errno::Errno;
use std::time::Duration;

/// How a pacing sleep ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SleepOutcome {
    /// The full duration elapsed.
    Completed,
    /// A signal woke the thread early.
    Interrupted { remaining: Duration },
    /// The kernel rejected the request.
    Failed(Errno),
}

/// Sleeps for approximately `millis` milliseconds.
pub fn sleep(millis: u64) -> SleepOutcome {
    sleep_for(Duration::from_millis(millis))
}

/// Sleeps for approximately `duration`.
pub fn sleep_for(duration: Duration) -> SleepOutcome {
    if duration.is_zero() {
        return SleepOutcome::Completed;
    }

    let request = to_timespec(duration);
    let mut remaining = libc::timespec {
        tv_sec: 0,
        tv_nsec: 0,
    };

    trace!("Sleeping for {:?}", duration);
    let rc = unsafe { libc::nanosleep(&request, &mut remaining) };
    if rc == 0 {
        return SleepOutcome::Completed;
    }

    match Errno::last() {
        Errno::EINTR => {
            let remaining = from_timespec(&remaining);
            warn!(
                "Sleep of {:?} interrupted with {:?} remaining",
                duration, remaining
            );
            SleepOutcome::Interrupted { remaining }
        }
        errno => {
            warn!("Sleep of {:?} failed: {}", duration, errno);
            SleepOutcome::Failed(errno)
        }
    }
}

fn to_timespec(duration: Duration) -> libc::timespec {
    libc::timespec {
        tv_sec: duration.as_secs().min(libc::time_t::MAX as u64) as libc::time_t,
        tv_nsec: duration.subsec_nanos() as libc::c_long,
    }
}

fn from_timespec(ts: &libc::timespec) -> Duration {
    Duration::new(ts.tv_sec.max(0) as u64, ts.tv_nsec.clamp(0, 999_999_999) as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nix::sys::pthread::{pthread_kill, pthread_self};
    use nix::sys::signal::{sigaction, SaFlags, SigAction, SigHandler, SigSet, Signal};
    use std::sync::mpsc;
    use std::thread;
    use std::time::Instant;
    use test_log::test;

    extern "C" fn ignore_signal(_: libc::c_int) {}

    #[test]
    fn sleeps_roughly_the_requested_time() {
        let start = Instant::now();
        assert_eq!(sleep(25), SleepOutcome::Completed);
        assert!(start.elapsed() >= Duration::from_millis(25));
    }

    #[test]
    fn zero_sleep_returns_immediately() {
        assert_eq!(sleep(0), SleepOutcome::Completed);
    }

    #[test]
    fn timespec_conversion_splits_seconds() {
        let ts = to_timespec(Duration::from_millis(2_500));
        assert_eq!(ts.tv_sec, 2);
        assert_eq!(ts.tv_nsec, 500_000_000);
        assert_eq!(from_timespec(&ts), Duration::from_millis(2_500));
    }

    #[test]
    fn signal_interrupts_and_is_reported() {
        let action = SigAction::new(
            SigHandler::Handler(ignore_signal),
            SaFlags::empty(),
            SigSet::empty(),
        );
        unsafe { sigaction(Signal::SIGUSR1, &action) }.unwrap();

        let (tx, rx) = mpsc::channel();
        let sleeper = thread::spawn(move || {
            tx.send(pthread_self()).unwrap();
            sleep(5_000)
        });

        let target = rx.recv().unwrap();
        thread::sleep(Duration::from_millis(100));
        pthread_kill(target, Signal::SIGUSR1).unwrap();

        match sleeper.join().unwrap() {
            SleepOutcome::Interrupted { remaining } => {
                assert!(remaining > Duration::ZERO);
                assert!(remaining < Duration::from_millis(5_000));
            }
            other => panic!("expected an interrupted sleep, got {other:?}"),
        }
    }
}
