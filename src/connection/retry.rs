use std::os::raw::c_int;
use std::thread;
use std::time::Duration;

use crate::config::RetryPolicy;
use crate::engine::status;

/// Anything carrying the native status of one engine call.
pub(crate) trait EngineStatus {
    fn status(&self) -> c_int;
}

impl EngineStatus for c_int {
    fn status(&self) -> c_int {
        *self
    }
}

/// Call `attempt` until it reports something other than busy or the budget runs out.
///
/// `attempt` receives the 1-based trial number. No sleep follows the last trial.
pub(crate) fn with_busy_retry<T, F>(policy: &RetryPolicy, command: &str, attempt: F) -> T
where
    T: EngineStatus,
    F: FnMut(usize) -> T,
{
    with_busy_retry_sleeping(policy, command, thread::sleep, attempt)
}

/// [`with_busy_retry`] with the pause between trials supplied by the caller.
pub(crate) fn with_busy_retry_sleeping<T, F, S>(
    policy: &RetryPolicy,
    command: &str,
    mut sleep: S,
    mut attempt: F,
) -> T
where
    T: EngineStatus,
    F: FnMut(usize) -> T,
    S: FnMut(Duration),
{
    let mut trial = 1;
    loop {
        let outcome = attempt(trial);
        if outcome.status() != status::BUSY {
            if trial > 1 {
                tracing::debug!(retries = trial - 1, command, "database no longer busy");
            }
            return outcome;
        }
        if trial >= policy.max_trials() {
            tracing::warn!(trials = trial, command, "database still busy; giving up");
            return outcome;
        }
        tracing::debug!(trial, command, "database busy; retrying");
        sleep(policy.retry_delay());
        trial += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Replays `statuses`, recording trial numbers and requested sleeps.
    struct Script<'a> {
        statuses: &'a [c_int],
        trials: Vec<usize>,
        sleeps: Vec<Duration>,
    }

    impl<'a> Script<'a> {
        fn new(statuses: &'a [c_int]) -> Self {
            Self {
                statuses,
                trials: Vec::new(),
                sleeps: Vec::new(),
            }
        }

        fn run(&mut self, policy: &RetryPolicy) -> c_int {
            let statuses = self.statuses;
            let trials = &mut self.trials;
            let sleeps = &mut self.sleeps;
            with_busy_retry_sleeping(
                policy,
                "INSERT INTO t VALUES (1)",
                |delay| sleeps.push(delay),
                |trial| {
                    trials.push(trial);
                    statuses[trial - 1]
                },
            )
        }
    }

    #[test]
    fn success_on_first_trial_never_sleeps() {
        let mut script = Script::new(&[status::OK]);
        let outcome = script.run(&RetryPolicy::default());
        assert_eq!(outcome, status::OK);
        assert_eq!(script.trials, vec![1]);
        assert!(script.sleeps.is_empty());
    }

    #[test]
    fn busy_then_ok_sleeps_once_per_busy_trial() {
        let mut statuses = vec![status::BUSY; 5];
        statuses.push(status::OK);
        let mut script = Script::new(&statuses);
        let policy = RetryPolicy::default();

        let outcome = script.run(&policy);

        assert_eq!(outcome, status::OK);
        assert_eq!(script.trials, vec![1, 2, 3, 4, 5, 6]);
        assert_eq!(script.sleeps, vec![policy.retry_delay(); 5]);
    }

    #[test]
    fn always_busy_stops_at_budget() {
        let statuses = [status::BUSY; 32];
        let mut script = Script::new(&statuses);

        let outcome = script.run(&RetryPolicy::default());

        assert_eq!(outcome, status::BUSY);
        assert_eq!(script.trials.len(), 16);
        assert_eq!(script.sleeps.len(), 15);
    }

    #[test]
    fn non_busy_error_is_not_retried() {
        let mut script = Script::new(&[status::ERROR, status::OK]);
        let outcome = script.run(&RetryPolicy::new(4, Duration::from_secs(60)));
        assert_eq!(outcome, status::ERROR);
        assert_eq!(script.trials, vec![1]);
        assert!(script.sleeps.is_empty());
    }

    #[test]
    fn custom_budget_is_honoured() {
        let statuses = [status::BUSY; 8];
        let mut script = Script::new(&statuses);
        script.run(&RetryPolicy::new(3, Duration::from_millis(7)));
        assert_eq!(script.trials, vec![1, 2, 3]);
        assert_eq!(script.sleeps, vec![Duration::from_millis(7); 2]);
    }

    #[test]
    fn default_sleeper_waits_between_trials() {
        let mut calls = 0;
        let policy = RetryPolicy::new(2, Duration::ZERO);
        let outcome = with_busy_retry(&policy, "INSERT", |_| {
            calls += 1;
            status::BUSY
        });
        assert_eq!(outcome, status::BUSY);
        assert_eq!(calls, 2);
    }
}
