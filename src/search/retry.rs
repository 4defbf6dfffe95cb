//! Retry-with-invalidation state machine for search calls
//!
//! Each attempt first needs a token, then makes the call. A 401 is a
//! retryable failure: the caller evicts the cached token and the machine
//! moves to the next attempt, or fails once the attempt bound is reached.
//! Everything else ends the machine immediately.

use crate::error::{SearchError, SearchMcpError};

/// Outcome of a single outbound call
#[derive(Debug)]
pub enum CallOutcome<T> {
    /// 2xx with a decoded payload
    Success(T),

    /// The API rejected the bearer token
    Unauthorized,

    /// Anything else; not retried
    Failed(SearchMcpError),
}

/// State of a search call
#[derive(Debug)]
pub enum AttemptState<T> {
    /// A token is needed before attempt `attempt` (1-based)
    NeedToken { attempt: u32 },

    /// Attempt `attempt` is ready to go out with `token`
    Calling { attempt: u32, token: String },

    Success(T),

    /// Attempt `attempt` was rejected with 401
    RetryableFailure { attempt: u32 },

    FatalFailure(SearchMcpError),
}

/// Transition rules bounded by a maximum number of attempts
#[derive(Debug, Clone, Copy)]
pub struct RetryMachine {
    max_attempts: u32,
}

impl RetryMachine {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Initial state
    pub fn start<T>(&self) -> AttemptState<T> {
        AttemptState::NeedToken { attempt: 1 }
    }

    /// Transition out of `NeedToken`
    pub fn on_token<T>(&self, attempt: u32, token: Result<String, SearchMcpError>) -> AttemptState<T> {
        match token {
            Ok(token) => AttemptState::Calling { attempt, token },
            Err(e) => AttemptState::FatalFailure(e),
        }
    }

    /// Transition out of `Calling`
    pub fn on_outcome<T>(&self, attempt: u32, outcome: CallOutcome<T>) -> AttemptState<T> {
        match outcome {
            CallOutcome::Success(value) => AttemptState::Success(value),
            CallOutcome::Unauthorized => AttemptState::RetryableFailure { attempt },
            CallOutcome::Failed(e) => AttemptState::FatalFailure(e),
        }
    }

    /// Transition out of `RetryableFailure`, after the token was evicted
    pub fn on_retryable<T>(&self, attempt: u32) -> AttemptState<T> {
        if attempt < self.max_attempts {
            AttemptState::NeedToken { attempt: attempt + 1 }
        } else {
            AttemptState::FatalFailure(
                SearchError::AuthorizationRetryExhausted {
                    attempts: self.max_attempts,
                }
                .into(),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AuthError;

    fn machine() -> RetryMachine {
        RetryMachine::new(3)
    }

    #[test]
    fn test_happy_path() {
        let m = machine();
        let state: AttemptState<u8> = m.start();
        assert!(matches!(state, AttemptState::NeedToken { attempt: 1 }));

        let state: AttemptState<u8> = m.on_token(1, Ok("t".to_string()));
        assert!(matches!(state, AttemptState::Calling { attempt: 1, ref token } if token == "t"));

        let state = m.on_outcome(1, CallOutcome::Success(7u8));
        assert!(matches!(state, AttemptState::Success(7)));
    }

    #[test]
    fn test_unauthorized_moves_to_next_attempt() {
        let m = machine();
        let state = m.on_outcome::<u8>(1, CallOutcome::Unauthorized);
        assert!(matches!(state, AttemptState::RetryableFailure { attempt: 1 }));

        let state = m.on_retryable::<u8>(1);
        assert!(matches!(state, AttemptState::NeedToken { attempt: 2 }));
    }

    #[test]
    fn test_unauthorized_on_last_attempt_is_exhausted() {
        let state = machine().on_retryable::<u8>(3);
        match state {
            AttemptState::FatalFailure(SearchMcpError::Search(SearchError::AuthorizationRetryExhausted {
                attempts,
            })) => assert_eq!(attempts, 3),
            other => panic!("unexpected state: {other:?}"),
        }
    }

    #[test]
    fn test_other_failures_are_fatal() {
        let m = machine();
        let state = m.on_outcome::<u8>(
            1,
            CallOutcome::Failed(SearchError::Status { status: 500, body: String::new() }.into()),
        );
        assert!(matches!(state, AttemptState::FatalFailure(_)));

        let state = m.on_token::<u8>(2, Err(AuthError::MissingAccessToken.into()));
        assert!(matches!(state, AttemptState::FatalFailure(SearchMcpError::Auth(_))));
    }

    #[test]
    fn test_walk_until_exhausted_counts_attempts() {
        let m = machine();
        let mut calls = 0;
        let mut state: AttemptState<()> = m.start();

        let err = loop {
            state = match state {
                AttemptState::NeedToken { attempt } => m.on_token(attempt, Ok("t".to_string())),
                AttemptState::Calling { attempt, .. } => {
                    calls += 1;
                    m.on_outcome(attempt, CallOutcome::Unauthorized)
                }
                AttemptState::RetryableFailure { attempt } => m.on_retryable(attempt),
                AttemptState::Success(_) => panic!("should not succeed"),
                AttemptState::FatalFailure(e) => break e,
            };
        };

        assert_eq!(calls, 3);
        assert!(matches!(
            err,
            SearchMcpError::Search(SearchError::AuthorizationRetryExhausted { attempts: 3 })
        ));
    }

    #[test]
    fn test_zero_attempts_clamped() {
        assert_eq!(RetryMachine::new(0).max_attempts(), 1);
    }
}
