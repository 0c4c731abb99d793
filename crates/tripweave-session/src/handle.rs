use std::sync::{Arc, Mutex, PoisonError};

use tripweave_bayes::{Category, WeatherPrediction};
use tripweave_mdp::{Action, CancelToken, PlanOutcome, TrainingSummary};

use crate::{GenerationReport, Session, SessionError, SessionSnapshot, TripParams};

/// Cloneable shared handle; calls from different threads run one at a time.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    inner: Arc<Mutex<Session>>,
}

impl SessionHandle {
    pub fn new(session: Session) -> Self {
        SessionHandle {
            inner: Arc::new(Mutex::new(session)),
        }
    }

    /// Run `f` with exclusive access. A panic in an earlier holder does not
    /// lock the session out.
    pub fn with<T>(&self, f: impl FnOnce(&mut Session) -> T) -> T {
        let mut session = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut session)
    }

    pub fn generate_itinerary(
        &self,
        params: &TripParams,
        cancel: &CancelToken,
    ) -> Result<GenerationReport, SessionError> {
        self.with(|s| s.generate_itinerary(params, cancel))
    }

    pub fn rate_activity(&self, category: Category, rating: u8) -> f64 {
        self.with(|s| s.rate_activity(category, rating))
    }

    pub fn train(&self, episodes: usize, cancel: &CancelToken) -> TrainingSummary {
        self.with(|s| s.train(episodes, cancel))
    }

    pub fn reward_history(&self) -> Vec<f64> {
        self.with(|s| s.reward_history())
    }

    pub fn search(
        &self,
        iterations: usize,
        cancel: &CancelToken,
    ) -> Result<PlanOutcome<Action>, SessionError> {
        self.with(|s| s.search(iterations, cancel))
    }

    pub fn predict_weather(&self) -> WeatherPrediction {
        self.with(|s| s.predict_weather())
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.with(|s| s.snapshot())
    }
}

impl From<Session> for SessionHandle {
    fn from(session: Session) -> Self {
        SessionHandle::new(session)
    }
}
