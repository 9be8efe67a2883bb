//! Simulated device sessions for demo mode
//!
//! Performs no network I/O: connecting sleeps a randomized interval and
//! succeeds with a configurable probability, so demo runs exercise the same
//! control flow as live ones.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use secrecy::SecretString;
use tracing::debug;

use crate::session::{
    ConnectError, ConnectParams, DeviceSession, SessionError, SessionFactory,
};

/// Tuning for simulated outcomes
#[derive(Debug, Clone)]
pub struct SimulatorOptions {
    /// Shortest simulated connect delay
    pub min_delay: Duration,

    /// Longest simulated connect delay
    pub max_delay: Duration,

    /// Probability that a simulated deployment succeeds
    pub success_rate: f64,

    /// Fixed RNG seed for deterministic outcomes in tests
    pub seed: Option<u64>,
}

impl Default for SimulatorOptions {
    fn default() -> Self {
        Self {
            min_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(3),
            success_rate: 0.9,
            seed: None,
        }
    }
}

/// Factory producing simulated sessions
pub struct SimulatedSessionFactory {
    options: SimulatorOptions,
    rng: Mutex<SmallRng>,
}

impl SimulatedSessionFactory {
    pub fn new(options: SimulatorOptions) -> Self {
        let rng = match options.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        };
        Self {
            options,
            rng: Mutex::new(rng),
        }
    }

    /// Draw the delay and outcome for one connection attempt
    fn draw(&self) -> (Duration, bool) {
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        let delay = if self.options.max_delay > self.options.min_delay {
            rng.gen_range(self.options.min_delay..=self.options.max_delay)
        } else {
            self.options.min_delay
        };
        let succeed = rng.gen_bool(self.options.success_rate.clamp(0.0, 1.0));
        (delay, succeed)
    }
}

impl Default for SimulatedSessionFactory {
    fn default() -> Self {
        Self::new(SimulatorOptions::default())
    }
}

#[async_trait]
impl SessionFactory for SimulatedSessionFactory {
    async fn connect(&self, params: ConnectParams) -> Result<Box<dyn DeviceSession>, ConnectError> {
        let (delay, succeed) = self.draw();
        debug!(
            "Simulating connection to {}:{} (delay {:?})",
            params.host, params.port, delay
        );
        tokio::time::sleep(delay).await;

        if !succeed {
            return Err(ConnectError::Timeout);
        }

        Ok(Box::new(SimulatedSession {
            host: params.host,
            privileged: false,
        }))
    }

    fn backend_name(&self) -> &str {
        "simulated"
    }
}

/// Connection handle that fakes a cooperative device
pub struct SimulatedSession {
    host: String,
    privileged: bool,
}

#[async_trait]
impl DeviceSession for SimulatedSession {
    async fn is_privileged(&mut self) -> bool {
        self.privileged
    }

    async fn enter_privileged(
        &mut self,
        _enable_password: &SecretString,
    ) -> Result<(), SessionError> {
        self.privileged = true;
        Ok(())
    }

    async fn push_config_lines(&mut self, lines: &[String]) -> Result<String, SessionError> {
        Ok(format!("applied {} lines to {}", lines.len(), self.host))
    }

    async fn run_command(&mut self, command: &str) -> Result<String, SessionError> {
        Ok(format!("{}\n{}#", command, self.host))
    }

    async fn disconnect(&mut self) -> Result<(), SessionError> {
        Ok(())
    }
}
