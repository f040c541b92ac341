use std::time::Instant;

use chrono::Local;
use futures::stream::{FuturesUnordered, StreamExt};
use tracing::{debug, info, warn};

use crate::config::MonitorConfig;
use crate::display::Renderer;
use crate::models::{MonitorState, Snapshot, Status, TargetRecord};
use crate::prober::Prober;

pub struct Monitor<P, R> {
    pub config: MonitorConfig,
    prober: P,
    renderer: R,
    pub state: MonitorState,
}

impl<P: Prober, R: Renderer> Monitor<P, R> {
    pub fn new(config: MonitorConfig, prober: P, renderer: R) -> Self {
        let state = MonitorState::new(config.targets.len());
        Self {
            config,
            prober,
            renderer,
            state,
        }
    }

    /// Probes, redraws and sleeps until the process is killed.
    pub async fn run(mut self) {
        info!(
            "Monitoring {} host(s) every {}s",
            self.config.targets.len(),
            self.config.interval.as_secs()
        );

        loop {
            let snapshot = self.run_round().await;
            if let Err(e) = self.renderer.render(&snapshot) {
                warn!("Failed to draw status table: {}", e);
            }
            tokio::time::sleep(self.config.interval).await;
        }
    }

    /// Runs one full round and returns its snapshot. Every probe of the round
    /// has finished before any counter moves.
    pub async fn run_round(&mut self) -> Snapshot {
        let start_time = Instant::now();
        let results = self.probe_all().await;

        for ((target, entry), reachable) in self
            .config
            .targets
            .iter()
            .zip(self.state.targets.iter_mut())
            .zip(results)
        {
            let new_status = entry.counters.record(reachable);
            match entry.last_status.replace(new_status) {
                Some(old) if old != new_status => {
                    info!("[CHANGE] {} {} -> {}", target, old, new_status)
                }
                None if new_status == Status::Offline => info!("[CHANGE] {} is offline", target),
                _ => {}
            }
        }
        self.state.rounds += 1;

        debug!(
            "Round {} completed {} probes in {:.2}s",
            self.state.rounds,
            self.config.targets.len(),
            start_time.elapsed().as_secs_f64()
        );

        self.snapshot()
    }

    /// Probes every target concurrently; results come back in target order.
    async fn probe_all(&self) -> Vec<bool> {
        let prober = &self.prober;
        let mut tasks = FuturesUnordered::new();
        for (idx, target) in self.config.targets.iter().enumerate() {
            tasks.push(async move { (idx, target, prober.probe(target).await) });
        }

        let mut results = vec![false; self.config.targets.len()];
        while let Some((idx, target, outcome)) = tasks.next().await {
            results[idx] = match outcome {
                Ok(reachable) => reachable,
                Err(fault) => {
                    warn!("Probe of {} failed, counting as offline: {}", target, fault);
                    false
                }
            };
        }
        results
    }

    pub fn snapshot(&self) -> Snapshot {
        let records = self
            .config
            .targets
            .iter()
            .zip(&self.state.targets)
            .map(|(target, entry)| TargetRecord {
                target: target.clone(),
                status: entry.last_status.unwrap_or(Status::Offline),
                success: entry.counters.success,
                failure: entry.counters.failure,
            })
            .collect();

        Snapshot {
            round: self.state.rounds,
            taken_at: Local::now(),
            records,
        }
    }
}
