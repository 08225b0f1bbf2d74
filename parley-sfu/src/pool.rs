//! Worker pool.
//!
//! Workers are OS-level media processors; routers pinned to a worker
//! serialize on its event loop. Rooms take workers round-robin. A worker
//! that dies is dropped from rotation and replaced in the background; rooms
//! pinned to it fail fast on their next engine call and drain.

use mediasoup::prelude::*;
use mediasoup::worker::WorkerSettings;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::config::SfuConfig;

pub struct WorkerPool {
    manager: WorkerManager,
    config: SfuConfig,
    workers: Mutex<Vec<Worker>>,
    next: AtomicUsize,
}

impl WorkerPool {
    /// Create the boot-time pool of `config.resolve_num_workers()` workers.
    pub async fn new(config: SfuConfig) -> anyhow::Result<Arc<Self>> {
        let manager = WorkerManager::new();
        let size = config.resolve_num_workers();

        let mut workers = Vec::with_capacity(size);
        for _ in 0..size {
            let worker = manager
                .create_worker(Self::worker_settings(&config))
                .await
                .map_err(|e| anyhow::anyhow!("Failed to create worker: {e}"))?;
            workers.push(worker);
        }

        info!(workers = size, "Worker pool ready");

        Ok(Arc::new(Self {
            manager,
            config,
            workers: Mutex::new(workers),
            next: AtomicUsize::new(0),
        }))
    }

    fn worker_settings(config: &SfuConfig) -> WorkerSettings {
        let mut settings = WorkerSettings::default();
        settings.rtc_ports_range = config.rtc_min_port..=config.rtc_max_port;
        settings
    }

    /// Round-robin worker handle for a new router. Dead workers are skipped,
    /// dropped from rotation, and replaced in the background.
    pub fn next_worker(self: &Arc<Self>) -> anyhow::Result<Worker> {
        let mut workers = self.workers.lock();

        let dead = workers.iter().filter(|w| w.closed()).count();
        if dead > 0 {
            warn!(dead, "Removing dead workers from the pool");
            workers.retain(|w| !w.closed());
            for _ in 0..dead {
                self.spawn_replacement();
            }
        }

        if workers.is_empty() {
            return Err(anyhow::anyhow!("No live media workers"));
        }

        let index = self.next.fetch_add(1, Ordering::Relaxed) % workers.len();
        Ok(workers[index].clone())
    }

    fn spawn_replacement(self: &Arc<Self>) {
        let pool = Arc::clone(self);
        tokio::spawn(async move {
            match pool
                .manager
                .create_worker(Self::worker_settings(&pool.config))
                .await
            {
                Ok(worker) => {
                    pool.workers.lock().push(worker);
                    info!("Replacement worker joined the pool");
                }
                Err(e) => {
                    error!(error = %e, "Failed to create replacement worker");
                }
            }
        });
    }

    pub fn worker_count(&self) -> usize {
        self.workers.lock().iter().filter(|w| !w.closed()).count()
    }

    pub const fn config(&self) -> &SfuConfig {
        &self.config
    }

    /// WebRTC transport options for routers created from this pool.
    pub fn transport_options(&self) -> anyhow::Result<WebRtcTransportOptions> {
        let listen_ip = self.config.listen_ip()?;
        let announced_ip = self.config.announced_ip()?;

        Ok(WebRtcTransportOptions::new(TransportListenIps::new(
            TransportListenIp {
                ip: listen_ip,
                announced_ip,
            },
        )))
    }

    pub const fn max_incoming_bitrate(&self) -> u32 {
        self.config.max_incoming_bitrate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codecs::media_codecs;
    use mediasoup::router::RouterOptions;

    #[tokio::test]
    #[ignore = "Requires mediasoup-worker binary"]
    async fn test_pool_round_robin() {
        let pool = WorkerPool::new(SfuConfig {
            num_workers: 2,
            ..SfuConfig::default()
        })
        .await
        .unwrap();

        assert_eq!(pool.worker_count(), 2);

        let a = pool.next_worker().unwrap();
        let b = pool.next_worker().unwrap();
        let c = pool.next_worker().unwrap();
        assert_ne!(a.id(), b.id());
        assert_eq!(a.id(), c.id());
    }

    #[tokio::test]
    #[ignore = "Requires mediasoup-worker binary"]
    async fn test_router_creation() {
        let pool = WorkerPool::new(SfuConfig {
            num_workers: 1,
            ..SfuConfig::default()
        })
        .await
        .unwrap();

        let worker = pool.next_worker().unwrap();
        let router = worker
            .create_router(RouterOptions::new(media_codecs()))
            .await
            .unwrap();
        assert!(!router.closed());
    }
}
