//! Concurrent query workload run against a pool of simulated database
//! connections.

use cistern_pool::{BoxError, Pool, PoolStats, Resource};
use log::{debug, warn};
use rand::Rng;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::config::DemoConfig;

/// A simulated database connection
#[derive(Debug)]
pub struct DbConnection {
    /// Connection number, in creation order
    pub id: u32,
}

impl Resource for DbConnection {
    fn close(&mut self) -> Result<(), BoxError> {
        debug!("Closing connection [{}]", self.id);
        Ok(())
    }
}

/// Opens simulated connections and counts them
#[derive(Debug, Default)]
pub struct ConnectionFactory {
    opened: AtomicU32,
}

impl ConnectionFactory {
    /// Open a new connection
    pub fn open(&self) -> Result<DbConnection, BoxError> {
        let id = self.opened.fetch_add(1, Ordering::SeqCst) + 1;
        debug!("Opened connection [{}]", id);
        Ok(DbConnection { id })
    }

    /// Number of connections opened so far
    pub fn opened(&self) -> u32 {
        self.opened.load(Ordering::SeqCst)
    }
}

/// Outcome of a demonstration run
#[derive(Debug, Clone)]
pub struct DemoReport {
    /// Number of concurrent workers
    pub workers: usize,

    /// Queries that completed
    pub queries: usize,

    /// Pool statistics after close
    pub stats: PoolStats,
}

/// Run `config.workers` concurrent workers against `pool`, then close it.
///
/// Each worker waits a random delay, checks out a connection, holds it for a
/// random query time and returns it.
pub fn run<P>(pool: Arc<P>, config: &DemoConfig) -> DemoReport
where
    P: Pool<DbConnection>,
{
    let max_delay = config.max_delay_ms.max(1);
    let query_ms = config.query_ms.max(1);

    let workers: Vec<_> = (0..config.workers)
        .map(|_| {
            let pool = Arc::clone(&pool);
            thread::spawn(move || {
                let mut rng = rand::thread_rng();
                thread::sleep(Duration::from_millis(rng.gen_range(0..max_delay)));
                perform_query(&pool, rng.gen_range(0..query_ms))
            })
        })
        .collect();

    let queries = workers
        .into_iter()
        .filter_map(|worker| worker.join().ok())
        .filter(|completed| *completed)
        .count();

    pool.close();

    DemoReport {
        workers: config.workers,
        queries,
        stats: pool.stats(),
    }
}

fn perform_query<P: Pool<DbConnection>>(pool: &Arc<P>, query_ms: u64) -> bool {
    let conn = match pool.checkout() {
        Ok(conn) => conn,
        Err(e) => {
            warn!("Could not acquire connection: {}", e);
            return false;
        }
    };

    thread::sleep(Duration::from_millis(query_ms));
    println!("Querying DB using connection [{}]", conn.id);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use cistern_pool::{BoundedPool, ResourcePool};

    fn quick_config(workers: usize) -> DemoConfig {
        DemoConfig {
            workers,
            max_delay_ms: 5,
            query_ms: 2,
        }
    }

    #[test]
    fn test_soft_pool_demo_accounts_for_every_connection() {
        let factory = Arc::new(ConnectionFactory::default());
        let opener = Arc::clone(&factory);
        let pool = Arc::new(ResourcePool::new(2, move || opener.open()).unwrap());

        let report = run(pool, &quick_config(20));

        assert_eq!(report.queries, 20);
        assert_eq!(report.stats.created as u32, factory.opened());
        assert_eq!(report.stats.closed(), report.stats.created);
        assert_eq!(report.stats.outstanding(), 0);
    }

    #[test]
    fn test_bounded_pool_demo_never_exceeds_size() {
        let factory = Arc::new(ConnectionFactory::default());
        let opener = Arc::clone(&factory);
        let pool = Arc::new(
            BoundedPool::new(2, Duration::from_secs(5), move || opener.open()).unwrap(),
        );

        let report = run(pool, &quick_config(20));

        assert_eq!(report.queries, 20);
        assert!(factory.opened() <= 2);
        assert_eq!(report.stats.closed(), report.stats.created);
    }
}
