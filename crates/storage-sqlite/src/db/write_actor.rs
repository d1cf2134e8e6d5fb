use super::DbPool;
use crate::errors::StorageError;
use diesel::SqliteConnection;
use log::{error, warn};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, oneshot};
use retailpos_core::errors::{Error, Result};

// Type alias for the job to be executed by the writer actor.
// We use core::Result here since that's what callers expect.
type Job<T> = Box<dyn FnOnce(&mut SqliteConnection) -> Result<T> + Send + 'static>;

type ErasedJob = Job<Box<dyn Any + Send + 'static>>;
type Reply = oneshot::Sender<Result<Box<dyn Any + Send + 'static>>>;

struct Envelope {
    job: ErasedJob,
    reply: Reply,
    enqueued_at: Instant,
    /// Longest time the job may wait for the write lock before it is refused.
    max_wait: Option<Duration>,
}

/// Handle for sending jobs to the writer actor.
#[derive(Clone)]
pub struct WriteHandle {
    tx: mpsc::Sender<Envelope>,
}

impl WriteHandle {
    /// Executes a database job on the writer actor's dedicated connection,
    /// inside an immediate transaction. The job's `Err` rolls it back.
    pub async fn exec<F, T>(&self, job: F) -> Result<T>
    where
        F: FnOnce(&mut SqliteConnection) -> Result<T> + Send + 'static,
        T: Send + 'static + Any,
    {
        self.submit(job, None).await
    }

    /// Like [`exec`](Self::exec), but a job still queued after `max_wait` is
    /// refused with `ConcurrencyConflict` without touching the database.
    ///
    /// There is no caller-side timeout: once a job starts, its outcome is
    /// always reported, so a commit is never mistaken for a failure.
    pub async fn exec_with_deadline<F, T>(&self, max_wait: Duration, job: F) -> Result<T>
    where
        F: FnOnce(&mut SqliteConnection) -> Result<T> + Send + 'static,
        T: Send + 'static + Any,
    {
        self.submit(job, Some(max_wait)).await
    }

    async fn submit<F, T>(&self, job: F, max_wait: Option<Duration>) -> Result<T>
    where
        F: FnOnce(&mut SqliteConnection) -> Result<T> + Send + 'static,
        T: Send + 'static + Any,
    {
        let (ret_tx, ret_rx) = oneshot::channel();

        self.tx
            .send(Envelope {
                job: Box::new(move |c| job(c).map(|v| Box::new(v) as Box<dyn Any + Send>)),
                reply: ret_tx,
                enqueued_at: Instant::now(),
                max_wait,
            })
            .await
            .map_err(|_| Error::Unexpected("Database writer has stopped".to_string()))?;

        let boxed = ret_rx.await.map_err(|_| {
            Error::Unexpected("Database writer dropped a job without replying".to_string())
        })??;
        boxed
            .downcast::<T>()
            .map(|v| *v)
            .map_err(|_| Error::Unexpected("Writer result had an unexpected type".to_string()))
    }
}

/// Spawns a background Tokio task that acts as a single writer to the database.
/// This actor owns one database connection from the pool and processes write jobs serially.
pub fn spawn_writer(pool: DbPool) -> WriteHandle {
    // The channel is bounded; 1024 is an arbitrary size.
    let (tx, mut rx) = mpsc::channel::<Envelope>(1024);

    tokio::spawn(async move {
        // Held for the lifetime of the actor.
        let mut conn = match pool.get() {
            Ok(conn) => conn,
            Err(e) => {
                error!("Database writer could not acquire a connection: {}", e);
                while let Some(envelope) = rx.recv().await {
                    let _ = envelope.reply.send(Err(Error::Unexpected(format!(
                        "Database writer unavailable: {}",
                        e
                    ))));
                }
                return;
            }
        };

        while let Some(Envelope {
            job,
            reply,
            enqueued_at,
            max_wait,
        }) = rx.recv().await
        {
            if let Some(max_wait) = max_wait {
                let waited = enqueued_at.elapsed();
                if waited > max_wait {
                    warn!(
                        "Refusing write job after waiting {:?} for the write lock (limit {:?})",
                        waited, max_wait
                    );
                    let _ = reply.send(Err(Error::ConcurrencyConflict(format!(
                        "write lock not acquired within {} ms",
                        max_wait.as_millis()
                    ))));
                    continue;
                }
            }

            let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                conn.immediate_transaction::<_, StorageError, _>(|c| {
                    job(c).map_err(StorageError::from)
                })
            }));

            let result: Result<Box<dyn Any + Send + 'static>> = match outcome {
                Ok(result) => result.map_err(Error::from),
                Err(_) => {
                    // The unwound transaction is still open on this connection;
                    // the pool discards it as broken once it is dropped.
                    error!("Database write job panicked; replacing the writer connection");
                    match pool.get() {
                        Ok(fresh) => conn = fresh,
                        Err(e) => error!("Database writer could not replace its connection: {}", e),
                    }
                    Err(Error::Unexpected("Database write job panicked".to_string()))
                }
            };

            // Ignore error if the receiver has dropped (e.g., request was cancelled).
            let _ = reply.send(result);
        }
    });

    WriteHandle { tx }
}
