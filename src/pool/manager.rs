use super::Config;
use crate::Error;
use crate::Result;
use std::ops::Deref;
use std::ops::DerefMut;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use tokio::sync::Notify;
use tokio::sync::OwnedSemaphorePermit;
use tokio::sync::Semaphore;
use tokio_postgres::Client;
use tokio_postgres::NoTls;

/// Bounded connection pool with scoped acquisition.
///
/// Cheap to clone; every clone shares the same pool. At most `max_size`
/// connections are live at once, idle connections are reused LIFO, and
/// callers suspend when everything is checked out. Teardown is explicit:
/// [`close`](Pool::close) then [`wait_closed`](Pool::wait_closed).
#[derive(Clone)]
pub struct Pool {
    shared: Arc<Shared>,
}

struct Shared {
    config: Config,
    idle: Mutex<Vec<Client>>,
    gate: Arc<Semaphore>,
    checked_out: AtomicUsize,
    closed: AtomicBool,
    drained: Notify,
}

impl std::fmt::Debug for Pool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pool")
            .field("config", &self.shared.config)
            .field("checked_out", &self.shared.checked_out)
            .field("closed", &self.shared.closed)
            .finish()
    }
}

/// Scoped handle to one pooled connection.
///
/// Dereferences to [`tokio_postgres::Client`]. Dropping the guard returns
/// the connection to the pool on every exit path, including cancellation;
/// broken connections are discarded instead of pooled.
pub struct Conn {
    client: Option<Client>,
    shared: Arc<Shared>,
    _permit: OwnedSemaphorePermit,
}

impl Pool {
    /// Validates configuration and opens `min_size` connections eagerly.
    pub async fn init(config: Config) -> Result<Self> {
        config.validate()?;
        log::info!(
            "creating connection pool ({}..{} connections)",
            config.min_size,
            config.max_size
        );
        let mut warm = Vec::with_capacity(config.min_size);
        for _ in 0..config.min_size {
            warm.push(connect(&config).await?);
        }
        Ok(Self {
            shared: Arc::new(Shared {
                gate: Arc::new(Semaphore::new(config.max_size)),
                idle: Mutex::new(warm),
                checked_out: AtomicUsize::new(0),
                closed: AtomicBool::new(false),
                drained: Notify::new(),
                config,
            }),
        })
    }

    /// Checks one connection out of the pool.
    ///
    /// Suspends while all `max_size` connections are checked out. With an
    /// `acquire_timeout` configured the wait is bounded and fails with
    /// [`Error::Exhausted`]; otherwise it is indefinite. Fails with
    /// [`Error::Closed`] once the pool is torn down, including for callers
    /// already suspended when teardown happens.
    pub async fn acquire(&self) -> Result<Conn> {
        if self.shared.closed.load(Ordering::Acquire) {
            return Err(Error::Closed);
        }
        let gate = Arc::clone(&self.shared.gate);
        let permit = match self.shared.config.acquire_timeout {
            Some(bound) => tokio::time::timeout(bound, gate.acquire_owned())
                .await
                .map_err(|_| Error::Exhausted(bound))?
                .map_err(|_| Error::Closed)?,
            None => gate.acquire_owned().await.map_err(|_| Error::Closed)?,
        };
        let reused = self.shared.idle.lock().expect("idle lock").pop();
        let client = match reused {
            Some(client) => client,
            None => connect(&self.shared.config).await?,
        };
        self.shared.checked_out.fetch_add(1, Ordering::AcqRel);
        Ok(Conn {
            client: Some(client),
            shared: Arc::clone(&self.shared),
            _permit: permit,
        })
    }

    /// Marks the pool closed, wakes suspended `acquire` calls with
    /// [`Error::Closed`], and drops every idle connection.
    pub fn close(&self) {
        self.shared.closed.store(true, Ordering::Release);
        self.shared.gate.close();
        self.shared.idle.lock().expect("idle lock").clear();
        self.shared.drained.notify_waiters();
        log::info!("connection pool closed");
    }

    /// Suspends until every checked-out connection has been returned.
    pub async fn wait_closed(&self) {
        loop {
            let drained = self.shared.drained.notified();
            if self.shared.checked_out.load(Ordering::Acquire) == 0 {
                break;
            }
            drained.await;
        }
    }

    pub fn config(&self) -> &Config {
        &self.shared.config
    }
}

impl Drop for Conn {
    fn drop(&mut self) {
        if let Some(client) = self.client.take() {
            let reusable =
                !self.shared.closed.load(Ordering::Acquire) && !client.is_closed();
            if reusable {
                self.shared.idle.lock().expect("idle lock").push(client);
            }
        }
        self.shared.checked_out.fetch_sub(1, Ordering::AcqRel);
        self.shared.drained.notify_waiters();
    }
}

impl Deref for Conn {
    type Target = Client;
    fn deref(&self) -> &Client {
        self.client.as_ref().expect("live connection")
    }
}
impl DerefMut for Conn {
    fn deref_mut(&mut self) -> &mut Client {
        self.client.as_mut().expect("live connection")
    }
}

/// Opens one connection, spawns its driver task, and applies the
/// configured client encoding.
async fn connect(config: &Config) -> Result<Client> {
    let mut pg = tokio_postgres::Config::new();
    pg.host(&config.host).port(config.port);
    if let Some(user) = &config.user {
        pg.user(user);
    }
    if let Some(password) = &config.password {
        pg.password(password);
    }
    if let Some(database) = &config.database {
        pg.dbname(database);
    }
    let (client, connection) = pg.connect(NoTls).await.map_err(Error::Connect)?;
    tokio::spawn(connection);
    client
        .execute(
            format!("SET client_encoding TO '{}'", config.charset).as_str(),
            &[],
        )
        .await
        .map_err(Error::Connect)?;
    Ok(client)
}
