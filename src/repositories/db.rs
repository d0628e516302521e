use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use futures::future::{FutureExt, Shared};
use mongodb::bson::doc;
use mongodb::options::{ClientOptions, ResolverConfig};
use mongodb::{Client, Database as MongoDatabase, IndexModel};
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use tracing::info;

use crate::config::Config;

pub type ConnectFuture<T> = Pin<Box<dyn Future<Output = Result<Arc<T>, String>> + Send>>;

pub trait Connector: Send + Sync {
    type Conn: Send + Sync + 'static;
    fn connect(&self) -> ConnectFuture<Self::Conn>;
}

type SharedAttempt<T> = Shared<ConnectFuture<T>>;

struct CacheState<T> {
    conn: Option<Arc<T>>,
    pending: Option<SharedAttempt<T>>,
    epoch: u64,
}

/// Lazily established, process-wide connection handle. Concurrent callers
/// that arrive while a connect is in flight await that same attempt instead
/// of opening their own. A failed attempt leaves no state behind, so the
/// next caller starts fresh.
pub struct ConnectionCache<C: Connector> {
    connector: C,
    state: Mutex<CacheState<C::Conn>>,
}

impl<C: Connector> ConnectionCache<C> {
    pub fn new(connector: C) -> Self {
        Self {
            connector,
            state: Mutex::new(CacheState {
                conn: None,
                pending: None,
                epoch: 0,
            }),
        }
    }

    pub async fn ensure(&self) -> Result<Arc<C::Conn>, String> {
        let (attempt, epoch) = {
            let mut state = self.state.lock();
            if let Some(conn) = state.conn.clone() {
                return Ok(conn);
            }
            match state.pending.clone() {
                Some(attempt) => (attempt, state.epoch),
                None => {
                    state.epoch += 1;
                    let attempt = self.connector.connect().shared();
                    state.pending = Some(attempt.clone());
                    (attempt, state.epoch)
                }
            }
        };

        let result = attempt.await;

        let mut state = self.state.lock();
        // Epoch guard: a late awaiter of an older attempt must not clobber
        // the state of a newer one.
        if state.epoch == epoch {
            state.pending = None;
            if let Ok(conn) = &result {
                state.conn = Some(conn.clone());
            }
        }
        result
    }

    pub fn invalidate(&self) {
        let mut state = self.state.lock();
        state.conn = None;
        state.pending = None;
        state.epoch += 1;
    }
}

pub struct MongoConnector;

impl Connector for MongoConnector {
    type Conn = MongoDatabase;

    fn connect(&self) -> ConnectFuture<MongoDatabase> {
        let cfg = Config::get();
        Box::pin(async move {
            let connection_string = if !cfg.mongodb_uri.trim().is_empty() {
                cfg.mongodb_uri.clone()
            } else {
                let cred = if !cfg.mongodb_username.is_empty() && !cfg.mongodb_password.is_empty() {
                    format!(
                        "{}:{}@",
                        urlencoding::encode(&cfg.mongodb_username),
                        urlencoding::encode(&cfg.mongodb_password)
                    )
                } else {
                    "".to_string()
                };
                format!(
                    "mongodb://{}{}:{}/{}",
                    cred, cfg.mongodb_host, cfg.mongodb_port, cfg.mongodb_database
                )
            };

            let mut options = ClientOptions::parse_with_resolver_config(
                &connection_string,
                ResolverConfig::cloudflare(),
            )
            .await
            .map_err(|e| format!("mongodb parse options failed: {e}"))?;
            options.max_pool_size = Some(5);
            options.server_selection_timeout = Some(Duration::from_secs(10));

            let client =
                Client::with_options(options).map_err(|e| format!("mongodb client failed: {e}"))?;
            let db = client.database(&cfg.mongodb_database);

            let existing = db
                .list_collection_names(None)
                .await
                .map_err(|e| format!("mongodb list collections failed: {e}"))?;
            if !existing.contains(&"summaries".to_string()) {
                let _ = db.create_collection("summaries", None).await;
            }
            let _ = db
                .collection::<mongodb::bson::Document>("summaries")
                .create_index(
                    IndexModel::builder().keys(doc! { "created_at": -1 }).build(),
                    None,
                )
                .await;

            info!("MongoDB connected");
            Ok(Arc::new(db))
        })
    }
}

static DB_CACHE: Lazy<ConnectionCache<MongoConnector>> =
    Lazy::new(|| ConnectionCache::new(MongoConnector));

pub async fn ensure_database() -> Result<Arc<MongoDatabase>, String> {
    DB_CACHE.ensure().await
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    struct CountingConnector {
        attempts: AtomicUsize,
        fail_first: usize,
        delay: Duration,
    }

    impl CountingConnector {
        fn new(fail_first: usize, delay: Duration) -> Self {
            Self {
                attempts: AtomicUsize::new(0),
                fail_first,
                delay,
            }
        }

        fn attempts(&self) -> usize {
            self.attempts.load(Ordering::SeqCst)
        }
    }

    impl Connector for &'static CountingConnector {
        type Conn = usize;

        fn connect(&self) -> ConnectFuture<usize> {
            let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
            let fail = attempt <= self.fail_first;
            let delay = self.delay;
            Box::pin(async move {
                tokio::time::sleep(delay).await;
                if fail {
                    Err(format!("attempt {attempt} refused"))
                } else {
                    Ok(Arc::new(attempt))
                }
            })
        }
    }

    fn leak(connector: CountingConnector) -> &'static CountingConnector {
        Box::leak(Box::new(connector))
    }

    #[tokio::test]
    async fn concurrent_callers_share_one_attempt() {
        let connector = leak(CountingConnector::new(0, Duration::from_millis(30)));
        let cache = ConnectionCache::new(connector);

        let (a, b) = tokio::join!(cache.ensure(), cache.ensure());
        assert_eq!(*a.unwrap(), 1);
        assert_eq!(*b.unwrap(), 1);
        assert_eq!(connector.attempts(), 1);
    }

    #[tokio::test]
    async fn cached_handle_is_reused_without_io() {
        let connector = leak(CountingConnector::new(0, Duration::from_millis(1)));
        let cache = ConnectionCache::new(connector);

        cache.ensure().await.unwrap();
        cache.ensure().await.unwrap();
        cache.ensure().await.unwrap();
        assert_eq!(connector.attempts(), 1);
    }

    #[tokio::test]
    async fn concurrent_callers_share_a_failure() {
        let connector = leak(CountingConnector::new(1, Duration::from_millis(30)));
        let cache = ConnectionCache::new(connector);

        let (a, b) = tokio::join!(cache.ensure(), cache.ensure());
        assert!(a.is_err());
        assert!(b.is_err());
        assert_eq!(connector.attempts(), 1);
    }

    #[tokio::test]
    async fn failure_does_not_poison_the_cache() {
        let connector = leak(CountingConnector::new(1, Duration::from_millis(1)));
        let cache = ConnectionCache::new(connector);

        assert!(cache.ensure().await.is_err());
        let conn = cache.ensure().await.unwrap();
        assert_eq!(*conn, 2);
        assert_eq!(connector.attempts(), 2);
    }

    #[tokio::test]
    async fn invalidate_forces_a_reconnect() {
        let connector = leak(CountingConnector::new(0, Duration::from_millis(1)));
        let cache = ConnectionCache::new(connector);

        cache.ensure().await.unwrap();
        cache.invalidate();
        let conn = cache.ensure().await.unwrap();
        assert_eq!(*conn, 2);
        assert_eq!(connector.attempts(), 2);
    }
}
