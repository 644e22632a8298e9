//! # Engine and Tenant Sessions
//!
//! [`Engine`] holds what every operation needs: the database, the clock,
//! the authorizer and the retry policy. A [`TenantSession`] binds it to one
//! business and one calling user; the component operations live on the
//! session (see `ledger`, `movements`, `fulfillment`, `payments`,
//! `refunds`, `catalog`).
//!
//! ## Shape of an Operation
//! ```text
//! session.create_order(input)
//!     │
//!     ├── authorize(user, CreateOrder, business) ── no ──► PermissionDenied
//!     ├── validate input                        ── bad ──► Validation
//!     │
//!     └── retry policy ─┬─► begin TenantTx
//!                       │      reads, core rules, guarded writes
//!                       │   commit
//!                       └── Contention? roll back, back off, run again
//! ```

use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::auth::{Action, AllowAll, Authorizer};
use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::retry::RetryPolicy;
use tally_core::validation::validate_name;
use tally_core::{Business, Clock, SystemClock};
use tally_db::{Database, TenantScope, TenantTx};

// =============================================================================
// Engine
// =============================================================================

/// Shared engine handle. Cheap to clone.
#[derive(Clone)]
pub struct Engine {
    db: Database,
    clock: Arc<dyn Clock>,
    authorizer: Arc<dyn Authorizer>,
    retry: RetryPolicy,
}

impl Engine {
    /// Creates an engine over an open database with the system clock, no
    /// authorization restrictions and the default retry policy.
    pub fn new(db: Database) -> Self {
        Engine {
            db,
            clock: Arc::new(SystemClock),
            authorizer: Arc::new(AllowAll),
            retry: RetryPolicy::default(),
        }
    }

    /// Opens the database described by `config` and builds an engine on it.
    pub async fn connect(config: &EngineConfig) -> EngineResult<Self> {
        let db = Database::new(config.db_config()).await?;
        Ok(Engine::new(db).with_retry(config.retry_policy()))
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_authorizer(mut self, authorizer: Arc<dyn Authorizer>) -> Self {
        self.authorizer = authorizer;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Registers a new tenant.
    pub async fn register_business(&self, name: &str) -> EngineResult<Business> {
        validate_name("business name", name)?;
        let business = self.db.businesses().create(name.trim(), self.clock.now()).await?;
        info!(business_id = %business.id, name = %business.name, "Business registered");
        Ok(business)
    }

    /// Binds the engine to one business and one calling user.
    pub fn for_tenant(&self, business_id: impl Into<String>, user_id: impl Into<String>) -> TenantSession {
        TenantSession {
            engine: self.clone(),
            scope: self.db.tenant(business_id),
            user_id: user_id.into(),
        }
    }
}

// =============================================================================
// Tenant Session
// =============================================================================

/// The engine as seen by one user of one business.
///
/// Every read and write goes through the session's tenant scope, so no
/// operation can reach another business's rows.
#[derive(Clone)]
pub struct TenantSession {
    engine: Engine,
    scope: TenantScope,
    user_id: String,
}

impl TenantSession {
    pub fn business_id(&self) -> &str {
        self.scope.business_id()
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub(crate) fn scope(&self) -> &TenantScope {
        &self.scope
    }

    pub(crate) fn now(&self) -> DateTime<Utc> {
        self.engine.clock.now()
    }

    /// Fails with `PermissionDenied` unless the authorizer allows `action`.
    pub(crate) fn authorize(&self, action: Action) -> EngineResult<()> {
        if self
            .engine
            .authorizer
            .can_perform(&self.user_id, action, self.business_id())
        {
            return Ok(());
        }

        debug!(user_id = %self.user_id, action = %action, business_id = %self.business_id(), "Permission denied");
        Err(EngineError::PermissionDenied {
            user_id: self.user_id.clone(),
            action,
            business_id: self.business_id().to_string(),
        })
    }

    /// Opens a transaction bound to the session's business.
    pub(crate) async fn begin(&self) -> EngineResult<TenantTx> {
        Ok(self.scope.begin().await?)
    }

    /// Runs one transactional attempt under the engine's retry policy.
    pub(crate) async fn retrying<T, F, Fut>(&self, operation: &str, attempt: F) -> EngineResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = EngineResult<T>>,
    {
        self.engine.retry.run(operation, attempt).await
    }
}
