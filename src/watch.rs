//! # Watch Service - Continuous Observation and Recomputation
//!
//! The `watch` module provides [`TallyService`], a long-running service that
//! observes a live host document and keeps the facilitator-time summary panel
//! synchronized with session content.
//!
//! ## Overview
//!
//! - **Root lifecycle**: the session activates only once the host view root
//!   exists, and tears down when it disappears
//!   ({INACTIVE} → root found → {ACTIVE} → root removed → {INACTIVE})
//! - **Scoped watching**: mutations are observed on a lightweight scope
//!   disjoint from the subtree the engine writes, so a recompute pass can
//!   never retrigger itself
//! - **Debounced recomputation**: bursts of mutations coalesce into a single
//!   extraction/render cycle via [`DebounceScheduler`]
//! - **Event streaming**: emits [`TallyEvent`]s for host-side observation
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::mpsc::channel;
//! use tally_core::{config::TallyConfig, dom::Document, event::TallyEvent, watch::TallyService};
//!
//! let doc = Document::new("body");
//! let (tx, rx) = channel::<TallyEvent>();
//! let service = TallyService::new(doc.clone(), TallyConfig::default(), tx)?;
//!
//! // The host renders its view into `doc`; once the root marker appears the
//! // service computes the aggregate and inserts the summary panel. Events
//! // arrive on `rx` as cycles request and complete.
//! # drop(service);
//! # drop(rx);
//! # Ok::<(), tally_core::TallyError>(())
//! ```
//!
//! ## Threading Model
//!
//! The service owns its own tokio runtime. A supervisor task watches the
//! whole document for host-root appearance; an active session adds one
//! watcher task draining the scoped mutation subscription. Recompute cycles
//! are synchronous, bounded-time traversals scheduled one-at-a-time by the
//! debouncer, so an extraction pass never overlaps the projector's write.
//!
//! ## Error Handling
//!
//! Best-effort, silent degradation: a participant-time widget must never
//! break the host application. Malformed session content degrades to zero
//! contributions, a missing placement anchor defers rendering, and only an
//! absent host root suppresses the cycle entirely.

use parking_lot::Mutex;
use std::{
    sync::{mpsc::Sender, Arc},
    time::Duration,
};
use tokio::{
    runtime::{Handle, Runtime},
    task::JoinHandle,
};

use crate::{
    config::TallyConfig,
    debounce::DebounceScheduler,
    dom::{Document, NodeId},
    error::TallyError,
    event::{RecomputeReason, TallyEvent},
    extract::extract,
    project::Projector,
    schema::{DocSchema, SCHEMAS},
};

/// Everything one recompute cycle needs, cloneable into scheduled closures.
#[derive(Clone)]
struct CycleContext {
    doc: Document,
    schema: Arc<DocSchema>,
    root: NodeId,
    projector: Arc<Mutex<Projector>>,
    event_tx: Sender<TallyEvent>,
}

impl CycleContext {
    /// Extract, render, place. Never errors; a vanished root makes the whole
    /// cycle a no-op.
    fn run(&self) {
        if !self.doc.is_attached(self.root) {
            tracing::debug!("host root detached before cycle ran, skipping");
            return;
        }
        let aggregate = extract(&self.doc, self.root, &self.schema);
        {
            let mut projector = self.projector.lock();
            projector.sync(&self.doc, &aggregate);
            projector.place(&self.doc);
        }
        let _ = self
            .event_tx
            .send(TallyEvent::AggregateUpdated(aggregate.len()));
    }
}

/// State owned by one active session: constructed when the host root is
/// detected, destroyed when it disappears.
struct Session {
    root: NodeId,
    ctx: CycleContext,
    scheduler: Arc<Mutex<DebounceScheduler>>,
    watcher_handle: JoinHandle<()>,
}

impl Session {
    fn start(
        doc: &Document,
        schema: &Arc<DocSchema>,
        config: &TallyConfig,
        event_tx: &Sender<TallyEvent>,
        handle: &Handle,
        root: NodeId,
    ) -> Session {
        let projector = Arc::new(Mutex::new(Projector::new(
            schema.clone(),
            config.panel_title.clone(),
        )));
        let scheduler = Arc::new(Mutex::new(DebounceScheduler::new(handle.clone())));
        let ctx = CycleContext {
            doc: doc.clone(),
            schema: schema.clone(),
            root,
            projector,
            event_tx: event_tx.clone(),
        };

        // Initial pass runs right away rather than waiting for a mutation.
        {
            let ctx = ctx.clone();
            scheduler.lock().schedule(Duration::ZERO, move || ctx.run());
        }

        // The lightweight watch scope falls back to the host root itself when
        // the host has no such element.
        let scope = doc
            .select_first(doc.root(), &schema.watch_scope)
            .unwrap_or(root);
        let mut mutations = doc.subscribe(scope);

        let debounce = config.debounce();
        let watcher_ctx = ctx.clone();
        let watcher_scheduler = scheduler.clone();
        let watcher_tx = event_tx.clone();
        let watcher_handle = handle.spawn(async move {
            while mutations.recv().await.is_some() {
                // One recompute request per mutation burst, not per record.
                while mutations.try_recv().is_ok() {}
                let _ = watcher_tx.send(TallyEvent::RecomputeRequested(RecomputeReason::Mutation));
                let cycle = watcher_ctx.clone();
                watcher_scheduler
                    .lock()
                    .schedule(debounce, move || cycle.run());
            }
            tracing::debug!("[TallyService] watch scope subscription closed");
        });

        Session {
            root,
            ctx,
            scheduler,
            watcher_handle,
        }
    }

    fn stop(self) {
        self.watcher_handle.abort();
        self.scheduler.lock().cancel();
        // Detach the panel so a later session never leaves a duplicate behind.
        if let Some(panel) = self.ctx.projector.lock().panel() {
            self.ctx.doc.remove(panel);
        }
    }
}

/// Reconcile session state with host-root presence. Called by the supervisor
/// on startup and after every mutation batch at document scope.
fn sync_lifecycle(
    doc: &Document,
    schema: &Arc<DocSchema>,
    config: &TallyConfig,
    event_tx: &Sender<TallyEvent>,
    session: &Mutex<Option<Session>>,
    handle: &Handle,
) {
    let found = doc.select_first(doc.root(), &schema.host_root);
    let mut guard = session.lock();
    let active_root = guard.as_ref().map(|active| active.root);
    match (found, active_root) {
        (Some(root), None) => {
            tracing::info!("[TallyService] host root found, starting session");
            *guard = Some(Session::start(doc, schema, config, event_tx, handle, root));
            let _ = event_tx.send(TallyEvent::SessionStarted);
        }
        (Some(root), Some(active)) if active != root => {
            // The host re-rendered its view with a fresh root node.
            tracing::info!("[TallyService] host root replaced, restarting session");
            if let Some(old) = guard.take() {
                old.stop();
            }
            let _ = event_tx.send(TallyEvent::SessionStopped);
            *guard = Some(Session::start(doc, schema, config, event_tx, handle, root));
            let _ = event_tx.send(TallyEvent::SessionStarted);
        }
        (None, Some(_)) => {
            tracing::info!("[TallyService] host root removed, stopping session");
            if let Some(old) = guard.take() {
                old.stop();
            }
            let _ = event_tx.send(TallyEvent::SessionStopped);
        }
        _ => {}
    }
}

pub struct TallyService {
    doc: Document,
    schema: Arc<DocSchema>,
    config: TallyConfig,
    event_tx: Sender<TallyEvent>,
    session: Arc<Mutex<Option<Session>>>,
    supervisor: JoinHandle<()>,
    // Owns every spawned task; dropped last.
    _runtime: Runtime,
}

impl TallyService {
    pub fn new(
        doc: Document,
        config: TallyConfig,
        event_tx: Sender<TallyEvent>,
    ) -> Result<Self, TallyError> {
        let schema = SCHEMAS.get(&config.schema).ok_or_else(|| {
            TallyError::Schema(format!("unknown document schema '{}'", config.schema))
        })?;

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()?;

        let session: Arc<Mutex<Option<Session>>> = Arc::new(Mutex::new(None));

        let supervisor = {
            let doc = doc.clone();
            let schema = schema.clone();
            let config = config.clone();
            let event_tx = event_tx.clone();
            let session = session.clone();
            let handle = runtime.handle().clone();
            runtime.spawn(async move {
                let mut mutations = doc.subscribe(doc.root());
                // A host view rendered before the service was constructed
                // activates without any further mutation.
                sync_lifecycle(&doc, &schema, &config, &event_tx, &session, &handle);
                while mutations.recv().await.is_some() {
                    while mutations.try_recv().is_ok() {}
                    sync_lifecycle(&doc, &schema, &config, &event_tx, &session, &handle);
                }
            })
        };

        Ok(TallyService {
            doc,
            schema,
            config,
            event_tx,
            session,
            supervisor,
            _runtime: runtime,
        })
    }

    pub fn config(&self) -> &TallyConfig {
        &self.config
    }

    /// Whether a host session is currently active.
    pub fn is_active(&self) -> bool {
        self.session.lock().is_some()
    }

    /// The summary panel node, once a session has rendered one.
    pub fn panel(&self) -> Option<NodeId> {
        let guard = self.session.lock();
        guard
            .as_ref()
            .and_then(|session| session.ctx.projector.lock().panel())
    }

    /// Control-surface click delegation.
    ///
    /// Only two interaction targets matter: the panel's own refresh
    /// affordance (immediate recompute) and a facilitator-reassignment
    /// control inside the host root (debounced recompute). Everything else is
    /// unrelated UI churn and is ignored.
    pub fn notify_click(&self, target: NodeId) {
        let guard = self.session.lock();
        let Some(session) = guard.as_ref() else {
            return;
        };

        if self.doc.closest(target, &self.schema.refresh_control).is_some() {
            let _ = self
                .event_tx
                .send(TallyEvent::RecomputeRequested(RecomputeReason::ManualRefresh));
            let cycle = session.ctx.clone();
            session
                .scheduler
                .lock()
                .schedule(Duration::ZERO, move || cycle.run());
        } else if self.doc.contains(session.root, target)
            && self
                .doc
                .closest(target, &self.schema.reassign_control)
                .and_then(|control| self.doc.closest(control, &self.schema.reassign_scope))
                .is_some()
        {
            let _ = self
                .event_tx
                .send(TallyEvent::RecomputeRequested(RecomputeReason::Reassign));
            let cycle = session.ctx.clone();
            session
                .scheduler
                .lock()
                .schedule(self.config.debounce(), move || cycle.run());
        }
    }

    /// Explicit user-initiated refresh: recompute on the next scheduling
    /// opportunity with no debounce window. A no-op while inactive.
    pub fn refresh(&self) {
        let guard = self.session.lock();
        let Some(session) = guard.as_ref() else {
            tracing::debug!("refresh requested while inactive, ignoring");
            return;
        };
        let _ = self
            .event_tx
            .send(TallyEvent::RecomputeRequested(RecomputeReason::ManualRefresh));
        let cycle = session.ctx.clone();
        session
            .scheduler
            .lock()
            .schedule(Duration::ZERO, move || cycle.run());
    }
}

impl Drop for TallyService {
    fn drop(&mut self) {
        self.supervisor.abort();
        if let Some(session) = self.session.lock().take() {
            session.stop();
        }
    }
}
