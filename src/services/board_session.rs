use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc, watch, Mutex};

use crate::config::Config;
use crate::domain::{BoardError, DragItem};
use crate::engine::{
    BoardAction, BoardEngine, BoardEvent, BoardSnapshot, DragEffects, Notification,
    PersistOutcome, PersistRequest, RollbackPolicy,
};
use crate::services::{BoardSource, CardColumnPersister};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSettings {
    pub persist_timeout: Duration,
    pub refresh_after_persist: bool,
    pub rollback: RollbackPolicy,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            persist_timeout: Duration::from_secs(10),
            refresh_after_persist: true,
            rollback: RollbackPolicy::Rollback,
        }
    }
}

impl From<&Config> for SessionSettings {
    fn from(config: &Config) -> Self {
        Self {
            persist_timeout: Duration::from_millis(config.persist_timeout_ms),
            refresh_after_persist: config.refresh_after_persist,
            rollback: if config.rollback_on_failure {
                RollbackPolicy::Rollback
            } else {
                RollbackPolicy::KeepOptimistic
            },
        }
    }
}

struct SessionCore {
    engine: Mutex<BoardEngine>,
    source: Arc<dyn BoardSource>,
    events: broadcast::Sender<String>,
    settings: SessionSettings,
    /// Persistence calls and scheduled refreshes not yet finished.
    busy: watch::Sender<usize>,
    refresh_scheduled: AtomicBool,
}

/// One live board: the engine plus the tasks that persist and refresh it.
///
/// Gestures lock the engine, apply synchronously, and spawn persistence
/// without awaiting it. Outcomes come back over a channel to a single loop,
/// and refreshes they trigger run on a separate worker.
#[derive(Clone)]
pub struct BoardSession {
    core: Arc<SessionCore>,
    persister: Arc<dyn CardColumnPersister>,
    outcome_tx: mpsc::UnboundedSender<PersistOutcome>,
    refresh_tx: mpsc::UnboundedSender<()>,
}

impl std::fmt::Debug for BoardSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoardSession")
            .field("settings", &self.core.settings)
            .finish_non_exhaustive()
    }
}

impl BoardSession {
    pub async fn load(
        source: Arc<dyn BoardSource>,
        persister: Arc<dyn CardColumnPersister>,
        settings: SessionSettings,
        events: broadcast::Sender<String>,
    ) -> Result<Self, BoardError> {
        let (columns, cards) = futures::try_join!(source.get_columns(), source.get_cards())?;
        tracing::info!(
            columns = columns.len(),
            cards = cards.len(),
            "Board loaded"
        );

        let core = Arc::new(SessionCore {
            engine: Mutex::new(BoardEngine::new(columns, cards, settings.rollback)),
            source,
            events,
            settings,
            busy: watch::Sender::new(0),
            refresh_scheduled: AtomicBool::new(false),
        });

        let (outcome_tx, outcome_rx) = mpsc::unbounded_channel();
        let (refresh_tx, refresh_rx) = mpsc::unbounded_channel();
        tokio::spawn(run_outcomes(Arc::clone(&core), outcome_rx, refresh_tx.clone()));
        tokio::spawn(run_refreshes(Arc::clone(&core), refresh_rx));

        Ok(Self {
            core,
            persister,
            outcome_tx,
            refresh_tx,
        })
    }

    pub async fn snapshot(&self) -> BoardSnapshot {
        self.core.engine.lock().await.snapshot()
    }

    pub async fn notifications(&self) -> Vec<Notification> {
        self.core.engine.lock().await.notifications().to_vec()
    }

    pub async fn begin_drag(&self, item: &DragItem) -> bool {
        let picked = self.core.engine.lock().await.begin_drag(item);
        tracing::debug!(?item, picked, "Drag started");
        picked
    }

    pub async fn drag_over(&self, active: &DragItem, over: &DragItem) -> DragEffects {
        let effects = {
            let mut engine = self.core.engine.lock().await;
            let effects = engine.drag_over(active, over);
            self.core.publish_actions(&engine, &effects.actions);
            effects
        };
        self.dispatch(&effects.persist);
        effects
    }

    pub async fn end_drag(&self, active: &DragItem, over: Option<&DragItem>) -> DragEffects {
        let (effects, refresh) = {
            let mut engine = self.core.engine.lock().await;
            let effects = engine.end_drag(active, over);
            self.core.publish_actions(&engine, &effects.actions);
            let refresh = engine.take_refresh_request() && self.core.settings.refresh_after_persist;
            (effects, refresh)
        };
        if refresh {
            self.core.schedule_refresh(&self.refresh_tx);
        }
        effects
    }

    pub async fn cancel_drag(&self) {
        let refresh = {
            let mut engine = self.core.engine.lock().await;
            engine.cancel_drag();
            engine.take_refresh_request() && self.core.settings.refresh_after_persist
        };
        tracing::debug!("Drag cancelled");
        if refresh {
            self.core.schedule_refresh(&self.refresh_tx);
        }
    }

    pub async fn refresh(&self) -> Result<(), BoardError> {
        self.core.refresh().await
    }

    /// Waits until every dispatched persistence call has been applied and
    /// the refreshes it triggered have finished.
    pub async fn wait_idle(&self) {
        let mut busy = self.core.busy.subscribe();
        if busy.wait_for(|pending| *pending == 0).await.is_err() {
            tracing::debug!("Board session closed while waiting for idle");
        }
    }

    fn dispatch(&self, requests: &[PersistRequest]) {
        for request in requests.iter().cloned() {
            let persister = Arc::clone(&self.persister);
            let outcome_tx = self.outcome_tx.clone();
            let timeout = self.core.settings.persist_timeout;
            self.core.begin_work();

            tokio::spawn(async move {
                let result = tokio::time::timeout(
                    timeout,
                    persister.persist_card_column(&request.card_id, request.column_id),
                )
                .await;

                let outcome = match result {
                    Ok(Ok(())) => {
                        tracing::debug!(
                            card_id = request.card_id.as_str(),
                            column_id = request.column_id,
                            "Lead stage persisted"
                        );
                        PersistOutcome::success(&request)
                    }
                    Ok(Err(e)) => {
                        tracing::warn!(
                            card_id = request.card_id.as_str(),
                            column_id = request.column_id,
                            error = %e,
                            "Failed to persist lead stage"
                        );
                        PersistOutcome::failure(&request, e.to_string())
                    }
                    Err(_) => {
                        tracing::warn!(
                            card_id = request.card_id.as_str(),
                            timeout_ms = timeout.as_millis() as u64,
                            "Persisting lead stage timed out"
                        );
                        PersistOutcome::failure(
                            &request,
                            format!("timed out after {}ms", timeout.as_millis()),
                        )
                    }
                };

                if outcome_tx.send(outcome).is_err() {
                    tracing::warn!("Board session closed before persistence outcome arrived");
                }
            });
        }
    }
}

async fn run_outcomes(
    core: Arc<SessionCore>,
    mut outcome_rx: mpsc::UnboundedReceiver<PersistOutcome>,
    refresh_tx: mpsc::UnboundedSender<()>,
) {
    while let Some(outcome) = outcome_rx.recv().await {
        let refresh = {
            let mut engine = core.engine.lock().await;
            let applied = engine.apply_outcome(&outcome);

            core.publish(&BoardEvent::PersistResolved {
                card_id: outcome.card_id.clone(),
                op_id: outcome.op_id,
                status: engine.card_status(&outcome.card_id),
                error: outcome.error.clone(),
            });
            if let Some(action) = &applied.rollback {
                core.publish_actions(&engine, std::slice::from_ref(action));
            }
            if let Some(notification) = applied.notification {
                core.publish(&BoardEvent::NotificationCreated { notification });
            }

            engine.take_refresh_request() && core.settings.refresh_after_persist
        };

        if refresh {
            core.schedule_refresh(&refresh_tx);
        }
        core.end_work();
    }
    tracing::debug!("Persistence outcome loop stopped");
}

/// Runs refreshes requested by outcomes and drops, one at a time.
async fn run_refreshes(core: Arc<SessionCore>, mut refresh_rx: mpsc::UnboundedReceiver<()>) {
    while refresh_rx.recv().await.is_some() {
        // Requests arriving from here on need a fetch of their own.
        core.refresh_scheduled.store(false, Ordering::Release);
        if let Err(e) = core.refresh().await {
            tracing::debug!(error = %e, "Scheduled refresh did not complete");
        }
        core.end_work();
    }
    tracing::debug!("Refresh worker stopped");
}

impl SessionCore {
    async fn refresh(&self) -> Result<(), BoardError> {
        let mark = self.engine.lock().await.ledger_mark();
        match futures::try_join!(self.source.get_columns(), self.source.get_cards()) {
            Ok((columns, cards)) => {
                let mut engine = self.engine.lock().await;
                if engine.is_dragging() {
                    tracing::debug!("Deferring refresh until the active drag ends");
                    engine.request_refresh();
                    return Ok(());
                }
                let overridden = engine.apply_refresh(columns, cards, mark);
                self.publish(&BoardEvent::BoardRefreshed {
                    columns: engine.columns().len(),
                    cards: engine.cards().len(),
                });
                tracing::debug!(overridden, in_flight = engine.in_flight(), "Board refreshed");
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, "Board refresh failed");
                let notification = Notification::error("Error", format!("Could not refresh board: {}", e));
                self.engine.lock().await.notify(notification.clone());
                self.publish(&BoardEvent::NotificationCreated { notification });
                Err(e)
            }
        }
    }

    /// Queues one refresh; requests made before it starts share it.
    fn schedule_refresh(&self, refresh_tx: &mpsc::UnboundedSender<()>) {
        if self.refresh_scheduled.swap(true, Ordering::AcqRel) {
            return;
        }
        self.begin_work();
        if refresh_tx.send(()).is_err() {
            tracing::warn!("Refresh worker stopped; dropping refresh request");
            self.refresh_scheduled.store(false, Ordering::Release);
            self.end_work();
        }
    }

    fn begin_work(&self) {
        self.busy.send_modify(|pending| *pending += 1);
    }

    fn end_work(&self) {
        self.busy.send_modify(|pending| *pending = pending.saturating_sub(1));
    }

    fn publish_actions(&self, engine: &BoardEngine, actions: &[BoardAction]) {
        for action in actions {
            let event = match action {
                BoardAction::ColumnMoved { .. } => BoardEvent::ColumnsReordered {
                    column_ids: engine.columns().iter().map(|c| c.id).collect(),
                },
                BoardAction::CardMoved { from, to } => BoardEvent::CardMoved {
                    card_id: engine
                        .cards()
                        .get(*to)
                        .map(|c| c.id.clone())
                        .unwrap_or_default(),
                    from: *from,
                    to: *to,
                },
                BoardAction::CardReassigned { card_id, column_id } => BoardEvent::CardReassigned {
                    card_id: card_id.clone(),
                    column_id: *column_id,
                },
            };
            self.publish(&event);
        }
    }

    fn publish(&self, event: &BoardEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = self.events.send(payload);
        }
    }
}
