//! Walks a [`GraphDefinition`] against one conversation.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use uuid::Uuid;

use super::definition::{GraphDefinition, Step, Target};
use super::events::{RunEventEmitter, RunEventPayload, RunEventSink};
use super::steps::StepContext;
use crate::config::DEFAULT_MAX_HOPS;
use crate::error::{BotError, Result};
use crate::types::MessageHistory;

/// External stop signal for one run.
///
/// Checked before every step. A model or tool call already in flight is not
/// interrupted; it is bounded by the HTTP client timeout instead.
#[derive(Debug, Clone, Default)]
pub struct RunControl {
    cancel: CancellationToken,
    deadline: Option<Instant>,
}

impl RunControl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: CancellationToken) -> Self {
        Self {
            cancel: token,
            deadline: None,
        }
    }

    /// Stop starting new steps once `timeout` has elapsed from now.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.deadline = Some(Instant::now() + timeout);
        self
    }

    pub fn token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_stopped(&self) -> bool {
        self.cancel.is_cancelled() || self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    fn check(&self, before: Step) -> Result<()> {
        if self.is_stopped() {
            return Err(BotError::Canceled {
                before: before.to_string(),
            });
        }
        Ok(())
    }
}

/// Runs the graph. Cheap to share: holds only read-only state, so one
/// executor serves any number of concurrent invocations.
#[derive(Clone)]
pub struct Executor {
    graph: Arc<GraphDefinition>,
    ctx: StepContext,
    max_hops: usize,
    event_sink: Option<RunEventSink>,
}

impl Executor {
    pub fn new(graph: Arc<GraphDefinition>, ctx: StepContext) -> Self {
        Self {
            graph,
            ctx,
            max_hops: DEFAULT_MAX_HOPS,
            event_sink: None,
        }
    }

    /// Maximum number of step executions per run. Must be at least 1; a
    /// zero limit is rejected as a configuration error when a run starts.
    pub fn with_max_hops(mut self, max_hops: usize) -> Self {
        self.max_hops = max_hops;
        self
    }

    pub fn with_event_sink(mut self, sink: RunEventSink) -> Self {
        self.event_sink = Some(sink);
        self
    }

    pub fn max_hops(&self) -> usize {
        self.max_hops
    }

    pub fn graph(&self) -> &GraphDefinition {
        &self.graph
    }

    pub async fn invoke(&self, initial: MessageHistory) -> Result<MessageHistory> {
        self.invoke_with(initial, &RunControl::default()).await
    }

    pub async fn invoke_with(
        &self,
        initial: MessageHistory,
        control: &RunControl,
    ) -> Result<MessageHistory> {
        let run_id = Uuid::new_v4();
        let emitter = RunEventEmitter::new(run_id, self.event_sink.clone());
        emitter.emit(RunEventPayload::Started);
        debug!(%run_id, max_hops = self.max_hops, "run start");

        let result = self.drive(initial, control, &emitter).await;

        match &result {
            Ok(history) => {
                info!(%run_id, history_len = history.len(), "run completed");
                emitter.emit(RunEventPayload::Completed {
                    history_len: history.len(),
                });
            }
            Err(BotError::Canceled { before }) => {
                info!(%run_id, before = %before, "run canceled");
                emitter.emit(RunEventPayload::Canceled);
            }
            Err(err) => {
                info!(%run_id, error = %err, "run failed");
                emitter.emit(RunEventPayload::Failed {
                    error: err.to_string(),
                });
            }
        }
        result
    }

    async fn drive(
        &self,
        mut history: MessageHistory,
        control: &RunControl,
        emitter: &RunEventEmitter,
    ) -> Result<MessageHistory> {
        if self.max_hops == 0 {
            return Err(BotError::Configuration(
                "max_hops must be a positive integer, got '0'".into(),
            ));
        }
        if history.is_empty() {
            return Err(BotError::EmptyHistory);
        }

        let mut current = self.graph.start();
        let mut hops = 0usize;

        loop {
            control.check(current)?;
            if hops >= self.max_hops {
                return Err(BotError::GraphExecutionLimitExceeded {
                    max_hops: self.max_hops,
                });
            }
            hops += 1;

            emitter.emit(RunEventPayload::StepStarted { step: current });
            let message = self.ctx.run(current, &history).await?;
            debug!(
                step = %current,
                hop = hops,
                role = ?message.role(),
                tool_calls = message.tool_calls().len(),
                "step complete"
            );
            emitter.emit(RunEventPayload::StepCompleted {
                step: current,
                message: message.clone(),
            });
            history.append(message);

            let (target, label) = self.graph.next(current, &history)?;
            if let Some(label) = label {
                debug!(from = %current, label = %label, to = %target, "routed");
                emitter.emit(RunEventPayload::Routed {
                    from: current,
                    label,
                    to: target,
                });
            }

            match target {
                Target::Terminal => return Ok(history),
                Target::Step(next) => current = next,
            }
        }
    }
}
