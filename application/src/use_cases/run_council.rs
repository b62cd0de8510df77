//! Run Council use case
//!
//! Convenes the council on one question: every worker answers, then the
//! judge aggregates. Two entry points share the same semantics:
//!
//! - [`RunCouncilUseCase::execute`] returns only the final result
//! - [`RunCouncilUseCase::execute_stream`] emits the full [`Event`]
//!   sequence while the run progresses
//!
//! Worker events are always delivered grouped per worker, in council
//! order, whichever [`ExecutionStrategy`] schedules the calls.

use crate::config::{CouncilConfig, ExecutionStrategy, FailurePolicy};
use crate::ports::capability::{AnalysisCapability, CapabilityError};
use crate::ports::event_logger::{EventLogger, NoEventLogger};
use crate::use_cases::judge::{Judge, JudgeError};
use crate::use_cases::worker::{Worker, WorkerEventStream};
use futures::future::join_all;
use futures::stream::{self, StreamExt};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use tribunal_domain::{
    ChatResult, Decision, Event, FreeformResponse, InvocationPayload, Question, RunMode, Verdict,
};

/// Capacity of the channel between a streaming run and its consumer
const EVENT_BUFFER: usize = 64;

/// Errors that can occur during a council run
#[derive(Error, Debug)]
pub enum RunCouncilError {
    #[error("No workers configured")]
    NoWorkers,

    #[error("Worker {worker_id} failed: {source}")]
    Worker {
        worker_id: String,
        #[source]
        source: CapabilityError,
    },

    #[error(transparent)]
    Judge(#[from] JudgeError),
}

/// Final result of a synchronous run
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutput {
    Decision(Decision),
    Chat(ChatResult),
}

impl RunOutput {
    /// The terminal event a streaming run would have ended with
    pub fn into_event(self) -> Event {
        match self {
            RunOutput::Decision(decision) => Event::Final { decision },
            RunOutput::Chat(result) => Event::ChatResult { result },
        }
    }
}

/// Lifecycle of a streaming run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Init,
    /// 1-based index of the worker whose block is being delivered
    RunningWorker(usize),
    Judging,
    Done,
    Aborted,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunState::Init => write!(f, "init"),
            RunState::RunningWorker(k) => write!(f, "running worker {}", k),
            RunState::Judging => write!(f, "judging"),
            RunState::Done => write!(f, "done"),
            RunState::Aborted => write!(f, "aborted"),
        }
    }
}

/// Receiving end of a streaming run
pub struct EventStream {
    receiver: mpsc::Receiver<Event>,
}

impl EventStream {
    /// Next event; `None` once the run has ended
    pub async fn next(&mut self) -> Option<Event> {
        self.receiver.recv().await
    }

    /// Drain every remaining event
    pub async fn collect(mut self) -> Vec<Event> {
        let mut events = Vec::new();
        while let Some(event) = self.next().await {
            events.push(event);
        }
        events
    }
}

/// Use case for running a council
#[derive(Clone)]
pub struct RunCouncilUseCase {
    workers: Vec<Worker>,
    judge: Judge,
    config: CouncilConfig,
    logger: Arc<dyn EventLogger>,
}

impl RunCouncilUseCase {
    /// Workers and judge share one capability
    pub fn new(capability: Arc<dyn AnalysisCapability>, config: CouncilConfig) -> Self {
        Self::with_judge_capability(Arc::clone(&capability), capability, config)
    }

    /// The judge uses its own capability (e.g. a different model)
    pub fn with_judge_capability(
        capability: Arc<dyn AnalysisCapability>,
        judge_capability: Arc<dyn AnalysisCapability>,
        config: CouncilConfig,
    ) -> Self {
        let workers = config
            .personas
            .iter()
            .cloned()
            .map(|persona| Worker::new(persona, Arc::clone(&capability)).with_timeout(config.timeout))
            .collect();
        let judge = Judge::new(judge_capability)
            .with_timeout(config.timeout)
            .with_min_verdicts(config.required_verdicts());

        Self {
            workers,
            judge,
            config,
            logger: Arc::new(NoEventLogger),
        }
    }

    /// Record every streamed event through `logger`
    pub fn with_event_logger(mut self, logger: Arc<dyn EventLogger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn workers(&self) -> &[Worker] {
        &self.workers
    }

    pub fn config(&self) -> &CouncilConfig {
        &self.config
    }

    /// Run the council and return only the final result.
    pub async fn execute(&self, payload: &InvocationPayload) -> Result<RunOutput, RunCouncilError> {
        if self.workers.is_empty() {
            return Err(RunCouncilError::NoWorkers);
        }

        let question = &payload.question;
        info!(
            "Convening {} workers ({} mode, {})",
            self.workers.len(),
            payload.mode,
            self.config.strategy
        );

        match payload.mode {
            RunMode::Judge => {
                let verdicts = self.gather(|worker| worker.analyze(question)).await?;
                let decision = self.conclude_vote(question, verdicts).await?;
                Ok(RunOutput::Decision(decision))
            }
            RunMode::Chat => {
                let responses = self.gather(|worker| worker.respond(question)).await?;
                let result = self
                    .judge
                    .decide_chat(question, responses, payload.format)
                    .await?;
                Ok(RunOutput::Chat(result))
            }
        }
    }

    /// Run the council on a background task and stream its events.
    ///
    /// Cancelling `cancellation` stops the run at the next event boundary;
    /// the stream then ends with `error("Operation cancelled")`.
    pub fn execute_stream(
        &self,
        payload: InvocationPayload,
        cancellation: CancellationToken,
    ) -> EventStream {
        let (tx, receiver) = mpsc::channel(EVENT_BUFFER);
        let run = CouncilRun {
            use_case: self.clone(),
            payload,
            emitter: Emitter {
                tx,
                logger: Arc::clone(&self.logger),
                cancellation,
            },
            state: RunState::Init,
        };
        tokio::spawn(run.drive());
        EventStream { receiver }
    }

    async fn gather<'a, T, F, Fut>(&'a self, call: F) -> Result<Vec<T>, RunCouncilError>
    where
        F: Fn(&'a Worker) -> Fut,
        Fut: Future<Output = Result<T, CapabilityError>>,
    {
        let mut accepted = Vec::with_capacity(self.workers.len());
        match self.config.strategy {
            ExecutionStrategy::Sequential => {
                for worker in &self.workers {
                    let result = call(worker).await;
                    if let Some(value) = self.accept(worker, result)? {
                        accepted.push(value);
                    }
                }
            }
            ExecutionStrategy::Parallel => {
                let results = join_all(self.workers.iter().map(&call)).await;
                for (worker, result) in self.workers.iter().zip(results) {
                    if let Some(value) = self.accept(worker, result)? {
                        accepted.push(value);
                    }
                }
            }
        }
        Ok(accepted)
    }

    /// Apply the failure policy to one worker result
    fn accept<T>(
        &self,
        worker: &Worker,
        result: Result<T, CapabilityError>,
    ) -> Result<Option<T>, RunCouncilError> {
        match result {
            Ok(value) => Ok(Some(value)),
            Err(source) => {
                warn!(worker = %worker.id(), "Worker failed: {}", source);
                match self.config.failure_policy {
                    FailurePolicy::Strict => Err(RunCouncilError::Worker {
                        worker_id: worker.id().to_string(),
                        source,
                    }),
                    FailurePolicy::Lenient => Ok(None),
                }
            }
        }
    }

    /// Judge a vote, falling back to the tallied decision when the
    /// narrative call fails and fallback is enabled
    async fn conclude_vote(
        &self,
        question: &Question,
        verdicts: Vec<Verdict>,
    ) -> Result<Decision, JudgeError> {
        if !self.config.synthesis {
            return self.judge.decide(verdicts);
        }

        match self.judge.decide_with_synthesis(question, verdicts).await {
            Err(JudgeError::Synthesis { decision, source }) if self.config.synthesis_fallback => {
                warn!("Keeping the tallied decision without a narrative: {}", source);
                Ok(*decision)
            }
            other => other,
        }
    }
}

/// Why a streaming run stopped early
enum Abort {
    Cancelled,
    /// The error event has already been emitted
    Reported,
    /// The consumer dropped the stream
    Disconnected,
}

struct Emitter {
    tx: mpsc::Sender<Event>,
    logger: Arc<dyn EventLogger>,
    cancellation: CancellationToken,
}

impl Emitter {
    /// Deliver `event` unless the run has been cancelled
    async fn emit(&self, event: Event) -> Result<(), Abort> {
        if self.cancellation.is_cancelled() {
            return Err(Abort::Cancelled);
        }
        self.deliver(event).await
    }

    async fn deliver(&self, event: Event) -> Result<(), Abort> {
        self.logger.log(&event);
        self.tx.send(event).await.map_err(|_| Abort::Disconnected)
    }
}

/// Worker results captured from the event flow
#[derive(Default)]
struct Collected {
    verdicts: Vec<Verdict>,
    responses: Vec<FreeformResponse>,
}

impl Collected {
    fn record(&mut self, event: &Event) {
        match event {
            Event::WorkerVerdict { verdict } => self.verdicts.push(verdict.clone()),
            Event::WorkerResponse { response } => self.responses.push(response.clone()),
            _ => {}
        }
    }
}

/// One streaming run, owned by its background task
struct CouncilRun {
    use_case: RunCouncilUseCase,
    payload: InvocationPayload,
    emitter: Emitter,
    state: RunState,
}

impl CouncilRun {
    async fn drive(mut self) {
        let finished = match self.run().await {
            Ok(()) => RunState::Done,
            Err(Abort::Cancelled) => {
                info!("Run cancelled");
                let _ = self.emitter.deliver(Event::error("Operation cancelled")).await;
                RunState::Aborted
            }
            Err(Abort::Reported) => RunState::Aborted,
            Err(Abort::Disconnected) => {
                debug!("Event consumer went away");
                RunState::Aborted
            }
        };
        self.transition(finished);
    }

    async fn run(&mut self) -> Result<(), Abort> {
        if self.use_case.workers.is_empty() {
            return self.fail(RunCouncilError::NoWorkers).await;
        }

        let cancellation = self.emitter.cancellation.clone();
        let question = self.payload.question.clone();
        // Dropping the join set aborts any parallel worker still running
        let (mut feeds, _in_flight) = self.open_feeds(&question);
        let mut collected = Collected::default();

        for (k, feed) in feeds.iter_mut().enumerate() {
            let worker_id = self.use_case.workers[k].id().to_string();
            self.transition(RunState::RunningWorker(k + 1));
            self.emitter
                .emit(Event::WorkerStart {
                    worker_id: worker_id.clone(),
                })
                .await?;

            loop {
                let item = tokio::select! {
                    biased;
                    _ = cancellation.cancelled() => return Err(Abort::Cancelled),
                    _ = self.emitter.tx.closed() => return Err(Abort::Disconnected),
                    item = feed.next() => item,
                };

                match item {
                    None => break,
                    Some(Ok(event)) => {
                        collected.record(&event);
                        self.emitter.emit(event).await?;
                    }
                    Some(Err(source)) => {
                        warn!(worker = %worker_id, "Worker failed: {}", source);
                        let error = RunCouncilError::Worker {
                            worker_id: worker_id.clone(),
                            source,
                        };
                        if self.use_case.config.failure_policy == FailurePolicy::Strict {
                            return self.fail(error).await;
                        }
                        self.emitter.emit(Event::error(error.to_string())).await?;
                    }
                }
            }

            self.emitter
                .emit(Event::WorkerComplete { worker_id })
                .await?;
        }

        self.transition(RunState::Judging);
        self.emitter.emit(Event::JudgeStart).await?;

        let conclusion = tokio::select! {
            biased;
            _ = cancellation.cancelled() => return Err(Abort::Cancelled),
            _ = self.emitter.tx.closed() => return Err(Abort::Disconnected),
            conclusion = self.conclude(&question, collected) => conclusion,
        };

        match conclusion {
            Ok(terminal) => {
                self.emitter.emit(Event::JudgeComplete).await?;
                self.emitter.emit(terminal).await
            }
            Err(e) => self.fail(RunCouncilError::Judge(e)).await,
        }
    }

    /// One feed per worker, in council order.
    ///
    /// Sequential feeds are the lazy worker streams themselves. Parallel
    /// feeds are drained by spawned tasks into per-worker buffers, so all
    /// calls run at once while delivery stays grouped.
    fn open_feeds(&self, question: &Question) -> (Vec<WorkerEventStream>, JoinSet<()>) {
        let streams: Vec<WorkerEventStream> = self
            .use_case
            .workers
            .iter()
            .map(|worker| match self.payload.mode {
                RunMode::Judge => worker.analyze_stream(question),
                RunMode::Chat => worker.respond_stream(question),
            })
            .collect();

        let mut in_flight = JoinSet::new();
        if self.use_case.config.strategy == ExecutionStrategy::Sequential {
            return (streams, in_flight);
        }

        let feeds = streams
            .into_iter()
            .map(|mut source| {
                let (tx, rx) = mpsc::unbounded_channel();
                in_flight.spawn(async move {
                    while let Some(item) = source.next().await {
                        if tx.send(item).is_err() {
                            break;
                        }
                    }
                });
                stream::unfold(rx, |mut rx| async move {
                    rx.recv().await.map(|item| (item, rx))
                })
                .boxed()
            })
            .collect();
        (feeds, in_flight)
    }

    async fn conclude(
        &self,
        question: &Question,
        collected: Collected,
    ) -> Result<Event, JudgeError> {
        match self.payload.mode {
            RunMode::Judge => self
                .use_case
                .conclude_vote(question, collected.verdicts)
                .await
                .map(|decision| Event::Final { decision }),
            RunMode::Chat => self
                .use_case
                .judge
                .decide_chat(question, collected.responses, self.payload.format)
                .await
                .map(|result| Event::ChatResult { result }),
        }
    }

    /// Report `error` as the run's last event
    async fn fail(&self, error: RunCouncilError) -> Result<(), Abort> {
        warn!("Run failed: {}", error);
        self.emitter.emit(Event::error(error.to_string())).await?;
        Err(Abort::Reported)
    }

    fn transition(&mut self, next: RunState) {
        debug!("Run state: {} -> {}", self.state, next);
        self.state = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::use_cases::test_support::{
        Script, ScriptedCapability, contrarian_synthesis, personas,
    };
    use serde_json::json;
    use std::sync::Mutex;
    use std::time::Duration;
    use tribunal_domain::{
        CapabilityEvent, ChatFormat, ChatNarrative, Outcome, Persona, Stance,
    };

    fn question() -> Question {
        Question::try_new("Should the library open on Sundays?").unwrap()
    }

    fn council(capability: ScriptedCapability, config: CouncilConfig) -> RunCouncilUseCase {
        RunCouncilUseCase::new(Arc::new(capability), config)
    }

    fn config() -> CouncilConfig {
        CouncilConfig::new(personas()).with_synthesis(false)
    }

    fn voting(a: Script, b: Script, c: Script) -> ScriptedCapability {
        ScriptedCapability::new()
            .worker("a", a)
            .worker("b", b)
            .worker("c", c)
    }

    fn kinds(events: &[Event]) -> Vec<String> {
        events
            .iter()
            .map(|e| match e.worker_id() {
                Some(id) => format!("{}:{}", e.kind(), id),
                None => e.kind().to_string(),
            })
            .collect()
    }

    fn final_decision(events: &[Event]) -> &Decision {
        match events.last() {
            Some(Event::Final { decision }) => decision,
            other => panic!("expected final event, got {:?}", other),
        }
    }

    async fn run(use_case: &RunCouncilUseCase, payload: InvocationPayload) -> Vec<Event> {
        use_case
            .execute_stream(payload, CancellationToken::new())
            .collect()
            .await
    }

    fn grouped_vote_sequence() -> Vec<&'static str> {
        vec![
            "worker_start:a",
            "content",
            "worker_verdict:a",
            "worker_complete:a",
            "worker_start:b",
            "content",
            "worker_verdict:b",
            "worker_complete:b",
            "worker_start:c",
            "content",
            "worker_verdict:c",
            "worker_complete:c",
            "judge_start",
            "judge_complete",
            "final",
        ]
    }

    #[tokio::test]
    async fn test_sequential_events_grouped_per_worker() {
        let use_case = council(
            voting(
                Script::vote("FOR", 0.9),
                Script::vote("AGAINST", 0.6),
                Script::vote("FOR", 0.7),
            ),
            config(),
        );
        let events = run(&use_case, InvocationPayload::judge(question())).await;

        assert_eq!(kinds(&events), grouped_vote_sequence());
        let decision = final_decision(&events);
        assert_eq!(decision.outcome, Outcome::Approve);
        let order: Vec<_> = decision.verdicts.iter().map(|v| v.worker_id.as_str()).collect();
        assert_eq!(order, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_parallel_events_stay_grouped_when_first_worker_is_slowest() {
        let use_case = council(
            voting(
                Script::slow_vote("AGAINST", Duration::from_millis(100)),
                Script::vote("AGAINST", 0.6),
                Script::vote("FOR", 0.7),
            ),
            config().with_strategy(ExecutionStrategy::Parallel),
        );
        let events = run(&use_case, InvocationPayload::judge(question())).await;

        assert_eq!(kinds(&events), grouped_vote_sequence());
        assert_eq!(final_decision(&events).outcome, Outcome::Reject);
    }

    #[tokio::test]
    async fn test_narrative_cannot_override_vote() {
        let capability = voting(
            Script::vote("FOR", 0.9),
            Script::vote("FOR", 0.8),
            Script::vote("AGAINST", 0.7),
        )
        .judge(Script::result(contrarian_synthesis()));
        let use_case = council(capability, config().with_synthesis(true));

        let events = run(&use_case, InvocationPayload::judge(question())).await;
        let decision = final_decision(&events);
        assert_eq!(decision.outcome, Outcome::Approve);
        assert_eq!(decision.vote_tally.for_count, 2);
        assert_eq!(decision.vote_tally.against_count, 1);
        assert_eq!(
            decision.narrative.as_ref().unwrap().summary,
            "The council clearly rejects this."
        );
    }

    #[tokio::test]
    async fn test_strict_failure_stops_the_run() {
        let capability = Arc::new(voting(
            Script::vote("FOR", 0.9),
            Script::Fail(CapabilityError::Request("connection refused".into())),
            Script::vote("FOR", 0.7),
        ));
        let use_case = RunCouncilUseCase::new(capability.clone(), config());
        let events = run(&use_case, InvocationPayload::judge(question())).await;

        assert_eq!(
            kinds(&events),
            vec![
                "worker_start:a",
                "content",
                "worker_verdict:a",
                "worker_complete:a",
                "worker_start:b",
                "error",
            ]
        );
        let message = events.last().unwrap().error_message().unwrap();
        assert!(message.contains("b"));
        assert!(message.contains("connection refused"));
        // Worker c was never called
        assert_eq!(capability.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_lenient_failure_lets_worker_abstain() {
        let use_case = council(
            voting(
                Script::vote("AGAINST", 0.9),
                Script::Events(vec![CapabilityEvent::Delta("lost".into())]),
                Script::vote("FOR", 0.7),
            ),
            config().with_failure_policy(FailurePolicy::Lenient),
        );
        let events = run(&use_case, InvocationPayload::judge(question())).await;

        assert_eq!(
            kinds(&events),
            vec![
                "worker_start:a",
                "content",
                "worker_verdict:a",
                "worker_complete:a",
                "worker_start:b",
                "content",
                "error",
                "worker_complete:b",
                "worker_start:c",
                "content",
                "worker_verdict:c",
                "worker_complete:c",
                "judge_start",
                "judge_complete",
                "final",
            ]
        );
        assert!(events[6].error_message().unwrap().contains("without a result"));
        let decision = final_decision(&events);
        assert_eq!(decision.outcome, Outcome::Tie);
        assert_eq!(decision.verdicts.len(), 2);
    }

    #[tokio::test]
    async fn test_lenient_run_still_needs_min_verdicts() {
        let failing = || Script::Fail(CapabilityError::Request("down".into()));
        let use_case = council(
            voting(failing(), failing(), Script::vote("FOR", 0.7)),
            config()
                .with_failure_policy(FailurePolicy::Lenient)
                .with_min_verdicts(2),
        );
        let events = run(&use_case, InvocationPayload::judge(question())).await;

        let kinds = kinds(&events);
        assert_eq!(kinds[kinds.len() - 2..], ["judge_start", "error"]);
        assert!(events.last().unwrap().error_message().unwrap().contains("Not enough verdicts"));
    }

    #[tokio::test]
    async fn test_synthesis_failure_falls_back_to_tally() {
        let capability = voting(
            Script::vote("AGAINST", 0.9),
            Script::vote("AGAINST", 0.8),
            Script::vote("FOR", 0.7),
        )
        .judge(Script::Fail(CapabilityError::Request("judge offline".into())));
        let use_case = council(capability, config().with_synthesis(true));

        let events = run(&use_case, InvocationPayload::judge(question())).await;
        let decision = final_decision(&events);
        assert_eq!(decision.outcome, Outcome::Reject);
        assert!(decision.narrative.as_ref().unwrap().is_placeholder());
    }

    #[tokio::test]
    async fn test_synthesis_failure_without_fallback_is_reported() {
        let capability = voting(
            Script::vote("AGAINST", 0.9),
            Script::vote("AGAINST", 0.8),
            Script::vote("FOR", 0.7),
        )
        .judge(Script::Fail(CapabilityError::Request("judge offline".into())));
        let use_case = council(
            capability,
            config().with_synthesis(true).with_synthesis_fallback(false),
        );

        let events = run(&use_case, InvocationPayload::judge(question())).await;
        let kinds = kinds(&events);
        assert_eq!(kinds[kinds.len() - 2..], ["judge_start", "error"]);
        assert!(events.last().unwrap().error_message().unwrap().contains("judge offline"));
    }

    #[tokio::test]
    async fn test_cancellation_mid_worker() {
        let use_case = council(
            voting(
                Script::Stall(vec![CapabilityEvent::Delta("pondering".into())]),
                Script::vote("FOR", 0.8),
                Script::vote("FOR", 0.7),
            ),
            config(),
        );
        let token = CancellationToken::new();
        let mut stream = use_case.execute_stream(InvocationPayload::judge(question()), token.clone());

        assert_eq!(
            stream.next().await,
            Some(Event::WorkerStart {
                worker_id: "a".into()
            })
        );
        assert_eq!(stream.next().await, Some(Event::content("pondering")));
        token.cancel();

        let rest = stream.collect().await;
        assert_eq!(rest, vec![Event::error("Operation cancelled")]);
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let use_case = council(
            voting(
                Script::vote("FOR", 0.9),
                Script::vote("FOR", 0.8),
                Script::vote("FOR", 0.7),
            ),
            config(),
        );
        let token = CancellationToken::new();
        token.cancel();
        let events = use_case
            .execute_stream(InvocationPayload::judge(question()), token)
            .collect()
            .await;
        assert_eq!(events, vec![Event::error("Operation cancelled")]);
    }

    #[tokio::test]
    async fn test_worker_timeout_is_reported() {
        let use_case = council(
            voting(
                Script::Stall(vec![]),
                Script::vote("FOR", 0.8),
                Script::vote("FOR", 0.7),
            ),
            config().with_timeout(Duration::from_millis(50)),
        );
        let events = run(&use_case, InvocationPayload::judge(question())).await;
        assert_eq!(kinds(&events), vec!["worker_start:a", "error"]);
        assert!(events[1].error_message().unwrap().contains("Timed out"));
    }

    #[tokio::test]
    async fn test_huge_timeout_runs_to_completion() {
        for strategy in [ExecutionStrategy::Sequential, ExecutionStrategy::Parallel] {
            let use_case = council(
                voting(
                    Script::vote("FOR", 0.9),
                    Script::vote("AGAINST", 0.6),
                    Script::vote("FOR", 0.7),
                ),
                config()
                    .with_strategy(strategy)
                    .with_timeout(Duration::from_secs(u64::MAX)),
            );
            let events = run(&use_case, InvocationPayload::judge(question())).await;
            assert_eq!(kinds(&events), grouped_vote_sequence());
            assert_eq!(final_decision(&events).outcome, Outcome::Approve);
        }
    }

    /// Wait until nothing but the test holds `capability`
    async fn released(capability: &Arc<ScriptedCapability>) -> bool {
        for _ in 0..100 {
            if Arc::strong_count(capability) == 1 {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        false
    }

    #[tokio::test]
    async fn test_dropped_stream_stops_a_stalled_run() {
        let capability = Arc::new(voting(
            Script::Stall(vec![CapabilityEvent::Delta("pondering".into())]),
            Script::vote("FOR", 0.8),
            Script::vote("FOR", 0.7),
        ));
        let use_case = RunCouncilUseCase::new(
            capability.clone(),
            config().with_timeout(Duration::from_secs(3600)),
        );
        let mut stream =
            use_case.execute_stream(InvocationPayload::judge(question()), CancellationToken::new());

        assert_eq!(
            stream.next().await,
            Some(Event::WorkerStart {
                worker_id: "a".into()
            })
        );
        assert_eq!(stream.next().await, Some(Event::content("pondering")));
        drop(stream);
        drop(use_case);

        assert!(released(&capability).await, "run task outlived its consumer");
        assert_eq!(capability.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_parallel_strict_failure_stops_the_run() {
        let use_case = council(
            voting(
                Script::slow_vote("FOR", Duration::from_millis(50)),
                Script::Fail(CapabilityError::Request("connection refused".into())),
                Script::Stall(vec![]),
            ),
            config().with_strategy(ExecutionStrategy::Parallel),
        );
        let events = tokio::time::timeout(
            Duration::from_secs(5),
            run(&use_case, InvocationPayload::judge(question())),
        )
        .await
        .unwrap();

        assert_eq!(
            kinds(&events),
            vec![
                "worker_start:a",
                "content",
                "worker_verdict:a",
                "worker_complete:a",
                "worker_start:b",
                "error",
            ]
        );
        let message = events.last().unwrap().error_message().unwrap();
        assert!(message.contains("connection refused"));
    }

    #[tokio::test]
    async fn test_parallel_lenient_failure_lets_worker_abstain() {
        let use_case = council(
            voting(
                Script::slow_vote("AGAINST", Duration::from_millis(100)),
                Script::Events(vec![CapabilityEvent::Delta("lost".into())]),
                Script::vote("FOR", 0.7),
            ),
            config()
                .with_strategy(ExecutionStrategy::Parallel)
                .with_failure_policy(FailurePolicy::Lenient),
        );
        let events = run(&use_case, InvocationPayload::judge(question())).await;

        assert_eq!(
            kinds(&events),
            vec![
                "worker_start:a",
                "content",
                "worker_verdict:a",
                "worker_complete:a",
                "worker_start:b",
                "content",
                "error",
                "worker_complete:b",
                "worker_start:c",
                "content",
                "worker_verdict:c",
                "worker_complete:c",
                "judge_start",
                "judge_complete",
                "final",
            ]
        );
        let decision = final_decision(&events);
        assert_eq!(decision.outcome, Outcome::Tie);
        let order: Vec<_> = decision.verdicts.iter().map(|v| v.worker_id.as_str()).collect();
        assert_eq!(order, vec!["a", "c"]);
    }

    #[tokio::test]
    async fn test_parallel_cancellation_aborts_running_workers() {
        let capability = Arc::new(voting(
            Script::Stall(vec![CapabilityEvent::Delta("pondering".into())]),
            Script::Stall(vec![CapabilityEvent::Delta("also pondering".into())]),
            Script::slow_vote("FOR", Duration::from_millis(200)),
        ));
        let use_case = RunCouncilUseCase::new(
            capability.clone(),
            config()
                .with_strategy(ExecutionStrategy::Parallel)
                .with_timeout(Duration::from_secs(3600)),
        );
        let token = CancellationToken::new();
        let mut stream = use_case.execute_stream(InvocationPayload::judge(question()), token.clone());

        assert_eq!(
            stream.next().await,
            Some(Event::WorkerStart {
                worker_id: "a".into()
            })
        );
        assert_eq!(stream.next().await, Some(Event::content("pondering")));
        token.cancel();

        let rest: Vec<Event> = tokio::time::timeout(Duration::from_secs(5), stream.collect())
            .await
            .unwrap();
        assert_eq!(rest, vec![Event::error("Operation cancelled")]);

        drop(use_case);
        assert!(released(&capability).await, "worker tasks outlived the run");
    }

    #[tokio::test]
    async fn test_chat_stream() {
        let capability = ScriptedCapability::new()
            .worker("a", Script::answer("Yes, with volunteers."))
            .worker("b", Script::answer("Only in summer."))
            .worker("c", Script::answer("Ask the neighbourhood."))
            .moderator(Script::result(json!({"answer": "Try summer Sundays first."})));
        let use_case = council(capability, config());

        let payload = InvocationPayload::chat(question(), ChatFormat::Natural);
        let events = run(&use_case, payload).await;

        assert_eq!(
            kinds(&events),
            vec![
                "worker_start:a",
                "worker_response:a",
                "worker_complete:a",
                "worker_start:b",
                "worker_response:b",
                "worker_complete:b",
                "worker_start:c",
                "worker_response:c",
                "worker_complete:c",
                "judge_start",
                "judge_complete",
                "chat_result",
            ]
        );
        match events.last() {
            Some(Event::ChatResult { result }) => {
                assert_eq!(result.responses.len(), 3);
                assert_eq!(
                    result.narrative,
                    ChatNarrative::Natural {
                        answer: "Try summer Sundays first.".into()
                    }
                );
            }
            other => panic!("expected chat result, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_stream_without_workers() {
        let use_case = council(ScriptedCapability::new(), CouncilConfig::new(vec![]));
        let events = run(&use_case, InvocationPayload::judge(question())).await;
        assert_eq!(events, vec![Event::error("No workers configured")]);
    }

    struct RecordingLogger(Mutex<Vec<Event>>);

    impl EventLogger for RecordingLogger {
        fn log(&self, event: &Event) {
            self.0.lock().unwrap().push(event.clone());
        }
    }

    #[tokio::test]
    async fn test_event_logger_sees_every_event() {
        let logger = Arc::new(RecordingLogger(Mutex::new(Vec::new())));
        let use_case = council(
            voting(
                Script::vote("FOR", 0.9),
                Script::vote("FOR", 0.8),
                Script::vote("FOR", 0.7),
            ),
            config(),
        )
        .with_event_logger(logger.clone());

        let events = run(&use_case, InvocationPayload::judge(question())).await;
        assert_eq!(*logger.0.lock().unwrap(), events);
    }

    #[tokio::test]
    async fn test_execute_returns_decision() {
        for strategy in [ExecutionStrategy::Sequential, ExecutionStrategy::Parallel] {
            let use_case = council(
                voting(
                    Script::vote("FOR", 0.9),
                    Script::vote("AGAINST", 0.8),
                    Script::vote("AGAINST", 0.7),
                ),
                config().with_strategy(strategy),
            );
            let output = use_case
                .execute(&InvocationPayload::judge(question()))
                .await
                .unwrap();
            match output {
                RunOutput::Decision(decision) => {
                    assert_eq!(decision.outcome, Outcome::Reject);
                    let stances: Vec<_> = decision.verdicts.iter().map(|v| v.decision).collect();
                    assert_eq!(stances, vec![Stance::For, Stance::Against, Stance::Against]);
                }
                other => panic!("expected decision, got {:?}", other),
            }
        }
    }

    #[tokio::test]
    async fn test_execute_strict_failure() {
        let use_case = council(
            voting(
                Script::vote("FOR", 0.9),
                Script::result(json!({"decision": "MAYBE", "rationale": "?", "confidence": 0.5})),
                Script::vote("FOR", 0.7),
            ),
            config(),
        );
        let err = use_case
            .execute(&InvocationPayload::judge(question()))
            .await
            .unwrap_err();
        match err {
            RunCouncilError::Worker { worker_id, source } => {
                assert_eq!(worker_id, "b");
                assert!(matches!(source, CapabilityError::Schema(_)));
            }
            other => panic!("expected worker error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_execute_chat_explicit() {
        let capability = ScriptedCapability::new()
            .worker("solo", Script::answer("Open from noon."))
            .moderator(Script::result(contrarian_synthesis()));
        let use_case = council(
            capability,
            CouncilConfig::new(vec![Persona::new("solo", "the only member")]),
        );
        let output = use_case
            .execute(&InvocationPayload::chat(question(), ChatFormat::Explicit))
            .await
            .unwrap();
        match output.into_event() {
            Event::ChatResult { result } => {
                assert_eq!(result.responses[0].worker_id, "solo");
                assert_eq!(result.narrative.format(), ChatFormat::Explicit);
            }
            other => panic!("expected chat result, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_execute_without_workers() {
        let use_case = council(ScriptedCapability::new(), CouncilConfig::new(vec![]));
        let err = use_case
            .execute(&InvocationPayload::judge(question()))
            .await
            .unwrap_err();
        assert!(matches!(err, RunCouncilError::NoWorkers));
    }
}
