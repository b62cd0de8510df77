//! Scripted capability shared by the use case tests.

use crate::ports::capability::{
    AnalysisCapability, CapabilityError, CapabilityRequest, CapabilityStream,
};
use async_trait::async_trait;
use serde_json::{Value, json};
use std::sync::Mutex;
use std::time::Duration;
use tribunal_domain::{CapabilityEvent, Persona};

#[derive(Clone)]
pub(crate) enum Script {
    /// Replay these events, then end the stream
    Events(Vec<CapabilityEvent>),
    /// Replay these events, then hold the stream open without a result
    Stall(Vec<CapabilityEvent>),
    /// Send the first event, wait, then send the rest
    Delayed(Duration, Vec<CapabilityEvent>),
    /// Fail the call itself
    Fail(CapabilityError),
}

impl Script {
    /// Think out loud, then vote
    pub fn vote(decision: &str, confidence: f64) -> Self {
        Script::Events(vec![
            CapabilityEvent::Delta(format!("leaning {}", decision)),
            CapabilityEvent::Completed(json!({
                "decision": decision,
                "rationale": format!("because {}", decision),
                "confidence": confidence,
            })),
        ])
    }

    pub fn answer(text: &str) -> Self {
        Script::Events(vec![CapabilityEvent::Completed(json!({ "text": text }))])
    }

    pub fn result(value: Value) -> Self {
        Script::Events(vec![CapabilityEvent::Completed(value)])
    }

    /// Like [`Script::vote`], but the result arrives after `delay`
    pub fn slow_vote(decision: &str, delay: Duration) -> Self {
        match Script::vote(decision, 0.5) {
            Script::Events(events) => Script::Delayed(delay, events),
            other => other,
        }
    }
}

/// Routes each call by its system prompt: worker prompts name the persona
/// id, judge prompts are matched by their fixed wording.
pub(crate) struct ScriptedCapability {
    routes: Vec<(String, Script)>,
    calls: Mutex<Vec<CapabilityRequest>>,
}

impl ScriptedCapability {
    pub fn new() -> Self {
        Self {
            routes: Vec::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn worker(mut self, id: &str, script: Script) -> Self {
        self.routes.push((format!("You are {} (", id), script));
        self
    }

    pub fn judge(mut self, script: Script) -> Self {
        self.routes
            .push(("You are the judge of a council".to_string(), script));
        self
    }

    pub fn moderator(mut self, script: Script) -> Self {
        self.routes
            .push(("You are the moderator of a council".to_string(), script));
        self
    }

    pub fn calls(&self) -> Vec<CapabilityRequest> {
        self.calls.lock().unwrap().clone()
    }

    fn script_for(&self, request: &CapabilityRequest) -> Script {
        self.calls.lock().unwrap().push(request.clone());
        self.routes
            .iter()
            .find(|(key, _)| request.system_prompt.contains(key.as_str()))
            .map(|(_, script)| script.clone())
            .unwrap_or_else(|| Script::Fail(CapabilityError::Request("no script".into())))
    }
}

#[async_trait]
impl AnalysisCapability for ScriptedCapability {
    async fn invoke(&self, request: &CapabilityRequest) -> Result<Value, CapabilityError> {
        match self.script_for(request) {
            Script::Events(events) => CapabilityStream::from_events(events).collect_result().await,
            Script::Delayed(delay, events) => {
                tokio::time::sleep(delay).await;
                CapabilityStream::from_events(events).collect_result().await
            }
            Script::Stall(_) => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Err(CapabilityError::Request("stalled".into()))
            }
            Script::Fail(e) => Err(e),
        }
    }

    async fn invoke_stream(
        &self,
        request: &CapabilityRequest,
    ) -> Result<CapabilityStream, CapabilityError> {
        match self.script_for(request) {
            Script::Events(events) => Ok(CapabilityStream::from_events(events)),
            Script::Stall(events) => {
                let (tx, stream) = CapabilityStream::channel(events.len() + 1);
                tokio::spawn(async move {
                    for event in events {
                        let _ = tx.send(event).await;
                    }
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    drop(tx);
                });
                Ok(stream)
            }
            Script::Delayed(delay, events) => {
                let (tx, stream) = CapabilityStream::channel(events.len());
                tokio::spawn(async move {
                    for (i, event) in events.into_iter().enumerate() {
                        if i == 1 {
                            tokio::time::sleep(delay).await;
                        }
                        let _ = tx.send(event).await;
                    }
                });
                Ok(stream)
            }
            Script::Fail(e) => Err(e),
        }
    }
}

/// Three plain personas: a, b, c
pub(crate) fn personas() -> Vec<Persona> {
    ["a", "b", "c"]
        .iter()
        .map(|id| Persona::new(*id, format!("member {}", id)))
        .collect()
}

/// A judge narrative that contradicts whatever the vote says
pub(crate) fn contrarian_synthesis() -> Value {
    json!({
        "summary": "The council clearly rejects this.",
        "key_points": ["everyone disagreed"],
        "recommendation": "Do not proceed",
    })
}
