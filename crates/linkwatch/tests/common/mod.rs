//! Shared fakes for integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use linkwatch::diagnostics::SinkError;
use linkwatch::{EchoOptions, EchoReply, EchoTransport, Incident, IncidentSink, TransportError};
use std::collections::{HashMap, VecDeque};
use std::net::IpAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Scripted answer for one echo
#[derive(Debug, Clone)]
pub enum Answer {
    Rtt(u64),
    Fail(&'static str),
    /// Bug inside the transport itself
    Panic,
}

/// Transport answering per address from a script
///
/// Each address replays its answers in order and repeats the last one
/// once the script runs out.
#[derive(Default)]
pub struct ScriptedTransport {
    scripts: Mutex<HashMap<IpAddr, VecDeque<Answer>>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(self, address: IpAddr, answers: impl IntoIterator<Item = Answer>) -> Self {
        self.scripts.lock().unwrap().insert(address, answers.into_iter().collect());
        self
    }
}

#[async_trait]
impl EchoTransport for ScriptedTransport {
    async fn echo(
        &self,
        address: IpAddr,
        _timeout: Duration,
        _payload: &[u8],
        _options: EchoOptions,
    ) -> Result<EchoReply, TransportError> {
        let answer = {
            let mut scripts = self.scripts.lock().unwrap();
            let script = scripts.get_mut(&address).expect("unscripted address");
            if script.len() > 1 { script.pop_front() } else { script.front().cloned() }
        };

        match answer.expect("empty script") {
            Answer::Rtt(ms) => Ok(EchoReply::success(Duration::from_millis(ms))),
            Answer::Fail(message) => Err(TransportError::Other(message.to_string())),
            Answer::Panic => panic!("transport fault while probing {address}"),
        }
    }
}

/// Sink keeping rendered incidents in memory
#[derive(Clone, Default)]
pub struct MemorySink {
    pub records: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl IncidentSink for MemorySink {
    fn name(&self) -> &str {
        "memory"
    }

    async fn record(&self, incident: &Incident) -> Result<(), SinkError> {
        self.records.lock().unwrap().push(incident.to_string());
        Ok(())
    }
}
