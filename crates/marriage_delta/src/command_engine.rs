//! Calculation engine running as a child process
//!
//! Every loaded scenario gets its own process. The two sides exchange one
//! JSON document per line over stdio:
//!
//! ```text
//! -> {"situation": {...}}                                           once, on load
//! -> {"variable": "snap", "period": "2024", "map_to": "household"}
//! <- {"value": 1234.5}  or  {"value": [0.0, 12.5, ...]}
//! <- {"error": {"kind": "unavailable", "message": "..."}}
//! ```
//!
//! A sweep situation carries its `axes`; the answer is then one value per
//! sample point. With two axes the first (the head, index 0) varies slowest,
//! so value `i * count + j` pairs head sample `i` with spouse sample `j`.
//! Engines must use this `ij` order: a column-fastest `xy` layout would
//! silently transpose every grid.
//!
//! Values must be finite numbers. Each response is awaited for at most the
//! configured timeout; a child that misses it is killed and the request fails.

use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use marriage_delta_core::engine::{CalculationEngine, EngineValue, MapTo, Simulation};
use marriage_delta_core::error::EngineError;
use marriage_delta_core::model::{ScenarioDocument, Year};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::config::EngineConfig;

/// Spawns the configured command once per loaded scenario
#[derive(Debug, Clone)]
pub struct CommandEngine {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl CommandEngine {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            timeout: EngineConfig::default().timeout(),
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// `None` when no command is configured
    pub fn from_config(config: &EngineConfig) -> Option<Self> {
        let program = config.command.as_ref()?;
        Some(
            Self::new(program.clone())
                .with_args(config.args.iter().cloned())
                .with_timeout(config.timeout()),
        )
    }
}

impl CalculationEngine for CommandEngine {
    type Simulation = CommandSimulation;

    fn load(&self, scenario: &ScenarioDocument) -> Result<CommandSimulation, EngineError> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| EngineError::Failed(format!("failed to start {}: {e}", self.program)))?;
        debug!(program = %self.program, pid = child.id(), "engine process started");

        let stdin = child.stdin.take();
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| EngineError::Failed("engine stdout unavailable".to_string()))?;

        // The reader thread ends on its own once the child's stdout closes
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            for line in BufReader::new(stdout).lines() {
                let msg = match line {
                    Ok(line) => ReaderMsg::Line(line),
                    Err(err) => {
                        let _ = tx.send(ReaderMsg::Err(err));
                        return;
                    }
                };
                if tx.send(msg).is_err() {
                    return;
                }
            }
            let _ = tx.send(ReaderMsg::Eof);
        });

        let mut simulation = CommandSimulation {
            child,
            stdin,
            rx,
            timeout: self.timeout,
        };
        simulation.send(&json!({ "situation": scenario.situation() }))?;
        Ok(simulation)
    }
}

enum ReaderMsg {
    Line(String),
    Err(std::io::Error),
    Eof,
}

#[derive(Deserialize)]
struct Response {
    #[serde(default)]
    value: Option<EngineValue>,
    #[serde(default)]
    error: Option<ResponseError>,
}

#[derive(Deserialize)]
struct ResponseError {
    kind: String,
    #[serde(default)]
    message: String,
}

/// One scenario loaded into a running engine process
pub struct CommandSimulation {
    child: Child,
    /// `None` once the process has been terminated
    stdin: Option<ChildStdin>,
    rx: Receiver<ReaderMsg>,
    timeout: Duration,
}

impl CommandSimulation {
    fn send(&mut self, message: &Value) -> Result<(), EngineError> {
        let stdin = self
            .stdin
            .as_mut()
            .ok_or_else(|| EngineError::Failed("engine process has exited".to_string()))?;
        let mut line =
            serde_json::to_string(message).map_err(|e| EngineError::Failed(e.to_string()))?;
        line.push('\n');
        stdin
            .write_all(line.as_bytes())
            .and_then(|()| stdin.flush())
            .map_err(|e| EngineError::Failed(format!("failed to write to engine: {e}")))
    }

    /// Next non-blank line, bounded by the timeout
    fn receive(&mut self, variable: &str) -> Result<String, EngineError> {
        let started = Instant::now();
        loop {
            let remaining = self.timeout.saturating_sub(started.elapsed());
            match self.rx.recv_timeout(remaining) {
                Ok(ReaderMsg::Line(line)) if line.trim().is_empty() => continue,
                Ok(ReaderMsg::Line(line)) => return Ok(line),
                Ok(ReaderMsg::Err(e)) => {
                    self.terminate();
                    return Err(EngineError::Failed(format!(
                        "failed to read from engine: {e}"
                    )));
                }
                Ok(ReaderMsg::Eof) | Err(RecvTimeoutError::Disconnected) => {
                    self.terminate();
                    return Err(EngineError::Failed(format!(
                        "engine exited while calculating {variable}"
                    )));
                }
                Err(RecvTimeoutError::Timeout) => {
                    let elapsed = started.elapsed();
                    warn!(variable, ?elapsed, "engine timed out, killing it");
                    self.terminate();
                    return Err(EngineError::Timeout {
                        variable: variable.to_string(),
                        elapsed,
                    });
                }
            }
        }
    }

    fn terminate(&mut self) {
        if self.stdin.take().is_some() {
            let _ = self.child.kill();
            let _ = self.child.wait();
        }
    }
}

impl Simulation for CommandSimulation {
    fn calculate(
        &mut self,
        variable: &str,
        year: Year,
        map_to: Option<MapTo>,
    ) -> Result<EngineValue, EngineError> {
        self.send(&request(variable, year, map_to))?;
        let line = self.receive(variable)?;
        parse_response(variable, &line)
    }
}

impl Drop for CommandSimulation {
    fn drop(&mut self) {
        self.terminate();
    }
}

fn request(variable: &str, year: Year, map_to: Option<MapTo>) -> Value {
    json!({
        "variable": variable,
        "period": year.to_string(),
        "map_to": map_to.map(MapTo::as_str),
    })
}

fn parse_response(variable: &str, line: &str) -> Result<EngineValue, EngineError> {
    let response: Response = serde_json::from_str(line).map_err(|e| {
        EngineError::Failed(format!("malformed engine response for {variable}: {e}"))
    })?;

    match (response.value, response.error) {
        (_, Some(error)) if error.kind == "unavailable" => Err(EngineError::Unavailable {
            variable: variable.to_string(),
            reason: error.message,
        }),
        (_, Some(error)) => Err(EngineError::Failed(format!(
            "{variable}: {} ({})",
            error.message, error.kind
        ))),
        (Some(value), None) => Ok(value),
        (None, None) => Err(EngineError::Failed(format!(
            "engine response for {variable} has neither value nor error"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use marriage_delta_core::{Household, StateCode};

    fn scenario() -> ScenarioDocument {
        Household::new(StateCode::new("CA").unwrap(), 40_000, 0, 2024)
            .head_alone_scenario(None)
            .unwrap()
    }

    #[test]
    fn test_request_layout() {
        let value = request("snap", 2024, Some(MapTo::Household));
        assert_eq!(value["variable"], "snap");
        assert_eq!(value["period"], "2024");
        assert_eq!(value["map_to"], "household");
        assert!(request("snap", 2024, None)["map_to"].is_null());
    }

    #[test]
    fn test_parse_responses() {
        assert_eq!(
            parse_response("x", r#"{"value": 12.5}"#).unwrap(),
            EngineValue::Scalar(12.5)
        );
        assert_eq!(
            parse_response("x", r#"{"value": [1, 2.5]}"#).unwrap(),
            EngineValue::Vector(vec![1.0, 2.5])
        );
        assert_eq!(
            parse_response("wic", r#"{"error": {"kind": "unavailable", "message": "unknown"}}"#)
                .unwrap_err(),
            EngineError::Unavailable {
                variable: "wic".to_string(),
                reason: "unknown".to_string(),
            }
        );
        assert!(matches!(
            parse_response("x", r#"{"error": {"kind": "internal", "message": "boom"}}"#),
            Err(EngineError::Failed(_))
        ));
        assert!(matches!(parse_response("x", "{}"), Err(EngineError::Failed(_))));
        assert!(matches!(parse_response("x", "not json"), Err(EngineError::Failed(_))));
    }

    #[test]
    fn test_missing_program_fails_to_load() {
        let engine = CommandEngine::new("/nonexistent/marriage-delta-engine");
        assert!(matches!(
            engine.load(&scenario()),
            Err(EngineError::Failed(_))
        ));
    }

    #[test]
    fn test_from_config_requires_command() {
        assert!(CommandEngine::from_config(&EngineConfig::default()).is_none());
        let config = EngineConfig {
            command: Some("engine".to_string()),
            args: vec!["--stdio".to_string()],
            timeout_secs: 5,
        };
        let engine = CommandEngine::from_config(&config).unwrap();
        assert_eq!(engine.args, vec!["--stdio".to_string()]);
        assert_eq!(engine.timeout, Duration::from_secs(5));
    }

    #[cfg(unix)]
    fn shell(script: &str) -> CommandEngine {
        CommandEngine::new("sh")
            .with_args(["-c", script])
            .with_timeout(Duration::from_secs(10))
    }

    #[cfg(unix)]
    #[test]
    fn test_subprocess_round_trip() {
        let engine = shell(
            r#"read situation
               read first; echo '{"value": 42.5}'
               read second; echo ''; echo '{"value": [1, 2, 3]}'
               read third; echo '{"error": {"kind": "unavailable", "message": "not modelled"}}'"#,
        );
        let mut simulation = engine.load(&scenario()).unwrap();

        assert_eq!(
            simulation
                .calculate("household_net_income", 2024, Some(MapTo::Household))
                .unwrap(),
            EngineValue::Scalar(42.5)
        );
        assert_eq!(
            simulation.calculate("snap", 2024, Some(MapTo::Household)).unwrap(),
            EngineValue::Vector(vec![1.0, 2.0, 3.0])
        );
        assert!(matches!(
            simulation.calculate("wic", 2024, Some(MapTo::Household)),
            Err(EngineError::Unavailable { .. })
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_silent_engine_times_out() {
        let engine = shell("read situation; exec sleep 30").with_timeout(Duration::from_millis(200));
        let mut simulation = engine.load(&scenario()).unwrap();

        let err = simulation
            .calculate("household_net_income", 2024, Some(MapTo::Household))
            .unwrap_err();
        assert!(matches!(err, EngineError::Timeout { ref variable, .. } if variable == "household_net_income"));

        // The killed process cannot answer again
        assert!(matches!(
            simulation.calculate("snap", 2024, Some(MapTo::Household)),
            Err(EngineError::Failed(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_exited_engine_fails() {
        let engine = shell("read situation; exit 0");
        let mut simulation = engine.load(&scenario()).unwrap();

        assert!(matches!(
            simulation.calculate("snap", 2024, Some(MapTo::Household)),
            Err(EngineError::Failed(_))
        ));
    }
}
