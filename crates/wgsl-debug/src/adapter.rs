//! DAP request handling on top of [`WgslDebug`].

use crate::controller::{StopReason, WgslDebug};
use crate::launch::LaunchConfig;
use dap::events::{Event, StoppedEventBody};
use dap::prelude::*;
use dap::types::{
    Breakpoint, Capabilities, Message, Scope, Source, StackFrame, StoppedEventReason, Thread,
    Variable,
};
use std::collections::{BTreeSet, HashMap};
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tracing::{error, info, warn};
use wgsl_exec::DecodedValue;

const THREAD_ID: i64 = 1;
const LOCALS_REF: i64 = 1;
const GLOBALS_REF: i64 = 2;

pub struct WgslDebugAdapter {
    session: Arc<Mutex<Option<DebugSession>>>,
    event_tx: Arc<Mutex<Option<mpsc::Sender<Event>>>>,
    /// Lines from `setBreakpoints`, kept across relaunches.
    breakpoints: Mutex<BTreeSet<u32>>,
    pause: Arc<AtomicBool>,
}

pub struct DebugSession {
    pub debug: WgslDebug,
    pub program: PathBuf,
    /// Thread name shown by the client.
    pub label: String,
    pub stop_on_entry: bool,
    pub status: SessionStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionStatus {
    Paused,
    Finished,
    /// Execution raised an error; the session can only be inspected.
    Failed(String),
}

fn stopped(reason: StoppedEventReason, text: Option<String>) -> Event {
    Event::Stopped(StoppedEventBody {
        reason,
        thread_id: Some(THREAD_ID),
        all_threads_stopped: Some(true),
        text,
        description: None,
        preserve_focus_hint: None,
        hit_breakpoint_ids: None,
    })
}

fn variables(values: Vec<(String, DecodedValue)>) -> Vec<Variable> {
    values
        .into_iter()
        .map(|(name, value)| Variable {
            name,
            value: value.to_string(),
            variables_reference: 0,
            ..Default::default()
        })
        .collect()
}

impl WgslDebugAdapter {
    pub fn new(event_tx: mpsc::Sender<Event>) -> Self {
        Self {
            session: Arc::new(Mutex::new(None)),
            event_tx: Arc::new(Mutex::new(Some(event_tx))),
            breakpoints: Mutex::new(BTreeSet::new()),
            pause: Arc::new(AtomicBool::new(false)),
        }
    }

    pub async fn set_event_sender(&self, tx: mpsc::Sender<Event>) {
        let mut event_tx = self.event_tx.lock().await;
        *event_tx = Some(tx);
    }

    /// Flag a running `continue` polls between commands. The server sets
    /// it as soon as a `pause` request arrives.
    pub fn pause_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.pause)
    }

    async fn send_event(&self, event: Event) {
        let event_tx = self.event_tx.lock().await;
        if let Some(ref tx) = *event_tx {
            let _ = tx.send(event).await;
        }
    }

    pub async fn handle_request(&self, request: Request) -> Response {
        let body = match request.command {
            Command::Initialize(_) => ResponseBody::Initialize(Capabilities {
                supports_configuration_done_request: Some(true),
                supports_step_back: Some(false),
                supports_terminate_request: Some(true),
                ..Default::default()
            }),
            Command::Launch(ref args) => {
                let Some(data) = args.additional_data.as_ref() else {
                    return self.make_error_response(&request, "launch needs a 'program'".to_string());
                };
                let config = match LaunchConfig::from_value(data) {
                    Ok(config) => config,
                    Err(e) => {
                        return self
                            .make_error_response(&request, format!("Invalid launch arguments: {e}"))
                    }
                };
                match self.launch(config).await {
                    Ok(session) => {
                        let stop_on_entry = session.stop_on_entry;
                        *self.session.lock().await = Some(session);
                        self.send_event(Event::Initialized).await;
                        if stop_on_entry {
                            self.send_event(stopped(StoppedEventReason::String("entry".to_string()), None))
                                .await;
                        }
                        ResponseBody::Launch
                    }
                    Err(message) => {
                        error!(%message, "launch failed");
                        return self.make_error_response(&request, message);
                    }
                }
            }
            Command::SetBreakpoints(ref args) => {
                let lines: BTreeSet<u32> = args
                    .breakpoints
                    .as_ref()
                    .map(|bs| bs.iter().filter_map(|b| u32::try_from(b.line).ok()).collect())
                    .unwrap_or_default();
                if let Some(ref mut session) = *self.session.lock().await {
                    session.debug.set_breakpoints(lines.iter().copied());
                }
                let breakpoints = lines
                    .iter()
                    .map(|line| Breakpoint {
                        verified: true,
                        line: Some(i64::from(*line)),
                        source: Some(args.source.clone()),
                        ..Default::default()
                    })
                    .collect();
                *self.breakpoints.lock().await = lines;
                ResponseBody::SetBreakpoints(dap::responses::SetBreakpointsResponse { breakpoints })
            }
            Command::ConfigurationDone => {
                let mut session_opt = self.session.lock().await;
                if let Some(ref mut session) = *session_opt {
                    if !session.stop_on_entry && session.status == SessionStatus::Paused {
                        let result = session.debug.run();
                        let event = Self::settle(session, result);
                        drop(session_opt);
                        self.send_event(event).await;
                    }
                }
                ResponseBody::ConfigurationDone
            }
            Command::Threads => {
                let session_opt = self.session.lock().await;
                let name = session_opt
                    .as_ref()
                    .map(|s| s.label.clone())
                    .unwrap_or_else(|| "module".to_string());
                ResponseBody::Threads(dap::responses::ThreadsResponse {
                    threads: vec![Thread {
                        id: THREAD_ID,
                        name,
                    }],
                })
            }
            Command::StackTrace(_) => {
                let session_opt = self.session.lock().await;
                let frames: Vec<StackFrame> = match *session_opt {
                    Some(ref session) => {
                        let source = Source {
                            name: session
                                .program
                                .file_name()
                                .map(|n| n.to_string_lossy().into_owned()),
                            path: Some(session.program.to_string_lossy().into_owned()),
                            ..Default::default()
                        };
                        session
                            .debug
                            .call_stack()
                            .into_iter()
                            .enumerate()
                            .map(|(i, entry)| StackFrame {
                                id: i as i64 + 1,
                                name: entry.name,
                                source: Some(source.clone()),
                                line: entry.line.map_or(0, i64::from),
                                column: 1,
                                ..Default::default()
                            })
                            .collect()
                    }
                    None => vec![],
                };
                let total = frames.len() as i64;
                ResponseBody::StackTrace(dap::responses::StackTraceResponse {
                    stack_frames: frames,
                    total_frames: Some(total),
                })
            }
            Command::Scopes(_) => ResponseBody::Scopes(dap::responses::ScopesResponse {
                scopes: vec![
                    Scope {
                        name: "Locals".to_string(),
                        variables_reference: LOCALS_REF,
                        expensive: false,
                        ..Default::default()
                    },
                    Scope {
                        name: "Globals".to_string(),
                        variables_reference: GLOBALS_REF,
                        expensive: false,
                        ..Default::default()
                    },
                ],
            }),
            Command::Variables(ref args) => {
                let session_opt = self.session.lock().await;
                let values = match *session_opt {
                    Some(ref session) => match args.variables_reference {
                        LOCALS_REF => variables(session.debug.exec().local_variables()),
                        GLOBALS_REF => variables(session.debug.exec().global_variables()),
                        _ => vec![],
                    },
                    None => vec![],
                };
                ResponseBody::Variables(dap::responses::VariablesResponse { variables: values })
            }
            Command::Continue(_) => {
                if let Err(message) = self.resume(WgslDebug::run).await {
                    return self.make_error_response(&request, message);
                }
                ResponseBody::Continue(dap::responses::ContinueResponse {
                    all_threads_continued: Some(true),
                })
            }
            Command::Next(_) => {
                if let Err(message) = self.resume(WgslDebug::step_over).await {
                    return self.make_error_response(&request, message);
                }
                ResponseBody::Next
            }
            Command::StepIn(_) => {
                if let Err(message) = self.resume(WgslDebug::step_into).await {
                    return self.make_error_response(&request, message);
                }
                ResponseBody::StepIn
            }
            Command::StepOut(_) => {
                if let Err(message) = self.resume(WgslDebug::step_out).await {
                    return self.make_error_response(&request, message);
                }
                ResponseBody::StepOut
            }
            // The server raises the pause flag on arrival; by now the run
            // that saw it has already reported its stop.
            Command::Pause(_) => ResponseBody::Pause,
            Command::Terminate(_) | Command::Disconnect(_) => {
                let mut session = self.session.lock().await;
                *session = None;
                ResponseBody::Disconnect
            }
            _ => return self.make_error_response(&request, "Not implemented".to_string()),
        };

        Response {
            request_seq: request.seq,
            success: true,
            body: Some(body),
            error: None,
            message: None,
        }
    }

    async fn launch(&self, config: LaunchConfig) -> Result<DebugSession, String> {
        info!(program = ?config.program, entry = ?config.entry, "launching shader");
        let source = tokio::fs::read_to_string(&config.program)
            .await
            .map_err(|e| format!("Cannot read {}: {e}", config.program.display()))?;
        let mut debug = WgslDebug::from_source(&source)
            .map_err(|e| format!("Compilation failed: {e}"))?
            .with_pause_handle(self.pause_handle());
        debug.set_breakpoints(self.breakpoints.lock().await.iter().copied());

        let exec_config = config.exec_config();
        let label = match &config.entry {
            Some(entry) => {
                let ids = debug
                    .start_invocation(
                        entry,
                        config.invocation,
                        config.dispatch,
                        &config.bind_groups(),
                        &exec_config,
                    )
                    .map_err(|e| format!("Cannot start '{entry}': {e}"))?;
                let [x, y, z] = ids.global_invocation_id();
                format!("{entry} ({x}, {y}, {z})")
            }
            None => {
                debug
                    .start(&exec_config)
                    .map_err(|e| format!("Module initialization failed: {e}"))?;
                "module".to_string()
            }
        };
        let status = if debug.is_finished() {
            SessionStatus::Finished
        } else {
            SessionStatus::Paused
        };
        Ok(DebugSession {
            debug,
            program: config.program,
            label,
            stop_on_entry: config.stop_on_entry,
            status,
        })
    }

    /// Drive the session with `action` and report where it stopped.
    async fn resume(
        &self,
        action: fn(&mut WgslDebug) -> wgsl_exec::Result<StopReason>,
    ) -> Result<(), String> {
        let mut session_opt = self.session.lock().await;
        let Some(ref mut session) = *session_opt else {
            return Err("No active debug session".to_string());
        };
        match &session.status {
            SessionStatus::Paused => {}
            SessionStatus::Finished => return Err("Execution has finished".to_string()),
            SessionStatus::Failed(message) => return Err(format!("Execution failed: {message}")),
        }
        let result = action(&mut session.debug);
        let event = Self::settle(session, result);
        drop(session_opt);
        self.send_event(event).await;
        Ok(())
    }

    /// Record the outcome of a run or step and build the event announcing it.
    fn settle(session: &mut DebugSession, result: wgsl_exec::Result<StopReason>) -> Event {
        match result {
            Ok(StopReason::Breakpoint(line)) => stopped(
                StoppedEventReason::Breakpoint,
                Some(format!("Paused on line {line}")),
            ),
            Ok(StopReason::Step) => stopped(StoppedEventReason::Step, None),
            Ok(StopReason::Pause) => stopped(StoppedEventReason::Pause, None),
            Ok(StopReason::Finished) => {
                info!("execution finished");
                session.status = SessionStatus::Finished;
                Event::Terminated(None)
            }
            Err(e) => {
                warn!(error = %e, "execution failed");
                session.status = SessionStatus::Failed(e.to_string());
                stopped(StoppedEventReason::Exception, Some(e.to_string()))
            }
        }
    }

    fn make_error_response(&self, request: &Request, message: String) -> Response {
        Response {
            request_seq: request.seq,
            success: false,
            body: None,
            error: Some(Message {
                id: 0,
                format: message.clone(),
                variables: HashMap::new(),
                send_telemetry: None,
                show_user: None,
                url: None,
                url_label: None,
            }),
            message: Some(dap::responses::ResponseMessage::Error(message)),
        }
    }
}
