//! Command dispatch: handler id → handler, one response per request.

use std::collections::HashMap;

use crate::error::CommandError;
use crate::handlers;
use crate::parser::Command;
use crate::request::Request;
use crate::response::{MiValue, Response, ResultClass, StreamRecord};
use crate::scan::PackageScanner;
use crate::session::Session;

/// Every command the bridge answers, keyed by its handler id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Handler {
    BreakInsert,
    DataEvaluateExpression,
    EnvironmentCd,
    ExecRun,
    FileExecAndSymbols,
    GdbExit,
    GdbSet,
    GdbShow,
    GdbVersion,
    InferiorTtySet,
    InfoThreads,
    Source,
    StackInfoDepth,
    StackListFrames,
    ThreadListIds,
}

impl Handler {
    pub const ALL: [Handler; 15] = [
        Handler::BreakInsert,
        Handler::DataEvaluateExpression,
        Handler::EnvironmentCd,
        Handler::ExecRun,
        Handler::FileExecAndSymbols,
        Handler::GdbExit,
        Handler::GdbSet,
        Handler::GdbShow,
        Handler::GdbVersion,
        Handler::InferiorTtySet,
        Handler::InfoThreads,
        Handler::Source,
        Handler::StackInfoDepth,
        Handler::StackListFrames,
        Handler::ThreadListIds,
    ];

    pub fn id(self) -> &'static str {
        match self {
            Handler::BreakInsert => "BreakInsert",
            Handler::DataEvaluateExpression => "DataEvaluateExpression",
            Handler::EnvironmentCd => "EnvironmentCd",
            Handler::ExecRun => "ExecRun",
            Handler::FileExecAndSymbols => "FileExecAndSymbols",
            Handler::GdbExit => "GdbExit",
            Handler::GdbSet => "GdbSet",
            Handler::GdbShow => "GdbShow",
            Handler::GdbVersion => "GdbVersion",
            Handler::InferiorTtySet => "InferiorTtySet",
            Handler::InfoThreads => "InfoThreads",
            Handler::Source => "Source",
            Handler::StackInfoDepth => "StackInfoDepth",
            Handler::StackListFrames => "StackListFrames",
            Handler::ThreadListIds => "ThreadListIds",
        }
    }

    async fn run(
        self,
        session: &mut Session,
        inv: &mut Invocation<'_>,
        scanner: &dyn PackageScanner,
    ) -> HandlerResult {
        match self {
            Handler::BreakInsert => handlers::breakpoints::break_insert(session, inv).await,
            Handler::DataEvaluateExpression => handlers::gdb::data_evaluate_expression(inv),
            Handler::EnvironmentCd => handlers::environment::environment_cd(session, inv, scanner),
            Handler::ExecRun => handlers::exec::exec_run(session, inv).await,
            Handler::FileExecAndSymbols => handlers::environment::file_exec_and_symbols(session, inv),
            Handler::GdbSet => handlers::gdb::gdb_set(session, inv),
            Handler::GdbShow => handlers::gdb::gdb_show(inv),
            Handler::GdbVersion => handlers::gdb::gdb_version(inv),
            Handler::InferiorTtySet | Handler::Source => handlers::gdb::noop(inv),
            Handler::InfoThreads | Handler::ThreadListIds => handlers::threads::thread_list_ids(session).await,
            Handler::StackInfoDepth => handlers::stack::stack_info_depth(session, inv).await,
            Handler::StackListFrames => handlers::stack::stack_list_frames(session, inv).await,
            Handler::GdbExit => handlers::gdb::gdb_exit(inv),
        }
    }
}

/// Handler id → handler, built once at startup.
#[derive(Debug, Clone)]
pub struct Registry {
    handlers: HashMap<&'static str, Handler>,
}

impl Default for Registry {
    fn default() -> Self {
        Self {
            handlers: Handler::ALL.iter().map(|h| (h.id(), *h)).collect(),
        }
    }
}

impl Registry {
    pub fn get(&self, id: &str) -> Option<Handler> {
        self.handlers.get(id).copied()
    }

    /// First candidate that names a handler, with the words it absorbed.
    pub fn resolve(&self, command: &Command) -> Option<(Handler, usize)> {
        command
            .handler_candidates()
            .iter()
            .find_map(|(id, consumed)| self.get(id).map(|h| (h, *consumed)))
    }
}

/// What a handler sees of the command it is running for.
#[derive(Debug)]
pub struct Invocation<'a> {
    pub command: &'a Command,
    /// Arguments after the words that named the handler.
    pub args: &'a [String],
    records: Vec<StreamRecord>,
}

impl<'a> Invocation<'a> {
    pub fn new(command: &'a Command, consumed: usize) -> Self {
        Self {
            command,
            args: command.args.get(consumed..).unwrap_or_default(),
            records: Vec::new(),
        }
    }

    /// Raw argument text, minus any words absorbed into the handler name.
    pub fn args_str(&self) -> String {
        if self.args.len() == self.command.args.len() {
            self.command.args_str.clone()
        } else {
            self.args.join(" ")
        }
    }

    pub fn console(&mut self, text: impl Into<String>) {
        self.records.push(StreamRecord::Console(text.into()));
    }

    pub fn log(&mut self, text: impl Into<String>) {
        self.records.push(StreamRecord::Output(text.into()));
    }

    pub fn records(&self) -> &[StreamRecord] {
        &self.records
    }
}

/// Successful handler outcome.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Reply {
    pub class: ResultClass,
    pub fields: Vec<(String, MiValue)>,
}

impl Reply {
    pub fn done() -> Self {
        Self::default()
    }

    pub fn running() -> Self {
        Self {
            class: ResultClass::Running,
            fields: Vec::new(),
        }
    }

    /// Ends the session; the dispatcher writes nothing for it.
    pub fn exit() -> Self {
        Self {
            class: ResultClass::Exit,
            fields: Vec::new(),
        }
    }

    pub fn with_field(mut self, key: &str, value: MiValue) -> Self {
        self.fields.push((key.to_string(), value));
        self
    }
}

pub type HandlerResult = Result<Reply, CommandError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatched {
    /// Stream records plus the terminal response, ready to write.
    Output(String),
    /// Unclassified line; nothing to write.
    Ignored,
    /// `gdb-exit`: stop without responding.
    Exit,
}

pub struct Dispatcher {
    registry: Registry,
    scanner: Box<dyn PackageScanner>,
}

impl Dispatcher {
    pub fn new(scanner: Box<dyn PackageScanner>) -> Self {
        Self {
            registry: Registry::default(),
            scanner,
        }
    }

    pub async fn dispatch(&self, session: &mut Session, request: &Request) -> Dispatched {
        let Some(command) = &request.command else {
            return Dispatched::Ignored;
        };

        let mut out = String::new();
        let response = match self.registry.resolve(command) {
            Some((handler, consumed)) => {
                tracing::debug!("Dispatching {} to {}", command, handler.id());
                let mut inv = Invocation::new(command, consumed);
                let result = handler.run(session, &mut inv, self.scanner.as_ref()).await;
                out.extend(inv.records().iter().map(StreamRecord::render));
                match result {
                    Ok(reply) if reply.class == ResultClass::Exit => {
                        tracing::info!("Exit command received");
                        return Dispatched::Exit;
                    }
                    Ok(reply) => Response {
                        class: reply.class,
                        fields: reply.fields,
                        ..Response::done()
                    },
                    Err(e) => {
                        tracing::warn!("{} failed: {}", command, e);
                        Response::error(e.to_string())
                    }
                }
            }
            None => {
                let handler_id = command
                    .handler_candidates()
                    .pop()
                    .map(|(id, _)| id)
                    .unwrap_or_default();
                let e = CommandError::UnknownCommand {
                    raw: request.raw.clone(),
                    handler_id,
                };
                tracing::warn!("{}", e);
                Response::error(e.to_string())
            }
        };

        out.push_str(&response.render(command.kind, request.token(), &request.timing()));
        Dispatched::Output(out)
    }
}
