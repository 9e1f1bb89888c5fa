use kabuta_core::{ops, Backend, DelveClient, LaunchSpec};

use crate::breakpoint::Resolution;
use crate::dispatch::{HandlerResult, Invocation, Reply};
use crate::error::CommandError;
use crate::session::Session;

/// `-exec-run`: starts Delve in the selected package directory, waits for
/// its API server, connects, then replays every breakpoint recorded so far.
pub async fn exec_run(session: &mut Session, inv: &mut Invocation<'_>) -> HandlerResult {
    if session.backend.is_some() {
        return Err(CommandError::Unresolved("the program is already running".into()));
    }
    let package_dir = session.package_dir.clone().ok_or_else(|| {
        CommandError::Unresolved("no executable selected; use file-exec-and-symbols first".into())
    })?;

    let spec = LaunchSpec::delve(
        &session.dlv_path,
        session.listen_addr,
        &package_dir,
        &session.target_args,
    )
    .with_envs(&session.env);
    inv.log(format!("Starting {}\n", spec.command_line()));

    let mut backend =
        Backend::launch(&spec).map_err(|e| CommandError::backend("cannot launch backend", e))?;
    if let Err(e) = backend.wait_ready(session.startup_timeout).await {
        backend.shutdown().await;
        return Err(CommandError::backend("backend failed to start", e));
    }
    backend.drain_to_log();

    let client = match DelveClient::connect(session.listen_addr, session.rpc_timeout).await {
        Ok(client) => client,
        Err(e) => {
            backend.shutdown().await;
            return Err(CommandError::backend("cannot connect to backend", e));
        }
    };
    session.backend = Some(backend);
    session.rpc = Some(client);

    replay_breakpoints(session, inv).await;
    Ok(Reply::running())
}

/// A breakpoint the backend rejects is marked failed and reported on the
/// console; the run still proceeds.
async fn replay_breakpoints(session: &mut Session, inv: &mut Invocation<'_>) {
    let Some(rpc) = session.rpc.as_mut() else {
        return;
    };
    if session.breakpoints.is_empty() {
        return;
    }
    let pending = session.breakpoints.iter().filter(|bp| bp.is_pending()).count();
    tracing::info!("Replaying {} of {} breakpoints", pending, session.breakpoints.len());

    for bp in session.breakpoints.iter_mut() {
        if !bp.is_pending() {
            continue;
        }
        match ops::create_breakpoint(rpc, bp.backend_request()).await {
            Ok(created) => {
                tracing::info!("Set breakpoint {} at {}", bp.number, bp.raw_location);
                bp.resolution = Resolution::Resolved(created);
            }
            Err(e) => {
                tracing::warn!("Error setting breakpoint {} at {}: {}", bp.number, bp.raw_location, e);
                inv.console(format!(
                    "Error setting breakpoint {} at {}: {}\n",
                    bp.number, bp.raw_location, e
                ));
                bp.resolution = Resolution::Failed(e.to_string());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::breakpoint::Location;
    use crate::parser::parse_line;
    use crate::response::StreamRecord;
    use crate::test_support::{resolve_breakpoints, FakeDelve, TempDir};
    use kabuta_core::Config;

    #[tokio::test]
    async fn test_run_requires_package_dir() {
        let mut session = Session::new(&Config::default());
        let command = parse_line("5-exec-run").unwrap();
        let mut inv = Invocation::new(&command, 0);

        let err = exec_run(&mut session, &mut inv).await.unwrap_err();
        assert!(matches!(err, CommandError::Unresolved(_)));
        assert!(session.backend.is_none());
    }

    #[cfg(unix)]
    fn fake_dlv(dir: &TempDir, body: &str) -> String {
        use std::os::unix::fs::PermissionsExt;

        let script = dir.write("dlv", &format!("#!/bin/sh\n{body}\n"));
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
        script.display().to_string()
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_launches_connects_and_replays_breakpoints() {
        let delve = FakeDelve::start(|method, params| {
            if params["Breakpoint"]["functionName"] == "nope" {
                return Err("could not find function nope".into());
            }
            resolve_breakpoints(method, params)
        })
        .await;
        let dir = TempDir::new("exec-run");
        let mut session = Session::new(&Config::default());
        session.dlv_path = fake_dlv(&dir, "echo \"API server listening at: ${5#--listen=}\"\nexec sleep 30");
        session.listen_addr = delve.addr;
        session.package_dir = Some(dir.path().to_path_buf());
        session
            .breakpoints
            .push("main.main", Location::Function("main.main".into()), Resolution::Pending);
        session
            .breakpoints
            .push("nope", Location::Function("nope".into()), Resolution::Pending);

        let command = parse_line("5-exec-run").unwrap();
        let mut inv = Invocation::new(&command, 0);
        let reply = exec_run(&mut session, &mut inv).await.unwrap();

        assert_eq!(reply, Reply::running());
        assert!(session.rpc.is_some());
        let records = inv.records();
        assert!(matches!(&records[0], StreamRecord::Output(text) if text.starts_with("Starting ")));
        assert!(matches!(&records[1], StreamRecord::Console(text) if text.contains("Error setting breakpoint 2 at nope")));
        assert_eq!(
            delve.methods(),
            vec!["RPCServer.CreateBreakpoint", "RPCServer.CreateBreakpoint"]
        );
        let resolutions: Vec<_> = session.breakpoints.iter().map(|bp| bp.resolution.clone()).collect();
        assert!(matches!(resolutions[0], Resolution::Resolved(ref bp) if bp.function_name == "main.main"));
        assert!(matches!(resolutions[1], Resolution::Failed(ref msg) if msg.contains("could not find function nope")));

        session.shutdown().await;
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_reports_fatal_startup_line() {
        let dir = TempDir::new("exec-run-fatal");
        let mut session = Session::new(&Config::default());
        session.dlv_path = fake_dlv(&dir, "echo 'exec: \"go\": executable file not found in $PATH' >&2\nexec sleep 30");
        session.package_dir = Some(dir.path().to_path_buf());

        let command = parse_line("5-exec-run").unwrap();
        let mut inv = Invocation::new(&command, 0);
        let err = exec_run(&mut session, &mut inv).await.unwrap_err();

        assert!(err.to_string().contains("executable file not found in $PATH"), "{err}");
        assert!(session.backend.is_none());
        assert!(session.rpc.is_none());
    }
}
