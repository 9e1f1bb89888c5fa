use kabuta_core::ops;

use crate::dispatch::{HandlerResult, Reply};
use crate::error::CommandError;
use crate::response::{field, MiValue};
use crate::session::Session;

/// Lists goroutines as GDB threads. A goroutine is `WAITING` when its OS
/// thread is stopped at a breakpoint, `RUNNING` otherwise.
pub async fn thread_list_ids(session: &mut Session) -> HandlerResult {
    let rpc = session.rpc_mut()?;
    let goroutines = ops::list_goroutines(rpc)
        .await
        .map_err(|e| CommandError::backend("error listing threads", e))?;

    let mut ids = Vec::with_capacity(goroutines.len());
    let mut threads = Vec::with_capacity(goroutines.len());
    for goroutine in &goroutines {
        tracing::debug!("Thread information: {:?}", goroutine);

        // Goroutines not bound to an OS thread have nothing to inspect.
        let waiting = if goroutine.thread_id == 0 {
            false
        } else {
            ops::get_thread(rpc, goroutine.thread_id)
                .await
                .map_err(|e| CommandError::backend("error listing threads", e))?
                .breakpoint
                .is_some()
        };

        ids.push(field("thread-id", MiValue::string(goroutine.id)));
        threads.push(field(
            "thread",
            MiValue::Tuple(vec![
                field("thread-id", MiValue::string(goroutine.id)),
                field("state", MiValue::string(if waiting { "WAITING" } else { "RUNNING" })),
                field("mach-port-number", MiValue::string("0xffff")),
                field("pthread-id", MiValue::string(goroutine.id)),
                field("unique-id", MiValue::string(goroutine.id)),
            ]),
        ));
    }

    Ok(Reply::done()
        .with_field("thread-ids", MiValue::Tuple(ids))
        .with_field("number-of-threads", MiValue::string(goroutines.len()))
        .with_field("threads", MiValue::ResultList(threads)))
}
