use crate::types::{GetThreadIn, GetThreadOut, Thread};
use crate::{BackendError, DelveClient, Result};

pub const GET_THREAD: &str = "RPCServer.GetThread";

pub async fn get_thread(client: &mut DelveClient, id: i64) -> Result<Thread> {
    let out: GetThreadOut = client.call(GET_THREAD, &GetThreadIn { id }).await?;
    out.thread
        .ok_or_else(|| BackendError::InvalidResponse(format!("No thread with id {id}")))
}
