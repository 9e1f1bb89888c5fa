use crate::types::{Goroutine, ListGoroutinesIn, ListGoroutinesOut};
use crate::{DelveClient, Result};

pub const LIST_GOROUTINES: &str = "RPCServer.ListGoroutines";

pub async fn list_goroutines(client: &mut DelveClient) -> Result<Vec<Goroutine>> {
    let out: ListGoroutinesOut = client.call(LIST_GOROUTINES, &ListGoroutinesIn::default()).await?;
    Ok(out.goroutines)
}
