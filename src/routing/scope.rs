//! Which route tables a command sees from the current frame.

use crate::context::ContextFrame;
use crate::error::ShellError;
use crate::graph::ContextType;
use crate::inventory::CachedInventory;
use crate::types::RouteTable;

/// Route tables in scope of `frame`:
/// the table itself in a route-table context, the owner's tables in vpc,
/// transit-gateway and core-network contexts, and every known table at root.
pub async fn tables_in_scope(
    inventory: &CachedInventory,
    frame: &ContextFrame,
    input: &str,
) -> Result<Vec<RouteTable>, ShellError> {
    let resource_id = frame.resource_id.as_deref();
    let result = match (frame.context, resource_id) {
        (ContextType::Root, _) => inventory.route_tables(None).await,
        (ContextType::RouteTable, Some(id)) => inventory.route_table(id).await.map(|t| vec![t]),
        (ContextType::Vpc | ContextType::TransitGateway | ContextType::CoreNetwork, Some(id)) => {
            inventory.route_tables(Some(id)).await
        }
        (context, _) => {
            return Err(ShellError::invalid_transition(
                format!("route lookups are not available in {} context", context),
                input,
            ))
        }
    };
    result.map_err(|e| ShellError::from_inventory(e, input))
}
