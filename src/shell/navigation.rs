//! Entering a child context.

use crate::context::{select, ContextFrame, FrameDetail, PinKey, Selector};
use crate::error::ShellError;
use crate::graph::{CommandNode, ContextType};
use crate::shell::output::CommandOutput;
use crate::shell::session::Session;

/// Resolve the selector in `args` and push a frame for `node`'s context.
///
/// Index selectors read the list pinned by the last `show <noun>` in this frame and the
/// picked id is confirmed against the current listing; ids and labels are matched
/// against that listing directly. Nothing changes on failure.
pub async fn enter(
    session: &mut Session,
    node: &CommandNode,
    args: &[String],
    input: &str,
) -> Result<CommandOutput, ShellError> {
    let target = node.enters.ok_or_else(|| {
        ShellError::invalid_transition(format!("`{}` does not enter a context", node.phrase()), input)
    })?;
    let kind = target.resource_kind().ok_or_else(|| {
        ShellError::invalid_transition("the root context cannot be entered", input)
    })?;
    let raw = match args {
        [raw] => raw.as_str(),
        [] => {
            return Err(ShellError::invalid_argument(
                format!("usage: set {} <index|id|label>", node.label),
                input,
            ))
        }
        _ => {
            return Err(ShellError::invalid_argument(
                "selectors containing spaces must be quoted",
                input,
            ))
        }
    };
    let selector = Selector::parse(raw)?;

    let inventory = session.inventory();
    let scope = session.stack.scope_id().map(str::to_string);
    let candidates = inventory
        .list(kind, scope.as_deref())
        .await
        .map_err(|e| ShellError::from_inventory(e, input))?;
    let pin_key = PinKey::new(kind, scope.as_deref());
    let picked = select(
        &selector,
        target.list_noun(),
        session.pins.get(&pin_key),
        &candidates,
        input,
    )?;
    // A pinned row must still be present in the inventory.
    let record = match selector {
        Selector::Index(_) => candidates
            .into_iter()
            .find(|c| c.id == picked.id)
            .ok_or_else(|| {
                ShellError::not_found(
                    format!(
                        "{} {} no longer exists; run `show {}` again",
                        kind,
                        picked.id,
                        target.list_noun()
                    ),
                    input,
                )
            })?,
        Selector::Literal(_) => picked,
    };

    let detail = if target == ContextType::RouteTable {
        let table = inventory
            .route_table(&record.id)
            .await
            .map_err(|e| ShellError::from_inventory(e, input))?;
        FrameDetail::RouteTable(table)
    } else {
        FrameDetail::Resource(record.clone())
    };

    session.stack.push(ContextFrame::new(
        target,
        node.path.clone(),
        record.id.clone(),
        record.label.clone(),
        detail,
    ))?;
    Ok(CommandOutput::message(format!(
        "Entered {} {}",
        target,
        record.display_label()
    )))
}
