//! Listings and per-resource views.

use crate::context::{FrameDetail, PinKey};
use crate::error::ShellError;
use crate::graph::ContextType;
use crate::routing::{RouteMatch, RoutingIndex};
use crate::shell::handlers::{CommandHandler, CommandOutcome, HandlerCtx, Transition};
use crate::shell::output::CommandOutput;
use crate::types::{value_text, ResourceKind, ResourceRecord, RouteTable};
use async_trait::async_trait;

/// `show <noun>`: resources of one kind under the current frame, pinned for index
/// selection.
pub struct ListResources {
    pub kind: ResourceKind,
}

#[async_trait]
impl CommandHandler for ListResources {
    async fn run(&self, ctx: &mut HandlerCtx<'_>) -> Result<CommandOutcome, ShellError> {
        ctx.no_args()?;
        let scope = ctx.stack.scope_id().map(str::to_string);
        let records = ctx
            .inventory
            .list(self.kind, scope.as_deref())
            .await
            .map_err(|e| ctx.inventory_error(e))?;
        ctx.pins
            .pin(PinKey::new(self.kind, scope.as_deref()), records.clone());
        Ok(CommandOutcome::output(CommandOutput::Records {
            title: title_for(&ctx.node.label, scope.as_deref()),
            kind: self.kind,
            records,
        }))
    }
}

fn title_for(noun: &str, scope: Option<&str>) -> String {
    match scope {
        Some(scope) => format!("{} in {}", noun, scope),
        None => noun.to_string(),
    }
}

/// Resources the current record refers to by id in one of its attributes, e.g. an
/// instance's security groups.
pub struct ShowReferenced {
    pub kind: ResourceKind,
    pub attribute: &'static str,
}

#[async_trait]
impl CommandHandler for ShowReferenced {
    async fn run(&self, ctx: &mut HandlerCtx<'_>) -> Result<CommandOutcome, ShellError> {
        ctx.no_args()?;
        let ids: Vec<String> = ctx
            .frame()
            .record()
            .and_then(|r| r.raw_attributes.get(self.attribute))
            .and_then(|v| v.as_array())
            .map(|items| items.iter().map(value_text).collect())
            .unwrap_or_default();
        let all = ctx
            .inventory
            .list(self.kind, None)
            .await
            .map_err(|e| ctx.inventory_error(e))?;
        let records: Vec<ResourceRecord> = all.into_iter().filter(|r| ids.contains(&r.id)).collect();
        Ok(CommandOutcome::output(CommandOutput::Records {
            title: title_for(&ctx.node.label, ctx.stack.scope_id()),
            kind: self.kind,
            records,
        }))
    }
}

/// `show detail`: the current resource, fetched again through the cache.
pub struct ShowDetail;

#[async_trait]
impl CommandHandler for ShowDetail {
    async fn run(&self, ctx: &mut HandlerCtx<'_>) -> Result<CommandOutcome, ShellError> {
        ctx.no_args()?;
        let frame = ctx.frame().clone();
        let id = frame
            .resource_id
            .clone()
            .ok_or_else(|| ShellError::invalid_transition("no resource selected", ctx.input))?;

        if frame.context == ContextType::RouteTable {
            let table = ctx
                .inventory
                .route_table(&id)
                .await
                .map_err(|e| ctx.inventory_error(e))?;
            return Ok(CommandOutcome::with_transition(
                route_table_detail(&table),
                Transition::RefreshDetail(FrameDetail::RouteTable(table)),
            ));
        }

        let kind = frame
            .context
            .resource_kind()
            .ok_or_else(|| ShellError::invalid_transition("no resource selected", ctx.input))?;
        let parent = ctx.parent_scope_id().map(str::to_string);
        let records = ctx
            .inventory
            .list(kind, parent.as_deref())
            .await
            .map_err(|e| ctx.inventory_error(e))?;
        let record = records.into_iter().find(|r| r.id == id).ok_or_else(|| {
            ShellError::not_found(format!("{} {} no longer exists", kind, id), ctx.input)
        })?;
        Ok(CommandOutcome::with_transition(
            record_detail(&record),
            Transition::RefreshDetail(FrameDetail::Resource(record)),
        ))
    }
}

fn record_detail(record: &ResourceRecord) -> CommandOutput {
    let mut fields = vec![
        ("id".to_string(), record.id.clone()),
        ("name".to_string(), record.label.clone()),
        ("kind".to_string(), record.kind.to_string()),
    ];
    if let Some(region) = &record.region {
        fields.push(("region".to_string(), region.clone()));
    }
    if let Some(parent) = &record.parent_id {
        fields.push(("parent".to_string(), parent.clone()));
    }
    for (key, value) in &record.raw_attributes {
        fields.push((key.clone(), value_text(value)));
    }
    CommandOutput::Detail {
        title: format!("{} {}", record.kind, record.display_label()),
        fields,
    }
}

fn route_table_detail(table: &RouteTable) -> CommandOutput {
    let mut fields = vec![
        ("id".to_string(), table.id.clone()),
        ("name".to_string(), table.label.clone()),
        (
            "owner".to_string(),
            format!("{} {}", table.owner_kind, table.owner_id),
        ),
        ("main".to_string(), table.main.to_string()),
        ("routes".to_string(), table.routes.len().to_string()),
        ("blackholes".to_string(), table.blackhole_count().to_string()),
        ("associations".to_string(), table.associations.len().to_string()),
        ("propagations".to_string(), table.propagations.len().to_string()),
    ];
    if let Some(region) = &table.region {
        fields.push(("region".to_string(), region.clone()));
    }
    CommandOutput::Detail {
        title: format!("route-table {}", table.id),
        fields,
    }
}

/// `show routes` in a route-table context, longest prefix first.
pub struct ShowRoutes;

#[async_trait]
impl CommandHandler for ShowRoutes {
    async fn run(&self, ctx: &mut HandlerCtx<'_>) -> Result<CommandOutcome, ShellError> {
        ctx.no_args()?;
        let table = current_table(ctx).await?;
        let views = RoutingIndex::new(&ctx.inventory).views(std::slice::from_ref(&table));
        let matches = views
            .into_iter()
            .flat_map(|view| {
                let id = view.route_table_id;
                view.routes.into_iter().map(move |route| RouteMatch {
                    route_table_id: id.clone(),
                    route,
                })
            })
            .collect();
        Ok(CommandOutcome::output(CommandOutput::Routes {
            title: format!("Routes in {}", table.id),
            matches,
        }))
    }
}

/// `show associations` / `show propagations`.
pub struct ShowTableEdges {
    pub propagations: bool,
}

#[async_trait]
impl CommandHandler for ShowTableEdges {
    async fn run(&self, ctx: &mut HandlerCtx<'_>) -> Result<CommandOutcome, ShellError> {
        ctx.no_args()?;
        let table = current_table(ctx).await?;
        let (title, edges) = if self.propagations {
            ("Propagations", &table.propagations)
        } else {
            ("Associations", &table.associations)
        };
        let rows = edges
            .iter()
            .map(|edge| {
                vec![
                    edge.attachment_id.clone(),
                    edge.resource_id.clone().unwrap_or_default(),
                    edge.attachment_type.clone(),
                    edge.state.clone(),
                ]
            })
            .collect();
        Ok(CommandOutcome::output(CommandOutput::Table {
            title: format!("{} of {}", title, table.id),
            headers: vec![
                "Attachment".to_string(),
                "Resource".to_string(),
                "Type".to_string(),
                "State".to_string(),
            ],
            rows,
        }))
    }
}

async fn current_table(ctx: &HandlerCtx<'_>) -> Result<RouteTable, ShellError> {
    let id = ctx
        .frame()
        .resource_id
        .clone()
        .ok_or_else(|| ShellError::invalid_transition("no route table selected", ctx.input))?;
    ctx.inventory
        .route_table(&id)
        .await
        .map_err(|e| ctx.inventory_error(e))
}
