//! Command output and its table/JSON rendering.

use crate::routing::{NextHop, RouteMatch, TraceOutcome, TraceResult};
use crate::types::{ResourceKind, ResourceRecord};
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use owo_colors::OwoColorize;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "table" | "text" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            other => Err(format!("unknown output format '{}' (expected table or json)", other)),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Table => f.write_str("table"),
            OutputFormat::Json => f.write_str("json"),
        }
    }
}

/// What a command produced, before rendering.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum CommandOutput {
    Empty,
    Message {
        text: String,
    },
    Table {
        title: String,
        headers: Vec<String>,
        rows: Vec<Vec<String>>,
    },
    Records {
        title: String,
        kind: ResourceKind,
        records: Vec<ResourceRecord>,
    },
    Detail {
        title: String,
        fields: Vec<(String, String)>,
    },
    Routes {
        title: String,
        matches: Vec<RouteMatch>,
    },
    Trace {
        result: TraceResult,
    },
    Document {
        format: String,
        body: String,
    },
    Sections {
        sections: Vec<CommandOutput>,
    },
}

/// Attributes shown as extra columns when a listing has them.
const RECORD_COLUMNS: &[&str] = &["cidr", "state", "private_ip", "type"];

impl CommandOutput {
    pub fn message(text: impl Into<String>) -> Self {
        CommandOutput::Message { text: text.into() }
    }

    /// Worth keeping for `write`.
    pub fn is_data(&self) -> bool {
        !matches!(self, CommandOutput::Empty | CommandOutput::Message { .. })
    }

    pub fn render(&self, format: OutputFormat) -> String {
        self.render_styled(format, false)
    }

    /// Render for display; `styled` adds terminal emphasis to headings.
    pub fn render_styled(&self, format: OutputFormat, styled: bool) -> String {
        match format {
            OutputFormat::Json => serde_json::to_string_pretty(self)
                .unwrap_or_else(|e| format!("{{\"error\": \"{}\"}}", e)),
            OutputFormat::Table => {
                let mut out = String::new();
                self.render_text(&mut out, styled);
                out.trim_end().to_string()
            }
        }
    }

    fn render_text(&self, out: &mut String, styled: bool) {
        match self {
            CommandOutput::Empty => {}
            CommandOutput::Message { text } => {
                out.push_str(text);
                out.push('\n');
            }
            CommandOutput::Table {
                title,
                headers,
                rows,
            } => {
                heading(out, title, styled);
                if rows.is_empty() {
                    out.push_str("(none)\n");
                    return;
                }
                let mut table = Table::new();
                table.load_preset(UTF8_BORDERS_ONLY);
                table.set_header(headers.clone());
                for row in rows {
                    table.add_row(row.clone());
                }
                out.push_str(&format!("{}\n", table));
            }
            CommandOutput::Records {
                title,
                kind,
                records,
            } => {
                heading(out, title, styled);
                if records.is_empty() {
                    out.push_str(&format!("No {} found.\n", kind));
                    return;
                }
                let extra: Vec<&str> = RECORD_COLUMNS
                    .iter()
                    .copied()
                    .filter(|col| records.iter().any(|r| r.raw_attributes.contains_key(*col)))
                    .collect();
                let mut header = vec!["#", "ID", "Name", "Region"];
                header.extend(extra.iter().copied());
                let mut table = Table::new();
                table.load_preset(UTF8_BORDERS_ONLY);
                table.set_header(header);
                for (i, record) in records.iter().enumerate() {
                    let mut row = vec![
                        (i + 1).to_string(),
                        record.id.clone(),
                        record.label.clone(),
                        record.region.clone().unwrap_or_default(),
                    ];
                    for col in &extra {
                        row.push(record.attribute_text(col).unwrap_or_default());
                    }
                    table.add_row(row);
                }
                out.push_str(&format!("{}\n", table));
            }
            CommandOutput::Detail { title, fields } => {
                heading(out, title, styled);
                let width = fields.iter().map(|(k, _)| k.len()).max().unwrap_or(0);
                for (key, value) in fields {
                    out.push_str(&format!("  {:width$}  {}\n", key, value, width = width));
                }
            }
            CommandOutput::Routes { title, matches } => {
                heading(out, title, styled);
                if matches.is_empty() {
                    out.push_str("(no routes)\n");
                    return;
                }
                let mut table = Table::new();
                table.load_preset(UTF8_BORDERS_ONLY);
                table.set_header(vec!["Route table", "Destination", "Target", "Type", "State"]);
                for m in matches {
                    table.add_row(vec![
                        m.route_table_id.clone(),
                        m.route.destination.to_string(),
                        m.route.target_id.clone(),
                        m.route.target_kind.to_string(),
                        m.route.state.to_string(),
                    ]);
                }
                out.push_str(&format!("{}\n", table));
            }
            CommandOutput::Trace { result } => render_trace(out, result, styled),
            CommandOutput::Document { body, .. } => {
                out.push_str(body);
                if !body.ends_with('\n') {
                    out.push('\n');
                }
            }
            CommandOutput::Sections { sections } => {
                for section in sections {
                    section.render_text(out, styled);
                    out.push('\n');
                }
            }
        }
    }
}

fn heading(out: &mut String, title: &str, styled: bool) {
    if title.is_empty() {
        return;
    }
    if styled {
        out.push_str(&format!("{}\n", title.bold().underline()));
    } else {
        out.push_str(&format!("{}\n", title));
    }
}

fn render_trace(out: &mut String, result: &TraceResult, styled: bool) {
    heading(out, &format!("Trace to {}", result.destination), styled);
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Hop", "Route table", "Matched", "Next hop"]);
    for (i, hop) in result.hops.iter().enumerate() {
        let next = match &hop.next_hop {
            NextHop::Table { route_table_id } => format!("table {}", route_table_id),
            NextHop::Target {
                target_kind,
                target_id,
            } => format!("{} {}", target_kind, target_id),
            NextHop::Dropped => "dropped (blackhole)".to_string(),
        };
        table.add_row(vec![
            (i + 1).to_string(),
            hop.route_table_id.clone(),
            hop.matched_route.destination.to_string(),
            next,
        ]);
    }
    out.push_str(&format!("{}\n", table));
    let verdict = match &result.outcome {
        TraceOutcome::Delivered {
            target_kind,
            target_id,
        } => format!("Delivered to {} {}", target_kind, target_id),
        TraceOutcome::Blackholed { route_table_id } => {
            format!("Dropped by blackhole route in {}", route_table_id)
        }
        TraceOutcome::Unreachable { route_table_id } => {
            format!("Unreachable: no route in {}", route_table_id)
        }
        TraceOutcome::RoutingLoopDetected { route_table_id } => {
            format!("Routing loop back into {}", route_table_id)
        }
        TraceOutcome::AmbiguousRoute {
            route_table_id,
            candidates,
        } => format!(
            "Ambiguous: {} equal-length routes in {}",
            candidates.len(),
            route_table_id
        ),
    };
    out.push_str(&verdict);
    out.push('\n');
}
