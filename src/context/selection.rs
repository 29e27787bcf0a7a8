//! Selectors and pinned listings.
//!
//! `show vpcs` pins the list it printed; `set vpc 2` then means the second row of that
//! list and nothing else. Ids and unique labels work without a prior listing.

use crate::error::ShellError;
use crate::types::{ResourceKind, ResourceRecord};
use std::collections::HashMap;

/// Listing identity: resource kind plus the frame scope it was shown in.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PinKey {
    pub kind: ResourceKind,
    /// Resource id of the frame the list was shown in, `None` for root.
    pub scope: Option<String>,
}

impl PinKey {
    pub fn new(kind: ResourceKind, scope: Option<&str>) -> Self {
        Self {
            kind,
            scope: scope.map(str::to_string),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SelectionPins {
    pins: HashMap<PinKey, Vec<ResourceRecord>>,
}

impl SelectionPins {
    /// Replace the pinned list for `key`.
    pub fn pin(&mut self, key: PinKey, records: Vec<ResourceRecord>) {
        self.pins.insert(key, records);
    }

    pub fn get(&self, key: &PinKey) -> Option<&[ResourceRecord]> {
        self.pins.get(key).map(Vec::as_slice)
    }

    /// Pins become stale when profile or regions change.
    pub fn clear(&mut self) {
        self.pins.clear();
    }

    pub fn len(&self) -> usize {
        self.pins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pins.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    /// 1-based row of the pinned list.
    Index(usize),
    /// Id or label.
    Literal(String),
}

impl Selector {
    pub fn parse(input: &str) -> Result<Self, ShellError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(ShellError::invalid_argument("missing selector", input));
        }
        if trimmed.chars().all(|c| c.is_ascii_digit()) {
            let index: usize = trimmed
                .parse()
                .map_err(|_| ShellError::invalid_argument("index out of range", input))?;
            if index == 0 {
                return Err(ShellError::invalid_argument("indexes start at 1", input));
            }
            return Ok(Selector::Index(index));
        }
        Ok(Selector::Literal(trimmed.to_string()))
    }
}

/// Pick exactly one record.
///
/// Index selectors consult only `pinned`. Literal selectors match an exact id first,
/// then a case-insensitive label among `candidates`.
pub fn select(
    selector: &Selector,
    noun: &str,
    pinned: Option<&[ResourceRecord]>,
    candidates: &[ResourceRecord],
    input: &str,
) -> Result<ResourceRecord, ShellError> {
    match selector {
        Selector::Index(index) => {
            let pinned = pinned.filter(|p| !p.is_empty()).ok_or_else(|| {
                ShellError::not_found(
                    format!("no {} listed here; run `show {}` first", noun, noun),
                    input,
                )
            })?;
            pinned.get(index - 1).cloned().ok_or_else(|| {
                ShellError::not_found(
                    format!("index {} is out of range (1-{})", index, pinned.len()),
                    input,
                )
            })
        }
        Selector::Literal(literal) => {
            if let Some(record) = candidates.iter().find(|r| r.id == *literal) {
                return Ok(record.clone());
            }
            let by_label: Vec<&ResourceRecord> = candidates
                .iter()
                .filter(|r| !r.label.is_empty() && r.label.eq_ignore_ascii_case(literal))
                .collect();
            match by_label.as_slice() {
                [] => Err(ShellError::not_found(
                    format!("no {} matches '{}'", noun, literal),
                    input,
                )),
                [one] => Ok((*one).clone()),
                many => {
                    let ids: Vec<&str> = many.iter().map(|r| r.id.as_str()).collect();
                    Err(ShellError::ambiguous_selector(
                        format!("label matches {} resources: {}", many.len(), ids.join(", ")),
                        input,
                    ))
                }
            }
        }
    }
}
