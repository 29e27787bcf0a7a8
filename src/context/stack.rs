//! Stack of context frames. Frame 0 is always root.

use crate::context::frame::{ContextFrame, FrameDetail};
use crate::error::ShellError;
use tracing::info;

/// root → global-network → core-network → route-table.
pub const MAX_DEPTH: usize = 4;

#[derive(Debug, Clone)]
pub struct ContextStack {
    frames: Vec<ContextFrame>,
}

impl Default for ContextStack {
    fn default() -> Self {
        Self::new()
    }
}

impl ContextStack {
    pub fn new() -> Self {
        Self {
            frames: vec![ContextFrame::root()],
        }
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    /// Frames above root.
    pub fn depth(&self) -> usize {
        self.frames.len() - 1
    }

    pub fn top(&self) -> &ContextFrame {
        // Root is never popped, so there is always a last frame.
        &self.frames[self.frames.len() - 1]
    }

    pub fn frames(&self) -> &[ContextFrame] {
        &self.frames
    }

    /// Push `frame` on top. The frame must be enterable from the current top.
    pub fn push(&mut self, mut frame: ContextFrame) -> Result<(), ShellError> {
        let top = self.top();
        if !frame.context.entered_from().contains(&top.context) {
            return Err(ShellError::invalid_transition(
                format!("cannot enter {} from {}", frame.context, top.context),
                frame.context.name(),
            ));
        }
        if self.frames.len() >= MAX_DEPTH {
            return Err(ShellError::invalid_transition(
                format!("context depth limit of {} reached", MAX_DEPTH),
                frame.context.name(),
            ));
        }
        frame.parent = Some(self.frames.len() - 1);
        info!(
            context = %frame.context,
            resource = frame.resource_id.as_deref().unwrap_or_default(),
            depth = self.frames.len(),
            "Entered context"
        );
        self.frames.push(frame);
        Ok(())
    }

    /// Return to the frame that pushed the top one.
    pub fn pop(&mut self) -> Result<ContextFrame, ShellError> {
        let parent = self.top().parent.ok_or(ShellError::CannotExitRoot)?;
        let popped = self.frames.split_off(parent + 1);
        info!(depth = self.depth(), "Left context");
        popped.into_iter().next().ok_or(ShellError::CannotExitRoot)
    }

    pub fn pop_to_root(&mut self) {
        self.frames.truncate(1);
    }

    pub fn refresh_top_detail(&mut self, detail: FrameDetail) {
        let last = self.frames.len() - 1;
        self.frames[last].cached_detail = detail;
    }

    /// `vpc:prod/rtb:rtb-1`, empty at root.
    pub fn path_label(&self) -> String {
        self.frames
            .iter()
            .skip(1)
            .map(ContextFrame::display)
            .collect::<Vec<_>>()
            .join("/")
    }

    /// Resource id of the top frame, `None` at root.
    pub fn scope_id(&self) -> Option<&str> {
        self.top().resource_id.as_deref()
    }
}
