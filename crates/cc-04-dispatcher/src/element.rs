//! # Dispatcher Elements
//!
//! The unit of work owned by the pipeline from admission until verdict
//! delivery, and the verdict taxonomy producers receive back.

use shared_types::{Block, Height, Transaction};

/// Payload of one dispatcher element.
#[derive(Debug, Clone)]
pub enum ElementInput {
    /// A range of consecutive blocks to apply.
    Blocks(Vec<Block>),
    /// A batch of unconfirmed transactions to validate.
    Transactions(Vec<Transaction>),
    /// A maintenance request routed through the pipeline so it obeys the
    /// same single-writer discipline as block processing.
    Maintenance(MaintenanceRequest),
}

impl ElementInput {
    /// Short name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Blocks(_) => "blocks",
            Self::Transactions(_) => "transactions",
            Self::Maintenance(_) => "maintenance",
        }
    }
}

/// A maintenance request processed by the consumer chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaintenanceRequest {
    /// Prune expired history records at the current cache height.
    Prune,
    /// Serialize every sub-cache through its storage policy.
    Checkpoint,
}

/// Lifecycle state of one element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementState {
    /// Submitted, not yet past the admission check.
    Enqueued,
    /// Past admission; owned by the pipeline.
    Admitted,
    /// Currently running through the consumer chain.
    InFlight,
    /// Verdict delivered.
    Completed,
    /// Refused at admission; never entered the queue.
    Rejected,
}

/// Why an element was aborted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbortReason {
    /// A validation stage rejected the element.
    Validation(String),
    /// An observer rejected a notification during execution.
    Observer(String),
    /// The dispatcher shut down before the element was processed.
    Shutdown,
    /// An internal invariant failed while processing the element.
    Internal(String),
}

/// Terminal result delivered to the submitting producer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Every stage passed; state changes were committed.
    Success,
    /// A stage aborted the element; its state changes were rolled back.
    Aborted(AbortReason),
}

impl Verdict {
    /// True for [`Verdict::Success`].
    pub fn is_success(&self) -> bool {
        Self::Success == *self
    }
}

/// One unit of work flowing through the pipeline.
#[derive(Debug)]
pub struct DispatcherElement {
    /// Monotonically increasing element id.
    pub id: u64,
    /// The work payload.
    pub input: ElementInput,
    /// Current lifecycle state.
    pub state: ElementState,
    /// Height resolved while processing (set by consumer stages).
    pub processed_height: Option<Height>,
}

impl DispatcherElement {
    /// Creates an admitted element.
    pub fn new(id: u64, input: ElementInput) -> Self {
        Self {
            id,
            input,
            state: ElementState::Admitted,
            processed_height: None,
        }
    }

    /// Number of blocks or transactions carried by this element.
    pub fn payload_size(&self) -> usize {
        match &self.input {
            ElementInput::Blocks(blocks) => blocks.len(),
            ElementInput::Transactions(transactions) => transactions.len(),
            ElementInput::Maintenance(_) => 1,
        }
    }
}
