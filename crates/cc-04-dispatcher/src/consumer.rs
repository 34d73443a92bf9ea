//! # Consumer Chain
//!
//! An ordered sequence of processing stages. Each stage returns a verdict
//! that may short-circuit the remaining stages for that element while
//! leaving sibling elements untouched.

use crate::element::{AbortReason, DispatcherElement, Verdict};
use tracing::{debug, warn};

/// Result of one consumer stage for one element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsumerResult {
    /// Proceed to the next stage.
    Continue,
    /// Skip the remaining stages; the element succeeded.
    Complete,
    /// Skip the remaining stages; the element failed.
    Abort(AbortReason),
}

/// One processing stage.
pub trait Consumer: Send + Sync {
    /// Stage name, for logs and abort diagnostics.
    fn name(&self) -> &str;

    /// Processes one element.
    fn consume(&self, element: &mut DispatcherElement) -> ConsumerResult;
}

/// Adapter wrapping a closure as a [`Consumer`].
pub struct FunctionalConsumer<F> {
    name: String,
    handler: F,
}

impl<F> FunctionalConsumer<F>
where
    F: Fn(&mut DispatcherElement) -> ConsumerResult + Send + Sync,
{
    /// Wraps `handler` under `name`.
    pub fn new(name: impl Into<String>, handler: F) -> Self {
        Self {
            name: name.into(),
            handler,
        }
    }
}

impl<F> Consumer for FunctionalConsumer<F>
where
    F: Fn(&mut DispatcherElement) -> ConsumerResult + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn consume(&self, element: &mut DispatcherElement) -> ConsumerResult {
        (self.handler)(element)
    }
}

/// The ordered stages one element runs through.
pub struct ConsumerChain {
    stages: Vec<Box<dyn Consumer>>,
}

impl ConsumerChain {
    /// Creates an empty chain.
    pub fn new() -> Self {
        Self { stages: Vec::new() }
    }

    /// Appends `stage` to the chain.
    pub fn add_stage(mut self, stage: Box<dyn Consumer>) -> Self {
        debug!(stage = stage.name(), "Consumer stage added");
        self.stages.push(stage);
        self
    }

    /// Number of stages.
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// True if the chain has no stages.
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Runs `element` through the stages in order.
    pub fn process(&self, element: &mut DispatcherElement) -> Verdict {
        for stage in &self.stages {
            match stage.consume(element) {
                ConsumerResult::Continue => {}
                ConsumerResult::Complete => {
                    debug!(
                        element_id = element.id,
                        stage = stage.name(),
                        "Element completed early"
                    );
                    return Verdict::Success;
                }
                ConsumerResult::Abort(reason) => {
                    warn!(
                        element_id = element.id,
                        stage = stage.name(),
                        ?reason,
                        "Element aborted"
                    );
                    return Verdict::Aborted(reason);
                }
            }
        }
        Verdict::Success
    }
}

impl Default for ConsumerChain {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::ElementInput;

    fn element() -> DispatcherElement {
        DispatcherElement::new(1, ElementInput::Transactions(vec![]))
    }

    #[test]
    fn test_all_stages_continue_is_success() {
        let chain = ConsumerChain::new()
            .add_stage(Box::new(FunctionalConsumer::new("a", |_e| {
                ConsumerResult::Continue
            })))
            .add_stage(Box::new(FunctionalConsumer::new("b", |_e| {
                ConsumerResult::Continue
            })));

        assert_eq!(chain.process(&mut element()), Verdict::Success);
    }

    #[test]
    fn test_complete_short_circuits() {
        let chain = ConsumerChain::new()
            .add_stage(Box::new(FunctionalConsumer::new("a", |_e| {
                ConsumerResult::Complete
            })))
            .add_stage(Box::new(FunctionalConsumer::new("b", |_e| {
                ConsumerResult::Abort(AbortReason::Validation("unreached".into()))
            })));

        assert_eq!(chain.process(&mut element()), Verdict::Success);
    }

    #[test]
    fn test_abort_short_circuits_with_reason() {
        let chain = ConsumerChain::new()
            .add_stage(Box::new(FunctionalConsumer::new("a", |_e| {
                ConsumerResult::Abort(AbortReason::Validation("bad signature".into()))
            })))
            .add_stage(Box::new(FunctionalConsumer::new("b", |_e| {
                ConsumerResult::Complete
            })));

        assert_eq!(
            chain.process(&mut element()),
            Verdict::Aborted(AbortReason::Validation("bad signature".into()))
        );
    }

    #[test]
    fn test_empty_chain_is_success() {
        let chain = ConsumerChain::new();
        assert_eq!(chain.process(&mut element()), Verdict::Success);
    }
}
