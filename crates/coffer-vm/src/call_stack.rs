//! Call stack tracking for nested contract calls.
//!
//! Bounds how deep contracts can call into each other within one
//! transaction and, when configured, rejects a contract being entered
//! again while it is already on the stack.

use crate::error::VmError;
use crate::MAX_CALL_DEPTH;
use coffer_types::AccountId;

/// A single frame in the call stack.
#[derive(Debug, Clone, PartialEq)]
pub struct CallFrame {
    /// Contract being called
    pub contract: AccountId,
    /// Immediate caller
    pub caller: AccountId,
    /// Function being called
    pub function: String,
    /// Call depth (0 for top-level)
    pub depth: usize,
}

/// Frames of the transaction currently executing.
#[derive(Debug, Clone)]
pub struct CallStack {
    stack: Vec<CallFrame>,
    max_depth: usize,
    allow_reentrancy: bool,
}

impl CallStack {
    /// Stack with the default depth limit that allows reentrancy.
    pub fn new() -> Self {
        Self::with_limits(MAX_CALL_DEPTH, true)
    }

    pub fn with_limits(max_depth: usize, allow_reentrancy: bool) -> Self {
        Self {
            stack: Vec::new(),
            max_depth,
            allow_reentrancy,
        }
    }

    /// Push a frame.
    ///
    /// # Errors
    /// Returns an error if:
    /// - Call depth is exceeded
    /// - The contract is already on the stack and reentrancy is disallowed
    pub fn enter(
        &mut self,
        contract: &AccountId,
        caller: &AccountId,
        function: &str,
    ) -> Result<usize, VmError> {
        let depth = self.stack.len();

        if depth >= self.max_depth {
            return Err(VmError::CallDepthExceeded { depth });
        }

        if !self.allow_reentrancy && self.contains(contract) {
            return Err(VmError::ReentrancyViolation(format!(
                "{} is already in call stack",
                contract
            )));
        }

        self.stack.push(CallFrame {
            contract: contract.clone(),
            caller: caller.clone(),
            function: function.to_string(),
            depth,
        });
        Ok(depth)
    }

    /// Pop the current frame.
    pub fn exit(&mut self) -> Result<CallFrame, VmError> {
        self.stack
            .pop()
            .ok_or_else(|| VmError::ReentrancyViolation("Call stack is empty".to_string()))
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    pub fn current_frame(&self) -> Option<&CallFrame> {
        self.stack.last()
    }

    pub fn frames(&self) -> &[CallFrame] {
        &self.stack
    }

    pub fn contains(&self, contract: &AccountId) -> bool {
        self.stack.iter().any(|f| &f.contract == contract)
    }
}

impl Default for CallStack {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> AccountId {
        AccountId::new(s).unwrap()
    }

    #[test]
    fn test_enter_and_exit() {
        let mut stack = CallStack::new();
        assert!(stack.is_empty());

        assert_eq!(stack.enter(&id("con_safe"), &id("alice"), "deposit").unwrap(), 0);
        assert_eq!(stack.enter(&id("currency"), &id("con_safe"), "transfer_from").unwrap(), 1);
        assert_eq!(stack.depth(), 2);
        assert_eq!(stack.current_frame().unwrap().function, "transfer_from");

        let frame = stack.exit().unwrap();
        assert_eq!(frame.contract, "currency");
        assert_eq!(stack.depth(), 1);
    }

    #[test]
    fn test_depth_limit() {
        let mut stack = CallStack::with_limits(2, true);
        stack.enter(&id("a"), &id("sys"), "f").unwrap();
        stack.enter(&id("a"), &id("a"), "f").unwrap();
        assert_eq!(
            stack.enter(&id("a"), &id("a"), "f"),
            Err(VmError::CallDepthExceeded { depth: 2 })
        );
    }

    #[test]
    fn test_reentrancy_when_disallowed() {
        let mut stack = CallStack::with_limits(8, false);
        stack.enter(&id("con_safe"), &id("alice"), "deposit").unwrap();
        stack.enter(&id("currency"), &id("con_safe"), "transfer_from").unwrap();
        assert!(matches!(
            stack.enter(&id("con_safe"), &id("currency"), "deposit"),
            Err(VmError::ReentrancyViolation(_))
        ));
    }

    #[test]
    fn test_exit_empty() {
        let mut stack = CallStack::new();
        assert!(stack.exit().is_err());
    }
}
