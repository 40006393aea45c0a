//! Workflows bundled with this crate

pub mod hello;

use crate::workflow::FlowRegistry;

/// Registry of every bundled workflow
pub fn registry() -> FlowRegistry {
    let mut registry = FlowRegistry::new();
    registry.register(hello::flow());
    registry
}
