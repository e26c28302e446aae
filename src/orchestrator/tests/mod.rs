//! Orchestrator tests, grouped by component.
