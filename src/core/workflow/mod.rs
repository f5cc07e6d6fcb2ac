//! Workflow orchestration across documents

pub mod orchestrator;

pub use orchestrator::{
    DocumentResult, DocumentStatus, WorkflowOptions, WorkflowOrchestrator, WorkflowSummary,
    WorkflowTask,
};
