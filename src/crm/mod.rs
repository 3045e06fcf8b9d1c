//! CRM entities tracked in the pipeline.

pub mod types;

pub use types::{
    Client, ClientStatus, FreelanceJob, Lead, LeadStatus, NewClient, NewLead, OutreachLog,
    OutreachOutcome, OutreachType, ProjectType, Task, TaskStatus,
};
