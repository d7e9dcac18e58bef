//! Azure DevOps pull-request edge: the calls the run orchestrator needs and
//! nothing more.

pub mod api;
pub mod client;
pub mod error;
pub mod types;

pub use api::PullRequestApi;
pub use client::AzureDevOpsClient;
pub use error::{DevOpsError, Result};
pub use types::{
    ChangeItem, Comment, FilePosition, GitCommitRef, GitRepository, IdentityRef, Iteration,
    IterationChange, PullRequest, PullRequestRef, Thread, ThreadContext, ThreadStatus,
};
