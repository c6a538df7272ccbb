//! Load scenario against an Artifactory/Xray instance.
//!
//! Each virtual user creates a docker repository, pushes an image with the
//! `docker` CLI, then creates, applies and queries an Xray policy and watch.

pub mod command;
pub mod events;
pub mod harness;
pub mod http;
pub mod report;
pub mod stats;
pub mod taskset;
pub mod user;

pub use command::{CommandOutput, CommandRunner, ProcessSpawner, Spawn};
pub use events::{ChannelSink, EventSink};
pub use harness::{run_load, RunSummary, StopReason};
pub use http::Session;
pub use taskset::TaskSet;
pub use user::{VirtualUser, WaitTime};
