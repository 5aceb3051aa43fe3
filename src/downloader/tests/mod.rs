use std::sync::Arc;

use tokio::sync::Notify;

use crate::downloader::test_helpers::{
    MockEngine, MockOutcome, MockScript, create_test_downloader, create_test_downloader_with,
    downloading, events_until_terminal, wait_for_job,
};
use crate::error::{Error, JobError};
use crate::profile::Profile;
use crate::types::{Event, FailureKind, JobId, JobResult, JobState};
