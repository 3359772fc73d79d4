use crate::ctl::{CtlRunner, ProcessRunner, SnapCtl, SnapHealthStatus};
use crate::error::{Result, SnapError};
use regex::Regex;
use std::sync::{Arc, LazyLock};

static STATUS_CODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z](?:-?[a-z0-9])+$").expect("valid status code regex"));

/// Set the health status reported for the snap.
#[derive(Debug)]
pub struct SnapHealth<R = ProcessRunner> {
    snapctl: Arc<SnapCtl<R>>,
}

impl<R: CtlRunner> SnapHealth<R> {
    pub fn new(snapctl: Arc<SnapCtl<R>>) -> Self {
        Self { snapctl }
    }

    pub fn okay(&self) -> Result<()> {
        self.snapctl.set_health(SnapHealthStatus::Okay, None, None)
    }

    pub fn waiting(&self, message: &str, code: Option<&str>) -> Result<()> {
        self.set_health(SnapHealthStatus::Waiting, message, code)
    }

    pub fn blocked(&self, message: &str, code: Option<&str>) -> Result<()> {
        self.set_health(SnapHealthStatus::Blocked, message, code)
    }

    pub fn error(&self, message: &str, code: Option<&str>) -> Result<()> {
        self.set_health(SnapHealthStatus::Error, message, code)
    }

    fn set_health(&self, status: SnapHealthStatus, message: &str, code: Option<&str>) -> Result<()> {
        if message.is_empty() {
            return Err(SnapError::InvalidHealth(
                "Health status message must not be empty",
            ));
        }
        if let Some(code) = code {
            if !STATUS_CODE_RE.is_match(code) {
                return Err(SnapError::InvalidHealth("Invalid health status code format"));
            }
        }
        self.snapctl.set_health(status, Some(message), code)
    }
}
