use crate::config::SnapConfig;
use crate::ctl::{CtlRunner, ProcessRunner, SnapCtl};
use crate::env::SnapEnviron;
use crate::error::Result;
use crate::health::SnapHealth;
use crate::meta::SnapMetadataFiles;
use crate::paths::SnapPaths;
use crate::service::SnapServices;
use std::fmt;
use std::sync::Arc;

/// Top-level handle for the running snap.
#[derive(Debug)]
pub struct Snap<R = ProcessRunner> {
    pub environ: SnapEnviron,
    pub paths: SnapPaths,
    pub config: SnapConfig<R>,
    pub services: SnapServices<R>,
    pub health: SnapHealth<R>,
    pub metadata_files: SnapMetadataFiles,
    snapctl: Arc<SnapCtl<R>>,
}

impl Snap<ProcessRunner> {
    /// Build from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_environ(SnapEnviron::from_env()?)
    }

    pub fn from_environ(environ: SnapEnviron) -> Result<Self> {
        let snapctl = SnapCtl::from_environ(&environ);
        Self::with_snapctl(environ, snapctl)
    }
}

impl<R: CtlRunner> Snap<R> {
    pub fn with_snapctl(environ: SnapEnviron, snapctl: SnapCtl<R>) -> Result<Self> {
        let paths = SnapPaths::from_environ(&environ)?;
        let metadata_files = SnapMetadataFiles::from_environ(&environ)?;
        let snapctl = Arc::new(snapctl);
        Ok(Self {
            paths,
            metadata_files,
            config: SnapConfig::new(snapctl.clone()),
            services: SnapServices::new(snapctl.clone()),
            health: SnapHealth::new(snapctl.clone()),
            snapctl,
            environ,
        })
    }

    /// The control command shared by the config, services and health handles.
    pub fn snapctl(&self) -> &SnapCtl<R> {
        &self.snapctl
    }

    pub fn name(&self) -> Option<&str> {
        self.environ.name()
    }

    pub fn instance_name(&self) -> Option<&str> {
        self.environ.instance_name()
    }

    pub fn version(&self) -> Option<&str> {
        self.environ.version()
    }

    pub fn revision(&self) -> Option<u32> {
        self.environ.revision()
    }
}

impl<R: CtlRunner> fmt::Display for Snap<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let revision = self
            .environ
            .get("REVISION")
            .unwrap_or_default();
        write!(
            f,
            "Snap({} {} {})",
            self.name().unwrap_or_default(),
            self.version().unwrap_or_default(),
            revision
        )
    }
}
