use crate::env::SnapEnviron;
use crate::error::Result;
use std::fmt;
use std::path::PathBuf;

/// Filesystem locations exposed to the snap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapPaths {
    pub common: PathBuf,
    pub data: PathBuf,
    pub real_home: PathBuf,
    pub snap: PathBuf,
    pub user_common: PathBuf,
    pub user_data: PathBuf,
}

impl SnapPaths {
    pub fn from_environ(env: &SnapEnviron) -> Result<Self> {
        let path = |key: &str| env.require(key).map(PathBuf::from);
        Ok(Self {
            common: path("COMMON")?,
            data: path("DATA")?,
            real_home: path("REAL_HOME")?,
            snap: path("SNAP")?,
            user_common: path("USER_COMMON")?,
            user_data: path("USER_DATA")?,
        })
    }
}

impl fmt::Display for SnapPaths {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SnapPaths(common={} data={} real_home={} snap={} user_common={} user_data={})",
            self.common.display(),
            self.data.display(),
            self.real_home.display(),
            self.snap.display(),
            self.user_common.display(),
            self.user_data.display()
        )
    }
}
