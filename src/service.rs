use crate::ctl::{CtlRunner, ProcessRunner, ServiceInfo, SnapCtl};
use crate::error::{Result, SnapError};
use std::collections::BTreeMap;
use std::sync::Arc;

/// A service defined in the snap.
#[derive(Debug)]
pub struct SnapService<R = ProcessRunner> {
    info: ServiceInfo,
    snapctl: Arc<SnapCtl<R>>,
}

impl<R: CtlRunner> SnapService<R> {
    pub fn new(info: ServiceInfo, snapctl: Arc<SnapCtl<R>>) -> Self {
        Self { info, snapctl }
    }

    pub fn info(&self) -> &ServiceInfo {
        &self.info
    }

    pub fn name(&self) -> &str {
        &self.info.name
    }

    pub fn enabled(&self) -> bool {
        self.info.enabled
    }

    pub fn active(&self) -> bool {
        self.info.active
    }

    pub fn notes(&self) -> &[String] {
        &self.info.notes
    }

    pub fn start(&mut self, enable: bool) -> Result<()> {
        self.snapctl.start(&[self.info.name.as_str()], enable)?;
        self.refresh_status()
    }

    pub fn stop(&mut self, disable: bool) -> Result<()> {
        self.snapctl.stop(&[self.info.name.as_str()], disable)?;
        self.refresh_status()
    }

    pub fn restart(&mut self, reload: bool) -> Result<()> {
        self.snapctl.restart(&[self.info.name.as_str()], reload)?;
        self.refresh_status()
    }

    /// Re-read the status of this service.
    pub fn refresh_status(&mut self) -> Result<()> {
        let mut infos = self.snapctl.services(&[self.info.name.as_str()])?;
        if infos.len() != 1 {
            return Err(SnapError::UnknownService(self.info.name.clone()));
        }
        self.info = infos.remove(0);
        Ok(())
    }
}

impl<R> PartialEq for SnapService<R> {
    fn eq(&self, other: &Self) -> bool {
        self.info == other.info && Arc::ptr_eq(&self.snapctl, &other.snapctl)
    }
}

/// Manage services in the snap.
#[derive(Debug)]
pub struct SnapServices<R = ProcessRunner> {
    snapctl: Arc<SnapCtl<R>>,
}

impl<R: CtlRunner> SnapServices<R> {
    pub fn new(snapctl: Arc<SnapCtl<R>>) -> Self {
        Self { snapctl }
    }

    /// Return services by name.
    pub fn list(&self) -> Result<BTreeMap<String, SnapService<R>>> {
        let services = self
            .snapctl
            .services(&[])?
            .into_iter()
            .map(|info| (info.name.clone(), SnapService::new(info, self.snapctl.clone())))
            .collect();
        Ok(services)
    }

    pub fn start(&self, enable: bool) -> Result<()> {
        self.snapctl.start(&[], enable)
    }

    pub fn stop(&self, disable: bool) -> Result<()> {
        self.snapctl.stop(&[], disable)
    }

    pub fn restart(&self, reload: bool) -> Result<()> {
        self.snapctl.restart(&[], reload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeRunner;

    const TABLE: &str = "Service          Startup   Current   Notes\n\
                         mysnap.service1  disabled  inactive  -\n\
                         mysnap.service2  enabled   active    -\n";

    fn snapctl() -> Arc<SnapCtl<FakeRunner>> {
        Arc::new(SnapCtl::with_runner("/not/here", "mysnap", FakeRunner::default()))
    }

    #[test]
    fn list() {
        let snapctl = snapctl();
        snapctl.runner().push_stdout(TABLE);
        let services = SnapServices::new(snapctl.clone()).list().unwrap();
        assert_eq!(services.keys().collect::<Vec<_>>(), ["service1", "service2"]);
        let service1 = &services["service1"];
        assert!(!service1.enabled());
        assert!(!service1.active());
        assert!(services["service2"].active());
        assert_eq!(snapctl.runner().calls(), vec![vec!["services", "mysnap"]]);
    }

    #[test]
    fn all_services_commands() {
        let snapctl = snapctl();
        let services = SnapServices::new(snapctl.clone());
        services.start(true).unwrap();
        services.stop(false).unwrap();
        services.restart(true).unwrap();
        assert_eq!(
            snapctl.runner().calls(),
            vec![
                vec!["start", "--enable", "mysnap"],
                vec!["stop", "mysnap"],
                vec!["restart", "--reload", "mysnap"],
            ]
        );
    }

    #[test]
    fn service_start_refreshes_status() {
        let snapctl = snapctl();
        let info = ServiceInfo {
            name: "service1".to_string(),
            enabled: false,
            active: false,
            notes: Vec::new(),
        };
        let mut service = SnapService::new(info, snapctl.clone());
        snapctl.runner().push_stdout("");
        snapctl.runner().push_stdout(
            "Service          Startup   Current   Notes\n\
             mysnap.service1  enabled   active    -\n",
        );
        service.start(true).unwrap();
        assert!(service.enabled());
        assert!(service.active());
        assert_eq!(
            snapctl.runner().calls(),
            vec![
                vec!["start", "--enable", "mysnap.service1"],
                vec!["services", "mysnap.service1"],
            ]
        );
    }

    #[test]
    fn refresh_status_of_missing_service() {
        let snapctl = snapctl();
        let info = ServiceInfo {
            name: "gone".to_string(),
            enabled: true,
            active: true,
            notes: Vec::new(),
        };
        let mut service = SnapService::new(info, snapctl.clone());
        snapctl
            .runner()
            .push_stdout("Service  Startup  Current  Notes\n");
        let err = service.refresh_status().unwrap_err();
        assert!(matches!(err, SnapError::UnknownService(name) if name == "gone"));
    }

    #[test]
    fn equality_requires_same_snapctl() {
        let info = ServiceInfo {
            name: "service1".to_string(),
            enabled: true,
            active: true,
            notes: Vec::new(),
        };
        let shared = snapctl();
        let first = SnapService::new(info.clone(), shared.clone());
        let second = SnapService::new(info.clone(), shared);
        let other = SnapService::new(info, snapctl());
        assert!(first == second);
        assert!(first != other);
    }
}
