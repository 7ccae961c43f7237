//! Topic strings derived from the device name and id.
//!
//! `home/<name>/<device_id>/{cmd,status,motion}`.  Rebuilt whenever the
//! device name changes.

use crate::config::DeviceName;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topics {
    pub cmd: String,
    pub status: String,
    pub motion: String,
}

impl Topics {
    pub fn build(name: &DeviceName, device_id: &str) -> Self {
        let base = format!("home/{}/{}", name, device_id);
        Self {
            cmd: format!("{base}/cmd"),
            status: format!("{base}/status"),
            motion: format!("{base}/motion"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn topic_layout() {
        let t = Topics::build(&DeviceName::new("garage").unwrap(), "DEADBEEFCAFE");
        assert_eq!(t.cmd, "home/garage/DEADBEEFCAFE/cmd");
        assert_eq!(t.status, "home/garage/DEADBEEFCAFE/status");
        assert_eq!(t.motion, "home/garage/DEADBEEFCAFE/motion");
    }
}
