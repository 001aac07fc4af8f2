use std::path::PathBuf;

use gly_application::ports::outgoing::sandbox_environment::SandboxEnvironmentPort;

const FLATPAK_INFO: &str = "/.flatpak-info";

/// Detects a Flatpak runtime by the info file it mounts into every sandbox.
pub struct FlatpakEnvironmentProbe {
    info_path: PathBuf,
}

impl FlatpakEnvironmentProbe {
    pub fn new() -> Self {
        Self::with_info_path(FLATPAK_INFO)
    }

    pub fn with_info_path(info_path: impl Into<PathBuf>) -> Self {
        Self {
            info_path: info_path.into(),
        }
    }
}

impl Default for FlatpakEnvironmentProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl SandboxEnvironmentPort for FlatpakEnvironmentProbe {
    fn inside_flatpak(&self) -> bool {
        self.info_path.is_file()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn info_file_marks_flatpak() {
        let dir = tempfile::tempdir().unwrap();
        let info = dir.path().join(".flatpak-info");
        let probe = FlatpakEnvironmentProbe::with_info_path(&info);

        assert!(!probe.inside_flatpak());
        fs::write(&info, "[Application]\nname=org.example.Viewer\n").unwrap();
        assert!(probe.inside_flatpak());
    }
}
