use std::sync::Arc;

pub trait SandboxEnvironmentPort: Send + Sync {
    fn inside_flatpak(&self) -> bool;
}

pub type DynSandboxEnvironmentPort = Arc<dyn SandboxEnvironmentPort>;
