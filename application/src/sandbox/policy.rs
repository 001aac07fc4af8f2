use tracing::debug;

use crate::config::{DecodeLimits, LoaderSettings};
use crate::ports::outgoing::sandbox_environment::SandboxEnvironmentPort;
use domain::sandbox::{SandboxMechanism, SandboxSelector};

/// How a decode runs for a resolved sandbox mechanism.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodePolicy {
    pub mechanism: SandboxMechanism,
    /// `None` leaves the decoder's own defaults in place.
    pub limits: Option<DecodeLimits>,
    /// Decoder panics become `DecodeFailed` errors instead of unwinding into
    /// the caller.
    pub isolate_panics: bool,
}

impl DecodePolicy {
    #[must_use]
    pub fn for_mechanism(mechanism: SandboxMechanism, settings: &LoaderSettings) -> Self {
        if mechanism.is_sandboxed() {
            Self {
                mechanism,
                limits: Some(settings.limits),
                isolate_panics: true,
            }
        } else {
            Self {
                mechanism,
                limits: None,
                isolate_panics: false,
            }
        }
    }
}

pub fn resolve(
    selector: SandboxSelector,
    environment: &dyn SandboxEnvironmentPort,
    settings: &LoaderSettings,
) -> DecodePolicy {
    let mechanism = selector.resolve(environment.inside_flatpak());
    debug!("Sandbox selector {} resolved to {}", selector, mechanism);
    DecodePolicy::for_mechanism(mechanism, settings)
}
