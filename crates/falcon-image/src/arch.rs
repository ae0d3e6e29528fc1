//! Node architecture detection

use falcon_core::Architecture;

/// Source of the CPU architecture images are resolved for
pub trait ArchitectureProbe: Send + Sync {
    fn architecture(&self) -> Architecture;
}

/// Architecture of the host running this process, in container platform naming
#[derive(Debug, Clone, Copy, Default)]
pub struct HostArchitecture;

impl ArchitectureProbe for HostArchitecture {
    fn architecture(&self) -> Architecture {
        Architecture::new(platform_arch(std::env::consts::ARCH))
    }
}

/// A fixed architecture, for overrides and tests
#[derive(Debug, Clone)]
pub struct FixedArchitecture(Architecture);

impl FixedArchitecture {
    pub fn new(architecture: impl Into<Architecture>) -> Self {
        Self(architecture.into())
    }
}

impl ArchitectureProbe for FixedArchitecture {
    fn architecture(&self) -> Architecture {
        self.0.clone()
    }
}

/// Map a Rust target architecture to its container platform name
pub fn platform_arch(rust_arch: &str) -> &str {
    match rust_arch {
        "x86_64" => "amd64",
        "aarch64" => "arm64",
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_arch_mapping() {
        assert_eq!(platform_arch("x86_64"), "amd64");
        assert_eq!(platform_arch("aarch64"), "arm64");
        assert_eq!(platform_arch("s390x"), "s390x");
    }

    #[test]
    fn test_host_architecture_is_mapped() {
        let arch = HostArchitecture.architecture();
        assert_eq!(arch.as_str(), platform_arch(std::env::consts::ARCH));
    }

    #[test]
    fn test_fixed_architecture() {
        let probe = FixedArchitecture::new("arm64");
        assert_eq!(probe.architecture(), Architecture::new("arm64"));
    }
}
