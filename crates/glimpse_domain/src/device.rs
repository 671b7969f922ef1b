//! Embedder device selection (§4.4, §9 "Platform capability").

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Device {
    Cpu,
    GpuNative,
    GpuBrowser,
}

impl Device {
    /// Batch size policy: 64 on an accelerator, 32 on CPU.
    pub fn batch_size(self) -> usize {
        match self {
            Self::Cpu => 32,
            Self::GpuNative | Self::GpuBrowser => 64,
        }
    }
}

/// Result of device auto-selection at embedder init.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub device: Device,
    pub vendor: Option<String>,
    pub name: Option<String>,
    /// Set when the preferred or auto-detected device failed to initialize
    /// and selection fell back to a lower tier.
    pub fallback_reason: Option<String>,
}

impl DeviceInfo {
    pub fn cpu() -> Self {
        Self { device: Device::Cpu, vendor: None, name: None, fallback_reason: None }
    }

    pub fn with_fallback(device: Device, reason: impl Into<String>) -> Self {
        Self { device, vendor: None, name: None, fallback_reason: Some(reason.into()) }
    }
}

/// Capability centralizing the platform facts the original implementation
/// scattered across modules (§9 design note).
pub trait Platform: Send + Sync {
    fn is_case_insensitive_fs(&self) -> bool;
    /// Polling interval hints for text vs. binary files when falling back to
    /// poll-based watching (case-insensitive / Windows volumes).
    fn polling_hints(&self) -> PollingHints;
    fn path_separator(&self) -> char;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollingHints {
    pub text_interval_ms: u64,
    pub binary_interval_ms: u64,
}

impl Default for PollingHints {
    fn default() -> Self {
        Self { text_interval_ms: 300, binary_interval_ms: 500 }
    }
}

/// The host platform this process is actually running on.
pub struct HostPlatform;

impl Platform for HostPlatform {
    fn is_case_insensitive_fs(&self) -> bool {
        cfg!(any(target_os = "windows", target_os = "macos"))
    }

    fn polling_hints(&self) -> PollingHints {
        PollingHints::default()
    }

    fn path_separator(&self) -> char {
        std::path::MAIN_SEPARATOR
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn batch_size_policy() {
        assert_eq!(Device::Cpu.batch_size(), 32);
        assert_eq!(Device::GpuNative.batch_size(), 64);
        assert_eq!(Device::GpuBrowser.batch_size(), 64);
    }

    #[test]
    fn fallback_records_a_reason() {
        let info = DeviceInfo::with_fallback(Device::Cpu, "gpu init failed");
        assert_eq!(info.fallback_reason.as_deref(), Some("gpu init failed"));
    }
}
