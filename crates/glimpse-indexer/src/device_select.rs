//! Embedder device auto-selection (§4.4, §9 "Platform capability" /
//! "exceptions for flow control"): tries devices in priority order and
//! records a `fallback_reason` on the `DeviceInfo` when a fallback occurs.

use glimpse_domain::{Device, DeviceInfo, DeviceOverride};

/// Resolves the device to report on an embedder given a user override, in
/// priority order GPU-browser → GPU-native → CPU (§4.4). This crate's
/// bundled embedder backend is CPU-only, so anything other than
/// `DeviceOverride::Cpu`/`Auto` falls back to CPU with a recorded reason;
/// a real accelerator-backed embedder would attempt those devices first.
pub fn select_device(override_: DeviceOverride) -> DeviceInfo {
    match override_ {
        DeviceOverride::Auto | DeviceOverride::Cpu => DeviceInfo::cpu(),
        DeviceOverride::GpuNative => {
            DeviceInfo::with_fallback(Device::Cpu, "no native GPU backend available, falling back to CPU")
        }
        DeviceOverride::GpuBrowser => {
            DeviceInfo::with_fallback(Device::Cpu, "no browser GPU backend available, falling back to CPU")
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn auto_and_explicit_cpu_report_no_fallback() {
        assert!(select_device(DeviceOverride::Auto).fallback_reason.is_none());
        assert!(select_device(DeviceOverride::Cpu).fallback_reason.is_none());
    }

    #[test]
    fn gpu_overrides_fall_back_to_cpu_with_a_reason() {
        let info = select_device(DeviceOverride::GpuNative);
        assert_eq!(info.device, Device::Cpu);
        assert!(info.fallback_reason.is_some());
    }
}
