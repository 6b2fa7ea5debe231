//! Hardware name detection.
//!
//! Names only decorate the snapshot, they never gate the tailer. Detection runs
//! once at startup, off the monitor thread, and falls back to generic labels
//! when nothing can be queried.

use std::process;

use tracing::debug;

pub const GENERIC_CPU: &str = "Generic CPU";
pub const GENERIC_GPU: &str = "Generic GPU";

/// Name fragments that mark a dedicated GPU, matched case-insensitively.
const DEDICATED_GPU_KEYS: &[&str] = &["nvidia", "geforce", "radeon", "rtx", "gtx", "arc", "rx"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HardwareInfo {
    pub cpu_name: String,
    pub gpu_name: String,
}

impl Default for HardwareInfo {
    fn default() -> Self {
        Self {
            cpu_name: GENERIC_CPU.to_string(),
            gpu_name: GENERIC_GPU.to_string(),
        }
    }
}

/// Source of CPU and GPU display names.
pub trait HardwareProbe: Send {
    fn detect(&self) -> HardwareInfo;
}

/// Names given up front, e.g. from command line flags.
#[derive(Debug, Clone)]
pub struct FixedProbe(pub HardwareInfo);

impl HardwareProbe for FixedProbe {
    fn detect(&self) -> HardwareInfo {
        self.0.clone()
    }
}

/// Queries the operating system.
///
/// - Windows: registry `ProcessorNameString`, `Win32_VideoController` via PowerShell
/// - Linux: `/proc/cpuinfo`, `lspci`
/// - macOS: `sysctl machdep.cpu.brand_string`, `system_profiler`
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemProbe;

impl HardwareProbe for SystemProbe {
    fn detect(&self) -> HardwareInfo {
        let cpu_name = detect_cpu().unwrap_or_else(|| GENERIC_CPU.to_string());
        let gpus = detect_gpus();
        debug!(cpu = %cpu_name, gpus = ?gpus, "hardware query finished");
        let gpu_name = pick_gpu(&gpus)
            .map(str::to_string)
            .unwrap_or_else(|| GENERIC_GPU.to_string());
        HardwareInfo { cpu_name, gpu_name }
    }
}

/// First dedicated-looking adapter, otherwise the first one listed.
pub fn pick_gpu<S: AsRef<str>>(names: &[S]) -> Option<&str> {
    names
        .iter()
        .map(AsRef::as_ref)
        .find(|name| {
            let lower = name.to_lowercase();
            DEDICATED_GPU_KEYS.iter().any(|k| lower.contains(k))
        })
        .or_else(|| names.first().map(AsRef::as_ref))
}

/// Runs a command and returns its stdout when it succeeds.
fn command_output(program: &str, args: &[&str]) -> Option<String> {
    process::Command::new(program)
        .args(args)
        .output()
        .ok()
        .and_then(|out| {
            if out.status.success() {
                String::from_utf8(out.stdout).ok()
            } else {
                None
            }
        })
}

#[cfg(target_os = "windows")]
fn detect_cpu() -> Option<String> {
    let out = command_output(
        "reg",
        &[
            "query",
            r"HKLM\HARDWARE\DESCRIPTION\System\CentralProcessor\0",
            "/v",
            "ProcessorNameString",
        ],
    )?;
    parse_reg_value(&out, "ProcessorNameString")
}

#[cfg(target_os = "windows")]
fn detect_gpus() -> Vec<String> {
    command_output(
        "powershell",
        &[
            "-NoProfile",
            "-Command",
            "Get-CimInstance Win32_VideoController | Select-Object -ExpandProperty Name",
        ],
    )
    .map(|out| non_empty_lines(&out))
    .unwrap_or_default()
}

#[cfg(target_os = "linux")]
fn detect_cpu() -> Option<String> {
    let cpuinfo = std::fs::read_to_string("/proc/cpuinfo").ok()?;
    parse_cpuinfo(&cpuinfo)
}

#[cfg(target_os = "linux")]
fn detect_gpus() -> Vec<String> {
    command_output("lspci", &[])
        .map(|out| parse_lspci(&out))
        .unwrap_or_default()
}

#[cfg(target_os = "macos")]
fn detect_cpu() -> Option<String> {
    command_output("sysctl", &["-n", "machdep.cpu.brand_string"])
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

#[cfg(target_os = "macos")]
fn detect_gpus() -> Vec<String> {
    command_output("system_profiler", &["SPDisplaysDataType"])
        .map(|out| {
            out.lines()
                .filter_map(|l| l.trim().strip_prefix("Chipset Model:"))
                .map(|s| s.trim().to_string())
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
fn detect_cpu() -> Option<String> {
    None
}

#[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
fn detect_gpus() -> Vec<String> {
    Vec::new()
}

/// `model name : ...` from `/proc/cpuinfo`.
#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
fn parse_cpuinfo(cpuinfo: &str) -> Option<String> {
    cpuinfo.lines().find_map(|line| {
        let (key, value) = line.split_once(':')?;
        (key.trim() == "model name")
            .then(|| value.trim().to_string())
            .filter(|v| !v.is_empty())
    })
}

/// Device names of VGA and 3D controllers in `lspci` output.
#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
fn parse_lspci(out: &str) -> Vec<String> {
    out.lines()
        .filter_map(|line| {
            let (_, rest) = line.split_once(' ')?;
            let (class, device) = rest.split_once(": ")?;
            let is_display =
                class.contains("VGA compatible controller") || class.contains("3D controller");
            is_display.then(|| device.trim().to_string())
        })
        .collect()
}

/// Value of `name` in `reg query` output (`name    REG_SZ    value`).
#[cfg_attr(not(target_os = "windows"), allow(dead_code))]
fn parse_reg_value(out: &str, name: &str) -> Option<String> {
    out.lines().find_map(|line| {
        let rest = line.trim().strip_prefix(name)?;
        let rest = rest.trim_start().strip_prefix("REG_SZ")?;
        Some(rest.trim().to_string()).filter(|v| !v.is_empty())
    })
}

#[cfg_attr(not(target_os = "windows"), allow(dead_code))]
fn non_empty_lines(out: &str) -> Vec<String> {
    out.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}
