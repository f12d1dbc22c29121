//! Accelerator and disk inventory probes.
//!
//! Read-only status queries with no interaction with queue state. GPU
//! info comes from an `nvidia-smi` shell-out; a missing binary or
//! non-zero exit simply reports no accelerator rather than erroring.

use std::path::Path;

use serde::Serialize;

/// Bytes per GiB, for the rounded report fields.
const GIB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Accelerator inventory as reported to status queries.
#[derive(Debug, Clone, Serialize)]
pub struct GpuInfo {
    pub available: bool,
    pub name: String,
    pub vram_total_gb: f64,
    pub vram_free_gb: f64,
}

impl GpuInfo {
    /// The report used when no accelerator is present.
    pub fn cpu_only() -> Self {
        Self {
            available: false,
            name: "CPU".into(),
            vram_total_gb: 0.0,
            vram_free_gb: 0.0,
        }
    }
}

/// Disk usage for the storage root.
#[derive(Debug, Clone, Serialize)]
pub struct StorageInfo {
    pub path: String,
    pub free_gb: f64,
    pub total_gb: f64,
}

/// Query GPU name and VRAM via `nvidia-smi`.
///
/// Returns [`GpuInfo::cpu_only`] when the binary is absent, exits
/// non-zero, or produces unparseable output.
pub async fn probe_gpu() -> GpuInfo {
    let output = tokio::process::Command::new("nvidia-smi")
        .args([
            "--query-gpu=name,memory.total,memory.free",
            "--format=csv,noheader,nounits",
        ])
        .output()
        .await;

    let output = match output {
        Ok(out) if out.status.success() => out,
        Ok(out) => {
            tracing::debug!(exit = ?out.status.code(), "nvidia-smi exited non-zero");
            return GpuInfo::cpu_only();
        }
        Err(e) => {
            tracing::debug!(error = %e, "nvidia-smi not available");
            return GpuInfo::cpu_only();
        }
    };

    let stdout = String::from_utf8_lossy(&output.stdout);
    parse_nvidia_smi(&stdout).unwrap_or_else(GpuInfo::cpu_only)
}

/// Parse the first line of `nvidia-smi --query-gpu=name,memory.total,memory.free
/// --format=csv,noheader,nounits` output. Memory values are in MiB.
fn parse_nvidia_smi(stdout: &str) -> Option<GpuInfo> {
    let line = stdout.lines().next()?;
    let mut parts = line.split(',').map(str::trim);

    let name = parts.next()?.to_string();
    let total_mib: f64 = parts.next()?.parse().ok()?;
    let free_mib: f64 = parts.next()?.parse().ok()?;

    Some(GpuInfo {
        available: true,
        name,
        vram_total_gb: round2(total_mib / 1024.0),
        vram_free_gb: round2(free_mib / 1024.0),
    })
}

/// Read disk usage for `path` via `statvfs`.
///
/// Runs the syscall on the blocking pool. Failures report zeroed stats.
pub async fn probe_storage(path: &Path) -> StorageInfo {
    let display = path.to_string_lossy().to_string();
    let stats_path = display.clone();

    let (free, total) = tokio::task::spawn_blocking(move || disk_space(&stats_path))
        .await
        .unwrap_or((0, 0));

    StorageInfo {
        path: display,
        free_gb: round2(free as f64 / GIB),
        total_gb: round2(total as f64 / GIB),
    }
}

/// Return `(free_bytes, total_bytes)` for the filesystem containing `path`.
#[cfg(unix)]
fn disk_space(path: &str) -> (u64, u64) {
    use std::ffi::CString;
    use std::mem::MaybeUninit;

    let Ok(c_path) = CString::new(path) else {
        return (0, 0);
    };
    let mut stat = MaybeUninit::<libc::statvfs>::uninit();

    // Safety: statvfs is well-defined for a valid NUL-terminated path
    // and an uninitialized out-param it fully populates on success.
    let ret = unsafe { libc::statvfs(c_path.as_ptr(), stat.as_mut_ptr()) };
    if ret != 0 {
        return (0, 0);
    }

    let stat = unsafe { stat.assume_init() };
    let block_size = stat.f_frsize as u64;
    let free = stat.f_bavail as u64 * block_size;
    let total = stat.f_blocks as u64 * block_size;
    (free, total)
}

#[cfg(not(unix))]
fn disk_space(_path: &str) -> (u64, u64) {
    (0, 0)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_nvidia_smi_single_gpu() {
        let info = parse_nvidia_smi("NVIDIA GeForce RTX 4090, 24564, 22412\n").unwrap();
        assert!(info.available);
        assert_eq!(info.name, "NVIDIA GeForce RTX 4090");
        assert!((info.vram_total_gb - 23.99).abs() < 0.01);
        assert!((info.vram_free_gb - 21.89).abs() < 0.01);
    }

    #[test]
    fn parse_nvidia_smi_uses_first_gpu_only() {
        let out = "Tesla T4, 15360, 15000\nTesla T4, 15360, 14000\n";
        let info = parse_nvidia_smi(out).unwrap();
        assert_eq!(info.name, "Tesla T4");
        assert!((info.vram_total_gb - 15.0).abs() < 0.01);
    }

    #[test]
    fn parse_nvidia_smi_garbage_is_none() {
        assert!(parse_nvidia_smi("").is_none());
        assert!(parse_nvidia_smi("not,numbers,here").is_none());
    }

    #[tokio::test]
    async fn probe_storage_reports_existing_path() {
        let info = probe_storage(Path::new("/")).await;
        assert_eq!(info.path, "/");
        // Root filesystem should have a nonzero size on any test machine.
        assert!(info.total_gb > 0.0);
    }
}
