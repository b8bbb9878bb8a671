//! Preflight checks for the batch environment
//!
//! Probes free disk space with platform-specific APIs and gates the batch
//! on a configured minimum before any transfer begins.

use crate::error::{Error, Result};
use std::path::Path;

const BYTES_PER_GB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Get available disk space for a given path
///
/// Uses platform-specific APIs to query filesystem statistics:
/// - Linux: statvfs
/// - macOS: statvfs
/// - Windows: GetDiskFreeSpaceExW
///
/// # Arguments
///
/// * `path` - The path to check (typically the base output directory)
///
/// # Returns
///
/// Returns the available disk space in bytes, or an IO error if the check fails.
pub fn available_space(path: &Path) -> std::io::Result<u64> {
    #[cfg(unix)]
    {
        use std::ffi::CString;
        use std::os::unix::ffi::OsStrExt;

        // Convert path to C string for statvfs call
        let c_path = CString::new(path.as_os_str().as_bytes())
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;

        // SAFETY: This is safe because:
        // 1. c_path is a valid, null-terminated C string created from the input path
        // 2. stat is properly initialized with zeroed memory before the call
        // 3. We check the return value and propagate any OS errors
        // 4. The statvfs struct is only read after a successful call
        unsafe {
            let mut stat: libc::statvfs = std::mem::zeroed();
            if libc::statvfs(c_path.as_ptr(), &mut stat) != 0 {
                return Err(std::io::Error::last_os_error());
            }

            // Available space = available blocks * fragment size
            // f_bavail is available blocks for unprivileged users
            // f_frsize is the fragment size (preferred over f_bsize)
            let available_bytes = stat.f_bavail.saturating_mul(stat.f_frsize);
            Ok(available_bytes)
        }
    }

    #[cfg(windows)]
    {
        use std::os::windows::ffi::OsStrExt;
        use winapi::um::fileapi::GetDiskFreeSpaceExW;

        // Convert path to wide string for Windows API
        let wide_path: Vec<u16> = path
            .as_os_str()
            .encode_wide()
            .chain(std::iter::once(0)) // null terminator
            .collect();

        // SAFETY: This is safe because:
        // 1. wide_path is a valid, null-terminated wide string
        // 2. All output pointers point to valid, properly aligned u64 variables
        // 3. We check the return value and propagate any OS errors
        // 4. The output variables are only read after a successful call
        unsafe {
            let mut free_bytes_available: u64 = 0;
            let mut _total_bytes: u64 = 0;
            let mut _total_free_bytes: u64 = 0;

            if GetDiskFreeSpaceExW(
                wide_path.as_ptr(),
                &mut free_bytes_available as *mut u64 as *mut _,
                &mut _total_bytes as *mut u64 as *mut _,
                &mut _total_free_bytes as *mut u64 as *mut _,
            ) == 0
            {
                return Err(std::io::Error::last_os_error());
            }

            Ok(free_bytes_available)
        }
    }

    #[cfg(not(any(unix, windows)))]
    {
        // Unsupported platform - return an error
        Err(std::io::Error::new(
            std::io::ErrorKind::Unsupported,
            "Disk space checking is not supported on this platform",
        ))
    }
}

/// Free space of the filesystem containing `path`, in GB
pub fn free_space_gb(path: &Path) -> std::io::Result<f64> {
    available_space(path).map(|bytes| bytes as f64 / BYTES_PER_GB)
}

/// Gate a directory on a minimum amount of free disk space
///
/// Creates `path` first if absent, then probes the filesystem containing
/// it. Returns the observed free space in GB, or fails with
/// [`Error::InsufficientSpace`] when it is below `min_free_gb`.
///
/// Invoked once at batch start against the base output root; failure there
/// is a fatal, whole-batch abort distinct from per-job failures.
pub fn check_disk_space(path: &Path, min_free_gb: f64) -> Result<f64> {
    std::fs::create_dir_all(path)?;

    let free_gb =
        free_space_gb(path).map_err(|e| Error::DiskSpaceCheckFailed(e.to_string()))?;

    if free_gb < min_free_gb {
        return Err(Error::InsufficientSpace {
            path: path.to_path_buf(),
            available_gb: free_gb,
            required_gb: min_free_gb,
        });
    }

    Ok(free_gb)
}
