//! Device facts the host does not hand us directly.

#[cfg(target_os = "android")]
mod android;

/// `Build.VERSION.SDK_INT` of the running device, if it can be read
#[cfg(target_os = "android")]
pub fn sdk_version() -> Option<u32> {
    android::sdk_version()
}

#[cfg(not(target_os = "android"))]
pub fn sdk_version() -> Option<u32> {
    None
}
