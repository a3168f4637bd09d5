use candle_core::Device;
use tracing::{debug, warn};

#[cfg(any(feature = "metal", feature = "cuda"))]
use tracing::info;

/// Picks the device a backbone should be built on.
///
/// Compiled-in GPU backends are tried in order (Metal, then CUDA) at `ordinal`;
/// the CPU is used when none is compiled or none initialises.
#[allow(unused_mut, unused_variables)]
pub fn select_device(ordinal: usize) -> Device {
    let mut failures: Vec<String> = Vec::new();

    #[cfg(feature = "metal")]
    match Device::new_metal(ordinal) {
        Ok(device) => {
            info!(ordinal, "Backbone placed on Metal");
            return device;
        }
        Err(e) => failures.push(format!("metal: {e}")),
    }

    #[cfg(feature = "cuda")]
    match Device::new_cuda(ordinal) {
        Ok(device) => {
            info!(ordinal, "Backbone placed on CUDA");
            return device;
        }
        Err(e) => failures.push(format!("cuda: {e}")),
    }

    if failures.is_empty() {
        debug!("No GPU backend compiled, using CPU");
    } else {
        warn!(failures = %failures.join("; "), "GPU unavailable, falling back to CPU");
    }
    Device::Cpu
}

/// Short device name for log fields.
pub fn device_label(device: &Device) -> &'static str {
    match device {
        Device::Cpu => "cpu",
        Device::Cuda(_) => "cuda",
        Device::Metal(_) => "metal",
    }
}
