//! Display enumeration over DXGI adapters and outputs.

use tracing::{debug, instrument};
use windows::Win32::Graphics::Dxgi::{CreateDXGIFactory1, IDXGIFactory1};

use screenfeed_ipc::DisplayInfo;

use crate::CaptureResult;

/// Enumerate every output attached to every adapter, in adapter-then-output
/// order. Indices match platform enumeration order and are what
/// [`crate::DxgiProducer::new`] resolves against.
///
/// A machine that reports zero adapters yields an empty list; the caller
/// decides whether that is fatal.
#[instrument(name = "enumerate_displays")]
pub fn enumerate_displays() -> CaptureResult<Vec<DisplayInfo>> {
    let factory: IDXGIFactory1 = unsafe { CreateDXGIFactory1()? };

    let mut displays = Vec::new();
    let mut adapter_index = 0u32;
    while let Ok(adapter) = unsafe { factory.EnumAdapters1(adapter_index) } {
        let mut output_index = 0u32;
        while let Ok(output) = unsafe { adapter.EnumOutputs(output_index) } {
            let desc = unsafe { output.GetDesc()? };
            displays.push(DisplayInfo::new(
                adapter_index,
                output_index,
                utf16_name(&desc.DeviceName),
            ));
            output_index += 1;
        }
        adapter_index += 1;
    }

    debug!(count = displays.len(), "enumerated displays");
    Ok(displays)
}

fn utf16_name(raw: &[u16]) -> String {
    let len = raw.iter().position(|&c| c == 0).unwrap_or(raw.len());
    String::from_utf16_lossy(&raw[..len])
}
