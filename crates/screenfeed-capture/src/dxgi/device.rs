//! Capture device: adapter-bound D3D11 device plus the CPU-readable staging
//! surface sized to the selected output.

use tracing::{debug, instrument};
use windows::core::Interface;
use windows::Win32::Foundation::HMODULE;
use windows::Win32::Graphics::Direct3D::D3D_DRIVER_TYPE_UNKNOWN;
use windows::Win32::Graphics::Direct3D11::{
    D3D11CreateDevice, ID3D11Device, ID3D11DeviceContext, ID3D11Texture2D,
    D3D11_CPU_ACCESS_READ, D3D11_CREATE_DEVICE_BGRA_SUPPORT, D3D11_SDK_VERSION,
    D3D11_TEXTURE2D_DESC, D3D11_USAGE_STAGING,
};
use windows::Win32::Graphics::Dxgi::Common::{DXGI_FORMAT_B8G8R8A8_UNORM, DXGI_SAMPLE_DESC};
use windows::Win32::Graphics::Dxgi::{
    CreateDXGIFactory1, IDXGIAdapter, IDXGIFactory1, IDXGIOutput1,
};

use crate::error::CaptureError;
use crate::frame::CaptureGeometry;
use crate::CaptureResult;

/// GPU-side resources bound to one display output.
///
/// Geometry and device bindings are fixed at construction; changing display
/// or recovering from a lost duplication requires building a new device.
/// Release is handled by COM wrapper drops, staging surface first.
pub struct CaptureDevice {
    staging: ID3D11Texture2D,
    context: ID3D11DeviceContext,
    device: ID3D11Device,
    output: IDXGIOutput1,
    geometry: CaptureGeometry,
}

impl CaptureDevice {
    /// Resolve the adapter and output at the given indices and allocate the
    /// staging surface matching the output's desktop bounds.
    #[instrument(name = "capture_device_new")]
    pub fn new(adapter_index: u32, output_index: u32) -> CaptureResult<Self> {
        let factory: IDXGIFactory1 = unsafe { CreateDXGIFactory1()? };

        let adapter = unsafe { factory.EnumAdapters1(adapter_index) }.map_err(|_| {
            CaptureError::DisplayOutOfRange {
                adapter_index,
                output_index,
            }
        })?;

        let base_adapter: IDXGIAdapter = adapter.cast()?;
        let mut device = None;
        let mut context = None;
        unsafe {
            D3D11CreateDevice(
                &base_adapter,
                D3D_DRIVER_TYPE_UNKNOWN,
                HMODULE::default(),
                D3D11_CREATE_DEVICE_BGRA_SUPPORT,
                None,
                D3D11_SDK_VERSION,
                Some(&mut device),
                None,
                Some(&mut context),
            )?;
        }
        let device = device.ok_or_else(|| CaptureError::WindowsApi {
            message: "D3D11CreateDevice returned no device".to_string(),
            source: None,
        })?;
        let context = context.ok_or_else(|| CaptureError::WindowsApi {
            message: "D3D11CreateDevice returned no immediate context".to_string(),
            source: None,
        })?;

        let output = unsafe { adapter.EnumOutputs(output_index) }.map_err(|_| {
            CaptureError::DisplayOutOfRange {
                adapter_index,
                output_index,
            }
        })?;
        let desc = unsafe { output.GetDesc()? };
        let bounds = desc.DesktopCoordinates;
        let geometry = CaptureGeometry {
            width: (bounds.right - bounds.left) as u32,
            height: (bounds.bottom - bounds.top) as u32,
        };
        let output: IDXGIOutput1 = output.cast()?;

        let staging = create_staging_texture(&device, geometry)?;

        debug!(
            adapter_index,
            output_index,
            width = geometry.width,
            height = geometry.height,
            "capture device initialized"
        );

        Ok(Self {
            staging,
            context,
            device,
            output,
            geometry,
        })
    }

    pub fn device(&self) -> &ID3D11Device {
        &self.device
    }

    pub fn context(&self) -> &ID3D11DeviceContext {
        &self.context
    }

    pub fn output(&self) -> &IDXGIOutput1 {
        &self.output
    }

    pub fn staging(&self) -> &ID3D11Texture2D {
        &self.staging
    }

    pub fn geometry(&self) -> CaptureGeometry {
        self.geometry
    }
}

/// Staging surface for CPU readback: B8G8R8A8, no bind flags, CPU read only.
fn create_staging_texture(
    device: &ID3D11Device,
    geometry: CaptureGeometry,
) -> CaptureResult<ID3D11Texture2D> {
    let desc = D3D11_TEXTURE2D_DESC {
        Width: geometry.width,
        Height: geometry.height,
        MipLevels: 1,
        ArraySize: 1,
        Format: DXGI_FORMAT_B8G8R8A8_UNORM,
        SampleDesc: DXGI_SAMPLE_DESC {
            Count: 1,
            Quality: 0,
        },
        Usage: D3D11_USAGE_STAGING,
        BindFlags: Default::default(),
        CPUAccessFlags: D3D11_CPU_ACCESS_READ.0 as u32,
        MiscFlags: Default::default(),
    };

    let mut texture = None;
    unsafe {
        device.CreateTexture2D(&desc, None, Some(&mut texture))?;
    }

    texture.ok_or_else(|| CaptureError::WindowsApi {
        message: "failed to create staging texture".to_string(),
        source: None,
    })
}
