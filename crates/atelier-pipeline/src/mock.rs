//! Mock capability client
//!
//! Produces a gradient PNG for the image capability and a minimal valid GLB
//! for the 3D capability without any network calls. Used in tests and for
//! running the pipeline offline.

use atelier_core::{AtelierError, Result};
use std::io::Cursor;

use crate::capability::{CapabilityClient, CapabilityId, GenerationRequest};
use crate::config::ServiceConfig;

/// A mock client that generates placeholder payloads locally
pub struct MockClient {
    image_id: CapabilityId,
    model_id: CapabilityId,
}

impl MockClient {
    pub fn new(image_id: impl Into<CapabilityId>, model_id: impl Into<CapabilityId>) -> Self {
        Self {
            image_id: image_id.into(),
            model_id: model_id.into(),
        }
    }

    pub fn from_config(config: &ServiceConfig) -> Self {
        Self {
            image_id: CapabilityId::new(&config.text_to_image_id),
            model_id: CapabilityId::new(&config.image_to_3d_id),
        }
    }
}

impl CapabilityClient for MockClient {
    fn invoke(&self, capability: &CapabilityId, _request: &GenerationRequest) -> Result<Vec<u8>> {
        if *capability == self.image_id {
            gradient_png(256, 256)
        } else if *capability == self.model_id {
            minimal_glb()
        } else {
            Err(AtelierError::UnknownCapability(capability.to_string()))
        }
    }
}

/// Render a vertical gradient PNG and return its encoded bytes
fn gradient_png(width: u32, height: u32) -> Result<Vec<u8>> {
    let img = image::RgbImage::from_fn(width, height, |_, y| {
        let r = (y * 255 / height) as u8;
        let g = ((height - 1 - y) * 255 / height) as u8;
        let b = ((y + 128) % 256) as u8;
        image::Rgb([r, g, b])
    });

    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
        .map_err(|e| AtelierError::service("mock", format!("failed to encode PNG: {}", e)))?;
    Ok(bytes)
}

/// Build a minimal valid glTF 2.0 binary (single triangle) in memory
fn minimal_glb() -> Result<Vec<u8>> {
    let json = serde_json::json!({
        "asset": { "version": "2.0", "generator": "atelier-mock" },
        "scene": 0,
        "scenes": [{ "nodes": [0] }],
        "nodes": [{ "mesh": 0 }],
        "meshes": [{
            "primitives": [{
                "attributes": { "POSITION": 0 },
                "indices": 1
            }]
        }],
        "accessors": [
            {
                "bufferView": 0,
                "componentType": 5126,
                "count": 3,
                "type": "VEC3",
                "max": [1.0, 1.0, 0.0],
                "min": [-1.0, 0.0, 0.0]
            },
            {
                "bufferView": 1,
                "componentType": 5123,
                "count": 3,
                "type": "SCALAR",
                "max": [2],
                "min": [0]
            }
        ],
        "bufferViews": [
            { "buffer": 0, "byteOffset": 0, "byteLength": 36, "target": 34962 },
            { "buffer": 0, "byteOffset": 36, "byteLength": 6, "target": 34963 }
        ],
        "buffers": [{ "byteLength": 44 }]
    });

    let json_str = serde_json::to_string(&json)
        .map_err(|e| AtelierError::service("mock", format!("failed to serialize GLB JSON: {}", e)))?;

    // JSON chunk padded to 4-byte alignment with spaces
    let mut json_chunk = json_str.into_bytes();
    json_chunk.resize((json_chunk.len() + 3) & !3, b' ');

    // Binary chunk: 3 vertices (f32 x3) + 3 u16 indices, zero-padded
    let vertices: [f32; 9] = [-1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0];
    let indices: [u16; 3] = [0, 1, 2];
    let mut bin_chunk = Vec::new();
    for v in &vertices {
        bin_chunk.extend_from_slice(&v.to_le_bytes());
    }
    for i in &indices {
        bin_chunk.extend_from_slice(&i.to_le_bytes());
    }
    bin_chunk.resize((bin_chunk.len() + 3) & !3, 0);

    let total_len = 12 + 8 + json_chunk.len() as u32 + 8 + bin_chunk.len() as u32;

    let mut glb = Vec::with_capacity(total_len as usize);
    glb.extend_from_slice(b"glTF");
    glb.extend_from_slice(&2u32.to_le_bytes());
    glb.extend_from_slice(&total_len.to_le_bytes());

    glb.extend_from_slice(&(json_chunk.len() as u32).to_le_bytes());
    glb.extend_from_slice(&0x4E4F534Au32.to_le_bytes()); // "JSON"
    glb.extend_from_slice(&json_chunk);

    glb.extend_from_slice(&(bin_chunk.len() as u32).to_le_bytes());
    glb.extend_from_slice(&0x004E4942u32.to_le_bytes()); // "BIN\0"
    glb.extend_from_slice(&bin_chunk);

    Ok(glb)
}
