use std::io::Write;

use glam::Vec3;
use tracing::debug;

use crate::tomo_pipeline::common::error::{PipelineError, Result};
use crate::tomo_pipeline::config::StlFormat;
use crate::tomo_pipeline::export::writer::MeshExporter;
use crate::tomo_pipeline::surface::Mesh;

const SOLID_NAME: &str = "turntable_ct";
const BINARY_HEADER_LEN: usize = 80;

/// STL exporter; binary by default.
#[derive(Debug, Clone, Copy, Default)]
pub struct StlWriter {
    format: StlFormat,
}

impl StlWriter {
    pub fn new(format: StlFormat) -> Self {
        Self { format }
    }

    pub fn format(&self) -> StlFormat {
        self.format
    }

    fn write_binary(&self, mesh: &Mesh, output: &mut dyn Write) -> Result<()> {
        let count = u32::try_from(mesh.num_faces()).map_err(|_| {
            PipelineError::ExportError(format!(
                "{} triangles do not fit a binary STL",
                mesh.num_faces()
            ))
        })?;

        let mut header = [0u8; BINARY_HEADER_LEN];
        let title = format!("binary STL written by {SOLID_NAME}");
        header[..title.len()].copy_from_slice(title.as_bytes());

        // 50 bytes per facet
        let mut buffer = Vec::with_capacity(BINARY_HEADER_LEN + 4 + mesh.num_faces() * 50);
        buffer.extend_from_slice(&header);
        buffer.extend_from_slice(&count.to_le_bytes());
        for (index, normal) in mesh.normals.iter().enumerate() {
            for v in std::iter::once(*normal).chain(mesh.triangle(index)) {
                for component in v.to_array() {
                    buffer.extend_from_slice(&component.to_le_bytes());
                }
            }
            buffer.extend_from_slice(&0u16.to_le_bytes());
        }
        output.write_all(&buffer)?;
        Ok(())
    }

    fn write_ascii(&self, mesh: &Mesh, output: &mut dyn Write) -> Result<()> {
        fn vec3(v: Vec3) -> String {
            format!("{:e} {:e} {:e}", v.x, v.y, v.z)
        }

        let mut text = format!("solid {SOLID_NAME}\n");
        for (index, normal) in mesh.normals.iter().enumerate() {
            text.push_str(&format!("  facet normal {}\n    outer loop\n", vec3(*normal)));
            for vertex in mesh.triangle(index) {
                text.push_str(&format!("      vertex {}\n", vec3(vertex)));
            }
            text.push_str("    endloop\n  endfacet\n");
        }
        text.push_str(&format!("endsolid {SOLID_NAME}\n"));
        output.write_all(text.as_bytes())?;
        Ok(())
    }
}

impl MeshExporter for StlWriter {
    fn extension(&self) -> &'static str {
        "stl"
    }

    fn export_mesh(&self, mesh: &Mesh, output: &mut dyn Write) -> Result<()> {
        if !mesh.is_valid() {
            return Err(PipelineError::ExportError(
                "mesh references missing vertices or lacks normals".to_string(),
            ));
        }
        debug!(faces = mesh.num_faces(), format = ?self.format, "Writing STL");
        match self.format {
            StlFormat::Binary => self.write_binary(mesh, output),
            StlFormat::Ascii => self.write_ascii(mesh, output),
        }
    }
}
