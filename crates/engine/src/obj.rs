//! Wavefront OBJ/MTL loading.
//!
//! OBJ files are authored right-handed with the texture origin at the bottom
//! left; the renderer is left-handed with the origin at the top left. Loading
//! negates X of positions and normals, flips V and reverses the winding of
//! every triangle so front faces stay front faces.

use std::io::BufRead;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::math::VertexData;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MaterialData {
    pub texture_file_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default)]
pub struct ModelData {
    pub vertices: Vec<VertexData>,
    pub indices: Vec<u32>,
    pub material: MaterialData,
}

pub fn load(path: impl AsRef<Path>) -> Result<ModelData> {
    let path = path.as_ref();
    tracing::debug!("Loading {}", path.display());

    let (models, materials) = tobj::load_obj(path, &tobj::GPU_LOAD_OPTIONS)?;
    let dir = path.parent().unwrap_or(Path::new(""));
    Ok(convert(&models, materials, dir))
}

/// Loads an OBJ from memory. `material_loader` resolves `mtllib` statements and
/// `dir` is the directory texture paths are relative to.
pub fn load_from_reader<B, ML>(reader: &mut B, dir: &Path, material_loader: ML) -> Result<ModelData>
where
    B: BufRead,
    ML: Fn(&Path) -> tobj::MTLLoadResult,
{
    let (models, materials) = tobj::load_obj_buf(reader, &tobj::GPU_LOAD_OPTIONS, material_loader)?;
    Ok(convert(&models, materials, dir))
}

fn convert(
    models: &[tobj::Model],
    materials: std::result::Result<Vec<tobj::Material>, tobj::LoadError>,
    dir: &Path,
) -> ModelData {
    let materials = materials.unwrap_or_else(|e| {
        tracing::warn!("Failed to load the material library: {e}");
        Vec::new()
    });

    let mut data = ModelData::default();

    for model in models {
        let mesh = &model.mesh;
        let base = data.vertices.len() as u32;

        let vertex_count = mesh.positions.len() / 3;
        for i in 0..vertex_count {
            let p = &mesh.positions[3 * i..3 * i + 3];

            let texcoord = mesh
                .texcoords
                .get(2 * i..2 * i + 2)
                .map_or([0.0, 0.0], |t| [t[0], 1.0 - t[1]]);

            let normal = mesh
                .normals
                .get(3 * i..3 * i + 3)
                .map_or([0.0, 0.0, 0.0], |n| [-n[0], n[1], n[2]]);

            data.vertices.push(VertexData {
                position: [-p[0], p[1], p[2], 1.0],
                texcoord,
                normal,
            });
        }

        for triangle in mesh.indices.chunks_exact(3) {
            data.indices.extend([
                base + triangle[2],
                base + triangle[1],
                base + triangle[0],
            ]);
        }

        if data.material.texture_file_path.is_none() {
            let texture = mesh
                .material_id
                .and_then(|id| materials.get(id))
                .and_then(|m| m.diffuse_texture.as_ref());
            if let Some(texture) = texture {
                data.material.texture_file_path = Some(dir.join(texture));
            }
        }
    }

    // `usemtl` is optional; fall back to the first textured material in the library
    if data.material.texture_file_path.is_none() {
        if let Some(texture) = materials.iter().find_map(|m| m.diffuse_texture.as_ref()) {
            data.material.texture_file_path = Some(dir.join(texture));
        }
    }

    tracing::debug!(
        vertices = data.vertices.len(),
        indices = data.indices.len(),
        "Converted {} OBJ object(s)",
        models.len()
    );

    data
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRIANGLE: &str = "\
mtllib triangle.mtl
v 1.0 0.0 0.0
v 0.0 1.0 0.0
v 0.0 0.0 1.0
vt 0.0 0.0
vt 1.0 0.0
vt 0.0 0.25
vn 1.0 0.0 0.0
usemtl checker
f 1/1/1 2/2/1 3/3/1
";

    const MTL: &str = "\
newmtl checker
Kd 1.0 1.0 1.0
map_Kd uvChecker.png
";

    fn mtl_loader(_: &Path) -> tobj::MTLLoadResult {
        tobj::load_mtl_buf(&mut MTL.as_bytes())
    }

    fn no_mtl(_: &Path) -> tobj::MTLLoadResult {
        Err(tobj::LoadError::OpenFileFailed)
    }

    #[test]
    fn converts_to_left_handed() {
        let model =
            load_from_reader(&mut TRIANGLE.as_bytes(), Path::new("resources"), mtl_loader).unwrap();

        assert_eq!(model.vertices.len(), 3);
        assert_eq!(model.vertices[0].position, [-1.0, 0.0, 0.0, 1.0]);
        assert_eq!(model.vertices[1].position, [0.0, 1.0, 0.0, 1.0]);
        assert_eq!(model.vertices[0].texcoord, [0.0, 1.0]);
        assert_eq!(model.vertices[2].texcoord, [0.0, 0.75]);
        assert_eq!(model.vertices[0].normal, [-1.0, 0.0, 0.0]);

        // winding reversed
        assert_eq!(model.indices, vec![2, 1, 0]);
    }

    #[test]
    fn texture_path_is_relative_to_the_obj() {
        let model =
            load_from_reader(&mut TRIANGLE.as_bytes(), Path::new("resources"), mtl_loader).unwrap();
        assert_eq!(
            model.material.texture_file_path,
            Some(Path::new("resources").join("uvChecker.png"))
        );
    }

    #[test]
    fn quads_are_triangulated() {
        let quad = "\
v -1.0 -1.0 0.0
v 1.0 -1.0 0.0
v 1.0 1.0 0.0
v -1.0 1.0 0.0
vt 0.0 0.0
vt 1.0 0.0
vt 1.0 1.0
vt 0.0 1.0
f 1/1 2/2 3/3 4/4
";
        let model = load_from_reader(&mut quad.as_bytes(), Path::new(""), no_mtl).unwrap();
        assert_eq!(model.vertices.len(), 4);
        assert_eq!(model.indices.len(), 6);
        assert!(model.indices.iter().all(|&i| i < 4));
        assert_eq!(model.vertices[0].normal, [0.0, 0.0, 0.0]);
        assert_eq!(model.material, MaterialData::default());
    }

    #[test]
    fn objects_are_merged_with_offset_indices() {
        let two = "\
o first
v 0.0 0.0 0.0
v 1.0 0.0 0.0
v 0.0 1.0 0.0
f 1 2 3
o second
v 0.0 0.0 1.0
v 1.0 0.0 1.0
v 0.0 1.0 1.0
f 4 5 6
";
        let model = load_from_reader(&mut two.as_bytes(), Path::new(""), no_mtl).unwrap();
        assert_eq!(model.vertices.len(), 6);
        assert_eq!(model.indices, vec![2, 1, 0, 5, 4, 3]);
        assert_eq!(model.vertices[3].position, [0.0, 0.0, 1.0, 1.0]);
    }

    #[test]
    fn material_without_usemtl_still_provides_texture() {
        let obj = "\
mtllib triangle.mtl
v 0.0 0.0 0.0
v 1.0 0.0 0.0
v 0.0 1.0 0.0
f 1 2 3
";
        let model = load_from_reader(&mut obj.as_bytes(), Path::new("dir"), mtl_loader).unwrap();
        assert_eq!(
            model.material.texture_file_path,
            Some(Path::new("dir").join("uvChecker.png"))
        );
    }
}
