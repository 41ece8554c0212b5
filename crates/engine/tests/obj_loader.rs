use std::fs;
use std::path::{Path, PathBuf};

use engine::obj;
use engine::texture::{self, MipChain};

struct TempDir(PathBuf);

impl TempDir {
    fn new(name: &str) -> Self {
        let dir = std::env::temp_dir().join(format!("engine-{name}-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        Self(dir)
    }

    fn write(&self, file: &str, contents: &str) -> PathBuf {
        let path = self.0.join(file);
        fs::write(&path, contents).unwrap();
        path
    }
}

impl Drop for TempDir {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.0);
    }
}

const QUAD: &str = "\
mtllib quad.mtl
o Quad
v 1.0 1.0 0.0
v -1.0 1.0 0.0
v 1.0 -1.0 0.0
v -1.0 -1.0 0.0
vt 0.0 0.0
vt 1.0 0.0
vt 0.0 1.0
vt 1.0 1.0
vn 0.0 0.0 1.0
usemtl Material
f 1/1/1 2/2/1 4/4/1
f 1/1/1 4/4/1 3/3/1
";

const QUAD_MTL: &str = "\
newmtl Material
Kd 0.8 0.8 0.8
map_Kd textures/checker.png
";

#[test]
fn loads_obj_with_material_from_disk() {
    let dir = TempDir::new("quad");
    let path = dir.write("quad.obj", QUAD);
    dir.write("quad.mtl", QUAD_MTL);

    let model = obj::load(&path).unwrap();

    assert_eq!(model.vertices.len(), 4);
    assert_eq!(model.indices.len(), 6);
    assert_eq!(
        model.material.texture_file_path,
        Some(dir.0.join("textures/checker.png"))
    );

    for vertex in &model.vertices {
        assert_eq!(vertex.position[3], 1.0);
        // facing +Z stays +Z; only X is mirrored
        assert_eq!(vertex.normal, [-0.0, 0.0, 1.0]);
    }
}

#[test]
fn mirrors_x_and_flips_v() {
    let dir = TempDir::new("mirror");
    let path = dir.write("quad.obj", QUAD);
    dir.write("quad.mtl", QUAD_MTL);

    let model = obj::load(&path).unwrap();

    // (1, 1) with uv (0, 0) in the file
    let corner = model
        .vertices
        .iter()
        .find(|v| v.position[..3] == [-1.0, 1.0, 0.0])
        .unwrap();
    assert_eq!(corner.texcoord, [0.0, 1.0]);
}

#[test]
fn reverses_triangle_winding() {
    let dir = TempDir::new("winding");
    let path = dir.write("quad.obj", QUAD);
    dir.write("quad.mtl", QUAD_MTL);

    let model = obj::load(&path).unwrap();

    for triangle in model.indices.chunks_exact(3) {
        let [a, b, c] = [0, 1, 2].map(|i| {
            let p = model.vertices[triangle[i] as usize].position;
            (p[0], p[1])
        });
        // mirroring X flips each triangle, reversing the indices flips it back
        let cross = (b.0 - a.0) * (c.1 - a.1) - (b.1 - a.1) * (c.0 - a.0);
        assert!(cross > 0.0, "{triangle:?} winds {cross}");
    }
}

#[test]
fn missing_material_library_still_loads_geometry() {
    let dir = TempDir::new("no-mtl");
    let path = dir.write("quad.obj", QUAD);

    let model = obj::load(&path).unwrap();

    assert_eq!(model.indices.len(), 6);
    assert_eq!(model.material.texture_file_path, None);
}

#[test]
fn missing_obj_is_an_error() {
    let dir = TempDir::new("missing");
    assert!(obj::load(dir.0.join("nothing.obj")).is_err());
}

#[test]
fn bundled_plane_references_bundled_texture() {
    let assets = Path::new(env!("CARGO_MANIFEST_DIR")).join("assets");

    let model = obj::load(assets.join("plane.obj")).unwrap();
    let texture_path = model.material.texture_file_path.unwrap();
    assert_eq!(texture_path, assets.join("uvChecker.png"));

    let mips = MipChain::generate(texture::decode(&texture_path).unwrap()).unwrap();
    let metadata = mips.metadata();
    assert_eq!((metadata.width, metadata.height), (256, 256));
    assert_eq!(metadata.mip_levels, 9);
}
