//! Wavefront OBJ loading through `tobj`.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use lux_math::{Vec2, Vec3};

use crate::loader::{LoadError, LoadResult};
use crate::mesh::Mesh;

fn load_options() -> tobj::LoadOptions {
    tobj::LoadOptions {
        single_index: true,
        triangulate: true,
        ..Default::default()
    }
}

/// Load every model of an OBJ file as a separate mesh.
///
/// Missing normals are computed; material libraries are ignored.
pub fn load_obj(path: impl AsRef<Path>) -> LoadResult<Vec<Mesh>> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| LoadError::Io {
        path: path.display().to_string(),
        source,
    })?;

    let meshes = parse_obj(&mut BufReader::new(file), &path.display().to_string())?;
    log::info!(
        "Loaded {} meshes ({} triangles) from {}",
        meshes.len(),
        meshes.iter().map(Mesh::triangle_count).sum::<usize>(),
        path.display()
    );
    Ok(meshes)
}

/// Parse OBJ data from a reader. `name` is used in error messages.
pub fn parse_obj(reader: &mut impl BufRead, name: &str) -> LoadResult<Vec<Mesh>> {
    let (models, _materials) =
        tobj::load_obj_buf(reader, &load_options(), |_| Err(tobj::LoadError::OpenFileFailed))
            .map_err(|source| LoadError::Obj {
                path: name.to_string(),
                source,
            })?;

    let meshes: Vec<Mesh> = models
        .into_iter()
        .filter(|model| !model.mesh.indices.is_empty())
        .map(|model| {
            let mesh = model.mesh;
            let positions = mesh
                .positions
                .chunks_exact(3)
                .map(|p| Vec3::new(p[0], p[1], p[2]))
                .collect::<Vec<_>>();
            let normals = (!mesh.normals.is_empty()).then(|| {
                mesh.normals
                    .chunks_exact(3)
                    .map(|n| Vec3::new(n[0], n[1], n[2]).normalize_or_zero())
                    .collect()
            });
            let uvs = (!mesh.texcoords.is_empty()).then(|| {
                mesh.texcoords
                    .chunks_exact(2)
                    .map(|t| Vec2::new(t[0], t[1]))
                    .collect()
            });
            let triangles = mesh
                .indices
                .chunks_exact(3)
                .map(|t| [t[0], t[1], t[2]])
                .collect();

            let mut mesh = Mesh::new_with_uvs(positions, triangles, normals, uvs);
            mesh.ensure_normals();
            log::debug!(
                "OBJ model '{}': {} vertices, {} triangles",
                model.name,
                mesh.vertex_count(),
                mesh.triangle_count()
            );
            mesh
        })
        .collect();

    if meshes.is_empty() {
        return Err(LoadError::NoGeometry(name.to_string()));
    }
    Ok(meshes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const QUAD_OBJ: &str = "\
o quad
v -1 -1 0
v 1 -1 0
v 1 1 0
v -1 1 0
vt 0 0
vt 1 0
vt 1 1
vt 0 1
f 1/1 2/2 3/3 4/4
";

    #[test]
    fn test_parse_quad_is_triangulated() {
        let meshes = parse_obj(&mut Cursor::new(QUAD_OBJ), "quad.obj").unwrap();
        assert_eq!(meshes.len(), 1);

        let mesh = &meshes[0];
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.triangle_count(), 2);
        assert!(mesh.has_uvs());
        assert!(mesh.validate().is_ok());

        // Normals were computed from the counter-clockwise winding
        for n in mesh.normals.as_ref().unwrap() {
            assert!((*n - Vec3::Z).length() < 1e-5);
        }
    }

    #[test]
    fn test_parse_without_faces_is_an_error() {
        let result = parse_obj(&mut Cursor::new("v 0 0 0\nv 1 0 0\n"), "points.obj");
        assert!(matches!(result, Err(LoadError::NoGeometry(_))));
    }

    #[test]
    fn test_missing_file() {
        let result = load_obj("/nonexistent-lux-dir/missing.obj");
        assert!(matches!(result, Err(LoadError::Io { .. })));
    }
}
