use crate::engine::assets::manifest::VatMetadata;
use bevy::prelude::*;
use bevy::render::mesh::VertexAttributeValues;

/// Find the first mesh in `scene` and return a copy of it.
///
/// Roots are visited in entity order and children in hierarchy order. Returns
/// `None` when the scene has no mesh node or that node's mesh asset is not loaded yet.
pub fn extract_geometry(scene: &Scene, meshes: &Assets<Mesh>) -> Option<Mesh> {
    let world = &scene.world;

    let mut roots: Vec<Entity> = world
        .iter_entities()
        .filter(|entity| !entity.contains::<ChildOf>())
        .map(|entity| entity.id())
        .collect();
    roots.sort();

    // Reversed so the stack pops in visiting order.
    let mut stack: Vec<Entity> = roots.into_iter().rev().collect();
    while let Some(entity) = stack.pop() {
        let Ok(node) = world.get_entity(entity) else {
            continue;
        };
        if let Some(mesh) = node.get::<Mesh3d>() {
            return meshes.get(&mesh.0).cloned();
        }
        if let Some(children) = node.get::<Children>() {
            let children: &[Entity] = children;
            stack.extend(children.iter().rev().copied());
        }
    }
    None
}

/// Write the VAT lookup coordinates into `ATTRIBUTE_UV_1`. Does nothing if the mesh already has them.
pub fn ensure_vat_uv2(mesh: &mut Mesh, metadata: &VatMetadata) {
    if mesh.contains_attribute(Mesh::ATTRIBUTE_UV_1) {
        return;
    }
    let uvs: Vec<[f32; 2]> = (0..mesh.count_vertices() as u32)
        .map(|index| vat_uv2(index, metadata))
        .collect();
    mesh.insert_attribute(
        Mesh::ATTRIBUTE_UV_1,
        VertexAttributeValues::Float32x2(uvs),
    );
}

/// Texel centre of vertex `index` in frame 0 of the atlas.
pub fn vat_uv2(index: u32, metadata: &VatMetadata) -> [f32; 2] {
    let tex_height = metadata.tex_height.max(1);
    let column = index / tex_height;
    let row = index % tex_height;
    let px = column * metadata.frame_stride;
    let py = row;
    [
        (px as f32 + 0.5) / metadata.tex_width.max(1) as f32,
        (py as f32 + 0.5) / tex_height as f32,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::asset::RenderAssetUsages;
    use bevy::render::mesh::PrimitiveTopology;

    fn metadata() -> VatMetadata {
        VatMetadata {
            vertex_count: 5,
            frame_count: 3,
            fps: 24.0,
            tex_width: 9,
            tex_height: 2,
            columns: 3,
            frame_stride: 3,
            store_delta: false,
            normals_compressed: false,
        }
    }

    fn triangle_mesh(vertices: usize) -> Mesh {
        Mesh::new(
            PrimitiveTopology::TriangleList,
            RenderAssetUsages::default(),
        )
        .with_inserted_attribute(Mesh::ATTRIBUTE_POSITION, vec![[0.0f32; 3]; vertices])
    }

    fn uv2(mesh: &Mesh) -> Vec<[f32; 2]> {
        match mesh.attribute(Mesh::ATTRIBUTE_UV_1) {
            Some(VertexAttributeValues::Float32x2(values)) => values.clone(),
            other => panic!("unexpected UV2 attribute: {other:?}"),
        }
    }

    #[test]
    fn uv2_addresses_column_major_texels() {
        let metadata = metadata();
        assert_eq!(vat_uv2(0, &metadata), [0.5 / 9.0, 0.5 / 2.0]);
        assert_eq!(vat_uv2(1, &metadata), [0.5 / 9.0, 1.5 / 2.0]);
        // Second column starts one frame stride to the right.
        assert_eq!(vat_uv2(3, &metadata), [3.5 / 9.0, 1.5 / 2.0]);
        assert_eq!(vat_uv2(4, &metadata), [6.5 / 9.0, 0.5 / 2.0]);
    }

    #[test]
    fn ensure_vat_uv2_fills_every_vertex() {
        let mut mesh = triangle_mesh(5);
        ensure_vat_uv2(&mut mesh, &metadata());
        let uvs = uv2(&mesh);
        assert_eq!(uvs.len(), 5);
        assert_eq!(uvs[3], vat_uv2(3, &metadata()));
    }

    #[test]
    fn ensure_vat_uv2_is_idempotent() {
        let mut mesh = triangle_mesh(4);
        mesh.insert_attribute(Mesh::ATTRIBUTE_UV_1, vec![[0.25f32, 0.75]; 4]);
        ensure_vat_uv2(&mut mesh, &metadata());
        assert_eq!(uv2(&mesh), vec![[0.25, 0.75]; 4]);

        let mut fresh = triangle_mesh(4);
        ensure_vat_uv2(&mut fresh, &metadata());
        let first = uv2(&fresh);
        ensure_vat_uv2(&mut fresh, &metadata());
        assert_eq!(uv2(&fresh), first);
    }

    #[test]
    fn extracts_first_mesh_depth_first() {
        let mut meshes = Assets::<Mesh>::default();
        let first = meshes.add(triangle_mesh(3));
        let second = meshes.add(triangle_mesh(6));

        let mut world = World::new();
        let root = world.spawn(Transform::default()).id();
        let branch = world.spawn(ChildOf(root)).id();
        world.spawn((ChildOf(branch), Mesh3d(first)));
        world.spawn(Mesh3d(second));

        let extracted = extract_geometry(&Scene::new(world), &meshes).unwrap();
        assert_eq!(extracted.count_vertices(), 3);
    }

    #[test]
    fn missing_geometry_yields_none() {
        let meshes = Assets::<Mesh>::default();
        let mut world = World::new();
        world.spawn(Transform::default());
        assert!(extract_geometry(&Scene::new(world), &meshes).is_none());

        let mut world = World::new();
        world.spawn(Mesh3d(Handle::default()));
        assert!(extract_geometry(&Scene::new(world), &meshes).is_none());
    }
}
