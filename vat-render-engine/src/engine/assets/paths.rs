/// Resolve a sub-resource path referenced by a manifest.
///
/// Rooted paths (`/models/a.glb`) and URLs (`https://…`, `embedded://…`) are used verbatim.
/// Anything else is joined onto the manifest's own directory.
pub fn resolve_asset_path(manifest_path: &str, relative: &str) -> String {
    if is_absolute(relative) {
        return relative.to_string();
    }
    let directory = match manifest_path.rfind('/') {
        Some(index) => &manifest_path[..=index],
        None => "",
    };
    format!("{directory}{relative}")
}

fn is_absolute(path: &str) -> bool {
    path.starts_with('/') || path.contains("://")
}

/// Lower-cased file extension, ignoring any query string or fragment.
pub fn file_extension(path: &str) -> Option<String> {
    let path = path.split(['?', '#']).next().unwrap_or(path);
    let file_name = path.rsplit('/').next().unwrap_or(path);
    let (_, extension) = file_name.rsplit_once('.')?;
    if extension.is_empty() {
        return None;
    }
    Some(extension.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_paths_join_manifest_directory() {
        assert_eq!(
            resolve_asset_path("vat/rose/Rose_meta.json", "Rose.glb"),
            "vat/rose/Rose.glb"
        );
        assert_eq!(
            resolve_asset_path("vat/rose/Rose_meta.json", "tex/Rose_pos.exr"),
            "vat/rose/tex/Rose_pos.exr"
        );
    }

    #[test]
    fn manifest_without_directory_resolves_beside_it() {
        assert_eq!(resolve_asset_path("meta.json", "mesh.glb"), "mesh.glb");
    }

    #[test]
    fn absolute_paths_are_verbatim() {
        assert_eq!(
            resolve_asset_path("vat/rose/Rose_meta.json", "/shared/Rose.glb"),
            "/shared/Rose.glb"
        );
        assert_eq!(
            resolve_asset_path("vat/meta.json", "https://cdn.example.com/a.exr"),
            "https://cdn.example.com/a.exr"
        );
        assert_eq!(
            resolve_asset_path("vat/meta.json", "http://host/b.png"),
            "http://host/b.png"
        );
    }

    #[test]
    fn extension_is_lowercased_and_query_free() {
        assert_eq!(file_extension("a/b/Rose.GLB").as_deref(), Some("glb"));
        assert_eq!(
            file_extension("https://cdn/x/pos.exr?v=3").as_deref(),
            Some("exr")
        );
        assert_eq!(file_extension("dir.v2/noext"), None);
        assert_eq!(file_extension("trailing."), None);
    }
}
