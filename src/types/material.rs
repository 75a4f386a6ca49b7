use std::path::PathBuf;

/// A raster referenced by a material.
///
/// Pixels are not held here; crop tasks decode them from `path` on demand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceImage {
    /// File name of the image, used as the variant dedup key.
    pub name: String,
    pub path: PathBuf,
    /// Dimensions read from the image header; `0x0` if unreadable.
    pub width: u32,
    pub height: u32,
}

/// Surface material whose base color may be driven by one image.
#[derive(Debug, Clone)]
pub struct Material {
    pub name: String,
    /// Diffuse color [r, g, b].
    pub diffuse: [f32; 3],
    /// Index into `MaterialLibrary::images`.
    pub base_color_texture: Option<usize>,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            name: String::new(),
            diffuse: [1.0, 1.0, 1.0],
            base_color_texture: None,
        }
    }
}

/// Collection of materials and the images they sample.
#[derive(Debug, Clone, Default)]
pub struct MaterialLibrary {
    pub materials: Vec<Material>,
    pub images: Vec<SourceImage>,
}

impl MaterialLibrary {
    /// The image feeding the base color of material `material_index`.
    pub fn primary_image(&self, material_index: Option<usize>) -> Option<&SourceImage> {
        let mat = self.materials.get(material_index?)?;
        self.images.get(mat.base_color_texture?)
    }

    /// Register an image, reusing an existing entry with the same path.
    pub fn find_or_add_image(&mut self, image: SourceImage) -> usize {
        if let Some(idx) = self.images.iter().position(|i| i.path == image.path) {
            return idx;
        }
        self.images.push(image);
        self.images.len() - 1
    }

    pub fn find_material(&self, name: &str) -> Option<usize> {
        self.materials.iter().position(|m| m.name == name)
    }

    /// Return the material named `name`, creating one that samples `image`
    /// if none exists yet.
    pub fn find_or_add_material(&mut self, name: &str, image: SourceImage) -> usize {
        if let Some(idx) = self.find_material(name) {
            return idx;
        }
        let tex = self.find_or_add_image(image);
        self.materials.push(Material {
            name: name.to_string(),
            base_color_texture: Some(tex),
            ..Default::default()
        });
        self.materials.len() - 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn image(name: &str) -> SourceImage {
        SourceImage {
            name: name.into(),
            path: PathBuf::from(format!("/tex/{name}")),
            width: 64,
            height: 32,
        }
    }

    #[test]
    fn material_defaults() {
        let mat = Material::default();
        assert_eq!(mat.name, "");
        assert_eq!(mat.diffuse, [1.0, 1.0, 1.0]);
        assert_eq!(mat.base_color_texture, None);
    }

    #[test]
    fn primary_image_resolution() {
        let mut lib = MaterialLibrary::default();
        lib.images.push(image("brick.png"));
        lib.materials.push(Material {
            name: "brick".into(),
            base_color_texture: Some(0),
            ..Default::default()
        });
        lib.materials.push(Material {
            name: "flat".into(),
            ..Default::default()
        });

        assert_eq!(lib.primary_image(Some(0)).unwrap().name, "brick.png");
        assert!(lib.primary_image(Some(1)).is_none());
        assert!(lib.primary_image(Some(7)).is_none());
        assert!(lib.primary_image(None).is_none());
    }

    #[test]
    fn images_dedup_by_path() {
        let mut lib = MaterialLibrary::default();
        let a = lib.find_or_add_image(image("a.png"));
        let b = lib.find_or_add_image(image("b.png"));
        let a_again = lib.find_or_add_image(image("a.png"));
        assert_eq!(a, a_again);
        assert_ne!(a, b);
        assert_eq!(lib.images.len(), 2);
        assert_eq!(lib.images[b].path, Path::new("/tex/b.png"));
    }

    #[test]
    fn material_lookup_by_name_is_idempotent() {
        let mut lib = MaterialLibrary::default();
        let first = lib.find_or_add_material("a.png_variant1", image("a.png_variant1.png"));
        let second = lib.find_or_add_material("a.png_variant1", image("a.png_variant1.png"));
        assert_eq!(first, second);
        assert_eq!(lib.materials.len(), 1);
        assert_eq!(lib.images.len(), 1);
        assert_eq!(
            lib.primary_image(Some(first)).unwrap().name,
            "a.png_variant1.png"
        );
    }
}
