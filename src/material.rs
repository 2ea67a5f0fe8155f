use crate::color::Color;
use crate::error::ConfigError;
use crate::part::{MaterialKind, MaterialParams, Side};
use crate::texture::{TextureLoader, TextureSlot};

const DEFAULT_ROUGHNESS: f32 = 1.0;
const DEFAULT_METALNESS: f32 = 0.0;
const DEFAULT_SHININESS: f32 = 30.0;

/// Validated surface description of a mesh.
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub kind: MaterialKind,
    pub color: Color,
    pub emissive: Color,
    pub wireframe: bool,
    pub roughness: f32,
    pub metalness: f32,
    pub shininess: f32,
    pub side: Side,
    pub map: Option<TextureSlot>,
    pub normal_map: Option<TextureSlot>,
}

impl Material {
    /// Validates `params` for `kind`, then starts loading any textures.
    ///
    /// Texture loads are only requested once every parameter has been
    /// accepted, so a rejected material never touches the loader.
    pub fn from_params(
        kind: MaterialKind,
        params: &MaterialParams,
        loader: &dyn TextureLoader,
    ) -> Result<Self, ConfigError> {
        check_supported(kind, params)?;

        let color = Color::from_hex(&params.color)?;
        let emissive = params
            .emissive
            .as_deref()
            .map(Color::from_hex)
            .transpose()?
            .unwrap_or(Color::BLACK);
        let roughness = unit_interval("roughness", params.roughness, DEFAULT_ROUGHNESS)?;
        let metalness = unit_interval("metalness", params.metalness, DEFAULT_METALNESS)?;
        let shininess = params.shininess.unwrap_or(DEFAULT_SHININESS);
        if !(shininess.is_finite() && shininess >= 0.0) {
            return Err(ConfigError::InvalidMaterialParam {
                name: "shininess",
                expected: "must be a non-negative number",
                value: shininess,
            });
        }

        let refs = params.texture_refs.clone().unwrap_or_default();
        if refs.map.as_deref().is_some_and(|r| r.trim().is_empty()) {
            return Err(ConfigError::EmptyTextureRef("map"));
        }
        if refs.normal_map.as_deref().is_some_and(|r| r.trim().is_empty()) {
            return Err(ConfigError::EmptyTextureRef("normal_map"));
        }

        Ok(Self {
            kind,
            color,
            emissive,
            wireframe: params.wireframe.unwrap_or(false),
            roughness,
            metalness,
            shininess,
            side: params.side.unwrap_or_default(),
            map: refs.map.as_deref().map(|r| loader.load(r)),
            normal_map: refs.normal_map.as_deref().map(|r| loader.load(r)),
        })
    }

    /// Every texture slot owned by the material.
    pub fn textures(&self) -> impl Iterator<Item = &TextureSlot> {
        self.map.iter().chain(self.normal_map.iter())
    }
}

fn check_supported(kind: MaterialKind, params: &MaterialParams) -> Result<(), ConfigError> {
    let unsupported = |property| ConfigError::UnsupportedMaterialProperty {
        kind: kind.name(),
        property,
    };
    let standard_only = [
        ("roughness", params.roughness.is_some()),
        ("metalness", params.metalness.is_some()),
        ("texture_refs", params.texture_refs.is_some()),
    ];
    match kind {
        MaterialKind::Standard => {
            if params.shininess.is_some() {
                return Err(unsupported("shininess"));
            }
        }
        MaterialKind::Lambert | MaterialKind::Phong => {
            if let Some((property, _)) = standard_only.iter().find(|(_, set)| *set) {
                return Err(unsupported(*property));
            }
            if kind == MaterialKind::Lambert && params.shininess.is_some() {
                return Err(unsupported("shininess"));
            }
        }
    }
    Ok(())
}

fn unit_interval(name: &'static str, value: Option<f32>, default: f32) -> Result<f32, ConfigError> {
    let value = value.unwrap_or(default);
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(ConfigError::InvalidMaterialParam {
            name,
            expected: "must be within [0, 1]",
            value,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::texture::TextureState;

    #[derive(Default)]
    struct RecordingLoader {
        requests: RefCell<Vec<String>>,
    }

    impl TextureLoader for RecordingLoader {
        fn load(&self, reference: &str) -> TextureSlot {
            self.requests.borrow_mut().push(reference.to_string());
            TextureSlot::new(reference)
        }
    }

    #[test]
    fn standard_defaults_follow_three_style_values() {
        let loader = RecordingLoader::default();
        let material =
            Material::from_params(MaterialKind::Standard, &MaterialParams::new("#FFFFFF"), &loader)
                .unwrap();
        assert_eq!(material.roughness, 1.0);
        assert_eq!(material.metalness, 0.0);
        assert_eq!(material.emissive, Color::BLACK);
        assert_eq!(material.side, Side::Front);
        assert!(!material.wireframe);
        assert!(material.textures().next().is_none());
    }

    #[test]
    fn textures_start_pending() {
        let loader = RecordingLoader::default();
        let params = MaterialParams::new("#FFFFFF")
            .map("moon_texture.jpg")
            .normal_map("normal_moon_texture.jpg")
            .side(Side::Double);
        let material = Material::from_params(MaterialKind::Standard, &params, &loader).unwrap();
        assert_eq!(
            *loader.requests.borrow(),
            vec!["moon_texture.jpg", "normal_moon_texture.jpg"]
        );
        let map = material.map.as_ref().unwrap();
        assert_eq!(map.state(), TextureState::Unloaded);
        assert_eq!(material.side, Side::Double);
    }

    #[test]
    fn unsupported_properties_are_rejected() {
        let loader = RecordingLoader::default();
        let phong = MaterialParams::new("#540600").shininess(0.5).roughness(0.2);
        assert_eq!(
            Material::from_params(MaterialKind::Phong, &phong, &loader),
            Err(ConfigError::UnsupportedMaterialProperty {
                kind: "phong",
                property: "roughness",
            })
        );

        let lambert = MaterialParams::new("#004E8A").shininess(10.0);
        assert!(Material::from_params(MaterialKind::Lambert, &lambert, &loader).is_err());

        let standard = MaterialParams::new("#FFFFFF").shininess(10.0);
        assert!(Material::from_params(MaterialKind::Standard, &standard, &loader).is_err());

        let textured = MaterialParams::new("#FFFFFF").map("moon.jpg");
        assert!(Material::from_params(MaterialKind::Phong, &textured, &loader).is_err());
        assert!(loader.requests.borrow().is_empty());
    }

    #[test]
    fn malformed_colors_and_ranges_are_rejected() {
        let loader = RecordingLoader::default();
        let missing_hash = MaterialParams::new("B01D11").roughness(0.2).metalness(1.0);
        assert_eq!(
            Material::from_params(MaterialKind::Standard, &missing_hash, &loader),
            Err(ConfigError::MalformedColor("B01D11".into()))
        );

        let bad_emissive = MaterialParams::new("#FDCF19").emissive("DB1D1D");
        assert!(Material::from_params(MaterialKind::Standard, &bad_emissive, &loader).is_err());

        let rough = MaterialParams::new("#FFFFFF").roughness(1.5);
        assert!(matches!(
            Material::from_params(MaterialKind::Standard, &rough, &loader),
            Err(ConfigError::InvalidMaterialParam {
                name: "roughness",
                ..
            })
        ));

        let empty = MaterialParams::new("#FFFFFF").map(" ");
        assert_eq!(
            Material::from_params(MaterialKind::Standard, &empty, &loader),
            Err(ConfigError::EmptyTextureRef("map"))
        );
    }
}
