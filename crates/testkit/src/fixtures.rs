use image::codecs::png::PngEncoder;
use image::{ColorType, ImageEncoder, Rgba, RgbaImage};

use crate::MemorySource;

/// Skin texture side length.
pub const SKIN_SIZE: u32 = 64;

/// Texture server URL for a texture hash.
pub fn skin_url(hash: &str) -> String {
    format!("http://textures.minecraft.net/texture/{hash}")
}

/// Texture blob pointing at [`skin_url`].
pub fn texture_blob(hash: &str) -> String {
    headsmith_core::encode_blob(&skin_url(hash))
}

fn shade(color: [u8; 3], factor: f32) -> Rgba<u8> {
    let [r, g, b] = color.map(|c| (c as f32 * factor).min(255.0) as u8);
    Rgba([r, g, b, 255])
}

/// A 64x64 skin whose head faces are flat colors.
///
/// Top is lighter and right is darker than the front. With `hat` the
/// overlay top is painted white; the rest of the overlay stays transparent.
pub fn skin_image(color: [u8; 3], hat: bool) -> RgbaImage {
    RgbaImage::from_fn(SKIN_SIZE, SKIN_SIZE, |x, y| match (x, y) {
        (8..=15, 0..=7) => shade(color, 1.25),
        (8..=15, 8..=15) => shade(color, 1.0),
        (0..=7, 8..=15) => shade(color, 0.6),
        (40..=47, 0..=7) if hat => Rgba([255, 255, 255, 255]),
        _ => Rgba([0, 0, 0, 0]),
    })
}

/// PNG bytes of [`skin_image`].
pub fn skin_png(color: [u8; 3], hat: bool) -> Vec<u8> {
    encode_png(&skin_image(color, hat))
}

/// Encode an RGBA image as PNG.
pub fn encode_png(image: &RgbaImage) -> Vec<u8> {
    let mut out = Vec::new();
    PngEncoder::new(&mut out)
        .write_image(image.as_raw(), image.width(), image.height(), ColorType::Rgba8.into())
        .expect("encode fixture png");
    out
}

/// `config.yml` listing the sample head files.
pub const SAMPLE_MANIFEST: &str = r#"head-files:
  - heads/alphabet.yml
  - heads/storage.yml
excluded-heads:
  - hidden_head
"#;

/// Letters carved from planks.
pub const SAMPLE_ALPHABET: &str = r#"heads:
  oak_a:
    name: "&6Oak &lA"
    lore:
      - "&7Carved from oak"
    tags: [alphabet/oak, letters]
    texture: eyJ0ZXh0dXJlcyI6eyJTS0lOIjp7InVybCI6Imh0dHA6Ly90ZXh0dXJlcy5taW5lY3JhZnQubmV0L3RleHR1cmUvb2FrYSJ9fX0=
    recipes:
      stonecutter:
        - input: { material: OAK_PLANKS }
          amount: 4
  birch_a:
    name: "&fBirch A"
    tags: [alphabet/birch, letters]
  hidden_head:
    name: Hidden
"#;

/// Storage heads, including a recipe that consumes a letter head.
pub const SAMPLE_STORAGE: &str = r#"heads:
  barrel:
    name: "&6Barrel"
    tags: [storage]
    properties: [workbench]
    recipes:
      craft:
        shaped:
          - pattern: ["PSP", "PAP", "PSP"]
            key:
              P: { material: OAK_PLANKS }
              S: { material: OAK_SLAB }
              A: { head: oak_a }
    drops:
      on_break:
        - when: { silk_touch: true }
          drops: [{ head: barrel }]
        - drops: [{ material: OAK_PLANKS, amount: 3 }]
"#;

/// Memory source holding the sample manifest, head files and head counts.
pub fn sample_source() -> MemorySource {
    MemorySource::new()
        .with_file("config.yml", SAMPLE_MANIFEST)
        .with_file("heads/alphabet.yml", SAMPLE_ALPHABET)
        .with_file("heads/storage.yml", SAMPLE_STORAGE)
        .with_file(
            "head-count.json",
            r#"{"heads/alphabet.yml": 3, "heads/storage.yml": 1, "total": 4}"#,
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use headsmith_core::SkinTexture;

    #[test]
    fn sample_blob_decodes_to_oak_texture() {
        let skin = SkinTexture::decode(&texture_blob("oaka")).unwrap();
        assert_eq!(skin.texture_id(), Some("oaka"));
        assert!(SAMPLE_ALPHABET.contains(&texture_blob("oaka")));
    }

    #[test]
    fn skin_fixture_paints_head_faces() {
        let image = skin_image([100, 50, 0], true);
        assert_eq!(image.get_pixel(10, 10).0, [100, 50, 0, 255]);
        assert_eq!(image.get_pixel(2, 10).0, [60, 30, 0, 255]);
        assert_eq!(image.get_pixel(42, 2).0, [255, 255, 255, 255]);
        assert_eq!(image.get_pixel(34, 10).0[3], 0);
        assert!(skin_png([1, 2, 3], false).starts_with(&[0x89, b'P', b'N', b'G']));
    }
}
