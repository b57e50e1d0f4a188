use std::sync::Arc;

use base64::Engine as _;
use headsmith_render::{
    canvas_size, load_element, ElementKind, HeadRenderer, LazyElement, LoadOutcome, RenderError,
    TextureCache, VisibilityLoader, CORS_PROXY, MAX_RENDER_SIZE,
};
use headsmith_core::cache_key;
use headsmith_testkit::{skin_png, skin_url, texture_blob, MemorySource};

fn proxied(hash: &str) -> String {
    format!("{CORS_PROXY}{}", urlencoding::encode(&skin_url(hash)))
}

fn source_with_skin(hash: &str) -> Arc<MemorySource> {
    Arc::new(MemorySource::new().with_file(proxied(hash), skin_png([120, 80, 40], true)))
}

fn decode_data_url(data_url: &str) -> image::RgbaImage {
    let payload = data_url
        .strip_prefix("data:image/png;base64,")
        .expect("png data url");
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(payload)
        .unwrap();
    image::load_from_memory(&bytes).unwrap().to_rgba8()
}

#[tokio::test]
async fn renders_through_proxy_and_caches() {
    let source = source_with_skin("cafe");
    let mut renderer = HeadRenderer::new(source.clone(), TextureCache::new(8));
    let blob = texture_blob("cafe");

    let first = renderer.cached_isometric_head(&blob).await.unwrap();
    let second = renderer.cached_isometric_head(&blob).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(source.request_count(&proxied("cafe")), 1);
    assert_eq!(renderer.cache().len(), 1);

    let image = decode_data_url(&first);
    assert_eq!(image.dimensions(), (148, 173));
}

#[tokio::test]
async fn output_is_deterministic_per_blob() {
    let blob = texture_blob("cafe");
    let mut a = HeadRenderer::new(source_with_skin("cafe"), TextureCache::new(4));
    let mut b = HeadRenderer::new(source_with_skin("cafe"), TextureCache::new(4));
    assert_eq!(
        a.cached_isometric_head(&blob).await.unwrap(),
        b.cached_isometric_head(&blob).await.unwrap()
    );
}

#[tokio::test]
async fn direct_fetch_without_proxy() {
    let source = Arc::new(MemorySource::new().with_file(skin_url("beef"), skin_png([1, 2, 3], false)));
    let mut renderer = HeadRenderer::new(source.clone(), TextureCache::default()).with_proxy(None);
    renderer
        .cached_isometric_head(&texture_blob("beef"))
        .await
        .unwrap();
    assert_eq!(source.requests(), vec![skin_url("beef")]);
}

#[tokio::test]
async fn failures_are_reported_and_not_cached() {
    let source = Arc::new(
        MemorySource::new().with_file(proxied("junk"), b"definitely not a png".to_vec()),
    );
    let mut renderer = HeadRenderer::new(source.clone(), TextureCache::new(4));

    let missing = renderer.cached_isometric_head(&texture_blob("gone")).await;
    assert!(matches!(missing, Err(RenderError::Fetch(_))));
    let garbage = renderer.cached_isometric_head(&texture_blob("junk")).await;
    assert!(matches!(garbage, Err(RenderError::Image(_))));
    let invalid = renderer.cached_isometric_head("@@@").await;
    assert!(matches!(invalid, Err(RenderError::Texture(_))));

    renderer.cached_isometric_head(&texture_blob("gone")).await.ok();
    assert_eq!(source.request_count(&proxied("gone")), 2);
    assert!(renderer.cache().is_empty());
}

#[tokio::test]
async fn cache_entries_are_keyed_by_render_size() {
    let source = source_with_skin("cafe");
    let blob = texture_blob("cafe");
    let mut renderer = HeadRenderer::new(source.clone(), TextureCache::new(8));
    let large = renderer.cached_isometric_head(&blob).await.unwrap();
    assert_eq!(decode_data_url(&large).dimensions(), (148, 173));

    let mut small = HeadRenderer::new(source.clone(), renderer.into_cache()).with_size(16);
    let data_url = small.cached_isometric_head(&blob).await.unwrap();
    assert_eq!(decode_data_url(&data_url).dimensions(), (37, 44));
    assert_eq!(source.request_count(&proxied("cafe")), 2);
    assert_eq!(small.cache().len(), 2);
    assert!(small.cache().contains(&small.render_key(&blob)));
    assert!(small.render_key(&blob).starts_with("16@"));
}

#[tokio::test]
async fn out_of_range_render_sizes_are_clamped() {
    let blob = texture_blob("cafe");
    let huge = HeadRenderer::new(source_with_skin("cafe"), TextureCache::new(2)).with_size(100_000);
    assert_eq!(huge.render_key(&blob), format!("{MAX_RENDER_SIZE}@{}", cache_key(&blob)));

    let tiny = HeadRenderer::new(source_with_skin("cafe"), TextureCache::new(2)).with_size(0);
    let image = tiny.render(&blob).await.unwrap();
    assert_eq!(image.dimensions(), canvas_size(1));
}

#[tokio::test]
async fn visible_elements_load_once_per_pass() {
    let mut renderer = HeadRenderer::new(source_with_skin("cafe"), TextureCache::new(4));
    let mut loader = VisibilityLoader::new();
    let pass = loader.begin_pass();
    loader.observe(LazyElement {
        key: "card-1".into(),
        kind: ElementKind::HeadTexture,
        data: Some(texture_blob("cafe")),
    });
    loader.observe(LazyElement {
        key: "drop-1".into(),
        kind: ElementKind::DropHeadIcon,
        data: Some(texture_blob("nope")),
    });
    loader.observe(LazyElement {
        key: "icon-1".into(),
        kind: ElementKind::LazyImage,
        data: Some("https://example.org/stick.png".into()),
    });
    loader.observe(LazyElement {
        key: "card-2".into(),
        kind: ElementKind::HeadTexture,
        data: None,
    });

    let card = loader.notify_visible(pass, "card-1").unwrap();
    match load_element(&mut renderer, &card).await {
        LoadOutcome::Image { src, size } => {
            assert!(src.starts_with("data:image/png;base64,"));
            assert_eq!(size, Some((92, 108)));
        }
        other => panic!("unexpected outcome {other:?}"),
    }
    assert!(loader.notify_visible(pass, "card-1").is_none());

    let drop = loader.notify_visible(pass, "drop-1").unwrap();
    assert_eq!(
        load_element(&mut renderer, &drop).await,
        LoadOutcome::Failed {
            text: "?",
            placeholder: false
        }
    );

    let icon = loader.notify_visible(pass, "icon-1").unwrap();
    assert_eq!(
        load_element(&mut renderer, &icon).await,
        LoadOutcome::Image {
            src: "https://example.org/stick.png".into(),
            size: None
        }
    );

    let bare = loader.notify_visible(pass, "card-2").unwrap();
    assert_eq!(load_element(&mut renderer, &bare).await, LoadOutcome::Skipped);
    assert_eq!(loader.pending_len(), 0);
}
