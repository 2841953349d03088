use assert_matches::assert_matches;

use dish_harvester::domain::{
    ApiKey, HitId, ImageExtension, ImageVariant, ItemId, Query, SLUG_MAX_CHARS, SearchHit, Slug,
    image_file_name,
};
use dish_harvester::error::HarvestError;

#[test]
fn slug_lowercases_and_collapses_whitespace() {
    let slug = Slug::from_query("  Grilled   Lobster\twith Garlic Butter ", 0);
    assert_eq!(slug.as_str(), "grilled_lobster_with_garlic_butter");
}

#[test]
fn slug_keeps_unicode_letters() {
    let slug = Slug::from_query("Bánh Mì Đặc Biệt!", 0);
    assert_eq!(slug.as_str(), "bánh_mì_đặc_biệt");
}

#[test]
fn slug_is_truncated_by_characters() {
    let long = "Giant River Prawns with Tamarind Glaze and Extra Crispy Shallots";
    let slug = Slug::from_query(long, 0);
    assert_eq!(slug.as_str().chars().count(), SLUG_MAX_CHARS);
    assert!(slug.as_str().starts_with("giant_river_prawns_with_tamarind_glaze_and"));
}

#[test]
fn empty_slug_uses_position() {
    let query: Query = "***".parse().unwrap();
    assert_eq!(query.slug(12).as_str(), "dish_12");
}

#[test]
fn blank_query_is_rejected() {
    let err = "   ".parse::<Query>().unwrap_err();
    assert_matches!(err, HarvestError::InvalidConfig(_));
}

#[test]
fn api_key_is_trimmed() {
    let key: ApiKey = "  50373751-abc  ".parse().unwrap();
    assert_eq!(key.expose(), "50373751-abc");
}

#[test]
fn variant_fallback_order() {
    let web_only = SearchHit {
        id: Some(HitId::from(1)),
        large_image_url: None,
        webformat_url: Some("https://pixabay.com/get/1_640.jpg".to_string()),
        preview_url: Some("https://cdn.pixabay.com/1_150.jpg".to_string()),
    };
    assert_eq!(
        ImageVariant::select(&web_only).map(|(variant, _)| variant),
        Some(ImageVariant::Web)
    );

    let preview_only = SearchHit {
        preview_url: Some("https://cdn.pixabay.com/1_150.jpg".to_string()),
        ..SearchHit::default()
    };
    assert_eq!(
        ImageVariant::select(&preview_only).map(|(variant, _)| variant),
        Some(ImageVariant::Preview)
    );

    let blank = SearchHit {
        large_image_url: Some("  ".to_string()),
        ..SearchHit::default()
    };
    assert_eq!(ImageVariant::select(&blank), None);
}

#[test]
fn extension_from_content_type() {
    assert_eq!(
        ImageExtension::from_content_type("image/jpeg"),
        Some(ImageExtension::Jpg)
    );
    assert_eq!(
        ImageExtension::from_content_type("IMAGE/PNG; charset=binary"),
        Some(ImageExtension::Png)
    );
    assert_eq!(
        ImageExtension::from_content_type("image/webp"),
        Some(ImageExtension::Webp)
    );
    assert_eq!(ImageExtension::from_content_type("image/gif"), None);
}

#[test]
fn extension_from_url_path_only() {
    assert_eq!(
        ImageExtension::from_url("https://cdn.example/a/b.PNG?size=large"),
        Some(ImageExtension::Png)
    );
    assert_eq!(
        ImageExtension::from_url("https://cdn.example/photo.jpeg"),
        Some(ImageExtension::Jpg)
    );
    assert_eq!(ImageExtension::from_url("https://cdn.example/get?f=x.webp"), None);
}

#[test]
fn unrecognized_content_type_consults_url() {
    assert_eq!(
        ImageExtension::resolve(Some("application/octet-stream"), "https://cdn/x.webp"),
        ImageExtension::Webp
    );
    assert_eq!(
        ImageExtension::resolve(Some("image/png"), "https://cdn/x.jpg"),
        ImageExtension::Png
    );
    assert_eq!(ImageExtension::resolve(None, "https://cdn/x"), ImageExtension::Jpg);
}

#[test]
fn item_id_falls_back_to_position() {
    let hit = SearchHit::default();
    assert_eq!(ItemId::for_hit(&hit, 4), ItemId::Position(5));
    assert_eq!(
        image_file_name("pixabay", ItemId::for_hit(&hit, 4), 1, ImageExtension::Jpg),
        "pixabay_5_01.jpg"
    );
}

#[test]
fn sequence_beyond_two_digits_still_formats() {
    assert_eq!(
        image_file_name("pixabay", ItemId::Api(HitId::from(3)), 123, ImageExtension::Webp),
        "pixabay_3_123.webp"
    );
}
