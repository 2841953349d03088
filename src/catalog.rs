//! Built-in dish list and the display labels used when relabeling its folders.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::domain::Query;

pub const DEFAULT_OUTPUT_DIR: &str = "pixabay_vip_dishes_images";
pub const DEFAULT_PER_QUERY_LIMIT: usize = 7;

pub const DEFAULT_QUERIES: &[&str] = &[
    "Grilled Lobster with Garlic Butter",
    "Abalone with Oyster Sauce",
    "Steamed King Crab Legs",
    "Bird's Nest Soup with Crabmeat",
    "Steamed Codfish with Ginger and Scallions",
    "Grilled Wagyu Beef Steak",
    "Peking Duck with Pancakes",
    "Roasted Suckling Pig",
    "Luxury Seafood Salad",
    "Premium Mushroom Hot Pot",
    "King Prawn Fried Rice",
    "Stir-fried Glass Noodles with Crab",
    "Deluxe Seafood Spring Rolls",
    "Steamed Whole Garoupa with Soy Sauce",
    "Grilled Lamb Chops with Rosemary",
    "Pan-Seared Foie Gras with Berry Sauce",
    "Crispy Skin Roasted Pigeon",
    "Fresh Salmon Sashimi Platter",
    "Giant River Prawns with Tamarind Glaze",
    "Premium Vietnamese Dessert Platter",
];

/// Keys are exactly what [`crate::domain::Slug::from_query`] produces for
/// [`DEFAULT_QUERIES`]: `birds_nest_...`, `stir-fried_...` and `pan-seared_...`,
/// never the `bird_s_nest_...`/`stir_fried_...`/`pan_seared_...` spellings of older
/// hand-written tables, which no fetched folder would ever match.
pub const DEFAULT_FOLDER_LABELS: &[(&str, &str)] = &[
    ("grilled_lobster_with_garlic_butter", "Tôm Hùm Nướng Bơ Tỏi"),
    ("abalone_with_oyster_sauce", "Bào Ngư Sốt Dầu Hào"),
    ("steamed_king_crab_legs", "Chân Cua Hoàng Đế Hấp"),
    ("birds_nest_soup_with_crabmeat", "Súp Yến Cua"),
    (
        "steamed_codfish_with_ginger_and_scallions",
        "Cá Tuyết Hấp Gừng Hành",
    ),
    ("grilled_wagyu_beef_steak", "Bò Wagyu Nướng"),
    ("peking_duck_with_pancakes", "Vịt Quay Bắc Kinh"),
    ("roasted_suckling_pig", "Heo Sữa Quay Da Giòn"),
    ("luxury_seafood_salad", "Gỏi Hải Sản Cao Cấp"),
    ("premium_mushroom_hot_pot", "Lẩu Nấm Thiên Nhiên Cao Cấp"),
    ("king_prawn_fried_rice", "Cơm Chiên Tôm Càng Vua"),
    ("stir-fried_glass_noodles_with_crab", "Miến Xào Cua Bể"),
    ("deluxe_seafood_spring_rolls", "Chả Giò Hải Sản Cao Cấp"),
    ("steamed_whole_garoupa_with_soy_sauce", "Cá Song Hấp Xì Dầu"),
    (
        "grilled_lamb_chops_with_rosemary",
        "Sườn Cừu Nướng Lá Hương Thảo",
    ),
    (
        "pan-seared_foie_gras_with_berry_sauce",
        "Gan Ngỗng Áp Chảo Sốt Dâu Rừng",
    ),
    ("crispy_skin_roasted_pigeon", "Bồ Câu Quay Da Giòn"),
    ("fresh_salmon_sashimi_platter", "Đĩa Sashimi Cá Hồi Tươi"),
    (
        "giant_river_prawns_with_tamarind_glaze",
        "Tôm Càng Xanh Sốt Me",
    ),
    (
        "premium_vietnamese_dessert_platter",
        "Đĩa Tráng Miệng Việt Cao Cấp",
    ),
];

pub fn default_queries() -> Vec<Query> {
    DEFAULT_QUERIES
        .iter()
        .filter_map(|value| value.parse().ok())
        .collect()
}

pub fn default_folder_mapping() -> BTreeMap<String, String> {
    DEFAULT_FOLDER_LABELS
        .iter()
        .map(|(key, label)| (key.to_string(), label.to_string()))
        .collect()
}

#[derive(Debug, Clone, Serialize)]
pub struct QueryListing {
    pub position: usize,
    pub query: String,
    pub slug: String,
    pub label: Option<String>,
}

/// Pairs each query's slug with its label, `None` where the mapping has no entry.
pub fn list_queries(queries: &[Query], mapping: &BTreeMap<String, String>) -> Vec<QueryListing> {
    queries
        .iter()
        .enumerate()
        .map(|(position, query)| {
            let slug = query.slug(position);
            QueryListing {
                position,
                query: query.to_string(),
                label: mapping.get(slug.as_str()).cloned(),
                slug: slug.to_string(),
            }
        })
        .collect()
}
