//! Built-in hairstyle catalog.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hairstyle {
    pub id: u32,
    pub name: String,
    pub description: String,
    pub suitable_face_shapes: Vec<String>,
    pub difficulty: Level,
    pub maintenance: Level,
    pub tags: Vec<String>,
}

impl Hairstyle {
    pub fn suits(&self, face_shape: &str) -> bool {
        self.suitable_face_shapes
            .iter()
            .any(|shape| shape.eq_ignore_ascii_case(face_shape))
    }
}

struct Entry {
    id: u32,
    name: &'static str,
    description: &'static str,
    shapes: &'static [&'static str],
    difficulty: Level,
    maintenance: Level,
    tags: &'static [&'static str],
}

const ENTRIES: &[Entry] = &[
    Entry {
        id: 1,
        name: "Bob",
        description: "Classic short cut between ear and shoulder length, flattering on many face shapes",
        shapes: &["Oval", "Heart", "Long"],
        difficulty: Level::Low,
        maintenance: Level::Low,
        tags: &["short", "classic", "easy care"],
    },
    Entry {
        id: 2,
        name: "Long Straight",
        description: "Naturally flowing long straight hair with an elegant look",
        shapes: &["Oval", "Long", "Heart"],
        difficulty: Level::Medium,
        maintenance: Level::Medium,
        tags: &["long", "straight", "elegant"],
    },
    Entry {
        id: 3,
        name: "Big Waves",
        description: "Romantic loose waves that add volume and dimension",
        shapes: &["Round", "Square", "Long"],
        difficulty: Level::Medium,
        maintenance: Level::High,
        tags: &["curly", "romantic", "feminine"],
    },
    Entry {
        id: 4,
        name: "Lob",
        description: "Shoulder-length cut combining the crispness of short hair with the softness of long hair",
        shapes: &["Oval", "Round", "Heart"],
        difficulty: Level::Low,
        maintenance: Level::Low,
        tags: &["medium", "trendy", "versatile"],
    },
    Entry {
        id: 5,
        name: "Pixie Cut",
        description: "Very short cut that highlights facial contours and personality",
        shapes: &["Oval", "Heart"],
        difficulty: Level::High,
        maintenance: Level::High,
        tags: &["very short", "bold", "trendy"],
    },
    Entry {
        id: 6,
        name: "French Bangs",
        description: "Effortless bangs that add a fashionable touch to any style",
        shapes: &["Round", "Square", "Long"],
        difficulty: Level::Medium,
        maintenance: Level::Medium,
        tags: &["bangs", "french", "trendy"],
    },
    Entry {
        id: 7,
        name: "Layered Long",
        description: "Long hair with layers for movement and dimension",
        shapes: &["Round", "Square", "Oval"],
        difficulty: Level::Medium,
        maintenance: Level::Medium,
        tags: &["long", "layered", "volume"],
    },
    Entry {
        id: 8,
        name: "Vintage Curls",
        description: "Retro-style small curls with vintage charm",
        shapes: &["Oval", "Long"],
        difficulty: Level::High,
        maintenance: Level::High,
        tags: &["curly", "vintage", "bold"],
    },
];

/// Every hairstyle in the catalog, in id order.
pub fn all() -> Vec<Hairstyle> {
    ENTRIES
        .iter()
        .map(|entry| Hairstyle {
            id: entry.id,
            name: entry.name.to_string(),
            description: entry.description.to_string(),
            suitable_face_shapes: entry.shapes.iter().map(|s| s.to_string()).collect(),
            difficulty: entry.difficulty,
            maintenance: entry.maintenance,
            tags: entry.tags.iter().map(|s| s.to_string()).collect(),
        })
        .collect()
}

pub fn find(id: u32) -> Option<Hairstyle> {
    all().into_iter().find(|style| style.id == id)
}

/// Hairstyles tagged as suitable for `face_shape` (case-insensitive).
pub fn recommended_for(face_shape: &str) -> Vec<Hairstyle> {
    all()
        .into_iter()
        .filter(|style| style.suits(face_shape))
        .collect()
}

pub fn by_tag(tag: &str) -> Vec<Hairstyle> {
    all()
        .into_iter()
        .filter(|style| style.tags.iter().any(|t| t == tag))
        .collect()
}

/// Distinct tags in first-seen order.
pub fn all_tags() -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for style in all() {
        for tag in style.tags {
            if !tags.contains(&tag) {
                tags.push(tag);
            }
        }
    }
    tags
}
