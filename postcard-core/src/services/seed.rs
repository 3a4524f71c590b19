//! 初始明信片
//!
//! Starter postcards given to a first-time user. Image URLs here are the
//! current asset locations; the migration copies them onto matching records
//! of upgrading users.

use crate::types::{PostcardCategory, PostcardRecord};

struct SeedPostcard {
    id: &'static str,
    title: &'static str,
    location: &'static str,
    image_url: &'static str,
    description: &'static str,
    date_added: &'static str,
    category: PostcardCategory,
}

const SEED_POSTCARDS: &[SeedPostcard] = &[
    SeedPostcard {
        id: "chicago-1",
        title: "Chicago",
        location: "Chicago, Illinois, USA",
        image_url: "https://images.unsplash.com/photo-1477959858617-67f85cf4f1df?auto=format&fit=crop&w=1200&q=80",
        description: "First time in Chicago! Sunrise over the Bean and Lake Michigan.",
        date_added: "2025-03-17T00:00:00.000Z",
        category: PostcardCategory::Visited,
    },
    SeedPostcard {
        id: "london-1",
        title: "London",
        location: "London, United Kingdom",
        image_url: "https://images.unsplash.com/photo-1513635269975-59663e0ac1ad?auto=format&fit=crop&w=1200&q=80",
        description: "Evening walk along the Thames with Big Ben in view.",
        date_added: "2025-06-10T00:00:00.000Z",
        category: PostcardCategory::Visited,
    },
];

impl SeedPostcard {
    fn to_record(&self) -> PostcardRecord {
        PostcardRecord {
            id: self.id.to_string(),
            title: self.title.to_string(),
            location: self.location.to_string(),
            lat: None,
            lng: None,
            image_url: self.image_url.to_string(),
            description: self.description.to_string(),
            date_added: self.date_added.to_string(),
            category: Some(self.category),
        }
    }
}

/// The current seed set, in display order
#[must_use]
pub fn seed_postcards() -> Vec<PostcardRecord> {
    SEED_POSTCARDS.iter().map(SeedPostcard::to_record).collect()
}
