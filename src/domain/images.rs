// src/domain/images.rs

use crate::domain::listing::Listing;
use rand::seq::SliceRandom;
use rand::Rng;

pub const IMAGE_CATALOG: &[&str] = &[
    "https://images.unsplash.com/photo-1570129477492-45a003537e1f?w=500&h=400&fit=crop&q=80",
    "https://images.unsplash.com/photo-1564013799919-ab600027ffc6?w=500&h=400&fit=crop&q=80",
    "https://images.unsplash.com/photo-1522708323590-d24dbb6b0267?w=500&h=400&fit=crop&q=80",
    "https://images.unsplash.com/photo-1556909114-f6e7ad7d3136?w=500&h=400&fit=crop&q=80",
    "https://images.unsplash.com/photo-1502672260266-1c1ef2d93688?w=500&h=400&fit=crop&q=80",
    "https://images.unsplash.com/photo-1512917774080-9991f1c4c750?w=500&h=400&fit=crop&q=80",
];

pub const MIN_IMAGES: usize = 2;
pub const MAX_IMAGES: usize = 4;

/// Attaches 2-4 distinct catalog images to a listing that has none.
/// Listings that already carry images are returned untouched.
pub fn resolve_images<R: Rng>(listing: Listing, rng: &mut R) -> Listing {
    if !listing.images.is_empty() {
        return listing;
    }

    let count = rng.gen_range(MIN_IMAGES..=MAX_IMAGES);
    let images = IMAGE_CATALOG
        .choose_multiple(rng, count)
        .map(|s| s.to_string())
        .collect();

    Listing { images, ..listing }
}
