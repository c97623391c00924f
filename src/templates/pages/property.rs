use crate::db::properties::PricePoint;
use crate::domain::listing::StoredProperty;
use crate::templates::components::{card, money};
use crate::templates::desktop_layout;
use maud::{html, Markup};

pub fn property_page(p: &StoredProperty, history: &[PricePoint]) -> Markup {
    desktop_layout(
        &p.address,
        html! {
            h1 { (p.address) }
            p class="muted" {
                (p.city) ", " (p.state)
                @if let Some(zip) = &p.zip_code { " " (zip) }
            }

            div style="display: flex; gap: 8px; overflow-x: auto; margin-bottom: 1.5rem;" {
                @for src in &p.images {
                    img src=(src) alt=(p.address) style="height: 180px; border-radius: 6px;";
                }
            }

            (card("Details", html! {
                table {
                    tbody {
                        tr { th { "Price" } td { (money(p.price as f64)) } }
                        tr { th { "Type" } td { (p.property_type.as_str()) } }
                        @if let Some(beds) = p.bedrooms { tr { th { "Bedrooms" } td { (beds) } } }
                        @if let Some(baths) = p.bathrooms { tr { th { "Bathrooms" } td { (baths) } } }
                        @if let Some(sqft) = p.square_feet { tr { th { "Square feet" } td { (sqft) } } }
                        tr { th { "Source" } td { (p.source) } }
                        tr { th { "Listing" } td { a href=(p.url) rel="noopener" target="_blank" { (p.url) } } }
                        tr { th { "First seen" } td { (p.scraped_at.format("%Y-%m-%d %H:%M UTC").to_string()) } }
                    }
                }
                @if let Some(desc) = &p.description {
                    p { (desc) }
                }
            }))

            (card("Price history", html! {
                table {
                    thead { tr { th { "Recorded" } th { "Price" } } }
                    tbody {
                        @for point in history {
                            tr {
                                td { (point.recorded_at.format("%Y-%m-%d %H:%M").to_string()) }
                                td { (money(point.price as f64)) }
                            }
                        }
                    }
                }
            }))
        },
    )
}
