use crate::domain::listing::StoredProperty;
use crate::templates::components::card::money;
use maud::{html, Markup};

pub fn property_table(properties: &[StoredProperty]) -> Markup {
    html! {
        @if properties.is_empty() {
            p class="muted" { "No properties stored yet." }
        } @else {
            div style="overflow-x: auto;" {
                table {
                    thead {
                        tr {
                            th { "Address" }
                            th { "City" }
                            th { "Price" }
                            th { "Beds" }
                            th { "Baths" }
                            th { "Sq Ft" }
                            th { "Type" }
                            th { "Source" }
                        }
                    }
                    tbody {
                        @for p in properties {
                            tr {
                                td { a href=(format!("/property/{}", p.id)) { (p.address) } }
                                td { (p.city) ", " (p.state) }
                                td { (money(p.price as f64)) }
                                td { (optional(p.bedrooms)) }
                                td { (optional(p.bathrooms)) }
                                td { (optional(p.square_feet)) }
                                td { (p.property_type.as_str()) }
                                td class="muted" { (p.source) }
                            }
                        }
                    }
                }
            }
        }
    }
}

fn optional<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "–".into())
}
