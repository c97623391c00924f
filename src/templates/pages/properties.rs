use crate::db::properties::{PropertyFilter, PropertyPage};
use crate::domain::listing::PropertyType;
use crate::templates::components::property_table;
use crate::templates::desktop_layout;
use maud::{html, Markup};
use url::form_urlencoded;

pub fn properties_page(page: &PropertyPage, filter: &PropertyFilter, cities: &[String]) -> Markup {
    let selected_city = filter.city.as_deref().unwrap_or("");
    let selected_type = filter.property_type.map(|t| t.as_str()).unwrap_or("");

    desktop_layout(
        "Properties",
        html! {
            h1 { "Properties" }

            form action="/properties" method="get" style="display: flex; gap: 10px; flex-wrap: wrap; align-items: center;" {
                select name="city" {
                    option value="" { "All cities" }
                    @for city in cities {
                        option value=(city) selected[city == selected_city] { (city) }
                    }
                }
                select name="property_type" {
                    option value="" { "Any type" }
                    @for kind in PropertyType::VOCABULARY {
                        option value=(kind.as_str()) selected[kind.as_str() == selected_type] { (kind.as_str()) }
                    }
                }
                input type="number" name="min_price" placeholder="Min price" value=[filter.min_price];
                input type="number" name="max_price" placeholder="Max price" value=[filter.max_price];
                button type="submit" class="btn" { "Filter" }
                a href=(export_link(filter)) { "Export to Excel" }
            }

            p class="muted" { (page.total) " properties" }
            (property_table(&page.properties))

            @if page.pages > 1 {
                nav style="display: flex; gap: 1rem; margin-top: 1rem;" {
                    @if page.current_page > 1 {
                        a href=(page_link(filter, page.current_page - 1)) { "← Previous" }
                    }
                    span { "Page " (page.current_page) " of " (page.pages) }
                    @if (page.current_page as i64) < page.pages {
                        a href=(page_link(filter, page.current_page + 1)) { "Next →" }
                    }
                }
            }
        },
    )
}

fn filter_query(filter: &PropertyFilter) -> form_urlencoded::Serializer<'static, String> {
    let mut query = form_urlencoded::Serializer::new(String::new());
    if let Some(city) = &filter.city {
        query.append_pair("city", city);
    }
    if let Some(kind) = filter.property_type {
        query.append_pair("property_type", kind.as_str());
    }
    if let Some(min) = filter.min_price {
        query.append_pair("min_price", &min.to_string());
    }
    if let Some(max) = filter.max_price {
        query.append_pair("max_price", &max.to_string());
    }
    query
}

fn page_link(filter: &PropertyFilter, page: u32) -> String {
    let mut query = filter_query(filter);
    query.append_pair("page", &page.to_string());
    format!("/properties?{}", query.finish())
}

fn export_link(filter: &PropertyFilter) -> String {
    match &filter.city {
        Some(city) => {
            let query: String = form_urlencoded::Serializer::new(String::new())
                .append_pair("city", city)
                .finish();
            format!("/properties/export?{query}")
        }
        None => "/properties/export".to_string(),
    }
}
