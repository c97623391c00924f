use crate::domain::analysis::{GroupSummary, MarketAnalysis};
use crate::templates::components::{bar_chart, card, money, property_table, stat_tile};
use crate::templates::desktop_layout;
use maud::{html, Markup};
use std::collections::BTreeMap;

pub fn analytics_page(analysis: &MarketAnalysis, city: Option<&str>, cities: &[String]) -> Markup {
    let scope = city.unwrap_or("All locations");

    desktop_layout(
        "Analytics",
        html! {
            h1 { "Market analytics" }

            form action="/analytics" method="get" style="display: flex; gap: 10px; margin-bottom: 1.5rem;" {
                select name="city" {
                    option value="" { "All cities" }
                    @for c in cities {
                        option value=(c) selected[Some(c.as_str()) == city] { (c) }
                    }
                }
                button type="submit" class="btn" { "Show" }
            }

            h2 { (scope) }

            @match &analysis.statistics {
                None => p class="muted" { "No listings stored for this location yet." },
                Some(stats) => {
                    div class="tiles" style="margin-bottom: 1.5rem;" {
                        (stat_tile("Listings", &stats.count.to_string()))
                        (stat_tile("Mean", &money(stats.mean)))
                        (stat_tile("Median", &money(stats.median)))
                        (stat_tile("Min", &money(stats.min as f64)))
                        (stat_tile("Max", &money(stats.max as f64)))
                        (stat_tile("Std dev", &stats.std.map(money).unwrap_or_else(|| "–".into())))
                        (stat_tile("Heat", analysis.market_heat.map(|h| h.as_str()).unwrap_or("–")))
                        (stat_tile("Trend", analysis.trend.as_ref().map(|t| t.trend.as_str()).unwrap_or("–")))
                    }

                    (card("By property type", html! {
                        (bar_chart("Average price", &averages(&analysis.by_property_type)))
                        (group_table("Type", &analysis.by_property_type))
                    }))

                    (card("By city", html! {
                        (bar_chart("Average price", &averages(&analysis.by_city)))
                        (group_table("City", &analysis.by_city))
                    }))

                    @if let Some(trend) = &analysis.trend {
                        (card("Weekly average", bar_chart(
                            "Average price per week",
                            &trend.weeks.iter().map(|w| (w.week.clone(), w.average)).collect::<Vec<_>>(),
                        )))
                    }

                    (card("Price anomalies", property_table(&analysis.anomalies)))
                }
            }
        },
    )
}

fn averages(groups: &BTreeMap<String, GroupSummary>) -> Vec<(String, f64)> {
    groups.iter().map(|(k, g)| (k.clone(), g.avg_price)).collect()
}

fn group_table(label: &str, groups: &BTreeMap<String, GroupSummary>) -> Markup {
    html! {
        table {
            thead { tr { th { (label) } th { "Count" } th { "Average" } th { "Median" } } }
            tbody {
                @for (name, g) in groups {
                    tr {
                        td { (name) }
                        td { (g.count) }
                        td { (money(g.avg_price)) }
                        td { (money(g.median_price)) }
                    }
                }
            }
        }
    }
}
