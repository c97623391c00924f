// templates/pages/home.rs

use crate::db::scrapes::ScrapeRun;
use crate::domain::analysis::{MarketHeat, PriceStats};
use crate::templates::components::{card, money, stat_tile};
use crate::templates::desktop_layout;
use crate::templates::pages::scrape::{recent_runs_table, scrape_form};
use maud::{html, Markup};

pub struct DashboardVm {
    pub total_properties: i64,
    pub city_count: usize,
    pub statistics: Option<PriceStats>,
    pub market_heat: Option<MarketHeat>,
    pub recent_runs: Vec<ScrapeRun>,
}

pub fn home_page(vm: &DashboardVm) -> Markup {
    desktop_layout(
        "Dashboard",
        html! {
            h1 { "Market dashboard" }

            div class="tiles" style="margin-bottom: 1.5rem;" {
                (stat_tile("Listings", &vm.total_properties.to_string()))
                (stat_tile("Cities", &vm.city_count.to_string()))
                @match &vm.statistics {
                    Some(stats) => {
                        (stat_tile("Average price", &money(stats.mean)))
                        (stat_tile("Median price", &money(stats.median)))
                    }
                    None => (stat_tile("Average price", "–")),
                }
                (stat_tile("Market heat", vm.market_heat.map(|h| h.as_str()).unwrap_or("–")))
            }

            (card("Find listings", scrape_form()))
            (card("Recent scrape runs", recent_runs_table(&vm.recent_runs)))
        },
    )
}
