use crate::db::scrapes::ScrapeRun;
use crate::templates::components::card;
use crate::templates::desktop_layout;
use chrono::{TimeZone, Utc};
use maud::{html, Markup};

pub fn scrape_page(recent_runs: &[ScrapeRun]) -> Markup {
    desktop_layout(
        "Scrape",
        html! {
            h1 { "Acquire listings" }
            p class="muted" {
                "Enter a location such as \"Austin, TX\". The live site is tried first; "
                "synthetic listings are used when it is unavailable."
            }
            (card("New scrape", scrape_form()))
            (card("Recent scrape runs", recent_runs_table(recent_runs)))
        },
    )
}

pub fn scrape_form() -> Markup {
    html! {
        form action="/scrape" method="post" style="display: flex; gap: 10px; align-items: center;" {
            input type="text" name="location" placeholder="City, ST" required
                style="padding: 8px; border-radius: 4px; border: 1px solid #ccc; min-width: 260px;";
            button type="submit" class="btn" { "Start Scrape" }
        }
    }
}

pub fn recent_runs_table(runs: &[ScrapeRun]) -> Markup {
    html! {
        @if runs.is_empty() {
            p class="muted" { "No scrape runs yet." }
        } @else {
            table style="font-size: 0.9em;" {
                thead {
                    tr {
                        th { "ID" }
                        th { "Location" }
                        th { "Started" }
                        th { "Status" }
                        th { "Found" }
                        th { "New" }
                        th { "Skipped" }
                        th { "Failed" }
                    }
                }
                tbody {
                    @for run in runs {
                        tr {
                            td { (run.id) }
                            td { (run.location) }
                            td { (timestamp(run.started_at)) }
                            td {
                                @if run.finished_at.is_none() {
                                    span style="color: #f59e0b;" { "Running" }
                                } @else if run.success {
                                    span style="color: #10b981;" { "Success" }
                                } @else {
                                    span style="color: #ef4444;" title=(run.error_message.as_deref().unwrap_or("")) { "Failed" }
                                }
                            }
                            td { (run.listings_found.unwrap_or(0)) }
                            td { (run.inserted.unwrap_or(0)) }
                            td { (run.skipped.unwrap_or(0)) }
                            td { (run.failed.unwrap_or(0)) }
                        }
                    }
                }
            }
        }
    }
}

fn timestamp(unix: i64) -> String {
    Utc.timestamp_opt(unix, 0)
        .single()
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| unix.to_string())
}
