use crate::templates::components::card::money;
use maud::{html, Markup};

const BAR_HEIGHT: u32 = 22;
const LABEL_WIDTH: u32 = 140;
const CHART_WIDTH: u32 = 640;

/// Horizontal SVG bar chart, one bar per `(label, value)`.
pub fn bar_chart(title: &str, bars: &[(String, f64)]) -> Markup {
    let max = bars.iter().map(|(_, v)| *v).fold(0.0_f64, f64::max);
    let plot_width = (CHART_WIDTH - LABEL_WIDTH - 110) as f64;
    let height = bars.len() as u32 * (BAR_HEIGHT + 6) + 6;

    html! {
        figure {
            figcaption { strong { (title) } }
            @if bars.is_empty() {
                p class="muted" { "No data yet." }
            } @else {
                svg xmlns="http://www.w3.org/2000/svg" width=(CHART_WIDTH) height=(height) role="img" {
                    @for (i, (label, value)) in bars.iter().enumerate() {
                        @let y = 6 + i as u32 * (BAR_HEIGHT + 6);
                        @let width = if max > 0.0 { (value / max * plot_width).max(1.0) } else { 1.0 };
                        text x="0" y=(y + 15) font-size="12" { (label) }
                        rect x=(LABEL_WIDTH) y=(y) width=(format!("{width:.1}")) height=(BAR_HEIGHT) fill="#524ed2" rx="3" {}
                        text x=(format!("{:.1}", LABEL_WIDTH as f64 + width + 6.0)) y=(y + 15) font-size="12" { (money(*value)) }
                    }
                }
            }
        }
    }
}
