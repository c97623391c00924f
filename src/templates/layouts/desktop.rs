use maud::{html, Markup, DOCTYPE};

const STYLE: &str = r#"
body { font-family: system-ui, sans-serif; margin: 0; color: #1f2937; }
main { max-width: 1100px; margin: 2rem auto; padding: 0 1rem; }
header { display: flex; align-items: center; gap: 1.5rem; padding: 0.75rem 1.5rem; box-shadow: 0 1px 3px rgba(0,0,0,.1); }
header nav ul { display: flex; gap: 1rem; list-style: none; margin: 0; padding: 0; }
header a { color: #524ed2; text-decoration: none; }
table { width: 100%; border-collapse: collapse; margin-top: 1rem; }
th { padding: 10px 8px; border-bottom: 2px solid #e5e7eb; text-align: left; }
td { padding: 8px; border-bottom: 1px solid #f3f4f6; }
.card { border: 1px solid #e5e7eb; border-radius: 8px; padding: 1rem 1.25rem; margin-bottom: 1.5rem; }
.tiles { display: flex; gap: 1rem; flex-wrap: wrap; }
.tile { flex: 1; min-width: 140px; background: #f9fafb; border-radius: 8px; padding: 0.75rem 1rem; }
.tile strong { display: block; font-size: 1.4rem; }
.btn { padding: 8px 16px; background: #10b981; color: white; border: none; border-radius: 4px; cursor: pointer; }
.muted { color: #6b7280; }
"#;

pub fn desktop_layout(title: &str, content: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (title) " · Listing Scout" }
                style { (maud::PreEscaped(STYLE)) }
            }
            body {
              header {
                  svg
                      xmlns="http://www.w3.org/2000/svg"
                      width="24"
                      height="24"
                      viewBox="0 0 24 24"
                      fill="none"
                      stroke="#524ed2"
                      stroke-width="2"
                      stroke-linecap="round"
                      stroke-linejoin="round"
                  {
                      path stroke="none" d="M0 0h24v24H0z" fill="none" {}
                      path d="M5 12l-2 0l9 -9l9 9l-2 0" {}
                      path d="M5 12v7a2 2 0 0 0 2 2h10a2 2 0 0 0 2 -2v-7" {}
                      path d="M9 21v-6a2 2 0 0 1 2 -2h2a2 2 0 0 1 2 2v6" {}
                  }
                  h3 { "Listing Scout" }
                  nav {
                      ul {
                          li { a href="/" { "Dashboard" } }
                          li { a href="/properties" { "Properties" } }
                          li { a href="/analytics" { "Analytics" } }
                          li { a href="/scrape" { "Scrape" } }
                      }
                  }
              }
              main { (content) }
            }
        }
    }
}
