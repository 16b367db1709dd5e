use dioxus::logger::tracing::{info, Level};
use dioxus::prelude::*;

use ui::ChartWidget;

const MAIN_CSS: Asset = asset!("/assets/main.css");

fn main() {
    // Repeated init (hot reload) reports an error; logging keeps working.
    let _ = dioxus::logger::init(Level::INFO);
    info!("starting Sigma bar chart widget v{}", env!("CARGO_PKG_VERSION"));
    dioxus::launch(App);
}

#[component]
fn App() -> Element {
    rsx! {
        document::Link { rel: "stylesheet", href: MAIN_CSS }

        main { id: "app",
            ChartWidget {}
        }
    }
}
