use std::cell::RefCell;
use std::rc::Rc;

use dioxus::prelude::*;
use tracing::warn;

use crate::bridge::{HostBridge, Subscription};
use crate::chart::{BarChart, BarChartModel};
use crate::core::{aggregate, config::WidgetConfig, platform, SeriesSummary, Table};

pub const INITIAL_STATUS: &str = "Waiting for Sigma data…";

const DIMENSION_SWATCH: &str = "#6366f1";
const MEASURE_SWATCH: &str = "#8b5cf6";
const ROWS_SWATCH: &str = "#e4e7ec";

/// The whole widget: header with status line, legend and the bar chart, wired
/// to a [`HostBridge`] for the lifetime of the component.
#[component]
pub fn ChartWidget() -> Element {
    let chart = use_signal(|| BarChartModel::new(platform::number_locale()));
    let status = use_signal(|| INITIAL_STATUS.to_string());
    let legend = use_signal(|| Option::<SeriesSummary>::None);

    let session = use_hook(|| {
        let bridge = connect_bridge(platform::widget_config());
        Rc::new(WidgetSession::new(bridge, WidgetSignals { status, legend, chart }))
    });

    // Bootstrap writes signals, so it runs after the first render.
    let bootstrap = session.clone();
    use_effect(move || bootstrap.bootstrap());
    use_drop(move || session.teardown());

    let status_text = status();
    let legend_entries = legend_entries(legend().as_ref());

    rsx! {
        div { class: "card",
            div { class: "card-header",
                h1 { "Bar Chart" }
                p { class: "card-header__status", "{status_text}" }
            }

            div { class: "legend",
                for (swatch, label) in legend_entries {
                    span {
                        i { style: "background:{swatch}" }
                        "{label}"
                    }
                }
            }

            BarChart { model: chart }
        }
    }
}

/// Legend swatches; before any data arrives only generic labels are shown.
fn legend_entries(summary: Option<&SeriesSummary>) -> Vec<(&'static str, String)> {
    match summary {
        None => vec![
            (DIMENSION_SWATCH, "Dimension".to_string()),
            (MEASURE_SWATCH, "Measure".to_string()),
        ],
        Some(summary) => vec![
            (DIMENSION_SWATCH, summary.dimension_name.clone()),
            (MEASURE_SWATCH, summary.measure_name.clone()),
            (ROWS_SWATCH, format!("{} rows", summary.row_count)),
        ],
    }
}

/// Receives what the bridge reports, already shaped for display.
trait WidgetSink: Clone + 'static {
    fn status(&self, message: String);
    fn summary(&self, summary: SeriesSummary);
}

#[derive(Clone, Copy)]
struct WidgetSignals {
    status: Signal<String>,
    legend: Signal<Option<SeriesSummary>>,
    chart: Signal<BarChartModel>,
}

impl WidgetSink for WidgetSignals {
    fn status(&self, message: String) {
        let mut status = self.status;
        status.set(message);
    }

    fn summary(&self, summary: SeriesSummary) {
        let mut chart = self.chart;
        chart.write().set_data(summary.series.clone());
        let mut legend = self.legend;
        legend.set(Some(summary));
    }
}

/// Bridge plus everything registered against it on behalf of the widget.
struct WidgetSession {
    bridge: HostBridge,
    subscriptions: RefCell<Vec<Subscription>>,
    #[cfg(target_arch = "wasm32")]
    listener: RefCell<Option<crate::bridge::browser::MessageListener>>,
}

impl WidgetSession {
    /// Subscribe `sink` to `bridge`. Nothing is emitted until
    /// [`WidgetSession::bootstrap`].
    fn new(bridge: HostBridge, sink: impl WidgetSink) -> Self {
        let on_status = sink.clone();
        let on_error = sink.clone();
        let subscriptions = vec![
            bridge.on_status(move |message| on_status.status(message)),
            bridge.on_error(move |err| {
                warn!(error = %err, "bridge reported an error");
                on_error.status(err.to_string());
            }),
            bridge.on_data(move |table: Table| sink.summary(aggregate(&table))),
        ];

        Self {
            #[cfg(target_arch = "wasm32")]
            listener: RefCell::new(attach_listener(&bridge)),
            bridge,
            subscriptions: RefCell::new(subscriptions),
        }
    }

    fn bootstrap(&self) {
        self.bridge.bootstrap();
    }

    fn teardown(&self) {
        #[cfg(target_arch = "wasm32")]
        {
            drop(self.listener.borrow_mut().take());
        }

        self.bridge.teardown();
        for subscription in self.subscriptions.borrow_mut().drain(..) {
            subscription.unsubscribe();
        }
    }
}

#[cfg(target_arch = "wasm32")]
fn connect_bridge(config: WidgetConfig) -> HostBridge {
    use crate::bridge::{browser::BrowserHost, DetachedHost, TimeoutScheduler};

    match BrowserHost::current() {
        Ok(host) => HostBridge::new(host, TimeoutScheduler, config),
        Err(err) => {
            warn!(error = %err, "no browser window; running detached");
            HostBridge::new(DetachedHost, TimeoutScheduler, config)
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn connect_bridge(config: WidgetConfig) -> HostBridge {
    use crate::bridge::{DetachedHost, ImmediateScheduler};

    HostBridge::new(DetachedHost, ImmediateScheduler, config)
}

#[cfg(target_arch = "wasm32")]
fn attach_listener(bridge: &HostBridge) -> Option<crate::bridge::browser::MessageListener> {
    let window = web_sys::window()?;
    match crate::bridge::browser::MessageListener::attach(&window, bridge.clone()) {
        Ok(listener) => Some(listener),
        Err(err) => {
            warn!(error = %err, "unable to listen for host messages");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::{DetachedHost, ImmediateScheduler, STATUS_STANDALONE};
    use crate::core::series::SeriesPoint;
    use crate::core::table::sample_table;

    #[derive(Debug, Clone, PartialEq)]
    enum Shown {
        Status(String),
        Summary(SeriesSummary),
    }

    #[derive(Clone, Default)]
    struct RecordingSink(Rc<RefCell<Vec<Shown>>>);

    impl WidgetSink for RecordingSink {
        fn status(&self, message: String) {
            self.0.borrow_mut().push(Shown::Status(message));
        }

        fn summary(&self, summary: SeriesSummary) {
            self.0.borrow_mut().push(Shown::Summary(summary));
        }
    }

    fn detached_bridge() -> HostBridge {
        HostBridge::new(DetachedHost, ImmediateScheduler, WidgetConfig::default())
    }

    #[test]
    fn creating_a_session_emits_nothing_until_bootstrap() {
        let sink = RecordingSink::default();
        let session = WidgetSession::new(detached_bridge(), sink.clone());
        assert!(sink.0.borrow().is_empty());

        session.bootstrap();
        assert_eq!(
            *sink.0.borrow(),
            vec![
                Shown::Status(STATUS_STANDALONE.to_string()),
                Shown::Summary(aggregate(&sample_table())),
            ]
        );
    }

    #[test]
    fn teardown_stops_further_updates() {
        let sink = RecordingSink::default();
        let bridge = detached_bridge();
        let session = WidgetSession::new(bridge.clone(), sink.clone());
        session.teardown();

        bridge.handle_message(
            "https://host",
            &serde_json::json!({ "type": "sigma.requestDataAck" }),
        );
        assert!(sink.0.borrow().is_empty());
    }

    #[test]
    fn legend_shows_generic_labels_before_data() {
        let entries = legend_entries(None);
        let labels: Vec<_> = entries.iter().map(|(_, label)| label.as_str()).collect();
        assert_eq!(labels, ["Dimension", "Measure"]);
    }

    #[test]
    fn legend_reports_names_and_row_count() {
        let summary = SeriesSummary {
            dimension_name: "Region".into(),
            measure_name: "Revenue".into(),
            row_count: 7,
            series: vec![SeriesPoint::new("East", 1.0)],
        };
        let labels: Vec<_> = legend_entries(Some(&summary))
            .into_iter()
            .map(|(_, label)| label)
            .collect();
        assert_eq!(labels, ["Region", "Revenue", "7 rows"]);
    }
}
