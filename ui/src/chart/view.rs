use std::rc::Rc;

use dioxus::prelude::*;

use super::model::BarChartModel;
use super::scene::{ChartScene, BAR_RADIUS, GRADIENT_ID};
use crate::core::series::SeriesPoint;

/// SVG bar chart bound to a shared [`BarChartModel`]. The container reports its
/// size through `onresize` and every report triggers a full redraw.
#[component]
pub fn BarChart(model: Signal<BarChartModel>) -> Element {
    let mut model = model;
    let mut container = use_signal(|| Option::<Rc<MountedData>>::None);
    let mut origin = use_signal(|| (0.0_f64, 0.0_f64));

    let (scene, message, tooltip) = {
        let state = model.read();
        (
            state.scene(),
            state.message().map(str::to_string),
            state.tooltip().cloned(),
        )
    };

    // Pointer events report client coordinates; the tooltip is positioned
    // relative to the container, so keep its client origin current.
    let refresh_origin = move || {
        if let Some(mounted) = container.peek().clone() {
            spawn(async move {
                if let Ok(rect) = mounted.get_client_rect().await {
                    origin.set((rect.origin.x, rect.origin.y));
                }
            });
        }
    };

    let tooltip_class = if tooltip.is_some() {
        "tooltip visible"
    } else {
        "tooltip"
    };
    let (tooltip_x, tooltip_y) = tooltip.as_ref().map(|t| (t.x, t.y)).unwrap_or_default();
    let message_class = if message.is_some() {
        "chart-message visible"
    } else {
        "chart-message"
    };

    rsx! {
        div { class: "chart-container",
            onmounted: move |evt: MountedEvent| {
                container.set(Some(evt.data()));
                refresh_origin();
            },
            onresize: move |evt: ResizeEvent| {
                if let Ok(size) = evt.get_content_box_size() {
                    model.write().resize(size.width, size.height);
                }
                refresh_origin();
            },

            {
                match scene {
                    Some(scene) => render_scene(scene, model, origin, refresh_origin),
                    None => rsx! { svg { class: "chart-surface" } },
                }
            }

            div {
                class: "{tooltip_class}",
                style: "left: {tooltip_x}px; top: {tooltip_y}px;",
                if let Some(tip) = tooltip {
                    strong { "{tip.category}" }
                    br {}
                    "{tip.value_label}"
                }
            }

            div {
                class: "{message_class}",
                {message.unwrap_or_default()}
            }
        }
    }
}

fn render_scene(
    scene: ChartScene,
    mut model: Signal<BarChartModel>,
    origin: Signal<(f64, f64)>,
    refresh_origin: impl Fn() + Copy + 'static,
) -> Element {
    let view_box = scene.view_box();
    let grid_left = scene.plot.left;
    let grid_right = scene.plot.right();
    let tick_x = scene.tick_label_x();
    let local = move |x: f64, y: f64| {
        let (ox, oy) = origin();
        (x - ox, y - oy)
    };

    rsx! {
        svg { class: "chart-surface", view_box: "{view_box}",
            g { stroke: "#d0d5dd", stroke_width: "1", fill: "none",
                for grid in scene.gridlines.iter() {
                    line {
                        x1: "{grid_left}",
                        x2: "{grid_right}",
                        y1: "{grid.y}",
                        y2: "{grid.y}",
                        stroke: "#e4e7ec",
                    }
                    text {
                        x: "{tick_x}",
                        y: "{grid.label_y}",
                        text_anchor: "end",
                        fill: "#475467",
                        font_size: "12",
                        "{grid.label}"
                    }
                }
            }

            defs {
                linearGradient { id: GRADIENT_ID, x1: "0%", x2: "0%", y1: "0%", y2: "100%",
                    stop { offset: "0%", stop_color: "#6366f1", stop_opacity: "0.95" }
                    stop { offset: "100%", stop_color: "#4f46e5", stop_opacity: "0.8" }
                }
            }

            g {
                for (bar, label) in scene.bars.into_iter().zip(scene.labels) {
                    {
                        let point: SeriesPoint = bar.point.clone();
                        let transform = label.transform().unwrap_or_default();
                        rsx! {
                            rect {
                                x: "{bar.x}",
                                y: "{bar.y}",
                                width: "{bar.width}",
                                height: "{bar.height}",
                                rx: "{BAR_RADIUS}",
                                fill: "url(#{GRADIENT_ID})",
                                "data-category": "{bar.point.category}",
                                "data-value": "{bar.point.value}",
                                onmouseenter: move |evt: MouseEvent| {
                                    refresh_origin();
                                    let client = evt.client_coordinates();
                                    let (x, y) = local(client.x, client.y);
                                    model.write().hover(&point, x, y);
                                },
                                onmousemove: move |evt: MouseEvent| {
                                    let client = evt.client_coordinates();
                                    let (x, y) = local(client.x, client.y);
                                    model.write().track(x, y);
                                },
                                onmouseleave: move |_| model.write().leave(),
                            }
                            text {
                                x: "{label.x}",
                                y: "{label.y}",
                                text_anchor: "middle",
                                fill: "#475467",
                                font_size: "12",
                                transform: "{transform}",
                                "{label.text}"
                            }
                        }
                    }
                }
            }
        }
    }
}
