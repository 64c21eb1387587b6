use leptos::*;

use maxsub::{
    compute_report_timed, format_parcels, generate_patch, parse_parcels, Mode, Parcel, PatchSpec,
    Report, SolveParams, StageTimings, SubarrayEntry, DEFAULT_ENUMERATION_LIMIT,
};

const APP_VERSION: &str = env!("CARGO_PKG_VERSION");
const APP_COMMIT: &str = env!("GIT_COMMIT_HASH");

const DEMO_INPUT: &str = "2, -5, 8, -2, 4, -10, 3, 1";

const KADANE_LISTING: &str = r#"fn kadane(seq: &[i32]) -> i64 {
    let mut best_here = seq[0] as i64;
    let mut best = best_here;
    for &x in &seq[1..] {
        let x = x as i64;
        best_here = x.max(best_here + x);
        best = best.max(best_here);
    }
    best
}"#;

#[cfg(target_arch = "wasm32")]
fn now_ms() -> f64 {
    web_sys::window()
        .and_then(|w| w.performance())
        .map(|p| p.now())
        .unwrap_or(0.0)
}

#[cfg(not(target_arch = "wasm32"))]
fn now_ms() -> f64 {
    0.0
}

fn solve(parcels: &[Parcel], visual: bool) -> (Report, StageTimings) {
    let params = SolveParams {
        mode: if visual { Mode::Visual } else { Mode::Classic },
        enumeration_limit: Some(DEFAULT_ENUMERATION_LIMIT),
    };
    compute_report_timed(parcels, &params, now_ms)
}

fn parcel_class(value: Parcel, highlighted: bool) -> String {
    let sign = if value < 0 { "negative" } else { "positive" };
    if highlighted {
        format!("parcel highlighted {sign}")
    } else {
        format!("parcel {sign}")
    }
}

fn entry_class(report: &Report, entry: &SubarrayEntry) -> String {
    let mut class = String::from("subarray-item");
    if report.is_highlighted(entry) {
        class.push_str(" is-max");
    }
    if entry.sum < 0 {
        class.push_str(" is-negative");
    }
    class
}

fn subarray_csv(report: &Report) -> String {
    let mut csv = String::from("rank,sum,start,end,len,values,highlighted\n");
    for (rank, entry) in report.subarrays.iter().enumerate() {
        csv.push_str(&format!(
            "{},{},{},{},{},\"{}\",{}\n",
            rank + 1,
            entry.sum,
            entry.start,
            entry.end,
            entry.len(),
            format_parcels(&entry.values),
            report.is_highlighted(entry)
        ));
    }
    csv
}

fn blob_url_from_str(s: &str) -> Option<String> {
    let arr = js_sys::Array::new();
    arr.push(&wasm_bindgen::JsValue::from_str(s));
    let blob = web_sys::Blob::new_with_str_sequence(&arr).ok()?;
    web_sys::Url::create_object_url_with_blob(&blob).ok()
}

fn fmt_ms(ms: f64) -> String {
    if ms.is_finite() && ms >= 0.0 {
        format!("{ms:.4} ms")
    } else {
        "n/a".to_string()
    }
}

fn fmt_stage(ms: Option<f64>) -> String {
    ms.map_or_else(|| "n/a (skipped)".to_string(), fmt_ms)
}

#[component]
pub fn App() -> impl IntoView {
    let (input_str, set_input_str) = create_signal(String::from(DEMO_INPUT));
    let (visual_mode, set_visual_mode) = create_signal(true);
    let (status, set_status) = create_signal(String::new());
    let (csv_href, set_csv_href) = create_signal(String::new());

    let parsed = create_memo(move |_| parse_parcels(&input_str.get()));

    let solved = create_memo(move |_| {
        let visual = visual_mode.get();
        parsed.with(|p| solve(&p.parcels, visual))
    });

    create_effect(move |_| {
        let rejected = parsed.with(|p| p.rejected.len());
        if rejected > 0 {
            set_status.set(format!("Ignored {rejected} non-numeric token(s)."));
        } else {
            set_status.set(String::new());
        }
    });

    // Refresh the CSV download whenever the listing changes
    create_effect(move |_| {
        let csv = solved.with(|(report, _)| {
            if report.subarrays.is_empty() {
                None
            } else {
                Some(subarray_csv(report))
            }
        });
        let old = csv_href.get_untracked();
        if !old.is_empty() {
            let _ = web_sys::Url::revoke_object_url(&old);
        }
        let href = csv.as_deref().and_then(blob_url_from_str).unwrap_or_default();
        set_csv_href.set(href);
    });

    let on_generate = move |_ev: leptos::ev::MouseEvent| {
        match generate_patch(&mut rand::thread_rng(), &PatchSpec::default()) {
            Ok(patch) => set_input_str.set(format_parcels(&patch)),
            Err(err) => set_status.set(format!("Could not generate a patch: {err}")),
        }
    };

    let parcel_strip = move || {
        solved.with(|(report, _)| {
            let best = report.best;
            report
                .parcels
                .iter()
                .enumerate()
                .map(|(i, &v)| {
                    let highlighted = best.is_some_and(|b| b.contains(i));
                    view! {
                        <div class=parcel_class(v, highlighted) title=format!("Index {i}")>{v}</div>
                    }
                })
                .collect_view()
        })
    };

    let subarray_list = move || {
        solved.with(|(report, _)| {
            report
                .subarrays
                .iter()
                .map(|entry| {
                    view! {
                        <div class=entry_class(report, entry)>
                            <span class="subarray-item-sum">{entry.sum}</span>
                            <span class="subarray-item-values">"["{format_parcels(&entry.values)}"]"</span>
                        </div>
                    }
                })
                .collect_view()
        })
    };

    let visual_panel = move || {
        let (r, timings) = solved.get();
        if r.parcels.is_empty() {
            return view! { <p class="note">"Enter at least one parcel."</p> }.into_view();
        }
        let best = r.best.unwrap_or(maxsub::SubarrayResult::EMPTY);
        let indices = match best.range() {
            Some(range) => format!("(from {} to {})", range.start(), range.end()),
            None => String::from("(none)"),
        };
        let listing_header = if r.enumeration_skipped {
            format!(
                "All possible subarrays ({}): listing skipped above {} parcels",
                r.subarray_count, DEFAULT_ENUMERATION_LIMIT
            )
        } else {
            format!("All possible subarrays ({})", r.subarray_count)
        };
        let gain_class = if best.sum >= 0 { "gain-positive" } else { "gain-negative" };
        view! {
            <section class="info-panel">
                <h3>"Max sum: "{best.sum}</h3>
                <p>"Winning slice: "<strong>"["{format_parcels(&r.winning_slice)}"]"</strong></p>
                <p>"Indices: "{indices}</p>
                <code>"Kadane (O(n)) computed in "{fmt_stage(timings.visual_ms)}</code>
            </section>
            <h3>"Patch"</h3>
            <section class="patch-container">
                <div class="parcels-container">{parcel_strip}</div>
                <div class="max-gain-text"><span class=gain_class>"Max sum: "{best.sum}</span></div>
            </section>
            <section class="subarray-panel">
                <h3>{listing_header}</h3>
                <div class="subarray-list-header">
                    <span>"Sum"</span>
                    <span>"Subarray"</span>
                </div>
                <div class="subarray-list-container">{subarray_list}</div>
                <code>"Enumeration (O(n²)) computed in "{fmt_stage(timings.enumeration_ms)}</code>
                <a href=move || csv_href.get() download="subarrays.csv"
                    style=move || if csv_href.get().is_empty() { "display:none;" } else { "display:inline;" }>
                    "Download subarrays.csv"
                </a>
            </section>
        }
        .into_view()
    };

    let classic_panel = move || {
        let (r, timings) = solved.get();
        if r.parcels.is_empty() {
            return view! { <p class="note">"Enter at least one parcel."</p> }.into_view();
        }
        view! {
            <section class="info-panel info-panel-classic">
                <h3>"Max sum: "{r.classic_sum}</h3>
                <code>"Computed in "{fmt_ms(timings.classic_ms)}</code>
                <p class="note">"Classic Kadane pass: only the maximum sum is reported."</p>
            </section>
        }
        .into_view()
    };

    view! {
        <main class="container">
            <h1>"Maximum subarray"</h1>
            <section class="explanation-text">
                <p>
                    "Each parcel of the patch is worth a signed number of points. Harvesting must cover a contiguous run of parcels; find the run with the largest total."
                </p>
            </section>
            <section class="toggle-container">
                <span>"Classic (sum only)"</span>
                <label class="switch">
                    <input type="checkbox" prop:checked=move || visual_mode.get()
                        on:change=move |ev| set_visual_mode.set(event_target_checked(&ev))/>
                    <span class="slider"></span>
                </label>
                <span>"Visual (sum + winning slice + all subarrays)"</span>
            </section>
            <p class="disclaimer-warning">
                <strong>"Warning: "</strong>
                "visual mode enumerates every subarray (O(n²)). Above "{DEFAULT_ENUMERATION_LIMIT}" parcels the listing is skipped."
            </p>
            <section class="input-section">
                <label for="patch_input">"Parcels, separated by commas:"</label>
                <input id="patch_input" type="text" placeholder="e.g. 1, 2, -5, 10, -2"
                    prop:value=move || input_str.get()
                    on:input=move |ev| set_input_str.set(event_target_value(&ev))/>
                <button class="btn" on:click=on_generate>
                    {format!("Generate random patch ({} parcels)", PatchSpec::default().len)}
                </button>
                <span class="note">{move || status.get()}</span>
            </section>
            {move || if visual_mode.get() { visual_panel() } else { classic_panel() }}
            <section class="explanation-panel">
                <h3>"Kadane's algorithm"</h3>
                <p>
                    "A single left-to-right pass keeps the best sum ending at the current parcel and the best sum seen so far. When the running sum turns negative it is dropped and a new run starts at the next parcel. O(n) time."
                </p>
                <pre><code>{KADANE_LISTING}</code></pre>
            </section>
            <footer class="app-footer">
                <span class="note">{format!("maxsub v{APP_VERSION} ({APP_COMMIT})")}</span>
            </footer>
        </main>
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen::prelude::wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    leptos::mount_to_body(|| view! { <App/> });
}
