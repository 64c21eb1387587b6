use std::fs::{self, File};
use std::io::{self, Write};
use std::panic;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{anyhow, bail, Context, Result};
use clap::{ArgAction, Parser, Subcommand, ValueEnum, ValueHint};
use maxsub::{
    compute_report, compute_report_timed, format_parcels, generate_patch, list_modes,
    parse_parcels, parse_parcels_strict, Mode, Parcel, PatchSpec, Report, SolveParams,
    StageTimings, DEFAULT_ENUMERATION_LIMIT,
};
use plotters::prelude::*;
use plotters::style::{FontDesc, FontFamily, FontStyle};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;
use serde_json::json;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

const DEMO_INPUT: &str = "2, -5, 8, -2, 4, -10, 3, 1";

#[derive(Parser, Debug)]
#[command(author, version, about = "Maximum-subarray (Kadane) CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Solve one or more parcel sequences and report the best contiguous run
    Solve(SolveArgs),
    /// Print a random patch of non-zero parcels
    Generate(GenerateArgs),
    /// List the available solve modes as JSON
    Modes,
}

#[derive(Parser, Debug)]
struct SolveArgs {
    /// Text files holding comma-separated parcels (one sequence per file)
    #[arg(value_hint = ValueHint::FilePath)]
    inputs: Vec<PathBuf>,

    /// Inline comma-separated parcels (used when no files are given)
    #[arg(short, long, allow_hyphen_values = true)]
    parcels: Option<String>,

    /// Solve mode
    #[arg(long, value_enum, default_value_t = ModeOpt::Visual)]
    mode: ModeOpt,

    /// Report format on stdout
    #[arg(long, value_enum, default_value_t = FormatOpt::Text)]
    format: FormatOpt,

    /// Number of top subarrays to print in text mode
    #[arg(long, default_value_t = 10)]
    top: usize,

    /// Write the full subarray table as CSV (`-` for stdout)
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    output: Option<PathBuf>,

    /// Render an SVG bar chart of the parcels with the winning run highlighted
    #[arg(long, value_hint = ValueHint::FilePath)]
    svg: Option<PathBuf>,

    /// Reject the whole input on any non-integer token
    #[arg(long, action = ArgAction::SetTrue)]
    strict: bool,

    /// Longest sequence whose subarrays are enumerated
    #[arg(long, default_value_t = DEFAULT_ENUMERATION_LIMIT)]
    limit: usize,

    /// Enumerate subarrays regardless of length
    #[arg(long, action = ArgAction::SetTrue)]
    force: bool,

    /// Fail if the classic and visual answers disagree
    #[arg(long, action = ArgAction::SetTrue)]
    verify: bool,

    /// Time each algorithm separately
    #[arg(long, action = ArgAction::SetTrue)]
    profile: bool,

    /// Verbose logging
    #[arg(long, action = ArgAction::SetTrue)]
    verbose: bool,
}

#[derive(Parser, Debug)]
struct GenerateArgs {
    /// Number of parcels
    #[arg(long, default_value_t = PatchSpec::default().len)]
    len: usize,

    /// Smallest parcel value
    #[arg(long, default_value_t = PatchSpec::default().min, allow_hyphen_values = true)]
    min: Parcel,

    /// Largest parcel value
    #[arg(long, default_value_t = PatchSpec::default().max, allow_hyphen_values = true)]
    max: Parcel,

    /// Seed for a reproducible patch
    #[arg(long)]
    seed: Option<u64>,

    /// Write the patch to a file instead of stdout
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    output: Option<PathBuf>,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum ModeOpt {
    Classic,
    Visual,
}

impl From<ModeOpt> for Mode {
    fn from(value: ModeOpt) -> Self {
        match value {
            ModeOpt::Classic => Mode::Classic,
            ModeOpt::Visual => Mode::Visual,
        }
    }
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum FormatOpt {
    Text,
    Json,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let default_level = match &cli.command {
        Command::Solve(args) if args.verbose => "debug",
        _ => "info",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    match cli.command {
        Command::Solve(args) => handle_solve(args),
        Command::Generate(args) => handle_generate(args),
        Command::Modes => handle_modes(),
    }
}

/// One sequence to solve and where it came from.
#[derive(Clone, Debug)]
struct Input {
    label: String,
    parcels: Vec<Parcel>,
}

fn handle_solve(args: SolveArgs) -> Result<()> {
    let t_parse = Instant::now();
    let inputs = collect_inputs(&args)?;
    if args.profile || args.verbose {
        info!(
            "Parse stage: {:.3} ms ({} inputs)",
            t_parse.elapsed().as_secs_f64() * 1000.0,
            inputs.len()
        );
    }

    let params = SolveParams {
        mode: args.mode.into(),
        enumeration_limit: if args.force { None } else { Some(args.limit) },
    };

    let t_compute = Instant::now();
    let reports: Vec<Report> = inputs
        .par_iter()
        .map(|input| compute_report(&input.parcels, &params))
        .collect();
    if args.profile || args.verbose {
        info!(
            "Compute stage: {:.3} ms",
            t_compute.elapsed().as_secs_f64() * 1000.0
        );
    }

    for (input, report) in inputs.iter().zip(&reports) {
        if report.enumeration_skipped {
            warn!(
                "{}: {} parcels exceeds the enumeration limit of {}; subarray listing skipped (use --force)",
                input.label,
                report.parcels.len(),
                args.limit
            );
        }
        if args.verify && !report.consistent() {
            bail!("{}: classic and visual answers disagree", input.label);
        }
        if args.profile {
            profile_stages(input, &params);
        }
    }

    if csv_to_stdout(&args) {
        warn!(
            "--output - writes the CSV table to stdout; skipping the {:?} report",
            args.format
        );
    } else {
        match args.format {
            FormatOpt::Text => write_text_reports(&inputs, &reports, args.top)?,
            FormatOpt::Json => write_json_reports(&inputs, &reports)?,
        }
    }

    if let Some(path) = args.output.as_ref() {
        if csv_to_stdout(&args) {
            let stdout = io::stdout();
            let mut writer = csv::Writer::from_writer(stdout.lock());
            write_subarray_rows(&inputs, &reports, &mut writer)?;
        } else {
            let file = File::create(path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            let mut writer = csv::Writer::from_writer(file);
            write_subarray_rows(&inputs, &reports, &mut writer)?;
            info!("Wrote subarray CSV: {}", path.display());
        }
    }

    if let Some(base) = args.svg.as_ref() {
        for (idx, report) in reports.iter().enumerate() {
            let path = chart_path(base, idx, reports.len());
            match render_chart_guard(report, &path) {
                Ok(()) => info!("Wrote chart: {}", path.display()),
                Err(err) => warn!("Skipping SVG render ({}): {}", path.display(), err),
            }
        }
    }

    Ok(())
}

fn collect_inputs(args: &SolveArgs) -> Result<Vec<Input>> {
    if args.inputs.is_empty() {
        let text = args.parcels.as_deref().unwrap_or(DEMO_INPUT);
        let parcels = read_parcels(text, "inline", args.strict)?;
        return Ok(vec![Input {
            label: "inline".to_string(),
            parcels,
        }]);
    }
    if args.parcels.is_some() {
        warn!("--parcels is ignored when input files are given");
    }

    args.inputs
        .par_iter()
        .map(|path| -> Result<Input> {
            let text = fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            let label = path.display().to_string();
            let parcels = read_parcels(&text, &label, args.strict)?;
            Ok(Input { label, parcels })
        })
        .collect()
}

fn read_parcels(text: &str, label: &str, strict: bool) -> Result<Vec<Parcel>> {
    if strict {
        return parse_parcels_strict(text).with_context(|| format!("failed to parse {label}"));
    }
    let parsed = parse_parcels(text);
    if !parsed.is_clean() {
        debug!(
            "{label}: dropped {} unreadable token(s): {}",
            parsed.rejected.len(),
            parsed.rejected.join(" ")
        );
    }
    Ok(parsed.parcels)
}

/// The CSV table owns stdout when `--output -` is given.
fn csv_to_stdout(args: &SolveArgs) -> bool {
    args.output
        .as_ref()
        .is_some_and(|path| path.as_os_str() == "-")
}

fn profile_stages(input: &Input, params: &SolveParams) -> StageTimings {
    let origin = Instant::now();
    let (report, timings) = compute_report_timed(&input.parcels, params, || {
        origin.elapsed().as_secs_f64() * 1000.0
    });
    info!(
        "{}: classic {:.6} ms (sum {})",
        input.label, timings.classic_ms, report.classic_sum
    );
    if let (Some(ms), Some(best)) = (timings.visual_ms, report.best.as_ref()) {
        info!("{}: visual {:.6} ms (sum {})", input.label, ms, best.sum);
    }
    match timings.enumeration_ms {
        Some(ms) => info!(
            "{}: enumeration {:.6} ms ({} subarrays)",
            input.label,
            ms,
            report.subarrays.len()
        ),
        None if report.enumeration_skipped => {
            debug!("{}: enumeration not timed (over the limit)", input.label)
        }
        None => {}
    }
    timings
}

fn write_text_reports(inputs: &[Input], reports: &[Report], top: usize) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    for (input, report) in inputs.iter().zip(reports) {
        writeln!(out, "== {} ({} parcels)", input.label, report.parcels.len())?;
        if report.parcels.is_empty() {
            writeln!(out, "  empty patch, nothing to harvest")?;
            continue;
        }
        writeln!(out, "  max sum: {}", report.classic_sum)?;
        if let Some(best) = report.best.as_ref() {
            if let Some(range) = best.range() {
                writeln!(
                    out,
                    "  winning slice: [{}] (indices {} to {})",
                    format_parcels(&report.winning_slice),
                    range.start(),
                    range.end()
                )?;
            }
        }
        if report.mode.enumerates() {
            if report.enumeration_skipped {
                writeln!(out, "  subarrays: {} (listing skipped)", report.subarray_count)?;
            } else {
                writeln!(out, "  subarrays: {}", report.subarray_count)?;
                for entry in report.subarrays.iter().take(top) {
                    let mark = if report.is_highlighted(entry) { '*' } else { ' ' };
                    writeln!(
                        out,
                        "  {mark} {:>8}  [{}]",
                        entry.sum,
                        format_parcels(&entry.values)
                    )?;
                }
            }
        }
    }
    Ok(())
}

fn write_json_reports(inputs: &[Input], reports: &[Report]) -> Result<()> {
    let items: Vec<_> = inputs
        .iter()
        .zip(reports)
        .map(|(input, report)| json!({ "input": input.label, "report": report }))
        .collect();
    let text = serde_json::to_string_pretty(&items)?;
    println!("{text}");
    Ok(())
}

fn write_subarray_rows<W: Write>(
    inputs: &[Input],
    reports: &[Report],
    writer: &mut csv::Writer<W>,
) -> Result<()> {
    writer.write_record([
        "input",
        "rank",
        "sum",
        "start",
        "end",
        "len",
        "values",
        "highlighted",
    ])?;
    for (input, report) in inputs.iter().zip(reports) {
        for (rank, entry) in report.subarrays.iter().enumerate() {
            writer.write_record([
                input.label.clone(),
                (rank + 1).to_string(),
                entry.sum.to_string(),
                entry.start.to_string(),
                entry.end.to_string(),
                entry.len().to_string(),
                format_parcels(&entry.values),
                report.is_highlighted(entry).to_string(),
            ])?;
        }
    }
    writer.flush()?;
    Ok(())
}

fn chart_path(base: &Path, idx: usize, total: usize) -> PathBuf {
    if total <= 1 {
        return base.to_path_buf();
    }
    let stem = base
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("chart");
    base.with_file_name(format!("{stem}_{}.svg", idx + 1))
}

fn render_chart_guard(report: &Report, path: &Path) -> Result<(), String> {
    let render = || -> Result<(), String> {
        let svg = render_patch_svg(report, (1280, 480))
            .map_err(|e| format!("plotting error: {}", e))?;
        fs::write(path, svg).map_err(|e| format!("write error: {}", e))
    };

    panic::catch_unwind(panic::AssertUnwindSafe(render))
        .map_err(|_| "plotting backend panicked".to_string())?
}

fn render_patch_svg(report: &Report, size: (u32, u32)) -> Result<String> {
    if report.parcels.is_empty() {
        return Err(anyhow!("no parcels to draw"));
    }
    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, size).into_drawing_area();
        draw_patch(root, report)?;
    }
    Ok(svg)
}

fn draw_patch<DB>(root: DrawingArea<DB, plotters::coord::Shift>, report: &Report) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let parcels = &report.parcels;
    let n = parcels.len() as f64;
    let y_max = parcels.iter().copied().max().unwrap_or(0).max(0) as f64 + 1.0;
    let y_min = parcels.iter().copied().min().unwrap_or(0).min(0) as f64 - 1.0;

    root.fill(&WHITE)?;
    let caption = match report.best.as_ref().and_then(|b| b.range()) {
        Some(range) => format!(
            "Max sum {} (indices {} to {})",
            report.classic_sum,
            range.start(),
            range.end()
        ),
        None => format!("Max sum {}", report.classic_sum),
    };
    let caption_font = FontDesc::new(FontFamily::SansSerif, 24.0, FontStyle::Normal);
    let mut chart = ChartBuilder::on(&root)
        .caption(caption, caption_font)
        .margin(20)
        .set_label_area_size(LabelAreaPosition::Left, 50)
        .set_label_area_size(LabelAreaPosition::Bottom, 40)
        .build_cartesian_2d(-0.5..n - 0.5, y_min..y_max)?;

    let axis_font = FontDesc::new(FontFamily::SansSerif, 16.0, FontStyle::Normal);
    chart
        .configure_mesh()
        .light_line_style(&TRANSPARENT)
        .x_desc("Parcel index")
        .y_desc("Value")
        .x_label_formatter(&|v| format!("{:.0}", v))
        .y_label_formatter(&|v| format!("{:.0}", v))
        .label_style(axis_font.color(&BLACK.mix(0.85)))
        .draw()?;

    if let Some(range) = report.best.as_ref().and_then(|b| b.range()) {
        let band = RGBColor(255, 215, 0).mix(0.25).filled();
        chart.draw_series(std::iter::once(Rectangle::new(
            [
                (*range.start() as f64 - 0.5, y_min),
                (*range.end() as f64 + 0.5, y_max),
            ],
            band,
        )))?;
    }

    let gain = RGBColor(46, 139, 87);
    let loss = RGBColor(205, 92, 92);
    chart.draw_series(parcels.iter().enumerate().map(|(i, &v)| {
        let x = i as f64;
        let color = if v < 0 { loss } else { gain };
        let highlighted = report.best.as_ref().is_some_and(|b| b.contains(i));
        let style = if highlighted {
            color.filled()
        } else {
            color.mix(0.45).filled()
        };
        Rectangle::new([(x - 0.4, 0.0), (x + 0.4, v as f64)], style)
    }))?;

    chart.draw_series(LineSeries::new(
        [(-0.5, 0.0), (n - 0.5, 0.0)],
        &BLACK.mix(0.6),
    ))?;

    root.present()?;
    Ok(())
}

fn handle_generate(args: GenerateArgs) -> Result<()> {
    let spec = PatchSpec {
        len: args.len,
        min: args.min,
        max: args.max,
    };
    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let patch = generate_patch(&mut rng, &spec).context("cannot generate patch")?;
    let text = format_parcels(&patch);
    match args.output.as_ref() {
        Some(path) => {
            fs::write(path, format!("{text}\n"))
                .with_context(|| format!("failed to write {}", path.display()))?;
            info!("Wrote {} parcels: {}", patch.len(), path.display());
        }
        None => println!("{text}"),
    }
    Ok(())
}

fn handle_modes() -> Result<()> {
    let text = serde_json::to_string_pretty(&list_modes())?;
    println!("{text}");
    Ok(())
}
