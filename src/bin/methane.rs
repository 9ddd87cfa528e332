use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use log::{info, warn};
use methane_rs::analysis::{PIPELINE_SEGMENT, Report, ReportOptions, TOP_EMITTER_COUNT};
use methane_rs::geo::{self, Boundaries, DEFAULT_NAME_PROPERTY};
use methane_rs::viz::{ChartOptions, EMISSIONS_AXIS, Orientation};
use methane_rs::{AggFn, Column, EmissionType, Predicate, Query};
use methane_rs::{aggregate, cross_tab, storage, summary, table, viz};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(
    name = "methane",
    version,
    about = "Aggregate, summarize & chart global methane emission statistics"
)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the full study: commentary on stdout, optional charts and JSON.
    Report(ReportArgs),
    /// Filter, group and aggregate emissions.
    Aggregate(AggregateArgs),
    /// Two-dimensional breakdown of emissions.
    Crosstab(CrosstabArgs),
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum OutFormat {
    Csv,
    Json,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ChartFormat {
    Svg,
    Png,
}

impl ChartFormat {
    fn ext(self) -> &'static str {
        match self {
            ChartFormat::Svg => "svg",
            ChartFormat::Png => "png",
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum SortOrder {
    Asc,
    Desc,
}

#[derive(Args, Debug)]
struct ChartArgs {
    /// Width of charts (default 1000).
    #[arg(long, default_value_t = 1000)]
    width: u32,
    /// Height of charts (default 600).
    #[arg(long, default_value_t = 600)]
    height: u32,
    /// TrueType font for chart text; system fonts are searched otherwise.
    #[arg(long)]
    font: Option<PathBuf>,
    /// Locale for number formatting (e.g. en, de, fr).
    #[arg(long, default_value = "en")]
    locale: String,
}

impl ChartArgs {
    fn options(&self, title: &str) -> ChartOptions {
        let mut opts = ChartOptions::titled(title).size(self.width, self.height);
        opts.locale = self.locale.clone();
        opts.font_path = self.font.clone();
        opts
    }
}

#[derive(Args, Debug)]
struct ReportArgs {
    /// Emissions CSV.
    input: PathBuf,
    /// Write every chart into this directory.
    #[arg(long)]
    charts: Option<PathBuf>,
    /// Chart file format.
    #[arg(long, value_enum, default_value_t = ChartFormat::Svg)]
    chart_format: ChartFormat,
    /// GeoJSON country boundaries for the choropleth map.
    #[arg(long)]
    boundaries: Option<PathBuf>,
    /// Feature property holding the country name.
    #[arg(long, default_value = DEFAULT_NAME_PROPERTY)]
    name_property: String,
    /// Save all figures as JSON.
    #[arg(long)]
    json: Option<PathBuf>,
    /// Countries to compare, separated by comma or semicolon (default: top emitters).
    #[arg(long)]
    countries: Option<String>,
    /// Number of top emitters compared when --countries is omitted.
    #[arg(long, default_value_t = TOP_EMITTER_COUNT)]
    top: usize,
    /// Energy segment whose reasons are compared.
    #[arg(long, default_value = PIPELINE_SEGMENT)]
    segment: String,
    /// Emission type shown on the map.
    #[arg(long, default_value = "Agriculture", value_parser = parse_type)]
    map_type: EmissionType,
    #[command(flatten)]
    chart: ChartArgs,
}

#[derive(Args, Debug)]
struct AggregateArgs {
    /// Emissions CSV.
    input: PathBuf,
    /// Filter as column=value or column=a|b (repeatable, combined with AND).
    #[arg(short = 'w', long = "where")]
    conditions: Vec<String>,
    /// Group by column (repeatable; none gives a single total).
    #[arg(short, long = "by", value_parser = parse_column)]
    by: Vec<Column>,
    /// Aggregation: sum, mean or count.
    #[arg(long, default_value = "sum", value_parser = parse_agg)]
    agg: AggFn,
    /// Sort by value.
    #[arg(long, value_enum)]
    sort: Option<SortOrder>,
    /// Keep only the first N rows (after sorting).
    #[arg(long)]
    head: Option<usize>,
    /// Print min, max, mean and median of the result.
    #[arg(long, default_value_t = false)]
    stats: bool,
    /// Save results to file (format inferred by --format or extension).
    #[arg(long)]
    out: Option<PathBuf>,
    /// Output format (csv or json). If omitted, inferred from --out extension.
    #[arg(long, value_enum)]
    format: Option<OutFormat>,
    /// Create a bar chart at the given path (.svg or .png).
    #[arg(long)]
    plot: Option<PathBuf>,
    /// Draw bars vertically instead of horizontally.
    #[arg(long, default_value_t = false)]
    vertical: bool,
    /// Chart title.
    #[arg(long, default_value = "")]
    title: String,
    #[command(flatten)]
    chart: ChartArgs,
}

#[derive(Args, Debug)]
struct CrosstabArgs {
    /// Emissions CSV.
    input: PathBuf,
    /// Row dimension.
    #[arg(long, value_parser = parse_column)]
    rows: Column,
    /// Column dimension.
    #[arg(long, value_parser = parse_column)]
    cols: Column,
    /// Filter as column=value or column=a|b (repeatable, combined with AND).
    #[arg(short = 'w', long = "where")]
    conditions: Vec<String>,
    /// Aggregation: sum, mean or count.
    #[arg(long, default_value = "sum", value_parser = parse_agg)]
    agg: AggFn,
    /// Save results to file (format inferred by --format or extension).
    #[arg(long)]
    out: Option<PathBuf>,
    /// Output format (csv or json). If omitted, inferred from --out extension.
    #[arg(long, value_enum)]
    format: Option<OutFormat>,
    /// Create a heat map at the given path (.svg or .png).
    #[arg(long)]
    plot: Option<PathBuf>,
    /// Draw a stacked bar chart instead of a heat map.
    #[arg(long, default_value_t = false)]
    stacked: bool,
    /// Chart title.
    #[arg(long, default_value = "")]
    title: String,
    #[command(flatten)]
    chart: ChartArgs,
}

fn parse_column(s: &str) -> Result<Column, String> {
    s.parse().map_err(|e: methane_rs::AnalysisError| e.to_string())
}

fn parse_agg(s: &str) -> Result<AggFn, String> {
    s.parse().map_err(|e: methane_rs::AnalysisError| e.to_string())
}

fn parse_type(s: &str) -> Result<EmissionType, String> {
    s.parse().map_err(|_| {
        format!(
            "unknown emission type {s:?} (expected one of {})",
            EmissionType::ALL.map(|k| k.as_str()).join(", ")
        )
    })
}

fn parse_list(s: &str) -> Vec<String> {
    s.split([',', ';'])
        .map(|x| x.trim().to_string())
        .filter(|x| !x.is_empty())
        .collect()
}

fn fmt_value(x: f64) -> String {
    if x.is_finite() {
        // Format up to 4 decimals, then trim trailing zeros and trailing dot.
        let s = format!("{:.4}", x);
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        "NA".to_string()
    }
}

fn out_format(path: &Path, format: Option<OutFormat>) -> Result<OutFormat> {
    match format {
        Some(f) => Ok(f),
        None => match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref()
        {
            None | Some("csv") => Ok(OutFormat::Csv),
            Some("json") => Ok(OutFormat::Json),
            Some(other) => anyhow::bail!("unsupported format: {}", other),
        },
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();
    match cli.cmd {
        Command::Report(args) => cmd_report(args),
        Command::Aggregate(args) => cmd_aggregate(args),
        Command::Crosstab(args) => cmd_crosstab(args),
    }
}

fn cmd_report(args: ReportArgs) -> Result<()> {
    let table = table::load(&args.input)?;
    let opts = ReportOptions {
        countries: args.countries.as_deref().map(parse_list),
        top_n: args.top,
        segment: args.segment.clone(),
        map_type: args.map_type,
        locale: args.chart.locale.clone(),
    };
    let report = Report::build(&table, &opts);
    print!("{}", report.render(&opts.locale));

    if let Some(path) = args.json.as_ref() {
        storage::save_report_json(&report, path)?;
        eprintln!("Saved report to {}", path.display());
    }

    if let Some(dir) = args.charts.as_ref() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("creating chart directory {}", dir.display()))?;
        let written = write_report_charts(&report, &args, dir)?;
        eprintln!("Wrote {} charts to {}", written, dir.display());
    }
    Ok(())
}

/// One chart per figure of the report. Empty figures are skipped with a warning.
fn write_report_charts(report: &Report, args: &ReportArgs, dir: &Path) -> Result<usize> {
    let ext = args.chart_format.ext();
    let file = |stem: &str| dir.join(format!("{stem}.{ext}"));
    let mut written = 0;

    if report.world_by_type.is_empty() {
        warn!("no world totals; skipping the type pie");
    } else {
        let opts = args
            .chart
            .options("World methane emissions by type")
            .hex_colors(&["#D7BDE2", "#ABEBC6", "#F8C471", "#AED6F1"]);
        viz::plot_pie(&report.world_by_type, file("world_by_type"), &opts)?;
        written += 1;
    }

    for region in &report.regions {
        if region.totals.is_empty() {
            warn!("no regional rows for {}; skipping", region.kind);
            continue;
        }
        let color = match region.kind {
            EmissionType::Energy => "#6FB646",
            _ => "#DC9C27",
        };
        let opts = args
            .chart
            .options(&format!("{} emissions per region", region.kind))
            .axes(EMISSIONS_AXIS, "Region")
            .hex_colors(&[color]);
        let stem = format!("{}_by_region", region.kind.as_str().to_ascii_lowercase());
        viz::plot_bar(&region.totals, file(&stem), &opts, Orientation::Horizontal)?;
        written += 1;
    }

    if report.headline_types.is_empty() {
        warn!("no data for the compared countries; skipping country charts");
    } else {
        let opts = args
            .chart
            .options("Agriculture vs Energy in the top emitters")
            .axes(EMISSIONS_AXIS, "Country")
            .hex_colors(&["#E7936B", "#5F93CB"]);
        viz::plot_stacked_bar(&report.headline_types, file("agriculture_vs_energy"), &opts, Orientation::Horizontal)?;
        written += 1;

        let opts = args
            .chart
            .options("Emissions by type and country")
            .axes("Country", "Type");
        viz::plot_heatmap(&report.type_by_country, file("type_by_country"), &opts)?;
        written += 1;
    }

    if report.segment_reasons.is_empty() {
        warn!("no rows for segment {:?}; skipping", report.segment);
    } else {
        let opts = args
            .chart
            .options(&report.segment)
            .axes("Country", EMISSIONS_AXIS)
            .hex_colors(&["#28920F", "#76D6F0"]);
        viz::plot_stacked_bar(&report.segment_reasons, file("segment_reasons"), &opts, Orientation::Vertical)?;
        written += 1;
    }

    if let Some(path) = args.boundaries.as_ref() {
        let boundaries = Boundaries::from_geojson_path(path, &args.name_property)?;
        let joined = geo::join(&report.country_totals, &boundaries);
        if joined.matched.is_empty() {
            warn!("no country matched {}; skipping the map", path.display());
        } else {
            let opts = args
                .chart
                .options(&format!("{} emissions per country", report.map_type));
            viz::plot_choropleth(&joined, file("map"), &opts)?;
            written += 1;
        }
    }

    info!("wrote {} report charts", written);
    Ok(written)
}

fn cmd_aggregate(args: AggregateArgs) -> Result<()> {
    let table = table::load(&args.input)?;
    let predicate = Predicate::parse_all(&args.conditions)?;
    let mut query = Query::new().with_predicate(predicate).agg(args.agg);
    for column in &args.by {
        query = query.group_by(*column);
    }

    let mut result = aggregate(&table, &query);
    result = match args.sort {
        Some(SortOrder::Asc) => result.sorted_asc(),
        Some(SortOrder::Desc) => result.sorted_desc(),
        None => result,
    };
    if let Some(n) = args.head {
        result = result.head(n);
    }

    for row in &result {
        println!("{}\t{}", row.key, fmt_value(row.value));
    }

    if args.stats {
        let s = summary::summarize(&result)?;
        println!(
            "count={}  min={} ({})  max={} ({})  mean={}  median={}",
            s.count,
            fmt_value(s.min.value),
            s.min.label,
            fmt_value(s.max.value),
            s.max.label,
            fmt_value(s.mean),
            fmt_value(s.median)
        );
    }

    if let Some(path) = args.out.as_ref() {
        match out_format(path, args.format)? {
            OutFormat::Csv => storage::save_aggregate_csv(&result, path)?,
            OutFormat::Json => storage::save_aggregate_json(&result, path)?,
        }
        eprintln!("Saved {} rows to {}", result.len(), path.display());
    }

    if let Some(plot_path) = args.plot.as_ref() {
        let orientation = if args.vertical {
            Orientation::Vertical
        } else {
            Orientation::Horizontal
        };
        let dims = args.by.iter().map(|c| c.name()).collect::<Vec<_>>().join(" / ");
        let opts = match orientation {
            Orientation::Horizontal => args.chart.options(&args.title).axes(EMISSIONS_AXIS, dims),
            Orientation::Vertical => args.chart.options(&args.title).axes(dims, EMISSIONS_AXIS),
        };
        viz::plot_bar(&result, plot_path, &opts, orientation)?;
        eprintln!("Wrote plot to {}", plot_path.display());
    }

    Ok(())
}

fn cmd_crosstab(args: CrosstabArgs) -> Result<()> {
    let table = table::load(&args.input)?;
    let predicate = Predicate::parse_all(&args.conditions)?;
    let tab = cross_tab(&table, &predicate, args.rows, args.cols, args.agg);
    if tab.is_empty() {
        warn!("no rows matched; the cross-tab is empty");
    }

    println!("{}\t{}", tab.row_dim, tab.col_labels.join("\t"));
    for (label, cells) in tab.row_labels.iter().zip(&tab.cells) {
        let values: Vec<String> = cells
            .iter()
            .map(|c| c.map(fmt_value).unwrap_or_else(|| "-".to_string()))
            .collect();
        println!("{}\t{}", label, values.join("\t"));
    }

    if let Some(path) = args.out.as_ref() {
        match out_format(path, args.format)? {
            OutFormat::Csv => storage::save_crosstab_csv(&tab, path)?,
            OutFormat::Json => storage::save_crosstab_json(&tab, path)?,
        }
        eprintln!("Saved {}x{} cross-tab to {}", tab.row_labels.len(), tab.col_labels.len(), path.display());
    }

    if let Some(plot_path) = args.plot.as_ref() {
        let opts = args.chart.options(&args.title);
        if args.stacked {
            let opts = opts.axes(EMISSIONS_AXIS, args.rows.name());
            viz::plot_stacked_bar(&tab, plot_path, &opts, Orientation::Horizontal)?;
        } else {
            let opts = opts.axes(args.cols.name(), args.rows.name());
            viz::plot_heatmap(&tab, plot_path, &opts)?;
        }
        eprintln!("Wrote plot to {}", plot_path.display());
    }

    Ok(())
}
