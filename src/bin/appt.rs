use anyhow::{Context, Result};
use appt_insights::config::Settings;
use appt_insights::models::{Dimension, EMPTY_LABEL};
use appt_insights::storage::{self, JsonFileStore, Store};
use appt_insights::viz::{self, ChartKind, util::map_locale};
use appt_insights::{FilterSpec, Granularity, PeriodPreset, calendar, compare, filter, stats};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use num_format::ToFormattedString;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "appt",
    version,
    about = "Ingest, slice, compare & chart appointment records"
)]
struct Cli {
    /// Record store (JSON). Defaults to $APPT_STORE, then the user data directory.
    #[arg(long, global = true)]
    store: Option<PathBuf>,
    /// Locale for number formatting (en, de, fr, es, it, pt, nl).
    #[arg(long, global = true)]
    locale: Option<String>,
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Normalize .csv/.json files and append their rows to the store.
    Ingest(IngestArgs),
    /// List stored records, newest first.
    List(ListArgs),
    /// Count records per year, quarter, month, week or day.
    Buckets(BucketArgs),
    /// Print totals and top/bottom labels per dimension.
    Kpis(KpiArgs),
    /// Compare a current period against a previous one.
    Compare(CompareArgs),
    /// Show the distinct sources, locations, services and years in the store.
    Options,
}

#[derive(Args, Debug)]
struct IngestArgs {
    /// Input files (.csv with a header row, or .json array of objects).
    #[arg(required = true)]
    files: Vec<PathBuf>,
}

#[derive(Args, Debug, Clone, Default)]
struct FilterArgs {
    /// Accepted sources, separated by comma or semicolon (empty = all).
    #[arg(long)]
    source: Option<String>,
    /// Accepted locations, separated by comma or semicolon (empty = all).
    #[arg(long)]
    location: Option<String>,
    /// Accepted services, separated by comma or semicolon (empty = all).
    #[arg(long)]
    service: Option<String>,
    /// Earliest date (YYYY-MM-DD, inclusive).
    #[arg(long)]
    from: Option<NaiveDate>,
    /// Latest date (YYYY-MM-DD, inclusive).
    #[arg(long)]
    to: Option<NaiveDate>,
    /// Restrict to one calendar year (overrides --from/--to).
    #[arg(long)]
    year: Option<i32>,
}

#[derive(Args, Debug)]
struct ListArgs {
    #[command(flatten)]
    filters: FilterArgs,
    /// Page to show (1-based).
    #[arg(long, default_value_t = 1)]
    page: usize,
    /// Rows per page (default 10).
    #[arg(long)]
    page_size: Option<usize>,
}

#[derive(Args, Debug)]
struct BucketArgs {
    /// Granularity: year, quarter, month, week or day.
    #[arg(long, default_value = "month")]
    by: Granularity,
    #[command(flatten)]
    filters: FilterArgs,
    /// Save buckets to file (.csv or .json).
    #[arg(long)]
    out: Option<PathBuf>,
    /// Create a chart at the given path (.svg or .png).
    #[arg(long)]
    plot: Option<PathBuf>,
    /// Chart kind: bar, line or area (default bar).
    #[arg(long, default_value = "bar")]
    kind: ChartKind,
    /// Width of the plot (default 1000).
    #[arg(long, default_value_t = 1000)]
    width: u32,
    /// Height of the plot (default 600).
    #[arg(long, default_value_t = 600)]
    height: u32,
    /// Print JSON instead of text.
    #[arg(long, default_value_t = false)]
    json: bool,
}

#[derive(Args, Debug)]
struct KpiArgs {
    #[command(flatten)]
    filters: FilterArgs,
    /// How many source → service pairs to list.
    #[arg(long, default_value_t = 5)]
    pairs: usize,
    /// Print JSON instead of text.
    #[arg(long, default_value_t = false)]
    json: bool,
}

#[derive(Args, Debug)]
struct CompareArgs {
    #[command(flatten)]
    filters: FilterArgs,
    /// Preset periods: month, quarter or year (this vs last).
    #[arg(long, conflicts_with_all = ["from_a", "to_a", "from_b", "to_b"])]
    preset: Option<PeriodPreset>,
    /// Reference date for presets (default: today).
    #[arg(long, requires = "preset")]
    today: Option<NaiveDate>,
    /// Current period start.
    #[arg(long)]
    from_a: Option<NaiveDate>,
    /// Current period end.
    #[arg(long)]
    to_a: Option<NaiveDate>,
    /// Previous period start.
    #[arg(long)]
    from_b: Option<NaiveDate>,
    /// Previous period end.
    #[arg(long)]
    to_b: Option<NaiveDate>,
    /// Export both subsets as CSV (rows tagged A/B).
    #[arg(long)]
    export: Option<PathBuf>,
    /// Chart both weekly series (.svg or .png).
    #[arg(long)]
    plot: Option<PathBuf>,
    /// Width of the plot (default 1000).
    #[arg(long, default_value_t = 1000)]
    width: u32,
    /// Height of the plot (default 600).
    #[arg(long, default_value_t = 600)]
    height: u32,
    /// Print JSON instead of text.
    #[arg(long, default_value_t = false)]
    json: bool,
}

fn parse_list(s: &str) -> Vec<String> {
    s.split([',', ';'])
        .map(|x| x.trim().to_string())
        .filter(|x| !x.is_empty())
        .collect()
}

impl FilterArgs {
    fn to_spec(&self) -> FilterSpec {
        let list = |v: &Option<String>| v.as_deref().map(parse_list).unwrap_or_default();
        let spec = FilterSpec::new()
            .sources(list(&self.source))
            .locations(list(&self.location))
            .services(list(&self.service));
        match self.year {
            Some(y) => spec.for_year(y),
            None => spec.between(self.from, self.to),
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let page_size = match &cli.cmd {
        Command::List(a) => a.page_size,
        _ => None,
    };
    let settings = Settings::resolve(cli.store.clone(), cli.locale.clone(), page_size);
    let mut store = JsonFileStore::new(settings.store_path.clone());
    match cli.cmd {
        Command::Ingest(args) => cmd_ingest(&mut store, args),
        Command::List(args) => cmd_list(&store, &settings, args),
        Command::Buckets(args) => cmd_buckets(&store, &settings, args),
        Command::Kpis(args) => cmd_kpis(&store, &settings, args),
        Command::Compare(args) => cmd_compare(&store, &settings, args),
        Command::Options => cmd_options(&store),
    }
}

fn count(n: usize, settings: &Settings) -> String {
    n.to_formatted_string(map_locale(&settings.locale))
}

fn cmd_ingest(store: &mut JsonFileStore, args: IngestArgs) -> Result<()> {
    for path in &args.files {
        let rows = storage::read_rows(path)?;
        let report = storage::ingest(store, &rows)
            .with_context(|| format!("ingest {}", path.display()))?;
        println!(
            "{}: accepted={} rejected={} stored={}",
            path.display(),
            report.accepted,
            report.rejected.len(),
            report.stored
        );
        for r in &report.rejected {
            eprintln!("  row {}: {}", r.row + 1, r.reason);
        }
    }
    eprintln!("Store: {}", store.path().display());
    Ok(())
}

fn cmd_list(store: &JsonFileStore, settings: &Settings, args: ListArgs) -> Result<()> {
    let records = filter::filter(&store.load(), &args.filters.to_spec());
    let sorted = filter::newest_first(&records);
    let page = filter::paginate(&sorted, args.page, settings.page_size);
    println!("{:<12} {:<20} {:<20} {}", "Date", "Location", "Source", "Service");
    for r in page.items {
        println!(
            "{:<12} {:<20} {:<20} {}",
            r.date,
            r.location,
            r.source,
            r.service.as_deref().unwrap_or(EMPTY_LABEL)
        );
    }
    println!(
        "Page {} of {} ({} records)",
        page.page,
        page.total_pages,
        count(records.len(), settings)
    );
    Ok(())
}

fn cmd_buckets(store: &JsonFileStore, settings: &Settings, args: BucketArgs) -> Result<()> {
    let records = filter::filter(&store.load(), &args.filters.to_spec());
    let buckets = calendar::bucket(&records, args.by);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&buckets)?);
    } else {
        for b in &buckets {
            println!("{:<10} {}", b.key, count(b.count, settings));
        }
    }

    if let Some(path) = args.out.as_ref() {
        let fmt = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("csv")
            .to_ascii_lowercase();
        match fmt.as_str() {
            "csv" => storage::save_buckets_csv(&buckets, path)?,
            "json" => storage::save_json(&buckets, path)?,
            other => anyhow::bail!("unsupported format: {}", other),
        }
        eprintln!("Saved {} buckets to {}", buckets.len(), path.display());
    }

    if let Some(plot_path) = args.plot.as_ref() {
        let title = format!("Appointments by {}", args.by);
        viz::plot_buckets(
            &buckets,
            plot_path,
            args.width,
            args.height,
            &title,
            args.kind,
            &settings.locale,
        )?;
        eprintln!("Wrote plot to {}", plot_path.display());
    }
    Ok(())
}

fn cmd_kpis(store: &JsonFileStore, settings: &Settings, args: KpiArgs) -> Result<()> {
    let records = filter::filter(&store.load(), &args.filters.to_spec());
    let summary = stats::summarize(&records);
    let pairs = stats::rank_pairs(&records, Some(args.pairs));
    let best_services = stats::best_service_by_location(&records);

    if args.json {
        let v = serde_json::json!({
            "summary": summary,
            "pairs": pairs,
            "best_service_by_location": best_services,
        });
        println!("{}", serde_json::to_string_pretty(&v)?);
        return Ok(());
    }

    println!("Total appointments: {}", count(summary.total, settings));
    for dim in Dimension::ALL {
        let r = summary.ranked(dim);
        println!("{:<9} top={}  bottom={}", dim.label(), r.top, r.bottom);
    }
    if !pairs.is_empty() {
        println!("Top source → service pairs:");
        for p in &pairs {
            println!("  {:<40} {}", p.key, count(p.count, settings));
        }
    }
    if !best_services.is_empty() {
        println!("Best service per location:");
        for b in &best_services {
            println!("  {:<20} {:<20} {}", b.location, b.service, count(b.count, settings));
        }
    }
    Ok(())
}

fn cmd_compare(store: &JsonFileStore, settings: &Settings, args: CompareArgs) -> Result<()> {
    let records = store.load();
    let base = args.filters.to_spec();
    let (cur_spec, prev_spec) = match args.preset {
        Some(preset) => {
            let today = args
                .today
                .unwrap_or_else(|| chrono::Local::now().date_naive());
            preset
                .specs(&base, today)
                .ok_or_else(|| anyhow::anyhow!("cannot resolve preset around {}", today))?
        }
        None => (
            base.clone().between(args.from_a, args.to_a),
            base.between(args.from_b, args.to_b),
        ),
    };

    let result = compare::compare(&records, &cur_spec, &prev_spec);
    let cur = filter::filter(&records, &cur_spec);
    let prev = filter::filter(&records, &prev_spec);
    let deltas = compare::source_deltas(&cur, &prev);

    if args.json {
        let v = serde_json::json!({ "comparison": result, "source_deltas": deltas });
        println!("{}", serde_json::to_string_pretty(&v)?);
    } else {
        let arrow = if result.growth_percent >= 0.0 { "▲" } else { "▼" };
        println!("Appointments (A): {}", count(result.total_current, settings));
        println!("Appointments (B): {}", count(result.total_previous, settings));
        println!("Growth: {} {:.1}%", arrow, result.growth_percent.abs());
        println!("Best source: {}", result.best_source);
        println!("Worst source: {}", result.worst_source);
        println!("Weekly (A):");
        for b in &result.weekly_current {
            println!("  {:<10} {}", b.key, count(b.count, settings));
        }
        println!("Weekly (B):");
        for b in &result.weekly_previous {
            println!("  {:<10} {}", b.key, count(b.count, settings));
        }
        if !deltas.is_empty() {
            println!("Source deltas:");
            for d in &deltas {
                println!("  {:<20} {:+}", d.source, d.delta);
            }
        }
    }

    if let Some(path) = args.export.as_ref() {
        storage::export_comparison_csv(&cur, &prev, path)?;
        eprintln!("Saved {} rows to {}", cur.len() + prev.len(), path.display());
    }

    if let Some(plot_path) = args.plot.as_ref() {
        viz::plot_comparison(
            &result.weekly_current,
            &result.weekly_previous,
            plot_path,
            args.width,
            args.height,
            &settings.locale,
        )?;
        eprintln!("Wrote plot to {}", plot_path.display());
    }
    Ok(())
}

fn cmd_options(store: &JsonFileStore) -> Result<()> {
    let opts = stats::options(&store.load());
    let join = |v: &[String]| {
        if v.is_empty() {
            EMPTY_LABEL.to_string()
        } else {
            v.join(", ")
        }
    };
    println!("Sources:   {}", join(&opts.sources));
    println!("Locations: {}", join(&opts.locations));
    println!("Services:  {}", join(&opts.services));
    let years: Vec<String> = opts.years.iter().map(|y| y.to_string()).collect();
    println!("Years:     {}", join(&years));
    Ok(())
}
