use chrono::Local;
use etf_dashboard::catalog::Catalog;
use etf_dashboard::cli::{self, Tab};
use etf_dashboard::config::Config;
use etf_dashboard::dashboard::{Dashboard, Selection, MAX_SELECTIONS};
use etf_dashboard::fetch::{CsvDirProvider, MarketDataProvider};
use etf_dashboard::yahoo::{YahooProvider, DEFAULT_BASE_URL, DEFAULT_USER_AGENT};
use etf_dashboard::{io, report, Result};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

type Session = Dashboard<Box<dyn MarketDataProvider>>;

fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "warn,etf_dashboard=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let mut args = cli::parse_args();

    let config = match &args.config {
        Some(path) => Some(Config::from_file(path)?),
        None => Config::load_default()?,
    };
    if let Some(config) = &config {
        config.merge_with_cli(&mut args);
    }

    init_tracing(args.verbose);
    debug!(?args, "starting");

    let catalog = match &args.catalog {
        Some(path) => Catalog::from_csv(path)?,
        None => Catalog::builtin(),
    };
    info!(entries = catalog.len(), "catalog loaded");

    if args.function == Tab::Catalog {
        print!("{}", report::render_catalog(&catalog));
        return Ok(());
    }

    let selection = Selection::new(
        args.etfs.clone(),
        args.period.unwrap_or_default(),
        args.investment.unwrap_or(0.0),
    )?;

    if selection.is_empty() {
        println!(
            "No ETFs selected. Choose up to {} with --etf (list them with -f catalog).",
            MAX_SELECTIONS
        );
        return Ok(());
    }

    let provider: Box<dyn MarketDataProvider> = match &args.data_dir {
        Some(dir) => Box::new(CsvDirProvider::new(dir)?),
        None => {
            let settings = config.map(|c| c.provider).unwrap_or_default();
            Box::new(YahooProvider::with_settings(
                settings.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL),
                settings.user_agent.as_deref().unwrap_or(DEFAULT_USER_AGENT),
            )?)
        }
    };
    let mut dashboard: Session = Dashboard::new(catalog, provider);

    println!("{}", report::render_header(Local::now(), &selection));

    match args.function {
        Tab::Details => print!("{}", report::render_details(&dashboard.details(&selection))),
        Tab::Prices => print_prices(&mut dashboard, &selection)?,
        Tab::Stats => print_statistics(&mut dashboard, &selection)?,
        Tab::Returns => print_projections(&mut dashboard, &selection)?,
        Tab::Top => print_ranking(&mut dashboard, &selection)?,
        Tab::Export => {
            let output = args.output.as_deref().unwrap_or(io::EXPORT_FILE_NAME);
            export(&mut dashboard, &selection, output, args.force)?;
        }
        Tab::All => {
            print!("{}", report::render_details(&dashboard.details(&selection)));
            print_prices(&mut dashboard, &selection)?;
            print_statistics(&mut dashboard, &selection)?;
            print_projections(&mut dashboard, &selection)?;
            print_ranking(&mut dashboard, &selection)?;
            if let Some(output) = &args.output {
                export(&mut dashboard, &selection, output, args.force)?;
            }
        }
        Tab::Catalog => unreachable!("catalog is rendered before any data is fetched"),
    }

    debug!(cached = dashboard.fetcher().cached_len(), "finished");
    Ok(())
}

fn print_prices(dashboard: &mut Session, selection: &Selection) -> Result<()> {
    let summaries = dashboard.price_summaries(selection)?;
    print!("{}", report::render_price_summaries(&summaries, selection));
    Ok(())
}

fn print_statistics(dashboard: &mut Session, selection: &Selection) -> Result<()> {
    let rows = dashboard.statistics(selection)?;
    print!("{}", report::render_statistics(&rows));
    Ok(())
}

fn print_projections(dashboard: &mut Session, selection: &Selection) -> Result<()> {
    let rows = dashboard.projections(selection)?;
    print!("{}", report::render_projections(&rows, selection.investment));
    Ok(())
}

fn print_ranking(dashboard: &mut Session, selection: &Selection) -> Result<()> {
    let rows = dashboard.ranking(selection)?;
    print!("{}", report::render_ranking(&rows));
    Ok(())
}

fn export(dashboard: &mut Session, selection: &Selection, output: &str, force: bool) -> Result<()> {
    let Some(df) = dashboard.export_frame(selection)? else {
        println!("No price data to export.");
        return Ok(());
    };

    let path = io::export_dataframe(&df, output, force)?;
    let is_csv = path.extension().map_or(false, |ext| ext == "csv");
    let kind = if is_csv { io::EXPORT_MIME } else { "parquet" };
    println!("Exported {} rows to: {} ({})", df.height(), path.display(), kind);
    Ok(())
}
