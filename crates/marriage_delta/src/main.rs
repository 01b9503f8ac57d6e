use std::collections::BTreeMap;
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{WrapErr, eyre};
use marriage_delta::report::{render_comparison, render_grid};
use marriage_delta::{AppConfig, CommandEngine, default_data_dir, init_logging};
use marriage_delta_core::model::{Category, DisabilityFlags, Year};
use marriage_delta_core::{
    CategoryCatalog, CategoryProvider, Evaluator, Household, HouseholdMetric, StateCode,
    SweepSpec, build_delta_grids, compare,
};
use serde_json::json;

#[derive(Parser, Debug)]
#[command(name = "marriage_delta")]
#[command(about = "Compare a household's taxes and benefits married versus filing separately")]
struct Args {
    /// Path to the data directory (default: ~/.marriage_delta/)
    #[arg(short, long, global = true)]
    data_dir: Option<PathBuf>,

    /// Log level (debug, info, warn, error)
    #[arg(short, long, default_value = "info", global = true)]
    log_level: String,

    /// Write logs to marriage_delta.log in the data directory instead of stderr
    #[arg(long, global = true)]
    log_file: bool,

    /// Calculation engine command, overriding config.yaml
    #[arg(long, global = true)]
    engine: Option<String>,

    /// Argument passed to the engine command; repeat for several
    #[arg(long = "engine-arg", value_name = "ARG", global = true, allow_hyphen_values = true)]
    engine_args: Vec<String>,

    /// Seconds to wait for each engine response
    #[arg(long, global = true)]
    timeout: Option<u64>,

    /// Tax year (default: config.yaml, then the current year)
    #[arg(short, long, global = true)]
    year: Option<Year>,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Compare filing married against filing as two singles
    Compare {
        #[command(flatten)]
        household: HouseholdArgs,
    },
    /// Delta grids over every pair of head and spouse incomes
    Grid {
        #[command(flatten)]
        household: HouseholdArgs,

        /// Metric to grid; repeat for several (default: all)
        #[arg(long, value_enum)]
        metric: Vec<MetricArg>,

        /// Samples per axis
        #[arg(long)]
        count: Option<usize>,

        #[arg(long)]
        min: Option<i64>,

        #[arg(long)]
        max: Option<i64>,
    },
    /// Print the married, head-alone and spouse-alone scenario documents
    Scenario {
        #[command(flatten)]
        household: HouseholdArgs,

        /// Attach the configured income sweep
        #[arg(long)]
        sweep: bool,
    },
    /// List the variables making up each category
    Categories {
        /// Two-letter state code
        #[arg(short, long)]
        state: StateCode,
    },
}

#[derive(clap::Args, Debug)]
struct HouseholdArgs {
    /// Two-letter state code
    #[arg(short, long)]
    state: StateCode,

    /// Head of household employment income
    #[arg(long, default_value_t = 0)]
    head_income: i64,

    /// Spouse employment income
    #[arg(long, default_value_t = 0)]
    spouse_income: i64,

    /// Age of a child; repeat once per child
    #[arg(long = "child", value_name = "AGE")]
    children: Vec<i32>,

    #[arg(long)]
    head_disabled: bool,

    #[arg(long)]
    spouse_disabled: bool,

    /// Number of a disabled child, counting from 1; repeatable
    #[arg(long = "child-disabled", value_name = "N")]
    disabled_children: Vec<u32>,
}

impl HouseholdArgs {
    fn household(&self, year: Year) -> Household {
        let disability = DisabilityFlags {
            head: self.head_disabled,
            spouse: self.spouse_disabled,
            children: self.disabled_children.iter().map(|&n| (n, true)).collect(),
        };
        let children: BTreeMap<u32, i32> = (1..).zip(self.children.iter().copied()).collect();

        Household {
            children,
            ..Household::new(self.state.clone(), self.head_income, self.spouse_income, year)
        }
        .with_disability(disability)
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum MetricArg {
    NetIncome,
    Benefits,
    RefundableCredits,
    Tax,
}

impl From<MetricArg> for HouseholdMetric {
    fn from(metric: MetricArg) -> Self {
        match metric {
            MetricArg::NetIncome => HouseholdMetric::NetIncome,
            MetricArg::Benefits => HouseholdMetric::Benefits,
            MetricArg::RefundableCredits => HouseholdMetric::RefundableCredits,
            MetricArg::Tax => HouseholdMetric::TaxBeforeRefundableCredits,
        }
    }
}

fn engine(args: &Args, config: &AppConfig) -> color_eyre::Result<CommandEngine> {
    let mut engine_config = config.engine.clone();
    if let Some(command) = &args.engine {
        engine_config.command = Some(command.clone());
    }
    if !args.engine_args.is_empty() {
        engine_config.args = args.engine_args.clone();
    }
    if let Some(timeout) = args.timeout {
        engine_config.timeout_secs = timeout;
    }
    CommandEngine::from_config(&engine_config).ok_or_else(|| {
        eyre!("no calculation engine configured: pass --engine or set engine.command in config.yaml")
    })
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let args = Args::parse();
    let data_dir = args.data_dir.clone().unwrap_or_else(default_data_dir);

    init_logging(&data_dir, &args.log_level, args.log_file)?;

    let config = AppConfig::load(&data_dir).wrap_err("failed to load configuration")?;
    let year = config.resolve_year(args.year);
    let catalog = match &config.categories {
        Some(path) => CategoryCatalog::load(path)?,
        None => CategoryCatalog::builtin()?,
    };

    match &args.command {
        Commands::Compare { household } => {
            let household = household.household(year);
            let engine = engine(&args, &config)?;
            let evaluator = Evaluator::new(&engine, &catalog);

            let result = compare(&evaluator, &household).wrap_err("comparison failed")?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print!("{}", render_comparison(&result));
            }
        }
        Commands::Grid {
            household,
            metric,
            count,
            min,
            max,
        } => {
            let household = household.household(year);
            let defaults = SweepSpec::from(config.sweep);
            let sweep = SweepSpec::new(
                count.unwrap_or(defaults.count),
                min.unwrap_or(defaults.min),
                max.unwrap_or(defaults.max),
            );
            let metrics: Vec<HouseholdMetric> = if metric.is_empty() {
                HouseholdMetric::ALL.to_vec()
            } else {
                metric.iter().map(|&m| m.into()).collect()
            };
            let engine = engine(&args, &config)?;
            let evaluator = Evaluator::new(&engine, &catalog);

            let outcomes = build_delta_grids(&evaluator, &household, &metrics, &sweep)
                .wrap_err("grid evaluation failed")?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&outcomes)?);
            } else {
                for outcome in &outcomes {
                    println!("{}", render_grid(outcome));
                }
            }
        }
        Commands::Scenario { household, sweep } => {
            let household = household.household(year);
            let sweep = sweep.then(|| SweepSpec::from(config.sweep));
            let sweep = sweep.as_ref();

            let documents = json!({
                "married": household.married_scenario(sweep)?.situation(),
                "head_alone": household.head_alone_scenario(sweep)?.situation(),
                "spouse_alone": household.spouse_alone_scenario(sweep)?.situation(),
            });
            println!("{}", serde_json::to_string_pretty(&documents)?);
        }
        Commands::Categories { state } => {
            let set = catalog.categories(state, year);
            if args.json {
                println!("{}", serde_json::to_string_pretty(&set)?);
            } else {
                for category in Category::ALL {
                    println!("{} ({state}, {year}):", category.label());
                    for variable in set.variables(category) {
                        println!("  {variable}");
                    }
                }
            }
        }
    }

    tracing::debug!("done");
    Ok(())
}
