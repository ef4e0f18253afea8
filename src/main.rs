use std::path::{Path, PathBuf};
use std::process;
use std::time::Instant;

use clap::{Parser, Subcommand, ValueEnum};

use poolsort::file::DEFAULT_POOL_CAPACITY;
use poolsort::sort::DEFAULT_THREE_WAY_THRESHOLD;
use poolsort::{
    BufferPool, ExternalSorter, FileGenerator, FileKind, ReportFormat, RunReport, SortConfig,
    SortError, SortStrategy, WritePolicy, verify_sorted,
};

/// Sort fixed-size record files in place through a bounded block cache
#[derive(Parser)]
#[command(name = "poolsort", version)]
struct Cli {
    /// Logging level
    #[arg(short, long, value_enum, default_value_t = LogLevel::Info, global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Sort a data file in place and append run statistics
    Sort {
        /// File to sort
        data_file: PathBuf,
        /// Buffer pool capacity in blocks
        num_buffers: usize,
        /// Statistics file to append to
        stat_file: PathBuf,
        #[arg(short, long, value_enum, default_value_t = StrategyArg::Auto)]
        strategy: StrategyArg,
        /// Segments longer than this use median-of-three with three-way partitioning
        #[arg(short, long, default_value_t = DEFAULT_THREE_WAY_THRESHOLD)]
        threshold: usize,
        #[arg(short, long, value_enum, default_value_t = PolicyArg::WriteBack)]
        write_policy: PolicyArg,
        #[arg(short, long, value_enum, default_value_t = FormatArg::Text)]
        report_format: FormatArg,
    },
    /// Generate a file of random records
    Generate {
        file: PathBuf,
        /// Number of 4096-byte blocks
        num_blocks: usize,
        /// Letter keys and blank values, readable as text
        #[arg(long)]
        ascii: bool,
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Check that a file is sorted by key
    Verify {
        file: PathBuf,
        #[arg(short, long, default_value_t = DEFAULT_POOL_CAPACITY)]
        buffers: usize,
    },
}

#[derive(Copy, Clone, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

#[derive(Copy, Clone, ValueEnum)]
enum StrategyArg {
    Auto,
    Naive,
    Hybrid,
    InMemory,
}

#[derive(Copy, Clone, ValueEnum)]
enum PolicyArg {
    WriteBack,
    WriteThrough,
}

#[derive(Copy, Clone, ValueEnum)]
enum FormatArg {
    Text,
    Json,
}

fn main() {
    let cli = Cli::parse();
    init_logger(cli.log_level);

    let code = match cli.command {
        Command::Sort {
            data_file,
            num_buffers,
            stat_file,
            strategy,
            threshold,
            write_policy,
            report_format,
        } => {
            let strategy = match strategy {
                StrategyArg::Auto => None,
                StrategyArg::Naive => Some(SortStrategy::NaiveTwoWay),
                StrategyArg::Hybrid => Some(SortStrategy::MedianOfThreeThreeWay),
                StrategyArg::InMemory => Some(SortStrategy::FullInMemory),
            };
            let config = SortConfig {
                strategy,
                three_way_threshold: threshold,
            };
            let policy = match write_policy {
                PolicyArg::WriteBack => WritePolicy::WriteBack,
                PolicyArg::WriteThrough => WritePolicy::WriteThrough,
            };
            let format = match report_format {
                FormatArg::Text => ReportFormat::Text,
                FormatArg::Json => ReportFormat::Json,
            };
            run_sort(&data_file, num_buffers, &stat_file, config, policy, format)
        }
        Command::Generate {
            file,
            num_blocks,
            ascii,
            seed,
        } => run_generate(&file, num_blocks, ascii, seed),
        Command::Verify { file, buffers } => run_verify(&file, buffers),
    };

    process::exit(code);
}

fn run_sort(
    data_file: &Path,
    num_buffers: usize,
    stat_file: &Path,
    config: SortConfig,
    policy: WritePolicy,
    format: ReportFormat,
) -> i32 {
    let started = Instant::now();

    let mut pool = match BufferPool::open_with_policy(data_file, num_buffers, policy) {
        Ok(pool) => pool,
        Err(err) => {
            log::error!("buffer pool initialization error: {}", err);
            return 1;
        }
    };

    let record_count = pool.record_count();
    let sorted = ExternalSorter::with_config(&mut pool, record_count, config)
        .and_then(|mut sorter| sorter.sort());
    let strategy = match sorted {
        Ok(strategy) => strategy,
        Err(err) => {
            if let SortError::File(file_err) = &err
                && file_err.is_io_failure()
            {
                log::error!("storage failure while sorting, file may be partially sorted");
            }
            log::error!("data sorting error: {}", err);
            return 1;
        }
    };

    if let Err(err) = pool.close() {
        log::error!("data flushing error: {}", err);
        return 1;
    }
    let elapsed = started.elapsed();

    let report = RunReport::new(
        data_file.display().to_string(),
        strategy,
        pool.stats(),
        elapsed,
    );
    if let Err(err) = report.append_to(stat_file, format) {
        log::error!("statistics writing error: {}", err);
    }

    println!("File has been sorted.");
    0
}

fn run_generate(file: &Path, num_blocks: usize, ascii: bool, seed: Option<u64>) -> i32 {
    let mut generator = FileGenerator::new(file, num_blocks);
    if let Some(seed) = seed {
        generator = generator.with_seed(seed);
    }

    let kind = if ascii { FileKind::Ascii } else { FileKind::Binary };
    match generator.generate(kind) {
        Ok(()) => 0,
        Err(err) => {
            log::error!("file generation error: {}", err);
            1
        }
    }
}

fn run_verify(file: &Path, buffers: usize) -> i32 {
    let mut pool = match BufferPool::open(file, buffers) {
        Ok(pool) => pool,
        Err(err) => {
            log::error!("buffer pool initialization error: {}", err);
            return 1;
        }
    };

    let record_count = pool.record_count();
    match verify_sorted(&mut pool, record_count) {
        Ok(None) => {
            println!("{} records sorted.", record_count);
            0
        }
        Ok(Some(record_id)) => {
            println!("Out of order at record {}.", record_id);
            1
        }
        Err(err) => {
            log::error!("verification error: {}", err);
            1
        }
    }
}

fn init_logger(log_level: LogLevel) {
    env_logger::Builder::new()
        .filter_level(match log_level {
            LogLevel::Off => log::LevelFilter::Off,
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        })
        .format_timestamp_millis()
        .init();
}
