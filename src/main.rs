// src/main.rs
use clap::Parser;
use crossbeam_channel::unbounded;
use duco_miner::miner::Throttle;
use duco_miner::stats::HashrateRegistry;
use duco_miner::utils::format::format_hashrate;
use duco_miner::utils::logging::init_bench_logging;
use duco_miner::*;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::thread;
use tokio::runtime::Runtime;

/// Main entry point for the Duino-Coin miner
///
/// # Returns
/// - `Ok(())` on successful execution
/// - `Err(MinerError)` if any operation fails
///
/// # Flow
/// 1. Parses command line arguments
/// 2. Delegates to appropriate subcommand handler
/// 3. Propagates any errors upward
fn main() -> Result<(), MinerError> {
    let cli = cli::Commands::parse();

    match cli.action {
        cli::Action::Start(opts) => start_mining(opts),
        cli::Action::Benchmark(opts) => run_benchmark(opts),
        cli::Action::Config(opts) => generate_config(opts),
    }
}

/// Starts the mining operation with given configuration options
///
/// # Operations
/// 1. Initializes logging
/// 2. Loads configuration and applies CLI overrides
/// 3. Resolves the pool node (fixed or via the pool directory)
/// 4. Starts the event reporter and the mining workers
/// 5. Mines until Ctrl-C, then prints the final statistics
fn start_mining(opts: cli::StartOptions) -> Result<(), MinerError> {
    utils::init_logging();

    let mut config = config::read(&opts.config)?;
    opts.apply_overrides(&mut config);
    let config = config.validated()?;

    log::info!(
        "Mining for {} with {} thread(s), {} at {}% intensity, {} difficulty",
        config.username,
        config.threads,
        config.algorithm,
        config.intensity,
        config.start_diff
    );

    let rt = Runtime::new()?;
    let endpoint = match config.pool_endpoint()? {
        Some(endpoint) => {
            log::info!("Using fixed pool node {}", endpoint);
            endpoint
        }
        None => {
            let locator = PoolLocator::new(config.pool_locator.clone());
            let located = rt.block_on(async {
                tokio::select! {
                    endpoint = locator.locate() => Ok(Some(endpoint)),
                    signal = tokio::signal::ctrl_c() => signal.map(|_| None),
                }
            })?;
            match located {
                Some(endpoint) => endpoint,
                None => {
                    log::info!("Interrupted before mining started");
                    return Ok(());
                }
            }
        }
    };

    // Statistics reporting
    let (events, receiver) = unbounded();
    StatsReporter::new(receiver).start_reporting();

    // Mining setup
    let mut scheduler = Scheduler::new(MiningContext {
        settings: WorkerSettings::from(&config),
        endpoint,
        connector: TcpConnector::new(config.socket_timeout()),
        stats: Arc::new(SharedStats::new(config.threads)),
        events,
        active: Arc::new(AtomicBool::new(true)),
    });
    scheduler.start_mining(config.threads)?;

    rt.block_on(tokio::signal::ctrl_c())?;
    scheduler.stop();

    // Workers may be blocked on a socket or mid-search; the process exit
    // ends them.
    let stats = scheduler.stats().get_stats();
    log::info!("Stopping miner");
    log::info!(
        "Final results: {} accepted, {} rejected, {} over {}",
        stats.shares_accepted,
        stats.shares_rejected,
        format_hashrate(stats.total_hashrate),
        utils::format::format_uptime(stats.uptime)
    );
    log::logger().flush();

    Ok(())
}

/// Runs mining algorithm benchmarks
///
/// Every thread searches `rounds` locally generated jobs whose matching
/// nonce is the last one in range, so each search covers the full range
/// without contacting the pool.
fn run_benchmark(opts: cli::BenchmarkOptions) -> Result<(), MinerError> {
    init_bench_logging();

    if opts.threads == 0 || opts.rounds == 0 {
        return Err(MinerError::InputError(
            "benchmark needs at least one thread and one round".into(),
        ));
    }

    log::info!(
        "Starting {} benchmark: {} thread(s), {} job(s) each at difficulty {}",
        opts.algorithm,
        opts.threads,
        opts.rounds,
        opts.difficulty
    );

    let registry = Arc::new(HashrateRegistry::new(opts.threads));
    let handles = (0..opts.threads)
        .map(|id| {
            let registry = Arc::clone(&registry);
            let algorithm = opts.algorithm;
            let difficulty = opts.difficulty;
            let rounds = opts.rounds;

            thread::Builder::new().name(format!("cpu{}", id)).spawn(move || {
                let mut throttle = Throttle::new(100);
                let mut total = 0.0;

                for round in 0..rounds {
                    let seed = format!("benchmark-{}-{}", id, round);
                    let job = algorithm.synthetic_job(&seed, difficulty.saturating_mul(100), difficulty);
                    let result = algorithm.search(&job, &mut throttle);
                    log::debug!(
                        "Round {}: nonce {} at {}",
                        round,
                        result.nonce,
                        format_hashrate(result.hashrate)
                    );
                    total += result.hashrate;
                }

                registry.set(id, total / f64::from(rounds));
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    // Wait for all threads to complete
    for handle in handles {
        handle
            .join()
            .map_err(|_| MinerError::InputError("benchmark thread panicked".into()))?;
    }

    // Report final results
    log::info!("Benchmark results:");
    for id in 0..registry.len() {
        if let Some(hashrate) = registry.get(id) {
            log::info!("Thread {}: {}", id, format_hashrate(hashrate));
        }
    }
    log::info!("Total hashrate: {}", format_hashrate(registry.sum()));
    log::logger().flush(); // Ensure final results appear

    Ok(())
}

/// Generates configuration template file
fn generate_config(opts: cli::ConfigOptions) -> Result<(), MinerError> {
    let config = config::generate_template(&opts.username);
    std::fs::write(&opts.output, config)?;
    println!("Configuration written to {}", opts.output.display());
    Ok(())
}
