//! Resource Sentinel - demo driver
//!
//! Runs the monitor against a synthetic ore field: a set of deposits that
//! drain at a noisy per-tick rate, each watched by one probe. Prints the
//! per-site depletion forecasts at the end.

use ahash::AHashMap;
use clap::Parser;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use resource_sentinel::core::config::MonitorConfig;
use resource_sentinel::core::types::{EntityId, Vec2};
use resource_sentinel::monitor::Monitor;
use resource_sentinel::probe::{Placement, Reading};
use resource_sentinel::signal::{SignalAdapter, SignalReport};
use resource_sentinel::Result;

#[derive(Parser, Debug)]
#[command(name = "resource_sentinel")]
#[command(about = "Run the depletion monitor over a synthetic ore field")]
struct Args {
    /// Number of probes (one per deposit)
    #[arg(long, default_value_t = 50)]
    probes: usize,

    /// Number of simulation cycles to run
    #[arg(long, default_value_t = 20_000)]
    cycles: u64,

    /// Sweep window in cycles (one full registry pass per window)
    #[arg(long, default_value_t = 300)]
    window: u64,

    /// Base drain per deposit per minute
    #[arg(long, default_value_t = 30.0)]
    drain: f64,

    /// Random seed for deterministic runs
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

/// One synthetic ore deposit
struct Deposit {
    product: String,
    count: f64,
    drain_per_tick: f64,
}

/// Simulated signal source over the deposits
///
/// The monitor only sees this through the SignalAdapter boundary. A drained
/// deposit stops reporting its product entirely, exercising the
/// vanished-signal path of the model.
struct OreField {
    deposits: AHashMap<EntityId, Deposit>,
}

impl SignalAdapter for OreField {
    fn get_readings(&self, probe_id: EntityId) -> SignalReport {
        match self.deposits.get(&probe_id) {
            Some(deposit) => {
                let mut readings = AHashMap::new();
                if deposit.count > 0.0 {
                    readings.insert(deposit.product.clone(), Reading { count: deposit.count });
                }
                SignalReport::valid(readings)
            }
            None => SignalReport::invalid(),
        }
    }
}

impl OreField {
    /// Drain every deposit one tick's worth, with +-50% noise
    fn step(&mut self, rng: &mut StdRng) {
        for deposit in self.deposits.values_mut() {
            let noise = rng.gen_range(0.5..1.5);
            deposit.count = (deposit.count - deposit.drain_per_tick * noise).max(0.0);
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "resource_sentinel=info".into()),
        )
        .init();

    let args = Args::parse();
    let mut rng = StdRng::seed_from_u64(args.seed);

    let config = MonitorConfig {
        sweep_window_cycles: args.window,
        ..MonitorConfig::default()
    };
    let mut monitor = Monitor::new(config.clone())?;

    let products = ["iron-ore", "copper-ore", "coal"];
    let regions = ["north-basin", "east-ridge", "south-flats"];

    // Seed the field: deposits clustered into one site per region
    let mut deposits = AHashMap::new();
    for i in 0..args.probes {
        let probe_id = EntityId::new();
        let region = regions[i % regions.len()];
        let product = products[i % products.len()];
        let initial = rng.gen_range(50_000.0..500_000.0);

        deposits.insert(
            probe_id,
            Deposit {
                product: product.to_string(),
                count: initial,
                drain_per_tick: args.drain / config.ticks_per_minute,
            },
        );

        monitor.add_probe(
            probe_id,
            EntityId::new(),
            Placement {
                owner: "overseer".to_string(),
                location_region: region.to_string(),
                position: Vec2::new(rng.gen_range(-500.0..500.0), rng.gen_range(-500.0..500.0)),
            },
            0,
        );
        monitor.set_site_label(probe_id, region)?;
    }
    let mut field = OreField { deposits };

    println!(
        "=== RESOURCE SENTINEL: {} probes, {} cycles, window {} ===\n",
        args.probes, args.cycles, args.window
    );

    let mut refreshes = 0usize;
    for now in 1..=args.cycles {
        field.step(&mut rng);
        refreshes += monitor.on_cycle(&field, now);
    }

    println!(
        "Ran {} cycles, {} refreshes ({:.2} per cycle)\n",
        args.cycles,
        refreshes,
        refreshes as f64 / args.cycles as f64
    );

    println!(
        "{:<14} {:>6}  {:<12} {:>14} {:>16}",
        "site", "probes", "product", "amount", "min to deplete"
    );
    for site in monitor.site_summary() {
        let mut products: Vec<_> = site.products.iter().collect();
        products.sort_by(|a, b| a.0.cmp(b.0));
        for (product, total) in products {
            let forecast = match total.minutes_to_deplete {
                Some(m) => format!("{m:.1}"),
                None => "never".to_string(),
            };
            println!(
                "{:<14} {:>6}  {:<12} {:>14.0} {:>16}",
                site.site_label, site.live_probes, product, total.amount, forecast
            );
        }
    }

    Ok(())
}
