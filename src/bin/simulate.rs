//! Toy duopoly simulator
//!
//! Drives the pricing agent through synthetic periods and prints how price
//! and state evolve. Only the state blob is carried between periods, exactly
//! as the competition harness does.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin simulate -- --periods 50
//!
//! # Reproducible run with debug logging
//! cargo run --bin simulate -- --periods 50 --seed 7 --log-level debug
//!
//! # Override config fields
//! cargo run --bin simulate -- --config '{"max_step": 0.5, "anchor_price": 12.0}'
//! ```

use clap::Parser;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use duopoly_pricer::{decode, Observation, PricingAgent, PricingConfig};

#[derive(Parser)]
#[command(name = "simulate")]
#[command(version, about = "Toy multi-period duopoly simulator", long_about = None)]
struct Cli {
    /// Number of periods to simulate
    #[arg(long, default_value = "20")]
    periods: u64,

    /// Seed for the synthetic market (0 = from entropy)
    #[arg(long, default_value = "0")]
    seed: u64,

    /// Log level when RUST_LOG is unset (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    log_level: String,

    /// Pricing config as JSON; missing fields take defaults
    #[arg(long)]
    config: Option<String>,
}

/// Synthetic rival and demand process.
struct Market {
    rng: StdRng,
    demand: Normal<f64>,
}

impl Market {
    fn new(seed: u64) -> Result<Self, Box<dyn std::error::Error>> {
        let rng = if seed == 0 {
            StdRng::from_entropy()
        } else {
            StdRng::seed_from_u64(seed)
        };
        Ok(Self {
            rng,
            demand: Normal::new(10.0, 2.0)?,
        })
    }

    fn rival_price(&mut self) -> f64 {
        8.0 + self.rng.gen_range(-2.0..4.0)
    }

    fn demand(&mut self) -> f64 {
        self.demand.sample(&mut self.rng).floor().max(1.0)
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config: PricingConfig = match &cli.config {
        Some(json) => serde_json::from_str(json)?,
        None => PricingConfig::default(),
    };
    let agent = PricingAgent::new(config)?;
    let mut market = Market::new(cli.seed)?;

    info!(periods = cli.periods, seed = cli.seed, "Starting simulation");
    println!("Simulating {} periods of pricing...", cli.periods);
    println!("Period | Price | Rival  | Demand | Regime     | Base  | Trend | Momentum | StateSize");

    let mut blob: Option<String> = None;
    let mut last_price: Option<f64> = None;

    for period in 1..=cli.periods {
        // No feedback exists before we have charged a price
        let observation = last_price.map(|price| {
            Observation::new(period, price, Some(market.rival_price()), market.demand())
        });

        let resp = match agent.price(blob.as_deref(), observation) {
            Ok(resp) => resp,
            Err(e) => {
                error!(period, error = %e, "Pricing call failed");
                return Err(e.into());
            }
        };

        let state = decode(&resp.state_blob)?;
        let d = state.diagnostics();
        let (rival, demand) = observation
            .map(|o| (o.rival_price.unwrap_or(f64::NAN), o.demand))
            .unwrap_or((f64::NAN, f64::NAN));

        println!(
            "{:6} | {:5.2} | {:6.2} | {:6.0} | {:10} | {:5.2} | {:5.2} | {:8.3} | {:9}",
            period,
            resp.price,
            rival,
            demand,
            format!("{:?}", resp.regime),
            state.base_price(agent.config()),
            d.rival_trend,
            d.profit_momentum,
            resp.state_blob.len()
        );

        last_price = Some(resp.price);
        blob = Some(resp.state_blob);
    }

    if let Some(blob) = &blob {
        let d = decode(blob)?.diagnostics();
        info!(
            rival_mean = ?d.rival_price.mean,
            rival_variance = ?d.rival_price.variance,
            demand_mean = ?d.demand.mean,
            base_drift = d.base_drift,
            window = d.window_size,
            "Simulation complete"
        );
    }
    println!("Simulation complete.");
    Ok(())
}
