// Demonstration: roll out a baseline policy on the merge network.
//
// Run from the repo root:
//   cargo run --example merge_rollout -- --variant highway_po_merge_info --policy random --episodes 10

use std::env;

use highway_marl::env::{EnvParams, EnvVariant, MultiAgentHighwayEnv};
use highway_marl::kernel::{Kernel, KernelError, MemoryNetwork, MemoryVehicles};
use highway_marl::metrics::EvaluationMetrics;
use highway_marl::policy::{ConstantPolicy, Policy, RandomPolicy};
use highway_marl::scenarios::{merge_kernel, spawn_platoon, MergeNetworkParams};

fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let args: Vec<String> = env::args().collect();
    let variant: EnvVariant = match arg_value(&args, "--variant")
        .unwrap_or("highway_po")
        .parse()
    {
        Ok(v) => v,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(2);
        }
    };
    let policy_name = arg_value(&args, "--policy").unwrap_or("random");
    let episodes: usize = arg_value(&args, "--episodes")
        .and_then(|s| s.parse().ok())
        .unwrap_or(5);
    let seed: u64 = arg_value(&args, "--seed")
        .and_then(|s| s.parse().ok())
        .unwrap_or(42);

    let params = EnvParams::with_defaults().with_horizon(200);
    let mut env = match MultiAgentHighwayEnv::new(params, variant) {
        Ok(env) => env,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(2);
        }
    };

    let template = match populated_merge(&MergeNetworkParams::default()) {
        Ok(kernel) => kernel,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(2);
        }
    };
    if let Err(e) = env.validate_layout(&template.network) {
        eprintln!("{e}");
        std::process::exit(2);
    }
    let make_kernel = |_episode: usize| template.clone();

    let mut policy: Box<dyn Policy> = match policy_name {
        "random" => Box::new(RandomPolicy::seeded(env.action_space(), seed)),
        "cruise" => Box::new(ConstantPolicy::new(0.0)),
        other => {
            eprintln!("Unknown --policy '{}'; expected 'random' or 'cruise'.", other);
            std::process::exit(2);
        }
    };

    let metrics = EvaluationMetrics::evaluate(&mut env, make_kernel, policy.as_mut(), episodes);
    println!("Variant: {}", variant);
    println!("Policy: {}", policy.name());
    println!("{}", metrics);
}

fn populated_merge(
    geometry: &MergeNetworkParams,
) -> Result<Kernel<MemoryVehicles, MemoryNetwork>, KernelError> {
    let mut kernel = merge_kernel(geometry)?;
    spawn_platoon(&mut kernel, "left", 6, 30.0, 20.0, 3)?;
    spawn_platoon(&mut kernel, "bottom", 2, 40.0, 12.0, 0)?;
    Ok(kernel)
}

fn arg_value<'a>(args: &'a [String], key: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == key)
        .and_then(|i| args.get(i + 1))
        .map(|s| s.as_str())
}
