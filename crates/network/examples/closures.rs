//! Closures and beliefs on the sprinkler network
//!
//! Run with: cargo run --example closures
//!
//! This example demonstrates:
//! - Exact beliefs with and without evidence
//! - Loose and strict closures of a variable set

use ipfp_network::{loose_closure, sprinkler_network, strict_closure, BeliefNetwork, Finding, NetworkError};

fn main() -> Result<(), NetworkError> {
    println!("=== Sprinkler network ===\n");

    let net = sprinkler_network();

    println!("1. Beliefs");
    println!("----------");
    let wet = [Finding::new("WetGrass", 0)];
    for node in net.node_names() {
        println!(
            "{:<10} prior {:.4?}  given WetGrass=True {:.4?}",
            node,
            net.beliefs(&node)?,
            net.beliefs_given(&node, &wet)?
        );
    }
    println!();

    println!("2. Closures");
    println!("-----------");
    for vars in [vec!["Sprinkler", "Rain"], vec!["Cloudy", "WetGrass"], vec!["WetGrass"]] {
        let vars: Vec<String> = vars.into_iter().map(String::from).collect();
        let loose = loose_closure(&net, &vars)?;
        let strict = strict_closure(&net, &vars)?;
        println!("Y = {:?}", vars);
        println!("  loose:  Y' = {:?}, S = {:?}", loose.updated, loose.residual);
        println!("  strict: Y' = {:?}, S = {:?}", strict.updated, strict.residual);
    }

    Ok(())
}
