//! Distribution algebra
//!
//! Run with: cargo run --example distributions
//!
//! This example demonstrates:
//! - Building a joint over named variables
//! - Marginalizing and conditioning
//! - Comparing distributions

use ipfp_core::{cross_entropy, total_variation, CoreError, JointDistribution, RandomVariable};

fn main() -> Result<(), CoreError> {
    println!("=== Distribution algebra ===\n");

    let weather = RandomVariable::new("Weather", ["sun", "cloud", "rain"])?;
    let umbrella = RandomVariable::binary("Umbrella")?;
    let q = JointDistribution::from_values(
        vec![weather.clone(), umbrella.clone()],
        vec![0.05, 0.45, 0.10, 0.20, 0.18, 0.02],
    )?;
    println!("Q(Weather, Umbrella):\n{}", q);

    let p_umbrella = q.marginalize(&[umbrella.clone()])?;
    println!("Q(Umbrella):\n{}", p_umbrella);

    let cpd = q.conditional(&[umbrella.clone()], &[weather.clone()])?;
    println!("Q(Umbrella | Weather):\n{}", cpd);

    let uniform = JointDistribution::uniform(vec![weather, umbrella])?;
    println!("TV(Q, uniform)  = {:.4}", total_variation(&q, &uniform)?);
    println!("KL(Q || uniform) = {}", cross_entropy(&q, &uniform)?);
    println!("KL(uniform || Q) = {}", cross_entropy(&uniform, &q)?);

    Ok(())
}
