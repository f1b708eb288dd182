use anyhow::Result;

use std::time::Instant;

use critical4::database::CriticalDatabase;
use critical4::generator::Generator;
use critical4::{MAX_PLY, MIN_PLY};

const DATABASE_PATH: &str = "critical.db";

fn main() -> Result<()> {
    println!("Connect 4 critical position database generator");
    println!(
        "Analysing positions from ply {} to {}, this may take several hours\n",
        MIN_PLY, MAX_PLY
    );

    let start_time = Instant::now();
    let (critical, stats) = Generator::new().run();
    let elapsed = start_time.elapsed().as_secs();

    println!("\nGeneration summary");
    println!("  Positions visited:  {}", stats.visited);
    println!("  Positions analysed: {}", stats.analyzed);
    println!("  Critical found:     {}", stats.critical);
    println!("  Skipped (trivial):  {}", stats.skipped);
    println!("  Solver nodes:       {}", stats.nodes_searched);
    println!("  Total time:         {}m {}s\n", elapsed / 60, elapsed % 60);

    if critical.is_empty() {
        println!("No critical positions found, nothing to save");
        return Ok(());
    }

    println!(
        "Saving {} critical positions to {}...",
        critical.len(),
        DATABASE_PATH
    );
    let database = CriticalDatabase::build(&critical);
    database.save(DATABASE_PATH)?;
    println!(
        "Saved, {} table slots, {:.2} MB",
        database.table_size(),
        database.file_size() as f64 / (1024.0 * 1024.0)
    );

    Ok(())
}
