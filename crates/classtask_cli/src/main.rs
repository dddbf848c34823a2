//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `classtask_core` linkage.
//! - Keep output deterministic for quick local sanity checks.

use classtask_core::db::{migrations, open_db_in_memory};

fn main() {
    println!("classtask_core ping={}", classtask_core::ping());
    println!("classtask_core version={}", classtask_core::core_version());

    match open_db_in_memory() {
        Ok(_conn) => println!(
            "classtask_core schema_version={}",
            migrations::latest_version()
        ),
        Err(err) => {
            eprintln!("classtask_core db_bootstrap_failed error={err}");
            std::process::exit(1);
        }
    }
}
