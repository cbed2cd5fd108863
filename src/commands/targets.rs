//! `targets` command - list the platform targets this package ships.

use crate::platform::PLATFORM_TARGETS;

pub fn run() {
    println!("Supported targets:");
    for target in &PLATFORM_TARGETS {
        println!(
            "  {:<16} {:<32} {}",
            target.pair(),
            target.file_name(),
            target.description
        );
    }
}
