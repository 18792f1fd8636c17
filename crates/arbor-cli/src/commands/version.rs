//! Version command implementation.

const VERSION: &str = env!("CARGO_PKG_VERSION");

pub fn run() {
    println!("arbor {VERSION}");
    println!();
    println!("Composition host for trees of simulation components.");
    println!();
    println!("Build info:");
    println!("  Document format: v{}", arbor::CURRENT_VERSION);
    println!("  Target:          {}", std::env::consts::ARCH);
    println!("  OS:              {}", std::env::consts::OS);
}
