/// Display version information
pub fn display_version() {
    println!("scopeprof v{}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("Line-level time and memory profiling for Rust code.");
    println!("Metrics: time (wall clock), memory (TrackingAllocator)");
}
