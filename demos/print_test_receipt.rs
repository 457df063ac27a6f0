//! Test receipt example
//!
//! Demonstrates the full print path:
//! - Silent reconnect to a previously used printer
//! - Scanning and picking the strongest printer
//! - Printing a test receipt, or rendering it as text without a printer
//!
//! Run with: cargo run --example print_test_receipt
//!
//! To print a logo:
//!   cargo run --example print_test_receipt -- --logo https://example.com/logo.png
//!
//! For 80 mm paper:
//!   cargo run --example print_test_receipt -- --wide

use std::sync::Arc;

use thermal_printer_ble::{
    ConnectionManager, HostClass, PaperWidth, PrintOutcome, PrinterConfig, PrinterSession,
    Result, StoreConfig, StrongestSignal,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter("warn,thermal_printer_ble=debug")
        .init();

    println!("Thermal Printer Test");
    println!("====================\n");

    // Parse command line arguments
    let args: Vec<String> = std::env::args().collect();
    let logo = args
        .iter()
        .position(|arg| arg == "--logo")
        .and_then(|i| args.get(i + 1))
        .cloned();
    let wide = args.iter().any(|arg| arg == "--wide");

    let manager = Arc::new(ConnectionManager::with_system_adapter().await);

    match manager.auto_connect().await {
        Some(name) => println!("Reconnected to {}", name),
        None => {
            println!("Scanning for printers...\n");
            match manager.connect(&StrongestSignal).await {
                Ok(name) => println!("Connected to {}", name),
                Err(e) => println!("No printer connected ({}); printing virtually\n", e),
            }
        }
    }

    let mut store = StoreConfig::new("Corner Cafe");
    store.address = Some("12 Harbour Street".to_string());
    store.phone = Some("555-0100".to_string());
    store.logo = logo;
    if wide {
        store.paper_width = PaperWidth::Wide;
    }

    let session = PrinterSession::new(
        manager.clone(),
        PrinterConfig::for_host(HostClass::Unconstrained),
    );

    match session.print_test_receipt(&store).await? {
        PrintOutcome::Printed => println!("\nTest receipt printed."),
        PrintOutcome::Virtual { transcript } => {
            println!("--- virtual receipt ---");
            println!("{}", transcript);
            println!("-----------------------");
        }
    }

    manager.disconnect().await?;
    Ok(())
}
