// ============================================================
// Layer 2 - Application / Use Cases
// ============================================================
// Turns a config file plus launch options into a running
// trainer. No model math and no argument parsing here.

/// JSON training configuration
pub mod config;

/// Assembles dataset, loader, model, optimizer and trainer
pub mod train_use_case;
