pub mod pool_metrics;
pub mod shutdown;
pub mod startup;
