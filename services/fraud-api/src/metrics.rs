use lazy_static::lazy_static;
use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};

lazy_static! {
    // Scoring metrics
    pub static ref PREDICTIONS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("fraud_predictions_total", "Heuristic predictions served"),
        &["label"]
    ).expect("metric can be created");

    pub static ref SCORE_DISTRIBUTION: Histogram = Histogram::with_opts(
        HistogramOpts::new("fraud_score_distribution", "Distribution of reported fraud probabilities")
            .buckets(vec![0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8, 0.9, 1.0])
    ).expect("metric can be created");

    // Persistence metrics
    pub static ref ANALYSIS_PERSIST_FAILURES: IntCounter = IntCounter::new(
        "analysis_persist_failures_total",
        "Analysis history writes that failed"
    ).expect("metric can be created");

    // Model proxy metrics
    pub static ref MODEL_PROXY_REQUESTS: IntCounterVec = IntCounterVec::new(
        Opts::new("model_proxy_requests_total", "Requests proxied to the model service"),
        &["outcome"]
    ).expect("metric can be created");
}

/// Register all metrics with the given registry
pub fn register_metrics(registry: &Registry) -> Result<(), prometheus::Error> {
    registry.register(Box::new(PREDICTIONS_TOTAL.clone()))?;
    registry.register(Box::new(SCORE_DISTRIBUTION.clone()))?;
    registry.register(Box::new(ANALYSIS_PERSIST_FAILURES.clone()))?;
    registry.register(Box::new(MODEL_PROXY_REQUESTS.clone()))?;

    Ok(())
}

/// Generate metrics output in Prometheus text format
pub fn render(registry: &Registry) -> Result<String, Box<dyn std::error::Error>> {
    let encoder = TextEncoder::new();
    let metric_families = registry.gather();
    let mut buffer = vec![];
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}
