use prometheus::{
    Encoder, GaugeVec, HistogramVec, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub booking_transitions_total: IntCounterVec,
    pub quotes_open: IntGauge,
    pub assignments_total: IntCounterVec,
    pub assignment_latency_seconds: HistogramVec,
    pub provider_active_jobs: GaugeVec,
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let booking_transitions_total = IntCounterVec::new(
            Opts::new(
                "booking_transitions_total",
                "Committed booking transitions by resulting status",
            ),
            &["status"],
        )
        .expect("valid booking_transitions_total metric");

        let quotes_open = IntGauge::new("quotes_open", "Currently pending quotes")
            .expect("valid quotes_open metric");

        let assignments_total = IntCounterVec::new(
            Opts::new("assignments_total", "Provider assignments by outcome"),
            &["outcome"],
        )
        .expect("valid assignments_total metric");

        let assignment_latency_seconds = HistogramVec::new(
            prometheus::HistogramOpts::new(
                "assignment_latency_seconds",
                "Latency of the assignment commit in seconds",
            ),
            &["outcome"],
        )
        .expect("valid assignment_latency_seconds metric");

        let provider_active_jobs = GaugeVec::new(
            Opts::new("provider_active_jobs", "Bookings currently bound to a provider"),
            &["provider_id"],
        )
        .expect("valid provider_active_jobs metric");

        registry
            .register(Box::new(booking_transitions_total.clone()))
            .expect("register booking_transitions_total");
        registry
            .register(Box::new(quotes_open.clone()))
            .expect("register quotes_open");
        registry
            .register(Box::new(assignments_total.clone()))
            .expect("register assignments_total");
        registry
            .register(Box::new(assignment_latency_seconds.clone()))
            .expect("register assignment_latency_seconds");
        registry
            .register(Box::new(provider_active_jobs.clone()))
            .expect("register provider_active_jobs");

        Self {
            registry,
            booking_transitions_total,
            quotes_open,
            assignments_total,
            assignment_latency_seconds,
            provider_active_jobs,
        }
    }

    pub fn encode(&self) -> Result<String, String> {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();

        TextEncoder::new()
            .encode(&metric_families, &mut buffer)
            .map_err(|err| format!("failed to encode metrics: {err}"))?;

        String::from_utf8(buffer).map_err(|err| format!("metrics are not valid utf8: {err}"))
    }
}
