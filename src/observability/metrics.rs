use prometheus::{
    Encoder, HistogramVec, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub allocations_total: IntCounterVec,
    pub board_refresh_total: IntCounterVec,
    pub orders_on_board: IntGauge,
    pub mutation_latency_seconds: HistogramVec,
    pub open_dialogs: IntGauge,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let allocations_total = IntCounterVec::new(
            Opts::new("allocations_total", "Staff allocations submitted by outcome"),
            &["outcome"],
        )
        .expect("valid allocations_total metric");

        let board_refresh_total = IntCounterVec::new(
            Opts::new("board_refresh_total", "Order board reloads by outcome"),
            &["outcome"],
        )
        .expect("valid board_refresh_total metric");

        let orders_on_board = IntGauge::new("orders_on_board", "Orders currently on the board")
            .expect("valid orders_on_board metric");

        let mutation_latency_seconds = HistogramVec::new(
            prometheus::HistogramOpts::new(
                "mutation_latency_seconds",
                "Backend write call latency, excluding the refetch, in seconds",
            ),
            &["operation"],
        )
        .expect("valid mutation_latency_seconds metric");

        let open_dialogs = IntGauge::new("open_dialogs", "Allocation dialogs currently open")
            .expect("valid open_dialogs metric");

        registry
            .register(Box::new(allocations_total.clone()))
            .expect("register allocations_total");
        registry
            .register(Box::new(board_refresh_total.clone()))
            .expect("register board_refresh_total");
        registry
            .register(Box::new(orders_on_board.clone()))
            .expect("register orders_on_board");
        registry
            .register(Box::new(mutation_latency_seconds.clone()))
            .expect("register mutation_latency_seconds");
        registry
            .register(Box::new(open_dialogs.clone()))
            .expect("register open_dialogs");

        Self {
            registry,
            allocations_total,
            board_refresh_total,
            orders_on_board,
            mutation_latency_seconds,
            open_dialogs,
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
