use std::sync::Arc;

use chrono::Utc;
use skipwatch_core::model::{Alert, Bin};
use skipwatch_core::predict::OverflowForecast;
use skipwatch_core::route::RoutePlan;
use skipwatch_core::service::FleetService;
use skipwatch_core::stats::SystemStats;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Screen {
    Overview,
    Alerts,
    Route,
    Forecast,
}

impl Screen {
    pub(crate) fn next(self) -> Self {
        match self {
            Screen::Overview => Screen::Alerts,
            Screen::Alerts => Screen::Route,
            Screen::Route => Screen::Forecast,
            Screen::Forecast => Screen::Overview,
        }
    }
}

pub(crate) struct App {
    pub service: Arc<FleetService>,

    pub screen: Screen,
    pub bins: Vec<Bin>,
    pub stats: Option<SystemStats>,
    pub bin_list_index: usize,

    pub alerts: Vec<Alert>,
    pub plan: Option<RoutePlan>,
    pub forecast: Option<OverflowForecast>,

    pub is_loading: bool,
    pub error_message: Option<String>,
}

impl App {
    pub(crate) fn new(service: Arc<FleetService>) -> Self {
        Self {
            service,
            screen: Screen::Overview,
            bins: Vec::new(),
            stats: None,
            bin_list_index: 0,
            alerts: Vec::new(),
            plan: None,
            forecast: None,
            is_loading: false,
            error_message: None,
        }
    }

    /// Reload bins, stats, alerts, and the route plan from the service.
    pub(crate) async fn refresh(&mut self) {
        let now = Utc::now();

        match self.service.overview(now).await {
            Ok((bins, stats)) => {
                self.bins = bins;
                self.stats = Some(stats);
                if self.bin_list_index >= self.bins.len() {
                    self.bin_list_index = 0;
                }
            }
            Err(err) => {
                self.error_message = Some(format!("Failed to load bins: {err}"));
            }
        }

        match self.service.active_alerts(now).await {
            Ok(alerts) => self.alerts = alerts,
            Err(err) => {
                self.error_message = Some(format!("Failed to load alerts: {err}"));
            }
        }

        match self.service.optimize_route(now).await {
            Ok(plan) => self.plan = Some(plan),
            Err(err) => {
                self.error_message = Some(format!("Failed to plan route: {err}"));
            }
        }
    }

    pub(crate) fn selected_bin(&self) -> Option<&Bin> {
        self.bins.get(self.bin_list_index)
    }
}
