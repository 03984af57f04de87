use prometheus_client::{
    encoding::{text::encode, EncodeLabelSet, EncodeLabelValue},
    metrics::{counter::Counter, family::Family, gauge::Gauge},
    registry::{Registry, Unit},
};

use crate::prelude::*;


struct MetricDesc {
    name: &'static str,
    help: &'static str,
    unit: Option<Unit>,
}

const HTTP_REQUESTS: MetricDesc = MetricDesc {
    name: "http_requests",
    help: "Number of incoming HTTP requests",
    unit: None,
};
const LEADS: MetricDesc = MetricDesc {
    name: "leads",
    help: "Number of submitted leads by outcome",
    unit: None,
};
const BUILD_INFO: MetricDesc = MetricDesc {
    name: "build_info",
    help: "Different information about the app",
    unit: None,
};
const UPTIME: MetricDesc = MetricDesc {
    name: "uptime",
    help: "Seconds since the server was started",
    unit: Some(Unit::Seconds),
};


pub(crate) struct Metrics {
    started: std::time::Instant,
    http_requests: Family<HttpLabels, Counter>,
    leads: Family<LeadLabels, Counter>,
}

impl Metrics {
    pub(crate) fn new() -> Self {
        Self {
            started: std::time::Instant::now(),
            http_requests: Default::default(),
            leads: Default::default(),
        }
    }

    pub(crate) fn register_http_req(&self, category: HttpReqCategory) {
        self.http_requests.get_or_create(&HttpLabels { category }).inc();
    }

    pub(crate) fn register_lead(&self, outcome: LeadOutcome) {
        self.leads.get_or_create(&LeadLabels { outcome }).inc();
    }

    pub(crate) fn gather_and_encode(&self) -> String {
        let mut reg = <Registry>::default();

        add_any(&mut reg, HTTP_REQUESTS, self.http_requests.clone());
        add_any(&mut reg, LEADS, self.leads.clone());

        // Add build information
        let info = <Family<Vec<(String, String)>, Gauge>>::default();
        info.get_or_create(&vec![
            ("version".into(), crate::version::identifier()),
            ("build_time_utc".into(), crate::version::build_time_utc().into()),
            ("git_commit_hash".into(), crate::version::git_commit_hash().into()),
        ]).set(1);
        add_any(&mut reg, BUILD_INFO, info);

        let uptime = <Gauge>::default();
        uptime.set(self.started.elapsed().as_secs() as i64);
        add_any(&mut reg, UPTIME, uptime);

        let mut out = String::new();
        if let Err(e) = encode(&mut out, &reg) {
            error!("Failed to encode Prometheus metrics: {e}");
        }
        out
    }
}

fn add_any(
    reg: &mut Registry,
    metric: MetricDesc,
    value: impl prometheus_client::registry::Metric,
) {
    let name = format!("cairn_{}", metric.name);
    match metric.unit {
        Some(unit) => reg.register_with_unit(name, metric.help, unit, value),
        None => reg.register(name, metric.help, value),
    }
}


#[derive(Debug, Clone, Hash, PartialEq, Eq, EncodeLabelSet)]
struct HttpLabels {
    category: HttpReqCategory,
}

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, EncodeLabelValue)]
pub(crate) enum HttpReqCategory {
    /// CMS pages, including the home page
    Page,
    /// Collection items and events
    Item,
    /// RSS feeds
    Feed,
    /// `sitemap.xml` and per-locale sitemaps
    Sitemap,
    /// `POST /api/leads`
    Lead,
    /// `GET /~assets/*`
    Assets,
    /// `GET /~metrics`
    Metrics,
    /// Redirects to a localized path
    Redirect,
    /// Everything else
    Other,
}

#[derive(Debug, Clone, Hash, PartialEq, Eq, EncodeLabelSet)]
struct LeadLabels {
    outcome: LeadOutcome,
}

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, EncodeLabelValue)]
pub(crate) enum LeadOutcome {
    Stored,
    Invalid,
    Failed,
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_counters() {
        let metrics = Metrics::new();
        metrics.register_http_req(HttpReqCategory::Page);
        metrics.register_http_req(HttpReqCategory::Page);
        metrics.register_lead(LeadOutcome::Invalid);

        let out = metrics.gather_and_encode();
        assert!(out.contains(r#"cairn_http_requests_total{category="Page"} 2"#), "{out}");
        assert!(out.contains(r#"cairn_leads_total{outcome="Invalid"} 1"#));
        assert!(out.contains("cairn_build_info"));
        assert!(out.ends_with("# EOF\n"));
    }
}
